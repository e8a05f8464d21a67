//! Budgets: per-category spending limits scoped to a calendar month, and
//! the classifier that turns (spent, limit) into a status.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, Month, UtcOffset};

use crate::{
    Error,
    category::CategoryName,
    database_id::DatabaseId,
    transaction::{OwnerId, Transaction, TransactionKind},
    window::{TimeWindow, month_start, next_month},
};

/// A calendar month identified by its "YYYY-MM" key.
///
/// Keys are zero-padded so their lexicographic order matches chronological
/// order, which lets the store sort periods as plain text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeriodKey {
    year: i32,
    month: Month,
}

impl PeriodKey {
    /// The period for a given year and month.
    pub fn new(year: i32, month: Month) -> Self {
        Self { year, month }
    }

    /// The period containing `date`.
    pub fn from_date(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The year of this period.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month of this period.
    pub fn month(&self) -> Month {
        self.month
    }

    /// The half-open month window for this period, with boundaries at
    /// midnight in `offset`.
    pub fn window(&self, offset: UtcOffset) -> TimeWindow {
        let (next_year, next_month) = next_month(self.year, self.month);

        TimeWindow {
            start: month_start(self.year, self.month, offset),
            end: month_start(next_year, next_month, offset),
        }
    }
}

impl FromStr for PeriodKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidPeriod(s.to_string());

        let (year_text, month_text) = s.split_once('-').ok_or_else(invalid)?;
        let year: i32 = year_text.parse().map_err(|_| invalid())?;
        let month_number: u8 = month_text.parse().map_err(|_| invalid())?;
        let month = Month::try_from(month_number).map_err(|_| invalid())?;

        Ok(Self { year, month })
    }
}

impl Display for PeriodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, u8::from(self.month))
    }
}

impl TryFrom<String> for PeriodKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PeriodKey> for String {
    fn from(value: PeriodKey) -> Self {
        value.to_string()
    }
}

/// A per-category spending limit for one calendar month.
///
/// At most one budget may exist per (owner, category, period); the store
/// enforces this with a unique constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    /// The ID of the budget.
    pub id: DatabaseId,
    /// The user that owns this budget.
    pub owner: OwnerId,
    /// The normalized category the limit applies to.
    pub category: CategoryName,
    /// The spending limit for the period. Always positive.
    pub limit: f64,
    /// The calendar month this budget covers.
    pub period: PeriodKey,
}

/// Check that a budget limit is a positive, finite amount.
pub(crate) fn validate_limit(limit: f64) -> Result<(), Error> {
    if !limit.is_finite() || limit <= 0.0 {
        Err(Error::InvalidLimit(limit))
    } else {
        Ok(())
    }
}

/// How spending compares against a budget's limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    /// Spending is below 80% of the limit.
    Safe,
    /// Spending is between 80% of the limit and the limit itself, inclusive
    /// on both ends.
    Warning,
    /// Spending is strictly over the limit.
    Exceeded,
}

/// The warning band starts at this share of the limit.
const WARNING_THRESHOLD: f64 = 0.8;

/// The outcome of classifying spending against a limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetHealth {
    /// The classified status.
    pub status: BudgetStatus,
    /// Share of the limit used, as a percentage capped at 100.
    pub percentage: f64,
    /// Money left before the limit is reached, floored at zero.
    pub remaining: f64,
}

/// Classify `spent` against `limit`.
///
/// Spending exactly at the limit is still [BudgetStatus::Warning]; the
/// exceeded state requires strictly more spending than the limit. A
/// non-positive limit yields a zero percentage.
pub fn classify(spent: f64, limit: f64) -> BudgetHealth {
    let status = if spent > limit {
        BudgetStatus::Exceeded
    } else if WARNING_THRESHOLD * limit <= spent {
        BudgetStatus::Warning
    } else {
        BudgetStatus::Safe
    };

    let percentage = if limit > 0.0 {
        (spent / limit * 100.0).min(100.0)
    } else {
        0.0
    };

    let remaining = (limit - spent).max(0.0);

    BudgetHealth {
        status,
        percentage,
        remaining,
    }
}

/// One budget's spending position within its period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStatusRow {
    /// The normalized category the budget covers.
    pub category: CategoryName,
    /// The spending limit for the period.
    pub limit: f64,
    /// Expense spending inside the period window for this category.
    pub spent: f64,
    /// Money left before the limit is reached, floored at zero.
    pub remaining: f64,
    /// Share of the limit used, capped at 100.
    pub percentage: f64,
    /// The classified status.
    pub status: BudgetStatus,
}

/// Produce one status row per budget.
///
/// Each budget is scored against its own period window, with boundaries at
/// midnight in `offset`. Only non-deleted expense transactions inside that
/// window count, and only when their normalized category matches the
/// budget's category. Rows are sorted by percentage used descending, ties
/// broken by category name ascending.
pub fn track_budgets(
    budgets: &[Budget],
    transactions: &[Transaction],
    offset: UtcOffset,
) -> Vec<BudgetStatusRow> {
    let mut rows: Vec<BudgetStatusRow> = budgets
        .iter()
        .map(|budget| {
            let window = budget.period.window(offset);
            let spent: f64 = transactions
                .iter()
                .filter(|transaction| {
                    !transaction.deleted
                        && transaction.kind == TransactionKind::Expense
                        && window.contains(transaction.occurred_at)
                        && transaction.normalized_category() == budget.category.as_ref()
                })
                .map(|transaction| transaction.amount)
                .sum();

            let health = classify(spent, budget.limit);

            BudgetStatusRow {
                category: budget.category.clone(),
                limit: budget.limit,
                spent,
                remaining: health.remaining,
                percentage: health.percentage,
                status: health.status,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.percentage
            .partial_cmp(&a.percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });

    rows
}

#[cfg(test)]
mod tests {
    use time::{Month, UtcOffset, macros::datetime};

    use crate::{
        Error,
        category::CategoryName,
        transaction::{OwnerId, Transaction, TransactionKind},
    };

    use super::{Budget, BudgetStatus, PeriodKey, classify, track_budgets};

    #[test]
    fn classify_at_eighty_percent_is_warning() {
        let health = classify(800.0, 1000.0);

        assert_eq!(health.status, BudgetStatus::Warning);
        assert_eq!(health.percentage, 80.0);
        assert_eq!(health.remaining, 200.0);
    }

    #[test]
    fn classify_at_limit_is_warning_not_exceeded() {
        let health = classify(1000.0, 1000.0);

        assert_eq!(health.status, BudgetStatus::Warning);
        assert_eq!(health.percentage, 100.0);
        assert_eq!(health.remaining, 0.0);
    }

    #[test]
    fn classify_over_limit_is_exceeded_with_capped_percentage() {
        let health = classify(1001.0, 1000.0);

        assert_eq!(health.status, BudgetStatus::Exceeded);
        assert_eq!(health.percentage, 100.0);
        assert_eq!(health.remaining, 0.0);
    }

    #[test]
    fn classify_below_warning_band_is_safe() {
        let health = classify(799.99, 1000.0);

        assert_eq!(health.status, BudgetStatus::Safe);
        assert_eq!(health.remaining, 200.01);
    }

    #[test]
    fn classify_zero_spending_is_safe() {
        let health = classify(0.0, 1000.0);

        assert_eq!(health.status, BudgetStatus::Safe);
        assert_eq!(health.percentage, 0.0);
        assert_eq!(health.remaining, 1000.0);
    }

    #[test]
    fn classify_zero_limit_has_zero_percentage() {
        let health = classify(50.0, 0.0);

        assert_eq!(health.percentage, 0.0);
        assert_eq!(health.remaining, 0.0);
        assert_eq!(health.status, BudgetStatus::Exceeded);
    }

    #[test]
    fn classify_caps_runaway_spending_at_one_hundred_percent() {
        let health = classify(2500.0, 1000.0);

        assert_eq!(health.status, BudgetStatus::Exceeded);
        assert_eq!(health.percentage, 100.0);
    }

    #[test]
    fn period_key_parses_and_displays_zero_padded() {
        let period: PeriodKey = "2024-08".parse().unwrap();

        assert_eq!(period.year(), 2024);
        assert_eq!(period.month(), Month::August);
        assert_eq!(period.to_string(), "2024-08");
    }

    #[test]
    fn period_key_rejects_malformed_keys() {
        for text in ["2024", "2024-13", "2024-00", "aug-2024", "2024-8x"] {
            let result = text.parse::<PeriodKey>();

            assert_eq!(
                result,
                Err(Error::InvalidPeriod(text.to_string())),
                "expected {text:?} to be rejected"
            );
        }
    }

    #[test]
    fn period_key_window_covers_exactly_one_month() {
        let period: PeriodKey = "2024-02".parse().unwrap();

        let window = period.window(UtcOffset::UTC);

        assert_eq!(window.start, datetime!(2024-02-01 00:00 UTC));
        assert_eq!(window.end, datetime!(2024-03-01 00:00 UTC));
        assert!(window.contains(datetime!(2024-02-29 13:00 UTC)));
        assert!(!window.contains(datetime!(2024-03-01 00:00 UTC)));
    }

    fn expense(amount: f64, category: &str, occurred_at: time::OffsetDateTime) -> Transaction {
        Transaction {
            id: 0,
            owner: OwnerId::new("user-1"),
            kind: TransactionKind::Expense,
            category: category.to_string(),
            amount,
            occurred_at,
            note: None,
            deleted: false,
        }
    }

    fn budget(category: &str, limit: f64, period: &str) -> Budget {
        Budget {
            id: 0,
            owner: OwnerId::new("user-1"),
            category: CategoryName::new_unchecked(category),
            limit,
            period: period.parse().unwrap(),
        }
    }

    #[test]
    fn track_budgets_matches_normalized_categories_within_period() {
        let budgets = vec![budget("food", 500.0, "2024-08"), budget("rent", 1000.0, "2024-08")];
        let transactions = vec![
            expense(200.0, "  FOOD ", datetime!(2024-08-05 10:00 UTC)),
            expense(250.0, "food", datetime!(2024-08-20 18:00 UTC)),
            expense(950.0, "Rent", datetime!(2024-08-01 09:00 UTC)),
            // Outside the period, must not count.
            expense(400.0, "food", datetime!(2024-07-31 23:00 UTC)),
        ];

        let rows = track_budgets(&budgets, &transactions, UtcOffset::UTC);

        assert_eq!(rows.len(), 2);
        // Rent used 95%, food used 90%, so rent sorts first.
        assert_eq!(rows[0].category.as_ref(), "rent");
        assert_eq!(rows[0].spent, 950.0);
        assert_eq!(rows[0].status, BudgetStatus::Warning);
        assert_eq!(rows[1].category.as_ref(), "food");
        assert_eq!(rows[1].spent, 450.0);
        assert_eq!(rows[1].percentage, 90.0);
    }

    #[test]
    fn track_budgets_ignores_income_and_deleted_rows() {
        let budgets = vec![budget("food", 500.0, "2024-08")];
        let mut deleted = expense(100.0, "food", datetime!(2024-08-10 10:00 UTC));
        deleted.deleted = true;
        let mut income = expense(100.0, "food", datetime!(2024-08-11 10:00 UTC));
        income.kind = TransactionKind::Income;
        let transactions = vec![
            deleted,
            income,
            expense(50.0, "food", datetime!(2024-08-12 10:00 UTC)),
        ];

        let rows = track_budgets(&budgets, &transactions, UtcOffset::UTC);

        assert_eq!(rows[0].spent, 50.0);
        assert_eq!(rows[0].status, BudgetStatus::Safe);
    }

    #[test]
    fn track_budgets_breaks_percentage_ties_by_category() {
        let budgets = vec![
            budget("transport", 100.0, "2024-08"),
            budget("groceries", 100.0, "2024-08"),
        ];
        let transactions = vec![
            expense(90.0, "transport", datetime!(2024-08-10 10:00 UTC)),
            expense(90.0, "groceries", datetime!(2024-08-10 11:00 UTC)),
        ];

        let rows = track_budgets(&budgets, &transactions, UtcOffset::UTC);

        assert_eq!(rows[0].category.as_ref(), "groceries");
        assert_eq!(rows[1].category.as_ref(), "transport");
    }

    #[test]
    fn track_budgets_scores_each_budget_against_its_own_period() {
        let budgets = vec![budget("food", 500.0, "2024-07"), budget("food", 500.0, "2024-08")];
        let transactions = vec![
            expense(300.0, "food", datetime!(2024-07-15 10:00 UTC)),
            expense(450.0, "food", datetime!(2024-08-15 10:00 UTC)),
        ];

        let rows = track_budgets(&budgets, &transactions, UtcOffset::UTC);

        assert_eq!(rows[0].spent, 450.0);
        assert_eq!(rows[0].status, BudgetStatus::Warning);
        assert_eq!(rows[1].spent, 300.0);
        assert_eq!(rows[1].status, BudgetStatus::Safe);
    }
}
