//! Dashboard aggregation: a single pass over one owner's transactions that
//! produces every overview figure at once, so category percentages, totals,
//! and ratios all agree with each other.
//!
//! All computation here is numeric; currency and date strings are rendered
//! at the presentation boundary by the [crate::format] module.

use std::collections::HashMap;

use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    transaction::{Transaction, TransactionKind},
    window::{current_month_window, month_key, month_label},
};

/// How many months the spending trend keeps.
const TREND_MONTHS: usize = 6;
/// How many categories the top-category list keeps.
const TOP_CATEGORY_COUNT: usize = 5;
/// How many transactions the recent list keeps.
const RECENT_TRANSACTION_COUNT: usize = 5;

/// A category's share of spending within the current-month window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    /// The normalized category label.
    pub category: String,
    /// Total spent on this category.
    pub total: f64,
    /// Share of the headline spending total, rounded to one decimal place.
    /// Zero when the headline total is zero.
    pub percent_of_total: f64,
}

/// One month of the spending trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrendPoint {
    /// Sortable month key, e.g. "2024-08".
    pub month: String,
    /// Short display label, e.g. "Aug '24".
    pub label: String,
    /// Total expense amount attributed to the month.
    pub total: f64,
}

/// All-history income and expense totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceSummary {
    /// Sum of income-kind amounts.
    pub income: f64,
    /// Sum of expense-kind amounts.
    pub expenses: f64,
    /// `income - expenses`.
    pub net: f64,
}

/// Every figure the overview report shows.
///
/// Produced by [build_dashboard]; see that function for the window each
/// field is computed over.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// Expense total within the current-month window.
    pub total_spending: f64,
    /// Income total within the current-month window.
    pub total_income: f64,
    /// Declared monthly income minus `total_spending`.
    pub savings: f64,
    /// Spending as a percentage of the monthly budget limit, one decimal
    /// place. Zero when no limit is set.
    pub budget_utilization: f64,
    /// Savings as a percentage of declared income, one decimal place. Zero
    /// when no income is declared.
    pub savings_rate: f64,
    /// Current-month spending grouped by category, largest first.
    pub category_breakdown: Vec<CategoryBreakdown>,
    /// Expense totals per calendar month over the full history, oldest
    /// first, capped to the most recent six months.
    pub monthly_trend: Vec<MonthlyTrendPoint>,
    /// The first five entries of `category_breakdown`.
    pub top_categories: Vec<CategoryBreakdown>,
    /// The five most recent transactions of either kind, newest first.
    pub recent_transactions: Vec<Transaction>,
    /// Mean expense amount in the current-month window, rounded to the
    /// nearest whole amount. Zero when there were no expenses.
    pub average_transaction: f64,
    /// All-history income, expense, and net totals.
    pub balance: BalanceSummary,
}

/// Compute every dashboard figure for one owner's transaction history.
///
/// Headline figures, the category breakdown, and the top categories cover
/// the calendar month containing `reference_now`; the monthly trend and the
/// recent-transaction list cover the full history. `monthly_budget_limit`
/// and `income` are the owner's declared monthly figures; either may be
/// zero, in which case the ratios that depend on them are reported as zero.
///
/// Empty input is not an error: every aggregate degrades to zero or an
/// empty list, and no field is ever NaN or infinite.
///
/// # Errors
/// Returns an [Error::InvariantViolation] when `transactions` contains a
/// soft-deleted row or spans more than one owner. Callers are expected to
/// query the store pre-filtered; aggregating across owners or over deleted
/// rows silently would corrupt every figure at once.
pub fn build_dashboard(
    transactions: &[Transaction],
    reference_now: OffsetDateTime,
    monthly_budget_limit: f64,
    income: f64,
) -> Result<DashboardSummary, Error> {
    validate_scope(transactions)?;

    let window = current_month_window(reference_now);

    let current_expenses: Vec<&Transaction> = transactions
        .iter()
        .filter(|transaction| {
            transaction.kind == TransactionKind::Expense && window.contains(transaction.occurred_at)
        })
        .collect();

    let total_spending: f64 = current_expenses
        .iter()
        .map(|transaction| transaction.amount)
        .sum();
    let total_income: f64 = transactions
        .iter()
        .filter(|transaction| {
            transaction.kind == TransactionKind::Income && window.contains(transaction.occurred_at)
        })
        .map(|transaction| transaction.amount)
        .sum();

    let savings = income - total_spending;
    let budget_utilization = if monthly_budget_limit > 0.0 {
        round_1dp(total_spending / monthly_budget_limit * 100.0)
    } else {
        0.0
    };
    let savings_rate = if income > 0.0 {
        round_1dp(savings / income * 100.0)
    } else {
        0.0
    };

    let category_breakdown = breakdown_by_category(&current_expenses, total_spending);
    let top_categories = category_breakdown
        .iter()
        .take(TOP_CATEGORY_COUNT)
        .cloned()
        .collect();
    let average_transaction = if current_expenses.is_empty() {
        0.0
    } else {
        (total_spending / current_expenses.len() as f64).round()
    };

    Ok(DashboardSummary {
        total_spending,
        total_income,
        savings,
        budget_utilization,
        savings_rate,
        category_breakdown,
        monthly_trend: monthly_trend(transactions),
        top_categories,
        recent_transactions: most_recent(transactions),
        average_transaction,
        balance: summarize_balance(transactions),
    })
}

/// All-history income and expense totals over non-deleted records.
pub fn summarize_balance(transactions: &[Transaction]) -> BalanceSummary {
    let mut income = 0.0;
    let mut expenses = 0.0;

    for transaction in transactions.iter().filter(|t| !t.deleted) {
        match transaction.kind {
            TransactionKind::Income => income += transaction.amount,
            TransactionKind::Expense => expenses += transaction.amount,
        }
    }

    BalanceSummary {
        income,
        expenses,
        net: income - expenses,
    }
}

/// Round to one decimal place.
pub(crate) fn round_1dp(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn validate_scope(transactions: &[Transaction]) -> Result<(), Error> {
    if let Some(transaction) = transactions.iter().find(|t| t.deleted) {
        return Err(Error::InvariantViolation(format!(
            "transaction {} is soft-deleted, aggregation input must be pre-filtered",
            transaction.id
        )));
    }

    let mut owners = transactions.iter().map(|transaction| &transaction.owner);

    if let Some(first) = owners.next()
        && let Some(other) = owners.find(|owner| *owner != first)
    {
        return Err(Error::InvariantViolation(format!(
            "transactions span owners {first} and {other}, aggregation input must be scoped to one owner"
        )));
    }

    Ok(())
}

/// Groups current-month expenses by normalized category.
fn breakdown_by_category(expenses: &[&Transaction], total_spending: f64) -> Vec<CategoryBreakdown> {
    let mut totals: HashMap<String, f64> = HashMap::new();

    for transaction in expenses {
        *totals
            .entry(transaction.normalized_category())
            .or_insert(0.0) += transaction.amount;
    }

    let mut breakdown: Vec<CategoryBreakdown> = totals
        .into_iter()
        .map(|(category, total)| {
            let percent_of_total = if total_spending > 0.0 {
                round_1dp(total / total_spending * 100.0)
            } else {
                0.0
            };

            CategoryBreakdown {
                category,
                total,
                percent_of_total,
            }
        })
        .collect();

    breakdown.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });

    breakdown
}

/// Sums expenses per calendar month over the full history and keeps the
/// most recent six months in ascending order.
fn monthly_trend(transactions: &[Transaction]) -> Vec<MonthlyTrendPoint> {
    let mut totals: HashMap<Date, f64> = HashMap::new();

    for transaction in transactions {
        if transaction.kind != TransactionKind::Expense {
            continue;
        }

        let month = transaction
            .occurred_at
            .date()
            .replace_day(1)
            .expect("day 1 is valid in every month");
        *totals.entry(month).or_insert(0.0) += transaction.amount;
    }

    let mut months: Vec<Date> = totals.keys().copied().collect();
    months.sort();

    let oldest = months.len().saturating_sub(TREND_MONTHS);

    months[oldest..]
        .iter()
        .map(|month| MonthlyTrendPoint {
            month: month_key(*month),
            label: month_label(*month),
            total: totals[month],
        })
        .collect()
}

fn most_recent(transactions: &[Transaction]) -> Vec<Transaction> {
    let mut recent = transactions.to_vec();
    recent.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    recent.truncate(RECENT_TRANSACTION_COUNT);

    recent
}
