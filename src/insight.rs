//! Spending insights: month-over-month comparison, short rolling-window
//! trends, and daily spending cadence.
//!
//! Like the dashboard aggregates, everything here is numeric; the insight
//! sentence shown to the user is rendered by [crate::format].

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    dashboard::round_1dp,
    transaction::{Transaction, TransactionKind},
    window::{
        TimeWindow, current_month_window, previous_rolling_window, prior_month_window,
        rolling_window,
    },
};

/// How many categories the month-over-month insight highlights.
const INSIGHT_CATEGORY_COUNT: usize = 3;

/// A category highlighted by the month-over-month insight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightCategory {
    /// The normalized category label.
    pub category: String,
    /// Amount spent on this category in the current month.
    pub amount: f64,
    /// Share of the current-month total, one decimal place.
    pub percentage: f64,
}

/// The month-over-month spending comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightSummary {
    /// Whether the current month has any expense records at all.
    pub has_data: bool,
    /// Full name of the current month, e.g. "August".
    pub current_month: String,
    /// Full name of the prior month.
    pub prior_month: String,
    /// Expense total for the current-month window.
    pub current_total: f64,
    /// Expense total for the prior-month window.
    pub prior_total: f64,
    /// `current_total - prior_total`.
    pub delta: f64,
    /// Percent change against the prior month, one decimal place. Zero when
    /// the prior month had no spending.
    pub percent_change: f64,
    /// Whether spending went up.
    pub trend_up: bool,
    /// The top three current-month categories by amount.
    pub top_categories: Vec<InsightCategory>,
}

/// Compare current-month spending against the prior month.
///
/// Soft-deleted and income records are ignored.
pub fn month_over_month(
    transactions: &[Transaction],
    reference_now: OffsetDateTime,
) -> InsightSummary {
    let current_window = current_month_window(reference_now);
    let prior_window = prior_month_window(reference_now);

    let current_expenses: Vec<&Transaction> = transactions
        .iter()
        .filter(|transaction| {
            !transaction.deleted
                && transaction.kind == TransactionKind::Expense
                && current_window.contains(transaction.occurred_at)
        })
        .collect();

    let current_total: f64 = current_expenses
        .iter()
        .map(|transaction| transaction.amount)
        .sum();
    let prior_total = window_total(transactions, &prior_window);

    let delta = current_total - prior_total;
    let percent_change = if prior_total > 0.0 {
        round_1dp(delta / prior_total * 100.0)
    } else {
        0.0
    };

    InsightSummary {
        has_data: !current_expenses.is_empty(),
        current_month: current_window.start.month().to_string(),
        prior_month: prior_window.start.month().to_string(),
        current_total,
        prior_total,
        delta,
        percent_change,
        trend_up: delta > 0.0,
        top_categories: top_categories(&current_expenses, current_total),
    }
}

/// Expense totals for the last `days` days against the `days` days before
/// them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingComparison {
    /// Total for `[reference - days, reference)`.
    pub current_total: f64,
    /// Total for `[reference - 2*days, reference - days)`.
    pub previous_total: f64,
    /// Percent change between the two, one decimal place. Zero when the
    /// earlier window had no spending.
    pub percent_change: f64,
}

/// Compare spending in the trailing `days`-day window against the window
/// before it. Backs the "last 7 days vs previous 7 days" insight.
pub fn rolling_comparison(
    transactions: &[Transaction],
    reference_now: OffsetDateTime,
    days: i64,
) -> RollingComparison {
    let current_total = window_total(transactions, &rolling_window(reference_now, days));
    let previous_total = window_total(transactions, &previous_rolling_window(reference_now, days));

    let percent_change = if previous_total > 0.0 {
        round_1dp((current_total - previous_total) / previous_total * 100.0)
    } else {
        0.0
    };

    RollingComparison {
        current_total,
        previous_total,
        percent_change,
    }
}

/// Current-month daily spending averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingCadence {
    /// Average across every elapsed calendar day including today, rounded
    /// to the nearest whole amount.
    pub calendar_day_average: f64,
    /// Average across only the days with at least one expense, rounded to
    /// the nearest whole amount.
    pub active_day_average: f64,
    /// Number of days with at least one expense.
    pub active_days: u32,
}

/// How fast the current month's spending is accumulating.
///
/// Days are bucketed in the reference instant's UTC offset. Both averages
/// are zero when there is no spending.
pub fn spending_cadence(
    transactions: &[Transaction],
    reference_now: OffsetDateTime,
) -> SpendingCadence {
    let window = current_month_window(reference_now);
    let offset = reference_now.offset();

    let mut total = 0.0;
    let mut days_with_spending = HashSet::new();

    for transaction in transactions {
        if transaction.deleted
            || transaction.kind != TransactionKind::Expense
            || !window.contains(transaction.occurred_at)
        {
            continue;
        }

        total += transaction.amount;
        days_with_spending.insert(transaction.occurred_at.to_offset(offset).date());
    }

    let active_days = days_with_spending.len() as u32;

    if total <= 0.0 {
        return SpendingCadence {
            calendar_day_average: 0.0,
            active_day_average: 0.0,
            active_days,
        };
    }

    let elapsed_days = reference_now.day() as f64;

    SpendingCadence {
        calendar_day_average: (total / elapsed_days).round(),
        active_day_average: (total / active_days as f64).round(),
        active_days,
    }
}

fn window_total(transactions: &[Transaction], window: &TimeWindow) -> f64 {
    transactions
        .iter()
        .filter(|transaction| {
            !transaction.deleted
                && transaction.kind == TransactionKind::Expense
                && window.contains(transaction.occurred_at)
        })
        .map(|transaction| transaction.amount)
        .sum()
}

fn top_categories(expenses: &[&Transaction], current_total: f64) -> Vec<InsightCategory> {
    let mut totals: HashMap<String, f64> = HashMap::new();

    for transaction in expenses {
        *totals
            .entry(transaction.normalized_category())
            .or_insert(0.0) += transaction.amount;
    }

    let mut categories: Vec<InsightCategory> = totals
        .into_iter()
        .map(|(category, amount)| {
            let percentage = if current_total > 0.0 {
                round_1dp(amount / current_total * 100.0)
            } else {
                0.0
            };

            InsightCategory {
                category,
                amount,
                percentage,
            }
        })
        .collect();

    categories.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });
    categories.truncate(INSIGHT_CATEGORY_COUNT);

    categories
}
