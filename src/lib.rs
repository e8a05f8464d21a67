//! Spendlens turns a user's raw transaction history into the numbers a
//! personal finance dashboard shows: monthly spending and savings, category
//! breakdowns, budget health, recurring-cost detection, and month-over-month
//! insights.
//!
//! Aggregation is pure: every function takes the transaction history and an
//! explicit reference time, so the same inputs always produce the same
//! report. Persistence lives behind the traits in [stores], with a SQLite
//! implementation included.

#![warn(missing_docs)]

mod budget;
mod category;
mod dashboard;
mod database_id;
mod db;
mod format;
mod insight;
mod subscription;
mod timezone;
mod transaction;
mod window;

pub mod stores;

pub use budget::{
    Budget, BudgetHealth, BudgetStatus, BudgetStatusRow, PeriodKey, classify, track_budgets,
};
pub use category::{CategoryName, normalize_category};
pub use dashboard::{
    BalanceSummary, CategoryBreakdown, DashboardSummary, MonthlyTrendPoint, build_dashboard,
    summarize_balance,
};
pub use database_id::DatabaseId;
pub use db::initialize as initialize_db;
pub use format::{format_currency, format_currency_rounded, format_date, insight_message};
pub use insight::{
    InsightCategory, InsightSummary, RollingComparison, SpendingCadence, month_over_month,
    rolling_comparison, spending_cadence,
};
pub use subscription::{
    Frequency, NewSubscription, Subscription, SubscriptionCandidate, SubscriptionSummary,
    catch_up_renewal, detect_candidates, next_renewal, summarize as summarize_subscriptions,
    total_monthly_cost,
};
pub use timezone::{get_local_offset, now_in};
pub use transaction::{OwnerId, Transaction, TransactionBuilder, TransactionKind};
pub use window::{
    TimeWindow, current_month_window, previous_rolling_window, prior_month_window, rolling_window,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty string was used to create a category name.
    #[error("category name cannot be empty")]
    EmptyCategory,

    /// A string other than "income" or "expense" was parsed as a transaction
    /// kind.
    #[error("\"{0}\" is not a transaction kind, expected \"income\" or \"expense\"")]
    InvalidKind(String),

    /// A negative or non-finite amount was used to create a record.
    ///
    /// Amounts are always non-negative; direction is carried by the
    /// transaction kind, never by the sign.
    #[error("{0} is not a valid amount, amounts must be non-negative and finite")]
    InvalidAmount(f64),

    /// A string could not be parsed as a budget period.
    #[error("could not parse \"{0}\" as a budget period, expected the format \"YYYY-MM\"")]
    InvalidPeriod(String),

    /// A zero, negative or non-finite limit was used to create a budget.
    #[error("{0} is not a valid budget limit, limits must be positive and finite")]
    InvalidLimit(f64),

    /// A string could not be parsed as a billing frequency.
    #[error(
        "\"{0}\" is not a billing frequency, expected one of \"daily\", \"weekly\", \"monthly\", \"quarterly\" or \"yearly\""
    )]
    InvalidFrequency(String),

    /// The transactions handed to an aggregation function broke its input
    /// contract, e.g. they contained a soft-deleted row or spanned owners.
    ///
    /// Aggregation fails fast on these instead of silently producing figures
    /// for the wrong data set.
    #[error("aggregation input violated an invariant: {0}")]
    InvariantViolation(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// The requested resource was not found.
    ///
    /// The caller should check that the parameters (e.g., ID) are correct and
    /// that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The owner already has a budget for this category and period.
    #[error("a budget for \"{0}\" already exists in this period")]
    DuplicateBudget(String),

    /// The owner already has a subscription with this name.
    #[error("the subscription \"{0}\" already exists in the database")]
    DuplicateSubscription(String),

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a budget that does not exist
    #[error("tried to delete a budget that is not in the database")]
    DeleteMissingBudget,

    /// Tried to update a budget that does not exist
    #[error("tried to update a budget that is not in the database")]
    UpdateMissingBudget,

    /// Tried to delete a subscription that does not exist
    #[error("tried to delete a subscription that is not in the database")]
    DeleteMissingSubscription,

    /// Tried to update a subscription that does not exist
    #[error("tried to update a subscription that is not in the database")]
    UpdateMissingSubscription,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
