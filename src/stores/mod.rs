//! Contains traits and implementations for objects that store the domain models.

mod budget;
mod subscription;
mod transaction;

pub mod sqlite;

pub use budget::BudgetStore;
pub use subscription::SubscriptionStore;
pub use transaction::{SortOrder, TransactionQuery, TransactionStore};
