//! Contains the SQLite backed implementations of the store traits and a
//! convenience function for wiring them to one connection.

pub mod budget;
pub mod subscription;
pub mod transaction;

pub use budget::SQLiteBudgetStore;
pub use subscription::SQLiteSubscriptionStore;
pub use transaction::SQLiteTransactionStore;

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, db::initialize};

/// One store per domain model, all sharing a single SQLite connection.
#[derive(Debug, Clone)]
pub struct SQLiteStores {
    /// Income and expense records.
    pub transactions: SQLiteTransactionStore,
    /// Per-category monthly spending limits.
    pub budgets: SQLiteBudgetStore,
    /// Explicitly registered subscriptions.
    pub subscriptions: SQLiteSubscriptionStore,
}

/// Creates the set of SQLite backed stores for `db_connection`.
///
/// This function will modify the database by adding the tables for the domain
/// models to the database.
pub fn create_stores(db_connection: Connection) -> Result<SQLiteStores, Error> {
    initialize(&db_connection)?;

    let connection = Arc::new(Mutex::new(db_connection));

    Ok(SQLiteStores {
        transactions: SQLiteTransactionStore::new(connection.clone()),
        budgets: SQLiteBudgetStore::new(connection.clone()),
        subscriptions: SQLiteSubscriptionStore::new(connection),
    })
}
