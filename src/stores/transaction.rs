//! Defines the transaction store trait.

use std::ops::RangeInclusive;

use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    transaction::{OwnerId, Transaction, TransactionBuilder, TransactionKind},
};

/// Handles the creation and retrieval of transactions.
///
/// Every read and write is scoped to one owner so that a query can never leak
/// another user's rows.
pub trait TransactionStore {
    /// Create a new transaction in the store.
    ///
    /// Builders without an explicit date are stamped with the store's clock.
    fn create(&mut self, builder: TransactionBuilder) -> Result<Transaction, Error>;

    /// Retrieve one of `owner`'s transactions from the store.
    fn get(&self, owner: &OwnerId, id: DatabaseId) -> Result<Transaction, Error>;

    /// Retrieve `owner`'s transactions from the store in the way defined by `query`.
    fn get_query(&self, owner: &OwnerId, query: TransactionQuery)
    -> Result<Vec<Transaction>, Error>;

    /// Sum `owner`'s non-deleted expenses per normalized category, largest
    /// total first with ties broken by category name.
    fn sum_by_category(
        &self,
        owner: &OwnerId,
        date_range: Option<RangeInclusive<Date>>,
    ) -> Result<Vec<(String, f64)>, Error>;

    /// Mark one of `owner`'s transactions as deleted without removing the row.
    fn soft_delete(&mut self, owner: &OwnerId, id: DatabaseId) -> Result<(), Error>;

    /// Restore one of `owner`'s soft-deleted transactions.
    fn undelete(&mut self, owner: &OwnerId, id: DatabaseId) -> Result<(), Error>;
}

/// Defines how transactions should be fetched from [TransactionStore::get_query].
#[derive(Default)]
pub struct TransactionQuery {
    /// Include transactions whose date falls within `date_range` (inclusive).
    pub date_range: Option<RangeInclusive<Date>>,
    /// Include only transactions of this kind. None includes both kinds.
    pub kind: Option<TransactionKind>,
    /// Include soft-deleted transactions. Defaults to false.
    pub include_deleted: bool,
    /// Selects up to the first N (`limit`) transactions.
    pub limit: Option<u64>,
    /// Orders transactions by date in the order `sort_date`. None returns transactions in the
    /// order they are stored.
    pub sort_date: Option<SortOrder>,
}

/// The order to sort transactions in a [TransactionQuery].
pub enum SortOrder {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    Descending,
}
