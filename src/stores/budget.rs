//! Defines the budget store trait.

use crate::{
    Error,
    budget::{Budget, PeriodKey},
    category::CategoryName,
    database_id::DatabaseId,
    transaction::OwnerId,
};

/// Handles the creation and retrieval of budgets.
pub trait BudgetStore {
    /// Create a budget for `owner` limiting `category` spending within `period`.
    ///
    /// At most one budget may exist per (owner, category, period).
    fn create(
        &mut self,
        owner: &OwnerId,
        category: CategoryName,
        limit: f64,
        period: PeriodKey,
    ) -> Result<Budget, Error>;

    /// Retrieve `owner`'s budgets for `period`, sorted by category name.
    fn list(&self, owner: &OwnerId, period: PeriodKey) -> Result<Vec<Budget>, Error>;

    /// Replace the limit on one of `owner`'s budgets.
    fn update_limit(&mut self, owner: &OwnerId, id: DatabaseId, limit: f64)
    -> Result<Budget, Error>;

    /// Remove one of `owner`'s budgets.
    fn delete(&mut self, owner: &OwnerId, id: DatabaseId) -> Result<(), Error>;
}
