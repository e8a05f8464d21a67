//! Implements a SQLite backed budget store.
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, types::Type};

use crate::{
    Error,
    budget::{Budget, PeriodKey, validate_limit},
    category::CategoryName,
    database_id::DatabaseId,
    db::{CreateTable, MapRow},
    stores::BudgetStore,
    transaction::OwnerId,
};

/// Stores budgets in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteBudgetStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteBudgetStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl BudgetStore for SQLiteBudgetStore {
    /// Create a budget in the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidLimit] if `limit` is not a positive, finite amount,
    /// - [Error::DuplicateBudget] if `owner` already has a budget for
    ///   `category` within `period`,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create(
        &mut self,
        owner: &OwnerId,
        category: CategoryName,
        limit: f64,
        period: PeriodKey,
    ) -> Result<Budget, Error> {
        validate_limit(limit)?;

        let connection = self.connection.lock().unwrap();

        let budget = connection
            .prepare(
                "INSERT INTO budget (owner, category, \"limit\", period)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING id, owner, category, \"limit\", period",
            )?
            .query_row(
                (
                    owner.as_str(),
                    category.as_ref(),
                    limit,
                    period.to_string(),
                ),
                Self::map_row,
            )
            .map_err(|error| match error {
                // Code 2067 occurs when a UNIQUE constraint failed.
                rusqlite::Error::SqliteFailure(sql_error, Some(_))
                    if sql_error.extended_code == 2067 =>
                {
                    Error::DuplicateBudget(category.to_string())
                }
                error => error.into(),
            })?;

        Ok(budget)
    }

    /// Retrieve `owner`'s budgets for `period`, sorted by category name.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL error.
    fn list(&self, owner: &OwnerId, period: PeriodKey) -> Result<Vec<Budget>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, owner, category, \"limit\", period FROM budget
                 WHERE owner = ?1 AND period = ?2
                 ORDER BY category ASC",
            )?
            .query_map((owner.as_str(), period.to_string()), Self::map_row)?
            .map(|maybe_budget| maybe_budget.map_err(Error::SqlError))
            .collect()
    }

    /// Replace the limit on one of `owner`'s budgets.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidLimit] if `limit` is not a positive, finite amount,
    /// - [Error::UpdateMissingBudget] if `id` does not refer to one of
    ///   `owner`'s budgets,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn update_limit(
        &mut self,
        owner: &OwnerId,
        id: DatabaseId,
        limit: f64,
    ) -> Result<Budget, Error> {
        validate_limit(limit)?;

        let budget = self
            .connection
            .lock()
            .unwrap()
            .prepare(
                "UPDATE budget SET \"limit\" = ?1 WHERE id = ?2 AND owner = ?3
                 RETURNING id, owner, category, \"limit\", period",
            )?
            .query_row((limit, id, owner.as_str()), Self::map_row)
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingBudget,
                error => error.into(),
            })?;

        Ok(budget)
    }

    /// Remove one of `owner`'s budgets.
    ///
    /// # Errors
    /// This function will return a [Error::DeleteMissingBudget] if `id` does
    /// not refer to one of `owner`'s budgets.
    fn delete(&mut self, owner: &OwnerId, id: DatabaseId) -> Result<(), Error> {
        let rows_deleted = self.connection.lock().unwrap().execute(
            "DELETE FROM budget WHERE id = ?1 AND owner = ?2",
            (id, owner.as_str()),
        )?;

        if rows_deleted == 0 {
            return Err(Error::DeleteMissingBudget);
        }

        Ok(())
    }
}

impl CreateTable for SQLiteBudgetStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS budget (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    owner TEXT NOT NULL,
                    category TEXT NOT NULL,
                    \"limit\" REAL NOT NULL,
                    period TEXT NOT NULL,
                    UNIQUE(owner, category, period)
                    )",
            (),
        )?;

        // Ensure the sequence starts at 1
        connection.execute(
            "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('budget', 0)",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteBudgetStore {
    type ReturnType = Budget;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let raw_period: String = row.get(offset + 4)?;
        let period = raw_period.parse().map_err(|error: Error| {
            rusqlite::Error::FromSqlConversionFailure(offset + 4, Type::Text, Box::new(error))
        })?;

        Ok(Budget {
            id: row.get(offset)?,
            owner: OwnerId::new(&row.get::<_, String>(offset + 1)?),
            category: CategoryName::new_unchecked(&row.get::<_, String>(offset + 2)?),
            limit: row.get(offset + 3)?,
            period,
        })
    }
}

#[cfg(test)]
mod sqlite_budget_store_tests {
    use rusqlite::Connection;

    use crate::{
        budget::PeriodKey,
        category::CategoryName,
        stores::sqlite::{SQLiteStores, create_stores},
        transaction::OwnerId,
    };

    use super::{BudgetStore, Error};

    fn get_stores() -> SQLiteStores {
        let connection = Connection::open_in_memory().unwrap();
        create_stores(connection).unwrap()
    }

    fn owner() -> OwnerId {
        OwnerId::new("user-1")
    }

    fn august() -> PeriodKey {
        "2024-08".parse().unwrap()
    }

    #[test]
    fn create_succeeds() {
        let mut store = get_stores().budgets;

        let budget = store
            .create(&owner(), CategoryName::new("Food").unwrap(), 500.0, august())
            .unwrap();

        assert_eq!(budget.id, 1);
        assert_eq!(budget.category.as_ref(), "food");
        assert_eq!(budget.limit, 500.0);
        assert_eq!(budget.period, august());
    }

    #[test]
    fn create_rejects_non_positive_limit() {
        let mut store = get_stores().budgets;

        let result = store.create(&owner(), CategoryName::new_unchecked("food"), 0.0, august());

        assert_eq!(result, Err(Error::InvalidLimit(0.0)));
    }

    #[test]
    fn create_fails_on_duplicate_category_within_period() {
        let mut store = get_stores().budgets;
        store
            .create(&owner(), CategoryName::new_unchecked("food"), 500.0, august())
            .unwrap();

        let duplicate =
            store.create(&owner(), CategoryName::new_unchecked("food"), 750.0, august());

        assert_eq!(duplicate, Err(Error::DuplicateBudget("food".to_string())));
    }

    #[test]
    fn create_allows_same_category_in_different_periods() {
        let mut store = get_stores().budgets;
        store
            .create(&owner(), CategoryName::new_unchecked("food"), 500.0, august())
            .unwrap();

        let september = store.create(
            &owner(),
            CategoryName::new_unchecked("food"),
            500.0,
            "2024-09".parse().unwrap(),
        );

        assert!(september.is_ok());
    }

    #[test]
    fn create_allows_same_category_for_different_owners() {
        let mut store = get_stores().budgets;
        store
            .create(&owner(), CategoryName::new_unchecked("food"), 500.0, august())
            .unwrap();

        let other = store.create(
            &OwnerId::new("user-2"),
            CategoryName::new_unchecked("food"),
            500.0,
            august(),
        );

        assert!(other.is_ok());
    }

    #[test]
    fn list_returns_owners_budgets_for_period_sorted_by_category() {
        let mut store = get_stores().budgets;
        store
            .create(&owner(), CategoryName::new_unchecked("rent"), 1000.0, august())
            .unwrap();
        store
            .create(&owner(), CategoryName::new_unchecked("food"), 500.0, august())
            .unwrap();
        store
            .create(
                &owner(),
                CategoryName::new_unchecked("food"),
                450.0,
                "2024-07".parse().unwrap(),
            )
            .unwrap();
        store
            .create(
                &OwnerId::new("user-2"),
                CategoryName::new_unchecked("travel"),
                300.0,
                august(),
            )
            .unwrap();

        let budgets = store.list(&owner(), august()).unwrap();

        let categories: Vec<&str> = budgets
            .iter()
            .map(|budget| budget.category.as_ref())
            .collect();
        assert_eq!(categories, ["food", "rent"]);
        assert_eq!(budgets[0].limit, 500.0);
    }

    #[test]
    fn update_limit_replaces_limit() {
        let mut store = get_stores().budgets;
        let budget = store
            .create(&owner(), CategoryName::new_unchecked("food"), 500.0, august())
            .unwrap();

        let updated = store.update_limit(&owner(), budget.id, 650.0).unwrap();

        assert_eq!(updated.limit, 650.0);
        assert_eq!(updated.id, budget.id);
        assert_eq!(store.list(&owner(), august()).unwrap()[0].limit, 650.0);
    }

    #[test]
    fn update_limit_fails_on_missing_budget() {
        let mut store = get_stores().budgets;

        let result = store.update_limit(&owner(), 1337, 650.0);

        assert_eq!(result, Err(Error::UpdateMissingBudget));
    }

    #[test]
    fn update_limit_rejects_invalid_limit() {
        let mut store = get_stores().budgets;
        let budget = store
            .create(&owner(), CategoryName::new_unchecked("food"), 500.0, august())
            .unwrap();

        let result = store.update_limit(&owner(), budget.id, f64::NAN);

        assert!(matches!(result, Err(Error::InvalidLimit(_))));
    }

    #[test]
    fn delete_removes_budget() {
        let mut store = get_stores().budgets;
        let budget = store
            .create(&owner(), CategoryName::new_unchecked("food"), 500.0, august())
            .unwrap();

        store.delete(&owner(), budget.id).unwrap();

        assert!(store.list(&owner(), august()).unwrap().is_empty());
    }

    #[test]
    fn delete_fails_on_missing_or_foreign_budget() {
        let mut store = get_stores().budgets;
        let budget = store
            .create(&owner(), CategoryName::new_unchecked("food"), 500.0, august())
            .unwrap();

        assert_eq!(
            store.delete(&OwnerId::new("user-2"), budget.id),
            Err(Error::DeleteMissingBudget)
        );
        assert_eq!(store.delete(&owner(), 1337), Err(Error::DeleteMissingBudget));
    }
}
