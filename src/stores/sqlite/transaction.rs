//! Implements a SQLite backed transaction store.
use std::{
    ops::RangeInclusive,
    sync::{Arc, Mutex},
};

use rusqlite::{Connection, Row, params_from_iter, types::Type, types::Value};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    database_id::DatabaseId,
    db::{CreateTable, MapRow},
    stores::{
        TransactionStore,
        transaction::{SortOrder, TransactionQuery},
    },
    transaction::{OwnerId, Transaction, TransactionBuilder},
};

/// Stores transactions in a SQLite database.
///
/// Timestamps are stored as text columns, so rows with a uniform UTC offset
/// sort chronologically as plain strings.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl TransactionStore for SQLiteTransactionStore {
    /// Create a new transaction in the database.
    ///
    /// Builders without an explicit timestamp are stamped with the current
    /// time.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL error.
    fn create(&mut self, builder: TransactionBuilder) -> Result<Transaction, Error> {
        let occurred_at = builder.occurred_at.unwrap_or_else(OffsetDateTime::now_utc);
        let connection = self.connection.lock().unwrap();

        let transaction = connection
            .prepare(
                "INSERT INTO \"transaction\" (owner, kind, category, amount, occurred_at, note, deleted)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)
                 RETURNING id, owner, kind, category, amount, occurred_at, note, deleted",
            )?
            .query_row(
                (
                    builder.owner.as_str(),
                    builder.kind.as_str(),
                    builder.category,
                    builder.amount,
                    occurred_at,
                    builder.note,
                ),
                Self::map_row,
            )?;

        Ok(transaction)
    }

    /// Retrieve a transaction in the database by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to one of `owner`'s transactions,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get(&self, owner: &OwnerId, id: DatabaseId) -> Result<Transaction, Error> {
        let transaction = self.connection.lock().unwrap()
                .prepare("SELECT id, owner, kind, category, amount, occurred_at, note, deleted FROM \"transaction\" WHERE id = ?1 AND owner = ?2")?
                .query_row((id, owner.as_str()), Self::map_row)?;

        Ok(transaction)
    }

    /// Query for `owner`'s transactions in the database.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL error.
    fn get_query(
        &self,
        owner: &OwnerId,
        filter: TransactionQuery,
    ) -> Result<Vec<Transaction>, Error> {
        let mut query_string_parts = vec![
            "SELECT id, owner, kind, category, amount, occurred_at, note, deleted FROM \"transaction\""
                .to_string(),
        ];
        let mut where_clause_parts = vec!["owner = ?1".to_string()];
        let mut query_parameters = vec![Value::Text(owner.as_str().to_string())];

        if !filter.include_deleted {
            where_clause_parts.push("deleted = 0".to_string());
        }

        if let Some(kind) = filter.kind {
            where_clause_parts.push(format!("kind = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(kind.as_str().to_string()));
        }

        if let Some(date_range) = filter.date_range {
            push_date_range(&mut where_clause_parts, &mut query_parameters, date_range);
        }

        query_string_parts.push(String::from("WHERE ") + &where_clause_parts.join(" AND "));

        match filter.sort_date {
            Some(SortOrder::Ascending) => {
                query_string_parts.push("ORDER BY occurred_at ASC".to_string())
            }
            Some(SortOrder::Descending) => {
                query_string_parts.push("ORDER BY occurred_at DESC".to_string())
            }
            None => {}
        }

        if let Some(limit) = filter.limit {
            query_string_parts.push(format!("LIMIT {limit}"));
        }

        let query_string = query_string_parts.join(" ");
        let params = params_from_iter(query_parameters.iter());

        self.connection
            .lock()
            .unwrap()
            .prepare(&query_string)?
            .query_map(params, Self::map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
            .collect()
    }

    /// Sum `owner`'s non-deleted expenses per normalized category.
    ///
    /// Grouping normalizes in SQL with `TRIM(LOWER(category))`, which matches
    /// the in-memory normalization for ASCII labels.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL error.
    fn sum_by_category(
        &self,
        owner: &OwnerId,
        date_range: Option<RangeInclusive<Date>>,
    ) -> Result<Vec<(String, f64)>, Error> {
        let mut query_string_parts = vec![
            "SELECT TRIM(LOWER(category)) AS category, SUM(amount) AS total FROM \"transaction\""
                .to_string(),
        ];
        let mut where_clause_parts = vec![
            "owner = ?1".to_string(),
            "kind = 'expense'".to_string(),
            "deleted = 0".to_string(),
        ];
        let mut query_parameters = vec![Value::Text(owner.as_str().to_string())];

        if let Some(date_range) = date_range {
            push_date_range(&mut where_clause_parts, &mut query_parameters, date_range);
        }

        query_string_parts.push(String::from("WHERE ") + &where_clause_parts.join(" AND "));
        query_string_parts
            .push("GROUP BY TRIM(LOWER(category)) ORDER BY total DESC, category ASC".to_string());

        let query_string = query_string_parts.join(" ");
        let params = params_from_iter(query_parameters.iter());

        self.connection
            .lock()
            .unwrap()
            .prepare(&query_string)?
            .query_map(params, |row| Ok((row.get(0)?, row.get(1)?)))?
            .map(|maybe_total| maybe_total.map_err(Error::SqlError))
            .collect()
    }

    /// Mark one of `owner`'s transactions as deleted without removing the row.
    ///
    /// # Errors
    /// This function will return a [Error::DeleteMissingTransaction] if `id`
    /// does not refer to one of `owner`'s non-deleted transactions.
    fn soft_delete(&mut self, owner: &OwnerId, id: DatabaseId) -> Result<(), Error> {
        let rows_updated = self.connection.lock().unwrap().execute(
            "UPDATE \"transaction\" SET deleted = 1 WHERE id = ?1 AND owner = ?2 AND deleted = 0",
            (id, owner.as_str()),
        )?;

        if rows_updated == 0 {
            return Err(Error::DeleteMissingTransaction);
        }

        Ok(())
    }

    /// Restore one of `owner`'s soft-deleted transactions.
    ///
    /// # Errors
    /// This function will return a [Error::UpdateMissingTransaction] if `id`
    /// does not refer to one of `owner`'s soft-deleted transactions.
    fn undelete(&mut self, owner: &OwnerId, id: DatabaseId) -> Result<(), Error> {
        let rows_updated = self.connection.lock().unwrap().execute(
            "UPDATE \"transaction\" SET deleted = 0 WHERE id = ?1 AND owner = ?2 AND deleted = 1",
            (id, owner.as_str()),
        )?;

        if rows_updated == 0 {
            return Err(Error::UpdateMissingTransaction);
        }

        Ok(())
    }
}

/// Add an inclusive date filter on `occurred_at`.
///
/// The upper bound is rewritten as an exclusive bound on the next day so that
/// timestamps later on the final date still match when compared as text.
fn push_date_range(
    where_clause_parts: &mut Vec<String>,
    query_parameters: &mut Vec<Value>,
    date_range: RangeInclusive<Date>,
) {
    let end_exclusive = date_range.end().next_day().unwrap_or(*date_range.end());

    where_clause_parts.push(format!(
        "occurred_at >= ?{} AND occurred_at < ?{}",
        query_parameters.len() + 1,
        query_parameters.len() + 2,
    ));
    query_parameters.push(Value::Text(date_range.start().to_string()));
    query_parameters.push(Value::Text(end_exclusive.to_string()));
}

impl CreateTable for SQLiteTransactionStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS \"transaction\" (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    owner TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    category TEXT NOT NULL,
                    amount REAL NOT NULL,
                    occurred_at TEXT NOT NULL,
                    note TEXT,
                    deleted INTEGER NOT NULL DEFAULT 0
                    )",
            (),
        )?;

        // Ensure the sequence starts at 1
        connection.execute(
            "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteTransactionStore {
    type ReturnType = Transaction;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let raw_kind: String = row.get(offset + 2)?;
        let kind = raw_kind.parse().map_err(|error: Error| {
            rusqlite::Error::FromSqlConversionFailure(offset + 2, Type::Text, Box::new(error))
        })?;

        Ok(Transaction {
            id: row.get(offset)?,
            owner: OwnerId::new(&row.get::<_, String>(offset + 1)?),
            kind,
            category: row.get(offset + 3)?,
            amount: row.get(offset + 4)?,
            occurred_at: row.get(offset + 5)?,
            note: row.get(offset + 6)?,
            deleted: row.get(offset + 7)?,
        })
    }
}
