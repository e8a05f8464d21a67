//! Implements a SQLite backed subscription store.
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, types::Type};

use crate::{
    Error,
    database_id::DatabaseId,
    db::{CreateTable, MapRow},
    stores::SubscriptionStore,
    subscription::{NewSubscription, Subscription, next_renewal},
    transaction::OwnerId,
};

/// Stores explicitly registered subscriptions in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteSubscriptionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteSubscriptionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl SubscriptionStore for SQLiteSubscriptionStore {
    /// Register a subscription in the database.
    ///
    /// The first renewal date is one billing cycle after `started_on`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidAmount] if the amount is negative or not finite,
    /// - [Error::DuplicateSubscription] if the owner already has a
    ///   subscription with the same trimmed name,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create(&mut self, new_subscription: NewSubscription) -> Result<Subscription, Error> {
        if !new_subscription.amount.is_finite() || new_subscription.amount < 0.0 {
            return Err(Error::InvalidAmount(new_subscription.amount));
        }

        let name = new_subscription.name.trim();
        let next_renewal_on = next_renewal(new_subscription.started_on, new_subscription.frequency);
        let connection = self.connection.lock().unwrap();

        let subscription = connection
            .prepare(
                "INSERT INTO subscription (owner, name, amount, category, frequency, started_on, next_renewal_on, active, note)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8)
                 RETURNING id, owner, name, amount, category, frequency, started_on, next_renewal_on, active, note",
            )?
            .query_row(
                (
                    new_subscription.owner.as_str(),
                    name,
                    new_subscription.amount,
                    &new_subscription.category,
                    new_subscription.frequency.as_str(),
                    new_subscription.started_on,
                    next_renewal_on,
                    &new_subscription.note,
                ),
                Self::map_row,
            )
            .map_err(|error| match error {
                // Code 2067 occurs when a UNIQUE constraint failed.
                rusqlite::Error::SqliteFailure(sql_error, Some(_))
                    if sql_error.extended_code == 2067 =>
                {
                    Error::DuplicateSubscription(name.to_string())
                }
                error => error.into(),
            })?;

        Ok(subscription)
    }

    /// Retrieve `owner`'s subscriptions, soonest renewal first.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL error.
    fn list(&self, owner: &OwnerId) -> Result<Vec<Subscription>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, owner, name, amount, category, frequency, started_on, next_renewal_on, active, note
                 FROM subscription WHERE owner = ?1
                 ORDER BY next_renewal_on ASC, name ASC",
            )?
            .query_map((owner.as_str(),), Self::map_row)?
            .map(|maybe_subscription| maybe_subscription.map_err(Error::SqlError))
            .collect()
    }

    /// Pause or resume one of `owner`'s subscriptions.
    ///
    /// # Errors
    /// This function will return a [Error::UpdateMissingSubscription] if `id`
    /// does not refer to one of `owner`'s subscriptions.
    fn set_active(
        &mut self,
        owner: &OwnerId,
        id: DatabaseId,
        active: bool,
    ) -> Result<Subscription, Error> {
        let subscription = self
            .connection
            .lock()
            .unwrap()
            .prepare(
                "UPDATE subscription SET active = ?1 WHERE id = ?2 AND owner = ?3
                 RETURNING id, owner, name, amount, category, frequency, started_on, next_renewal_on, active, note",
            )?
            .query_row((active, id, owner.as_str()), Self::map_row)
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingSubscription,
                error => error.into(),
            })?;

        Ok(subscription)
    }

    /// Remove one of `owner`'s subscriptions.
    ///
    /// # Errors
    /// This function will return a [Error::DeleteMissingSubscription] if `id`
    /// does not refer to one of `owner`'s subscriptions.
    fn delete(&mut self, owner: &OwnerId, id: DatabaseId) -> Result<(), Error> {
        let rows_deleted = self.connection.lock().unwrap().execute(
            "DELETE FROM subscription WHERE id = ?1 AND owner = ?2",
            (id, owner.as_str()),
        )?;

        if rows_deleted == 0 {
            return Err(Error::DeleteMissingSubscription);
        }

        Ok(())
    }
}

impl CreateTable for SQLiteSubscriptionStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS subscription (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    owner TEXT NOT NULL,
                    name TEXT NOT NULL,
                    amount REAL NOT NULL,
                    category TEXT NOT NULL,
                    frequency TEXT NOT NULL,
                    started_on TEXT NOT NULL,
                    next_renewal_on TEXT NOT NULL,
                    active INTEGER NOT NULL DEFAULT 1,
                    note TEXT,
                    UNIQUE(owner, name)
                    )",
            (),
        )?;

        // Ensure the sequence starts at 1
        connection.execute(
            "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('subscription', 0)",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteSubscriptionStore {
    type ReturnType = Subscription;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let raw_frequency: String = row.get(offset + 5)?;
        let frequency = raw_frequency.parse().map_err(|error: Error| {
            rusqlite::Error::FromSqlConversionFailure(offset + 5, Type::Text, Box::new(error))
        })?;

        Ok(Subscription {
            id: row.get(offset)?,
            owner: OwnerId::new(&row.get::<_, String>(offset + 1)?),
            name: row.get(offset + 2)?,
            amount: row.get(offset + 3)?,
            category: row.get(offset + 4)?,
            frequency,
            started_on: row.get(offset + 6)?,
            next_renewal_on: row.get(offset + 7)?,
            active: row.get(offset + 8)?,
            note: row.get(offset + 9)?,
        })
    }
}
