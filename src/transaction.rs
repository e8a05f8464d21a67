//! The transaction model: a single dated income or expense record.
//!
//! Transactions are owned by exactly one user, carry a free-text category
//! label, and support soft deletion so that removed records can be restored
//! without losing history. Aggregation code receives slices of this type.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, category::normalize_category, database_id::DatabaseId};

/// Identifies the user that owns a record.
///
/// Issued by the identity layer per request and treated as opaque here; the
/// engine never inspects it beyond equality checks.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(String);

impl OwnerId {
    /// Wrap a raw owner identifier.
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a transaction adds to or subtracts from the owner's funds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming in, e.g. wages.
    Income,
    /// Money going out, e.g. groceries.
    Expense,
}

impl TransactionKind {
    /// The canonical text form stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(Error::InvalidKind(s.to_string())),
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An expense or income record for one owner.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// The user that owns this record.
    pub owner: OwnerId,
    /// Whether money came in or went out.
    pub kind: TransactionKind,
    /// Free-text category label as entered by the user.
    pub category: String,
    /// The amount of money moved. Never negative; direction comes from `kind`.
    pub amount: f64,
    /// The timestamp the transaction is attributed to.
    pub occurred_at: OffsetDateTime,
    /// Optional free-text note, e.g. "Netflix" or "Rent - March".
    pub note: Option<String>,
    /// Soft-delete flag. Deleted rows are excluded from every aggregate
    /// until undeleted.
    pub deleted: bool,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder::new] for discoverability.
    ///
    /// # Errors
    /// Returns an [Error::InvalidAmount] if `amount` is negative or not a
    /// finite number.
    pub fn build(
        owner: OwnerId,
        kind: TransactionKind,
        amount: f64,
        category: &str,
    ) -> Result<TransactionBuilder, Error> {
        TransactionBuilder::new(owner, kind, amount, category)
    }

    /// The category label normalized for grouping and comparison.
    pub fn normalized_category(&self) -> String {
        normalize_category(&self.category)
    }

    /// The label used for recurring-expense signatures: the note when one is
    /// present and non-blank, otherwise the category.
    pub fn signature_label(&self) -> &str {
        self.note
            .as_deref()
            .filter(|note| !note.trim().is_empty())
            .unwrap_or(&self.category)
    }
}

/// A builder for creating [Transaction] instances.
///
/// The builder validates the amount up front and defers the timestamp: a
/// transaction without an explicit `occurred_at` is stamped by the store at
/// insert time, keeping the aggregation code free of hidden clock reads.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The user the transaction belongs to.
    pub owner: OwnerId,
    /// Whether money came in or went out.
    pub kind: TransactionKind,
    /// Free-text category label.
    pub category: String,
    /// The amount of money moved. Checked to be non-negative on creation.
    pub amount: f64,
    /// When the transaction happened. `None` means "when it is recorded".
    pub occurred_at: Option<OffsetDateTime>,
    /// Optional free-text note.
    pub note: Option<String>,
}

impl TransactionBuilder {
    /// Start building a transaction.
    ///
    /// # Errors
    /// Returns an [Error::InvalidAmount] if `amount` is negative or not a
    /// finite number. Direction is expressed by `kind`, never by sign.
    pub fn new(
        owner: OwnerId,
        kind: TransactionKind,
        amount: f64,
        category: &str,
    ) -> Result<Self, Error> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::InvalidAmount(amount));
        }

        Ok(Self {
            owner,
            kind,
            category: category.to_string(),
            amount,
            occurred_at: None,
            note: None,
        })
    }

    /// Set the timestamp the transaction is attributed to.
    pub fn occurred_at(mut self, at: OffsetDateTime) -> Self {
        self.occurred_at = Some(at);
        self
    }

    /// Attach a free-text note.
    pub fn note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }

    /// Produce the final [Transaction] with a store-assigned `id`.
    ///
    /// `recorded_at` is used as the timestamp when the builder was not given
    /// an explicit one.
    pub fn finalise(self, id: DatabaseId, recorded_at: OffsetDateTime) -> Transaction {
        Transaction {
            id,
            owner: self.owner,
            kind: self.kind,
            category: self.category,
            amount: self.amount,
            occurred_at: self.occurred_at.unwrap_or(recorded_at),
            note: self.note,
            deleted: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::Error;

    use super::{OwnerId, Transaction, TransactionKind};

    #[test]
    fn kind_parses_canonical_strings() {
        assert_eq!("income".parse(), Ok(TransactionKind::Income));
        assert_eq!("expense".parse(), Ok(TransactionKind::Expense));
    }

    #[test]
    fn kind_rejects_unknown_strings() {
        let result = "transfer".parse::<TransactionKind>();

        assert_eq!(result, Err(Error::InvalidKind("transfer".to_string())));
    }

    #[test]
    fn build_rejects_negative_amount() {
        let result = Transaction::build(
            OwnerId::new("user-1"),
            TransactionKind::Expense,
            -12.50,
            "Food",
        );

        assert_eq!(result, Err(Error::InvalidAmount(-12.50)));
    }

    #[test]
    fn build_rejects_non_finite_amount() {
        let result = Transaction::build(
            OwnerId::new("user-1"),
            TransactionKind::Expense,
            f64::NAN,
            "Food",
        );

        assert!(matches!(result, Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn finalise_uses_recorded_time_when_no_explicit_timestamp() {
        let recorded_at = datetime!(2024-08-07 12:00 UTC);

        let transaction = Transaction::build(
            OwnerId::new("user-1"),
            TransactionKind::Expense,
            3.50,
            "Coffee",
        )
        .unwrap()
        .finalise(1, recorded_at);

        assert_eq!(transaction.occurred_at, recorded_at);
        assert!(!transaction.deleted);
    }

    #[test]
    fn finalise_keeps_explicit_timestamp() {
        let occurred_at = datetime!(2024-08-01 09:30 UTC);
        let recorded_at = datetime!(2024-08-07 12:00 UTC);

        let transaction = Transaction::build(
            OwnerId::new("user-1"),
            TransactionKind::Expense,
            3.50,
            "Coffee",
        )
        .unwrap()
        .occurred_at(occurred_at)
        .finalise(1, recorded_at);

        assert_eq!(transaction.occurred_at, occurred_at);
    }

    #[test]
    fn signature_label_prefers_note_over_category() {
        let with_note = Transaction::build(
            OwnerId::new("user-1"),
            TransactionKind::Expense,
            15.99,
            "Entertainment",
        )
        .unwrap()
        .note("Netflix")
        .finalise(1, datetime!(2024-08-07 12:00 UTC));

        let without_note = Transaction::build(
            OwnerId::new("user-1"),
            TransactionKind::Expense,
            15.99,
            "Entertainment",
        )
        .unwrap()
        .note("   ")
        .finalise(2, datetime!(2024-08-07 12:00 UTC));

        assert_eq!(with_note.signature_label(), "Netflix");
        assert_eq!(without_note.signature_label(), "Entertainment");
    }

    #[test]
    fn normalized_category_lowercases_and_trims() {
        let transaction = Transaction::build(
            OwnerId::new("user-1"),
            TransactionKind::Expense,
            50.0,
            "  Groceries ",
        )
        .unwrap()
        .finalise(1, datetime!(2024-08-07 12:00 UTC));

        assert_eq!(transaction.normalized_category(), "groceries");
    }
}
