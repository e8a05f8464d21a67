//! Category label handling shared by every grouping and comparison site.
//!
//! Transactions carry free-text category labels typed by the user, so
//! "Food ", "food" and "FOOD" must all land in the same bucket. All code
//! that groups or compares categories goes through [normalize_category].

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Normalize a raw category label for grouping and comparison.
///
/// Matching is case-insensitive and ignores surrounding whitespace.
pub fn normalize_category(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A category label that has been normalized and checked to be non-empty.
///
/// Budgets store their category in this form so that matching against
/// transaction categories never depends on the call site normalizing first.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a normalized category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategory] if `raw` is empty
    /// or contains only whitespace.
    pub fn new(raw: &str) -> Result<Self, Error> {
        let normalized = normalize_category(raw);

        if normalized.is_empty() {
            Err(Error::EmptyCategory)
        } else {
            Ok(Self(normalized))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is non-empty and already
    /// normalized.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
