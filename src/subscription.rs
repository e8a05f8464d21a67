//! Subscriptions: explicitly registered recurring payments, plus the
//! detector that infers likely subscriptions from raw transaction history.

use std::{collections::HashMap, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::{
    Error,
    category::normalize_category,
    database_id::DatabaseId,
    transaction::{OwnerId, Transaction, TransactionKind},
    window::{last_day_of_month, next_month},
};

/// How often a subscription renews.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Renews every day.
    Daily,
    /// Renews every seven days.
    Weekly,
    /// Renews every calendar month (of variable length).
    Monthly,
    /// Renews every calendar quarter.
    Quarterly,
    /// Renews every calendar year.
    Yearly,
}

impl Frequency {
    /// How many billing cycles occur in one year.
    pub fn cycles_per_year(self) -> f64 {
        match self {
            Self::Daily => 365.0,
            Self::Weekly => 52.0,
            Self::Monthly => 12.0,
            Self::Quarterly => 4.0,
            Self::Yearly => 1.0,
        }
    }

    /// The canonical text form stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(Error::InvalidFrequency(s.to_string())),
        }
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Step `date` forward by one billing cycle.
///
/// Calendar month and year steps clamp the day to the last day of the
/// target month, so a subscription billed on Jan 31 renews on Feb 28 (or
/// Feb 29 in a leap year) rather than spilling into March.
pub fn next_renewal(date: Date, frequency: Frequency) -> Date {
    match frequency {
        Frequency::Daily => date + Duration::days(1),
        Frequency::Weekly => date + Duration::days(7),
        Frequency::Monthly => add_months(date, 1),
        Frequency::Quarterly => add_months(date, 3),
        Frequency::Yearly => add_years(date, 1),
    }
}

/// Advance a lapsed renewal date until it is strictly after `today`.
///
/// A renewal falling on `today` itself is considered lapsed and advanced by
/// one more cycle.
pub fn catch_up_renewal(mut renewal: Date, frequency: Frequency, today: Date) -> Date {
    while renewal <= today {
        renewal = next_renewal(renewal, frequency);
    }

    renewal
}

fn add_months(date: Date, months: u32) -> Date {
    let mut year = date.year();
    let mut month = date.month();

    for _ in 0..months {
        (year, month) = next_month(year, month);
    }

    let day = date.day().min(last_day_of_month(year, month));

    Date::from_calendar_date(year, month, day).expect("clamped day is valid for target month")
}

fn add_years(date: Date, years: i32) -> Date {
    let year = date.year() + years;
    let day = date.day().min(last_day_of_month(year, date.month()));

    Date::from_calendar_date(year, date.month(), day)
        .expect("clamped day is valid for target month")
}

/// A recurring payment the owner has explicitly registered.
///
/// Unlike a [SubscriptionCandidate], an explicit subscription carries a real
/// billing [Frequency] and a renewal schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// The ID of the subscription.
    pub id: DatabaseId,
    /// The user that owns this subscription.
    pub owner: OwnerId,
    /// Display name, unique per owner (e.g. "Netflix").
    pub name: String,
    /// The amount charged each billing cycle.
    pub amount: f64,
    /// Free-text category label.
    pub category: String,
    /// How often the subscription renews.
    pub frequency: Frequency,
    /// The date of the first charge.
    pub started_on: Date,
    /// The next date a charge is expected.
    pub next_renewal_on: Date,
    /// Whether the subscription is currently active. Paused subscriptions
    /// are kept for history but excluded from cost projections.
    pub active: bool,
    /// Optional free-text note.
    pub note: Option<String>,
}

impl Subscription {
    /// The projected cost of this subscription over one year.
    pub fn yearly_cost(&self) -> f64 {
        self.amount * self.frequency.cycles_per_year()
    }
}

/// The data needed to register a [Subscription].
///
/// The store assigns the ID and derives the first renewal date from
/// `started_on` and `frequency`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubscription {
    /// The user that will own the subscription.
    pub owner: OwnerId,
    /// Display name, unique per owner once trimmed.
    pub name: String,
    /// The amount charged each billing cycle.
    pub amount: f64,
    /// Free-text category label.
    pub category: String,
    /// How often the subscription renews.
    pub frequency: Frequency,
    /// The date of the first charge.
    pub started_on: Date,
    /// Optional free-text note.
    pub note: Option<String>,
}

/// Roll-up figures for a set of subscriptions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionSummary {
    /// Number of subscriptions, active or not.
    pub total: usize,
    /// Number of active subscriptions.
    pub active: usize,
    /// Combined per-cycle cost of active monthly subscriptions.
    pub monthly_total: f64,
    /// Combined annualized cost of all active subscriptions.
    pub yearly_total: f64,
    /// Average monthly outlay per active subscription, rounded to the
    /// nearest whole amount. Zero when nothing is active.
    pub average_cost: f64,
}

/// Summarize a set of subscriptions into headline totals.
pub fn summarize(subscriptions: &[Subscription]) -> SubscriptionSummary {
    let active: Vec<&Subscription> = subscriptions
        .iter()
        .filter(|subscription| subscription.active)
        .collect();

    let monthly_total: f64 = active
        .iter()
        .filter(|subscription| subscription.frequency == Frequency::Monthly)
        .map(|subscription| subscription.amount)
        .sum();
    let yearly_total: f64 = active
        .iter()
        .map(|subscription| subscription.yearly_cost())
        .sum();
    let average_cost = if active.is_empty() {
        0.0
    } else {
        (monthly_total / active.len() as f64).round()
    };

    SubscriptionSummary {
        total: subscriptions.len(),
        active: active.len(),
        monthly_total,
        yearly_total,
        average_cost,
    }
}

/// A group of repeated transactions that looks like a subscription.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionCandidate {
    /// The normalized note-or-category label shared by the group.
    pub label: String,
    /// The per-occurrence amount shared by the group.
    pub amount: f64,
    /// How many times the signature occurred.
    pub occurrences: usize,
    /// Assumed per-month cost (one occurrence per billing cycle).
    pub monthly_cost: f64,
    /// Projected cost over a year at the assumed monthly cadence.
    pub yearly_projection: f64,
}

/// Infer likely subscriptions from raw transaction history.
///
/// Transactions are grouped by a signature of their normalized
/// note-or-category label and their amount at cent precision; a signature
/// seen at least twice becomes a candidate. The heuristic cannot tell a
/// coincidental repeat purchase from a true subscription, and it assumes a
/// monthly billing cycle because the cadence is not recoverable from the
/// signature alone. Register an explicit [Subscription] to record the real
/// [Frequency].
///
/// Deleted and income rows never produce candidates. Candidates are sorted
/// by monthly cost descending, ties broken by label ascending.
pub fn detect_candidates(transactions: &[Transaction]) -> Vec<SubscriptionCandidate> {
    let mut occurrences_by_signature: HashMap<(String, i64), usize> = HashMap::new();

    for transaction in transactions {
        if transaction.deleted || transaction.kind != TransactionKind::Expense {
            continue;
        }

        let label = normalize_category(transaction.signature_label());
        let cents = (transaction.amount * 100.0).round() as i64;

        *occurrences_by_signature.entry((label, cents)).or_insert(0) += 1;
    }

    let mut candidates: Vec<SubscriptionCandidate> = occurrences_by_signature
        .into_iter()
        .filter(|(_, occurrences)| *occurrences >= 2)
        .map(|((label, cents), occurrences)| {
            let amount = cents as f64 / 100.0;

            SubscriptionCandidate {
                label,
                amount,
                occurrences,
                monthly_cost: amount,
                yearly_projection: amount * 12.0,
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.monthly_cost
            .partial_cmp(&a.monthly_cost)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });

    candidates
}

/// Combined assumed per-month cost of all detected candidates.
pub fn total_monthly_cost(candidates: &[SubscriptionCandidate]) -> f64 {
    candidates
        .iter()
        .map(|candidate| candidate.monthly_cost)
        .sum()
}
