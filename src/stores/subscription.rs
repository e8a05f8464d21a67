//! Defines the subscription store trait.

use crate::{
    Error,
    database_id::DatabaseId,
    subscription::{NewSubscription, Subscription},
    transaction::OwnerId,
};

/// Handles the creation and retrieval of explicitly registered subscriptions.
pub trait SubscriptionStore {
    /// Register a subscription and compute its first renewal date.
    ///
    /// Names are trimmed and must be unique per owner.
    fn create(&mut self, new_subscription: NewSubscription) -> Result<Subscription, Error>;

    /// Retrieve `owner`'s subscriptions, soonest renewal first.
    fn list(&self, owner: &OwnerId) -> Result<Vec<Subscription>, Error>;

    /// Pause or resume one of `owner`'s subscriptions.
    fn set_active(
        &mut self,
        owner: &OwnerId,
        id: DatabaseId,
        active: bool,
    ) -> Result<Subscription, Error>;

    /// Remove one of `owner`'s subscriptions.
    fn delete(&mut self, owner: &OwnerId, id: DatabaseId) -> Result<(), Error>;
}
