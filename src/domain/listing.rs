//! Sale listing with change history and renewal cooldown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ListingId, UserId, VehicleId};

/// Which listing field a [`ListingChange`] entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingField {
    /// Asking price changed.
    Price,
    /// Description text edited.
    Description,
}

/// Append-only record of one listing edit.
///
/// Entries are written to [`Listing::history`] before the new value is
/// applied, so the log always covers every change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingChange {
    /// Field that changed.
    pub field: ListingField,
    /// Value before the change (price in cents, or description text).
    pub old_value: String,
    /// Value after the change.
    pub new_value: String,
    /// When the change was applied.
    pub changed_at: DateTime<Utc>,
}

/// A sale listing referencing one vehicle and its seller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Unique listing identifier (immutable after creation).
    pub id: ListingId,
    /// Vehicle offered for sale.
    pub vehicle_id: VehicleId,
    /// Listing owner.
    pub seller_id: UserId,
    /// Current asking price in cents.
    pub price_cents: i64,
    /// Asking price at creation. Never changes.
    pub original_price_cents: i64,
    /// Free-form description.
    pub description: String,
    /// Search tags.
    pub tags: Vec<String>,
    /// Append-only change log for price and description edits.
    pub history: Vec<ListingChange>,
    /// View counter, bumped on every detail fetch.
    pub views: u64,
    /// Whether the listing is open for offers. Cleared irreversibly on sale.
    pub is_active: bool,
    /// When the listing was last renewed; used as the recency-sort signal.
    pub last_renewed: DateTime<Utc>,
    /// Earliest instant at which the next renewal is permitted.
    pub can_renew_after: DateTime<Utc>,
    /// Sale timestamp, stamped on deactivation.
    pub sold_at: Option<DateTime<Utc>>,
    /// Buyer, stamped on deactivation.
    pub sold_to: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of last mutation, stamped by the store on save.
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency version, bumped by the store on save.
    pub version: u64,
}

impl Listing {
    /// Creates a new active listing. `original_price_cents` is fixed to
    /// the initial price and the first renewal is available immediately.
    #[must_use]
    pub fn new(
        vehicle_id: VehicleId,
        seller_id: UserId,
        price_cents: i64,
        description: String,
        tags: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ListingId::new(),
            vehicle_id,
            seller_id,
            price_cents,
            original_price_cents: price_cents,
            description,
            tags,
            history: Vec::new(),
            views: 0,
            is_active: true,
            last_renewed: now,
            can_renew_after: now,
            sold_at: None,
            sold_to: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Records a change entry and applies the new price. The history entry
    /// is appended before `price_cents` is overwritten.
    pub fn change_price(&mut self, new_price_cents: i64) {
        self.history.push(ListingChange {
            field: ListingField::Price,
            old_value: self.price_cents.to_string(),
            new_value: new_price_cents.to_string(),
            changed_at: Utc::now(),
        });
        self.price_cents = new_price_cents;
    }

    /// Records a change entry and applies the new description.
    pub fn change_description(&mut self, new_description: String) {
        self.history.push(ListingChange {
            field: ListingField::Description,
            old_value: std::mem::replace(&mut self.description, new_description.clone()),
            new_value: new_description,
            changed_at: Utc::now(),
        });
    }

    /// Returns `true` if the renewal cooldown has elapsed at `now`.
    #[must_use]
    pub fn can_renew_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.can_renew_after
    }

    /// Applies a renewal at `now`, extending the cooldown window.
    pub fn renew_at(&mut self, now: DateTime<Utc>, cooldown: chrono::Duration) {
        self.last_renewed = now;
        self.can_renew_after = now + cooldown;
    }

    /// Irreversibly deactivates the listing as sold to `buyer` at `now`.
    pub fn mark_sold(&mut self, buyer: UserId, now: DateTime<Utc>) {
        self.is_active = false;
        self.sold_at = Some(now);
        self.sold_to = Some(buyer);
    }
}
