//! Vehicle entity with trade/listing status flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ListingId, TradeId, UserId, VehicleId};

/// A cataloged vehicle owned by exactly one user.
///
/// The three status flags (`is_listed`, `is_auctioned`, `in_trade`) act as
/// locks: a vehicle may be referenced by at most one active listing and at
/// most one non-terminal trade at a time. The listing and trade back-refs
/// are kept in sync with those flags by the services that flip them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    /// Unique vehicle identifier (immutable after creation).
    pub id: VehicleId,
    /// Current owner. Changes only through trade completion.
    pub owner_id: UserId,
    /// Manufacturer (e.g. `"Toyota"`).
    pub make: String,
    /// Model name.
    pub model: String,
    /// Model year.
    pub year: u16,
    /// Vehicle identification number.
    pub vin: String,
    /// Odometer reading in whole kilometers.
    pub mileage: u32,
    /// Transmission type (free-form, e.g. `"manual"`).
    pub transmission: String,
    /// Estimated valuation in cents.
    pub valuation_cents: i64,
    /// URLs of uploaded images.
    pub image_urls: Vec<String>,
    /// Whether an active listing references this vehicle.
    pub is_listed: bool,
    /// Whether an auction references this vehicle. Never set by this
    /// service; honored as a lock input only.
    pub is_auctioned: bool,
    /// Whether a non-terminal trade references this vehicle.
    pub in_trade: bool,
    /// Back-reference to the active listing, if any.
    pub listing_id: Option<ListingId>,
    /// Back-reference to the non-terminal trade, if any.
    pub trade_id: Option<TradeId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of last mutation, stamped by the store on save.
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency version, bumped by the store on save.
    pub version: u64,
}

impl Vehicle {
    /// Creates a new vehicle record owned by `owner_id`, with all status
    /// flags clear.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        owner_id: UserId,
        make: String,
        model: String,
        year: u16,
        vin: String,
        mileage: u32,
        transmission: String,
        valuation_cents: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: VehicleId::new(),
            owner_id,
            make,
            model,
            year,
            vin,
            mileage,
            transmission,
            valuation_cents,
            image_urls: Vec::new(),
            is_listed: false,
            is_auctioned: false,
            in_trade: false,
            listing_id: None,
            trade_id: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Returns `true` if no listing, auction, or trade currently locks
    /// this vehicle.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        !self.is_listed && !self.is_auctioned && !self.in_trade
    }

    /// Marks the vehicle as locked by the given trade.
    pub fn lock_for_trade(&mut self, trade_id: TradeId) {
        self.in_trade = true;
        self.trade_id = Some(trade_id);
    }

    /// Releases the trade lock.
    pub fn release_trade_lock(&mut self) {
        self.in_trade = false;
        self.trade_id = None;
    }
}
