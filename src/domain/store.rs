//! In-memory document store with per-entity maps and versioned saves.
//!
//! [`MarketStore`] is the storage collaborator for all services: find by
//! id, find by filter, insert, and save. Saves on mutable entities are
//! compare-and-swap on the entity's `version` field so concurrent
//! read-modify-write cycles cannot silently clobber each other. There is
//! no enforced referential integrity; services verify that referenced
//! entities exist and are in a valid state before proceeding.
//!
//! Atomicity is per document: a multi-entity mutation (e.g. trade
//! completion) is a sequence of single-document writes.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    Listing, ListingId, Message, MessageId, Trade, TradeId, User, UserId, Vehicle, VehicleId,
};
use crate::error::MarketError;

/// Versioned entities support compare-and-swap saves.
trait Versioned {
    fn version(&self) -> u64;
    fn commit(&mut self, new_version: u64);
}

impl Versioned for Vehicle {
    fn version(&self) -> u64 {
        self.version
    }
    fn commit(&mut self, new_version: u64) {
        self.version = new_version;
        self.updated_at = Utc::now();
    }
}

impl Versioned for Listing {
    fn version(&self) -> u64 {
        self.version
    }
    fn commit(&mut self, new_version: u64) {
        self.version = new_version;
        self.updated_at = Utc::now();
    }
}

impl Versioned for Trade {
    fn version(&self) -> u64 {
        self.version
    }
    fn commit(&mut self, new_version: u64) {
        self.version = new_version;
        self.updated_at = Utc::now();
    }
}

fn save_versioned<K, T>(
    map: &mut HashMap<K, T>,
    key: K,
    mut entity: T,
    kind: &str,
) -> Result<T, MarketError>
where
    K: std::hash::Hash + Eq + std::fmt::Display + Copy,
    T: Versioned + Clone,
{
    let Some(stored) = map.get(&key) else {
        return Err(MarketError::NotFound(kind.to_string()));
    };
    if stored.version() != entity.version() {
        return Err(MarketError::Conflict(format!(
            "{kind} {key} was modified concurrently"
        )));
    }
    entity.commit(entity.version() + 1);
    map.insert(key, entity.clone());
    Ok(entity)
}

/// Central store for all marketplace entities.
///
/// Each entity class lives in its own `RwLock<HashMap>`, so reads on one
/// class never block writes on another, and reads within a class are
/// concurrent.
#[derive(Debug, Default)]
pub struct MarketStore {
    users: RwLock<HashMap<UserId, User>>,
    vehicles: RwLock<HashMap<VehicleId, Vehicle>>,
    listings: RwLock<HashMap<ListingId, Listing>>,
    trades: RwLock<HashMap<TradeId, Trade>>,
    messages: RwLock<HashMap<MessageId, Message>>,
}

impl MarketStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Users ───────────────────────────────────────────────────────────

    /// Inserts a new user.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Conflict`] if the username is taken.
    pub async fn insert_user(&self, user: User) -> Result<UserId, MarketError> {
        let mut map = self.users.write().await;
        if map.values().any(|u| u.username == user.username) {
            return Err(MarketError::Conflict(format!(
                "username {} is already registered",
                user.username
            )));
        }
        let id = user.id;
        map.insert(id, user);
        Ok(id)
    }

    /// Returns the user with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if no such user exists.
    pub async fn get_user(&self, id: UserId) -> Result<User, MarketError> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| MarketError::NotFound("user".to_string()))
    }

    /// Finds a user by login name.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if no such user exists.
    pub async fn find_user_by_username(&self, username: &str) -> Result<User, MarketError> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| MarketError::NotFound("user".to_string()))
    }

    // ── Vehicles ────────────────────────────────────────────────────────

    /// Inserts a new vehicle.
    pub async fn insert_vehicle(&self, vehicle: Vehicle) -> VehicleId {
        let id = vehicle.id;
        self.vehicles.write().await.insert(id, vehicle);
        id
    }

    /// Returns the vehicle with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if no such vehicle exists.
    pub async fn get_vehicle(&self, id: VehicleId) -> Result<Vehicle, MarketError> {
        self.vehicles
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| MarketError::NotFound("vehicle".to_string()))
    }

    /// Returns all vehicles owned by `owner_id`.
    pub async fn list_vehicles_by_owner(&self, owner_id: UserId) -> Vec<Vehicle> {
        self.vehicles
            .read()
            .await
            .values()
            .filter(|v| v.owner_id == owner_id)
            .cloned()
            .collect()
    }

    /// Saves a vehicle with compare-and-swap on its version.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the vehicle no longer exists,
    /// or [`MarketError::Conflict`] if it was modified concurrently.
    pub async fn save_vehicle(&self, vehicle: Vehicle) -> Result<Vehicle, MarketError> {
        let mut map = self.vehicles.write().await;
        save_versioned(&mut map, vehicle.id, vehicle, "vehicle")
    }

    /// Removes a vehicle.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if no such vehicle exists.
    pub async fn remove_vehicle(&self, id: VehicleId) -> Result<Vehicle, MarketError> {
        self.vehicles
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| MarketError::NotFound("vehicle".to_string()))
    }

    // ── Listings ────────────────────────────────────────────────────────

    /// Inserts a new listing.
    pub async fn insert_listing(&self, listing: Listing) -> ListingId {
        let id = listing.id;
        self.listings.write().await.insert(id, listing);
        id
    }

    /// Returns the listing with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if no such listing exists.
    pub async fn get_listing(&self, id: ListingId) -> Result<Listing, MarketError> {
        self.listings
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| MarketError::NotFound("listing".to_string()))
    }

    /// Returns all active listings, newest renewal first.
    pub async fn list_active_listings(&self) -> Vec<Listing> {
        let mut listings: Vec<Listing> = self
            .listings
            .read()
            .await
            .values()
            .filter(|l| l.is_active)
            .cloned()
            .collect();
        listings.sort_by(|a, b| b.last_renewed.cmp(&a.last_renewed));
        listings
    }

    /// Saves a listing with compare-and-swap on its version.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the listing no longer exists,
    /// or [`MarketError::Conflict`] if it was modified concurrently.
    pub async fn save_listing(&self, listing: Listing) -> Result<Listing, MarketError> {
        let mut map = self.listings.write().await;
        save_versioned(&mut map, listing.id, listing, "listing")
    }

    /// Removes a listing.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if no such listing exists.
    pub async fn remove_listing(&self, id: ListingId) -> Result<Listing, MarketError> {
        self.listings
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| MarketError::NotFound("listing".to_string()))
    }

    // ── Trades ──────────────────────────────────────────────────────────

    /// Inserts a new trade.
    pub async fn insert_trade(&self, trade: Trade) -> TradeId {
        let id = trade.id;
        self.trades.write().await.insert(id, trade);
        id
    }

    /// Returns the trade with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if no such trade exists.
    pub async fn get_trade(&self, id: TradeId) -> Result<Trade, MarketError> {
        self.trades
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| MarketError::NotFound("trade".to_string()))
    }

    /// Returns all trades in which `user_id` is a party, newest first.
    pub async fn list_trades_for_user(&self, user_id: UserId) -> Vec<Trade> {
        let mut trades: Vec<Trade> = self
            .trades
            .read()
            .await
            .values()
            .filter(|t| t.offerer_id == user_id || t.receiver_id == user_id)
            .cloned()
            .collect();
        trades.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        trades
    }

    /// Returns all non-terminal trades referencing the given listing.
    pub async fn list_open_trades_for_listing(&self, listing_id: ListingId) -> Vec<Trade> {
        self.trades
            .read()
            .await
            .values()
            .filter(|t| t.listing_id == listing_id && !t.status.is_terminal())
            .cloned()
            .collect()
    }

    /// Saves a trade with compare-and-swap on its version.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the trade no longer exists,
    /// or [`MarketError::Conflict`] if it was modified concurrently.
    pub async fn save_trade(&self, trade: Trade) -> Result<Trade, MarketError> {
        let mut map = self.trades.write().await;
        save_versioned(&mut map, trade.id, trade, "trade")
    }

    // ── Messages ────────────────────────────────────────────────────────

    /// Inserts a new message.
    pub async fn insert_message(&self, message: Message) -> MessageId {
        let id = message.id;
        self.messages.write().await.insert(id, message);
        id
    }

    /// Returns the message with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if no such message exists.
    pub async fn get_message(&self, id: MessageId) -> Result<Message, MarketError> {
        self.messages
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| MarketError::NotFound("message".to_string()))
    }

    /// Returns the conversation between two users ordered by send time.
    pub async fn conversation(&self, a: UserId, b: UserId) -> Vec<Message> {
        let mut messages: Vec<Message> = self
            .messages
            .read()
            .await
            .values()
            .filter(|m| {
                (m.sender_id == a && m.receiver_id == b)
                    || (m.sender_id == b && m.receiver_id == a)
            })
            .cloned()
            .collect();
        messages.sort_by(|x, y| x.sent_at.cmp(&y.sent_at));
        messages
    }

    /// Counts unread messages addressed to `user_id`.
    pub async fn unread_count(&self, user_id: UserId) -> usize {
        self.messages
            .read()
            .await
            .values()
            .filter(|m| m.receiver_id == user_id && !m.read)
            .count()
    }

    /// Overwrites a stored message (used for the monotonic read flip).
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the message no longer exists.
    pub async fn save_message(&self, message: Message) -> Result<Message, MarketError> {
        let mut map = self.messages.write().await;
        if !map.contains_key(&message.id) {
            return Err(MarketError::NotFound("message".to_string()));
        }
        map.insert(message.id, message.clone());
        Ok(message)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::OfferTerms;

    fn make_vehicle(owner: UserId) -> Vehicle {
        Vehicle::new(
            owner,
            "Honda".to_string(),
            "Civic".to_string(),
            2021,
            "2HGFC2F59MH000001".to_string(),
            22_000,
            "manual".to_string(),
            1_800_000,
        )
    }

    #[tokio::test]
    async fn insert_and_get_vehicle() {
        let store = MarketStore::new();
        let owner = UserId::new();
        let vehicle = make_vehicle(owner);
        let id = store.insert_vehicle(vehicle).await;

        let fetched = store.get_vehicle(id).await;
        let Ok(fetched) = fetched else {
            panic!("vehicle not found");
        };
        assert_eq!(fetched.owner_id, owner);
    }

    #[tokio::test]
    async fn get_nonexistent_returns_not_found() {
        let store = MarketStore::new();
        let result = store.get_vehicle(VehicleId::new()).await;
        assert!(matches!(result, Err(MarketError::NotFound(_))));
    }

    #[tokio::test]
    async fn versioned_save_bumps_version() {
        let store = MarketStore::new();
        let id = store.insert_vehicle(make_vehicle(UserId::new())).await;

        let Ok(mut v) = store.get_vehicle(id).await else {
            panic!("vehicle not found");
        };
        v.mileage = 23_000;
        let Ok(saved) = store.save_vehicle(v).await else {
            panic!("save failed");
        };
        assert_eq!(saved.version, 1);
        assert_eq!(saved.mileage, 23_000);
    }

    #[tokio::test]
    async fn stale_save_is_rejected() {
        let store = MarketStore::new();
        let id = store.insert_vehicle(make_vehicle(UserId::new())).await;

        let Ok(first) = store.get_vehicle(id).await else {
            panic!("vehicle not found");
        };
        let stale = first.clone();

        // First writer wins.
        let Ok(_) = store.save_vehicle(first).await else {
            panic!("save failed");
        };

        // Second writer still holds version 0 and must be rejected.
        let result = store.save_vehicle(stale).await;
        assert!(matches!(result, Err(MarketError::Conflict(_))));
    }

    #[tokio::test]
    async fn duplicate_username_rejected() {
        let store = MarketStore::new();
        let Ok(_) = store
            .insert_user(User::new("ana".to_string(), "Ana".to_string()))
            .await
        else {
            panic!("insert failed");
        };
        let result = store
            .insert_user(User::new("ana".to_string(), "Other Ana".to_string()))
            .await;
        assert!(matches!(result, Err(MarketError::Conflict(_))));
    }

    #[tokio::test]
    async fn active_listings_sorted_by_renewal() {
        let store = MarketStore::new();
        let seller = UserId::new();

        let mut older = Listing::new(
            VehicleId::new(),
            seller,
            1_000_000,
            "older".to_string(),
            vec![],
        );
        older.last_renewed = Utc::now() - chrono::Duration::hours(5);
        let mut sold = Listing::new(
            VehicleId::new(),
            seller,
            1_000_000,
            "sold".to_string(),
            vec![],
        );
        sold.is_active = false;
        let newer = Listing::new(
            VehicleId::new(),
            seller,
            1_000_000,
            "newer".to_string(),
            vec![],
        );

        store.insert_listing(older).await;
        store.insert_listing(sold).await;
        store.insert_listing(newer).await;

        let active = store.list_active_listings().await;
        assert_eq!(active.len(), 2);
        let Some(first) = active.first() else {
            panic!("expected listings");
        };
        assert_eq!(first.description, "newer");
    }

    #[tokio::test]
    async fn conversation_is_bidirectional_and_ordered() {
        let store = MarketStore::new();
        let a = UserId::new();
        let b = UserId::new();
        let c = UserId::new();

        store
            .insert_message(Message::new(a, b, "hi".to_string(), None, None))
            .await;
        store
            .insert_message(Message::new(b, a, "hello".to_string(), None, None))
            .await;
        store
            .insert_message(Message::new(a, c, "elsewhere".to_string(), None, None))
            .await;

        let convo = store.conversation(a, b).await;
        assert_eq!(convo.len(), 2);
        assert_eq!(store.unread_count(b).await, 1);
    }

    #[tokio::test]
    async fn open_trades_for_listing_excludes_terminal() {
        let store = MarketStore::new();
        let listing_id = ListingId::new();

        let open = Trade::new(listing_id, UserId::new(), UserId::new(), OfferTerms::default());
        let mut closed = Trade::new(listing_id, UserId::new(), UserId::new(), OfferTerms::default());
        closed.status = crate::domain::TradeStatus::Cancelled;

        store.insert_trade(open).await;
        store.insert_trade(closed).await;

        let open_trades = store.list_open_trades_for_listing(listing_id).await;
        assert_eq!(open_trades.len(), 1);
    }
}
