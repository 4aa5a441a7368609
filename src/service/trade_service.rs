//! Trade negotiation engine.
//!
//! Owns the lifecycle of a [`Trade`]: creation, counter-offers,
//! acceptance tracking, completion, and terminal resolution. Mutates the
//! associated vehicle and listing status flags as side effects and
//! appends an immutable history entry for every transition.
//!
//! Every operation is a stateless read-validate-mutate-save cycle: all
//! validation happens against cloned state before anything is written, so
//! a rejected operation leaves no partial writes behind. Saves are
//! compare-and-swap on the entity version, so racing counters surface as
//! `Conflict` instead of silently clobbering each other.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    EntityRef, EventBus, Listing, ListingId, MarketEvent, MarketStore, OfferTerms, Party, Trade,
    TradeAction, TradeId, TradeResolution, TradeStatus, User, UserId, Vehicle, VehicleId,
};
use crate::error::MarketError;
use crate::service::IdempotencyCache;

/// A trade with its listing and counterparty resolved at the data-access
/// boundary.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TradeDetail {
    /// The trade record itself.
    pub trade: Trade,
    /// The targeted listing, expanded.
    pub listing: EntityRef<ListingId, Listing>,
    /// The other party from the viewer's perspective, expanded.
    pub counterparty: EntityRef<UserId, User>,
}

/// Orchestration layer for the negotiation protocol.
///
/// Holds the store for state, the event bus for fire-and-forget delivery,
/// and the idempotency cache for duplicate-submission protection.
#[derive(Debug, Clone)]
pub struct TradeService {
    store: Arc<MarketStore>,
    event_bus: EventBus,
    idempotency: Arc<IdempotencyCache>,
}

impl TradeService {
    /// Creates a new `TradeService`.
    #[must_use]
    pub fn new(
        store: Arc<MarketStore>,
        event_bus: EventBus,
        idempotency: Arc<IdempotencyCache>,
    ) -> Self {
        Self {
            store,
            event_bus,
            idempotency,
        }
    }

    /// Opens a new trade against a listing with the offerer's initial
    /// terms.
    ///
    /// All vehicles in the terms are locked (`in_trade`) on success.
    ///
    /// # Errors
    ///
    /// - [`MarketError::NotFound`] if the listing or an offered vehicle
    ///   does not resolve.
    /// - [`MarketError::InvalidState`] if the listing is inactive.
    /// - [`MarketError::Forbidden`] if the offerer is the seller or does
    ///   not own an offered vehicle.
    /// - [`MarketError::Conflict`] if an offered vehicle is already
    ///   listed, auctioned, or locked in another trade.
    /// - [`MarketError::ValidationFailed`] for empty or malformed terms.
    pub async fn create_trade(
        &self,
        listing_id: ListingId,
        offerer_id: UserId,
        terms: OfferTerms,
        message: Option<String>,
    ) -> Result<Trade, MarketError> {
        validate_terms(&terms)?;

        let listing = self.store.get_listing(listing_id).await?;
        if !listing.is_active {
            return Err(MarketError::InvalidState(
                "listing is no longer active".to_string(),
            ));
        }
        if listing.seller_id == offerer_id {
            return Err(MarketError::Forbidden(
                "cannot open a trade against your own listing".to_string(),
            ));
        }

        let vehicles = self
            .load_available_vehicles(&terms.vehicle_ids, offerer_id, None)
            .await?;

        let mut trade = Trade::new(listing_id, offerer_id, listing.seller_id, terms);
        trade.record(TradeAction::Created, offerer_id, message);

        let trade_id = self.store.insert_trade(trade.clone()).await;
        self.lock_vehicles(vehicles, trade_id).await;

        let _ = self.event_bus.publish(MarketEvent::TradeCreated {
            trade_id,
            listing_id,
            offerer_id,
            receiver_id: trade.receiver_id,
            timestamp: Utc::now(),
        });

        tracing::info!(%trade_id, %listing_id, %offerer_id, "trade created");
        Ok(trade)
    }

    /// Replaces the acting side's terms with a counter-offer.
    ///
    /// Resets both acceptance flags, flips the turn, and reconciles the
    /// acting side's vehicle locks (newly added vehicles are locked,
    /// dropped ones released).
    ///
    /// # Errors
    ///
    /// - [`MarketError::InvalidState`] if the trade is terminal or it is
    ///   not the actor's turn.
    /// - [`MarketError::Forbidden`] if the actor is not a party.
    /// - Vehicle and validation errors as in [`Self::create_trade`].
    pub async fn counter_offer(
        &self,
        trade_id: TradeId,
        actor_id: UserId,
        terms: OfferTerms,
        message: Option<String>,
        idempotency_key: Option<String>,
    ) -> Result<Trade, MarketError> {
        let mut trade = self.store.get_trade(trade_id).await?;
        let party = party_of(&trade, actor_id)?;

        if self
            .is_replay("counter", trade_id, actor_id, idempotency_key.as_deref())
            .await
        {
            return Ok(trade);
        }
        check_not_terminal(&trade)?;

        if trade.turn != party {
            return Err(MarketError::InvalidState(
                "not your turn to counter".to_string(),
            ));
        }
        validate_terms(&terms)?;

        let previous: Vec<VehicleId> = trade.terms_of(party).vehicle_ids.clone();
        let added: Vec<VehicleId> = terms
            .vehicle_ids
            .iter()
            .copied()
            .filter(|id| !previous.contains(id))
            .collect();
        let dropped: Vec<VehicleId> = previous
            .iter()
            .copied()
            .filter(|id| !terms.vehicle_ids.contains(id))
            .collect();

        let to_lock = self
            .load_available_vehicles(&added, actor_id, Some(trade_id))
            .await?;

        trade.set_terms(party, terms);
        trade.offerer_accepted = false;
        trade.receiver_accepted = false;
        trade.status = TradeStatus::Countered;
        trade.turn = party.other();
        trade.record(TradeAction::Countered, actor_id, message);
        let trade = self.store.save_trade(trade).await?;

        // The trade save is the commit point: a lost CAS race returns
        // `Conflict` before any vehicle lock has been touched.
        self.lock_vehicles(to_lock, trade_id).await;
        self.release_vehicles(&dropped).await;

        self.record_key("counter", trade_id, actor_id, idempotency_key)
            .await;
        self.publish_updated(&trade, actor_id);

        tracing::info!(%trade_id, %actor_id, "counter-offer submitted");
        Ok(trade)
    }

    /// Sets the acting side's acceptance flag; completes the trade once
    /// both flags are set.
    ///
    /// # Errors
    ///
    /// - [`MarketError::InvalidState`] if the trade is terminal, the
    ///   actor has already accepted the current terms, or the completing
    ///   acceptance finds the listing no longer active.
    /// - [`MarketError::Forbidden`] if the actor is not a party.
    pub async fn accept_offer(
        &self,
        trade_id: TradeId,
        actor_id: UserId,
        idempotency_key: Option<String>,
    ) -> Result<Trade, MarketError> {
        let mut trade = self.store.get_trade(trade_id).await?;
        let party = party_of(&trade, actor_id)?;

        if self
            .is_replay("accept", trade_id, actor_id, idempotency_key.as_deref())
            .await
        {
            return Ok(trade);
        }
        check_not_terminal(&trade)?;

        if trade.accepted(party) {
            return Err(MarketError::InvalidState(
                "you have already accepted the current terms".to_string(),
            ));
        }
        trade.set_accepted(party, true);

        let trade = if trade.offerer_accepted && trade.receiver_accepted {
            trade.status = TradeStatus::Accepted;
            trade.record(TradeAction::Accepted, actor_id, None);
            self.complete(trade, actor_id).await?
        } else {
            trade.status = TradeStatus::PendingAcceptance;
            trade.record(TradeAction::Accepted, actor_id, None);
            let trade = self.store.save_trade(trade).await?;
            self.publish_updated(&trade, actor_id);
            trade
        };

        self.record_key("accept", trade_id, actor_id, idempotency_key)
            .await;

        tracing::info!(%trade_id, %actor_id, status = ?trade.status, "offer accepted");
        Ok(trade)
    }

    /// Moves a trade to a terminal failure state and releases every
    /// vehicle lock held by either side's current terms. The listing
    /// stays active for other offers.
    ///
    /// # Errors
    ///
    /// - [`MarketError::InvalidState`] if the trade is already terminal.
    /// - [`MarketError::Forbidden`] if the actor is not a party.
    pub async fn resolve(
        &self,
        trade_id: TradeId,
        actor_id: UserId,
        resolution: TradeResolution,
        idempotency_key: Option<String>,
    ) -> Result<Trade, MarketError> {
        let mut trade = self.store.get_trade(trade_id).await?;
        let _party = party_of(&trade, actor_id)?;

        if self
            .is_replay("resolve", trade_id, actor_id, idempotency_key.as_deref())
            .await
        {
            return Ok(trade);
        }
        check_not_terminal(&trade)?;

        trade.status = resolution.status();
        trade.record(resolution.action(), actor_id, None);
        let trade = self.store.save_trade(trade).await?;

        self.release_vehicles(&trade.all_offered_vehicles()).await;

        self.record_key("resolve", trade_id, actor_id, idempotency_key)
            .await;
        self.publish_updated(&trade, actor_id);

        tracing::info!(%trade_id, %actor_id, status = ?trade.status, "trade resolved");
        Ok(trade)
    }

    /// Returns a trade with its listing and counterparty expanded.
    /// Only the two parties may read a trade.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] or [`MarketError::Forbidden`].
    pub async fn get_trade(
        &self,
        trade_id: TradeId,
        viewer_id: UserId,
    ) -> Result<TradeDetail, MarketError> {
        let trade = self.store.get_trade(trade_id).await?;
        let Some(party) = trade.party_of(viewer_id) else {
            return Err(MarketError::Forbidden(
                "you are not a party to this trade".to_string(),
            ));
        };

        let counterparty_id = trade.user_of(party.other());
        let listing = match self.store.get_listing(trade.listing_id).await {
            Ok(listing) => EntityRef::Expanded(listing),
            Err(_) => EntityRef::Reference(trade.listing_id),
        };
        let counterparty = match self.store.get_user(counterparty_id).await {
            Ok(user) => EntityRef::Expanded(user),
            Err(_) => EntityRef::Reference(counterparty_id),
        };

        Ok(TradeDetail {
            trade,
            listing,
            counterparty,
        })
    }

    /// Returns all trades in which the user is a party, newest first.
    pub async fn list_trades_for(&self, user_id: UserId) -> Vec<Trade> {
        self.store.list_trades_for_user(user_id).await
    }

    // ── Internals ───────────────────────────────────────────────────────

    /// Finalizes a mutually-accepted trade: ownership transfer, listing
    /// deactivation, lock release, completion stamp, history entry. Every
    /// other open trade on the listing is rejected and its locks are
    /// released, so the listing can be sold exactly once.
    ///
    /// Idempotent: re-invocation on an already-completed trade is a no-op.
    ///
    /// The CAS save of the sold listing is the sale gate and the trade
    /// save is the commit point; vehicle transfers run only after both
    /// writes stick, so a rejected completion mutates nothing.
    async fn complete(&self, mut trade: Trade, actor_id: UserId) -> Result<Trade, MarketError> {
        if trade.status == TradeStatus::Completed {
            return Ok(trade);
        }

        let now = Utc::now();
        let mut listing = self.store.get_listing(trade.listing_id).await?;
        if !listing.is_active {
            return Err(MarketError::InvalidState(
                "listing has already been sold or delisted".to_string(),
            ));
        }
        listing.mark_sold(trade.offerer_id, now);
        let listing = self.store.save_listing(listing).await?;

        trade.status = TradeStatus::Completed;
        trade.completed_at = Some(now);
        trade.record(TradeAction::Completed, actor_id, None);
        let trade = match self.store.save_trade(trade).await {
            Ok(trade) => trade,
            Err(err) => {
                // The sale never committed; unwind the listing stamp so
                // it is not left sold without a completed trade.
                self.unmark_sold(listing).await;
                return Err(err);
            }
        };

        // Offerer's vehicles go to the receiver.
        self.transfer_vehicles(&trade.offerer_terms.vehicle_ids, trade.receiver_id)
            .await;
        // Receiver's extra vehicles go to the offerer.
        self.transfer_vehicles(&trade.receiver_terms.vehicle_ids, trade.offerer_id)
            .await;
        // The listed vehicle itself goes to the offerer.
        self.transfer_vehicles(&[listing.vehicle_id], trade.offerer_id)
            .await;

        self.reject_open_siblings(&trade).await;

        let _ = self.event_bus.publish(MarketEvent::TradeCompleted {
            trade_id: trade.id,
            listing_id: listing.id,
            participants: [trade.offerer_id, trade.receiver_id],
            timestamp: now,
        });
        let _ = self.event_bus.publish(MarketEvent::ListingUpdated {
            listing_id: listing.id,
            is_active: false,
            timestamp: now,
        });

        tracing::info!(trade_id = %trade.id, listing_id = %listing.id, "trade completed");
        Ok(trade)
    }

    /// Loads and validates vehicles for inclusion in offer terms. A
    /// vehicle already locked by `current_trade` passes the lock check.
    async fn load_available_vehicles(
        &self,
        ids: &[VehicleId],
        owner_id: UserId,
        current_trade: Option<TradeId>,
    ) -> Result<Vec<Vehicle>, MarketError> {
        let mut vehicles = Vec::with_capacity(ids.len());
        for &id in ids {
            let vehicle = self.store.get_vehicle(id).await?;
            if vehicle.owner_id != owner_id {
                return Err(MarketError::Forbidden(format!(
                    "vehicle {id} is not owned by the acting user"
                )));
            }
            let locked_by_this_trade =
                current_trade.is_some() && vehicle.trade_id == current_trade;
            if !vehicle.is_available() && !locked_by_this_trade {
                return Err(MarketError::Conflict(format!(
                    "vehicle {id} is already listed, auctioned, or in another trade"
                )));
            }
            vehicles.push(vehicle);
        }
        Ok(vehicles)
    }

    /// Locks the given vehicles for the trade. Runs only after the trade
    /// save has committed; a lost vehicle save is logged, not surfaced.
    async fn lock_vehicles(&self, vehicles: Vec<Vehicle>, trade_id: TradeId) {
        for mut vehicle in vehicles {
            vehicle.lock_for_trade(trade_id);
            if let Err(err) = self.store.save_vehicle(vehicle).await {
                tracing::warn!(%trade_id, %err, "vehicle lock save failed");
            }
        }
    }

    /// Reverts the sale stamp on a listing whose trade commit failed.
    async fn unmark_sold(&self, mut listing: Listing) {
        let listing_id = listing.id;
        listing.is_active = true;
        listing.sold_at = None;
        listing.sold_to = None;
        if let Err(err) = self.store.save_listing(listing).await {
            tracing::warn!(%listing_id, %err, "listing sale rollback failed");
        }
    }

    /// Rejects every remaining open trade on the sold listing and
    /// releases the vehicles locked by their terms.
    async fn reject_open_siblings(&self, completed: &Trade) {
        let siblings = self
            .store
            .list_open_trades_for_listing(completed.listing_id)
            .await;
        for mut sibling in siblings {
            sibling.status = TradeStatus::Rejected;
            sibling.record(
                TradeAction::Rejected,
                completed.receiver_id,
                Some("listing was sold in another trade".to_string()),
            );
            match self.store.save_trade(sibling).await {
                Ok(sibling) => {
                    self.release_vehicles(&sibling.all_offered_vehicles()).await;
                    self.publish_updated(&sibling, completed.receiver_id);
                }
                Err(err) => {
                    tracing::warn!(listing_id = %completed.listing_id, %err, "sibling trade rejection failed");
                }
            }
        }
    }

    /// Transfers ownership and clears every lock and back-reference on
    /// the given vehicles. Missing vehicles are skipped with a warning.
    async fn transfer_vehicles(&self, ids: &[VehicleId], new_owner: UserId) {
        for &id in ids {
            match self.store.get_vehicle(id).await {
                Ok(mut vehicle) => {
                    vehicle.owner_id = new_owner;
                    vehicle.is_listed = false;
                    vehicle.listing_id = None;
                    vehicle.release_trade_lock();
                    if let Err(err) = self.store.save_vehicle(vehicle).await {
                        tracing::warn!(vehicle_id = %id, %err, "vehicle transfer save failed");
                    } else {
                        let _ = self.event_bus.publish(MarketEvent::VehicleUpdated {
                            vehicle_id: id,
                            owner_id: new_owner,
                            timestamp: Utc::now(),
                        });
                    }
                }
                Err(err) => {
                    tracing::warn!(vehicle_id = %id, %err, "vehicle missing during transfer");
                }
            }
        }
    }

    /// Releases the trade lock on the given vehicles. Best-effort.
    async fn release_vehicles(&self, ids: &[VehicleId]) {
        for &id in ids {
            match self.store.get_vehicle(id).await {
                Ok(mut vehicle) => {
                    vehicle.release_trade_lock();
                    if let Err(err) = self.store.save_vehicle(vehicle).await {
                        tracing::warn!(vehicle_id = %id, %err, "vehicle lock release failed");
                    }
                }
                Err(err) => {
                    tracing::warn!(vehicle_id = %id, %err, "vehicle missing during release");
                }
            }
        }
    }

    /// Returns `true` when the request replays a key recorded within the
    /// deduplication window.
    async fn is_replay(
        &self,
        op: &str,
        trade_id: TradeId,
        actor_id: UserId,
        key: Option<&str>,
    ) -> bool {
        let Some(key) = key else {
            return false;
        };
        let scoped = scoped_key(op, trade_id, actor_id, key);
        if self.idempotency.is_replay(&scoped).await {
            tracing::debug!(%trade_id, %actor_id, op, "idempotent replay, returning current state");
            true
        } else {
            false
        }
    }

    async fn record_key(
        &self,
        op: &str,
        trade_id: TradeId,
        actor_id: UserId,
        key: Option<String>,
    ) {
        if let Some(key) = key {
            self.idempotency
                .record(scoped_key(op, trade_id, actor_id, &key))
                .await;
        }
    }

    fn publish_updated(&self, trade: &Trade, actor_id: UserId) {
        let _ = self.event_bus.publish(MarketEvent::TradeUpdated {
            trade_id: trade.id,
            status: trade.status,
            actor_id,
            participants: [trade.offerer_id, trade.receiver_id],
            timestamp: Utc::now(),
        });
    }
}

fn scoped_key(op: &str, trade_id: TradeId, actor_id: UserId, key: &str) -> String {
    format!("{op}:{trade_id}:{actor_id}:{key}")
}

/// Resolves the actor's side or rejects non-parties.
fn party_of(trade: &Trade, actor_id: UserId) -> Result<Party, MarketError> {
    trade
        .party_of(actor_id)
        .ok_or_else(|| MarketError::Forbidden("you are not a party to this trade".to_string()))
}

/// Rejects mutations against terminal trades.
fn check_not_terminal(trade: &Trade) -> Result<(), MarketError> {
    if trade.status.is_terminal() {
        return Err(MarketError::InvalidState(
            "trade is already in a terminal state".to_string(),
        ));
    }
    Ok(())
}

/// Rejects empty terms and duplicate vehicle references. Negative cash is
/// legal (a cash-back request).
fn validate_terms(terms: &OfferTerms) -> Result<(), MarketError> {
    if terms.cash_cents == 0 && terms.vehicle_ids.is_empty() {
        return Err(MarketError::ValidationFailed(
            "offer terms must include cash or at least one vehicle".to_string(),
        ));
    }
    for (i, id) in terms.vehicle_ids.iter().enumerate() {
        if terms.vehicle_ids.iter().skip(i + 1).any(|other| other == id) {
            return Err(MarketError::ValidationFailed(format!(
                "vehicle {id} appears more than once in the offer"
            )));
        }
    }
    Ok(())
}
