//! Trade negotiation entity: offer terms, status machine, history log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ListingId, TradeId, UserId, VehicleId};

/// One side's current terms: cash plus a set of vehicles.
///
/// Cash may be negative, representing a request for cash back from the
/// other party. The engine never rejects negative values; whether an
/// offer is fair is a presentation-layer concern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferTerms {
    /// Cash component in cents. Negative means cash requested back.
    pub cash_cents: i64,
    /// Vehicles this side puts into the trade.
    pub vehicle_ids: Vec<VehicleId>,
}

impl OfferTerms {
    /// Creates terms from a cash amount and vehicle set.
    #[must_use]
    pub const fn new(cash_cents: i64, vehicle_ids: Vec<VehicleId>) -> Self {
        Self {
            cash_cents,
            vehicle_ids,
        }
    }
}

/// Negotiation status of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    /// Initial state after the offerer submits an offer.
    Pending,
    /// One side has countered; the other side must respond.
    Countered,
    /// Terms have converged; at least one re-confirmation is outstanding.
    PendingAcceptance,
    /// Both sides accepted. Transitional alias on the way to completion.
    Accepted,
    /// Terminal success: vehicles transferred, listing deactivated.
    Completed,
    /// Terminal failure: receiver rejected the offer.
    Rejected,
    /// Terminal failure: a party declined to continue.
    Declined,
    /// Terminal failure: a party cancelled the negotiation.
    Cancelled,
}

impl TradeStatus {
    /// Returns `true` for states from which no further transition is
    /// permitted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Rejected | Self::Declined | Self::Cancelled
        )
    }
}

/// The two sides of a negotiation.
///
/// The trade's `turn` field holds the party that must act next; it is
/// flipped atomically with every counter so out-of-turn submissions are
/// rejected without comparing actor ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    /// The user who initiated the trade against the listing.
    Offerer,
    /// The listing owner receiving the offer.
    Receiver,
}

impl Party {
    /// Returns the opposite side.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Offerer => Self::Receiver,
            Self::Receiver => Self::Offerer,
        }
    }
}

/// Terminal resolution chosen by a party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeResolution {
    /// Receiver turns the offer down.
    Reject,
    /// Either party declines to continue the negotiation.
    Decline,
    /// Either party withdraws from the negotiation.
    Cancel,
}

impl TradeResolution {
    /// The terminal status this resolution produces.
    #[must_use]
    pub const fn status(self) -> TradeStatus {
        match self {
            Self::Reject => TradeStatus::Rejected,
            Self::Decline => TradeStatus::Declined,
            Self::Cancel => TradeStatus::Cancelled,
        }
    }

    /// The history action this resolution records.
    #[must_use]
    pub const fn action(self) -> TradeAction {
        match self {
            Self::Reject => TradeAction::Rejected,
            Self::Decline => TradeAction::Declined,
            Self::Cancel => TradeAction::Cancelled,
        }
    }
}

/// What a [`TradeHistoryEntry`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    /// Initial offer submitted.
    Created,
    /// One side revised its terms.
    Countered,
    /// One side set its acceptance flag.
    Accepted,
    /// Mutual acceptance finalized the trade.
    Completed,
    /// Receiver rejected the offer.
    Rejected,
    /// A party declined to continue.
    Declined,
    /// A party cancelled the negotiation.
    Cancelled,
}

/// Append-only record of one state transition.
///
/// Carries a full snapshot of both sides' terms at the moment of the
/// transition so the negotiation can be replayed from history alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeHistoryEntry {
    /// What happened.
    pub action: TradeAction,
    /// Who did it.
    pub actor: UserId,
    /// Offerer-side terms at this moment.
    pub offerer_terms: OfferTerms,
    /// Receiver-side terms at this moment.
    pub receiver_terms: OfferTerms,
    /// Optional free-form note attached by the actor.
    pub message: Option<String>,
    /// When the transition happened.
    pub at: DateTime<Utc>,
}

/// A peer-to-peer trade negotiation against a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// Unique trade identifier (immutable after creation).
    pub id: TradeId,
    /// Listing the trade targets.
    pub listing_id: ListingId,
    /// User who initiated the trade.
    pub offerer_id: UserId,
    /// Listing owner receiving the offer.
    pub receiver_id: UserId,
    /// Offerer's current terms.
    pub offerer_terms: OfferTerms,
    /// Receiver's current terms (cash/vehicles requested on top of the
    /// listed vehicle).
    pub receiver_terms: OfferTerms,
    /// Whether the offerer has accepted the current terms.
    pub offerer_accepted: bool,
    /// Whether the receiver has accepted the current terms.
    pub receiver_accepted: bool,
    /// Current negotiation status.
    pub status: TradeStatus,
    /// Which side must act next. Flipped with every counter.
    pub turn: Party,
    /// Ordered, append-only transition log.
    pub history: Vec<TradeHistoryEntry>,
    /// Completion timestamp, stamped once on transition to `Completed`.
    pub completed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of last mutation, stamped by the store on save.
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency version, bumped by the store on save.
    pub version: u64,
}

impl Trade {
    /// Creates a new pending trade with the offerer's initial terms.
    /// The receiver is the party that must act next.
    #[must_use]
    pub fn new(
        listing_id: ListingId,
        offerer_id: UserId,
        receiver_id: UserId,
        offerer_terms: OfferTerms,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TradeId::new(),
            listing_id,
            offerer_id,
            receiver_id,
            offerer_terms,
            receiver_terms: OfferTerms::default(),
            offerer_accepted: false,
            receiver_accepted: false,
            status: TradeStatus::Pending,
            turn: Party::Receiver,
            history: Vec::new(),
            completed_at: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Resolves which side of the trade `user_id` is on, if any.
    #[must_use]
    pub fn party_of(&self, user_id: UserId) -> Option<Party> {
        if user_id == self.offerer_id {
            Some(Party::Offerer)
        } else if user_id == self.receiver_id {
            Some(Party::Receiver)
        } else {
            None
        }
    }

    /// Returns the user id on the given side.
    #[must_use]
    pub const fn user_of(&self, party: Party) -> UserId {
        match party {
            Party::Offerer => self.offerer_id,
            Party::Receiver => self.receiver_id,
        }
    }

    /// Returns the terms of the given side.
    #[must_use]
    pub const fn terms_of(&self, party: Party) -> &OfferTerms {
        match party {
            Party::Offerer => &self.offerer_terms,
            Party::Receiver => &self.receiver_terms,
        }
    }

    /// Overwrites the terms of the given side.
    pub fn set_terms(&mut self, party: Party, terms: OfferTerms) {
        match party {
            Party::Offerer => self.offerer_terms = terms,
            Party::Receiver => self.receiver_terms = terms,
        }
    }

    /// Returns the acceptance flag of the given side.
    #[must_use]
    pub const fn accepted(&self, party: Party) -> bool {
        match party {
            Party::Offerer => self.offerer_accepted,
            Party::Receiver => self.receiver_accepted,
        }
    }

    /// Sets the acceptance flag of the given side.
    pub fn set_accepted(&mut self, party: Party, value: bool) {
        match party {
            Party::Offerer => self.offerer_accepted = value,
            Party::Receiver => self.receiver_accepted = value,
        }
    }

    /// Every vehicle id referenced by either side's current terms.
    #[must_use]
    pub fn all_offered_vehicles(&self) -> Vec<VehicleId> {
        let mut ids = self.offerer_terms.vehicle_ids.clone();
        ids.extend(self.receiver_terms.vehicle_ids.iter().copied());
        ids
    }

    /// Appends a history entry snapshotting both sides' current terms.
    pub fn record(&mut self, action: TradeAction, actor: UserId, message: Option<String>) {
        self.history.push(TradeHistoryEntry {
            action,
            actor,
            offerer_terms: self.offerer_terms.clone(),
            receiver_terms: self.receiver_terms.clone(),
            message,
            at: Utc::now(),
        });
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_trade() -> Trade {
        Trade::new(
            ListingId::new(),
            UserId::new(),
            UserId::new(),
            OfferTerms::new(50_000, vec![VehicleId::new()]),
        )
    }

    #[test]
    fn new_trade_is_pending_with_receiver_turn() {
        let t = make_trade();
        assert_eq!(t.status, TradeStatus::Pending);
        assert_eq!(t.turn, Party::Receiver);
        assert!(!t.offerer_accepted);
        assert!(!t.receiver_accepted);
        assert!(t.history.is_empty());
    }

    #[test]
    fn terminal_states() {
        assert!(TradeStatus::Completed.is_terminal());
        assert!(TradeStatus::Rejected.is_terminal());
        assert!(TradeStatus::Declined.is_terminal());
        assert!(TradeStatus::Cancelled.is_terminal());
        assert!(!TradeStatus::Pending.is_terminal());
        assert!(!TradeStatus::Countered.is_terminal());
        assert!(!TradeStatus::PendingAcceptance.is_terminal());
    }

    #[test]
    fn party_resolution() {
        let t = make_trade();
        assert_eq!(t.party_of(t.offerer_id), Some(Party::Offerer));
        assert_eq!(t.party_of(t.receiver_id), Some(Party::Receiver));
        assert_eq!(t.party_of(UserId::new()), None);
        assert_eq!(Party::Offerer.other(), Party::Receiver);
    }

    #[test]
    fn record_snapshots_both_sides() {
        let mut t = make_trade();
        t.receiver_terms = OfferTerms::new(80_000, vec![]);
        t.record(TradeAction::Countered, t.receiver_id, None);

        let Some(entry) = t.history.first() else {
            panic!("expected history entry");
        };
        assert_eq!(entry.action, TradeAction::Countered);
        assert_eq!(entry.receiver_terms.cash_cents, 80_000);
        assert_eq!(entry.offerer_terms, t.offerer_terms);
    }

    #[test]
    fn negative_cash_is_representable() {
        let terms = OfferTerms::new(-25_000, vec![]);
        assert_eq!(terms.cash_cents, -25_000);
    }

    #[test]
    fn resolution_maps_to_status_and_action() {
        assert_eq!(TradeResolution::Reject.status(), TradeStatus::Rejected);
        assert_eq!(TradeResolution::Decline.status(), TradeStatus::Declined);
        assert_eq!(TradeResolution::Cancel.status(), TradeStatus::Cancelled);
        assert_eq!(TradeResolution::Cancel.action(), TradeAction::Cancelled);
    }
}
