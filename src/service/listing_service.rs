//! Listing lifecycle: creation, edits with history, renewal, deletion.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::domain::{
    EventBus, Listing, ListingId, MarketEvent, MarketStore, UserId, VehicleId,
};
use crate::error::MarketError;

/// Orchestration layer for listing operations.
///
/// Deactivation-on-sale is not here: it is a side effect of trade
/// completion, owned by the trade engine.
#[derive(Debug, Clone)]
pub struct ListingService {
    store: Arc<MarketStore>,
    event_bus: EventBus,
    renewal_cooldown: Duration,
}

impl ListingService {
    /// Creates a new `ListingService` with the given renewal cooldown in
    /// hours.
    #[must_use]
    pub fn new(store: Arc<MarketStore>, event_bus: EventBus, renewal_cooldown_hours: u64) -> Self {
        Self {
            store,
            event_bus,
            renewal_cooldown: Duration::hours(
                i64::try_from(renewal_cooldown_hours).unwrap_or(i64::MAX),
            ),
        }
    }

    /// Lists a vehicle for sale.
    ///
    /// # Errors
    ///
    /// - [`MarketError::NotFound`] if the vehicle does not resolve.
    /// - [`MarketError::Forbidden`] if the seller does not own it.
    /// - [`MarketError::Conflict`] if it is already listed, auctioned, or
    ///   in a trade.
    /// - [`MarketError::ValidationFailed`] for a non-positive price.
    pub async fn create_listing(
        &self,
        vehicle_id: VehicleId,
        seller_id: UserId,
        price_cents: i64,
        description: String,
        tags: Vec<String>,
    ) -> Result<Listing, MarketError> {
        if price_cents <= 0 {
            return Err(MarketError::ValidationFailed(
                "listing price must be positive".to_string(),
            ));
        }

        let mut vehicle = self.store.get_vehicle(vehicle_id).await?;
        if vehicle.owner_id != seller_id {
            return Err(MarketError::Forbidden(
                "only the owner may list a vehicle".to_string(),
            ));
        }
        if !vehicle.is_available() {
            return Err(MarketError::Conflict(
                "vehicle is already listed, auctioned, or in a trade".to_string(),
            ));
        }

        let listing = Listing::new(vehicle_id, seller_id, price_cents, description, tags);
        vehicle.is_listed = true;
        vehicle.listing_id = Some(listing.id);
        self.store.save_vehicle(vehicle).await?;
        let listing_id = self.store.insert_listing(listing.clone()).await;

        let _ = self.event_bus.publish(MarketEvent::ListingAdded {
            listing_id,
            vehicle_id,
            seller_id,
            timestamp: Utc::now(),
        });

        tracing::info!(%listing_id, %vehicle_id, %seller_id, "listing created");
        Ok(listing)
    }

    /// Applies price and/or description edits, recording each change in
    /// the listing history before it takes effect. `original_price_cents`
    /// is never touched.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError`] for missing listing, non-owner actor,
    /// inactive listing, or a non-positive price.
    pub async fn update_listing(
        &self,
        listing_id: ListingId,
        actor_id: UserId,
        new_price_cents: Option<i64>,
        new_description: Option<String>,
    ) -> Result<Listing, MarketError> {
        let mut listing = self.owned_active_listing(listing_id, actor_id).await?;

        if let Some(price) = new_price_cents {
            if price <= 0 {
                return Err(MarketError::ValidationFailed(
                    "listing price must be positive".to_string(),
                ));
            }
            if price != listing.price_cents {
                listing.change_price(price);
            }
        }
        if let Some(description) = new_description
            && description != listing.description
        {
            listing.change_description(description);
        }

        let listing = self.store.save_listing(listing).await?;
        self.publish_updated(&listing);
        Ok(listing)
    }

    /// Renews a listing, bumping its recency-sort signal.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidState`] while the renewal cooldown
    /// has not elapsed, plus the usual ownership errors.
    pub async fn renew_listing(
        &self,
        listing_id: ListingId,
        actor_id: UserId,
    ) -> Result<Listing, MarketError> {
        let mut listing = self.owned_active_listing(listing_id, actor_id).await?;

        let now = Utc::now();
        if !listing.can_renew_at(now) {
            return Err(MarketError::InvalidState(format!(
                "listing cannot be renewed before {}",
                listing.can_renew_after.to_rfc3339()
            )));
        }
        listing.renew_at(now, self.renewal_cooldown);

        let listing = self.store.save_listing(listing).await?;
        self.publish_updated(&listing);

        tracing::info!(%listing_id, "listing renewed");
        Ok(listing)
    }

    /// Deletes a listing and releases the vehicle's listed flag.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Conflict`] while a non-terminal trade still
    /// references the listing, plus the usual ownership errors.
    pub async fn delete_listing(
        &self,
        listing_id: ListingId,
        actor_id: UserId,
    ) -> Result<(), MarketError> {
        let listing = self.store.get_listing(listing_id).await?;
        if listing.seller_id != actor_id {
            return Err(MarketError::Forbidden(
                "only the seller may delete a listing".to_string(),
            ));
        }
        let open_trades = self.store.list_open_trades_for_listing(listing_id).await;
        if !open_trades.is_empty() {
            return Err(MarketError::Conflict(
                "listing has open trades; resolve them first".to_string(),
            ));
        }

        self.store.remove_listing(listing_id).await?;
        if let Ok(mut vehicle) = self.store.get_vehicle(listing.vehicle_id).await {
            vehicle.is_listed = false;
            vehicle.listing_id = None;
            if let Err(err) = self.store.save_vehicle(vehicle).await {
                tracing::warn!(vehicle_id = %listing.vehicle_id, %err, "vehicle release failed");
            }
        }

        let _ = self.event_bus.publish(MarketEvent::ListingDeleted {
            listing_id,
            timestamp: Utc::now(),
        });

        tracing::info!(%listing_id, "listing deleted");
        Ok(())
    }

    /// Fetches a listing and bumps its view counter.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the listing does not resolve.
    pub async fn view_listing(&self, listing_id: ListingId) -> Result<Listing, MarketError> {
        let mut listing = self.store.get_listing(listing_id).await?;
        listing.views = listing.views.saturating_add(1);
        self.store.save_listing(listing).await
    }

    /// Returns all active listings, newest renewal first.
    pub async fn list_active(&self) -> Vec<Listing> {
        self.store.list_active_listings().await
    }

    async fn owned_active_listing(
        &self,
        listing_id: ListingId,
        actor_id: UserId,
    ) -> Result<Listing, MarketError> {
        let listing = self.store.get_listing(listing_id).await?;
        if listing.seller_id != actor_id {
            return Err(MarketError::Forbidden(
                "only the seller may modify a listing".to_string(),
            ));
        }
        if !listing.is_active {
            return Err(MarketError::InvalidState(
                "listing is no longer active".to_string(),
            ));
        }
        Ok(listing)
    }

    fn publish_updated(&self, listing: &Listing) {
        let _ = self.event_bus.publish(MarketEvent::ListingUpdated {
            listing_id: listing.id,
            is_active: listing.is_active,
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Vehicle;

    struct Fixture {
        service: ListingService,
        store: Arc<MarketStore>,
        seller: UserId,
        vehicle: VehicleId,
    }

    async fn setup() -> Fixture {
        let store = Arc::new(MarketStore::new());
        let event_bus = EventBus::new(1000);
        let service = ListingService::new(Arc::clone(&store), event_bus, 12);

        let seller = UserId::new();
        let vehicle = store
            .insert_vehicle(Vehicle::new(
                seller,
                "Ford".to_string(),
                "Focus".to_string(),
                2017,
                "1FADP3F29HL200003".to_string(),
                78_000,
                "manual".to_string(),
                800_000,
            ))
            .await;

        Fixture {
            service,
            store,
            seller,
            vehicle,
        }
    }

    async fn create_default_listing(fx: &Fixture) -> Listing {
        let result = fx
            .service
            .create_listing(
                fx.vehicle,
                fx.seller,
                850_000,
                "Good commuter".to_string(),
                vec!["hatchback".to_string()],
            )
            .await;
        let Ok(listing) = result else {
            panic!("listing creation failed: {result:?}");
        };
        listing
    }

    #[tokio::test]
    async fn create_flags_vehicle_as_listed() {
        let fx = setup().await;
        let listing = create_default_listing(&fx).await;

        assert!(listing.is_active);
        assert_eq!(listing.original_price_cents, 850_000);

        let Ok(vehicle) = fx.store.get_vehicle(fx.vehicle).await else {
            panic!("vehicle missing");
        };
        assert!(vehicle.is_listed);
        assert_eq!(vehicle.listing_id, Some(listing.id));
    }

    #[tokio::test]
    async fn create_rejects_double_listing() {
        let fx = setup().await;
        let _first = create_default_listing(&fx).await;

        let result = fx
            .service
            .create_listing(fx.vehicle, fx.seller, 900_000, "again".to_string(), vec![])
            .await;
        assert!(matches!(result, Err(MarketError::Conflict(_))));
    }

    #[tokio::test]
    async fn create_rejects_non_owner() {
        let fx = setup().await;
        let result = fx
            .service
            .create_listing(fx.vehicle, UserId::new(), 900_000, "not mine".to_string(), vec![])
            .await;
        assert!(matches!(result, Err(MarketError::Forbidden(_))));
    }

    #[tokio::test]
    async fn price_edit_recorded_before_apply() {
        let fx = setup().await;
        let listing = create_default_listing(&fx).await;

        let Ok(updated) = fx
            .service
            .update_listing(listing.id, fx.seller, Some(800_000), None)
            .await
        else {
            panic!("update failed");
        };

        assert_eq!(updated.price_cents, 800_000);
        assert_eq!(updated.original_price_cents, 850_000);
        assert_eq!(updated.history.len(), 1);
    }

    #[tokio::test]
    async fn renewal_cooldown_enforced() {
        let fx = setup().await;
        let listing = create_default_listing(&fx).await;

        let Ok(renewed) = fx.service.renew_listing(listing.id, fx.seller).await else {
            panic!("first renewal failed");
        };
        assert!(renewed.can_renew_after > Utc::now());

        // Second attempt inside the 12 h window is refused.
        let result = fx.service.renew_listing(listing.id, fx.seller).await;
        assert!(matches!(result, Err(MarketError::InvalidState(_))));
    }

    #[tokio::test]
    async fn renewal_succeeds_after_cooldown() {
        let fx = setup().await;
        let listing = create_default_listing(&fx).await;

        let Ok(_) = fx.service.renew_listing(listing.id, fx.seller).await else {
            panic!("first renewal failed");
        };

        // Rewind the cooldown as if 13 hours had passed.
        let Ok(mut stored) = fx.store.get_listing(listing.id).await else {
            panic!("listing missing");
        };
        stored.can_renew_after = Utc::now() - Duration::hours(1);
        let Ok(_) = fx.store.save_listing(stored).await else {
            panic!("save failed");
        };

        let result = fx.service.renew_listing(listing.id, fx.seller).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn view_bumps_counter() {
        let fx = setup().await;
        let listing = create_default_listing(&fx).await;

        let Ok(_) = fx.service.view_listing(listing.id).await else {
            panic!("view failed");
        };
        let Ok(viewed) = fx.service.view_listing(listing.id).await else {
            panic!("view failed");
        };
        assert_eq!(viewed.views, 2);
    }

    #[tokio::test]
    async fn delete_releases_vehicle() {
        let fx = setup().await;
        let listing = create_default_listing(&fx).await;

        let Ok(()) = fx.service.delete_listing(listing.id, fx.seller).await else {
            panic!("delete failed");
        };

        let Ok(vehicle) = fx.store.get_vehicle(fx.vehicle).await else {
            panic!("vehicle missing");
        };
        assert!(!vehicle.is_listed);
        assert!(vehicle.listing_id.is_none());
        assert!(fx.store.get_listing(listing.id).await.is_err());
    }

    #[tokio::test]
    async fn delete_blocked_by_open_trade() {
        let fx = setup().await;
        let listing = create_default_listing(&fx).await;

        let trade = crate::domain::Trade::new(
            listing.id,
            UserId::new(),
            fx.seller,
            crate::domain::OfferTerms::new(10_000, vec![]),
        );
        fx.store.insert_trade(trade).await;

        let result = fx.service.delete_listing(listing.id, fx.seller).await;
        assert!(matches!(result, Err(MarketError::Conflict(_))));
    }
}
