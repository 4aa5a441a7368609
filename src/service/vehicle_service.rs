//! Vehicle catalog: creation, edits, owner-scoped queries, guarded
//! deletion.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{EventBus, MarketEvent, MarketStore, UserId, Vehicle, VehicleId};
use crate::error::MarketError;

/// Attributes the owner may edit after creation. Status flags are owned
/// by the listing/trade services and never editable directly.
#[derive(Debug, Clone, Default)]
pub struct VehicleUpdate {
    /// New odometer reading.
    pub mileage: Option<u32>,
    /// New estimated valuation in cents.
    pub valuation_cents: Option<i64>,
    /// Replacement image URL list.
    pub image_urls: Option<Vec<String>>,
}

/// Orchestration layer for vehicle operations.
#[derive(Debug, Clone)]
pub struct VehicleService {
    store: Arc<MarketStore>,
    event_bus: EventBus,
}

impl VehicleService {
    /// Creates a new `VehicleService`.
    #[must_use]
    pub fn new(store: Arc<MarketStore>, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }

    /// Catalogs a new vehicle for `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ValidationFailed`] for an empty make/model
    /// or an implausible year.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_vehicle(
        &self,
        owner_id: UserId,
        make: String,
        model: String,
        year: u16,
        vin: String,
        mileage: u32,
        transmission: String,
        valuation_cents: i64,
    ) -> Result<Vehicle, MarketError> {
        if make.trim().is_empty() || model.trim().is_empty() {
            return Err(MarketError::ValidationFailed(
                "make and model are required".to_string(),
            ));
        }
        if !(1900..=2100).contains(&year) {
            return Err(MarketError::ValidationFailed(format!(
                "implausible model year {year}"
            )));
        }

        let vehicle = Vehicle::new(
            owner_id,
            make,
            model,
            year,
            vin,
            mileage,
            transmission,
            valuation_cents,
        );
        let vehicle_id = self.store.insert_vehicle(vehicle.clone()).await;

        let _ = self.event_bus.publish(MarketEvent::VehicleAdded {
            vehicle_id,
            owner_id,
            timestamp: Utc::now(),
        });

        tracing::info!(%vehicle_id, %owner_id, "vehicle cataloged");
        Ok(vehicle)
    }

    /// Returns the vehicle with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the vehicle does not resolve.
    pub async fn get_vehicle(&self, vehicle_id: VehicleId) -> Result<Vehicle, MarketError> {
        self.store.get_vehicle(vehicle_id).await
    }

    /// Returns all vehicles owned by `owner_id`.
    pub async fn list_for_owner(&self, owner_id: UserId) -> Vec<Vehicle> {
        self.store.list_vehicles_by_owner(owner_id).await
    }

    /// Applies owner edits to mileage, valuation, or images.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Forbidden`] if the actor is not the owner.
    pub async fn update_vehicle(
        &self,
        vehicle_id: VehicleId,
        actor_id: UserId,
        update: VehicleUpdate,
    ) -> Result<Vehicle, MarketError> {
        let mut vehicle = self.store.get_vehicle(vehicle_id).await?;
        if vehicle.owner_id != actor_id {
            return Err(MarketError::Forbidden(
                "only the owner may edit a vehicle".to_string(),
            ));
        }

        if let Some(mileage) = update.mileage {
            vehicle.mileage = mileage;
        }
        if let Some(valuation) = update.valuation_cents {
            vehicle.valuation_cents = valuation;
        }
        if let Some(images) = update.image_urls {
            vehicle.image_urls = images;
        }

        let vehicle = self.store.save_vehicle(vehicle).await?;
        let _ = self.event_bus.publish(MarketEvent::VehicleUpdated {
            vehicle_id,
            owner_id: vehicle.owner_id,
            timestamp: Utc::now(),
        });
        Ok(vehicle)
    }

    /// Deletes a vehicle from the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Conflict`] while the vehicle is listed or
    /// locked in a trade, and [`MarketError::Forbidden`] for non-owners.
    pub async fn delete_vehicle(
        &self,
        vehicle_id: VehicleId,
        actor_id: UserId,
    ) -> Result<(), MarketError> {
        let vehicle = self.store.get_vehicle(vehicle_id).await?;
        if vehicle.owner_id != actor_id {
            return Err(MarketError::Forbidden(
                "only the owner may delete a vehicle".to_string(),
            ));
        }
        if vehicle.is_listed || vehicle.in_trade {
            return Err(MarketError::Conflict(
                "vehicle is listed or in a trade and cannot be deleted".to_string(),
            ));
        }

        self.store.remove_vehicle(vehicle_id).await?;
        tracing::info!(%vehicle_id, "vehicle deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_service() -> (VehicleService, Arc<MarketStore>) {
        let store = Arc::new(MarketStore::new());
        let service = VehicleService::new(Arc::clone(&store), EventBus::new(100));
        (service, store)
    }

    async fn create_default(service: &VehicleService, owner: UserId) -> Vehicle {
        let result = service
            .create_vehicle(
                owner,
                "Volvo".to_string(),
                "V60".to_string(),
                2022,
                "YV1ZW25V1N1000004".to_string(),
                12_000,
                "automatic".to_string(),
                3_200_000,
            )
            .await;
        let Ok(vehicle) = result else {
            panic!("vehicle creation failed: {result:?}");
        };
        vehicle
    }

    #[tokio::test]
    async fn create_and_list_by_owner() {
        let (service, _store) = make_service();
        let owner = UserId::new();
        let _vehicle = create_default(&service, owner).await;

        let mine = service.list_for_owner(owner).await;
        assert_eq!(mine.len(), 1);
        assert!(service.list_for_owner(UserId::new()).await.is_empty());
    }

    #[tokio::test]
    async fn create_rejects_blank_make() {
        let (service, _store) = make_service();
        let result = service
            .create_vehicle(
                UserId::new(),
                "  ".to_string(),
                "V60".to_string(),
                2022,
                String::new(),
                0,
                "automatic".to_string(),
                0,
            )
            .await;
        assert!(matches!(result, Err(MarketError::ValidationFailed(_))));
    }

    #[tokio::test]
    async fn update_requires_ownership() {
        let (service, _store) = make_service();
        let owner = UserId::new();
        let vehicle = create_default(&service, owner).await;

        let update = VehicleUpdate {
            mileage: Some(13_000),
            ..VehicleUpdate::default()
        };
        let result = service
            .update_vehicle(vehicle.id, UserId::new(), update.clone())
            .await;
        assert!(matches!(result, Err(MarketError::Forbidden(_))));

        let Ok(updated) = service.update_vehicle(vehicle.id, owner, update).await else {
            panic!("owner update failed");
        };
        assert_eq!(updated.mileage, 13_000);
    }

    #[tokio::test]
    async fn delete_blocked_while_locked() {
        let (service, store) = make_service();
        let owner = UserId::new();
        let vehicle = create_default(&service, owner).await;

        let Ok(mut stored) = store.get_vehicle(vehicle.id).await else {
            panic!("vehicle missing");
        };
        stored.in_trade = true;
        let Ok(_) = store.save_vehicle(stored).await else {
            panic!("save failed");
        };

        let result = service.delete_vehicle(vehicle.id, owner).await;
        assert!(matches!(result, Err(MarketError::Conflict(_))));
    }

    #[tokio::test]
    async fn delete_unlocked_vehicle() {
        let (service, store) = make_service();
        let owner = UserId::new();
        let vehicle = create_default(&service, owner).await;

        let Ok(()) = service.delete_vehicle(vehicle.id, owner).await else {
            panic!("delete failed");
        };
        assert!(store.get_vehicle(vehicle.id).await.is_err());
    }
}
