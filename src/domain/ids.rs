//! Type-safe entity identifiers.
//!
//! Each marketplace entity gets its own newtype wrapper around
//! [`uuid::Uuid`] (v4) so identifiers of different entities cannot be
//! confused with one another.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Creates a new random identifier (UUID v4).
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Creates an identifier from an existing [`uuid::Uuid`].
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner [`uuid::Uuid`].
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id! {
    /// Unique identifier for a marketplace user.
    UserId
}

entity_id! {
    /// Unique identifier for a vehicle.
    ///
    /// Generated once when the owner catalogs the vehicle and immutable
    /// thereafter. Used as the dictionary key in the store, in trade offer
    /// terms, and in listing back-references.
    VehicleId
}

entity_id! {
    /// Unique identifier for a sale listing.
    ListingId
}

entity_id! {
    /// Unique identifier for a trade negotiation.
    TradeId
}

entity_id! {
    /// Unique identifier for a direct message.
    MessageId
}
