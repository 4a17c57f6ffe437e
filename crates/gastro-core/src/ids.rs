//! Unique identifier types for persisted records.
//!
//! Every table row is keyed by a UUID; wrapping them in distinct newtypes
//! keeps a reservation id from being passed where a customer id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from a UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Converts to the inner UUID.
            pub fn into_uuid(self) -> Uuid {
                self.0
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

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(
    /// Identifier of a restaurant tenant. Scopes every other record.
    RestaurantId
);
uuid_id!(
    /// Identifier of a hosted-auth user.
    UserId
);
uuid_id!(
    /// Identifier of a reservation.
    ReservationId
);
uuid_id!(
    /// Identifier of a customer (CRM record).
    CustomerId
);
uuid_id!(
    /// Identifier of a review.
    ReviewId
);
uuid_id!(
    /// Identifier of a coupon (automatic promotion).
    CouponId
);
uuid_id!(
    /// Identifier of a points reward in the catalogue.
    RewardId
);
uuid_id!(
    /// Identifier of a points redemption.
    RedemptionId
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_restaurant_id_new() {
        let id1 = RestaurantId::new();
        let id2 = RestaurantId::new();
        assert_ne!(id1, id2, "Each new ID should be unique");
    }

    #[test]
    fn test_id_display_matches_uuid() {
        let uuid = Uuid::new_v4();
        let id = ReservationId::from_uuid(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let uuid = Uuid::new_v4();
        let id = CustomerId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
    }

    #[test]
    fn test_id_from_str() {
        let uuid = Uuid::new_v4();
        let id: RewardId = uuid.to_string().parse().unwrap();
        assert_eq!(id.as_uuid(), &uuid);
    }

    #[test]
    fn test_id_from_str_rejects_garbage() {
        assert!("not-a-uuid".parse::<RedemptionId>().is_err());
    }
}
