//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing an `OrderId` where a
//! `ProposalId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(AccountId, "Unique identifier for a token account.");
typed_id!(EntryId, "Unique identifier for a ledger entry.");
typed_id!(OrderId, "Unique identifier for a freelance order.");
typed_id!(ProductId, "Unique identifier for a product listing.");
typed_id!(ProposalId, "Unique identifier for a re-ownership proposal.");
typed_id!(ShipmentId, "Unique identifier for a shipment.");
typed_id!(RechargeId, "Unique identifier for a recharge event.");
typed_id!(RepostId, "Unique identifier for an ad repost.");
typed_id!(
    AgreementRef,
    "Opaque reference to the chat agreement that produced resale terms."
);
typed_id!(
    CorrelationId,
    "Identifier of the business object a ledger entry settles against."
);

impl From<OrderId> for CorrelationId {
    fn from(id: OrderId) -> Self {
        Self(id.0)
    }
}

impl From<ProposalId> for CorrelationId {
    fn from(id: ProposalId) -> Self {
        Self(id.0)
    }
}

impl From<RechargeId> for CorrelationId {
    fn from(id: RechargeId) -> Self {
        Self(id.0)
    }
}

impl From<RepostId> for CorrelationId {
    fn from(id: RepostId) -> Self {
        Self(id.0)
    }
}
