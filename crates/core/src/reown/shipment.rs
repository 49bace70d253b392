//! Shipment tracking for committed re-ownership proposals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tessera_shared::types::{ProposalId, ShipmentId};

/// Fulfillment status. Transitions are forward-only:
/// Pending → Shipped → Delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipmentStatus {
    /// Created at proposal commit, nothing shipped yet.
    Pending,
    /// Handed to the carrier.
    Shipped,
    /// Received by the new owner.
    Delivered,
}

impl ShipmentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
        }
    }

    /// Whether fulfillment may move from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Shipped) | (Self::Shipped, Self::Delivered)
        )
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracking record correlated 1:1 with a committed proposal.
///
/// Mutated only by fulfillment updates from the external collaborator;
/// never touches the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    /// Unique identifier.
    pub id: ShipmentId,
    /// The committed proposal this shipment fulfills.
    pub proposal_id: ProposalId,
    /// Current fulfillment status.
    pub status: ShipmentStatus,
    /// Carrier name, opaque to this core.
    pub carrier: Option<String>,
    /// Tracking number, opaque to this core.
    pub tracking_number: Option<String>,
    /// When the shipment record was created.
    pub created_at: DateTime<Utc>,
    /// When the carrier took the package.
    pub shipped_at: Option<DateTime<Utc>>,
    /// When the package arrived.
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Shipment {
    /// Creates the Pending shipment for a freshly committed proposal.
    #[must_use]
    pub fn pending(proposal_id: ProposalId) -> Self {
        Self {
            id: ShipmentId::new(),
            proposal_id,
            status: ShipmentStatus::Pending,
            carrier: None,
            tracking_number: None,
            created_at: Utc::now(),
            shipped_at: None,
            delivered_at: None,
        }
    }
}

/// Inbound fulfillment status update.
#[derive(Debug, Clone)]
pub struct FulfillmentUpdate {
    /// The shipment to update.
    pub shipment_id: ShipmentId,
    /// The new status.
    pub status: ShipmentStatus,
    /// Carrier name, if known.
    pub carrier: Option<String>,
    /// Tracking number, if known.
    pub tracking_number: Option<String>,
}
