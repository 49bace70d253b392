//! Escrow hold domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tessera_shared::types::{AccountId, OrderId, Rate};

/// Escrow hold status.
///
/// Valid transitions:
/// - Held → Released (release)
/// - Held → Disputed (dispute)
/// - Disputed → Released (resolve: release)
/// - Disputed → Refunded (resolve: refund)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscrowStatus {
    /// Funds are frozen for the order.
    Held,
    /// Funds were paid out to the payee (immutable).
    Released,
    /// The order is under dispute; funds stay frozen.
    Disputed,
    /// Funds were restored to the client (immutable).
    Refunded,
}

impl EscrowStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Held => "held",
            Self::Released => "released",
            Self::Disputed => "disputed",
            Self::Refunded => "refunded",
        }
    }

    /// Returns true once the hold can never change again.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Released | Self::Refunded)
    }
}

impl std::fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of an external dispute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisputeOutcome {
    /// Pay the payee as if the order completed.
    Release,
    /// Restore the full amount to the client.
    Refund,
}

/// Frozen funds for a single freelance order.
///
/// The equal-and-opposite pending credit for the hold debit lives only here
/// until release, so double counting cannot occur.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowHold {
    /// The funded order.
    pub order_id: OrderId,
    /// The paying client.
    pub client: AccountId,
    /// The worker/business paid on release.
    pub payee: AccountId,
    /// Referrer owed a bonus share of the commission, if any.
    pub referrer: Option<AccountId>,
    /// The frozen amount.
    pub amount: Decimal,
    /// Commission rate snapshotted at creation, immune to later rate changes.
    pub commission_rate: Rate,
    /// Current status.
    pub status: EscrowStatus,
    /// When the hold was created.
    pub created_at: DateTime<Utc>,
    /// When the hold reached a terminal status.
    pub released_at: Option<DateTime<Utc>>,
    /// Dispute note; required when entering Disputed, carried into Refunded.
    pub resolution_note: Option<String>,
}

/// Inbound order/payment-capture event that creates a hold.
#[derive(Debug, Clone)]
pub struct HoldRequest {
    /// The funded order.
    pub order_id: OrderId,
    /// The paying client.
    pub client: AccountId,
    /// The worker/business paid on release.
    pub payee: AccountId,
    /// Referrer owed a bonus share of the commission, if any.
    pub referrer: Option<AccountId>,
    /// The amount captured from the client.
    pub amount: Decimal,
    /// Commission rate to snapshot.
    pub commission_rate: Rate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_terminal() {
        assert!(!EscrowStatus::Held.is_terminal());
        assert!(!EscrowStatus::Disputed.is_terminal());
        assert!(EscrowStatus::Released.is_terminal());
        assert!(EscrowStatus::Refunded.is_terminal());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(EscrowStatus::Held.to_string(), "held");
        assert_eq!(EscrowStatus::Released.to_string(), "released");
        assert_eq!(EscrowStatus::Disputed.to_string(), "disputed");
        assert_eq!(EscrowStatus::Refunded.to_string(), "refunded");
    }
}
