//! Re-ownership proposal domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tessera_shared::types::{AccountId, AgreementRef, ProductId, ProposalId, Rate, ShipmentId};

/// Negotiation state. Committed is terminal and entered exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalState {
    /// Waiting for one or both approvals.
    Pending,
    /// Both parties approved; the settlement and shipment exist.
    Committed,
}

impl ProposalState {
    /// Returns the string representation of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Committed => "committed",
        }
    }
}

impl std::fmt::Display for ProposalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The two parties to a resale negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    /// The current owner selling the product.
    Original,
    /// The buyer taking ownership.
    NewOwner,
}

impl Party {
    /// The counterparty.
    #[must_use]
    pub fn other(&self) -> Self {
        match self {
            Self::Original => Self::NewOwner,
            Self::NewOwner => Self::Original,
        }
    }

    /// Returns the string representation of the party.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::NewOwner => "new_owner",
        }
    }
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A proposed resale between the original owner and a new owner.
///
/// Each approval flag is settable only by its respective party. The
/// `version` counter increases on every write; approval writes supply the
/// version they read so stale writes are rejected and retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReOwnershipProposal {
    /// Unique identifier.
    pub id: ProposalId,
    /// The product being resold.
    pub original_product: ProductId,
    /// The resold copy created for the new owner.
    pub resold_product: ProductId,
    /// The current owner.
    pub old_owner: AccountId,
    /// The buyer taking ownership.
    pub new_owner: AccountId,
    /// Number of units changing hands.
    pub quantity: u32,
    /// Unit price the old owner paid.
    pub old_price: Decimal,
    /// Unit price after markup.
    pub new_price: Decimal,
    /// Markup applied to the old price.
    pub markup_rate: Rate,
    /// Reference to the chat agreement that produced the terms.
    pub agreement_ref: AgreementRef,
    /// Whether the original owner approved.
    pub original_approved: bool,
    /// Whether the new owner approved.
    pub new_owner_approved: bool,
    /// Current state.
    pub state: ProposalState,
    /// Set when both flags first become true.
    pub agreed_at: Option<DateTime<Utc>>,
    /// The shipment created at commit.
    pub shipment_id: Option<ShipmentId>,
    /// When the proposal was created.
    pub created_at: DateTime<Utc>,
    /// Optimistic concurrency counter.
    pub version: u64,
}

impl ReOwnershipProposal {
    /// Whether the given party has approved.
    #[must_use]
    pub fn approved_by(&self, party: Party) -> bool {
        match party {
            Party::Original => self.original_approved,
            Party::NewOwner => self.new_owner_approved,
        }
    }

    /// Sets the given party's approval flag.
    pub(crate) fn set_approval(&mut self, party: Party) {
        match party {
            Party::Original => self.original_approved = true,
            Party::NewOwner => self.new_owner_approved = true,
        }
    }

    /// Total settlement amount: `new_price * quantity`.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.new_price * Decimal::from(self.quantity)
    }
}

/// Input for proposing a resale.
#[derive(Debug, Clone)]
pub struct ProposeRequest {
    /// The product being resold.
    pub original_product: ProductId,
    /// The current owner.
    pub old_owner: AccountId,
    /// The buyer taking ownership.
    pub new_owner: AccountId,
    /// Number of units changing hands.
    pub quantity: u32,
    /// Unit price the old owner paid.
    pub old_price: Decimal,
    /// Markup to apply.
    pub markup_rate: Rate,
    /// Reference to the chat agreement that produced the terms.
    pub agreement_ref: AgreementRef,
}
