//! Negotiation error types.

use rust_decimal::Decimal;
use thiserror::Error;
use tessera_shared::types::{AccountId, ProductId, ProposalId, ShipmentId};

use super::proposal::{Party, ProposalState};
use super::shipment::ShipmentStatus;
use crate::ledger::LedgerError;

/// Errors that can occur during re-ownership negotiation.
#[derive(Debug, Error)]
pub enum NegotiationError {
    /// The proposal is no longer pending.
    #[error("Proposal {proposal_id} is {state}, not pending")]
    NotPending {
        /// The proposal addressed.
        proposal_id: ProposalId,
        /// The state actually found.
        state: ProposalState,
    },

    /// The party already approved; duplicate submissions are rejected
    /// explicitly so callers can detect them.
    #[error("Party {party} already approved proposal {proposal_id}")]
    AlreadyApproved {
        /// The proposal addressed.
        proposal_id: ProposalId,
        /// The party that resubmitted.
        party: Party,
    },

    /// A pending proposal already exists for this product and buyer.
    #[error("A pending proposal already exists for product {original_product} and buyer {new_owner}")]
    DuplicateProposal {
        /// The product being resold.
        original_product: ProductId,
        /// The buyer.
        new_owner: AccountId,
    },

    /// Proposal not found.
    #[error("Proposal {0} not found")]
    ProposalNotFound(ProposalId),

    /// Shipment not found.
    #[error("Shipment {0} not found")]
    ShipmentNotFound(ShipmentId),

    /// Old owner and new owner must be different accounts.
    #[error("Old owner and new owner must be different accounts")]
    SameParty,

    /// Quantity must be at least one.
    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(u32),

    /// Price must be strictly positive.
    #[error("Price must be positive, got {0}")]
    InvalidPrice(Decimal),

    /// Fulfillment transitions are forward-only.
    #[error("Cannot move shipment from {from} to {to}")]
    InvalidFulfillmentTransition {
        /// The current status.
        from: ShipmentStatus,
        /// The requested status.
        to: ShipmentStatus,
    },

    /// Ledger failure while settling.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl NegotiationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotPending { .. } => "NOT_PENDING",
            Self::AlreadyApproved { .. } => "ALREADY_APPROVED",
            Self::DuplicateProposal { .. } => "DUPLICATE_PROPOSAL",
            Self::ProposalNotFound(_) => "PROPOSAL_NOT_FOUND",
            Self::ShipmentNotFound(_) => "SHIPMENT_NOT_FOUND",
            Self::SameParty => "SAME_PARTY",
            Self::InvalidQuantity(_) => "INVALID_QUANTITY",
            Self::InvalidPrice(_) => "INVALID_PRICE",
            Self::InvalidFulfillmentTransition { .. } => "INVALID_FULFILLMENT_TRANSITION",
            Self::Ledger(inner) => inner.error_code(),
        }
    }

    /// True if the caller should refresh state instead of retrying.
    #[must_use]
    pub fn is_state_mismatch(&self) -> bool {
        matches!(
            self,
            Self::NotPending { .. } | Self::AlreadyApproved { .. } | Self::DuplicateProposal { .. }
        )
    }
}
