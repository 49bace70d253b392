//! Escrow error types.

use rust_decimal::Decimal;
use thiserror::Error;
use tessera_shared::types::OrderId;

use super::hold::EscrowStatus;
use crate::ledger::LedgerError;

/// Errors that can occur during escrow operations.
///
/// State-mismatch errors mean the caller should refresh state and not
/// blindly retry.
#[derive(Debug, Error)]
pub enum EscrowError {
    /// An escrow hold already exists for this order.
    #[error("Order {0} already has an escrow hold")]
    AlreadyHeld(OrderId),

    /// The hold is not in Held status.
    #[error("Escrow for order {order_id} is {status}, not held")]
    NotHeld {
        /// The order whose hold was addressed.
        order_id: OrderId,
        /// The status actually found.
        status: EscrowStatus,
    },

    /// The hold is not in Disputed status.
    #[error("Escrow for order {order_id} is {status}, not disputed")]
    NotDisputed {
        /// The order whose hold was addressed.
        order_id: OrderId,
        /// The status actually found.
        status: EscrowStatus,
    },

    /// No escrow hold exists for this order.
    #[error("No escrow hold for order {0}")]
    HoldNotFound(OrderId),

    /// Hold amounts must be strictly positive.
    #[error("Escrow amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// A dispute requires a non-empty note.
    #[error("Dispute note is required")]
    NoteRequired,

    /// Ledger failure while moving funds.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl EscrowError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyHeld(_) => "ALREADY_HELD",
            Self::NotHeld { .. } => "NOT_HELD",
            Self::NotDisputed { .. } => "NOT_DISPUTED",
            Self::HoldNotFound(_) => "HOLD_NOT_FOUND",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::NoteRequired => "NOTE_REQUIRED",
            Self::Ledger(inner) => inner.error_code(),
        }
    }

    /// True if the caller should refresh state instead of retrying.
    #[must_use]
    pub fn is_state_mismatch(&self) -> bool {
        matches!(
            self,
            Self::AlreadyHeld(_) | Self::NotHeld { .. } | Self::NotDisputed { .. }
        )
    }
}
