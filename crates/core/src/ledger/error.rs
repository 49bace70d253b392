//! Ledger error types.
//!
//! `Unbalanced` and `Internal` indicate a bug or storage corruption and are
//! logged before they propagate; the rest are ordinary typed results for the
//! calling collaborator.

use rust_decimal::Decimal;
use thiserror::Error;
use tessera_shared::types::{AccountId, CorrelationId};

use super::entry::EntryKind;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// An append batch must contain at least one entry.
    #[error("Append batch must contain at least one entry")]
    EmptyBatch,

    /// Entry amount cannot be zero.
    #[error("Entry amount cannot be zero")]
    ZeroAmount,

    /// Amount has the wrong sign for its context (e.g. a negative recharge).
    #[error("Amount {0} is not a positive credit")]
    NegativeAmount(Decimal),

    /// Entry sign contradicts its kind (recharges credit, holds debit).
    #[error("Entry kind {kind} cannot carry amount {amount}")]
    InvalidEntrySign {
        /// The offending kind.
        kind: EntryKind,
        /// The signed amount supplied.
        amount: Decimal,
    },

    // ========== Conservation Errors ==========
    /// Entries for a correlation id do not conserve tokens.
    ///
    /// This should never occur in correct code; it is surfaced as an
    /// internal error.
    #[error("Entries for correlation {correlation_id} leave a non-zero sum of {sum}")]
    Unbalanced {
        /// The correlation id whose entries fail to net out.
        correlation_id: CorrelationId,
        /// The cumulative sum the batch would leave behind.
        sum: Decimal,
    },

    // ========== Account Errors ==========
    /// Account balance is too low for the requested debit.
    #[error("Insufficient funds on account {account_id}: available {available}, requested {requested}")]
    InsufficientFunds {
        /// The account being debited.
        account_id: AccountId,
        /// The balance currently available.
        available: Decimal,
        /// The net debit the batch requested.
        requested: Decimal,
    },

    /// An entry names an existing account with a different kind.
    #[error("Account {account_id} already exists with a different kind")]
    AccountKindMismatch {
        /// The account whose kind conflicts.
        account_id: AccountId,
    },

    // ========== Idempotency Errors ==========
    /// The idempotency key was already used for this account.
    ///
    /// Callers going through the settlement reconciler observe this as
    /// success-on-retry, never as a user-facing error.
    #[error("Idempotency key {key:?} already used for account {account_id}")]
    DuplicateIdempotencyKey {
        /// The account the key collided on.
        account_id: AccountId,
        /// The colliding key.
        key: String,
    },

    // ========== Internal Errors ==========
    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyBatch => "EMPTY_BATCH",
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::InvalidEntrySign { .. } => "INVALID_ENTRY_SIGN",
            Self::Unbalanced { .. } => "UNBALANCED",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::AccountKindMismatch { .. } => "ACCOUNT_KIND_MISMATCH",
            Self::DuplicateIdempotencyKey { .. } => "DUPLICATE_IDEMPOTENCY_KEY",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True if this error means the batch was already committed and the
    /// caller should treat the retry as success.
    #[must_use]
    pub fn is_replay(&self) -> bool {
        matches!(self, Self::DuplicateIdempotencyKey { .. })
    }

    /// True if this error indicates a bug or storage corruption rather than
    /// bad user input.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Unbalanced { .. } | Self::InvalidEntrySign { .. } | Self::Internal(_)
        )
    }
}
