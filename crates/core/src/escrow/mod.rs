//! Escrow state machine for freelance orders.
//!
//! - Hold domain types and status machine
//! - The controller orchestrating hold/release/dispute transitions
//! - Error types for escrow operations

pub mod controller;
pub mod error;
pub mod hold;

pub use controller::EscrowController;
pub use error::EscrowError;
pub use hold::{DisputeOutcome, EscrowHold, EscrowStatus, HoldRequest};
