//! Dual-approval re-ownership negotiation.
//!
//! - Proposal domain types and the Pending/Committed state machine
//! - Shipment tracking for committed proposals
//! - The negotiator orchestrating approvals and settlement
//! - Error types for negotiation operations

pub mod error;
pub mod negotiator;
pub mod proposal;
pub mod shipment;

pub use error::NegotiationError;
pub use negotiator::ReOwnershipNegotiator;
pub use proposal::{Party, ProposalState, ProposeRequest, ReOwnershipProposal};
pub use shipment::{FulfillmentUpdate, Shipment, ShipmentStatus};
