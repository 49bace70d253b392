//! Domain events emitted on state changes.
//!
//! The notification and chat subsystems subscribe here to react to money
//! movement (e.g. posting a system message when a proposal commits). Events
//! are fan-out only; the engine never waits on subscribers.

use rust_decimal::Decimal;
use tessera_shared::types::{OrderId, ProposalId, ShipmentId};
use tokio::sync::broadcast;

use crate::ledger::LedgerEntry;
use crate::reown::ShipmentStatus;

/// Default buffer size for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// Events emitted by the settlement core on state changes.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A ledger entry was committed.
    LedgerEntryAppended(LedgerEntry),
    /// An escrow hold was released and paid out.
    EscrowReleased {
        /// The order whose escrow was released.
        order_id: OrderId,
        /// Amount credited to the payee.
        payout: Decimal,
        /// Amount credited to the platform.
        commission: Decimal,
        /// Amount credited to the referrer, zero when there was none.
        referral_bonus: Decimal,
    },
    /// An escrow hold entered dispute.
    EscrowDisputed {
        /// The disputed order.
        order_id: OrderId,
    },
    /// A disputed escrow hold was refunded to the client.
    EscrowRefunded {
        /// The refunded order.
        order_id: OrderId,
        /// Amount restored to the client.
        amount: Decimal,
    },
    /// A re-ownership proposal committed.
    ReownCommitted {
        /// The committed proposal.
        proposal_id: ProposalId,
        /// The shipment created for fulfillment.
        shipment_id: ShipmentId,
        /// Total amount moved from the new owner.
        total: Decimal,
    },
    /// A shipment changed fulfillment status.
    ShipmentUpdated {
        /// The shipment that changed.
        shipment_id: ShipmentId,
        /// The new status.
        status: ShipmentStatus,
    },
}

/// Broadcast bus for [`DomainEvent`]s.
///
/// Cloning the bus shares the underlying channel. Publishing never blocks
/// and silently drops events when nobody is subscribed.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Creates a bus with the given channel capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event to all current subscribers.
    pub(crate) fn publish(&self, event: DomainEvent) {
        // A send error only means there are no subscribers right now.
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}
