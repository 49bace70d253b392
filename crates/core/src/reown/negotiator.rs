//! Dual-approval negotiation workflow for product re-ownership.
//!
//! Each proposal carries a monotonically increasing version; an approval
//! write supplies the version it read and stale writes are retried against
//! fresh state. That serializes the race between the two approvers so that
//! exactly one call observes "both flags true" and performs the commit.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use rust_decimal::Decimal;
use tessera_shared::types::{ProductId, ProposalId, Rate, ShipmentId};
use tracing::debug;

use super::error::NegotiationError;
use super::proposal::{Party, ProposalState, ProposeRequest, ReOwnershipProposal};
use super::shipment::{FulfillmentUpdate, Shipment, ShipmentStatus};
use crate::events::{DomainEvent, EventBus};
use crate::ledger::{AccountKind, EntryInput, EntryKind};
use crate::settlement::SettlementReconciler;

/// Turns a proposed resale into a committed transfer with markup.
#[derive(Debug)]
pub struct ReOwnershipNegotiator {
    proposals: RwLock<HashMap<ProposalId, ReOwnershipProposal>>,
    shipments: RwLock<HashMap<ShipmentId, Shipment>>,
    reconciler: Arc<SettlementReconciler>,
    platform_cut: Rate,
    events: EventBus,
}

impl ReOwnershipNegotiator {
    /// Creates a negotiator writing through the given reconciler.
    #[must_use]
    pub fn new(reconciler: Arc<SettlementReconciler>, platform_cut: Rate, events: EventBus) -> Self {
        Self {
            proposals: RwLock::new(HashMap::new()),
            shipments: RwLock::new(HashMap::new()),
            reconciler,
            platform_cut,
            events,
        }
    }

    /// Creates a Pending proposal from agreed chat terms.
    ///
    /// Computes `new_price = old_price * (1 + markup)` and enforces the
    /// uniqueness constraint: no second Pending proposal for the same
    /// (original product, new owner) pair.
    pub fn propose(
        &self,
        request: ProposeRequest,
    ) -> Result<ReOwnershipProposal, NegotiationError> {
        if request.quantity == 0 {
            return Err(NegotiationError::InvalidQuantity(request.quantity));
        }
        if request.old_price <= Decimal::ZERO {
            return Err(NegotiationError::InvalidPrice(request.old_price));
        }
        if request.old_owner == request.new_owner {
            return Err(NegotiationError::SameParty);
        }

        let mut proposals = self.proposals_mut();
        let duplicate = proposals.values().any(|p| {
            p.state == ProposalState::Pending
                && p.original_product == request.original_product
                && p.new_owner == request.new_owner
        });
        if duplicate {
            return Err(NegotiationError::DuplicateProposal {
                original_product: request.original_product,
                new_owner: request.new_owner,
            });
        }

        let proposal = ReOwnershipProposal {
            id: ProposalId::new(),
            original_product: request.original_product,
            resold_product: ProductId::new(),
            old_owner: request.old_owner,
            new_owner: request.new_owner,
            quantity: request.quantity,
            old_price: request.old_price,
            new_price: SettlementReconciler::resale_price(request.old_price, request.markup_rate),
            markup_rate: request.markup_rate,
            agreement_ref: request.agreement_ref,
            original_approved: false,
            new_owner_approved: false,
            state: ProposalState::Pending,
            agreed_at: None,
            shipment_id: None,
            created_at: Utc::now(),
            version: 0,
        };
        proposals.insert(proposal.id, proposal.clone());

        debug!(proposal_id = %proposal.id, new_price = %proposal.new_price, "resale proposed");
        Ok(proposal)
    }

    /// Records a party's approval.
    ///
    /// The call that first observes both flags true atomically commits the
    /// proposal: it emits the settlement entries, creates the Pending
    /// shipment, and stamps the agreement timestamp. If any step fails the
    /// whole call fails and no flag change is observed.
    ///
    /// A retried approval from a party whose flag already made it onto a
    /// committed proposal returns `Ok(Committed)` without re-emitting
    /// entries; a duplicate submission while Pending is rejected with
    /// `AlreadyApproved`.
    pub fn approve(
        &self,
        proposal_id: ProposalId,
        party: Party,
    ) -> Result<ProposalState, NegotiationError> {
        loop {
            let snapshot = self
                .proposals()
                .get(&proposal_id)
                .cloned()
                .ok_or(NegotiationError::ProposalNotFound(proposal_id))?;

            if snapshot.state == ProposalState::Committed {
                // The work this call would have done already happened;
                // surface success to the retrying party, a state error to
                // anyone else.
                return if snapshot.approved_by(party) {
                    Ok(ProposalState::Committed)
                } else {
                    Err(NegotiationError::NotPending {
                        proposal_id,
                        state: snapshot.state,
                    })
                };
            }
            if snapshot.approved_by(party) {
                return Err(NegotiationError::AlreadyApproved { proposal_id, party });
            }

            let mut proposals = self.proposals_mut();
            let current = proposals
                .get_mut(&proposal_id)
                .ok_or(NegotiationError::ProposalNotFound(proposal_id))?;
            if current.version != snapshot.version {
                // Stale read: someone else wrote between our read and write.
                drop(proposals);
                continue;
            }

            if !current.approved_by(party.other()) {
                // First approval only: flip the flag and wait for the
                // counterparty.
                current.set_approval(party);
                current.version += 1;
                debug!(proposal_id = %proposal_id, party = %party, "approval recorded");
                return Ok(ProposalState::Pending);
            }

            // Both flags are about to be true: this call performs the commit.
            let mut updated = current.clone();
            updated.set_approval(party);

            let split = SettlementReconciler::reown_split(
                updated.new_price,
                updated.quantity,
                self.platform_cut,
            );
            self.reconciler.commit(self.settlement_batch(&updated, &split))?;

            let shipment = Shipment::pending(updated.id);
            updated.state = ProposalState::Committed;
            updated.agreed_at = Some(Utc::now());
            updated.shipment_id = Some(shipment.id);
            updated.version += 1;
            let shipment_id = shipment.id;
            let total = split.total;
            *current = updated;

            self.shipments_mut().insert(shipment_id, shipment);
            drop(proposals);

            self.events.publish(DomainEvent::ReownCommitted {
                proposal_id,
                shipment_id,
                total,
            });
            debug!(proposal_id = %proposal_id, total = %total, "re-ownership committed");
            return Ok(ProposalState::Committed);
        }
    }

    /// Applies a fulfillment status update to a shipment. No ledger effect.
    pub fn apply_fulfillment(
        &self,
        update: FulfillmentUpdate,
    ) -> Result<Shipment, NegotiationError> {
        let mut shipments = self.shipments_mut();
        let shipment = shipments
            .get_mut(&update.shipment_id)
            .ok_or(NegotiationError::ShipmentNotFound(update.shipment_id))?;

        if !shipment.status.can_transition_to(update.status) {
            return Err(NegotiationError::InvalidFulfillmentTransition {
                from: shipment.status,
                to: update.status,
            });
        }

        shipment.status = update.status;
        match update.status {
            ShipmentStatus::Shipped => shipment.shipped_at = Some(Utc::now()),
            ShipmentStatus::Delivered => shipment.delivered_at = Some(Utc::now()),
            ShipmentStatus::Pending => {}
        }
        if let Some(carrier) = update.carrier {
            shipment.carrier = Some(carrier);
        }
        if let Some(tracking) = update.tracking_number {
            shipment.tracking_number = Some(tracking);
        }

        let updated = shipment.clone();
        drop(shipments);

        self.events.publish(DomainEvent::ShipmentUpdated {
            shipment_id: updated.id,
            status: updated.status,
        });
        Ok(updated)
    }

    /// Full proposal record for dashboards.
    #[must_use]
    pub fn proposal(&self, proposal_id: ProposalId) -> Option<ReOwnershipProposal> {
        self.proposals().get(&proposal_id).cloned()
    }

    /// Current state of a proposal, if it exists.
    #[must_use]
    pub fn proposal_status(&self, proposal_id: ProposalId) -> Option<ProposalState> {
        self.proposals().get(&proposal_id).map(|p| p.state)
    }

    /// Shipment record for dashboards.
    #[must_use]
    pub fn shipment(&self, shipment_id: ShipmentId) -> Option<Shipment> {
        self.shipments().get(&shipment_id).cloned()
    }

    /// Builds the settlement entries for a committing proposal: debit the
    /// new owner for the full total, credit the old owner the total minus
    /// the platform cut.
    fn settlement_batch(
        &self,
        proposal: &ReOwnershipProposal,
        split: &crate::settlement::ReownSplit,
    ) -> Vec<EntryInput> {
        let correlation_id = proposal.id.into();
        let key = format!("reown:{}", proposal.id);

        let mut batch = vec![
            EntryInput {
                account_id: proposal.new_owner,
                account_kind: AccountKind::Business,
                amount: -split.total,
                kind: EntryKind::ReownSettlement,
                correlation_id,
                idempotency_key: key.clone(),
                memo: None,
            },
            EntryInput {
                account_id: proposal.old_owner,
                account_kind: AccountKind::Business,
                amount: split.owner_credit,
                kind: EntryKind::ReownSettlement,
                correlation_id,
                idempotency_key: key.clone(),
                memo: None,
            },
        ];
        if split.platform_credit > Decimal::ZERO {
            batch.push(EntryInput {
                account_id: self.reconciler.platform_account(),
                account_kind: AccountKind::Platform,
                amount: split.platform_credit,
                kind: EntryKind::ProfitShare,
                correlation_id,
                idempotency_key: key,
                memo: None,
            });
        }
        batch
    }

    fn proposals(&self) -> RwLockReadGuard<'_, HashMap<ProposalId, ReOwnershipProposal>> {
        self.proposals
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn proposals_mut(&self) -> RwLockWriteGuard<'_, HashMap<ProposalId, ReOwnershipProposal>> {
        self.proposals
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn shipments(&self) -> RwLockReadGuard<'_, HashMap<ShipmentId, Shipment>> {
        self.shipments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn shipments_mut(&self) -> RwLockWriteGuard<'_, HashMap<ShipmentId, Shipment>> {
        self.shipments
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerError, LedgerStore};
    use crate::recharge::{RechargeConfirmation, RechargeMethod};
    use rust_decimal_macros::dec;
    use tessera_shared::types::{AccountId, AgreementRef, RechargeId};

    struct Fixture {
        negotiator: ReOwnershipNegotiator,
        reconciler: Arc<SettlementReconciler>,
        old_owner: AccountId,
        new_owner: AccountId,
    }

    fn fixture(platform_cut: Rate) -> Fixture {
        let events = EventBus::default();
        let ledger = Arc::new(LedgerStore::new(events.clone()));
        let reconciler = Arc::new(SettlementReconciler::new(ledger, AccountId::new()));
        let negotiator =
            ReOwnershipNegotiator::new(Arc::clone(&reconciler), platform_cut, events);
        Fixture {
            negotiator,
            reconciler,
            old_owner: AccountId::new(),
            new_owner: AccountId::new(),
        }
    }

    fn fund(fixture: &Fixture, account: AccountId, amount: Decimal) {
        fixture
            .reconciler
            .recharge(RechargeConfirmation {
                recharge_id: RechargeId::new(),
                account_id: account,
                account_kind: AccountKind::Business,
                amount,
                method: RechargeMethod::MobileMoney,
                idempotency_key: format!("seed:{account}"),
            })
            .unwrap();
    }

    fn request(fixture: &Fixture) -> ProposeRequest {
        ProposeRequest {
            original_product: ProductId::new(),
            old_owner: fixture.old_owner,
            new_owner: fixture.new_owner,
            quantity: 3,
            old_price: dec!(50),
            markup_rate: Rate::new(dec!(0.10)).unwrap(),
            agreement_ref: AgreementRef::new(),
        }
    }

    #[test]
    fn test_propose_computes_marked_up_price() {
        let fixture = fixture(Rate::ZERO);
        let proposal = fixture.negotiator.propose(request(&fixture)).unwrap();

        assert_eq!(proposal.new_price, dec!(55.0000));
        assert_eq!(proposal.state, ProposalState::Pending);
        assert!(!proposal.original_approved);
        assert!(!proposal.new_owner_approved);
        assert!(proposal.shipment_id.is_none());
    }

    #[test]
    fn test_propose_rejects_duplicate_pending_pair() {
        let fixture = fixture(Rate::ZERO);
        let first = request(&fixture);
        let mut second = first.clone();
        second.quantity = 1;
        fixture.negotiator.propose(first).unwrap();

        assert!(matches!(
            fixture.negotiator.propose(second),
            Err(NegotiationError::DuplicateProposal { .. })
        ));
    }

    #[test]
    fn test_propose_validates_input() {
        let fixture = fixture(Rate::ZERO);

        let mut bad_quantity = request(&fixture);
        bad_quantity.quantity = 0;
        assert!(matches!(
            fixture.negotiator.propose(bad_quantity),
            Err(NegotiationError::InvalidQuantity(0))
        ));

        let mut bad_price = request(&fixture);
        bad_price.old_price = dec!(0);
        assert!(matches!(
            fixture.negotiator.propose(bad_price),
            Err(NegotiationError::InvalidPrice(_))
        ));

        let mut same_party = request(&fixture);
        same_party.new_owner = same_party.old_owner;
        assert!(matches!(
            fixture.negotiator.propose(same_party),
            Err(NegotiationError::SameParty)
        ));
    }

    #[test]
    fn test_dual_approval_commits_settlement_and_shipment() {
        let fixture = fixture(Rate::ZERO);
        fund(&fixture, fixture.new_owner, dec!(200));
        let proposal = fixture.negotiator.propose(request(&fixture)).unwrap();

        let first = fixture
            .negotiator
            .approve(proposal.id, Party::Original)
            .unwrap();
        assert_eq!(first, ProposalState::Pending);

        let second = fixture
            .negotiator
            .approve(proposal.id, Party::NewOwner)
            .unwrap();
        assert_eq!(second, ProposalState::Committed);

        let ledger = fixture.reconciler.ledger();
        assert_eq!(ledger.balance_of(fixture.new_owner), dec!(35.0000));
        assert_eq!(ledger.balance_of(fixture.old_owner), dec!(165.0000));

        let committed = fixture.negotiator.proposal(proposal.id).unwrap();
        assert_eq!(committed.state, ProposalState::Committed);
        assert!(committed.agreed_at.is_some());
        let shipment = fixture
            .negotiator
            .shipment(committed.shipment_id.unwrap())
            .unwrap();
        assert_eq!(shipment.status, ShipmentStatus::Pending);
        assert_eq!(shipment.proposal_id, proposal.id);
    }

    #[test]
    fn test_platform_cut_routes_to_platform() {
        let fixture = fixture(Rate::share(dec!(0.05)).unwrap());
        fund(&fixture, fixture.new_owner, dec!(200));
        let proposal = fixture.negotiator.propose(request(&fixture)).unwrap();

        fixture
            .negotiator
            .approve(proposal.id, Party::NewOwner)
            .unwrap();
        fixture
            .negotiator
            .approve(proposal.id, Party::Original)
            .unwrap();

        let ledger = fixture.reconciler.ledger();
        assert_eq!(ledger.balance_of(fixture.old_owner), dec!(156.7500));
        assert_eq!(
            ledger.balance_of(fixture.reconciler.platform_account()),
            dec!(8.2500)
        );
    }

    #[test]
    fn test_duplicate_approval_rejected_while_pending() {
        let fixture = fixture(Rate::ZERO);
        let proposal = fixture.negotiator.propose(request(&fixture)).unwrap();

        fixture
            .negotiator
            .approve(proposal.id, Party::Original)
            .unwrap();
        assert!(matches!(
            fixture.negotiator.approve(proposal.id, Party::Original),
            Err(NegotiationError::AlreadyApproved {
                party: Party::Original,
                ..
            })
        ));
    }

    #[test]
    fn test_retried_approval_after_commit_is_success_without_reemit() {
        let fixture = fixture(Rate::ZERO);
        fund(&fixture, fixture.new_owner, dec!(200));
        let proposal = fixture.negotiator.propose(request(&fixture)).unwrap();

        fixture
            .negotiator
            .approve(proposal.id, Party::Original)
            .unwrap();
        fixture
            .negotiator
            .approve(proposal.id, Party::NewOwner)
            .unwrap();
        let entries = fixture.reconciler.ledger().entry_count();

        // A caller that timed out re-submits its approval after the commit.
        let retried = fixture
            .negotiator
            .approve(proposal.id, Party::NewOwner)
            .unwrap();
        assert_eq!(retried, ProposalState::Committed);
        assert_eq!(fixture.reconciler.ledger().entry_count(), entries);
    }

    #[test]
    fn test_failed_commit_leaves_no_flag_change() {
        let fixture = fixture(Rate::ZERO);
        // New owner has no funds: the commit must fail.
        let proposal = fixture.negotiator.propose(request(&fixture)).unwrap();
        fixture
            .negotiator
            .approve(proposal.id, Party::Original)
            .unwrap();

        let result = fixture.negotiator.approve(proposal.id, Party::NewOwner);
        assert!(matches!(
            result,
            Err(NegotiationError::Ledger(LedgerError::InsufficientFunds { .. }))
        ));

        let current = fixture.negotiator.proposal(proposal.id).unwrap();
        assert_eq!(current.state, ProposalState::Pending);
        assert!(!current.new_owner_approved);
        assert!(current.original_approved);

        // The caller retries after the buyer recharges.
        fund(&fixture, fixture.new_owner, dec!(200));
        let retried = fixture
            .negotiator
            .approve(proposal.id, Party::NewOwner)
            .unwrap();
        assert_eq!(retried, ProposalState::Committed);
    }

    #[test]
    fn test_fulfillment_moves_forward_only() {
        let fixture = fixture(Rate::ZERO);
        fund(&fixture, fixture.new_owner, dec!(200));
        let proposal = fixture.negotiator.propose(request(&fixture)).unwrap();
        fixture
            .negotiator
            .approve(proposal.id, Party::Original)
            .unwrap();
        fixture
            .negotiator
            .approve(proposal.id, Party::NewOwner)
            .unwrap();
        let shipment_id = fixture
            .negotiator
            .proposal(proposal.id)
            .unwrap()
            .shipment_id
            .unwrap();

        // Delivered before shipped is rejected.
        assert!(matches!(
            fixture.negotiator.apply_fulfillment(FulfillmentUpdate {
                shipment_id,
                status: ShipmentStatus::Delivered,
                carrier: None,
                tracking_number: None,
            }),
            Err(NegotiationError::InvalidFulfillmentTransition { .. })
        ));

        let shipped = fixture
            .negotiator
            .apply_fulfillment(FulfillmentUpdate {
                shipment_id,
                status: ShipmentStatus::Shipped,
                carrier: Some("DHL".to_string()),
                tracking_number: Some("TRK-001".to_string()),
            })
            .unwrap();
        assert_eq!(shipped.status, ShipmentStatus::Shipped);
        assert!(shipped.shipped_at.is_some());
        assert_eq!(shipped.carrier.as_deref(), Some("DHL"));

        let delivered = fixture
            .negotiator
            .apply_fulfillment(FulfillmentUpdate {
                shipment_id,
                status: ShipmentStatus::Delivered,
                carrier: None,
                tracking_number: None,
            })
            .unwrap();
        assert_eq!(delivered.status, ShipmentStatus::Delivered);
        assert!(delivered.delivered_at.is_some());
        // Earlier details survive later updates.
        assert_eq!(delivered.tracking_number.as_deref(), Some("TRK-001"));
    }

    #[test]
    fn test_fulfillment_has_no_ledger_effect() {
        let fixture = fixture(Rate::ZERO);
        fund(&fixture, fixture.new_owner, dec!(200));
        let proposal = fixture.negotiator.propose(request(&fixture)).unwrap();
        fixture
            .negotiator
            .approve(proposal.id, Party::Original)
            .unwrap();
        fixture
            .negotiator
            .approve(proposal.id, Party::NewOwner)
            .unwrap();
        let shipment_id = fixture
            .negotiator
            .proposal(proposal.id)
            .unwrap()
            .shipment_id
            .unwrap();
        let entries = fixture.reconciler.ledger().entry_count();

        fixture
            .negotiator
            .apply_fulfillment(FulfillmentUpdate {
                shipment_id,
                status: ShipmentStatus::Shipped,
                carrier: None,
                tracking_number: None,
            })
            .unwrap();

        assert_eq!(fixture.reconciler.ledger().entry_count(), entries);
    }
}
