//! Escrow state machine for freelance orders.
//!
//! Transitions are serialized on the hold registry: the write lock is held
//! across validate-commit-flip so "exactly one release" holds under
//! concurrent callers, and a failed ledger commit leaves the hold untouched.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use rust_decimal::Decimal;
use tessera_shared::types::{OrderId, Rate};
use tracing::debug;

use super::error::EscrowError;
use super::hold::{DisputeOutcome, EscrowHold, EscrowStatus, HoldRequest};
use crate::events::{DomainEvent, EventBus};
use crate::ledger::{AccountKind, EntryInput, EntryKind};
use crate::settlement::SettlementReconciler;

/// State machine governing a single freelance order's held funds.
#[derive(Debug)]
pub struct EscrowController {
    holds: RwLock<HashMap<OrderId, EscrowHold>>,
    reconciler: Arc<SettlementReconciler>,
    referral_rate: Rate,
    events: EventBus,
}

impl EscrowController {
    /// Creates a controller writing through the given reconciler.
    #[must_use]
    pub fn new(reconciler: Arc<SettlementReconciler>, referral_rate: Rate, events: EventBus) -> Self {
        Self {
            holds: RwLock::new(HashMap::new()),
            reconciler,
            referral_rate,
            events,
        }
    }

    /// Freezes the captured client payment for an order.
    ///
    /// Only callable once per order. Emits a single ESCROW_HOLD debit against
    /// the client; the matching pending credit lives in the returned hold
    /// record until release.
    pub fn hold(&self, request: HoldRequest) -> Result<EscrowHold, EscrowError> {
        if request.amount <= Decimal::ZERO {
            return Err(EscrowError::InvalidAmount(request.amount));
        }

        let mut holds = self.holds_mut();
        if holds.contains_key(&request.order_id) {
            return Err(EscrowError::AlreadyHeld(request.order_id));
        }

        self.reconciler.commit(vec![EntryInput {
            account_id: request.client,
            account_kind: AccountKind::Client,
            amount: -request.amount,
            kind: EntryKind::EscrowHold,
            correlation_id: request.order_id.into(),
            idempotency_key: format!("escrow-hold:{}", request.order_id),
            memo: None,
        }])?;

        let hold = EscrowHold {
            order_id: request.order_id,
            client: request.client,
            payee: request.payee,
            referrer: request.referrer,
            amount: request.amount,
            commission_rate: request.commission_rate,
            status: EscrowStatus::Held,
            created_at: Utc::now(),
            released_at: None,
            resolution_note: None,
        };
        holds.insert(request.order_id, hold.clone());

        debug!(order_id = %request.order_id, amount = %request.amount, "escrow held");
        Ok(hold)
    }

    /// Pays a held order out: Held → Released.
    ///
    /// Releasing twice would double-pay, so the operation is not idempotent:
    /// the second call observes the terminal status and fails with `NotHeld`.
    pub fn release(&self, order_id: OrderId) -> Result<(), EscrowError> {
        let mut holds = self.holds_mut();
        let hold = holds
            .get_mut(&order_id)
            .ok_or(EscrowError::HoldNotFound(order_id))?;

        if hold.status != EscrowStatus::Held {
            return Err(EscrowError::NotHeld {
                order_id,
                status: hold.status,
            });
        }

        Self::settle_release(&self.reconciler, self.referral_rate, &self.events, hold)
    }

    /// Freezes a held order in dispute: Held → Disputed. No ledger effect.
    pub fn dispute(&self, order_id: OrderId, note: &str) -> Result<(), EscrowError> {
        if note.trim().is_empty() {
            return Err(EscrowError::NoteRequired);
        }

        let mut holds = self.holds_mut();
        let hold = holds
            .get_mut(&order_id)
            .ok_or(EscrowError::HoldNotFound(order_id))?;

        if hold.status != EscrowStatus::Held {
            return Err(EscrowError::NotHeld {
                order_id,
                status: hold.status,
            });
        }

        hold.status = EscrowStatus::Disputed;
        hold.resolution_note = Some(note.trim().to_string());
        self.events.publish(DomainEvent::EscrowDisputed { order_id });

        debug!(order_id = %order_id, "escrow disputed");
        Ok(())
    }

    /// Applies an external (manual/admin) dispute resolution:
    /// Disputed → Released or Disputed → Refunded.
    pub fn resolve_dispute(
        &self,
        order_id: OrderId,
        outcome: DisputeOutcome,
    ) -> Result<(), EscrowError> {
        let mut holds = self.holds_mut();
        let hold = holds
            .get_mut(&order_id)
            .ok_or(EscrowError::HoldNotFound(order_id))?;

        if hold.status != EscrowStatus::Disputed {
            return Err(EscrowError::NotDisputed {
                order_id,
                status: hold.status,
            });
        }

        match outcome {
            DisputeOutcome::Release => {
                Self::settle_release(&self.reconciler, self.referral_rate, &self.events, hold)
            }
            DisputeOutcome::Refund => {
                self.reconciler.commit(vec![EntryInput {
                    account_id: hold.client,
                    account_kind: AccountKind::Client,
                    amount: hold.amount,
                    kind: EntryKind::EscrowRefund,
                    correlation_id: order_id.into(),
                    idempotency_key: format!("escrow-refund:{order_id}"),
                    memo: hold.resolution_note.clone(),
                }])?;

                hold.status = EscrowStatus::Refunded;
                hold.released_at = Some(Utc::now());
                self.events.publish(DomainEvent::EscrowRefunded {
                    order_id,
                    amount: hold.amount,
                });

                debug!(order_id = %order_id, "escrow refunded");
                Ok(())
            }
        }
    }

    /// Current status of an order's escrow, if one exists.
    #[must_use]
    pub fn status(&self, order_id: OrderId) -> Option<EscrowStatus> {
        self.holds().get(&order_id).map(|h| h.status)
    }

    /// Full hold record for dashboards.
    #[must_use]
    pub fn get(&self, order_id: OrderId) -> Option<EscrowHold> {
        self.holds().get(&order_id).cloned()
    }

    /// Commits the release split and flips the hold, shared by `release` and
    /// `resolve_dispute`. The ledger commit happens first; the status only
    /// flips once the entries are in.
    fn settle_release(
        reconciler: &SettlementReconciler,
        referral_rate: Rate,
        events: &EventBus,
        hold: &mut EscrowHold,
    ) -> Result<(), EscrowError> {
        let order_id = hold.order_id;
        let referral_rate = if hold.referrer.is_some() {
            referral_rate
        } else {
            Rate::ZERO
        };
        let split =
            SettlementReconciler::freelance_split(hold.amount, hold.commission_rate, referral_rate);

        let mut batch = Vec::with_capacity(3);
        if split.payout > Decimal::ZERO {
            batch.push(EntryInput {
                account_id: hold.payee,
                account_kind: AccountKind::Business,
                amount: split.payout,
                kind: EntryKind::EscrowRelease,
                correlation_id: order_id.into(),
                idempotency_key: format!("escrow-release:{order_id}"),
                memo: None,
            });
        }
        if split.commission > Decimal::ZERO {
            batch.push(EntryInput {
                account_id: reconciler.platform_account(),
                account_kind: AccountKind::Platform,
                amount: split.commission,
                kind: EntryKind::ProfitShare,
                correlation_id: order_id.into(),
                idempotency_key: format!("escrow-release:{order_id}"),
                memo: None,
            });
        }
        if let Some(referrer) = hold.referrer
            && split.referral_bonus > Decimal::ZERO
        {
            batch.push(EntryInput {
                account_id: referrer,
                account_kind: AccountKind::Business,
                amount: split.referral_bonus,
                kind: EntryKind::ReferralBonus,
                correlation_id: order_id.into(),
                idempotency_key: format!("escrow-release:{order_id}"),
                memo: None,
            });
        }

        reconciler.commit(batch)?;

        hold.status = EscrowStatus::Released;
        hold.released_at = Some(Utc::now());
        events.publish(DomainEvent::EscrowReleased {
            order_id,
            payout: split.payout,
            commission: split.commission,
            referral_bonus: split.referral_bonus,
        });

        debug!(
            order_id = %order_id,
            payout = %split.payout,
            commission = %split.commission,
            "escrow released"
        );
        Ok(())
    }

    fn holds(&self) -> RwLockReadGuard<'_, HashMap<OrderId, EscrowHold>> {
        self.holds.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn holds_mut(&self) -> RwLockWriteGuard<'_, HashMap<OrderId, EscrowHold>> {
        self.holds.write().unwrap_or_else(PoisonError::into_inner)
    }
}
