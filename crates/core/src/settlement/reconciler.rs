//! Settlement reconciler: the single write path into the ledger.
//!
//! The escrow controller and the re-ownership negotiator are the only
//! collaborators permitted to move tokens, and both do it through
//! [`SettlementReconciler::commit`] so all money movement funnels through
//! one choke point for auditability.

use std::sync::Arc;

use rust_decimal::Decimal;
use tessera_shared::types::{AccountId, CorrelationId, Rate, RepostId};
use tracing::{debug, error, warn};

use super::split::{self, FreelanceSplit, ReownSplit};
use crate::ledger::{AccountKind, EntryInput, EntryKind, LedgerError, LedgerStore};
use crate::recharge::RechargeConfirmation;

/// Stateless calculation and orchestration layer over the ledger store.
#[derive(Debug)]
pub struct SettlementReconciler {
    ledger: Arc<LedgerStore>,
    platform_account: AccountId,
}

impl SettlementReconciler {
    /// Creates a reconciler crediting commissions to `platform_account`.
    #[must_use]
    pub fn new(ledger: Arc<LedgerStore>, platform_account: AccountId) -> Self {
        Self {
            ledger,
            platform_account,
        }
    }

    /// The platform treasury account commissions route to.
    #[must_use]
    pub fn platform_account(&self) -> AccountId {
        self.platform_account
    }

    /// The underlying ledger store.
    #[must_use]
    pub fn ledger(&self) -> &Arc<LedgerStore> {
        &self.ledger
    }

    /// Splits a held escrow amount into payout, commission, and referral bonus.
    #[must_use]
    pub fn freelance_split(
        amount: Decimal,
        commission_rate: Rate,
        referral_rate: Rate,
    ) -> FreelanceSplit {
        split::freelance_split(amount, commission_rate, referral_rate)
    }

    /// Splits a committed re-ownership settlement between old owner and platform.
    #[must_use]
    pub fn reown_split(new_price: Decimal, quantity: u32, platform_cut: Rate) -> ReownSplit {
        split::reown_split(new_price, quantity, platform_cut)
    }

    /// Computes the resale unit price: `old_price * (1 + markup)`.
    #[must_use]
    pub fn resale_price(old_price: Decimal, markup_rate: Rate) -> Decimal {
        split::resale_price(old_price, markup_rate)
    }

    /// Commits a batch of entries atomically.
    ///
    /// `DuplicateIdempotencyKey` means the batch was already committed by an
    /// earlier attempt; retried settlement calls therefore observe success.
    /// Internal failures (`Unbalanced`, sign violations) indicate a bug, not
    /// bad user input, and are logged before they propagate.
    pub fn commit(&self, batch: Vec<EntryInput>) -> Result<(), LedgerError> {
        // Early balance check so callers get InsufficientFunds before any
        // side effects; the store re-checks atomically at commit time.
        self.ensure_funded(&batch)?;

        match self.ledger.append(batch) {
            Ok(entries) => {
                debug!(entries = entries.len(), "settlement committed");
                Ok(())
            }
            Err(err) if err.is_replay() => {
                warn!(error = %err, "settlement replayed, treating as committed");
                Ok(())
            }
            Err(err) => {
                if err.is_internal() {
                    error!(error = %err, "settlement failed with internal ledger error");
                }
                Err(err)
            }
        }
    }

    /// Appends a verified recharge as a credit entry.
    ///
    /// Replaying the same confirmation (same idempotency key) is a no-op
    /// success: the balance changes exactly once.
    pub fn recharge(&self, confirmation: RechargeConfirmation) -> Result<(), LedgerError> {
        if confirmation.amount <= Decimal::ZERO {
            return Err(LedgerError::NegativeAmount(confirmation.amount));
        }

        self.commit(vec![EntryInput {
            account_id: confirmation.account_id,
            account_kind: confirmation.account_kind,
            amount: confirmation.amount,
            kind: EntryKind::Recharge,
            correlation_id: confirmation.recharge_id.into(),
            idempotency_key: confirmation.idempotency_key,
            memo: Some(format!("recharge via {}", confirmation.method)),
        }])
    }

    /// Accrues an ad-repost bonus: the platform funds the bonus out of
    /// accumulated commissions, so conservation and non-negativity hold
    /// unchanged.
    pub fn accrue_repost_bonus(
        &self,
        business: AccountId,
        amount: Decimal,
        repost_id: RepostId,
        idempotency_key: &str,
    ) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::NegativeAmount(amount));
        }
        let correlation_id: CorrelationId = repost_id.into();

        self.commit(vec![
            EntryInput {
                account_id: self.platform_account,
                account_kind: AccountKind::Platform,
                amount: -amount,
                kind: EntryKind::RepostCommission,
                correlation_id,
                idempotency_key: idempotency_key.to_string(),
                memo: None,
            },
            EntryInput {
                account_id: business,
                account_kind: AccountKind::Business,
                amount,
                kind: EntryKind::RepostCommission,
                correlation_id,
                idempotency_key: idempotency_key.to_string(),
                memo: None,
            },
        ])
    }

    fn ensure_funded(&self, batch: &[EntryInput]) -> Result<(), LedgerError> {
        use std::collections::HashMap;

        let mut nets: HashMap<AccountId, Decimal> = HashMap::new();
        for input in batch {
            *nets.entry(input.account_id).or_insert(Decimal::ZERO) += input.amount;
        }
        for (account_id, net) in nets {
            if net >= Decimal::ZERO {
                continue;
            }
            let available = self.ledger.balance_of(account_id);
            if available + net < Decimal::ZERO {
                return Err(LedgerError::InsufficientFunds {
                    account_id,
                    available,
                    requested: -net,
                });
            }
        }
        Ok(())
    }
}
