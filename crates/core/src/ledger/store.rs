//! Append-only ledger store.
//!
//! The single writer of balances. Every mutation goes through [`LedgerStore::append`],
//! which commits a batch atomically or not at all: token conservation, idempotency,
//! and the non-negative-balance invariant are all re-checked under the write lock,
//! so they hold even under concurrent commits.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use rust_decimal::Decimal;
use tessera_shared::types::{AccountId, CorrelationId, EntryId};
use tracing::debug;

use super::entry::{Account, EntryInput, LedgerEntry};
use super::error::LedgerError;
use crate::events::{DomainEvent, EventBus};

/// Mutable ledger state guarded by the store lock.
#[derive(Debug, Default)]
struct LedgerState {
    /// Accounts, created implicitly on first entry.
    accounts: HashMap<AccountId, Account>,
    /// All committed entries, in sequence order.
    entries: Vec<LedgerEntry>,
    /// Cached balance per account (derived from entries).
    balances: HashMap<AccountId, Decimal>,
    /// Cumulative signed sum per correlation id.
    correlation_sums: HashMap<CorrelationId, Decimal>,
    /// Idempotency keys already used, per account.
    used_keys: HashSet<(AccountId, String)>,
    /// Last sequence number assigned.
    sequence: u64,
}

/// Append-only set of token-transaction entries per account; source of truth
/// for balances.
#[derive(Debug)]
pub struct LedgerStore {
    inner: RwLock<LedgerState>,
    events: EventBus,
}

impl LedgerStore {
    /// Creates an empty store publishing to the given event bus.
    #[must_use]
    pub fn new(events: EventBus) -> Self {
        Self {
            inner: RwLock::new(LedgerState::default()),
            events,
        }
    }

    /// Commits a batch of entries atomically.
    ///
    /// Validation order: non-empty batch, non-zero amounts, kind/sign sanity,
    /// idempotency keys (within the batch and against history), stable
    /// account kinds, token conservation per correlation id, and the
    /// non-negative balance of every touched account.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] and commits nothing if any check fails.
    pub fn append(&self, batch: Vec<EntryInput>) -> Result<Vec<LedgerEntry>, LedgerError> {
        if batch.is_empty() {
            return Err(LedgerError::EmptyBatch);
        }

        let mut state = self.state_mut();

        Self::validate_amounts(&batch)?;
        Self::validate_idempotency(&state, &batch)?;
        Self::validate_account_kinds(&state, &batch)?;
        Self::validate_conservation(&state, &batch)?;
        Self::validate_balances(&state, &batch)?;

        let now = Utc::now();
        let mut committed = Vec::with_capacity(batch.len());

        for input in batch {
            state.sequence += 1;
            let sequence = state.sequence;

            state
                .accounts
                .entry(input.account_id)
                .or_insert_with(|| Account {
                    id: input.account_id,
                    kind: input.account_kind,
                    created_at: now,
                });

            *state
                .balances
                .entry(input.account_id)
                .or_insert(Decimal::ZERO) += input.amount;
            *state
                .correlation_sums
                .entry(input.correlation_id)
                .or_insert(Decimal::ZERO) += input.amount;
            state
                .used_keys
                .insert((input.account_id, input.idempotency_key.clone()));

            let entry = LedgerEntry {
                id: EntryId::new(),
                account_id: input.account_id,
                amount: input.amount,
                kind: input.kind,
                correlation_id: input.correlation_id,
                created_at: now,
                idempotency_key: input.idempotency_key,
                sequence,
                memo: input.memo,
            };
            state.entries.push(entry.clone());
            committed.push(entry);
        }

        debug!(
            entries = committed.len(),
            sequence = state.sequence,
            "ledger batch committed"
        );

        // Published under the lock so subscribers observe sequence order.
        for entry in &committed {
            self.events
                .publish(DomainEvent::LedgerEntryAppended(entry.clone()));
        }

        Ok(committed)
    }

    /// Sum of all entries for the account; zero for unknown accounts.
    ///
    /// Non-negative by construction.
    #[must_use]
    pub fn balance_of(&self, account_id: AccountId) -> Decimal {
        self.state()
            .balances
            .get(&account_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Looks up an account record.
    #[must_use]
    pub fn account(&self, account_id: AccountId) -> Option<Account> {
        self.state().accounts.get(&account_id).cloned()
    }

    /// All entries for an account, in sequence order.
    #[must_use]
    pub fn entries_for_account(&self, account_id: AccountId) -> Vec<LedgerEntry> {
        self.state()
            .entries
            .iter()
            .filter(|e| e.account_id == account_id)
            .cloned()
            .collect()
    }

    /// All entries sharing a correlation id, in sequence order.
    #[must_use]
    pub fn entries_for_correlation(&self, correlation_id: CorrelationId) -> Vec<LedgerEntry> {
        self.state()
            .entries
            .iter()
            .filter(|e| e.correlation_id == correlation_id)
            .cloned()
            .collect()
    }

    /// The frozen remainder of an escrow correlation: the amount debited but
    /// not yet released or refunded. Zero once the lifecycle completes.
    #[must_use]
    pub fn outstanding(&self, correlation_id: CorrelationId) -> Decimal {
        let sum = self
            .state()
            .correlation_sums
            .get(&correlation_id)
            .copied()
            .unwrap_or(Decimal::ZERO);
        if sum < Decimal::ZERO { -sum } else { Decimal::ZERO }
    }

    /// Last sequence number assigned.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.state().sequence
    }

    /// Number of committed entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.state().entries.len()
    }

    fn validate_amounts(batch: &[EntryInput]) -> Result<(), LedgerError> {
        for input in batch {
            if input.amount == Decimal::ZERO {
                return Err(LedgerError::ZeroAmount);
            }
            // Recharges are always credits; holds are always debits.
            let sign_ok = if input.kind.is_externally_funded() {
                input.amount > Decimal::ZERO
            } else if input.kind.opens_escrow() {
                input.amount < Decimal::ZERO
            } else {
                true
            };
            if !sign_ok {
                return Err(LedgerError::InvalidEntrySign {
                    kind: input.kind,
                    amount: input.amount,
                });
            }
        }
        Ok(())
    }

    fn validate_idempotency(state: &LedgerState, batch: &[EntryInput]) -> Result<(), LedgerError> {
        let mut seen: HashSet<(AccountId, &str)> = HashSet::with_capacity(batch.len());
        for input in batch {
            let duplicate_in_batch = !seen.insert((input.account_id, input.idempotency_key.as_str()));
            let duplicate_in_history = state
                .used_keys
                .contains(&(input.account_id, input.idempotency_key.clone()));
            if duplicate_in_batch || duplicate_in_history {
                return Err(LedgerError::DuplicateIdempotencyKey {
                    account_id: input.account_id,
                    key: input.idempotency_key.clone(),
                });
            }
        }
        Ok(())
    }

    fn validate_account_kinds(
        state: &LedgerState,
        batch: &[EntryInput],
    ) -> Result<(), LedgerError> {
        let mut kinds = HashMap::with_capacity(batch.len());
        for input in batch {
            let known = state
                .accounts
                .get(&input.account_id)
                .map(|a| a.kind)
                .or_else(|| kinds.get(&input.account_id).copied());
            match known {
                Some(kind) if kind != input.account_kind => {
                    return Err(LedgerError::AccountKindMismatch {
                        account_id: input.account_id,
                    });
                }
                Some(_) => {}
                None => {
                    kinds.insert(input.account_id, input.account_kind);
                }
            }
        }
        Ok(())
    }

    /// Token conservation per correlation id.
    ///
    /// Recharge batches are exempt (externally funded); a hold batch may
    /// leave a negative cumulative sum (the frozen amount); every other
    /// batch must bring its correlation's cumulative sum to exactly zero.
    fn validate_conservation(state: &LedgerState, batch: &[EntryInput]) -> Result<(), LedgerError> {
        struct Group {
            sum: Decimal,
            exempt: bool,
            opening: bool,
        }

        let mut groups: HashMap<CorrelationId, Group> = HashMap::new();
        for input in batch {
            let group = groups.entry(input.correlation_id).or_insert(Group {
                sum: Decimal::ZERO,
                exempt: false,
                opening: false,
            });
            group.sum += input.amount;
            group.exempt |= input.kind.is_externally_funded();
            group.opening |= input.kind.opens_escrow();
        }

        for (correlation_id, group) in groups {
            if group.exempt || group.opening {
                continue;
            }
            let prior = state
                .correlation_sums
                .get(&correlation_id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            let after = prior + group.sum;
            if after != Decimal::ZERO {
                return Err(LedgerError::Unbalanced {
                    correlation_id,
                    sum: after,
                });
            }
        }
        Ok(())
    }

    fn validate_balances(state: &LedgerState, batch: &[EntryInput]) -> Result<(), LedgerError> {
        let mut nets: HashMap<AccountId, Decimal> = HashMap::new();
        for input in batch {
            *nets.entry(input.account_id).or_insert(Decimal::ZERO) += input.amount;
        }
        for (account_id, net) in nets {
            let available = state
                .balances
                .get(&account_id)
                .copied()
                .unwrap_or(Decimal::ZERO);
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

    fn state(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
