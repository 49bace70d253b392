//! Property tests for the ledger store invariants.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tessera_shared::types::{AccountId, CorrelationId};

use super::entry::{AccountKind, EntryInput, EntryKind};
use super::store::LedgerStore;
use crate::events::EventBus;

/// Strategy for positive token amounts with two decimal places.
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn recharge(account_id: AccountId, amount: Decimal, key: String) -> EntryInput {
    EntryInput {
        account_id,
        account_kind: AccountKind::Client,
        amount,
        kind: EntryKind::Recharge,
        correlation_id: CorrelationId::new(),
        idempotency_key: key,
        memo: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For any sequence of recharges and balanced transfers, every
    /// non-recharge correlation id nets to exactly zero.
    #[test]
    fn prop_transfers_conserve_tokens(amounts in prop::collection::vec(amount_strategy(), 1..20)) {
        let store = LedgerStore::new(EventBus::default());
        let from = AccountId::new();
        let to = AccountId::new();

        let total: Decimal = amounts.iter().copied().sum();
        store
            .append(vec![recharge(from, total, "seed".to_string())])
            .unwrap();

        let mut correlations = Vec::with_capacity(amounts.len());
        for (i, amount) in amounts.iter().enumerate() {
            let correlation_id = CorrelationId::new();
            correlations.push(correlation_id);
            store
                .append(vec![
                    EntryInput {
                        account_id: from,
                        account_kind: AccountKind::Client,
                        amount: -*amount,
                        kind: EntryKind::ReownSettlement,
                        correlation_id,
                        idempotency_key: format!("debit:{i}"),
                        memo: None,
                    },
                    EntryInput {
                        account_id: to,
                        account_kind: AccountKind::Business,
                        amount: *amount,
                        kind: EntryKind::ReownSettlement,
                        correlation_id,
                        idempotency_key: format!("credit:{i}"),
                        memo: None,
                    },
                ])
                .unwrap();
        }

        for correlation_id in correlations {
            let sum: Decimal = store
                .entries_for_correlation(correlation_id)
                .iter()
                .map(|e| e.amount)
                .sum();
            prop_assert_eq!(sum, Decimal::ZERO);
        }
    }

    /// Balances never go negative, whatever the interleaving of credits and
    /// debits the store accepts.
    #[test]
    fn prop_balances_never_negative(
        seed in amount_strategy(),
        debits in prop::collection::vec(amount_strategy(), 1..20),
    ) {
        let store = LedgerStore::new(EventBus::default());
        let client = AccountId::new();
        let shop = AccountId::new();
        store
            .append(vec![recharge(client, seed, "seed".to_string())])
            .unwrap();

        for (i, debit) in debits.iter().enumerate() {
            // Some of these exceed the remaining balance; the store must
            // reject exactly those and keep the rest.
            let correlation_id = CorrelationId::new();
            let _ = store.append(vec![
                EntryInput {
                    account_id: client,
                    account_kind: AccountKind::Client,
                    amount: -*debit,
                    kind: EntryKind::ReownSettlement,
                    correlation_id,
                    idempotency_key: format!("d:{i}"),
                    memo: None,
                },
                EntryInput {
                    account_id: shop,
                    account_kind: AccountKind::Business,
                    amount: *debit,
                    kind: EntryKind::ReownSettlement,
                    correlation_id,
                    idempotency_key: format!("c:{i}"),
                    memo: None,
                },
            ]);
            prop_assert!(store.balance_of(client) >= Decimal::ZERO);
            prop_assert!(store.balance_of(shop) >= Decimal::ZERO);
        }
    }

    /// Sequence numbers form the contiguous series 1..=N across batches.
    #[test]
    fn prop_sequence_contiguous(amounts in prop::collection::vec(amount_strategy(), 1..20)) {
        let store = LedgerStore::new(EventBus::default());
        let account = AccountId::new();

        for (i, amount) in amounts.iter().enumerate() {
            store
                .append(vec![recharge(account, *amount, format!("r:{i}"))])
                .unwrap();
        }

        let sequences: Vec<u64> = store
            .entries_for_account(account)
            .iter()
            .map(|e| e.sequence)
            .collect();
        let expected: Vec<u64> = (1..=amounts.len() as u64).collect();
        prop_assert_eq!(sequences, expected);
    }

    /// Replaying a recharge with the same idempotency key never changes the
    /// balance a second time.
    #[test]
    fn prop_recharge_replay_is_noop(amount in amount_strategy(), replays in 1usize..5) {
        let store = LedgerStore::new(EventBus::default());
        let account = AccountId::new();

        store
            .append(vec![recharge(account, amount, "gateway-key".to_string())])
            .unwrap();
        let balance = store.balance_of(account);

        for _ in 0..replays {
            let result = store.append(vec![recharge(account, amount, "gateway-key".to_string())]);
            prop_assert!(result.is_err());
        }
        prop_assert_eq!(store.balance_of(account), balance);
    }
}
