//! Inbound adapter for verified recharge events.
//!
//! The payment gateway (mobile-money, card) verifies and captures real-world
//! payments upstream; this adapter only turns confirmed recharges into
//! RECHARGE credit entries. Provenance validation is not this core's job.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tessera_shared::types::{AccountId, RechargeId};

use crate::ledger::{AccountKind, LedgerError};
use crate::settlement::SettlementReconciler;

/// Payment channel the recharge arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RechargeMethod {
    /// Mobile-money transfer.
    MobileMoney,
    /// Card payment.
    Card,
}

impl std::fmt::Display for RechargeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MobileMoney => write!(f, "mobile_money"),
            Self::Card => write!(f, "card"),
        }
    }
}

/// A verified recharge confirmation from the payment gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RechargeConfirmation {
    /// The gateway's recharge record.
    pub recharge_id: RechargeId,
    /// The account being topped up.
    pub account_id: AccountId,
    /// Kind of the account being topped up.
    pub account_kind: AccountKind,
    /// Verified amount, strictly positive.
    pub amount: Decimal,
    /// Payment channel.
    pub method: RechargeMethod,
    /// Gateway-supplied key making replays safe.
    pub idempotency_key: String,
}

/// Thin adapter feeding recharge confirmations into the ledger.
#[derive(Debug)]
pub struct RechargeGateway {
    reconciler: Arc<SettlementReconciler>,
}

impl RechargeGateway {
    /// Creates a gateway crediting through the given reconciler.
    #[must_use]
    pub fn new(reconciler: Arc<SettlementReconciler>) -> Self {
        Self { reconciler }
    }

    /// Credits a confirmed recharge. Replaying the same confirmation is a
    /// no-op success.
    pub fn confirm(&self, confirmation: RechargeConfirmation) -> Result<(), LedgerError> {
        self.reconciler.recharge(confirmation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::ledger::LedgerStore;
    use rust_decimal_macros::dec;

    fn gateway() -> (RechargeGateway, Arc<SettlementReconciler>) {
        let ledger = Arc::new(LedgerStore::new(EventBus::default()));
        let reconciler = Arc::new(SettlementReconciler::new(ledger, AccountId::new()));
        (RechargeGateway::new(Arc::clone(&reconciler)), reconciler)
    }

    #[test]
    fn test_confirm_credits_account() {
        let (gateway, reconciler) = gateway();
        let account = AccountId::new();

        gateway
            .confirm(RechargeConfirmation {
                recharge_id: RechargeId::new(),
                account_id: account,
                account_kind: AccountKind::Business,
                amount: dec!(40),
                method: RechargeMethod::MobileMoney,
                idempotency_key: "gw:1".to_string(),
            })
            .unwrap();

        assert_eq!(reconciler.ledger().balance_of(account), dec!(40));
    }

    #[test]
    fn test_replayed_confirmation_is_noop() {
        let (gateway, reconciler) = gateway();
        let account = AccountId::new();
        let confirmation = RechargeConfirmation {
            recharge_id: RechargeId::new(),
            account_id: account,
            account_kind: AccountKind::Business,
            amount: dec!(40),
            method: RechargeMethod::Card,
            idempotency_key: "gw:1".to_string(),
        };

        gateway.confirm(confirmation.clone()).unwrap();
        gateway.confirm(confirmation).unwrap();

        assert_eq!(reconciler.ledger().balance_of(account), dec!(40));
    }

    #[test]
    fn test_method_display() {
        assert_eq!(RechargeMethod::MobileMoney.to_string(), "mobile_money");
        assert_eq!(RechargeMethod::Card.to_string(), "card");
    }
}
