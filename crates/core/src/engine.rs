//! Composition root wiring the settlement core together.
//!
//! There is no ambient global state: the ledger store is built here and
//! injected explicitly into the escrow controller, the negotiator, and the
//! reconciler. Outer layers hold one `SettlementEngine` and reach everything
//! through it.

use std::sync::Arc;

use rust_decimal::Decimal;
use tessera_shared::config::SettlementConfig;
use tessera_shared::types::{AccountId, Rate};
use tessera_shared::AppError;

use crate::escrow::EscrowController;
use crate::events::EventBus;
use crate::ledger::LedgerStore;
use crate::recharge::RechargeGateway;
use crate::reown::ReOwnershipNegotiator;
use crate::settlement::SettlementReconciler;

/// The assembled token ledger and settlement engine.
#[derive(Debug)]
pub struct SettlementEngine {
    events: EventBus,
    ledger: Arc<LedgerStore>,
    reconciler: Arc<SettlementReconciler>,
    escrow: EscrowController,
    negotiator: ReOwnershipNegotiator,
    recharges: RechargeGateway,
}

impl SettlementEngine {
    /// Builds an engine with a fresh platform treasury account.
    pub fn new(config: &SettlementConfig) -> Result<Self, AppError> {
        Self::with_platform_account(config, AccountId::new())
    }

    /// Builds an engine crediting commissions to an existing platform account.
    pub fn with_platform_account(
        config: &SettlementConfig,
        platform_account: AccountId,
    ) -> Result<Self, AppError> {
        let reown_platform_cut = Rate::share(config.reown_platform_cut)
            .map_err(|e| AppError::Configuration(e.to_string()))?;
        let referral_bonus_rate = Rate::share(config.referral_bonus_rate)
            .map_err(|e| AppError::Configuration(e.to_string()))?;

        let events = EventBus::default();
        let ledger = Arc::new(LedgerStore::new(events.clone()));
        let reconciler = Arc::new(SettlementReconciler::new(
            Arc::clone(&ledger),
            platform_account,
        ));
        let escrow = EscrowController::new(
            Arc::clone(&reconciler),
            referral_bonus_rate,
            events.clone(),
        );
        let negotiator = ReOwnershipNegotiator::new(
            Arc::clone(&reconciler),
            reown_platform_cut,
            events.clone(),
        );
        let recharges = RechargeGateway::new(Arc::clone(&reconciler));

        Ok(Self {
            events,
            ledger,
            reconciler,
            escrow,
            negotiator,
            recharges,
        })
    }

    /// The event bus state changes publish to.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The append-only ledger store.
    #[must_use]
    pub fn ledger(&self) -> &Arc<LedgerStore> {
        &self.ledger
    }

    /// The settlement reconciler.
    #[must_use]
    pub fn reconciler(&self) -> &Arc<SettlementReconciler> {
        &self.reconciler
    }

    /// The escrow controller.
    #[must_use]
    pub fn escrow(&self) -> &EscrowController {
        &self.escrow
    }

    /// The re-ownership negotiator.
    #[must_use]
    pub fn negotiator(&self) -> &ReOwnershipNegotiator {
        &self.negotiator
    }

    /// The recharge gateway adapter.
    #[must_use]
    pub fn recharges(&self) -> &RechargeGateway {
        &self.recharges
    }

    /// The platform treasury account.
    #[must_use]
    pub fn platform_account(&self) -> AccountId {
        self.reconciler.platform_account()
    }

    /// Balance query for dashboards.
    #[must_use]
    pub fn balance_of(&self, account_id: AccountId) -> Decimal {
        self.ledger.balance_of(account_id)
    }
}
