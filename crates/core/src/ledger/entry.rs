//! Ledger entry domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tessera_shared::types::{AccountId, CorrelationId, EntryId};

/// Kind of token holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// A buyer/consumer account.
    Client,
    /// A seller/worker account.
    Business,
    /// The platform treasury commission kinds route value to.
    Platform,
}

impl AccountKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Business => "business",
            Self::Platform => "platform",
        }
    }
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification of a ledger entry.
///
/// RECHARGE is the only externally-funded credit kind; ESCROW_HOLD opens an
/// escrow correlation whose frozen amount a later release or refund batch
/// must bring back to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Verified top-up from the payment gateway.
    Recharge,
    /// Debit freezing client funds for a freelance order.
    EscrowHold,
    /// Credit paying a released escrow out to the payee.
    EscrowRelease,
    /// Credit restoring a refunded escrow to the client.
    EscrowRefund,
    /// Bonus paid to a business for reposting an ad.
    RepostCommission,
    /// Platform commission carved out of a settlement.
    ProfitShare,
    /// Transfer settling a committed re-ownership.
    ReownSettlement,
    /// Referral bonus carved out of a commission.
    ReferralBonus,
}

impl EntryKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recharge => "recharge",
            Self::EscrowHold => "escrow_hold",
            Self::EscrowRelease => "escrow_release",
            Self::EscrowRefund => "escrow_refund",
            Self::RepostCommission => "repost_commission",
            Self::ProfitShare => "profit_share",
            Self::ReownSettlement => "reown_settlement",
            Self::ReferralBonus => "referral_bonus",
        }
    }

    /// True for the only kind funded from outside the ledger.
    #[must_use]
    pub fn is_externally_funded(&self) -> bool {
        matches!(self, Self::Recharge)
    }

    /// True for the kind that opens an escrow correlation.
    #[must_use]
    pub fn opens_escrow(&self) -> bool {
        matches!(self, Self::EscrowHold)
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A token account, created implicitly on first ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Kind of holder.
    pub kind: AccountKind,
    /// When the first entry touched this account.
    pub created_at: DateTime<Utc>,
}

/// Input for a single entry in an append batch.
#[derive(Debug, Clone)]
pub struct EntryInput {
    /// The account the entry posts to.
    pub account_id: AccountId,
    /// Kind of the account; must be stable across entries for the same id.
    pub account_kind: AccountKind,
    /// Signed amount: positive = credit, negative = debit.
    pub amount: Decimal,
    /// Classification of the entry.
    pub kind: EntryKind,
    /// The business object this entry settles against.
    pub correlation_id: CorrelationId,
    /// Retry-safety key, unique per account.
    pub idempotency_key: String,
    /// Optional description for audit trails.
    pub memo: Option<String>,
}

/// An immutable, committed ledger entry.
///
/// Entries are never updated or deleted; a correction is always a new
/// offsetting entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier.
    pub id: EntryId,
    /// The account the entry posts to.
    pub account_id: AccountId,
    /// Signed amount: positive = credit, negative = debit.
    pub amount: Decimal,
    /// Classification of the entry.
    pub kind: EntryKind,
    /// The business object this entry settles against.
    pub correlation_id: CorrelationId,
    /// When the entry was committed.
    pub created_at: DateTime<Utc>,
    /// Retry-safety key, unique per account.
    pub idempotency_key: String,
    /// Ledger-wide monotonic position assigned at commit.
    pub sequence: u64,
    /// Optional description for audit trails.
    pub memo: Option<String>,
}

impl LedgerEntry {
    /// Returns true if the entry credits the account.
    #[must_use]
    pub fn is_credit(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Returns true if the entry debits the account.
    #[must_use]
    pub fn is_debit(&self) -> bool {
        self.amount < Decimal::ZERO
    }
}
