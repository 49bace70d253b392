//! Append-only token ledger.
//!
//! This module implements the balance bookkeeping core:
//! - Entry and account domain types
//! - Error types for ledger operations
//! - The atomic batch store, source of truth for balances

pub mod entry;
pub mod error;
pub mod store;

#[cfg(test)]
mod store_props;

pub use entry::{Account, AccountKind, EntryInput, EntryKind, LedgerEntry};
pub use error::LedgerError;
pub use store::LedgerStore;
