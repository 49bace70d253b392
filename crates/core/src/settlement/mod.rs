//! Settlement calculations and the single ledger write path.

pub mod reconciler;
pub mod split;

#[cfg(test)]
mod split_props;

pub use reconciler::SettlementReconciler;
pub use split::{freelance_split, reown_split, resale_price, FreelanceSplit, ReownSplit};
