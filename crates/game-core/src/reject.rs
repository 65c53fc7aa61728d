//! Closed taxonomy of rejection reasons.
//!
//! Feasibility checks, the plan validator, and the executor all signal
//! failures through these variants; the human-readable strings only appear at
//! the audit/logging boundary via `Display`.

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::train::TrainClass;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectReason {
    #[error("not connected to track network: {city}")]
    NotConnected { city: String },

    #[error("train is at capacity ({capacity} loads)")]
    AtCapacity { capacity: usize },

    #[error("none available globally: {resource}")]
    NoneAvailable { resource: String },

    #[error("Insufficient funds: need {needed}M, have {cash}M")]
    InsufficientFunds { needed: u64, cash: u64 },

    #[error("per-turn build budget exhausted ({spent}M of {budget}M)")]
    BudgetExhausted { spent: u64, budget: u64 },

    #[error("demand card {card_id} already used this turn")]
    CardAlreadyUsed { card_id: u32 },

    #[error("demand card {card_id} not found in hand")]
    CardNotFound { card_id: u32 },

    #[error("load {resource} is not on the train")]
    LoadNotCarried { resource: String },

    #[error("cannot build track after upgrading this turn")]
    BuildAfterUpgrade,

    #[error("cannot upgrade after building track this turn")]
    UpgradeAfterBuild,

    #[error("Already upgraded this turn")]
    AlreadyUpgraded,

    #[error("no legal transition from {from} to {to}")]
    InvalidTransition { from: TrainClass, to: TrainClass },

    #[error("carrying {loads} loads exceeds new capacity of {capacity}")]
    OverCapacity { loads: usize, capacity: usize },

    #[error("crossgrade blocked: {spent}M track spend exceeds the {cap}M cap")]
    CrossgradeOverspend { spent: u64, cap: u64 },

    #[error("Unknown action type: {kind}")]
    UnknownAction { kind: String },
}

// Audits carry the stable string form, not the structured variant.
impl Serialize for RejectReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
