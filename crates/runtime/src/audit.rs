//! Per-turn strategy audit: everything the bot considered and what happened.
//!
//! One audit row is persisted per turn, append-only, and mirrors the JSON
//! shape served by the read API (allOptions, scores, selectedPlan,
//! executionResults, timing).

use chrono::Utc;
use serde::Serialize;

use rail_core::TurnPlan;

use crate::executor::TurnExecutionResult;
use crate::options::FeasibleOption;
use crate::scoring::ScoredOption;
use crate::store::{AuditRow, StoreError};

/// How the turn concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionOutcome {
    /// A scored plan validated and executed.
    Success,
    /// All attempts failed; the guaranteed PassTurn ran instead.
    Fallback,
    /// The turn aborted before any plan could run.
    Error,
}

impl ExecutionOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            ExecutionOutcome::Success => "success",
            ExecutionOutcome::Fallback => "fallback",
            ExecutionOutcome::Error => "error",
        }
    }
}

/// Stage timing breakdown in milliseconds.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTimings {
    pub snapshot_ms: u64,
    pub option_generation_ms: u64,
    pub scoring_ms: u64,
    pub execution_ms: u64,
    pub total_ms: u64,
}

/// The full record of one bot turn. Created once, never mutated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyAudit {
    pub game_id: String,
    pub player_id: String,
    pub turn_number: u32,
    pub snapshot_hash: String,
    /// Every option the generator emitted, feasible or not.
    pub all_options: Vec<FeasibleOption>,
    /// Ranked scores, parallel to the feasible subset of `all_options`.
    pub scores: Vec<ScoredOption>,
    pub selected_plan: Option<TurnPlan>,
    pub execution_results: Option<TurnExecutionResult>,
    pub execution_outcome: ExecutionOutcome,
    pub timing: StageTimings,
}

impl StrategyAudit {
    /// Flattens the audit into a persistable row. Serialization failure maps
    /// to a store error so the caller can log and move on.
    pub fn to_row(&self) -> Result<AuditRow, StoreError> {
        let audit_json = serde_json::to_value(self)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(AuditRow {
            game_id: self.game_id.clone(),
            player_id: self.player_id.clone(),
            turn_number: self.turn_number,
            snapshot_hash: self.snapshot_hash.clone(),
            execution_result: self.execution_outcome.as_str().to_string(),
            audit_json,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audit(outcome: ExecutionOutcome) -> StrategyAudit {
        StrategyAudit {
            game_id: "g1".into(),
            player_id: "bot".into(),
            turn_number: 4,
            snapshot_hash: "abc123".into(),
            all_options: vec![],
            scores: vec![],
            selected_plan: None,
            execution_results: None,
            execution_outcome: outcome,
            timing: StageTimings::default(),
        }
    }

    #[test]
    fn row_carries_outcome_string() {
        let row = audit(ExecutionOutcome::Fallback).to_row().unwrap();
        assert_eq!(row.execution_result, "fallback");
        assert_eq!(row.snapshot_hash, "abc123");
    }

    #[test]
    fn audit_json_uses_camel_case_keys() {
        let row = audit(ExecutionOutcome::Success).to_row().unwrap();
        let json = row.audit_json;
        assert!(json.get("allOptions").is_some());
        assert!(json.get("scores").is_some());
        assert!(json.get("selectedPlan").is_some());
        assert!(json.get("executionResults").is_some());
        assert!(json.get("timing").is_some());
        assert_eq!(json["timing"]["totalMs"], 0);
    }
}
