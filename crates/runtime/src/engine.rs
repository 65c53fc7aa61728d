//! Strategy engine: the per-turn state machine.
//!
//! Capturing -> Generating -> Scoring -> SelectCandidate -> Validating ->
//! Executing -> Done, with a bounded retry edge back to SelectCandidate on
//! validation or execution failure and a guaranteed PassTurn fallback once
//! attempts run out. One StrategyAudit row is persisted per turn no matter
//! which path the turn took.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use crate::executor::elapsed_ms;

use rand::Rng;
use serde_json::json;

use rail_core::{
    Archetype, ArchetypeProfile, Difficulty, ExpectedOutcome, SkillProfile, TurnAction, TurnPlan,
    ValidationResult, WorldSnapshot, validate,
};

use crate::audit::{ExecutionOutcome, StageTimings, StrategyAudit};
use crate::error::{EngineError, Result};
use crate::events::{BotEvent, NotificationBus};
use crate::executor::{PlanExecutor, TurnExecutionResult};
use crate::options::OptionGenerator;
use crate::scoring::{ScoredOption, Scorer};
use crate::snapshot::SnapshotBuilder;
use crate::store::{AuditStore, GameStore, PlayerRow};

/// Validation and execution failures both consume an attempt; after this many
/// the engine falls back to PassTurn.
pub const MAX_ATTEMPTS: usize = 3;

/// Plan legality check. Seam so tests can observe or script validation.
pub trait PlanValidator: Send + Sync {
    fn validate(&self, plan: &TurnPlan, snapshot: &WorldSnapshot) -> ValidationResult;
}

/// Production validator: replays the plan against a local simulation.
pub struct SimValidator;

impl PlanValidator for SimValidator {
    fn validate(&self, plan: &TurnPlan, snapshot: &WorldSnapshot) -> ValidationResult {
        validate(plan, snapshot)
    }
}

pub struct StrategyEngine {
    store: Arc<dyn GameStore>,
    audits: Arc<dyn AuditStore>,
    snapshots: SnapshotBuilder,
    validator: Arc<dyn PlanValidator>,
    executor: Arc<dyn PlanExecutor>,
    bus: NotificationBus,
}

impl StrategyEngine {
    pub fn new(
        store: Arc<dyn GameStore>,
        audits: Arc<dyn AuditStore>,
        snapshots: SnapshotBuilder,
        validator: Arc<dyn PlanValidator>,
        executor: Arc<dyn PlanExecutor>,
        bus: NotificationBus,
    ) -> Self {
        Self { store, audits, snapshots, validator, executor, bus }
    }

    /// Runs one full turn for the bot and returns its audit record.
    ///
    /// Fails fatally only when the game or the bot's player row is missing;
    /// every later problem degrades to a fallback or error audit instead.
    pub async fn execute_turn<R: Rng>(
        &self,
        game_id: &str,
        bot_id: &str,
        rng: &mut R,
    ) -> Result<StrategyAudit> {
        let turn_start = Instant::now();
        self.bus.emit(
            game_id,
            BotEvent::Thinking,
            json!({ "playerId": bot_id }),
        );

        let (difficulty, archetype) = self.load_config(game_id, bot_id).await?;
        let skill = SkillProfile::for_difficulty(difficulty);
        let personality = ArchetypeProfile::for_archetype(archetype);

        let snapshot_start = Instant::now();
        let snapshot = self.snapshots.build(game_id, bot_id).await?;
        let snapshot_ms = elapsed_ms(snapshot_start);

        let generation_start = Instant::now();
        let all_options = OptionGenerator::generate(&snapshot);
        let option_generation_ms = elapsed_ms(generation_start);

        let scoring_start = Instant::now();
        let scores = Scorer::score(&all_options, &snapshot, skill, personality, rng);
        let scoring_ms = elapsed_ms(scoring_start);

        let execution_start = Instant::now();
        let (outcome, selected_plan, execution_results) = self
            .select_and_execute(game_id, bot_id, &snapshot, &scores, difficulty, archetype)
            .await;
        let execution_ms = elapsed_ms(execution_start);

        if !execution_results.as_ref().map(|r| r.success).unwrap_or(false) {
            self.bus.emit(
                game_id,
                BotEvent::TurnComplete,
                json!({ "playerId": bot_id, "success": false }),
            );
        }

        let audit = StrategyAudit {
            game_id: game_id.to_string(),
            player_id: bot_id.to_string(),
            turn_number: snapshot.turn_number,
            snapshot_hash: snapshot.hash.clone(),
            all_options,
            scores,
            selected_plan,
            execution_results,
            execution_outcome: outcome,
            timing: StageTimings {
                snapshot_ms,
                option_generation_ms,
                scoring_ms,
                execution_ms,
                total_ms: elapsed_ms(turn_start),
            },
        };
        self.persist_audit(&audit).await;
        Ok(audit)
    }

    /// SelectCandidate/Validating/Executing loop with the Retry edge.
    async fn select_and_execute(
        &self,
        game_id: &str,
        bot_id: &str,
        snapshot: &WorldSnapshot,
        scores: &[ScoredOption],
        difficulty: Difficulty,
        archetype: Archetype,
    ) -> (ExecutionOutcome, Option<TurnPlan>, Option<TurnExecutionResult>) {
        let mut next_candidate = 0usize;

        for attempt in 1..=MAX_ATTEMPTS {
            let Some(candidate) = scores.get(next_candidate) else {
                break;
            };
            next_candidate += 1;

            let plan = plan_from(candidate, snapshot, difficulty, archetype);
            let verdict = self.validator.validate(&plan, snapshot);
            if !verdict.ok {
                tracing::debug!(
                    bot = bot_id,
                    attempt,
                    option = %candidate.option.id,
                    reason = verdict.reason.as_deref().unwrap_or(""),
                    "candidate failed validation"
                );
                continue;
            }

            let result = self.executor.execute(&plan, game_id, bot_id).await;
            if result.success {
                return (ExecutionOutcome::Success, Some(plan), Some(result));
            }
            tracing::warn!(
                bot = bot_id,
                attempt,
                option = %candidate.option.id,
                failure = result.failure.as_deref().unwrap_or(""),
                "candidate failed execution"
            );
        }

        // Fallback: PassTurn is executed directly, no validation needed.
        tracing::debug!(bot = bot_id, "falling back to pass-turn");
        let plan = TurnPlan::pass(difficulty, archetype);
        let result = self.executor.execute(&plan, game_id, bot_id).await;
        let outcome = if result.success {
            ExecutionOutcome::Fallback
        } else {
            ExecutionOutcome::Error
        };
        (outcome, Some(plan), Some(result))
    }

    async fn load_config(&self, game_id: &str, bot_id: &str) -> Result<(Difficulty, Archetype)> {
        let rows = self.store.load_players(game_id).await?;
        let row = rows
            .iter()
            .find(|row| row.id == bot_id)
            .ok_or_else(|| EngineError::PlayerNotFound(bot_id.to_string()))?;
        Ok((decode_difficulty(row), decode_archetype(row)))
    }

    /// Audit persistence is best-effort: a failed insert is logged, never
    /// surfaced to the caller.
    async fn persist_audit(&self, audit: &StrategyAudit) {
        let row = match audit.to_row() {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize strategy audit");
                return;
            }
        };
        if let Err(e) = self.audits.insert_audit(row).await {
            tracing::warn!(error = %e, "failed to persist strategy audit");
        }
    }
}

/// Wraps the selected option into a single-action plan with its expected
/// outcome.
fn plan_from(
    candidate: &ScoredOption,
    snapshot: &WorldSnapshot,
    difficulty: Difficulty,
    archetype: Archetype,
) -> TurnPlan {
    let action = candidate.option.action.clone();
    let expected = expected_outcome(&action, snapshot);
    TurnPlan {
        actions: vec![action],
        expected,
        total_score: candidate.score,
        difficulty,
        archetype,
    }
}

fn expected_outcome(action: &TurnAction, snapshot: &WorldSnapshot) -> ExpectedOutcome {
    match action {
        TurnAction::DeliverLoad { payment, .. } => ExpectedOutcome {
            cash_delta: *payment as i64,
            loads_delivered: 1,
            ..ExpectedOutcome::default()
        },
        TurnAction::BuildTrack { segments, cost, .. } => ExpectedOutcome {
            cash_delta: -(*cost as i64),
            segments_built: segments.len() as u32,
            ..ExpectedOutcome::default()
        },
        TurnAction::BuildTowardMajorCity { city, segments, cost } => {
            let completes = snapshot
                .map
                .city_position(city)
                .map(|target| segments.iter().any(|s| s.a == target || s.b == target))
                .unwrap_or(false);
            ExpectedOutcome {
                cash_delta: -(*cost as i64),
                segments_built: segments.len() as u32,
                new_major_cities: completes as u32,
                ..ExpectedOutcome::default()
            }
        }
        TurnAction::UpgradeTrain { cost, .. } => ExpectedOutcome {
            cash_delta: -(*cost as i64),
            ..ExpectedOutcome::default()
        },
        _ => ExpectedOutcome::default(),
    }
}

fn decode_difficulty(row: &PlayerRow) -> Difficulty {
    row.difficulty
        .as_deref()
        .and_then(|raw| Difficulty::from_str(raw).ok())
        .unwrap_or_default()
}

fn decode_archetype(row: &PlayerRow) -> Archetype {
    row.archetype
        .as_deref()
        .and_then(|raw| Archetype::from_str(raw).ok())
        .unwrap_or_default()
}
