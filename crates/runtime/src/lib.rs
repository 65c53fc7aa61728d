//! Async turn pipeline for bot players.
//!
//! This crate wires the pure domain logic from `rail-core` into one bot's
//! turn-decision cycle: snapshot capture, option generation, scoring, plan
//! validation, transactional execution, and audit persistence. Consumers call
//! [`StrategyEngine::execute_turn`] once per bot per game turn.
//!
//! Modules are organized by responsibility:
//! - [`engine`] hosts the orchestrating state machine
//! - [`snapshot`], [`options`], [`scoring`], [`executor`] are the pipeline stages
//! - [`store`], [`track`], [`deck`] define the storage collaborators
//! - [`events`] provides the fire-and-forget notification bus
//! - [`audit`] and [`api`] expose the per-turn audit record
pub mod api;
pub mod audit;
pub mod deck;
pub mod engine;
pub mod error;
pub mod events;
pub mod executor;
pub mod options;
pub mod scoring;
pub mod snapshot;
pub mod store;
pub mod track;

pub use api::AuditApi;
pub use audit::{ExecutionOutcome, StageTimings, StrategyAudit};
pub use deck::{DeckService, DemandDeck};
pub use engine::{MAX_ATTEMPTS, PlanValidator, SimValidator, StrategyEngine};
pub use error::{EngineError, Result};
pub use events::{BotEvent, Notification, NotificationBus};
pub use executor::{ActionResult, PlanExecutor, TurnExecutionResult, TurnExecutor};
pub use options::{FeasibleOption, OptionGenerator};
pub use scoring::{DimensionScore, ScoredOption, Scorer};
pub use snapshot::SnapshotBuilder;
pub use store::{
    AuditRow, AuditStore, GameStore, InMemoryStore, PlayerRow, StoreError, StoreTransaction,
};
pub use track::{TrackService, TrackState};
