//! Deterministic domain logic for the rail-network building and delivery game.
//!
//! This crate is pure and side-effect free: map topology, train classes,
//! demand cards, track networks, pathfinding, scoring profile tables, and the
//! plan validator all operate on in-memory values. Storage, notifications,
//! and the async turn pipeline live in the `rail-runtime` crate.
pub mod cards;
pub mod demo;
pub mod map;
pub mod pathfinder;
pub mod plan;
pub mod profiles;
pub mod reject;
pub mod snapshot;
pub mod track;
pub mod train;
pub mod validate;

pub use cards::{Demand, DemandCard};
pub use map::{City, CitySize, GridMap, Milepost, PointId, Terrain, TrackSegment};
pub use pathfinder::{PathResult, TrackPathfinder, segments_from_path};
pub use plan::{
    ActionKind, CROSSGRADE_TRACK_CAP, ExpectedOutcome, TURN_BUILD_BUDGET, TurnAction, TurnPlan,
};
pub use profiles::{Archetype, ArchetypeProfile, Difficulty, ScoreDimension, SkillProfile};
pub use reject::RejectReason;
pub use snapshot::{CompetitorSummary, WorldSnapshot};
pub use track::TrackNetwork;
pub use train::{TrainClass, TransitionKind};
pub use validate::{ValidationResult, validate};
