//! Turn plans: ordered action lists produced by the strategy pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::map::TrackSegment;
use crate::profiles::{Archetype, Difficulty};
use crate::train::{TrainClass, TransitionKind};

/// Shared per-turn track build budget in millions, across all build actions
/// in one plan.
pub const TURN_BUILD_BUDGET: u64 = 20;

/// Maximum track spend in millions that still permits a crossgrade in the
/// same plan.
pub const CROSSGRADE_TRACK_CAP: u64 = 15;

/// Stable action kind labels used in audits and rejection messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    DeliverLoad,
    PickupAndDeliver,
    BuildTrack,
    BuildTowardMajorCity,
    Upgrade,
    Crossgrade,
    PassTurn,
    Unknown,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActionKind::DeliverLoad => "deliver-load",
            ActionKind::PickupAndDeliver => "pickup-and-deliver",
            ActionKind::BuildTrack => "build-track",
            ActionKind::BuildTowardMajorCity => "build-toward-major-city",
            ActionKind::Upgrade => "upgrade",
            ActionKind::Crossgrade => "crossgrade",
            ActionKind::PassTurn => "pass-turn",
            ActionKind::Unknown => "unknown",
        };
        write!(f, "{}", label)
    }
}

/// One action inside a turn plan.
///
/// `Unknown` preserves unrecognized kinds round-tripped through persistence;
/// the validator and executor reject it explicitly rather than panicking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TurnAction {
    DeliverLoad {
        resource: String,
        card_id: u32,
        city: String,
        payment: u64,
    },
    PickupAndDeliver {
        resource: String,
        source_city: String,
        /// City a hand demand wants this resource delivered to, if any.
        demand_city: Option<String>,
    },
    BuildTrack {
        segments: Vec<TrackSegment>,
        cost: u64,
        target_city: Option<String>,
    },
    BuildTowardMajorCity {
        city: String,
        segments: Vec<TrackSegment>,
        cost: u64,
    },
    UpgradeTrain {
        to: TrainClass,
        transition: TransitionKind,
        cost: u64,
    },
    PassTurn,
    Unknown {
        raw_kind: String,
    },
}

impl TurnAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            TurnAction::DeliverLoad { .. } => ActionKind::DeliverLoad,
            TurnAction::PickupAndDeliver { .. } => ActionKind::PickupAndDeliver,
            TurnAction::BuildTrack { .. } => ActionKind::BuildTrack,
            TurnAction::BuildTowardMajorCity { .. } => ActionKind::BuildTowardMajorCity,
            TurnAction::UpgradeTrain { transition, .. } => match transition {
                TransitionKind::Upgrade => ActionKind::Upgrade,
                TransitionKind::Crossgrade => ActionKind::Crossgrade,
            },
            TurnAction::PassTurn => ActionKind::PassTurn,
            TurnAction::Unknown { .. } => ActionKind::Unknown,
        }
    }
}

/// Summary of what a plan is expected to accomplish, for audit inspection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedOutcome {
    pub cash_delta: i64,
    pub loads_delivered: u32,
    pub segments_built: u32,
    pub new_major_cities: u32,
}

/// An ordered multi-action plan for one bot turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnPlan {
    pub actions: Vec<TurnAction>,
    pub expected: ExpectedOutcome,
    pub total_score: f64,
    pub difficulty: Difficulty,
    pub archetype: Archetype,
}

impl TurnPlan {
    /// A guaranteed-safe plan that only passes the turn.
    pub fn pass(difficulty: Difficulty, archetype: Archetype) -> Self {
        Self {
            actions: vec![TurnAction::PassTurn],
            expected: ExpectedOutcome::default(),
            total_score: 0.0,
            difficulty,
            archetype,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
