//! Skill and archetype profile tables.
//!
//! Profiles are immutable, initialization-time lookup tables keyed by
//! enumerated identifiers. They are injected into the scorer as parameters,
//! never read as ambient state, so two bots in the same process can run with
//! different profiles concurrently.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Difficulty tier of a bot: drives scoring weights and behavioral noise.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Strategic personality of a bot: per-dimension multipliers layered on top
/// of the skill weights.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
    #[default]
    Balanced,
    /// Builds aggressively toward new territory and major cities.
    Expansionist,
    /// Chases delivery income and load combinations.
    Hauler,
    /// Plays the competitors: denies track and scarce loads.
    Blocker,
}

/// One scoring dimension. The first eight apply to every bot; the last four
/// only matter once an archetype multiplies them above zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum ScoreDimension {
    ImmediateIncome,
    IncomePerMilepost,
    MultiDeliveryPotential,
    NetworkExpansion,
    VictoryProgress,
    CompetitorBlocking,
    RiskExposure,
    LoadScarcity,
    // Archetype-only dimensions.
    UpgradeRoi,
    BackboneAlignment,
    LoadCombination,
    MajorCityProximity,
}

impl ScoreDimension {
    pub const COUNT: usize = 12;

    pub const ALL: [ScoreDimension; Self::COUNT] = [
        ScoreDimension::ImmediateIncome,
        ScoreDimension::IncomePerMilepost,
        ScoreDimension::MultiDeliveryPotential,
        ScoreDimension::NetworkExpansion,
        ScoreDimension::VictoryProgress,
        ScoreDimension::CompetitorBlocking,
        ScoreDimension::RiskExposure,
        ScoreDimension::LoadScarcity,
        ScoreDimension::UpgradeRoi,
        ScoreDimension::BackboneAlignment,
        ScoreDimension::LoadCombination,
        ScoreDimension::MajorCityProximity,
    ];

    const fn index(self) -> usize {
        match self {
            ScoreDimension::ImmediateIncome => 0,
            ScoreDimension::IncomePerMilepost => 1,
            ScoreDimension::MultiDeliveryPotential => 2,
            ScoreDimension::NetworkExpansion => 3,
            ScoreDimension::VictoryProgress => 4,
            ScoreDimension::CompetitorBlocking => 5,
            ScoreDimension::RiskExposure => 6,
            ScoreDimension::LoadScarcity => 7,
            ScoreDimension::UpgradeRoi => 8,
            ScoreDimension::BackboneAlignment => 9,
            ScoreDimension::LoadCombination => 10,
            ScoreDimension::MajorCityProximity => 11,
        }
    }
}

/// Scoring weights plus behavioral noise for one difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillProfile {
    pub difficulty: Difficulty,
    /// Probability that the entire ranked list is shuffled.
    pub random_choice_probability: f64,
    /// Probability that the top-ranked option is "missed" and swapped with
    /// the runner-up.
    pub missed_option_probability: f64,
    weights: [f64; ScoreDimension::COUNT],
}

impl SkillProfile {
    pub const fn for_difficulty(difficulty: Difficulty) -> &'static SkillProfile {
        match difficulty {
            Difficulty::Easy => &EASY,
            Difficulty::Medium => &MEDIUM,
            Difficulty::Hard => &HARD,
        }
    }

    pub const fn weight(&self, dimension: ScoreDimension) -> f64 {
        self.weights[dimension.index()]
    }
}

/// Per-dimension multipliers for one archetype.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArchetypeProfile {
    pub archetype: Archetype,
    multipliers: [f64; ScoreDimension::COUNT],
}

impl ArchetypeProfile {
    pub const fn for_archetype(archetype: Archetype) -> &'static ArchetypeProfile {
        match archetype {
            Archetype::Balanced => &BALANCED,
            Archetype::Expansionist => &EXPANSIONIST,
            Archetype::Hauler => &HAULER,
            Archetype::Blocker => &BLOCKER,
        }
    }

    pub const fn multiplier(&self, dimension: ScoreDimension) -> f64 {
        self.multipliers[dimension.index()]
    }
}

// Weight order matches ScoreDimension::ALL:
// income, income/milepost, multi-delivery, expansion, victory, blocking,
// risk, scarcity, upgrade-roi, backbone, combination, major-proximity.

static EASY: SkillProfile = SkillProfile {
    difficulty: Difficulty::Easy,
    random_choice_probability: 0.25,
    missed_option_probability: 0.30,
    weights: [1.0, 0.2, 0.1, 0.4, 0.3, 0.0, 0.1, 0.1, 0.2, 0.2, 0.2, 0.2],
};

static MEDIUM: SkillProfile = SkillProfile {
    difficulty: Difficulty::Medium,
    random_choice_probability: 0.10,
    missed_option_probability: 0.15,
    weights: [1.0, 0.5, 0.4, 0.6, 0.5, 0.3, 0.3, 0.3, 0.4, 0.4, 0.4, 0.4],
};

static HARD: SkillProfile = SkillProfile {
    difficulty: Difficulty::Hard,
    random_choice_probability: 0.0,
    missed_option_probability: 0.0,
    weights: [1.0, 0.8, 0.7, 0.8, 0.9, 0.6, 0.5, 0.5, 0.6, 0.6, 0.6, 0.6],
};

static BALANCED: ArchetypeProfile = ArchetypeProfile {
    archetype: Archetype::Balanced,
    multipliers: [1.0; ScoreDimension::COUNT],
};

static EXPANSIONIST: ArchetypeProfile = ArchetypeProfile {
    archetype: Archetype::Expansionist,
    multipliers: [0.8, 0.9, 0.8, 1.6, 1.3, 0.8, 1.0, 0.8, 0.9, 1.5, 0.8, 1.5],
};

static HAULER: ArchetypeProfile = ArchetypeProfile {
    archetype: Archetype::Hauler,
    multipliers: [1.5, 1.3, 1.4, 0.8, 1.0, 0.7, 1.0, 1.1, 1.4, 0.8, 1.5, 0.8],
};

static BLOCKER: ArchetypeProfile = ArchetypeProfile {
    archetype: Archetype::Blocker,
    multipliers: [0.9, 0.9, 0.9, 1.0, 1.0, 1.8, 1.1, 1.5, 0.9, 1.0, 0.9, 1.0],
};
