//! Scorer: turns feasible options into a ranked list.
//!
//! Scores are `raw value x skill weight x archetype multiplier` summed over
//! twelve dimensions. The random source is injected so hard difficulty (both
//! noise probabilities at zero) is fully deterministic for identical inputs.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use rail_core::train::UPGRADE_COST;
use rail_core::{
    ArchetypeProfile, ScoreDimension, SkillProfile, TrainClass, TurnAction, WorldSnapshot,
};

use crate::options::FeasibleOption;

/// One dimension's contribution to an option's final score.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionScore {
    pub dimension: ScoreDimension,
    pub raw: f64,
    pub weight: f64,
    pub multiplier: f64,
    pub contribution: f64,
}

/// A feasible option with its final score and per-dimension breakdown.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredOption {
    pub option: FeasibleOption,
    pub score: f64,
    pub breakdown: Vec<DimensionScore>,
}

pub struct Scorer;

impl Scorer {
    /// Ranks the feasible subset of `options` descending by score.
    ///
    /// PassTurn is pinned to exactly 0 and always sorts last, so a do-nothing
    /// action never outranks a real one. Noise (full shuffle, top-swap) is
    /// applied after scoring, per the skill profile's probabilities.
    pub fn score<R: Rng>(
        options: &[FeasibleOption],
        snapshot: &WorldSnapshot,
        skill: &SkillProfile,
        archetype: &ArchetypeProfile,
        rng: &mut R,
    ) -> Vec<ScoredOption> {
        let mut scored: Vec<ScoredOption> = options
            .iter()
            .filter(|option| option.feasible)
            .map(|option| Self::score_one(option, snapshot, skill, archetype))
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        if skill.random_choice_probability > 0.0
            && rng.gen_bool(skill.random_choice_probability)
        {
            tracing::debug!(bot = %snapshot.bot_id, "noise: shuffling ranked options");
            scored.shuffle(rng);
        }
        if skill.missed_option_probability > 0.0
            && scored.len() >= 2
            && rng.gen_bool(skill.missed_option_probability)
        {
            tracing::debug!(bot = %snapshot.bot_id, "noise: missing the top option");
            scored.swap(0, 1);
        }

        // The PassTurn floor survives any noise.
        if let Some(index) = scored
            .iter()
            .position(|s| matches!(s.option.action, TurnAction::PassTurn))
        {
            let pass = scored.remove(index);
            scored.push(pass);
        }
        scored
    }

    /// First element of the ranked list, if any.
    pub fn select_best(scored: &[ScoredOption]) -> Option<&ScoredOption> {
        scored.first()
    }

    fn score_one(
        option: &FeasibleOption,
        snapshot: &WorldSnapshot,
        skill: &SkillProfile,
        archetype: &ArchetypeProfile,
    ) -> ScoredOption {
        if matches!(option.action, TurnAction::PassTurn) {
            return ScoredOption {
                option: option.clone(),
                score: 0.0,
                breakdown: Vec::new(),
            };
        }

        let mut breakdown = Vec::with_capacity(ScoreDimension::COUNT);
        let mut total = 0.0;
        for dimension in ScoreDimension::ALL {
            let raw = Self::raw_value(dimension, &option.action, snapshot);
            let weight = skill.weight(dimension);
            let multiplier = archetype.multiplier(dimension);
            let contribution = raw * weight * multiplier;
            total += contribution;
            if raw != 0.0 {
                breakdown.push(DimensionScore {
                    dimension,
                    raw,
                    weight,
                    multiplier,
                    contribution,
                });
            }
        }

        ScoredOption {
            option: option.clone(),
            score: total,
            breakdown,
        }
    }

    fn raw_value(
        dimension: ScoreDimension,
        action: &TurnAction,
        snapshot: &WorldSnapshot,
    ) -> f64 {
        match dimension {
            ScoreDimension::ImmediateIncome => match action {
                TurnAction::DeliverLoad { payment, .. } => *payment as f64,
                _ => 0.0,
            },
            ScoreDimension::IncomePerMilepost => match action {
                TurnAction::DeliverLoad { payment, .. } => {
                    *payment as f64 / snapshot.track.segment_count().max(1) as f64
                }
                TurnAction::BuildTrack { cost, target_city: Some(city), .. } => {
                    pending_payment(snapshot, city) / (*cost).max(1) as f64
                }
                _ => 0.0,
            },
            ScoreDimension::MultiDeliveryPotential => match action {
                TurnAction::DeliverLoad { card_id, .. } => {
                    // Other carried loads with an open demand elsewhere in
                    // hand still pay off after this one.
                    snapshot
                        .hand
                        .iter()
                        .filter(|card| card.id != *card_id)
                        .flat_map(|card| &card.demands)
                        .filter(|demand| snapshot.carries(&demand.resource))
                        .count() as f64
                }
                TurnAction::PickupAndDeliver { demand_city: Some(_), .. } => 1.0,
                _ => 0.0,
            },
            ScoreDimension::NetworkExpansion => match action {
                TurnAction::BuildTrack { segments, .. }
                | TurnAction::BuildTowardMajorCity { segments, .. } => segments.len() as f64,
                _ => 0.0,
            },
            ScoreDimension::VictoryProgress => match action {
                TurnAction::BuildTowardMajorCity { .. } => {
                    let unconnected = snapshot
                        .major_city_connections
                        .values()
                        .filter(|connected| !**connected)
                        .count();
                    // Each remaining major city matters more than the last.
                    10.0 / unconnected.max(1) as f64
                }
                TurnAction::DeliverLoad { payment, .. } => *payment as f64 * 0.1,
                _ => 0.0,
            },
            ScoreDimension::CompetitorBlocking => match action {
                TurnAction::BuildTrack { segments, .. }
                | TurnAction::BuildTowardMajorCity { segments, .. } => segments
                    .iter()
                    .filter(|segment| {
                        snapshot.rival_track.touches(segment.a)
                            || snapshot.rival_track.touches(segment.b)
                    })
                    .count() as f64,
                TurnAction::PickupAndDeliver { resource, .. } => {
                    let available =
                        snapshot.load_availability.get(resource).copied().unwrap_or(0);
                    // Taking the last unit of a load denies it to everyone.
                    if available == 1 { 2.0 } else { 0.0 }
                }
                _ => 0.0,
            },
            ScoreDimension::RiskExposure => match action {
                // Spending is exposure: a derailment or tax event hurts more
                // the less cash is left over.
                TurnAction::BuildTrack { cost, .. }
                | TurnAction::BuildTowardMajorCity { cost, .. }
                | TurnAction::UpgradeTrain { cost, .. } => {
                    -(*cost as f64 / snapshot.cash.max(1) as f64)
                }
                _ => 0.0,
            },
            ScoreDimension::LoadScarcity => match action {
                TurnAction::PickupAndDeliver { resource, .. } => {
                    let available =
                        snapshot.load_availability.get(resource).copied().unwrap_or(0);
                    match available {
                        0 => 0.0,
                        n => 3.0 / n as f64,
                    }
                }
                _ => 0.0,
            },
            ScoreDimension::UpgradeRoi => match action {
                TurnAction::UpgradeTrain { to, cost, .. } => {
                    upgrade_gain(snapshot.train_class, *to) * UPGRADE_COST as f64
                        / (*cost).max(1) as f64
                }
                _ => 0.0,
            },
            ScoreDimension::BackboneAlignment => match action {
                // Reusing existing endpoints keeps the network one connected
                // backbone instead of disjoint spurs.
                TurnAction::BuildTrack { segments, .. }
                | TurnAction::BuildTowardMajorCity { segments, .. } => segments
                    .iter()
                    .filter(|segment| {
                        snapshot.track.touches(segment.a) || snapshot.track.touches(segment.b)
                    })
                    .count() as f64,
                _ => 0.0,
            },
            ScoreDimension::LoadCombination => match action {
                TurnAction::PickupAndDeliver { .. } => snapshot.loads.len() as f64,
                _ => 0.0,
            },
            ScoreDimension::MajorCityProximity => match action {
                TurnAction::BuildTowardMajorCity { segments, .. } => {
                    // Shorter remaining distance scores higher.
                    5.0 / segments.len().max(1) as f64
                }
                _ => 0.0,
            },
        }
    }
}

/// Best open payment for a demand at `city`, for build valuation.
fn pending_payment(snapshot: &WorldSnapshot, city: &str) -> f64 {
    snapshot
        .hand
        .iter()
        .flat_map(|card| &card.demands)
        .filter(|demand| demand.city == city)
        .map(|demand| demand.payment)
        .max()
        .unwrap_or(0) as f64
}

fn upgrade_gain(from: TrainClass, to: TrainClass) -> f64 {
    let capacity = to.capacity() as f64 - from.capacity() as f64;
    let speed = (to.speed() as f64 - from.speed() as f64) / 3.0;
    capacity + speed
}
