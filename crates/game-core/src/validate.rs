//! Plan validator: replays a candidate plan against a local simulation.
//!
//! Validation is read-only with respect to everything outside this module.
//! The simulation is seeded from the snapshot and mutated action by action,
//! so later actions see the effects of earlier ones (a delivery's payment can
//! fund a build later in the same plan).

use std::collections::{HashMap, HashSet};

use crate::plan::{CROSSGRADE_TRACK_CAP, TURN_BUILD_BUDGET, TurnAction, TurnPlan};
use crate::reject::RejectReason;
use crate::snapshot::WorldSnapshot;
use crate::train::{TrainClass, TransitionKind};

/// Outcome of validating one plan. `reason` is 1-indexed by action position
/// and names the offending action kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub ok: bool,
    pub reason: Option<String>,
}

impl ValidationResult {
    fn accept() -> Self {
        Self { ok: true, reason: None }
    }

    fn reject(index: usize, action: &TurnAction, reason: RejectReason) -> Self {
        Self {
            ok: false,
            reason: Some(format!("Action {} ({}): {}", index + 1, action.kind(), reason)),
        }
    }
}

struct Simulation {
    cash: u64,
    loads: Vec<String>,
    used_cards: HashSet<u32>,
    train_class: TrainClass,
    availability: HashMap<String, u32>,
    track_spend: u64,
    built: bool,
    upgraded: bool,
}

impl Simulation {
    fn seed(snapshot: &WorldSnapshot) -> Self {
        Self {
            cash: snapshot.cash,
            loads: snapshot.loads.clone(),
            used_cards: HashSet::new(),
            train_class: snapshot.train_class,
            availability: snapshot.load_availability.clone(),
            track_spend: 0,
            built: false,
            upgraded: false,
        }
    }
}

/// Replays `plan` in order against a simulation seeded from `snapshot`.
pub fn validate(plan: &TurnPlan, snapshot: &WorldSnapshot) -> ValidationResult {
    let mut sim = Simulation::seed(snapshot);

    for (index, action) in plan.actions.iter().enumerate() {
        let reason = apply(&mut sim, snapshot, action);
        if let Err(reason) = reason {
            return ValidationResult::reject(index, action, reason);
        }
    }
    ValidationResult::accept()
}

fn apply(
    sim: &mut Simulation,
    snapshot: &WorldSnapshot,
    action: &TurnAction,
) -> Result<(), RejectReason> {
    match action {
        TurnAction::DeliverLoad { resource, card_id, payment, .. } => {
            let carried = sim.loads.iter().position(|l| l == resource);
            let Some(slot) = carried else {
                return Err(RejectReason::LoadNotCarried { resource: resource.clone() });
            };
            if !snapshot.hand.iter().any(|card| card.id == *card_id) {
                return Err(RejectReason::CardNotFound { card_id: *card_id });
            }
            if !sim.used_cards.insert(*card_id) {
                return Err(RejectReason::CardAlreadyUsed { card_id: *card_id });
            }
            sim.loads.remove(slot);
            sim.cash += payment;
            Ok(())
        }

        TurnAction::PickupAndDeliver { resource, .. } => {
            let capacity = sim.train_class.capacity();
            if sim.loads.len() >= capacity {
                return Err(RejectReason::AtCapacity { capacity });
            }
            let available = sim.availability.get(resource).copied().unwrap_or(0);
            if available == 0 {
                return Err(RejectReason::NoneAvailable { resource: resource.clone() });
            }
            *sim.availability.entry(resource.clone()).or_insert(0) -= 1;
            sim.loads.push(resource.clone());
            Ok(())
        }

        TurnAction::BuildTrack { cost, .. } | TurnAction::BuildTowardMajorCity { cost, .. } => {
            if sim.upgraded {
                return Err(RejectReason::BuildAfterUpgrade);
            }
            if sim.track_spend + cost > TURN_BUILD_BUDGET {
                return Err(RejectReason::BudgetExhausted {
                    spent: sim.track_spend + cost,
                    budget: TURN_BUILD_BUDGET,
                });
            }
            if sim.cash == 0 || sim.cash < *cost {
                return Err(RejectReason::InsufficientFunds { needed: *cost, cash: sim.cash });
            }
            sim.track_spend += cost;
            sim.cash -= cost;
            sim.built = true;
            Ok(())
        }

        TurnAction::UpgradeTrain { to, transition: TransitionKind::Upgrade, cost } => {
            if sim.built {
                return Err(RejectReason::UpgradeAfterBuild);
            }
            if sim.upgraded {
                return Err(RejectReason::AlreadyUpgraded);
            }
            if sim.cash < *cost {
                return Err(RejectReason::InsufficientFunds { needed: *cost, cash: sim.cash });
            }
            if sim.train_class.transition_kind(*to) != Some(TransitionKind::Upgrade) {
                return Err(RejectReason::InvalidTransition { from: sim.train_class, to: *to });
            }
            if sim.loads.len() > to.capacity() {
                return Err(RejectReason::OverCapacity {
                    loads: sim.loads.len(),
                    capacity: to.capacity(),
                });
            }
            sim.cash -= cost;
            sim.train_class = *to;
            sim.upgraded = true;
            Ok(())
        }

        TurnAction::UpgradeTrain { to, transition: TransitionKind::Crossgrade, cost } => {
            if sim.track_spend > CROSSGRADE_TRACK_CAP {
                return Err(RejectReason::CrossgradeOverspend {
                    spent: sim.track_spend,
                    cap: CROSSGRADE_TRACK_CAP,
                });
            }
            if sim.cash < *cost {
                return Err(RejectReason::InsufficientFunds { needed: *cost, cash: sim.cash });
            }
            if sim.train_class.transition_kind(*to) != Some(TransitionKind::Crossgrade) {
                return Err(RejectReason::InvalidTransition { from: sim.train_class, to: *to });
            }
            if sim.loads.len() > to.capacity() {
                return Err(RejectReason::OverCapacity {
                    loads: sim.loads.len(),
                    capacity: to.capacity(),
                });
            }
            sim.cash -= cost;
            sim.train_class = *to;
            Ok(())
        }

        TurnAction::PassTurn => Ok(()),

        TurnAction::Unknown { raw_kind } => {
            Err(RejectReason::UnknownAction { kind: raw_kind.clone() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Demand, DemandCard};
    use crate::demo::demo_map;
    use crate::map::{PointId, TrackSegment};
    use crate::plan::ExpectedOutcome;
    use crate::profiles::{Archetype, Difficulty};
    use crate::track::TrackNetwork;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn snapshot() -> WorldSnapshot {
        let map = Arc::new(demo_map());
        WorldSnapshot {
            game_id: "g1".into(),
            bot_id: "bot".into(),
            turn_number: 4,
            position: Some(PointId::new(3, 3)),
            cash: 50,
            hand: vec![
                DemandCard::new(
                    1,
                    vec![Demand { city: "Metro".into(), resource: "wine".into(), payment: 30 }],
                ),
                DemandCard::new(
                    2,
                    vec![Demand { city: "Junction".into(), resource: "coal".into(), payment: 22 }],
                ),
            ],
            loads: vec!["wine".into()],
            train_class: crate::train::TrainClass::Freight,
            track: TrackNetwork::new(),
            rival_track: TrackNetwork::new(),
            competitors: vec![],
            load_availability: HashMap::from([("coal".into(), 2), ("oil".into(), 1)]),
            major_city_connections: HashMap::new(),
            map,
            hash: "test".into(),
        }
    }

    fn plan(actions: Vec<TurnAction>) -> TurnPlan {
        TurnPlan {
            actions,
            expected: ExpectedOutcome::default(),
            total_score: 1.0,
            difficulty: Difficulty::Hard,
            archetype: Archetype::Balanced,
        }
    }

    fn deliver(resource: &str, card_id: u32, payment: u64) -> TurnAction {
        TurnAction::DeliverLoad {
            resource: resource.into(),
            card_id,
            city: "Metro".into(),
            payment,
        }
    }

    fn build(cost: u64) -> TurnAction {
        TurnAction::BuildTrack {
            segments: vec![TrackSegment::new(PointId::new(0, 0), PointId::new(0, 1))],
            cost,
            target_city: None,
        }
    }

    #[test]
    fn delivery_income_funds_later_build() {
        let mut snap = snapshot();
        snap.cash = 5;
        let result = validate(&plan(vec![deliver("wine", 1, 30), build(15)]), &snap);
        assert!(result.ok, "{:?}", result.reason);
    }

    #[test]
    fn reusing_a_card_is_rejected() {
        let mut snap = snapshot();
        snap.loads = vec!["wine".into(), "wine".into()];
        let result = validate(&plan(vec![deliver("wine", 1, 30), deliver("wine", 1, 30)]), &snap);
        assert!(!result.ok);
        let reason = result.reason.unwrap();
        assert!(reason.contains("already used"), "{reason}");
        assert!(reason.starts_with("Action 2"), "{reason}");
    }

    #[test]
    fn delivering_an_uncarried_load_is_rejected() {
        let result = validate(&plan(vec![deliver("coal", 2, 22)]), &snapshot());
        assert!(!result.ok);
        assert!(result.reason.unwrap().contains("not on the train"));
    }

    #[test]
    fn unknown_card_is_rejected() {
        let result = validate(&plan(vec![deliver("wine", 99, 30)]), &snapshot());
        assert!(!result.ok);
        assert!(result.reason.unwrap().contains("not found"));
    }

    #[test]
    fn pickup_at_capacity_is_rejected() {
        let mut snap = snapshot();
        snap.loads = vec!["wine".into(), "coal".into()]; // Freight capacity is 2
        let action = TurnAction::PickupAndDeliver {
            resource: "oil".into(),
            source_city: "Oilport".into(),
            demand_city: None,
        };
        let result = validate(&plan(vec![action]), &snap);
        assert!(!result.ok);
        assert!(result.reason.unwrap().contains("at capacity"));
    }

    #[test]
    fn pickup_of_unavailable_resource_is_rejected() {
        let mut snap = snapshot();
        snap.load_availability.insert("oil".into(), 0);
        let action = TurnAction::PickupAndDeliver {
            resource: "oil".into(),
            source_city: "Oilport".into(),
            demand_city: None,
        };
        let result = validate(&plan(vec![action]), &snap);
        assert!(!result.ok);
        assert!(result.reason.unwrap().contains("none available"));
    }

    #[test]
    fn build_budget_is_shared_across_build_actions() {
        let result = validate(&plan(vec![build(12), build(10)]), &snapshot());
        assert!(!result.ok);
        let reason = result.reason.unwrap();
        assert!(reason.contains("budget exhausted"), "{reason}");
        assert!(reason.starts_with("Action 2"), "{reason}");
    }

    #[test]
    fn build_with_no_cash_is_rejected() {
        let mut snap = snapshot();
        snap.cash = 0;
        let result = validate(&plan(vec![build(5)]), &snap);
        assert!(!result.ok);
        assert!(result.reason.unwrap().contains("Insufficient funds"));
    }

    #[test]
    fn build_after_upgrade_is_rejected() {
        let upgrade = TurnAction::UpgradeTrain {
            to: crate::train::TrainClass::FastFreight,
            transition: TransitionKind::Upgrade,
            cost: 20,
        };
        let result = validate(&plan(vec![upgrade, build(5)]), &snapshot());
        assert!(!result.ok);
        assert!(result.reason.unwrap().contains("after upgrading"));
    }

    #[test]
    fn upgrade_after_build_is_rejected() {
        let upgrade = TurnAction::UpgradeTrain {
            to: crate::train::TrainClass::FastFreight,
            transition: TransitionKind::Upgrade,
            cost: 20,
        };
        let result = validate(&plan(vec![build(5), upgrade]), &snapshot());
        assert!(!result.ok);
        assert!(result.reason.unwrap().contains("after building"));
    }

    #[test]
    fn double_upgrade_is_rejected() {
        let first = TurnAction::UpgradeTrain {
            to: crate::train::TrainClass::FastFreight,
            transition: TransitionKind::Upgrade,
            cost: 20,
        };
        let second = TurnAction::UpgradeTrain {
            to: crate::train::TrainClass::SuperFreight,
            transition: TransitionKind::Upgrade,
            cost: 20,
        };
        let result = validate(&plan(vec![first, second]), &snapshot());
        assert!(!result.ok);
        assert!(result.reason.unwrap().contains("Already upgraded"));
    }

    #[test]
    fn crossgrade_after_heavy_track_spend_is_rejected() {
        let mut snap = snapshot();
        snap.train_class = crate::train::TrainClass::FastFreight;
        snap.cash = 60;
        let crossgrade = TurnAction::UpgradeTrain {
            to: crate::train::TrainClass::HeavyFreight,
            transition: TransitionKind::Crossgrade,
            cost: 5,
        };
        let result = validate(&plan(vec![build(16), crossgrade]), &snap);
        assert!(!result.ok);
        let reason = result.reason.unwrap();
        assert!(reason.contains("16M"), "{reason}");
        assert!(reason.contains("exceeds"), "{reason}");
    }

    #[test]
    fn crossgrade_coexists_with_moderate_builds() {
        let mut snap = snapshot();
        snap.train_class = crate::train::TrainClass::FastFreight;
        snap.cash = 60;
        let crossgrade = TurnAction::UpgradeTrain {
            to: crate::train::TrainClass::HeavyFreight,
            transition: TransitionKind::Crossgrade,
            cost: 5,
        };
        let result = validate(&plan(vec![build(10), crossgrade]), &snap);
        assert!(result.ok, "{:?}", result.reason);
    }

    #[test]
    fn capacity_reducing_crossgrade_with_full_train_is_rejected() {
        let mut snap = snapshot();
        snap.train_class = crate::train::TrainClass::HeavyFreight;
        snap.loads = vec!["wine".into(), "coal".into(), "oil".into()];
        let crossgrade = TurnAction::UpgradeTrain {
            to: crate::train::TrainClass::FastFreight,
            transition: TransitionKind::Crossgrade,
            cost: 5,
        };
        let result = validate(&plan(vec![crossgrade]), &snap);
        assert!(!result.ok);
        assert!(result.reason.unwrap().contains("exceeds new capacity"));
    }

    #[test]
    fn unknown_action_kind_is_rejected() {
        let action = TurnAction::Unknown { raw_kind: "teleport".into() };
        let result = validate(&plan(vec![action]), &snapshot());
        assert!(!result.ok);
        assert!(result.reason.unwrap().contains("Unknown action type"));
    }

    #[test]
    fn pass_turn_is_always_accepted() {
        let mut snap = snapshot();
        snap.cash = 0;
        snap.loads = vec![];
        let result = validate(&plan(vec![TurnAction::PassTurn]), &snap);
        assert!(result.ok);
    }
}
