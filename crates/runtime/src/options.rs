//! Option generator: enumerates every candidate action for one turn.
//!
//! Pure over the snapshot. Every emitted option has a stable non-empty id, a
//! score of 0 (the scorer fills it in later), and a rejection reason exactly
//! when infeasible. Infeasible options are still emitted so the audit shows
//! what the bot considered and why it could not do it.

use std::collections::HashSet;

use serde::Serialize;

use rail_core::pathfinder::segments_from_path;
use rail_core::train::{CROSSGRADE_COST, UPGRADE_COST};
use rail_core::{
    RejectReason, TURN_BUILD_BUDGET, TrackPathfinder, TransitionKind, TurnAction, WorldSnapshot,
};

/// A candidate action with its feasibility verdict.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeasibleOption {
    pub id: String,
    pub action: TurnAction,
    /// Always 0 at generation time; the scorer owns the final score.
    pub base_score: f64,
    pub feasible: bool,
    /// Populated if and only if the option is infeasible.
    pub rejection: Option<RejectReason>,
}

impl FeasibleOption {
    fn feasible(id: String, action: TurnAction) -> Self {
        Self { id, action, base_score: 0.0, feasible: true, rejection: None }
    }

    fn infeasible(id: String, action: TurnAction, reason: RejectReason) -> Self {
        Self { id, action, base_score: 0.0, feasible: false, rejection: Some(reason) }
    }
}

pub struct OptionGenerator;

impl OptionGenerator {
    /// Enumerates all candidate actions for the snapshot's bot.
    pub fn generate(snapshot: &WorldSnapshot) -> Vec<FeasibleOption> {
        let mut options = Vec::new();

        // Exactly one PassTurn, always feasible.
        options.push(FeasibleOption::feasible("pass-turn".into(), TurnAction::PassTurn));

        Self::deliveries(snapshot, &mut options);
        Self::pickups(snapshot, &mut options);

        let pathfinder = TrackPathfinder::new(snapshot.map.clone());
        Self::demand_builds(snapshot, &pathfinder, &mut options);
        Self::bootstrap_build(snapshot, &pathfinder, &mut options);
        Self::train_transitions(snapshot, &mut options);
        Self::major_city_builds(snapshot, &pathfinder, &mut options);

        tracing::debug!(
            bot = %snapshot.bot_id,
            total = options.len(),
            feasible = options.iter().filter(|o| o.feasible).count(),
            "generated options"
        );
        options
    }

    /// One independent option per eligible demand, never one option spanning
    /// multiple demands on a card.
    fn deliveries(snapshot: &WorldSnapshot, options: &mut Vec<FeasibleOption>) {
        for card in &snapshot.hand {
            for demand in &card.demands {
                if !snapshot.carries(&demand.resource) {
                    continue;
                }
                let id = format!("deliver-{}-{}-{}", card.id, demand.city, demand.resource);
                let action = TurnAction::DeliverLoad {
                    resource: demand.resource.clone(),
                    card_id: card.id,
                    city: demand.city.clone(),
                    payment: demand.payment,
                };
                if snapshot.city_reachable(&demand.city) {
                    options.push(FeasibleOption::feasible(id, action));
                } else {
                    options.push(FeasibleOption::infeasible(
                        id,
                        action,
                        RejectReason::NotConnected { city: demand.city.clone() },
                    ));
                }
            }
        }
    }

    fn pickups(snapshot: &WorldSnapshot, options: &mut Vec<FeasibleOption>) {
        let mut resources: Vec<&String> = snapshot.load_availability.keys().collect();
        resources.sort();

        for resource in resources {
            if snapshot.carries(resource) {
                continue;
            }
            let source_names: Vec<String> = snapshot
                .map
                .load_sources(resource)
                .iter()
                .map(|post| post.city.as_ref().map(|c| c.name.clone()).unwrap_or_default())
                .collect();
            let Some(first_source) = source_names.first() else {
                continue;
            };

            let reachable = source_names
                .iter()
                .find(|name| snapshot.city_reachable(name.as_str()));
            let source_city = reachable.unwrap_or(first_source).clone();
            let demand_city = snapshot
                .hand
                .iter()
                .find_map(|card| card.demand_for(resource))
                .map(|demand| demand.city.clone());

            let id = format!("pickup-{resource}");
            let action = TurnAction::PickupAndDeliver {
                resource: resource.clone(),
                source_city: source_city.clone(),
                demand_city,
            };

            let available = snapshot.load_availability.get(resource).copied().unwrap_or(0);
            let rejection = if available == 0 {
                Some(RejectReason::NoneAvailable { resource: resource.clone() })
            } else if reachable.is_none() {
                Some(RejectReason::NotConnected { city: source_city })
            } else if snapshot.loads.len() >= snapshot.train_capacity() {
                Some(RejectReason::AtCapacity { capacity: snapshot.train_capacity() })
            } else {
                None
            };

            options.push(match rejection {
                None => FeasibleOption::feasible(id, action),
                Some(reason) => FeasibleOption::infeasible(id, action, reason),
            });
        }
    }

    /// Build options toward demand cities not yet on the network.
    fn demand_builds(
        snapshot: &WorldSnapshot,
        pathfinder: &TrackPathfinder,
        options: &mut Vec<FeasibleOption>,
    ) {
        let starts = snapshot.route_starts();
        let budget = TURN_BUILD_BUDGET.min(snapshot.cash);
        let mut seen: HashSet<&str> = HashSet::new();

        for card in &snapshot.hand {
            for demand in &card.demands {
                if !seen.insert(demand.city.as_str()) || snapshot.city_reachable(&demand.city) {
                    continue;
                }
                let Some(target) = snapshot.map.city_position(&demand.city) else {
                    continue;
                };
                let id = format!("build-{}", demand.city);
                let route = pathfinder.route_within_budget(
                    &starts,
                    target,
                    &snapshot.track,
                    &snapshot.rival_track,
                    budget,
                );
                options.push(Self::build_option(snapshot, id, &demand.city, route, |segments, cost| {
                    TurnAction::BuildTrack {
                        segments,
                        cost,
                        target_city: Some(demand.city.clone()),
                    }
                }));
            }
        }
    }

    /// A bot with no track yet gets a dedicated option to hook itself up to
    /// the nearest major city.
    fn bootstrap_build(
        snapshot: &WorldSnapshot,
        pathfinder: &TrackPathfinder,
        options: &mut Vec<FeasibleOption>,
    ) {
        if !snapshot.track.is_empty() {
            return;
        }
        let Some(position) = snapshot.position else {
            return;
        };
        let Some(target) = pathfinder.nearest_major_city(position) else {
            return;
        };
        let city = snapshot
            .map
            .milepost(target)
            .and_then(|post| post.city.as_ref())
            .map(|c| c.name.clone())
            .unwrap_or_default();

        let budget = TURN_BUILD_BUDGET.min(snapshot.cash);
        let route = pathfinder.route_within_budget(
            &[position],
            target,
            &snapshot.track,
            &snapshot.rival_track,
            budget,
        );
        let id = "build-nearest-major-city".to_string();
        options.push(Self::build_option(snapshot, id, &city, route, |segments, cost| {
            TurnAction::BuildTrack { segments, cost, target_city: Some(city.clone()) }
        }));
    }

    /// Every legal class transition from the current train.
    fn train_transitions(snapshot: &WorldSnapshot, options: &mut Vec<FeasibleOption>) {
        let current = snapshot.train_class;
        let transitions = current
            .upgrades()
            .iter()
            .map(|to| (*to, TransitionKind::Upgrade, UPGRADE_COST))
            .chain(
                current
                    .crossgrades()
                    .iter()
                    .map(|to| (*to, TransitionKind::Crossgrade, CROSSGRADE_COST)),
            );

        for (to, transition, cost) in transitions {
            let label = match transition {
                TransitionKind::Upgrade => "upgrade",
                TransitionKind::Crossgrade => "crossgrade",
            };
            let id = format!("{label}-{to}");
            let action = TurnAction::UpgradeTrain { to, transition, cost };
            if snapshot.cash >= cost {
                options.push(FeasibleOption::feasible(id, action));
            } else {
                options.push(FeasibleOption::infeasible(
                    id,
                    action,
                    RejectReason::InsufficientFunds { needed: cost, cash: snapshot.cash },
                ));
            }
        }
    }

    /// One build option per currently-unconnected major city.
    fn major_city_builds(
        snapshot: &WorldSnapshot,
        pathfinder: &TrackPathfinder,
        options: &mut Vec<FeasibleOption>,
    ) {
        let starts = snapshot.route_starts();
        let budget = TURN_BUILD_BUDGET.min(snapshot.cash);

        let mut cities: Vec<&String> = snapshot
            .major_city_connections
            .iter()
            .filter(|(_, connected)| !**connected)
            .map(|(name, _)| name)
            .collect();
        cities.sort();

        for city in cities {
            let Some(target) = snapshot.map.city_position(city) else {
                continue;
            };
            let id = format!("connect-{city}");
            let route = pathfinder.route_within_budget(
                &starts,
                target,
                &snapshot.track,
                &snapshot.rival_track,
                budget,
            );
            options.push(Self::build_option(snapshot, id, city, route, |segments, cost| {
                TurnAction::BuildTowardMajorCity { city: city.clone(), segments, cost }
            }));
        }
    }

    fn build_option(
        snapshot: &WorldSnapshot,
        id: String,
        city: &str,
        route: Option<rail_core::PathResult>,
        make_action: impl Fn(Vec<rail_core::TrackSegment>, u64) -> TurnAction,
    ) -> FeasibleOption {
        // Build options are uniformly infeasible at zero cash.
        if snapshot.cash == 0 {
            let action = make_action(Vec::new(), 0);
            return FeasibleOption::infeasible(
                id,
                action,
                RejectReason::InsufficientFunds { needed: 1, cash: 0 },
            );
        }
        match route {
            Some(route) => {
                let segments = segments_from_path(&route.path, &snapshot.track);
                let action = make_action(segments, route.cost);
                FeasibleOption::feasible(id, action)
            }
            None => {
                let action = make_action(Vec::new(), 0);
                FeasibleOption::infeasible(
                    id,
                    action,
                    RejectReason::NotConnected { city: city.to_string() },
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rail_core::demo::{demo_demand_cards, demo_map};
    use rail_core::{ActionKind, PointId, TrackNetwork, TrackSegment, TrainClass};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn snapshot() -> WorldSnapshot {
        let map = Arc::new(demo_map());
        WorldSnapshot {
            game_id: "g1".into(),
            bot_id: "bot".into(),
            turn_number: 1,
            position: Some(PointId::new(3, 3)),
            cash: 50,
            hand: demo_demand_cards()[..2].to_vec(),
            loads: vec![],
            train_class: TrainClass::Freight,
            track: TrackNetwork::new(),
            rival_track: TrackNetwork::new(),
            competitors: vec![],
            load_availability: HashMap::from([
                ("wine".into(), 2),
                ("coal".into(), 1),
                ("oil".into(), 1),
            ]),
            major_city_connections: HashMap::from([
                ("Metro".into(), false),
                ("Harborview".into(), false),
                ("Junction".into(), false),
            ]),
            map,
            hash: "test".into(),
        }
    }

    fn find<'a>(options: &'a [FeasibleOption], id: &str) -> &'a FeasibleOption {
        options.iter().find(|o| o.id == id).unwrap_or_else(|| panic!("missing option {id}"))
    }

    #[test]
    fn exactly_one_feasible_pass_turn() {
        let options = OptionGenerator::generate(&snapshot());
        let passes: Vec<_> = options
            .iter()
            .filter(|o| o.action.kind() == ActionKind::PassTurn)
            .collect();
        assert_eq!(passes.len(), 1);
        assert!(passes[0].feasible);
    }

    #[test]
    fn every_option_has_id_and_zero_score() {
        let options = OptionGenerator::generate(&snapshot());
        for option in &options {
            assert!(!option.id.is_empty());
            assert_eq!(option.base_score, 0.0);
            assert_eq!(option.rejection.is_some(), !option.feasible, "{}", option.id);
        }
    }

    #[test]
    fn full_train_rejects_pickups_at_capacity() {
        let mut snap = snapshot();
        snap.loads = vec!["wine".into(), "coal".into()]; // Freight capacity 2
        // Put the oil source on the bot's network so capacity is the binding
        // constraint.
        let oilport = snap.map.city_position("Oilport").unwrap();
        snap.position = Some(oilport);
        snap.track = TrackNetwork::from_segments([TrackSegment::new(
            oilport,
            PointId::new(8, 7),
        )]);

        let options = OptionGenerator::generate(&snap);
        let pickup = find(&options, "pickup-oil");
        assert!(!pickup.feasible);
        let reason = pickup.rejection.as_ref().unwrap().to_string();
        assert!(reason.contains("at capacity"), "{reason}");
    }

    #[test]
    fn zero_availability_rejects_pickup() {
        let mut snap = snapshot();
        snap.load_availability.insert("oil".into(), 0);
        let options = OptionGenerator::generate(&snap);
        let pickup = find(&options, "pickup-oil");
        assert!(!pickup.feasible);
        assert!(
            pickup.rejection.as_ref().unwrap().to_string().contains("none available"),
        );
    }

    #[test]
    fn carried_wine_delivery_requires_connection() {
        let mut snap = snapshot();
        snap.loads = vec!["wine".into()];
        // Card 1 demands wine at Metro; the bot has no track, so Metro is
        // reachable only if it stands there.
        snap.position = Some(PointId::new(9, 9));
        let options = OptionGenerator::generate(&snap);
        let deliver = find(&options, "deliver-1-Metro-wine");
        assert!(!deliver.feasible);
        assert!(
            deliver.rejection.as_ref().unwrap().to_string().contains("not connected"),
        );
    }

    #[test]
    fn zero_cash_makes_builds_infeasible() {
        let mut snap = snapshot();
        snap.cash = 0;
        let options = OptionGenerator::generate(&snap);
        for option in options.iter().filter(|o| {
            matches!(
                o.action.kind(),
                ActionKind::BuildTrack | ActionKind::BuildTowardMajorCity
            )
        }) {
            assert!(!option.feasible, "{} should be infeasible at zero cash", option.id);
        }
    }

    #[test]
    fn trackless_bot_gets_bootstrap_build() {
        let mut snap = snapshot();
        snap.position = Some(PointId::new(5, 2)); // open terrain, off any city
        let options = OptionGenerator::generate(&snap);
        let bootstrap = find(&options, "build-nearest-major-city");
        assert!(bootstrap.feasible);
        assert!(matches!(
            bootstrap.action,
            TurnAction::BuildTrack { ref segments, .. } if !segments.is_empty()
        ));
    }

    #[test]
    fn freight_offers_two_upgrades_and_no_crossgrade() {
        let options = OptionGenerator::generate(&snapshot());
        assert!(options.iter().any(|o| o.id == "upgrade-fast-freight"));
        assert!(options.iter().any(|o| o.id == "upgrade-heavy-freight"));
        assert!(!options.iter().any(|o| o.id.starts_with("crossgrade-")));
    }

    #[test]
    fn unconnected_major_cities_each_get_a_connect_option() {
        let options = OptionGenerator::generate(&snapshot());
        assert!(options.iter().any(|o| o.id == "connect-Metro"));
        assert!(options.iter().any(|o| o.id == "connect-Harborview"));
        assert!(options.iter().any(|o| o.id == "connect-Junction"));
    }
}
