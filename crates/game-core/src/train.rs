//! Train classes and the legal upgrade / crossgrade transition graph.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Fixed cost in millions of a strict train upgrade.
pub const UPGRADE_COST: u64 = 20;
/// Fixed cost in millions of a crossgrade (sideways trade of speed for
/// capacity or vice versa).
pub const CROSSGRADE_COST: u64 = 5;

/// The four train classes.
///
/// `Freight` is the starting class. `FastFreight` trades nothing for speed,
/// `HeavyFreight` trades nothing for capacity, and `SuperFreight` has both.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum TrainClass {
    #[default]
    Freight,
    FastFreight,
    HeavyFreight,
    SuperFreight,
}

/// Whether a class transition is a strict upgrade or a crossgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionKind {
    Upgrade,
    Crossgrade,
}

impl TrainClass {
    /// Number of loads the train can carry.
    pub const fn capacity(self) -> usize {
        match self {
            TrainClass::Freight | TrainClass::FastFreight => 2,
            TrainClass::HeavyFreight | TrainClass::SuperFreight => 3,
        }
    }

    /// Mileposts of movement per turn.
    pub const fn speed(self) -> u32 {
        match self {
            TrainClass::Freight | TrainClass::HeavyFreight => 9,
            TrainClass::FastFreight | TrainClass::SuperFreight => 12,
        }
    }

    /// Strict upgrades reachable from this class.
    pub const fn upgrades(self) -> &'static [TrainClass] {
        match self {
            TrainClass::Freight => &[TrainClass::FastFreight, TrainClass::HeavyFreight],
            TrainClass::FastFreight | TrainClass::HeavyFreight => &[TrainClass::SuperFreight],
            TrainClass::SuperFreight => &[],
        }
    }

    /// Crossgrades reachable from this class.
    pub const fn crossgrades(self) -> &'static [TrainClass] {
        match self {
            TrainClass::FastFreight => &[TrainClass::HeavyFreight],
            TrainClass::HeavyFreight => &[TrainClass::FastFreight],
            TrainClass::Freight | TrainClass::SuperFreight => &[],
        }
    }

    /// Classifies the transition `self -> to`, or `None` if it is illegal.
    pub fn transition_kind(self, to: TrainClass) -> Option<TransitionKind> {
        if self.upgrades().contains(&to) {
            Some(TransitionKind::Upgrade)
        } else if self.crossgrades().contains(&to) {
            Some(TransitionKind::Crossgrade)
        } else {
            None
        }
    }

    /// Cost in millions of the transition `self -> to`, or `None` if illegal.
    pub fn transition_cost(self, to: TrainClass) -> Option<u64> {
        match self.transition_kind(to)? {
            TransitionKind::Upgrade => Some(UPGRADE_COST),
            TransitionKind::Crossgrade => Some(CROSSGRADE_COST),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freight_upgrades_to_both_mid_classes() {
        assert_eq!(
            TrainClass::Freight.transition_kind(TrainClass::FastFreight),
            Some(TransitionKind::Upgrade)
        );
        assert_eq!(
            TrainClass::Freight.transition_kind(TrainClass::HeavyFreight),
            Some(TransitionKind::Upgrade)
        );
        assert_eq!(TrainClass::Freight.transition_kind(TrainClass::SuperFreight), None);
    }

    #[test]
    fn mid_classes_crossgrade_both_ways() {
        assert_eq!(
            TrainClass::FastFreight.transition_kind(TrainClass::HeavyFreight),
            Some(TransitionKind::Crossgrade)
        );
        assert_eq!(
            TrainClass::HeavyFreight.transition_kind(TrainClass::FastFreight),
            Some(TransitionKind::Crossgrade)
        );
    }

    #[test]
    fn transition_costs() {
        assert_eq!(
            TrainClass::Freight.transition_cost(TrainClass::HeavyFreight),
            Some(UPGRADE_COST)
        );
        assert_eq!(
            TrainClass::FastFreight.transition_cost(TrainClass::HeavyFreight),
            Some(CROSSGRADE_COST)
        );
        assert_eq!(TrainClass::SuperFreight.transition_cost(TrainClass::Freight), None);
    }

    #[test]
    fn class_names_parse_case_insensitively() {
        use std::str::FromStr;
        assert_eq!(TrainClass::from_str("freight").unwrap(), TrainClass::Freight);
        assert_eq!(
            TrainClass::from_str("Fast-Freight").unwrap(),
            TrainClass::FastFreight
        );
    }
}
