//! Demand cards: delivery offers drawn from the shared deck.

use serde::{Deserialize, Serialize};

/// One delivery offer: haul `resource` to `city` for `payment` millions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demand {
    pub city: String,
    pub resource: String,
    pub payment: u64,
}

/// A hand card listing up to three independent demands. Consumed on delivery
/// and replaced from the deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandCard {
    pub id: u32,
    pub demands: Vec<Demand>,
}

impl DemandCard {
    pub fn new(id: u32, demands: Vec<Demand>) -> Self {
        debug_assert!(demands.len() <= 3, "demand cards carry at most three demands");
        Self { id, demands }
    }

    /// The demand on this card matching a resource, if any.
    pub fn demand_for(&self, resource: &str) -> Option<&Demand> {
        self.demands.iter().find(|d| d.resource == resource)
    }
}
