//! Immutable world snapshot consumed by every planning stage of one turn.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cards::DemandCard;
use crate::map::{GridMap, PointId};
use crate::track::TrackNetwork;
use crate::train::TrainClass;

/// Planning-relevant summary of one competitor.
#[derive(Debug, Clone, PartialEq)]
pub struct CompetitorSummary {
    pub player_id: String,
    pub name: String,
    pub position: Option<PointId>,
    pub loads: Vec<String>,
    pub cash: u64,
    pub train_class: TrainClass,
    pub major_cities_connected: u32,
}

/// Self-consistent view of the world for one bot's turn.
///
/// Built once per turn by the snapshot builder and never mutated afterwards;
/// all planning stages read from the same instance. The `hash` field is a
/// deterministic fingerprint of the queried rows, used for idempotent audit
/// identity and caching.
#[derive(Debug, Clone)]
pub struct WorldSnapshot {
    pub game_id: String,
    pub bot_id: String,
    pub turn_number: u32,

    pub position: Option<PointId>,
    pub cash: u64,
    pub hand: Vec<DemandCard>,
    pub loads: Vec<String>,
    pub train_class: TrainClass,

    /// The bot's own track as adjacency over grid points.
    pub track: TrackNetwork,
    /// Union of every rival's segments; excluded from routing entirely.
    pub rival_track: TrackNetwork,

    pub competitors: Vec<CompetitorSummary>,
    /// Global per-resource availability counts.
    pub load_availability: HashMap<String, u32>,
    /// Connection state per major city name.
    pub major_city_connections: HashMap<String, bool>,

    pub map: Arc<GridMap>,
    pub hash: String,
}

impl WorldSnapshot {
    pub fn train_capacity(&self) -> usize {
        self.train_class.capacity()
    }

    pub fn carries(&self, resource: &str) -> bool {
        self.loads.iter().any(|l| l == resource)
    }

    /// Starting points for routing: the bot's network if it owns track,
    /// otherwise its position, otherwise every major city (a first build may
    /// start from any of them).
    pub fn route_starts(&self) -> Vec<PointId> {
        if !self.track.is_empty() {
            return self.track.points();
        }
        if let Some(position) = self.position {
            return vec![position];
        }
        self.map.major_cities().iter().map(|m| m.id).collect()
    }

    /// Whether a named city is on the bot's network, reachable from its
    /// current position.
    pub fn city_reachable(&self, city: &str) -> bool {
        let Some(target) = self.map.city_position(city) else {
            return false;
        };
        let starts = match self.position {
            Some(position) => vec![position],
            None => self.track.points(),
        };
        if starts.is_empty() {
            return false;
        }
        self.track.reaches(&starts, target)
    }
}
