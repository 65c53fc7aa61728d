//! Static map topology: mileposts, terrain, cities, and track segments.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single addressable point on the terrain grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct PointId {
    pub row: u16,
    pub col: u16,
}

impl PointId {
    pub const fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

/// Terrain classification of a milepost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terrain {
    Clear,
    Mountain,
    Alpine,
    Water,
}

impl Terrain {
    /// Cost in millions to build a segment entering a milepost of this
    /// terrain. `None` means track can never enter (open water).
    pub const fn entry_cost(self) -> Option<u64> {
        match self {
            Terrain::Clear => Some(1),
            Terrain::Mountain => Some(2),
            Terrain::Alpine => Some(5),
            Terrain::Water => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CitySize {
    Small,
    Medium,
    Major,
}

impl CitySize {
    const fn entry_cost(self) -> u64 {
        match self {
            CitySize::Small => 3,
            CitySize::Medium => 3,
            CitySize::Major => 5,
        }
    }
}

/// City data attached to a milepost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub size: CitySize,
    /// Resources that can be picked up at this city.
    pub available_loads: Vec<String>,
}

/// One grid point with terrain and optional city data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milepost {
    pub id: PointId,
    pub terrain: Terrain,
    pub city: Option<City>,
}

impl Milepost {
    /// Cost in millions to build a segment entering this milepost.
    /// City entry cost overrides terrain; water is never enterable.
    pub fn entry_cost(&self) -> Option<u64> {
        if self.terrain == Terrain::Water {
            return None;
        }
        match &self.city {
            Some(city) => Some(city.size.entry_cost()),
            None => self.terrain.entry_cost(),
        }
    }

    pub fn is_major_city(&self) -> bool {
        matches!(&self.city, Some(city) if city.size == CitySize::Major)
    }
}

/// An undirected track segment between two adjacent mileposts.
///
/// Segments are normalized so that `a <= b`, making them usable as set and
/// map keys regardless of build direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackSegment {
    pub a: PointId,
    pub b: PointId,
}

impl TrackSegment {
    pub fn new(x: PointId, y: PointId) -> Self {
        if x <= y { Self { a: x, b: y } } else { Self { a: y, b: x } }
    }

    /// The endpoint opposite to `point`, if `point` is an endpoint.
    pub fn other(&self, point: PointId) -> Option<PointId> {
        if self.a == point {
            Some(self.b)
        } else if self.b == point {
            Some(self.a)
        } else {
            None
        }
    }
}

/// The static grid of mileposts shared by every game on this map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridMap {
    points: HashMap<PointId, Milepost>,
    rows: u16,
    cols: u16,
}

impl GridMap {
    pub fn new(rows: u16, cols: u16, mileposts: Vec<Milepost>) -> Self {
        let points = mileposts.into_iter().map(|m| (m.id, m)).collect();
        Self { points, rows, cols }
    }

    pub fn milepost(&self, id: PointId) -> Option<&Milepost> {
        self.points.get(&id)
    }

    pub fn contains(&self, id: PointId) -> bool {
        self.points.contains_key(&id)
    }

    /// Grid-adjacent mileposts (8-neighborhood) that exist on the map.
    pub fn neighbors(&self, id: PointId) -> Vec<PointId> {
        let mut out = Vec::with_capacity(8);
        for dr in -1i32..=1 {
            for dc in -1i32..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let row = id.row as i32 + dr;
                let col = id.col as i32 + dc;
                if row < 0 || col < 0 || row >= self.rows as i32 || col >= self.cols as i32 {
                    continue;
                }
                let n = PointId::new(row as u16, col as u16);
                if self.points.contains_key(&n) {
                    out.push(n);
                }
            }
        }
        out
    }

    /// Position of a named city, if it exists on this map.
    pub fn city_position(&self, name: &str) -> Option<PointId> {
        self.points
            .values()
            .find(|m| m.city.as_ref().is_some_and(|c| c.name == name))
            .map(|m| m.id)
    }

    /// All major city mileposts, sorted by position for determinism.
    pub fn major_cities(&self) -> Vec<&Milepost> {
        let mut majors: Vec<&Milepost> = self.points.values().filter(|m| m.is_major_city()).collect();
        majors.sort_by_key(|m| m.id);
        majors
    }

    /// Cities supplying the given resource, sorted by position.
    pub fn load_sources(&self, resource: &str) -> Vec<&Milepost> {
        let mut sources: Vec<&Milepost> = self
            .points
            .values()
            .filter(|m| {
                m.city
                    .as_ref()
                    .is_some_and(|c| c.available_loads.iter().any(|l| l == resource))
            })
            .collect();
        sources.sort_by_key(|m| m.id);
        sources
    }

    /// Every resource offered somewhere on the map, with the number of
    /// supplying cities. Used to seed initial global availability.
    pub fn resource_supply(&self) -> HashMap<String, u32> {
        let mut supply: HashMap<String, u32> = HashMap::new();
        for m in self.points.values() {
            if let Some(city) = &m.city {
                for load in &city.available_loads {
                    *supply.entry(load.clone()).or_insert(0) += 1;
                }
            }
        }
        supply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear(row: u16, col: u16) -> Milepost {
        Milepost {
            id: PointId::new(row, col),
            terrain: Terrain::Clear,
            city: None,
        }
    }

    #[test]
    fn segment_is_normalized() {
        let a = PointId::new(1, 1);
        let b = PointId::new(0, 2);
        assert_eq!(TrackSegment::new(a, b), TrackSegment::new(b, a));
    }

    #[test]
    fn neighbors_respect_bounds() {
        let map = GridMap::new(2, 2, vec![clear(0, 0), clear(0, 1), clear(1, 0), clear(1, 1)]);
        let n = map.neighbors(PointId::new(0, 0));
        assert_eq!(n.len(), 3);
    }

    #[test]
    fn water_has_no_entry_cost() {
        let post = Milepost {
            id: PointId::new(0, 0),
            terrain: Terrain::Water,
            city: None,
        };
        assert_eq!(post.entry_cost(), None);
    }

    #[test]
    fn major_city_entry_cost_overrides_terrain() {
        let post = Milepost {
            id: PointId::new(0, 0),
            terrain: Terrain::Mountain,
            city: Some(City {
                name: "Metro".into(),
                size: CitySize::Major,
                available_loads: vec![],
            }),
        };
        assert_eq!(post.entry_cost(), Some(5));
    }
}
