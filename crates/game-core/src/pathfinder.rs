//! Lowest-cost track routing over the milepost grid.
//!
//! Uniform-cost search where the cost of traversing into a milepost is its
//! terrain (or city) entry cost, **zero** when the segment already exists in
//! the player's own network, and **forbidden** when the segment belongs to a
//! rival's exclusive network. Deterministic and reentrant: the pathfinder
//! never mutates the grid and ties break on point order.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

use crate::map::{GridMap, PointId, TrackSegment};
use crate::track::TrackNetwork;

/// A terrain-connected route and its build cost in millions. Cost counts only
/// segments that would be newly built; reused own segments are free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResult {
    pub path: Vec<PointId>,
    pub cost: u64,
}

/// Pathfinder over a shared static grid.
#[derive(Debug, Clone)]
pub struct TrackPathfinder {
    map: Arc<GridMap>,
}

impl TrackPathfinder {
    pub fn new(map: Arc<GridMap>) -> Self {
        Self { map }
    }

    pub fn map(&self) -> &GridMap {
        &self.map
    }

    /// Lowest-cost path between two mileposts.
    ///
    /// Returns `None` when either endpoint is missing from the map, the
    /// target is not enterable (open water), or no terrain-connected route
    /// exists that avoids rival segments.
    pub fn find_path(
        &self,
        from: PointId,
        to: PointId,
        own: &TrackNetwork,
        others: &TrackNetwork,
    ) -> Option<PathResult> {
        self.search(&[from], to, own, others)
    }

    /// Multi-source variant used when a network has several frontier points.
    pub fn find_path_from_any(
        &self,
        starts: &[PointId],
        to: PointId,
        own: &TrackNetwork,
        others: &TrackNetwork,
    ) -> Option<PathResult> {
        self.search(starts, to, own, others)
    }

    /// The prefix of the cheapest route toward `target` whose cumulative new
    /// build cost fits under `budget`.
    ///
    /// Reused own segments never consume budget. Returns `None` when the
    /// target is unreachable or not even one new segment is affordable.
    pub fn route_within_budget(
        &self,
        starts: &[PointId],
        target: PointId,
        own: &TrackNetwork,
        others: &TrackNetwork,
        budget: u64,
    ) -> Option<PathResult> {
        let full = self.find_path_from_any(starts, target, own, others)?;

        let mut spent = 0u64;
        let mut new_segments = 0usize;
        let mut prefix = vec![full.path[0]];
        for window in full.path.windows(2) {
            let segment = TrackSegment::new(window[0], window[1]);
            if own.contains(segment) {
                prefix.push(window[1]);
                continue;
            }
            let step = self.map.milepost(window[1])?.entry_cost()?;
            if spent + step > budget {
                break;
            }
            spent += step;
            new_segments += 1;
            prefix.push(window[1]);
        }

        if new_segments == 0 {
            return None;
        }
        Some(PathResult { path: prefix, cost: spent })
    }

    fn search(
        &self,
        starts: &[PointId],
        to: PointId,
        own: &TrackNetwork,
        others: &TrackNetwork,
    ) -> Option<PathResult> {
        let target = self.map.milepost(to)?;
        target.entry_cost()?;

        let mut dist: HashMap<PointId, u64> = HashMap::new();
        let mut prev: HashMap<PointId, PointId> = HashMap::new();
        let mut heap: BinaryHeap<Reverse<(u64, PointId)>> = BinaryHeap::new();

        for &start in starts {
            if self.map.contains(start) {
                dist.insert(start, 0);
                heap.push(Reverse((0, start)));
            }
        }

        while let Some(Reverse((cost, point))) = heap.pop() {
            if point == to {
                return Some(PathResult {
                    path: reconstruct(&prev, point, starts),
                    cost,
                });
            }
            if cost > dist.get(&point).copied().unwrap_or(u64::MAX) {
                continue;
            }
            for neighbor in self.map.neighbors(point) {
                let segment = TrackSegment::new(point, neighbor);
                if others.contains(segment) {
                    continue;
                }
                let step = if own.contains(segment) {
                    0
                } else {
                    match self.map.milepost(neighbor).and_then(|m| m.entry_cost()) {
                        Some(step) => step,
                        None => continue,
                    }
                };
                let next = cost + step;
                if next < dist.get(&neighbor).copied().unwrap_or(u64::MAX) {
                    dist.insert(neighbor, next);
                    prev.insert(neighbor, point);
                    heap.push(Reverse((next, neighbor)));
                }
            }
        }
        None
    }

    /// The major city milepost cheapest to route to from `from`, ignoring all
    /// existing track. Used to pick a starting city for a player's first
    /// track build.
    pub fn nearest_major_city(&self, from: PointId) -> Option<PointId> {
        let empty = TrackNetwork::new();
        self.map
            .major_cities()
            .iter()
            .filter_map(|city| {
                self.find_path(from, city.id, &empty, &empty)
                    .map(|r| (r.cost, city.id))
            })
            .min()
            .map(|(_, id)| id)
    }
}

fn reconstruct(prev: &HashMap<PointId, PointId>, end: PointId, starts: &[PointId]) -> Vec<PointId> {
    let mut path = vec![end];
    let mut current = end;
    while let Some(&p) = prev.get(&current) {
        path.push(p);
        current = p;
        if starts.contains(&current) {
            break;
        }
    }
    path.reverse();
    path
}

/// Segments along `path` that are not already part of `own`: the segments a
/// build action would actually persist.
pub fn segments_from_path(path: &[PointId], own: &TrackNetwork) -> Vec<TrackSegment> {
    path.windows(2)
        .map(|w| TrackSegment::new(w[0], w[1]))
        .filter(|s| !own.contains(*s))
        .collect()
}
