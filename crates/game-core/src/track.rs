//! Per-player track networks as adjacency over grid points.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::map::{PointId, TrackSegment};

/// A set of owned track segments with an adjacency index for reachability
/// queries. Built once per snapshot; never mutated during planning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackNetwork {
    segments: HashSet<TrackSegment>,
    adjacency: HashMap<PointId, Vec<PointId>>,
}

impl TrackNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segments<I: IntoIterator<Item = TrackSegment>>(segments: I) -> Self {
        let mut network = Self::default();
        for segment in segments {
            network.add_segment(segment);
        }
        network
    }

    pub fn add_segment(&mut self, segment: TrackSegment) {
        if self.segments.insert(segment) {
            self.adjacency.entry(segment.a).or_default().push(segment.b);
            self.adjacency.entry(segment.b).or_default().push(segment.a);
        }
    }

    pub fn contains(&self, segment: TrackSegment) -> bool {
        self.segments.contains(&segment)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> impl Iterator<Item = &TrackSegment> {
        self.segments.iter()
    }

    /// Every grid point touched by this network, sorted for determinism.
    pub fn points(&self) -> Vec<PointId> {
        let mut points: Vec<PointId> = self.adjacency.keys().copied().collect();
        points.sort_unstable();
        points
    }

    pub fn touches(&self, point: PointId) -> bool {
        self.adjacency.contains_key(&point)
    }

    /// Whether `target` is reachable along this network from any of `starts`.
    ///
    /// A start point that is not on the network contributes nothing; a target
    /// equal to a start counts as reachable.
    pub fn reaches(&self, starts: &[PointId], target: PointId) -> bool {
        if starts.contains(&target) {
            return true;
        }
        let mut seen: HashSet<PointId> = starts.iter().copied().collect();
        let mut queue: VecDeque<PointId> = starts
            .iter()
            .copied()
            .filter(|p| self.adjacency.contains_key(p))
            .collect();
        while let Some(point) = queue.pop_front() {
            if point == target {
                return true;
            }
            if let Some(neighbors) = self.adjacency.get(&point) {
                for &n in neighbors {
                    if seen.insert(n) {
                        queue.push_back(n);
                    }
                }
            }
        }
        seen.contains(&target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(row: u16, col: u16) -> PointId {
        PointId::new(row, col)
    }

    #[test]
    fn reaches_follows_segments() {
        let net = TrackNetwork::from_segments([
            TrackSegment::new(p(0, 0), p(0, 1)),
            TrackSegment::new(p(0, 1), p(0, 2)),
        ]);
        assert!(net.reaches(&[p(0, 0)], p(0, 2)));
        assert!(!net.reaches(&[p(0, 0)], p(5, 5)));
    }

    #[test]
    fn disconnected_components_do_not_reach() {
        let net = TrackNetwork::from_segments([
            TrackSegment::new(p(0, 0), p(0, 1)),
            TrackSegment::new(p(3, 3), p(3, 4)),
        ]);
        assert!(!net.reaches(&[p(0, 0)], p(3, 4)));
        assert!(net.reaches(&[p(3, 3)], p(3, 4)));
    }

    #[test]
    fn duplicate_segments_are_ignored() {
        let mut net = TrackNetwork::new();
        net.add_segment(TrackSegment::new(p(0, 0), p(0, 1)));
        net.add_segment(TrackSegment::new(p(0, 1), p(0, 0)));
        assert_eq!(net.segment_count(), 1);
    }
}
