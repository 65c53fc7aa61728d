//! Track state service: authoritative for own vs. rival segments.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use rail_core::TrackSegment;

use crate::store::Result;

/// Persisted track state for one player in one game.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackState {
    pub player_id: String,
    pub segments: Vec<TrackSegment>,
    /// Cumulative build cost in millions, for scoring and victory checks.
    pub total_cost: u64,
}

/// Service holding every player's built track. The pipeline treats this as
/// authoritative for the "own" and "other" segment sets fed to the
/// pathfinder.
#[async_trait]
pub trait TrackService: Send + Sync {
    /// A player's track state; an empty state when none was saved yet.
    async fn get_track_state(&self, game_id: &str, player_id: &str) -> Result<TrackState>;

    /// All players' track states for a game.
    async fn get_all_tracks(&self, game_id: &str) -> Result<Vec<TrackState>>;

    async fn save_track_state(
        &self,
        game_id: &str,
        player_id: &str,
        state: TrackState,
    ) -> Result<()>;
}
