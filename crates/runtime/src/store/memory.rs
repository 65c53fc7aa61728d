//! In-memory store implementation for tests and local runs.
//!
//! Transactions stage writes privately and apply them under one write lock on
//! commit, so concurrent pipelines observe either all of a plan's mutations
//! or none of them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use rail_core::TrackSegment;

use crate::store::{
    AuditRow, AuditStore, GameStore, PlayerRow, Result, StoreError, StoreTransaction,
};
use crate::track::{TrackService, TrackState};

#[derive(Default)]
struct MemoryState {
    /// Player rows keyed by game id.
    players: HashMap<String, Vec<PlayerRow>>,
    /// Track states keyed by (game id, player id).
    tracks: HashMap<(String, String), TrackState>,
    /// Global load availability keyed by game id.
    availability: HashMap<String, HashMap<String, u32>>,
    /// Append-only audit log.
    audits: Vec<AuditRow>,
}

/// In-memory implementation of the game store, audit store, and track
/// service.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a player row.
    pub async fn upsert_player(&self, row: PlayerRow) {
        let mut state = self.state.write().await;
        let rows = state.players.entry(row.game_id.clone()).or_default();
        match rows.iter_mut().find(|r| r.id == row.id) {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }
    }

    pub async fn set_availability(&self, game_id: &str, availability: HashMap<String, u32>) {
        let mut state = self.state.write().await;
        state.availability.insert(game_id.to_string(), availability);
    }

    /// Direct row read outside any transaction, for test assertions.
    pub async fn player(&self, game_id: &str, player_id: &str) -> Option<PlayerRow> {
        let state = self.state.read().await;
        state
            .players
            .get(game_id)?
            .iter()
            .find(|r| r.id == player_id)
            .cloned()
    }

    pub async fn audit_count(&self) -> usize {
        self.state.read().await.audits.len()
    }
}

#[async_trait]
impl GameStore for InMemoryStore {
    async fn load_players(&self, game_id: &str) -> Result<Vec<PlayerRow>> {
        let state = self.state.read().await;
        Ok(state.players.get(game_id).cloned().unwrap_or_default())
    }

    async fn load_availability(&self, game_id: &str) -> Result<HashMap<String, u32>> {
        let state = self.state.read().await;
        Ok(state.availability.get(game_id).cloned().unwrap_or_default())
    }

    async fn begin(&self, game_id: &str) -> Result<Box<dyn StoreTransaction>> {
        Ok(Box::new(MemoryTransaction {
            state: Arc::clone(&self.state),
            game_id: game_id.to_string(),
            staged_players: HashMap::new(),
            staged_segments: Vec::new(),
            closed: false,
        }))
    }
}

#[async_trait]
impl AuditStore for InMemoryStore {
    async fn insert_audit(&self, row: AuditRow) -> Result<()> {
        let mut state = self.state.write().await;
        state.audits.push(row);
        Ok(())
    }

    async fn latest_audit(&self, game_id: &str, player_id: &str) -> Result<Option<AuditRow>> {
        let state = self.state.read().await;
        Ok(state
            .audits
            .iter()
            .rev()
            .find(|row| row.game_id == game_id && row.player_id == player_id)
            .cloned())
    }
}

#[async_trait]
impl TrackService for InMemoryStore {
    async fn get_track_state(&self, game_id: &str, player_id: &str) -> Result<TrackState> {
        let state = self.state.read().await;
        let key = (game_id.to_string(), player_id.to_string());
        Ok(state.tracks.get(&key).cloned().unwrap_or_else(|| TrackState {
            player_id: player_id.to_string(),
            ..TrackState::default()
        }))
    }

    async fn get_all_tracks(&self, game_id: &str) -> Result<Vec<TrackState>> {
        let state = self.state.read().await;
        let mut tracks: Vec<TrackState> = state
            .tracks
            .iter()
            .filter(|((game, _), _)| game == game_id)
            .map(|(_, track)| track.clone())
            .collect();
        tracks.sort_by(|a, b| a.player_id.cmp(&b.player_id));
        Ok(tracks)
    }

    async fn save_track_state(
        &self,
        game_id: &str,
        player_id: &str,
        track: TrackState,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .tracks
            .insert((game_id.to_string(), player_id.to_string()), track);
        Ok(())
    }
}

struct MemoryTransaction {
    state: Arc<RwLock<MemoryState>>,
    game_id: String,
    staged_players: HashMap<String, PlayerRow>,
    staged_segments: Vec<(String, Vec<TrackSegment>, u64)>,
    closed: bool,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn read_player(&mut self, player_id: &str) -> Result<PlayerRow> {
        if self.closed {
            return Err(StoreError::TransactionClosed);
        }
        if let Some(staged) = self.staged_players.get(player_id) {
            return Ok(staged.clone());
        }
        let state = self.state.read().await;
        state
            .players
            .get(&self.game_id)
            .and_then(|rows| rows.iter().find(|r| r.id == player_id))
            .cloned()
            .ok_or_else(|| StoreError::PlayerMissing(player_id.to_string()))
    }

    async fn write_player(&mut self, row: PlayerRow) -> Result<()> {
        if self.closed {
            return Err(StoreError::TransactionClosed);
        }
        self.staged_players.insert(row.id.clone(), row);
        Ok(())
    }

    async fn append_segments(
        &mut self,
        player_id: &str,
        segments: &[TrackSegment],
        cost: u64,
    ) -> Result<()> {
        if self.closed {
            return Err(StoreError::TransactionClosed);
        }
        self.staged_segments
            .push((player_id.to_string(), segments.to_vec(), cost));
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        if self.closed {
            return Err(StoreError::TransactionClosed);
        }
        self.closed = true;

        let staged_players = std::mem::take(&mut self.staged_players);
        let staged_segments = std::mem::take(&mut self.staged_segments);

        let mut state = self.state.write().await;
        for (id, row) in staged_players {
            let rows = state.players.entry(self.game_id.clone()).or_default();
            match rows.iter_mut().find(|r| r.id == id) {
                Some(existing) => *existing = row,
                None => rows.push(row),
            }
        }
        for (player_id, segments, cost) in staged_segments {
            let key = (self.game_id.clone(), player_id.clone());
            let track = state.tracks.entry(key).or_insert_with(|| TrackState {
                player_id,
                ..TrackState::default()
            });
            track.segments.extend(segments);
            track.total_cost += cost;
        }
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        if self.closed {
            return Err(StoreError::TransactionClosed);
        }
        self.closed = true;
        self.staged_players.clear();
        self.staged_segments.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(game: &str, id: &str) -> PlayerRow {
        PlayerRow {
            id: id.to_string(),
            game_id: game.to_string(),
            name: id.to_string(),
            ..PlayerRow::default()
        }
    }

    #[tokio::test]
    async fn committed_writes_are_visible() {
        let store = InMemoryStore::new();
        store.upsert_player(row("g1", "p1")).await;

        let mut txn = store.begin("g1").await.unwrap();
        let mut player = txn.read_player("p1").await.unwrap();
        player.turn_number = 7;
        txn.write_player(player).await.unwrap();
        txn.commit().await.unwrap();

        assert_eq!(store.player("g1", "p1").await.unwrap().turn_number, 7);
    }

    #[tokio::test]
    async fn rolled_back_writes_are_discarded() {
        let store = InMemoryStore::new();
        store.upsert_player(row("g1", "p1")).await;

        let mut txn = store.begin("g1").await.unwrap();
        let mut player = txn.read_player("p1").await.unwrap();
        player.turn_number = 7;
        txn.write_player(player).await.unwrap();
        txn.rollback().await.unwrap();

        assert_eq!(store.player("g1", "p1").await.unwrap().turn_number, 0);
    }

    #[tokio::test]
    async fn transaction_reads_see_staged_writes() {
        let store = InMemoryStore::new();
        store.upsert_player(row("g1", "p1")).await;

        let mut txn = store.begin("g1").await.unwrap();
        let mut player = txn.read_player("p1").await.unwrap();
        player.turn_number = 3;
        txn.write_player(player).await.unwrap();
        assert_eq!(txn.read_player("p1").await.unwrap().turn_number, 3);
        txn.rollback().await.unwrap();
    }
}
