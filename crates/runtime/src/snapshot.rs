//! Snapshot builder: one immutable world view per bot turn.

use std::str::FromStr;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use rail_core::{
    CompetitorSummary, DemandCard, GridMap, PointId, TrackNetwork, TrainClass, WorldSnapshot,
};

use crate::error::{EngineError, Result};
use crate::store::{GameStore, PlayerRow, StoreError, decode_column};
use crate::track::TrackService;

/// Default cash in millions for a row with no money column.
const DEFAULT_CASH: u64 = 50;

/// Builds the immutable [`WorldSnapshot`] every planning stage reads from.
///
/// Reading is done in one bulk player query plus one track-state query; the
/// builder itself is side-effect free.
pub struct SnapshotBuilder {
    store: Arc<dyn GameStore>,
    tracks: Arc<dyn TrackService>,
    map: Arc<GridMap>,
}

impl SnapshotBuilder {
    pub fn new(store: Arc<dyn GameStore>, tracks: Arc<dyn TrackService>, map: Arc<GridMap>) -> Self {
        Self { store, tracks, map }
    }

    pub async fn build(&self, game_id: &str, bot_id: &str) -> Result<WorldSnapshot> {
        let mut rows = self.store.load_players(game_id).await?;
        if rows.is_empty() {
            return Err(EngineError::GameNotFound(game_id.to_string()));
        }
        // Deterministic row order so the content hash is stable regardless of
        // storage iteration order.
        rows.sort_by(|a, b| a.id.cmp(&b.id));

        let bot = rows
            .iter()
            .find(|row| row.id == bot_id)
            .cloned()
            .ok_or_else(|| EngineError::PlayerNotFound(bot_id.to_string()))?;

        let hash = content_hash(&rows)?;

        let all_tracks = self.tracks.get_all_tracks(game_id).await?;
        let mut track = TrackNetwork::new();
        let mut rival_track = TrackNetwork::new();
        let mut rival_networks: Vec<(String, TrackNetwork)> = Vec::new();
        for state in &all_tracks {
            if state.player_id == bot_id {
                track = TrackNetwork::from_segments(state.segments.iter().copied());
            } else {
                let network = TrackNetwork::from_segments(state.segments.iter().copied());
                for segment in state.segments.iter().copied() {
                    rival_track.add_segment(segment);
                }
                rival_networks.push((state.player_id.clone(), network));
            }
        }

        let competitors = rows
            .iter()
            .filter(|row| row.id != bot_id)
            .map(|row| self.summarize(row, &rival_networks))
            .collect();

        let major_city_connections = self
            .map
            .major_cities()
            .iter()
            .map(|city| {
                let name = city.city.as_ref().map(|c| c.name.clone()).unwrap_or_default();
                (name, track.touches(city.id))
            })
            .collect();

        // A game with no availability rows yet starts at the map's full
        // supply counts.
        let mut load_availability = self.store.load_availability(game_id).await?;
        if load_availability.is_empty() {
            load_availability = self.map.resource_supply();
        }

        Ok(WorldSnapshot {
            game_id: game_id.to_string(),
            bot_id: bot_id.to_string(),
            turn_number: bot.turn_number,
            position: decode_position(&bot),
            cash: decode_cash(&bot),
            hand: decode_hand(&bot),
            loads: decode_loads(&bot),
            train_class: decode_train_class(&bot),
            track,
            rival_track,
            competitors,
            load_availability,
            major_city_connections,
            map: Arc::clone(&self.map),
            hash,
        })
    }

    fn summarize(
        &self,
        row: &PlayerRow,
        rival_networks: &[(String, TrackNetwork)],
    ) -> CompetitorSummary {
        let network = rival_networks
            .iter()
            .find(|(id, _)| *id == row.id)
            .map(|(_, network)| network);
        let connected = match network {
            Some(network) => self
                .map
                .major_cities()
                .iter()
                .filter(|city| network.touches(city.id))
                .count() as u32,
            None => row.major_cities_connected,
        };
        CompetitorSummary {
            player_id: row.id.clone(),
            name: row.name.clone(),
            position: decode_position(row),
            loads: decode_loads(row),
            cash: decode_cash(row),
            train_class: decode_train_class(row),
            major_cities_connected: connected,
        }
    }
}

fn content_hash(rows: &[PlayerRow]) -> Result<String> {
    let bytes = serde_json::to_vec(rows)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    let digest = Sha256::digest(&bytes);
    Ok(hex::encode(digest))
}

fn decode_cash(row: &PlayerRow) -> u64 {
    row.money
        .as_ref()
        .and_then(decode_column::<u64>)
        .unwrap_or(DEFAULT_CASH)
}

fn decode_hand(row: &PlayerRow) -> Vec<DemandCard> {
    row.hand
        .as_ref()
        .and_then(decode_column::<Vec<DemandCard>>)
        .unwrap_or_default()
}

fn decode_loads(row: &PlayerRow) -> Vec<String> {
    row.loads
        .as_ref()
        .and_then(decode_column::<Vec<String>>)
        .unwrap_or_default()
}

fn decode_position(row: &PlayerRow) -> Option<PointId> {
    row.position.as_ref().and_then(decode_column::<PointId>)
}

fn decode_train_class(row: &PlayerRow) -> TrainClass {
    row.train_class
        .as_deref()
        .and_then(|raw| TrainClass::from_str(raw).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rail_core::demo::{demo_demand_cards, demo_map};
    use serde_json::json;

    use crate::store::InMemoryStore;

    fn builder(store: &InMemoryStore) -> SnapshotBuilder {
        let shared: Arc<InMemoryStore> = Arc::new(store.clone());
        SnapshotBuilder::new(shared.clone(), shared, Arc::new(demo_map()))
    }

    fn bot_row(game: &str, id: &str) -> PlayerRow {
        PlayerRow {
            id: id.to_string(),
            game_id: game.to_string(),
            name: "Bot".into(),
            is_bot: true,
            difficulty: Some("hard".into()),
            archetype: Some("balanced".into()),
            ..PlayerRow::default()
        }
    }

    #[tokio::test]
    async fn missing_game_is_fatal() {
        let store = InMemoryStore::new();
        let result = builder(&store).build("nope", "bot").await;
        assert!(matches!(result, Err(EngineError::GameNotFound(_))));
    }

    #[tokio::test]
    async fn missing_bot_row_is_fatal() {
        let store = InMemoryStore::new();
        store.upsert_player(bot_row("g1", "someone-else")).await;
        let result = builder(&store).build("g1", "bot").await;
        assert!(matches!(result, Err(EngineError::PlayerNotFound(_))));
    }

    #[tokio::test]
    async fn missing_columns_get_defaults() {
        let store = InMemoryStore::new();
        store.upsert_player(bot_row("g1", "bot")).await;

        let snapshot = builder(&store).build("g1", "bot").await.unwrap();
        assert_eq!(snapshot.cash, 50);
        assert!(snapshot.hand.is_empty());
        assert!(snapshot.loads.is_empty());
        assert_eq!(snapshot.train_class, TrainClass::Freight);
    }

    #[tokio::test]
    async fn string_encoded_columns_are_tolerated() {
        let store = InMemoryStore::new();
        let mut row = bot_row("g1", "bot");
        row.money = Some(json!("75"));
        row.loads = Some(json!("[\"wine\"]"));
        let hand = serde_json::to_string(&demo_demand_cards()[..2]).unwrap();
        row.hand = Some(json!(hand));
        store.upsert_player(row).await;

        let snapshot = builder(&store).build("g1", "bot").await.unwrap();
        assert_eq!(snapshot.cash, 75);
        assert_eq!(snapshot.loads, vec!["wine"]);
        assert_eq!(snapshot.hand.len(), 2);
    }

    #[tokio::test]
    async fn unseeded_availability_defaults_to_map_supply() {
        let store = InMemoryStore::new();
        store.upsert_player(bot_row("g1", "bot")).await;

        let snapshot = builder(&store).build("g1", "bot").await.unwrap();
        assert_eq!(snapshot.load_availability, demo_map().resource_supply());
        assert_eq!(snapshot.load_availability.get("wine"), Some(&1));

        store.set_availability("g1", [("wine".to_string(), 0)].into()).await;
        let snapshot = builder(&store).build("g1", "bot").await.unwrap();
        assert_eq!(snapshot.load_availability.get("wine"), Some(&0));
        assert_eq!(snapshot.load_availability.len(), 1);
    }

    #[tokio::test]
    async fn hash_is_deterministic_and_state_sensitive() {
        let store = InMemoryStore::new();
        store.upsert_player(bot_row("g1", "bot")).await;

        let builder = builder(&store);
        let first = builder.build("g1", "bot").await.unwrap();
        let second = builder.build("g1", "bot").await.unwrap();
        assert_eq!(first.hash, second.hash);

        let mut row = bot_row("g1", "bot");
        row.money = Some(json!(10));
        store.upsert_player(row).await;
        let third = builder.build("g1", "bot").await.unwrap();
        assert_ne!(first.hash, third.hash);
    }
}
