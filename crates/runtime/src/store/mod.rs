//! Storage contracts for player rows, transactions, and audit persistence.

mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use rail_core::TrackSegment;

pub use memory::InMemoryStore;

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("player {0} not found")]
    PlayerMissing(String),

    #[error("transaction already closed")]
    TransactionClosed,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// One persisted player row.
///
/// Structured columns (`money`, `hand`, `loads`, `position`) are kept as raw
/// JSON values because the backing store may hold them either natively or as
/// string-encoded JSON; [`decode_column`] tolerates both. Missing columns
/// fall back to the defaults applied by the snapshot builder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerRow {
    pub id: String,
    pub game_id: String,
    pub name: String,
    pub is_bot: bool,
    pub difficulty: Option<String>,
    pub archetype: Option<String>,
    pub money: Option<Value>,
    pub hand: Option<Value>,
    pub loads: Option<Value>,
    pub train_class: Option<String>,
    pub position: Option<Value>,
    pub turn_number: u32,
    pub major_cities_connected: u32,
}

/// One row of the append-only audit table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRow {
    pub game_id: String,
    pub player_id: String,
    pub turn_number: u32,
    pub snapshot_hash: String,
    /// One of "success", "fallback", "error".
    pub execution_result: String,
    pub audit_json: Value,
    pub created_at: DateTime<Utc>,
}

/// Relational store for player rows, read in bulk for snapshots and
/// read/written row-by-row inside transactions.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// All player rows for a game, in one query.
    async fn load_players(&self, game_id: &str) -> Result<Vec<PlayerRow>>;

    /// Global per-resource availability counts for a game.
    async fn load_availability(&self, game_id: &str) -> Result<HashMap<String, u32>>;

    /// Opens a transaction. All mutations staged on the returned handle
    /// commit atomically or not at all.
    async fn begin(&self, game_id: &str) -> Result<Box<dyn StoreTransaction>>;
}

/// A unit of work against the store. Dropping without commit discards all
/// staged writes.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Current row for a player, reflecting writes staged earlier in this
    /// transaction.
    async fn read_player(&mut self, player_id: &str) -> Result<PlayerRow>;

    /// Stages a full-row update.
    async fn write_player(&mut self, row: PlayerRow) -> Result<()>;

    /// Stages new track segments for a player, with their build cost.
    async fn append_segments(
        &mut self,
        player_id: &str,
        segments: &[TrackSegment],
        cost: u64,
    ) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Append-only audit persistence.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn insert_audit(&self, row: AuditRow) -> Result<()>;

    /// Most recent audit row for a player, if any.
    async fn latest_audit(&self, game_id: &str, player_id: &str) -> Result<Option<AuditRow>>;
}

/// Decodes a structured column that may be stored natively or as
/// string-encoded JSON. Returns `None` when the column cannot be decoded
/// either way, letting callers fall back to defaults.
pub fn decode_column<T: DeserializeOwned>(value: &Value) -> Option<T> {
    match value {
        Value::String(raw) => serde_json::from_str(raw).ok(),
        other => serde_json::from_value(other.clone()).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_column_accepts_native_json() {
        let value = serde_json::json!(["wine", "coal"]);
        let loads: Vec<String> = decode_column(&value).unwrap();
        assert_eq!(loads, vec!["wine", "coal"]);
    }

    #[test]
    fn decode_column_accepts_string_encoded_json() {
        let value = Value::String("[\"wine\",\"coal\"]".into());
        let loads: Vec<String> = decode_column(&value).unwrap();
        assert_eq!(loads, vec!["wine", "coal"]);
    }

    #[test]
    fn decode_column_rejects_garbage() {
        let value = Value::String("not json".into());
        assert_eq!(decode_column::<Vec<String>>(&value), None);
    }
}
