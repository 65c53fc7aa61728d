//! Read-side access to persisted strategy audits.
//!
//! Backs `GET /api/games/:gameId/ai-audit/:playerId` at whatever web layer is
//! mounted on top: `None` maps to a 404 there. Only the most recent audit per
//! (game, player) is served; history stays in the store.

use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::store::AuditStore;

pub struct AuditApi {
    audits: Arc<dyn AuditStore>,
}

impl AuditApi {
    pub fn new(audits: Arc<dyn AuditStore>) -> Self {
        Self { audits }
    }

    /// The latest audit for a player as its persisted JSON document.
    pub async fn latest_audit_json(&self, game_id: &str, player_id: &str) -> Result<Option<Value>> {
        let row = self.audits.latest_audit(game_id, player_id).await?;
        Ok(row.map(|row| row.audit_json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    use crate::store::{AuditRow, InMemoryStore};

    fn row(turn: u32) -> AuditRow {
        AuditRow {
            game_id: "g1".into(),
            player_id: "bot".into(),
            turn_number: turn,
            snapshot_hash: format!("hash-{turn}"),
            execution_result: "success".into(),
            audit_json: json!({ "turnNumber": turn }),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn missing_audit_yields_none() {
        let store: Arc<InMemoryStore> = Arc::new(InMemoryStore::new());
        let api = AuditApi::new(store);
        assert!(api.latest_audit_json("g1", "bot").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn latest_audit_wins() {
        let store: Arc<InMemoryStore> = Arc::new(InMemoryStore::new());
        store.insert_audit(row(1)).await.unwrap();
        store.insert_audit(row(2)).await.unwrap();

        let api = AuditApi::new(store.clone());
        let json = api.latest_audit_json("g1", "bot").await.unwrap().unwrap();
        assert_eq!(json["turnNumber"], 2);
    }
}
