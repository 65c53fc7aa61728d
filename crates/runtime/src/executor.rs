//! Turn executor: applies a validated plan inside one store transaction.
//!
//! All-or-nothing: the first failing action rolls the whole transaction back
//! and compensates any deck mutations made by earlier actions, so no partial
//! plan is ever visible. Deck state lives outside the relational transaction,
//! hence the explicit compensation instead of a cross-store commit.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;

use rail_core::{ActionKind, DemandCard, TrainClass, TurnAction, TurnPlan};

use crate::deck::DeckService;
use crate::events::{BotEvent, NotificationBus};
use crate::store::{GameStore, PlayerRow, StoreTransaction, decode_column};

/// Executes a plan against persistent state. Seam for tests and alternative
/// backends.
#[async_trait]
pub trait PlanExecutor: Send + Sync {
    async fn execute(
        &self,
        plan: &TurnPlan,
        game_id: &str,
        player_id: &str,
    ) -> TurnExecutionResult;
}

/// Deck mutation made by one action, remembered for compensation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardSwap {
    pub discarded: u32,
    pub dealt: Option<u32>,
}

/// Outcome of one action within a plan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub index: usize,
    pub kind: ActionKind,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Outcome of a whole plan execution.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnExecutionResult {
    pub success: bool,
    pub results: Vec<ActionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub total_ms: u64,
}

impl TurnExecutionResult {
    fn succeeded(results: Vec<ActionResult>, total_ms: u64) -> Self {
        Self { success: true, results, failure: None, total_ms }
    }

    fn failed(results: Vec<ActionResult>, failure: String, total_ms: u64) -> Self {
        Self { success: false, results, failure: Some(failure), total_ms }
    }
}

pub struct TurnExecutor {
    store: Arc<dyn GameStore>,
    deck: Arc<dyn DeckService>,
    bus: NotificationBus,
}

impl TurnExecutor {
    pub fn new(store: Arc<dyn GameStore>, deck: Arc<dyn DeckService>, bus: NotificationBus) -> Self {
        Self { store, deck, bus }
    }

    async fn apply(
        &self,
        txn: &mut dyn StoreTransaction,
        player_id: &str,
        action: &TurnAction,
        swaps: &mut Vec<CardSwap>,
    ) -> Result<(), String> {
        match action {
            TurnAction::DeliverLoad { resource, card_id, city, payment } => {
                let mut row = self.read(txn, player_id).await?;
                let mut loads = decode_loads(&row);
                let Some(load_index) = loads.iter().position(|l| l == resource) else {
                    return Err(format!("load {resource} is not on the train"));
                };
                let mut hand = decode_hand(&row);
                let Some(card_index) = hand.iter().position(|c| c.id == *card_id) else {
                    return Err(format!("demand card {card_id} is not in hand"));
                };

                loads.remove(load_index);
                hand.remove(card_index);
                let cash = decode_cash(&row) + payment;

                // Deck side effects are outside the transaction; remember
                // them so a later failure can undo them.
                self.deck.discard_card(*card_id);
                let replacement = self.deck.draw_card();
                if let Some(card) = &replacement {
                    hand.push(card.clone());
                }
                swaps.push(CardSwap {
                    discarded: *card_id,
                    dealt: replacement.as_ref().map(|c| c.id),
                });

                tracing::debug!(player = player_id, %resource, %city, payment, "delivered load");
                row.money = Some(json!(cash));
                row.loads = Some(serde_json::to_value(&loads).map_err(stringify)?);
                row.hand = Some(serde_json::to_value(&hand).map_err(stringify)?);
                txn.write_player(row).await.map_err(stringify)
            }
            TurnAction::PickupAndDeliver { resource, .. } => {
                let mut row = self.read(txn, player_id).await?;
                let mut loads = decode_loads(&row);
                let capacity = decode_train_class(&row).capacity();
                if loads.len() >= capacity {
                    return Err(format!("train is at capacity ({capacity} loads)"));
                }
                loads.push(resource.clone());
                row.loads = Some(serde_json::to_value(&loads).map_err(stringify)?);
                txn.write_player(row).await.map_err(stringify)
            }
            TurnAction::BuildTrack { segments, cost, .. }
            | TurnAction::BuildTowardMajorCity { segments, cost, .. } => {
                let mut row = self.read(txn, player_id).await?;
                let cash = decode_cash(&row);
                if cash < *cost {
                    return Err(format!("Insufficient funds: need {cost}, have {cash}"));
                }
                // Zero segments is a legal no-op build.
                if !segments.is_empty() {
                    txn.append_segments(player_id, segments, *cost)
                        .await
                        .map_err(stringify)?;
                }
                row.money = Some(json!(cash - cost));
                txn.write_player(row).await.map_err(stringify)
            }
            TurnAction::UpgradeTrain { to, cost, .. } => {
                let mut row = self.read(txn, player_id).await?;
                let cash = decode_cash(&row);
                if cash < *cost {
                    return Err(format!("Insufficient funds: need {cost}, have {cash}"));
                }
                let loads = decode_loads(&row);
                if loads.len() > to.capacity() {
                    return Err(format!(
                        "carrying {} loads exceeds {} capacity ({})",
                        loads.len(),
                        to,
                        to.capacity()
                    ));
                }
                row.money = Some(json!(cash - cost));
                row.train_class = Some(to.to_string());
                txn.write_player(row).await.map_err(stringify)
            }
            TurnAction::PassTurn => Ok(()),
            TurnAction::Unknown { raw_kind } => Err(format!("Unknown action type: {raw_kind}")),
        }
    }

    async fn read(
        &self,
        txn: &mut dyn StoreTransaction,
        player_id: &str,
    ) -> Result<PlayerRow, String> {
        txn.read_player(player_id).await.map_err(stringify)
    }

    /// Undoes deck mutations from already-applied actions, newest first.
    fn compensate(&self, swaps: &[CardSwap]) {
        for swap in swaps.iter().rev() {
            if let Some(dealt) = swap.dealt {
                self.deck.return_dealt_card_to_top(dealt);
            }
            self.deck.return_discarded_to_dealt(swap.discarded);
        }
    }
}

#[async_trait]
impl PlanExecutor for TurnExecutor {
    async fn execute(
        &self,
        plan: &TurnPlan,
        game_id: &str,
        player_id: &str,
    ) -> TurnExecutionResult {
        let start = Instant::now();

        // An empty plan never opens a transaction.
        if plan.is_empty() {
            return TurnExecutionResult::succeeded(Vec::new(), elapsed_ms(start));
        }

        let mut txn = match self.store.begin(game_id).await {
            Ok(txn) => txn,
            Err(e) => {
                return TurnExecutionResult::failed(
                    Vec::new(),
                    format!("failed to open transaction: {e}"),
                    elapsed_ms(start),
                );
            }
        };

        let mut results = Vec::with_capacity(plan.actions.len());
        let mut swaps: Vec<CardSwap> = Vec::new();

        for (index, action) in plan.actions.iter().enumerate() {
            let action_start = Instant::now();
            let outcome = self
                .apply(txn.as_mut(), player_id, action, &mut swaps)
                .await;
            let duration_ms = elapsed_ms(action_start);

            match outcome {
                Ok(()) => {
                    results.push(ActionResult {
                        index,
                        kind: action.kind(),
                        success: true,
                        error: None,
                        duration_ms,
                    });
                    self.bus.emit(
                        game_id,
                        BotEvent::Action,
                        json!({ "playerId": player_id, "index": index, "kind": action.kind() }),
                    );
                }
                Err(reason) => {
                    let failure =
                        format!("Action {} ({}): {}", index + 1, action.kind(), reason);
                    results.push(ActionResult {
                        index,
                        kind: action.kind(),
                        success: false,
                        error: Some(reason),
                        duration_ms,
                    });
                    tracing::warn!(player = player_id, %failure, "plan execution failed");

                    self.compensate(&swaps);
                    if let Err(e) = txn.rollback().await {
                        tracing::warn!(player = player_id, error = %e, "rollback failed");
                    }
                    return TurnExecutionResult::failed(results, failure, elapsed_ms(start));
                }
            }
        }

        if let Err(e) = txn.commit().await {
            self.compensate(&swaps);
            return TurnExecutionResult::failed(
                results,
                format!("commit failed: {e}"),
                elapsed_ms(start),
            );
        }

        self.bus.emit(
            game_id,
            BotEvent::TurnComplete,
            json!({ "playerId": player_id, "success": true }),
        );
        TurnExecutionResult::succeeded(results, elapsed_ms(start))
    }
}

pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn stringify(e: impl std::fmt::Display) -> String {
    e.to_string()
}

fn decode_cash(row: &PlayerRow) -> u64 {
    row.money.as_ref().and_then(decode_column::<u64>).unwrap_or(50)
}

fn decode_loads(row: &PlayerRow) -> Vec<String> {
    row.loads
        .as_ref()
        .and_then(decode_column::<Vec<String>>)
        .unwrap_or_default()
}

fn decode_hand(row: &PlayerRow) -> Vec<DemandCard> {
    row.hand
        .as_ref()
        .and_then(decode_column::<Vec<DemandCard>>)
        .unwrap_or_default()
}

fn decode_train_class(row: &PlayerRow) -> TrainClass {
    row.train_class
        .as_deref()
        .and_then(|raw| TrainClass::from_str(raw).ok())
        .unwrap_or_default()
}
