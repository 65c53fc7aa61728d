//! Fire-and-forget notification bus for bot lifecycle events.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

/// Bot lifecycle events carried over the notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BotEvent {
    Thinking,
    Action,
    TurnComplete,
}

impl BotEvent {
    /// Wire name used by downstream transports.
    pub const fn event_name(self) -> &'static str {
        match self {
            BotEvent::Thinking => "ai:thinking",
            BotEvent::Action => "ai:action",
            BotEvent::TurnComplete => "ai:turnComplete",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub game_id: String,
    pub event: BotEvent,
    pub payload: Value,
}

/// Best-effort broadcast channel. Emission never blocks and never fails the
/// pipeline: a turn proceeds identically whether or not anyone is listening.
pub struct NotificationBus {
    tx: broadcast::Sender<Notification>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn emit(&self, game_id: &str, event: BotEvent, payload: Value) {
        let notification = Notification {
            game_id: game_id.to_string(),
            event,
            payload,
        };
        if self.tx.send(notification).is_err() {
            // No subscribers - this is normal, not an error
            tracing::trace!("no subscribers for {}", event.event_name());
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Clone for NotificationBus {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_emitted_events() {
        let bus = NotificationBus::new();
        let mut rx = bus.subscribe();

        bus.emit("g1", BotEvent::Thinking, serde_json::json!({ "playerId": "bot" }));

        let notification = rx.recv().await.unwrap();
        assert_eq!(notification.game_id, "g1");
        assert_eq!(notification.event.event_name(), "ai:thinking");
    }

    #[test]
    fn emit_without_subscribers_is_a_no_op() {
        let bus = NotificationBus::new();
        bus.emit("g1", BotEvent::TurnComplete, Value::Null);
    }
}
