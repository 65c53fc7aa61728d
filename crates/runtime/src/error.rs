//! Unified error types surfaced by the strategy engine.
//!
//! Only fatal lookup failures propagate to callers; rejected plans and
//! exhausted retries are handled inside the engine and recorded in the audit.

use thiserror::Error;

pub use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("game {0} not found")]
    GameNotFound(String),

    #[error("AI player {0} not found")]
    PlayerNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
