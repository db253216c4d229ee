//! Game environment and task definitions.
//!
//! An `Environment` is one live game connection. Each worker owns exactly
//! one for the whole run and never shares it with another in-flight call.

use anyhow::Result;
use async_trait::async_trait;

use crate::program::GameState;

/// One live game instance the search can reset and inspect.
#[async_trait]
pub trait Environment: Send + Sync {
    /// Restore the game to `state`.
    async fn reset(&mut self, state: &GameState) -> Result<()>;

    /// Canonical observation of the current state, used as the first user
    /// turn of a fresh conversation.
    async fn observe(&self) -> Result<String>;
}

/// The objective being searched for.
#[derive(Debug, Clone)]
pub struct Task {
    /// Short identifier (e.g. "iron_gear_wheel_throughput")
    pub key: String,
    pub goal_description: String,
    /// Where every simulation without a parent state starts
    pub starting_game_state: GameState,
}

impl Task {
    pub fn new(
        key: impl Into<String>,
        goal_description: impl Into<String>,
        starting_game_state: GameState,
    ) -> Self {
        Self {
            key: key.into(),
            goal_description: goal_description.into(),
            starting_game_state,
        }
    }
}
