//! Evaluator interface: runs generated code and scores it.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::environment::{Environment, Task};
use crate::program::{GameState, Program};

/// Task verdict for one evaluated program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskResponse {
    pub success: bool,
    /// Free-form details from the task checker
    pub meta: Value,
}

impl TaskResponse {
    pub fn success() -> Self {
        Self {
            success: true,
            meta: Value::Null,
        }
    }

    pub fn incomplete() -> Self {
        Self::default()
    }
}

/// Runs a program against an environment.
///
/// The returned program must carry `value`, `state`, `achievements` and
/// `response`. Every other field is passed through unchanged.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(
        &self,
        environment: &mut dyn Environment,
        program: Program,
        start_state: &GameState,
        task: &Task,
    ) -> Result<(Program, TaskResponse)>;
}
