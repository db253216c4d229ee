//! Agent interface: the LLM that writes the next program.

use anyhow::Result;
use async_trait::async_trait;

use crate::environment::Environment;
use crate::program::{Achievements, Conversation, Program, TokenUsage};

/// Code proposed by the agent for the next step.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    pub code: String,
    pub meta: TokenUsage,
}

/// What the previous step produced, handed back to the agent for continuity.
#[derive(Debug, Clone, PartialEq)]
pub struct LastResponse {
    pub code: String,
    pub response: Option<String>,
    pub value: f64,
    pub achievements: Achievements,
    pub step: u32,
    pub created_at: u64,
}

impl LastResponse {
    pub fn from_program(program: &Program) -> Self {
        Self {
            code: program.code.clone(),
            response: program.response.clone(),
            value: program.value,
            achievements: program.achievements.clone(),
            step: program.depth,
            created_at: program.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    Success,
}

/// Passed to `Agent::end` once a trajectory completes its task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionResult {
    pub step: u32,
    pub reason: CompletionReason,
}

/// Produces programs from a conversation.
///
/// Implementations own their own retry and timeout policy; a returned error
/// is treated as a failed generation and the simulation is abandoned.
#[async_trait]
pub trait Agent: Send + Sync {
    /// System prompt that opens a fresh conversation.
    fn system_prompt(&self) -> String;

    /// Generate the next policy.
    async fn step(
        &self,
        conversation: &Conversation,
        last_response: Option<&LastResponse>,
        environment: &dyn Environment,
    ) -> Result<Policy>;

    /// Called once when a trajectory completes the task.
    async fn end(&self, conversation: &Conversation, completion: CompletionResult) -> Result<()>;
}
