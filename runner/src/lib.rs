//! Batched Monte Carlo tree search over agent-written Factorio programs.
//!
//! The runner drives an [`mcts::MctsTree`] whose nodes hold [`Program`]s.
//! Every iteration selects a batch of nodes, lets a pool of [`Worker`]s
//! extend each one with a freshly generated and evaluated program, and
//! integrates the results back into the tree and the [`ProgramStore`].
//!
//! The LLM, the game server and the task checker stay outside this crate:
//! callers plug them in through the [`Agent`], [`Environment`] and
//! [`Evaluator`] traits.
//!
//! # Usage
//!
//! ```rust,ignore
//! use mcts_runner::{BestValueSampler, Controller, RunnerConfig, Worker};
//! use mcts_runner::storage::create_program_store;
//!
//! let config = RunnerConfig::load()?;
//! let store: Arc<dyn ProgramStore> = Arc::from(create_program_store(&config.storage)?);
//! let sampler = Arc::new(BestValueSampler::new(store.clone()));
//!
//! let workers = environments
//!     .into_iter()
//!     .enumerate()
//!     .map(|(id, env)| Worker::new(id, agent.clone(), evaluator.clone(), env, task.clone()))
//!     .collect();
//!
//! let mut controller = Controller::new(&config, workers, store, sampler).await?;
//! let summary = controller.run().await;
//! ```

pub mod agent;
pub mod config;
pub mod controller;
pub mod environment;
pub mod evaluator;
pub mod logging;
pub mod metrics;
pub mod program;
pub mod progress;
pub mod sampler;
pub mod storage;
pub mod worker;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use agent::{Agent, CompletionReason, CompletionResult, LastResponse, Policy};
pub use config::RunnerConfig;
pub use controller::{Controller, IterationReport, RunSummary};
pub use environment::{Environment, Task};
pub use evaluator::{Evaluator, TaskResponse};
pub use program::{Achievements, Conversation, GameState, Message, Program, Role, TokenUsage};
pub use sampler::{BestValueSampler, Sampler};
pub use storage::ProgramStore;
pub use worker::{SimulationError, SimulationOutcome, Worker};
