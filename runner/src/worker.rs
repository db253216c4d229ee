//! Simulation worker.
//!
//! A worker owns one game environment for its whole lifetime and turns a
//! parent program into one evaluated child program. `simulate` never fails:
//! every error is logged, counted, and reported as an empty outcome so the
//! controller can keep going.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::agent::{Agent, CompletionReason, CompletionResult, LastResponse};
use crate::environment::{Environment, Task};
use crate::evaluator::Evaluator;
use crate::metrics;
use crate::program::{Conversation, Message, Program};

/// Hard failures inside one simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Environment reset failed: {0:#}")]
    Reset(anyhow::Error),

    #[error("Environment observation failed: {0:#}")]
    Observe(anyhow::Error),

    #[error("Evaluation failed: {0:#}")]
    Evaluation(anyhow::Error),

    #[error("Completion callback failed: {0:#}")]
    Completion(anyhow::Error),
}

impl SimulationError {
    /// Label used for the failure metric
    pub fn reason(&self) -> &'static str {
        match self {
            SimulationError::Reset(_) => "reset",
            SimulationError::Observe(_) => "observe",
            SimulationError::Evaluation(_) => "evaluation",
            SimulationError::Completion(_) => "completion",
        }
    }
}

/// Result of one simulation: the reward and the program that earned it.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub value: f64,
    pub program: Option<Program>,
}

impl SimulationOutcome {
    /// Outcome of a simulation that produced nothing.
    pub fn failed() -> Self {
        Self {
            value: 0.0,
            program: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.program.is_none()
    }
}

pub struct Worker {
    id: usize,
    agent: Arc<dyn Agent>,
    evaluator: Arc<dyn Evaluator>,
    environment: Box<dyn Environment>,
    task: Arc<Task>,
}

impl Worker {
    pub fn new(
        id: usize,
        agent: Arc<dyn Agent>,
        evaluator: Arc<dyn Evaluator>,
        environment: Box<dyn Environment>,
        task: Arc<Task>,
    ) -> Self {
        Self {
            id,
            agent,
            evaluator,
            environment,
            task,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Expand `parent` by one agent step and evaluate the result.
    ///
    /// `parent` is `None` when the node being expanded is an empty root.
    pub async fn simulate(&mut self, parent: Option<&Program>) -> SimulationOutcome {
        metrics::SIMULATIONS_TOTAL.inc();

        match self.try_simulate(parent).await {
            Ok(Some(program)) => {
                debug!(
                    worker = self.id,
                    value = program.value,
                    depth = program.depth,
                    "Simulation complete"
                );
                SimulationOutcome {
                    value: program.value,
                    program: Some(program),
                }
            }
            Ok(None) => {
                metrics::record_failure("generation");
                SimulationOutcome::failed()
            }
            Err(e) => {
                error!(worker = self.id, reason = e.reason(), error = %e, "Simulation failed");
                metrics::record_failure(e.reason());
                SimulationOutcome::failed()
            }
        }
    }

    /// Returns `Ok(None)` when the agent could not produce a policy.
    async fn try_simulate(
        &mut self,
        parent: Option<&Program>,
    ) -> Result<Option<Program>, SimulationError> {
        let start_state = parent
            .and_then(|p| p.state.clone())
            .unwrap_or_else(|| self.task.starting_game_state.clone());

        self.environment
            .reset(&start_state)
            .await
            .map_err(SimulationError::Reset)?;

        let conversation = match parent {
            Some(p) if !p.conversation.is_empty() => p.conversation.clone(),
            _ => {
                let observation = self
                    .environment
                    .observe()
                    .await
                    .map_err(SimulationError::Observe)?;
                Conversation::new(vec![
                    Message::system(self.agent.system_prompt()),
                    Message::user(observation),
                ])
            }
        };

        let last_response = parent.map(LastResponse::from_program);

        let policy = match self
            .agent
            .step(&conversation, last_response.as_ref(), &*self.environment)
            .await
        {
            Ok(policy) => policy,
            Err(e) => {
                warn!(worker = self.id, error = %e, "Policy generation failed");
                return Ok(None);
            }
        };

        let candidate = Program::new(
            policy.code.clone(),
            conversation.with(Message::assistant(policy.code)),
        )
        .child_of(parent)
        .with_token_usage(policy.meta);

        let (mut program, task_response) = self
            .evaluator
            .evaluate(&mut *self.environment, candidate, &start_state, &self.task)
            .await
            .map_err(SimulationError::Evaluation)?;

        if let Some(response) = &program.response {
            program.conversation.push(Message::user(response.clone()));
        }

        if task_response.success {
            info!(
                worker = self.id,
                task = %self.task.key,
                depth = program.depth,
                value = program.value,
                "Task completed"
            );
            self.agent
                .end(
                    &program.conversation,
                    CompletionResult {
                        step: program.depth,
                        reason: CompletionReason::Success,
                    },
                )
                .await
                .map_err(SimulationError::Completion)?;
        }

        Ok(Some(program))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{GameState, Role};
    use crate::test_support::{AgentStep, EvalStep, FakeEnvironment, ScriptedAgent, ScriptedEvaluator};

    fn task() -> Arc<Task> {
        Arc::new(Task::new(
            "iron_ore_throughput",
            "Build an iron ore mine",
            GameState::new("start"),
        ))
    }

    fn worker(
        agent: Arc<ScriptedAgent>,
        evaluator: Arc<ScriptedEvaluator>,
        environment: FakeEnvironment,
    ) -> Worker {
        Worker::new(0, agent, evaluator, Box::new(environment), task())
    }

    #[tokio::test]
    async fn test_root_simulation_builds_fresh_conversation() {
        let agent = Arc::new(ScriptedAgent::new("You write Factorio programs."));
        let evaluator = Arc::new(ScriptedEvaluator::new(vec![EvalStep::Reward(2.5)]));
        let environment = FakeEnvironment::new("Inventory: {}");
        let resets = environment.reset_log();
        let mut worker = worker(agent.clone(), evaluator, environment);

        let outcome = worker.simulate(None).await;

        assert_eq!(outcome.value, 2.5);
        let program = outcome.program.unwrap();
        assert_eq!(program.depth, 1);
        assert_eq!(program.parent_id, None);
        assert_eq!(program.code, "step_0");

        let roles: Vec<Role> = program.conversation.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(program.conversation.messages[1].content, "Inventory: {}");
        assert_eq!(program.conversation.messages[2].content, "step_0");

        assert_eq!(resets.lock().unwrap().as_slice(), &[GameState::new("start")]);
        assert_eq!(agent.last_responses(), vec![None]);
    }

    #[tokio::test]
    async fn test_child_simulation_continues_parent() {
        let agent = Arc::new(ScriptedAgent::new("prompt"));
        let evaluator = Arc::new(ScriptedEvaluator::new(vec![EvalStep::Reward(1.0)]));
        let environment = FakeEnvironment::new("unused");
        let resets = environment.reset_log();
        let mut worker = worker(agent.clone(), evaluator, environment);

        let mut parent = Program::new(
            "harvest()",
            Conversation::new(vec![
                Message::system("prompt"),
                Message::user("obs"),
                Message::assistant("harvest()"),
            ]),
        );
        parent.id = Some(12);
        parent.depth = 3;
        parent.state = Some(GameState::new("after-harvest"));

        let program = worker.simulate(Some(&parent)).await.program.unwrap();

        assert_eq!(program.depth, 4);
        assert_eq!(program.parent_id, Some(12));
        assert_eq!(program.conversation.messages[..3], parent.conversation.messages[..]);
        assert_eq!(
            resets.lock().unwrap().as_slice(),
            &[GameState::new("after-harvest")]
        );

        let last = agent.last_responses().pop().flatten().unwrap();
        assert_eq!(last.code, "harvest()");
        assert_eq!(last.step, 3);
    }

    #[tokio::test]
    async fn test_generation_failure_is_soft() {
        let agent = Arc::new(ScriptedAgent::new("prompt").with_script(vec![AgentStep::Fail]));
        let evaluator = Arc::new(ScriptedEvaluator::new(vec![]));
        let mut worker = worker(agent, evaluator.clone(), FakeEnvironment::new("obs"));

        let outcome = worker.simulate(None).await;

        assert!(outcome.is_failed());
        assert_eq!(outcome.value, 0.0);
        assert_eq!(evaluator.calls(), 0);
    }

    #[tokio::test]
    async fn test_reset_failure() {
        let agent = Arc::new(ScriptedAgent::new("prompt"));
        let evaluator = Arc::new(ScriptedEvaluator::new(vec![]));
        let mut worker = worker(
            agent.clone(),
            evaluator,
            FakeEnvironment::new("obs").failing_reset(),
        );

        assert_eq!(worker.simulate(None).await, SimulationOutcome::failed());
        assert_eq!(agent.calls(), 0);
    }

    #[tokio::test]
    async fn test_observe_failure() {
        let agent = Arc::new(ScriptedAgent::new("prompt"));
        let evaluator = Arc::new(ScriptedEvaluator::new(vec![]));
        let mut worker = worker(
            agent.clone(),
            evaluator,
            FakeEnvironment::new("obs").failing_observe(),
        );

        assert!(worker.simulate(None).await.is_failed());
        assert_eq!(agent.calls(), 0);
    }

    #[tokio::test]
    async fn test_evaluation_failure() {
        let agent = Arc::new(ScriptedAgent::new("prompt"));
        let evaluator = Arc::new(ScriptedEvaluator::new(vec![EvalStep::Fail(
            "server timeout".into(),
        )]));
        let mut worker = worker(agent, evaluator, FakeEnvironment::new("obs"));

        assert!(worker.simulate(None).await.is_failed());
    }

    #[tokio::test]
    async fn test_success_notifies_agent() {
        let agent = Arc::new(ScriptedAgent::new("prompt"));
        let evaluator = Arc::new(ScriptedEvaluator::new(vec![EvalStep::Complete(10.0)]));
        let mut worker = worker(agent.clone(), evaluator, FakeEnvironment::new("obs"));

        let outcome = worker.simulate(None).await;

        assert_eq!(outcome.value, 10.0);
        assert_eq!(
            agent.completions(),
            vec![CompletionResult {
                step: 1,
                reason: CompletionReason::Success,
            }]
        );
    }

    #[tokio::test]
    async fn test_completion_failure() {
        let agent = Arc::new(ScriptedAgent::new("prompt").failing_end());
        let evaluator = Arc::new(ScriptedEvaluator::new(vec![EvalStep::Complete(10.0)]));
        let mut worker = worker(agent, evaluator, FakeEnvironment::new("obs"));

        assert!(worker.simulate(None).await.is_failed());
    }

    #[test]
    fn test_error_reasons() {
        let err = SimulationError::Evaluation(anyhow::anyhow!("boom"));
        assert_eq!(err.reason(), "evaluation");
        assert_eq!(err.to_string(), "Evaluation failed: boom");
    }
}
