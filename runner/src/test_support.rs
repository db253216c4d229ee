//! Scripted collaborators for exercising the search without a game server
//! or an LLM.
//!
//! Unless a delay is configured, none of these fakes yield to the runtime,
//! so concurrent simulations driven by `join_all` run to completion in
//! dispatch order and scripts are consumed deterministically.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::agent::{Agent, CompletionResult, LastResponse, Policy};
use crate::environment::{Environment, Task};
use crate::evaluator::{Evaluator, TaskResponse};
use crate::program::{Conversation, GameState, Program, TokenUsage};
use crate::sampler::Sampler;
use crate::storage::{InMemoryProgramStore, ProgramStore};

/// One scripted agent reply.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentStep {
    Code(String),
    Fail,
}

/// Agent that replays a script, then falls back to `step_<n>` programs.
pub struct ScriptedAgent {
    system_prompt: String,
    script: Mutex<VecDeque<AgentStep>>,
    calls: AtomicUsize,
    fail_end: bool,
    conversations: Mutex<Vec<Conversation>>,
    last_responses: Mutex<Vec<Option<LastResponse>>>,
    completions: Mutex<Vec<CompletionResult>>,
}

impl ScriptedAgent {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            fail_end: false,
            conversations: Mutex::new(Vec::new()),
            last_responses: Mutex::new(Vec::new()),
            completions: Mutex::new(Vec::new()),
        }
    }

    pub fn with_script(self, steps: Vec<AgentStep>) -> Self {
        *self.script.lock().unwrap() = steps.into();
        self
    }

    /// Make every `end` call return an error.
    pub fn failing_end(mut self) -> Self {
        self.fail_end = true;
        self
    }

    /// Number of `step` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.conversations.lock().unwrap().clone()
    }

    pub fn last_responses(&self) -> Vec<Option<LastResponse>> {
        self.last_responses.lock().unwrap().clone()
    }

    pub fn completions(&self) -> Vec<CompletionResult> {
        self.completions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn system_prompt(&self) -> String {
        self.system_prompt.clone()
    }

    async fn step(
        &self,
        conversation: &Conversation,
        last_response: Option<&LastResponse>,
        _environment: &dyn Environment,
    ) -> Result<Policy> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.conversations.lock().unwrap().push(conversation.clone());
        self.last_responses
            .lock()
            .unwrap()
            .push(last_response.cloned());

        let next = self.script.lock().unwrap().pop_front();
        let code = match next {
            Some(AgentStep::Code(code)) => code,
            Some(AgentStep::Fail) => bail!("LLM request {} failed", call),
            None => format!("step_{}", call),
        };

        Ok(Policy {
            code,
            meta: TokenUsage {
                input_tokens: 100,
                output_tokens: 20,
                total_tokens: 120,
            },
        })
    }

    async fn end(&self, _conversation: &Conversation, completion: CompletionResult) -> Result<()> {
        if self.fail_end {
            bail!("Failed to record completion");
        }
        self.completions.lock().unwrap().push(completion);
        Ok(())
    }
}

/// Environment that records every reset.
pub struct FakeEnvironment {
    observation: String,
    state: Option<GameState>,
    resets: Arc<Mutex<Vec<GameState>>>,
    fail_reset: bool,
    fail_observe: bool,
    reset_delay: Option<Duration>,
}

impl FakeEnvironment {
    pub fn new(observation: impl Into<String>) -> Self {
        Self {
            observation: observation.into(),
            state: None,
            resets: Arc::new(Mutex::new(Vec::new())),
            fail_reset: false,
            fail_observe: false,
            reset_delay: None,
        }
    }

    /// Sleep for `delay` on every reset, like a game server loading a save.
    pub fn with_reset_delay(mut self, delay: Duration) -> Self {
        self.reset_delay = Some(delay);
        self
    }

    pub fn failing_reset(mut self) -> Self {
        self.fail_reset = true;
        self
    }

    pub fn failing_observe(mut self) -> Self {
        self.fail_observe = true;
        self
    }

    /// Shared handle to the reset history; stays readable after the
    /// environment moves into a worker.
    pub fn reset_log(&self) -> Arc<Mutex<Vec<GameState>>> {
        Arc::clone(&self.resets)
    }

    pub fn current_state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }
}

#[async_trait]
impl Environment for FakeEnvironment {
    async fn reset(&mut self, state: &GameState) -> Result<()> {
        if let Some(delay) = self.reset_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reset {
            bail!("Game server unreachable");
        }
        self.resets.lock().unwrap().push(state.clone());
        self.state = Some(state.clone());
        Ok(())
    }

    async fn observe(&self) -> Result<String> {
        if self.fail_observe {
            bail!("Observation timed out");
        }
        Ok(self.observation.clone())
    }
}

/// One scripted evaluation result.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalStep {
    /// Score the program; task not complete
    Reward(f64),
    /// Score the program and report task success
    Complete(f64),
    /// Return an evaluation error
    Fail(String),
    /// Panic inside the evaluation future
    Panic,
}

/// Evaluator that replays a script in call order, then rewards 0.0.
pub struct ScriptedEvaluator {
    script: Mutex<VecDeque<EvalStep>>,
    calls: AtomicUsize,
}

impl ScriptedEvaluator {
    pub fn new(script: Vec<EvalStep>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Evaluator for ScriptedEvaluator {
    async fn evaluate(
        &self,
        _environment: &mut dyn Environment,
        mut program: Program,
        _start_state: &GameState,
        _task: &Task,
    ) -> Result<(Program, TaskResponse)> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let (value, success) = match next {
            Some(EvalStep::Reward(value)) => (value, false),
            Some(EvalStep::Complete(value)) => (value, true),
            Some(EvalStep::Fail(message)) => bail!(message),
            Some(EvalStep::Panic) => panic!("evaluator crashed on {}", program.code),
            None => (0.0, false),
        };

        program.value = value;
        program.state = Some(GameState::new(format!("after:{}", program.code)));
        program.response = Some(format!("executed {}", program.code));
        program
            .achievements
            .dynamic
            .insert("iron-ore".into(), value.max(0.0));

        let response = if success {
            TaskResponse::success()
        } else {
            TaskResponse::incomplete()
        };
        Ok((program, response))
    }
}

/// Store whose writes fail on selected calls and delegate otherwise.
pub struct FailingStore {
    inner: InMemoryProgramStore,
    fail_on: Option<HashSet<usize>>,
    calls: AtomicUsize,
}

impl FailingStore {
    /// Every write fails.
    pub fn new() -> Self {
        Self {
            inner: InMemoryProgramStore::new(),
            fail_on: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Only the listed writes (0-based call index) fail.
    pub fn failing_calls(calls: impl IntoIterator<Item = usize>) -> Self {
        Self {
            inner: InMemoryProgramStore::new(),
            fail_on: Some(calls.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Programs that were written successfully
    pub fn programs(&self) -> Vec<Program> {
        self.inner.programs().unwrap()
    }
}

impl Default for FailingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgramStore for FailingStore {
    async fn create_program(&self, program: Program) -> Result<Program> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let fails = self
            .fail_on
            .as_ref()
            .map_or(true, |calls| calls.contains(&call));
        if fails {
            return Err(anyhow!("Disk full"));
        }
        self.inner.create_program(program).await
    }

    async fn get_program(&self, id: i64) -> Result<Option<Program>> {
        self.inner.get_program(id).await
    }

    async fn best_program(&self, version: u32) -> Result<Option<Program>> {
        self.inner.best_program(version).await
    }

    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }
}

/// Sampler that cannot reach its backing store.
pub struct UnavailableSampler;

#[async_trait]
impl Sampler for UnavailableSampler {
    async fn sample_parent(&self, _version: u32) -> Result<Option<Program>> {
        bail!("Sampler backend unavailable")
    }

    async fn visit(&self, _program_id: i64) -> Result<()> {
        bail!("Sampler backend unavailable")
    }
}
