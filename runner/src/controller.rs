//! Batched MCTS controller.
//!
//! Each iteration runs four phases in order:
//!
//! 1. **SELECT**: pick `min(batch_size, num_workers)` nodes with UCT, marking
//!    each pending so the batch spreads out
//! 2. **DISPATCH**: simulate every selected node concurrently, one worker per
//!    node
//! 3. **INTEGRATE**: release each node, persist the produced program, add it
//!    as a child and backpropagate its value
//! 4. **REPORT**: periodic progress logging
//!
//! SELECT finishes on `&mut MctsTree` before any simulation future exists, so
//! no simulation observes a partially selected batch. The tree is only ever
//! touched from the controller, so it needs no locking.

use futures::future::join_all;
use futures::FutureExt;
use indicatif::ProgressBar;
use mcts::{MctsConfig, MctsTree, NodeId, NodePayload, TreeStats};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::RunnerConfig;
use crate::metrics;
use crate::program::Program;
use crate::progress::{format_duration, progress_bar, IterationClock};
use crate::sampler::Sampler;
use crate::storage::ProgramStore;
use crate::worker::{SimulationOutcome, Worker};

/// What one iteration did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IterationReport {
    /// Nodes selected and dispatched
    pub selected: usize,
    /// Programs persisted and added to the tree
    pub integrated: usize,
    /// Simulations that panicked, produced nothing, or failed to persist
    pub failed: usize,
}

/// Final state of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub iterations: u32,
    pub tree: TreeStats,
    /// Average value of the best root child
    pub best_value: Option<f64>,
    pub successful_simulations: u64,
    pub failed_simulations: u64,
    pub elapsed: Duration,
}

pub struct Controller {
    config: MctsConfig,
    version: u32,
    version_description: String,
    workers: Vec<Worker>,
    store: Arc<dyn ProgramStore>,
    sampler: Arc<dyn Sampler>,
    tree: MctsTree<Program>,
    successful_simulations: u64,
    failed_simulations: u64,
}

impl Controller {
    /// Validate the worker pool and build the root from the sampler.
    ///
    /// A sampler that returns nothing (or fails) yields an empty root.
    pub async fn new(
        config: &RunnerConfig,
        workers: Vec<Worker>,
        store: Arc<dyn ProgramStore>,
        sampler: Arc<dyn Sampler>,
    ) -> anyhow::Result<Self> {
        config.validate()?;

        if workers.is_empty() {
            anyhow::bail!("worker pool cannot be empty");
        }
        if workers.len() != config.mcts.num_workers {
            anyhow::bail!(
                "worker pool has {} workers but num_workers is {}",
                workers.len(),
                config.mcts.num_workers
            );
        }

        let root = match sampler.sample_parent(config.version).await {
            Ok(Some(program)) => {
                info!(
                    parent_id = ?program.id,
                    value = program.value,
                    depth = program.depth,
                    "Resuming search from sampled program"
                );
                NodePayload::Expanded(program)
            }
            Ok(None) => {
                info!(version = config.version, "No parent program, starting from empty root");
                NodePayload::Root
            }
            Err(e) => {
                warn!(error = %e, "Sampler unavailable, starting from empty root");
                NodePayload::Root
            }
        };

        Ok(Self {
            config: config.mcts.clone(),
            version: config.version,
            version_description: config.version_description.clone(),
            workers,
            store,
            sampler,
            tree: MctsTree::new(root),
            successful_simulations: 0,
            failed_simulations: 0,
        })
    }

    pub fn tree(&self) -> &MctsTree<Program> {
        &self.tree
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Program held by the best root child, if any.
    pub fn best_program(&self) -> Option<&Program> {
        self.tree
            .best_child()
            .and_then(|id| self.tree.get(id).program())
    }

    /// Run every iteration and summarize the result.
    pub async fn run(&mut self) -> RunSummary {
        let total = self.config.max_iterations;
        let mut clock = IterationClock::start(total);
        let progress = progress_bar(total);

        info!(
            iterations = total,
            batch_size = self.config.selections_per_iteration(),
            workers = self.workers.len(),
            exploration_weight = self.config.exploration_weight,
            version = self.version,
            "Starting search"
        );

        for iteration in 0..total {
            let started = Instant::now();
            let report = self.run_iteration(iteration).await;
            let duration = started.elapsed();

            clock.record(duration);
            metrics::ITERATION_DURATION.observe(duration.as_secs_f64());
            debug!(
                iteration,
                selected = report.selected,
                integrated = report.integrated,
                failed = report.failed,
                duration_ms = duration.as_millis() as u64,
                "Iteration complete"
            );

            if let Some(ref pb) = progress {
                pb.inc(1);
            }

            if (iteration + 1) % self.config.report_interval == 0 {
                self.report(&clock, progress.as_ref());
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        let tree = self.tree.stats();
        let summary = RunSummary {
            iterations: clock.completed(),
            best_value: tree.best_child_value,
            tree,
            successful_simulations: self.successful_simulations,
            failed_simulations: self.failed_simulations,
            elapsed: clock.elapsed(),
        };

        info!(
            iterations = summary.iterations,
            nodes = summary.tree.total_nodes,
            max_depth = summary.tree.max_depth,
            best_value = ?summary.best_value,
            successful = summary.successful_simulations,
            failed = summary.failed_simulations,
            elapsed = %format_duration(summary.elapsed),
            "Search finished"
        );

        summary
    }

    /// One SELECT, DISPATCH, INTEGRATE pass.
    pub async fn run_iteration(&mut self, iteration: u32) -> IterationReport {
        let selected = self.tree.select_batch(
            self.config.selections_per_iteration(),
            self.config.exploration_weight,
        );

        let parents: Vec<Option<Program>> = selected
            .iter()
            .map(|&id| self.tree.get(id).program().cloned())
            .collect();

        // The batch never exceeds the pool, so node i goes to worker i
        let worker_ids: Vec<usize> = self.workers.iter().map(Worker::id).collect();
        let simulations = self
            .workers
            .iter_mut()
            .zip(parents.iter())
            .map(|(worker, parent)| AssertUnwindSafe(worker.simulate(parent.as_ref())).catch_unwind());
        let results = join_all(simulations).await;

        let mut report = IterationReport {
            selected: selected.len(),
            ..Default::default()
        };

        for ((node, result), worker) in selected.into_iter().zip(results).zip(worker_ids) {
            self.tree.release(node);

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(panic) => {
                    error!(
                        iteration,
                        worker,
                        node = node.index(),
                        panic = %panic_message(&*panic),
                        "Simulation panicked"
                    );
                    metrics::record_failure("panic");
                    report.failed += 1;
                    continue;
                }
            };

            if self.integrate(iteration, node, outcome).await {
                report.integrated += 1;
            } else {
                report.failed += 1;
            }
        }

        self.successful_simulations += report.integrated as u64;
        self.failed_simulations += report.failed as u64;

        metrics::TREE_NODES.set(self.tree.len() as i64);
        if let Some(best) = self.tree.best_child() {
            metrics::BEST_VALUE.set(self.tree.get(best).mean_value());
        }

        report
    }

    /// Persist and attach one outcome below `node`. Returns false if the
    /// tree was left untouched.
    async fn integrate(&mut self, iteration: u32, node: NodeId, outcome: SimulationOutcome) -> bool {
        let value = outcome.value;
        let Some(mut program) = outcome.program else {
            return false;
        };

        program.version = self.version;
        program.version_description = self.version_description.clone();

        let program = match self.store.create_program(program).await {
            Ok(program) => program,
            Err(e) => {
                error!(iteration, node = node.index(), error = %e, "Failed to persist program");
                metrics::record_failure("persist");
                return false;
            }
        };

        let program_id = program.id;
        let child = self.tree.add_child(node, program);
        self.tree.backpropagate(child, value);
        metrics::NODES_INTEGRATED.inc();

        debug!(
            iteration,
            parent = node.index(),
            child = child.index(),
            program_id = ?program_id,
            value,
            "Integrated program"
        );

        if let Some(parent_id) = self.tree.get(node).program().and_then(|p| p.id) {
            if let Err(e) = self.sampler.visit(parent_id).await {
                warn!(parent_id, error = %e, "Sampler visit failed");
            }
        }

        true
    }

    fn report(&self, clock: &IterationClock, progress: Option<&ProgressBar>) {
        let stats = self.tree.stats();
        let best_value = stats
            .best_child_value
            .map(|v| format!("{:.3}", v))
            .unwrap_or_else(|| "n/a".into());
        let eta = clock
            .eta()
            .map(format_duration)
            .unwrap_or_else(|| "unknown".into());

        let log = || {
            info!(
                iteration = clock.completed(),
                total = self.config.max_iterations,
                best_value = %best_value,
                nodes = stats.total_nodes,
                elapsed = %format_duration(clock.elapsed()),
                eta = %eta,
                "Search progress"
            )
        };

        // Suspend progress bar while logging to avoid visual glitches
        match progress {
            Some(pb) => pb.suspend(log),
            None => log(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
