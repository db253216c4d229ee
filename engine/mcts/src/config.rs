//! MCTS configuration parameters.

/// Configuration for the batched program search.
#[derive(Debug, Clone, PartialEq)]
pub struct MctsConfig {
    /// Number of select/dispatch/integrate iterations to run.
    pub max_iterations: u32,

    /// Exploration constant for the UCT formula.
    /// Higher values encourage exploration, lower values favor exploitation.
    /// sqrt(2) ~ 1.41 is the classical choice.
    pub exploration_weight: f64,

    /// Nodes selected per iteration (capped by `num_workers`).
    pub batch_size: usize,

    /// Size of the worker pool. Each worker owns one environment.
    pub num_workers: usize,

    /// Depth hint forwarded to callers. The tree itself does not cap depth.
    pub max_depth: u32,

    /// Log a progress report every N iterations.
    pub report_interval: u32,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            exploration_weight: 1.41,
            batch_size: 4,
            num_workers: 4,
            max_depth: 16,
            report_interval: 10,
        }
    }
}

impl MctsConfig {
    /// Create a small config for testing: one worker, one selection per iteration.
    pub fn for_testing() -> Self {
        Self {
            max_iterations: 1,
            exploration_weight: 1.41,
            batch_size: 1,
            num_workers: 1,
            max_depth: 16,
            report_interval: 10,
        }
    }

    /// Number of nodes selected (and simulations dispatched) per iteration.
    #[inline]
    pub fn selections_per_iteration(&self) -> usize {
        self.batch_size.min(self.num_workers)
    }

    /// Builder pattern: set the iteration budget.
    pub fn with_iterations(mut self, n: u32) -> Self {
        self.max_iterations = n;
        self
    }

    /// Builder pattern: set the UCT exploration weight.
    pub fn with_exploration_weight(mut self, w: f64) -> Self {
        self.exploration_weight = w;
        self
    }

    /// Builder pattern: set the batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Builder pattern: set the worker pool size.
    pub fn with_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_report_interval(mut self, n: u32) -> Self {
        self.report_interval = n;
        self
    }
}
