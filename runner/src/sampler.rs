//! Parent sampling for the search root.
//!
//! The sampler decides which persisted program a run continues from. The
//! controller asks it once when the tree is built and reports back every
//! time a child is integrated below a persisted program.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::program::Program;
use crate::storage::ProgramStore;

#[async_trait]
pub trait Sampler: Send + Sync {
    /// Program to resume from, or `None` to start from an empty root.
    async fn sample_parent(&self, version: u32) -> Result<Option<Program>>;

    /// Record that a child was integrated below `program_id`.
    async fn visit(&self, program_id: i64) -> Result<()>;
}

/// Resumes from the best-scoring program of the current version.
pub struct BestValueSampler {
    store: Arc<dyn ProgramStore>,
    visits: Mutex<HashMap<i64, u32>>,
}

impl BestValueSampler {
    pub fn new(store: Arc<dyn ProgramStore>) -> Self {
        Self {
            store,
            visits: Mutex::new(HashMap::new()),
        }
    }

    /// Visits recorded for `program_id` so far (0 if never visited).
    pub fn visit_count(&self, program_id: i64) -> u32 {
        self.visits
            .lock()
            .map(|visits| visits.get(&program_id).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl Sampler for BestValueSampler {
    async fn sample_parent(&self, version: u32) -> Result<Option<Program>> {
        let parent = self.store.best_program(version).await?;
        debug!(
            version,
            parent_id = ?parent.as_ref().and_then(|p| p.id),
            "Sampled parent"
        );
        Ok(parent)
    }

    async fn visit(&self, program_id: i64) -> Result<()> {
        let mut visits = self
            .visits
            .lock()
            .map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        *visits.entry(program_id).or_insert(0) += 1;
        Ok(())
    }
}
