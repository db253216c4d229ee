//! In-memory program store.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Mutex;

use super::ProgramStore;
use crate::program::Program;

/// Vec-backed store. Ids start at 1 and follow insertion order.
#[derive(Debug, Default)]
pub struct InMemoryProgramStore {
    programs: Mutex<Vec<Program>>,
}

impl InMemoryProgramStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored program, in insertion order
    pub fn programs(&self) -> Result<Vec<Program>> {
        let programs = self
            .programs
            .lock()
            .map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        Ok(programs.clone())
    }
}

#[async_trait]
impl ProgramStore for InMemoryProgramStore {
    async fn create_program(&self, mut program: Program) -> Result<Program> {
        let mut programs = self
            .programs
            .lock()
            .map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        program.id = Some(programs.len() as i64 + 1);
        programs.push(program.clone());
        Ok(program)
    }

    async fn get_program(&self, id: i64) -> Result<Option<Program>> {
        let programs = self
            .programs
            .lock()
            .map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        Ok(programs.iter().find(|p| p.id == Some(id)).cloned())
    }

    async fn best_program(&self, version: u32) -> Result<Option<Program>> {
        let programs = self
            .programs
            .lock()
            .map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        let mut best: Option<&Program> = None;
        for program in programs.iter().filter(|p| p.version == version) {
            match best {
                Some(current) if program.value <= current.value => {}
                _ => best = Some(program),
            }
        }
        Ok(best.cloned())
    }

    async fn count(&self) -> Result<usize> {
        let programs = self
            .programs
            .lock()
            .map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        Ok(programs.len())
    }
}
