//! Program persistence.
//!
//! Every program the search integrates is written through a `ProgramStore`,
//! which assigns its id. Two backends are provided: SQLite for real runs and
//! an in-memory store for tests and dry runs.
//!
//! # Usage
//!
//! ```rust,ignore
//! use mcts_runner::storage::{create_program_store, StorageConfig};
//!
//! let store = create_program_store(&StorageConfig::sqlite("./data/programs.db"))?;
//! let persisted = store.create_program(program).await?;
//! assert!(persisted.id.is_some());
//! ```

mod memory;
mod sqlite;

pub use memory::InMemoryProgramStore;
pub use sqlite::SqliteProgramStore;

use anyhow::Result;
use async_trait::async_trait;

use crate::program::Program;

/// Abstract interface for program storage.
///
/// Implementations must be thread-safe; several runs may share one store.
#[async_trait]
pub trait ProgramStore: Send + Sync {
    /// Persist a program and return it with its assigned id.
    async fn create_program(&self, program: Program) -> Result<Program>;

    /// Fetch a persisted program by id
    async fn get_program(&self, id: i64) -> Result<Option<Program>>;

    /// Highest-value program recorded for `version` (ties go to the oldest)
    async fn best_program(&self, version: u32) -> Result<Option<Program>>;

    /// Total number of persisted programs
    async fn count(&self) -> Result<usize>;
}

/// Which backend to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Sqlite { db_path: String },
    Memory,
}

impl StorageConfig {
    pub fn sqlite(db_path: impl Into<String>) -> Self {
        StorageConfig::Sqlite {
            db_path: db_path.into(),
        }
    }
}

/// Create a program store based on configuration
pub fn create_program_store(config: &StorageConfig) -> Result<Box<dyn ProgramStore>> {
    match config {
        StorageConfig::Sqlite { db_path } => Ok(Box::new(SqliteProgramStore::new(db_path)?)),
        StorageConfig::Memory => Ok(Box::new(InMemoryProgramStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::Conversation;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_create_memory_store() {
        let store = create_program_store(&StorageConfig::Memory).unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_sqlite_store_creates_parent_dirs() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("programs.db");
        let store =
            create_program_store(&StorageConfig::sqlite(db_path.to_str().unwrap())).unwrap();

        let persisted = store
            .create_program(Program::new("pass", Conversation::default()))
            .await
            .unwrap();
        assert!(persisted.id.is_some());
        assert!(db_path.exists());
    }
}
