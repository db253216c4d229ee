//! SQLite backend for program storage.
//!
//! This is the default backend for local runs. Structured fields
//! (conversation, achievements) are stored as JSON text.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;

use super::ProgramStore;
use crate::program::{GameState, Program, TokenUsage};

const SELECT_COLUMNS: &str = "id, code, conversation, value, state, achievements, response,
     depth, parent_id, version, version_description,
     input_tokens, output_tokens, total_tokens, created_at";

/// SQLite-based program store.
///
/// Uses a Mutex for thread-safety since rusqlite Connection is not Sync.
pub struct SqliteProgramStore {
    conn: Mutex<Connection>,
}

impl SqliteProgramStore {
    /// Open (or create) the database at `db_path`.
    pub fn new(db_path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(db_path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open program database {}", db_path))?;
        Self::init(conn)
    }

    /// Database that lives only as long as the store.
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS programs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL,
                conversation TEXT NOT NULL,
                value REAL NOT NULL,
                state TEXT,
                achievements TEXT NOT NULL,
                response TEXT,
                depth INTEGER NOT NULL,
                parent_id INTEGER,
                version INTEGER NOT NULL,
                version_description TEXT NOT NULL,
                input_tokens INTEGER NOT NULL DEFAULT 0,
                output_tokens INTEGER NOT NULL DEFAULT 0,
                total_tokens INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        // Sampling looks up the best program per version
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_programs_version_value ON programs(version, value)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_programs_parent ON programs(parent_id)",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow!("Lock poisoned: {}", e))
    }
}

/// Raw column values, decoded into a `Program` outside the rusqlite closure.
struct ProgramRow {
    id: i64,
    code: String,
    conversation: String,
    value: f64,
    state: Option<String>,
    achievements: String,
    response: Option<String>,
    depth: u32,
    parent_id: Option<i64>,
    version: u32,
    version_description: String,
    input_tokens: i64,
    output_tokens: i64,
    total_tokens: i64,
    created_at: i64,
}

impl ProgramRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            code: row.get(1)?,
            conversation: row.get(2)?,
            value: row.get(3)?,
            state: row.get(4)?,
            achievements: row.get(5)?,
            response: row.get(6)?,
            depth: row.get(7)?,
            parent_id: row.get(8)?,
            version: row.get(9)?,
            version_description: row.get(10)?,
            input_tokens: row.get(11)?,
            output_tokens: row.get(12)?,
            total_tokens: row.get(13)?,
            created_at: row.get(14)?,
        })
    }

    fn into_program(self) -> Result<Program> {
        Ok(Program {
            id: Some(self.id),
            code: self.code,
            conversation: serde_json::from_str(&self.conversation)
                .with_context(|| format!("Corrupt conversation for program {}", self.id))?,
            value: self.value,
            state: self.state.map(GameState::new),
            achievements: serde_json::from_str(&self.achievements)
                .with_context(|| format!("Corrupt achievements for program {}", self.id))?,
            response: self.response,
            depth: self.depth,
            parent_id: self.parent_id,
            version: self.version,
            version_description: self.version_description,
            token_usage: TokenUsage {
                input_tokens: self.input_tokens as u64,
                output_tokens: self.output_tokens as u64,
                total_tokens: self.total_tokens as u64,
            },
            created_at: self.created_at as u64,
        })
    }
}

#[async_trait]
impl ProgramStore for SqliteProgramStore {
    async fn create_program(&self, mut program: Program) -> Result<Program> {
        let conversation = serde_json::to_string(&program.conversation)?;
        let achievements = serde_json::to_string(&program.achievements)?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO programs
             (code, conversation, value, state, achievements, response, depth, parent_id,
              version, version_description, input_tokens, output_tokens, total_tokens, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                program.code,
                conversation,
                program.value,
                program.state.as_ref().map(GameState::as_str),
                achievements,
                program.response,
                program.depth,
                program.parent_id,
                program.version,
                program.version_description,
                program.token_usage.input_tokens as i64,
                program.token_usage.output_tokens as i64,
                program.token_usage.total_tokens as i64,
                program.created_at as i64,
            ],
        )?;

        program.id = Some(conn.last_insert_rowid());
        Ok(program)
    }

    async fn get_program(&self, id: i64) -> Result<Option<Program>> {
        let row = {
            let conn = self.lock()?;
            conn.query_row(
                &format!("SELECT {} FROM programs WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                ProgramRow::from_row,
            )
            .optional()?
        };
        row.map(ProgramRow::into_program).transpose()
    }

    async fn best_program(&self, version: u32) -> Result<Option<Program>> {
        let row = {
            let conn = self.lock()?;
            conn.query_row(
                &format!(
                    "SELECT {} FROM programs WHERE version = ?1
                     ORDER BY value DESC, id ASC LIMIT 1",
                    SELECT_COLUMNS
                ),
                params![version],
                ProgramRow::from_row,
            )
            .optional()?
        };
        row.map(ProgramRow::into_program).transpose()
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM programs", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
