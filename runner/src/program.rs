//! Program records produced by the search.
//!
//! A `Program` is one candidate trajectory step: the code an agent wrote,
//! the conversation that led to it, and what happened when it ran.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Who wrote a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered chat history. An empty conversation means "none recorded".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Copy of this conversation with one more turn appended.
    pub fn with(&self, message: Message) -> Self {
        let mut next = self.clone();
        next.push(message);
        next
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Serialized game snapshot. Opaque to the search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameState(String);

impl GameState {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Items produced during a program's execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Achievements {
    /// Items crafted or harvested directly by the program
    #[serde(rename = "static", default)]
    pub static_items: BTreeMap<String, f64>,
    /// Items produced by the factory while the program ran
    #[serde(default)]
    pub dynamic: BTreeMap<String, f64>,
}

impl Achievements {
    pub fn is_empty(&self) -> bool {
        self.static_items.is_empty() && self.dynamic.is_empty()
    }
}

/// LLM token accounting for one generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Assigned by the program store on persistence
    pub id: Option<i64>,
    pub code: String,
    pub conversation: Conversation,
    /// Scalar reward from evaluation
    pub value: f64,
    /// Game state after the code ran
    pub state: Option<GameState>,
    pub achievements: Achievements,
    /// Environment output of the evaluated code
    pub response: Option<String>,
    pub depth: u32,
    pub parent_id: Option<i64>,
    pub version: u32,
    pub version_description: String,
    pub token_usage: TokenUsage,
    /// Unix seconds
    pub created_at: u64,
}

impl Program {
    /// Unevaluated program holding freshly generated code.
    pub fn new(code: impl Into<String>, conversation: Conversation) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            id: None,
            code: code.into(),
            conversation,
            value: 0.0,
            state: None,
            achievements: Achievements::default(),
            response: None,
            depth: 0,
            parent_id: None,
            version: 0,
            version_description: String::new(),
            token_usage: TokenUsage::default(),
            created_at,
        }
    }

    /// Builder pattern: attach this program below `parent`.
    pub fn child_of(mut self, parent: Option<&Program>) -> Self {
        self.depth = parent.map_or(1, |p| p.depth + 1);
        self.parent_id = parent.and_then(|p| p.id);
        self
    }

    pub fn with_token_usage(mut self, usage: TokenUsage) -> Self {
        self.token_usage = usage;
        self
    }
}
