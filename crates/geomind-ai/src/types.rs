//! Conversation data model shared by the chat client and the front ends.

use serde::{Deserialize, Serialize};

/// Who authored a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// Role name on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// The selected AI behaviour profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    /// Maps and search grounding on the low-latency model
    #[default]
    LocationSearch,
    /// Ungrounded conversation on the higher-capability model
    DeepChat,
}

impl Mode {
    pub fn model_id(&self) -> &'static str {
        match self {
            Mode::LocationSearch => "gemini-2.5-flash",
            Mode::DeepChat => "gemini-3-pro-preview",
        }
    }

    /// Whether requests in this mode carry grounding tools
    pub fn is_grounded(&self) -> bool {
        matches!(self, Mode::LocationSearch)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::LocationSearch => "Maps & Search",
            Mode::DeepChat => "Pro Chat",
        }
    }

    pub fn caption(&self) -> &'static str {
        match self {
            Mode::LocationSearch => "Powered by Gemini 2.5 Flash with Google Grounding",
            Mode::DeepChat => "Powered by Gemini 3 Pro Preview",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            Mode::LocationSearch => "Search maps or ask anything...",
            Mode::DeepChat => "Ask complex questions...",
        }
    }
}

/// Returned when a mode name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode: {0}")]
pub struct ParseModeError(String);

impl std::str::FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "search" | "maps" | "location" | "location_search" => Ok(Mode::LocationSearch),
            "chat" | "pro" | "deep" | "deep_chat" => Ok(Mode::DeepChat),
            _ => Err(ParseModeError(s.trim().to_string())),
        }
    }
}

/// A citation tying generated text to a web page or a map place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GroundingChunk {
    Web {
        uri: String,
        title: String,
    },
    Maps {
        uri: String,
        title: String,
        place_id: Option<String>,
    },
}

impl GroundingChunk {
    pub fn uri(&self) -> &str {
        match self {
            GroundingChunk::Web { uri, .. } | GroundingChunk::Maps { uri, .. } => uri,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            GroundingChunk::Web { title, .. } | GroundingChunk::Maps { title, .. } => title,
        }
    }
}

/// One transcript entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    /// Creation time, Unix milliseconds
    pub timestamp: i64,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
}

impl Message {
    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            // v7 ids sort by creation time
            id: uuid::Uuid::now_v7().to_string(),
            role,
            text: text.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            is_error: false,
            grounding_chunks: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn model(reply: ChatReply) -> Self {
        Self {
            grounding_chunks: reply.grounding_chunks,
            ..Self::new(Role::Model, reply.text)
        }
    }

    /// A synthetic model-role entry standing in for a failed reply.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::new(Role::Model, text)
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn sources(&self) -> &[GroundingChunk] {
        self.grounding_chunks.as_deref().unwrap_or(&[])
    }
}

/// A successful model reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub text: String,
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
}
