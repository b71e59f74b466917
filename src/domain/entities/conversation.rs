use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Source;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub session_id: String,
    pub client: String,
    pub mode: ConversationMode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(session_id: impl Into<String>, client: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            client: client.into(),
            mode: ConversationMode::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Record activity in `mode` at `at`.
    pub fn touch(&mut self, mode: ConversationMode, at: DateTime<Utc>) {
        self.mode = mode;
        self.updated_at = at;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization: Option<Visualization>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(conversation_id: Uuid, role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            role,
            content: content.into(),
            sources: None,
            visualization: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = Some(sources);
        self
    }

    pub fn with_visualization(mut self, visualization: Option<Visualization>) -> Self {
        self.visualization = visualization;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A role/content pair as sent to the generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: MessageRole,
    pub content: String,
}

impl PromptMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Message> for PromptMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}

/// Conversational strategy that shapes the system prompt, suggestions and diagrams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationMode {
    #[default]
    FullOverview,
    ModuleDeepDive,
    General,
}

impl ConversationMode {
    pub const ALL: [ConversationMode; 3] =
        [Self::FullOverview, Self::ModuleDeepDive, Self::General];

    /// Parses a mode name; anything unrecognized is treated as `General`.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "full_overview" => Self::FullOverview,
            "module_deep_dive" => Self::ModuleDeepDive,
            _ => Self::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullOverview => "full_overview",
            Self::ModuleDeepDive => "module_deep_dive",
            Self::General => "general",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::FullOverview => "Full Overview",
            Self::ModuleDeepDive => "Module Deep-Dive",
            Self::General => "General Q&A",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::FullOverview => "Step-by-step guided tour of the entire workflow",
            Self::ModuleDeepDive => "In-depth exploration of a specific module",
            Self::General => "Ask any question about the platform",
        }
    }
}

impl std::fmt::Display for ConversationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visualization {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse_known_values() {
        assert_eq!(ConversationMode::parse("full_overview"), ConversationMode::FullOverview);
        assert_eq!(
            ConversationMode::parse("module_deep_dive"),
            ConversationMode::ModuleDeepDive
        );
        assert_eq!(ConversationMode::parse("general"), ConversationMode::General);
    }

    #[test]
    fn test_mode_parse_unknown_falls_back_to_general() {
        assert_eq!(ConversationMode::parse("tutorial"), ConversationMode::General);
        assert_eq!(ConversationMode::parse(""), ConversationMode::General);
    }

    #[test]
    fn test_visualization_serializes_kind_as_type() {
        let viz = Visualization {
            kind: "mermaid".into(),
            content: "graph TD".into(),
            title: "Workflow Visualization".into(),
        };
        let json = serde_json::to_value(&viz).unwrap();
        assert_eq!(json["type"], "mermaid");
    }

    #[test]
    fn test_touch_updates_mode_and_timestamp() {
        let mut conv = Conversation::new("abc", "maveric");
        let later = conv.updated_at + chrono::Duration::seconds(5);
        conv.touch(ConversationMode::General, later);

        assert_eq!(conv.mode, ConversationMode::General);
        assert_eq!(conv.updated_at, later);
        assert!(conv.created_at < conv.updated_at);
    }
}
