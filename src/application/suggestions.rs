//! Follow-up suggestions and diagram selection, both driven by lookup tables.

use crate::domain::{ClientConfig, ConversationMode, Visualization};

pub const MAX_SUGGESTIONS: usize = 4;

const GENERIC_SUGGESTIONS: &[&str] = &[
    "Can you explain that differently?",
    "Show me a related topic",
    "What should I learn next?",
];

/// `(mode, module, suggestions)`; a `None` module applies to any module in that mode.
const BUILTIN_SUGGESTIONS: &[(ConversationMode, Option<&str>, &[&str])] = &[
    (
        ConversationMode::FullOverview,
        None,
        &[
            "Show me a code example",
            "Explain this step in more detail",
            "What are common mistakes to avoid?",
            "Can you visualize this workflow?",
        ],
    ),
    (
        ConversationMode::ModuleDeepDive,
        Some("Digital Twin"),
        &[
            "How do I tune the training parameters?",
            "What data format is required?",
            "Show me a training example",
            "What happens if training fails?",
        ],
    ),
    (
        ConversationMode::ModuleDeepDive,
        Some("RF Prediction"),
        &[
            "How accurate are the predictions?",
            "Can I adjust antenna parameters?",
            "Show me prediction output format",
            "How long does prediction take?",
        ],
    ),
    (
        ConversationMode::ModuleDeepDive,
        Some("UE Tracks"),
        &[
            "How do I generate custom UE paths?",
            "What's the difference between UE classes?",
            "Show me UE data format",
            "Can I upload my own UE data?",
        ],
    ),
    (
        ConversationMode::ModuleDeepDive,
        Some("Orchestration"),
        &[
            "How are jobs scheduled?",
            "What happens if a job fails?",
            "Can I run jobs in parallel?",
            "How do I monitor job status?",
        ],
    ),
    (
        ConversationMode::ModuleDeepDive,
        None,
        &[
            "Tell me more about this",
            "Show me an example",
            "What are the next steps?",
        ],
    ),
    (ConversationMode::General, None, GENERIC_SUGGESTIONS),
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct SuggestionEntry {
    mode: ConversationMode,
    module: Option<String>,
    suggestions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SuggestionTable {
    entries: Vec<SuggestionEntry>,
}

impl Default for SuggestionTable {
    fn default() -> Self {
        let entries = BUILTIN_SUGGESTIONS
            .iter()
            .map(|(mode, module, suggestions)| SuggestionEntry {
                mode: *mode,
                module: module.map(str::to_string),
                suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
            })
            .collect();
        Self { entries }
    }
}

impl SuggestionTable {
    /// Built-in table, with module-specific suggestions from `config` taking precedence.
    pub fn for_client(config: &ClientConfig) -> Self {
        let mut table = Self::default();
        for module in config.modules.iter().rev() {
            if !module.suggestions.is_empty() {
                table.insert(
                    ConversationMode::ModuleDeepDive,
                    Some(module.name.as_str()),
                    module.suggestions.clone(),
                );
            }
        }
        table
    }

    /// Adds an entry ahead of existing ones for the same key.
    pub fn insert(&mut self, mode: ConversationMode, module: Option<&str>, suggestions: Vec<String>) {
        self.entries.insert(
            0,
            SuggestionEntry {
                mode,
                module: module.map(str::to_string),
                suggestions,
            },
        );
    }

    /// Exact `(mode, module)` match, then the mode-wide entry, then the generic list.
    pub fn lookup(&self, mode: ConversationMode, module: Option<&str>) -> Vec<String> {
        let exact = module.and_then(|module| {
            self.entries
                .iter()
                .find(|e| e.mode == mode && e.module.as_deref() == Some(module))
        });
        let chosen = exact.or_else(|| {
            self.entries
                .iter()
                .find(|e| e.mode == mode && e.module.is_none())
        });

        match chosen {
            Some(entry) => entry.suggestions.iter().take(MAX_SUGGESTIONS).cloned().collect(),
            None => GENERIC_SUGGESTIONS
                .iter()
                .take(MAX_SUGGESTIONS)
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

const VISUALIZATION_KEYWORDS: &[&str] = &[
    "workflow",
    "flow",
    "steps",
    "process",
    "how does",
    "explain",
    "visualize",
    "show me",
    "diagram",
];

pub const WORKFLOW_DIAGRAM: &str = "graph LR
    A[Start] --> B[Prepare Training Data]
    B --> C[Train Digital Twin]
    C --> D[Generate UE Tracks]
    D --> E[Run RF Prediction]
    E --> F[Orchestrate Jobs]
    F --> G[Collect Results]
    G --> H[Analyze Output]
    H --> I[End]

    style C fill:#4A90E2
    style E fill:#4A90E2
    style F fill:#4A90E2";

pub const SIMPLE_DIAGRAM: &str = "graph TD
    A[Input] --> B[Process]
    B --> C[Output]

    style B fill:#4A90E2";

const DIAGRAMS: &[(ConversationMode, &str)] = &[(ConversationMode::FullOverview, WORKFLOW_DIAGRAM)];

/// A Mermaid diagram when the query asks for a walkthrough, otherwise `None`.
pub fn derive_visualization(query: &str, mode: ConversationMode) -> Option<Visualization> {
    let query = query.to_lowercase();
    if !VISUALIZATION_KEYWORDS.iter().any(|k| query.contains(k)) {
        return None;
    }

    let content = DIAGRAMS
        .iter()
        .find(|(m, _)| *m == mode)
        .map(|(_, diagram)| *diagram)
        .unwrap_or(SIMPLE_DIAGRAM);

    Some(Visualization {
        kind: "mermaid".to_string(),
        content: content.to_string(),
        title: "Workflow Visualization".to_string(),
    })
}
