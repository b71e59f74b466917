//! Deterministic prompt assembly.
//!
//! The system prompt is a client preamble plus fixed guidelines and a
//! mode-specific clause. The message list is the most recent slice of the
//! conversation followed by one user turn that carries the retrieved sources
//! (most relevant first), the question, and a grounding instruction.

use crate::domain::{ClientConfig, ConversationMode, PromptMessage, RetrievalResult, Source};

pub const DEFAULT_HISTORY_WINDOW: usize = 5;

const GUIDELINES: &str = "Your role is to provide accurate, clear explanations of technical workflows and system capabilities.";

const RESPONSE_RULES: &str = "Response guidelines:
- Provide clear, technically accurate information
- Use proper formatting: code blocks for code, numbered lists for procedures, bullet points for features
- Include relevant code examples from the documentation when applicable
- Structure responses with headers for complex topics
- Cite specific documentation sources
- Maintain a professional, technical tone
- Do not use emojis or overly casual language
- Focus on precision and clarity over friendliness

When providing code examples:
- Use proper syntax highlighting with language specification
- Include brief explanations of what the code does
- Show realistic parameter values from the documentation

When explaining workflows:
- Number the steps clearly
- Specify required inputs and expected outputs
- Note any prerequisites or dependencies
- Reference related modules when relevant";

const GROUNDING_INSTRUCTION: &str =
    "Please provide a clear, technical response based on the documentation above.";

fn mode_clause(mode: ConversationMode) -> &'static str {
    match mode {
        ConversationMode::FullOverview => "Current mode: Provide comprehensive, step-by-step workflow guidance covering the complete process from start to finish.",
        ConversationMode::ModuleDeepDive => "Current mode: Provide detailed technical explanation of the specific module, including architecture, parameters, and usage patterns.",
        ConversationMode::General => "Current mode: Provide direct, concise answers to specific technical questions.",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub messages: Vec<PromptMessage>,
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    client_name: String,
    module_names: Vec<String>,
    history_window: usize,
}

impl PromptBuilder {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client_name: config.client_name.clone(),
            module_names: config
                .modules
                .iter()
                .map(|m| m.name.clone())
                .filter(|name| !name.is_empty())
                .collect(),
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn build(
        &self,
        mode: ConversationMode,
        context: &[RetrievalResult],
        history: &[PromptMessage],
        query: &str,
    ) -> Prompt {
        let mut messages = self.trim_history(history).to_vec();
        messages.push(PromptMessage::user(Self::user_turn(context, query)));

        Prompt {
            system: self.system_prompt(mode),
            messages,
            sources: Self::sources(context),
        }
    }

    pub fn system_prompt(&self, mode: ConversationMode) -> String {
        let modules = if self.module_names.is_empty() {
            "various topics".to_string()
        } else {
            self.module_names.join(", ")
        };

        format!(
            "You are a technical documentation assistant for {}.\n\n{}\n\nAvailable modules: {}\n\n{}\n\n{}",
            self.client_name,
            GUIDELINES,
            modules,
            RESPONSE_RULES,
            mode_clause(mode)
        )
    }

    /// The last `history_window` messages, oldest first.
    pub fn trim_history<'a>(&self, history: &'a [PromptMessage]) -> &'a [PromptMessage] {
        let skip = history.len().saturating_sub(self.history_window);
        &history[skip..]
    }

    pub fn user_turn(context: &[RetrievalResult], query: &str) -> String {
        let sources = context
            .iter()
            .map(|r| format!("Source: {}\n{}", r.metadata.source, r.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "Context from documentation:\n{sources}\n\nUser question: {query}\n\n{GROUNDING_INSTRUCTION}"
        )
    }

    pub fn sources(context: &[RetrievalResult]) -> Vec<Source> {
        context.iter().map(Source::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntryMetadata, MessageRole, ModuleInfo};

    fn config(modules: &[&str]) -> ClientConfig {
        ClientConfig {
            client_name: "Maveric".into(),
            modules: modules.iter().map(|m| ModuleInfo::named(*m)).collect(),
            enable_visualizations: true,
        }
    }

    fn result(source: &str, content: &str, distance: f32) -> RetrievalResult {
        RetrievalResult {
            content: content.into(),
            metadata: EntryMetadata {
                source: source.into(),
                client: "maveric".into(),
                chunk_id: format!("{source}_0"),
            },
            distance,
        }
    }

    fn history(n: usize) -> Vec<PromptMessage> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    PromptMessage::user(format!("question {i}"))
                } else {
                    PromptMessage::assistant(format!("answer {i}"))
                }
            })
            .collect()
    }

    #[test]
    fn test_system_prompt_lists_client_and_modules() {
        let builder = PromptBuilder::new(&config(&["Digital Twin", "RF Prediction"]));
        let prompt = builder.system_prompt(ConversationMode::FullOverview);

        assert!(prompt.starts_with("You are a technical documentation assistant for Maveric."));
        assert!(prompt.contains("Available modules: Digital Twin, RF Prediction"));
        assert!(prompt.ends_with("covering the complete process from start to finish."));
    }

    #[test]
    fn test_system_prompt_without_modules() {
        let builder = PromptBuilder::new(&config(&[]));
        let prompt = builder.system_prompt(ConversationMode::General);

        assert!(prompt.contains("Available modules: various topics"));
        assert!(prompt.ends_with("Provide direct, concise answers to specific technical questions."));
    }

    #[test]
    fn test_unknown_mode_uses_general_clause() {
        let builder = PromptBuilder::new(&config(&["Orchestration"]));
        assert_eq!(
            builder.system_prompt(ConversationMode::parse("brainstorm")),
            builder.system_prompt(ConversationMode::General)
        );
    }

    #[test]
    fn test_each_mode_has_distinct_clause() {
        let builder = PromptBuilder::new(&config(&[]));
        let deep = builder.system_prompt(ConversationMode::ModuleDeepDive);
        assert!(deep.ends_with("including architecture, parameters, and usage patterns."));
        assert_ne!(deep, builder.system_prompt(ConversationMode::FullOverview));
    }

    #[test]
    fn test_history_keeps_five_most_recent_in_order() {
        let builder = PromptBuilder::new(&config(&[]));
        let prior = history(8);

        let prompt = builder.build(ConversationMode::General, &[], &prior, "next?");

        assert_eq!(prompt.messages.len(), 6);
        assert_eq!(&prompt.messages[..5], &prior[3..]);
        assert_eq!(prompt.messages[0].content, "answer 3");
        assert_eq!(prompt.messages[0].role, MessageRole::Assistant);
    }

    #[test]
    fn test_short_history_is_kept_whole() {
        let builder = PromptBuilder::new(&config(&[]));
        assert_eq!(builder.trim_history(&history(3)).len(), 3);
        assert!(builder.trim_history(&[]).is_empty());
    }

    #[test]
    fn test_user_turn_lists_sources_in_retrieval_order() {
        let context = vec![
            result("first.md", "Most relevant text.", 0.1),
            result("second.md", "Less relevant text.", 0.4),
        ];
        let turn = PromptBuilder::user_turn(&context, "How do I train?");

        assert_eq!(
            turn,
            "Context from documentation:\n\
             Source: first.md\nMost relevant text.\n\n\
             Source: second.md\nLess relevant text.\n\n\
             User question: How do I train?\n\n\
             Please provide a clear, technical response based on the documentation above."
        );
    }

    #[test]
    fn test_empty_context_keeps_question_and_instruction() {
        let builder = PromptBuilder::new(&config(&[]));
        let prompt = builder.build(ConversationMode::General, &[], &[], "Hello?");

        let last = prompt.messages.last().unwrap();
        assert_eq!(last.role, MessageRole::User);
        assert!(last.content.starts_with("Context from documentation:\n\n"));
        assert!(last.content.contains("User question: Hello?"));
        assert!(last.content.ends_with(GROUNDING_INSTRUCTION));
        assert!(prompt.sources.is_empty());
    }

    #[test]
    fn test_sources_follow_retrieval_order() {
        let context = vec![result("b.md", "x", 0.2), result("a.md", "y", 0.3)];
        let sources = PromptBuilder::sources(&context);
        let names: Vec<&str> = sources.iter().map(|s| s.source.as_str()).collect();
        assert_eq!(names, vec!["b.md", "a.md"]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = PromptBuilder::new(&config(&["Digital Twin"]));
        let context = vec![result("a.md", "text", 0.1)];
        let a = builder.build(ConversationMode::ModuleDeepDive, &context, &history(4), "q");
        let b = builder.build(ConversationMode::ModuleDeepDive, &context, &history(4), "q");
        assert_eq!(a, b);
    }
}
