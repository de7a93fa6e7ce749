//! Prompt Composition
//!
//! Builds the role-specific instructions sent to the generation client. The
//! composer only renders strings: it never calls a model, so every prompt can
//! be asserted on directly.

use crate::passage::ContextBlock;
use std::collections::HashMap;

/// Override key for the Curious-role template.
pub const CURIOUS_TEMPLATE: &str = "curious";
/// Override key for the Explainer-role template.
pub const EXPLAINER_TEMPLATE: &str = "explainer";
/// Override key for the wrap-up directive appended to Explainer prompts.
pub const WRAP_UP_TEMPLATE: &str = "wrap_up";

/// Heading that introduces the context section in the built-in templates.
pub const CONTEXT_MARKER: &str = "Context:";
/// Line the Curious prompt ends on, cueing a single question.
pub const QUESTION_MARKER: &str = "Your question:";

const DEFAULT_CURIOUS: &str = include_str!("../prompts/curious.md");
const DEFAULT_EXPLAINER: &str = include_str!("../prompts/explainer.md");
const DEFAULT_WRAP_UP: &str = include_str!("../prompts/wrap_up.md");

/// Renders Curious and Explainer prompts from a set of templates.
///
/// Templates use `{context}`, `{question}` and `{wrap_up}` placeholders.
/// Rendering is a single pass over the template, so braces that appear in
/// retrieved passages or user questions are copied verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptComposer {
    curious: String,
    explainer: String,
    wrap_up: String,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self {
            curious: DEFAULT_CURIOUS.to_string(),
            explainer: DEFAULT_EXPLAINER.to_string(),
            wrap_up: DEFAULT_WRAP_UP.to_string(),
        }
    }
}

impl PromptComposer {
    /// Replaces any built-in template whose key appears in `overrides`.
    ///
    /// Unknown keys are ignored so a shared prompts directory can hold other files.
    pub fn with_overrides(mut self, overrides: &HashMap<String, String>) -> Self {
        if let Some(template) = overrides.get(CURIOUS_TEMPLATE) {
            self.curious = template.clone();
        }
        if let Some(template) = overrides.get(EXPLAINER_TEMPLATE) {
            self.explainer = template.clone();
        }
        if let Some(template) = overrides.get(WRAP_UP_TEMPLATE) {
            self.wrap_up = template.clone();
        }
        self
    }

    /// The directive block appended to wrap-up Explainer prompts.
    pub fn wrap_up_directive(&self) -> &str {
        &self.wrap_up
    }

    /// Instructs the model to ask exactly one question grounded in `context`.
    pub fn curious_prompt(&self, context: &ContextBlock) -> String {
        render(&self.curious, &[("context", context.as_str())])
    }

    /// Instructs the model to answer `question` from `context` in 2-3 paragraphs.
    ///
    /// With `wrap_up` set, the wrap-up directive is included in the same prompt.
    pub fn explainer_prompt(&self, context: &ContextBlock, question: &str, wrap_up: bool) -> String {
        let directive = if wrap_up { self.wrap_up.as_str() } else { "" };
        render(
            &self.explainer,
            &[
                ("context", context.as_str()),
                ("question", question),
                ("wrap_up", directive),
            ],
        )
    }
}

fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let matched = values
            .iter()
            .find(|(key, _)| tail.starts_with(key) && tail[key.len()..].starts_with('}'));
        match matched {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passage::NO_CONTEXT_FOUND;

    fn context() -> ContextBlock {
        ContextBlock::from_texts(["Black holes bend spacetime.", "Time slows near mass."])
    }

    #[test]
    fn test_curious_prompt_embeds_context_and_question_marker() {
        let prompt = PromptComposer::default().curious_prompt(&context());
        assert!(prompt.contains("Black holes bend spacetime.\n\nTime slows near mass."));
        assert!(prompt.contains(CONTEXT_MARKER));
        assert!(prompt.contains(QUESTION_MARKER));
        assert!(prompt.contains("exactly ONE question"));
    }

    #[test]
    fn test_explainer_prompt_with_and_without_wrap_up() {
        let composer = PromptComposer::default();
        for wrap_up in [false, true] {
            let prompt = composer.explainer_prompt(&context(), "Why is time slower?", wrap_up);
            assert!(prompt.contains("Why is time slower?"));
            assert!(prompt.contains("Black holes bend spacetime."));
            assert!(prompt.contains("2-3 paragraphs"));
            assert_eq!(prompt.contains(composer.wrap_up_directive()), wrap_up);
            assert!(!prompt.contains("{wrap_up}"));
        }
    }

    #[test]
    fn test_explainer_prompt_is_pure() {
        let composer = PromptComposer::default();
        let first = composer.explainer_prompt(&context(), "What is spaghettification?", true);
        let second = composer.explainer_prompt(&context(), "What is spaghettification?", true);
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_fallback_context_keeps_context_section() {
        let composer = PromptComposer::default();
        let fallback = ContextBlock::fallback();
        for prompt in [
            composer.curious_prompt(&fallback),
            composer.explainer_prompt(&fallback, "Anything?", true),
        ] {
            let section = prompt
                .split(CONTEXT_MARKER)
                .nth(1)
                .expect("context section present");
            assert!(section.trim_start().starts_with(NO_CONTEXT_FOUND));
        }
    }

    #[test]
    fn test_placeholders_in_inputs_are_not_expanded() {
        let composer = PromptComposer::default();
        let tricky = ContextBlock::from_texts(["set {question} and {wrap_up} literally"]);
        let prompt = composer.explainer_prompt(&tricky, "Is {context} safe?", false);
        assert!(prompt.contains("set {question} and {wrap_up} literally"));
        assert!(prompt.contains("Is {context} safe?"));
    }

    #[test]
    fn test_overrides_replace_only_named_templates() {
        let mut overrides = HashMap::new();
        overrides.insert(
            CURIOUS_TEMPLATE.to_string(),
            "Ask about: {context}".to_string(),
        );
        overrides.insert("unrelated".to_string(), "ignored".to_string());

        let composer = PromptComposer::default().with_overrides(&overrides);
        assert_eq!(composer.curious_prompt(&context()), format!("Ask about: {}", context()));
        assert_eq!(composer.wrap_up_directive(), DEFAULT_WRAP_UP);
    }

    #[test]
    fn test_render_handles_unknown_and_unbalanced_braces() {
        let out = render("{a} {b} {", &[("a", "x")]);
        assert_eq!(out, "x {b} {");
    }
}
