/*!
 * Prompt construction and response cleanup for LLM backends.
 */

use regex::Regex;
use once_cell::sync::Lazy;

use crate::language_utils;

/// Leading label some models echo before the translation
static TRANSLATION_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*translation\s*[:：]\s*").unwrap());

/// Prompt template with `{target_language}` and `{text}` placeholders
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into() }
    }

    /// Render the prompt, naming the language the way a reader of it would
    pub fn render(&self, text: &str, target_language: &str) -> String {
        self.template
            .replace("{target_language}", &language_utils::prompt_language_name(target_language))
            .replace("{text}", text)
    }
}

/// Clean a raw model answer
///
/// Every leading and trailing quote character, paired or not, and a leading
/// "Translation:" label are removed. An empty answer, or one equal to the
/// input, yields the original text.
pub fn clean_response(raw: &str, original: &str) -> String {
    let text = raw
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '“' | '”' | '「' | '」'));

    let cleaned = TRANSLATION_LABEL.replace(text, "");
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == original.trim() {
        original.to_string()
    } else {
        cleaned.to_string()
    }
}
