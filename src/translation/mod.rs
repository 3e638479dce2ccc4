/*!
 * Translation of text runs through a backend engine.
 *
 * - `core`: the translation service and its statistics
 * - `engines`: the `Translator` trait and the Google / Ollama engines
 * - `cache`: in-memory translation cache
 * - `prompts`: LLM prompt rendering and response cleanup
 * - `concurrency`: cancellation flag and request pacing
 */

// Re-export main types for easier usage
pub use self::core::{LogEntry, TranslationOutcome, TranslationService, TranslationStats};
pub use self::engines::{build_translator, GoogleTranslator, OllamaTranslator, Translator};
pub use self::concurrency::CancellationFlag;

// Submodules
pub mod cache;
pub mod concurrency;
pub mod core;
pub mod engines;
pub mod prompts;
