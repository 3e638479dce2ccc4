/*!
 * # YAPT - Yet Another PDF Translator
 *
 * A Rust library that translates the text of PDF documents while keeping
 * the original page layout.
 *
 * ## Features
 *
 * - Extract positioned text runs from PDF content streams
 * - Translate runs with one of two engines:
 *   - Google Translate web API
 *   - Ollama (local LLM)
 * - Redact the original text and write the translation at the same position
 * - Font fallback chain for CJK and Latin scripts
 * - Page selection such as "1-10,15,20-25"
 * - Cooperative cancellation with Ctrl-C
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `pdf`: PDF reading and rewriting:
 *   - `pdf::extract`: Content stream interpretation and text run extraction
 *   - `pdf::overlay`: Redaction and insertion of translated text
 *   - `pdf::fonts`: Overlay fonts and the fallback chain
 * - `translation`: Translation services:
 *   - `translation::core`: Sequential translation of text runs
 *   - `translation::engines`: The Google and Ollama translators
 *   - `translation::cache`: Caching of identical texts
 * - `providers`: Client implementations for the translation backends
 * - `page_range`: Page selection parsing
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod file_utils;
pub mod page_range;
pub mod pdf;
pub mod translation;
pub mod app_controller;
pub mod language_utils;
pub mod providers;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, TranslationReport};
pub use pdf::{PdfDocument, PageRuns, TextRun};
pub use translation::TranslationService;
pub use language_utils::{normalize_to_part2t, get_language_name};
pub use errors::{AppError, PdfError, PageRangeError, ProviderError};
