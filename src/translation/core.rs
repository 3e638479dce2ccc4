/*!
 * Core translation service implementation.
 *
 * The service translates text runs one at a time through a `Translator`,
 * consulting the cache first and pacing backend calls with a fixed delay.
 * Failures never abort the run: the original text is kept and the problem
 * is recorded as an issue.
 */

use indicatif::ProgressBar;
use log::{debug, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::AppError;
use crate::pdf::PageRuns;
use super::cache::{truncate_text, TranslationCache};
use super::concurrency::{CancellationFlag, RequestThrottle};
use super::engines::Translator;

/// Texts shorter than this (trimmed, in characters) are never sent
pub const MIN_TRANSLATABLE_CHARS: usize = 2;

/// Log entry for capturing translation issues
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: String,
    pub message: String,
}

/// What happened to one text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationOutcome {
    /// The backend returned a different text
    Translated,
    /// Too short to send, or the backend returned the input
    Unchanged,
    /// Served from the cache
    Cached,
    /// The backend failed; the original text is kept
    Failed,
}

/// Counters for one translation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationStats {
    pub translated: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub cached: usize,
}

impl TranslationStats {
    pub fn record(&mut self, outcome: TranslationOutcome) {
        match outcome {
            TranslationOutcome::Translated => self.translated += 1,
            TranslationOutcome::Unchanged => self.unchanged += 1,
            TranslationOutcome::Cached => self.cached += 1,
            TranslationOutcome::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.translated + self.unchanged + self.failed + self.cached
    }
}

/// Main translation service for text runs
pub struct TranslationService {
    translator: Arc<dyn Translator>,
    target_language: String,
    throttle: RequestThrottle,
    /// Translation cache for storing and retrieving translations
    pub cache: TranslationCache,
    issues: Mutex<Vec<LogEntry>>,
}

impl TranslationService {
    /// Create a service around a translator
    pub fn new(translator: Arc<dyn Translator>, target_language: impl Into<String>, delay: Duration) -> Self {
        Self {
            translator,
            target_language: target_language.into(),
            throttle: RequestThrottle::new(delay),
            cache: TranslationCache::new(true),
            issues: Mutex::new(Vec::new()),
        }
    }

    /// Replace the cache, e.g. to disable it
    pub fn with_cache(mut self, cache: TranslationCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn translator_name(&self) -> String {
        self.translator.name()
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Test the connection to the translation backend
    pub async fn test_connection(&self) -> Result<(), AppError> {
        self.translator.test_connection().await.map_err(AppError::from)
    }

    /// Translate a single text, falling back to the input on failure
    pub async fn translate_text(&self, text: &str) -> String {
        self.translate_with_outcome(text).await.0
    }

    /// Translate a single text and report how it was obtained
    pub async fn translate_with_outcome(&self, text: &str) -> (String, TranslationOutcome) {
        if text.trim().chars().count() < MIN_TRANSLATABLE_CHARS {
            return (text.to_string(), TranslationOutcome::Unchanged);
        }

        if let Some(cached) = self.cache.get(text, &self.target_language) {
            return (cached, TranslationOutcome::Cached);
        }

        let result = self.translator.translate(text, &self.target_language).await;
        self.throttle.pause().await;

        match result {
            Ok(translated) => {
                debug!("'{}' -> '{}'", truncate_text(text, 40), truncate_text(&translated, 40));
                self.cache.store(text, &self.target_language, &translated);
                if translated == text {
                    (translated, TranslationOutcome::Unchanged)
                } else {
                    (translated, TranslationOutcome::Translated)
                }
            }
            Err(e) => {
                warn!("Translation failed for '{}': {}", truncate_text(text, 40), e);
                self.issues.lock().push(LogEntry {
                    level: "WARN".to_string(),
                    message: format!("Translation failed for '{}': {}", text, e),
                });
                (text.to_string(), TranslationOutcome::Failed)
            }
        }
    }

    /// Translate every run in order, attaching the result to each run
    ///
    /// The cancellation flag is checked before each run.
    pub async fn translate_runs(
        &self,
        pages: &mut [PageRuns],
        cancel: &CancellationFlag,
        progress: &ProgressBar,
    ) -> Result<TranslationStats, AppError> {
        let mut stats = TranslationStats::default();

        for page in pages.iter_mut() {
            for run in page.runs.iter_mut() {
                cancel.check()?;

                let (translated, outcome) = self.translate_with_outcome(&run.text).await;
                stats.record(outcome);
                run.translated = Some(translated);
                progress.inc(1);
            }
        }

        Ok(stats)
    }

    /// Issues recorded so far
    pub fn issues(&self) -> Vec<LogEntry> {
        self.issues.lock().clone()
    }

    /// Record an issue raised outside the translation step
    pub fn add_issue(&self, level: &str, message: impl Into<String>) {
        self.issues.lock().push(LogEntry {
            level: level.to_string(),
            message: message.into(),
        });
    }
}
