use anyhow::{Result, Context};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, debug};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::page_range;
use crate::pdf::overlay::FontObjects;
use crate::pdf::{resolve_font_chain, OverlayStats, PageRuns, PdfDocument};
use crate::translation::cache::TranslationCache;
use crate::translation::{build_translator, CancellationFlag, LogEntry, TranslationService, TranslationStats, Translator};

// @module: Application controller for PDF translation

/// Outcome of one document translation
#[derive(Debug, Clone, Default)]
pub struct TranslationReport {
    pub pages_processed: usize,
    pub runs_found: usize,
    pub translation: TranslationStats,
    pub overlay: OverlayStats,
    /// Issues log written next to the output, if any issue occurred
    pub issues_log: Option<PathBuf>,
    pub elapsed: Duration,
}

impl TranslationReport {
    pub fn summary(&self) -> String {
        format!(
            "{} pages, {} text runs: {} translated, {} cached, {} unchanged, {} failed; {} inserted, {} not renderable ({})",
            self.pages_processed,
            self.runs_found,
            self.translation.translated,
            self.translation.cached,
            self.translation.unchanged,
            self.translation.failed,
            self.overlay.inserted,
            self.overlay.failed,
            Controller::format_duration(self.elapsed)
        )
    }
}

/// Main application controller for PDF translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Set from the Ctrl-C handler
    cancel: CancellationFlag,
    show_progress: bool,
}

impl Controller {
    /// Create a controller, validating the configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancellationFlag::new(),
            show_progress: true,
        })
    }

    /// Share an externally owned cancellation flag
    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Hide progress bars
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cancellation_flag(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Translate `input` into `output` with the configured engine
    pub async fn run(&self, input: &Path, output: &Path, pages: Option<&str>) -> Result<TranslationReport> {
        Self::check_input(input)?;
        info!("Connecting to {} engine", self.config.engine.display_name());
        let translator = build_translator(&self.config)
            .await
            .with_context(|| format!("{} engine is not ready", self.config.engine.display_name()))?;
        self.run_with_translator(translator, input, output, pages).await
    }

    fn check_input(input: &Path) -> Result<()> {
        if !FileManager::file_exists(input) {
            return Err(AppError::File(format!("Input file does not exist: {:?}", input)).into());
        }
        if !FileManager::is_pdf(input) {
            warn!("Input file {:?} does not have a .pdf extension", input);
        }
        Ok(())
    }

    /// Run the four pipeline steps with a given translator
    pub async fn run_with_translator(
        &self,
        translator: Arc<dyn Translator>,
        input: &Path,
        output: &Path,
        pages: Option<&str>,
    ) -> Result<TranslationReport> {
        let start_time = Instant::now();
        Self::check_input(input)?;
        let target_language = self.config.target_language.clone();

        // Step 1: extraction
        info!("[1/4] Extracting text from {:?}", input);
        let document = PdfDocument::open(input).map_err(AppError::from)?;
        let selected = page_range::resolve_pages(pages, document.page_count()).map_err(AppError::from)?;
        if selected.is_empty() {
            warn!("No pages selected out of {}", document.page_count());
        }
        let mut page_runs = self.extract_pages(&document, &selected)?;
        let runs_found: usize = page_runs.iter().map(|p| p.runs.len()).sum();
        info!("Found {} text runs on {} pages", runs_found, page_runs.len());

        // Step 2: translation
        let service = TranslationService::new(
            translator,
            target_language.clone(),
            self.config.translation.request_delay(self.config.engine),
        )
        .with_cache(TranslationCache::new(self.config.translation.cache_enabled));
        info!("[2/4] Translating to {} with {}", target_language, service.translator_name());
        let translation_started = Instant::now();
        let translation = self.translate_pages(&service, &mut page_runs, runs_found).await?;
        info!(
            "Translation finished in {}: {} translated, {} cached, {} unchanged, {} failed",
            Self::format_duration(translation_started.elapsed()),
            translation.translated,
            translation.cached,
            translation.unchanged,
            translation.failed
        );

        // Step 3: output copy
        info!("[3/4] Creating output file {:?}", output);
        FileManager::create_output_copy(input, output)?;

        // Step 4: redaction and insertion
        info!("[4/4] Applying translations");
        let overlay = self.apply_pages(output, &page_runs)?;
        if overlay.failed > 0 {
            service.add_issue(
                "WARN",
                format!("{} text runs could not be rendered with the configured fonts", overlay.failed),
            );
        }

        let issues = service.issues();
        let issues_log = if issues.is_empty() {
            None
        } else {
            let path = FileManager::issues_log_path(output);
            let context = format!("{:?} -> {:?} ({})", input, output, target_language);
            self.write_logs_to_file(&issues, &path, &context)?;
            warn!("{} issues recorded in {:?}", issues.len(), path);
            Some(path)
        };

        let report = TranslationReport {
            pages_processed: page_runs.len(),
            runs_found,
            translation,
            overlay,
            issues_log,
            elapsed: start_time.elapsed(),
        };
        info!("Done: {}", report.summary());
        Ok(report)
    }

    fn extract_pages(&self, document: &PdfDocument, selected: &[usize]) -> Result<Vec<PageRuns>> {
        let progress_bar = self.progress_bar(selected.len(), "Extracting");
        let min_chars = self.config.extraction.min_text_chars;

        let mut page_runs = Vec::with_capacity(selected.len());
        for &page_index in selected {
            self.cancel.check()?;
            let page = document.extract_page(page_index, min_chars).map_err(AppError::from)?;
            debug!("Page {}: {} runs", page_index + 1, page.runs.len());
            page_runs.push(page);
            progress_bar.inc(1);
        }
        progress_bar.finish_and_clear();
        Ok(page_runs)
    }

    async fn translate_pages(
        &self,
        service: &TranslationService,
        page_runs: &mut [PageRuns],
        runs_found: usize,
    ) -> Result<TranslationStats> {
        let progress_bar = self.progress_bar(runs_found, "Translating");
        let result = service.translate_runs(page_runs, &self.cancel, &progress_bar).await;
        progress_bar.finish_and_clear();
        Ok(result?)
    }

    fn apply_pages(&self, output: &Path, page_runs: &[PageRuns]) -> Result<OverlayStats> {
        let chain = resolve_font_chain(&self.config.overlay.fonts, &self.config.target_language);
        if chain.is_empty() {
            return Err(AppError::Config("No usable overlay font configured".to_string()).into());
        }
        debug!("Font chain: {}", chain.iter().map(|f| f.name).collect::<Vec<_>>().join(", "));

        let mut document = PdfDocument::open(output).map_err(AppError::from)?;
        let progress_bar = self.progress_bar(page_runs.len(), "Applying");
        let mut font_objects = FontObjects::new();
        let mut stats = OverlayStats::default();

        for page in page_runs {
            self.cancel.check()?;
            let page_stats = document
                .apply_page(page, &chain, &self.config.overlay, &mut font_objects)
                .map_err(AppError::from)?;
            stats.merge(page_stats);
            progress_bar.inc(1);
        }
        progress_bar.finish_and_clear();

        document.save(output).map_err(AppError::from)?;
        Ok(stats)
    }

    fn progress_bar(&self, len: usize, prefix: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress_bar = ProgressBar::new(len as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:>11.bold} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%)"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("=> "));
        progress_bar.set_prefix(prefix.to_string());
        progress_bar
    }

    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:01}s", seconds, duration.subsec_millis() / 100)
        }
    }

    /// Write translation issues to a log file
    fn write_logs_to_file(&self, logs: &[LogEntry], file_path: &Path, translation_context: &str) -> Result<()> {
        let mut log_content = String::new();

        log_content.push_str(&format!("Translation Log - {}\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));
        log_content.push_str(&format!("Context: {}\n\n", translation_context));

        for entry in logs {
            log_content.push_str(&format!("[{}] {}\n", entry.level, entry.message));
        }

        FileManager::write_to_file(file_path, &log_content)?;
        Ok(())
    }
}
