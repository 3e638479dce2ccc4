/*!
 * End-to-end PDF translation tests
 */

use std::fs;
use std::sync::Arc;
use anyhow::Result;
use yapt::app_controller::Controller;
use yapt::errors::AppError;
use yapt::file_utils::ISSUES_LOG_NAME;
use yapt::providers::mock::MockProvider;
use yapt::translation::CancellationFlag;
use crate::common;

/// Test the whole pipeline with a working backend
#[tokio::test]
async fn test_runWithTranslator_withWorkingProvider_shouldWriteTranslatedPdf() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_sample_pdf(temp_dir.path())?;
    let output = temp_dir.path().join("sample_fr.pdf");
    let original = fs::read(&input)?;

    let controller = Controller::with_config(common::test_config())?.without_progress();
    let report = controller
        .run_with_translator(Arc::new(MockProvider::working()), &input, &output, None)
        .await?;

    assert_eq!(report.pages_processed, 2);
    assert_eq!(report.runs_found, 3);
    assert_eq!(report.translation.translated, 3);
    assert_eq!(report.overlay.inserted, 3);
    assert_eq!(report.overlay.failed, 0);
    assert!(report.issues_log.is_none());
    assert!(!temp_dir.path().join(ISSUES_LOG_NAME).exists());

    let texts = common::extracted_texts(&output)?;
    assert_eq!(texts, vec!["[fr] Hello world", "[fr] Second line of text", "[fr] Page two footer"]);

    // the input is never modified
    assert_eq!(fs::read(&input)?, original);
    Ok(())
}

/// Test that only the selected pages are rewritten
#[tokio::test]
async fn test_runWithTranslator_withPageSelection_shouldLeaveOtherPagesIntact() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_sample_pdf(temp_dir.path())?;
    let output = temp_dir.path().join("page_two.pdf");

    let controller = Controller::with_config(common::test_config())?.without_progress();
    let report = controller
        .run_with_translator(Arc::new(MockProvider::working()), &input, &output, Some("2-9"))
        .await?;

    assert_eq!(report.pages_processed, 1);
    let texts = common::extracted_texts(&output)?;
    assert_eq!(texts, vec!["Hello world", "Second line of text", "[fr] Page two footer"]);
    Ok(())
}

/// Test that backend failures keep the original text and write the issues log
#[tokio::test]
async fn test_runWithTranslator_withFailingProvider_shouldKeepTextAndLogIssues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_sample_pdf(temp_dir.path())?;
    let output = temp_dir.path().join("failed.pdf");

    let controller = Controller::with_config(common::test_config())?.without_progress();
    let report = controller
        .run_with_translator(Arc::new(MockProvider::failing()), &input, &output, None)
        .await?;

    assert_eq!(report.translation.failed, 3);
    let issues_log = report.issues_log.clone().expect("issues log should be written");
    assert_eq!(issues_log, temp_dir.path().join(ISSUES_LOG_NAME));

    let log_content = fs::read_to_string(&issues_log)?;
    assert!(log_content.starts_with("Translation Log - "));
    assert_eq!(log_content.matches("[WARN] Translation failed").count(), 3);
    assert!(log_content.contains("Hello world"));

    let texts = common::extracted_texts(&output)?;
    assert_eq!(texts, vec!["Hello world", "Second line of text", "Page two footer"]);
    Ok(())
}

/// Test that text no configured font can render is reported
#[tokio::test]
async fn test_runWithTranslator_withUnrenderableTranslation_shouldRecordIssue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_sample_pdf(temp_dir.path())?;
    let output = temp_dir.path().join("emoji.pdf");

    let mut config = common::test_config();
    config.overlay.fonts = vec!["helv".to_string()];
    let provider = MockProvider::working().with_custom_response(|_| "翻譯".to_string());

    let controller = Controller::with_config(config)?.without_progress();
    let report = controller
        .run_with_translator(Arc::new(provider), &input, &output, None)
        .await?;

    assert_eq!(report.overlay.failed, 3);
    assert_eq!(report.overlay.redacted, 3);
    let log_content = fs::read_to_string(report.issues_log.expect("issues log should be written"))?;
    assert!(log_content.contains("3 text runs could not be rendered"));
    Ok(())
}

/// Test that a cancelled run stops with the cancellation error
#[tokio::test]
async fn test_runWithTranslator_whenCancelled_shouldReturnCancelledError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_sample_pdf(temp_dir.path())?;
    let output = temp_dir.path().join("cancelled.pdf");

    let cancel = CancellationFlag::new();
    cancel.cancel();
    let provider = MockProvider::working();
    let controller = Controller::with_config(common::test_config())?
        .without_progress()
        .with_cancellation(cancel);

    let error = controller
        .run_with_translator(Arc::new(provider.clone()), &input, &output, None)
        .await
        .expect_err("cancelled run should fail");

    assert!(matches!(error.downcast_ref::<AppError>(), Some(AppError::Cancelled)));
    assert_eq!(provider.request_count(), 0);
    assert!(!output.exists());
    Ok(())
}

/// Test that a bad page selection is rejected before translating
#[tokio::test]
async fn test_runWithTranslator_withInvalidPageSelection_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_sample_pdf(temp_dir.path())?;
    let output = temp_dir.path().join("bad_pages.pdf");
    let provider = MockProvider::working();

    let controller = Controller::with_config(common::test_config())?.without_progress();
    let error = controller
        .run_with_translator(Arc::new(provider.clone()), &input, &output, Some("one-two"))
        .await
        .expect_err("invalid selection should fail");

    assert!(matches!(error.downcast_ref::<AppError>(), Some(AppError::PageRange(_))));
    assert_eq!(provider.request_count(), 0);
    Ok(())
}
