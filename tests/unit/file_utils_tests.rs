/*!
 * Tests for file utility functions
 */

use std::fs;
use anyhow::Result;
use yapt::file_utils::{FileManager, ISSUES_LOG_NAME};
use crate::common;

/// Test that the output copy replaces any previous output
#[test]
fn test_createOutputCopy_withExistingOutput_shouldOverwrite() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_sample_pdf(temp_dir.path())?;
    let output = temp_dir.path().join("out").join("translated.pdf");
    FileManager::write_to_file(&output, "previous run")?;

    FileManager::create_output_copy(&input, &output)?;

    assert_eq!(fs::read(&input)?, fs::read(&output)?);
    Ok(())
}

/// Test that the issues log is written next to the output and replaced on rewrite
#[test]
fn test_writeToFile_issuesLog_shouldReplaceContent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let log_path = FileManager::issues_log_path(temp_dir.path().join("doc.pdf"));
    assert!(log_path.ends_with(ISSUES_LOG_NAME));
    assert_eq!(log_path.parent(), Some(temp_dir.path()));

    FileManager::write_to_file(&log_path, "first run")?;
    FileManager::write_to_file(&log_path, "second run")?;

    assert_eq!(fs::read_to_string(&log_path)?, "second run");
    Ok(())
}

/// Test file existence and PDF detection
#[test]
fn test_fileExists_withDirectory_shouldBeFalse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    assert!(!FileManager::file_exists(temp_dir.path()));
    assert!(!FileManager::file_exists(temp_dir.path().join("missing.pdf")));

    let pdf = common::create_sample_pdf(temp_dir.path())?;
    assert!(FileManager::file_exists(&pdf));
    assert!(FileManager::is_pdf(&pdf));
    assert!(!FileManager::is_pdf(temp_dir.path().join("notes.txt")));
    Ok(())
}

/// Test removing files that may not exist
#[test]
fn test_removeIfExists_shouldReportRemoval() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("stale.pdf");
    assert!(!FileManager::remove_if_exists(&path)?);

    fs::write(&path, b"%PDF")?;
    assert!(FileManager::remove_if_exists(&path)?);
    assert!(!path.exists());
    Ok(())
}
