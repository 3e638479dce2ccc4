/*!
 * Tests for page selection parsing
 */

use yapt::errors::PageRangeError;
use yapt::page_range::{parse_page_range, resolve_pages};

#[test]
fn test_parsePageRange_withDocumentedExample_shouldSelectPages() {
    let pages = parse_page_range("1-10,15,20-25", 30).unwrap();
    let expected: Vec<usize> = (0..10).chain([14]).chain(19..25).collect();
    assert_eq!(pages, expected);
}

#[test]
fn test_parsePageRange_withSelectionBeyondDocument_shouldBeEmpty() {
    assert!(parse_page_range("50-60,99", 10).unwrap().is_empty());
}

#[test]
fn test_parsePageRange_withWhitespaceAndEmptyParts_shouldIgnoreThem() {
    assert_eq!(parse_page_range(" 2 , ,3 - 4,", 10).unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_parsePageRange_withNegativeLookingInput_shouldFail() {
    assert!(matches!(parse_page_range("-3", 10), Err(PageRangeError::InvalidNumber(_))));
}

#[test]
fn test_resolvePages_withEmptyDocument_shouldBeEmpty() {
    assert!(resolve_pages(None, 0).unwrap().is_empty());
    assert!(resolve_pages(Some("1"), 0).unwrap().is_empty());
}
