/*!
 * Page selection parsing.
 *
 * Turns a user supplied selection such as `"1-10,15,20-25"` into sorted,
 * 0-based page indices.
 */

use std::collections::BTreeSet;

use crate::errors::PageRangeError;

/// Parse a 1-based page selection against a document of `total_pages` pages
///
/// Ranges are clamped to the document, single pages outside it are ignored.
/// The result is sorted and free of duplicates.
pub fn parse_page_range(selection: &str, total_pages: usize) -> Result<Vec<usize>, PageRangeError> {
    let mut pages = BTreeSet::new();

    for part in selection.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if part.contains('-') {
            let mut bounds = part.split('-');
            let (start, end) = match (bounds.next(), bounds.next(), bounds.next()) {
                (Some(start), Some(end), None) => (parse_number(start)?, parse_number(end)?),
                _ => return Err(PageRangeError::InvalidRange(part.to_string())),
            };

            let first = start.max(1);
            let last = end.min(total_pages);
            pages.extend((first..=last).map(|page| page - 1));
        } else {
            let page = parse_number(part)?;
            if (1..=total_pages).contains(&page) {
                pages.insert(page - 1);
            }
        }
    }

    Ok(pages.into_iter().collect())
}

/// Resolve an optional selection, `None` or blank meaning every page
pub fn resolve_pages(selection: Option<&str>, total_pages: usize) -> Result<Vec<usize>, PageRangeError> {
    match selection.map(str::trim) {
        Some(selection) if !selection.is_empty() => parse_page_range(selection, total_pages),
        _ => Ok((0..total_pages).collect()),
    }
}

fn parse_number(value: &str) -> Result<usize, PageRangeError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| PageRangeError::InvalidNumber(value.trim().to_string()))
}
