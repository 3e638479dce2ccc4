/*!
 * Common test utilities for the yapt test suite
 */

use std::path::{Path, PathBuf};
use anyhow::Result;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tempfile::TempDir;

use yapt::app_config::Config;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Operators painting each line with the F1 font, one `BT ... ET` block per line
fn text_operations(lines: &[(&str, f32, f32)]) -> Vec<Operation> {
    let mut operations = Vec::new();
    for (text, x, y) in lines {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
        operations.push(Operation::new("Td", vec![Object::Real(*x as _), Object::Real(*y as _)]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
        operations.push(Operation::new("ET", vec![]));
    }
    operations
}

/// Add a Helvetica font with WinAnsi encoding
pub fn add_helvetica(doc: &mut Document) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    })
}

/// Resources naming a single font F1
pub fn font_resources(font_id: ObjectId) -> Dictionary {
    dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    }
}

/// Add the page tree and catalog for pages given as operators and resources
///
/// Every page is A4. The MediaBox sits on the page tree node so pages
/// inherit it.
pub fn assemble_pdf(mut doc: Document, pages: Vec<(Vec<Operation>, Dictionary)>) -> Result<Document> {
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for (operations, resources) in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    Ok(doc)
}

/// Build a document with one page per entry of `pages`, each line painted with Helvetica as F1
pub fn build_pdf(pages: &[Vec<(&str, f32, f32)>]) -> Result<Document> {
    let mut doc = Document::with_version("1.5");
    let font_id = add_helvetica(&mut doc);
    let pages = pages
        .iter()
        .map(|lines| (text_operations(lines), font_resources(font_id)))
        .collect();
    assemble_pdf(doc, pages)
}

/// Build a one-page document painting `operations` with the F1 font
pub fn build_pdf_from_operations(operations: Vec<Operation>) -> Result<Document> {
    let mut doc = Document::with_version("1.5");
    let font_id = add_helvetica(&mut doc);
    assemble_pdf(doc, vec![(operations, font_resources(font_id))])
}

/// Write a document built by `build_pdf` to `dir/filename`
pub fn create_test_pdf(dir: &Path, filename: &str, pages: &[Vec<(&str, f32, f32)>]) -> Result<PathBuf> {
    let path = dir.join(filename);
    let mut doc = build_pdf(pages)?;
    doc.save(&path)?;
    Ok(path)
}

/// Two pages: a heading with a paragraph line, then a single footer line
pub fn create_sample_pdf(dir: &Path) -> Result<PathBuf> {
    create_test_pdf(
        dir,
        "sample.pdf",
        &[
            vec![("Hello world", 72.0, 720.0), ("Second line of text", 72.0, 690.0)],
            vec![("Page two footer", 72.0, 100.0)],
        ],
    )
}

/// Configuration suitable for tests: French target, no delays, no cache
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.target_language = "fr".to_string();
    config.translation.google.delay_ms = 0;
    config.translation.ollama.delay_ms = 0;
    config.translation.cache_enabled = false;
    config
}

/// All run texts of every page of a PDF file
pub fn extracted_texts(path: &Path) -> Result<Vec<String>> {
    let document = yapt::PdfDocument::open(path)?;
    let pages: Vec<usize> = (0..document.page_count()).collect();
    let texts = document
        .extract_runs(&pages, 1)?
        .into_iter()
        .flat_map(|page| page.runs.into_iter().map(|run| run.text))
        .collect();
    Ok(texts)
}
