/*!
 * Tests for PDF text run extraction and rewriting
 */

use anyhow::Result;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use yapt::app_config::OverlayConfig;
use yapt::pdf::{resolve_font_chain, PageRuns, PdfDocument, RgbColor, SourceOp};
use crate::common;

fn op(operator: &str, operands: Vec<Object>) -> Operation {
    Operation::new(operator, operands)
}

fn real(value: f32) -> Object {
    Object::Real(value as _)
}

fn text(value: &str) -> Object {
    Object::string_literal(value)
}

/// Operators painting one line with F1 at the given size and text position
fn line(size: f32, x: f32, y: f32, content: &str) -> Vec<Operation> {
    vec![
        op("BT", vec![]),
        op("Tf", vec!["F1".into(), real(size)]),
        op("Td", vec![real(x), real(y)]),
        op("Tj", vec![text(content)]),
        op("ET", vec![]),
    ]
}

fn translate_all(pages: &mut [PageRuns], translate: impl Fn(&str) -> String) {
    for page in pages.iter_mut() {
        for run in page.runs.iter_mut() {
            run.translated = Some(translate(&run.text));
        }
    }
}

fn texts_of(page: &PageRuns) -> Vec<&str> {
    page.runs.iter().map(|run| run.text.as_str()).collect()
}

fn sample_document() -> Result<PdfDocument> {
    let doc = common::build_pdf(&[
        vec![("Hello world", 72.0, 720.0), ("Second line of text", 72.0, 690.0)],
        vec![("Page two footer", 72.0, 100.0)],
    ])?;
    Ok(PdfDocument::from_document(doc))
}

/// Test that each line becomes one run with its position and style
#[test]
fn test_extractPage_withTwoLines_shouldReturnRunsInContentOrder() -> Result<()> {
    let document = sample_document()?;
    assert_eq!(document.page_count(), 2);

    let page = document.extract_page(0, 2)?;
    assert_eq!(page.page_index, 0);
    let texts: Vec<&str> = page.runs.iter().map(|run| run.text.as_str()).collect();
    assert_eq!(texts, vec!["Hello world", "Second line of text"]);

    let first = &page.runs[0];
    assert!((first.bbox.x0 - 72.0).abs() < 0.01);
    // baseline 720 from the bottom of an 842pt page is 122 from the top
    assert!(first.bbox.y0 < 122.0 && first.bbox.y1 > 122.0);
    assert!(first.bbox.width() > 0.0);
    assert_eq!(first.font_size, 12.0);
    assert_eq!(first.color, RgbColor::BLACK);
    assert_eq!(first.source_ops, vec![SourceOp::page(3)]);
    assert!(first.translated.is_none());

    // the second line sits lower on the page
    assert!(page.runs[1].bbox.y0 > first.bbox.y1);
    Ok(())
}

/// Test the minimum length filter
#[test]
fn test_extractPage_withMinTextChars_shouldDropShortRuns() -> Result<()> {
    let document = sample_document()?;
    let page = document.extract_page(0, 12)?;
    assert_eq!(page.runs.len(), 1);
    assert_eq!(page.runs[0].text, "Second line of text");
    Ok(())
}

/// Test extraction of a page selection and of an invalid page
#[test]
fn test_extractRuns_withSelection_shouldKeepPageIndices() -> Result<()> {
    let document = sample_document()?;
    let pages = document.extract_runs(&[1], 2)?;
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].page_index, 1);
    assert_eq!(pages[0].runs[0].text, "Page two footer");
    assert_eq!(pages[0].runs[0].page_index, 1);

    assert!(document.extract_page(5, 2).is_err());
    Ok(())
}

/// Test that rewritten pages contain the translation instead of the original
#[test]
fn test_applyTranslations_shouldReplaceOriginalText() -> Result<()> {
    let mut document = sample_document()?;
    let mut pages = document.extract_runs(&[0], 2)?;
    for run in pages[0].runs.iter_mut() {
        run.translated = Some(format!("FR {}", run.text));
    }

    let chain = resolve_font_chain(&[], "fr");
    let stats = document.apply_translations(&pages, &chain, &OverlayConfig::default())?;
    assert_eq!(stats.pages, 1);
    assert_eq!(stats.redacted, 2);
    assert_eq!(stats.inserted, 2);
    assert_eq!(stats.failed, 0);

    let rewritten = document.extract_page(0, 2)?;
    let texts: Vec<&str> = rewritten.runs.iter().map(|run| run.text.as_str()).collect();
    assert_eq!(texts, vec!["FR Hello world", "FR Second line of text"]);
    // inserted text is smaller than the original
    assert!(rewritten.runs[0].font_size < 12.0);

    // untouched page keeps its text
    let untouched = document.extract_page(1, 2)?;
    assert_eq!(untouched.runs[0].text, "Page two footer");
    Ok(())
}

/// Test that a run no font can render is counted as failed
#[test]
fn test_applyTranslations_withUnrenderableText_shouldCountFailure() -> Result<()> {
    let mut document = sample_document()?;
    let mut pages = document.extract_runs(&[1], 2)?;
    pages[0].runs[0].translated = Some("页脚".to_string());

    let chain = resolve_font_chain(&["helv".to_string()], "fr");
    let stats = document.apply_translations(&pages, &chain, &OverlayConfig::default())?;
    assert_eq!(stats.redacted, 1);
    assert_eq!(stats.inserted, 0);
    assert_eq!(stats.failed, 1);

    // the original text is redacted even when nothing is inserted
    assert!(document.extract_page(1, 2)?.runs.is_empty());
    Ok(())
}

/// Test that a saved document can be opened again
#[test]
fn test_save_thenOpen_shouldKeepRewrittenText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut document = sample_document()?;
    let mut pages = document.extract_runs(&[0, 1], 2)?;
    for page in pages.iter_mut() {
        for run in page.runs.iter_mut() {
            run.translated = Some(run.text.to_uppercase());
        }
    }
    let chain = resolve_font_chain(&[], "de");
    document.apply_translations(&pages, &chain, &OverlayConfig::default())?;

    let path = temp_dir.path().join("rewritten.pdf");
    document.save(&path)?;

    let texts = common::extracted_texts(&path)?;
    assert_eq!(texts, vec!["HELLO WORLD", "SECOND LINE OF TEXT", "PAGE TWO FOOTER"]);
    Ok(())
}

/// Test that wide TJ kerning reads as a word break and narrow kerning does not
#[test]
fn test_extractPage_withKernedTjArray_shouldSeparateWords() -> Result<()> {
    let doc = common::build_pdf_from_operations(vec![
        op("BT", vec![]),
        op("Tf", vec!["F1".into(), real(10.0)]),
        op("Tm", vec![real(2.0), real(0.0), real(0.0), real(2.0), real(72.0), real(700.0)]),
        op(
            "TJ",
            vec![Object::Array(vec![text("Hel"), Object::Integer(-50), text("lo"), Object::Integer(-300), text("there")])],
        ),
        op("ET", vec![]),
    ])?;
    let page = PdfDocument::from_document(doc).extract_page(0, 2)?;

    assert_eq!(texts_of(&page), vec!["Hello there"]);
    // 10pt scaled by the text matrix
    assert!((page.runs[0].font_size - 20.0).abs() < 0.01);
    Ok(())
}

/// Test that the effective size follows `cm` and the box matches size and baseline
#[test]
fn test_extractPage_withScaledCtm_shouldReportEffectiveSizeAndBox() -> Result<()> {
    let mut operations = vec![op("q", vec![]), op("cm", vec![real(1.5), real(0.0), real(0.0), real(1.5), real(0.0), real(0.0)])];
    operations.extend(line(8.0, 48.0, 400.0, "Scaled text"));
    operations.push(op("Q", vec![]));
    let page = PdfDocument::from_document(common::build_pdf_from_operations(operations)?).extract_page(0, 2)?;

    assert_eq!(page.runs.len(), 1);
    let run = &page.runs[0];
    assert!((run.font_size - 12.0).abs() < 0.01);
    assert!((run.bbox.x0 - 72.0).abs() < 0.01);
    // 11 glyphs of 500 units at 8pt, scaled by 1.5
    assert!((run.bbox.width() - 66.0).abs() < 0.1);
    // ascent and descent span one em of the effective size
    assert!((run.bbox.height() - run.font_size).abs() < 0.01);
    // baseline 600 from the bottom of an 842pt page is 242 from the top
    assert!(run.bbox.y0 < 242.0 && run.bbox.y1 > 242.0);
    Ok(())
}

/// Test the quote operators: both move to the next line, `"` also sets spacing
#[test]
fn test_applyTranslations_withQuoteOperators_shouldReplaceEachLine() -> Result<()> {
    let doc = common::build_pdf_from_operations(vec![
        op("BT", vec![]),
        op("Tf", vec!["F1".into(), real(12.0)]),
        op("TL", vec![real(14.0)]),
        op("Td", vec![real(72.0), real(700.0)]),
        op("Tj", vec![text("First line")]),
        op("'", vec![text("Second line")]),
        op("\"", vec![real(1.0), real(0.0), text("Third line")]),
        op("ET", vec![]),
    ])?;
    let mut document = PdfDocument::from_document(doc);
    let mut pages = document.extract_runs(&[0], 2)?;

    let page = &pages[0];
    assert_eq!(texts_of(page), vec!["First line", "Second line", "Third line"]);
    let indices: Vec<usize> = page.runs.iter().flat_map(|run| run.source_ops.iter().map(|op| op.index)).collect();
    assert_eq!(indices, vec![4, 5, 6]);
    assert!(page.runs[1].bbox.y0 > page.runs[0].bbox.y0);
    assert!(page.runs[2].bbox.y0 > page.runs[1].bbox.y0);

    translate_all(&mut pages, |text| match text {
        "First line" => "Première".to_string(),
        "Second line" => "Deuxième".to_string(),
        _ => "Troisième".to_string(),
    });
    let chain = resolve_font_chain(&[], "fr");
    let stats = document.apply_translations(&pages, &chain, &OverlayConfig::default())?;
    assert_eq!(stats.inserted, 3);

    let rewritten = document.extract_page(0, 2)?;
    assert_eq!(texts_of(&rewritten), vec!["Première", "Deuxième", "Troisième"]);
    Ok(())
}

/// Test gray, RGB and CMYK fills, and that the inserted text keeps the colour
#[test]
fn test_extractPage_withFillColors_shouldConvertToRgb() -> Result<()> {
    let mut operations = vec![op("g", vec![real(0.5)])];
    operations.extend(line(12.0, 72.0, 700.0, "Gray text"));
    operations.push(op("rg", vec![real(0.0), real(0.0), real(1.0)]));
    operations.extend(line(12.0, 72.0, 650.0, "Blue text"));
    operations.push(op("k", vec![real(0.0), real(1.0), real(1.0), real(0.0)]));
    operations.extend(line(12.0, 72.0, 600.0, "Red text"));
    let mut document = PdfDocument::from_document(common::build_pdf_from_operations(operations)?);

    let mut pages = document.extract_runs(&[0], 2)?;
    let colors: Vec<RgbColor> = pages[0].runs.iter().map(|run| run.color).collect();
    assert_eq!(colors, vec![RgbColor(0x808080), RgbColor(0x0000FF), RgbColor(0xFF0000)]);

    translate_all(&mut pages, |text| text.to_lowercase());
    document.apply_translations(&pages, &resolve_font_chain(&[], "fr"), &OverlayConfig::default())?;

    let rewritten = document.extract_page(0, 2)?;
    let colors: Vec<RgbColor> = rewritten.runs.iter().map(|run| run.color).collect();
    assert_eq!(colors, vec![RgbColor(0x808080), RgbColor(0x0000FF), RgbColor(0xFF0000)]);
    Ok(())
}

/// Test inserting with a CID font and reading it back through the composite font path
#[test]
fn test_applyTranslations_withCidFont_shouldExtractAfterSave() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut document = sample_document()?;
    let mut pages = document.extract_runs(&[0], 2)?;
    translate_all(&mut pages, |text| match text {
        "Hello world" => "你好世界".to_string(),
        _ => "第二行文字".to_string(),
    });

    let chain = resolve_font_chain(&["china-ts".to_string()], "zh-TW");
    let stats = document.apply_translations(&pages, &chain, &OverlayConfig::default())?;
    assert_eq!(stats.inserted, 2);

    let path = temp_dir.path().join("cid.pdf");
    document.save(&path)?;

    let reopened = PdfDocument::open(&path)?;
    let page = reopened.extract_page(0, 2)?;
    assert_eq!(texts_of(&page), vec!["你好世界", "第二行文字"]);
    // 12pt scaled by the default overlay font scale
    assert!((page.runs[0].font_size - 8.4).abs() < 0.01);
    Ok(())
}

/// Build two pages painting the same form; the first page also has direct text
fn form_document() -> Result<(Document, lopdf::ObjectId)> {
    let mut doc = Document::with_version("1.5");
    let font_id = common::add_helvetica(&mut doc);

    let form_content = Content { operations: line(12.0, 0.0, 0.0, "Hello from a form") };
    let form_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 300.into(), 50.into()],
            "Matrix" => vec![1.into(), 0.into(), 0.into(), 1.into(), 72.into(), 500.into()],
            "Resources" => common::font_resources(font_id),
        },
        form_content.encode()?,
    ));

    let page_resources = || {
        let mut resources = common::font_resources(font_id);
        resources.set("XObject", dictionary! { "Fm1" => form_id });
        resources
    };
    let paint_form = || vec![op("q", vec![]), op("Do", vec![Object::Name(b"Fm1".to_vec())]), op("Q", vec![])];

    let mut first = line(12.0, 72.0, 720.0, "Direct text");
    first.extend(paint_form());
    let doc = common::assemble_pdf(doc, vec![(first, page_resources()), (paint_form(), page_resources())])?;
    Ok((doc, form_id))
}

/// Test that text painted by a form XObject is extracted, redacted and replaced
#[test]
fn test_applyTranslations_withFormXObject_shouldRewriteFormText() -> Result<()> {
    let (doc, form_id) = form_document()?;
    let mut document = PdfDocument::from_document(doc);

    let mut pages = document.extract_runs(&[0], 2)?;
    assert_eq!(texts_of(&pages[0]), vec!["Direct text", "Hello from a form"]);
    let form_run = &pages[0].runs[1];
    assert_eq!(form_run.source_ops, vec![SourceOp { form: Some(form_id), index: 3 }]);
    // placed by the form matrix: baseline 500 from the bottom is 342 from the top
    assert!((form_run.bbox.x0 - 72.0).abs() < 0.01);
    assert!(form_run.bbox.y0 < 342.0 && form_run.bbox.y1 > 342.0);

    translate_all(&mut pages, |text| format!("[fr] {}", text));
    let stats = document.apply_translations(&pages, &resolve_font_chain(&[], "fr"), &OverlayConfig::default())?;
    assert_eq!(stats.redacted, 2);
    assert_eq!(stats.inserted, 2);

    let rewritten = document.extract_page(0, 2)?;
    assert_eq!(texts_of(&rewritten), vec!["[fr] Direct text", "[fr] Hello from a form"]);

    // the second page paints the shared form and was not selected
    let untouched = document.extract_page(1, 2)?;
    assert_eq!(texts_of(&untouched), vec!["Hello from a form"]);
    Ok(())
}
