//! Extraction properties over saved pages, no network.

use album_scraper::extraction::{enumerate, Document, FieldExtractor};
use album_scraper::pipeline::{assemble, process_document};
use album_scraper::progress::Progress;
use album_scraper::ScrapeResult;
use assert_json_diff::assert_json_eq;
use serde_json::json;

const SEARCH_PAGE: &str = include_str!("fixtures/search_page.html");

fn search_doc() -> Document {
    Document::from_html("https://www.albumoftheyear.org/search/?q=time", SEARCH_PAGE)
}

#[test]
fn test_output_never_exceeds_fragment_count() {
    let doc = search_doc();
    let extractor = FieldExtractor::default();
    let blocks = enumerate(&doc, extractor.rules().block).unwrap();

    let result = assemble(&extractor, &blocks, None, &mut Progress::silent());
    let records = result.records().unwrap();
    assert_eq!(blocks.len(), 4);
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.is_identifiable()));
}

#[test]
fn test_records_keep_document_order() {
    let result = process_document(&search_doc(), &FieldExtractor::default(), false, &mut Progress::silent())
        .unwrap();
    let labels: Vec<String> = result.records().unwrap().iter().map(|r| r.label()).collect();
    assert_eq!(
        labels,
        [
            "Pink Floyd - The Dark Side of the Moon",
            "Björk - Time",
            "Electric Light Orchestra - Time",
        ]
    );
}

#[test]
fn test_repeated_extraction_is_byte_identical() {
    let doc = search_doc();
    let extractor = FieldExtractor::default();
    let runs: Vec<String> = (0..3)
        .map(|_| {
            let result = process_document(&doc, &extractor, false, &mut Progress::silent()).unwrap();
            serde_json::to_string(&result).unwrap()
        })
        .collect();
    assert!(runs.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_reference_fragment() {
    let doc = Document::from_html(
        "https://example.com",
        r#"<div class="albumBlock"><div class="artistTitle">Foo</div><div class="albumTitle"><a href="/x">Bar</a></div><div class="type">2024 • LP</div></div>"#,
    );
    let result = process_document(&doc, &FieldExtractor::default(), false, &mut Progress::silent()).unwrap();
    assert_json_eq!(
        serde_json::to_value(&result).unwrap(),
        json!([{
            "artist_name": "Foo",
            "album_name": "Bar",
            "album_url": "/x",
            "release_date": "2024",
            "record_type": "LP",
            "image_url": null
        }])
    );
}

#[test]
fn test_only_unidentifiable_fragments_is_empty_success() {
    let doc = Document::from_html(
        "https://example.com",
        r#"<div class="albumBlock"><div class="type">2020 • LP</div></div>"#,
    );
    let result = process_document(&doc, &FieldExtractor::default(), false, &mut Progress::silent()).unwrap();
    assert_eq!(result, ScrapeResult::Success(vec![]));
    assert_eq!(serde_json::to_string(&result).unwrap(), "[]");
}

#[test]
fn test_non_ascii_survives_serialization() {
    let result = process_document(&search_doc(), &FieldExtractor::default(), false, &mut Progress::silent())
        .unwrap();
    let json = serde_json::to_string(&result).unwrap();
    assert!(json.contains("Björk"));
    assert!(!json.contains("\\u00f6"));
}
