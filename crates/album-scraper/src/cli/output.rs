//! JSON and narration output for the binary.

use crate::model::{AlbumRecord, ScrapeResult};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Records shown after a verbose run.
pub const SAMPLE_SIZE: usize = 3;

/// Single-line JSON, as printed in silent mode.
pub fn to_compact_json(result: &ScrapeResult) -> Result<String> {
    serde_json::to_string(result).context("failed to serialize result")
}

/// Write `result` as indented JSON to `path`, replacing any previous file.
pub fn write_pretty(path: &Path, result: &ScrapeResult) -> Result<()> {
    let mut json = serde_json::to_string_pretty(result).context("failed to serialize result")?;
    json.push('\n');
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Print up to [`SAMPLE_SIZE`] records field by field.
pub fn write_sample(out: &mut impl Write, records: &[AlbumRecord]) -> std::io::Result<()> {
    if records.is_empty() {
        return Ok(());
    }
    writeln!(out, "\nSample of scraped data:")?;
    for (i, record) in records.iter().take(SAMPLE_SIZE).enumerate() {
        writeln!(out, "\nAlbum {}:", i + 1)?;
        for (field, value) in record.fields() {
            writeln!(out, "  {field}: {}", value.unwrap_or("null"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: usize) -> AlbumRecord {
        AlbumRecord {
            artist_name: Some(format!("Artist {n}")),
            album_name: Some(format!("Album {n}")),
            ..Default::default()
        }
    }

    #[test]
    fn test_sample_is_capped() {
        let records: Vec<_> = (1..=5).map(record).collect();
        let mut buf = Vec::new();
        write_sample(&mut buf, &records).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("Album 3:"));
        assert!(!text.contains("Album 4:"));
        assert!(text.contains("  artist_name: Artist 1"));
        assert!(text.contains("  image_url: null"));
    }

    #[test]
    fn test_no_sample_for_empty_result() {
        let mut buf = Vec::new();
        write_sample(&mut buf, &[]).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_compact_json_is_one_line() {
        let json = to_compact_json(&ScrapeResult::Success(vec![record(1), record(2)])).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.starts_with("[{\"artist_name\":\"Artist 1\""));
    }
}
