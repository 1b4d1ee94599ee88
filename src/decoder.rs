// Field Decoder - fixed-width lines to raw records
// Reads every file in an input directory into one combined record set

use crate::error::{EtlError, Result, RowRef};
use crate::layout::{spans, Field};
use crate::record::RawRecord;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ============================================================================
// DECODER TRAIT
// ============================================================================

/// Turns one input file into raw records
pub trait FieldDecoder {
    fn decode_file(&self, file_path: &Path) -> Result<Vec<RawRecord>>;

    /// Decoder version (for logging)
    fn version(&self) -> &str {
        "1.0.0"
    }
}

// ============================================================================
// FIXED-WIDTH DECODER
// ============================================================================

/// Positional decoder over the layout in `crate::layout`
pub struct FixedWidthDecoder {
    spans: Vec<(Field, usize, usize)>,
}

impl FixedWidthDecoder {
    pub fn new() -> Self {
        FixedWidthDecoder { spans: spans() }
    }

    /// Slice one line by character position.
    /// Blank slices become None, everything else is kept untrimmed.
    pub fn decode_line(&self, line: &str, row: RowRef) -> RawRecord {
        let chars: Vec<char> = line.chars().collect();
        let mut record = RawRecord::new(row);

        for &(field, start, end) in &self.spans {
            if start >= chars.len() {
                break;
            }
            let slice: String = chars[start..end.min(chars.len())].iter().collect();
            if !slice.trim().is_empty() {
                record.set(field, Some(slice));
            }
        }

        record
    }

    /// Decode already-read file content
    pub fn decode_str(&self, content: &str, source_file: &str) -> Vec<RawRecord> {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                let row = RowRef {
                    source_file: source_file.to_string(),
                    line_number: idx + 1,
                };
                self.decode_line(line, row)
            })
            .collect()
    }
}

impl Default for FixedWidthDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldDecoder for FixedWidthDecoder {
    fn decode_file(&self, file_path: &Path) -> Result<Vec<RawRecord>> {
        let bytes = fs::read(file_path)?;
        let content = decode_text(bytes);

        let filename = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let records = self.decode_str(&content, &filename);
        debug!(file = %filename, records = records.len(), "decoded file");
        Ok(records)
    }
}

/// UTF-8 when valid, otherwise each byte as a Latin-1 character
fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    }
}

// ============================================================================
// DIRECTORY EXTRACTION
// ============================================================================

/// Combined record set of one input directory
#[derive(Debug, Default)]
pub struct Extraction {
    pub files: Vec<PathBuf>,
    pub records: Vec<RawRecord>,
}

/// Regular files directly inside `dir`, sorted by name
pub fn list_input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(EtlError::InputDirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Decode every file of `dir` and concatenate in file-name order
pub fn extract(dir: &Path, decoder: &dyn FieldDecoder) -> Result<Extraction> {
    let files = list_input_files(dir)?;
    info!(dir = %dir.display(), files = files.len(), decoder = decoder.version(), "reading input");

    let mut records = Vec::new();
    for file in &files {
        records.extend(decoder.decode_file(file)?);
    }

    Ok(Extraction { files, records })
}
