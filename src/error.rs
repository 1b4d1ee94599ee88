// Error types - every fatal condition aborts the run before any sink runs
// Row-level errors carry the source file and line of the offending record

use std::path::PathBuf;

use thiserror::Error;

/// Where a record came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowRef {
    pub source_file: String,
    pub line_number: usize,
}

impl std::fmt::Display for RowRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.source_file, self.line_number)
    }
}

#[derive(Debug, Error)]
pub enum EtlError {
    /// A numeric field held a value that is not a number.
    #[error("Field '{field}' at {row}: cannot convert '{value}' to an integer")]
    InvalidNumber {
        field: &'static str,
        row: RowRef,
        value: String,
    },

    /// A date field could not be parsed.
    #[error("Field '{field}' at {row}: invalid date '{value}'. Expected YYYY-MM-DD")]
    InvalidDate {
        field: &'static str,
        row: RowRef,
        value: String,
    },

    /// A field required by a derivation was missing.
    #[error("Field '{field}' at {row}: value is required")]
    MissingValue { field: &'static str, row: RowRef },

    /// Input directory missing or not a directory.
    #[error("Input directory not usable: {}", .0.display())]
    InputDirectory(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook write failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_field_and_row() {
        let err = EtlError::InvalidNumber {
            field: "telefono",
            row: RowRef {
                source_file: "clientes.txt".to_string(),
                line_number: 12,
            },
            value: "9X2".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("telefono"));
        assert!(msg.contains("clientes.txt:12"));
        assert!(msg.contains("9X2"));
    }

    #[test]
    fn test_missing_value_display() {
        let err = EtlError::MissingValue {
            field: "fecha_nacimiento",
            row: RowRef::default(),
        };
        assert!(err.to_string().contains("fecha_nacimiento"));
    }
}
