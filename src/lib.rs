// Customer ETL - Core Library
// Exposes the pipeline stages for the CLI and tests

pub mod cli;
pub mod config;
pub mod decoder;
pub mod entities;
pub mod error;
pub mod features;
pub mod layout;
pub mod normalizer;
pub mod pipeline;
pub mod record;
pub mod sink;

// Re-export commonly used types
pub use config::Config;
pub use decoder::{extract, FieldDecoder, FixedWidthDecoder};
pub use entities::{split, Customer, Email, Entities, Phone};
pub use error::{EtlError, Result, RowRef};
pub use features::{derive, Enriched, OccupationCatalog, TieBreak};
pub use layout::{Field, FieldKind};
pub use normalizer::{normalize, Classification};
pub use pipeline::{load, run, transform, RunSummary};
pub use record::{RawRecord, Record};
pub use sink::{CsvSink, EntitySink, SpreadsheetSink, SqliteSink, Table};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
