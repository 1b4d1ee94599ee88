// Run configuration - input, output locations and catalog policy

use std::path::PathBuf;

use crate::features::TieBreak;

pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_DATABASE: &str = "database.db3";

/// Everything one run needs to know
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory of fixed-width input files
    pub input_dir: PathBuf,
    /// Where the workbooks (and CSV files, if enabled) go
    pub output_dir: PathBuf,
    /// SQLite database file
    pub database: PathBuf,
    pub tie_break: TieBreak,
    /// Also write one CSV file per entity
    pub write_csv: bool,
}

impl Config {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Config {
            input_dir: input_dir.into(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            database: PathBuf::from(DEFAULT_DATABASE),
            tie_break: TieBreak::default(),
            write_csv: false,
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<PathBuf>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn with_csv(mut self, write_csv: bool) -> Self {
        self.write_csv = write_csv;
        self
    }
}
