// Command-line interface - arguments, input prompt, summary output

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use crate::config::{Config, DEFAULT_DATABASE, DEFAULT_OUTPUT_DIR};
use crate::features::TieBreak;
use crate::pipeline;

/// Load fixed-width customer files into customers, emails and phones.
#[derive(Parser, Debug)]
#[command(name = "customer-etl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory with the input files (prompted for when omitted)
    pub input: Option<PathBuf>,

    /// Directory for the workbook files
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// SQLite database file
    #[arg(short, long, default_value = DEFAULT_DATABASE)]
    pub database: PathBuf,

    /// Tie-break for the occupation catalog: lowest-fiscal-id or first-seen
    #[arg(long, default_value = "lowest-fiscal-id")]
    pub tie_break: TieBreak,

    /// Also write one CSV file per entity next to the workbooks
    #[arg(long)]
    pub csv: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub summary_json: bool,
}

impl Cli {
    pub fn into_config(self, input_dir: PathBuf) -> Config {
        Config::new(input_dir)
            .with_output_dir(self.output_dir)
            .with_database(self.database)
            .with_tie_break(self.tie_break)
            .with_csv(self.csv)
    }
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let input_dir = match cli.input.clone() {
        Some(path) => path,
        None => prompt_input_dir()?,
    };
    let summary_json = cli.summary_json;
    let config = cli.into_config(input_dir);

    let now = chrono::Local::now().naive_local();
    let summary = pipeline::run(&config, now)
        .with_context(|| format!("Run failed for {}", config.input_dir.display()))?;

    if summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Loaded {} customers, {} emails, {} phones from {} files",
            summary.customers, summary.emails, summary.phones, summary.files_read
        );
    }

    Ok(())
}

fn prompt_input_dir() -> Result<PathBuf> {
    print!("Input directory: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read input directory")?;

    let path = line.trim();
    if path.is_empty() {
        bail!("No input directory given");
    }
    Ok(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["customer-etl", "data"]).unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("data")));
        assert_eq!(cli.tie_break, TieBreak::LowestFiscalId);
        assert!(!cli.summary_json);
        assert!(!cli.csv);

        let config = cli.into_config(PathBuf::from("data"));
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.database, PathBuf::from("database.db3"));
    }

    #[test]
    fn test_cli_options() {
        let cli = Cli::try_parse_from([
            "customer-etl",
            "--output-dir",
            "out",
            "--database",
            "x.db3",
            "--tie-break",
            "first-seen",
            "--summary-json",
            "--csv",
        ])
        .unwrap();
        assert_eq!(cli.input, None);
        assert_eq!(cli.tie_break, TieBreak::FirstSeen);
        assert!(cli.summary_json);
        assert!(cli.into_config(PathBuf::from("data")).write_csv);
    }

    #[test]
    fn test_cli_rejects_unknown_tie_break() {
        assert!(Cli::try_parse_from(["customer-etl", "--tie-break", "random"]).is_err());
    }
}
