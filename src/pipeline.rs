// Pipeline - Extract → Transform → Load
// Each stage consumes the full output of the previous one.
// Any error aborts before a sink is touched.

use crate::config::Config;
use crate::decoder::{extract, FixedWidthDecoder};
use crate::entities::{split, Entities};
use crate::error::Result;
use crate::features::{derive, OccupationCatalog, TieBreak};
use crate::normalizer::normalize;
use crate::record::RawRecord;
use crate::sink::{CsvSink, EntitySink, SpreadsheetSink, SqliteSink};
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;

/// Counts reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub files_read: usize,
    pub records_decoded: usize,
    pub records_kept: usize,
    pub customers: usize,
    pub emails: usize,
    pub phones: usize,
    pub catalog_entries: usize,
    pub flagged_customers: usize,
}

/// Output of the transform stage
#[derive(Debug, Default)]
pub struct Transformed {
    pub entities: Entities,
    pub catalog: OccupationCatalog,
}

/// Normalize → Derive → Split
pub fn transform(
    records: Vec<RawRecord>,
    now: NaiveDateTime,
    tie_break: TieBreak,
) -> Result<Transformed> {
    let normalized = normalize(records)?;
    let derived = derive(normalized, now, tie_break)?;
    let entities = split(&derived.rows);

    Ok(Transformed {
        entities,
        catalog: derived.catalog,
    })
}

/// Hand the entities to every sink in order
pub fn load(entities: &Entities, sinks: &[&dyn EntitySink]) -> Result<()> {
    for sink in sinks {
        info!(sink = sink.name(), "loading");
        sink.write(entities)?;
    }
    Ok(())
}

/// Full run over one input directory
pub fn run(config: &Config, now: NaiveDateTime) -> Result<RunSummary> {
    let decoder = FixedWidthDecoder::new();
    let extraction = extract(&config.input_dir, &decoder)?;
    let records_decoded = extraction.records.len();
    info!(files = extraction.files.len(), records = records_decoded, "extract complete");

    let transformed = transform(extraction.records, now, config.tie_break)?;
    let entities = &transformed.entities;

    let spreadsheet = SpreadsheetSink::new(&config.output_dir);
    let database = SqliteSink::new(&config.database);
    let csv = CsvSink::new(&config.output_dir);
    let mut sinks: Vec<&dyn EntitySink> = vec![&spreadsheet, &database];
    if config.write_csv {
        sinks.push(&csv);
    }
    load(entities, &sinks)?;

    let summary = RunSummary {
        files_read: extraction.files.len(),
        records_decoded,
        records_kept: entities.customers.len(),
        customers: entities.customers.len(),
        emails: entities.emails.len(),
        phones: entities.phones.len(),
        catalog_entries: transformed.catalog.len(),
        flagged_customers: entities
            .customers
            .iter()
            .filter(|c| c.best_contact_occupation)
            .count(),
    };
    info!(?summary, "run complete");

    Ok(summary)
}
