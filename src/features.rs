// Feature Deriver - age, age bracket, delinquency, fiscal id,
// and the occupation contact catalog behind the best-contact flag

use crate::error::{EtlError, Result, RowRef};
use crate::record::Record;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;
use tracing::info;

/// Contact status that counts toward the catalog (post-normalization)
pub const VALID_STATUS: &str = "VALIDO";

/// Upper bounds of the age brackets, labels "1".."6".
/// Brackets are (0,20], (20,30], (30,40], (40,50], (50,60], (60,200].
const AGE_BOUNDS: [(i64, &str); 6] = [
    (20, "1"),
    (30, "2"),
    (40, "3"),
    (50, "4"),
    (60, "5"),
    (200, "6"),
];

// ============================================================================
// DATE DERIVATIONS
// ============================================================================

/// Parse `YYYY-MM-DD`, optionally followed by a time part
pub fn parse_date(value: &str, field: &'static str, row: &RowRef) -> Result<NaiveDate> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| {
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date())
        })
        .or_else(|_| {
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date())
        })
        .map_err(|_| EtlError::InvalidDate {
            field,
            row: row.clone(),
            value: value.to_string(),
        })
}

/// Whole years, counting this year only once the birthday has passed
pub fn age(birth_date: NaiveDate, today: NaiveDate) -> i64 {
    let before_birthday = (today.month(), today.day()) < (birth_date.month(), birth_date.day());
    (today.year() - birth_date.year()) as i64 - i64::from(before_birthday)
}

/// Bracket label for an age; None outside (0, 200]
pub fn age_group(age: i64) -> Option<&'static str> {
    if age <= 0 {
        return None;
    }
    AGE_BOUNDS
        .iter()
        .find(|(upper, _)| age <= *upper)
        .map(|(_, label)| *label)
}

/// Whole days from the due date (at midnight) to now, floored.
/// Negative when the due date is still ahead.
pub fn delinquency(due_date: NaiveDate, now: NaiveDateTime) -> i64 {
    (now.date() - due_date).num_days()
}

// ============================================================================
// OCCUPATION CONTACT CATALOG
// ============================================================================

/// How to choose between fiscal ids tied on valid-contact count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TieBreak {
    /// Smallest fiscal id (string order)
    #[default]
    LowestFiscalId,
    /// The pair that appeared first in the input
    FirstSeen,
}

impl TieBreak {
    pub fn as_str(&self) -> &'static str {
        match self {
            TieBreak::LowestFiscalId => "lowest-fiscal-id",
            TieBreak::FirstSeen => "first-seen",
        }
    }

    /// Ordering between two tied candidates; Less means `a` wins
    pub fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        match self {
            TieBreak::LowestFiscalId => a.fiscal_id.cmp(&b.fiscal_id),
            TieBreak::FirstSeen => a.first_seen.cmp(&b.first_seen),
        }
    }
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lowest-fiscal-id" | "lowest" => Ok(TieBreak::LowestFiscalId),
            "first-seen" | "first" => Ok(TieBreak::FirstSeen),
            other => Err(format!(
                "unknown tie-break '{}', expected lowest-fiscal-id or first-seen",
                other
            )),
        }
    }
}

/// One (occupation, fiscal id) pair with its valid-contact count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub fiscal_id: String,
    pub count: usize,
    /// Index of the first valid row for this pair
    pub first_seen: usize,
}

/// Occupation → selected fiscal id
#[derive(Debug, Clone, Default)]
pub struct OccupationCatalog {
    pub entries: BTreeMap<String, Candidate>,
}

impl OccupationCatalog {
    /// Count valid contacts per (occupation, fiscal id) and keep the
    /// highest count per occupation. Rows without an occupation are ignored.
    pub fn build(rows: &[(String, &Record)], tie_break: TieBreak) -> Self {
        let mut counts: HashMap<(&str, &str), Candidate> = HashMap::new();

        for (idx, (fiscal_id, record)) in rows.iter().enumerate() {
            if record.contact_status.as_deref() != Some(VALID_STATUS) {
                continue;
            }
            let Some(occupation) = record.occupation.as_deref() else {
                continue;
            };
            counts
                .entry((occupation, fiscal_id.as_str()))
                .or_insert_with(|| Candidate {
                    fiscal_id: fiscal_id.clone(),
                    count: 0,
                    first_seen: idx,
                })
                .count += 1;
        }

        let mut entries: BTreeMap<String, Candidate> = BTreeMap::new();
        for ((occupation, _), candidate) in counts {
            let replace = entries
                .get(occupation)
                .map_or(true, |best| prefer(&candidate, best, tie_break));
            if replace {
                entries.insert(occupation.to_string(), candidate);
            }
        }

        OccupationCatalog { entries }
    }

    pub fn selected(&self, occupation: &str) -> Option<&str> {
        self.entries.get(occupation).map(|c| c.fiscal_id.as_str())
    }

    /// All selected fiscal ids
    pub fn fiscal_ids(&self) -> HashSet<&str> {
        self.entries.values().map(|c| c.fiscal_id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Higher count wins, ties go to the policy
fn prefer(candidate: &Candidate, best: &Candidate, tie_break: TieBreak) -> bool {
    match candidate.count.cmp(&best.count) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => tie_break.compare(candidate, best) == Ordering::Less,
    }
}

// ============================================================================
// ENRICHED RECORD
// ============================================================================

/// Normalized record plus its derived attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enriched {
    pub record: Record,
    pub fiscal_id: String,
    pub age: i64,
    pub age_group: Option<&'static str>,
    pub delinquency: Option<i64>,
    pub best_contact_occupation: bool,
}

#[derive(Debug, Default)]
pub struct Derived {
    pub rows: Vec<Enriched>,
    pub catalog: OccupationCatalog,
}

/// Run every derivation over the full set. `now` is the run time.
pub fn derive(records: Vec<Record>, now: NaiveDateTime, tie_break: TieBreak) -> Result<Derived> {
    let today = now.date();

    // Dates first: any unparsable value aborts before the catalog is built
    let mut dated = Vec::with_capacity(records.len());
    for record in &records {
        let birth = match record.birth_date.as_deref() {
            Some(value) => parse_date(value, "fecha_nacimiento", &record.row)?,
            None => {
                return Err(EtlError::MissingValue {
                    field: "fecha_nacimiento",
                    row: record.row.clone(),
                })
            }
        };
        let due = record
            .due_date
            .as_deref()
            .map(|value| parse_date(value, "fecha_vencimiento", &record.row))
            .transpose()?;
        dated.push((birth, due));
    }

    let keyed: Vec<(String, &Record)> = records.iter().map(|r| (r.fiscal_id(), r)).collect();
    let catalog = OccupationCatalog::build(&keyed, tie_break);
    let flagged = catalog.fiscal_ids();

    let rows: Vec<Enriched> = keyed
        .iter()
        .zip(dated)
        .map(|((fiscal_id, record), (birth, due))| {
            let years = age(birth, today);
            Enriched {
                record: (*record).clone(),
                best_contact_occupation: flagged.contains(fiscal_id.as_str()),
                fiscal_id: fiscal_id.clone(),
                age: years,
                age_group: age_group(years),
                delinquency: due.map(|d| delinquency(d, now)),
            }
        })
        .collect();

    info!(
        rows = rows.len(),
        catalog = catalog.len(),
        flagged = rows.iter().filter(|r| r.best_contact_occupation).count(),
        tie_break = tie_break.as_str(),
        "derived features"
    );

    Ok(Derived { rows, catalog })
}
