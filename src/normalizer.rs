// Record Normalizer - two-pass clean over the whole record set
// Pass 1 classifies fields, pass 2 rewrites values

use crate::error::{EtlError, Result, RowRef};
use crate::layout::{Field, FieldKind};
use crate::record::{RawRecord, Record};
use std::collections::HashSet;
use tracing::{debug, info};

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Which fields get cleaned. A field is listed only if at least one record
/// holds a value for it; entirely empty fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub numeric: Vec<Field>,
    pub textual: Vec<Field>,
}

impl Classification {
    /// Scan the full set once
    pub fn scan(records: &[RawRecord]) -> Self {
        let mut present: HashSet<Field> = HashSet::new();
        for record in records {
            for &field in Field::ALL.iter() {
                if record.get(field).is_some() {
                    present.insert(field);
                }
            }
        }

        let mut classification = Classification::default();
        for &field in Field::ALL.iter().filter(|f| present.contains(f)) {
            match field.kind() {
                FieldKind::Numeric => classification.numeric.push(field),
                FieldKind::Textual => classification.textual.push(field),
            }
        }
        classification
    }

    pub fn is_numeric(&self, field: Field) -> bool {
        self.numeric.contains(&field)
    }

    pub fn is_textual(&self, field: Field) -> bool {
        self.textual.contains(&field)
    }
}

// ============================================================================
// NORMALIZE
// ============================================================================

/// Drop all-empty rows, classify, then clean every classified field
pub fn normalize(records: Vec<RawRecord>) -> Result<Vec<Record>> {
    let before = records.len();
    let records: Vec<RawRecord> = records.into_iter().filter(|r| !r.is_empty()).collect();
    if records.len() < before {
        debug!(dropped = before - records.len(), "dropped empty rows");
    }

    let classification = Classification::scan(&records);
    info!(
        numeric = classification.numeric.len(),
        textual = classification.textual.len(),
        "classified fields"
    );

    records
        .iter()
        .map(|raw| normalize_record(raw, &classification))
        .collect()
}

fn normalize_record(raw: &RawRecord, classification: &Classification) -> Result<Record> {
    let num = |field: Field| -> Result<Option<i64>> {
        if !classification.is_numeric(field) {
            return Ok(None);
        }
        match raw.get(field) {
            None => Ok(Some(0)),
            Some(value) => coerce_integer(value, field, &raw.row).map(Some),
        }
    };
    let text = |field: Field| -> Option<String> {
        if !classification.is_textual(field) {
            return None;
        }
        raw.get(field).map(clean_text)
    };

    Ok(Record {
        rut: num(Field::Rut)?,
        dv: text(Field::Dv),
        first_name: text(Field::Nombre),
        last_name: text(Field::Apellido),
        gender: text(Field::Genero),
        birth_date: text(Field::FechaNacimiento),
        due_date: text(Field::FechaVencimiento),
        due_balance: num(Field::Deuda)?,
        address: text(Field::Direccion),
        occupation: text(Field::Ocupacion),
        height: num(Field::Altura)?,
        weight: num(Field::Peso)?,
        email: text(Field::Correo),
        contact_status: text(Field::EstatusContacto),
        phone: num(Field::Telefono)?,
        priority: num(Field::Prioridad)?,
        row: raw.row.clone(),
    })
}

/// Trim and upper-case
pub fn clean_text(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Integer, or decimal truncated toward zero
pub fn coerce_integer(value: &str, field: Field, row: &RowRef) -> Result<i64> {
    let trimmed = value.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(n);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() && f.abs() < i64::MAX as f64 => Ok(f.trunc() as i64),
        _ => Err(EtlError::InvalidNumber {
            field: field.name(),
            row: row.clone(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw(rut: &str, dv: &str) -> RawRecord {
        RawRecord::default()
            .with(Field::Rut, rut)
            .with(Field::Dv, dv)
    }

    #[test]
    fn test_numeric_missing_becomes_zero() {
        let records = vec![
            raw("1", "1").with(Field::Telefono, "912345678"),
            raw("2", "2"),
        ];
        let out = normalize(records).unwrap();

        assert_eq!(out[0].phone, Some(912345678));
        assert_eq!(out[1].phone, Some(0));
    }

    #[test]
    fn test_entirely_missing_fields_untouched() {
        let out = normalize(vec![raw("1", "1"), raw("2", "2")]).unwrap();

        // no record had a phone or an email
        assert_eq!(out[0].phone, None);
        assert_eq!(out[1].priority, None);
        assert_eq!(out[0].email, None);
    }

    #[test]
    fn test_textual_trimmed_and_uppercased() {
        let records = vec![
            raw("1", "k")
                .with(Field::Correo, " a@b.com ")
                .with(Field::EstatusContacto, " valido "),
            raw("2", "2"),
        ];
        let out = normalize(records).unwrap();

        assert_eq!(out[0].email.as_deref(), Some("A@B.COM"));
        assert_eq!(out[0].contact_status.as_deref(), Some("VALIDO"));
        assert_eq!(out[0].dv.as_deref(), Some("K"));
        // missing textual values stay missing
        assert_eq!(out[1].email, None);
    }

    #[test]
    fn test_empty_rows_dropped() {
        let records = vec![RawRecord::default(), raw("1", "1"), RawRecord::default()];
        let out = normalize(records).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_decimal_truncates() {
        let row = RowRef::default();
        assert_eq!(coerce_integer(" 42 ", Field::Deuda, &row).unwrap(), 42);
        assert_eq!(coerce_integer("12.9", Field::Deuda, &row).unwrap(), 12);
        assert_eq!(coerce_integer("-3.5", Field::Deuda, &row).unwrap(), -3);
    }

    #[test]
    fn test_non_numeric_is_fatal() {
        let mut bad = raw("1", "1").with(Field::Telefono, "9A2");
        bad.row = RowRef {
            source_file: "in.txt".to_string(),
            line_number: 3,
        };
        let err = normalize(vec![bad]).unwrap_err();

        match err {
            EtlError::InvalidNumber { field, row, value } => {
                assert_eq!(field, "telefono");
                assert_eq!(row.line_number, 3);
                assert_eq!(value, "9A2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nan_and_inf_rejected() {
        let row = RowRef::default();
        assert!(coerce_integer("NaN", Field::Peso, &row).is_err());
        assert!(coerce_integer("inf", Field::Peso, &row).is_err());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let records = vec![
            raw(" 1234567", "8")
                .with(Field::Nombre, "  juan ")
                .with(Field::Deuda, "100.7")
                .with(Field::Correo, "x@y.cl"),
            raw("7654321", "k").with(Field::Ocupacion, "chef"),
        ];
        let once = normalize(records).unwrap();
        let again = normalize(once.iter().map(RawRecord::from).collect()).unwrap();

        assert_eq!(once, again);
    }

    #[test]
    fn test_classification_scan() {
        let records = vec![raw("1", "1").with(Field::Correo, "a")];
        let classification = Classification::scan(&records);

        assert_eq!(classification.numeric, vec![Field::Rut]);
        assert_eq!(classification.textual, vec![Field::Dv, Field::Correo]);
    }
}
