// Unified record - one per input line
// RawRecord is what the decoder yields, Record is what the normalizer yields

use crate::error::RowRef;
use crate::layout::Field;

// ============================================================================
// RAW RECORD
// ============================================================================

/// Decoded line: every field as the raw characters from the file
/// (None = blank in the source)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub rut: Option<String>,
    pub dv: Option<String>,
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub genero: Option<String>,
    pub fecha_nacimiento: Option<String>,
    pub fecha_vencimiento: Option<String>,
    pub deuda: Option<String>,
    pub direccion: Option<String>,
    pub ocupacion: Option<String>,
    pub altura: Option<String>,
    pub peso: Option<String>,
    pub correo: Option<String>,
    pub estatus_contacto: Option<String>,
    pub telefono: Option<String>,
    pub prioridad: Option<String>,

    /// Provenance, not part of the field set
    pub row: RowRef,
}

impl RawRecord {
    pub fn new(row: RowRef) -> Self {
        RawRecord {
            row,
            ..Default::default()
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn set(&mut self, field: Field, value: Option<String>) {
        *self.slot_mut(field) = value;
    }

    /// Builder pattern: set one field
    pub fn with(mut self, field: Field, value: &str) -> Self {
        self.set(field, Some(value.to_string()));
        self
    }

    /// True when no field holds a value
    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|&f| self.get(f).is_none())
    }

    fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::Rut => &self.rut,
            Field::Dv => &self.dv,
            Field::Nombre => &self.nombre,
            Field::Apellido => &self.apellido,
            Field::Genero => &self.genero,
            Field::FechaNacimiento => &self.fecha_nacimiento,
            Field::FechaVencimiento => &self.fecha_vencimiento,
            Field::Deuda => &self.deuda,
            Field::Direccion => &self.direccion,
            Field::Ocupacion => &self.ocupacion,
            Field::Altura => &self.altura,
            Field::Peso => &self.peso,
            Field::Correo => &self.correo,
            Field::EstatusContacto => &self.estatus_contacto,
            Field::Telefono => &self.telefono,
            Field::Prioridad => &self.prioridad,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Rut => &mut self.rut,
            Field::Dv => &mut self.dv,
            Field::Nombre => &mut self.nombre,
            Field::Apellido => &mut self.apellido,
            Field::Genero => &mut self.genero,
            Field::FechaNacimiento => &mut self.fecha_nacimiento,
            Field::FechaVencimiento => &mut self.fecha_vencimiento,
            Field::Deuda => &mut self.deuda,
            Field::Direccion => &mut self.direccion,
            Field::Ocupacion => &mut self.ocupacion,
            Field::Altura => &mut self.altura,
            Field::Peso => &mut self.peso,
            Field::Correo => &mut self.correo,
            Field::EstatusContacto => &mut self.estatus_contacto,
            Field::Telefono => &mut self.telefono,
            Field::Prioridad => &mut self.prioridad,
        }
    }
}

// ============================================================================
// NORMALIZED RECORD
// ============================================================================

/// Cleaned record. Numeric fields are integers (None only when the whole
/// column was empty), textual fields are trimmed upper-case strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub rut: Option<i64>,
    pub dv: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<String>,
    pub due_date: Option<String>,
    pub due_balance: Option<i64>,
    pub address: Option<String>,
    pub occupation: Option<String>,
    pub height: Option<i64>,
    pub weight: Option<i64>,
    pub email: Option<String>,
    pub contact_status: Option<String>,
    pub phone: Option<i64>,
    pub priority: Option<i64>,

    pub row: RowRef,
}

impl Record {
    /// Fiscal id: rut and dv concatenated with no separator
    pub fn fiscal_id(&self) -> String {
        let rut = self.rut.map(|r| r.to_string()).unwrap_or_default();
        let dv = self.dv.as_deref().unwrap_or("");
        format!("{}{}", rut, dv)
    }
}

/// Back to decoder form, so a normalized set can be fed through again
impl From<&Record> for RawRecord {
    fn from(r: &Record) -> Self {
        let num = |v: Option<i64>| v.map(|n| n.to_string());
        RawRecord {
            rut: num(r.rut),
            dv: r.dv.clone(),
            nombre: r.first_name.clone(),
            apellido: r.last_name.clone(),
            genero: r.gender.clone(),
            fecha_nacimiento: r.birth_date.clone(),
            fecha_vencimiento: r.due_date.clone(),
            deuda: num(r.due_balance),
            direccion: r.address.clone(),
            ocupacion: r.occupation.clone(),
            altura: num(r.height),
            peso: num(r.weight),
            correo: r.email.clone(),
            estatus_contacto: r.contact_status.clone(),
            telefono: num(r.phone),
            prioridad: num(r.priority),
            row: r.row.clone(),
        }
    }
}
