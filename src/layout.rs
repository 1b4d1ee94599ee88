// Field layout - the fixed-width line format
// Customer group followed by contact group, positionally defined

// ============================================================================
// FIELD KIND
// ============================================================================

/// Semantic type of a field, decides how the normalizer cleans it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Missing → 0, coerced to integer
    Numeric,
    /// Trimmed and upper-cased
    Textual,
}

// ============================================================================
// FIELD
// ============================================================================

/// One named field of the unified record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Rut,
    Dv,
    Nombre,
    Apellido,
    Genero,
    FechaNacimiento,
    FechaVencimiento,
    Deuda,
    Direccion,
    Ocupacion,
    Altura,
    Peso,
    Correo,
    EstatusContacto,
    Telefono,
    Prioridad,
}

impl Field {
    /// All fields in line order
    pub const ALL: [Field; 16] = [
        Field::Rut,
        Field::Dv,
        Field::Nombre,
        Field::Apellido,
        Field::Genero,
        Field::FechaNacimiento,
        Field::FechaVencimiento,
        Field::Deuda,
        Field::Direccion,
        Field::Ocupacion,
        Field::Altura,
        Field::Peso,
        Field::Correo,
        Field::EstatusContacto,
        Field::Telefono,
        Field::Prioridad,
    ];

    /// Column name as it appears in the source layout
    pub fn name(&self) -> &'static str {
        match self {
            Field::Rut => "rut",
            Field::Dv => "dv",
            Field::Nombre => "nombre",
            Field::Apellido => "apellido",
            Field::Genero => "genero",
            Field::FechaNacimiento => "fecha_nacimiento",
            Field::FechaVencimiento => "fecha_vencimiento",
            Field::Deuda => "deuda",
            Field::Direccion => "direccion",
            Field::Ocupacion => "ocupacion",
            Field::Altura => "altura",
            Field::Peso => "peso",
            Field::Correo => "correo",
            Field::EstatusContacto => "estatus_contacto",
            Field::Telefono => "telefono",
            Field::Prioridad => "prioridad",
        }
    }

    /// Width in characters
    pub fn width(&self) -> usize {
        match self {
            Field::Rut => 7,
            Field::Dv => 1,
            Field::Nombre => 20,
            Field::Apellido => 25,
            Field::Genero => 9,
            Field::FechaNacimiento => 10,
            Field::FechaVencimiento => 10,
            Field::Deuda => 6,
            Field::Direccion => 50,
            Field::Ocupacion => 30,
            Field::Altura => 4,
            Field::Peso => 2,
            Field::Correo => 50,
            Field::EstatusContacto => 8,
            Field::Telefono => 9,
            Field::Prioridad => 1,
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Rut
            | Field::Deuda
            | Field::Altura
            | Field::Peso
            | Field::Telefono
            | Field::Prioridad => FieldKind::Numeric,
            // dv stays textual: a "K" check value is legal
            _ => FieldKind::Textual,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind() == FieldKind::Numeric
    }
}

/// Total characters in a full line
pub fn line_width() -> usize {
    Field::ALL.iter().map(|f| f.width()).sum()
}

/// (field, start, end) character ranges in line order
pub fn spans() -> Vec<(Field, usize, usize)> {
    let mut start = 0;
    Field::ALL
        .iter()
        .map(|&field| {
            let end = start + field.width();
            let span = (field, start, end);
            start = end;
            span
        })
        .collect()
}
