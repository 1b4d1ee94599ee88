// Sink - persists the three entities
// Workbooks (.xlsx), SQLite tables and optional CSV files, all with replace semantics

use crate::entities::{Customer, Email, Entities, Phone};
use crate::error::Result;
use rusqlite::{params, Connection};
use rust_xlsxwriter::Workbook;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// ============================================================================
// TABLES
// ============================================================================

/// The three output tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Customers,
    Emails,
    Phones,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Customers, Table::Emails, Table::Phones];

    /// Table, sheet and file stem
    pub fn name(&self) -> &'static str {
        match self {
            Table::Customers => "customers",
            Table::Emails => "emails",
            Table::Phones => "phones",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Table::Customers => CUSTOMER_COLUMNS,
            Table::Emails => EMAIL_COLUMNS,
            Table::Phones => PHONE_COLUMNS,
        }
    }
}

const CUSTOMER_COLUMNS: &[&str] = &[
    "fiscal_id",
    "first_name",
    "last_name",
    "gender",
    "birth_date",
    "age",
    "age_group",
    "due_date",
    "delinquency",
    "due_balance",
    "address",
    "ocupation",
    "best_contact_ocupation",
];
const EMAIL_COLUMNS: &[&str] = &["fiscal_id", "email", "status", "priority"];
const PHONE_COLUMNS: &[&str] = &["fiscal_id", "phone", "status", "priority"];

// ============================================================================
// SHEET ROWS
// ============================================================================

/// One cell of a sheet row; None leaves the cell blank
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell<'a> {
    Text(Option<&'a str>),
    Int(Option<i64>),
}

/// Row values in column order
pub trait SheetRow {
    fn cells(&self) -> Vec<Cell<'_>>;
}

impl SheetRow for Customer {
    fn cells(&self) -> Vec<Cell<'_>> {
        vec![
            Cell::Text(Some(&self.fiscal_id)),
            Cell::Text(self.first_name.as_deref()),
            Cell::Text(self.last_name.as_deref()),
            Cell::Text(self.gender.as_deref()),
            Cell::Text(self.birth_date.as_deref()),
            Cell::Int(Some(self.age)),
            Cell::Text(self.age_group.as_deref()),
            Cell::Text(self.due_date.as_deref()),
            Cell::Int(self.delinquency),
            Cell::Int(self.due_balance),
            Cell::Text(self.address.as_deref()),
            Cell::Text(self.occupation.as_deref()),
            Cell::Int(Some(i64::from(self.best_contact_occupation))),
        ]
    }
}

impl SheetRow for Email {
    fn cells(&self) -> Vec<Cell<'_>> {
        vec![
            Cell::Text(Some(&self.fiscal_id)),
            Cell::Text(Some(&self.email)),
            Cell::Text(self.status.as_deref()),
            Cell::Int(self.priority),
        ]
    }
}

impl SheetRow for Phone {
    fn cells(&self) -> Vec<Cell<'_>> {
        vec![
            Cell::Text(Some(&self.fiscal_id)),
            Cell::Int(Some(self.phone)),
            Cell::Text(self.status.as_deref()),
            Cell::Int(self.priority),
        ]
    }
}

// ============================================================================
// SINK TRAIT
// ============================================================================

/// Destination for finalized entities
pub trait EntitySink {
    fn write(&self, entities: &Entities) -> Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// SPREADSHEET SINK
// ============================================================================

/// One workbook per entity inside an output directory
pub struct SpreadsheetSink {
    output_dir: PathBuf,
}

impl SpreadsheetSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        SpreadsheetSink {
            output_dir: output_dir.into(),
        }
    }

    pub fn path_for(&self, table: Table) -> PathBuf {
        self.output_dir.join(format!("{}.xlsx", table.name()))
    }

    fn write_workbook<T: SheetRow>(&self, table: Table, rows: &[T]) -> Result<()> {
        let path = self.path_for(table);
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(table.name())?;

        for (col, header) in table.columns().iter().enumerate() {
            sheet.write_string(0, col as u16, *header)?;
        }

        for (idx, row) in rows.iter().enumerate() {
            let line = (idx + 1) as u32;
            for (col, cell) in row.cells().into_iter().enumerate() {
                match cell {
                    Cell::Text(Some(text)) => {
                        sheet.write_string(line, col as u16, text)?;
                    }
                    Cell::Int(Some(n)) => {
                        sheet.write_number(line, col as u16, n as f64)?;
                    }
                    Cell::Text(None) | Cell::Int(None) => {}
                }
            }
        }

        // save() truncates an existing file
        workbook.save(&path)?;

        info!(file = %path.display(), rows = rows.len(), "wrote workbook");
        Ok(())
    }
}

impl EntitySink for SpreadsheetSink {
    fn write(&self, entities: &Entities) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;

        self.write_workbook(Table::Customers, &entities.customers)?;
        self.write_workbook(Table::Emails, &entities.emails)?;
        self.write_workbook(Table::Phones, &entities.phones)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "spreadsheet"
    }
}

// ============================================================================
// CSV SINK
// ============================================================================

/// One CSV file per entity, written next to the workbooks on request
pub struct CsvSink {
    output_dir: PathBuf,
}

impl CsvSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        CsvSink {
            output_dir: output_dir.into(),
        }
    }

    pub fn path_for(&self, table: Table) -> PathBuf {
        self.output_dir.join(format!("{}.csv", table.name()))
    }

    fn write_table<T: Serialize>(&self, table: Table, rows: &[T]) -> Result<()> {
        let path = self.path_for(table);
        let mut writer = csv::Writer::from_path(&path)?;

        // serialize() only emits headers with the first row
        if rows.is_empty() {
            writer.write_record(table.columns())?;
        }
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        info!(file = %path.display(), rows = rows.len(), "wrote csv");
        Ok(())
    }
}

impl EntitySink for CsvSink {
    fn write(&self, entities: &Entities) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;

        self.write_table(Table::Customers, &entities.customers)?;
        self.write_table(Table::Emails, &entities.emails)?;
        self.write_table(Table::Phones, &entities.phones)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "csv"
    }
}

// ============================================================================
// SQLITE SINK
// ============================================================================

/// Three tables in one SQLite database file
pub struct SqliteSink {
    db_path: PathBuf,
}

impl SqliteSink {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        SqliteSink {
            db_path: db_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

impl EntitySink for SqliteSink {
    fn write(&self, entities: &Entities) -> Result<()> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut conn = Connection::open(&self.db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        // Replace all three tables or none
        let tx = conn.transaction()?;
        setup_tables(&tx)?;
        insert_customers(&tx, &entities.customers)?;
        insert_emails(&tx, &entities.emails)?;
        insert_phones(&tx, &entities.phones)?;
        tx.commit()?;

        info!(db = %self.db_path.display(), "wrote database tables");
        Ok(())
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

/// Drop and recreate the entity tables
pub fn setup_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS customers;
         DROP TABLE IF EXISTS emails;
         DROP TABLE IF EXISTS phones;

         CREATE TABLE customers (
            fiscal_id TEXT NOT NULL,
            first_name TEXT,
            last_name TEXT,
            gender TEXT,
            birth_date TEXT,
            age INTEGER NOT NULL,
            age_group TEXT,
            due_date TEXT,
            delinquency INTEGER,
            due_balance INTEGER,
            address TEXT,
            ocupation TEXT,
            best_contact_ocupation INTEGER NOT NULL
         );

         CREATE TABLE emails (
            fiscal_id TEXT NOT NULL,
            email TEXT NOT NULL,
            status TEXT,
            priority INTEGER
         );

         CREATE TABLE phones (
            fiscal_id TEXT NOT NULL,
            phone INTEGER NOT NULL,
            status TEXT,
            priority INTEGER
         );",
    )?;
    Ok(())
}

pub fn insert_customers(conn: &Connection, customers: &[Customer]) -> Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO customers (
            fiscal_id, first_name, last_name, gender, birth_date, age, age_group,
            due_date, delinquency, due_balance, address, ocupation, best_contact_ocupation
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    )?;

    for c in customers {
        stmt.execute(params![
            c.fiscal_id,
            c.first_name,
            c.last_name,
            c.gender,
            c.birth_date,
            c.age,
            c.age_group,
            c.due_date,
            c.delinquency,
            c.due_balance,
            c.address,
            c.occupation,
            i64::from(c.best_contact_occupation),
        ])?;
    }

    Ok(customers.len())
}

pub fn insert_emails(conn: &Connection, emails: &[Email]) -> Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO emails (fiscal_id, email, status, priority) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for e in emails {
        stmt.execute(params![e.fiscal_id, e.email, e.status, e.priority])?;
    }
    Ok(emails.len())
}

pub fn insert_phones(conn: &Connection, phones: &[Phone]) -> Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO phones (fiscal_id, phone, status, priority) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for p in phones {
        stmt.execute(params![p.fiscal_id, p.phone, p.status, p.priority])?;
    }
    Ok(phones.len())
}

/// Row count of one entity table
pub fn count_rows(conn: &Connection, table: Table) -> Result<i64> {
    let sql = match table {
        Table::Customers => "SELECT COUNT(*) FROM customers",
        Table::Emails => "SELECT COUNT(*) FROM emails",
        Table::Phones => "SELECT COUNT(*) FROM phones",
    };
    let count: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn sample() -> Entities {
        Entities {
            customers: vec![Customer {
                fiscal_id: "12345678".to_string(),
                first_name: Some("JUAN".to_string()),
                last_name: None,
                gender: Some("M".to_string()),
                birth_date: Some("1990-05-15".to_string()),
                age: 34,
                age_group: Some("3".to_string()),
                due_date: Some("2023-01-01".to_string()),
                delinquency: Some(517),
                due_balance: Some(100),
                address: None,
                occupation: Some("CHEF".to_string()),
                best_contact_occupation: true,
            }],
            emails: vec![Email {
                fiscal_id: "12345678".to_string(),
                email: "A@B.COM".to_string(),
                status: Some("VALIDO".to_string()),
                priority: Some(1),
            }],
            phones: vec![],
        }
    }

    fn sheet_rows(path: &Path, sheet: &str) -> Vec<Vec<Data>> {
        let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
        let range = workbook.worksheet_range(sheet).unwrap();
        range.rows().map(|r| r.to_vec()).collect()
    }

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    #[test]
    fn test_table_columns_match_cells() {
        let entities = sample();
        assert_eq!(
            entities.customers[0].cells().len(),
            Table::Customers.columns().len()
        );
        assert_eq!(entities.emails[0].cells().len(), Table::Emails.columns().len());
    }

    #[test]
    fn test_sqlite_sink_writes_tables() {
        let dir = tempdir().unwrap();
        let sink = SqliteSink::new(dir.path().join("out.db3"));
        sink.write(&sample()).unwrap();

        let conn = Connection::open(sink.path()).unwrap();
        assert_eq!(count_rows(&conn, Table::Customers).unwrap(), 1);
        assert_eq!(count_rows(&conn, Table::Emails).unwrap(), 1);
        assert_eq!(count_rows(&conn, Table::Phones).unwrap(), 0);

        let flag: i64 = conn
            .query_row(
                "SELECT best_contact_ocupation FROM customers WHERE fiscal_id = '12345678'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(flag, 1);
    }

    #[test]
    fn test_sqlite_sink_replaces_previous_run() {
        let dir = tempdir().unwrap();
        let sink = SqliteSink::new(dir.path().join("out.db3"));
        sink.write(&sample()).unwrap();
        sink.write(&sample()).unwrap();

        let conn = Connection::open(sink.path()).unwrap();
        assert_eq!(count_rows(&conn, Table::Customers).unwrap(), 1);
    }

    #[test]
    fn test_spreadsheet_sink_writes_workbooks() {
        let dir = tempdir().unwrap();
        let sink = SpreadsheetSink::new(dir.path().join("output"));
        sink.write(&sample()).unwrap();

        let rows = sheet_rows(&sink.path_for(Table::Customers), "customers");
        assert_eq!(rows.len(), 2);
        let header: Vec<Data> = CUSTOMER_COLUMNS.iter().map(|c| text(c)).collect();
        assert_eq!(rows[0], header);
        assert_eq!(rows[1][0], text("12345678"));
        assert_eq!(rows[1][2], Data::Empty);
        assert_eq!(rows[1][5], Data::Float(34.0));
        // flag stored as 0/1, same as the database
        assert_eq!(rows[1][12], Data::Float(1.0));

        // empty entity still gets its header row
        let phones = sheet_rows(&sink.path_for(Table::Phones), "phones");
        let header: Vec<Data> = PHONE_COLUMNS.iter().map(|c| text(c)).collect();
        assert_eq!(phones, vec![header]);
    }

    #[test]
    fn test_spreadsheet_sink_replaces_previous_run() {
        let dir = tempdir().unwrap();
        let sink = SpreadsheetSink::new(dir.path());
        let mut entities = sample();
        entities.customers.push(entities.customers[0].clone());
        sink.write(&entities).unwrap();
        sink.write(&sample()).unwrap();

        let rows = sheet_rows(&sink.path_for(Table::Customers), "customers");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_csv_sink_flag_matches_database() {
        let dir = tempdir().unwrap();
        let sink = CsvSink::new(dir.path());
        sink.write(&sample()).unwrap();

        let customers = fs::read_to_string(sink.path_for(Table::Customers)).unwrap();
        let mut lines = customers.lines();
        assert_eq!(lines.next(), Some(CUSTOMER_COLUMNS.join(",").as_str()));
        assert_eq!(
            lines.next(),
            Some("12345678,JUAN,,M,1990-05-15,34,3,2023-01-01,517,100,,CHEF,1")
        );

        let phones = fs::read_to_string(sink.path_for(Table::Phones)).unwrap();
        assert_eq!(phones.trim_end(), PHONE_COLUMNS.join(","));
    }
}
