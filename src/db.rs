use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params, Connection, Transaction};
use tracing::{debug, info};

use crate::corpus::{MatchFormat, MatchRecord, Partitions};
use crate::error::{PipelineError, Result};
use crate::extract::MatchRow;

/// Column order shared by all three partition tables.
pub const COLUMNS: [&str; 11] = [
    "match_id",
    "file_name",
    "match_type",
    "team1",
    "team2",
    "date",
    "venue",
    "city",
    "toss_winner",
    "toss_decision",
    "winner",
];

pub fn connect(path: &Path) -> Result<Connection> {
    let open_err = |source| PipelineError::StoreOpen {
        path: path.to_path_buf(),
        source,
    };
    let conn = Connection::open(path).map_err(open_err)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;").map_err(open_err)?;
    Ok(conn)
}

fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE {table} (
            match_id      INTEGER PRIMARY KEY,
            file_name     TEXT,
            match_type    TEXT,
            team1         TEXT,
            team2         TEXT,
            date          TEXT,
            venue         TEXT,
            city          TEXT,
            toss_winner   TEXT,
            toss_decision TEXT,
            winner        TEXT
        )"
    )
}

/// Empty strings are stored as NULL so catalog filters treat them as missing.
fn nullable(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

// ── Writes ──

/// Drop, recreate and fill all three partition tables in one transaction.
///
/// Nothing is visible to other connections until every table is written; any
/// failure rolls the whole replace back.
pub fn replace_partitions(conn: &Connection, parts: &Partitions) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|source| PipelineError::StoreWrite {
            table: "*".to_string(),
            source,
        })?;
    for format in MatchFormat::ALL {
        let table = format.table();
        replace_table(&tx, table, parts.get(format)).map_err(|source| {
            PipelineError::StoreWrite {
                table: table.to_string(),
                source,
            }
        })?;
        debug!(%format, table, rows = parts.get(format).len(), "table rewritten");
    }
    tx.commit().map_err(|source| PipelineError::StoreWrite {
        table: "*".to_string(),
        source,
    })?;
    info!(rows = parts.total(), "store replaced");
    Ok(())
}

fn replace_table(tx: &Transaction, table: &str, records: &[MatchRecord]) -> rusqlite::Result<()> {
    tx.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
    tx.execute_batch(&create_table_sql(table))?;
    let mut stmt = tx.prepare(&format!(
        "INSERT INTO {table} ({}) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
        COLUMNS.join(", ")
    ))?;
    for r in records {
        let m = &r.row;
        stmt.execute(params![
            r.match_id,
            nullable(&m.file_name),
            nullable(&m.match_type),
            nullable(&m.team1),
            nullable(&m.team2),
            nullable(&m.date),
            nullable(&m.venue),
            nullable(&m.city),
            nullable(&m.toss_winner),
            nullable(&m.toss_decision),
            nullable(&m.winner),
        ])?;
    }
    Ok(())
}

// ── Reads ──

/// Read a partition back, ordered by id, with NULLs restored to empty strings.
pub fn read_partition(conn: &Connection, format: MatchFormat) -> Result<Vec<MatchRecord>> {
    let select: Vec<String> = COLUMNS
        .iter()
        .skip(1)
        .map(|c| format!("COALESCE({c}, '')"))
        .collect();
    let sql = format!(
        "SELECT match_id, {} FROM {} ORDER BY match_id",
        select.join(", "),
        format.table()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(MatchRecord {
                match_id: row.get(0)?,
                row: MatchRow {
                    file_name: row.get(1)?,
                    match_type: row.get(2)?,
                    team1: row.get(3)?,
                    team2: row.get(4)?,
                    date: row.get(5)?,
                    venue: row.get(6)?,
                    city: row.get(7)?,
                    toss_winner: row.get(8)?,
                    toss_decision: row.get(9)?,
                    winner: row.get(10)?,
                },
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Tabular result of an arbitrary read query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// First row whose `column` holds the text `value`.
    pub fn find(&self, column: &str, value: &str) -> Option<&[Value]> {
        let idx = self.column(column)?;
        self.rows
            .iter()
            .find(|r| matches!(r.get(idx), Some(Value::Text(t)) if t == value))
            .map(|r| r.as_slice())
    }
}

pub fn run_sql(conn: &Connection, sql: &str) -> rusqlite::Result<ResultTable> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let width = columns.len();
    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ResultTable { columns, rows })
}

// ── Verification ──

pub struct StoreReport {
    pub tables: Vec<String>,
    /// Partition tables present in the store, with row counts.
    pub row_counts: Vec<(String, i64)>,
    /// `(column, declared type)` of `test_matches`.
    pub schema: Vec<(String, String)>,
}

impl StoreReport {
    pub fn count(&self, table: &str) -> Option<i64> {
        self.row_counts
            .iter()
            .find(|(t, _)| t == table)
            .map(|(_, n)| *n)
    }

    pub fn print(&self) {
        println!("Tables in database: {:?}", self.tables);
        for format in MatchFormat::ALL {
            match self.count(format.table()) {
                Some(n) => println!("{}: {} records", format.table(), n),
                None => println!("{}: missing", format.table()),
            }
        }
        println!("\nSchema of {}:", MatchFormat::Test.table());
        for (name, ty) in &self.schema {
            println!("{:<15} {}", name, ty);
        }
    }
}

pub fn verify(conn: &Connection) -> Result<StoreReport> {
    let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
    let tables = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut row_counts = Vec::new();
    for format in MatchFormat::ALL {
        let table = format.table();
        if tables.iter().any(|t| t == table) {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
            row_counts.push((table.to_string(), n));
        }
    }

    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", MatchFormat::Test.table()))?;
    let schema = stmt
        .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(StoreReport {
        tables,
        row_counts,
        schema,
    })
}
