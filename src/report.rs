use std::time::Duration;

use rusqlite::types::Value;
use serde::Serialize;

use crate::db::ResultTable;
use crate::queries::BatchReport;

/// Display text for a single cell. NULL renders as an empty cell.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

fn is_numeric(value: &Value) -> bool {
    matches!(value, Value::Integer(_) | Value::Real(_))
}

/// psql-style grid. Numeric columns are right-aligned.
pub fn render_table(table: &ResultTable) -> String {
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|r| r.iter().map(cell_text).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .filter_map(|r| r.get(i))
                .map(|s| s.chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let right: Vec<bool> = (0..table.columns.len())
        .map(|i| {
            let mut seen = table
                .rows
                .iter()
                .filter_map(|r| r.get(i))
                .filter(|v| !matches!(v, Value::Null));
            let first = seen.next();
            first.is_some_and(is_numeric) && seen.all(is_numeric)
        })
        .collect();

    let dashes: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
    let inner = dashes.join("+");
    let line = |values: &[String], align: bool| -> String {
        let padded: Vec<String> = values
            .iter()
            .zip(&widths)
            .zip(&right)
            .map(|((v, w), r)| {
                if align && *r {
                    format!(" {:>w$} ", v, w = *w)
                } else {
                    format!(" {:<w$} ", v, w = *w)
                }
            })
            .collect();
        format!("|{}|", padded.join("|"))
    };

    let border = format!("+{inner}+");
    let mut out = Vec::with_capacity(cells.len() + 4);
    out.push(border.clone());
    out.push(line(&table.columns, false));
    out.push(format!("|{inner}|"));
    for r in &cells {
        out.push(line(r, true));
    }
    out.push(border);
    out.join("\n")
}

pub fn print_batch(report: &BatchReport) {
    for outcome in &report.outcomes {
        println!("\n=== Query {}: {} ===", outcome.spec.id, outcome.spec.title);
        match &outcome.result {
            Ok(table) => println!("{}", render_table(table)),
            Err(e) => println!("Error executing query {}: {}", outcome.spec.id, e),
        }
    }

    let failed: Vec<String> = report
        .failures()
        .map(|o| o.spec.id.to_string())
        .collect();
    if failed.is_empty() {
        println!("\nAll {} queries executed successfully", report.succeeded());
    } else {
        println!(
            "\n{} queries succeeded, {} failed (ids: {})",
            report.succeeded(),
            failed.len(),
            failed.join(", ")
        );
    }
}

// ── JSON export ──

#[derive(Serialize)]
pub struct QueryExport<'a> {
    pub id: u8,
    pub title: &'a str,
    pub columns: &'a [String],
    pub rows: Vec<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn cell_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Real(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Blob(b) => serde_json::Value::from(b.clone()),
    }
}

/// One JSON object per query, for the charting side.
pub fn export_json(report: &BatchReport) -> serde_json::Result<String> {
    const NO_COLUMNS: &[String] = &[];
    let items: Vec<QueryExport> = report
        .outcomes
        .iter()
        .map(|o| match &o.result {
            Ok(t) => QueryExport {
                id: o.spec.id,
                title: o.spec.title,
                columns: &t.columns,
                rows: t.rows.iter().map(|r| r.iter().map(cell_json).collect()).collect(),
                error: None,
            },
            Err(e) => QueryExport {
                id: o.spec.id,
                title: o.spec.title,
                columns: NO_COLUMNS,
                rows: Vec::new(),
                error: Some(e.to_string()),
            },
        })
        .collect();
    serde_json::to_string_pretty(&items)
}

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
