//! Record extraction: one raw match document in, one flat row out.
//!
//! Every field is read through [`lookup`], which falls back to an empty string
//! on any missing key, missing index or non-scalar value. Only a document that
//! is not valid JSON at all is rejected.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PipelineError, Result};

/// One step of a lookup path into a nested document.
#[derive(Debug, Clone, Copy)]
pub enum Seg<'a> {
    Key(&'a str),
    Index(usize),
}

use Seg::{Index, Key};

/// Flat per-match row, as written to the CSV artifact.
///
/// Column order here is the CSV column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRow {
    pub file_name: String,
    pub match_type: String,
    pub team1: String,
    pub team2: String,
    pub date: String,
    pub venue: String,
    pub city: String,
    pub toss_winner: String,
    pub toss_decision: String,
    pub winner: String,
}

/// Resolve `path` in `doc`, returning `default` when any segment is absent.
///
/// Numbers and booleans at the leaf are rendered as text; null, arrays and
/// objects count as absent.
pub fn lookup(doc: &Value, path: &[Seg], default: &str) -> String {
    let mut node = doc;
    for seg in path {
        let next = match seg {
            Key(k) => node.get(*k),
            Index(i) => node.get(*i),
        };
        match next {
            Some(v) => node = v,
            None => return default.to_string(),
        }
    }
    match node {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => default.to_string(),
    }
}

fn field(doc: &Value, path: &[Seg]) -> String {
    lookup(doc, path, "")
}

/// Build a row from an already-parsed document.
pub fn extract_document(file_name: &str, doc: &Value) -> MatchRow {
    MatchRow {
        file_name: file_name.to_string(),
        match_type: field(doc, &[Key("info"), Key("match_type")]),
        team1: field(doc, &[Key("info"), Key("teams"), Index(0)]),
        team2: field(doc, &[Key("info"), Key("teams"), Index(1)]),
        date: field(doc, &[Key("info"), Key("dates"), Index(0)]),
        venue: field(doc, &[Key("info"), Key("venue")]),
        city: field(doc, &[Key("info"), Key("city")]),
        toss_winner: field(doc, &[Key("info"), Key("toss"), Key("winner")]),
        toss_decision: field(doc, &[Key("info"), Key("toss"), Key("decision")]),
        winner: field(doc, &[Key("info"), Key("outcome"), Key("winner")]),
    }
}

/// Parse raw document text. `path` is only used for naming and error reports.
pub fn extract_str(path: &Path, text: &str) -> Result<MatchRow> {
    let doc: Value = serde_json::from_str(text).map_err(|e| PipelineError::Parse {
        file: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(extract_document(&file_name(path), &doc))
}

/// Read and extract one file. Unreadable files are reported as parse failures.
pub fn extract_file(path: &Path) -> Result<MatchRow> {
    let text = fs::read_to_string(path).map_err(|e| PipelineError::Parse {
        file: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    extract_str(path, &text)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_document() {
        let doc = json!({
            "info": {
                "match_type": "Test",
                "teams": ["India", "Australia"],
                "dates": ["2021-01-07", "2021-01-08"],
                "venue": "Sydney Cricket Ground",
                "city": "Sydney",
                "toss": { "winner": "Australia", "decision": "bat" },
                "outcome": { "winner": "Australia" }
            }
        });
        let row = extract_document("1234.json", &doc);
        assert_eq!(row.file_name, "1234.json");
        assert_eq!(row.match_type, "Test");
        assert_eq!(row.team1, "India");
        assert_eq!(row.team2, "Australia");
        assert_eq!(row.date, "2021-01-07");
        assert_eq!(row.city, "Sydney");
        assert_eq!(row.toss_decision, "bat");
        assert_eq!(row.winner, "Australia");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let doc = json!({
            "info": {
                "match_type": "ODI",
                "teams": ["Kenya"],
                "dates": [],
                "outcome": { "result": "no result" }
            }
        });
        let row = extract_document("x.json", &doc);
        assert_eq!(row.match_type, "ODI");
        assert_eq!(row.team1, "Kenya");
        assert_eq!(row.team2, "");
        assert_eq!(row.date, "");
        assert_eq!(row.venue, "");
        assert_eq!(row.toss_winner, "");
        assert_eq!(row.toss_decision, "");
        assert_eq!(row.winner, "");
    }

    #[test]
    fn no_info_block() {
        let row = extract_document("empty.json", &json!({ "innings": [] }));
        assert_eq!(row, MatchRow { file_name: "empty.json".into(), ..Default::default() });
    }

    #[test]
    fn wrong_shapes_are_absent() {
        let doc = json!({ "info": { "teams": "India", "toss": null, "venue": { "name": "x" } } });
        assert_eq!(lookup(&doc, &[Key("info"), Key("teams"), Index(0)], "-"), "-");
        assert_eq!(lookup(&doc, &[Key("info"), Key("toss"), Key("winner")], "-"), "-");
        assert_eq!(lookup(&doc, &[Key("info"), Key("venue")], "-"), "-");
    }

    #[test]
    fn scalar_leaves_render_as_text() {
        let doc = json!({ "info": { "season": 2019, "neutral": true } });
        assert_eq!(lookup(&doc, &[Key("info"), Key("season")], ""), "2019");
        assert_eq!(lookup(&doc, &[Key("info"), Key("neutral")], ""), "true");
    }

    #[test]
    fn malformed_text_is_parse_failure() {
        let err = extract_str(Path::new("data/bad.json"), "{ \"info\": ").unwrap_err();
        assert!(matches!(err, PipelineError::Parse { ref file, .. } if file.ends_with("bad.json")));
    }

    #[test]
    fn unreadable_file_is_parse_failure() {
        let err = extract_file(Path::new("/nonexistent/dir/match.json")).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { .. }));
    }
}
