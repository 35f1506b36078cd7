use std::fs;
use std::path::Path;

use rusqlite::types::Value;
use rusqlite::Connection;

use cricket_analytics::{corpus, db, queries, MatchFormat, MatchRow, PipelineError};

fn write_doc(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).expect("failed writing match document");
}

fn match_doc(match_type: &str, teams: [&str; 2], winner: &str, toss_winner: &str) -> String {
    serde_json::json!({
        "meta": { "data_version": "1.0.0" },
        "info": {
            "match_type": match_type,
            "teams": teams,
            "dates": ["2019-06-16"],
            "venue": "Old Trafford",
            "city": "Manchester",
            "toss": { "winner": toss_winner, "decision": "field" },
            "outcome": { "winner": winner }
        }
    })
    .to_string()
}

#[test]
fn three_document_scenario() {
    let raw = tempfile::tempdir().expect("failed creating tempdir");
    let nested = raw.path().join("odis_json");
    fs::create_dir_all(&nested).expect("failed creating subdir");

    write_doc(raw.path(), "1001.json", &match_doc("Test", ["A", "B"], "A", "A"));
    write_doc(&nested, "2001.json", &match_doc("ODI", ["A", "C"], "C", "A"));
    write_doc(raw.path(), "broken.json", "{ \"info\": { \"match_type\": ");
    write_doc(raw.path(), "README.txt", "not a match document");

    let extraction = corpus::extract_dir(raw.path(), "json").expect("extraction should succeed");
    assert_eq!(extraction.processed, 2);
    assert_eq!(extraction.failed, 1);

    let parts = corpus::build_partitions(extraction.rows, raw.path()).expect("partitions");
    assert_eq!(parts.test.len(), 1);
    assert_eq!(parts.odi.len(), 1);
    assert_eq!(parts.t20.len(), 0);
    assert_eq!(parts.total(), 2);

    let conn = Connection::open_in_memory().expect("in-memory db");
    db::replace_partitions(&conn, &parts).expect("store write");

    let report = db::verify(&conn).expect("verify");
    assert_eq!(report.count("test_matches"), Some(1));
    assert_eq!(report.count("odi_matches"), Some(1));
    assert_eq!(report.count("t20_matches"), Some(0));

    let played = queries::run(&conn, queries::find(3).expect("query 3")).expect("query 3 runs");
    let a = played.find("team", "A").expect("team A present");
    assert_eq!(a[1], Value::Integer(2));

    let wins = queries::run(&conn, queries::find(4).expect("query 4")).expect("query 4 runs");
    let a = wins.find("winner", "A").expect("team A has a win");
    assert_eq!(a[1], Value::Integer(1));
}

#[test]
fn untracked_formats_are_excluded_from_totals() {
    let raw = tempfile::tempdir().expect("failed creating tempdir");
    write_doc(raw.path(), "1.json", &match_doc("T20", ["X", "Y"], "X", "Y"));
    write_doc(raw.path(), "2.json", &match_doc("IT20", ["X", "Y"], "Y", "Y"));
    write_doc(raw.path(), "3.json", &match_doc("MDM", ["X", "Y"], "", "Y"));
    write_doc(raw.path(), "4.json", &match_doc(" test ", ["X", "Y"], "", "X"));

    let extraction = corpus::extract_dir(raw.path(), "json").expect("extraction");
    assert_eq!(extraction.rows.len(), 4);
    let parts = corpus::partition(extraction.rows);
    assert_eq!(parts.total(), 2);
    assert_eq!(parts.dropped, 2);
    assert_eq!(parts.test[0].row.match_type, "test");
}

#[test]
fn discovery_is_sorted_and_filtered_by_suffix() {
    let raw = tempfile::tempdir().expect("failed creating tempdir");
    let sub = raw.path().join("b");
    fs::create_dir_all(&sub).expect("subdir");
    write_doc(raw.path(), "c.json", "{}");
    write_doc(&sub, "a.json", "{}");
    write_doc(raw.path(), "a.json", "{}");
    write_doc(raw.path(), "a.yaml", "info: {}");

    let paths = corpus::discover(raw.path(), "json").expect("discover");
    let names: Vec<String> = paths
        .iter()
        .map(|p| p.strip_prefix(raw.path()).expect("under root").to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.json", "b/a.json", "c.json"]);
}

#[test]
fn empty_and_missing_roots_fail() {
    let raw = tempfile::tempdir().expect("failed creating tempdir");
    write_doc(raw.path(), "bad.json", "not json");
    let err = corpus::extract_dir(raw.path(), "json").unwrap_err();
    assert!(matches!(err, PipelineError::EmptyCorpus { .. }));

    let err = corpus::extract_dir(&raw.path().join("missing"), "json").unwrap_err();
    assert!(matches!(err, PipelineError::MissingRoot { .. }));
}

#[test]
fn csv_artifact_round_trips_empty_fields() {
    let dir = tempfile::tempdir().expect("failed creating tempdir");
    let path = dir.path().join("processed_matches.csv");
    let rows = vec![
        MatchRow {
            file_name: "1.json".into(),
            match_type: "ODI".into(),
            team1: "Sri Lanka".into(),
            team2: "Pakistan".into(),
            date: "2009-01-30".into(),
            venue: "R Premadasa Stadium, Colombo".into(),
            city: "Colombo".into(),
            toss_winner: "Pakistan".into(),
            toss_decision: "bat".into(),
            winner: "Sri Lanka".into(),
        },
        MatchRow {
            file_name: "2.json".into(),
            match_type: "Test".into(),
            team1: "England".into(),
            ..Default::default()
        },
    ];
    corpus::write_csv(&path, &rows).expect("write csv");

    let header = fs::read_to_string(&path).expect("read csv");
    assert!(header.starts_with(
        "file_name,match_type,team1,team2,date,venue,city,toss_winner,toss_decision,winner"
    ));

    let back = corpus::read_csv(&path).expect("read back");
    assert_eq!(back, rows);
}

#[test]
fn store_round_trip_matches_partition() {
    let dir = tempfile::tempdir().expect("failed creating tempdir");
    let rows = vec![
        MatchRow {
            file_name: "10.json".into(),
            match_type: "T20".into(),
            team1: "India".into(),
            team2: "Australia".into(),
            date: "2016-03-27".into(),
            venue: "Punjab Cricket Association IS Bindra Stadium, Mohali".into(),
            city: "Chandigarh".into(),
            toss_winner: "Australia".into(),
            toss_decision: "bat".into(),
            winner: "India".into(),
        },
        MatchRow {
            file_name: "11.json".into(),
            match_type: "t20".into(),
            team1: "Ireland".into(),
            ..Default::default()
        },
    ];
    let parts = corpus::partition(rows);

    let conn = db::connect(&dir.path().join("cricket.db")).expect("open db");
    db::replace_partitions(&conn, &parts).expect("store write");
    for format in MatchFormat::ALL {
        let back = db::read_partition(&conn, format).expect("read back");
        assert_eq!(back.as_slice(), parts.get(format));
    }
}
