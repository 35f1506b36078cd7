//! Corpus building: discover raw documents, extract them, and split the
//! results into per-format partitions with sequential ids.

use std::fmt;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{PipelineError, Result};
use crate::extract::{self, MatchRow};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// The three tracked match formats. Anything else is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchFormat {
    Test,
    Odi,
    T20,
}

impl MatchFormat {
    pub const ALL: [MatchFormat; 3] = [MatchFormat::Test, MatchFormat::Odi, MatchFormat::T20];

    /// Case-insensitive, whitespace-trimmed.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "test" => Some(MatchFormat::Test),
            "odi" => Some(MatchFormat::Odi),
            "t20" => Some(MatchFormat::T20),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MatchFormat::Test => "test",
            MatchFormat::Odi => "odi",
            MatchFormat::T20 => "t20",
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            MatchFormat::Test => "test_matches",
            MatchFormat::Odi => "odi_matches",
            MatchFormat::T20 => "t20_matches",
        }
    }
}

impl fmt::Display for MatchFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A row that made it into a partition. `row.match_type` holds the
/// normalized format label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub match_id: i64,
    pub row: MatchRow,
}

#[derive(Debug, Default)]
pub struct Partitions {
    pub test: Vec<MatchRecord>,
    pub odi: Vec<MatchRecord>,
    pub t20: Vec<MatchRecord>,
    /// Rows whose match type is not one of the tracked formats.
    pub dropped: usize,
}

impl Partitions {
    pub fn get(&self, format: MatchFormat) -> &[MatchRecord] {
        match format {
            MatchFormat::Test => &self.test,
            MatchFormat::Odi => &self.odi,
            MatchFormat::T20 => &self.t20,
        }
    }

    fn get_mut(&mut self, format: MatchFormat) -> &mut Vec<MatchRecord> {
        match format {
            MatchFormat::Test => &mut self.test,
            MatchFormat::Odi => &mut self.odi,
            MatchFormat::T20 => &mut self.t20,
        }
    }

    pub fn total(&self) -> usize {
        self.test.len() + self.odi.len() + self.t20.len()
    }

    pub fn print(&self) {
        println!("Partition sizes:");
        for format in MatchFormat::ALL {
            println!("  {:<12} {} records", format.table(), self.get(format).len());
        }
        if self.dropped > 0 {
            println!("  ({} records with other match types dropped)", self.dropped);
        }
    }
}

/// Rows extracted from a directory plus per-file outcome counts.
#[derive(Debug, Default)]
pub struct Extraction {
    pub rows: Vec<MatchRow>,
    pub processed: usize,
    pub failed: usize,
}

impl Extraction {
    pub fn print(&self) {
        println!(
            "Processed {} documents ({} extracted, {} skipped).",
            self.processed + self.failed,
            self.processed,
            self.failed
        );
    }
}

/// All files under `root` ending in `.{suffix}`, sorted by path.
pub fn discover(root: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(PipelineError::MissingRoot {
            root: root.to_path_buf(),
        });
    }
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| has_suffix(p, suffix))
        .collect();
    paths.sort();
    debug!(root = %root.display(), files = paths.len(), "discovered raw documents");
    Ok(paths)
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == suffix)
}

/// Extract every path, skipping (and logging) those that fail.
pub fn extract_paths(paths: &[PathBuf]) -> Extraction {
    let pb = ProgressBar::new(paths.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let results = run_extraction(paths, &pb);
    pb.finish_and_clear();

    let mut out = Extraction::default();
    for result in results {
        match result {
            Ok(row) => {
                out.processed += 1;
                out.rows.push(row);
            }
            Err(e) => {
                out.failed += 1;
                warn!(error = %e, "skipping document");
            }
        }
    }
    out
}

#[cfg(not(feature = "rayon"))]
fn run_extraction(paths: &[PathBuf], pb: &ProgressBar) -> Vec<Result<MatchRow>> {
    paths
        .iter()
        .map(|p| {
            let r = extract::extract_file(p);
            pb.inc(1);
            r
        })
        .collect()
}

#[cfg(feature = "rayon")]
fn run_extraction(paths: &[PathBuf], pb: &ProgressBar) -> Vec<Result<MatchRow>> {
    paths
        .par_iter()
        .map(|p| {
            let r = extract::extract_file(p);
            pb.inc(1);
            r
        })
        .collect()
}

/// Discover and extract everything under `root`.
pub fn extract_dir(root: &Path, suffix: &str) -> Result<Extraction> {
    let paths = discover(root, suffix)?;
    info!(root = %root.display(), files = paths.len(), "extracting match documents");
    let extraction = extract_paths(&paths);
    if extraction.rows.is_empty() {
        return Err(PipelineError::EmptyCorpus {
            root: root.to_path_buf(),
        });
    }
    Ok(extraction)
}

/// Split rows by normalized match type and number each partition from 1.
pub fn partition(rows: Vec<MatchRow>) -> Partitions {
    let mut parts = Partitions::default();
    for mut row in rows {
        let Some(format) = MatchFormat::parse(&row.match_type) else {
            debug!(file = %row.file_name, match_type = %row.match_type, "dropping untracked format");
            parts.dropped += 1;
            continue;
        };
        row.match_type = format.to_string();
        let bucket = parts.get_mut(format);
        let match_id = bucket.len() as i64 + 1;
        bucket.push(MatchRecord { match_id, row });
    }
    parts
}

/// Partition rows, failing when none belong to a tracked format.
pub fn build_partitions(rows: Vec<MatchRow>, root: &Path) -> Result<Partitions> {
    let parts = partition(rows);
    if parts.total() == 0 {
        return Err(PipelineError::EmptyCorpus {
            root: root.to_path_buf(),
        });
    }
    info!(
        test = parts.test.len(),
        odi = parts.odi.len(),
        t20 = parts.t20.len(),
        dropped = parts.dropped,
        "partitioned corpus"
    );
    Ok(parts)
}

// ── CSV artifact ──

pub fn write_csv(path: &Path, rows: &[MatchRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_csv(path: &Path) -> Result<Vec<MatchRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<MatchRow>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(file: &str, match_type: &str) -> MatchRow {
        MatchRow {
            file_name: file.to_string(),
            match_type: match_type.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn format_parsing_normalizes() {
        assert_eq!(MatchFormat::parse(" Test "), Some(MatchFormat::Test));
        assert_eq!(MatchFormat::parse("ODI"), Some(MatchFormat::Odi));
        assert_eq!(MatchFormat::parse("t20\n"), Some(MatchFormat::T20));
        assert_eq!(MatchFormat::parse("IT20"), None);
        assert_eq!(MatchFormat::parse(""), None);
    }

    #[test]
    fn display_matches_stored_label() {
        for format in MatchFormat::ALL {
            assert_eq!(format.to_string(), format.label());
        }
        let parts = partition(vec![row("a", " T20 ")]);
        assert_eq!(parts.t20[0].row.match_type, MatchFormat::T20.to_string());
    }

    #[test]
    fn ids_are_contiguous_per_partition() {
        let rows = vec![
            row("a", "ODI"),
            row("b", "Test"),
            row("c", "MDM"),
            row("d", "odi"),
            row("e", "T20"),
            row("f", " ODI "),
        ];
        let parts = partition(rows);
        let odi_ids: Vec<i64> = parts.odi.iter().map(|r| r.match_id).collect();
        assert_eq!(odi_ids, vec![1, 2, 3]);
        assert_eq!(parts.test[0].match_id, 1);
        assert_eq!(parts.t20[0].match_id, 1);
        assert_eq!(parts.dropped, 1);
        assert_eq!(parts.total(), 5);
        assert!(parts.odi.iter().all(|r| r.row.match_type == "odi"));
        assert_eq!(parts.odi[2].row.file_name, "f");
    }

    #[test]
    fn only_untracked_formats_is_empty_corpus() {
        let err = build_partitions(vec![row("a", "IT20")], Path::new("raw")).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyCorpus { .. }));
    }

    #[test]
    fn missing_root_is_reported() {
        let err = discover(Path::new("/definitely/not/here"), "json").unwrap_err();
        assert!(matches!(err, PipelineError::MissingRoot { .. }));
    }
}
