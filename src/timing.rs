//! Timing table loading and validation
//!
//! A timing table is a CSV file with a header row and at least the columns
//! `filename` and `start_time`. Other columns are ignored.

use crate::timecode::parse_time_to_seconds;
use crate::{Error, Result, ValidationMode};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Column holding the slide image name
pub const FILENAME_COLUMN: &str = "filename";
/// Column holding the slide start time
pub const START_TIME_COLUMN: &str = "start_time";

/// Row as it appears in the table, before time parsing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawRow {
    pub filename: String,
    pub start_time: String,
}

/// One slide entry with its parsed start time
#[derive(Debug, Clone, PartialEq)]
pub struct TimingRow {
    /// Image name, matched exactly against the supplied images
    pub filename: String,
    /// Start time as written in the table
    pub start_time_raw: String,
    /// Start time in seconds
    pub start_seconds: f64,
}

/// Validated timing table, sorted by start time
#[derive(Debug, Clone)]
pub struct TimingTable {
    rows: Vec<TimingRow>,
}

/// Read the raw rows of a timing table, checking the required columns
pub fn load_rows<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let missing: Vec<String> = [FILENAME_COLUMN, START_TIME_COLUMN]
        .into_iter()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .map(str::to_string)
        .collect();

    if !missing.is_empty() {
        return Err(Error::MissingColumn { missing });
    }

    let mut rows = Vec::new();
    for (index, record) in csv_reader.deserialize::<RawRow>().enumerate() {
        let row = record?;
        if row.filename.is_empty() {
            return Err(Error::InvalidInput(format!(
                "Timing table row {} has an empty filename",
                index + 1
            )));
        }
        rows.push(row);
    }

    Ok(rows)
}

impl TimingTable {
    /// Load a timing table from a CSV file
    pub fn from_path<P: AsRef<Path>>(path: P, mode: ValidationMode) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::file_access(path, e))?;
        Self::from_reader(file, mode)
    }

    /// Load a timing table from any CSV source
    pub fn from_reader<R: Read>(reader: R, mode: ValidationMode) -> Result<Self> {
        Self::build(load_rows(reader)?, mode)
    }

    /// Parse start times, sort, and check ordering
    pub fn build(raw: Vec<RawRow>, mode: ValidationMode) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::InvalidInput("Timing table has no rows".to_string()));
        }

        let mut rows = raw
            .into_iter()
            .map(|row| {
                let start_seconds = parse_time_to_seconds(&row.start_time)?;
                Ok(TimingRow {
                    filename: row.filename,
                    start_time_raw: row.start_time,
                    start_seconds,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // Stable: rows sharing a start time keep their table order
        rows.sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));

        for (index, pair) in rows.windows(2).enumerate() {
            let (prev, cur) = (&pair[0], &pair[1]);
            if cur.start_seconds < prev.start_seconds {
                return Err(Error::NonMonotonic {
                    index: index + 1,
                    previous: prev.start_seconds,
                    current: cur.start_seconds,
                });
            }
            if cur.start_seconds == prev.start_seconds {
                match mode {
                    ValidationMode::Strict => {
                        return Err(Error::DuplicateStartTime {
                            first: prev.filename.clone(),
                            second: cur.filename.clone(),
                            seconds: cur.start_seconds,
                        });
                    }
                    ValidationMode::Lenient => {
                        tracing::warn!(
                            first = %prev.filename,
                            second = %cur.filename,
                            seconds = cur.start_seconds,
                            "slides share a start time; the earlier one will only flash"
                        );
                    }
                }
            }
        }

        Ok(Self { rows })
    }

    /// Check that every referenced image is available
    ///
    /// Reports every missing name, in table order, without duplicates.
    pub fn require_images(&self, available: &HashSet<String>) -> Result<()> {
        let mut seen = HashSet::new();
        let missing: Vec<String> = self
            .rows
            .iter()
            .filter(|row| !available.contains(&row.filename))
            .filter(|row| seen.insert(row.filename.as_str()))
            .map(|row| row.filename.clone())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingImage(missing))
        }
    }

    pub fn rows(&self) -> &[TimingRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Start times in ascending order
    pub fn start_times(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.start_seconds).collect()
    }
}

/// Names of the regular files in an image directory
pub fn list_images<P: AsRef<Path>>(dir: P) -> Result<HashSet<String>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::InvalidInput(format!(
            "Image directory not found: {}",
            dir.display()
        )));
    }

    let mut names = HashSet::new();
    let entries = std::fs::read_dir(dir).map_err(|e| Error::file_access(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::file_access(dir, e))?;
        if !entry.path().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.insert(name.to_string());
        }
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(csv: &str) -> Result<TimingTable> {
        TimingTable::from_reader(csv.as_bytes(), ValidationMode::Lenient)
    }

    fn names(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sorts_by_start_time() {
        let t = table("filename,start_time\nc.png,1:15\na.png,0\nb.png,30\n").unwrap();
        let order: Vec<&str> = t.rows().iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(order, ["a.png", "b.png", "c.png"]);
        assert_eq!(t.start_times(), vec![0.0, 30.0, 75.0]);
        assert_eq!(t.rows()[2].start_time_raw, "1:15");
    }

    #[test]
    fn test_extra_columns_and_whitespace() {
        let t = table("note, filename , start_time\nintro, a.png , 0:05 \n").unwrap();
        assert_eq!(t.rows()[0].filename, "a.png");
        assert_eq!(t.rows()[0].start_seconds, 5.0);
    }

    #[test]
    fn test_missing_columns() {
        match table("file,start_time\na.png,0\n") {
            Err(Error::MissingColumn { missing }) => assert_eq!(missing, ["filename"]),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
        match table("name,time\na.png,0\n") {
            Err(Error::MissingColumn { missing }) => {
                assert_eq!(missing, ["filename", "start_time"])
            }
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_time_format() {
        let result = table("filename,start_time\na.png,0\nb.png,soon\n");
        assert!(matches!(result, Err(Error::UnknownTimeFormat(s)) if s == "soon"));
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let err = TimingTable::from_path("/nonexistent/timing.csv", ValidationMode::Lenient)
            .unwrap_err();
        assert!(matches!(&err, Error::FileAccess { path, .. } if path.ends_with("timing.csv")));
        assert!(err.to_string().contains("/nonexistent/timing.csv"));
    }

    #[test]
    fn test_empty_table() {
        assert!(matches!(
            table("filename,start_time\n"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_duplicates_keep_table_order() {
        let t = table("filename,start_time\nb.png,10\na.png,10\nz.png,0\n").unwrap();
        let order: Vec<&str> = t.rows().iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(order, ["z.png", "b.png", "a.png"]);
    }

    #[test]
    fn test_strict_rejects_duplicates() {
        let result = TimingTable::from_reader(
            "filename,start_time\na.png,0\nb.png,0:10\nc.png,10\n".as_bytes(),
            ValidationMode::Strict,
        );
        match result {
            Err(Error::DuplicateStartTime {
                first,
                second,
                seconds,
            }) => {
                assert_eq!(first, "b.png");
                assert_eq!(second, "c.png");
                assert_eq!(seconds, 10.0);
            }
            other => panic!("expected DuplicateStartTime, got {other:?}"),
        }
    }

    #[test]
    fn test_require_images_reports_all_missing() {
        let t = table("filename,start_time\na.png,0\nb.png,1\nc.png,2\nb.png,3\n").unwrap();
        match t.require_images(&names(&["a.png"])) {
            Err(Error::MissingImage(missing)) => assert_eq!(missing, ["b.png", "c.png"]),
            other => panic!("expected MissingImage, got {other:?}"),
        }
        assert!(t
            .require_images(&names(&["a.png", "b.png", "c.png"]))
            .is_ok());
    }

    #[test]
    fn test_require_images_is_case_sensitive() {
        let t = table("filename,start_time\nSlide1.PNG,0\n").unwrap();
        assert!(matches!(
            t.require_images(&names(&["slide1.png"])),
            Err(Error::MissingImage(_))
        ));
    }
}
