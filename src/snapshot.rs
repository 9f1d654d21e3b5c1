// Snapshot store - crash-safe CSV persistence for histograms
//
// Histograms are written to a temporary file in the target directory, then
// atomically renamed over the destination: a concurrent reader never sees a
// partial file, and a crash mid-write leaves the previous snapshot intact.
// Loading replays every row through the histogram import path, which also
// absorbs bin/sector/band scheme changes between versions.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::histogram::BinHistogram;
use crate::polar::MultiPolarHistogram;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// CSV form of a histogram: a header, one row per non-empty leaf bin, and
/// the import path that rebuilds state from a row.
pub trait Snapshot {
    fn header(&self) -> &'static str;
    fn write_rows<W: Write>(&self, w: &mut W) -> io::Result<()>;
    /// Merge one parsed data row back in. The distinct-count column is
    /// optional (older files omit it).
    fn import_row(&mut self, fields: &[f64]) -> Result<(), String>;
}

impl Snapshot for BinHistogram {
    fn header(&self) -> &'static str {
        "bin_start,bin_end,weight,distinct_count"
    }

    fn write_rows<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for row in self.rows() {
            writeln!(
                w,
                "{:.2},{:.2},{:.2},{:.2}",
                row.start, row.end, row.weight, row.distinct
            )?;
        }
        Ok(())
    }

    fn import_row(&mut self, fields: &[f64]) -> Result<(), String> {
        match fields {
            [start, end, weight] => {
                self.import_interval(*start, *end, *weight, 0.0);
                Ok(())
            }
            [start, end, weight, distinct] => {
                self.import_interval(*start, *end, *weight, *distinct);
                Ok(())
            }
            _ => Err(format!("expected 3 or 4 columns, got {}", fields.len())),
        }
    }
}

impl Snapshot for MultiPolarHistogram {
    fn header(&self) -> &'static str {
        "bearing_start,bearing_end,bin_start,bin_end,weight,distinct_count"
    }

    fn write_rows<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for row in self.rows() {
            writeln!(
                w,
                "{:.2},{:.2},{:.2},{:.2},{:.2},{:.2}",
                row.bearing_start, row.bearing_end, row.start, row.end, row.weight, row.distinct
            )?;
        }
        Ok(())
    }

    fn import_row(&mut self, fields: &[f64]) -> Result<(), String> {
        match fields {
            [b_start, b_end, start, end, weight] => {
                self.import_sector(*b_start, *b_end, *start, *end, *weight, 0.0);
                Ok(())
            }
            [b_start, b_end, start, end, weight, distinct] => {
                self.import_sector(*b_start, *b_end, *start, *end, *weight, *distinct);
                Ok(())
            }
            _ => Err(format!("expected 5 or 6 columns, got {}", fields.len())),
        }
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Atomically (re)write the snapshot at `path`. On failure the previous
/// snapshot, if any, is left untouched.
pub fn save<S: Snapshot>(histo: &S, path: &Path) -> Result<(), SnapshotError> {
    let tmp = tmp_path(path);

    let write = |tmp: &Path| -> Result<(), SnapshotError> {
        let mut w = BufWriter::new(File::create(tmp)?);
        writeln!(w, "{}", histo.header())?;
        histo.write_rows(&mut w)?;
        w.flush()?;
        Ok(())
    };

    if let Err(e) = write(&tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// Read the snapshot at `path` into `histo`, returning whether a file was
/// found. A missing file is not an error (the histogram just starts empty);
/// an unreadable or malformed one is, so the caller can log a warning and
/// start fresh.
pub fn load<S: Snapshot>(histo: &mut S, path: &Path) -> Result<bool, SnapshotError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    let reader = BufReader::new(file);
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if i == 0 || line.trim().is_empty() {
            // header row
            continue;
        }
        let fields = line
            .trim()
            .split(',')
            .map(|s| s.trim().parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|e| SnapshotError::Malformed {
                line: i + 1,
                reason: e.to_string(),
            })?;
        histo
            .import_row(&fields)
            .map_err(|reason| SnapshotError::Malformed { line: i + 1, reason })?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::RANGE_BANDS;
    use tempfile::TempDir;

    #[test]
    fn test_bin_histogram_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("range.csv");

        let mut a = BinHistogram::new(110, 0.0, 440_000.0);
        a.add(33_000.0, 12.5, Some(1));
        a.add(250_000.0, 30.0, Some(2));
        save(&a, &path).unwrap();

        let mut b = BinHistogram::new(110, 0.0, 440_000.0);
        assert!(load(&mut b, &path).unwrap());
        assert!((b.total_weight() - a.total_weight()).abs() < 0.01);
        assert!((b.total_distinct() - a.total_distinct()).abs() < 0.01);

        let rows_a: Vec<_> = a.rows().collect();
        let rows_b: Vec<_> = b.rows().collect();
        assert_eq!(rows_a.len(), rows_b.len());
        for (ra, rb) in rows_a.iter().zip(&rows_b) {
            assert_eq!(ra.start, rb.start);
            assert!((ra.weight - rb.weight).abs() < 0.01);
        }
    }

    #[test]
    fn test_polar_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("polar_range.csv");

        let mut a = MultiPolarHistogram::new(&RANGE_BANDS);
        a.add(10.0, 35_000.0, 25.0, Some(0xABC001));
        a.add(200.0, 150_000.0, 60.0, Some(0xABC002));
        a.add(359.9, 399_000.0, 5.0, Some(0xABC003));
        save(&a, &path).unwrap();

        let mut b = MultiPolarHistogram::new(&RANGE_BANDS);
        assert!(load(&mut b, &path).unwrap());
        assert!((b.total_weight() - a.total_weight()).abs() < 0.05);
        assert!((b.total_distinct() - a.total_distinct()).abs() < 0.05);
    }

    #[test]
    fn test_load_missing_file_leaves_empty() {
        let dir = TempDir::new().unwrap();
        let mut h = BinHistogram::new(10, 0.0, 100.0);
        assert!(!load(&mut h, &dir.path().join("nope.csv")).unwrap());
        assert_eq!(h.total_weight(), 0.0);
    }

    #[test]
    fn test_load_corrupt_file_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "bin_start,bin_end,weight,distinct_count\nnot,numbers,at,all\n").unwrap();

        let mut h = BinHistogram::new(10, 0.0, 100.0);
        assert!(load(&mut h, &path).is_err());
    }

    #[test]
    fn test_load_wrong_column_count_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.csv");
        fs::write(&path, "bin_start,bin_end,weight,distinct_count\n1.0,2.0\n").unwrap();

        let mut h = BinHistogram::new(10, 0.0, 100.0);
        assert!(load(&mut h, &path).is_err());
    }

    #[test]
    fn test_load_without_distinct_column() {
        // Older snapshots carry only a weight column
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("old.csv");
        fs::write(&path, "bin_start,bin_end,weight\n10.00,20.00,7.50\n").unwrap();

        let mut h = BinHistogram::new(10, 0.0, 100.0);
        assert!(load(&mut h, &path).unwrap());
        assert!((h.total_weight() - 7.5).abs() < 1e-9);
        assert_eq!(h.total_distinct(), 0.0);
    }

    #[test]
    fn test_save_replaces_atomically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("range.csv");

        let mut a = BinHistogram::new(10, 0.0, 100.0);
        a.add(15.0, 1.0, None);
        save(&a, &path).unwrap();
        a.add(15.0, 1.0, None);
        save(&a, &path).unwrap();

        // No leftover temporary, and the file holds the newer state
        assert!(!tmp_path(&path).exists());
        let mut b = BinHistogram::new(10, 0.0, 100.0);
        load(&mut b, &path).unwrap();
        assert!((b.total_weight() - 2.0).abs() < 0.01);
    }

    #[test]
    fn test_rebinned_load_conserves_weight() {
        // Written with one scheme, loaded into another
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("range.csv");

        let mut a = BinHistogram::new(110, 0.0, 440_000.0);
        a.add(100_000.0, 40.0, None);
        a.add(101_000.0, 20.0, None);
        save(&a, &path).unwrap();

        let mut b = BinHistogram::new(44, 0.0, 440_000.0);
        load(&mut b, &path).unwrap();
        assert!((b.total_weight() - 60.0).abs() < 0.05);
    }
}
