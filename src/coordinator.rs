// Coordinator - glue between the report stream, the tracker, and the
// snapshot store
//
// Owns the tracker and drives all periodic work off the ingestion loop:
// snapshot saves and identity-history resets on wall-clock intervals, plus a
// status line and status.json for whatever is watching the work directory.
// Nothing in here stops ingestion: bad input lines are skipped and a failed
// save leaves the previous snapshot intact for the next attempt.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::geodesy::LocalFrame;
use crate::sbs;
use crate::snapshot::{self, Snapshot};
use crate::tracker::CoverageTracker;

const RANGE_FILE: &str = "range.csv";
const POLAR_RANGE_FILE: &str = "polar_range.csv";
const POLAR_ELEV_FILE: &str = "polar_elev.csv";
const STATUS_FILE: &str = "status.json";

/// Pipeline health summary written alongside the histograms.
#[derive(Serialize)]
struct Status {
    /// Live tracks at the time of writing
    aircraft: usize,
    /// Position reports per second since the previous save
    update_rate: f64,
    /// Unix time of writing
    updated: f64,
}

pub struct Coordinator {
    tracker: CoverageTracker,
    work_dir: PathBuf,
    save_interval: f64,
    reset_interval: f64,
    last_save: f64,
    last_reset: f64,
    recent_updates: usize,
}

impl Coordinator {
    /// Set up the pipeline: build the receiver frame, create the work
    /// directory, and merge in any histogram snapshots from a previous run.
    pub fn new(config: &Config) -> io::Result<Self> {
        let work_dir = PathBuf::from(&config.work_dir);
        std::fs::create_dir_all(&work_dir)?;

        let frame = LocalFrame::new(config.lat, config.lon, config.alt);
        let mut tracker = CoverageTracker::new(frame);

        // A corrupt snapshot means that histogram starts empty, never a
        // startup failure
        load_one(&mut tracker.range_histo, &work_dir.join(RANGE_FILE));
        load_one(&mut tracker.polar_range, &work_dir.join(POLAR_RANGE_FILE));
        load_one(&mut tracker.polar_elev, &work_dir.join(POLAR_ELEV_FILE));

        let now = unix_now();
        Ok(Coordinator {
            tracker,
            work_dir,
            save_interval: config.save_interval,
            reset_interval: config.reset_interval,
            last_save: now,
            last_reset: now,
            recent_updates: 0,
        })
    }

    /// Feed one line from the report stream. Anything that does not decode
    /// to a position report is skipped.
    pub fn process_line(&mut self, line: &str) {
        if let Some(report) = sbs::parse_line(line) {
            self.tracker.update(&report);
            self.recent_updates += 1;
        }
        self.periodic();
    }

    /// Final save when the stream ends or on shutdown signal.
    pub fn shutdown(&mut self) {
        info!("final snapshot save");
        self.save_all(unix_now());
    }

    fn periodic(&mut self) {
        let now = unix_now();
        if now - self.last_save > self.save_interval {
            self.save_all(now);
        }
        if now - self.last_reset > self.reset_interval {
            self.tracker.reset_identity_history();
            self.last_reset = now;
        }
    }

    fn save_all(&mut self, now: f64) {
        let elapsed = now - self.last_save;
        let rate = if elapsed > 0.0 {
            self.recent_updates as f64 / elapsed
        } else {
            0.0
        };
        info!(
            "active aircraft: {}  update rate: {:.1}/s",
            self.tracker.aircraft_count(),
            rate
        );

        save_one(&self.tracker.range_histo, &self.work_dir.join(RANGE_FILE));
        save_one(&self.tracker.polar_range, &self.work_dir.join(POLAR_RANGE_FILE));
        save_one(&self.tracker.polar_elev, &self.work_dir.join(POLAR_ELEV_FILE));
        self.write_status(now, rate);

        self.recent_updates = 0;
        self.last_save = now;
    }

    fn write_status(&self, now: f64, rate: f64) {
        let status = Status {
            aircraft: self.tracker.aircraft_count(),
            update_rate: rate,
            updated: now,
        };
        let path = self.work_dir.join(STATUS_FILE);
        let tmp = self.work_dir.join(format!("{}.tmp", STATUS_FILE));
        if let Ok(s) = serde_json::to_string(&status) {
            if let Err(e) = std::fs::write(&tmp, s) {
                warn!("failed to write {}: {}", tmp.display(), e);
            } else if let Err(e) = std::fs::rename(&tmp, &path) {
                let _ = std::fs::remove_file(&tmp);
                warn!("failed to rename {} -> {}: {}", tmp.display(), path.display(), e);
            }
        }
    }
}

fn load_one<S: Snapshot + Clone>(histo: &mut S, path: &Path) {
    let empty = histo.clone();
    match snapshot::load(histo, path) {
        Ok(true) => info!("loaded snapshot {}", path.display()),
        Ok(false) => debug!("no snapshot at {}", path.display()),
        Err(e) => {
            warn!("ignoring unreadable snapshot {}: {}", path.display(), e);
            *histo = empty;
        }
    }
}

fn save_one<S: Snapshot>(histo: &S, path: &Path) {
    if let Err(e) = snapshot::save(histo, path) {
        warn!("failed to save {}: {}", path.display(), e);
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &Path) -> Config {
        Config {
            lat: 52.2,
            lon: 0.1,
            alt: 20.0,
            connect: None,
            work_dir: dir.to_string_lossy().into_owned(),
            save_interval: 30.0,
            reset_interval: 30.0,
            verbose: false,
        }
    }

    fn sbs_line(icao: &str, time: &str, lat: f64, lon: f64) -> String {
        format!(
            "MSG,3,1,1,{},1,2020/01/01,{t},2020/01/01,{t},,33000,,,{},{},,,0,0,0,0",
            icao,
            lat,
            lon,
            t = time
        )
    }

    #[test]
    fn test_pipeline_accumulates_and_persists() {
        let dir = TempDir::new().unwrap();
        let mut c = Coordinator::new(&config(dir.path())).unwrap();

        c.process_line(&sbs_line("4CA2D6", "00:00:00", 52.5, 0.1));
        c.process_line("this is not an SBS line at all");
        c.process_line(&sbs_line("4CA2D6", "00:00:10", 52.51, 0.1));
        c.shutdown();

        assert!((c.tracker.polar_range.total_weight() - 10.0).abs() < 1e-9);
        assert!(dir.path().join(RANGE_FILE).exists());
        assert!(dir.path().join(POLAR_RANGE_FILE).exists());
        assert!(dir.path().join(POLAR_ELEV_FILE).exists());
        assert!(dir.path().join(STATUS_FILE).exists());
    }

    #[test]
    fn test_restart_merges_previous_snapshot() {
        let dir = TempDir::new().unwrap();

        let mut first = Coordinator::new(&config(dir.path())).unwrap();
        first.process_line(&sbs_line("4CA2D6", "00:00:00", 52.5, 0.1));
        first.process_line(&sbs_line("4CA2D6", "00:00:10", 52.51, 0.1));
        first.shutdown();

        let second = Coordinator::new(&config(dir.path())).unwrap();
        assert!((second.tracker.polar_range.total_weight() - 10.0).abs() < 0.05);
        assert!((second.tracker.range_histo.total_weight() - 10.0).abs() < 0.05);
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(POLAR_RANGE_FILE),
            "bearing_start,bearing_end,bin_start,bin_end,weight,distinct_count\ngarbage\n",
        )
        .unwrap();

        let c = Coordinator::new(&config(dir.path())).unwrap();
        assert_eq!(c.tracker.polar_range.total_weight(), 0.0);
    }
}
