// Aircraft dwell tracking
//
// Per-aircraft last-known-state table driving the coverage histograms. Each
// position report credits the elapsed interval to the histogram cell the
// aircraft previously occupied: the aircraft was there, and we were hearing
// it. Implausible positions or jumps blacklist the aircraft for a cool-down
// so garbled data does not pollute the map; tracking state still updates
// while blacklisted, only the histogram contribution is suppressed.

use std::collections::HashMap;
use tracing::{debug, info};

use crate::constants::{
    BLACKLIST_COOLDOWN, ELEVATION_BANDS, IDLE_TIMEOUT, MAX_PLAUSIBLE_RANGE,
    MAX_PLAUSIBLE_SPEED, MIN_PLAUSIBLE_ELEVATION, RANGE_BANDS, RANGE_HISTO_BINS,
    RANGE_HISTO_MAX, SPEED_CHECK_MIN_DISPLACEMENT, SPEED_CHECK_MIN_ELAPSED, SWEEP_INTERVAL,
};
use crate::geodesy::{cartesian_distance, Geometry, LocalFrame};
use crate::histogram::BinHistogram;
use crate::polar::MultiPolarHistogram;
use crate::sbs::PositionReport;

/// A single tracked aircraft: its last known viewing geometry.
#[derive(Debug, Clone)]
pub struct TrackedAircraft {
    /// ICAO address
    pub icao: u32,
    /// Stream timestamp of the last report (Unix seconds)
    pub last_seen: f64,
    /// Horizontal range at the last report (m)
    pub range: f64,
    /// Bearing at the last report (degrees)
    pub bearing: f64,
    /// Elevation at the last report (degrees)
    pub elevation: f64,
    /// Rotated-frame position at the last report (m)
    pub position: [f64; 3],
    /// Contributions suppressed until this stream time
    pub blacklist_until: Option<f64>,
}

impl TrackedAircraft {
    fn new(icao: u32, timestamp: f64, g: &Geometry) -> Self {
        TrackedAircraft {
            icao,
            last_seen: timestamp,
            range: g.horiz_range,
            bearing: g.bearing,
            elevation: g.elevation,
            position: g.position,
            blacklist_until: None,
        }
    }

    pub fn blacklisted(&self) -> bool {
        self.blacklist_until.is_some()
    }
}

/// Coverage tracker: all live aircraft plus the histograms they feed.
pub struct CoverageTracker {
    frame: LocalFrame,
    aircraft: HashMap<u32, TrackedAircraft>,

    /// Dwell seconds by horizontal range alone
    pub range_histo: BinHistogram,
    /// Dwell seconds by bearing and horizontal range
    pub polar_range: MultiPolarHistogram,
    /// Dwell seconds by bearing and elevation
    pub polar_elev: MultiPolarHistogram,

    /// Stream time of the last idle-expiry sweep
    last_sweep: f64,
}

impl CoverageTracker {
    /// Create a tracker for a receiver frame, with empty histograms in the
    /// default shapes.
    pub fn new(frame: LocalFrame) -> Self {
        CoverageTracker {
            frame,
            aircraft: HashMap::new(),
            range_histo: BinHistogram::new(RANGE_HISTO_BINS, 0.0, RANGE_HISTO_MAX),
            polar_range: MultiPolarHistogram::new(&RANGE_BANDS),
            polar_elev: MultiPolarHistogram::new(&ELEVATION_BANDS),
            last_sweep: 0.0,
        }
    }

    /// Number of live tracks
    pub fn aircraft_count(&self) -> usize {
        self.aircraft.len()
    }

    /// Look up a track by ICAO address
    pub fn get(&self, icao: u32) -> Option<&TrackedAircraft> {
        self.aircraft.get(&icao)
    }

    /// Process one position report.
    pub fn update(&mut self, report: &PositionReport) {
        let g = self.frame.look_at(report.lat, report.lon, report.alt);

        // First report for a new address just seeds the track; there is no
        // prior dwell interval to credit yet.
        let ac = self
            .aircraft
            .entry(report.icao)
            .or_insert_with(|| TrackedAircraft::new(report.icao, report.timestamp, &g));

        // Cool-down over: clear before anything else looks at the flag
        if let Some(until) = ac.blacklist_until {
            if report.timestamp > until {
                debug!("{:06X} blacklist expired", ac.icao);
                ac.blacklist_until = None;
            }
        }

        // Positions a ground receiver cannot plausibly see
        if g.horiz_range > MAX_PLAUSIBLE_RANGE || g.elevation < MIN_PLAUSIBLE_ELEVATION {
            if ac.blacklist_until.is_none() {
                info!(
                    "{:06X} implausible position: range {:.1} km elevation {:.1}, blacklisting",
                    ac.icao,
                    g.horiz_range / 1000.0,
                    g.elevation
                );
            }
            ac.blacklist_until = Some(report.timestamp + BLACKLIST_COOLDOWN);
        }

        let elapsed = report.timestamp - ac.last_seen;
        if elapsed > 0.0 {
            // Implied straight-line speed since the last fix, checked only
            // once the movement is big enough to mean anything
            let moved = cartesian_distance(g.position, ac.position);
            if (elapsed > SPEED_CHECK_MIN_ELAPSED || moved > SPEED_CHECK_MIN_DISPLACEMENT)
                && moved / elapsed > MAX_PLAUSIBLE_SPEED
            {
                if ac.blacklist_until.is_none() {
                    info!(
                        "{:06X} implausible speed: moved {:.1} km at {:.0} m/s, blacklisting",
                        ac.icao,
                        moved / 1000.0,
                        moved / elapsed
                    );
                }
                ac.blacklist_until = Some(report.timestamp + BLACKLIST_COOLDOWN);
            }

            if ac.blacklist_until.is_none() {
                // Credit the dwell time at the cell the aircraft was
                // occupying, not where it arrived
                self.range_histo.add(ac.range, elapsed, Some(ac.icao));
                self.polar_range
                    .add(ac.bearing, ac.range, elapsed, Some(ac.icao));
                self.polar_elev
                    .add(ac.bearing, ac.elevation, elapsed, Some(ac.icao));
            }
        }

        // Tracking state always updates, blacklisted or not
        ac.last_seen = report.timestamp;
        ac.range = g.horiz_range;
        ac.bearing = g.bearing;
        ac.elevation = g.elevation;
        ac.position = g.position;

        self.maybe_sweep(report.timestamp);
    }

    /// Expire idle tracks, at most once per sweep interval of stream time.
    ///
    /// An expiring track's final interval was never credited, so a
    /// non-blacklisted one gets the full idle timeout even if the sweep
    /// noticed it late; a blacklisted one is dropped with nothing.
    fn maybe_sweep(&mut self, now: f64) {
        if now - self.last_sweep <= SWEEP_INTERVAL {
            return;
        }
        self.last_sweep = now;

        let expired: Vec<u32> = self
            .aircraft
            .values()
            .filter(|ac| now - ac.last_seen > IDLE_TIMEOUT)
            .map(|ac| ac.icao)
            .collect();

        for icao in expired {
            if let Some(ac) = self.aircraft.remove(&icao) {
                if ac.blacklist_until.is_none() {
                    self.range_histo.add(ac.range, IDLE_TIMEOUT, Some(ac.icao));
                    self.polar_range
                        .add(ac.bearing, ac.range, IDLE_TIMEOUT, Some(ac.icao));
                    self.polar_elev
                        .add(ac.bearing, ac.elevation, IDLE_TIMEOUT, Some(ac.icao));
                }
                debug!("{:06X} expired after {:.0}s idle", icao, now - ac.last_seen);
            }
        }
    }

    /// Forget recently-seen identifiers in every histogram, keeping the
    /// distinct-aircraft statistic rolling rather than all-time.
    pub fn reset_identity_history(&mut self) {
        self.range_histo.reset_identity_history();
        self.polar_range.reset_identity_history();
        self.polar_elev.reset_identity_history();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Receiver used throughout: Cambridge-ish
    fn tracker() -> CoverageTracker {
        CoverageTracker::new(LocalFrame::new(52.2, 0.1, 20.0))
    }

    fn report(icao: u32, t: f64, lat: f64, lon: f64, alt: f64) -> PositionReport {
        PositionReport {
            icao,
            timestamp: t,
            lat,
            lon,
            alt,
        }
    }

    const T0: f64 = 1_700_000_000.0;

    #[test]
    fn test_first_report_contributes_nothing() {
        let mut tr = tracker();
        tr.update(&report(0x111111, T0, 52.5, 0.1, 10000.0));

        assert_eq!(tr.aircraft_count(), 1);
        assert_eq!(tr.polar_range.total_weight(), 0.0);
        assert_eq!(tr.range_histo.total_weight(), 0.0);
    }

    #[test]
    fn test_dwell_credited_at_previous_cell() {
        let mut tr = tracker();
        // Due north, ~33 km out
        tr.update(&report(0x111111, T0, 52.5, 0.1, 10000.0));
        let prev_range = tr.get(0x111111).unwrap().range;

        // 10 s later, ~1 km further north (about 110 m/s)
        tr.update(&report(0x111111, T0 + 10.0, 52.51, 0.1, 10000.0));

        assert!((tr.polar_range.total_weight() - 10.0).abs() < 1e-9);
        assert!((tr.polar_elev.total_weight() - 10.0).abs() < 1e-9);
        assert!((tr.range_histo.total_weight() - 10.0).abs() < 1e-9);

        // The weight sits in the cell of the *previous* fix
        let row = tr.polar_range.rows().next().unwrap();
        assert!(row.start <= prev_range && prev_range < row.end);
        // Due north: bearing sector at one edge of the compass
        assert!(row.bearing_start < 1.0 || row.bearing_end > 359.0);
    }

    #[test]
    fn test_speed_jump_blacklists_and_suppresses() {
        let mut tr = tracker();
        // ~356 km south of the receiver
        tr.update(&report(0x222222, T0, 49.0, 0.1, 10000.0));
        // One second later ~650 km away to the north: far beyond 500 m/s
        tr.update(&report(0x222222, T0 + 1.0, 54.9, 0.1, 10000.0));

        let ac = tr.get(0x222222).unwrap();
        assert!(ac.blacklisted());
        assert_eq!(tr.polar_range.total_weight(), 0.0);
        assert_eq!(tr.range_histo.total_weight(), 0.0);

        // Tracking state still follows the reports while blacklisted
        assert!((ac.last_seen - (T0 + 1.0)).abs() < 1e-9);
        assert!(ac.range < 350_000.0, "range {}", ac.range);
    }

    #[test]
    fn test_blacklist_clears_after_cooldown() {
        let mut tr = tracker();
        tr.update(&report(0x222222, T0, 49.0, 0.1, 10000.0));
        tr.update(&report(0x222222, T0 + 1.0, 54.9, 0.1, 10000.0));
        assert!(tr.get(0x222222).unwrap().blacklisted());

        // Next report lands past the cool-down deadline (T0+1+60): the flag
        // clears first, so this interval contributes again.
        tr.update(&report(0x222222, T0 + 62.0, 54.9, 0.2, 10000.0));

        let ac = tr.get(0x222222).unwrap();
        assert!(!ac.blacklisted());
        assert!((tr.polar_range.total_weight() - 61.0).abs() < 1e-9);
    }

    #[test]
    fn test_implausible_range_blacklists() {
        let mut tr = tracker();
        // ~580 km out: beyond any plausible reception range
        tr.update(&report(0x333333, T0, 47.0, 0.1, 10000.0));
        assert!(tr.get(0x333333).unwrap().blacklisted());

        // The following interval is suppressed
        tr.update(&report(0x333333, T0 + 5.0, 47.01, 0.1, 10000.0));
        assert_eq!(tr.polar_range.total_weight(), 0.0);
    }

    #[test]
    fn test_sub_second_jitter_not_flagged() {
        let mut tr = tracker();
        tr.update(&report(0x444444, T0, 52.5, 0.1, 10000.0));
        // 0.5 s later, 500 m away: implied 1000 m/s, but below both the
        // elapsed and displacement thresholds
        tr.update(&report(0x444444, T0 + 0.5, 52.5045, 0.1, 10000.0));

        assert!(!tr.get(0x444444).unwrap().blacklisted());
        assert!((tr.polar_range.total_weight() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_idle_track_expires_with_final_credit() {
        let mut tr = tracker();
        tr.update(&report(0x111111, T0, 52.5, 0.1, 10000.0));
        // Another aircraft keeps the stream alive past the sweep interval
        tr.update(&report(0x555555, T0 + 31.0, 52.4, 0.2, 9000.0));

        // 0x111111 was idle for 31 s: removed, one final 30 s sample
        assert_eq!(tr.aircraft_count(), 1);
        assert!(tr.get(0x111111).is_none());
        assert!((tr.polar_range.total_weight() - IDLE_TIMEOUT).abs() < 1e-9);
        assert!((tr.polar_elev.total_weight() - IDLE_TIMEOUT).abs() < 1e-9);
    }

    #[test]
    fn test_idle_blacklisted_track_expires_without_credit() {
        let mut tr = tracker();
        // Implausibly far: blacklisted on first sight
        tr.update(&report(0x333333, T0, 47.0, 0.1, 10000.0));
        assert!(tr.get(0x333333).unwrap().blacklisted());

        tr.update(&report(0x555555, T0 + 31.0, 52.4, 0.2, 9000.0));

        assert!(tr.get(0x333333).is_none());
        assert_eq!(tr.polar_range.total_weight(), 0.0);
        assert_eq!(tr.range_histo.total_weight(), 0.0);
    }

    #[test]
    fn test_distinct_aircraft_counted_once_per_window() {
        let mut tr = tracker();
        tr.update(&report(0x111111, T0, 52.5, 0.1, 10000.0));
        tr.update(&report(0x111111, T0 + 5.0, 52.5, 0.1, 10000.0));
        tr.update(&report(0x111111, T0 + 10.0, 52.5, 0.1, 10000.0));

        // Same aircraft, same cell: weight 10 s but one distinct aircraft
        assert!((tr.polar_range.total_weight() - 10.0).abs() < 1e-9);
        assert!((tr.polar_range.total_distinct() - 1.0).abs() < 1e-9);

        tr.reset_identity_history();
        tr.update(&report(0x111111, T0 + 15.0, 52.5, 0.1, 10000.0));
        assert!((tr.polar_range.total_distinct() - 2.0).abs() < 1e-9);
    }
}
