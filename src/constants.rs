// Operating limits and default histogram shapes for coverage tracking

use crate::polar::BandSpec;

/// Feet to metres (SBS altitudes are in feet)
pub const FT_TO_M: f64 = 0.3048;

/// Horizontal ranges beyond this are never plausible for a ground receiver (m)
pub const MAX_PLAUSIBLE_RANGE: f64 = 500_000.0;

/// Elevations below this are never plausible (degrees)
pub const MIN_PLAUSIBLE_ELEVATION: f64 = -5.0;

/// Physical speed ceiling for the displacement check (m/s, about 970 knots)
pub const MAX_PLAUSIBLE_SPEED: f64 = 500.0;

/// The speed check only applies once elapsed time or displacement exceed
/// these, so sub-second position jitter is never flagged
pub const SPEED_CHECK_MIN_ELAPSED: f64 = 4.0;
pub const SPEED_CHECK_MIN_DISPLACEMENT: f64 = 2000.0;

/// How long a blacklisted aircraft's samples stay excluded (s)
pub const BLACKLIST_COOLDOWN: f64 = 60.0;

/// Tracks idle longer than this are expired by the sweep (s)
pub const IDLE_TIMEOUT: f64 = 30.0;

/// Minimum stream time between idle-expiry sweeps (s)
pub const SWEEP_INTERVAL: f64 = 30.0;

/// Plain 1-D range histogram shape: 4 km bins out to 440 km
pub const RANGE_HISTO_BINS: usize = 110;
pub const RANGE_HISTO_MAX: f64 = 440_000.0;

/// Banding for the polar range histogram: approximately 2 km x 2 km ground
/// bins out to 400 km, sectors widening with distance to keep bin area
/// roughly constant
pub const RANGE_BANDS: [BandSpec; 10] = [
    BandSpec { start: 0.0, end: 40_000.0, sector_size: 2.86, bin_size: 2000.0 },
    BandSpec { start: 40_000.0, end: 60_000.0, sector_size: 1.91, bin_size: 2000.0 },
    BandSpec { start: 60_000.0, end: 80_000.0, sector_size: 1.43, bin_size: 2000.0 },
    BandSpec { start: 80_000.0, end: 100_000.0, sector_size: 1.15, bin_size: 2000.0 },
    BandSpec { start: 100_000.0, end: 150_000.0, sector_size: 0.76, bin_size: 2000.0 },
    BandSpec { start: 150_000.0, end: 200_000.0, sector_size: 0.57, bin_size: 2000.0 },
    BandSpec { start: 200_000.0, end: 250_000.0, sector_size: 0.46, bin_size: 2000.0 },
    BandSpec { start: 250_000.0, end: 300_000.0, sector_size: 0.38, bin_size: 2000.0 },
    BandSpec { start: 300_000.0, end: 350_000.0, sector_size: 0.33, bin_size: 2000.0 },
    BandSpec { start: 350_000.0, end: 400_000.0, sector_size: 0.29, bin_size: 2000.0 },
];

/// Banding for the polar elevation histogram, -15 to 90 degrees; angular
/// sectors widen and elevation bins coarsen towards the zenith where there
/// is little sky area per bin
pub const ELEVATION_BANDS: [BandSpec; 14] = [
    BandSpec { start: -15.0, end: 15.0, sector_size: 1.00, bin_size: 0.25 },
    BandSpec { start: 15.0, end: 20.0, sector_size: 1.20, bin_size: 0.30 },
    BandSpec { start: 20.0, end: 25.0, sector_size: 1.40, bin_size: 0.35 },
    BandSpec { start: 25.0, end: 30.0, sector_size: 1.60, bin_size: 0.40 },
    BandSpec { start: 30.0, end: 35.0, sector_size: 1.80, bin_size: 0.45 },
    BandSpec { start: 35.0, end: 40.0, sector_size: 2.00, bin_size: 0.50 },
    BandSpec { start: 40.0, end: 45.0, sector_size: 2.20, bin_size: 0.55 },
    BandSpec { start: 45.0, end: 60.0, sector_size: 2.40, bin_size: 0.60 },
    BandSpec { start: 60.0, end: 65.0, sector_size: 2.60, bin_size: 0.65 },
    BandSpec { start: 65.0, end: 70.0, sector_size: 2.80, bin_size: 0.70 },
    BandSpec { start: 70.0, end: 75.0, sector_size: 3.00, bin_size: 0.75 },
    BandSpec { start: 75.0, end: 80.0, sector_size: 3.20, bin_size: 0.80 },
    BandSpec { start: 80.0, end: 85.0, sector_size: 3.40, bin_size: 0.85 },
    BandSpec { start: 85.0, end: 90.0, sector_size: 3.60, bin_size: 0.90 },
];
