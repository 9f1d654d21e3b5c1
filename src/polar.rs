// Polar histograms - angular sectors of 1-D histograms
//
// A PolarHistogram splits the compass circle into equal sectors, each owning
// a BinHistogram over the radial (or elevation) domain. A MultiPolarHistogram
// stacks PolarHistograms over disjoint radial bands at per-band resolutions,
// so ground-projected bin area stays roughly constant out to the edge of
// coverage: fine sectors near the receiver, coarse ones far out.

use crate::histogram::BinHistogram;

/// One non-empty polar bin, as exchanged with the snapshot layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarRow {
    pub bearing_start: f64,
    pub bearing_end: f64,
    pub start: f64,
    pub end: f64,
    pub weight: f64,
    pub distinct: f64,
}

/// Equal angular sectors over [0, 360), each holding a BinHistogram of
/// identical shape.
#[derive(Debug, Clone)]
pub struct PolarHistogram {
    sector_width: f64,
    sectors: Vec<BinHistogram>,
}

impl PolarHistogram {
    pub fn new(n_sectors: usize, n_bins: usize, min_value: f64, max_value: f64) -> Self {
        assert!(n_sectors > 0);
        PolarHistogram {
            sector_width: 360.0 / n_sectors as f64,
            sectors: vec![BinHistogram::new(n_bins, min_value, max_value); n_sectors],
        }
    }

    pub fn n_sectors(&self) -> usize {
        self.sectors.len()
    }

    pub fn sector_start(&self, i: usize) -> f64 {
        i as f64 * self.sector_width
    }

    pub fn sector_end(&self, i: usize) -> f64 {
        self.sector_start(i + 1)
    }

    fn sector_for(&self, bearing: f64) -> usize {
        // rem_euclid can round up to exactly 360.0 for tiny negative inputs
        let b = bearing.rem_euclid(360.0);
        ((b / self.sector_width) as usize).min(self.sectors.len() - 1)
    }

    /// Accumulate into the sector containing `bearing` (mod 360).
    pub fn add(&mut self, bearing: f64, value: f64, weight: f64, ident: Option<u32>) {
        if bearing.is_nan() {
            return;
        }
        let i = self.sector_for(bearing);
        self.sectors[i].add(value, weight, ident);
    }

    pub fn reset_identity_history(&mut self) {
        for sector in &mut self.sectors {
            sector.reset_identity_history();
        }
    }

    /// Distribute `weight`/`distinct` over the sectors overlapping the
    /// bearing interval, by angular overlap fraction (running-remainder
    /// rule), then radially within each sector via `import_interval`.
    ///
    /// An interval whose normalized upper edge is not strictly above its
    /// lower edge wraps past 360 -> 0; iteration then walks on around the
    /// sector ring, so [350, 10) lands half in the last sector and half in
    /// the first rather than all on one side.
    pub fn import_sector(
        &mut self,
        bearing_low: f64,
        bearing_high: f64,
        low: f64,
        high: f64,
        weight: f64,
        distinct: f64,
    ) {
        if bearing_low == bearing_high {
            return;
        }
        let mut b_low = bearing_low.rem_euclid(360.0);
        let mut b_high = bearing_high.rem_euclid(360.0);
        if b_high <= b_low {
            b_high += 360.0;
        }

        let n = self.sectors.len();
        let mut weight = weight;
        let mut distinct = distinct;
        let mut j = (b_low / self.sector_width).floor() as usize;

        while b_high - b_low > 1e-9 {
            let seg_start = j as f64 * self.sector_width;
            let seg_end = seg_start + self.sector_width;
            let lo = b_low.max(seg_start);
            let hi = b_high.min(seg_end);
            if hi > lo {
                let fraction = (hi - lo) / (b_high - b_low);
                let w = fraction * weight;
                let d = fraction * distinct;
                self.sectors[j % n].import_interval(low, high, w, d);
                weight -= w;
                distinct -= d;
                b_low = hi;
            } else {
                b_low = seg_end;
            }
            j += 1;
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.sectors.iter().map(|s| s.total_weight()).sum()
    }

    pub fn total_distinct(&self) -> f64 {
        self.sectors.iter().map(|s| s.total_distinct()).sum()
    }

    /// Non-empty bins across all sectors, in sector order.
    pub fn rows(&self) -> impl Iterator<Item = PolarRow> + '_ {
        self.sectors.iter().enumerate().flat_map(move |(i, sector)| {
            let bearing_start = self.sector_start(i);
            let bearing_end = self.sector_end(i);
            sector.rows().map(move |r| PolarRow {
                bearing_start,
                bearing_end,
                start: r.start,
                end: r.end,
                weight: r.weight,
                distinct: r.distinct,
            })
        })
    }
}

/// Configuration of one radial band of a MultiPolarHistogram.
#[derive(Debug, Clone, Copy)]
pub struct BandSpec {
    /// Band domain [start, end), in radial units (meters or degrees)
    pub start: f64,
    pub end: f64,
    /// Angular size of one sector, degrees
    pub sector_size: f64,
    /// Radial size of one bin, in domain units
    pub bin_size: f64,
}

#[derive(Debug, Clone)]
struct RangeBand {
    start: f64,
    end: f64,
    histo: PolarHistogram,
}

/// Sorted, mutually exclusive radial bands, each with its own polar
/// histogram resolution. Band edges are half-open; a radial value belongs to
/// the first band whose [start, end) contains it.
#[derive(Debug, Clone)]
pub struct MultiPolarHistogram {
    bands: Vec<RangeBand>,
}

impl MultiPolarHistogram {
    pub fn new(specs: &[BandSpec]) -> Self {
        let mut bands: Vec<RangeBand> = specs
            .iter()
            .map(|s| {
                assert!(s.end > s.start);
                RangeBand {
                    start: s.start,
                    end: s.end,
                    histo: PolarHistogram::new(
                        (360.0 / s.sector_size).ceil() as usize,
                        ((s.end - s.start) / s.bin_size).ceil() as usize,
                        s.start,
                        s.end,
                    ),
                }
            })
            .collect();
        bands.sort_by(|a, b| a.start.total_cmp(&b.start));
        MultiPolarHistogram { bands }
    }

    /// Accumulate into the first band containing `value`; outside every
    /// band is a no-op.
    pub fn add(&mut self, bearing: f64, value: f64, weight: f64, ident: Option<u32>) {
        for band in &mut self.bands {
            if value >= band.start && value < band.end {
                band.histo.add(bearing, value, weight, ident);
                return;
            }
        }
    }

    pub fn reset_identity_history(&mut self) {
        for band in &mut self.bands {
            band.histo.reset_identity_history();
        }
    }

    /// Apportion the radial span across overlapping bands (running-remainder
    /// rule again), clamping each share to its band before delegating to the
    /// band's angular import. Spans falling in a gap between bands are
    /// dropped from the remainder, never redistributed.
    pub fn import_sector(
        &mut self,
        bearing_low: f64,
        bearing_high: f64,
        low: f64,
        high: f64,
        weight: f64,
        distinct: f64,
    ) {
        if !(high > low) {
            return;
        }
        let mut low = low;
        let mut weight = weight;
        let mut distinct = distinct;

        for band in &mut self.bands {
            if high - low < 1e-9 {
                break;
            }
            let lo = low.max(band.start);
            let hi = high.min(band.end);
            if hi <= lo {
                continue;
            }
            let fraction = (hi - lo) / (high - low);
            let w = fraction * weight;
            let d = fraction * distinct;
            band.histo.import_sector(bearing_low, bearing_high, lo, hi, w, d);
            weight -= w;
            distinct -= d;
            low = hi;
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.bands.iter().map(|b| b.histo.total_weight()).sum()
    }

    pub fn total_distinct(&self) -> f64 {
        self.bands.iter().map(|b| b.histo.total_distinct()).sum()
    }

    /// All bands' non-empty bins, flattened in band order.
    pub fn rows(&self) -> impl Iterator<Item = PolarRow> + '_ {
        self.bands.iter().flat_map(|b| b.histo.rows())
    }
}
