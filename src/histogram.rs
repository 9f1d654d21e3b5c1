// Weighted 1-D histogram with uniform half-open bins
//
// The weight axis is whatever the caller accumulates: elapsed seconds of
// dwell time, event counts, etc. Each bin also tracks how many distinct
// identifiers it has seen recently, so coverage can be normalized either by
// exposure time or by distinct-aircraft counts.

use std::collections::HashSet;

/// One half-open bin [start, end)
#[derive(Debug, Clone, Default)]
struct Bin {
    /// Accumulated weight
    weight: f64,
    /// Distinct identifiers seen since the last identity reset. Fractional
    /// after a re-import, since old totals are apportioned by overlap.
    distinct: f64,
    /// Identifiers already counted in `distinct` this window
    seen: HashSet<u32>,
}

impl Bin {
    fn is_empty(&self) -> bool {
        self.weight <= 0.0 && self.distinct <= 0.0
    }
}

/// One non-empty bin, as exchanged with the snapshot layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinRow {
    pub start: f64,
    pub end: f64,
    pub weight: f64,
    pub distinct: f64,
}

/// Histogram over [min_value, max_value) with `n_bins` bins of equal width.
#[derive(Debug, Clone)]
pub struct BinHistogram {
    min_value: f64,
    bin_width: f64,
    bins: Vec<Bin>,
}

impl BinHistogram {
    pub fn new(n_bins: usize, min_value: f64, max_value: f64) -> Self {
        assert!(n_bins > 0);
        assert!(max_value > min_value);
        BinHistogram {
            min_value,
            bin_width: (max_value - min_value) / n_bins as f64,
            bins: vec![Bin::default(); n_bins],
        }
    }

    pub fn n_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn bin_start(&self, i: usize) -> f64 {
        self.min_value + i as f64 * self.bin_width
    }

    pub fn bin_end(&self, i: usize) -> f64 {
        self.bin_start(i + 1)
    }

    /// Bin owning `value`, or None when the value is outside the domain
    /// (including NaN).
    fn bin_for(&self, value: f64) -> Option<usize> {
        let i = ((value - self.min_value) / self.bin_width).floor();
        if i >= 0.0 && i < self.bins.len() as f64 {
            Some(i as usize)
        } else {
            None
        }
    }

    /// Accumulate `weight` into the bin owning `value`. Out-of-domain values
    /// are silently discarded. When an identifier is given and has not been
    /// seen by that bin since the last identity reset, the bin's distinct
    /// count goes up by one.
    pub fn add(&mut self, value: f64, weight: f64, ident: Option<u32>) {
        let Some(i) = self.bin_for(value) else { return };
        let bin = &mut self.bins[i];
        bin.weight += weight;
        if let Some(id) = ident {
            if bin.seen.insert(id) {
                bin.distinct += 1.0;
            }
        }
    }

    /// Forget which identifiers each bin has seen, making the distinct count
    /// a rolling rather than all-time statistic.
    pub fn reset_identity_history(&mut self) {
        for bin in &mut self.bins {
            bin.seen.clear();
        }
    }

    /// Distribute `weight` and `distinct` over every bin overlapping
    /// [low, high), proportionally to overlap length.
    ///
    /// Walks bins in order keeping a running remainder: each bin takes the
    /// fraction of the *remaining* interval it covers, and `low` advances to
    /// the overlap's upper edge. Boundary bins are therefore never counted
    /// twice and the distributed total equals the input up to floating
    /// error. Portions outside the domain stay in the remainder and are
    /// dropped. An empty interval is a no-op.
    pub fn import_interval(&mut self, low: f64, high: f64, weight: f64, distinct: f64) {
        if !(high > low) {
            return;
        }
        let mut low = low;
        let mut weight = weight;
        let mut distinct = distinct;

        let n = self.bins.len();
        let first = (((low - self.min_value) / self.bin_width).floor()).max(0.0) as usize;
        let last = (((high - self.min_value) / self.bin_width).floor() + 1.0)
            .clamp(0.0, n as f64) as usize;

        for i in first..last {
            if high - low < 1e-9 {
                break;
            }
            let lo = self.bin_start(i).max(low);
            let hi = self.bin_end(i).min(high);
            if hi <= lo {
                continue;
            }
            let fraction = (hi - lo) / (high - low);
            let w = fraction * weight;
            let d = fraction * distinct;
            self.bins[i].weight += w;
            self.bins[i].distinct += d;
            weight -= w;
            distinct -= d;
            low = hi;
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.bins.iter().map(|b| b.weight).sum()
    }

    pub fn total_distinct(&self) -> f64 {
        self.bins.iter().map(|b| b.distinct).sum()
    }

    /// Non-empty bins in order, for serialization.
    pub fn rows(&self) -> impl Iterator<Item = BinRow> + '_ {
        self.bins.iter().enumerate().filter_map(move |(i, b)| {
            if b.is_empty() {
                None
            } else {
                Some(BinRow {
                    start: self.bin_start(i),
                    end: self.bin_end(i),
                    weight: b.weight,
                    distinct: b.distinct,
                })
            }
        })
    }
}
