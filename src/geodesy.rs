// Geodesy - WGS84 coordinate transforms and the receiver-local viewing frame
//
// Converts aircraft positions to (slant range, horizontal range, bearing,
// elevation) as seen from a fixed receiver location. Works in a rotated ECEF
// frame: the Earth centre stays at the origin, but the receiver is rotated
// onto the +X axis, so the YZ plane is the receiver's local ground plane and
// +Z points geographic north.

use std::f64::consts::PI;

/// Degrees to radians conversion factor
const DTOR: f64 = PI / 180.0;

/// Radians to degrees conversion factor
const RTOD: f64 = 180.0 / PI;

/// WGS84 ellipsoid semi-major axis (equatorial radius) in meters
const WGS84_A: f64 = 6378137.0;

/// WGS84 ellipsoid flattening factor
const WGS84_F: f64 = 1.0 / 298.257223563;

/// WGS84 ellipsoid semi-minor axis (polar radius) in meters
const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);

/// WGS84 ellipsoid eccentricity squared
const WGS84_ECC_SQ: f64 = 1.0 - (WGS84_B * WGS84_B) / (WGS84_A * WGS84_A);

/// Converts from WGS84 lat/lon/height to ellipsoid-earth ECEF coordinates
///
/// # Arguments
/// * `lat` - Latitude in degrees
/// * `lon` - Longitude in degrees
/// * `alt` - Altitude in meters above WGS84 ellipsoid
///
/// # Returns
/// ECEF coordinates [x, y, z] in meters
pub fn llh2ecef(lat: f64, lon: f64, alt: f64) -> [f64; 3] {
    let lat_rad = lat * DTOR;
    let lon_rad = lon * DTOR;

    let slat = lat_rad.sin();
    let slon = lon_rad.sin();
    let clat = lat_rad.cos();
    let clon = lon_rad.cos();

    // Radius of curvature in prime vertical
    let d = (1.0 - (slat * slat * WGS84_ECC_SQ)).sqrt();
    let rn = WGS84_A / d;

    [
        (rn + alt) * clat * clon,
        (rn + alt) * clat * slon,
        (rn * (1.0 - WGS84_ECC_SQ) + alt) * slat,
    ]
}

/// Straight-line (Euclidean) distance in meters between two Cartesian points
#[inline]
pub fn cartesian_distance(p0: [f64; 3], p1: [f64; 3]) -> f64 {
    let dx = p0[0] - p1[0];
    let dy = p0[1] - p1[1];
    let dz = p0[2] - p1[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// What a receiver sees of a single target position.
#[derive(Debug, Clone, Copy)]
pub struct Geometry {
    /// True line-of-sight distance in meters
    pub slant_range: f64,
    /// Distance projected onto the local ground plane, in meters.
    /// A flat-earth proxy for ground distance: error vs great-circle is
    /// about 1% at 10 degrees elevation, and it behaves well both at short
    /// range (no altitude zero-offset, unlike slant range) and at long range
    /// (no curvature blow-up, unlike great-circle distance).
    pub horiz_range: f64,
    /// Compass bearing from the receiver in degrees, [0, 360), 0 = north
    pub bearing: f64,
    /// Angle above the receiver's local horizontal, in degrees
    pub elevation: f64,
    /// Target position in the rotated frame, in meters (for displacement checks)
    pub position: [f64; 3],
}

/// A fixed receiver location with its frame rotation precomputed.
///
/// Construction rotates the receiver onto the +X axis: first about the polar
/// axis by minus the receiver longitude (done in geodetic coordinates by
/// shifting the target longitude), then about Y by minus the angle between
/// the receiver and the XY plane. `look_at` applies the identical rotation
/// to any target.
#[derive(Debug, Clone)]
pub struct LocalFrame {
    /// Receiver longitude in degrees (the Z-axis rotation)
    ref_lon: f64,
    /// Sine/cosine of the Y-axis rotation angle
    sin_a: f64,
    cos_a: f64,
    /// Receiver position in the rotated frame; lies on the +X axis
    origin: [f64; 3],
}

impl LocalFrame {
    /// Build the viewing frame for a receiver at (lat, lon, alt).
    pub fn new(lat: f64, lon: f64, alt: f64) -> Self {
        // With longitude zeroed the receiver is already in the XZ plane;
        // its angle there fixes the Y rotation.
        let c = llh2ecef(lat, 0.0, alt);
        let a = -c[2].atan2(c[0]);
        let (sin_a, cos_a) = a.sin_cos();

        // Rotate the receiver itself; Y and Z components end up zero
        // apart from rounding.
        let origin = [
            c[0] * cos_a - c[2] * sin_a,
            c[1],
            c[0] * sin_a + c[2] * cos_a,
        ];

        LocalFrame {
            ref_lon: lon,
            sin_a,
            cos_a,
            origin,
        }
    }

    /// Rotate a WGS84 position into the receiver frame.
    fn rotate(&self, lat: f64, lon: f64, alt: f64) -> [f64; 3] {
        let p = llh2ecef(lat, lon - self.ref_lon, alt);
        [
            p[0] * self.cos_a - p[2] * self.sin_a,
            p[1],
            p[0] * self.sin_a + p[2] * self.cos_a,
        ]
    }

    /// Compute slant range, horizontal range, bearing and elevation of a
    /// target at (lat, lon, alt) as seen from the receiver.
    ///
    /// A target exactly at the receiver has slant range 0 and, by definition
    /// here, elevation +90 (straight up); the true elevation is undefined
    /// there and 90 keeps the value finite.
    pub fn look_at(&self, lat: f64, lon: f64, alt: f64) -> Geometry {
        let p = self.rotate(lat, lon, alt);

        // In this frame +X is straight up at the receiver, YZ is the local
        // ground plane, +Z is north.
        let dx = p[0] - self.origin[0];
        let dy = p[1] - self.origin[1];
        let dz = p[2] - self.origin[2];

        let slant_range = (dx * dx + dy * dy + dz * dz).sqrt();
        let horiz_range = (dy * dy + dz * dz).sqrt();
        let bearing = (90.0 - dz.atan2(dy) * RTOD).rem_euclid(360.0);
        let elevation = if slant_range > 0.0 {
            (dx / slant_range).asin() * RTOD
        } else {
            90.0
        };

        Geometry {
            slant_range,
            horiz_range,
            bearing,
            elevation,
            position: p,
        }
    }
}
