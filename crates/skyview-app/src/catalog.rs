//! Synthetic SDSS-like catalog used by the demo and tests.

use skyview_frame::{ColumnFrame, Result};

pub const COLUMNS: [&str; 6] = ["ra", "dec", "redshift", "mag_g", "mag_r", "g_r"];

struct SplitMix64(u64);

impl SplitMix64 {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }

    // Sum of four uniforms: cheap, bounded, roughly bell-shaped.
    fn bell(&mut self, center: f64, spread: f64) -> f64 {
        let sum: f64 = (0..4).map(|_| self.next_f64()).sum();
        center + (sum - 2.0) * spread
    }
}

/// Deterministic catalog of `rows` objects for `seed`.
///
/// Positions are uniform on the sky (`dec` uniform in `sin`), redshift is
/// skewed towards the low end, and `g_r` is `mag_g - mag_r`.
pub fn synthetic_catalog(rows: usize, seed: u64) -> Result<ColumnFrame> {
    let mut rng = SplitMix64(seed);
    let mut ra = Vec::with_capacity(rows);
    let mut dec = Vec::with_capacity(rows);
    let mut redshift = Vec::with_capacity(rows);
    let mut mag_g = Vec::with_capacity(rows);
    let mut mag_r = Vec::with_capacity(rows);
    let mut g_r = Vec::with_capacity(rows);

    for _ in 0..rows {
        ra.push(rng.uniform(0.0, 360.0));
        dec.push(rng.uniform(-1.0, 1.0).asin().to_degrees());
        let z = rng.next_f64().powi(2) * 0.7;
        redshift.push(z);
        let r = rng.bell(17.5 + 2.5 * z, 0.8);
        let color = rng.bell(0.6 + 0.8 * z, 0.15);
        mag_r.push(r);
        mag_g.push(r + color);
        g_r.push(color);
    }

    ColumnFrame::new()
        .with_column("ra", ra)?
        .with_column("dec", dec)?
        .with_column("redshift", redshift)?
        .with_column("mag_g", mag_g)?
        .with_column("mag_r", mag_r)?
        .with_column("g_r", g_r)
}
