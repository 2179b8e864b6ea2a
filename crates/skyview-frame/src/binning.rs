use serde::{Deserialize, Serialize};

use crate::{FrameError, Result};

/// Closed value range used for binning and axis ranges.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    pub min: f64,
    pub max: f64,
}

impl Limits {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(FrameError::InvalidLimits { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Widen a zero-width range by half a unit on each side so it can be binned.
    pub fn widened(self) -> Self {
        if self.span() > 0.0 {
            self
        } else {
            Self {
                min: self.min - 0.5,
                max: self.max + 0.5,
            }
        }
    }

    /// Bin index for `value`, or `None` when it falls outside the limits.
    ///
    /// The upper edge belongs to the last bin.
    pub fn bin_index(&self, value: f64, bins: usize) -> Option<usize> {
        if bins == 0 || !value.is_finite() || !self.contains(value) {
            return None;
        }
        let span = self.span();
        if span <= 0.0 {
            return Some(0);
        }
        let index = ((value - self.min) / span * bins as f64) as usize;
        Some(index.min(bins - 1))
    }

    /// Bin edges, `bins + 1` values from `min` to `max`.
    pub fn edges(&self, bins: usize) -> Vec<f64> {
        let width = self.span() / bins as f64;
        (0..=bins).map(|i| self.min + width * i as f64).collect()
    }
}

/// Reduction applied to the values that land in each bin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    #[default]
    Count,
    Sum,
    Mean,
    Min,
    Max,
}

impl Aggregation {
    fn identity(self) -> f64 {
        match self {
            Aggregation::Count | Aggregation::Sum | Aggregation::Mean => 0.0,
            Aggregation::Min => f64::INFINITY,
            Aggregation::Max => f64::NEG_INFINITY,
        }
    }

    fn fold(self, acc: f64, value: f64) -> f64 {
        match self {
            Aggregation::Count => acc + 1.0,
            Aggregation::Sum | Aggregation::Mean => acc + value,
            Aggregation::Min => acc.min(value),
            Aggregation::Max => acc.max(value),
        }
    }

    pub fn needs_values(self) -> bool {
        !matches!(self, Aggregation::Count)
    }
}

/// Row-major 2-D grid of aggregated values; `values[y * nx + x]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub nx: usize,
    pub ny: usize,
    pub limits_x: Limits,
    pub limits_y: Limits,
    pub values: Vec<f64>,
}

impl Grid {
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.nx || y >= self.ny {
            return None;
        }
        self.values.get(y * self.nx + x).copied()
    }
}

pub(crate) fn bin_1d(values: &[f64], limits: Limits, bins: usize) -> Result<Vec<u64>> {
    if bins == 0 {
        return Err(FrameError::InvalidBins(bins));
    }
    let mut counts = vec![0u64; bins];
    for &value in values {
        if let Some(index) = limits.bin_index(value, bins) {
            counts[index] += 1;
        }
    }
    Ok(counts)
}

pub(crate) fn bin_2d(
    xs: &[f64],
    ys: &[f64],
    weights: Option<&[f64]>,
    limits: (Limits, Limits),
    bins: (usize, usize),
    aggregation: Aggregation,
) -> Result<Grid> {
    let (nx, ny) = bins;
    if nx == 0 {
        return Err(FrameError::InvalidBins(nx));
    }
    if ny == 0 {
        return Err(FrameError::InvalidBins(ny));
    }
    let (limits_x, limits_y) = limits;
    let mut acc = vec![aggregation.identity(); nx * ny];
    let mut hits = vec![0u64; nx * ny];
    for (row, (&x, &y)) in xs.iter().zip(ys).enumerate() {
        let (Some(ix), Some(iy)) = (limits_x.bin_index(x, nx), limits_y.bin_index(y, ny)) else {
            continue;
        };
        let value = match weights {
            Some(w) => w[row],
            None => 1.0,
        };
        if aggregation.needs_values() && !value.is_finite() {
            continue;
        }
        let cell = iy * nx + ix;
        acc[cell] = aggregation.fold(acc[cell], value);
        hits[cell] += 1;
    }
    let values = acc
        .into_iter()
        .zip(hits)
        .map(|(value, count)| match aggregation {
            Aggregation::Count | Aggregation::Sum => value,
            Aggregation::Mean if count > 0 => value / count as f64,
            _ if count == 0 => f64::NAN,
            _ => value,
        })
        .collect();
    Ok(Grid {
        nx,
        ny,
        limits_x,
        limits_y,
        values,
    })
}
