use indexmap::IndexMap;

use crate::binning::{bin_1d, bin_2d, Aggregation, Grid, Limits};
use crate::{FrameError, Result};

/// Tabular data that figure builders query.
///
/// Implementors provide column access and masking; the aggregate queries
/// have default implementations over [`FrameProvider::column`].
pub trait FrameProvider: Sized {
    fn column_names(&self) -> Vec<String>;

    fn row_count(&self) -> usize;

    fn column(&self, name: &str) -> Result<&[f64]>;

    /// Keep the rows whose mask entry is `true`.
    fn filter(&self, mask: &[bool]) -> Result<Self>;

    fn has_column(&self, name: &str) -> bool {
        self.column(name).is_ok()
    }

    /// Minimum and maximum finite values of `name`.
    fn min_max(&self, name: &str) -> Result<Limits> {
        let values = self.column(name)?;
        let mut finite = values.iter().copied().filter(|v| v.is_finite());
        let first = finite
            .next()
            .ok_or_else(|| FrameError::EmptyColumn(name.to_string()))?;
        let (min, max) = finite.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Limits::new(min, max)
    }

    /// Histogram counts of `name` over `limits`.
    fn bin_count_1d(&self, name: &str, limits: Limits, bins: usize) -> Result<Vec<u64>> {
        bin_1d(self.column(name)?, limits, bins)
    }

    /// 2-D binned statistic of `value` (or plain counts) over `x` and `y`.
    fn bin_stat_2d(
        &self,
        x: &str,
        y: &str,
        limits: (Limits, Limits),
        bins: (usize, usize),
        aggregation: Aggregation,
        value: Option<&str>,
    ) -> Result<Grid> {
        let xs = self.column(x)?;
        let ys = self.column(y)?;
        let weights = match (aggregation, value) {
            (Aggregation::Count, _) => None,
            (_, Some(name)) => Some(self.column(name)?),
            (_, None) => None,
        };
        // Without a value column every aggregation degenerates to counting.
        let aggregation = if weights.is_none() {
            Aggregation::Count
        } else {
            aggregation
        };
        bin_2d(xs, ys, weights, limits, bins, aggregation)
    }
}

/// In-memory column store. Column order is insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnFrame {
    columns: IndexMap<String, Vec<f64>>,
    rows: usize,
}

impl ColumnFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ColumnFrame::push_column`].
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.push_column(name, values)?;
        Ok(self)
    }

    /// Add or replace a column. Every column must have the same length.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        let replacing_only = self.columns.len() == 1 && self.columns.contains_key(&name);
        if !self.columns.is_empty() && !replacing_only && values.len() != self.rows {
            return Err(FrameError::LengthMismatch {
                column: name,
                expected: self.rows,
                found: values.len(),
            });
        }
        self.rows = values.len();
        self.columns.insert(name, values);
        Ok(())
    }

    /// Mask that is `true` where `predicate` holds for `column`.
    pub fn mask_where(&self, column: &str, predicate: impl Fn(f64) -> bool) -> Result<Vec<bool>> {
        Ok(self.column(column)?.iter().map(|&v| predicate(v)).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

impl FrameProvider for ColumnFrame {
    fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    fn row_count(&self) -> usize {
        self.rows
    }

    fn column(&self, name: &str) -> Result<&[f64]> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| FrameError::MissingColumn(name.to_string()))
    }

    fn filter(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.rows {
            return Err(FrameError::LengthMismatch {
                column: "<mask>".to_string(),
                expected: self.rows,
                found: mask.len(),
            });
        }
        let columns: IndexMap<String, Vec<f64>> = self
            .columns
            .iter()
            .map(|(name, values)| {
                let kept = values
                    .iter()
                    .zip(mask)
                    .filter_map(|(&v, &keep)| keep.then_some(v))
                    .collect();
                (name.clone(), kept)
            })
            .collect();
        let rows = mask.iter().filter(|&&keep| keep).count();
        log::debug!("filtered frame from {} to {rows} rows", self.rows);
        Ok(Self { columns, rows })
    }
}
