//! Per-feature standardization (zero mean, unit variance).
//!
//! The transform is fitted once on a reference matrix and then reapplied,
//! unchanged, to anything that must live in the same space (for instance a
//! seed vector ranked against the catalog it was fitted on).

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::{Result, SongspaceError};

#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Fits column means and population standard deviations. Constant
    /// columns get a scale of 1 so they map to 0 instead of NaN.
    pub fn fit(data: &Array2<f64>) -> Result<Self> {
        if data.nrows() == 0 {
            return Err(SongspaceError::Invalid("cannot fit scaler on zero rows".into()));
        }
        let mean = data
            .mean_axis(Axis(0))
            .ok_or_else(|| SongspaceError::Invalid("cannot fit scaler on zero rows".into()))?;
        let scale = data
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > f64::EPSILON { s } else { 1.0 });
        Ok(Self { mean, scale })
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    pub fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_dim(data.ncols())?;
        Ok((data - &self.mean) / &self.scale)
    }

    pub fn transform_row(&self, row: ArrayView1<f64>) -> Result<Array1<f64>> {
        self.check_dim(row.len())?;
        Ok((&row - &self.mean) / &self.scale)
    }

    pub fn fit_transform(data: &Array2<f64>) -> Result<(Self, Array2<f64>)> {
        let scaler = Self::fit(data)?;
        let scaled = scaler.transform(data)?;
        Ok((scaler, scaled))
    }

    fn check_dim(&self, got: usize) -> Result<()> {
        if got != self.dim() {
            return Err(SongspaceError::Invalid(format!(
                "scaler fitted on {} features, got {}",
                self.dim(),
                got
            )));
        }
        Ok(())
    }
}
