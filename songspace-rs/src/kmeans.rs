//! K-means over standardized rows, backed by `linfa-clustering`
//! (k-means++ seeding, best of `n_init` runs by inertia).

use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_clustering::KMeans as LinfaKMeans;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::{Result, SongspaceError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansConfig {
    pub k: usize,
    /// Independent runs; the lowest-inertia one wins.
    pub n_init: usize,
    pub max_iter: u64,
    /// Stop once centroids move less than this between iterations.
    pub tolerance: f64,
    /// `None` seeds from OS entropy on every fit.
    pub seed: Option<u64>,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 10,
            n_init: 10,
            max_iter: 300,
            tolerance: 1e-4,
            seed: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct KMeans {
    centroids: Array2<f64>,
    labels: Vec<usize>,
    inertia: f64,
}

impl KMeans {
    pub fn fit(data: &Array2<f64>, cfg: &KMeansConfig) -> Result<Self> {
        let n = data.nrows();
        if cfg.k == 0 {
            return Err(SongspaceError::Invalid("k must be at least 1".into()));
        }
        if cfg.k > n {
            return Err(SongspaceError::Invalid(format!(
                "k ({}) cannot exceed number of rows ({})",
                cfg.k, n
            )));
        }
        if cfg.n_init == 0 {
            return Err(SongspaceError::Invalid("n_init must be at least 1".into()));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(SongspaceError::Invalid("non-finite values in clustering input".into()));
        }

        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let dataset = DatasetBase::from(data.clone());
        let model = LinfaKMeans::params_with_rng(cfg.k, rng)
            .n_runs(cfg.n_init)
            .max_n_iterations(cfg.max_iter)
            .tolerance(cfg.tolerance)
            .fit(&dataset)
            .map_err(|e| SongspaceError::Clustering(format!("k-means fit failed: {}", e)))?;

        let labels: Array1<usize> = model.predict(data);
        log::debug!("k-means k={} inertia={:.4}", cfg.k, model.inertia());
        Ok(Self {
            centroids: model.centroids().clone(),
            labels: labels.to_vec(),
            inertia: model.inertia(),
        })
    }

    pub fn centroids(&self) -> &Array2<f64> {
        &self.centroids
    }

    /// Cluster of each training row, in row order.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Mean distance from each row to its centroid.
    pub fn inertia(&self) -> f64 {
        self.inertia
    }
}
