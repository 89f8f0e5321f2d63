//! Two-dimensional t-SNE projection, backed by `linfa-tsne`.
//!
//! Uses the Barnes-Hut approximation: affinities are kept for the
//! `3 * perplexity` nearest neighbours only and repulsion is summarized per
//! quad-tree cell, so cost grows as O(n log n) per iteration rather than
//! O(n²). `theta = 0` falls back to the exact gradient.

use linfa::traits::Transformer;
use linfa::ParamGuard;
use linfa_tsne::TSneParams;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::{Result, SongspaceError};

const OUT_DIM: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TsneConfig {
    /// Effective neighbour count; must satisfy `3 * perplexity <= rows - 1`.
    pub perplexity: f64,
    pub iterations: usize,
    /// Barnes-Hut accuracy/speed trade-off.
    pub theta: f64,
    /// Seeds the initial embedding.
    pub seed: u64,
}

impl Default for TsneConfig {
    fn default() -> Self {
        Self {
            perplexity: 30.0,
            iterations: 1000,
            theta: 0.5,
            seed: 42,
        }
    }
}

pub struct Tsne {
    cfg: TsneConfig,
}

impl Tsne {
    pub fn new(cfg: TsneConfig) -> Self {
        Self { cfg }
    }

    /// Embeds each row of `data` into 2D. Output has one row per input row.
    pub fn fit_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        let n = data.nrows();
        let cfg = &self.cfg;
        if n < 2 {
            return Err(SongspaceError::Invalid("t-SNE needs at least 2 rows".into()));
        }
        if cfg.perplexity.is_nan() || cfg.perplexity <= 0.0 {
            return Err(SongspaceError::Invalid(format!(
                "perplexity ({}) must be positive",
                cfg.perplexity
            )));
        }
        if 3.0 * cfg.perplexity > (n - 1) as f64 {
            return Err(SongspaceError::Invalid(format!(
                "perplexity ({}) too large for {} rows; needs 3 * perplexity <= rows - 1",
                cfg.perplexity, n
            )));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(SongspaceError::Invalid("non-finite values in t-SNE input".into()));
        }

        let rng = StdRng::seed_from_u64(cfg.seed);
        let params = TSneParams::embedding_size_with_rng(OUT_DIM, rng)
            .perplexity(cfg.perplexity)
            .approx_threshold(cfg.theta)
            .max_iter(cfg.iterations)
            .check()
            .map_err(|e| SongspaceError::Invalid(format!("t-SNE parameters: {}", e)))?;
        log::debug!(
            "t-SNE on {} rows (perplexity {}, theta {}, {} iterations)",
            n,
            cfg.perplexity,
            cfg.theta,
            cfg.iterations
        );
        params
            .transform(data.as_standard_layout().into_owned())
            .map_err(|e| SongspaceError::Clustering(format!("t-SNE failed: {}", e)))
    }
}
