//! Similarity ranking of catalog tracks against a seed vector.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::features::{Catalog, FeatureVector, SeedReference};
use crate::lookup::MetadataLookup;
use crate::resolve::FeatureVectorResolver;
use crate::scaler::StandardScaler;
use crate::{Result, SongspaceError};

pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendConfig {
    pub top_n: usize,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub name: String,
    pub year: i32,
    pub artists: String,
    /// Cosine distance to the standardized seed vector.
    pub distance: f64,
}

/// One minus cosine similarity. A zero vector has no direction, so it is
/// treated as orthogonal to everything (distance 1).
pub fn cosine_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let dot = a.dot(&b);
    let na = a.dot(&a).sqrt();
    let nb = b.dot(&b).sqrt();
    if na == 0.0 || nb == 0.0 {
        1.0
    } else {
        1.0 - dot / (na * nb)
    }
}

/// Catalog standardized once, ready to rank seed vectors against.
pub struct SimilarityRanker<'a> {
    catalog: &'a Catalog,
    scaler: StandardScaler,
    scaled: Array2<f64>,
}

impl<'a> SimilarityRanker<'a> {
    pub fn fit(catalog: &'a Catalog) -> Result<Self> {
        let (scaler, scaled) = StandardScaler::fit_transform(&catalog.feature_matrix())?;
        Ok(Self {
            catalog,
            scaler,
            scaled,
        })
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Cosine distance from the seed to every catalog row, in catalog order.
    /// The seed goes through the scaler fitted on the catalog, never its own.
    pub fn distances(&self, seed: &FeatureVector) -> Result<Vec<f64>> {
        let seed = Array1::from(seed.to_vec());
        let seed = self.scaler.transform_row(seed.view())?;
        Ok(self
            .scaled
            .axis_iter(Axis(0))
            .into_par_iter()
            .map(|row| cosine_distance(seed.view(), row))
            .collect())
    }

    /// Takes the `top_n` closest tracks, then removes any whose name matches
    /// a seed name. Exclusion is by name alone, so a result can hold fewer
    /// than `top_n` entries.
    pub fn rank(
        &self,
        seed: &FeatureVector,
        seeds: &[SeedReference],
        top_n: usize,
    ) -> Result<Vec<Recommendation>> {
        if top_n == 0 {
            return Err(SongspaceError::Invalid("top_n must be at least 1".into()));
        }
        let distances = self.distances(seed)?;
        let mut order: Vec<usize> = (0..distances.len()).collect();
        order.sort_by(|&a, &b| distances[a].total_cmp(&distances[b]));

        let seed_names: HashSet<&str> = seeds.iter().map(|s| s.name.as_str()).collect();
        let tracks = self.catalog.tracks();
        let out: Vec<Recommendation> = order
            .into_iter()
            .take(top_n)
            .filter(|&i| !seed_names.contains(tracks[i].name.as_str()))
            .map(|i| Recommendation {
                name: tracks[i].name.clone(),
                year: tracks[i].year,
                artists: tracks[i].artists.clone(),
                distance: distances[i],
            })
            .collect();
        log::debug!(
            "ranked {} tracks, kept {} of top {}",
            tracks.len(),
            out.len(),
            top_n
        );
        Ok(out)
    }
}

/// Resolve + aggregate + rank in one call.
pub fn recommend<L: MetadataLookup>(
    seeds: &[SeedReference],
    catalog: &Catalog,
    lookup: L,
    cfg: &RecommendConfig,
) -> Result<Vec<Recommendation>> {
    let resolver = FeatureVectorResolver::new(catalog, lookup);
    let center = resolver.aggregate(seeds)?;
    let ranker = SimilarityRanker::fit(catalog)?;
    let recs = ranker.rank(&center, seeds, cfg.top_n)?;
    log::info!(
        "{} recommendations for {} seed songs",
        recs.len(),
        seeds.len()
    );
    Ok(recs)
}
