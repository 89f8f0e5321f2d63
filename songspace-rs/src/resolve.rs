//! Seed resolution and aggregation.
//!
//! A seed is looked up in the catalog on `(name, year)` first; when that
//! misses, the configured [`MetadataLookup`] is asked instead. Seeds that
//! cannot be resolved either way are logged and dropped, never imputed.

use crate::features::{AudioFeatures, Catalog, FeatureVector, SeedReference, FEATURE_COUNT};
use crate::lookup::MetadataLookup;
use crate::{Result, SongspaceError};

/// Where a resolved vector came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Catalog,
    External,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub seed: SeedReference,
    pub features: AudioFeatures,
    pub source: Source,
}

pub struct FeatureVectorResolver<'a, L: MetadataLookup> {
    catalog: &'a Catalog,
    lookup: L,
}

impl<'a, L: MetadataLookup> FeatureVectorResolver<'a, L> {
    pub fn new(catalog: &'a Catalog, lookup: L) -> Self {
        Self { catalog, lookup }
    }

    pub fn catalog(&self) -> &Catalog {
        self.catalog
    }

    /// Resolves one seed, or `None` (with a warning) when neither the
    /// catalog nor the external service knows it.
    pub fn resolve(&self, seed: &SeedReference) -> Option<Resolved> {
        match self.try_resolve(seed) {
            Ok(r) => Some(r),
            Err(e) => {
                log::warn!(
                    "{} does not exist in {} or in the catalog: {}",
                    seed,
                    self.lookup.service_name(),
                    e
                );
                None
            }
        }
    }

    /// Like [`resolve`](Self::resolve) but reports why a seed failed.
    pub fn try_resolve(&self, seed: &SeedReference) -> Result<Resolved> {
        if let Some(track) = self.catalog.find(&seed.name, seed.year) {
            log::debug!("resolved {} from catalog", seed);
            return Ok(Resolved {
                seed: seed.clone(),
                features: track.features,
                source: Source::Catalog,
            });
        }
        let features = self.fetch_external(seed)?;
        log::debug!("resolved {} via {}", seed, self.lookup.service_name());
        Ok(Resolved {
            seed: seed.clone(),
            features,
            source: Source::External,
        })
    }

    fn fetch_external(&self, seed: &SeedReference) -> Result<AudioFeatures> {
        let hit = self
            .lookup
            .search_track(&seed.name, seed.year)?
            .ok_or_else(|| SongspaceError::NotFound(seed.to_string()))?;
        let analysis = self.lookup.audio_features(&hit.id)?;
        Ok(AudioFeatures {
            valence: analysis.valence,
            year: f64::from(seed.year),
            acousticness: analysis.acousticness,
            danceability: analysis.danceability,
            duration_ms: hit.duration_ms,
            energy: analysis.energy,
            explicit: if hit.explicit { 1.0 } else { 0.0 },
            instrumentalness: analysis.instrumentalness,
            key: analysis.key,
            liveness: analysis.liveness,
            loudness: analysis.loudness,
            mode: analysis.mode,
            popularity: hit.popularity,
            speechiness: analysis.speechiness,
            tempo: analysis.tempo,
        })
    }

    /// Resolves every seed in order and averages the ones that resolved.
    pub fn aggregate(&self, seeds: &[SeedReference]) -> Result<FeatureVector> {
        let vectors: Vec<FeatureVector> = seeds
            .iter()
            .filter_map(|s| self.resolve(s))
            .map(|r| r.features.to_vector())
            .collect();
        log::info!("resolved {} of {} seed songs", vectors.len(), seeds.len());
        mean_vector(&vectors)
    }
}

/// Elementwise arithmetic mean. An empty input is an error, not a NaN vector.
pub fn mean_vector(vectors: &[FeatureVector]) -> Result<FeatureVector> {
    if vectors.is_empty() {
        return Err(SongspaceError::EmptyAggregation);
    }
    let mut acc = [0.0f64; FEATURE_COUNT];
    for v in vectors {
        for (a, x) in acc.iter_mut().zip(v) {
            *a += x;
        }
    }
    let n = vectors.len() as f64;
    for a in acc.iter_mut() {
        *a /= n;
    }
    Ok(acc)
}
