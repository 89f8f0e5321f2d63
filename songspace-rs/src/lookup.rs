//! External metadata lookup used when a seed song is not in the local catalog.

use serde::{Deserialize, Serialize};

use crate::Result;

/// Best search hit for a `(name, year)` query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub id: String,
    pub explicit: bool,
    pub duration_ms: f64,
    pub popularity: f64,
}

/// Audio attributes reported for a single track id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAnalysis {
    pub valence: f64,
    pub acousticness: f64,
    pub danceability: f64,
    pub energy: f64,
    pub instrumentalness: f64,
    pub key: f64,
    pub liveness: f64,
    pub loudness: f64,
    pub mode: f64,
    pub speechiness: f64,
    pub tempo: f64,
}

/// Trait abstraction for a remote music metadata service.
pub trait MetadataLookup {
    /// Top result for the query, or `None` when the service has no match.
    fn search_track(&self, name: &str, year: i32) -> Result<Option<TrackSummary>>;
    fn audio_features(&self, track_id: &str) -> Result<AudioAnalysis>;
    fn service_name(&self) -> &str;
}

impl MetadataLookup for Box<dyn MetadataLookup> {
    fn search_track(&self, name: &str, year: i32) -> Result<Option<TrackSummary>> {
        (**self).search_track(name, year)
    }
    fn audio_features(&self, track_id: &str) -> Result<AudioAnalysis> {
        (**self).audio_features(track_id)
    }
    fn service_name(&self) -> &str {
        (**self).service_name()
    }
}

impl<L: MetadataLookup + ?Sized> MetadataLookup for &L {
    fn search_track(&self, name: &str, year: i32) -> Result<Option<TrackSummary>> {
        (**self).search_track(name, year)
    }
    fn audio_features(&self, track_id: &str) -> Result<AudioAnalysis> {
        (**self).audio_features(track_id)
    }
    fn service_name(&self) -> &str {
        (**self).service_name()
    }
}

/// Lookup used when no external service is configured: nothing is ever found.
#[derive(Debug, Clone, Default)]
pub struct OfflineLookup;

impl OfflineLookup {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataLookup for OfflineLookup {
    fn search_track(&self, _name: &str, _year: i32) -> Result<Option<TrackSummary>> {
        Ok(None)
    }
    fn audio_features(&self, track_id: &str) -> Result<AudioAnalysis> {
        Err(crate::SongspaceError::ExternalService(format!(
            "offline: no audio features for {}",
            track_id
        )))
    }
    fn service_name(&self) -> &str {
        "offline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_never_finds() {
        let l = OfflineLookup::new();
        assert_eq!(l.search_track("anything", 2000).unwrap(), None);
        assert!(l.audio_features("id").is_err());
        let boxed: Box<dyn MetadataLookup> = Box::new(l);
        assert_eq!(boxed.service_name(), "offline");
    }
}
