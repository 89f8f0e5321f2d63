//! Caller-owned playlist state.
//!
//! The recommendation core never keeps state between requests; a `Session`
//! is how a front end carries the playlist and the latest results across
//! interactions.

use serde::{Deserialize, Serialize};

use crate::features::{Catalog, SeedReference};
use crate::lookup::MetadataLookup;
use crate::rank::{recommend, RecommendConfig, Recommendation};
use crate::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    playlist: Vec<SeedReference>,
    #[serde(default)]
    recommendations: Vec<Recommendation>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_playlist(playlist: Vec<SeedReference>) -> Self {
        Self {
            playlist,
            recommendations: Vec::new(),
        }
    }

    pub fn add_song(&mut self, seed: SeedReference) {
        log::debug!("playlist += {}", seed);
        self.playlist.push(seed);
    }

    pub fn playlist(&self) -> &[SeedReference] {
        &self.playlist
    }

    pub fn recommendations(&self) -> &[Recommendation] {
        &self.recommendations
    }

    /// Recomputes recommendations for the current playlist. On error the
    /// previous results are cleared so stale cards are never shown.
    pub fn refresh<L: MetadataLookup>(
        &mut self,
        catalog: &Catalog,
        lookup: L,
        cfg: &RecommendConfig,
    ) -> Result<&[Recommendation]> {
        self.recommendations.clear();
        self.recommendations = recommend(&self.playlist, catalog, lookup, cfg)?;
        Ok(&self.recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{AudioFeatures, Track, FEATURE_COUNT};
    use crate::lookup::OfflineLookup;
    use crate::SongspaceError;

    fn catalog() -> Catalog {
        let tracks = (0..6)
            .map(|i| {
                let mut v = [0.0; FEATURE_COUNT];
                for (j, x) in v.iter_mut().enumerate() {
                    *x = ((i * 7 + j * 3) % 11) as f64;
                }
                Track::new(format!("T{}", i), 2000 + i as i32, "artist", AudioFeatures::from_vector(&v))
            })
            .collect();
        Catalog::new(tracks).unwrap()
    }

    #[test]
    fn refresh_fills_recommendations() {
        let cat = catalog();
        let mut s = Session::new();
        s.add_song(SeedReference::new("T1", 2001));
        let n = s
            .refresh(&cat, OfflineLookup::new(), &RecommendConfig { top_n: 5 })
            .unwrap()
            .len();
        assert!(n > 0 && n <= 5);
        assert_eq!(s.recommendations().len(), n);
        assert!(s.recommendations().iter().all(|r| r.name != "T1"));
    }

    #[test]
    fn empty_playlist_reports_no_valid_songs_and_clears() {
        let cat = catalog();
        let mut s = Session::from_playlist(vec![SeedReference::new("T1", 2001)]);
        s.refresh(&cat, OfflineLookup::new(), &RecommendConfig::default())
            .unwrap();
        assert!(!s.recommendations().is_empty());

        // same playlist against a catalog that lacks the seed
        let other = Catalog::new(vec![Track::new(
            "Elsewhere",
            1990,
            "nobody",
            cat.tracks()[0].features,
        )])
        .unwrap();
        let err = s
            .refresh(&other, OfflineLookup::new(), &RecommendConfig::default())
            .unwrap_err();
        assert!(matches!(err, SongspaceError::EmptyAggregation));
        assert!(s.recommendations().is_empty());

        let mut s2 = Session::new();
        let err = s2
            .refresh(&cat, OfflineLookup::new(), &RecommendConfig::default())
            .unwrap_err();
        assert!(matches!(err, SongspaceError::EmptyAggregation));
        assert!(s2.recommendations().is_empty());
    }

    #[test]
    fn playlist_json_round_trips_without_recommendations() {
        let s: Session = serde_json::from_str(r#"{"playlist":[{"name":"T1","year":2001}]}"#).unwrap();
        assert_eq!(s.playlist(), &[SeedReference::new("T1", 2001)]);
        assert!(s.recommendations().is_empty());
    }
}
