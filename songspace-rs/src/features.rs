//! Fixed-schema records: tracks, the catalog, seed references and genre rows.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Result, SongspaceError};

/// Ordered audio features used for track similarity.
pub const FEATURE_NAMES: &[&str] = &[
    "valence",
    "year",
    "acousticness",
    "danceability",
    "duration_ms",
    "energy",
    "explicit",
    "instrumentalness",
    "key",
    "liveness",
    "loudness",
    "mode",
    "popularity",
    "speechiness",
    "tempo",
];

pub const FEATURE_COUNT: usize = 15;

/// Ordered view of [`AudioFeatures`], indexed like [`FEATURE_NAMES`].
pub type FeatureVector = [f64; FEATURE_COUNT];

/// Numeric genre columns, in table order.
pub const GENRE_FEATURE_NAMES: &[&str] = &[
    "mode",
    "acousticness",
    "danceability",
    "duration_ms",
    "energy",
    "instrumentalness",
    "liveness",
    "loudness",
    "speechiness",
    "tempo",
    "valence",
    "popularity",
    "key",
];

pub const GENRE_FEATURE_COUNT: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub valence: f64,
    pub year: f64,
    pub acousticness: f64,
    pub danceability: f64,
    pub duration_ms: f64,
    pub energy: f64,
    pub explicit: f64,
    pub instrumentalness: f64,
    pub key: f64,
    pub liveness: f64,
    pub loudness: f64,
    pub mode: f64,
    pub popularity: f64,
    pub speechiness: f64,
    pub tempo: f64,
}

impl AudioFeatures {
    pub fn to_vector(&self) -> FeatureVector {
        [
            self.valence,
            self.year,
            self.acousticness,
            self.danceability,
            self.duration_ms,
            self.energy,
            self.explicit,
            self.instrumentalness,
            self.key,
            self.liveness,
            self.loudness,
            self.mode,
            self.popularity,
            self.speechiness,
            self.tempo,
        ]
    }

    pub fn from_vector(v: &FeatureVector) -> Self {
        Self {
            valence: v[0],
            year: v[1],
            acousticness: v[2],
            danceability: v[3],
            duration_ms: v[4],
            energy: v[5],
            explicit: v[6],
            instrumentalness: v[7],
            key: v[8],
            liveness: v[9],
            loudness: v[10],
            mode: v[11],
            popularity: v[12],
            speechiness: v[13],
            tempo: v[14],
        }
    }
}

/// A catalog row. `(name, year)` is not unique; lookups take the first match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub name: String,
    pub year: i32,
    pub artists: String,
    pub features: AudioFeatures,
}

/// Flat on-disk shape of a track row. Every column is required.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackRecord {
    pub name: String,
    pub year: i32,
    pub artists: String,
    pub valence: f64,
    pub acousticness: f64,
    pub danceability: f64,
    pub duration_ms: f64,
    pub energy: f64,
    pub explicit: f64,
    pub instrumentalness: f64,
    pub key: f64,
    pub liveness: f64,
    pub loudness: f64,
    pub mode: f64,
    pub popularity: f64,
    pub speechiness: f64,
    pub tempo: f64,
}

impl From<TrackRecord> for Track {
    fn from(r: TrackRecord) -> Self {
        let features = AudioFeatures {
            valence: r.valence,
            year: f64::from(r.year),
            acousticness: r.acousticness,
            danceability: r.danceability,
            duration_ms: r.duration_ms,
            energy: r.energy,
            explicit: r.explicit,
            instrumentalness: r.instrumentalness,
            key: r.key,
            liveness: r.liveness,
            loudness: r.loudness,
            mode: r.mode,
            popularity: r.popularity,
            speechiness: r.speechiness,
            tempo: r.tempo,
        };
        Self {
            name: r.name,
            year: r.year,
            artists: r.artists,
            features,
        }
    }
}

impl Track {
    pub fn new(
        name: impl Into<String>,
        year: i32,
        artists: impl Into<String>,
        features: AudioFeatures,
    ) -> Self {
        Self {
            name: name.into(),
            year,
            artists: artists.into(),
            features,
        }
    }
}

/// Ordered, read-only collection of tracks.
#[derive(Debug, Clone)]
pub struct Catalog {
    tracks: Vec<Track>,
}

impl Catalog {
    /// Builds a catalog; an empty track list is a schema error since nothing
    /// can be standardized against it.
    pub fn new(tracks: Vec<Track>) -> Result<Self> {
        if tracks.is_empty() {
            return Err(SongspaceError::Schema("catalog has no tracks".into()));
        }
        Ok(Self { tracks })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// First track matching `name` and `year` exactly, in catalog order.
    pub fn find(&self, name: &str, year: i32) -> Option<&Track> {
        self.tracks.iter().find(|t| t.name == name && t.year == year)
    }

    /// Rows are tracks, columns follow [`FEATURE_NAMES`].
    pub fn feature_matrix(&self) -> Array2<f64> {
        let mut m = Array2::<f64>::zeros((self.tracks.len(), FEATURE_COUNT));
        for (mut row, track) in m.rows_mut().into_iter().zip(&self.tracks) {
            for (cell, v) in row.iter_mut().zip(track.features.to_vector()) {
                *cell = v;
            }
        }
        m
    }
}

/// A user supplied `(name, year)` pair. Not guaranteed to exist anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReference {
    pub name: String,
    pub year: i32,
}

impl SeedReference {
    pub fn new(name: impl Into<String>, year: i32) -> Self {
        Self {
            name: name.into(),
            year,
        }
    }
}

impl fmt::Display for SeedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.year)
    }
}

/// Parses `"Name:Year"`. The split is on the last colon so titles may contain colons.
impl FromStr for SeedReference {
    type Err = SongspaceError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, year) = s
            .rsplit_once(':')
            .ok_or_else(|| SongspaceError::Invalid(format!("expected NAME:YEAR, got '{}'", s)))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(SongspaceError::Invalid(format!("empty song name in '{}'", s)));
        }
        let year = year
            .trim()
            .parse::<i32>()
            .map_err(|_| SongspaceError::Invalid(format!("invalid year in '{}'", s)))?;
        Ok(Self::new(name, year))
    }
}

/// One row of the per-genre aggregate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreProfile {
    #[serde(rename = "genres")]
    pub genre: String,
    pub mode: f64,
    pub acousticness: f64,
    pub danceability: f64,
    pub duration_ms: f64,
    pub energy: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub loudness: f64,
    pub speechiness: f64,
    pub tempo: f64,
    pub valence: f64,
    pub popularity: f64,
    pub key: f64,
}

impl GenreProfile {
    pub fn to_vector(&self) -> [f64; GENRE_FEATURE_COUNT] {
        [
            self.mode,
            self.acousticness,
            self.danceability,
            self.duration_ms,
            self.energy,
            self.instrumentalness,
            self.liveness,
            self.loudness,
            self.speechiness,
            self.tempo,
            self.valence,
            self.popularity,
            self.key,
        ]
    }
}

#[derive(Debug, Clone)]
pub struct GenreTable {
    rows: Vec<GenreProfile>,
}

impl GenreTable {
    pub fn new(rows: Vec<GenreProfile>) -> Result<Self> {
        if rows.is_empty() {
            return Err(SongspaceError::Schema("genre table has no rows".into()));
        }
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[GenreProfile] {
        &self.rows
    }

    pub fn feature_matrix(&self) -> Array2<f64> {
        let mut m = Array2::<f64>::zeros((self.rows.len(), GENRE_FEATURE_COUNT));
        for (mut row, genre) in m.rows_mut().into_iter().zip(&self.rows) {
            for (cell, v) in row.iter_mut().zip(genre.to_vector()) {
                *cell = v;
            }
        }
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(seed: f64) -> AudioFeatures {
        let mut v = [0.0; FEATURE_COUNT];
        for (i, x) in v.iter_mut().enumerate() {
            *x = seed + i as f64;
        }
        AudioFeatures::from_vector(&v)
    }

    #[test]
    fn names_match_counts() {
        assert_eq!(FEATURE_NAMES.len(), FEATURE_COUNT);
        assert_eq!(GENRE_FEATURE_NAMES.len(), GENRE_FEATURE_COUNT);
    }

    #[test]
    fn vector_order_follows_feature_names() {
        let f = features(0.0);
        let v = f.to_vector();
        assert_eq!(v[1], f.year);
        assert_eq!(v[4], f.duration_ms);
        assert_eq!(v[14], f.tempo);
        assert_eq!(AudioFeatures::from_vector(&v), f);
    }

    #[test]
    fn find_takes_first_match() {
        let catalog = Catalog::new(vec![
            Track::new("Dup", 2000, "first", features(1.0)),
            Track::new("Dup", 2000, "second", features(2.0)),
            Track::new("Dup", 2001, "other year", features(3.0)),
        ])
        .unwrap();
        assert_eq!(catalog.find("Dup", 2000).unwrap().artists, "first");
        assert_eq!(catalog.find("Dup", 2001).unwrap().artists, "other year");
        assert!(catalog.find("Dup", 1999).is_none());
    }

    #[test]
    fn empty_catalog_is_schema_error() {
        assert!(matches!(Catalog::new(vec![]), Err(SongspaceError::Schema(_))));
    }

    #[test]
    fn feature_matrix_shape() {
        let catalog = Catalog::new(vec![
            Track::new("A", 2000, "x", features(1.0)),
            Track::new("B", 2001, "y", features(5.0)),
        ])
        .unwrap();
        let m = catalog.feature_matrix();
        assert_eq!(m.dim(), (2, FEATURE_COUNT));
        assert_eq!(m[[1, 0]], 5.0);
    }

    #[test]
    fn parse_seed_reference() {
        let s: SeedReference = "Bohemian Rhapsody:1975".parse().unwrap();
        assert_eq!(s, SeedReference::new("Bohemian Rhapsody", 1975));
        let s: SeedReference = "Re: Stacks:2007".parse().unwrap();
        assert_eq!(s.name, "Re: Stacks");
        assert!("no year".parse::<SeedReference>().is_err());
        assert!("Song:abc".parse::<SeedReference>().is_err());
        assert!(":2000".parse::<SeedReference>().is_err());
    }

    #[test]
    fn track_record_fills_year_feature() {
        let json = r#"{"name":"A","year":1999,"artists":"['X']","valence":0.5,
            "acousticness":0.1,"danceability":0.2,"duration_ms":200000,"energy":0.3,
            "explicit":0,"instrumentalness":0.0,"key":5,"liveness":0.1,"loudness":-7.0,
            "mode":1,"popularity":40,"speechiness":0.05,"tempo":120.0}"#;
        let rec: TrackRecord = serde_json::from_str(json).unwrap();
        let t = Track::from(rec);
        assert_eq!(t.year, 1999);
        assert_eq!(t.features.year, 1999.0);
        assert_eq!(t.features.key, 5.0);
    }
}
