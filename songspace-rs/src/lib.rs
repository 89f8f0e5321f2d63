//! songspace Rust core library
//!
//! Recommends catalog tracks similar to a seed playlist by cosine distance in
//! a standardized audio-feature space, and clusters genres with k-means plus
//! a t-SNE projection for plotting.
//!
//! ```no_run
//! use songspace::{load_catalog, recommend, OfflineLookup, RecommendConfig, SeedReference};
//! use std::path::Path;
//!
//! let catalog = load_catalog(Path::new("data.json"))?;
//! let seeds = vec![SeedReference::new("Bohemian Rhapsody", 1975)];
//! let recs = recommend(&seeds, &catalog, OfflineLookup::new(), &RecommendConfig::default())?;
//! for r in recs {
//!     println!("{} ({}) - {}", r.name, r.year, r.artists);
//! }
//! # Ok::<(), songspace::SongspaceError>(())
//! ```

use thiserror::Error;

pub mod cluster;
pub mod features;
pub mod kmeans;
pub mod load;
pub mod lookup;
pub mod rank;
pub mod resolve;
pub mod scaler;
pub mod session;
#[cfg(feature = "spotify")]
pub mod spotify;
pub mod tsne;

pub use cluster::{ClusterConfig, GenreClusterer, GenrePoint};
pub use features::{
    AudioFeatures, Catalog, FeatureVector, GenreProfile, GenreTable, SeedReference, Track,
    FEATURE_COUNT, FEATURE_NAMES,
};
pub use load::{load_catalog, load_genres};
pub use lookup::{AudioAnalysis, MetadataLookup, OfflineLookup, TrackSummary};
pub use rank::{recommend, RecommendConfig, Recommendation, SimilarityRanker};
pub use resolve::FeatureVectorResolver;
pub use session::Session;
#[cfg(feature = "spotify")]
pub use spotify::{SpotifyClient, SpotifyConfig};

#[derive(Debug, Error)]
pub enum SongspaceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Song not found: {0}")]
    NotFound(String),
    #[error("No valid songs: none of the seed songs could be resolved")]
    EmptyAggregation,
    #[error("External service error: {0}")]
    ExternalService(String),
    #[error("Schema error: {0}")]
    Schema(String),
    #[error("Clustering error: {0}")]
    Clustering(String),
    #[error("Invalid argument: {0}")]
    Invalid(String),
    #[error("Other: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SongspaceError>;
