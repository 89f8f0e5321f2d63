//! Genre clustering and 2D projection for plotting.

use serde::{Deserialize, Serialize};

use crate::features::GenreTable;
use crate::kmeans::{KMeans, KMeansConfig};
use crate::scaler::StandardScaler;
use crate::tsne::{Tsne, TsneConfig};
use crate::Result;

pub const DEFAULT_CLUSTERS: usize = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub kmeans: KMeansConfig,
    pub tsne: TsneConfig,
}

/// One plotted genre: projection coordinates plus its cluster label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenrePoint {
    pub genre: String,
    pub x: f64,
    pub y: f64,
    pub cluster: usize,
}

pub struct GenreClusterer {
    cfg: ClusterConfig,
}

impl GenreClusterer {
    pub fn new(cfg: ClusterConfig) -> Self {
        Self { cfg }
    }

    /// Labels every genre with a k-means cluster and projects it to 2D.
    ///
    /// Clustering and projection each standardize the genre features on
    /// their own; the projection is for display only.
    pub fn cluster(&self, table: &GenreTable) -> Result<Vec<GenrePoint>> {
        let raw = table.feature_matrix();

        let (_, scaled) = StandardScaler::fit_transform(&raw)?;
        let km = KMeans::fit(&scaled, &self.cfg.kmeans)?;
        log::info!(
            "clustered {} genres into {} groups (inertia {:.3})",
            table.len(),
            self.cfg.kmeans.k,
            km.inertia()
        );

        let (_, scaled) = StandardScaler::fit_transform(&raw)?;
        let embedding = Tsne::new(self.cfg.tsne.clone()).fit_transform(&scaled)?;

        Ok(table
            .rows()
            .iter()
            .zip(embedding.rows())
            .zip(km.labels())
            .map(|((genre, xy), &cluster)| GenrePoint {
                genre: genre.genre.clone(),
                x: xy[0],
                y: xy[1],
                cluster,
            })
            .collect())
    }
}

impl Default for GenreClusterer {
    fn default() -> Self {
        Self::new(ClusterConfig::default())
    }
}
