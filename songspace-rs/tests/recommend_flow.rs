use songspace::scaler::StandardScaler;
use songspace::{
    recommend, AudioAnalysis, AudioFeatures, Catalog, FeatureVectorResolver, MetadataLookup,
    OfflineLookup, RecommendConfig, SeedReference, SimilarityRanker, SongspaceError, Track,
    TrackSummary, FEATURE_COUNT,
};
use ndarray::Axis;

fn features(vals: [f64; 4], year: i32) -> AudioFeatures {
    let mut v = [0.0; FEATURE_COUNT];
    v[0] = vals[0];
    v[1] = f64::from(year);
    v[2] = vals[1];
    v[3] = vals[2];
    v[5] = vals[3];
    v[14] = 100.0 + vals[0] * 40.0;
    AudioFeatures::from_vector(&v)
}

fn scenario_catalog() -> Catalog {
    Catalog::new(vec![
        Track::new("Song A", 2010, "Alpha", features([0.8, 0.2, 0.7, 0.9], 2010)),
        Track::new("Song B", 2010, "Beta", features([0.7, 0.3, 0.6, 0.8], 2010)),
        Track::new("Song C", 2011, "Gamma", features([0.1, 0.9, 0.2, 0.1], 2011)),
    ])
    .unwrap()
}

/// Answers every search with the same remote track.
struct FixedRemote;

impl MetadataLookup for FixedRemote {
    fn search_track(&self, name: &str, _year: i32) -> songspace::Result<Option<TrackSummary>> {
        if name == "Remote Song" {
            Ok(Some(TrackSummary {
                id: "remote-1".into(),
                explicit: false,
                duration_ms: 180_000.0,
                popularity: 60.0,
            }))
        } else {
            Ok(None)
        }
    }

    fn audio_features(&self, _id: &str) -> songspace::Result<AudioAnalysis> {
        Ok(AudioAnalysis {
            valence: 0.75,
            acousticness: 0.25,
            danceability: 0.65,
            energy: 0.85,
            instrumentalness: 0.0,
            key: 4.0,
            liveness: 0.1,
            loudness: -6.0,
            mode: 1.0,
            speechiness: 0.03,
            tempo: 125.0,
        })
    }

    fn service_name(&self) -> &str {
        "fixed"
    }
}

#[test]
fn seed_song_never_recommended_back() {
    let catalog = scenario_catalog();
    let seeds = [SeedReference::new("Song A", 2010)];
    let recs = recommend(&seeds, &catalog, OfflineLookup::new(), &RecommendConfig { top_n: 2 })
        .unwrap();
    assert!(recs.len() <= 2);
    assert!(recs.iter().all(|r| r.name == "Song B" || r.name == "Song C"));
    for w in recs.windows(2) {
        assert!(w[0].distance <= w[1].distance);
    }
}

#[test]
fn results_follow_distance_to_seed() {
    let catalog = scenario_catalog();
    let ranker = SimilarityRanker::fit(&catalog).unwrap();
    let seed = catalog.find("Song A", 2010).unwrap().features.to_vector();
    let distances = ranker.distances(&seed).unwrap();
    let recs = ranker.rank(&seed, &[], 3).unwrap();
    assert_eq!(recs.len(), 3);
    assert_eq!(recs[0].name, "Song A");
    assert!(distances[0].abs() < 1e-12);
    assert!(distances[1] < distances[2]);
    assert_eq!(recs[1].name, "Song B");
}

#[test]
fn unresolvable_seed_does_not_dilute_mean() {
    let catalog = scenario_catalog();
    let resolver = FeatureVectorResolver::new(&catalog, OfflineLookup::new());
    let mean = resolver
        .aggregate(&[
            SeedReference::new("Song B", 2010),
            SeedReference::new("Nowhere Song", 1980),
        ])
        .unwrap();
    assert_eq!(mean, catalog.find("Song B", 2010).unwrap().features.to_vector());
}

#[test]
fn remote_seed_joins_the_mean() {
    let catalog = scenario_catalog();
    let resolver = FeatureVectorResolver::new(&catalog, FixedRemote);
    let mean = resolver
        .aggregate(&[
            SeedReference::new("Song C", 2011),
            SeedReference::new("Remote Song", 2015),
        ])
        .unwrap();
    let local = catalog.find("Song C", 2011).unwrap().features.to_vector();
    let remote = resolver
        .resolve(&SeedReference::new("Remote Song", 2015))
        .unwrap()
        .features
        .to_vector();
    assert_eq!(remote[1], 2015.0);
    for i in 0..FEATURE_COUNT {
        assert!((mean[i] - (local[i] + remote[i]) / 2.0).abs() < 1e-9);
    }
}

#[test]
fn all_seeds_missing_is_empty_aggregation() {
    let catalog = scenario_catalog();
    let err = recommend(
        &[SeedReference::new("Ghost", 1900)],
        &catalog,
        FixedRemote,
        &RecommendConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, SongspaceError::EmptyAggregation));
}

#[test]
fn same_name_other_year_is_excluded_too() {
    let mut tracks = scenario_catalog().tracks().to_vec();
    tracks.push(Track::new("Song A", 1995, "Alpha (orig)", features([0.75, 0.25, 0.65, 0.85], 1995)));
    let catalog = Catalog::new(tracks).unwrap();
    let recs = recommend(
        &[SeedReference::new("Song A", 2010)],
        &catalog,
        OfflineLookup::new(),
        &RecommendConfig { top_n: 4 },
    )
    .unwrap();
    assert_eq!(recs.len(), 2);
    assert!(recs.iter().all(|r| r.name != "Song A"));
}

#[test]
fn catalog_standardization_is_unit_variance() {
    let catalog = scenario_catalog();
    let (_, scaled) = StandardScaler::fit_transform(&catalog.feature_matrix()).unwrap();
    let mean = scaled.mean_axis(Axis(0)).unwrap();
    let std = scaled.std_axis(Axis(0), 0.0);
    for j in 0..FEATURE_COUNT {
        assert!(mean[j].abs() < 1e-9);
        // constant columns stay at zero, the rest have unit variance
        assert!(std[j].abs() < 1e-9 || (std[j] - 1.0).abs() < 1e-9);
    }
    assert!((std[0] - 1.0).abs() < 1e-9);
}
