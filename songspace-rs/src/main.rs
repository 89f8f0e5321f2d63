use clap::{Parser, Subcommand};
use colored::*;
use songspace::kmeans::KMeansConfig;
use songspace::tsne::TsneConfig;
use songspace::{
    load_catalog, load_genres, ClusterConfig, GenreClusterer, MetadataLookup, OfflineLookup,
    RecommendConfig, SeedReference, Session,
};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "songspace",
    version,
    about = "Song recommendations and genre clusters from audio features"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recommend catalog songs similar to a playlist
    Recommend(RecommendArgs),
    /// Cluster genres and project them to 2D
    Clusters(ClusterArgs),
}

#[derive(clap::Args, Debug)]
struct RecommendArgs {
    /// Track catalog (JSON array of track records)
    #[arg(long)]
    catalog: PathBuf,

    /// Seed song as NAME:YEAR (repeatable)
    #[arg(long = "song", short = 's')]
    songs: Vec<SeedReference>,

    /// JSON array of {"name", "year"} seed songs, added before --song entries
    #[arg(long)]
    playlist: Option<PathBuf>,

    /// Number of recommendations
    #[arg(long, short = 'n', default_value_t = 10, value_parser = clap::value_parser!(u16).range(5..=20))]
    count: u16,

    /// Never query the external metadata service
    #[arg(long, default_value_t = false)]
    offline: bool,

    #[arg(long, env = "SPOTIFY_CLIENT_ID", hide_env_values = true)]
    client_id: Option<String>,

    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Output JSON (array) to stdout only
    #[arg(long = "json", default_value_t = false)]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct ClusterArgs {
    /// Genre table (JSON array of genre records)
    #[arg(long)]
    genres: PathBuf,

    /// Number of clusters
    #[arg(long, short = 'k', default_value_t = 10)]
    k: usize,

    /// Seed for k-means restarts (random when omitted)
    #[arg(long)]
    kmeans_seed: Option<u64>,

    /// Seed for the t-SNE projection
    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long, default_value_t = 30.0)]
    perplexity: f64,

    #[arg(long, default_value_t = 1000)]
    iterations: usize,

    /// Barnes-Hut approximation threshold (0 = exact)
    #[arg(long, default_value_t = 0.5)]
    theta: f64,

    /// Output JSON (array) to stdout only
    #[arg(long = "json", default_value_t = false)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    match args.command {
        Command::Recommend(a) => run_recommend(a),
        Command::Clusters(a) => run_clusters(a),
    }
}

fn build_lookup(args: &RecommendArgs) -> anyhow::Result<Box<dyn MetadataLookup>> {
    if args.offline {
        return Ok(Box::new(OfflineLookup::new()));
    }
    match (&args.client_id, &args.client_secret) {
        #[cfg(feature = "spotify")]
        (Some(id), Some(secret)) => {
            use songspace::{SpotifyClient, SpotifyConfig};
            let client = SpotifyClient::new(SpotifyConfig::new(id.as_str(), secret.as_str()))?;
            Ok(Box::new(client))
        }
        _ => {
            log::warn!("no metadata service configured; seeds missing from the catalog will be skipped");
            Ok(Box::new(OfflineLookup::new()))
        }
    }
}

fn run_recommend(args: RecommendArgs) -> anyhow::Result<()> {
    let catalog = load_catalog(&args.catalog)?;

    let mut session = match &args.playlist {
        Some(path) => {
            let seeds: Vec<SeedReference> =
                serde_json::from_reader(BufReader::new(File::open(path)?))?;
            Session::from_playlist(seeds)
        }
        None => Session::new(),
    };
    for s in &args.songs {
        session.add_song(s.clone());
    }
    if session.playlist().is_empty() {
        anyhow::bail!("add at least one song with --song NAME:YEAR or --playlist FILE");
    }

    let lookup = build_lookup(&args)?;
    let cfg = RecommendConfig {
        top_n: usize::from(args.count),
    };
    session.refresh(&catalog, lookup, &cfg)?;
    let results = session.recommendations();

    if !args.json {
        let mut table = comfy_table::Table::new();
        table.set_header(vec![
            "#".bold(),
            "Song".bold(),
            "Artists".bold(),
            "Year".bold(),
            "Distance".bold(),
        ]);
        for (i, r) in results.iter().enumerate() {
            table.add_row(vec![
                (i + 1).to_string(),
                r.name.clone(),
                r.artists.clone(),
                r.year.to_string(),
                format!("{:.4}", r.distance),
            ]);
        }
        let seeds: Vec<String> = session.playlist().iter().map(|s| s.to_string()).collect();
        eprintln!("{} {}", "Seeds:".green().bold(), seeds.join(", "));
        eprintln!("{}", "Recommended Songs".green().bold());
        eprintln!("{}", table);
    }
    println!("{}", serde_json::to_string_pretty(results)?);
    Ok(())
}

fn run_clusters(args: ClusterArgs) -> anyhow::Result<()> {
    let genres = load_genres(&args.genres)?;
    let cfg = ClusterConfig {
        kmeans: KMeansConfig {
            k: args.k,
            seed: args.kmeans_seed,
            ..Default::default()
        },
        tsne: TsneConfig {
            perplexity: args.perplexity,
            iterations: args.iterations,
            theta: args.theta,
            seed: args.seed,
        },
    };
    let points = GenreClusterer::new(cfg).cluster(&genres)?;

    if !args.json {
        let mut table = comfy_table::Table::new();
        table.set_header(vec!["Genre".bold(), "Cluster".bold(), "x".bold(), "y".bold()]);
        for p in &points {
            table.add_row(vec![
                p.genre.clone(),
                p.cluster.to_string(),
                format!("{:.3}", p.x),
                format!("{:.3}", p.y),
            ]);
        }
        eprintln!("{}", "Genre Clusters (t-SNE)".green().bold());
        eprintln!("{}", table);
    }
    println!("{}", serde_json::to_string_pretty(&points)?);
    Ok(())
}
