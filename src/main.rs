use clap::Parser;
use reeltrack::{
    config::{Backend, Config},
    db,
    error::IngestResult,
    ingest::{IngestReport, Ingestor},
    models::ViewingRequest,
    source::HttpSource,
    store::{FlatFileStore, SqlStore},
};
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "reeltrack")]
#[command(author, version, about = "Record a movie viewing and ingest the movie's metadata")]
struct Cli {
    /// Provider movie id, e.g. 0099810
    movie_id: String,

    /// Date watched (YYYY-MM-DD)
    watch_date: String,

    /// Personal rating
    #[arg(allow_negative_numbers = true)]
    rating: f64,

    /// How the movie was watched, e.g. Blu-ray
    method: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,reeltrack=debug,sqlx=warn".to_string()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let request = ViewingRequest::new(&cli.movie_id, &cli.watch_date, cli.rating, &cli.method)?;

    let http = reqwest::Client::builder().user_agent("reeltrack/0.1").build()?;
    let source = HttpSource::new(
        http,
        config.provider_access_token.clone(),
        config.provider_base_url.clone(),
    );

    if let Err(err) = run(&config, source, &request).await {
        if err.is_store_failure() && config.backend == Backend::Csv {
            warn!(
                movie_id = request.movie_id,
                data_dir = %config.data_dir.display(),
                "flat-file store may hold a partially written ingestion"
            );
        }
        return Err(err.into());
    }

    Ok(())
}

async fn run(
    config: &Config,
    source: HttpSource,
    request: &ViewingRequest,
) -> IngestResult<IngestReport> {
    match config.backend {
        Backend::Sqlite => {
            let db = db::connect_and_migrate(&config.database_url).await?;
            Ingestor::new(SqlStore::new(db), source).ingest(request).await
        },
        Backend::Csv => {
            let store = FlatFileStore::open(&config.data_dir)?;
            Ingestor::new(store, source).ingest(request).await
        },
    }
}
