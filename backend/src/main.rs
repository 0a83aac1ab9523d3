use bowtie_backend::{config::Config, http};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let config = Config::parse();

    // `log` records are bridged into the subscriber
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .init();

    log::info!(
        "Serving diagrams from {}",
        config.data_dir.display()
    );

    http::serve(config).await
}
