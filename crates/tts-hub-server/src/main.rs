use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tts_hub_server::startup::{self, Args};

#[actix_web::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,actix_web=info,tts_hub_server=info")
        }))
        .init();

    startup::run(args).await
}
