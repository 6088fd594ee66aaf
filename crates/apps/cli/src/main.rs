mod cli;
mod commands;

use app_state::load_app_settings;
use clap::Parser;
use cli::{Args, Command};
use color_eyre::Result;
use common_services::context::ServiceContext;
use common_services::database::get_db_pool;
use common_services::embedding_client::HttpEmbeddingClient;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let settings = load_app_settings()?;

    // Logs go to stderr so stdout stays valid JSON.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let output = if let Command::Embed { image } = &args.command {
        commands::embed(&settings, image).await?
    } else {
        let ctx = if args.in_memory {
            let embedder = HttpEmbeddingClient::new(&settings.embedding_service)?;
            ServiceContext::in_memory(Arc::new(embedder), &settings)
        } else {
            let pool = get_db_pool(&settings.secrets.database_url, &settings.database).await?;
            ServiceContext::postgres(pool, &settings)?
        };
        commands::run(args.command, &ctx, &settings).await?
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
