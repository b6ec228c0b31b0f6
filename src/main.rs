use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aidee::{api, auth::AuthProvider, config::Config, db, llm};

#[derive(Parser)]
#[command(name = "aidee")]
#[command(about = "AI-assisted product planning chat server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Aidee server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "aidee=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let port = match cli.command {
        Some(Commands::Serve { port }) => port,
        None => 3000,
    };

    let config = Config::from_env();

    let db = match &config.db_path {
        Some(path) => db::Database::open(path.clone())?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;

    // A missing inference credential is not fatal: the server still serves
    // projects and transcripts, and the chat endpoint reports the fixed
    // configuration error.
    let model: Option<Arc<dyn llm::ChatModel>> = match llm::GeminiClient::from_config(&config) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "Inference disabled");
            None
        }
    };

    // Shares the credential with the chat client; absence is already
    // reported above.
    let images: Option<Arc<dyn llm::ImageModel>> = llm::ImagenClient::from_config(&config)
        .ok()
        .map(|client| Arc::new(client) as Arc<dyn llm::ImageModel>);

    let provider = match (&config.auth_url, &config.auth_anon_key) {
        (Some(url), Some(key)) => Some(Arc::new(AuthProvider::new(url, key))),
        _ => {
            tracing::info!("No identity provider configured, running in local mode");
            None
        }
    };

    let state =
        api::AppState::new(db, model, images, provider).with_site_url(config.site_url.clone());
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Aidee server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
