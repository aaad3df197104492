use std::sync::Arc;

use anyhow::Context;

use photo_intake::board::TaskBoard;
use photo_intake::config::{AppConfig, VisionCredentials};
use photo_intake::labeler::VisionLabeler;
use photo_intake::server::{self, AppState};
use photo_intake::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    eprintln!("📷 photo-intake v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   HTTP: http://0.0.0.0:{}", config.port);
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!(
        "   Board: {} (incoming list {})",
        config.trello.lists.board_id, config.trello.lists.incoming_list_id
    );
    eprintln!(
        "   Vision: project {} ({})",
        config.vision.project_id,
        match config.vision.credentials {
            VisionCredentials::ApiKey(_) => "api key",
            VisionCredentials::AccessToken(_) => "access token",
            VisionCredentials::Anonymous => "no credentials found",
        }
    );

    // ── Database ─────────────────────────────────────────────────────────
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?,
    );

    // ── Adapters ─────────────────────────────────────────────────────────
    let state = AppState {
        db,
        labeler: Arc::new(VisionLabeler::new(config.vision.clone())),
        board: Arc::new(TaskBoard::trello(config.trello.clone())),
    };

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;

    server::serve(listener, state).await?;
    Ok(())
}
