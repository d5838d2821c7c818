//! Intake server binary
//!
//! Run with: cargo run -p goal-intake --bin goal-intake-server

use goal_intake::{config::IntakeConfig, server::IntakeServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "goal_intake=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                       Goal Intake                         ║
║           File Upload with Asynchronous Parsing           ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Load configuration
    let config = IntakeConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Max file size: {} bytes", config.intake.max_file_size);
    tracing::info!("  - Database: {}", config.storage.database_path.display());
    tracing::info!("  - Uploads: {}", config.storage.blob_dir.display());
    tracing::info!(
        "  - Failed records kept for {}h",
        config.retention.failed_max_age_hours
    );

    // Create and start server
    let server = IntakeServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST   /api/files/upload       - Upload a file");
    println!("  GET    /api/files              - List files");
    println!("  GET    /api/files/:id          - Parsed content");
    println!("  GET    /api/files/:id/progress - Processing progress");
    println!("  DELETE /api/files/:id          - Delete a file");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
