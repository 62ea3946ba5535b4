use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use memory_lane::{Config, MemoryLaneApp};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    dotenvy::dotenv().ok();

    let log_level = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info".to_string())
        .parse()
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting MemoryLane");

    let config = Config::from_env()?;
    info!("Configuration loaded from environment");

    let app = MemoryLaneApp::from_config(config).await?;

    match app.restore().await? {
        Some(user) => {
            let state = app.memories().store().snapshot();
            info!(
                "Signed in as {} <{}> with {} memories in {} categories, {} favorites",
                user.name,
                user.email,
                state.count(),
                state.categories().len(),
                state.favorites().len()
            );
        }
        None => warn!("No persisted session, nothing to synchronize"),
    }

    let mut changes = app.memories().store().subscribe();
    info!("Listening for changes, press Ctrl+C to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let count = changes.borrow_and_update().count();
                info!("Memory list updated: {} entries", count);
            }
        }
    }

    app.memories().unsubscribe();
    info!("Shutting down");
    Ok(())
}
