//! Chaos Game — scores a service's resilience against injected faults.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use chaosgame_fault::HttpFaultBackend;
use chaosgame_runtime::{HttpHealthCheck, Orchestrator};
use chaosgame_server::{build_router, start_run_worker, AppState};
use chaosgame_store::SqliteScoreStore;

/// Upper bound on a single fault backend request.
const BACKEND_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

fn resolve_data_dir() -> PathBuf {
    std::env::var("CHAOSGAME_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--help" | "-h" | "help" => {
                println!("Chaos Game — fault-injection resilience scoring");
                println!();
                println!("Usage: chaosgame [command]");
                println!();
                println!("Commands:");
                println!("  (none)      Start the server");
                println!("  help        Show this help message");
                println!();
                println!("Environment:");
                println!("  PORT, PROJECT_TAG, APP_URL, FAULT_BACKEND_URL, SCORE_KEY,");
                println!("  CHAOSGAME_DATA_DIR, CHAOS_* workflow overrides");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'chaosgame help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = chaosgame_core::ChaosGameConfig::from_env(&data_dir)?;
    let port = config.port;

    let store = Arc::new(
        SqliteScoreStore::open(&config.data_paths.scoredb)
            .map_err(|e| anyhow::anyhow!("Failed to open score store: {}", e))?,
    );
    let backend = Arc::new(HttpFaultBackend::new(
        config.fault_backend_url.clone(),
        BACKEND_REQUEST_TIMEOUT,
    )?);
    let health = Arc::new(HttpHealthCheck::new(config.app_url.clone()));
    info!(
        "Fault backend {}, target health endpoint {}",
        backend.base_url(),
        health.url()
    );

    let orchestrator = Orchestrator::new(
        backend,
        health,
        store.clone(),
        config.score_key.clone(),
        config.workflow.clone(),
    );

    let state = Arc::new(AppState::new(config, store, orchestrator));

    start_run_worker(state.clone());

    let app = build_router(state.clone());

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Chaos Game server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
