#![warn(clippy::all, clippy::pedantic)]

use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use clap::Parser;
use netwatch_service::config::{Config, ServerConfig};
use netwatch_service::monitoring::{IcmpProber, LivenessScheduler, Prober, StatusChecker};
use tracing::info;

mod error;
mod response;
mod routes;
mod state;

use error::AppError;
use logger::init_tracing;
use state::AppState;

#[derive(Debug, Parser)]
#[command(version, about = "Network device directory and liveness monitor")]
struct Args {
    /// Path to the TOML config file (default: $XDG_CONFIG_HOME/netwatch/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let config = Config::load(args.config.as_ref())?;
    info!("{config}");

    let repository =
        netwatch_service::open_repository(&config.database.path, config.database.pool_size).await?;

    let prober: Arc<dyn Prober> = Arc::new(IcmpProber::new());
    let checker =
        Arc::new(StatusChecker::new(repository.clone(), prober.clone(), config.probe_timeout()));
    let scheduler = LivenessScheduler::new(repository.clone(), prober, config.scheduler_config());

    if config.scheduler_enabled() {
        scheduler.start().await;
    } else {
        info!("Liveness scheduler disabled");
    }

    let state = AppState { repository, checker, ping_enabled: config.scheduler_enabled() };
    let result = run_server(&config.server, state).await;

    scheduler.stop().await;
    result
}

async fn run_server(server: &ServerConfig, state: AppState) -> Result<(), AppError> {
    let data = web::Data::new(state);
    info!(bind = %server.bind, port = server.port, "Starting HTTP server");

    HttpServer::new(move || App::new().app_data(data.clone()).configure(routes::routes))
        .bind((server.bind.as_str(), server.port))?
        .run()
        .await?;

    Ok(())
}
