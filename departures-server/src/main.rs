use std::sync::Arc;

use tracing::{error, info};

use departures_server::cache::{CacheConfig, CachedSncfClient};
use departures_server::config::{AppConfig, DataSource};
use departures_server::logger::init_logger;
use departures_server::reports::{ReportPoller, ReportStore};
use departures_server::sncf::{MockSncfClient, SncfClient, TransitApi};
use departures_server::web::{AppState, ViewConfig, create_router};

/// Static assets shipped with the crate.
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

#[tokio::main]
async fn main() {
    init_logger();

    if let Err(e) = run().await {
        error!(error = %e, "server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    // Pick the data source
    let api: Arc<dyn TransitApi> = match &config.source {
        DataSource::Mock(dir) => {
            info!(dir = ?dir, "using mock SNCF data");
            Arc::new(MockSncfClient::from_dir(dir)?)
        }
        DataSource::Live(settings) => {
            let client = SncfClient::new(settings.client_config())?;
            Arc::new(CachedSncfClient::new(
                Arc::new(client),
                &CacheConfig::default(),
            ))
        }
    };

    let view_config = ViewConfig::default();

    // Start report polling
    let reports = Arc::new(ReportStore::new());
    let poller = ReportPoller::start(
        Arc::clone(&api),
        Arc::clone(&reports),
        view_config.poll_interval,
    );

    let state = AppState::new(api, reports, view_config);
    let app = create_router(state, STATIC_DIR);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("SNCF departures board listening on http://{}", config.addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    poller.stop().await;
    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for ctrl-c");
        // Without a signal handler, run until killed
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
