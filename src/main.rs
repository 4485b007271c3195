//! Airwatch server.
//!
//! Wires the mock backend, guidance strategy and dashboard view together and
//! serves them over HTTP.
//!
//! # API Endpoints
//!
//! - `GET /classify?aqi=` - Severity tier and colour
//! - `GET /guidance?aqi=` - Health guidance
//! - `GET /dashboard` / `POST /dashboard/refresh` - Dashboard view model
//! - `POST /auth/login`, `/auth/register`, `/auth/logout`, `GET /auth/session`
//! - `POST /complaints`, `GET /complaints/:user_id`, `GET /complaints/categories`
//! - `GET /health` - Health check

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use airwatch::api::{AppState, router};
use airwatch::auth::AuthService;
use airwatch::complaints::ComplaintDesk;
use airwatch::config::AppConfig;
use airwatch::dashboard::{CommitPolicy, Dashboard, DashboardView};
use airwatch::guidance::HealthAdvisor;
use airwatch::mock::MockProvider;
use airwatch::provider::DataProvider;
use airwatch::session::MemorySessionStore;
use airwatch::storage::Storage;
use airwatch::text_generation::text_generator_from_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("airwatch=info".parse()?))
        .init();

    let config = AppConfig::from_env();

    info!(
        port = config.port,
        db_url = %config.database_url,
        city = %config.city,
        "Starting Airwatch server"
    );

    let storage = Storage::new(&config.database_url).await?;
    info!("Database initialized");

    let provider: Arc<dyn DataProvider> = Arc::new(MockProvider::new(storage, config.mock_latency));

    let advisor = HealthAdvisor::from_config(&config, text_generator_from_config(&config));

    let dashboard = DashboardView::new(
        Dashboard::new(provider.clone(), advisor.clone()),
        CommitPolicy::default(),
    );

    let state = AppState {
        auth: AuthService::new(provider.clone(), Arc::new(MemorySessionStore::new())),
        complaints: ComplaintDesk::new(provider),
        advisor,
        dashboard: Arc::new(dashboard),
    };

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Airwatch is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
