use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use fitbook::config::AppConfig;
use fitbook::db;
use fitbook::handlers;
use fitbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let trainers = db::validate_schedules(&conn)?;
    tracing::info!(
        trainers,
        booking_horizon_days = config.policy.booking_horizon_days,
        search_horizon_days = config.policy.search_horizon_days,
        "schedules validated"
    );

    let state = Arc::new(AppState::new(conn, config.clone()));
    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
