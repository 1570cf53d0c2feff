use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use slotbot::config::AppConfig;
use slotbot::services::audit::sheets::GoogleSheetsLogger;
use slotbot::services::audit::{AuditLogger, NoopAuditLogger};
use slotbot::services::messaging::line::LineMessagingProvider;
use slotbot::state::AppState;
use slotbot::store::ReservationStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let store = ReservationStore::open(&config.reservations_path)?;
    if let Err(e) = store.load() {
        tracing::error!(error = %e, path = %store.path().display(), "reservation file cannot be read, bookings will fail until it is fixed");
    }

    if config.line_channel_secret.is_empty() {
        tracing::warn!("LINE_CHANNEL_SECRET not set, webhook signatures will not be checked");
    }
    if config.admin_password == "changeme" {
        tracing::warn!("ADMIN_PASSWORD is the default, set it before exposing /admin");
    }
    if let Some(owner) = &config.owner_user_id {
        tracing::info!(owner = %owner, "owner-only booking mode enabled");
    }

    let audit: Box<dyn AuditLogger> = if config.sheets_enabled() {
        match GoogleSheetsLogger::from_service_account_json(
            config.sheets_spreadsheet_id.clone(),
            config.sheets_sheet_name.clone(),
            &config.google_service_account_json,
        )
        .await
        {
            Ok(logger) => {
                tracing::info!("audit log: Google Sheets (sheet: {})", config.sheets_sheet_name);
                Box::new(logger)
            }
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "Google Sheets audit log unavailable, continuing without it");
                Box::new(NoopAuditLogger)
            }
        }
    } else {
        tracing::info!("audit log disabled");
        Box::new(NoopAuditLogger)
    };
    let messaging = LineMessagingProvider::new(config.line_channel_access_token.clone());

    let state = Arc::new(AppState {
        store,
        config: config.clone(),
        messaging: Box::new(messaging),
        audit,
    });

    let app = slotbot::build_router(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
