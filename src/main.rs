use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use bookings::config::{AppConfig, DEV_JWT_SECRET};
use bookings::db;
use bookings::handlers;
use bookings::services::identity::JwtIdentity;
use bookings::services::notifier::mailtrap::MailtrapNotifier;
use bookings::services::notifier::{DisabledNotifier, Notifier};
use bookings::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    if config.jwt_secret == DEV_JWT_SECRET {
        tracing::warn!("JWT_SECRET_KEY not set, using the development fallback secret");
    }

    let conn = db::init_db(&config.database_url)?;

    let notifier: Arc<dyn Notifier> = if config.mail_enabled() {
        tracing::info!("email notifications enabled (sender: {})", config.sender_email);
        Arc::new(MailtrapNotifier::from_config(&config))
    } else {
        tracing::info!("MAILTRAP not set, email notifications disabled");
        Arc::new(DisabledNotifier)
    };

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        identity: JwtIdentity::from_config(&config),
        config: config.clone(),
        notifier,
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
