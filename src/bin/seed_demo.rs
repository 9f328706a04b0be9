// Seeds a provider, a client and one service, then prints bearer tokens
// for both users so the API can be exercised by hand.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use bookings::config::AppConfig;
use bookings::db::{self, queries};
use bookings::models::{NewService, NewUser};
use bookings::services::identity::JwtIdentity;

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    let mut conn = db::init_db(&config.database_url)?;
    let tx = conn.transaction().context("failed to start seed transaction")?;

    let provider = queries::create_user(
        &tx,
        &NewUser {
            email: "provider@example.com".to_string(),
            username: "provider".to_string(),
            first_name: "Pat".to_string(),
            last_name: "Provider".to_string(),
        },
    )
    .context("failed to create provider (already seeded?)")?;

    let client = queries::create_user(
        &tx,
        &NewUser {
            email: "client@example.com".to_string(),
            username: "client".to_string(),
            first_name: "Cam".to_string(),
            last_name: "Client".to_string(),
        },
    )
    .context("failed to create client")?;

    let service = queries::create_service(
        &tx,
        &NewService {
            user_id: provider,
            name: "Haircut".to_string(),
            duration_minutes: 60,
            price: "25.00".to_string(),
            description: Some("Demo service".to_string()),
        },
    )
    .context("failed to create service")?;

    tx.commit().context("failed to commit seed data")?;

    let identity = JwtIdentity::from_config(&config);
    println!("service_id:     {service}");
    println!("provider_id:    {provider}");
    println!("provider_token: {}", identity.issue_token(provider)?);
    println!("client_id:      {client}");
    println!("client_token:   {}", identity.issue_token(client)?);

    Ok(())
}
