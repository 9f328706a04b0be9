use std::env;

pub const DEV_JWT_SECRET: &str = "fallback-jwt-secret-change-immediately";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_seconds: i64,
    pub cors_origins: Vec<String>,
    pub mailtrap_token: String,
    pub mailtrap_api_url: String,
    pub sender_email: String,
    pub sender_name: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5002),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "bookings.db".to_string()),
            jwt_secret: env::var("JWT_SECRET_KEY").unwrap_or_else(|_| DEV_JWT_SECRET.to_string()),
            jwt_ttl_seconds: env::var("JWT_ACCESS_TOKEN_EXPIRES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            cors_origins: parse_origins(
                &env::var("CORS_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string()),
            ),
            mailtrap_token: env::var("MAILTRAP").unwrap_or_default(),
            mailtrap_api_url: env::var("MAILTRAP_API_URL")
                .unwrap_or_else(|_| "https://send.api.mailtrap.io/api/send".to_string()),
            sender_email: env::var("SENDER_EMAIL")
                .unwrap_or_else(|_| "noreply@example.com".to_string()),
            sender_name: env::var("SENDER_NAME").unwrap_or_else(|_| "Vibe Coding App".to_string()),
        }
    }

    pub fn mail_enabled(&self) -> bool {
        !self.mailtrap_token.is_empty()
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
