use crate::auth::JwtConfig;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | HTTP_PORT | 3000 | HTTP listen port |
/// | DATABASE_URL | storefront.db | SQLite database path |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | PRINTFUL_API_KEY | (required in production) | Printful bearer token |
/// | PRINTFUL_BASE_URL | https://api.printful.com | Printful API host |
/// | STRIPE_SECRET_KEY | (required in production) | Stripe secret key |
/// | STRIPE_WEBHOOK_SECRET | (required in production) | Webhook signing secret |
/// | CHECKOUT_SUCCESS_URL | http://localhost:3000/checkout/success | Payment redirect |
/// | CHECKOUT_CANCEL_URL | http://localhost:3000/checkout/cancel | Payment redirect |
/// | GATEWAY_TIMEOUT_MS | 30000 | Upstream HTTP timeout |
/// | LOG_DIR | (stderr) | Daily-rolling log directory |
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    /// SQLite database file path
    pub database_url: String,
    /// development | staging | production
    pub environment: String,

    // === Upstream gateways ===
    pub printful_api_key: String,
    pub printful_base_url: String,
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub checkout_success_url: String,
    pub checkout_cancel_url: String,
    /// Timeout for all upstream gateway requests (milliseconds)
    pub gateway_timeout_ms: u64,

    pub jwt: JwtConfig,
    /// Log directory; stderr when unset
    pub log_dir: Option<String>,
}

impl Config {
    /// Load configuration from environment variables, with defaults for
    /// anything unset
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "storefront.db".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),

            printful_api_key: std::env::var("PRINTFUL_API_KEY").unwrap_or_default(),
            printful_base_url: std::env::var("PRINTFUL_BASE_URL")
                .unwrap_or_else(|_| "https://api.printful.com".into()),
            stripe_secret_key: std::env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            stripe_webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            checkout_success_url: std::env::var("CHECKOUT_SUCCESS_URL")
                .unwrap_or_else(|_| "http://localhost:3000/checkout/success".into()),
            checkout_cancel_url: std::env::var("CHECKOUT_CANCEL_URL")
                .unwrap_or_else(|_| "http://localhost:3000/checkout/cancel".into()),
            gateway_timeout_ms: std::env::var("GATEWAY_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),

            jwt: JwtConfig::default(),
            log_dir: std::env::var("LOG_DIR").ok(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
