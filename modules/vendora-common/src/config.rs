use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,

    // Auth
    pub jwt_secret: String,
    pub jwt_issuer: String,

    // Trigger thresholds
    pub low_stock_default_threshold: i64,
    pub cubic_weight_threshold_kg: f64,

    // Rate limits (sliding windows)
    pub rate_limit_general_max: usize,
    pub rate_limit_general_window_secs: u64,
    pub rate_limit_create_max: usize,
    pub rate_limit_create_window_secs: u64,
    pub rate_limit_exempt_super_admin: bool,

    // Spam/dedup guard
    pub dedup_max_per_window: usize,
    pub dedup_window_secs: u64,

    // Realtime channel
    pub ws_inbound_max_per_minute: usize,

    // Retention
    pub retention_days: i64,
    pub sweep_interval_secs: u64,

    // Content filter
    pub allowed_action_origins: Vec<String>,

    // Email (SMTP)
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub email_from: String,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: parsed_env("WEB_PORT", 3000),
            jwt_secret: required_env("JWT_SECRET"),
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "vendora".to_string()),
            low_stock_default_threshold: parsed_env("LOW_STOCK_DEFAULT_THRESHOLD", 10),
            cubic_weight_threshold_kg: parsed_env("CUBIC_WEIGHT_THRESHOLD_KG", 32.0),
            rate_limit_general_max: parsed_env("RATE_LIMIT_GENERAL_MAX", 100),
            rate_limit_general_window_secs: parsed_env("RATE_LIMIT_GENERAL_WINDOW_SECS", 900),
            rate_limit_create_max: parsed_env("RATE_LIMIT_CREATE_MAX", 50),
            rate_limit_create_window_secs: parsed_env("RATE_LIMIT_CREATE_WINDOW_SECS", 60),
            rate_limit_exempt_super_admin: env::var("RATE_LIMIT_EXEMPT_SUPER_ADMIN")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            dedup_max_per_window: parsed_env("DEDUP_MAX_PER_WINDOW", 5),
            dedup_window_secs: parsed_env("DEDUP_WINDOW_SECS", 300),
            ws_inbound_max_per_minute: parsed_env("WS_INBOUND_MAX_PER_MINUTE", 100),
            retention_days: parsed_env("NOTIFICATION_RETENTION_DAYS", 30),
            sweep_interval_secs: parsed_env("SWEEP_INTERVAL_SECS", 3600),
            allowed_action_origins: env::var("ALLOWED_ACTION_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().trim_end_matches('/').to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            smtp_port: parsed_env("SMTP_PORT", 587),
            smtp_username: env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "notifications@vendora.example".to_string()),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid value")),
        Err(_) => default,
    }
}
