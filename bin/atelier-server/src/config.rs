//! Server configuration, loaded from environment variables at startup.

/// Runtime configuration for atelier-server.
///
/// Every field has a sensible default so the server works out-of-the-box
/// without any environment variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:8888"`).
    pub bind_address: String,

    /// SQLite (or other) database URL (default: `"sqlite://atelier.db?mode=rwc"`).
    /// Supports any sqlx-compatible connection string – swap the scheme to
    /// migrate to Postgres (`postgres://…`) or MySQL (`mysql://…`).
    pub database_url: String,

    /// Directory that generated images are written to and served from.
    pub outputs_dir: String,

    /// Directory that uploaded input images are served from.
    pub inputs_dir: String,

    /// Directory scanned for base-model weight files.
    pub models_dir: String,

    /// Directory scanned for LoRA weight files.
    pub loras_dir: String,

    /// Directory of style-preset JSON files.
    pub styles_dir: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Serve Swagger UI at `/swagger-ui` (default: `true`).
    pub enable_swagger: bool,

    /// Comma-separated CORS origin allowlist; `None` means wildcard.
    pub cors_allowed_origins: Option<String>,

    /// Maximum number of pending tasks the scheduler queue accepts.
    pub queue_capacity: usize,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("ATELIER_BIND", "0.0.0.0:8888"),
            database_url: env_or("ATELIER_DATABASE_URL", "sqlite://atelier.db?mode=rwc"),
            outputs_dir: env_or("ATELIER_OUTPUTS_DIR", "outputs"),
            inputs_dir: env_or("ATELIER_INPUTS_DIR", "inputs"),
            models_dir: env_or("ATELIER_MODELS_DIR", "models/checkpoints"),
            loras_dir: env_or("ATELIER_LORAS_DIR", "models/loras"),
            styles_dir: env_or("ATELIER_STYLES_DIR", "styles"),
            log_level: env_or("ATELIER_LOG", "info"),
            log_json: std::env::var("ATELIER_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            enable_swagger: std::env::var("ATELIER_ENABLE_SWAGGER")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
            cors_allowed_origins: std::env::var("ATELIER_CORS_ORIGINS").ok(),
            queue_capacity: parse_env("ATELIER_QUEUE_CAPACITY", 64),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
