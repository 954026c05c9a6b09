use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub io_timeout_secs: u64,
    pub upload_dir: String,
    pub max_upload_bytes: usize,
    // Missed-dose sweep
    pub sweep_enabled: bool,
    pub sweep_interval_secs: u64,
    pub sweep_lookback_minutes: i64,
    // Twilio (optional)
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_from_number: Option<String>,
    pub twilio_api_base: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. `from_env` is this over `std::env`.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());
        let optional = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("Missing required env var: DATABASE_URL"))?,
            host: get("HOST", "0.0.0.0"),
            port: get("PORT", "3000").parse()?,
            db_max_connections: get("DB_MAX_CONNECTIONS", "10").parse()?,
            io_timeout_secs: get("IO_TIMEOUT_SECS", "10").parse()?,
            upload_dir: get("UPLOAD_DIR", "./uploads"),
            max_upload_bytes: get("MAX_UPLOAD_BYTES", "10485760").parse()?,
            sweep_enabled: parse_flag(&get("SWEEP_ENABLED", "true"))?,
            sweep_interval_secs: get("SWEEP_INTERVAL_SECS", "900").parse()?,
            sweep_lookback_minutes: get("SWEEP_LOOKBACK_MINUTES", "30").parse()?,
            twilio_account_sid: optional("TWILIO_ACCOUNT_SID"),
            twilio_auth_token: optional("TWILIO_AUTH_TOKEN"),
            twilio_from_number: optional("TWILIO_FROM_NUMBER"),
            twilio_api_base: get("TWILIO_API_BASE", "https://api.twilio.com"),
        })
    }
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("Invalid boolean value: {other}"),
    }
}
