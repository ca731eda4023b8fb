use std::env;
use std::time::Duration;

const MAX_LAST_TRADE_DAYS: i64 = 36_500;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    // Explorer
    pub count_debounce_ms: u64,
    pub default_page_limit: u32,
    pub max_page_limit: u32,
    pub default_last_trade_days: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let default_last_trade_days: i64 = env::var("DEFAULT_LAST_TRADE_DAYS")
            .unwrap_or_else(|_| "7".into())
            .parse()
            .unwrap_or(7);
        anyhow::ensure!(
            (1..=MAX_LAST_TRADE_DAYS).contains(&default_last_trade_days),
            "DEFAULT_LAST_TRADE_DAYS must be between 1 and {MAX_LAST_TRADE_DAYS}"
        );

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            count_debounce_ms: env::var("COUNT_DEBOUNCE_MS")
                .unwrap_or_else(|_| "400".into())
                .parse()
                .unwrap_or(400),
            default_page_limit: env::var("DEFAULT_PAGE_LIMIT")
                .unwrap_or_else(|_| "20".into())
                .parse()
                .unwrap_or(20),
            max_page_limit: env::var("MAX_PAGE_LIMIT")
                .unwrap_or_else(|_| "100".into())
                .parse()
                .unwrap_or(100),
            default_last_trade_days,
        })
    }

    pub fn count_debounce(&self) -> Duration {
        Duration::from_millis(self.count_debounce_ms)
    }
}
