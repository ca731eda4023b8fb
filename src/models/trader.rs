use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for the traders table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trader {
    pub id: Uuid,
    pub account: String,
    pub protocol: String,
    pub pnl: Decimal,
    pub win_rate: Decimal,
    pub total_trade: i32,
    pub avg_roi: Decimal,
    pub max_drawdown: Decimal,
    pub avg_volume: Decimal,
    pub index_tokens: Vec<String>,
    pub labels: Vec<String>,
    pub if_labels: Vec<String>,
    pub last_trade_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One page of explorer results.
#[derive(Debug, Clone, Serialize)]
pub struct TraderPage {
    pub traders: Vec<Trader>,
    pub page: u32,
    pub limit: u32,
}
