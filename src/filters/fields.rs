use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::condition::ConditionRow;

/// How a field is stored and which conditions make sense for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Numeric column, compared with gte/lte/between.
    Numeric,
    /// Timestamp column, compared as unix seconds.
    Timestamp,
    /// Text array column, matched with `in`.
    TokenList,
}

/// Filterable trader fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterField {
    Pnl,
    WinRate,
    TotalTrade,
    AvgRoi,
    MaxDrawdown,
    AvgVolume,
    LastTradeAtTs,
    IndexTokens,
}

impl FilterField {
    pub const ALL: [FilterField; 8] = [
        FilterField::Pnl,
        FilterField::WinRate,
        FilterField::TotalTrade,
        FilterField::AvgRoi,
        FilterField::MaxDrawdown,
        FilterField::AvgVolume,
        FilterField::LastTradeAtTs,
        FilterField::IndexTokens,
    ];

    /// Key used in condition rows and encoded parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterField::Pnl => "pnl",
            FilterField::WinRate => "winRate",
            FilterField::TotalTrade => "totalTrade",
            FilterField::AvgRoi => "avgRoi",
            FilterField::MaxDrawdown => "maxDrawdown",
            FilterField::AvgVolume => "avgVolume",
            FilterField::LastTradeAtTs => "lastTradeAtTs",
            FilterField::IndexTokens => "indexTokens",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == s)
    }

    /// Column in the `traders` table.
    pub fn column(&self) -> &'static str {
        match self {
            FilterField::Pnl => "pnl",
            FilterField::WinRate => "win_rate",
            FilterField::TotalTrade => "total_trade",
            FilterField::AvgRoi => "avg_roi",
            FilterField::MaxDrawdown => "max_drawdown",
            FilterField::AvgVolume => "avg_volume",
            FilterField::LastTradeAtTs => "last_trade_at",
            FilterField::IndexTokens => "index_tokens",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FilterField::LastTradeAtTs => FieldKind::Timestamp,
            FilterField::IndexTokens => FieldKind::TokenList,
            _ => FieldKind::Numeric,
        }
    }

    /// Fields that can be ranked by percentile.
    pub fn is_rankable(&self) -> bool {
        self.kind() == FieldKind::Numeric
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activity window used when the configured one cannot be represented.
pub const DEFAULT_LAST_TRADE_DAYS: i64 = 7;

/// Filter set applied when neither the URL nor the store has one:
/// traders active in the last `last_trade_days` days with at least
/// 10 trades and non-negative PnL.
pub fn default_filters(now: DateTime<Utc>, last_trade_days: i64) -> Vec<ConditionRow> {
    let since = activity_cutoff(now, last_trade_days).unwrap_or_else(|| {
        tracing::warn!(last_trade_days, "Activity window out of range, using default");
        now - Duration::days(DEFAULT_LAST_TRADE_DAYS)
    });
    vec![
        ConditionRow::gte(FilterField::LastTradeAtTs.as_str(), since.timestamp() as f64),
        ConditionRow::gte(FilterField::TotalTrade.as_str(), 10.0),
        ConditionRow::gte(FilterField::Pnl.as_str(), 0.0),
    ]
}

fn activity_cutoff(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    now.checked_sub_signed(Duration::try_days(days)?)
}
