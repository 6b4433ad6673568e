use anyhow::Result;
use chrono::DateTime;
use parquet::record::Field;

use crate::columnar::{FromRow, as_bool, as_f64, as_i64, as_string, read_table};
use crate::config::DataPaths;

pub const MARKETS_FILE: &str = "soccer_markets.parquet";
pub const TOKENS_FILE: &str = "soccer_tokens.parquet";
pub const TRADES_FILE: &str = "soccer_trades.parquet";
pub const ODDS_FILE: &str = "soccer_odds_history.parquet";
pub const EVENT_STATS_FILE: &str = "soccer_event_stats.parquet";
pub const SUMMARY_FILE: &str = "soccer_summary.parquet";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Market {
    pub market_id: Option<String>,
    pub question: Option<String>,
    pub category: Option<String>,
    pub active: bool,
    pub closed: bool,
    pub volume: f64,
    pub created_at: Option<String>,
}

impl FromRow for Market {
    const COLUMNS: &'static [&'static str] = &[
        "market_id",
        "question",
        "category",
        "active",
        "closed",
        "volume",
        "created_at",
    ];

    fn set(&mut self, column: &str, field: &Field) {
        match column {
            "market_id" => self.market_id = as_string(field),
            "question" => self.question = as_string(field),
            "category" => self.category = as_string(field),
            "active" => self.active = as_bool(field).unwrap_or(false),
            "closed" => self.closed = as_bool(field).unwrap_or(false),
            "volume" => self.volume = as_f64(field).unwrap_or(0.0),
            "created_at" => self.created_at = as_string(field),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Token {
    pub market_id: Option<String>,
    pub token_id: Option<String>,
    pub outcome: Option<String>,
}

impl FromRow for Token {
    const COLUMNS: &'static [&'static str] = &["market_id", "token_id", "outcome"];

    fn set(&mut self, column: &str, field: &Field) {
        match column {
            "market_id" => self.market_id = as_string(field),
            "token_id" => self.token_id = as_string(field),
            "outcome" => self.outcome = as_string(field),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trade {
    pub market_id: Option<String>,
    /// Milliseconds since the epoch.
    pub timestamp: Option<i64>,
    pub size: Option<f64>,
    pub price: Option<f64>,
    pub side: Option<String>,
}

impl FromRow for Trade {
    const COLUMNS: &'static [&'static str] = &["market_id", "timestamp", "size", "price", "side"];

    fn set(&mut self, column: &str, field: &Field) {
        match column {
            "market_id" => self.market_id = as_string(field),
            "timestamp" => self.timestamp = as_i64(field),
            "size" => self.size = as_f64(field),
            "price" => self.price = as_f64(field),
            "side" => self.side = as_string(field),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OddsSnapshot {
    pub market_id: Option<String>,
    pub token_id: Option<String>,
    pub timestamp: Option<i64>,
    pub price: Option<f64>,
}

impl FromRow for OddsSnapshot {
    const COLUMNS: &'static [&'static str] = &["market_id", "token_id", "timestamp", "price"];

    fn set(&mut self, column: &str, field: &Field) {
        match column {
            "market_id" => self.market_id = as_string(field),
            "token_id" => self.token_id = as_string(field),
            "timestamp" => self.timestamp = as_i64(field),
            "price" => self.price = as_f64(field),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventStat {
    pub event_slug: Option<String>,
    pub market_count: i64,
    pub total_volume: f64,
}

impl FromRow for EventStat {
    const COLUMNS: &'static [&'static str] = &["event_slug", "market_count", "total_volume"];

    fn set(&mut self, column: &str, field: &Field) {
        match column {
            "event_slug" => self.event_slug = as_string(field),
            "market_count" => self.market_count = as_i64(field).unwrap_or(0),
            "total_volume" => self.total_volume = as_f64(field).unwrap_or(0.0),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSummary {
    pub market_id: Option<String>,
    pub question: Option<String>,
    pub trade_count: i64,
    pub volume: f64,
    pub active: bool,
}

impl FromRow for MarketSummary {
    const COLUMNS: &'static [&'static str] =
        &["market_id", "question", "trade_count", "volume", "active"];

    fn set(&mut self, column: &str, field: &Field) {
        match column {
            "market_id" => self.market_id = as_string(field),
            "question" => self.question = as_string(field),
            "trade_count" => self.trade_count = as_i64(field).unwrap_or(0),
            "volume" => self.volume = as_f64(field).unwrap_or(0.0),
            "active" => self.active = as_bool(field).unwrap_or(false),
            _ => {}
        }
    }
}

pub fn load_markets(paths: &DataPaths) -> Result<Vec<Market>> {
    read_table(&paths.polymarket(MARKETS_FILE))
}

pub fn load_tokens(paths: &DataPaths) -> Result<Vec<Token>> {
    read_table(&paths.polymarket(TOKENS_FILE))
}

pub fn load_trades(paths: &DataPaths) -> Result<Vec<Trade>> {
    read_table(&paths.polymarket(TRADES_FILE))
}

pub fn load_odds(paths: &DataPaths) -> Result<Vec<OddsSnapshot>> {
    read_table(&paths.polymarket(ODDS_FILE))
}

pub fn load_event_stats(paths: &DataPaths) -> Result<Vec<EventStat>> {
    read_table(&paths.polymarket(EVENT_STATS_FILE))
}

pub fn load_summary(paths: &DataPaths) -> Result<Vec<MarketSummary>> {
    read_table(&paths.polymarket(SUMMARY_FILE))
}

/// Renders an epoch-millisecond timestamp as UTC.
pub fn format_millis(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::format_millis;

    #[test]
    fn millis_render_as_utc() {
        assert_eq!(format_millis(0), "1970-01-01 00:00:00");
        assert_eq!(format_millis(1_700_000_000_000), "2023-11-14 22:13:20");
    }
}
