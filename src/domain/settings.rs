//! Immutable run configuration, built once from a [`ConfigPort`].

use crate::domain::decision::{BreakoutParams, ConfluenceParams, DecisionMode};
use crate::domain::error::FeedError;
use crate::domain::gap_fill::FillMode;
use crate::ports::config_port::ConfigPort;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct SourceSettings {
    pub base_url: String,
    /// Name of the environment variable holding the API secret.
    pub secret_env: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublisherSettings {
    pub api_base: String,
    pub gist_id: Option<String>,
    pub token_env: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub symbol: String,
    pub exchange: String,
    pub trigger_tf: String,
    pub trend_tf: String,
    pub limit: usize,
    pub fill_mode: FillMode,
    /// Keys the gap filler repairs; empty means every key.
    pub fill_keys: Vec<String>,
    pub ttl_sec: u64,
    pub file_name: String,
    pub history_dir: Option<PathBuf>,
    pub mode: DecisionMode,
    pub source: SourceSettings,
    pub publisher: PublisherSettings,
}

impl FeedConfig {
    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, FeedError> {
        let string = |section: &str, key: &str, default: &str| {
            config
                .get_string(section, key)
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| default.to_string())
        };
        let period = |key: &str, default: i64| config.get_int("strategy", key, default).max(0) as usize;

        let mode = match string("strategy", "mode", "breakout").to_lowercase().as_str() {
            "breakout" => DecisionMode::Breakout(BreakoutParams {
                donchian_period: period("donchian_period", 20),
                atr_period: period("atr_period", 14),
                atr_min_pct: config.get_double("strategy", "atr_min_pct", 0.003),
                trend_ema_period: period("trend_ema_period", 200),
                slope_epsilon: config.get_double("strategy", "slope_epsilon", 0.0),
            }),
            "confluence" => DecisionMode::Confluence(ConfluenceParams {
                ema_fast: period("ema_fast", 20),
                ema_slow: period("ema_slow", 50),
                macd_fast: period("macd_fast", 12),
                macd_slow: period("macd_slow", 26),
                macd_signal: period("macd_signal", 9),
                macd_epsilon: config.get_double("strategy", "macd_epsilon", 0.0),
                rsi_period: period("rsi_period", 14),
                rsi_high: config.get_double("strategy", "rsi_high", 55.0),
                rsi_low: config.get_double("strategy", "rsi_low", 45.0),
                atr_period: period("atr_period", 14),
                atr_min_pct: config.get_double("strategy", "atr_min_pct", 0.003),
            }),
            other => {
                return Err(FeedError::ConfigInvalid {
                    section: "strategy".into(),
                    key: "mode".into(),
                    reason: format!("unknown mode '{other}' (expected breakout or confluence)"),
                });
            }
        };

        let fill_keys = config.get_list("feed", "fill_keys");

        let history_dir = config
            .get_bool("feed", "archive", true)
            .then(|| PathBuf::from(string("feed", "history_dir", "history_btc")));

        Ok(Self {
            symbol: string("feed", "symbol", "BTC/USDT"),
            exchange: string("feed", "exchange", "binance"),
            trigger_tf: string("feed", "trigger_tf", "15m"),
            trend_tf: string("feed", "trend_tf", "4h"),
            limit: config.get_int("feed", "limit", 50).max(0) as usize,
            fill_mode: FillMode::from_flag(config.get_bool("feed", "gap_fill", true)),
            fill_keys,
            ttl_sec: config.get_int("feed", "ttl_sec", 900).max(0) as u64,
            file_name: string("feed", "file_name", "btc_feed.json"),
            history_dir,
            mode,
            source: SourceSettings {
                base_url: string("source", "base_url", "https://api.taapi.io"),
                secret_env: string("source", "secret_env", "TAAPI_SECRET"),
                timeout: Duration::from_secs(config.get_int("source", "timeout_secs", 12).max(1) as u64),
                max_attempts: config.get_int("source", "max_attempts", 3).clamp(1, 10) as u32,
                retry_delay: config.get_millis("source", "retry_delay_ms", 1000),
            },
            publisher: PublisherSettings {
                api_base: string("publisher", "api_base", "https://api.github.com"),
                gist_id: config
                    .get_string("publisher", "gist_id")
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
                token_env: string("publisher", "token_env", "GIST_TOKEN"),
            },
        })
    }

    /// Symbol as published, without the pair separator.
    pub fn published_symbol(&self) -> String {
        self.symbol.replace('/', "")
    }

    /// Active settings embedded in every snapshot. Secrets are never included.
    pub fn settings_map(&self) -> BTreeMap<String, Value> {
        let mut map = BTreeMap::new();
        map.insert("mode".to_string(), json!(self.mode.name()));
        map.insert("symbol".to_string(), json!(self.symbol));
        map.insert("exchange".to_string(), json!(self.exchange));
        map.insert("triggerTF".to_string(), json!(self.trigger_tf));
        map.insert("limit".to_string(), json!(self.limit));
        map.insert(
            "gapFill".to_string(),
            json!(self.fill_mode == FillMode::Fill),
        );
        match &self.mode {
            DecisionMode::Breakout(p) => {
                map.insert("trendTF".to_string(), json!(self.trend_tf));
                map.insert("donPeriod".to_string(), json!(p.donchian_period));
                map.insert("atrPeriod".to_string(), json!(p.atr_period));
                map.insert("atrMin".to_string(), json!(p.atr_min_pct));
                map.insert("trendEmaPeriod".to_string(), json!(p.trend_ema_period));
                map.insert("emaSlopeEps".to_string(), json!(p.slope_epsilon));
            }
            DecisionMode::Confluence(p) => {
                map.insert("emaFast".to_string(), json!(p.ema_fast));
                map.insert("emaSlow".to_string(), json!(p.ema_slow));
                map.insert(
                    "macd".to_string(),
                    json!([p.macd_fast, p.macd_slow, p.macd_signal]),
                );
                map.insert("macdEps".to_string(), json!(p.macd_epsilon));
                map.insert("rsiPeriod".to_string(), json!(p.rsi_period));
                map.insert("rsiHigh".to_string(), json!(p.rsi_high));
                map.insert("rsiLow".to_string(), json!(p.rsi_low));
                map.insert("atrPeriod".to_string(), json!(p.atr_period));
                map.insert("atrMin".to_string(), json!(p.atr_min_pct));
            }
        }
        map
    }
}
