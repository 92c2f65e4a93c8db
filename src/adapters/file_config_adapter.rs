//! INI file configuration adapter.

use crate::domain::error::FeedError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

/// Sections and keys are case-insensitive; values are returned untrimmed.
pub struct FileConfigAdapter {
    ini: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FeedError> {
        let path = path.as_ref();
        let mut ini = Ini::new();
        ini.load(path).map_err(|reason| FeedError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        tracing::debug!(path = %path.display(), sections = ini.sections().len(), "config loaded");
        Ok(Self { ini })
    }

    pub fn from_string(content: &str) -> Result<Self, FeedError> {
        let mut ini = Ini::new();
        ini.read(content.to_string())
            .map_err(|reason| FeedError::ConfigParse {
                file: "<inline>".to_string(),
                reason,
            })?;
        Ok(Self { ini })
    }

    /// Accepts the usual INI spellings of a flag.
    pub(crate) fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }

    fn raw(&self, section: &str, key: &str) -> Option<String> {
        self.ini
            .get(section, key)
            .filter(|v| !v.trim().is_empty())
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.raw(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.raw(section, key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.raw(section, key)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.raw(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FEED_INI: &str = r#"
[feed]
symbol = BTC/USDT
trigger_tf = 15m
trend_tf = 4h
limit = 50
gap_fill = true

[strategy]
mode = breakout
donchian_period = 20
atr_min_pct = 0.003

[source]
secret_env = TAAPI_SECRET
"#;

    #[test]
    fn from_string_parses_all_sections() {
        let adapter = FileConfigAdapter::from_string(FEED_INI).unwrap();
        assert_eq!(adapter.get_string("feed", "symbol"), Some("BTC/USDT".to_string()));
        assert_eq!(adapter.get_string("strategy", "mode"), Some("breakout".to_string()));
        assert_eq!(adapter.get_int("feed", "limit", 0), 50);
        assert_eq!(adapter.get_double("strategy", "atr_min_pct", 0.0), 0.003);
        assert!(adapter.get_bool("feed", "gap_fill", false));
        assert_eq!(
            adapter.get_string("source", "secret_env"),
            Some("TAAPI_SECRET".to_string())
        );
    }

    #[test]
    fn missing_keys_fall_back() {
        let adapter = FileConfigAdapter::from_string("[feed]\nlimit = abc\n").unwrap();
        assert_eq!(adapter.get_string("feed", "missing"), None);
        assert_eq!(adapter.get_string("nope", "symbol"), None);
        assert_eq!(adapter.get_int("feed", "limit", 42), 42);
        assert_eq!(adapter.get_double("strategy", "atr_min_pct", 0.5), 0.5);
        assert!(adapter.get_bool("feed", "gap_fill", true));
    }

    #[test]
    fn bool_spellings() {
        let adapter =
            FileConfigAdapter::from_string("[feed]\na = yes\nb = off\nc = 1\nd = maybe\n").unwrap();
        assert!(adapter.get_bool("feed", "a", false));
        assert!(!adapter.get_bool("feed", "b", true));
        assert!(adapter.get_bool("feed", "c", false));
        assert!(adapter.get_bool("feed", "d", true));
        assert!(!adapter.get_bool("feed", "d", false));
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", FEED_INI).unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_string("feed", "trend_tf"), Some("4h".to_string()));
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/feed.ini");
        assert!(matches!(
            result,
            Err(FeedError::ConfigParse { ref file, .. }) if file == "/nonexistent/path/feed.ini"
        ));
    }

    #[test]
    fn blank_values_are_unset() {
        let adapter = FileConfigAdapter::from_string("[feed]\nhistory_dir =\nlimit = \n").unwrap();
        assert_eq!(adapter.get_string("feed", "history_dir"), None);
        assert_eq!(adapter.get_int("feed", "limit", 50), 50);
    }

    #[test]
    fn non_finite_double_falls_back() {
        let adapter = FileConfigAdapter::from_string("[strategy]\natr_min_pct = NaN\n").unwrap();
        assert_eq!(adapter.get_double("strategy", "atr_min_pct", 0.003), 0.003);
    }
}
