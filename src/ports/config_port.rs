//! Configuration access port trait.

/// Read-only key lookup by INI-style section and key.
///
/// Implementations only resolve raw values; defaults and range checks live
/// in [`FeedConfig`](crate::domain::settings::FeedConfig) and
/// [`config_validation`](crate::domain::config_validation).
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Comma-separated value split into trimmed, non-empty items.
    fn get_list(&self, section: &str, key: &str) -> Vec<String> {
        self.get_string(section, key)
            .map(|raw| {
                raw.split(',')
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Non-negative integer in milliseconds.
    fn get_millis(&self, section: &str, key: &str, default_ms: u64) -> std::time::Duration {
        let ms = self.get_int(section, key, default_ms as i64).max(0) as u64;
        std::time::Duration::from_millis(ms)
    }
}
