//! Environment overlay for another [`ConfigPort`].
//!
//! A variable named `<SECTION>_<KEY>` (upper-case) overrides `[section] key`
//! of the wrapped port. Variables are captured once at construction.

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::ports::config_port::ConfigPort;
use std::collections::HashMap;

pub struct EnvConfigAdapter<C> {
    base: C,
    vars: HashMap<String, String>,
}

impl<C: ConfigPort> EnvConfigAdapter<C> {
    /// Snapshot of the process environment over `base`.
    pub fn from_env(base: C) -> Self {
        Self::from_vars(base, std::env::vars())
    }

    pub fn from_vars<I, K, V>(base: C, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            base,
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Raw variable lookup, used for secrets named by configuration.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    fn overlay(&self, section: &str, key: &str) -> Option<&str> {
        let name = format!("{}_{}", section, key).to_uppercase();
        self.vars
            .get(&name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

impl<C: ConfigPort> ConfigPort for EnvConfigAdapter<C> {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.overlay(section, key)
            .map(str::to_string)
            .or_else(|| self.base.get_string(section, key))
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        match self.overlay(section, key).and_then(|v| v.trim().parse().ok()) {
            Some(v) => v,
            None => self.base.get_int(section, key, default),
        }
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        match self.overlay(section, key).and_then(|v| v.trim().parse().ok()) {
            Some(v) => v,
            None => self.base.get_double(section, key, default),
        }
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        match self.overlay(section, key).and_then(FileConfigAdapter::parse_bool) {
            Some(v) => v,
            None => self.base.get_bool(section, key, default),
        }
    }
}
