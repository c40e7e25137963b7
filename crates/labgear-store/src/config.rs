use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::static_config::{StaticConfigItem, STATIC_CONFIG_TABLE};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SystemConfig {
    values: HashMap<String, String>,
}

impl SystemConfig {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_string(&self, key: &str) -> String {
        self.get(key)
            .map(str::to_string)
            .or_else(|| default_value(key))
            .unwrap_or_default()
    }

    pub fn get_number(&self, key: &str) -> i64 {
        self.get(key)
            .and_then(|value| value.parse::<i64>().ok())
            .or_else(|| default_value(key).and_then(|value| value.parse::<i64>().ok()))
            .unwrap_or_default()
    }

    /// Like `get_string`, but a blank value is an error.
    pub fn require_string(&self, key: &str) -> Result<String, ConfigError> {
        let value = self.get_string(key);
        if value.trim().is_empty() {
            return Err(ConfigError::Missing(missing_hint(key)));
        }
        Ok(value)
    }

    /// Overlays values from the environment for every key that declares an
    /// environment variable. Environment values win over file values; empty
    /// variables are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for item in STATIC_CONFIG_TABLE {
            let Some(var) = item.env else {
                continue;
            };
            let Some(value) = lookup(var).filter(|value| !value.trim().is_empty()) else {
                continue;
            };
            if item.value_type == "number" && value.trim().parse::<i64>().is_err() {
                return Err(ConfigError::TypeMismatch(var.to_string(), item.value_type.to_string()));
            }
            self.values.insert(item.key.to_string(), value.trim().to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("unknown config key: {0}")]
    UnknownKey(String),
    #[error("type mismatch for key {0}: expected {1}")]
    TypeMismatch(String, String),
    #[error("missing required config value: {0}")]
    Missing(String),
}

pub struct SystemConfigLoader;

impl SystemConfigLoader {
    /// Parses a TOML document into dotted keys (`[server] port = 1` becomes
    /// `server.port`). Every key must be declared in `STATIC_CONFIG_TABLE`
    /// with a matching type.
    pub fn from_str(input: &str) -> Result<SystemConfig, ConfigError> {
        let document: toml::Table =
            toml::from_str(input).map_err(|err| ConfigError::Parse(err.to_string()))?;
        let mut config = SystemConfig::default();
        collect_keys(&mut config.values, "", &document)?;
        Ok(config)
    }
}

fn collect_keys(
    values: &mut HashMap<String, String>,
    section: &str,
    table: &toml::Table,
) -> Result<(), ConfigError> {
    for (name, value) in table {
        let key = if section.is_empty() {
            name.clone()
        } else {
            format!("{section}.{name}")
        };
        let (raw, found_type) = match value {
            toml::Value::Table(nested) => {
                collect_keys(values, &key, nested)?;
                continue;
            }
            toml::Value::String(text) => (text.clone(), "string"),
            toml::Value::Integer(number) => (number.to_string(), "number"),
            _ => return Err(ConfigError::TypeMismatch(key, "string|number".to_string())),
        };
        let item = config_item(&key).ok_or_else(|| ConfigError::UnknownKey(key.clone()))?;
        if item.value_type != found_type {
            return Err(ConfigError::TypeMismatch(key, item.value_type.to_string()));
        }
        values.insert(key, raw);
    }
    Ok(())
}

fn config_item(key: &str) -> Option<&'static StaticConfigItem> {
    STATIC_CONFIG_TABLE.iter().find(|item| item.key == key)
}

fn default_value(key: &str) -> Option<String> {
    config_item(key).map(|item| item.default_value.to_string())
}

fn missing_hint(key: &str) -> String {
    match config_item(key).and_then(|item| item.env) {
        Some(var) => format!("{key} (or {var})"),
        None => key.to_string(),
    }
}
