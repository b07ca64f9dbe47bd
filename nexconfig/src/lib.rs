//! # NexSon Configuration Module
//!
//! This module provides configuration management for NexSon, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Type-safe getters and setters for configuration values
//! - Thread-safe singleton access pattern
//!
//! Nothing is ever written back to disk: setters only update the in-memory tree.
//!
//! ## Usage
//!
//! ```no_run
//! use nexconfig::get_config;
//!
//! let config = get_config();
//! let port = config.get_http_port();
//! config.set_http_port(9000)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::{info, warn};

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("nexson.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> = Arc::new(Config::load_config("").unwrap_or_else(|err| {
        warn!(error = %err, "Failed to load NexSon configuration, using embedded defaults");
        Config::defaults()
    }));
}

const ENV_CONFIG_DIR: &str = "NEXSON_CONFIG";
const ENV_PREFIX: &str = "NEXSON_CONFIG__";

// Default values for configuration
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
const DEFAULT_HTTP_PORT: u16 = 5000;
const DEFAULT_SERVICE_NAME: &str = "NexSon Music Service";
const DEFAULT_CORS_ENABLED: bool = true;
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;

/// Generates a getter/setter pair for `u64` values with a default.
///
/// Exported so that extension traits in other crates can declare their own
/// numeric settings the same way.
#[macro_export]
macro_rules! impl_u64_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        fn $getter(&self) -> u64 {
            match self.get_value($path) {
                Ok(serde_yaml::Value::Number(n)) => n.as_u64().unwrap_or($default),
                Ok(serde_yaml::Value::String(s)) => s.trim().parse().unwrap_or($default),
                _ => $default,
            }
        }

        fn $setter(&self, value: u64) -> anyhow::Result<()> {
            self.set_value($path, serde_yaml::Value::Number(serde_yaml::Number::from(value)))
        }
    };
}

/// Generates a getter/setter pair for string values with a default.
#[macro_export]
macro_rules! impl_string_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        fn $getter(&self) -> String {
            match self.get_value($path) {
                Ok(serde_yaml::Value::String(s)) if !s.trim().is_empty() => s,
                _ => $default.to_string(),
            }
        }

        fn $setter(&self, value: String) -> anyhow::Result<()> {
            self.set_value($path, serde_yaml::Value::String(value))
        }
    };
}

/// Macro to generate getter/setter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> bool {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => b,
                _ => $default,
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Configuration manager for NexSon
///
/// Holds the merged YAML tree (embedded defaults, external `config.yaml`,
/// environment overrides) behind a mutex.
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    data: Mutex<Value>,
}

impl Clone for Config {
    fn clone(&self) -> Self {
        let data = self.data().clone();
        Self {
            config_dir: self.config_dir.clone(),
            data: Mutex::new(data),
        }
    }
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        // 1. Try provided directory
        if !directory.is_empty() {
            return directory.to_string();
        }

        // 2. Try environment variable
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return env_path;
        }

        // 3. Try current directory
        if Path::new(".nexson").exists() {
            return ".nexson".to_string();
        }

        // 4. Try home directory
        if let Some(home) = home_dir() {
            let home_config = home.join(".nexson");
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        ".nexson".to_string()
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external `config.yaml` file if present
    /// 4. Applies `NEXSON_CONFIG__*` environment variable overrides
    ///
    /// A missing directory or file is not an error.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::find_config_dir(directory);
        info!(config_dir = %config_dir, "Using config directory");

        let config_file: PathBuf = Path::new(&config_dir).join("config.yaml");

        let mut value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
        match fs::read(&config_file) {
            Ok(data) => {
                info!(config_file = %config_file.display(), "Loaded config file");
                let external: Value = serde_yaml::from_slice(&data)?;
                merge_yaml(&mut value, &Self::lower_keys_value(external));
            }
            Err(_) => {
                info!(config_file = %config_file.display(), "Config file not found, using embedded defaults");
            }
        }

        let mut value = Self::lower_keys_value(value);
        Self::apply_overrides(&mut value, env::vars());

        Ok(Config {
            config_dir,
            data: Mutex::new(value),
        })
    }

    /// Builds a configuration from the embedded defaults only.
    pub fn defaults() -> Self {
        let value = serde_yaml::from_str(DEFAULT_CONFIG)
            .map(Self::lower_keys_value)
            .unwrap_or_else(|_| Value::Mapping(Mapping::new()));
        Self {
            config_dir: String::new(),
            data: Mutex::new(value),
        }
    }

    /// Builds an isolated configuration: embedded defaults merged with `yaml`.
    ///
    /// Environment variables are ignored, which makes it suitable for tests.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config = Self::defaults();
        let external: Value = serde_yaml::from_str(yaml)?;
        if !external.is_null() {
            merge_yaml(&mut config.data(), &Self::lower_keys_value(external));
        }
        Ok(config)
    }

    /// Directory the configuration was looked up in
    pub fn config_dir(&self) -> &str {
        &self.config_dir
    }

    fn data(&self) -> MutexGuard<'_, Value> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets a configuration value at the specified path
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["host", "http_port"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        let mut data = self.data();
        Self::set_value_internal(&mut data, path, value)
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        if path.is_empty() {
            *data = value;
            return Ok(());
        }
        if data.is_null() {
            *data = Value::Mapping(Mapping::new());
        }
        if let Value::Mapping(map) = data {
            let key_value = Value::String(path[0].to_lowercase());
            if path.len() == 1 {
                map.insert(key_value, value);
            } else {
                let entry = map
                    .entry(key_value)
                    .or_insert(Value::Mapping(Mapping::new()));
                Self::set_value_internal(entry, &path[1..], value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    /// Gets a configuration value at the specified path
    ///
    /// Returns an error if the path doesn't exist.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data();
        Self::get_value_internal(&data, path)
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        let mut current = data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                match map.get(&Value::String(key.to_lowercase())) {
                    Some(next) => current = next,
                    None => return Err(anyhow!("Path {} does not exist", path[..=i].join("."))),
                }
            } else {
                return Err(anyhow!("Path {} is not a Config", path[..i].join(".")));
            }
        }
        Ok(current.clone())
    }

    fn apply_overrides<I>(config: &mut Value, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                let key_path = stripped.split("__").collect::<Vec<_>>();
                let yaml_value = Self::convert_env_value(&value);
                if let Err(err) = Self::set_value_internal(config, &key_path, yaml_value) {
                    warn!(variable = %key, error = %err, "Ignoring environment override");
                }
            }
        }
    }

    fn convert_env_value(value: &str) -> Value {
        match serde_yaml::from_str::<Value>(value) {
            Ok(parsed) if !parsed.is_null() => parsed,
            _ => Value::String(value.to_string()),
        }
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    let key = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    new_map.insert(key, Self::lower_keys_value(v));
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    /// Gets the address the HTTP server binds to (default `0.0.0.0`)
    pub fn get_bind_address(&self) -> String {
        match self.get_value(&["host", "bind_address"]) {
            Ok(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => DEFAULT_BIND_ADDRESS.to_string(),
        }
    }

    /// Sets the address the HTTP server binds to
    pub fn set_bind_address(&self, address: String) -> Result<()> {
        self.set_value(&["host", "bind_address"], Value::String(address))
    }

    /// Gets the HTTP port from configuration
    ///
    /// Returns the configured HTTP port, or the default port (5000) if not configured or invalid.
    pub fn get_http_port(&self) -> u16 {
        match self.get_value(&["host", "http_port"]) {
            Ok(Value::Number(n)) => match n.as_u64().and_then(|p| u16::try_from(p).ok()) {
                Some(port) => port,
                None => {
                    warn!("Invalid HTTP port {}, using default {}", n, DEFAULT_HTTP_PORT);
                    DEFAULT_HTTP_PORT
                }
            },
            Ok(Value::String(s)) => match s.trim().parse::<u16>() {
                Ok(port) => port,
                Err(_) => {
                    warn!("Invalid HTTP port '{}', using default {}", s, DEFAULT_HTTP_PORT);
                    DEFAULT_HTTP_PORT
                }
            },
            Ok(_) => {
                warn!(
                    "HTTP port not a number or string, using default {}",
                    DEFAULT_HTTP_PORT
                );
                DEFAULT_HTTP_PORT
            }
            Err(err) => {
                warn!(
                    "Failed to get HTTP port: {}, using default {}",
                    err, DEFAULT_HTTP_PORT
                );
                DEFAULT_HTTP_PORT
            }
        }
    }

    /// Sets the HTTP port in configuration
    pub fn set_http_port(&self, port: u16) -> Result<()> {
        self.set_value(&["host", "http_port"], Value::Number(Number::from(port)))
    }

    /// Name reported by the health endpoint and used in the logs
    pub fn get_service_name(&self) -> String {
        match self.get_value(&["host", "service_name"]) {
            Ok(Value::String(s)) if !s.trim().is_empty() => s,
            _ => DEFAULT_SERVICE_NAME.to_string(),
        }
    }

    impl_bool_config!(
        get_cors_enabled,
        set_cors_enabled,
        &["host", "cors", "enabled"],
        DEFAULT_CORS_ENABLED
    );

    impl_bool_config!(
        get_log_enable_console,
        set_log_enable_console,
        &["host", "logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    /// Récupère le niveau de log minimum depuis la configuration
    pub fn get_log_min_level(&self) -> String {
        match self.get_value(&["host", "logger", "min_level"]) {
            Ok(Value::String(s)) => s,
            _ => DEFAULT_LOG_MIN_LEVEL.to_string(),
        }
    }

    /// Définit le niveau de log minimum dans la configuration
    pub fn set_log_min_level(&self, level: String) -> Result<()> {
        self.set_value(&["host", "logger", "min_level"], Value::String(level))
    }
}

/// Returns the global configuration instance
///
/// The configuration is lazily loaded on first access.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Merges external YAML configuration into default configuration
///
/// Mappings are merged key by key; scalars and sequences from `external`
/// replace the default value.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults() {
        let config = Config::defaults();
        assert_eq!(config.get_bind_address(), "0.0.0.0");
        assert_eq!(config.get_http_port(), 5000);
        assert_eq!(config.get_service_name(), "NexSon Music Service");
        assert!(config.get_cors_enabled());
        assert_eq!(config.get_log_min_level(), "INFO");
    }

    #[test]
    fn test_external_yaml_is_merged() {
        let config = Config::from_yaml_str(
            "Host:\n  HTTP_PORT: 8081\n  logger:\n    min_level: DEBUG\n",
        )
        .unwrap();
        assert_eq!(config.get_http_port(), 8081);
        assert_eq!(config.get_log_min_level(), "DEBUG");
        // Les clés non surchargées gardent leur valeur par défaut
        assert_eq!(config.get_bind_address(), "0.0.0.0");
        assert!(config.get_log_enable_console());
    }

    #[test]
    fn test_port_as_string() {
        let config = Config::from_yaml_str("host:\n  http_port: \"6000\"\n").unwrap();
        assert_eq!(config.get_http_port(), 6000);

        let config = Config::from_yaml_str("host:\n  http_port: \"nope\"\n").unwrap();
        assert_eq!(config.get_http_port(), DEFAULT_HTTP_PORT);

        let config = Config::from_yaml_str("host:\n  http_port: 70000\n").unwrap();
        assert_eq!(config.get_http_port(), DEFAULT_HTTP_PORT);
    }

    #[test]
    fn test_env_overrides() {
        let mut value = Config::defaults().data().clone();
        Config::apply_overrides(
            &mut value,
            vec![
                ("NEXSON_CONFIG__HOST__HTTP_PORT".to_string(), "7000".to_string()),
                ("NEXSON_CONFIG__STREAM__USER_AGENT".to_string(), "test-agent".to_string()),
                ("UNRELATED".to_string(), "x".to_string()),
            ],
        );
        let config = Config {
            config_dir: String::new(),
            data: Mutex::new(value),
        };
        assert_eq!(config.get_http_port(), 7000);
        assert_eq!(
            config.get_value(&["stream", "user_agent"]).unwrap(),
            Value::String("test-agent".to_string())
        );
    }

    #[test]
    fn test_set_and_get_value() {
        let config = Config::defaults();
        config.set_http_port(9000).unwrap();
        assert_eq!(config.get_http_port(), 9000);

        config
            .set_value(&["a", "b", "c"], Value::Bool(true))
            .unwrap();
        assert_eq!(config.get_value(&["A", "B", "C"]).unwrap(), Value::Bool(true));
        assert!(config.get_value(&["a", "missing"]).is_err());
    }

    #[test]
    fn test_load_config_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "host:\n  service_name: Test Service\n",
        )
        .unwrap();

        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(config.get_service_name(), "Test Service");
        assert_eq!(config.config_dir(), dir.path().to_str().unwrap());
    }

    #[test]
    fn test_load_config_missing_directory() {
        let config = Config::load_config("/nonexistent/nexson/config").unwrap();
        assert_eq!(config.get_http_port(), 5000);
    }
}
