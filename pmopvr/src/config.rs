//! # Configuration
//!
//! Configuration of the PVR client layer:
//! - default values embedded from `pmopvr.yaml`
//! - merged with an optional `config.yaml` in the configuration directory
//! - overridden by `PMOPVR_CONFIG__SECTION__KEY=value` environment variables
//!
//! There is no global instance: load a [`PvrConfig`] once and hand it to
//! whoever needs it.
//!
//! ```no_run
//! use pmopvr::config::PvrConfig;
//!
//! let config = PvrConfig::load("")?;
//! let days = config.get_epg_future_days()?;
//! config.set_epg_future_days(7)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{Result, anyhow};
use dirs::home_dir;
use serde_yaml::{Mapping, Number, Value};
use tracing::info;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pmopvr.yaml");

const ENV_CONFIG_DIR: &str = "PMOPVR_CONFIG";
const ENV_PREFIX: &str = "PMOPVR_CONFIG__";
const DIR_NAME: &str = ".pmopvr";

const DEFAULT_ID_TABLE: &str = "client_ids.yaml";
const DEFAULT_EPG_FUTURE_DAYS: usize = 3;
const DEFAULT_TOAST_DURATION_MS: usize = 5000;
const DEFAULT_NOTIFY_CONNECTION_CHANGES: bool = true;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Macro to generate getter/setter for usize values with default
macro_rules! impl_usize_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<usize> {
            match self.get_value($path)? {
                Value::Number(n) => Ok(n.as_u64().map_or($default, |v| v as usize)),
                _ => Ok($default),
            }
        }

        pub fn $setter(&self, value: usize) -> Result<()> {
            self.set_value($path, Value::Number(Number::from(value)))
        }
    };
}

/// Macro to generate getter/setter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<bool> {
            match self.get_value($path)? {
                Value::Bool(b) => Ok(b),
                _ => Ok($default),
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Macro to generate getter/setter for string values with default
macro_rules! impl_string_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<String> {
            match self.get_value($path)? {
                Value::String(s) if !s.is_empty() => Ok(s),
                _ => Ok($default.to_string()),
            }
        }

        pub fn $setter(&self, value: &str) -> Result<()> {
            self.set_value($path, Value::String(value.to_string()))
        }
    };
}

#[derive(Debug)]
pub struct PvrConfig {
    config_dir: PathBuf,
    path: PathBuf,
    data: Mutex<Value>,
}

impl PvrConfig {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> PathBuf {
        // 1. Répertoire fourni
        if !directory.is_empty() {
            return PathBuf::from(directory);
        }

        // 2. Variable d'environnement
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return PathBuf::from(env_path);
        }

        // 3. Répertoire courant
        if Path::new(DIR_NAME).exists() {
            return PathBuf::from(DIR_NAME);
        }

        // 4. Répertoire utilisateur
        if let Some(home) = home_dir() {
            let home_config = home.join(DIR_NAME);
            if home_config.exists() {
                return home_config;
            }
        }

        PathBuf::from(DIR_NAME)
    }

    /// Creates the directory if needed and checks it is a writable directory.
    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(anyhow!("{} is not a directory", path.display()));
        }

        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        Ok(())
    }

    /// Loads the configuration.
    ///
    /// The directory is, in order: `directory` when not empty, the
    /// `PMOPVR_CONFIG` environment variable, `.pmopvr` in the current
    /// directory, `.pmopvr` in the home directory. The merged document is
    /// written back to `config.yaml`.
    pub fn load(directory: &str) -> Result<Self> {
        let config_dir = Self::find_config_dir(directory);
        Self::validate_config_dir(&config_dir)?;
        info!(config_dir = %config_dir.display(), "Using config directory");

        let path = config_dir.join("config.yaml");

        let mut value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
        match fs::read(&path) {
            Ok(data) => {
                info!(config_file = %path.display(), "Loaded config file");
                let external: Value = serde_yaml::from_slice(&data)?;
                merge_yaml(&mut value, &external);
            }
            Err(_) => {
                info!(config_file = %path.display(), "Config file not found, using defaults");
            }
        }

        let mut value = lower_keys_value(value);
        apply_env_overrides(&mut value);

        let config = PvrConfig {
            config_dir,
            path,
            data: Mutex::new(value),
        };
        config.save()?;
        Ok(config)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn save(&self) -> Result<()> {
        let data = self.data.lock().unwrap();
        let yaml = serde_yaml::to_string(&*data)?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Sets the value at `path` (e.g. `&["epg", "future_days"]`) and saves.
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        {
            let mut data = self.data.lock().unwrap();
            set_value_internal(&mut data, path, value)?;
        }
        self.save()
    }

    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data.lock().unwrap();
        get_value_internal(&data, path)
    }

    impl_string_config!(
        get_client_id_table,
        set_client_id_table,
        &["clients", "id_table"],
        DEFAULT_ID_TABLE
    );

    impl_usize_config!(
        get_epg_future_days,
        set_epg_future_days,
        &["epg", "future_days"],
        DEFAULT_EPG_FUTURE_DAYS
    );

    impl_usize_config!(
        get_toast_duration_ms,
        set_toast_duration_ms,
        &["notifications", "toast_duration_ms"],
        DEFAULT_TOAST_DURATION_MS
    );

    impl_bool_config!(
        get_notify_connection_changes,
        set_notify_connection_changes,
        &["notifications", "connection_changes"],
        DEFAULT_NOTIFY_CONNECTION_CHANGES
    );

    impl_string_config!(
        get_log_level,
        set_log_level,
        &["logging", "level"],
        DEFAULT_LOG_LEVEL
    );

    /// Location of the client id table, resolved against the configuration
    /// directory when relative.
    pub fn get_client_id_table_path(&self) -> Result<PathBuf> {
        let table = PathBuf::from(self.get_client_id_table()?);
        if table.is_absolute() {
            Ok(table)
        } else {
            Ok(self.config_dir.join(table))
        }
    }
}

fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
    if path.is_empty() {
        *data = value;
        return Ok(());
    }
    if let Value::Mapping(map) = data {
        let key = Value::String(path[0].to_lowercase());
        if path.len() == 1 {
            map.insert(key, value);
        } else {
            let entry = map.entry(key).or_insert(Value::Mapping(Mapping::new()));
            set_value_internal(entry, &path[1..], value)?;
        }
        Ok(())
    } else {
        Err(anyhow!("Current node is not a map"))
    }
}

fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
    let mut current = data;
    for (i, key) in path.iter().enumerate() {
        match current {
            Value::Mapping(map) => match map.get(Value::String(key.to_lowercase())) {
                Some(next) => current = next,
                None => return Err(anyhow!("Path {} does not exist", path[..=i].join("."))),
            },
            _ => return Err(anyhow!("Path {} is not a mapping", path[..i].join("."))),
        }
    }
    Ok(current.clone())
}

fn apply_env_overrides(config: &mut Value) {
    for (key, value) in env::vars() {
        if let Some(rest) = key.strip_prefix(ENV_PREFIX) {
            let key_path = rest.split("__").collect::<Vec<_>>();
            let _ = set_value_internal(config, &key_path, convert_env_value(&value));
        }
    }
}

fn convert_env_value(value: &str) -> Value {
    serde_yaml::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()))
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
                new_map.insert(key, lower_keys_value(v));
            }
            Value::Mapping(new_map)
        }
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys_value).collect()),
        _ => value,
    }
}

/// Merges `external` into `default`: mappings are merged key by key,
/// scalars and sequences are replaced.
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
