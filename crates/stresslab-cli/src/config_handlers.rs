//! `stresslab config` subcommands.
//!
//! Each action is a function that returns what it resolved or wrote;
//! [`handle_config_command`] is the only place that prints.

use std::path::{Path, PathBuf};

use stresslab_core::{ConfigManager, Error, Result, StresslabConfig};

use crate::cli::ConfigAction;

/// Run a `config` action and report the outcome on stdout.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => {
            let path = config_file_path(config_path)?;
            println!("{}", path.display());
            if !path.exists() {
                eprintln!("(file does not exist; run `stresslab config init` to create it)");
            }
        }
        ConfigAction::Get { key } => println!("{}", config_value(config_path, &key)?),
        ConfigAction::Set { key, value } => {
            let path = config_file_path(config_path)?;
            set_config_value(&path, &key, &value)?;
            println!("Set {key} = {value} in {}", path.display());
        }
        ConfigAction::Init { file, force } => {
            let path = match file {
                Some(p) => PathBuf::from(p),
                None => StresslabConfig::default_config_path()
                    .ok_or_else(|| Error::config("Could not determine config directory"))?,
            };
            write_default_config(&path, force)?;
            println!("Config file created at {}", path.display());
        }
        ConfigAction::Export { docker_env } => {
            let config = StresslabConfig::load(config_path)?;
            for line in export_lines(&config, docker_env)? {
                println!("{line}");
            }
        }
    }
    Ok(())
}

/// The config file `stresslab` reads, whether or not it exists yet.
pub fn config_file_path(config_path: Option<&str>) -> Result<PathBuf> {
    StresslabConfig::resolve_config_path(config_path).ok_or_else(|| {
        Error::config("Could not determine config directory for this platform")
    })
}

/// A value of the effective configuration, addressed by dotted key.
pub fn config_value(config_path: Option<&str>, key: &str) -> Result<String> {
    let config = StresslabConfig::load(config_path)?;
    let tree = toml::Value::try_from(&config).map_err(|e| Error::config(e.to_string()))?;
    get_nested_value(&tree, key)
        .map(format_toml_value)
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))
}

/// Write `value` under the dotted `key` of the config file at `path`.
///
/// Nothing is written unless the edited file still loads as a
/// [`StresslabConfig`].
pub fn set_config_value(path: &Path, key: &str, value: &str) -> Result<()> {
    if !path.exists() {
        return Err(Error::config(format!(
            "Config file does not exist at {}. Run `stresslab config init` first.",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
    let mut doc: toml::Value = toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;
    set_nested_value(&mut doc, key, parse_value(value))?;

    let edited = toml::to_string_pretty(&doc).map_err(|e| Error::config(e.to_string()))?;
    StresslabConfig::from_toml_str(&edited)
        .map_err(|e| Error::config(format!("Invalid value for '{key}': {e}")))?;
    std::fs::write(path, edited).map_err(|e| Error::io_with_path(e, path))
}

/// Write the default configuration to `path`, creating parent directories.
pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }
    let contents = StresslabConfig::default().to_toml_string()?;
    std::fs::write(path, contents).map_err(|e| Error::io_with_path(e, path))
}

/// `KEY=value` lines for the configuration, or `--env KEY=value` for `docker run`.
pub fn export_lines(config: &StresslabConfig, docker_env: bool) -> Result<Vec<String>> {
    let prefix = if docker_env { "--env " } else { "" };
    Ok(config
        .to_env_vars()?
        .into_iter()
        .map(|(key, value)| format!("{prefix}{key}={value}"))
        .collect())
}

fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(value, |current, part| current.as_table()?.get(part))
}

fn set_nested_value(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let (sections, last) = key.rsplit_once('.').unwrap_or(("", key));
    if last.is_empty() {
        return Err(Error::config("Empty key path"));
    }

    let mut current = root;
    for part in sections.split('.').filter(|p| !p.is_empty()) {
        current = current
            .as_table_mut()
            .ok_or_else(|| Error::config("Cannot navigate into a non-table value"))?
            .entry(part.to_string())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
    current
        .as_table_mut()
        .ok_or_else(|| Error::config("Cannot set key on a non-table value"))?
        .insert(last.to_string(), value);
    Ok(())
}

/// bool, then integer, then float; anything else stays a string.
fn parse_value(s: &str) -> toml::Value {
    if let Ok(b) = s.parse::<bool>() {
        toml::Value::Boolean(b)
    } else if let Ok(i) = s.parse::<i64>() {
        toml::Value::Integer(i)
    } else if let Ok(f) = s.parse::<f64>() {
        toml::Value::Float(f)
    } else {
        toml::Value::String(s.to_string())
    }
}

fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Array(items) => items
            .iter()
            .map(format_toml_value)
            .collect::<Vec<_>>()
            .join(","),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
    }
}
