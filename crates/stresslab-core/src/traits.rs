//! Shared traits.

use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// A configuration type that can be located, loaded, and exported.
///
/// The CLI `config` subcommands are written against this trait so they do
/// not depend on the concrete layout of a project's config file.
pub trait ConfigManager: Serialize + DeserializeOwned + Default {
    /// Short project name, used for the config directory and env prefix.
    fn project_name() -> &'static str;

    /// Load configuration, resolving the path via [`resolve_config_path`](Self::resolve_config_path).
    ///
    /// A missing file yields the defaults.
    fn load(explicit: Option<&str>) -> Result<Self>;

    /// Environment variable prefix (`STRESSLAB` for `stresslab`).
    fn env_prefix() -> String {
        Self::project_name().to_uppercase().replace('-', "_")
    }

    /// Default location of the config file on this platform.
    fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::project_name()).join("config.toml"))
    }

    /// Resolve the config file path.
    ///
    /// Order: explicit path, then `<PREFIX>_CONFIG`, then the platform default.
    fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var(format!("{}_CONFIG", Self::env_prefix())) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        Self::default_config_path()
    }

    /// Serialize to pretty TOML.
    fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Flatten the configuration into `PREFIX_SECTION_KEY=value` pairs.
    fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value = toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_env(&Self::env_prefix(), &value, &mut vars);
        Ok(vars)
    }
}

fn flatten_env(prefix: &str, value: &toml::Value, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, child) in table {
                let name = format!("{prefix}_{}", key.to_uppercase());
                flatten_env(&name, child, out);
            }
        }
        toml::Value::Array(items) => {
            let joined = items
                .iter()
                .map(scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.push((prefix.to_string(), joined));
        }
        other => out.push((prefix.to_string(), scalar_to_string(other))),
    }
}

fn scalar_to_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Tiny {
        name: String,
        tags: Vec<String>,
        inner: Inner,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Inner {
        port: u16,
    }

    impl ConfigManager for Tiny {
        fn project_name() -> &'static str {
            "tiny-app"
        }

        fn load(_explicit: Option<&str>) -> Result<Self> {
            Ok(Self::default())
        }
    }

    #[test]
    fn test_env_prefix() {
        assert_eq!(Tiny::env_prefix(), "TINY_APP");
    }

    #[test]
    fn test_resolve_explicit_path_wins() {
        let path = Tiny::resolve_config_path(Some("/etc/tiny.toml")).unwrap();
        assert_eq!(path, PathBuf::from("/etc/tiny.toml"));
    }

    #[test]
    fn test_to_env_vars_flattens_sections() {
        let cfg = Tiny {
            name: "demo".into(),
            tags: vec!["a".into(), "b".into()],
            inner: Inner { port: 8080 },
        };
        let vars = cfg.to_env_vars().unwrap();
        assert!(vars.contains(&("TINY_APP_NAME".to_string(), "demo".to_string())));
        assert!(vars.contains(&("TINY_APP_TAGS".to_string(), "a,b".to_string())));
        assert!(vars.contains(&("TINY_APP_INNER_PORT".to_string(), "8080".to_string())));
    }

    #[test]
    fn test_to_toml_string() {
        let toml_str = Tiny::default().to_toml_string().unwrap();
        assert!(toml_str.contains("[inner]"));
    }
}
