//! Configuration file support for gridfn
//!
//! ## Priority Order
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values
//!
//! ## Example Configuration
//!
//! ```toml
//! # gridfn.toml
//!
//! [server]
//! pool_name = "serverPool"
//! scope = "all"
//!
//! [region]
//! name = "Customers"
//! filter = ["alice", "bob"]
//!
//! [members]
//! groups = ["east", "west"]
//!
//! [logging]
//! level = "debug"
//! ansi = false
//! ```

use super::defaults::{
    DEFAULT_CONFIG_FILE, ENV_LOG_LEVEL, ENV_MEMBER_GROUPS, ENV_POOL_NAME, ENV_REGION,
    SYSTEM_CONFIG_FILE,
};
use crate::error::{FunctionError, Result};
use crate::grid::ServerScope;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Pool / cache session targeting
    pub server: ServerSection,

    /// Region targeting
    pub region: RegionSection,

    /// Member targeting
    pub members: MembersSection,

    pub logging: LoggingSection,
}

/// Server section configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Name of the pool to execute on
    pub pool_name: Option<String>,

    /// `any` for one server, `all` for every server
    pub scope: Option<ServerScope>,
}

/// Region section configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionSection {
    pub name: Option<String>,

    /// Routing keys restricting execution to the members hosting them
    pub filter: Vec<String>,
}

/// Members section configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MembersSection {
    /// Member groups; empty means every member
    pub groups: Vec<String>,
}

/// Logging section configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: Option<String>,

    /// Colored output
    pub ansi: Option<bool>,

    /// Include the event target in each line
    pub with_target: Option<bool>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            FunctionError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&contents).map_err(|e| {
            FunctionError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| FunctionError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Try to load configuration from default locations
    ///
    /// Searches in order:
    /// 1. ./gridfn.toml
    /// 2. /etc/gridfn/gridfn.toml
    pub fn load_default() -> Option<Self> {
        let default_paths = [
            PathBuf::from(DEFAULT_CONFIG_FILE),
            PathBuf::from(SYSTEM_CONFIG_FILE),
        ];

        for path in default_paths.iter() {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from {:?}", path);
                        return Some(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        None
    }

    /// Apply `GRIDFN_*` environment variables on top of the file values
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(pool_name) = get(ENV_POOL_NAME) {
            self.server.pool_name = Some(pool_name);
        }
        if let Some(region) = get(ENV_REGION) {
            self.region.name = Some(region);
        }
        if let Some(groups) = get(ENV_MEMBER_GROUPS) {
            self.members.groups = groups
                .split(',')
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            self.logging.level = Some(level);
        }
    }

    /// Generate an example configuration file
    pub fn generate_example() -> String {
        r#"# gridfn configuration file
# Copy to gridfn.toml and customize as needed
#
# Configuration priority (highest to lowest):
# 1. Environment variables (GRIDFN_*)
# 2. This configuration file
# 3. Default values

[server]
# Pool to execute on; falls back to the "DEFAULT" pool, then the cache session
# pool_name = "serverPool"

# "any" runs on one server, "all" on every server in the pool
scope = "any"

[region]
# name = "Customers"
# filter = []

[members]
# Empty means every member
groups = []

[logging]
level = "info"
ansi = true
with_target = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config() {
        let config = ConfigFile::from_toml_str("").unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_parse_all_sections() {
        let toml = r#"
[server]
pool_name = "serverPool"
scope = "all"

[region]
name = "Customers"
filter = ["alice"]

[members]
groups = ["east", "west"]

[logging]
level = "debug"
ansi = false
"#;
        let config = ConfigFile::from_toml_str(toml).unwrap();
        assert_eq!(config.server.pool_name.as_deref(), Some("serverPool"));
        assert_eq!(config.server.scope, Some(ServerScope::All));
        assert_eq!(config.region.name.as_deref(), Some("Customers"));
        assert_eq!(config.region.filter, vec!["alice"]);
        assert_eq!(config.members.groups, vec!["east", "west"]);
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert_eq!(config.logging.ansi, Some(false));
        assert_eq!(config.logging.with_target, None);
    }

    #[test]
    fn test_invalid_scope_rejected() {
        let err = ConfigFile::from_toml_str("[server]\nscope = \"some\"").unwrap_err();
        assert!(matches!(err, FunctionError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]\npool_name = \"filePool\"").unwrap();

        let config = ConfigFile::load(file.path()).unwrap();
        assert_eq!(config.server.pool_name.as_deref(), Some("filePool"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigFile::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut config =
            ConfigFile::from_toml_str("[server]\npool_name = \"filePool\"\n[members]\ngroups = [\"a\"]")
                .unwrap();
        let env: HashMap<&str, &str> = [
            (ENV_POOL_NAME, "envPool"),
            (ENV_MEMBER_GROUPS, " east, ,west "),
            (ENV_REGION, "  "),
        ]
        .into_iter()
        .collect();

        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.pool_name.as_deref(), Some("envPool"));
        assert_eq!(config.members.groups, vec!["east", "west"]);
        // blank values are ignored
        assert_eq!(config.region.name, None);
    }

    #[test]
    fn test_generated_example_parses() {
        let config = ConfigFile::from_toml_str(&ConfigFile::generate_example()).unwrap();
        assert_eq!(config.server.scope, Some(ServerScope::Any));
        assert_eq!(config.logging.level.as_deref(), Some("info"));
    }
}
