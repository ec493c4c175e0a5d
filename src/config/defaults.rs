//! Default constants for gridfn configuration
//!
//! These apply when neither the configuration file nor the environment
//! provides a value.

/// Pool name tried when no explicit pool or pool name is configured
pub const DEFAULT_POOL_NAME: &str = "DEFAULT";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration file searched for in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "gridfn.toml";

/// System-wide configuration file
pub const SYSTEM_CONFIG_FILE: &str = "/etc/gridfn/gridfn.toml";

/// Environment variable overriding `[server] pool_name`
pub const ENV_POOL_NAME: &str = "GRIDFN_POOL_NAME";

/// Environment variable overriding `[region] name`
pub const ENV_REGION: &str = "GRIDFN_REGION";

/// Environment variable overriding `[members] groups` (comma separated)
pub const ENV_MEMBER_GROUPS: &str = "GRIDFN_MEMBER_GROUPS";

/// Environment variable overriding `[logging] level`
pub const ENV_LOG_LEVEL: &str = "GRIDFN_LOG_LEVEL";
