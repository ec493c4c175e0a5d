//! Configuration module for gridfn
//!
//! - `defaults` - Default constants and environment variable names
//! - `file` - TOML configuration file and environment overrides
//!
//! The sections map onto the target resolvers:
//! [`ServerTargets::from_config`](crate::execution::ServerTargets::from_config),
//! [`RegionTargets::from_config`](crate::execution::RegionTargets::from_config) and
//! [`MemberTargets::from_config`](crate::execution::MemberTargets::from_config).

mod defaults;
pub mod file;

pub use defaults::*;
pub use file::{ConfigFile, LoggingSection, MembersSection, RegionSection, ServerSection};
