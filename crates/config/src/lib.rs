//! Configuration loading and env substitution.
//!
//! Config files: `chanbridge.toml`, `chanbridge.yaml` / `.yml`, or
//! `chanbridge.json`, searched in `./` then the user config dir. Every file
//! is parsed into a `serde_json::Value`; channel crates deserialize their own
//! sections from it.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution.

pub mod env_subst;
pub mod loader;

pub use loader::{config_dir, discover_config_file, load, load_config_value};
