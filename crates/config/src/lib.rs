//! Configuration loading, validation, and env substitution.
//!
//! Config file: `donna.toml`, searched in `./` then `~/.config/donna/`.
//! Supports `${ENV_VAR}` substitution in the raw file before parsing.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{config_dir, discover_and_load, load_config},
    schema::{ConversationConfig, DonnaConfig, SchedulingConfig, SessionsConfig},
};
