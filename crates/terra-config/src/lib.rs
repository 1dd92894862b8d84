//! Configuration for the terra planet tools.
//!
//! Settings persist to disk as `config.ron` and can be overridden from the command
//! line. Every section uses `#[serde(default)]`, so older and newer files both load.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{Config, DebugConfig, FieldConfig, IndexConfig, MeshConfig};
pub use error::ConfigError;
