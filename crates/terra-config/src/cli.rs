//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// terra command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "terra", about = "Planet mesh topology and field tools")]
pub struct CliArgs {
    /// Icosphere subdivision level.
    #[arg(long)]
    pub subdivisions: Option<u32>,

    /// Nearest-vertex index cells per mean vertex spacing.
    #[arg(long)]
    pub cells_per_spacing: Option<f32>,

    /// Seed for the sample noise field and queries.
    #[arg(long)]
    pub seed: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(n) = args.subdivisions {
            self.mesh.subdivisions = n;
        }
        if let Some(cells) = args.cells_per_spacing {
            self.index.cells_per_spacing = cells;
        }
        if let Some(seed) = args.seed {
            self.field.seed = seed;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
