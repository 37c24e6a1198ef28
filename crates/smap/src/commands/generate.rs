//! `smap generate` command implementation.

use std::path::PathBuf;

use clap::Args;
use smap_config::{CliSettings, Config};

use crate::error::CliError;
use crate::output::Output;
use crate::sitemap::build_cache;

/// Arguments for the generate command.
#[derive(Args)]
pub(crate) struct GenerateArgs {
    /// Path to configuration file (default: auto-discover smap.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Public domain of the site, e.g. `https://example.com` (overrides config).
    #[arg(long, env = "SMAP_DOMAIN")]
    domain: Option<String>,

    /// Directory for the generated files (overrides config).
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl GenerateArgs {
    /// Execute the generate command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or generation fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            domain: self.domain,
            cache_dir: self.cache_dir,
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let cache = build_cache(&config)?;
        let files = cache.ensure_ready()?;
        output.generated(cache.config(), &files);

        Ok(())
    }
}
