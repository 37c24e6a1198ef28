//! `smap serve` command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use smap_config::{CliSettings, Config};
use smap_server::{run_server, server_config_from_config};

use crate::error::CliError;
use crate::output::Output;
use crate::sitemap::build_cache;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover smap.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Public domain of the site, e.g. `https://example.com` (overrides config).
    #[arg(long, env = "SMAP_DOMAIN")]
    domain: Option<String>,

    /// Directory for the generated files (overrides config).
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Enable verbose output (request tracing and generation timing).
    #[arg(short, long)]
    pub verbose: bool,

    /// Generate the sitemap before accepting requests.
    #[arg(long)]
    eager: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            domain: self.domain,
            cache_dir: self.cache_dir,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let cache = Arc::new(build_cache(&config)?);

        output.field(
            "Listening on",
            format!("{}:{}", config.server.host, config.server.port),
        );
        output.field("Cache directory", cache.config().cache_dir().display());
        output.index_url(cache.config());

        if self.eager {
            let eager_cache = Arc::clone(&cache);
            let files = tokio::task::spawn_blocking(move || eager_cache.ensure_ready())
                .await
                .map_err(|e| CliError::Server(e.to_string()))??;
            output.generated(cache.config(), &files);
        } else {
            output.info("Sitemap will be generated on first request");
        }

        let server_config = server_config_from_config(&config);
        run_server(server_config, cache)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }
}
