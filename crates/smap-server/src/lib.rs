//! HTTP server for smap sitemaps.
//!
//! This crate serves the files of a [`SitemapCache`] with axum:
//! - `GET {server_path}sitemapindex.xml` returns the index
//! - `GET {server_path}sitemap_<N>.xml` returns page N
//!
//! The first request generates the sitemap. Generation runs on the blocking
//! thread pool so it never stalls the async executor.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use smap_server::{ServerConfig, run_server};
//! use smap_sitemap::{SitemapCache, SitemapConfig, SitemapRegistry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = SitemapConfig::new("https://example.com", ".smap/cache");
//!     let registry = SitemapRegistry::new(config.default_priority());
//!     let cache = Arc::new(SitemapCache::new(registry, config));
//!
//!     run_server(ServerConfig::default(), cache).await.unwrap();
//! }
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use smap_sitemap::SitemapCache;
use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7980,
        }
    }
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address is invalid or the server fails to start.
pub async fn run_server(
    config: ServerConfig,
    cache: Arc<SitemapCache>,
) -> Result<(), Box<dyn std::error::Error>> {
    let server_path = cache.config().server_path().to_owned();
    let state = Arc::new(AppState { cache });
    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, server_path = %server_path, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from smap config.
#[must_use]
pub fn server_config_from_config(config: &smap_config::Config) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 7980);
    }

    #[test]
    fn test_server_config_from_config() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("smap.toml");
        std::fs::write(
            &path,
            "[server]\nhost = \"0.0.0.0\"\nport = 9000\n\n[sitemap]\ndomain = \"https://example.com\"\n",
        )
        .unwrap();
        let config = smap_config::Config::load(Some(Path::new(&path)), None).unwrap();

        let server = server_config_from_config(&config);

        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 9000);
    }
}
