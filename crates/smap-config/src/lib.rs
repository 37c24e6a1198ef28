//! Configuration management for smap.
//!
//! Parses `smap.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `sitemap.domain`
//!
//! ## Example
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [sitemap]
//! domain = "https://example.com"
//! server_path = "/sitemaps/"
//!
//! [[routes]]
//! pattern = "/"
//! priority = 1.0
//!
//! [[routes]]
//! pattern = "/doc/{id}"
//! bindings = "data/docs.json"
//! ```

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override public domain of the site.
    pub domain: Option<String>,
    /// Override sitemap cache directory.
    pub cache_dir: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "smap.toml";

/// Largest page size the sitemap protocol allows.
const MAX_ENTRIES_PER_PAGE: usize = 50_000;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Sitemap configuration (paths are relative strings from TOML).
    sitemap: SitemapConfigRaw,
    /// Routes listed in the sitemap (paths are relative strings from TOML).
    routes: Vec<RouteConfigRaw>,

    /// Resolved sitemap configuration (set after loading).
    #[serde(skip)]
    pub sitemap_resolved: SitemapConfig,
    /// Resolved routes (set after loading).
    #[serde(skip)]
    pub routes_resolved: Vec<RouteConfig>,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
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

/// Raw sitemap configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SitemapConfigRaw {
    domain: Option<String>,
    cache_dir: Option<String>,
    server_path: Option<String>,
    default_priority: Option<f64>,
    prune_stale: Option<bool>,
    max_entries_per_page: Option<usize>,
}

/// Resolved sitemap configuration with absolute paths.
#[derive(Debug)]
pub struct SitemapConfig {
    /// Public origin of the site, e.g. `https://example.com`.
    pub domain: String,
    /// Directory holding the generated sitemap files.
    pub cache_dir: PathBuf,
    /// URL path the sitemap files are served under.
    pub server_path: String,
    /// Priority of routes that do not set one.
    pub default_priority: f64,
    /// Whether pages left over from a larger generation are removed.
    pub prune_stale: bool,
    /// Page capacity.
    pub max_entries_per_page: usize,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            cache_dir: PathBuf::from(".smap/cache"),
            server_path: "/".to_owned(),
            default_priority: 0.5,
            prune_stale: true,
            max_entries_per_page: MAX_ENTRIES_PER_PAGE,
        }
    }
}

/// Raw route as parsed from TOML.
#[derive(Debug, Deserialize)]
struct RouteConfigRaw {
    pattern: String,
    priority: Option<f64>,
    bindings: Option<String>,
}

/// Resolved route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteConfig {
    /// URL pattern, e.g. `/doc/{id}`.
    pub pattern: String,
    /// Route priority; the sitemap default applies when unset.
    pub priority: Option<f64>,
    /// JSON file with the route's resource instances. Routes without one
    /// are static.
    pub bindings: Option<PathBuf>,
}

impl RouteConfig {
    /// Whether the route's instances come from a bindings file.
    #[must_use]
    pub fn is_parameterized(&self) -> bool {
        self.bindings.is_some()
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`sitemap.domain`").
        field: String,
        /// Error message (e.g., "${`SITE_DOMAIN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Require a priority to lie in `[0, 1]`.
fn require_priority(value: f64, field: &str) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{field} must be between 0.0 and 1.0, got {value}"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `smap.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The result is
    /// validated last, so a domain may come from the command line alone.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the final configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(domain) = &settings.domain {
            self.sitemap_resolved.domain.clone_from(domain);
        }
        if let Some(cache_dir) = &settings.cache_dir {
            self.sitemap_resolved.cache_dir.clone_from(cache_dir);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            sitemap: SitemapConfigRaw::default(),
            routes: Vec::new(),
            sitemap_resolved: SitemapConfig {
                cache_dir: base.join(".smap/cache"),
                ..SitemapConfig::default()
            },
            routes_resolved: Vec::new(),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Checks that all required fields are properly set and contain valid values.
    /// Called automatically by [`Config::load`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_sitemap()?;
        self.validate_routes()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate sitemap configuration.
    fn validate_sitemap(&self) -> Result<(), ConfigError> {
        let sitemap = &self.sitemap_resolved;
        require_non_empty(&sitemap.domain, "sitemap.domain")?;
        require_http_url(&sitemap.domain, "sitemap.domain")?;
        require_priority(sitemap.default_priority, "sitemap.default_priority")?;

        let max = sitemap.max_entries_per_page;
        if max == 0 || max > MAX_ENTRIES_PER_PAGE {
            return Err(ConfigError::Validation(format!(
                "sitemap.max_entries_per_page must be between 1 and {MAX_ENTRIES_PER_PAGE}"
            )));
        }

        Ok(())
    }

    /// Validate routes.
    fn validate_routes(&self) -> Result<(), ConfigError> {
        for (i, route) in self.routes_resolved.iter().enumerate() {
            require_non_empty(&route.pattern, &format!("routes[{i}].pattern"))?;
            if let Some(priority) = route.priority {
                require_priority(priority, &format!("routes[{i}].priority"))?;
            }
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(ref domain) = self.sitemap.domain {
            self.sitemap.domain = Some(expand::expand_env(domain, "sitemap.domain")?);
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let defaults = SitemapConfig::default();
        let raw = &self.sitemap;

        self.sitemap_resolved = SitemapConfig {
            domain: raw.domain.clone().unwrap_or_default(),
            cache_dir: config_dir.join(raw.cache_dir.as_deref().unwrap_or(".smap/cache")),
            server_path: raw.server_path.clone().unwrap_or(defaults.server_path),
            default_priority: raw.default_priority.unwrap_or(defaults.default_priority),
            prune_stale: raw.prune_stale.unwrap_or(defaults.prune_stale),
            max_entries_per_page: raw
                .max_entries_per_page
                .unwrap_or(defaults.max_entries_per_page),
        };

        self.routes_resolved = self
            .routes
            .iter()
            .map(|route| RouteConfig {
                pattern: route.pattern.clone(),
                priority: route.priority,
                bindings: route.bindings.as_ref().map(|b| config_dir.join(b)),
            })
            .collect();
    }
}
