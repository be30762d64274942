//! Configuration management for Link Annotator Server

use std::env;

use serde::Deserialize;
use thiserror::Error;

use crate::cache::CacheBackend;
use crate::editor::DisplayLocation;

/// Default heading above the generated references list
pub const DEFAULT_REFERENCES_HEADING: &str = "Sources and related links";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable {name}: {source}")]
    Missing {
        name: &'static str,
        #[source]
        source: env::VarError,
    },

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub fetch: FetchConfig,
    pub cache: CacheConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Base URL of the site; links containing it are never annotated
    pub base_url: String,
    pub references_heading: String,
    pub display_location: DisplayLocation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout for title fetches
    pub timeout_secs: u64,
    /// Total time one render may spend fetching titles (None = unbounded)
    pub render_budget_secs: Option<u64>,
    pub user_agent: String,
    /// Response bytes read when looking for a title
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub backend: CacheBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            timeout_secs: 10,
            render_budget_secs: Some(30),
            user_agent: default_user_agent(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            site: SiteConfig {
                base_url: "http://localhost:3000".to_string(),
                references_heading: DEFAULT_REFERENCES_HEADING.to_string(),
                display_location: DisplayLocation::default(),
            },
            fetch: FetchConfig::default(),
            cache: CacheConfig {
                backend: CacheBackend::default(),
            },
            database: DatabaseConfig {
                url: "sqlite:./link-annotator.db".to_string(),
            },
        }
    }
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let base_url = env::var("SITE_BASE_URL").map_err(|source| ConfigError::Missing {
            name: "SITE_BASE_URL",
            source,
        })?;
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ConfigError::Invalid {
                name: "SITE_BASE_URL",
                reason: "must not be empty".to_string(),
            });
        }

        let render_budget_secs = match parse_var("RENDER_BUDGET_SECS", 30u64)? {
            0 => None,
            secs => Some(secs),
        };

        let backend = match env::var("TITLE_CACHE_BACKEND")
            .unwrap_or_else(|_| "sqlite".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => CacheBackend::Memory,
            "sqlite" => CacheBackend::Sqlite,
            other => {
                return Err(ConfigError::Invalid {
                    name: "TITLE_CACHE_BACKEND",
                    reason: format!("unknown backend: {}", other),
                })
            }
        };

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port)?,
            },
            site: SiteConfig {
                base_url,
                references_heading: env::var("REFERENCES_HEADING")
                    .unwrap_or(defaults.site.references_heading),
                display_location: parse_var(
                    "EDITOR_DISPLAY_LOCATION",
                    defaults.site.display_location,
                )?,
            },
            fetch: FetchConfig {
                timeout_secs: parse_var("TITLE_FETCH_TIMEOUT_SECS", defaults.fetch.timeout_secs)?,
                render_budget_secs,
                user_agent: env::var("TITLE_FETCH_USER_AGENT")
                    .unwrap_or(defaults.fetch.user_agent),
                max_body_bytes: parse_var("TITLE_FETCH_MAX_BYTES", defaults.fetch.max_body_bytes)?,
            },
            cache: CacheConfig { backend },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            },
        })
    }
}
