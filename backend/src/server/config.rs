//! Application settings loaded via OrthoConfig and the server configuration
//! assembled from them.

use std::net::SocketAddr;
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use bookchat::outbound::google_books::DEFAULT_GOOGLE_BOOKS_BASE_URL;
use bookchat::outbound::llm::{DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MODEL, LlmSettings, RetryPolicy};
use bookchat::outbound::persistence::DbPool;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CATALOGUE_TIMEOUT_SECS: u64 = 10;

/// Errors raised while interpreting [`AppSettings`].
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("missing required setting: {name}")]
    Missing { name: &'static str },
    #[error("invalid value for {name}='{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

fn invalid(name: &'static str, value: &str, reason: impl ToString) -> SettingsError {
    SettingsError::Invalid {
        name,
        value: value.to_owned(),
        reason: reason.to_string(),
    }
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, SettingsError> {
    Url::parse(raw).map_err(|err| invalid(name, raw, err))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Server settings. Every field may be set as `BOOKCHAT_<FIELD>` in the
/// environment, in a configuration file, or on the command line.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BOOKCHAT")]
#[serde(default)]
pub struct AppSettings {
    /// Listen address, `0.0.0.0:8080` when unset.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection URL; required.
    pub database_url: Option<String>,
    /// Google Books API root.
    pub google_books_base_url: Option<String>,
    pub google_books_api_key: Option<String>,
    /// `langRestrict` value; `en` when unset.
    pub google_books_lang: Option<String>,
    pub google_books_timeout_secs: Option<u64>,
    /// OpenAI-compatible API root.
    pub llm_base_url: Option<String>,
    /// Provider key; required.
    pub llm_api_key: Option<String>,
    pub llm_model: Option<String>,
    /// Attribution headers sent to the provider.
    pub llm_site_url: Option<String>,
    pub llm_app_title: Option<String>,
    pub llm_timeout_secs: Option<u64>,
    pub llm_max_retries: Option<u32>,
    /// Persistent session lifetime, seven days when unset.
    pub session_ttl_hours: Option<i64>,
}

impl AppSettings {
    /// Parsed listen address.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] when the value is not `host:port`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = non_blank(&self.bind_addr).unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse()
            .map_err(|err| invalid("BOOKCHAT_BIND_ADDR", raw, err))
    }

    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when no database URL is configured.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        non_blank(&self.database_url).ok_or(SettingsError::Missing {
            name: "BOOKCHAT_DATABASE_URL",
        })
    }

    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] for an unparsable URL.
    pub fn google_books_base_url(&self) -> Result<Url, SettingsError> {
        parse_url(
            "BOOKCHAT_GOOGLE_BOOKS_BASE_URL",
            non_blank(&self.google_books_base_url).unwrap_or(DEFAULT_GOOGLE_BOOKS_BASE_URL),
        )
    }

    pub fn google_books_timeout(&self) -> Duration {
        Duration::from_secs(
            self.google_books_timeout_secs
                .unwrap_or(DEFAULT_CATALOGUE_TIMEOUT_SECS),
        )
    }

    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] for an unparsable URL.
    pub fn llm_base_url(&self) -> Result<Url, SettingsError> {
        parse_url(
            "BOOKCHAT_LLM_BASE_URL",
            non_blank(&self.llm_base_url).unwrap_or(DEFAULT_LLM_BASE_URL),
        )
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs.unwrap_or(DEFAULT_LLM_TIMEOUT_SECS))
    }

    /// Provider identity, model, and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when no API key is configured.
    pub fn llm_settings(&self) -> Result<LlmSettings, SettingsError> {
        let api_key = non_blank(&self.llm_api_key).ok_or(SettingsError::Missing {
            name: "BOOKCHAT_LLM_API_KEY",
        })?;
        let mut settings = LlmSettings::new(api_key);
        settings.model = non_blank(&self.llm_model)
            .unwrap_or(DEFAULT_LLM_MODEL)
            .to_owned();
        settings.site_url = non_blank(&self.llm_site_url).map(str::to_owned);
        settings.app_title = non_blank(&self.llm_app_title).map(str::to_owned);
        if let Some(max_retries) = self.llm_max_retries {
            settings.retry = RetryPolicy {
                max_retries,
                ..RetryPolicy::default()
            };
        }
        Ok(settings)
    }

    pub fn session_ttl_hours(&self) -> i64 {
        self.session_ttl_hours
            .filter(|hours| *hours > 0)
            .unwrap_or(DEFAULT_SESSION_TTL_HOURS)
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) session_ttl_hours: i64,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
    pub(crate) settings: AppSettings,
}

impl ServerConfig {
    /// Construct a server configuration from session settings, the shared
    /// pool, and application settings.
    #[must_use]
    pub fn new(
        key: Key,
        cookie_secure: bool,
        same_site: SameSite,
        bind_addr: SocketAddr,
        db_pool: DbPool,
        settings: AppSettings,
    ) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            session_ttl_hours: settings.session_ttl_hours(),
            bind_addr,
            db_pool,
            settings,
        }
    }
}
