//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_STOREFRONT_ACCESS_TOKEN` - Storefront API access token
//!
//! ## Optional
//! - `SHOPIFY_API_VERSION` - API version (default: 2022-04)
//! - `SHOPIFY_STOREFRONT_ENDPOINT` - Full GraphQL endpoint URL, replacing the
//!   one derived from store and version (proxies, local fakes)
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL (default: <http://localhost:3000>)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//!
//! A `.env` file in the working directory is honoured.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const DEFAULT_API_VERSION: &str = "2022-04";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Storefront tokens are 32 hex characters; uniform hex reaches 4 bits/char.
const MIN_TOKEN_ENTROPY: f64 = 3.0;

/// Fragments that give away a copied-in sample value (matched lowercase).
const PLACEHOLDER_FRAGMENTS: &[&str] = &[
    "your",
    "changeme",
    "change-me",
    "placeholder",
    "example",
    "sample",
    "dummy",
    "xxxx",
    "todo",
    "<",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not set")]
    Missing { var: &'static str },

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("{var} does not look like a real token: {reason}")]
    WeakSecret { var: &'static str, reason: String },
}

/// Settings for the cart widget server.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Address to bind
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public URL the widget is served from
    pub base_url: String,
    /// Storefront API access
    pub shopify: ShopifyStorefrontConfig,
    /// Sentry DSN; error tracking is off without it
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

/// Storefront API access settings.
#[derive(Clone)]
pub struct ShopifyStorefrontConfig {
    /// Store domain, e.g. `merch.myshopify.com`
    pub store: String,
    pub api_version: String,
    /// Public Storefront access token
    pub access_token: SecretString,
    /// Full endpoint URL replacing the derived one
    pub endpoint_override: Option<String>,
}

impl std::fmt::Debug for ShopifyStorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyStorefrontConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .field("endpoint_override", &self.endpoint_override)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load the server configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing, a value does
    /// not parse, or the access token looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();

        let base_url =
            env_var("STOREFRONT_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        check_url("STOREFRONT_BASE_URL", &base_url)?;

        Ok(Self {
            host: parse_env("STOREFRONT_HOST", IpAddr::V4(Ipv4Addr::LOCALHOST))?,
            port: parse_env("STOREFRONT_PORT", DEFAULT_PORT)?,
            base_url,
            shopify: ShopifyStorefrontConfig::load()?,
            sentry_dsn: env_var("SENTRY_DSN"),
            sentry_environment: env_var("SENTRY_ENVIRONMENT"),
        })
    }

    /// Address the server binds to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the widget is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl ShopifyStorefrontConfig {
    /// Load only the Storefront API settings (the CLI needs nothing else).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the store or token is missing, the token looks
    /// like a placeholder, or the endpoint override is not a URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::load()
    }

    fn load() -> Result<Self, ConfigError> {
        let endpoint_override = env_var("SHOPIFY_STOREFRONT_ENDPOINT");
        if let Some(endpoint) = &endpoint_override {
            check_url("SHOPIFY_STOREFRONT_ENDPOINT", endpoint)?;
        }

        let access_token = SecretString::from(required_env("SHOPIFY_STOREFRONT_ACCESS_TOKEN")?);
        check_token("SHOPIFY_STOREFRONT_ACCESS_TOKEN", &access_token)?;

        Ok(Self {
            store: required_env("SHOPIFY_STORE")?,
            api_version: env_var("SHOPIFY_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            access_token,
            endpoint_override,
        })
    }

    /// The GraphQL endpoint for this store.
    #[must_use]
    pub fn endpoint(&self) -> String {
        match &self.endpoint_override {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://{}/api/{}/graphql.json", self.store, self.api_version),
        }
    }
}

// =============================================================================
// Environment helpers
// =============================================================================

fn load_dotenv() {
    // A missing .env is the normal case in production
    let _ = dotenvy::dotenv();
}

/// A set, non-blank environment variable.
fn env_var(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn required_env(var: &'static str) -> Result<String, ConfigError> {
    env_var(var).ok_or(ConfigError::Missing { var })
}

/// Parse `var`, falling back to `default` when it is unset.
fn parse_env<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    env_var(var).map_or(Ok(default), |raw| {
        raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        })
    })
}

fn check_url(var: &'static str, value: &str) -> Result<(), ConfigError> {
    Url::parse(value).map(drop).map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}

/// Shannon entropy of `s` in bits per character.
fn entropy_per_char(s: &str) -> f64 {
    let counts = s.chars().fold(BTreeMap::<char, u32>::new(), |mut counts, c| {
        *counts.entry(c).or_default() += 1;
        counts
    });
    let total: u32 = counts.values().sum();
    if total == 0 {
        return 0.0;
    }

    counts
        .values()
        .map(|&n| {
            let p = f64::from(n) / f64::from(total);
            -p * p.log2()
        })
        .sum()
}

/// Reject tokens that are obviously sample values.
fn check_token(var: &'static str, token: &SecretString) -> Result<(), ConfigError> {
    let value = token.expose_secret();
    let lower = value.to_ascii_lowercase();

    if let Some(fragment) = PLACEHOLDER_FRAGMENTS.iter().find(|f| lower.contains(**f)) {
        return Err(ConfigError::WeakSecret {
            var,
            reason: format!("contains '{fragment}'"),
        });
    }

    let entropy = entropy_per_char(value);
    if entropy < MIN_TOKEN_ENTROPY {
        return Err(ConfigError::WeakSecret {
            var,
            reason: format!(
                "{entropy:.2} bits/char, expected at least {MIN_TOKEN_ENTROPY:.1}; \
                 copy the token from the Shopify admin"
            ),
        });
    }

    Ok(())
}
