//! Process environment: upstream credentials and base URLs
//!
//! Everything is read once at startup into [`Settings`] and handed to the
//! clients that need it.

use std::fmt;

use crate::config::{Config, ProviderKind};
use crate::error::ConfigError;

const UPTIMEROBOT_AUTH: &str = "UPTIMEROBOT_AUTH";
const STATUSPAGE_AUTH: &str = "STATUSPAGE_AUTH";
const REGIONAL_PING_AUTH: &str = "REGIONAL_PING_AUTH";
const ERROR_REPORT_DSN: &str = "ERROR_REPORT_DSN";

const UPTIMEROBOT_API_URL: &str = "UPTIMEROBOT_API_URL";
const STATUSPAGE_API_URL: &str = "STATUSPAGE_API_URL";
const REGIONAL_PING_API_URL: &str = "REGIONAL_PING_API_URL";

pub const DEFAULT_UPTIMEROBOT_URL: &str = "https://api.uptimerobot.com";
pub const DEFAULT_STATUSPAGE_URL: &str = "https://api.statuspage.io";

/// Opaque credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub uptimerobot_url: String,
    pub uptimerobot_auth: Option<Secret>,
    pub regional_url: Option<String>,
    pub regional_auth: Option<Secret>,
    pub statuspage_url: String,
    pub statuspage_auth: Option<Secret>,
    pub error_report_dsn: Option<Secret>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let secret = |key: &str| get(key).map(Secret::new);

        Self {
            uptimerobot_url: get(UPTIMEROBOT_API_URL)
                .unwrap_or_else(|| DEFAULT_UPTIMEROBOT_URL.to_string()),
            uptimerobot_auth: secret(UPTIMEROBOT_AUTH),
            regional_url: get(REGIONAL_PING_API_URL),
            regional_auth: secret(REGIONAL_PING_AUTH),
            statuspage_url: get(STATUSPAGE_API_URL)
                .unwrap_or_else(|| DEFAULT_STATUSPAGE_URL.to_string()),
            statuspage_auth: secret(STATUSPAGE_AUTH),
            error_report_dsn: secret(ERROR_REPORT_DSN),
        }
    }

    /// Check that every provider the document uses can be reached.
    pub fn validate_for(&self, config: &Config) -> Result<(), ConfigError> {
        if self.statuspage_auth.is_none() {
            return Err(ConfigError::MissingSetting(STATUSPAGE_AUTH));
        }
        if config.uses(ProviderKind::UptimeRobot) && self.uptimerobot_auth.is_none() {
            return Err(ConfigError::MissingSetting(UPTIMEROBOT_AUTH));
        }
        if config.uses(ProviderKind::Regional) {
            if self.regional_url.is_none() {
                return Err(ConfigError::MissingSetting(REGIONAL_PING_API_URL));
            }
            if self.regional_auth.is_none() {
                return Err(ConfigError::MissingSetting(REGIONAL_PING_AUTH));
            }
        }
        Ok(())
    }
}
