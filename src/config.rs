use std::time::Duration;

use chrono_tz::Tz;
use reqwest::Url;

use crate::error::{Error, Result};

pub const HOST: &str = "https://btconnectedpower.com";

/// Applies to all four device caches.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// Construction parameters for [`BatteryTender`](crate::BatteryTender).
#[derive(Clone)]
pub struct Config {
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) cache_ttl: Duration,
    pub(crate) timezone: Tz,
    pub(crate) base_url: Url,
}

impl Config {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let email = email.into();
        let password = password.into();
        if email.is_empty() {
            return Err(Error::Config("email is empty".into()));
        }
        if password.is_empty() {
            return Err(Error::Config("password is empty".into()));
        }

        Ok(Self {
            email,
            password,
            cache_ttl: DEFAULT_CACHE_TTL,
            timezone: Tz::UTC,
            base_url: parse_base_url(HOST)?,
        })
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Zone used for timestamps that carry no offset.
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(Error::InvalidUrl(format!("{raw}: not a base URL")));
    }
    Ok(url)
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("email", &self.email)
            .field("cache_ttl", &self.cache_ttl)
            .field("timezone", &self.timezone)
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new("me@example.com", "secret").unwrap();
        assert_eq!(config.cache_ttl(), Duration::from_secs(600));
        assert_eq!(config.timezone(), Tz::UTC);
        assert_eq!(config.base_url().as_str(), "https://btconnectedpower.com/");
    }

    #[test]
    fn test_rejects_empty_credentials() {
        assert!(matches!(Config::new("", "secret"), Err(Error::Config(_))));
        assert!(matches!(Config::new("me@example.com", ""), Err(Error::Config(_))));
    }

    #[test]
    fn test_overrides() {
        let config = Config::new("me@example.com", "secret")
            .unwrap()
            .with_cache_ttl(Duration::from_secs(5))
            .with_timezone(chrono_tz::Europe::Berlin)
            .with_base_url("http://localhost:8080")
            .unwrap();
        assert_eq!(config.cache_ttl(), Duration::from_secs(5));
        assert_eq!(config.timezone(), chrono_tz::Europe::Berlin);
        assert_eq!(config.base_url().port(), Some(8080));

        let bad = Config::new("me@example.com", "secret").unwrap().with_base_url("mailto:x");
        assert!(matches!(bad, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_debug_hides_password() {
        let config = Config::new("me@example.com", "hunter2").unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
