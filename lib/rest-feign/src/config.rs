//! Transport configuration.
//!
//! [`ClientConfig`] tunes the default [`HyperClient`](crate::HyperClient). Values come from the
//! builder or from an [`Environment`] under the `rest-feign.http.` prefix:
//!
//! | Key | Type |
//! |---|---|
//! | `rest-feign.http.timeout-ms` | milliseconds |
//! | `rest-feign.http.connect-timeout-ms` | milliseconds |
//! | `rest-feign.http.pool-idle-per-host` | count |
//! | `rest-feign.http.pool-idle-timeout-ms` | milliseconds |
//! | `rest-feign.http.user-agent` | string |

use std::str::FromStr;
use std::time::Duration;

use crate::{Environment, Error, Result};

const PREFIX: &str = "rest-feign.http.";

/// Configuration for the HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Whole round-trip timeout, including reading the body.
    pub timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_idle_per_host: usize,
    /// Idle connection timeout.
    pub pool_idle_timeout: Duration,
    /// `User-Agent` sent when a request has none.
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            user_agent: Some(concat!("rest-feign/", env!("CARGO_PKG_VERSION")).to_string()),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Read the configuration from `environment`, keeping defaults for absent keys.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] naming the key when a value does not parse.
    pub fn from_environment(environment: &Environment) -> Result<Self> {
        let mut builder = Self::builder();
        if let Some(ms) = parse_key::<u64>(environment, "timeout-ms")? {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = parse_key::<u64>(environment, "connect-timeout-ms")? {
            builder = builder.connect_timeout(Duration::from_millis(ms));
        }
        if let Some(count) = parse_key::<usize>(environment, "pool-idle-per-host")? {
            builder = builder.pool_idle_per_host(count);
        }
        if let Some(ms) = parse_key::<u64>(environment, "pool-idle-timeout-ms")? {
            builder = builder.pool_idle_timeout(Duration::from_millis(ms));
        }
        if let Some(agent) = environment.property(&format!("{PREFIX}user-agent")) {
            builder = builder.user_agent(agent);
        }
        Ok(builder.build())
    }
}

fn parse_key<T: FromStr>(environment: &Environment, key: &str) -> Result<Option<T>> {
    let key = format!("{PREFIX}{key}");
    environment
        .property(&key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| Error::configuration(format!("invalid value for {key}: '{raw}'")))
        })
        .transpose()
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
    user_agent: Option<Option<String>>,
}

impl ClientConfigBuilder {
    /// Set the request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Set the default `User-Agent`.
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(Some(agent.into()));
        self
    }

    /// Send no default `User-Agent`.
    #[must_use]
    pub fn without_user_agent(mut self) -> Self {
        self.user_agent = Some(None);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            timeout: self.timeout.unwrap_or(defaults.timeout),
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            pool_idle_per_host: self
                .pool_idle_per_host
                .unwrap_or(defaults.pool_idle_per_host),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(defaults.pool_idle_timeout),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Properties;

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(
            config
                .user_agent
                .as_deref()
                .is_some_and(|agent| agent.starts_with("rest-feign/"))
        );
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::builder()
            .timeout(Duration::from_secs(60))
            .pool_idle_per_host(16)
            .without_user_agent()
            .build();

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.pool_idle_per_host, 16);
        assert_eq!(config.user_agent, None);
    }

    #[test]
    fn reads_environment() {
        let environment = Environment::empty().with_source(
            Properties::new()
                .with("rest-feign.http.timeout-ms", "1500")
                .with("rest-feign.http.user-agent", "stock-sync/2"),
        );

        let config = ClientConfig::from_environment(&environment).expect("config");
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.user_agent.as_deref(), Some("stock-sync/2"));
    }

    #[test]
    fn rejects_unparsable_values() {
        let environment = Environment::empty()
            .with_source(Properties::new().with("rest-feign.http.pool-idle-per-host", "many"));

        let err = ClientConfig::from_environment(&environment).expect_err("invalid");
        assert!(err.is_configuration());
        assert!(err.to_string().contains("rest-feign.http.pool-idle-per-host"));
    }
}
