// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Coordination client configuration.

use std::time::Duration;

/// Endpoint used when no coordination endpoints are configured.
pub const DEFAULT_ENDPOINT: &str = "localhost:2181";

/// Bounded retry policy for confirming node visibility after a create.
///
/// The coordination service may take a moment to make a freshly created node
/// visible to subsequent reads. Confirmation is best-effort: exhausting the
/// policy is logged, never fatal.
#[derive(Debug, Clone)]
pub struct ConfirmPolicy {
    /// Maximum number of existence probes.
    pub max_attempts: u32,

    /// Linear backoff step; attempt `i` sleeps `i * backoff_step`.
    pub backoff_step: Duration,
}

impl Default for ConfirmPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_step: Duration::from_millis(100),
        }
    }
}

impl ConfirmPolicy {
    /// Backoff before re-probing after failed attempt `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }

    /// Policy that skips confirmation entirely (for tests).
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            backoff_step: Duration::ZERO,
        }
    }
}

/// Configuration for connecting to the coordination service.
#[derive(Debug, Clone)]
pub struct CoordinationConfig {
    /// Coordination service endpoints (host:port), tried in order.
    pub endpoints: Vec<String>,

    /// Connection (and per-request) timeout.
    pub connect_timeout: Duration,

    /// Maximum accepted wire frame size.
    pub max_frame_size: usize,

    /// Node visibility confirmation policy.
    pub confirm: ConfirmPolicy,
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![DEFAULT_ENDPOINT.to_string()],
            connect_timeout: Duration::from_secs(5),
            max_frame_size: 4 * 1024 * 1024,
            confirm: ConfirmPolicy::default(),
        }
    }
}

impl CoordinationConfig {
    /// Parse a comma-separated endpoint list (`"zk1:2181,zk2:2181"`).
    ///
    /// An empty or blank list falls back to [`DEFAULT_ENDPOINT`].
    pub fn from_endpoint_list(list: &str) -> Self {
        let endpoints: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if endpoints.is_empty() {
            log::info!("[CONFIG] no endpoints configured, using {}", DEFAULT_ENDPOINT);
            return Self::default();
        }

        log::info!("[CONFIG] coordination endpoints: {:?}", endpoints);
        Self {
            endpoints,
            ..Default::default()
        }
    }

    /// Builder: set connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Builder: set maximum frame size.
    pub fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Builder: set confirmation policy.
    pub fn with_confirm(mut self, confirm: ConfirmPolicy) -> Self {
        self.confirm = confirm;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.endpoints.is_empty() {
            return Err("endpoints must not be empty");
        }
        if self.connect_timeout.is_zero() {
            return Err("connect_timeout must be > 0");
        }
        if self.max_frame_size == 0 {
            return Err("max_frame_size must be > 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoordinationConfig::default();
        assert_eq!(config.endpoints, vec![DEFAULT_ENDPOINT.to_string()]);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint_list_parsing() {
        let config = CoordinationConfig::from_endpoint_list("zk1:2181, zk2:2181 ,zk3:2181");
        assert_eq!(config.endpoints, vec!["zk1:2181", "zk2:2181", "zk3:2181"]);
    }

    #[test]
    fn test_empty_endpoint_list_falls_back() {
        let config = CoordinationConfig::from_endpoint_list("");
        assert_eq!(config.endpoints, vec![DEFAULT_ENDPOINT.to_string()]);

        let config = CoordinationConfig::from_endpoint_list(" , ,");
        assert_eq!(config.endpoints, vec![DEFAULT_ENDPOINT.to_string()]);
    }

    #[test]
    fn test_builder_methods() {
        let config = CoordinationConfig::default()
            .with_connect_timeout(Duration::from_secs(10))
            .with_max_frame_size(1024)
            .with_confirm(ConfirmPolicy::disabled());

        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.max_frame_size, 1024);
        assert_eq!(config.confirm.max_attempts, 0);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = CoordinationConfig::default();
        config.endpoints.clear();
        assert!(config.validate().is_err());

        let config = CoordinationConfig {
            connect_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CoordinationConfig {
            max_frame_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_confirm_backoff_is_linear() {
        let policy = ConfirmPolicy::default();
        assert_eq!(policy.backoff(0), Duration::ZERO);
        assert_eq!(policy.backoff(3), Duration::from_millis(300));
    }
}
