// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Service configuration.
//!
//! Network and sweep settings come from the command line; the privileged
//! disclosure string comes from the `FLAG` environment variable.

use std::sync::Arc;
use std::time::Duration;

use crate::error::StagingError;
use crate::staging::worker::DEFAULT_SWEEP_INTERVAL;

/// Environment variable holding the privileged disclosure string.
pub const SECRET_ENV_VAR: &str = "FLAG";

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Runtime configuration for the staging service.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Address to bind to.
    pub bind_address: String,
    /// Port to listen on.
    pub port: u16,
    /// Period of the sweep worker.
    pub sweep_interval: Duration,
    /// Upper bound on sanitize threads per sweep.
    pub sanitize_workers: usize,
    /// Privileged string disclosed by a passed secret challenge.
    pub secret: Arc<str>,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("bind_address", &self.bind_address)
            .field("port", &self.port)
            .field("sweep_interval", &self.sweep_interval)
            .field("sanitize_workers", &self.sanitize_workers)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            sanitize_workers: default_sanitize_workers(),
            secret: Arc::from(""),
        }
    }
}

impl ServiceConfig {
    /// Defaults plus the secret read from [`SECRET_ENV_VAR`].
    pub fn from_env() -> Self {
        let secret = match std::env::var(SECRET_ENV_VAR) {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(
                    "{} is not set; the secret challenge will disclose an empty value",
                    SECRET_ENV_VAR
                );
                String::new()
            }
        };
        Self::default().with_secret(secret)
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        let secret: String = secret.into();
        self.secret = Arc::from(secret);
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_bind_address(mut self, addr: impl Into<String>) -> Self {
        self.bind_address = addr.into();
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn with_sanitize_workers(mut self, workers: usize) -> Self {
        self.sanitize_workers = workers;
        self
    }

    /// Reject settings the worker cannot run with.
    pub fn validate(&self) -> Result<(), StagingError> {
        if self.sweep_interval.is_zero() {
            return Err(StagingError::Config(
                "sweep interval must be greater than zero".to_string(),
            ));
        }
        if self.sanitize_workers == 0 {
            return Err(StagingError::Config(
                "sanitize worker count must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// `host:port` string for the listener.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

fn default_sanitize_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.sweep_interval, Duration::from_millis(100));
        assert!(config.sanitize_workers >= 1);
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_builders() {
        let config = ServiceConfig::default()
            .with_port(9000)
            .with_bind_address("127.0.0.1")
            .with_secret("s3cr3t")
            .with_sanitize_workers(3)
            .with_sweep_interval(Duration::from_millis(50));
        assert_eq!(config.listen_address(), "127.0.0.1:9000");
        assert_eq!(&*config.secret, "s3cr3t");
        assert_eq!(config.sanitize_workers, 3);
        assert_eq!(config.sweep_interval, Duration::from_millis(50));
    }

    #[test]
    fn test_validate_rejects_zero() {
        let config = ServiceConfig::default().with_sweep_interval(Duration::ZERO);
        assert!(matches!(config.validate(), Err(StagingError::Config(_))));

        let config = ServiceConfig::default().with_sanitize_workers(0);
        assert!(matches!(config.validate(), Err(StagingError::Config(_))));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = ServiceConfig::default().with_secret("do-not-print");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("do-not-print"));
    }
}
