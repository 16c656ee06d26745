//! Server configuration loaded from environment variables.
//!
//! Every setting has a default so the server starts with zero configuration
//! for local development. `RUST_LOG` is read by the tracing subscriber
//! directly and is not stored here.

use std::net::SocketAddr;

use anyhow::Context;

pub const DEV_JWT_SECRET: &str = "casetrack-dev-secret";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Socket address for the HTTP server.
    /// Env: `BIND_ADDR`
    /// Default: `0.0.0.0:8080`
    pub bind_addr: SocketAddr,

    /// HS256 secret shared with the identity provider.
    /// Env: `JWT_SECRET`
    /// Default: an insecure development secret.
    pub jwt_secret: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 8080).into(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process environment in
    /// production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .with_context(|| format!("invalid BIND_ADDR: {addr:?}"))?;
        }

        match lookup("JWT_SECRET") {
            Some(secret) if !secret.trim().is_empty() => config.jwt_secret = secret,
            Some(_) => anyhow::bail!("JWT_SECRET is set but empty"),
            None => tracing::warn!("JWT_SECRET not set; using insecure dev default"),
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.jwt_secret, DEV_JWT_SECRET);
    }

    #[test]
    fn reads_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.jwt_secret, "s3cret");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(ApiConfig::from_lookup(lookup(&[("BIND_ADDR", "nowhere")])).is_err());
        assert!(ApiConfig::from_lookup(lookup(&[("JWT_SECRET", "  ")])).is_err());
    }
}
