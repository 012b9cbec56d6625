// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service configuration, read from the process environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PdfdeskError, Result};

/// Environment variable names.
pub const ENV_HOST: &str = "PDFDESK_HOST";
pub const ENV_PORT: &str = "PDFDESK_PORT";
pub const ENV_SCRATCH_DIR: &str = "PDFDESK_SCRATCH_DIR";
pub const ENV_MAX_UPLOAD_MB: &str = "PDFDESK_MAX_UPLOAD_MB";

/// Runtime settings for the conversion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP listener binds to.
    pub host: IpAddr,
    /// Port for the HTTP listener (default 8000).
    pub port: u16,
    /// Scratch directory holding staged uploads and results.
    pub scratch_dir: PathBuf,
    /// Upper bound on a request body, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            scratch_dir: PathBuf::from("temp"),
            max_upload_bytes: 100 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    /// Build a configuration from `PDFDESK_*` environment variables, falling
    /// back to [`AppConfig::default`] for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup(ENV_HOST) {
            config.host = parse_var(ENV_HOST, &host)?;
        }
        if let Some(port) = lookup(ENV_PORT) {
            config.port = parse_var(ENV_PORT, &port)?;
        }
        if let Some(dir) = lookup(ENV_SCRATCH_DIR) {
            if dir.trim().is_empty() {
                return Err(PdfdeskError::Config(format!("{ENV_SCRATCH_DIR} is empty")));
            }
            config.scratch_dir = PathBuf::from(dir);
        }
        if let Some(mb) = lookup(ENV_MAX_UPLOAD_MB) {
            let mb: usize = parse_var(ENV_MAX_UPLOAD_MB, &mb)?;
            config.max_upload_bytes = mb.saturating_mul(1024 * 1024);
        }

        Ok(config)
    }

    /// Socket address for the listener.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| PdfdeskError::Config(format!("{name}={raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.scratch_dir, PathBuf::from("temp"));
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:8000");
    }

    #[test]
    fn overrides_from_environment() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (ENV_HOST, "127.0.0.1"),
            (ENV_PORT, "9090"),
            (ENV_SCRATCH_DIR, "/var/tmp/pdfdesk"),
            (ENV_MAX_UPLOAD_MB, "5"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:9090");
        assert_eq!(config.scratch_dir, PathBuf::from("/var/tmp/pdfdesk"));
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[(ENV_PORT, "eighty")])).unwrap_err();
        assert!(matches!(err, PdfdeskError::Config(_)));
        assert!(err.to_string().contains(ENV_PORT));
    }

    #[test]
    fn empty_scratch_dir_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[(ENV_SCRATCH_DIR, "  ")])).unwrap_err();
        assert!(matches!(err, PdfdeskError::Config(_)));
    }
}
