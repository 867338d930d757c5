use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::desec::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8443";

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Config {
    pub group_name: String,
    pub listen_addr: SocketAddr,
    pub api_url: String,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let group_name = lookup("GROUP_NAME")
            .filter(|group_name| !group_name.is_empty())
            .ok_or_else(|| anyhow::anyhow!("GROUP_NAME must be specified"))?;

        let listen_addr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("invalid LISTEN_ADDR")?;

        let api_url = lookup("DESEC_API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout = match lookup("DESEC_TIMEOUT_SECS") {
            None => DEFAULT_TIMEOUT,
            Some(secs) => {
                Duration::from_secs(secs.parse::<u64>().context("invalid DESEC_TIMEOUT_SECS")?)
            }
        };

        Ok(Self {
            group_name,
            listen_addr,
            api_url,
            timeout,
        })
    }
}
