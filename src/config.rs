//! Bridge configuration - passed in by the UI shell at session start.
//!
//! The cluster is fixed for the life of a session; there is no runtime switch.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Target cluster. Only networks with an airdrop faucet are listed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cluster {
    #[default]
    Devnet,
    Testnet,
    Localnet,
    Custom(String),
}

impl Cluster {
    pub fn url(&self) -> &str {
        match self {
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::Localnet => "http://127.0.0.1:8899",
            Cluster::Custom(url) => url,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
            Cluster::Localnet => "localnet",
            Cluster::Custom(url) => url,
        }
    }
}

impl FromStr for Cluster {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            "localnet" | "localhost" => Ok(Cluster::Localnet),
            lower if lower.starts_with("http://") || lower.starts_with("https://") => {
                Ok(Cluster::Custom(trimmed.to_string()))
            }
            _ => Err(ConfigError::Invalid { key: "cluster", value: value.to_string() }),
        }
    }
}

/// Commitment level a confirmation wait must reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }

    /// Whether a status reported by the cluster is at least this level.
    pub fn is_satisfied_by(&self, reported: Commitment) -> bool {
        reported >= *self
    }
}

impl FromStr for Commitment {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            _ => Err(ConfigError::Invalid { key: "commitment", value: value.to_string() }),
        }
    }
}

/// Bridge configuration. Higher layers construct this.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub cluster: Cluster,
    pub commitment: Commitment,
    /// How long a submitted signature may take to reach `commitment`.
    pub confirm_timeout: Duration,
    pub poll_interval: Duration,
    /// Upper bound on a single JSON-RPC round trip.
    pub request_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            cluster: Cluster::default(),
            commitment: Commitment::default(),
            confirm_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl BridgeConfig {
    pub fn new(cluster: Cluster) -> Self {
        Self { cluster, ..Default::default() }
    }
    pub fn devnet() -> Self { Self::new(Cluster::Devnet) }
    pub fn localnet() -> Self { Self::new(Cluster::Localnet) }
    pub fn with_commitment(mut self, c: Commitment) -> Self { self.commitment = c; self }
    pub fn with_confirm_timeout(mut self, d: Duration) -> Self { self.confirm_timeout = d; self }
    pub fn with_poll_interval(mut self, d: Duration) -> Self { self.poll_interval = d; self }
    pub fn with_request_timeout(mut self, d: Duration) -> Self { self.request_timeout = d; self }

    /// Defaults overridden by `SOLBRIDGE_CLUSTER`, `SOLBRIDGE_COMMITMENT` and
    /// `SOLBRIDGE_CONFIRM_TIMEOUT_SECS`. Empty variables count as unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();
        if let Some(value) = get("SOLBRIDGE_CLUSTER") {
            config.cluster = value.parse()?;
        }
        if let Some(value) = get("SOLBRIDGE_COMMITMENT") {
            config.commitment = value.parse()?;
        }
        if let Some(value) = get("SOLBRIDGE_CONFIRM_TIMEOUT_SECS") {
            let secs: u64 = value.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "SOLBRIDGE_CONFIRM_TIMEOUT_SECS",
                value: value.clone(),
            })?;
            config.confirm_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}
