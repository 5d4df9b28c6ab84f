//! TOML configuration for a replica node.

use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;
use tessera_codec::StaticIndexCatalog;
use tessera_collector::CollectorConfig;
use tessera_erasure::MAX_TOTAL_SPLITS;
use tessera_types::ErasureConfig;

use crate::error::ConfigError;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// This member's identity and listen address.
    pub node: NodeSection,
    /// Replica-set membership.
    pub cluster: ClusterSection,
    /// Erasure coding parameters.
    pub erasure: ErasureSection,
    /// Split collection tuning.
    pub collector: CollectorConfig,
    /// Fields kept in plaintext.
    pub index: IndexSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[node]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NodeSection {
    /// Position of this member in `cluster.members`; also its split index.
    pub self_index: usize,
    /// Address the split server listens on.
    pub listen_addr: String,
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            self_index: 0,
            listen_addr: "0.0.0.0:4820".to_string(),
        }
    }
}

/// `[cluster]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClusterSection {
    /// Addresses of every member, this one included, in split-index order.
    pub members: Vec<String>,
}

/// `[erasure]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ErasureSection {
    /// Number of source splits.
    pub k: Option<usize>,
    /// Total number of splits. Must equal the member count.
    pub m: Option<usize>,
}

/// `[index]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IndexSection {
    /// Names of indexed fields. Matching is exact.
    pub fields: Vec<String>,
}

impl Default for IndexSection {
    fn default() -> Self {
        Self {
            fields: vec!["_id".to_string()],
        }
    }
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl NodeConfig {
    /// Load and validate config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate config from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: NodeConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-section consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let members = self.members()?;
        self.listen_addr()?;
        if members.is_empty() {
            return Err(ConfigError::Invalid("cluster.members is empty".into()));
        }
        if self.node.self_index >= members.len() {
            return Err(ConfigError::Invalid(format!(
                "node.self_index {} out of range for {} members",
                self.node.self_index,
                members.len()
            )));
        }
        let ErasureConfig { k, m } = self.erasure_config();
        if m != members.len() {
            return Err(ConfigError::Invalid(format!(
                "erasure.m={m} but {} members (one split per member)",
                members.len()
            )));
        }
        if k == 0 || k > m || m > MAX_TOTAL_SPLITS {
            return Err(ConfigError::Invalid(format!(
                "need 1 <= k <= m <= {MAX_TOTAL_SPLITS}, got k={k}, m={m}"
            )));
        }
        Ok(())
    }

    /// Parsed listen address.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_addr(&self.node.listen_addr)
    }

    /// Parsed member addresses.
    pub fn members(&self) -> Result<Vec<SocketAddr>, ConfigError> {
        self.cluster.members.iter().map(|s| parse_addr(s)).collect()
    }

    /// Effective source split count (defaults to 2, clamped to the member count).
    pub fn erasure_k(&self) -> usize {
        self.erasure
            .k
            .unwrap_or_else(|| 2.min(self.cluster.members.len()))
    }

    /// Effective total split count (defaults to the member count).
    pub fn erasure_m(&self) -> usize {
        self.erasure.m.unwrap_or(self.cluster.members.len())
    }

    /// Effective `(k, m)`.
    pub fn erasure_config(&self) -> ErasureConfig {
        ErasureConfig::new(self.erasure_k(), self.erasure_m())
    }

    /// Index catalog built from `[index].fields`.
    pub fn index_catalog(&self) -> StaticIndexCatalog {
        StaticIndexCatalog::new(self.index.fields.iter().cloned())
    }
}

fn parse_addr(s: &str) -> Result<SocketAddr, ConfigError> {
    s.parse()
        .map_err(|e| ConfigError::Invalid(format!("bad address {s:?}: {e}")))
}
