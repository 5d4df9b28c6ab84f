//! Error types for the replica node.

/// Errors that can occur while loading node configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for [`NodeConfig`](crate::NodeConfig).
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is present but unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors that can occur during node operations.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Document codec error.
    #[error("codec error: {0}")]
    Codec(#[from] tessera_codec::CodecError),

    /// Erasure coding error.
    #[error("erasure error: {0}")]
    Erasure(#[from] tessera_erasure::ErasureError),

    /// Split collection failed.
    #[error("collect error: {0}")]
    Collect(#[from] tessera_collector::CollectError),
}
