use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Configuration file not found. Checked:\n\
        - current directory: scylla.local.kdl, scylla.kdl, .scylla.kdl\n\
        - ./.scylla-cloud/ directory\n\
        - ~/.config/scylla-cloud/scylla.kdl\n\
        A path can also be given with the SCYLLA_CLOUD_CONFIG environment variable"
    )]
    ConfigFileNotFound,

    #[error("KDL parse error: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown attribute {attribute:?} in cluster {cluster:?}")]
    UnknownAttribute { cluster: String, attribute: String },

    #[error("invalid duration {0:?}, expected a number followed by s, m or h")]
    InvalidDuration(String),

    #[error("no API token configured: set `token` in the provider node or SCYLLA_CLOUD_TOKEN")]
    MissingToken,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
