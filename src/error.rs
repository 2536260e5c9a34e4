// file: src/error.rs
// version: 3.0.0
// guid: 64eccdc0-f767-4969-a56f-343a56bfd383

use thiserror::Error;

/// Result type alias for the installer configuration engine
pub type Result<T> = std::result::Result<T, InstallerError>;

/// Operator-facing configuration problems. Always surfaced verbatim and always
/// raised before any stage document is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown mode: {0:?}")]
    UnknownMode(String),

    #[error("server URL must be empty in create mode")]
    ModeCreateContainsServerUrl,

    #[error("server URL must be specified in join mode")]
    ModeJoinServerUrlNotSpecified,

    #[error("token not specified")]
    TokenNotSpecified,

    #[error("no SSH authorized keys or password are set")]
    NoCredentials,

    #[error("forceGpt and forceMbr can not be set at the same time")]
    ConflictingPartitionTable,

    #[error("no management interface specified")]
    MgmtInterfaceNotSpecified,

    #[error("interface not specified")]
    InterfaceNotSpecified,

    #[error("interface not found: {0}")]
    InterfaceNotFound(String),

    #[error("interface is a loopback interface: {0}")]
    InterfaceIsLoopback(String),

    #[error("device not specified")]
    DeviceNotSpecified,

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("data disk not found: {0}")]
    DataDiskNotFound(String),

    #[error("data disk must not be the installation device: {0}")]
    DataDiskIsInstallDevice(String),

    #[error("unknown network method: {0:?}")]
    UnknownNetworkMethod(String),

    #[error("must specify {0} in static method")]
    StaticFieldNotSpecified(&'static str),

    #[error("invalid IPv4 address for {field}: {value:?}")]
    InvalidIpv4 { field: &'static str, value: String },
}

/// Disk and partition size problems
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizingError {
    #[error("disk is too small: {size_gib}GiB, at least {min_gib}GiB is required")]
    DiskTooSmall { size_gib: u64, min_gib: u64 },

    #[error("invalid partition size: {0:?}")]
    MalformedSize(String),

    #[error("unsupported partition size unit {unit:?} in {size:?}, use Mi or Gi")]
    InvalidUnit { size: String, unit: String },

    #[error("partition size must not be negative: {0:?}")]
    NegativeSize(String),

    #[error("partition size is too small: {size_mib}MiB, minimum is {min_mib}MiB")]
    TooSmall { size_mib: u64, min_mib: u64 },

    #[error("partition size is too large: {size_mib}MiB, maximum is {max_mib}MiB")]
    TooLarge { size_mib: u64, max_mib: u64 },
}

/// Error types for the installer configuration engine
#[derive(Error, Debug)]
pub enum InstallerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Sizing(#[from] SizingError),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("Render error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("unsupported network method: {0:?}")]
    UnsupportedNetworkMethod(String),

    #[error("network interface name is not resolved (hwAddr {0:?})")]
    UnresolvedInterface(String),

    #[error("{0}")]
    LabelSyntax(String),

    #[error("unknown webhook event: {0:?}")]
    UnknownEvent(String),

    #[error("unknown HTTP method: {0:?}")]
    UnknownMethod(String),

    #[error("cannot convert a non-struct value to environment variables: {0}")]
    NotAStruct(String),

    #[error("Webhook error: {0}")]
    Webhook(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("System error: {0}")]
    System(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl InstallerError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a new system error
    pub fn system(msg: impl Into<String>) -> Self {
        Self::System(msg.into())
    }

    /// Create a new webhook delivery error
    pub fn webhook(msg: impl Into<String>) -> Self {
        Self::Webhook(msg.into())
    }

    /// Create a new label syntax error
    pub fn label_syntax(msg: impl Into<String>) -> Self {
        Self::LabelSyntax(msg.into())
    }

    /// The validation condition behind this error, if any
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }

    /// The sizing condition behind this error, if any
    pub fn as_sizing(&self) -> Option<&SizingError> {
        match self {
            Self::Sizing(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages_name_the_value() {
        let err = InstallerError::from(ValidationError::UnknownMode("restore".to_string()));
        assert_eq!(err.to_string(), "unknown mode: \"restore\"");

        let err = ValidationError::StaticFieldNotSpecified("gateway");
        assert_eq!(err.to_string(), "must specify gateway in static method");
    }

    #[test]
    fn test_as_validation() {
        let err = InstallerError::from(ValidationError::TokenNotSpecified);
        assert_eq!(err.as_validation(), Some(&ValidationError::TokenNotSpecified));
        assert!(err.as_sizing().is_none());

        let err = InstallerError::config("bad");
        assert!(err.as_validation().is_none());
    }
}
