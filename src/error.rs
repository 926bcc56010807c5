use thiserror::Error;

/// Failures surfaced by the probing engines.
///
/// Cancellation is not an error: a cancelled operation returns its
/// partial results through the normal success path.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("invalid IPv4 address: {0}")]
    InvalidAddress(String),

    #[error("prefix length {0} is outside 0-32")]
    InvalidPrefix(u8),

    #[error("invalid IP range or CIDR: {0}")]
    InvalidTarget(String),

    #[error("target {target} covers {count} addresses (max {max})")]
    RangeTooLarge { target: String, count: u64, max: u64 },

    #[error("Hostname is empty")]
    EmptyHostname,

    #[error("no ports to scan")]
    NoPorts,

    #[error("invalid port specification: {0}")]
    InvalidPort(String),

    #[error("resolution failed: {0}")]
    Resolution(String),

    #[error("timed out after {0}ms")]
    Timeout(u64),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    /// Malformed request, rejected before any network activity.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ProbeError::InvalidAddress(_)
                | ProbeError::InvalidPrefix(_)
                | ProbeError::InvalidTarget(_)
                | ProbeError::RangeTooLarge { .. }
                | ProbeError::EmptyHostname
                | ProbeError::NoPorts
                | ProbeError::InvalidPort(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_classification() {
        assert!(ProbeError::EmptyHostname.is_input_error());
        assert!(ProbeError::InvalidPrefix(40).is_input_error());
        assert!(!ProbeError::Timeout(500).is_input_error());
        assert!(!ProbeError::Resolution("NXDOMAIN".into()).is_input_error());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(ProbeError::EmptyHostname.to_string(), "Hostname is empty");
        assert_eq!(ProbeError::Timeout(1500).to_string(), "timed out after 1500ms");
    }
}
