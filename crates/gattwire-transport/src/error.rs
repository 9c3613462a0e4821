/// Errors reported by a transport operation.
///
/// Every variant carries a human-readable description. [`TransportError::tag`]
/// gives the short operation tag used in logs and CLI output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Scanning for nearby devices failed or was aborted.
    #[error("scan failed: {0}")]
    Scan(String),

    /// Connecting to a device failed.
    #[error("failed to connect to {device}: {description}")]
    Connect { device: String, description: String },

    /// The device id is not known to the transport.
    #[error("device {0} not found")]
    DeviceNotFound(String),

    /// Reading a characteristic failed.
    #[error("read failed on {device}: {description}")]
    Read { device: String, description: String },

    /// Writing a characteristic failed.
    #[error("write failed on {device}: {description}")]
    Write { device: String, description: String },

    /// Enabling or disabling notifications failed.
    #[error("notify toggle failed on {device}: {description}")]
    Notify { device: String, description: String },

    /// Disconnecting from a device failed.
    #[error("failed to disconnect from {device}: {description}")]
    Disconnect { device: String, description: String },

    /// The transport has been shut down.
    #[error("transport shut down")]
    Shutdown,
}

impl TransportError {
    /// Short operation tag for this error.
    pub fn tag(&self) -> &'static str {
        match self {
            TransportError::Scan(_) => "scanError",
            TransportError::Connect { .. } => "connect",
            TransportError::DeviceNotFound(_) => "connectToDevice",
            TransportError::Read { .. } => "read",
            TransportError::Write { .. } => "write",
            TransportError::Notify { .. } => "notify",
            TransportError::Disconnect { .. } => "disconnect",
            TransportError::Shutdown => "shutdown",
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_name_the_failed_operation() {
        assert_eq!(TransportError::Scan("timeout".into()).tag(), "scanError");
        assert_eq!(
            TransportError::DeviceNotFound("AA".into()).tag(),
            "connectToDevice"
        );
        let err = TransportError::Write {
            device: "AA".into(),
            description: "gatt busy".into(),
        };
        assert_eq!(err.tag(), "write");
        assert_eq!(err.to_string(), "write failed on AA: gatt busy");
    }
}
