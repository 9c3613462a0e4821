use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A peripheral discovered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Device {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }

    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
        }
    }
}

/// Whether a write expects an acknowledgement from the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckMode {
    /// Write with response.
    Acknowledged,
    /// Write without response.
    Unacknowledged,
}

impl AckMode {
    pub fn is_acknowledged(self) -> bool {
        matches!(self, AckMode::Acknowledged)
    }
}

/// An outbound characteristic write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    pub device_id: String,
    pub service_id: String,
    pub characteristic_id: String,
    pub bytes: Bytes,
    pub ack: AckMode,
}

/// Which devices a scan should report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScanFilter {
    /// Report every named device.
    #[default]
    Any,
    /// Report devices advertising at least one of these services.
    Services(Vec<String>),
    /// Report devices whose advertised name contains this text.
    NameContains(String),
}

impl ScanFilter {
    /// Returns true if a device with these properties passes the filter.
    pub fn matches(&self, name: Option<&str>, services: &[String]) -> bool {
        match self {
            ScanFilter::Any => true,
            ScanFilter::Services(wanted) => wanted
                .iter()
                .any(|w| services.iter().any(|s| s.eq_ignore_ascii_case(w))),
            ScanFilter::NameContains(text) => name.is_some_and(|n| n.contains(text.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_filter_matching() {
        let services = vec!["180D".to_string()];
        assert!(ScanFilter::Any.matches(None, &[]));
        assert!(ScanFilter::Services(vec!["180d".into()]).matches(None, &services));
        assert!(!ScanFilter::Services(vec!["180F".into()]).matches(None, &services));
        assert!(ScanFilter::NameContains("HR".into()).matches(Some("Polar HR"), &[]));
        assert!(!ScanFilter::NameContains("HR".into()).matches(None, &[]));
    }

    #[test]
    fn ack_mode_flags() {
        assert!(AckMode::Acknowledged.is_acknowledged());
        assert!(!AckMode::Unacknowledged.is_acknowledged());
    }
}
