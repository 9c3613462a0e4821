use std::fmt;

use serde::{Deserialize, Serialize};

/// A logical channel: one characteristic of one service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub service_id: String,
    pub characteristic_id: String,
}

impl Endpoint {
    pub fn new(service_id: impl Into<String>, characteristic_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            characteristic_id: characteristic_id.into(),
        }
    }

    pub fn key(&self) -> EndpointKey {
        EndpointKey::new(&self.service_id, &self.characteristic_id)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.service_id, self.characteristic_id)
    }
}

/// Case-insensitive lookup key for an endpoint.
///
/// Formed as `SERVICE.CHARACTERISTIC` in upper case, so identifiers that
/// differ only in case address the same endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointKey(String);

impl EndpointKey {
    pub fn new(service_id: &str, characteristic_id: &str) -> Self {
        Self(format!("{service_id}.{characteristic_id}").to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Endpoint> for EndpointKey {
    fn from(endpoint: &Endpoint) -> Self {
        endpoint.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_upper_cased_and_dotted() {
        let endpoint = Endpoint::new("180d", "2a37");
        assert_eq!(endpoint.key().as_str(), "180D.2A37");
    }

    #[test]
    fn keys_ignore_identifier_case() {
        let lower = Endpoint::new("0000180d-0000", "2a37");
        let upper = Endpoint::new("0000180D-0000", "2A37");
        assert_ne!(lower, upper);
        assert_eq!(lower.key(), upper.key());
        assert_eq!(EndpointKey::new("0000180d-0000", "2a37"), upper.key());
    }
}
