use gattwire_registry::RegistryConfig;
use serde::{Deserialize, Serialize};

/// How inbound events for unknown endpoints or unbound levels are reported.
///
/// Either way the event is discarded without invoking any callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnroutablePolicy {
    /// Log at `trace`.
    #[default]
    Drop,
    /// Log at `warn`.
    Log,
}

/// Router behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterConfig {
    pub unroutable: UnroutablePolicy,
    /// Refuse writes whose encoding dropped any field.
    pub strict_encode: bool,
    pub registry: RegistryConfig,
}
