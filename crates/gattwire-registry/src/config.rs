use crate::access::AccessLevels;

/// Controls registry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Levels bound by [`crate::EndpointRegistry::register_endpoint`].
    /// Must not be empty.
    pub default_levels: AccessLevels,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_levels: AccessLevels::DEFAULT,
        }
    }
}
