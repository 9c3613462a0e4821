use std::collections::HashMap;
use std::sync::Arc;

use gattwire_codec::PacketSchema;
use tracing::debug;

use crate::access::{AccessLevel, AccessLevels};
use crate::config::RegistryConfig;
use crate::endpoint::{Endpoint, EndpointKey};
use crate::error::{RegistryError, Result};

/// Schema handle stored per (endpoint, level). Identity is the schema name.
pub type SchemaType = Arc<PacketSchema>;

/// Endpoint-keyed matrix of access-level bindings.
///
/// Each endpoint holds up to four independent bindings, one per
/// [`AccessLevel`], and they may name different schemas. The endpoint entry
/// is kept for as long as at least one level is bound.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    endpoints: HashMap<EndpointKey, Endpoint>,
    bindings: [HashMap<EndpointKey, SchemaType>; 4],
    config: RegistryConfig,
}

impl EndpointRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self {
            endpoints: HashMap::new(),
            bindings: Default::default(),
            config: RegistryConfig::default(),
        }
    }

    /// Create an empty registry with explicit config.
    ///
    /// Fails if `config.default_levels` is empty.
    pub fn with_config(config: RegistryConfig) -> Result<Self> {
        if config.default_levels.is_empty() {
            return Err(RegistryError::EmptyLevelSet);
        }
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Bind `schema` under the configured default levels (read, acknowledged
    /// write and notify unless configured otherwise).
    pub fn register_endpoint(&mut self, endpoint: &Endpoint, schema: SchemaType) {
        let levels = self.config.default_levels;
        self.bind_all(endpoint, &schema, levels);
    }

    /// Bind `schema` under exactly one level. Other levels are untouched.
    pub fn register_endpoint_level(
        &mut self,
        endpoint: &Endpoint,
        schema: SchemaType,
        level: AccessLevel,
    ) {
        self.bind_all(endpoint, &schema, AccessLevels::only(level));
    }

    /// Bind `schema` under each level of `levels`.
    pub fn register_endpoint_levels(
        &mut self,
        endpoint: &Endpoint,
        schema: SchemaType,
        levels: AccessLevels,
    ) -> Result<()> {
        if levels.is_empty() {
            return Err(RegistryError::EmptyLevelSet);
        }
        self.bind_all(endpoint, &schema, levels);
        Ok(())
    }

    fn bind_all(&mut self, endpoint: &Endpoint, schema: &SchemaType, levels: AccessLevels) {
        let key = endpoint.key();
        for level in levels.iter() {
            let previous = self.bindings[level.index()].insert(key.clone(), Arc::clone(schema));
            debug!(
                key = %key,
                level = %level,
                schema = schema.name(),
                replaced = previous.is_some(),
                "endpoint level bound"
            );
        }
        self.endpoints.insert(key, endpoint.clone());
    }

    /// Remove every binding of `endpoint` along with the endpoint itself.
    pub fn unregister_endpoint(&mut self, endpoint: &Endpoint) {
        let key = endpoint.key();
        for level in AccessLevel::ALL {
            self.bindings[level.index()].remove(&key);
        }
        if self.endpoints.remove(&key).is_some() {
            debug!(key = %key, "endpoint unregistered");
        }
    }

    /// Remove one binding. The endpoint is pruned once no level is bound.
    pub fn unregister_endpoint_level(&mut self, endpoint: &Endpoint, level: AccessLevel) {
        let key = endpoint.key();
        if self.bindings[level.index()].remove(&key).is_some() {
            debug!(key = %key, level = %level, "endpoint level unbound");
        }

        let still_bound = AccessLevel::ALL
            .iter()
            .any(|level| self.bindings[level.index()].contains_key(&key));
        if !still_bound && self.endpoints.remove(&key).is_some() {
            debug!(key = %key, "endpoint pruned");
        }
    }

    pub fn is_registered(&self, endpoint: &Endpoint, level: AccessLevel) -> bool {
        self.bindings[level.index()].contains_key(&endpoint.key())
    }

    /// Levels bound for `endpoint`, in enumeration order.
    pub fn access_levels(&self, endpoint: &Endpoint) -> AccessLevels {
        self.levels_for(&endpoint.key())
    }

    pub fn access_levels_by_id(&self, service_id: &str, characteristic_id: &str) -> AccessLevels {
        self.levels_for(&EndpointKey::new(service_id, characteristic_id))
    }

    fn levels_for(&self, key: &EndpointKey) -> AccessLevels {
        AccessLevel::ALL
            .into_iter()
            .filter(|level| self.bindings[level.index()].contains_key(key))
            .collect()
    }

    /// Resolve raw identifiers to the registered endpoint, ignoring case.
    pub fn registered_endpoint(
        &self,
        service_id: &str,
        characteristic_id: &str,
    ) -> Option<Endpoint> {
        self.endpoints
            .get(&EndpointKey::new(service_id, characteristic_id))
            .cloned()
    }

    /// Schema bound for raw identifiers under `level`.
    pub fn registered_endpoint_type(
        &self,
        service_id: &str,
        characteristic_id: &str,
        level: AccessLevel,
    ) -> Option<SchemaType> {
        self.bindings[level.index()]
            .get(&EndpointKey::new(service_id, characteristic_id))
            .cloned()
    }

    /// Schema bound for `endpoint` under `level`.
    pub fn schema_for(&self, endpoint: &Endpoint, level: AccessLevel) -> Option<SchemaType> {
        self.bindings[level.index()].get(&endpoint.key()).cloned()
    }

    /// All registered endpoints, sorted by key.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        let mut entries: Vec<(&EndpointKey, &Endpoint)> = self.endpoints.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, endpoint)| endpoint.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(name: &str) -> SchemaType {
        Arc::new(PacketSchema::builder(name).u8("value", 0).build().unwrap())
    }

    fn heart_rate() -> Endpoint {
        Endpoint::new("180d", "2a37")
    }

    #[test]
    fn default_registration_binds_three_levels() {
        let mut registry = EndpointRegistry::new();
        registry.register_endpoint(&heart_rate(), schema("HeartRate"));

        let levels: Vec<AccessLevel> = registry.access_levels(&heart_rate()).iter().collect();
        assert_eq!(
            levels,
            vec![
                AccessLevel::Read,
                AccessLevel::WriteWithResponse,
                AccessLevel::Notify
            ]
        );
        assert!(!registry.is_registered(&heart_rate(), AccessLevel::WriteNoResponse));
    }

    #[test]
    fn unregistering_unbound_level_keeps_others() {
        let mut registry = EndpointRegistry::new();
        registry.register_endpoint_level(&heart_rate(), schema("HeartRate"), AccessLevel::Read);

        registry.unregister_endpoint_level(&heart_rate(), AccessLevel::WriteNoResponse);

        assert!(registry.is_registered(&heart_rate(), AccessLevel::Read));
        assert!(registry.registered_endpoint("180d", "2a37").is_some());
    }

    #[test]
    fn unregistering_last_level_prunes_endpoint() {
        let mut registry = EndpointRegistry::new();
        registry.register_endpoint_level(&heart_rate(), schema("HeartRate"), AccessLevel::Read);

        registry.unregister_endpoint_level(&heart_rate(), AccessLevel::Read);

        assert!(registry.access_levels(&heart_rate()).is_empty());
        assert!(registry.registered_endpoint("180d", "2a37").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn unacknowledged_write_alone_keeps_endpoint_alive() {
        let mut registry = EndpointRegistry::new();
        registry.register_endpoint_level(&heart_rate(), schema("Cmd"), AccessLevel::Read);
        registry.register_endpoint_level(
            &heart_rate(),
            schema("Cmd"),
            AccessLevel::WriteNoResponse,
        );

        registry.unregister_endpoint_level(&heart_rate(), AccessLevel::Read);

        assert!(registry.registered_endpoint("180d", "2a37").is_some());
        assert_eq!(
            registry.access_levels(&heart_rate()),
            AccessLevels::only(AccessLevel::WriteNoResponse)
        );
    }

    #[test]
    fn levels_hold_independent_schemas() {
        let mut registry = EndpointRegistry::new();
        registry.register_endpoint_level(&heart_rate(), schema("Reading"), AccessLevel::Notify);
        registry.register_endpoint_level(
            &heart_rate(),
            schema("Command"),
            AccessLevel::WriteWithResponse,
        );

        let notify = registry
            .registered_endpoint_type("180d", "2a37", AccessLevel::Notify)
            .unwrap();
        let write = registry
            .registered_endpoint_type("180d", "2a37", AccessLevel::WriteWithResponse)
            .unwrap();
        assert_eq!(notify.name(), "Reading");
        assert_eq!(write.name(), "Command");
        assert!(registry
            .registered_endpoint_type("180d", "2a37", AccessLevel::Read)
            .is_none());
    }

    #[test]
    fn rebinding_replaces_only_that_level() {
        let mut registry = EndpointRegistry::new();
        registry.register_endpoint(&heart_rate(), schema("V1"));
        registry.register_endpoint(&heart_rate(), schema("V1"));
        registry.register_endpoint_level(&heart_rate(), schema("V2"), AccessLevel::Notify);

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry
                .schema_for(&heart_rate(), AccessLevel::Read)
                .unwrap()
                .name(),
            "V1"
        );
        assert_eq!(
            registry
                .schema_for(&heart_rate(), AccessLevel::Notify)
                .unwrap()
                .name(),
            "V2"
        );
    }

    #[test]
    fn lookups_by_raw_ids_ignore_case() {
        let mut registry = EndpointRegistry::new();
        registry.register_endpoint(&Endpoint::new("180D", "2A37"), schema("HeartRate"));

        let found = registry.registered_endpoint("180d", "2a37").unwrap();
        assert_eq!(found, Endpoint::new("180D", "2A37"));
        assert_eq!(
            registry.access_levels_by_id("180d", "2a37"),
            AccessLevels::DEFAULT
        );
    }

    #[test]
    fn unregister_endpoint_removes_everything() {
        let mut registry = EndpointRegistry::new();
        registry.register_endpoint(&heart_rate(), schema("HeartRate"));
        registry.register_endpoint_level(
            &heart_rate(),
            schema("HeartRate"),
            AccessLevel::WriteNoResponse,
        );

        registry.unregister_endpoint(&heart_rate());
        registry.unregister_endpoint(&heart_rate());

        assert!(registry.is_empty());
        for level in AccessLevel::ALL {
            assert!(!registry.is_registered(&heart_rate(), level));
        }
    }

    #[test]
    fn endpoints_are_sorted_by_key() {
        let mut registry = EndpointRegistry::new();
        registry.register_endpoint(&Endpoint::new("180f", "2a19"), schema("Battery"));
        registry.register_endpoint(&Endpoint::new("180d", "2a37"), schema("HeartRate"));

        let keys: Vec<String> = registry
            .endpoints()
            .iter()
            .map(|endpoint| endpoint.key().to_string())
            .collect();
        assert_eq!(keys, vec!["180D.2A37", "180F.2A19"]);
    }

    #[test]
    fn empty_level_sets_are_rejected() {
        let mut registry = EndpointRegistry::new();
        let err = registry
            .register_endpoint_levels(&heart_rate(), schema("HeartRate"), AccessLevels::EMPTY)
            .unwrap_err();
        assert_eq!(err, RegistryError::EmptyLevelSet);
        assert!(registry.is_empty());

        let config = RegistryConfig {
            default_levels: AccessLevels::EMPTY,
        };
        assert!(EndpointRegistry::with_config(config).is_err());
    }

    #[test]
    fn configured_default_levels_apply() {
        let config = RegistryConfig {
            default_levels: AccessLevels::only(AccessLevel::Notify),
        };
        let mut registry = EndpointRegistry::with_config(config).unwrap();
        registry.register_endpoint(&heart_rate(), schema("HeartRate"));

        assert_eq!(
            registry.access_levels(&heart_rate()),
            AccessLevels::only(AccessLevel::Notify)
        );
    }
}
