use std::sync::Arc;

use bytes::Bytes;
use gattwire_codec::{
    decode, encode, DecodedValue, DroppedField, EncodeOutcome, FieldValues, Packet,
};
use gattwire_registry::{AccessLevel, AccessLevels, Endpoint, EndpointRegistry, SchemaType};
use gattwire_transport::{AckMode, ScanFilter, Transport, WriteRequest};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

use crate::config::{RouterConfig, UnroutablePolicy};
use crate::delegate::Delegate;
use crate::error::{Result, RouterError};
use crate::event::{DispatchOutcome, InboundEvent, SubscriberOutcome, TransportEvent, Unroutable};
use crate::subscriber::SubscriberDirectory;

#[derive(Debug)]
struct State {
    registry: EndpointRegistry,
    subscribers: SubscriberDirectory,
}

/// What a write actually sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub endpoint: Endpoint,
    pub device_id: String,
    pub ack: AckMode,
    pub bytes: Bytes,
    /// Fields left out of `bytes`. Always empty in strict mode.
    pub dropped: Vec<DroppedField>,
}

/// Routes values between a [`Transport`] and registered endpoints.
///
/// Registration and subscription calls may come from any thread, including
/// from inside callbacks. Inbound events are dispatched one at a time; a
/// callback must not call [`Router::deliver`] or [`Router::handle_event`]
/// itself.
pub struct Router<T: Transport> {
    transport: T,
    state: RwLock<State>,
    delegate: RwLock<Option<Arc<dyn Delegate>>>,
    dispatch: Mutex<()>,
    config: RouterConfig,
}

impl<T: Transport> Router<T> {
    /// Create a router with default config.
    pub fn new(transport: T) -> Self {
        Self::build(transport, EndpointRegistry::new(), RouterConfig::default())
    }

    /// Create a router with explicit config.
    pub fn with_config(transport: T, config: RouterConfig) -> Result<Self> {
        let registry = EndpointRegistry::with_config(config.registry)?;
        Ok(Self::build(transport, registry, config))
    }

    fn build(transport: T, registry: EndpointRegistry, config: RouterConfig) -> Self {
        Self {
            transport,
            state: RwLock::new(State {
                registry,
                subscribers: SubscriberDirectory::new(),
            }),
            delegate: RwLock::new(None),
            dispatch: Mutex::new(()),
            config,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn set_delegate(&self, delegate: Arc<dyn Delegate>) {
        *self.delegate.write() = Some(delegate);
    }

    pub fn clear_delegate(&self) {
        *self.delegate.write() = None;
    }

    // --- registry ---

    /// Bind `schema` under the default levels.
    pub fn register_endpoint(&self, endpoint: &Endpoint, schema: SchemaType) {
        self.state.write().registry.register_endpoint(endpoint, schema);
    }

    /// Bind `P`'s schema under the default levels.
    pub fn register<P: Packet>(&self, endpoint: &Endpoint) {
        self.register_endpoint(endpoint, P::schema());
    }

    pub fn register_endpoint_level(
        &self,
        endpoint: &Endpoint,
        schema: SchemaType,
        level: AccessLevel,
    ) {
        self.state
            .write()
            .registry
            .register_endpoint_level(endpoint, schema, level);
    }

    pub fn register_endpoint_levels(
        &self,
        endpoint: &Endpoint,
        schema: SchemaType,
        levels: AccessLevels,
    ) -> Result<()> {
        self.state
            .write()
            .registry
            .register_endpoint_levels(endpoint, schema, levels)?;
        Ok(())
    }

    pub fn unregister_endpoint(&self, endpoint: &Endpoint) {
        self.state.write().registry.unregister_endpoint(endpoint);
    }

    pub fn unregister_endpoint_level(&self, endpoint: &Endpoint, level: AccessLevel) {
        self.state
            .write()
            .registry
            .unregister_endpoint_level(endpoint, level);
    }

    pub fn is_registered(&self, endpoint: &Endpoint, level: AccessLevel) -> bool {
        self.state.read().registry.is_registered(endpoint, level)
    }

    pub fn access_levels(&self, endpoint: &Endpoint) -> AccessLevels {
        self.state.read().registry.access_levels(endpoint)
    }

    pub fn access_levels_by_id(&self, service_id: &str, characteristic_id: &str) -> AccessLevels {
        self.state
            .read()
            .registry
            .access_levels_by_id(service_id, characteristic_id)
    }

    pub fn registered_endpoint(
        &self,
        service_id: &str,
        characteristic_id: &str,
    ) -> Option<Endpoint> {
        self.state
            .read()
            .registry
            .registered_endpoint(service_id, characteristic_id)
    }

    pub fn registered_endpoint_type(
        &self,
        service_id: &str,
        characteristic_id: &str,
        level: AccessLevel,
    ) -> Option<SchemaType> {
        self.state
            .read()
            .registry
            .registered_endpoint_type(service_id, characteristic_id, level)
    }

    /// All registered endpoints, sorted by key.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.state.read().registry.endpoints()
    }

    // --- subscribers ---

    pub fn subscribe<P, F>(&self, endpoint: &Endpoint, callback: F)
    where
        P: Packet,
        F: Fn(&str, P) + Send + Sync + 'static,
    {
        self.state
            .write()
            .subscribers
            .subscribe::<P, F>(endpoint, callback);
    }

    pub fn subscribe_schema<F>(&self, endpoint: &Endpoint, expected: SchemaType, callback: F)
    where
        F: Fn(&str, &DecodedValue) + Send + Sync + 'static,
    {
        self.state
            .write()
            .subscribers
            .subscribe_schema(endpoint, expected, callback);
    }

    pub fn unsubscribe(&self, endpoint: &Endpoint) -> bool {
        self.state.write().subscribers.unsubscribe(endpoint)
    }

    pub fn is_subscribed(&self, endpoint: &Endpoint) -> bool {
        self.state.read().subscribers.is_subscribed(endpoint)
    }

    // --- inbound ---

    /// Single entry point for transport callbacks.
    ///
    /// Returns the dispatch outcome for [`TransportEvent::Value`], `None` for
    /// lifecycle events.
    pub fn handle_event(&self, event: TransportEvent) -> Option<DispatchOutcome> {
        let event = match event {
            TransportEvent::Value(inbound) => return Some(self.deliver(inbound)),
            other => other,
        };

        let _dispatch = self.dispatch.lock();
        let delegate = self.delegate.read().clone();
        let Some(delegate) = delegate else {
            trace!(?event, "transport event with no delegate");
            return None;
        };
        match event {
            TransportEvent::DeviceFound(device) => delegate.on_device_found(&device),
            TransportEvent::Connected(device_id) => delegate.on_device_connected(&device_id),
            TransportEvent::Disconnected(device_id) => delegate.on_device_disconnected(&device_id),
            TransportEvent::ScanStateChanged(scanning) => delegate.on_scan_state_changed(scanning),
            TransportEvent::Value(_) => {}
        }
        None
    }

    /// Decode an inbound value and hand it to the subscriber and delegate.
    ///
    /// Unroutable events are discarded before decoding and no callback runs.
    pub fn deliver(&self, event: InboundEvent) -> DispatchOutcome {
        let _dispatch = self.dispatch.lock();

        let (endpoint, schema, binding) = {
            let state = self.state.read();
            let Some(endpoint) = state
                .registry
                .registered_endpoint(&event.service_id, &event.characteristic_id)
            else {
                return self.unroutable(&event, Unroutable::UnknownEndpoint);
            };
            let Some(schema) = state.registry.schema_for(&endpoint, event.access_level) else {
                return self.unroutable(&event, Unroutable::UnregisteredLevel);
            };
            let binding = state.subscribers.binding(&endpoint.key());
            (endpoint, schema, binding)
        };

        let value = decode(&event.bytes, &schema);
        trace!(
            key = %endpoint.key(),
            level = %event.access_level,
            schema = schema.name(),
            device = %event.device_id,
            fields = value.values().len(),
            "inbound value decoded"
        );

        let subscriber = match binding {
            Some(binding) => binding.dispatch(&event.device_id, &value),
            None => SubscriberOutcome::NoSubscriber,
        };

        let delegate = self.delegate.read().clone();
        if let Some(delegate) = delegate {
            delegate.on_value(&endpoint, &event.device_id, &value);
        }

        DispatchOutcome::Delivered { subscriber }
    }

    fn unroutable(&self, event: &InboundEvent, reason: Unroutable) -> DispatchOutcome {
        match self.config.unroutable {
            UnroutablePolicy::Drop => trace!(
                service = %event.service_id,
                characteristic = %event.characteristic_id,
                level = %event.access_level,
                device = %event.device_id,
                ?reason,
                "inbound value dropped"
            ),
            UnroutablePolicy::Log => warn!(
                service = %event.service_id,
                characteristic = %event.characteristic_id,
                level = %event.access_level,
                device = %event.device_id,
                ?reason,
                "inbound value dropped"
            ),
        }
        DispatchOutcome::Unroutable(reason)
    }

    // --- outbound ---

    /// Encode `value` with its own schema and write it.
    ///
    /// The write is acknowledged if the endpoint has `WriteWithResponse`
    /// bound, unacknowledged otherwise.
    pub fn write<P: Packet>(
        &self,
        endpoint: &Endpoint,
        value: &P,
        device_id: &str,
    ) -> Result<WriteReport> {
        let levels = self.access_levels(endpoint);
        self.send(endpoint, device_id, levels, value.encode())
    }

    /// Encode untyped values with the schema bound to the endpoint's write
    /// level (acknowledged preferred) and write them.
    pub fn write_values(
        &self,
        endpoint: &Endpoint,
        values: &FieldValues,
        device_id: &str,
    ) -> Result<WriteReport> {
        let (levels, schema) = {
            let state = self.state.read();
            let levels = state.registry.access_levels(endpoint);
            if levels.is_empty() {
                return Err(RouterError::NotRegistered(endpoint.to_string()));
            }
            let schema = state
                .registry
                .schema_for(endpoint, AccessLevel::WriteWithResponse)
                .or_else(|| state.registry.schema_for(endpoint, AccessLevel::WriteNoResponse))
                .ok_or_else(|| RouterError::NotWritable(endpoint.to_string()))?;
            (levels, schema)
        };
        self.send(endpoint, device_id, levels, encode(values, &schema))
    }

    fn send(
        &self,
        endpoint: &Endpoint,
        device_id: &str,
        levels: AccessLevels,
        outcome: EncodeOutcome,
    ) -> Result<WriteReport> {
        let ack = if levels.contains(AccessLevel::WriteWithResponse) {
            AckMode::Acknowledged
        } else {
            AckMode::Unacknowledged
        };

        let dropped = outcome.dropped().to_vec();
        let bytes = if self.config.strict_encode {
            outcome.into_strict()?
        } else {
            for field in &dropped {
                warn!(
                    key = %endpoint.key(),
                    field = %field.name,
                    reason = %field.reason,
                    "field dropped from outbound packet"
                );
            }
            outcome.into_bytes()
        };

        debug!(
            key = %endpoint.key(),
            device = device_id,
            ?ack,
            len = bytes.len(),
            "writing characteristic"
        );
        self.transport.write(WriteRequest {
            device_id: device_id.to_string(),
            service_id: endpoint.service_id.clone(),
            characteristic_id: endpoint.characteristic_id.clone(),
            bytes: bytes.clone(),
            ack,
        })?;

        Ok(WriteReport {
            endpoint: endpoint.clone(),
            device_id: device_id.to_string(),
            ack,
            bytes,
            dropped,
        })
    }

    /// Request a read; the value arrives later through [`Router::deliver`].
    pub fn read(&self, endpoint: &Endpoint, device_id: &str) -> Result<()> {
        self.transport
            .read(device_id, &endpoint.service_id, &endpoint.characteristic_id)?;
        Ok(())
    }

    /// Enable notifications for the endpoint.
    pub fn listen(&self, endpoint: &Endpoint, device_id: &str) -> Result<()> {
        self.transport.set_notify(
            device_id,
            &endpoint.service_id,
            &endpoint.characteristic_id,
            true,
        )?;
        Ok(())
    }

    pub fn stop_listening(&self, endpoint: &Endpoint, device_id: &str) -> Result<()> {
        self.transport.set_notify(
            device_id,
            &endpoint.service_id,
            &endpoint.characteristic_id,
            false,
        )?;
        Ok(())
    }

    // --- device management ---

    pub fn scan(&self, filter: &ScanFilter) -> Result<()> {
        self.transport.scan(filter)?;
        Ok(())
    }

    /// Scan for devices advertising any of the endpoints' services.
    pub fn scan_for_endpoints(&self, endpoints: &[Endpoint]) -> Result<()> {
        let mut services: Vec<String> = endpoints
            .iter()
            .map(|endpoint| endpoint.service_id.clone())
            .collect();
        services.sort();
        services.dedup();
        self.scan(&ScanFilter::Services(services))
    }

    pub fn stop_scan(&self) -> Result<()> {
        self.transport.stop_scan()?;
        Ok(())
    }

    pub fn connect(&self, device_id: &str) -> Result<()> {
        self.transport.connect(device_id)?;
        Ok(())
    }

    pub fn disconnect(&self, device_id: &str) -> Result<()> {
        self.transport.disconnect(device_id)?;
        Ok(())
    }
}
