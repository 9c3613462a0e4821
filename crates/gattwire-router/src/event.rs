use bytes::Bytes;
use gattwire_registry::AccessLevel;
use gattwire_transport::Device;

/// A characteristic value received from a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub device_id: String,
    pub service_id: String,
    pub characteristic_id: String,
    pub bytes: Bytes,
    /// Level the value arrived under (read response or notification).
    pub access_level: AccessLevel,
}

impl InboundEvent {
    pub fn new(
        device_id: impl Into<String>,
        service_id: impl Into<String>,
        characteristic_id: impl Into<String>,
        bytes: impl Into<Bytes>,
        access_level: AccessLevel,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            service_id: service_id.into(),
            characteristic_id: characteristic_id.into(),
            bytes: bytes.into(),
            access_level,
        }
    }
}

/// Everything a transport reports back to the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Value(InboundEvent),
    DeviceFound(Device),
    Connected(String),
    Disconnected(String),
    ScanStateChanged(bool),
}

/// Why an inbound event was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unroutable {
    /// No endpoint is registered for the (service, characteristic) pair.
    UnknownEndpoint,
    /// The endpoint exists but nothing is bound at the event's access level.
    UnregisteredLevel,
}

/// What happened to the endpoint's subscriber for a delivered value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberOutcome {
    Invoked,
    /// A subscriber is bound but expects a different schema.
    TypeMismatch,
    NoSubscriber,
}

/// Result of [`crate::Router::deliver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Discarded before decoding; no callback ran.
    Unroutable(Unroutable),
    /// Decoded and passed to the delegate.
    Delivered { subscriber: SubscriberOutcome },
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered { .. })
    }
}
