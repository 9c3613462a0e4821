use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use gattwire_codec::{DecodedValue, Packet};
use gattwire_registry::{Endpoint, EndpointKey, SchemaType};
use tracing::debug;

use crate::event::SubscriberOutcome;

type Callback = Arc<dyn Fn(&str, &DecodedValue) + Send + Sync>;

/// One endpoint's subscriber and the schema it accepts.
#[derive(Clone)]
pub(crate) struct Binding {
    expected: SchemaType,
    callback: Callback,
}

impl Binding {
    /// Invoke the callback if `value` was decoded with the expected schema.
    ///
    /// Schemas match when they are the same allocation or have identical
    /// layouts; a shared name alone is not enough.
    pub(crate) fn dispatch(&self, device_id: &str, value: &DecodedValue) -> SubscriberOutcome {
        let decoded = value.schema();
        if !Arc::ptr_eq(decoded, &self.expected) && **decoded != *self.expected {
            debug!(
                expected = self.expected.name(),
                schema = value.schema_name(),
                device = device_id,
                "subscriber skipped on schema mismatch"
            );
            return SubscriberOutcome::TypeMismatch;
        }
        (self.callback)(device_id, value);
        SubscriberOutcome::Invoked
    }
}

/// At most one subscriber per endpoint key.
///
/// Re-subscribing replaces the previous binding.
#[derive(Default)]
pub struct SubscriberDirectory {
    bindings: HashMap<EndpointKey, Binding>,
}

impl SubscriberDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a typed callback. It only sees values decoded with `P::schema()`.
    pub fn subscribe<P, F>(&mut self, endpoint: &Endpoint, callback: F)
    where
        P: Packet,
        F: Fn(&str, P) + Send + Sync + 'static,
    {
        self.subscribe_schema(endpoint, P::schema(), move |device_id, value| {
            callback(device_id, P::from_decoded(value))
        });
    }

    /// Bind an untyped callback for values decoded with `expected`.
    pub fn subscribe_schema<F>(&mut self, endpoint: &Endpoint, expected: SchemaType, callback: F)
    where
        F: Fn(&str, &DecodedValue) + Send + Sync + 'static,
    {
        let key = endpoint.key();
        debug!(key = %key, schema = expected.name(), "subscriber bound");
        self.bindings.insert(
            key,
            Binding {
                expected,
                callback: Arc::new(callback),
            },
        );
    }

    /// Returns true if a binding was removed.
    pub fn unsubscribe(&mut self, endpoint: &Endpoint) -> bool {
        self.bindings.remove(&endpoint.key()).is_some()
    }

    pub fn is_subscribed(&self, endpoint: &Endpoint) -> bool {
        self.bindings.contains_key(&endpoint.key())
    }

    /// Schema the endpoint's subscriber accepts.
    pub fn expected_schema(&self, endpoint: &Endpoint) -> Option<&SchemaType> {
        self.bindings
            .get(&endpoint.key())
            .map(|binding| &binding.expected)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub(crate) fn binding(&self, key: &EndpointKey) -> Option<Binding> {
        self.bindings.get(key).cloned()
    }
}

impl fmt::Debug for SubscriberDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&EndpointKey> = self.bindings.keys().collect();
        keys.sort();
        f.debug_struct("SubscriberDirectory")
            .field("endpoints", &keys)
            .finish()
    }
}
