use gattwire_codec::DecodedValue;
use gattwire_registry::Endpoint;
use gattwire_transport::Device;

/// Application-side observer of everything the router dispatches.
///
/// `on_value` fires for every routable inbound value, whether or not a
/// subscriber accepted it. The remaining hooks mirror transport lifecycle
/// events and default to no-ops.
pub trait Delegate: Send + Sync {
    fn on_value(&self, endpoint: &Endpoint, device_id: &str, value: &DecodedValue);

    fn on_device_found(&self, _device: &Device) {}

    fn on_device_connected(&self, _device_id: &str) {}

    fn on_device_disconnected(&self, _device_id: &str) {}

    fn on_scan_state_changed(&self, _scanning: bool) {}
}
