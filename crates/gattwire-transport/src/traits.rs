use crate::error::Result;
use crate::types::{ScanFilter, WriteRequest};

/// Outbound operations gattwire asks the radio layer to perform.
///
/// Implementations own connection state, timeouts and retries. Each method
/// reports the terminal outcome of the request; gattwire never retries.
/// Inbound traffic (characteristic values, discovery and connection events)
/// flows the other way, into the router.
pub trait Transport: Send + Sync {
    /// Write bytes to a characteristic.
    fn write(&self, request: WriteRequest) -> Result<()>;

    /// Request a characteristic read. The value arrives later as an inbound event.
    fn read(&self, device_id: &str, service_id: &str, characteristic_id: &str) -> Result<()>;

    /// Enable or disable notifications for a characteristic.
    fn set_notify(
        &self,
        device_id: &str,
        service_id: &str,
        characteristic_id: &str,
        enabled: bool,
    ) -> Result<()>;

    /// Start scanning for nearby devices.
    fn scan(&self, filter: &ScanFilter) -> Result<()>;

    /// Stop an active scan.
    fn stop_scan(&self) -> Result<()>;

    /// Connect to a previously discovered device.
    fn connect(&self, device_id: &str) -> Result<()>;

    /// Disconnect from a device.
    fn disconnect(&self, device_id: &str) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn write(&self, request: WriteRequest) -> Result<()> {
        (**self).write(request)
    }

    fn read(&self, device_id: &str, service_id: &str, characteristic_id: &str) -> Result<()> {
        (**self).read(device_id, service_id, characteristic_id)
    }

    fn set_notify(
        &self,
        device_id: &str,
        service_id: &str,
        characteristic_id: &str,
        enabled: bool,
    ) -> Result<()> {
        (**self).set_notify(device_id, service_id, characteristic_id, enabled)
    }

    fn scan(&self, filter: &ScanFilter) -> Result<()> {
        (**self).scan(filter)
    }

    fn stop_scan(&self) -> Result<()> {
        (**self).stop_scan()
    }

    fn connect(&self, device_id: &str) -> Result<()> {
        (**self).connect(device_id)
    }

    fn disconnect(&self, device_id: &str) -> Result<()> {
        (**self).disconnect(device_id)
    }
}
