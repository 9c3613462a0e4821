use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::{Result, TransportError};
use crate::traits::Transport;
use crate::types::{Device, ScanFilter, WriteRequest};

/// A transport operation as observed by [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Write(WriteRequest),
    Read {
        device_id: String,
        service_id: String,
        characteristic_id: String,
    },
    SetNotify {
        device_id: String,
        service_id: String,
        characteristic_id: String,
        enabled: bool,
    },
    Scan(ScanFilter),
    StopScan,
    Connect(String),
    Disconnect(String),
}

#[derive(Debug)]
struct KnownDevice {
    device: Device,
    services: Vec<String>,
    connected: bool,
}

#[derive(Debug, Default)]
struct State {
    devices: HashMap<String, KnownDevice>,
    operations: Vec<Operation>,
    scanning: bool,
    fail_next: Option<TransportError>,
}

/// In-process transport that records every operation.
///
/// Devices must be added with [`MemoryTransport::add_device`] before they can
/// be connected; reads, writes and notify toggles require a connected device.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    state: Mutex<State>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a device discoverable, advertising the given services.
    pub fn add_device(&self, device: Device, services: &[&str]) {
        let mut state = self.state.lock();
        state.devices.insert(
            device.id.clone(),
            KnownDevice {
                device,
                services: services.iter().map(|s| s.to_string()).collect(),
                connected: false,
            },
        );
    }

    /// Devices a scan with `filter` would report, ordered by id.
    pub fn discoverable(&self, filter: &ScanFilter) -> Vec<Device> {
        let state = self.state.lock();
        let mut found: Vec<Device> = state
            .devices
            .values()
            .filter(|known| filter.matches(known.device.name.as_deref(), &known.services))
            .map(|known| known.device.clone())
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found
    }

    /// Fail the next operation with `err`.
    pub fn fail_next(&self, err: TransportError) {
        self.state.lock().fail_next = Some(err);
    }

    pub fn is_connected(&self, device_id: &str) -> bool {
        self.state
            .lock()
            .devices
            .get(device_id)
            .is_some_and(|known| known.connected)
    }

    pub fn is_scanning(&self) -> bool {
        self.state.lock().scanning
    }

    /// Every operation recorded so far, in call order.
    pub fn operations(&self) -> Vec<Operation> {
        self.state.lock().operations.clone()
    }

    /// Only the recorded writes, in call order.
    pub fn writes(&self) -> Vec<WriteRequest> {
        self.state
            .lock()
            .operations
            .iter()
            .filter_map(|op| match op {
                Operation::Write(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, op: Operation) -> Result<()> {
        let mut state = self.state.lock();
        trace!(?op, "memory transport operation");
        state.operations.push(op);
        match state.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn require_connected(
        &self,
        device_id: &str,
        on_disconnected: impl FnOnce(String) -> TransportError,
    ) -> Result<()> {
        let state = self.state.lock();
        match state.devices.get(device_id) {
            None => Err(TransportError::DeviceNotFound(device_id.to_string())),
            Some(known) if !known.connected => Err(on_disconnected("not connected".to_string())),
            Some(_) => Ok(()),
        }
    }
}

impl Transport for MemoryTransport {
    fn write(&self, request: WriteRequest) -> Result<()> {
        let device = request.device_id.clone();
        self.require_connected(&device, |description| TransportError::Write {
            device: device.clone(),
            description,
        })?;
        self.record(Operation::Write(request))
    }

    fn read(&self, device_id: &str, service_id: &str, characteristic_id: &str) -> Result<()> {
        self.require_connected(device_id, |description| TransportError::Read {
            device: device_id.to_string(),
            description,
        })?;
        self.record(Operation::Read {
            device_id: device_id.to_string(),
            service_id: service_id.to_string(),
            characteristic_id: characteristic_id.to_string(),
        })
    }

    fn set_notify(
        &self,
        device_id: &str,
        service_id: &str,
        characteristic_id: &str,
        enabled: bool,
    ) -> Result<()> {
        self.require_connected(device_id, |description| TransportError::Notify {
            device: device_id.to_string(),
            description,
        })?;
        self.record(Operation::SetNotify {
            device_id: device_id.to_string(),
            service_id: service_id.to_string(),
            characteristic_id: characteristic_id.to_string(),
            enabled,
        })
    }

    fn scan(&self, filter: &ScanFilter) -> Result<()> {
        self.record(Operation::Scan(filter.clone()))?;
        self.state.lock().scanning = true;
        Ok(())
    }

    fn stop_scan(&self) -> Result<()> {
        self.record(Operation::StopScan)?;
        self.state.lock().scanning = false;
        Ok(())
    }

    fn connect(&self, device_id: &str) -> Result<()> {
        if !self.state.lock().devices.contains_key(device_id) {
            return Err(TransportError::DeviceNotFound(device_id.to_string()));
        }
        self.record(Operation::Connect(device_id.to_string()))?;
        let mut state = self.state.lock();
        state.scanning = false;
        if let Some(known) = state.devices.get_mut(device_id) {
            known.connected = true;
        }
        debug!(device = device_id, "memory transport connected");
        Ok(())
    }

    fn disconnect(&self, device_id: &str) -> Result<()> {
        if !self.state.lock().devices.contains_key(device_id) {
            return Err(TransportError::DeviceNotFound(device_id.to_string()));
        }
        self.record(Operation::Disconnect(device_id.to_string()))?;
        if let Some(known) = self.state.lock().devices.get_mut(device_id) {
            known.connected = false;
        }
        debug!(device = device_id, "memory transport disconnected");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::types::AckMode;

    fn request(device: &str) -> WriteRequest {
        WriteRequest {
            device_id: device.to_string(),
            service_id: "180D".to_string(),
            characteristic_id: "2A39".to_string(),
            bytes: Bytes::from_static(&[0x01]),
            ack: AckMode::Acknowledged,
        }
    }

    #[test]
    fn connect_unknown_device_fails() {
        let transport = MemoryTransport::new();
        assert_eq!(
            transport.connect("missing"),
            Err(TransportError::DeviceNotFound("missing".into()))
        );
        assert!(transport.operations().is_empty());
    }

    #[test]
    fn write_requires_connection() {
        let transport = MemoryTransport::new();
        transport.add_device(Device::named("AA", "Sensor"), &["180D"]);

        assert!(matches!(
            transport.write(request("AA")),
            Err(TransportError::Write { .. })
        ));

        transport.connect("AA").unwrap();
        transport.write(request("AA")).unwrap();
        assert_eq!(transport.writes(), vec![request("AA")]);
    }

    #[test]
    fn connect_stops_scan() {
        let transport = MemoryTransport::new();
        transport.add_device(Device::new("AA"), &[]);
        transport.scan(&ScanFilter::Any).unwrap();
        assert!(transport.is_scanning());

        transport.connect("AA").unwrap();
        assert!(!transport.is_scanning());
        assert!(transport.is_connected("AA"));

        transport.disconnect("AA").unwrap();
        assert!(!transport.is_connected("AA"));
    }

    #[test]
    fn injected_failure_applies_once() {
        let transport = MemoryTransport::new();
        transport.fail_next(TransportError::Scan("radio off".into()));

        assert_eq!(
            transport.scan(&ScanFilter::Any),
            Err(TransportError::Scan("radio off".into()))
        );
        assert!(transport.scan(&ScanFilter::Any).is_ok());
        assert_eq!(transport.operations().len(), 2);
    }

    #[test]
    fn discoverable_applies_filter() {
        let transport = MemoryTransport::new();
        transport.add_device(Device::named("BB", "Scale"), &["181D"]);
        transport.add_device(Device::named("AA", "Heart"), &["180D"]);

        let all = transport.discoverable(&ScanFilter::Any);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "AA");

        let hr = transport.discoverable(&ScanFilter::Services(vec!["180D".into()]));
        assert_eq!(hr, vec![Device::named("AA", "Heart")]);
    }
}
