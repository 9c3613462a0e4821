//! Heart-rate monitor against the in-memory transport.
//!
//! Registers the standard heart-rate measurement characteristic, subscribes
//! a typed handler, feeds a few notifications through the router, then
//! writes a control-point command.
//!
//! Run with:
//!   cargo run --example heart-rate-monitor

use std::sync::{Arc, OnceLock};

use gattwire::codec::{DecodedValue, Endianness, FieldValues, Packet, PacketSchema};
use gattwire::registry::{AccessLevel, Endpoint};
use gattwire::router::{Delegate, InboundEvent, Router, TransportEvent};
use gattwire::transport::{Device, MemoryTransport};

#[derive(Debug)]
struct Measurement {
    flags: Option<u8>,
    bpm: Option<u16>,
}

impl Packet for Measurement {
    fn schema() -> Arc<PacketSchema> {
        static SCHEMA: OnceLock<Arc<PacketSchema>> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                Arc::new(
                    PacketSchema::builder("HeartRateMeasurement")
                        .u8("flags", 0)
                        .u16("bpm", 1..=2, Endianness::Little)
                        .build()
                        .expect("measurement schema is valid"),
                )
            })
            .clone()
    }

    fn from_decoded(value: &DecodedValue) -> Self {
        Self {
            flags: value.get("flags").and_then(|v| v.as_u8()),
            bpm: value.get("bpm").and_then(|v| v.as_u16()),
        }
    }

    fn to_values(&self) -> FieldValues {
        let mut values = FieldValues::new();
        values.insert_opt("flags", self.flags);
        values.insert_opt("bpm", self.bpm);
        values
    }
}

#[derive(Debug)]
struct ControlPoint {
    opcode: u8,
}

impl Packet for ControlPoint {
    fn schema() -> Arc<PacketSchema> {
        static SCHEMA: OnceLock<Arc<PacketSchema>> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                Arc::new(
                    PacketSchema::builder("HeartRateControlPoint")
                        .u8("opcode", 0)
                        .build()
                        .expect("control point schema is valid"),
                )
            })
            .clone()
    }

    fn from_decoded(value: &DecodedValue) -> Self {
        Self {
            opcode: value.get("opcode").and_then(|v| v.as_u8()).unwrap_or(0),
        }
    }

    fn to_values(&self) -> FieldValues {
        FieldValues::new().with("opcode", self.opcode)
    }
}

struct Console;

impl Delegate for Console {
    fn on_value(&self, endpoint: &Endpoint, device_id: &str, value: &DecodedValue) {
        eprintln!("[{device_id}] {endpoint}: {value}");
    }

    fn on_device_connected(&self, device_id: &str) {
        eprintln!("connected: {device_id}");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let transport = Arc::new(MemoryTransport::new());
    transport.add_device(Device::named("strap-01", "Chest Strap"), &["180D"]);

    let router = Router::new(Arc::clone(&transport));
    router.set_delegate(Arc::new(Console));

    let measurement = Endpoint::new("180D", "2A37");
    let control = Endpoint::new("180D", "2A39");
    router.register_endpoint_level(&measurement, Measurement::schema(), AccessLevel::Notify);
    router.register_endpoint_level(
        &control,
        ControlPoint::schema(),
        AccessLevel::WriteWithResponse,
    );

    router.subscribe::<Measurement, _>(&measurement, |device_id, reading| {
        if let Some(bpm) = reading.bpm {
            let flags = reading.flags.unwrap_or_default();
            println!("{device_id}: {bpm} bpm (flags {flags:#04x})");
        }
    });

    router.connect("strap-01")?;
    router.handle_event(TransportEvent::Connected("strap-01".to_string()));
    router.listen(&measurement, "strap-01")?;

    for bpm in [62u16, 64, 71] {
        let [lo, hi] = bpm.to_le_bytes();
        router.deliver(InboundEvent::new(
            "strap-01",
            "180d",
            "2a37",
            vec![0x00, lo, hi],
            AccessLevel::Notify,
        ));
    }

    // Reset energy expended.
    let report = router.write(&control, &ControlPoint { opcode: 0x01 }, "strap-01")?;
    eprintln!("wrote {:?} ({:?})", report.bytes, report.ack);

    for op in transport.operations() {
        eprintln!("transport: {op:?}");
    }
    Ok(())
}
