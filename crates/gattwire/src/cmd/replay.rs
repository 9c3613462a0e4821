use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use gattwire_codec::{
    hex_decode, hex_encode, DecodedValue, FieldValues, HexCase, PacketSchema, SchemaDocument,
};
use gattwire_registry::{AccessLevel, AccessLevels, Endpoint};
use gattwire_router::{
    Delegate, DispatchOutcome, InboundEvent, Router, RouterConfig, SubscriberOutcome,
    TransportEvent, UnroutablePolicy, Unroutable,
};
use gattwire_transport::{Device, MemoryTransport};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cmd::{read_file, ReplayArgs};
use crate::exit::{
    codec_error, json_error, router_error, CliError, CliResult, DATA_INVALID, SUCCESS,
};
use crate::output::{dropped_output, print_json, table, DroppedOutput, OutputFormat};

/// A recorded session: schemas, registrations, then traffic in order.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Session {
    schemas: Vec<SchemaDocument>,
    endpoints: Vec<SessionEndpoint>,
    #[serde(default)]
    subscribers: Vec<SessionSubscriber>,
    #[serde(default)]
    devices: Vec<SessionDevice>,
    #[serde(default)]
    events: Vec<SessionEvent>,
    #[serde(default)]
    writes: Vec<SessionWrite>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SessionEndpoint {
    service: String,
    characteristic: String,
    schema: String,
    /// Defaults to read, acknowledged write and notify.
    #[serde(default)]
    levels: Option<AccessLevels>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SessionSubscriber {
    service: String,
    characteristic: String,
    schema: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SessionDevice {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    services: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SessionEvent {
    Value {
        device: String,
        service: String,
        characteristic: String,
        level: AccessLevel,
        hex: String,
    },
    DeviceFound {
        id: String,
        #[serde(default)]
        name: Option<String>,
    },
    Connected {
        device: String,
    },
    Disconnected {
        device: String,
    },
    ScanState {
        scanning: bool,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SessionWrite {
    device: String,
    service: String,
    characteristic: String,
    values: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
struct DelegateRecord {
    callback: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<FieldValues>,
}

#[derive(Serialize)]
struct EventOutput {
    index: usize,
    event: String,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    subscriber: Option<&'static str>,
    delegate: Vec<DelegateRecord>,
}

#[derive(Serialize)]
struct WriteOutput {
    endpoint: String,
    device: String,
    ack: String,
    hex: String,
    dropped: Vec<DroppedOutput>,
}

#[derive(Serialize)]
struct ReplayOutput {
    endpoints: Vec<String>,
    events: Vec<EventOutput>,
    writes: Vec<WriteOutput>,
}

/// Delegate that buffers every callback until drained.
#[derive(Default)]
struct Recorder {
    records: Mutex<Vec<DelegateRecord>>,
}

impl Recorder {
    fn drain(&self) -> Vec<DelegateRecord> {
        std::mem::take(&mut *self.records.lock())
    }

    fn note(&self, callback: &'static str, detail: String) {
        self.records.lock().push(DelegateRecord {
            callback,
            detail,
            values: None,
        });
    }
}

impl Delegate for Recorder {
    fn on_value(&self, endpoint: &Endpoint, device_id: &str, value: &DecodedValue) {
        self.records.lock().push(DelegateRecord {
            callback: "on_value",
            detail: format!("{endpoint} {device_id} {} {value}", value.schema_name()),
            values: Some(value.values().clone()),
        });
    }

    fn on_device_found(&self, device: &Device) {
        let name = device.name.as_deref().unwrap_or("-");
        self.note("on_device_found", format!("{} {name}", device.id));
    }

    fn on_device_connected(&self, device_id: &str) {
        self.note("on_device_connected", device_id.to_string());
    }

    fn on_device_disconnected(&self, device_id: &str) {
        self.note("on_device_disconnected", device_id.to_string());
    }

    fn on_scan_state_changed(&self, scanning: bool) {
        self.note("on_scan_state_changed", scanning.to_string());
    }
}

pub fn run(args: ReplayArgs, format: OutputFormat) -> CliResult<i32> {
    let text = read_file(&args.session)?;
    let session: Session =
        serde_json::from_str(&text).map_err(|err| json_error("parse session", err))?;

    let config = RouterConfig {
        unroutable: if args.warn_unroutable {
            UnroutablePolicy::Log
        } else {
            UnroutablePolicy::Drop
        },
        ..RouterConfig::default()
    };
    let router = Router::with_config(MemoryTransport::new(), config)
        .map_err(|err| router_error("router", err))?;
    let recorder = Arc::new(Recorder::default());
    router.set_delegate(recorder.clone());

    let schemas = load_schemas(session.schemas)?;
    register(&router, &schemas, &session.endpoints)?;
    subscribe(&router, &schemas, &session.subscribers)?;
    connect(&router, &session.devices)?;

    let mut events = Vec::with_capacity(session.events.len());
    for (index, event) in session.events.into_iter().enumerate() {
        let (label, event) = transport_event(event)?;
        let outcome = router.handle_event(event);
        let (outcome, subscriber) = describe_outcome(outcome);
        events.push(EventOutput {
            index,
            event: label,
            outcome,
            subscriber,
            delegate: recorder.drain(),
        });
    }

    let mut writes = Vec::with_capacity(session.writes.len());
    for write in &session.writes {
        writes.push(replay_write(&router, write)?);
    }

    let output = ReplayOutput {
        endpoints: router
            .endpoints()
            .iter()
            .map(|endpoint| endpoint.key().to_string())
            .collect(),
        events,
        writes,
    };
    print_replay(&output, format);
    Ok(SUCCESS)
}

type Schemas = HashMap<String, Arc<PacketSchema>>;

/// Schema names must be unique within a session.
fn load_schemas(documents: Vec<SchemaDocument>) -> CliResult<Schemas> {
    let mut schemas = HashMap::with_capacity(documents.len());
    for document in documents {
        let schema =
            PacketSchema::from_document(document).map_err(|err| codec_error("load schema", err))?;
        match schemas.entry(schema.name().to_string()) {
            Entry::Occupied(entry) => {
                return Err(CliError::new(
                    DATA_INVALID,
                    format!("duplicate schema name {}", entry.key()),
                ));
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(schema));
            }
        }
    }
    Ok(schemas)
}

fn lookup_schema(schemas: &Schemas, name: &str, referrer: &str) -> CliResult<Arc<PacketSchema>> {
    schemas.get(name).cloned().ok_or_else(|| {
        CliError::new(
            DATA_INVALID,
            format!("{referrer} references unknown schema {name}"),
        )
    })
}

fn register(
    router: &Router<MemoryTransport>,
    schemas: &Schemas,
    endpoints: &[SessionEndpoint],
) -> CliResult<()> {
    for entry in endpoints {
        let schema = lookup_schema(schemas, &entry.schema, "endpoint")?;
        let endpoint = Endpoint::new(&entry.service, &entry.characteristic);
        match entry.levels {
            Some(levels) => router
                .register_endpoint_levels(&endpoint, schema, levels)
                .map_err(|err| router_error(&format!("register {endpoint}"), err))?,
            None => router.register_endpoint(&endpoint, schema),
        }
    }
    Ok(())
}

fn subscribe(
    router: &Router<MemoryTransport>,
    schemas: &Schemas,
    subscribers: &[SessionSubscriber],
) -> CliResult<()> {
    for entry in subscribers {
        let schema = lookup_schema(schemas, &entry.schema, "subscriber")?;
        let endpoint = Endpoint::new(&entry.service, &entry.characteristic);
        router.subscribe_schema(&endpoint, schema, |device_id, value| {
            debug!(
                device = device_id,
                schema = value.schema_name(),
                "subscriber invoked"
            );
        });
    }
    Ok(())
}

fn connect(router: &Router<MemoryTransport>, devices: &[SessionDevice]) -> CliResult<()> {
    for entry in devices {
        let device = match &entry.name {
            Some(name) => Device::named(&entry.id, name),
            None => Device::new(&entry.id),
        };
        let services: Vec<&str> = entry.services.iter().map(String::as_str).collect();
        router.transport().add_device(device, &services);
        router
            .connect(&entry.id)
            .map_err(|err| router_error(&format!("connect {}", entry.id), err))?;
    }
    Ok(())
}

fn transport_event(event: SessionEvent) -> CliResult<(String, TransportEvent)> {
    let converted = match event {
        SessionEvent::Value {
            device,
            service,
            characteristic,
            level,
            hex,
        } => {
            let bytes = hex_decode(&hex).map_err(|err| codec_error("event bytes", err))?;
            let label = format!("value {service}.{characteristic} {level} from {device}");
            let inbound = InboundEvent::new(device, service, characteristic, bytes, level);
            (label, TransportEvent::Value(inbound))
        }
        SessionEvent::DeviceFound { id, name } => {
            let label = format!("device_found {id}");
            let device = Device { id, name };
            (label, TransportEvent::DeviceFound(device))
        }
        SessionEvent::Connected { device } => {
            (format!("connected {device}"), TransportEvent::Connected(device))
        }
        SessionEvent::Disconnected { device } => (
            format!("disconnected {device}"),
            TransportEvent::Disconnected(device),
        ),
        SessionEvent::ScanState { scanning } => (
            format!("scan_state {scanning}"),
            TransportEvent::ScanStateChanged(scanning),
        ),
    };
    Ok(converted)
}

fn describe_outcome(outcome: Option<DispatchOutcome>) -> (&'static str, Option<&'static str>) {
    match outcome {
        None => ("forwarded", None),
        Some(DispatchOutcome::Unroutable(Unroutable::UnknownEndpoint)) => {
            ("unknown_endpoint", None)
        }
        Some(DispatchOutcome::Unroutable(Unroutable::UnregisteredLevel)) => {
            ("unregistered_level", None)
        }
        Some(DispatchOutcome::Delivered { subscriber }) => {
            let subscriber = match subscriber {
                SubscriberOutcome::Invoked => "invoked",
                SubscriberOutcome::TypeMismatch => "type_mismatch",
                SubscriberOutcome::NoSubscriber => "none",
            };
            ("delivered", Some(subscriber))
        }
    }
}

fn replay_write(router: &Router<MemoryTransport>, write: &SessionWrite) -> CliResult<WriteOutput> {
    let endpoint = Endpoint::new(&write.service, &write.characteristic);
    let schema = router
        .registered_endpoint_type(
            &write.service,
            &write.characteristic,
            AccessLevel::WriteWithResponse,
        )
        .or_else(|| {
            router.registered_endpoint_type(
                &write.service,
                &write.characteristic,
                AccessLevel::WriteNoResponse,
            )
        })
        .ok_or_else(|| {
            CliError::new(
                DATA_INVALID,
                format!("write to {endpoint}: no write level registered"),
            )
        })?;
    let values = FieldValues::from_json(&write.values, &schema)
        .map_err(|err| codec_error(&format!("write to {endpoint}"), err))?;

    let report = router
        .write_values(&endpoint, &values, &write.device)
        .map_err(|err| router_error(&format!("write to {endpoint}"), err))?;

    Ok(WriteOutput {
        endpoint: report.endpoint.key().to_string(),
        device: report.device_id,
        ack: format!("{:?}", report.ack).to_lowercase(),
        hex: hex_encode(&report.bytes, HexCase::Lower),
        dropped: dropped_output(&report.dropped),
    })
}

fn print_replay(output: &ReplayOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(output),
        OutputFormat::Table => {
            let mut events = table(vec!["#", "EVENT", "OUTCOME", "SUBSCRIBER", "DELEGATE"]);
            for event in &output.events {
                let delegate = event
                    .delegate
                    .iter()
                    .map(|record| format!("{}: {}", record.callback, record.detail))
                    .collect::<Vec<_>>()
                    .join("\n");
                events.add_row(vec![
                    event.index.to_string(),
                    event.event.clone(),
                    event.outcome.to_string(),
                    event.subscriber.unwrap_or("-").to_string(),
                    delegate,
                ]);
            }
            println!("{events}");

            if !output.writes.is_empty() {
                let mut writes = table(vec!["ENDPOINT", "DEVICE", "ACK", "HEX", "DROPPED"]);
                for write in &output.writes {
                    let dropped = write
                        .dropped
                        .iter()
                        .map(|d| d.field.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    writes.add_row(vec![
                        write.endpoint.clone(),
                        write.device.clone(),
                        write.ack.clone(),
                        write.hex.clone(),
                        dropped,
                    ]);
                }
                println!("{writes}");
            }
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for event in &output.events {
                println!("[{}] {} -> {}", event.index, event.event, event.outcome);
                for record in &event.delegate {
                    println!("    {}: {}", record.callback, record.detail);
                }
            }
            for write in &output.writes {
                println!(
                    "write {} on {} ({}): {}",
                    write.endpoint, write.device, write.ack, write.hex
                );
            }
        }
    }
}
