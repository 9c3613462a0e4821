use gattwire_codec::{encode, hex_encode, FieldValues, HexCase};
use serde::Serialize;
use tracing::warn;

use crate::cmd::{load_schema, EncodeArgs};
use crate::exit::{codec_error, json_error, CliResult, SUCCESS};
use crate::output::{dropped_output, print_json, print_raw, table, DroppedOutput, OutputFormat};

#[derive(Serialize)]
struct EncodeOutput<'a> {
    schema: &'a str,
    hex: String,
    len: usize,
    complete: bool,
    dropped: Vec<DroppedOutput>,
}

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let schema = load_schema(&args.schema)?;
    let json: serde_json::Value =
        serde_json::from_str(&args.values).map_err(|err| json_error("parse values", err))?;
    let values = FieldValues::from_json(&json, &schema).map_err(|err| codec_error("encode", err))?;

    let outcome = encode(&values, &schema);
    for field in outcome.dropped() {
        warn!(field = %field.name, reason = %field.reason, "field not encoded");
    }

    let case = if args.upper {
        HexCase::Upper
    } else {
        HexCase::Lower
    };
    let dropped = dropped_output(outcome.dropped());
    let complete = outcome.is_complete();
    let bytes = if args.strict {
        outcome
            .into_strict()
            .map_err(|err| codec_error("encode", err))?
    } else {
        outcome.into_bytes()
    };
    let hex = hex_encode(&bytes, case);

    match format {
        OutputFormat::Json => print_json(&EncodeOutput {
            schema: schema.name(),
            hex,
            len: bytes.len(),
            complete,
            dropped,
        }),
        OutputFormat::Table => {
            let mut out = table(vec!["SCHEMA", "LEN", "HEX"]);
            out.add_row(vec![schema.name().to_string(), bytes.len().to_string(), hex]);
            println!("{out}");
            if !dropped.is_empty() {
                let mut lost = table(vec!["DROPPED", "REASON"]);
                for d in dropped {
                    lost.add_row(vec![d.field, d.reason]);
                }
                println!("{lost}");
            }
        }
        OutputFormat::Pretty => {
            println!("{} ({} bytes): {hex}", schema.name(), bytes.len());
            for d in &dropped {
                println!("  dropped {}: {}", d.field, d.reason);
            }
        }
        OutputFormat::Raw => print_raw(&bytes),
    }

    Ok(SUCCESS)
}
