use gattwire_codec::{decode, hex_decode, hex_encode, FieldValues, HexCase};
use serde::Serialize;
use tracing::debug;

use crate::cmd::{load_schema, DecodeArgs};
use crate::exit::{codec_error, CliResult, SUCCESS};
use crate::output::{print_json, print_raw, value_table, OutputFormat};

#[derive(Serialize)]
struct DecodeOutput<'a> {
    schema: &'a str,
    raw: String,
    values: &'a FieldValues,
    missing: Vec<&'a str>,
    unsupported: &'a [String],
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let schema = load_schema(&args.schema)?;
    let bytes = hex_decode(&args.hex).map_err(|err| codec_error("decode", err))?;
    let value = decode(&bytes, &schema);
    debug!(
        schema = schema.name(),
        len = bytes.len(),
        fields = value.values().len(),
        "buffer decoded"
    );

    match format {
        OutputFormat::Json => print_json(&DecodeOutput {
            schema: value.schema_name(),
            raw: hex_encode(&bytes, HexCase::Lower),
            values: value.values(),
            missing: value.missing(),
            unsupported: value.unsupported(),
        }),
        OutputFormat::Table => println!("{}", value_table(&value)),
        OutputFormat::Pretty => {
            println!("{} ({} bytes)", value.schema_name(), bytes.len());
            println!("  {value}");
            if !value.unsupported().is_empty() {
                println!("  unsupported: {}", value.unsupported().join(", "));
            }
        }
        OutputFormat::Raw => print_raw(format!("{value}\n").as_bytes()),
    }

    Ok(SUCCESS)
}
