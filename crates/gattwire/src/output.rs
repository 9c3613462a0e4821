use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use gattwire_codec::{DecodedValue, DroppedField, PacketSchema};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Field layout of `schema`, one row per field.
pub fn schema_table(schema: &PacketSchema) -> Table {
    let mut rows = table(vec!["FIELD", "KIND", "RANGE", "ENDIANNESS"]);
    for field in schema.fields() {
        let endianness = if field.kind().has_byte_order() {
            format!("{:?}", field.endianness()).to_lowercase()
        } else {
            "-".to_string()
        };
        rows.add_row(vec![
            field.name().to_string(),
            field.kind().to_string(),
            format!("{}..={}", field.start(), field.end()),
            endianness,
        ]);
    }
    rows
}

/// Decoded fields of `value` in schema order, with absent and unsupported
/// fields marked.
pub fn value_table(value: &DecodedValue) -> Table {
    let mut rows = table(vec!["FIELD", "KIND", "RANGE", "VALUE"]);
    for field in value.schema().fields() {
        let shown = if field.kind().is_supported() {
            value.describe(field.name())
        } else {
            "unsupported".to_string()
        };
        rows.add_row(vec![
            field.name().to_string(),
            field.kind().to_string(),
            format!("{}..={}", field.start(), field.end()),
            shown,
        ]);
    }
    rows
}

#[derive(Serialize)]
pub struct DroppedOutput {
    pub field: String,
    pub reason: String,
}

pub fn dropped_output(dropped: &[DroppedField]) -> Vec<DroppedOutput> {
    dropped
        .iter()
        .map(|d| DroppedOutput {
            field: d.name.clone(),
            reason: d.reason.to_string(),
        })
        .collect()
}
