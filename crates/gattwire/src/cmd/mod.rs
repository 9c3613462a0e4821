use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Subcommand};
use gattwire_codec::PacketSchema;

use crate::exit::{codec_error, io_error, CliResult};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod replay;
pub mod schema;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a hex buffer with a schema document.
    Decode(DecodeArgs),
    /// Encode a JSON object of field values with a schema document.
    Encode(EncodeArgs),
    /// Print the field layout of a schema document.
    Schema(SchemaArgs),
    /// Run a recorded session through the router.
    Replay(ReplayArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Schema(args) => schema::run(args, format),
        Command::Replay(args) => replay::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Schema document (JSON).
    pub schema: PathBuf,
    /// Bytes to decode, as hex. Whitespace, ':' and a 0x prefix are ignored.
    pub hex: String,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Schema document (JSON).
    pub schema: PathBuf,
    /// Field values as a JSON object, e.g. '{"bpm": 72}'.
    pub values: String,
    /// Fail if any schema field could not be written.
    #[arg(long)]
    pub strict: bool,
    /// Render hex in upper case.
    #[arg(long)]
    pub upper: bool,
}

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Schema document (JSON).
    pub schema: PathBuf,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Session document (JSON).
    pub session: PathBuf,
    /// Log unroutable events at warn instead of trace.
    #[arg(long)]
    pub warn_unroutable: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn read_file(path: &Path) -> CliResult<String> {
    std::fs::read_to_string(path).map_err(|err| io_error(&format!("read {}", path.display()), err))
}

pub(crate) fn load_schema(path: &Path) -> CliResult<Arc<PacketSchema>> {
    let text = read_file(path)?;
    let schema = PacketSchema::from_json(&text)
        .map_err(|err| codec_error(&format!("load schema {}", path.display()), err))?;
    Ok(Arc::new(schema))
}
