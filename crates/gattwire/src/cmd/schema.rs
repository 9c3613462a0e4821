use crate::cmd::{load_schema, SchemaArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, schema_table, OutputFormat};

pub fn run(args: SchemaArgs, format: OutputFormat) -> CliResult<i32> {
    let schema = load_schema(&args.schema)?;

    match format {
        OutputFormat::Json => print_json(&schema.to_document()),
        OutputFormat::Table => println!("{}", schema_table(&schema)),
        OutputFormat::Pretty => {
            println!("{} ({} bytes)", schema.name(), schema.extent());
            for field in schema.fields() {
                let support = if field.kind().is_supported() {
                    ""
                } else {
                    " (unsupported)"
                };
                println!(
                    "  {:<16} {:<6} {}..={}{support}",
                    field.name(),
                    field.kind(),
                    field.start(),
                    field.end()
                );
            }
        }
        OutputFormat::Raw => println!("{}", schema.name()),
    }

    Ok(SUCCESS)
}
