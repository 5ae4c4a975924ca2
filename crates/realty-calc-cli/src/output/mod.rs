pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use colored::Colorize;
use serde_json::Value;

use crate::OutputFormat;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => {
            csv_out::print_csv(value);
            print_warnings(value);
        }
        OutputFormat::Minimal => {
            minimal::print_minimal(value);
            print_warnings(value);
        }
    }
}

/// Formats that drop the envelope still surface its warnings, on stderr.
fn print_warnings(value: &Value) {
    if let Some(Value::Array(warnings)) = value.get("warnings") {
        for w in warnings.iter().filter_map(Value::as_str) {
            eprintln!("{}: {}", "warning".yellow().bold(), w);
        }
    }
}
