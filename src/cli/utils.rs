use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print a collection as JSON, or hand each row to `row` for a text table.
pub fn output_collection<T, F>(
    output_format: OutputFormat,
    collection_name: &str,
    items: &[T],
    header: &str,
    row: F,
) -> anyhow::Result<()>
where
    T: Serialize,
    F: Fn(&T) -> String,
{
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ collection_name: items }))?);
        }
        OutputFormat::Text if items.is_empty() => {
            println!("No {} found", collection_name);
        }
        OutputFormat::Text => {
            println!("{}", header);
            println!("{}", "-".repeat(header.len()));
            for item in items {
                println!("{}", row(item));
            }
        }
    }
    Ok(())
}

/// Shorten long values so text tables stay aligned.
pub fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
