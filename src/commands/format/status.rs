//! Status and JSON printing helpers

use serde::Serialize;
use serde_json::json;

use salience_core::error::Result;

/// Print a JSON status message with optional fields
///
/// # Examples
/// ```ignore
/// print_json_status("ok", Some("Store initialized"), &[("store", json!(root))])?;
/// ```
pub fn print_json_status(
    status: &str,
    message: Option<&str>,
    extra_fields: &[(&str, serde_json::Value)],
) -> Result<()> {
    let mut output = json!({ "status": status });

    if let Some(obj) = output.as_object_mut() {
        if let Some(msg) = message {
            obj.insert("message".to_string(), json!(msg));
        }
        for (key, value) in extra_fields {
            obj.insert(key.to_string(), value.clone());
        }
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Pretty-print any serializable report
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Fixed-width score column
pub fn score_label(score: f64) -> String {
    format!("{:>6.3}", score)
}
