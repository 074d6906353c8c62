// Provider-specific response validation.
//
// [`crate::api::process_response`] turns every non-2xx reply into
// `{error, error_detail}`; the validators only look for that `error` key and
// print a diagnostic in the provider's own error shape.

use serde_json::Value;
use std::io::Write;
use tracing::warn;

use crate::format::value_to_string;

/// Vultr: `error_detail` is `{error: "...", status: N}`.
pub fn valid_response_vultr<W: Write>(data: &Value, out: &mut W) -> bool {
    let Some(obj) = data.as_object() else {
        let _ = writeln!(out, "Error: unexpected response {}", data);
        return false;
    };
    let Some(status) = obj.get("error") else {
        return true;
    };

    let message = match obj.get("error_detail") {
        Some(detail) => match detail.get("error") {
            Some(error) => value_to_string(error),
            None => detail.to_string(),
        },
        None => String::new(),
    };
    warn!(provider = "vultr", status = %status, %message, "request rejected");
    let _ = writeln!(out, "Error {}: {}", value_to_string(status), message);
    false
}

/// Cloudflare: `error_detail` is the v4 envelope with `success` and a list of
/// `{code, message}` errors; one line is printed per error.
pub fn valid_response_cloudflare<W: Write>(data: &Value, out: &mut W) -> bool {
    let Some(obj) = data.as_object() else {
        let _ = writeln!(out, "Error: unexpected response {}", data);
        return false;
    };
    let Some(status) = obj.get("error") else {
        return true;
    };

    let detail = obj.get("error_detail");
    let success = detail
        .and_then(|d| d.get("success"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let _ = writeln!(
        out,
        "Error {}: request unsuccessful (success={})",
        value_to_string(status),
        success
    );
    let errors = detail
        .and_then(|d| d.get("errors"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for error in errors {
        let code = error.get("code").map(value_to_string).unwrap_or_default();
        let message = error.get("message").map(value_to_string).unwrap_or_default();
        warn!(provider = "cloudflare", status = %status, %code, %message, "request rejected");
        let _ = writeln!(out, "  [{}] {}", code, message);
    }
    false
}
