//! Response envelope construction.
//!
//! Every endpoint answers with a JSON mapping carrying a `status` field
//! valued `"completed"` or `"failed"` plus an endpoint-specific payload.
//! Failures are always flattened into such an envelope; the hosting RPC bus
//! never sees a transport-level error from this crate.

use serde_json::{Value, json};

pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_FAILED: &str = "failed";

/// Builds a path-file object: `{path, content, extension}`.
///
/// The structure retrieval endpoint reports a stored file through the
/// `content` slot with `path` left null, so both slots are exposed here
/// rather than derived from one another.
pub fn path_file(path: Option<String>, content: Option<String>, extension: Option<&str>) -> Value {
    json!({
        "path": path,
        "content": content,
        "extension": extension,
    })
}

/// A completed response carrying a serialized structure under `mol`.
pub fn completed_mol(mol: Value) -> Value {
    json!({ "status": STATUS_COMPLETED, "mol": mol })
}

/// A failed response with a null payload under the given key.
pub fn failed(payload_key: &str) -> Value {
    json!({ "status": STATUS_FAILED, payload_key: Value::Null })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_file_keeps_null_slots() {
        let obj = path_file(None, Some("CCO".to_string()), Some("smi"));
        assert!(obj["path"].is_null());
        assert_eq!(obj["content"], "CCO");
        assert_eq!(obj["extension"], "smi");
    }

    #[test]
    fn failed_envelope_nulls_the_payload() {
        let resp = failed("mol");
        assert_eq!(resp["status"], STATUS_FAILED);
        assert!(resp["mol"].is_null());
    }
}
