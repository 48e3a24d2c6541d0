//! JSON-RPC-ish command envelope used on the command queue and response node.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The reserved id used for commands the runner issues to itself
/// (e.g. finalizing a compile job). Responses carrying this id are echoed to
/// stdout instead of being written to the response node.
pub const INTERNAL_ID: &str = "internal";

#[derive(Debug, Clone, Deserialize)]
pub struct CommandRequest {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl CommandRequest {
    pub fn from_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn is_internal(&self) -> bool {
        self.id == INTERNAL_ID
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CommandResponse {
    Result {
        jsonrpc: &'static str,
        id: String,
        result: Value,
    },
    Error {
        jsonrpc: &'static str,
        id: String,
        error: ErrorBody,
    },
}

impl CommandResponse {
    pub fn result(id: impl Into<String>, result: Value) -> Self {
        CommandResponse::Result {
            jsonrpc: "2.0",
            id: id.into(),
            result,
        }
    }

    pub fn error(id: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        CommandResponse::Error {
            jsonrpc: "2.0",
            id: id.into(),
            error: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    pub fn id(&self) -> &str {
        match self {
            CommandResponse::Result { id, .. } => id,
            CommandResponse::Error { id, .. } => id,
        }
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).expect("command response always serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_well_formed_request() {
        let raw = r#"{"id":"a","method":"compile","params":{"name":"p1"}}"#;
        let req = CommandRequest::from_str(raw).unwrap();
        assert_eq!(req.id, "a");
        assert_eq!(req.method, "compile");
        assert!(!req.is_internal());
    }

    #[test]
    fn missing_params_defaults_to_null() {
        let raw = r#"{"id":"a","method":"compile_cancel"}"#;
        let req = CommandRequest::from_str(raw).unwrap();
        assert!(req.params.is_null());
    }

    #[test]
    fn internal_id_is_recognized() {
        let raw = r#"{"id":"internal","method":"compile_finished","params":{}}"#;
        let req = CommandRequest::from_str(raw).unwrap();
        assert!(req.is_internal());
    }

    #[test]
    fn result_response_shape() {
        let resp = CommandResponse::result("a", json!({"code": 0}));
        let v: Value = serde_json::from_str(&resp.to_json_string()).unwrap();
        assert_eq!(v["jsonrpc"], "2.0");
        assert_eq!(v["id"], "a");
        assert_eq!(v["result"]["code"], 0);
    }

    #[test]
    fn error_response_shape() {
        let resp = CommandResponse::error("b", 1000, "boom");
        let v: Value = serde_json::from_str(&resp.to_json_string()).unwrap();
        assert_eq!(v["error"]["code"], 1000);
        assert_eq!(v["error"]["message"], "boom");
    }
}
