//! JSON-RPC envelope types.
//!
//! # Design
//! `JrpcRequest` is what goes out; `JrpcResult` is the reply shape callers
//! are expected to parse response bodies into. The dispatcher never touches
//! `JrpcResult` itself, it is exported as the contract for the other side.
//!
//! Whether an empty `params` map reaches the wire is decided while encoding,
//! by serializing a borrowed view of the request with the field skipped,
//! never by editing the encoded bytes afterwards.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::CallError;
use crate::options::EmptyParams;

pub const JSONRPC_VERSION: &str = "2.0";

/// One JSON-RPC invocation.
///
/// Serializing the struct directly always emits `params`; use `wrap` to get
/// the bytes the dispatcher actually sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JrpcRequest {
    #[serde(rename = "jsonrpc")]
    pub version: String,
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// Borrowed wire form of a request. Field order matches `JrpcRequest`.
#[derive(Serialize)]
struct Envelope<'a> {
    jsonrpc: &'a str,
    id: &'a str,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<&'a Map<String, Value>>,
}

impl JrpcRequest {
    pub fn new(method: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            version: JSONRPC_VERSION.to_string(),
            id: id.into(),
            method: method.into(),
            params: Map::new(),
        }
    }

    /// Build a request whose id is a fresh random UUID.
    pub fn with_generated_id(method: impl Into<String>) -> Self {
        Self::new(method, Uuid::new_v4().to_string())
    }

    /// Add one parameter, encoding `value` as JSON.
    ///
    /// Fails with `CallError::Serialization` when `value` has no JSON
    /// representation (a map with non-string keys, for instance).
    pub fn with_param<T: Serialize>(mut self, key: impl Into<String>, value: T) -> Result<Self, CallError> {
        let value = serde_json::to_value(value)?;
        self.params.insert(key.into(), value);
        Ok(self)
    }

    /// Replace the whole parameter map.
    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    /// Encode the request into the bytes sent as the HTTP body.
    pub fn wrap(&self, empty_params: EmptyParams) -> Result<Vec<u8>, CallError> {
        let params = match empty_params {
            EmptyParams::Omit if self.params.is_empty() => None,
            _ => Some(&self.params),
        };
        let envelope = Envelope {
            jsonrpc: &self.version,
            id: &self.id,
            method: &self.method,
            params,
        };
        Ok(serde_json::to_vec(&envelope)?)
    }
}

/// Reply shape a JSON-RPC server sends back.
///
/// `result` and `error` fall back to their empty values when the server
/// omits them or sends `null`, so a success reply has a zero `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JrpcResult {
    #[serde(rename = "jsonrpc", default)]
    pub version: String,
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub error: JrpcError,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("rpc error {code}: {message}")]
pub struct JrpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    /// Opaque server-defined payload, left unparsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JrpcError {
    pub fn is_empty(&self) -> bool {
        self.code == 0 && self.message.is_empty() && self.data.is_none()
    }
}

impl JrpcResult {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }

    /// Split the reply into its result map or its error.
    pub fn into_result(self) -> Result<Map<String, Value>, JrpcError> {
        if self.is_error() {
            Err(self.error)
        } else {
            Ok(self.result)
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn ping() -> JrpcRequest {
        JrpcRequest::new("ping", "1")
    }

    #[test]
    fn omits_empty_params() {
        let body = ping().wrap(EmptyParams::Omit).unwrap();
        assert_eq!(
            std::str::from_utf8(&body).unwrap(),
            r#"{"jsonrpc":"2.0","id":"1","method":"ping"}"#
        );
    }

    #[test]
    fn keeps_empty_params_when_asked() {
        let body = ping().wrap(EmptyParams::Keep).unwrap();
        assert_eq!(
            std::str::from_utf8(&body).unwrap(),
            r#"{"jsonrpc":"2.0","id":"1","method":"ping","params":{}}"#
        );
    }

    #[test]
    fn non_empty_params_always_sent() {
        let req = ping().with_param("count", 3).unwrap().with_param("tags", ["a", "b"]).unwrap();
        for mode in [EmptyParams::Omit, EmptyParams::Keep] {
            let body: Value = serde_json::from_slice(&req.wrap(mode).unwrap()).unwrap();
            assert_eq!(body["params"], json!({"count": 3, "tags": ["a", "b"]}));
        }
    }

    #[test]
    fn params_that_look_like_the_empty_marker_survive() {
        // A nested empty object named params must not be touched.
        let req = ping().with_param("params", json!({})).unwrap();
        let body: Value = serde_json::from_slice(&req.wrap(EmptyParams::Omit).unwrap()).unwrap();
        assert_eq!(body["params"], json!({"params": {}}));
    }

    #[test]
    fn unencodable_param_is_a_serialization_error() {
        let mut weird = HashMap::new();
        weird.insert((1, 2), "tuple keys have no JSON form");
        let err = ping().with_param("weird", weird).unwrap_err();
        assert!(matches!(err, CallError::Serialization(_)));
    }

    #[test]
    fn decodes_back_into_the_same_request() {
        let req = JrpcRequest::new("eth_call", "abc")
            .with_param("block", "latest")
            .unwrap()
            .with_param("nested", json!({"a": [1, 2, null]}))
            .unwrap();
        let back: JrpcRequest = serde_json::from_slice(&req.wrap(EmptyParams::Omit).unwrap()).unwrap();
        assert_eq!(back, req);

        let bare = ping();
        let back: JrpcRequest = serde_json::from_slice(&bare.wrap(EmptyParams::Omit).unwrap()).unwrap();
        assert_eq!(back, bare);
    }

    #[test]
    fn generated_ids_are_unique_uuids() {
        let a = JrpcRequest::with_generated_id("ping");
        let b = JrpcRequest::with_generated_id("ping");
        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(&a.id).is_ok());
        assert_eq!(a.version, "2.0");
    }

    #[test]
    fn result_parses_success_reply() {
        let reply = JrpcResult::from_slice(br#"{"jsonrpc":"2.0","id":"7","result":{"pong":true}}"#).unwrap();
        assert_eq!(reply.id, "7");
        assert!(!reply.is_error());
        assert_eq!(reply.into_result().unwrap()["pong"], true);
    }

    #[test]
    fn result_parses_error_reply_with_opaque_data() {
        let reply = JrpcResult::from_slice(
            br#"{"jsonrpc":"2.0","id":"7","result":null,"error":{"code":-32601,"message":"Method not found","data":{"hint":[1]}}}"#,
        )
        .unwrap();
        assert!(reply.is_error());
        assert!(reply.result.is_empty());
        let err = reply.into_result().unwrap_err();
        assert_eq!(err.code, -32601);
        assert_eq!(err.data, Some(json!({"hint": [1]})));
        assert_eq!(err.to_string(), "rpc error -32601: Method not found");
    }
}
