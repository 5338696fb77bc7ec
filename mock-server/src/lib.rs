use axum::{
    body::Bytes,
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const PARAMS_HEADER: &str = "x-received-params";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const REQUESTED_FAILURE: i64 = -32000;

/// Incoming envelope. `params` is `None` when the key was absent or null.
#[derive(Debug, Deserialize)]
pub struct RpcCall {
    pub jsonrpc: String,
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcReply {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcFault>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcFault {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcReply {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(RpcFault {
                code,
                message: message.into(),
                data,
            }),
        }
    }
}

/// Echo server: every POST, on any path, is answered with a reply that
/// reflects the call back to the sender.
pub fn app() -> Router {
    Router::new().route("/", post(handle_call)).route("/{*path}", post(handle_call))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn handle_call(uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!("rejecting unparseable body: {}", e);
            let reply = RpcReply::failure(Value::Null, PARSE_ERROR, "Parse error", Some(json!(e.to_string())));
            return (StatusCode::BAD_REQUEST, Json(reply)).into_response();
        }
    };

    let call: RpcCall = match serde_json::from_value(value) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!("rejecting malformed envelope: {}", e);
            let reply = RpcReply::failure(Value::Null, INVALID_REQUEST, "Invalid Request", Some(json!(e.to_string())));
            return (StatusCode::BAD_REQUEST, Json(reply)).into_response();
        }
    };

    tracing::debug!("{} {} (id {})", uri.path(), call.method, call.id);

    let params_seen = if call.params.is_some() { "present" } else { "absent" };
    let reply = if call.method == "fail" {
        RpcReply::failure(call.id, REQUESTED_FAILURE, "requested failure", call.params)
    } else {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        RpcReply::success(
            call.id,
            json!({
                "jsonrpc": call.jsonrpc,
                "method": call.method,
                "params": call.params,
                "path": uri.path(),
                "content_type": content_type,
            }),
        )
    };

    let mut response = Json(reply).into_response();
    response
        .headers_mut()
        .insert(PARAMS_HEADER, HeaderValue::from_static(params_seen));
    response
}
