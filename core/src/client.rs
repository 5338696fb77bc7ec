//! Call dispatcher: envelope in, HTTP response out.
//!
//! # Design
//! A call is one linear pass: validate the destination, encode the envelope,
//! build the URL and request, execute it through the destination's
//! transport, then either hand back the live response or drain it into a
//! snapshot. Each step fails with its own `CallError` variant and nothing is
//! retried. No I/O happens before the request is fully built.

use http::{Method, Uri};
use tracing::debug;

use crate::destination::Destination;
use crate::envelope::JrpcRequest;
use crate::error::CallError;
use crate::http::{HttpRequest, HttpResponse, RawResponse, Transport};
use crate::options::{EmptyParams, ResponseMode};

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Result of `Destination::call`, shaped by `CallOptions::response_mode`.
#[derive(Debug)]
pub enum CallResponse {
    Raw(RawResponse),
    Snapshot(HttpResponse),
}

impl CallResponse {
    /// The snapshot, draining the live body first if needed.
    pub fn into_snapshot(self) -> Result<HttpResponse, CallError> {
        match self {
            CallResponse::Raw(raw) => raw.into_snapshot(),
            CallResponse::Snapshot(snap) => Ok(snap),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            CallResponse::Raw(raw) => raw.head.status.as_u16(),
            CallResponse::Snapshot(snap) => snap.status_code,
        }
    }
}

impl<C: Transport> Destination<C> {
    /// Send `jrpc` using this destination's options.
    pub fn call(&self, jrpc: &JrpcRequest) -> Result<CallResponse, CallError> {
        let raw = self.dispatch(jrpc, self.options.empty_params)?;
        match self.options.response_mode {
            ResponseMode::Raw => Ok(CallResponse::Raw(raw)),
            ResponseMode::Snapshot => raw.into_snapshot().map(CallResponse::Snapshot),
        }
    }

    /// Send `jrpc` and return the live response. The caller must read and
    /// close its body.
    pub fn call_raw(&self, jrpc: &JrpcRequest) -> Result<RawResponse, CallError> {
        self.dispatch(jrpc, self.options.empty_params)
    }

    /// Send `jrpc` and return a fully drained snapshot. The body stream is
    /// closed before this returns.
    pub fn call_snapshot(&self, jrpc: &JrpcRequest) -> Result<HttpResponse, CallError> {
        self.dispatch(jrpc, self.options.empty_params)?.into_snapshot()
    }

    /// Build the request without sending it.
    pub fn build_request(&self, jrpc: &JrpcRequest, empty_params: EmptyParams) -> Result<HttpRequest, CallError> {
        self.validate()?;
        let body = jrpc.wrap(empty_params)?;
        let url = self.url();

        let method = Method::from_bytes(self.method.as_bytes())
            .map_err(|e| CallError::RequestConstruction(format!("invalid method {:?}: {e}", self.method)))?;
        let uri: Uri = url
            .parse()
            .map_err(|e| CallError::RequestConstruction(format!("invalid url {url:?}: {e}")))?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(CallError::RequestConstruction(format!("url {url:?} is not absolute")));
        }

        Ok(HttpRequest {
            method,
            url,
            headers: vec![("content-type".to_string(), CONTENT_TYPE_JSON.to_string())],
            body,
        })
    }

    fn dispatch(&self, jrpc: &JrpcRequest, empty_params: EmptyParams) -> Result<RawResponse, CallError> {
        let request = self.build_request(jrpc, empty_params)?;
        debug!(
            method = %request.method,
            url = %request.url,
            rpc_method = %jrpc.method,
            body_len = request.body.len(),
            "dispatching json-rpc call"
        );
        let parts = self.client.execute(&request)?;
        debug!(status = parts.head.status.as_u16(), "received response");
        Ok(RawResponse::new(request, parts))
    }
}
