//! Client helper for JSON-RPC calls over HTTP.
//!
//! # Overview
//! Build a `JrpcRequest`, point a `Destination` at a server, and `call` it.
//! The destination carries the HTTP client as a `Transport`, so the core has
//! no fixed dependency on any HTTP library; `UreqTransport` is provided
//! behind the default `ureq` feature.
//!
//! # Design
//! - One dispatcher, two knobs (`CallOptions`): whether an empty `params`
//!   map is sent, and whether the caller gets the live response or a
//!   drained `HttpResponse` snapshot.
//! - Errors are returned, never logged or retried.
//! - `JrpcResult` describes the reply shape; parsing the body into it is up
//!   to the caller.

pub mod client;
pub mod destination;
pub mod envelope;
pub mod error;
pub mod http;
pub mod options;
#[cfg(feature = "ureq")]
pub mod transport;

pub use client::{CallResponse, CONTENT_TYPE_JSON};
pub use destination::{Destination, DestinationConfig};
pub use envelope::{JrpcError, JrpcRequest, JrpcResult, JSONRPC_VERSION};
pub use error::{CallError, TransportError};
pub use self::http::{HttpRequest, HttpResponse, RawResponse, ResponseBody, ResponseHead, ResponseParts, TlsInfo, Transport};
pub use options::{CallOptions, EmptyParams, ResponseMode};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
