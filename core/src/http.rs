//! HTTP transport seam and the plain-data types that cross it.
//!
//! # Design
//! The dispatcher never names a concrete HTTP client. It hands an
//! `HttpRequest` to whatever `Transport` the destination carries and gets
//! back a response head plus an open body stream. Requests and snapshots use
//! owned `String` / `Vec` fields so they outlive the connection that produced
//! them.

use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;

use http::{Method, StatusCode, Version};
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::error::{CallError, TransportError};

/// An outgoing HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Negotiated TLS parameters, when the transport can report them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsInfo {
    pub version: Option<String>,
    pub cipher_suite: Option<String>,
    pub server_name: Option<String>,
    pub peer_certificates: Vec<Vec<u8>>,
}

/// Everything about a response except its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub version: Version,
    pub headers: Vec<(String, String)>,
    pub trailers: Vec<(String, String)>,
    /// The transport transparently decompressed the body.
    pub uncompressed: bool,
    pub tls: Option<TlsInfo>,
}

impl ResponseHead {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            version: Version::HTTP_11,
            headers: Vec::new(),
            trailers: Vec::new(),
            uncompressed: false,
            tls: None,
        }
    }

    /// First value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A readable response body that may need explicit release.
///
/// `close` is called exactly once by the snapshot path after reading, whether
/// or not the read succeeded.
pub trait ResponseBody: Read + Send {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ResponseBody for io::Cursor<Vec<u8>> {}

impl ResponseBody for io::Empty {}

/// What a transport hands back: head plus open body stream.
pub struct ResponseParts {
    pub head: ResponseHead,
    pub body: Box<dyn ResponseBody>,
}

impl ResponseParts {
    pub fn new(head: ResponseHead, body: impl ResponseBody + 'static) -> Self {
        Self {
            head,
            body: Box::new(body),
        }
    }
}

impl fmt::Debug for ResponseParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseParts").field("head", &self.head).finish_non_exhaustive()
    }
}

/// Executes one HTTP round trip.
///
/// Timeouts, TLS, proxies and connection reuse are the implementation's
/// business. Sharing one transport across threads is only as safe as the
/// implementation makes it.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<ResponseParts, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<ResponseParts, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &HttpRequest) -> Result<ResponseParts, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &HttpRequest) -> Result<ResponseParts, TransportError> {
        (**self).execute(request)
    }
}

/// A live response whose body stream is still open.
///
/// The caller owns the stream: read it, then `close` it (dropping also
/// releases it, but skips the close error).
pub struct RawResponse {
    pub request: HttpRequest,
    pub head: ResponseHead,
    pub body: Box<dyn ResponseBody>,
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse")
            .field("request", &self.request)
            .field("head", &self.head)
            .finish_non_exhaustive()
    }
}

impl RawResponse {
    pub(crate) fn new(request: HttpRequest, parts: ResponseParts) -> Self {
        Self {
            request,
            head: parts.head,
            body: parts.body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.head.status
    }

    /// Release the body stream without reading the rest of it.
    pub fn close(mut self) -> io::Result<()> {
        self.body.close()
    }

    /// Drain the body into memory and close the stream.
    ///
    /// The stream is closed on every path. A read failure wins over a close
    /// failure, which is kept as `CallError::BodyRead::close`.
    pub fn into_snapshot(self) -> Result<HttpResponse, CallError> {
        let RawResponse {
            request,
            head,
            mut body,
        } = self;

        let mut bytes = Vec::new();
        let read = body.read_to_end(&mut bytes);
        let close = body.close();
        drop(body);

        match (read, close) {
            (Err(source), close) => Err(CallError::BodyRead {
                source,
                close: close.err(),
            }),
            (Ok(_), Err(err)) => Err(CallError::BodyClose(err)),
            (Ok(n), Ok(())) => {
                trace!(bytes = n, "drained response body");
                Ok(HttpResponse::from_parts(request, head, bytes))
            }
        }
    }
}

/// A fully materialized, connection-independent copy of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status line, e.g. `200 OK`.
    pub status: String,
    pub status_code: u16,
    /// Protocol string, e.g. `HTTP/1.1`.
    pub proto: String,
    pub proto_major: u8,
    pub proto_minor: u8,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// `None` when the length is unknown or the body is chunked.
    pub content_length: Option<u64>,
    pub transfer_encoding: Vec<String>,
    /// The server will close the connection after this response.
    pub close: bool,
    pub uncompressed: bool,
    pub trailers: Vec<(String, String)>,
    pub request: HttpRequest,
    pub tls: Option<TlsInfo>,
}

impl HttpResponse {
    fn from_parts(request: HttpRequest, head: ResponseHead, body: Vec<u8>) -> Self {
        let (proto, proto_major, proto_minor) = proto_parts(head.version);
        let status = match head.status.canonical_reason() {
            Some(reason) => format!("{} {reason}", head.status.as_u16()),
            None => head.status.as_u16().to_string(),
        };

        let transfer_encoding: Vec<String> = find_header(&head.headers, "transfer-encoding")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_ascii_lowercase())
                    .filter(|s| !s.is_empty() && s != "identity")
                    .collect()
            })
            .unwrap_or_default();

        let content_length = if transfer_encoding.is_empty() {
            find_header(&head.headers, "content-length").and_then(|v| v.trim().parse().ok())
        } else {
            None
        };

        let close = wants_close(head.version, find_header(&head.headers, "connection"));

        Self {
            status,
            status_code: head.status.as_u16(),
            proto: proto.to_string(),
            proto_major,
            proto_minor,
            headers: head.headers,
            body,
            content_length,
            transfer_encoding,
            close,
            uncompressed: head.uncompressed,
            trailers: head.trailers,
            request,
            tls: head.tls,
        }
    }

    /// First value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Decode the body as JSON, typically into a `JrpcResult`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn proto_parts(version: Version) -> (&'static str, u8, u8) {
    match version {
        Version::HTTP_09 => ("HTTP/0.9", 0, 9),
        Version::HTTP_10 => ("HTTP/1.0", 1, 0),
        Version::HTTP_2 => ("HTTP/2.0", 2, 0),
        Version::HTTP_3 => ("HTTP/3.0", 3, 0),
        _ => ("HTTP/1.1", 1, 1),
    }
}

fn wants_close(version: Version, connection: Option<&str>) -> bool {
    let has_token = |token: &str| {
        connection
            .map(|v| v.split(',').any(|t| t.trim().eq_ignore_ascii_case(token)))
            .unwrap_or(false)
    };
    if has_token("close") {
        return true;
    }
    matches!(version, Version::HTTP_09 | Version::HTTP_10) && !has_token("keep-alive")
}
