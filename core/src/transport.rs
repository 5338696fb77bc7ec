//! Blocking `Transport` backed by `ureq`.
//!
//! Non-2xx statuses come back as ordinary responses; only connection-level
//! failures become `TransportError`s. ureq does not expose the negotiated TLS
//! state, so `ResponseHead::tls` is always `None` here.

use std::fmt;
use std::io::{self, Read};

use http::Request;

use crate::error::TransportError;
use crate::http::{HttpRequest, ResponseBody, ResponseHead, ResponseParts, Transport};

#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Use a preconfigured agent (timeouts, proxy, TLS). The agent should
    /// have `http_status_as_error` disabled, or error statuses surface as
    /// transport failures.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<ResponseParts, TransportError> {
        let mut builder = Request::builder().method(request.method.clone()).uri(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let outgoing = builder.body(request.body.as_slice()).map_err(TransportError::new)?;

        let response = self.agent.run(outgoing).map_err(TransportError::new)?;
        let (parts, body) = response.into_parts();

        let head = ResponseHead {
            status: parts.status,
            version: parts.version,
            headers: parts
                .headers
                .iter()
                .map(|(k, v)| (k.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
                .collect(),
            trailers: Vec::new(),
            uncompressed: false,
            tls: None,
        };

        Ok(ResponseParts::new(head, UreqBody(body.into_reader())))
    }
}

struct UreqBody(ureq::BodyReader<'static>);

impl Read for UreqBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

// Dropping the reader hands the connection back to the agent's pool.
impl ResponseBody for UreqBody {}
