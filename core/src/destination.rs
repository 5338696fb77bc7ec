//! Where and how a call is sent.

use serde::{Deserialize, Serialize};

use crate::error::CallError;
use crate::options::CallOptions;

/// Serializable destination settings, without the client.
///
/// Every field defaults, so a partial config deserializes and is rejected
/// later by `Destination::validate` if something required is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
    pub method: String,
    pub protocol: String,
    #[serde(rename = "ip", alias = "host")]
    pub host: String,
    pub port: u16,
    pub path: String,
    pub options: CallOptions,
}

/// A network target plus the transport used to reach it.
#[derive(Debug, Clone)]
pub struct Destination<C> {
    pub client: C,
    pub method: String,
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub options: CallOptions,
}

impl<C> Destination<C> {
    pub fn from_config(client: C, config: DestinationConfig) -> Self {
        Self {
            client,
            method: config.method,
            protocol: config.protocol,
            host: config.host,
            port: config.port,
            path: config.path,
            options: config.options,
        }
    }

    pub fn with_options(mut self, options: CallOptions) -> Self {
        self.options = options;
        self
    }

    /// Check the fields a call cannot do without. Port and path are not
    /// checked.
    pub fn validate(&self) -> Result<(), CallError> {
        if self.method.is_empty() {
            return Err(CallError::InvalidDestination("method"));
        }
        if self.protocol.is_empty() {
            return Err(CallError::InvalidDestination("protocol"));
        }
        if self.host.is_empty() {
            return Err(CallError::InvalidDestination("host"));
        }
        Ok(())
    }

    /// `{protocol}://{host}:{port}`, plus `/{path}` when a path is set.
    pub fn url(&self) -> String {
        let url = format!("{}://{}:{}", self.protocol, self.host, self.port);
        if self.path.is_empty() {
            url
        } else {
            format!("{url}/{}", self.path)
        }
    }
}
