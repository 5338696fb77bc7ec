//! Per-destination call behaviour.
//!
//! Both knobs deserialize from snake_case strings so they can sit next to the
//! destination in a config file.

use serde::{Deserialize, Serialize};

/// What the envelope builder does with an empty `params` map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyParams {
    /// Leave the `params` key out of the envelope entirely.
    #[default]
    Omit,
    /// Always send `params`, as `{}` when there are none.
    Keep,
}

/// Shape of a successful call's return value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// Hand back the live response with its body stream still open.
    Raw,
    /// Drain and close the body, returning a self-contained `HttpResponse`.
    #[default]
    Snapshot,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallOptions {
    pub empty_params: EmptyParams,
    pub response_mode: ResponseMode,
}

impl CallOptions {
    pub fn with_empty_params(mut self, empty_params: EmptyParams) -> Self {
        self.empty_params = empty_params;
        self
    }

    pub fn with_response_mode(mut self, response_mode: ResponseMode) -> Self {
        self.response_mode = response_mode;
        self
    }
}
