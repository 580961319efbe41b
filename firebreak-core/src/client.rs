//! Authenticated HTTPS client for the FireBreak device's control API.
//!
//! One client is built per invocation from the configuration snapshot and
//! issues exactly one call. Transport failures and non-success device
//! statuses map to 502-class errors; bodies that are over-size or not the
//! expected JSON map to 500-class errors.

use crate::config::Config;
use crate::error::HandlerError;
use crate::port::{PortRecord, PortSelector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The device rejects nothing by size, so we do. Responses larger than this
/// are treated as malformed rather than buffered without bound.
const MAX_RESPONSE_BYTES: usize = 1024 * 1024;

/// Wire shape of `GET /api/websocket/get-all-status`.
#[derive(Debug, Deserialize)]
struct AllStatusResponse {
    ports: Vec<PortRecord>,
}

#[derive(Debug, Serialize)]
struct ControlRequest<'a> {
    port: &'a PortSelector,
    activate: bool,
}

/// Wire shape of `POST /api/websocket/port-control`: a single record for an
/// individual port, a port list for `"all"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ControlOutcome {
    Single(PortRecord),
    All { ports: Vec<PortRecord> },
}

pub struct DeviceClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl DeviceClient {
    /// Builds the HTTP client from the invocation's configuration snapshot.
    pub fn new(config: &Config) -> Result<Self, HandlerError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.disable_ssl_verify)
            .build()
            .map_err(|e| HandlerError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: format!("https://{}/api/websocket", config.api_host),
            api_token: config.api_token.clone(),
        })
    }

    /// Fetches the activation status of all ports. Port numbers come back in
    /// API numbering; the handler translates them at the boundary.
    pub async fn get_all_status(&self) -> Result<Vec<PortRecord>, HandlerError> {
        let url = format!("{}/get-all-status", self.base_url);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_token)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        let status: AllStatusResponse = self.read_json(response).await?;
        Ok(status.ports)
    }

    /// Activates or deactivates one port or all of them in a single
    /// request/response exchange. The selector must already be in API
    /// numbering.
    pub async fn port_control(&self, port: &PortSelector, activate: bool) -> Result<ControlOutcome, HandlerError> {
        let url = format!("{}/port-control", self.base_url);
        debug!("POST {} port={:?} activate={}", url, port, activate);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_token)
            .header("accept", "application/json")
            .json(&ControlRequest { port, activate })
            .send()
            .await
            .map_err(transport_error)?;

        self.read_json(response).await
    }

    /// Checks the device's HTTP status and decodes the body, applying the
    /// response size cap.
    async fn read_json<T: for<'de> Deserialize<'de>>(&self, response: reqwest::Response) -> Result<T, HandlerError> {
        let status = response.status();
        if !status.is_success() {
            warn!("Device returned HTTP {}", status);
            return Err(HandlerError::UpstreamUnreachable(format!("HTTP error: {}", status)));
        }

        let body = response.bytes().await.map_err(transport_error)?;
        if body.len() > MAX_RESPONSE_BYTES {
            return Err(HandlerError::UpstreamResponse(format!(
                "response body exceeds {} bytes",
                MAX_RESPONSE_BYTES
            )));
        }

        serde_json::from_slice(&body).map_err(|e| HandlerError::UpstreamResponse(e.to_string()))
    }
}

/// Classifies a reqwest transport failure. Everything that prevented a
/// response from arriving (connect, TLS, timeout) is a 502-class error.
fn transport_error(e: reqwest::Error) -> HandlerError {
    let kind = if e.is_timeout() {
        "timed out"
    } else if e.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    HandlerError::UpstreamUnreachable(format!("{}: {}", kind, e))
}
