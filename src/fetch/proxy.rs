//! Fetch proxy
//!
//! Runs script-originated requests on the tokio runtime and pushes the
//! response back through the outbound queue. `request` never waits for the
//! network, and every accepted call ends in exactly one delivered response
//! unless the bridge is torn down first. A callback id that is still in
//! flight is rejected with an immediate error response.

use super::client::{HttpClient, HttpRequest};
use super::correlation::CorrelationTable;
use super::types::{FetchRequest, FetchResponse};
use crate::script::{OutboundQueue, ScriptAction};
use crate::{BridgeError, Result};
use log::{debug, error, warn};
use std::sync::Arc;
use tokio::runtime::Handle;
use url::Url;

/// Delivered when a response cannot be serialized
const SERIALIZATION_FAILURE: &str =
    r#"{"status":500,"body":"Error: response could not be serialized","headers":{}}"#;

pub struct FetchProxy {
    client: Arc<dyn HttpClient>,
    queue: Arc<OutboundQueue>,
    correlations: Arc<CorrelationTable>,
    runtime: Handle,
}

impl FetchProxy {
    pub fn new(client: Arc<dyn HttpClient>, queue: Arc<OutboundQueue>, runtime: Handle) -> Self {
        Self {
            client,
            queue,
            correlations: Arc::new(CorrelationTable::new()),
            runtime,
        }
    }

    /// Requests still waiting for a response
    pub fn correlations(&self) -> &CorrelationTable {
        &self.correlations
    }

    /// Stop delivering responses for everything currently in flight
    pub fn suppress_in_flight(&self) -> usize {
        let count = self.correlations.clear();
        if count > 0 {
            debug!("Suppressing {} in-flight fetch responses", count);
        }
        count
    }

    /// Parse a JSON request description and issue it
    pub fn request_json(&self, raw: &str, callback_id: &str) {
        match serde_json::from_str::<FetchRequest>(raw) {
            Ok(request) => self.request(request, callback_id),
            Err(e) => {
                warn!("Unparseable fetch request for {}: {}", callback_id, e);
                deliver(
                    &self.queue,
                    callback_id,
                    &FetchResponse::error(format!("Invalid request: {}", e)),
                );
            }
        }
    }

    /// Issue `request` and deliver its response to `callback_id` later
    pub fn request(&self, request: FetchRequest, callback_id: &str) {
        let url = match validate_url(&request.url) {
            Ok(url) => url,
            Err(e) => {
                warn!("Rejected fetch {}: {}", callback_id, e);
                deliver(&self.queue, callback_id, &FetchResponse::error(e));
                return;
            }
        };

        let http = HttpRequest {
            url,
            method: request.method.to_ascii_uppercase(),
            headers: request.headers,
            body: request.body,
        };
        debug!("Fetch {} {} {}", callback_id, http.method, http.url);

        if !self.correlations.track(callback_id) {
            deliver(
                &self.queue,
                callback_id,
                &FetchResponse::error(format!("callback id {} is already in flight", callback_id)),
            );
            return;
        }

        let epoch = self.queue.epoch();
        let client = Arc::clone(&self.client);
        let queue = Arc::clone(&self.queue);
        let correlations = Arc::clone(&self.correlations);
        let callback_id = callback_id.to_string();

        self.runtime.spawn(async move {
            let response = match client.execute(http).await {
                Ok(response) => FetchResponse::from_http(response),
                Err(e) => {
                    warn!("Fetch {} failed: {}", callback_id, e);
                    FetchResponse::error(e)
                }
            };

            if correlations.complete(&callback_id).is_none() {
                debug!("Dropping response for {}: bridge was torn down", callback_id);
                return;
            }
            let action = ScriptAction::resolve_fetch(&callback_id, serialize(&callback_id, &response));
            if !queue.deliver_in(epoch, action) {
                debug!("Dropping response for {}: page was reset", callback_id);
            }
        });
    }
}

/// Accept only absolute http(s) URLs
fn validate_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(BridgeError::InvalidUrl(format!("unsupported scheme: {}", other))),
    }
}

fn serialize(callback_id: &str, response: &FetchResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        error!("Failed to serialize response for {}: {}", callback_id, e);
        SERIALIZATION_FAILURE.to_string()
    })
}

fn deliver(queue: &OutboundQueue, callback_id: &str, response: &FetchResponse) {
    queue.deliver(ScriptAction::resolve_fetch(callback_id, serialize(callback_id, response)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/a?b=c").is_ok());
        assert!(validate_url("http://localhost:8080").is_ok());
        assert!(matches!(validate_url("not a url"), Err(BridgeError::InvalidUrl(_))));
        assert!(matches!(validate_url("file:///etc/passwd"), Err(BridgeError::InvalidUrl(_))));
        assert!(validate_url("/relative/path").is_err());
    }

    #[test]
    fn test_serialization_fallback_is_valid_json() {
        let value: serde_json::Value = serde_json::from_str(SERIALIZATION_FAILURE).unwrap();
        assert_eq!(value["status"], 500);
    }
}
