//! Request and response shapes exchanged with the script side

use super::client::HttpResponse;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Content type reported when the server does not send one
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

fn default_method() -> String {
    "GET".to_string()
}

/// Request description posted by the script's `fetch` override
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
            headers: BTreeMap::new(),
            body: None,
        }
    }
}

/// Response object handed back to the script
///
/// Transport failures are reported in this same shape with status 500, so
/// the script-side promise always resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
    pub headers: BTreeMap<String, String>,
    #[serde(rename = "contentType", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl FetchResponse {
    /// Synthesized response for a request that never produced one
    pub fn error(message: impl Display) -> Self {
        Self {
            status: 500,
            body: format!("Error: {}", message),
            headers: BTreeMap::new(),
            content_type: None,
        }
    }

    pub fn from_http(response: HttpResponse) -> Self {
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in response.headers {
            headers
                .entry(name.to_ascii_lowercase())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }

        let content_type = headers
            .get("content-type")
            .cloned()
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        Self {
            status: response.status,
            body: response.body,
            headers,
            content_type: Some(content_type),
        }
    }
}
