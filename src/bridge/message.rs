//! The fixed catalog of script→host messages

use crate::{BridgeError, Result};
use serde::Deserialize;
use serde_json::Value;

pub const SPEAK_TEXT: &str = "speakText";
pub const SPEAK_CANCEL: &str = "speakCancel";
pub const SPEAK_PAUSE: &str = "speakPause";
pub const SPEAK_RESUME: &str = "speakResume";
pub const LIBRARY_LOADED: &str = "onJsLibraryLoaded";
pub const LIBRARY_LOAD_ERROR: &str = "onJsLibraryLoadError";
pub const HANDLE_FETCH: &str = "handleFetch";
pub const SAVE_FILE: &str = "saveFileFromBase64";
pub const CLOSE_BEACON_BAR: &str = "closeBeaconBar";

fn default_mime_type() -> String {
    "application/octet-stream".to_string()
}

/// Body of `saveFileFromBase64`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFileRequest {
    pub file_name: String,
    pub base64_data: String,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FetchBody {
    request: String,
    callback_id: String,
}

/// Raw `{name, body}` envelope posted by the page
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub name: String,
    #[serde(default)]
    pub body: Value,
}

/// A validated message from the script engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeMessage {
    SpeakText(Option<String>),
    SpeakCancel,
    SpeakPause,
    SpeakResume,
    LibraryLoaded(String),
    LibraryLoadError(String),
    HandleFetch { request: String, callback_id: String },
    SaveFile(SaveFileRequest),
    CloseBeaconBar,
}

impl BridgeMessage {
    /// Validate `body` against the shape expected for `name`
    ///
    /// Returns `Ok(None)` for names outside the catalog and an error for
    /// bodies missing required fields.
    pub fn parse(name: &str, body: Value) -> Result<Option<Self>> {
        let message = match name {
            SPEAK_TEXT => match body {
                Value::Null => BridgeMessage::SpeakText(None),
                Value::String(text) => BridgeMessage::SpeakText(Some(text)),
                other => {
                    return Err(BridgeError::Payload(format!(
                        "{} expects a string, got {}",
                        name,
                        kind(&other)
                    )))
                }
            },
            SPEAK_CANCEL => BridgeMessage::SpeakCancel,
            SPEAK_PAUSE => BridgeMessage::SpeakPause,
            SPEAK_RESUME => BridgeMessage::SpeakResume,
            LIBRARY_LOADED => BridgeMessage::LibraryLoaded(describe(body)),
            LIBRARY_LOAD_ERROR => BridgeMessage::LibraryLoadError(describe(body)),
            HANDLE_FETCH => {
                let body: FetchBody = from_body(name, body)?;
                BridgeMessage::HandleFetch {
                    request: body.request,
                    callback_id: body.callback_id,
                }
            }
            SAVE_FILE => BridgeMessage::SaveFile(from_body(name, body)?),
            CLOSE_BEACON_BAR => BridgeMessage::CloseBeaconBar,
            _ => return Ok(None),
        };
        Ok(Some(message))
    }

    pub fn name(&self) -> &'static str {
        match self {
            BridgeMessage::SpeakText(_) => SPEAK_TEXT,
            BridgeMessage::SpeakCancel => SPEAK_CANCEL,
            BridgeMessage::SpeakPause => SPEAK_PAUSE,
            BridgeMessage::SpeakResume => SPEAK_RESUME,
            BridgeMessage::LibraryLoaded(_) => LIBRARY_LOADED,
            BridgeMessage::LibraryLoadError(_) => LIBRARY_LOAD_ERROR,
            BridgeMessage::HandleFetch { .. } => HANDLE_FETCH,
            BridgeMessage::SaveFile(_) => SAVE_FILE,
            BridgeMessage::CloseBeaconBar => CLOSE_BEACON_BAR,
        }
    }
}

/// Deserialize an object body, also accepting it pre-stringified
fn from_body<T: serde::de::DeserializeOwned>(name: &str, body: Value) -> Result<T> {
    let body = match body {
        Value::String(text) => serde_json::from_str(&text)
            .map_err(|e| BridgeError::Payload(format!("{}: {}", name, e)))?,
        other => other,
    };
    serde_json::from_value(body).map_err(|e| BridgeError::Payload(format!("{}: {}", name, e)))
}

/// Free-form diagnostic text from any body
fn describe(body: Value) -> String {
    match body {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
