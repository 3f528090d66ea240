//! Configuration management
//!
//! Settings live in an INI file (`~/.beacon-bridge.cfg` by default). The
//! raw file is kept around so hosts can read and update individual keys,
//! and typed views are built from it for each component.

use crate::{BridgeError, Result};
use ini::Ini;
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Widget script loaded when no custom URL is configured
pub const DEFAULT_SCRIPT_URL: &str = "https://beacon-v2.helpscout.net";

/// Identity and bootstrap settings for the embedded widget
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetConfig {
    /// Organization the widget belongs to
    pub org_id: String,

    /// Identifier of the signed-in user
    pub user: String,

    /// Verbose logging in both host and injected script
    pub debug: bool,

    /// Custom widget script URL, if any
    pub script_url: Option<Url>,

    /// Free-form user metadata handed to the widget as JSON
    pub user_metadata: Option<serde_json::Value>,

    /// Storage values seeded before the widget loads
    pub storage: StorageSeed,
}

impl WidgetConfig {
    pub fn new(org_id: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            org_id: org_id.into(),
            user: user.into(),
            debug: false,
            script_url: None,
            user_metadata: None,
            storage: StorageSeed::default(),
        }
    }

    /// The widget script URL, falling back to the default
    pub fn script_url(&self) -> &str {
        self.script_url
            .as_ref()
            .map(Url::as_str)
            .unwrap_or(DEFAULT_SCRIPT_URL)
    }
}

/// Key/value pairs written into the page's storage during bootstrap
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSeed {
    pub local_storage: BTreeMap<String, String>,
    pub session_storage: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
}

impl StorageSeed {
    pub fn is_empty(&self) -> bool {
        self.local_storage.is_empty() && self.session_storage.is_empty() && self.cookies.is_empty()
    }
}

/// HTTP timeouts for the fetch proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(10_000),
            timeout: Duration::from_millis(30_000),
        }
    }
}

/// Playback tuning for the speech engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechSettings {
    /// Pause between consecutive units
    pub unit_gap: Duration,
    /// Speech rate (0-100)
    pub rate: Option<u8>,
    /// Speech volume (0-100)
    pub volume: Option<u8>,
    /// Voice index for the TTS engine
    pub voice_idx: Option<usize>,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            unit_gap: Duration::from_millis(150),
            rate: None,
            volume: None,
            voice_idx: None,
        }
    }
}

/// Application configuration backed by an INI file
pub struct Config {
    /// INI configuration storage
    ini: Ini,

    /// Config file path
    path: PathBuf,
}

impl Config {
    /// Load configuration from the default location or create it
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from `path`, writing defaults there if it is missing
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        debug!("Loading config from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(&path)
                .map_err(|e| BridgeError::IniParse(format!("Failed to load config: {}", e)))?
        } else {
            info!("Config file not found, creating default");
            let default = Self::default_config();
            default
                .write_to_file(&path)
                .map_err(|e| BridgeError::IniParse(format!("Failed to write config: {}", e)))?;
            default
        };

        Ok(Self { ini, path })
    }

    /// Wrap an in-memory INI document
    pub fn from_ini(ini: Ini) -> Self {
        Self {
            ini,
            path: PathBuf::new(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        debug!("Saving config to {:?}", self.path);
        self.ini
            .write_to_file(&self.path)
            .map_err(|e| BridgeError::Config(format!("Failed to save config: {}", e)))
    }

    fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".beacon-bridge.cfg")
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create default configuration
    fn default_config() -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("widget"))
            .set("org_id", "")
            .set("user", "")
            .set("debug", "false");

        ini.with_section(Some("fetch"))
            .set("connect_timeout_ms", "10000")
            .set("timeout_ms", "30000");

        ini.with_section(Some("speech")).set("unit_gap_ms", "150");

        ini.with_section(Some("export")).set("directory", ".");

        ini.with_section(Some("metadata"));

        ini
    }

    /// Get a boolean value from config
    pub fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get a string value from config
    pub fn get_string(&self, section: &str, key: &str, default: &str) -> String {
        self.ini
            .get_from(Some(section), key)
            .unwrap_or(default)
            .to_string()
    }

    /// Get an integer value from config
    pub fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Set a value in config
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.with_section(Some(section)).set(key, value);
    }

    /// All key/value pairs of a section, in file order
    fn section_map(&self, section: &str) -> BTreeMap<String, String> {
        self.ini
            .section(Some(section))
            .map(|props| {
                props
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Milliseconds setting as a duration, ignoring negative values
    fn get_millis(&self, section: &str, key: &str, default: Duration) -> Duration {
        u64::try_from(self.get_int(section, key, -1))
            .map(Duration::from_millis)
            .unwrap_or(default)
    }

    /// Widget identity, script URL, metadata and storage seeds
    pub fn widget(&self) -> Result<WidgetConfig> {
        let org_id = self.get_string("widget", "org_id", "");
        if org_id.trim().is_empty() {
            return Err(BridgeError::Config("widget.org_id is not set".to_string()));
        }

        let script_url = match self.get_string("widget", "script_url", "").trim() {
            "" => None,
            raw => Some(Url::parse(raw).map_err(|e| {
                BridgeError::Config(format!("widget.script_url is invalid: {}", e))
            })?),
        };

        let metadata = self.section_map("metadata");
        let user_metadata = if metadata.is_empty() {
            None
        } else {
            Some(serde_json::to_value(metadata)?)
        };

        Ok(WidgetConfig {
            org_id,
            user: self.get_string("widget", "user", ""),
            debug: self.get_bool("widget", "debug", false),
            script_url,
            user_metadata,
            storage: StorageSeed {
                local_storage: self.section_map("local_storage"),
                session_storage: self.section_map("session_storage"),
                cookies: self.section_map("cookies"),
            },
        })
    }

    /// HTTP timeouts for the fetch proxy
    pub fn fetch(&self) -> FetchSettings {
        let defaults = FetchSettings::default();
        FetchSettings {
            connect_timeout: self.get_millis("fetch", "connect_timeout_ms", defaults.connect_timeout),
            timeout: self.get_millis("fetch", "timeout_ms", defaults.timeout),
        }
    }

    /// Speech playback settings
    pub fn speech(&self) -> SpeechSettings {
        SpeechSettings {
            unit_gap: self.get_millis("speech", "unit_gap_ms", SpeechSettings::default().unit_gap),
            rate: self
                .get_int("speech", "rate", -1)
                .try_into()
                .ok()
                .filter(|&r| r <= 100),
            volume: self
                .get_int("speech", "volume", -1)
                .try_into()
                .ok()
                .filter(|&v| v <= 100),
            voice_idx: self.get_int("speech", "voice_idx", -1).try_into().ok(),
        }
    }

    /// Directory that exported files are written into
    pub fn export_dir(&self) -> PathBuf {
        PathBuf::from(self.get_string("export", "directory", "."))
    }
}
