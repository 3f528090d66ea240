//! beacon-bridge - native bridge for an embedded web widget
//!
//! Exposes speech playback, proxied HTTP and file export to a third-party
//! widget running in a web view, through a fixed set of named messages.

pub mod bridge;
pub mod config;
pub mod error;
pub mod fetch;
pub mod notify;
pub mod script;
pub mod speech;

pub use bridge::{Bridge, BridgeParts};
pub use error::{BridgeError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "beacon-bridge";
