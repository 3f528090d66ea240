//! Script-originated HTTP requests
//!
//! The embedded page cannot reach the network on its own, so its `fetch`
//! calls arrive as messages, run through the host's HTTP client, and come
//! back as response objects keyed by the caller's callback id.

pub mod client;
pub mod correlation;
pub mod proxy;
pub mod types;

pub use client::{HttpClient, HttpRequest, HttpResponse, ReqwestClient};
pub use correlation::{CorrelationEntry, CorrelationTable};
pub use proxy::FetchProxy;
pub use types::{FetchRequest, FetchResponse};
