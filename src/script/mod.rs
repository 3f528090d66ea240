//! Host→script side of the bridge

pub mod action;
pub mod bootstrap;
pub mod executor;
pub mod queue;

pub use action::ScriptAction;
pub use bootstrap::BootstrapScript;
pub use executor::{ChannelExecutor, ScriptExecutor};
pub use queue::OutboundQueue;
