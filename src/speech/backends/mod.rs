//! Platform-specific speech backends

// Native TTS backend using the tts crate (cross-platform)
#[cfg(feature = "native-tts")]
pub mod native;

// Headless backend that logs each unit
pub mod logging;
