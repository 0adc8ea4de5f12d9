//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Logging setup
//! - Resource fetching (filesystem natively, HTTP in the browser)
//! - Audio output (logging backend natively, Web Audio in the browser)
//! - The browser-facing `Playground` handle

#[cfg(not(target_arch = "wasm32"))]
pub mod native;
#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(not(target_arch = "wasm32"))]
pub use native::{FsFetcher, LogAudio, init_logging};
#[cfg(target_arch = "wasm32")]
pub use web::{HttpFetcher, Playground, WebAudio, init_logging};
