// logdyn-viewer - lib.rs
//
// Library entry point. Exposes the host-independent layers for the native
// replay binary and integration tests; the browser host lives in `web` and
// is only compiled for wasm32.

pub mod app;
pub mod core;
pub mod platform;
pub mod ui;
pub mod util;

#[cfg(target_arch = "wasm32")]
pub mod web;
