// logdyn-viewer - platform/mod.rs
//
// Platform abstraction layer: config directory resolution and config.toml.
// Dependencies: standard library, directories crate (native only), and the
// transport settings type it produces.
// Must NOT depend on: ui.

pub mod config;
