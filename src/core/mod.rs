// logdyn-viewer - core/mod.rs
//
// Core logic layer: record model, wire format, search filter and the
// display-surface model.
// Dependencies: serde/chrono/regex only.
// Must NOT depend on: ui, platform, app, or any I/O.

pub mod filter;
pub mod model;
pub mod surface;
pub mod wire;
