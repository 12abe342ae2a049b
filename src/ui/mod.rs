// logdyn-viewer - ui/mod.rs
//
// UI layer: presentation only. Level styling and HTML markup generated
// from the structured surface model.
// Dependencies: core (read-only models).
// Must NOT depend on: app, platform, direct I/O.

pub mod html;
pub mod theme;
