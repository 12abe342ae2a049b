// logdyn-viewer - app/mod.rs
//
// Application layer: transport, renderer and the seams hosts plug into.
// Dependencies: core layer, ui markup (for mounts that render HTML).
// Must NOT depend on: platform specifics or any browser API.

pub mod channel;
pub mod console;
pub mod renderer;
pub mod replay;
pub mod transport;
