// ZSleuth - platform/mod.rs
//
// Platform abstraction layer.
// Dependencies: core (model types), directories, rfd.
// Must NOT depend on: app, ui.

pub mod config;
pub mod fs;
