// ZSleuth - core/mod.rs
//
// Core business logic layer.
// Must NOT depend on: ui, platform, app.

pub mod chart;
pub mod discovery;
pub mod export;
pub mod extract;
pub mod grammar;
pub mod model;
pub mod stats;
pub mod table;
