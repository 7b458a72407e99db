// ZSleuth - app/mod.rs
//
// Application layer: pipeline orchestration, grammar resolution, viewer state.
// Dependencies: core, platform.
// Must NOT depend on: ui.

pub mod grammar_mgr;
pub mod pipeline;
pub mod state;
