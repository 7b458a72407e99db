// ZSleuth - ui/panels/mod.rs

pub mod about;
pub mod chart;
pub mod summary;
