//! Headless host for the tile world engine: scenario config, event bus,
//! chunk persistence, a scripted walker and an ASCII debug view.

pub mod config;
pub mod debug_view;
pub mod event_bus;
pub mod persistence;
pub mod simulation;
