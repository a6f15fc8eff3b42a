//! AquaSentry firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod alert_log;
pub mod app;
pub mod classifier;
pub mod config;
pub mod error;
pub mod monitor;
pub mod pins;
pub mod relay;
pub mod scheduler;
pub mod telemetry;
pub mod ui;

// Hardware-facing modules; the real implementations are guarded by cfg
// attributes inside and fall back to simulation stubs on the host.
pub mod adapters;
pub mod drivers;
pub mod sensors;
