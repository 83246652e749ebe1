//! Castline headless player
//!
//! Wires the playback orchestrator to a Castline server and a clock-driven
//! stand-in for the audio engine, driven from line commands on stdin.

pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod navigator;

pub use error::{HeadlessError, Result};
