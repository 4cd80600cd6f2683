//! Segue CLI Library
//!
//! Command-line host for the playback controller: configuration loading and a
//! simulated media engine to drive it without real audio output.
//!
//! This library exposes the host components for testing purposes.

pub mod config;
pub mod error;
pub mod simulation;

// Re-export commonly used types for convenience
pub use config::{CliConfig, SimulationSettings};
pub use error::{CliError, Result};
pub use simulation::{SimulatedBackground, SimulatedEngine};
