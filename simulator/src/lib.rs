//! Desktop simulator for the AVR memory diagnostics.
//!
//! Runs the portable algorithms from `memfree-common` against a byte array laid
//! out like ATmega SRAM, driven by a scenario of calls, returns and heap
//! operations. Useful for checking readings without hardware.
//!
//! - [`config`]: Scenario file format (TOML)
//! - [`error`]: Simulation errors
//! - [`mcu`]: Simulated SRAM, stack and heap
//! - [`scenario`]: Scenario runner

pub mod config;
pub mod error;
pub mod mcu;
pub mod scenario;

pub use config::{McuProfile, SimConfig, Step};
pub use error::SimError;
pub use mcu::SimulatedMcu;
pub use scenario::run_scenario;
