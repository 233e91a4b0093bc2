//! Memory diagnostics simulator.
//!
//! Runs a scenario against simulated ATmega SRAM and logs a report line for
//! every `report` step, followed by the low-water marks.
//!
//! ```bash
//! cargo run -p memfree-simulator -- simulator/scenarios/recursion.toml
//! ```
//!
//! Without an argument the built-in scenario runs.

use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use memfree_common::ReportHistory;
use memfree_simulator::{SimConfig, run_scenario};

fn main() -> Result<()> {
    // Default log level to "info"
    if env::var("RUST_LOG").is_err() {
        unsafe { env::set_var("RUST_LOG", "info") }
    }
    pretty_env_logger::init();

    let config = match env::args_os().nth(1) {
        Some(path) => SimConfig::load(Path::new(&path))?,
        None => {
            info!("no scenario given, running the built-in one");
            SimConfig::default()
        }
    };

    let reports = run_scenario(&config).context("scenario aborted")?;

    let mut history = ReportHistory::new();
    for report in &reports {
        history.push(*report);
    }

    match (history.min_free_memory(), history.min_stack_unused()) {
        (Some(min_free), Some(min_unused)) => {
            info!("{} reports, low-water: free={min_free} unused={min_unused}", reports.len());
        }
        _ => info!("scenario has no report steps"),
    }

    Ok(())
}
