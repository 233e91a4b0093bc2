//! Scenario runner.

use memfree_common::MemoryReport;

use crate::config::{SimConfig, Step};
use crate::error::SimError;
use crate::mcu::SimulatedMcu;

/// Boot a simulated MCU and execute every step, collecting one report per
/// [`Step::Report`].
pub fn run_scenario(config: &SimConfig) -> Result<Vec<MemoryReport>, SimError> {
    let mut mcu = SimulatedMcu::boot(config)?;
    let mut reports = Vec::new();

    for (index, step) in config.steps.iter().enumerate() {
        log::debug!("step {index}: {step:?}");
        match *step {
            Step::Call { frame } => mcu.call(frame)?,
            Step::Return => mcu.ret()?,
            Step::Malloc { bytes } => {
                mcu.malloc(bytes)?;
            }
            Step::Free { id } => mcu.free(id)?,
            Step::Poke { offset, value } => mcu.poke(offset, value)?,
            Step::Report => {
                let report = mcu.report();
                log::info!("{report}");
                reports.push(report);
            }
        }
    }

    Ok(reports)
}

// =============================================================================
// Tests
// =============================================================================
