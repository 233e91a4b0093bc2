//! Scenario configuration.
//!
//! A scenario picks an MCU profile, the static data sizes the linker would
//! produce, and a list of steps to execute after boot:
//!
//! ```toml
//! mcu = "atmega328p"
//! data_bytes = 32
//! bss_bytes = 96
//!
//! [[steps]]
//! op = "call"
//! frame = 24
//!
//! [[steps]]
//! op = "report"
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use memfree_common::config::{ATMEGA2560, ATMEGA328P, McuRam};
use serde::Deserialize;

/// Simulated part.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum McuProfile {
    /// 2KB SRAM, 16-bit program counter.
    #[default]
    Atmega328p,
    /// 8KB SRAM, 22-bit program counter.
    Atmega2560,
}

impl McuProfile {
    /// SRAM map of the part.
    pub const fn ram(self) -> McuRam {
        match self {
            Self::Atmega328p => ATMEGA328P,
            Self::Atmega2560 => ATMEGA2560,
        }
    }

    /// Bytes a `call` pushes for the return address.
    pub const fn return_address_bytes(self) -> usize {
        match self {
            Self::Atmega328p => 2,
            Self::Atmega2560 => 3,
        }
    }
}

/// One scenario step.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Call a function whose frame holds `frame` bytes besides the return address.
    Call { frame: usize },
    /// Return from the innermost call.
    Return,
    /// `malloc(bytes)`; allocations are numbered from 0 in order.
    Malloc { bytes: usize },
    /// `free()` the allocation with this number.
    Free { id: usize },
    /// Store `value` at `_end + offset`, e.g. a sentinel-valued static.
    Poke { offset: usize, value: u8 },
    /// Take a memory report.
    Report,
}

/// Complete scenario.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub mcu: McuProfile,
    /// Size of `.data`.
    pub data_bytes: usize,
    /// Size of `.bss`.
    pub bss_bytes: usize,
    /// Run the boot-time painter (disable to see an unpainted reading).
    pub paint: bool,
    pub steps: Vec<Step>,
}

impl Default for SimConfig {
    fn default() -> Self {
        let mut steps = vec![Step::Report];
        for depth in 1..=6 {
            steps.push(Step::Call { frame: 16 * depth });
            steps.push(Step::Report);
        }
        steps.push(Step::Malloc { bytes: 64 });
        steps.push(Step::Malloc { bytes: 32 });
        steps.push(Step::Free { id: 0 });
        steps.extend(std::iter::repeat_n(Step::Return, 6));
        steps.push(Step::Report);

        Self {
            mcu: McuProfile::default(),
            data_bytes: 0x20,
            bss_bytes: 0x60,
            paint: true,
            steps,
        }
    }
}

impl SimConfig {
    /// Parse a scenario from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> { toml::from_str(text) }

    /// Load a scenario file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing scenario {}", path.display()))
    }
}

// =============================================================================
// Tests
// =============================================================================
