//! Free-memory and stack-watermark probes for AVR firmware.
//!
//! This library binds the portable algorithms in `memfree-common` to the real
//! hardware: linker symbols, volatile SRAM access and the boot-time painter. The
//! binary (`main.rs`) is a demo firmware that prints periodic reports over serial.
//!
//! # Boot Sequence
//!
//! 1. `.init1`: [`stack_paint`] fills `_end..=__stack` with `0xC5`
//! 2. `.init2`..`.init9`: avr-libc clears `r1`, sets SP, copies `.data`, clears `.bss`
//! 3. `main`: [`free_memory`], [`stack_count`] and [`report`] can be called at any time
//!
//! # Testing
//!
//! Run tests on host with:
//! ```bash
//! cargo test -p memfree-avr --lib --target x86_64-unknown-linux-gnu
//! ```
//!
//! The painter disassembly check lives in `tests/codegen.rs` and needs a built
//! firmware ELF (see that file).

// Use no_std only when NOT testing (tests need std for the test harness)
#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]

#[cfg(all(feature = "atmega328p", feature = "atmega2560"))]
compile_error!("select exactly one board profile: `atmega328p` or `atmega2560`");

pub mod probe;
pub mod sram;

// Target-only: linker symbols and the naked painter
#[cfg(target_arch = "avr")]
mod paint;
#[cfg(target_arch = "avr")]
mod symbols;

use memfree_common::config::McuRam;
pub use memfree_common::{MemoryBounds, MemoryHealth, MemoryReport, ReportHistory, STACK_CANARY};
#[cfg(target_arch = "avr")]
pub use paint::stack_paint;
pub use probe::free_memory_in;
#[cfg(target_arch = "avr")]
pub use probe::{free_memory, report, stack_count};
pub use sram::VolatileSram;
#[cfg(target_arch = "avr")]
pub use symbols::{AvrBounds, linker_layout};

/// SRAM map of the selected board profile.
#[cfg(feature = "atmega2560")]
pub const MCU_RAM: McuRam = memfree_common::config::ATMEGA2560;

/// SRAM map of the selected board profile.
#[cfg(not(feature = "atmega2560"))]
pub const MCU_RAM: McuRam = memfree_common::config::ATMEGA328P;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_is_uno() {
        #[cfg(not(feature = "atmega2560"))]
        assert_eq!(MCU_RAM.end, 0x08FF);
        #[cfg(feature = "atmega2560")]
        assert_eq!(MCU_RAM.end, 0x21FF);
    }
}
