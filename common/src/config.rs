//! Compile-time configuration constants.
//!
//! The MCU RAM maps mirror the avr-libc linker scripts: `__data_start` sits at the
//! first SRAM byte and `__stack` defaults to `RAMEND`.

// =============================================================================
// Stack Painting
// =============================================================================

/// Sentinel byte written over unused RAM at boot.
///
/// Must never appear as legitimate data directly above `_end`, otherwise the
/// unused-stack scan stops late and over-reports free stack.
pub const STACK_CANARY: u8 = 0xC5;

// =============================================================================
// MCU RAM Maps
// =============================================================================

/// Internal SRAM address range of one AVR part.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct McuRam {
    /// First SRAM address (after the register file and I/O space).
    pub start: usize,
    /// Last SRAM address (`RAMEND`).
    pub end: usize,
}

impl McuRam {
    /// Total SRAM size in bytes.
    #[inline]
    pub const fn size(&self) -> usize { self.end - self.start + 1 }
}

/// ATmega328P (Arduino Uno/Nano): 2KB SRAM.
pub const ATMEGA328P: McuRam = McuRam {
    start: 0x0100,
    end: 0x08FF,
};

/// ATmega2560 (Arduino Mega): 8KB SRAM, spans well past a single 256-byte page.
pub const ATMEGA2560: McuRam = McuRam {
    start: 0x0200,
    end: 0x21FF,
};

// =============================================================================
// Report Thresholds
// =============================================================================

/// Free memory at or below this many bytes is reported as low.
pub const LOW_MEMORY_BYTES: isize = 128;

/// Number of reports kept in [`crate::history::ReportHistory`].
pub const HISTORY_SIZE: usize = 8;

/// Upper bound on free-list nodes visited, so a corrupted list cannot hang the walk.
pub const FREE_LIST_MAX_NODES: usize = 64;

/// Size of the `sz` header avr-libc keeps in front of every heap chunk.
pub const CHUNK_HEADER_BYTES: usize = 2;

// =============================================================================
// Tests
// =============================================================================
