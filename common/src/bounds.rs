//! Linker-provided memory boundaries.
//!
//! The avr-libc linker script exports the RAM layout as symbols whose *addresses*
//! carry the information (`__data_start`, `__bss_end`, `_end`, `__stack`, ...), plus
//! `__brkval`, a variable holding the current heap break (zero before the first
//! `malloc`). The algorithms only see these through [`MemoryBounds`].
//!
//! # Memory Layout (AVR)
//!
//! ```text
//! RAMSTART                                                          RAMEND
//! | .data | .bss | heap -> (brk)        free        (SP) <- stack | __stack
//!                ^ _end / __heap_start
//! ```

use thiserror::Error;

use crate::config::McuRam;

/// Link-time memory boundaries of the running image.
pub trait MemoryBounds {
    /// First byte after all static data (`_end`); painting and scanning start here.
    fn static_data_end(&self) -> usize;

    /// First byte after the zero-initialized region (`__bss_end`).
    fn bss_end(&self) -> usize;

    /// Current heap break, or `None` before the first heap allocation.
    fn heap_break(&self) -> Option<usize>;

    /// Highest usable stack byte (`__stack`); the stack grows down from here.
    fn stack_top(&self) -> usize;

    /// Bytes the stack painter writes: `_end` up to and including `__stack`.
    #[inline]
    fn painted_len(&self) -> usize { (self.stack_top() + 1).saturating_sub(self.static_data_end()) }
}

/// Interpret a raw `__brkval` value, where zero means "no allocation yet".
#[inline]
pub const fn heap_break_from_raw(raw: usize) -> Option<usize> { if raw == 0 { None } else { Some(raw) } }

/// Layout validation failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LayoutError {
    /// Two boundaries that must be ascending are not.
    #[error("{lower} ({lower_addr:#06x}) lies above {upper} ({upper_addr:#06x})")]
    OutOfOrder {
        lower: &'static str,
        lower_addr: usize,
        upper: &'static str,
        upper_addr: usize,
    },
    /// Heap break outside `[_end, __stack]`.
    #[error("heap break {heap_break:#06x} outside {low:#06x}..={high:#06x}")]
    HeapBreakOutOfRange {
        heap_break: usize,
        low: usize,
        high: usize,
    },
    /// Stack pointer below the heap floor or above `__stack` (stack/heap collision).
    #[error("stack pointer {stack_pointer:#06x} outside {low:#06x}..={high:#06x}")]
    StackPointerOutOfRange {
        stack_pointer: usize,
        low: usize,
        high: usize,
    },
}

/// Snapshot of every boundary symbol the linker exports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkerLayout {
    /// `__data_start`
    pub data_start: usize,
    /// `__data_end`
    pub data_end: usize,
    /// `__bss_start`
    pub bss_start: usize,
    /// `__bss_end`
    pub bss_end: usize,
    /// `__heap_start`
    pub heap_start: usize,
    /// `_end`
    pub static_data_end: usize,
    /// `__brkval` (`None` when zero)
    pub heap_break: Option<usize>,
    /// `__stack`
    pub stack_top: usize,
}

impl LinkerLayout {
    /// Build the layout the default linker script produces: `.data` at the start of
    /// SRAM, `.bss` right after it, an empty `.noinit`, and the stack at `RAMEND`.
    pub const fn contiguous(
        ram: McuRam,
        data_len: usize,
        bss_len: usize,
    ) -> Self {
        let data_end = ram.start + data_len;
        let bss_end = data_end + bss_len;
        Self {
            data_start: ram.start,
            data_end,
            bss_start: data_end,
            bss_end,
            heap_start: bss_end,
            static_data_end: bss_end,
            heap_break: None,
            stack_top: ram.end,
        }
    }

    /// Copy of this layout with a different heap break.
    #[must_use]
    pub const fn with_heap_break(
        mut self,
        heap_break: Option<usize>,
    ) -> Self {
        self.heap_break = heap_break;
        self
    }

    /// Size of initialized static data.
    #[inline]
    pub const fn data_len(&self) -> usize { self.data_end.saturating_sub(self.data_start) }

    /// Size of zero-initialized static data.
    #[inline]
    pub const fn bss_len(&self) -> usize { self.bss_end.saturating_sub(self.bss_start) }

    /// Bytes handed out by the heap so far (zero before the first allocation).
    #[inline]
    pub const fn heap_used(&self) -> usize {
        match self.heap_break {
            Some(brk) => brk.saturating_sub(self.heap_start),
            None => 0,
        }
    }

    /// Check the boundary ordering invariant, optionally including a stack pointer.
    ///
    /// `data_start <= data_end <= bss_start <= bss_end <= _end <= brk <= SP <= __stack`
    pub fn validate(
        &self,
        stack_pointer: Option<usize>,
    ) -> Result<(), LayoutError> {
        let chain = [
            ("__data_start", self.data_start),
            ("__data_end", self.data_end),
            ("__bss_start", self.bss_start),
            ("__bss_end", self.bss_end),
            ("_end", self.static_data_end),
            ("__stack", self.stack_top),
        ];
        for pair in chain.windows(2) {
            let (lower, lower_addr) = pair[0];
            let (upper, upper_addr) = pair[1];
            if lower_addr > upper_addr {
                return Err(LayoutError::OutOfOrder {
                    lower,
                    lower_addr,
                    upper,
                    upper_addr,
                });
            }
        }

        if let Some(heap_break) = self.heap_break {
            if heap_break < self.static_data_end || heap_break > self.stack_top {
                return Err(LayoutError::HeapBreakOutOfRange {
                    heap_break,
                    low: self.static_data_end,
                    high: self.stack_top,
                });
            }
        }

        if let Some(stack_pointer) = stack_pointer {
            let low = self.heap_break.unwrap_or(self.static_data_end);
            if stack_pointer < low || stack_pointer > self.stack_top {
                return Err(LayoutError::StackPointerOutOfRange {
                    stack_pointer,
                    low,
                    high: self.stack_top,
                });
            }
        }

        Ok(())
    }
}

impl MemoryBounds for LinkerLayout {
    fn static_data_end(&self) -> usize { self.static_data_end }

    fn bss_end(&self) -> usize { self.bss_end }

    fn heap_break(&self) -> Option<usize> { self.heap_break }

    fn stack_top(&self) -> usize { self.stack_top }
}

// =============================================================================
// Tests
// =============================================================================
