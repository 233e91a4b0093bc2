//! Probe entry points.
//!
//! Each probe takes the address of one of its own locals as the stack pointer, so
//! they are `#[inline(never)]`: inlined, the local would land in the caller's
//! frame and the reading would describe the caller instead.

use core::hint::black_box;

use memfree_common::{MemoryBounds, free_memory_at};
#[cfg(target_arch = "avr")]
use memfree_common::{MemoryReport, count_unused_stack};

#[cfg(target_arch = "avr")]
use crate::sram::VolatileSram;
#[cfg(target_arch = "avr")]
use crate::symbols::{AvrBounds, free_list_head};

/// Free heap estimate for `bounds`, measured from this call's stack frame.
#[inline(never)]
pub fn free_memory_in<B: MemoryBounds + ?Sized>(bounds: &B) -> isize {
    let marker = 0u8;
    free_memory_at(black_box(&raw const marker).addr(), bounds)
}

/// Free bytes between the heap floor and the stack pointer.
///
/// Zero or negative means the stack has reached the heap.
#[cfg(target_arch = "avr")]
#[inline(never)]
pub fn free_memory() -> isize { free_memory_in(&AvrBounds) }

/// Untouched stack bytes above `_end` since boot.
///
/// Equals `__stack - _end` while the stack has never grown below the top byte.
#[cfg(target_arch = "avr")]
#[inline(never)]
pub fn stack_count() -> u16 {
    // SAFETY: the scan stays within `_end..__stack`, which is mapped SRAM
    let sram = unsafe { VolatileSram::new() };
    count_unused_stack(&sram, &AvrBounds)
}

/// Take a reading of every probe.
#[cfg(target_arch = "avr")]
#[inline(never)]
pub fn report() -> MemoryReport {
    let marker = 0u8;
    // SAFETY: reads stay within `_end..__stack` and the malloc free list
    let sram = unsafe { VolatileSram::new() };
    MemoryReport::collect(black_box(&raw const marker).addr(), &sram, &AvrBounds, free_list_head())
}

// =============================================================================
// Tests
// =============================================================================
