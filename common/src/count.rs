//! Untouched-stack scan.
//!
//! Counts sentinel bytes upward from `_end`. The result is the lowest contiguous
//! untouched prefix: a sentinel-valued byte of real data right above `_end`
//! inflates it, and sentinel "holes" left below the deepest frame are not
//! counted once a touched byte sits under them. The heap also starts at `_end`,
//! so once anything is allocated the chunk header ends the scan at offset zero.

use crate::bounds::MemoryBounds;
use crate::config::STACK_CANARY;
use crate::sram::Sram;

/// Number of sentinel bytes in `_end..__stack`, stopping at the first other byte.
///
/// `__stack` itself is never inspected: it receives the first push after reset, so
/// an untouched stack reads `__stack - _end`.
pub fn count_unused_stack<S, B>(
    sram: &S,
    bounds: &B,
) -> u16
where
    S: Sram + ?Sized,
    B: MemoryBounds + ?Sized,
{
    let top = bounds.stack_top();
    let mut addr = bounds.static_data_end();
    let mut count: u16 = 0;

    while addr < top && sram.read(addr) == STACK_CANARY {
        addr += 1;
        count = count.saturating_add(1);
    }

    count
}

/// Deepest stack extent since painting: painted size minus the untouched prefix.
#[inline]
pub const fn peak_stack_usage(
    painted: usize,
    unused: u16,
) -> usize {
    painted.saturating_sub(unused as usize)
}

// =============================================================================
// Tests
// =============================================================================
