//! Portable sentinel fill.
//!
//! Byte-by-byte reference version of the boot-time painter. It needs a working
//! call stack, so on the target it cannot be the `.init1` hook itself (that is the
//! naked routine in `memfree-avr`); it paints simulated SRAM on the host and
//! documents the exact region the fast path covers.

use crate::bounds::MemoryBounds;
use crate::config::STACK_CANARY;
use crate::sram::Sram;

/// Write [`STACK_CANARY`] to every address in `start..=top`.
///
/// Returns the number of bytes written (zero when `top < start`).
pub fn fill_sentinel_portable<S: Sram + ?Sized>(
    sram: &mut S,
    start: usize,
    top: usize,
) -> usize {
    for addr in start..=top {
        sram.write(addr, STACK_CANARY);
    }
    top.checked_sub(start).map_or(0, |span| span + 1)
}

/// Paint from `_end` up to and including `__stack`.
pub fn paint_stack_region<S, B>(
    sram: &mut S,
    bounds: &B,
) -> usize
where
    S: Sram + ?Sized,
    B: MemoryBounds + ?Sized,
{
    let written = fill_sentinel_portable(sram, bounds.static_data_end(), bounds.stack_top());
    defmt_or_log::debug!("painted {} bytes from {}", written, bounds.static_data_end());
    written
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::LinkerLayout;
    use crate::config::McuRam;
    use crate::sram::SliceSram;

    #[test]
    fn test_fill_is_inclusive_of_top() {
        let mut bytes = [0u8; 8];
        let mut sram = SliceSram::new(0x0100, &mut bytes);
        assert_eq!(fill_sentinel_portable(&mut sram, 0x0102, 0x0105), 4);
        assert_eq!(bytes, [0, 0, 0xC5, 0xC5, 0xC5, 0xC5, 0, 0]);
    }

    #[test]
    fn test_fill_empty_range() {
        let mut bytes = [0u8; 4];
        let mut sram = SliceSram::new(0x0100, &mut bytes);
        assert_eq!(fill_sentinel_portable(&mut sram, 0x0103, 0x0102), 0);
        assert_eq!(bytes, [0, 0, 0, 0]);
    }

    #[test]
    fn test_paint_crosses_page_boundary() {
        // _end at 0x01F0, __stack at 0x020F: the high byte changes mid-fill
        let ram = McuRam {
            start: 0x01E0,
            end: 0x020F,
        };
        let layout = LinkerLayout::contiguous(ram, 0x08, 0x08);
        let mut bytes = [0u8; 0x30];
        let mut sram = SliceSram::new(ram.start, &mut bytes);

        assert_eq!(paint_stack_region(&mut sram, &layout), 0x20);
        assert!(bytes[..0x10].iter().all(|&b| b == 0));
        assert!(bytes[0x10..].iter().all(|&b| b == STACK_CANARY));
    }
}
