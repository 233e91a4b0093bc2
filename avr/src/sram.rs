//! Volatile access to the data address space.

use memfree_common::Sram;

/// [`Sram`] that reads and writes real memory with volatile accesses.
///
/// Volatile keeps the compiler from caching or eliding accesses to bytes it
/// believes are dead (unused stack is, from its point of view, never written).
pub struct VolatileSram {
    _private: (),
}

impl VolatileSram {
    /// Create an accessor for the whole address space.
    ///
    /// # Safety
    ///
    /// Every address later passed to [`Sram::read`] must be mapped, readable data
    /// memory with exposed provenance, and every address passed to [`Sram::write`]
    /// must not hold live data.
    pub const unsafe fn new() -> Self { Self { _private: () } }
}

impl Sram for VolatileSram {
    #[inline]
    fn read(
        &self,
        addr: usize,
    ) -> u8 {
        // SAFETY: upheld by the caller of `VolatileSram::new`
        unsafe { core::ptr::read_volatile(core::ptr::with_exposed_provenance::<u8>(addr)) }
    }

    #[inline]
    fn write(
        &mut self,
        addr: usize,
        value: u8,
    ) {
        // SAFETY: upheld by the caller of `VolatileSram::new`
        unsafe { core::ptr::write_volatile(core::ptr::with_exposed_provenance_mut::<u8>(addr), value) }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use memfree_common::{LinkerLayout, STACK_CANARY, count_unused_stack, paint_stack_region};

    use super::*;

    #[test]
    fn test_paint_and_count_through_real_pointers() {
        let mut buf = [0u8; 64];
        let base = buf.as_mut_ptr().expose_provenance();
        let layout = LinkerLayout {
            static_data_end: base + 8,
            stack_top: base + 63,
            ..LinkerLayout::default()
        };

        // SAFETY: every address touched lies inside `buf`, which nothing else borrows
        let mut sram = unsafe { VolatileSram::new() };
        assert_eq!(paint_stack_region(&mut sram, &layout), 56);
        assert_eq!(count_unused_stack(&sram, &layout), 55);

        sram.write(base + 40, 0x00);
        assert_eq!(count_unused_stack(&sram, &layout), 32);

        assert!(buf[..8].iter().all(|&b| b == 0));
        assert_eq!(buf[8], STACK_CANARY);
        assert_eq!(buf[40], 0x00);
        assert_eq!(buf[63], STACK_CANARY);
    }
}
