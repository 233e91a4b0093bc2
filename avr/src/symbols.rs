//! Linker-provided boundary symbols.
//!
//! The avr-libc linker script defines these; only their addresses are meaningful.
//! `__brkval` and `__flp` are real variables owned by avr-libc `malloc` and only
//! exist when it is linked in (feature `avr-libc-heap`).

use memfree_common::bounds::heap_break_from_raw;
use memfree_common::{LinkerLayout, MemoryBounds};

unsafe extern "C" {
    static __data_start: u8;
    static __data_end: u8;
    static __bss_start: u8;
    static __bss_end: u8;
    static __heap_start: u8;
    static _end: u8;
    static __stack: u8;

    #[cfg(feature = "avr-libc-heap")]
    static __brkval: *mut u8;
    #[cfg(feature = "avr-libc-heap")]
    static __flp: *mut u8;
}

/// Address of a linker symbol, with provenance exposed for later volatile access.
macro_rules! symbol_addr {
    ($sym:ident) => {
        // SAFETY: only the address is taken, the symbol is never read
        unsafe { (&raw const $sym).expose_provenance() }
    };
}

/// [`MemoryBounds`] of the running firmware image.
#[derive(Clone, Copy, Debug, Default)]
pub struct AvrBounds;

impl MemoryBounds for AvrBounds {
    #[inline]
    fn static_data_end(&self) -> usize { symbol_addr!(_end) }

    #[inline]
    fn bss_end(&self) -> usize { symbol_addr!(__bss_end) }

    #[inline]
    fn heap_break(&self) -> Option<usize> {
        #[cfg(feature = "avr-libc-heap")]
        {
            // SAFETY: `__brkval` is a plain pointer variable; single-threaded read
            let raw = unsafe { core::ptr::read_volatile(&raw const __brkval) };
            heap_break_from_raw(raw.expose_provenance())
        }
        #[cfg(not(feature = "avr-libc-heap"))]
        {
            heap_break_from_raw(0)
        }
    }

    #[inline]
    fn stack_top(&self) -> usize { symbol_addr!(__stack) }
}

/// Head of the avr-libc free list, or `None` without a libc heap.
#[inline]
pub(crate) fn free_list_head() -> Option<usize> {
    #[cfg(feature = "avr-libc-heap")]
    {
        // SAFETY: `__flp` is a plain pointer variable; single-threaded read
        let raw = unsafe { core::ptr::read_volatile(&raw const __flp) };
        Some(raw.expose_provenance())
    }
    #[cfg(not(feature = "avr-libc-heap"))]
    {
        None
    }
}

/// Snapshot of every boundary symbol.
pub fn linker_layout() -> LinkerLayout {
    LinkerLayout {
        data_start: symbol_addr!(__data_start),
        data_end: symbol_addr!(__data_end),
        bss_start: symbol_addr!(__bss_start),
        bss_end: symbol_addr!(__bss_end),
        heap_start: symbol_addr!(__heap_start),
        static_data_end: symbol_addr!(_end),
        heap_break: AvrBounds.heap_break(),
        stack_top: symbol_addr!(__stack),
    }
}
