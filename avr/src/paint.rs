//! Boot-time stack painter.
//!
//! Runs from `.init1`, before avr-libc has cleared `r1`, set SP or initialized
//! `.data`/`.bss`, so it cannot have a frame or call anything. It is the fast
//! counterpart of `memfree_common::fill_sentinel_portable` and covers the same
//! region: `_end` up to and including `__stack`.
//!
//! The address lives in `Z` (`r31:r30`) and is compared as a 16-bit value against
//! `__stack`, so regions that cross a 256-byte page (every part with more than
//! 256 bytes of SRAM) are handled.

use memfree_common::STACK_CANARY;

/// Fill `_end..=__stack` with [`STACK_CANARY`].
///
/// Placed in `.init1`; the `.init*` sections are concatenated, so there is no `ret`
/// and execution falls through into `.init2`. Never call it from Rust: once the
/// stack is live it would overwrite the caller's frames.
#[unsafe(naked)]
#[unsafe(no_mangle)]
#[unsafe(link_section = ".init1")]
pub unsafe extern "C" fn stack_paint() {
    core::arch::naked_asm!(
        "ldi r30, lo8(_end)",
        "ldi r31, hi8(_end)",
        "ldi r24, {canary}",
        "ldi r25, hi8(__stack)",
        "rjmp 2f",
        "1:",
        "st Z+, r24",
        "2:",
        "cpi r30, lo8(__stack)",
        "cpc r31, r25",
        "brlo 1b",
        "breq 1b",
        canary = const STACK_CANARY,
    );
}
