//! Memory diagnostics demo firmware for Arduino Uno / Mega.
//!
//! Prints a [`MemoryReport`](memfree_avr::MemoryReport) line over the USART once a
//! second while a recursive workload walks the stack progressively deeper, so the
//! unused-stack count can be seen falling and the free-memory estimate moving with
//! call depth.
//!
//! # Serial Output (57600 baud)
//!
//! ```text
//! layout: data=18 bss=39 heap=0 painted=1991 ram=2048
//! free=1974 list=0 stack=12/1991 (0%) OK
//! low-water: free=1974 unused=1979
//! ```
//!
//! On the host this builds to a stub so the package's tests can link.

#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]
// Crate-level lints (match lib.rs for consistency)
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]

#[cfg(target_arch = "avr")]
mod firmware {
    use arduino_hal::prelude::*;
    use memfree_avr::{MCU_RAM, MemoryBounds, MemoryReport, ReportHistory, linker_layout};
    use panic_halt as _;

    /// Report period in milliseconds.
    const REPORT_PERIOD_MS: u16 = 1000;

    /// Deepest recursion of the demo workload before it starts over.
    const MAX_DEPTH: u8 = 24;

    /// Recurse `depth` frames, each holding a 16-byte buffer.
    #[inline(never)]
    fn exercise_stack(depth: u8) -> u8 {
        let mut frame = [depth; 16];
        core::hint::black_box(&mut frame);
        if depth == 0 { frame[15] } else { exercise_stack(depth - 1).wrapping_add(frame[0]) }
    }

    #[arduino_hal::entry]
    fn main() -> ! {
        let dp = arduino_hal::Peripherals::take().unwrap();
        let pins = arduino_hal::pins!(dp);
        let mut serial = arduino_hal::default_serial!(dp, pins, 57600);

        let layout = linker_layout();
        ufmt::uwriteln!(
            &mut serial,
            "layout: data={} bss={} heap={} painted={} ram={}",
            layout.data_len() as u16,
            layout.bss_len() as u16,
            layout.heap_used() as u16,
            layout.painted_len() as u16,
            MCU_RAM.size() as u16
        )
        .unwrap_infallible();
        if layout.validate(None).is_err() {
            ufmt::uwriteln!(&mut serial, "layout: boundary symbols out of order").unwrap_infallible();
        }

        let mut history = ReportHistory::new();
        let mut depth: u8 = 0;

        loop {
            // Interrupts masked so no ISR frame lands mid-scan
            let report: MemoryReport = avr_device::interrupt::free(|_| memfree_avr::report());
            history.push(report);

            ufmt::uwriteln!(&mut serial, "{}", report).unwrap_infallible();
            if let (Some(min_free), Some(min_unused)) = (history.min_free_memory(), history.min_stack_unused()) {
                ufmt::uwriteln!(&mut serial, "low-water: free={} unused={}", min_free as i16, min_unused)
                    .unwrap_infallible();
            }

            exercise_stack(depth);
            depth = if depth >= MAX_DEPTH { 0 } else { depth + 1 };

            arduino_hal::delay_ms(REPORT_PERIOD_MS.into());
        }
    }
}

#[cfg(not(target_arch = "avr"))]
fn main() {
    eprintln!("memfree-demo is AVR firmware; build it with `--target avr-none`");
}
