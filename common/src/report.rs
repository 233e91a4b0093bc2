//! Memory report snapshot.
//!
//! Bundles one reading of each probe so the firmware and simulator can print the
//! same line. Renders through `core::fmt` on the host and `ufmt` on the target,
//! where `core::fmt` costs too much flash.

use core::fmt;

use crate::bounds::MemoryBounds;
use crate::config::LOW_MEMORY_BYTES;
use crate::count::{count_unused_stack, peak_stack_usage};
use crate::probe::{free_list_bytes, free_memory_at};
use crate::sram::Sram;

/// Coarse classification of the free-memory reading.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MemoryHealth {
    /// More than [`LOW_MEMORY_BYTES`] free.
    #[default]
    Ok,
    /// Free memory at or below [`LOW_MEMORY_BYTES`].
    Low,
    /// Stack has met or crossed the heap floor.
    Critical,
}

impl MemoryHealth {
    /// Classify a free-memory reading.
    pub const fn classify(free_memory: isize) -> Self {
        if free_memory <= 0 {
            Self::Critical
        } else if free_memory <= LOW_MEMORY_BYTES {
            Self::Low
        } else {
            Self::Ok
        }
    }

    /// Short label for serial output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Low => "LOW",
            Self::Critical => "CRITICAL",
        }
    }
}

/// One snapshot of all memory diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryReport {
    /// Bytes between the heap floor and the stack pointer (may be negative).
    pub free_memory: isize,
    /// Bytes sitting in the malloc free list below the break.
    pub free_list: usize,
    /// Sentinel bytes still untouched above `_end`.
    pub stack_unused: u16,
    /// Bytes painted at boot (`_end..=__stack`).
    pub stack_painted: usize,
}

impl MemoryReport {
    /// Take a reading of every probe.
    ///
    /// `free_list_head` is the current `__flp`, or `None` when no libc heap is linked.
    pub fn collect<S, B>(
        stack_marker: usize,
        sram: &S,
        bounds: &B,
        free_list_head: Option<usize>,
    ) -> Self
    where
        S: Sram + ?Sized,
        B: MemoryBounds + ?Sized,
    {
        Self {
            free_memory: free_memory_at(stack_marker, bounds),
            free_list: free_list_head.map_or(0, |head| free_list_bytes(sram, head)),
            stack_unused: count_unused_stack(sram, bounds),
            stack_painted: bounds.painted_len(),
        }
    }

    /// Peak stack usage since boot.
    #[inline]
    pub const fn stack_used(&self) -> usize { peak_stack_usage(self.stack_painted, self.stack_unused) }

    /// Peak stack usage as a percentage of the painted region.
    pub fn stack_percent(&self) -> u32 {
        if self.stack_painted > 0 {
            ((self.stack_used() * 100) / self.stack_painted) as u32
        } else {
            0
        }
    }

    /// Classification of the free-memory reading.
    #[inline]
    pub const fn health(&self) -> MemoryHealth { MemoryHealth::classify(self.free_memory) }
}

impl fmt::Display for MemoryHealth {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for MemoryReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "free={} list={} stack={}/{} ({}%) {}",
            self.free_memory,
            self.free_list,
            self.stack_used(),
            self.stack_painted,
            self.stack_percent(),
            self.health()
        )
    }
}

impl ufmt::uDisplay for MemoryHealth {
    fn fmt<W>(
        &self,
        f: &mut ufmt::Formatter<'_, W>,
    ) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        f.write_str(self.as_str())
    }
}

impl ufmt::uDisplay for MemoryReport {
    fn fmt<W>(
        &self,
        f: &mut ufmt::Formatter<'_, W>,
    ) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        // ufmt has no isize/usize impls on every target, widen explicitly
        ufmt::uwrite!(
            f,
            "free={} list={} stack={}/{} ({}%) {}",
            self.free_memory as i32,
            self.free_list as u32,
            self.stack_used() as u32,
            self.stack_painted as u32,
            self.stack_percent(),
            self.health()
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::LinkerLayout;
    use crate::config::ATMEGA328P;
    use crate::paint::paint_stack_region;
    use crate::sram::SliceSram;

    struct Line(String);

    impl ufmt::uWrite for Line {
        type Error = core::convert::Infallible;

        fn write_str(
            &mut self,
            s: &str,
        ) -> Result<(), Self::Error> {
            self.0.push_str(s);
            Ok(())
        }
    }

    fn sample() -> MemoryReport {
        MemoryReport {
            free_memory: 500,
            free_list: 12,
            stack_unused: 1500,
            stack_painted: 2000,
        }
    }

    #[test]
    fn test_health_classification() {
        assert_eq!(MemoryHealth::classify(-3), MemoryHealth::Critical);
        assert_eq!(MemoryHealth::classify(0), MemoryHealth::Critical);
        assert_eq!(MemoryHealth::classify(1), MemoryHealth::Low);
        assert_eq!(MemoryHealth::classify(LOW_MEMORY_BYTES), MemoryHealth::Low);
        assert_eq!(MemoryHealth::classify(LOW_MEMORY_BYTES + 1), MemoryHealth::Ok);
    }

    #[test]
    fn test_stack_percent() {
        let report = sample();
        assert_eq!(report.stack_used(), 500);
        assert_eq!(report.stack_percent(), 25);
        assert_eq!(MemoryReport::default().stack_percent(), 0);
    }

    #[test]
    fn test_collect() {
        let layout = LinkerLayout::contiguous(ATMEGA328P, 0x20, 0x20);
        let mut ram = [0u8; 2048];
        let mut sram = SliceSram::new(ATMEGA328P.start, &mut ram);
        paint_stack_region(&mut sram, &layout);
        // simulate 16 bytes of stack below __stack
        for addr in (layout.stack_top - 16)..=layout.stack_top {
            sram.write(addr, 0);
        }

        let report = MemoryReport::collect(layout.stack_top - 16, &sram, &layout, None);
        assert_eq!(report.free_memory, (layout.stack_top - 16 - layout.bss_end) as isize);
        assert_eq!(report.free_list, 0);
        assert_eq!(report.stack_unused as usize, layout.stack_top - 16 - layout.static_data_end);
        assert_eq!(report.stack_painted, layout.painted_len());
        assert_eq!(report.stack_used(), 17);
        assert_eq!(report.health(), MemoryHealth::Ok);
    }

    #[test]
    fn test_display_formats_match() {
        let report = sample();
        let mut line = Line(String::new());
        ufmt::uwrite!(&mut line, "{}", report).unwrap();
        assert_eq!(line.0, report.to_string());
        assert_eq!(line.0, "free=500 list=12 stack=500/2000 (25%) OK");
    }
}
