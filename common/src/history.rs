//! Report history.
//!
//! Keeps the last [`HISTORY_SIZE`] reports in a ring buffer and tracks all-time
//! low-water marks, so a periodic reporter can print both the current reading and
//! the worst one seen since boot.
//!
//! # Usage
//!
//! ```ignore
//! let mut history = ReportHistory::new();
//! history.push(report);
//!
//! for report in history.iter() {
//!     println!("{}", report);
//! }
//! ```

use heapless::Deque;

use crate::config::HISTORY_SIZE;
use crate::report::{MemoryHealth, MemoryReport};

/// Ring buffer of recent [`MemoryReport`]s.
///
/// Old reports are dropped when the buffer is full; the low-water marks are not.
pub struct ReportHistory {
    buffer: Deque<MemoryReport, HISTORY_SIZE>,
    min_free_memory: Option<isize>,
    min_stack_unused: Option<u16>,
}

impl ReportHistory {
    /// Create an empty history.
    pub const fn new() -> Self {
        Self {
            buffer: Deque::new(),
            min_free_memory: None,
            min_stack_unused: None,
        }
    }

    /// Record a report. If the buffer is full, the oldest report is dropped.
    pub fn push(
        &mut self,
        report: MemoryReport,
    ) {
        let previous = self.latest().map(MemoryReport::health);
        let health = report.health();
        if health != MemoryHealth::Ok && previous != Some(health) {
            defmt_or_log::warn!("free memory {}: {} bytes", health.as_str(), report.free_memory);
        }

        self.min_free_memory = Some(self.min_free_memory.map_or(report.free_memory, |m| m.min(report.free_memory)));
        self.min_stack_unused = Some(self.min_stack_unused.map_or(report.stack_unused, |m| m.min(report.stack_unused)));

        if self.buffer.is_full() {
            self.buffer.pop_front();
        }
        self.buffer.push_back(report).ok();
    }

    /// Most recent report.
    #[inline]
    pub fn latest(&self) -> Option<&MemoryReport> { self.buffer.back() }

    /// Iterate over reports (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = &MemoryReport> { self.buffer.iter() }

    /// Lowest free-memory reading since creation.
    #[inline]
    pub const fn min_free_memory(&self) -> Option<isize> { self.min_free_memory }

    /// Lowest unused-stack reading since creation (the stack high-water mark).
    #[inline]
    pub const fn min_stack_unused(&self) -> Option<u16> { self.min_stack_unused }

    /// Number of reports held.
    #[inline]
    pub fn len(&self) -> usize { self.buffer.len() }

    /// Check if no report has been recorded.
    #[inline]
    pub fn is_empty(&self) -> bool { self.buffer.is_empty() }
}

impl Default for ReportHistory {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn report(
        free_memory: isize,
        stack_unused: u16,
    ) -> MemoryReport {
        MemoryReport {
            free_memory,
            free_list: 0,
            stack_unused,
            stack_painted: 1000,
        }
    }

    #[test]
    fn test_empty() {
        let history = ReportHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.latest(), None);
        assert_eq!(history.min_free_memory(), None);
    }

    #[test]
    fn test_drops_oldest_when_full() {
        let mut history = ReportHistory::new();
        for i in 0..(HISTORY_SIZE as isize + 3) {
            history.push(report(1000 + i, 900));
        }
        assert_eq!(history.len(), HISTORY_SIZE);
        assert_eq!(history.iter().next().map(|r| r.free_memory), Some(1003));
        assert_eq!(history.latest().map(|r| r.free_memory), Some(1000 + HISTORY_SIZE as isize + 2));
    }

    #[test]
    fn test_low_water_marks_survive_eviction() {
        let mut history = ReportHistory::new();
        history.push(report(-4, 10));
        for _ in 0..HISTORY_SIZE {
            history.push(report(700, 800));
        }
        assert!(history.iter().all(|r| r.free_memory == 700));
        assert_eq!(history.min_free_memory(), Some(-4));
        assert_eq!(history.min_stack_unused(), Some(10));
    }
}
