//! Free heap estimate.
//!
//! The estimate is the gap between the current stack pointer and the heap floor:
//! the heap break once something has been allocated, `__bss_end` before that. It
//! is a momentary snapshot taken when asked, not a tracked quantity.

use crate::bounds::MemoryBounds;
use crate::config::{CHUNK_HEADER_BYTES, FREE_LIST_MAX_NODES};
use crate::sram::Sram;

/// Free bytes between the heap floor and `stack_marker`.
///
/// `stack_marker` is the address of a local on the caller's stack, standing in for
/// SP. Zero or negative means the stack has reached the heap; callers treat that as
/// a critical reading, not an error.
#[inline]
pub fn free_memory_at<B: MemoryBounds + ?Sized>(
    stack_marker: usize,
    bounds: &B,
) -> isize {
    let floor = bounds.heap_break().unwrap_or_else(|| bounds.bss_end());
    (stack_marker as isize).wrapping_sub(floor as isize)
}

/// Bytes held in the avr-libc malloc free list starting at `head` (`__flp`).
///
/// Each node is `{ sz: u16, nx: u16 }` in little-endian, with `sz` excluding the
/// 2-byte header. These chunks sit below the break, so [`free_memory_at`] does not
/// see them. The walk stops after [`FREE_LIST_MAX_NODES`] nodes.
pub fn free_list_bytes<S: Sram + ?Sized>(
    sram: &S,
    head: usize,
) -> usize {
    let mut total = 0usize;
    let mut node = head;
    let mut visited = 0;

    while node != 0 && visited < FREE_LIST_MAX_NODES {
        let size = sram.read_u16(node) as usize;
        total = total.saturating_add(size + CHUNK_HEADER_BYTES);
        node = sram.read_u16(node + 2) as usize;
        visited += 1;
    }

    if node != 0 {
        defmt_or_log::warn!("free list walk stopped after {} nodes", visited);
    }

    total
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::LinkerLayout;
    use crate::config::ATMEGA328P;
    use crate::sram::SliceSram;

    fn layout() -> LinkerLayout { LinkerLayout::contiguous(ATMEGA328P, 0x40, 0x80) }

    #[test]
    fn test_free_memory_without_heap_uses_bss_end() {
        let layout = layout();
        assert_eq!(free_memory_at(0x0800, &layout), 0x0800 - layout.bss_end as isize);
    }

    #[test]
    fn test_free_memory_with_heap_uses_break() {
        let layout = layout().with_heap_break(Some(0x0300));
        assert_eq!(free_memory_at(0x0800, &layout), 0x0500);
    }

    #[test]
    fn test_free_memory_zero_and_negative() {
        let layout = layout().with_heap_break(Some(0x0300));
        assert_eq!(free_memory_at(0x0300, &layout), 0);
        assert_eq!(free_memory_at(0x02F0, &layout), -16);
    }

    #[test]
    fn test_free_memory_idempotent() {
        let layout = layout();
        assert_eq!(free_memory_at(0x07C0, &layout), free_memory_at(0x07C0, &layout));
    }

    #[test]
    fn test_free_list_empty() {
        let mut bytes = [0u8; 16];
        let sram = SliceSram::new(0x0200, &mut bytes);
        assert_eq!(free_list_bytes(&sram, 0), 0);
    }

    #[test]
    fn test_free_list_two_nodes() {
        let mut bytes = [0u8; 32];
        // node at 0x0200: sz=10, nx=0x0210
        bytes[0..4].copy_from_slice(&[10, 0, 0x10, 0x02]);
        // node at 0x0210: sz=4, nx=0
        bytes[16..20].copy_from_slice(&[4, 0, 0, 0]);
        let sram = SliceSram::new(0x0200, &mut bytes);
        assert_eq!(free_list_bytes(&sram, 0x0200), (10 + 2) + (4 + 2));
    }

    #[test]
    fn test_free_list_cycle_is_bounded() {
        let mut bytes = [0u8; 8];
        // node at 0x0200 points at itself
        bytes[0..4].copy_from_slice(&[1, 0, 0x00, 0x02]);
        let sram = SliceSram::new(0x0200, &mut bytes);
        assert_eq!(free_list_bytes(&sram, 0x0200), FREE_LIST_MAX_NODES * 3);
    }
}
