//! Simulated AVR SRAM with a downward stack and a bump heap.
//!
//! The stack follows the AVR convention: SP points at the next free byte, a push
//! stores at SP and then decrements it. Bytes written by a frame stay written
//! after it returns, which is what the unused-stack scan relies on.
//!
//! The heap keeps avr-libc's chunk format: a 2-byte size header in front of each
//! chunk, and the break never grows closer than the malloc margin to SP. `free`
//! follows avr-libc: the list at `__flp` stays sorted by address, neighbouring
//! chunks are merged, and a chunk ending at the break is returned by lowering the
//! break. `malloc` always allocates at the break and never reuses freed chunks.

use memfree_common::config::CHUNK_HEADER_BYTES;
use memfree_common::{LinkerLayout, MemoryBounds, MemoryReport, SliceSram, Sram, paint_stack_region};

use crate::config::{McuProfile, SimConfig};
use crate::error::SimError;

/// avr-libc `__malloc_margin`: bytes kept free between the break and SP.
pub const MALLOC_MARGIN: usize = 32;

/// Smallest payload avr-libc hands out (room for the free-list `nx` link).
const MIN_ALLOCATION: usize = 2;

/// Byte written into stack frames; anything but the sentinel.
const FRAME_FILL: u8 = 0x00;

/// Heap chunk: size header at `addr`, followed by `size` payload bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Chunk {
    addr: usize,
    size: usize,
}

impl Chunk {
    /// First address past the payload.
    const fn end(self) -> usize { self.addr + CHUNK_HEADER_BYTES + self.size }
}

#[derive(Clone, Copy, Debug)]
struct Allocation {
    chunk: Chunk,
    freed: bool,
}

/// One simulated MCU after boot.
pub struct SimulatedMcu {
    profile: McuProfile,
    layout: LinkerLayout,
    ram: Vec<u8>,
    sp: usize,
    frames: Vec<usize>,
    allocations: Vec<Allocation>,
    /// Free chunks below the break, sorted by address.
    free_chunks: Vec<Chunk>,
    free_list_head: usize,
}

impl SimulatedMcu {
    /// Reset the part: zeroed SRAM, optional painting, SP at `__stack`.
    pub fn boot(config: &SimConfig) -> Result<Self, SimError> {
        let ram_map = config.mcu.ram();
        let layout = LinkerLayout::contiguous(ram_map, config.data_bytes, config.bss_bytes);
        layout.validate(None)?;

        let mut mcu = Self {
            profile: config.mcu,
            layout,
            ram: vec![0; ram_map.size()],
            sp: layout.stack_top,
            frames: Vec::new(),
            allocations: Vec::new(),
            free_chunks: Vec::new(),
            free_list_head: 0,
        };

        if config.paint {
            let written = paint_stack_region(&mut mcu.sram(), &layout);
            log::debug!("boot: painted {written} bytes");
        }
        log::info!(
            "boot: {:?} data={} bss={} _end={:#06x} __stack={:#06x} painted={}",
            config.mcu,
            layout.data_len(),
            layout.bss_len(),
            layout.static_data_end,
            layout.stack_top,
            layout.painted_len()
        );

        Ok(mcu)
    }

    fn sram(&mut self) -> SliceSram<'_> { SliceSram::new(self.layout.data_start, &mut self.ram) }

    fn store_u16(
        &mut self,
        addr: usize,
        value: usize,
    ) {
        let [lo, hi] = (value as u16).to_le_bytes();
        let mut sram = self.sram();
        sram.write(addr, lo);
        sram.write(addr + 1, hi);
    }

    /// Lowest address the stack may occupy.
    fn heap_floor(&self) -> usize { self.layout.heap_break.unwrap_or(self.layout.static_data_end) }

    /// Push a return address plus `frame` bytes.
    pub fn call(
        &mut self,
        frame: usize,
    ) -> Result<(), SimError> {
        let size = self.profile.return_address_bytes() + frame;
        let floor = self.heap_floor();
        let lowest = (self.sp + 1)
            .checked_sub(size)
            .filter(|&lowest| lowest > floor)
            .ok_or(SimError::StackOverflow { sp: self.sp, size, floor })?;

        let top = self.sp;
        let mut sram = self.sram();
        for addr in lowest..=top {
            sram.write(addr, FRAME_FILL);
        }
        self.sp = lowest - 1;
        self.frames.push(size);
        log::trace!("call: {size} bytes, SP={:#06x}", self.sp);
        Ok(())
    }

    /// Pop the innermost frame. Its bytes stay in SRAM.
    pub fn ret(&mut self) -> Result<(), SimError> {
        let size = self.frames.pop().ok_or(SimError::ReturnWithoutCall)?;
        self.sp += size;
        log::trace!("return: SP={:#06x}", self.sp);
        Ok(())
    }

    /// Allocate `bytes` at the break. Returns the allocation number.
    pub fn malloc(
        &mut self,
        bytes: usize,
    ) -> Result<usize, SimError> {
        let bytes = bytes.max(MIN_ALLOCATION);
        let start = self.layout.heap_break.unwrap_or(self.layout.heap_start);
        let end = start + CHUNK_HEADER_BYTES + bytes;
        let limit = self.sp.saturating_sub(MALLOC_MARGIN);
        if end > limit {
            return Err(SimError::HeapExhausted {
                requested: bytes,
                available: limit.saturating_sub(start + CHUNK_HEADER_BYTES),
            });
        }

        self.store_u16(start, bytes);
        self.layout = self.layout.with_heap_break(Some(end));
        self.allocations.push(Allocation {
            chunk: Chunk { addr: start, size: bytes },
            freed: false,
        });
        log::trace!(
            "malloc({bytes}) at {:#06x}, heap {} bytes",
            start + CHUNK_HEADER_BYTES,
            self.layout.heap_used()
        );
        Ok(self.allocations.len() - 1)
    }

    /// Release allocation `id`, merging it into the free list or the break.
    pub fn free(
        &mut self,
        id: usize,
    ) -> Result<(), SimError> {
        let allocation = self
            .allocations
            .get_mut(id)
            .filter(|a| !a.freed)
            .ok_or(SimError::UnknownAllocation(id))?;
        allocation.freed = true;
        let chunk = allocation.chunk;

        let at = self.free_chunks.partition_point(|c| c.addr < chunk.addr);
        self.free_chunks.insert(at, chunk);
        self.coalesce();

        if let Some(top) = self.free_chunks.last().copied() {
            if Some(top.end()) == self.layout.heap_break {
                self.free_chunks.pop();
                self.layout = self.layout.with_heap_break(Some(top.addr));
                log::trace!("free: break lowered to {:#06x}", top.addr);
            }
        }

        self.write_free_list();
        Ok(())
    }

    /// Merge free chunks that touch each other.
    fn coalesce(&mut self) {
        let mut merged: Vec<Chunk> = Vec::with_capacity(self.free_chunks.len());
        for chunk in self.free_chunks.drain(..) {
            match merged.last_mut() {
                Some(prev) if prev.end() == chunk.addr => prev.size += CHUNK_HEADER_BYTES + chunk.size,
                _ => merged.push(chunk),
            }
        }
        self.free_chunks = merged;
    }

    /// Rewrite every free chunk's `sz`/`nx` pair and the list head.
    fn write_free_list(&mut self) {
        for index in 0..self.free_chunks.len() {
            let chunk = self.free_chunks[index];
            let next = self.free_chunks.get(index + 1).map_or(0, |n| n.addr);
            self.store_u16(chunk.addr, chunk.size);
            self.store_u16(chunk.addr + CHUNK_HEADER_BYTES, next);
        }
        self.free_list_head = self.free_chunks.first().map_or(0, |c| c.addr);
    }

    /// Store `value` at `_end + offset`.
    pub fn poke(
        &mut self,
        offset: usize,
        value: u8,
    ) -> Result<(), SimError> {
        let addr = self.layout.static_data_end + offset;
        if addr > self.layout.stack_top {
            return Err(SimError::AddressOutOfRange(addr));
        }
        self.sram().write(addr, value);
        Ok(())
    }

    /// Take a report with SP as the stack marker.
    pub fn report(&mut self) -> MemoryReport {
        let sp = self.sp;
        let layout = self.layout;
        let head = self.free_list_head;
        let sram = self.sram();
        MemoryReport::collect(sp, &sram, &layout, Some(head))
    }

    /// Current boundaries, including the heap break.
    pub fn layout(&self) -> &LinkerLayout { &self.layout }

    /// Current stack pointer.
    pub const fn sp(&self) -> usize { self.sp }

    /// Raw SRAM contents, starting at the first SRAM address.
    pub fn ram(&self) -> &[u8] { &self.ram }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn boot() -> SimulatedMcu {
        SimulatedMcu::boot(&SimConfig {
            steps: Vec::new(),
            ..SimConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_call_and_return_move_sp() {
        let mut mcu = boot();
        let top = mcu.layout().stack_top;
        mcu.call(10).unwrap();
        assert_eq!(mcu.sp(), top - 12);
        mcu.ret().unwrap();
        assert_eq!(mcu.sp(), top);
        assert_eq!(mcu.ret(), Err(SimError::ReturnWithoutCall));
    }

    #[test]
    fn test_stack_overflow_detected() {
        let mut mcu = boot();
        let room = mcu.sp() - mcu.layout().static_data_end;
        assert!(matches!(mcu.call(room), Err(SimError::StackOverflow { .. })));
        assert_eq!(mcu.sp(), mcu.layout().stack_top);
    }

    #[test]
    fn test_malloc_writes_header_and_moves_break() {
        let mut mcu = boot();
        let heap_start = mcu.layout().heap_start;
        assert_eq!(mcu.malloc(40).unwrap(), 0);
        assert_eq!(mcu.layout().heap_break, Some(heap_start + 42));
        let off = heap_start - mcu.layout().data_start;
        assert_eq!(&mcu.ram()[off..off + 2], &[40, 0]);
    }

    #[test]
    fn test_heap_respects_malloc_margin() {
        let mut mcu = boot();
        let too_big = mcu.sp() - mcu.layout().heap_start;
        assert!(matches!(mcu.malloc(too_big), Err(SimError::HeapExhausted { .. })));
    }

    #[test]
    fn test_free_below_break_links_by_address() {
        let mut mcu = boot();
        let heap_start = mcu.layout().heap_start;
        let a = mcu.malloc(10).unwrap();
        mcu.malloc(4).unwrap();
        let c = mcu.malloc(6).unwrap();
        mcu.malloc(8).unwrap();

        mcu.free(c).unwrap();
        mcu.free(a).unwrap();
        let off = heap_start - mcu.layout().data_start;
        let c_addr = heap_start + 12 + 6;
        // head is the lower chunk even though it was freed last
        assert_eq!(mcu.report().free_list, 12 + 8);
        assert_eq!(&mcu.ram()[off..off + 4], &[10, 0, c_addr as u8, (c_addr >> 8) as u8]);
    }

    #[test]
    fn test_free_merges_neighbours() {
        let mut mcu = boot();
        let heap_start = mcu.layout().heap_start;
        let a = mcu.malloc(10).unwrap();
        let b = mcu.malloc(4).unwrap();
        mcu.malloc(8).unwrap();

        mcu.free(b).unwrap();
        mcu.free(a).unwrap();
        let off = heap_start - mcu.layout().data_start;
        assert_eq!(&mcu.ram()[off..off + 4], &[10 + 2 + 4, 0, 0, 0]);
        assert_eq!(mcu.report().free_list, 18);
    }

    #[test]
    fn test_free_top_chunk_lowers_break() {
        let mut mcu = boot();
        let heap_start = mcu.layout().heap_start;
        let a = mcu.malloc(30).unwrap();
        let b = mcu.malloc(10).unwrap();

        mcu.free(b).unwrap();
        assert_eq!(mcu.layout().heap_break, Some(heap_start + 32));
        assert_eq!(mcu.report().free_list, 0);

        mcu.free(a).unwrap();
        assert_eq!(mcu.layout().heap_break, Some(heap_start));
        assert_eq!(mcu.layout().heap_used(), 0);
    }

    #[test]
    fn test_top_release_absorbs_free_neighbour() {
        let mut mcu = boot();
        let heap_start = mcu.layout().heap_start;
        let a = mcu.malloc(30).unwrap();
        let b = mcu.malloc(10).unwrap();

        mcu.free(a).unwrap();
        assert_eq!(mcu.report().free_list, 32);
        mcu.free(b).unwrap();
        assert_eq!(mcu.layout().heap_break, Some(heap_start));
        assert_eq!(mcu.report().free_list, 0);
    }

    #[test]
    fn test_double_free_rejected() {
        let mut mcu = boot();
        let id = mcu.malloc(8).unwrap();
        mcu.free(id).unwrap();
        assert_eq!(mcu.free(id), Err(SimError::UnknownAllocation(id)));
        assert_eq!(mcu.free(7), Err(SimError::UnknownAllocation(7)));
    }

    #[test]
    fn test_poke_bounds() {
        let mut mcu = boot();
        let span = mcu.layout().stack_top - mcu.layout().static_data_end;
        assert!(mcu.poke(span, 1).is_ok());
        assert!(matches!(mcu.poke(span + 1, 1), Err(SimError::AddressOutOfRange(_))));
    }
}
