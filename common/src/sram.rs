//! Byte-addressed memory access.
//!
//! The algorithms in this crate never dereference raw addresses themselves. On the
//! target, `memfree-avr` implements [`Sram`] with volatile accesses; on the host,
//! [`SliceSram`] maps an address window onto a byte slice.

/// Byte-granular read/write access to data memory.
pub trait Sram {
    /// Read the byte at `addr`.
    fn read(
        &self,
        addr: usize,
    ) -> u8;

    /// Write `value` to `addr`.
    fn write(
        &mut self,
        addr: usize,
        value: u8,
    );

    /// Read a little-endian 16-bit word (AVR `size_t` and pointers).
    fn read_u16(
        &self,
        addr: usize,
    ) -> u16 {
        u16::from_le_bytes([self.read(addr), self.read(addr.wrapping_add(1))])
    }
}

/// [`Sram`] backed by a byte slice mapped at `base`.
///
/// Addresses outside the window read as zero and writes to them are dropped.
pub struct SliceSram<'a> {
    base: usize,
    bytes: &'a mut [u8],
}

impl<'a> SliceSram<'a> {
    /// Map `bytes` so that `bytes[0]` is address `base`.
    pub fn new(
        base: usize,
        bytes: &'a mut [u8],
    ) -> Self {
        Self { base, bytes }
    }

    fn offset(
        &self,
        addr: usize,
    ) -> Option<usize> {
        addr.checked_sub(self.base).filter(|&off| off < self.bytes.len())
    }
}

impl Sram for SliceSram<'_> {
    fn read(
        &self,
        addr: usize,
    ) -> u8 {
        self.offset(addr).map_or(0, |off| self.bytes[off])
    }

    fn write(
        &mut self,
        addr: usize,
        value: u8,
    ) {
        if let Some(off) = self.offset(addr) {
            self.bytes[off] = value;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_mapping() {
        let mut bytes = [0u8; 4];
        let mut sram = SliceSram::new(0x0100, &mut bytes);
        sram.write(0x0102, 0xAB);
        assert_eq!(sram.read(0x0102), 0xAB);
        assert_eq!(bytes, [0, 0, 0xAB, 0]);
    }

    #[test]
    fn test_unmapped_reads_zero_and_drops_writes() {
        let mut bytes = [0x11u8; 2];
        let mut sram = SliceSram::new(0x0100, &mut bytes);
        sram.write(0x00FF, 0xEE);
        sram.write(0x0102, 0xEE);
        assert_eq!(sram.read(0x00FF), 0);
        assert_eq!(sram.read(0x0102), 0);
        assert_eq!(bytes, [0x11, 0x11]);
    }

    #[test]
    fn test_read_u16_little_endian() {
        let mut bytes = [0x34, 0x12];
        let sram = SliceSram::new(0x0200, &mut bytes);
        assert_eq!(sram.read_u16(0x0200), 0x1234);
    }
}
