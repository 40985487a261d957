//! In-kernel model of a sandboxed process's mappings.
//!
//! Mappings are page granular. A copy is validated against the whole
//! requested range before a single byte moves, so a fault never leaves a
//! partially written destination behind.

use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};

use bitflags::bitflags;
use spin::Mutex;
use warden_abi::Errno;

use crate::addr::{Addr, PAGE_SIZE};
use crate::UserMemory;

bitflags! {
    /// Access permitted on a mapping.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct AccessType: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
    }
}

struct Region {
    data: Vec<u8>,
    access: AccessType,
}

impl Region {
    fn end(&self, start: u64) -> u64 {
        start + self.data.len() as u64
    }
}

/// A contiguous piece of a validated range that lives inside one region.
struct Segment {
    region_start: u64,
    offset: usize,
    len: usize,
}

/// A process address space made of page-aligned mappings.
pub struct AddressSpace {
    /// Mappings keyed by start address
    regions: Mutex<BTreeMap<u64, Region>>,
    /// Successful copy-outs (observable by tests)
    copy_outs: AtomicUsize,
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressSpace {
    /// Create an empty address space.
    pub fn new() -> Self {
        Self {
            regions: Mutex::new(BTreeMap::new()),
            copy_outs: AtomicUsize::new(0),
        }
    }

    /// Map `len` bytes (rounded up to whole pages) at `start`, zero filled.
    ///
    /// Fails with `EINVAL` for an unaligned start or empty length and with
    /// `EEXIST` if the range overlaps an existing mapping.
    pub fn map(&self, start: Addr, len: usize, access: AccessType) -> Result<(), Errno> {
        if !start.is_page_aligned() || len == 0 {
            return Err(Errno::Einval);
        }
        let len = len.div_ceil(PAGE_SIZE) * PAGE_SIZE;
        let end = start.checked_add(len).ok_or(Errno::Einval)?;

        let mut regions = self.regions.lock();
        let overlaps = regions
            .range(..end.0)
            .next_back()
            .is_some_and(|(&s, r)| r.end(s) > start.0);
        if overlaps {
            return Err(Errno::Eexist);
        }

        regions.insert(
            start.0,
            Region {
                data: vec![0; len],
                access,
            },
        );
        log::trace!("[usermem] mapped {:#x} bytes at {} ({:?})", len, start, access);
        Ok(())
    }

    /// Remove the mapping that starts at `start`.
    pub fn unmap(&self, start: Addr) -> Result<(), Errno> {
        self.regions
            .lock()
            .remove(&start.0)
            .map(|_| ())
            .ok_or(Errno::Einval)
    }

    /// Change the access of the mapping that starts at `start`.
    pub fn protect(&self, start: Addr, access: AccessType) -> Result<(), Errno> {
        let mut regions = self.regions.lock();
        let region = regions.get_mut(&start.0).ok_or(Errno::Einval)?;
        region.access = access;
        Ok(())
    }

    /// Write into mapped memory regardless of its access bits.
    ///
    /// This is the loader's view of memory (populating arguments before the
    /// process runs), not the syscall path.
    pub fn poke(&self, addr: Addr, src: &[u8]) -> Result<(), Errno> {
        let mut regions = self.regions.lock();
        let segments = Self::segments(&regions, addr, src.len(), AccessType::empty())?;
        Self::write_segments(&mut regions, &segments, src);
        Ok(())
    }

    /// Read mapped memory regardless of its access bits.
    pub fn peek(&self, addr: Addr, len: usize) -> Result<Vec<u8>, Errno> {
        let regions = self.regions.lock();
        let segments = Self::segments(&regions, addr, len, AccessType::empty())?;
        Ok(Self::read_segments(&regions, &segments, len))
    }

    /// Number of successful, non-empty copy-outs performed so far.
    pub fn copy_out_count(&self) -> usize {
        self.copy_outs.load(Ordering::Relaxed)
    }

    /// Split `[addr, addr+len)` into per-region segments, checking that every
    /// byte is mapped with at least `need` access.
    fn segments(
        regions: &BTreeMap<u64, Region>,
        addr: Addr,
        len: usize,
        need: AccessType,
    ) -> Result<Vec<Segment>, Errno> {
        let end = addr.checked_add(len).ok_or(Errno::Efault)?;
        let mut segments = Vec::new();
        let mut cur = addr.0;

        while cur < end.0 {
            let (&start, region) = regions.range(..=cur).next_back().ok_or(Errno::Efault)?;
            let region_end = region.end(start);
            if cur >= region_end || !region.access.contains(need) {
                return Err(Errno::Efault);
            }

            let take = (region_end.min(end.0) - cur) as usize;
            segments.push(Segment {
                region_start: start,
                offset: (cur - start) as usize,
                len: take,
            });
            cur += take as u64;
        }

        Ok(segments)
    }

    fn read_segments(regions: &BTreeMap<u64, Region>, segments: &[Segment], len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len);
        for seg in segments {
            // Segments were produced from this same map under the same lock.
            if let Some(region) = regions.get(&seg.region_start) {
                out.extend_from_slice(&region.data[seg.offset..seg.offset + seg.len]);
            }
        }
        out
    }

    fn write_segments(regions: &mut BTreeMap<u64, Region>, segments: &[Segment], src: &[u8]) {
        let mut written = 0;
        for seg in segments {
            if let Some(region) = regions.get_mut(&seg.region_start) {
                region.data[seg.offset..seg.offset + seg.len]
                    .copy_from_slice(&src[written..written + seg.len]);
            }
            written += seg.len;
        }
    }
}

impl UserMemory for AddressSpace {
    fn copy_in_bytes(&self, addr: Addr, len: usize) -> Result<Vec<u8>, Errno> {
        if len == 0 {
            return Ok(Vec::new());
        }

        let regions = self.regions.lock();
        let segments = Self::segments(&regions, addr, len, AccessType::READ).inspect_err(|_| {
            log::trace!("[usermem] fault reading {} bytes at {}", len, addr);
        })?;
        Ok(Self::read_segments(&regions, &segments, len))
    }

    fn copy_out_bytes(&self, addr: Addr, src: &[u8]) -> Result<(), Errno> {
        if src.is_empty() {
            return Ok(());
        }

        let mut regions = self.regions.lock();
        let segments =
            Self::segments(&regions, addr, src.len(), AccessType::WRITE).inspect_err(|_| {
                log::trace!("[usermem] fault writing {} bytes at {}", src.len(), addr);
            })?;
        Self::write_segments(&mut regions, &segments, src);
        self.copy_outs.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;

    const BASE: Addr = Addr(0x10_0000);

    fn space() -> AddressSpace {
        let space = AddressSpace::new();
        space.map(BASE, PAGE_SIZE, AccessType::READ_WRITE).unwrap();
        space
    }

    #[test]
    fn test_copy_round_trip() {
        let space = space();
        space.copy_out_bytes(BASE, b"hello").unwrap();
        assert_eq!(space.copy_in_bytes(BASE, 5).unwrap(), b"hello");
        assert_eq!(space.copy_out_count(), 1);
    }

    #[test]
    fn test_zero_length_never_faults() {
        let space = AddressSpace::new();
        assert!(space.copy_in_bytes(Addr::NULL, 0).unwrap().is_empty());
        assert!(space.copy_out_bytes(Addr::NULL, &[]).is_ok());
        assert_eq!(space.copy_out_count(), 0);
    }

    #[test]
    fn test_unmapped_faults() {
        let space = space();
        assert_eq!(space.copy_in_bytes(Addr(0x2000), 1), Err(Errno::Efault));
        assert_eq!(space.copy_out_bytes(Addr(0x2000), b"x"), Err(Errno::Efault));
    }

    #[test]
    fn test_range_crossing_end_of_mapping_faults_without_partial_write() {
        let space = space();
        let tail = BASE.checked_add(PAGE_SIZE - 2).unwrap();
        assert_eq!(space.copy_out_bytes(tail, b"abcd"), Err(Errno::Efault));
        assert_eq!(space.peek(tail, 2).unwrap(), [0, 0]);
    }

    #[test]
    fn test_adjacent_mappings_are_contiguous() {
        let space = space();
        let next = BASE.checked_add(PAGE_SIZE).unwrap();
        space.map(next, PAGE_SIZE, AccessType::READ_WRITE).unwrap();

        let straddle = BASE.checked_add(PAGE_SIZE - 2).unwrap();
        space.copy_out_bytes(straddle, b"abcd").unwrap();
        assert_eq!(space.copy_in_bytes(straddle, 4).unwrap(), b"abcd");
    }

    #[test]
    fn test_access_bits_enforced() {
        let space = space();
        space.protect(BASE, AccessType::READ).unwrap();
        assert_eq!(space.copy_out_bytes(BASE, b"x"), Err(Errno::Efault));
        assert!(space.copy_in_bytes(BASE, 1).is_ok());

        space.protect(BASE, AccessType::WRITE).unwrap();
        assert_eq!(space.copy_in_bytes(BASE, 1), Err(Errno::Efault));
    }

    #[test]
    fn test_overflowing_range_faults() {
        let space = space();
        assert_eq!(
            space.copy_in_bytes(Addr(u64::MAX - 1), 16),
            Err(Errno::Efault)
        );
    }

    #[test]
    fn test_map_rejects_overlap_and_misalignment() {
        let space = space();
        assert_eq!(space.map(BASE, 1, AccessType::READ), Err(Errno::Eexist));
        assert_eq!(space.map(Addr(0x1001), 1, AccessType::READ), Err(Errno::Einval));
        assert_eq!(space.map(Addr(0x1000), 0, AccessType::READ), Err(Errno::Einval));
    }

    #[test]
    fn test_copy_in_string() {
        let space = space();
        space.poke(BASE, b"user.mime\0garbage").unwrap();
        assert_eq!(
            space.copy_in_string(BASE, 256).unwrap(),
            String::from("user.mime")
        );
    }

    #[test]
    fn test_copy_in_string_too_long() {
        let space = space();
        space.poke(BASE, b"abcdef\0").unwrap();
        assert_eq!(space.copy_in_string(BASE, 6), Err(Errno::Enametoolong));
        assert_eq!(space.copy_in_string(BASE, 7).unwrap(), "abcdef");
    }

    #[test]
    fn test_copy_in_string_stops_before_unmapped_page() {
        let space = space();
        let near_end = BASE.checked_add(PAGE_SIZE - 3).unwrap();
        space.poke(near_end, b"ab\0").unwrap();
        // The bound reaches into the unmapped next page, but the NUL comes first.
        assert_eq!(space.copy_in_string(near_end, 64).unwrap(), "ab");
    }

    #[test]
    fn test_copy_in_string_faults_when_unterminated_at_mapping_end() {
        let space = space();
        let near_end = BASE.checked_add(PAGE_SIZE - 3).unwrap();
        space.poke(near_end, b"abc").unwrap();
        assert_eq!(space.copy_in_string(near_end, 64), Err(Errno::Efault));
    }

    #[test]
    fn test_copy_in_string_rejects_invalid_utf8() {
        let space = space();
        space.poke(BASE, &[0xff, 0xfe, 0]).unwrap();
        assert_eq!(space.copy_in_string(BASE, 16), Err(Errno::Einval));
    }
}
