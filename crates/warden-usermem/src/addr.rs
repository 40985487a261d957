//! Addresses in the sandboxed process's address space.

use core::fmt;

/// Page size (4 KiB)
pub const PAGE_SIZE: usize = 4096;
/// Page size mask
pub const PAGE_MASK: usize = PAGE_SIZE - 1;

/// A virtual address supplied by (and only meaningful to) the sandboxed
/// process. It is never dereferenced directly.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Addr(pub u64);

impl Addr {
    /// The null address.
    pub const NULL: Self = Self(0);

    /// Raw value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Check whether this address is page aligned.
    #[inline]
    pub const fn is_page_aligned(self) -> bool {
        self.0 as usize & PAGE_MASK == 0
    }

    /// Add a byte offset, returning `None` on overflow.
    #[inline]
    pub fn checked_add(self, len: usize) -> Option<Self> {
        self.0.checked_add(len as u64).map(Self)
    }

    /// Number of bytes from this address to the end of its page.
    #[inline]
    pub const fn bytes_to_page_end(self) -> usize {
        PAGE_SIZE - (self.0 as usize & PAGE_MASK)
    }
}

impl fmt::Debug for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Addr({:#x})", self.0)
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for Addr {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_math() {
        assert!(Addr(0x1000).is_page_aligned());
        assert!(!Addr(0x1001).is_page_aligned());
        assert_eq!(Addr(0x1000).bytes_to_page_end(), PAGE_SIZE);
        assert_eq!(Addr(0x1ffe).bytes_to_page_end(), 2);
    }

    #[test]
    fn test_checked_add_overflow() {
        assert_eq!(Addr(0x10).checked_add(0x10), Some(Addr(0x20)));
        assert_eq!(Addr(u64::MAX - 1).checked_add(2), None);
    }
}
