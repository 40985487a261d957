//! Flags accepted by `setxattr(2)`.

use bitflags::bitflags;

bitflags! {
    /// `XATTR_CREATE` / `XATTR_REPLACE`.
    ///
    /// Only these two bits are valid; callers must reject anything else
    /// with `EINVAL` before acting on the request.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct XattrFlags: u32 {
        /// Fail with `EEXIST` if the attribute already exists.
        const CREATE = 1;
        /// Fail with `ENODATA` if the attribute does not exist.
        const REPLACE = 2;
    }
}

impl XattrFlags {
    /// Parse raw syscall flags, returning `None` if any unknown bit is set.
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::from_bits(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_bits() {
        assert_eq!(XattrFlags::from_raw(0), Some(XattrFlags::empty()));
        assert_eq!(XattrFlags::from_raw(1), Some(XattrFlags::CREATE));
        assert_eq!(XattrFlags::from_raw(2), Some(XattrFlags::REPLACE));
        assert_eq!(
            XattrFlags::from_raw(3),
            Some(XattrFlags::CREATE | XattrFlags::REPLACE)
        );
    }

    #[test]
    fn test_unknown_bits_rejected() {
        assert_eq!(XattrFlags::from_raw(4), None);
        assert_eq!(XattrFlags::from_raw(0x8000_0001), None);
    }
}
