//! Linux errno values surfaced to the sandboxed process.

/// Result of a syscall handler: a non-negative return value or an errno.
pub type SyscallResult = Result<usize, Errno>;

/// Error numbers, with the same discriminants as the host kernel.
///
/// Every failure that crosses the syscall boundary is one of these; richer
/// internal errors must be mapped down before returning to the process.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Errno {
    /// Operation not permitted
    #[error("operation not permitted")]
    Eperm = 1,
    /// No such file or directory
    #[error("no such file or directory")]
    Enoent = 2,
    /// I/O error
    #[error("input/output error")]
    Eio = 5,
    /// Argument list too long
    #[error("argument list too long")]
    E2big = 7,
    /// Out of memory
    #[error("cannot allocate memory")]
    Enomem = 12,
    /// Permission denied
    #[error("permission denied")]
    Eacces = 13,
    /// Bad address
    #[error("bad address")]
    Efault = 14,
    /// File exists
    #[error("file exists")]
    Eexist = 17,
    /// Not a directory
    #[error("not a directory")]
    Enotdir = 20,
    /// Invalid argument
    #[error("invalid argument")]
    Einval = 22,
    /// No space left on device
    #[error("no space left on device")]
    Enospc = 28,
    /// Result too large for the destination buffer
    #[error("numerical result out of range")]
    Erange = 34,
    /// File name too long
    #[error("file name too long")]
    Enametoolong = 36,
    /// Function not implemented
    #[error("function not implemented")]
    Enosys = 38,
    /// Too many levels of symbolic links
    #[error("too many levels of symbolic links")]
    Eloop = 40,
    /// No data available (attribute not found)
    #[error("no data available")]
    Enodata = 61,
    /// Operation not supported
    #[error("operation not supported")]
    Eopnotsupp = 95,
}

impl Errno {
    /// Positive errno value.
    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    /// Look up an errno by its positive value.
    pub fn from_raw(raw: i32) -> Option<Self> {
        let errno = match raw {
            1 => Errno::Eperm,
            2 => Errno::Enoent,
            5 => Errno::Eio,
            7 => Errno::E2big,
            12 => Errno::Enomem,
            13 => Errno::Eacces,
            14 => Errno::Efault,
            17 => Errno::Eexist,
            20 => Errno::Enotdir,
            22 => Errno::Einval,
            28 => Errno::Enospc,
            34 => Errno::Erange,
            36 => Errno::Enametoolong,
            38 => Errno::Enosys,
            40 => Errno::Eloop,
            61 => Errno::Enodata,
            95 => Errno::Eopnotsupp,
            _ => return None,
        };
        Some(errno)
    }

    /// Encode a syscall result the way it is written back to the return
    /// register: the value on success, `-errno` on failure.
    pub fn encode(result: SyscallResult) -> i64 {
        match result {
            Ok(value) => value as i64,
            Err(errno) => -(errno.as_raw() as i64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_values_match_linux() {
        assert_eq!(Errno::Eperm.as_raw(), 1);
        assert_eq!(Errno::Efault.as_raw(), 14);
        assert_eq!(Errno::Erange.as_raw(), 34);
        assert_eq!(Errno::Enodata.as_raw(), 61);
        assert_eq!(Errno::Eopnotsupp.as_raw(), 95);
    }

    #[test]
    fn test_from_raw() {
        assert_eq!(Errno::from_raw(7), Some(Errno::E2big));
        assert_eq!(Errno::from_raw(20), Some(Errno::Enotdir));
        assert_eq!(Errno::from_raw(0), None);
        assert_eq!(Errno::from_raw(9999), None);
    }

    #[test]
    fn test_encode() {
        assert_eq!(Errno::encode(Ok(10)), 10);
        assert_eq!(Errno::encode(Err(Errno::Einval)), -22);
        assert_eq!(Errno::encode(Err(Errno::Erange)), -34);
    }
}
