//! Warden Memory Boundary
//!
//! Everything the kernel reads from or writes to a sandboxed process goes
//! through [`UserMemory`]. The contract is strict:
//!
//! - every byte of a requested range must be mapped with the needed access,
//!   otherwise the whole copy fails with `EFAULT`
//! - string copies stop at the first NUL and fail with `ENAMETOOLONG` when no
//!   NUL appears within the bound, instead of truncating
//! - a failed copy-out leaves the destination untouched
//!
//! [`AddressSpace`] is the in-kernel model of a process's mappings used by
//! the sentry and by tests.

#![no_std]
extern crate alloc;

mod addr;
mod space;

use alloc::string::String;
use alloc::vec::Vec;

use warden_abi::Errno;

pub use addr::{Addr, PAGE_MASK, PAGE_SIZE};
pub use space::{AccessType, AddressSpace};

/// Copy primitives over an untrusted address space.
pub trait UserMemory: Send + Sync {
    /// Copy exactly `len` bytes starting at `addr`.
    fn copy_in_bytes(&self, addr: Addr, len: usize) -> Result<Vec<u8>, Errno>;

    /// Copy all of `src` to `addr`.
    fn copy_out_bytes(&self, addr: Addr, src: &[u8]) -> Result<(), Errno>;

    /// Copy a NUL-terminated string of at most `max_len` bytes (NUL included).
    ///
    /// Reads page by page so that a fault past the terminator is never
    /// reported.
    fn copy_in_string(&self, addr: Addr, max_len: usize) -> Result<String, Errno> {
        let mut buf = Vec::new();
        let mut cur = addr;

        while buf.len() < max_len {
            let chunk_len = cur.bytes_to_page_end().min(max_len - buf.len());
            let chunk = self.copy_in_bytes(cur, chunk_len)?;

            if let Some(nul) = chunk.iter().position(|&b| b == 0) {
                buf.extend_from_slice(&chunk[..nul]);
                return String::from_utf8(buf).map_err(|_| Errno::Einval);
            }

            buf.extend_from_slice(&chunk);
            cur = cur.checked_add(chunk_len).ok_or(Errno::Efault)?;
        }

        Err(Errno::Enametoolong)
    }
}
