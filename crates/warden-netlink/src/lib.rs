//! Warden Netlink
//!
//! Netlink sockets are addressed by a per-protocol port id. The kernel
//! keeps one [`PortManager`] for the whole sandbox; it is a checkpointable
//! object like every other piece of kernel state.

#![no_std]
extern crate alloc;

mod port;

pub use port::{PortManager, MAX_PORTS};
