//! Port id allocation.

use alloc::collections::{BTreeMap, BTreeSet};
use warden_state::{Sink, Source, StateError, Stateful};

/// Highest port id handed out by probing.
pub const MAX_PORTS: i32 = 10_000;

/// Reserved for the kernel end of every protocol.
const KERNEL_PORT: i32 = 0;

/// Allocated port ids, per protocol.
#[derive(Debug, Default)]
pub struct PortManager {
    /// protocol -> allocated ports (port 0 included once the protocol is used)
    ports: BTreeMap<i32, BTreeSet<i32>>,
    /// protocol -> ports held by sockets. Derived from `ports`.
    in_use: BTreeMap<i32, usize>,
}

impl PortManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a port for `protocol`.
    ///
    /// A non-zero `port` is taken exactly or not at all. Zero asks for any
    /// free port, probing upward from 1. Returns `None` if nothing is free.
    pub fn allocate(&mut self, protocol: i32, port: i32) -> Option<i32> {
        let used = self
            .ports
            .entry(protocol)
            .or_insert_with(|| BTreeSet::from([KERNEL_PORT]));

        let chosen = if port != KERNEL_PORT {
            (!used.contains(&port)).then_some(port)
        } else {
            (1..=MAX_PORTS).find(|candidate| !used.contains(candidate))
        };

        match chosen {
            Some(port) => {
                used.insert(port);
                *self.in_use.entry(protocol).or_default() += 1;
                log::trace!("[netlink] protocol {} allocated port {}", protocol, port);
            }
            None => log::debug!("[netlink] protocol {} has no free port", protocol),
        }
        chosen
    }

    /// Return `port` to the pool. Releasing a free port is a no-op.
    pub fn release(&mut self, protocol: i32, port: i32) {
        if port == KERNEL_PORT {
            return;
        }
        let removed = self
            .ports
            .get_mut(&protocol)
            .is_some_and(|used| used.remove(&port));
        if removed {
            if let Some(count) = self.in_use.get_mut(&protocol) {
                *count -= 1;
            }
        }
    }

    /// Whether `port` is currently allocated for `protocol`.
    pub fn is_allocated(&self, protocol: i32, port: i32) -> bool {
        self.ports
            .get(&protocol)
            .is_some_and(|used| used.contains(&port))
    }

    /// Number of socket-held ports for `protocol`.
    pub fn in_use(&self, protocol: i32) -> usize {
        self.in_use.get(&protocol).copied().unwrap_or(0)
    }
}

impl Stateful for PortManager {
    const TYPE_NAME: &'static str = "pkg/sentry/socket/netlink/port.Manager";
    const FIELDS: &'static [&'static str] = &["ports"];

    fn save(&self, sink: &mut Sink<'_>) -> Result<(), StateError> {
        sink.save("ports", &self.ports)
    }

    fn after_load(&mut self) {
        self.in_use = self
            .ports
            .iter()
            .map(|(&protocol, used)| {
                let held = used.iter().filter(|&&p| p != KERNEL_PORT).count();
                (protocol, held)
            })
            .collect();
    }

    fn load(&mut self, source: &mut Source<'_>) -> Result<(), StateError> {
        self.ports = source.load("ports")?;
        Ok(())
    }
}
