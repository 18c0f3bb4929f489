//! Free-port resolution.
//!
//! The development bootstrap asks a [`PortResolver`] for a bindable port
//! before listening. Resolution is the one recovery applied to a taken port;
//! a bind failure after that propagates.

use std::io;
use std::net::TcpListener;

use tracing::debug;

pub trait PortResolver: Send + Sync {
    /// Return a usable port, preferring `preferred`. Errs only when nothing
    /// can be bound at all.
    fn resolve_free_port(&self, preferred: u16) -> io::Result<u16>;
}

/// Probes `preferred`, `preferred + 1`, … by attempting a bind, falling back
/// to a kernel-assigned port when the scan range is exhausted.
pub struct ScanningPortResolver {
    pub max_attempts: u16,
}

impl Default for ScanningPortResolver {
    fn default() -> Self {
        Self { max_attempts: 100 }
    }
}

impl PortResolver for ScanningPortResolver {
    fn resolve_free_port(&self, preferred: u16) -> io::Result<u16> {
        for offset in 0..self.max_attempts {
            let Some(candidate) = preferred.checked_add(offset) else {
                break;
            };
            if port_is_free(candidate) {
                if candidate != preferred {
                    debug!(preferred, resolved = candidate, "preferred port taken");
                }
                return Ok(candidate);
            }
        }
        // scan exhausted, let the kernel pick
        let listener = TcpListener::bind(("127.0.0.1", 0))?;
        Ok(listener.local_addr()?.port())
    }
}

fn port_is_free(port: u16) -> bool {
    TcpListener::bind(("0.0.0.0", port)).is_ok()
}
