//! TCP listener that walks forward from a preferred port.

use std::sync::atomic::{AtomicU16, Ordering};

use mcsm_core::ListenerError;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Binds `host:preferred`, trying `preferred + 1`, `+ 2`, ... while the port
/// is in use, up to `max_attempts` ports in total.
#[derive(Debug)]
pub struct NegotiatingListener {
    host: String,
    preferred: u16,
    max_attempts: u16,
    bound: AtomicU16,
}

impl NegotiatingListener {
    pub fn new(host: impl Into<String>, preferred: u16, max_attempts: u16) -> Self {
        Self {
            host: host.into(),
            preferred,
            max_attempts: max_attempts.max(1),
            bound: AtomicU16::new(preferred),
        }
    }

    /// The port actually bound; before a successful bind, the preferred port.
    pub fn bound_port(&self) -> u16 {
        self.bound.load(Ordering::Acquire)
    }

    pub const fn preferred_port(&self) -> u16 {
        self.preferred
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Bind the first free port in the window.
    ///
    /// `AddrInUse` moves on to the next port; any other error ends the search.
    pub async fn bind(&self) -> Result<TcpListener, ListenerError> {
        let mut last = self.preferred;
        let mut attempts = 0;

        for offset in 0..self.max_attempts {
            let Some(port) = self.preferred.checked_add(offset) else {
                break;
            };
            last = port;
            attempts += 1;

            match TcpListener::bind((self.host.as_str(), port)).await {
                Ok(listener) => {
                    let actual = listener.local_addr().map_or(port, |addr| addr.port());
                    self.bound.store(actual, Ordering::Release);
                    if actual == self.preferred {
                        info!(host = %self.host, port = actual, "Listener bound");
                    } else {
                        info!(
                            host = %self.host,
                            preferred = self.preferred,
                            port = actual,
                            "Preferred port busy, bound alternate port"
                        );
                    }
                    return Ok(listener);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                    debug!(port, "Port in use, trying next");
                }
                Err(source) => return Err(ListenerError::Bind { port, source }),
            }
        }

        Err(ListenerError::NoPortAvailable {
            first: self.preferred,
            last,
            attempts,
        })
    }
}
