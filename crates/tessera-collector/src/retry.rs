//! Bounded connect retry with exponential backoff.

use std::net::SocketAddr;
use std::time::Duration;

use tessera_net::{NetError, PeerConnection, Transport};
use tracing::{debug, warn};

/// How often and how patiently to retry connecting to a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total connect attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    ///
    /// Doubles each time, starting at `initial_backoff`, capped at
    /// `max_backoff`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(31);
        self.initial_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }

    /// Connect to `addr`, retrying failures until attempts are exhausted.
    ///
    /// Returns the last connect error once the policy gives up.
    pub async fn connect(
        &self,
        transport: &dyn Transport,
        addr: SocketAddr,
    ) -> Result<Box<dyn PeerConnection>, NetError> {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match transport.connect(addr).await {
                Ok(conn) => return Ok(conn),
                Err(e) if attempt >= attempts => {
                    warn!(%addr, attempts, "giving up on member: {e}");
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.backoff(attempt);
                    debug!(%addr, attempt, delay_ms = delay.as_millis() as u64, "connect failed: {e}");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
