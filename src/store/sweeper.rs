//! Background expiration sweeper
//!
//! Periodically drops expired entries so long-idle keys do not linger until
//! the next access. Each tick locks the store for one bounded sample only.
//! Lazy expiration on access is sufficient for correctness; the sweeper is an
//! optimization.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{Receiver, RecvTimeoutError};
use parking_lot::Mutex;

use crate::error::Result;
use super::Store;

/// Spawn the sweeper thread.
///
/// Every `interval` the thread locks the store and sweeps up to `sample`
/// slots. It exits when the `stop` channel signals or disconnects, so
/// dropping the paired sender shuts it down.
pub fn spawn_sweeper(
    store: Arc<Mutex<Store>>,
    interval: Duration,
    sample: usize,
    stop: Receiver<()>,
) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("emberkv-sweeper".to_string())
        .spawn(move || {
            tracing::debug!(?interval, sample, "sweeper started");

            loop {
                match stop.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let removed = store.lock().sweep(sample);
                        if removed > 0 {
                            tracing::debug!(removed, "sweep dropped expired entries");
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }

            tracing::debug!("sweeper stopped");
        })?;

    Ok(handle)
}
