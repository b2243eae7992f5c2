//! Debounced callbacks on the tokio timer
//!
//! A `Debounced` wrapper keeps at most one pending invocation. Every call
//! aborts the pending task and spawns a fresh one, so a burst of calls
//! collapses into a single callback run `delay` after the last call, with
//! that call's arguments.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::Result;

/// Delay used when none (or zero) is given
pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

/// Debounce configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Quiet period in milliseconds; 0 falls back to the default
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY.as_millis() as u64
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
        }
    }
}

impl DebounceConfig {
    pub fn delay(&self) -> Duration {
        effective_delay(Some(Duration::from_millis(self.delay_ms)))
    }
}

fn effective_delay(delay: Option<Duration>) -> Duration {
    match delay {
        Some(d) if !d.is_zero() => d,
        _ => DEFAULT_DELAY,
    }
}

type Callback<A> = Arc<dyn Fn(A) + Send + Sync>;

/// A callback wrapped so that bursts of calls collapse into one.
///
/// Clones share the pending slot: calling any clone supersedes a call made
/// through another.
pub struct Debounced<A> {
    callback: Callback<A>,
    delay: Duration,
    runtime: Handle,
    pending: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl<A> Clone for Debounced<A> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
            delay: self.delay,
            runtime: self.runtime.clone(),
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<A: Send + 'static> Debounced<A> {
    /// Schedule the callback with `args`, replacing any pending invocation.
    ///
    /// Never blocks and never runs the callback inline.
    pub fn call(&self, args: A) {
        let callback = Arc::clone(&self.callback);
        let delay = self.delay;

        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            previous.abort();
            tracing::trace!("debounced call superseded");
        }

        *pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            callback(args);
        }));
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Wrap `callback` so repeated calls within `delay` fire it only once.
///
/// `None` or a zero delay means [`DEFAULT_DELAY`]. Must be called from
/// inside a tokio runtime; the wrapper spawns its timers there.
pub fn debounce<A, F>(callback: F, delay: Option<Duration>) -> Result<Debounced<A>>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    let runtime = Handle::try_current()?;
    let delay = effective_delay(delay);
    tracing::debug!(?delay, "created debounced callback");

    Ok(Debounced {
        callback: Arc::new(callback),
        delay,
        runtime,
        pending: Arc::new(Mutex::new(None)),
    })
}

/// [`debounce`] with the delay taken from a config
pub fn debounce_with_config<A, F>(callback: F, config: &DebounceConfig) -> Result<Debounced<A>>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    debounce(callback, Some(config.delay()))
}
