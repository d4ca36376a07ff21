//! One-second countdown running as a cancellable tokio task.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};

const TICK: Duration = Duration::from_secs(1);

/// A running countdown. Dropping it cancels the task; the expiry callback
/// never runs after that.
#[derive(Debug)]
pub struct Countdown {
    remaining: Arc<AtomicU64>,
    _cancel: DropGuard,
}

impl Countdown {
    /// Starts counting down from `seconds` on `runtime`, calling `on_expired`
    /// once when the count reaches zero.
    ///
    /// The caller does not need to be inside the runtime.
    pub fn start<F, Fut>(runtime: &Handle, seconds: u64, on_expired: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let remaining = Arc::new(AtomicU64::new(seconds));
        let token = CancellationToken::new();

        let counter = Arc::clone(&remaining);
        let cancelled = token.clone();
        runtime.spawn(async move {
            let mut ticks = interval_at(Instant::now() + TICK, TICK);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => return,
                    _ = ticks.tick() => {
                        let left = counter.load(Ordering::SeqCst).saturating_sub(1);
                        counter.store(left, Ordering::SeqCst);
                        if left == 0 {
                            break;
                        }
                    }
                }
            }

            if !cancelled.is_cancelled() {
                on_expired().await;
            }
        });

        Self {
            remaining,
            _cancel: token.drop_guard(),
        }
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining.load(Ordering::SeqCst)
    }
}
