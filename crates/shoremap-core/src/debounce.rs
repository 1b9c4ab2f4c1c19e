// ── Trailing-edge debouncer ──
//
// Each call re-arms the timer; only the last call in a burst runs, one
// quiet period after it was made.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub struct Debouncer {
    delay: Duration,
    cancel: CancellationToken,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration, cancel: CancellationToken) -> Self {
        Self {
            delay,
            cancel,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `f`, dropping whatever was scheduled before.
    ///
    /// Outside a Tokio runtime there is no timer to arm, so `f` runs
    /// immediately.
    pub fn call<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime, running debounced call immediately");
            f();
            return;
        };

        let delay = self.delay;
        let cancel = self.cancel.clone();
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(runtime.spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(delay) => f(),
            }
        }));
    }

    /// Drop the scheduled call, if any.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let make = {
            let hits = Arc::clone(&hits);
            move || -> Box<dyn FnOnce() + Send> {
                let hits = Arc::clone(&hits);
                Box::new(move || {
                    hits.fetch_add(1, Ordering::SeqCst);
                })
            }
        };
        (hits, make)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_one_trailing_call() {
        let debouncer = Debouncer::new(Duration::from_millis(250), CancellationToken::new());
        let (hits, make) = counter();

        for _ in 0..5 {
            debouncer.call(make());
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_calls_each_fire() {
        let debouncer = Debouncer::new(Duration::from_millis(250), CancellationToken::new());
        let (hits, make) = counter();

        debouncer.call(make());
        tokio::time::sleep(Duration::from_millis(300)).await;
        debouncer.call(make());
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_token_stops_pending_call() {
        let token = CancellationToken::new();
        let debouncer = Debouncer::new(Duration::from_millis(250), token.clone());
        let (hits, make) = counter();

        debouncer.call(make());
        token.cancel();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn without_runtime_runs_inline() {
        let debouncer = Debouncer::new(Duration::from_millis(250), CancellationToken::new());
        let (hits, make) = counter();
        debouncer.call(make());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
