// ── State streams ──
//
// Async view of the store for consumers that only care about the latest
// state, not each transition.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::ApplicationState;

/// A subscription to the application state.
///
/// Provides point-in-time snapshot access plus change notification via
/// [`changed`](Self::changed) or by converting into a `Stream`.
pub struct StateStream {
    current: Arc<ApplicationState>,
    receiver: watch::Receiver<Arc<ApplicationState>>,
}

impl StateStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<ApplicationState>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation (or at the last `changed`).
    pub fn current(&self) -> &Arc<ApplicationState> {
        &self.current
    }

    /// The latest snapshot.
    pub fn latest(&self) -> Arc<ApplicationState> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next revision. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Arc<ApplicationState>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    pub fn into_stream(self) -> StateWatchStream {
        StateWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`. Yields the current
/// state first, then each new revision.
pub struct StateWatchStream {
    inner: WatchStream<Arc<ApplicationState>>,
}

impl Stream for StateWatchStream {
    type Item = Arc<ApplicationState>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
