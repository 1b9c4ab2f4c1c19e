// Tracks the viewport width and flips `ui.is_mobile` across the breakpoint.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::bus::{BusEvent, ViewChange};
use crate::config::MapSettings;
use crate::debounce::Debouncer;
use crate::store::{Action, Store, UiPatch};

#[derive(Clone)]
pub struct ResponsiveService {
    inner: Arc<ResponsiveInner>,
}

struct ResponsiveInner {
    store: Arc<Store>,
    settings: MapSettings,
    width: AtomicU32,
    resize: Debouncer,
}

impl ResponsiveService {
    pub fn new(store: Arc<Store>, settings: MapSettings, cancel: CancellationToken) -> Self {
        let resize = Debouncer::new(settings.resize_debounce, cancel);
        Self {
            inner: Arc::new(ResponsiveInner {
                store,
                settings,
                width: AtomicU32::new(0),
                resize,
            }),
        }
    }

    /// Classify `width` and publish `ui:viewChanged` when the layout flips.
    ///
    /// Returns whether the layout changed.
    pub fn update_layout(&self, width: u32) -> bool {
        self.inner.update_layout(width)
    }

    /// Viewport resized. Only the last width in a burst is classified.
    pub fn on_resize(&self, width: u32) {
        self.inner.width.store(width, Ordering::Relaxed);
        let weak: Weak<ResponsiveInner> = Arc::downgrade(&self.inner);
        self.inner.resize.call(move || {
            if let Some(inner) = weak.upgrade() {
                let width = inner.width.load(Ordering::Relaxed);
                inner.update_layout(width);
            }
        });
    }
}

impl ResponsiveInner {
    fn update_layout(&self, width: u32) -> bool {
        self.width.store(width, Ordering::Relaxed);
        let is_mobile = self.settings.is_mobile_width(width);
        if is_mobile == self.store.is_mobile() {
            return false;
        }
        info!(
            width,
            layout = if is_mobile { "mobile" } else { "desktop" },
            "view changed"
        );
        self.store
            .dispatch(Action::SetUiState(UiPatch::mobile(is_mobile)));
        self.store
            .bus()
            .publish(&BusEvent::UiViewChanged(ViewChange { is_mobile }));
        true
    }
}
