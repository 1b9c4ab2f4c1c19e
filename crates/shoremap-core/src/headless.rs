// ── Headless map and sidebar ──
//
// Recording implementations of `MapEngine` and `SidebarSurface`. They
// keep every call in order so a session can be replayed and inspected
// without a renderer, which is how the CLI simulates interactions.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::error::CoreError;
use crate::map::{CameraMove, Cursor, MapEngine, PopupContent};
use crate::model::{Feature, LngLat};
use crate::store::{ElementHandle, PopupId};
use crate::ui::{DetailViewModel, ListItem, SidebarSurface};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Map ──────────────────────────────────────────────────────────────

/// One call made against the headless engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "kebab-case")]
pub enum MapCall {
    FlyTo(CameraMove),
    EaseTo { zoom: Option<f64>, speed: f64 },
    FeatureState { feature: Option<String>, hovered: bool },
    Cursor { cursor: Cursor },
    OpenPopup { popup: PopupId, at: LngLat, content: PopupContent },
    RemovePopup { popup: PopupId },
}

/// A map engine that renders nothing and records everything.
#[derive(Debug, Default)]
pub struct HeadlessMap {
    calls: Mutex<Vec<MapCall>>,
    layers: Mutex<HashMap<String, Vec<Feature>>>,
    clusters: Mutex<HashMap<i64, usize>>,
    popups: Mutex<Vec<PopupId>>,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Features `query_rendered_features` returns for `layer`.
    pub fn set_layer(&self, layer: &str, features: Vec<Feature>) {
        let features = features
            .into_iter()
            .map(|f| if f.layer.is_some() { f } else { f.with_layer(layer) })
            .collect();
        lock(&self.layers).insert(layer.to_owned(), features);
    }

    pub fn set_cluster_size(&self, cluster_id: i64, leaves: usize) {
        lock(&self.clusters).insert(cluster_id, leaves);
    }

    pub fn calls(&self) -> Vec<MapCall> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    pub fn open_popups(&self) -> Vec<PopupId> {
        lock(&self.popups).clone()
    }

    /// The most recent flight, if any.
    pub fn last_flight(&self) -> Option<CameraMove> {
        lock(&self.calls).iter().rev().find_map(|c| match c {
            MapCall::FlyTo(camera) => Some(camera.clone()),
            _ => None,
        })
    }

    fn record(&self, call: MapCall) {
        lock(&self.calls).push(call);
    }
}

impl MapEngine for HeadlessMap {
    fn fly_to(&self, camera: &CameraMove) {
        self.record(MapCall::FlyTo(camera.clone()));
    }

    fn ease_to(&self, zoom: Option<f64>, speed: f64) {
        self.record(MapCall::EaseTo { zoom, speed });
    }

    fn set_feature_state(&self, feature: &Feature, hovered: bool) {
        self.record(MapCall::FeatureState {
            feature: feature.id.as_ref().map(ToString::to_string),
            hovered,
        });
    }

    fn set_cursor(&self, cursor: Cursor) {
        self.record(MapCall::Cursor { cursor });
    }

    fn query_rendered_features(&self, layer: &str) -> Vec<Feature> {
        lock(&self.layers).get(layer).cloned().unwrap_or_default()
    }

    fn cluster_leaf_count(&self, source: &str, cluster_id: i64) -> Result<usize, CoreError> {
        lock(&self.clusters)
            .get(&cluster_id)
            .copied()
            .ok_or_else(|| CoreError::NotFound {
                entity_type: format!("cluster in {source}"),
                identifier: cluster_id.to_string(),
            })
    }

    fn open_popup(&self, content: &PopupContent, at: LngLat, _offset: u32) -> PopupId {
        let popup = PopupId::new();
        lock(&self.popups).push(popup);
        self.record(MapCall::OpenPopup {
            popup,
            at,
            content: content.clone(),
        });
        popup
    }

    fn remove_popup(&self, popup: PopupId) {
        lock(&self.popups).retain(|p| *p != popup);
        self.record(MapCall::RemovePopup { popup });
    }
}

// ── Sidebar ──────────────────────────────────────────────────────────

/// One render made against the headless surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "kebab-case")]
pub enum SurfaceCall {
    List { container: ElementHandle, items: Vec<ListItem> },
    Placeholder { container: ElementHandle, message: String },
    Detail { panel: ElementHandle, view: DetailViewModel },
    Error { element: ElementHandle, message: String },
}

/// A sidebar whose elements are their own selectors.
///
/// Every selector resolves unless listed as missing; elements start
/// visible.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    missing: HashSet<String>,
    hidden: Mutex<HashSet<String>>,
    calls: Mutex<Vec<SurfaceCall>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A page that lacks the given selectors.
    pub fn without<'a>(selectors: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            missing: selectors.into_iter().map(str::to_owned).collect(),
            ..Self::default()
        }
    }

    pub fn visible(&self, selector: &str) -> bool {
        !lock(&self.hidden).contains(selector)
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        lock(&self.calls).clone()
    }

    pub fn last_list(&self) -> Vec<ListItem> {
        lock(&self.calls)
            .iter()
            .rev()
            .find_map(|c| match c {
                SurfaceCall::List { items, .. } => Some(items.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn last_placeholder(&self) -> Option<String> {
        lock(&self.calls).iter().rev().find_map(|c| match c {
            SurfaceCall::Placeholder { message, .. } => Some(message.clone()),
            _ => None,
        })
    }

    pub fn last_detail(&self) -> Option<DetailViewModel> {
        lock(&self.calls).iter().rev().find_map(|c| match c {
            SurfaceCall::Detail { view, .. } => Some(view.clone()),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<(ElementHandle, String)> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                SurfaceCall::Error { element, message } => Some((element.clone(), message.clone())),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: SurfaceCall) {
        lock(&self.calls).push(call);
    }
}

impl SidebarSurface for HeadlessSurface {
    fn locate(&self, selector: &str) -> Option<ElementHandle> {
        (!self.missing.contains(selector)).then(|| ElementHandle::new(selector))
    }

    fn set_visible(&self, element: &ElementHandle, visible: bool) {
        let mut hidden = lock(&self.hidden);
        if visible {
            hidden.remove(element.as_str());
        } else {
            hidden.insert(element.as_str().to_owned());
        }
    }

    fn is_visible(&self, element: &ElementHandle) -> bool {
        self.visible(element.as_str())
    }

    fn render_list(&self, container: &ElementHandle, items: &[ListItem]) {
        self.record(SurfaceCall::List {
            container: container.clone(),
            items: items.to_vec(),
        });
    }

    fn render_placeholder(&self, container: &ElementHandle, message: &str) {
        self.record(SurfaceCall::Placeholder {
            container: container.clone(),
            message: message.to_owned(),
        });
    }

    fn render_detail(&self, panel: &ElementHandle, view: &DetailViewModel) {
        self.record(SurfaceCall::Detail {
            panel: panel.clone(),
            view: view.clone(),
        });
    }

    fn show_error(&self, element: &ElementHandle, message: &str) {
        self.record(SurfaceCall::Error {
            element: element.clone(),
            message: message.to_owned(),
        });
    }
}
