// ── Map engine seam ──
//
// Everything the controller needs from a rendering engine. A browser
// binding, a native renderer, or the CLI's recording engine implement it.

use serde::Serialize;

use super::popup::PopupContent;
use crate::error::CoreError;
use crate::model::{Feature, LngLat};
use crate::store::PopupId;

/// Label layer of every beach point.
pub const BEACH_LAYER: &str = "beach-labels";
/// Label layer of every POI point.
pub const POI_LAYER: &str = "poi-labels";
/// Clustered region labels. The id is misspelled in the published style.
pub const REGION_LAYER: &str = "region-lables";
pub const STATE_LAYER: &str = "state-labels";
pub const CALIFORNIA_FILL_LAYER: &str = "fill-california";
pub const HAWAII_FILL_LAYER: &str = "fill-hawaii";

/// Layers that receive click, hover and leave events.
pub const INTERACTIVE_LAYERS: &[&str] = &[
    STATE_LAYER,
    CALIFORNIA_FILL_LAYER,
    HAWAII_FILL_LAYER,
    REGION_LAYER,
    BEACH_LAYER,
    POI_LAYER,
];

/// Options the engine is constructed with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapOptions {
    pub center: LngLat,
    pub zoom: f64,
    pub pitch: f64,
    /// When false the engine disables drag and touch rotation.
    pub allow_rotation: bool,
}

/// An animated camera flight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraMove {
    pub center: LngLat,
    pub zoom: f64,
    pub speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cursor {
    Pointer,
    Default,
}

/// A map rendering engine.
///
/// Calls arrive on the thread that published the triggering bus event.
pub trait MapEngine: Send + Sync {
    fn fly_to(&self, camera: &CameraMove);

    /// Change zoom without moving the center.
    fn ease_to(&self, zoom: Option<f64>, speed: f64);

    /// Toggle the hover highlight of one feature.
    fn set_feature_state(&self, feature: &Feature, hovered: bool);

    fn set_cursor(&self, cursor: Cursor);

    /// Features of `layer` currently rendered in the viewport.
    fn query_rendered_features(&self, layer: &str) -> Vec<Feature>;

    /// Number of points under a cluster of `source`.
    fn cluster_leaf_count(&self, source: &str, cluster_id: i64) -> Result<usize, CoreError>;

    fn open_popup(&self, content: &PopupContent, at: LngLat, offset: u32) -> PopupId;

    fn remove_popup(&self, popup: PopupId);
}
