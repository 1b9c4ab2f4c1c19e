// ── Bus events ──
//
// One variant per topic. The topic is the variant's discriminant, so a
// publisher can never send a payload shape its subscribers do not expect.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use strum::{EnumDiscriminants, EnumIter};

use crate::model::{DetailRecord, EntityType, Feature, LngLat};
use crate::store::{Action, ApplicationState, SelectedEntity, Sidebar};

// ── Payloads ────────────────────────────────────────────────────────

/// Move the camera to a position.
#[derive(Debug, Clone, PartialEq)]
pub struct FlyToCommand {
    pub coordinates: LngLat,
    /// Falls back to the configured detail zoom.
    pub zoom: Option<f64>,
    /// Falls back to the configured fly speed.
    pub speed: Option<f64>,
}

/// Change zoom without moving the center.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomToCommand {
    pub zoom: Option<f64>,
    pub speed: Option<f64>,
}

/// Open a popup anchored on a feature.
#[derive(Debug, Clone)]
pub struct ShowPopupCommand {
    pub feature: Arc<Feature>,
    /// Cached detail record, when the entity has one.
    pub details: Option<Arc<DetailRecord>>,
    pub delay: Option<Duration>,
    pub entity_type: Option<EntityType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidebarRequest {
    pub sidebar: Sidebar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewChange {
    pub is_mobile: bool,
}

/// A dispatch that produced a new state value.
#[derive(Debug, Clone)]
pub struct StateChange {
    pub old: Arc<ApplicationState>,
    pub new: Arc<ApplicationState>,
    pub action: Arc<Action>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChange {
    pub selection: Option<SelectedEntity>,
}

// ── BusEvent ────────────────────────────────────────────────────────

/// Every message the bus carries.
#[derive(Debug, Clone, EnumDiscriminants)]
#[strum_discriminants(name(Topic), derive(Hash, EnumIter))]
pub enum BusEvent {
    MapFlyTo(FlyToCommand),
    MapZoomTo(ZoomToCommand),
    MapShowPopup(ShowPopupCommand),
    MapCloseAllPopups,
    UiSidebarRequested(SidebarRequest),
    UiFullscreenToggled,
    UiViewChanged(ViewChange),
    StateChanged(StateChange),
    StateSelectionChanged(SelectionChange),
}

impl BusEvent {
    pub fn topic(&self) -> Topic {
        Topic::from(self)
    }
}

impl Topic {
    /// Wire name of the topic, as integrators bind to it.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MapFlyTo => "map:flyTo",
            Self::MapZoomTo => "map:zoomTo",
            Self::MapShowPopup => "map:showPopup",
            Self::MapCloseAllPopups => "map:closeAllPopups",
            Self::UiSidebarRequested => "ui:sidebarRequested",
            Self::UiFullscreenToggled => "ui:fullscreenToggled",
            Self::UiViewChanged => "ui:viewChanged",
            Self::StateChanged => "state:changed",
            Self::StateSelectionChanged => "state:selectionChanged",
        }
    }

    /// Every topic, in declaration order.
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Compact one-line summaries, used by logs and the CLI event trace.
impl fmt::Display for BusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MapFlyTo(cmd) => {
                write!(f, "center={}", cmd.coordinates)?;
                if let Some(zoom) = cmd.zoom {
                    write!(f, " zoom={zoom}")?;
                }
                if let Some(speed) = cmd.speed {
                    write!(f, " speed={speed}")?;
                }
                Ok(())
            }
            Self::MapZoomTo(cmd) => {
                let zoom = cmd.zoom.map_or_else(|| "-".into(), |z| z.to_string());
                write!(f, "zoom={zoom}")?;
                if let Some(speed) = cmd.speed {
                    write!(f, " speed={speed}")?;
                }
                Ok(())
            }
            Self::MapShowPopup(cmd) => {
                let id = cmd
                    .feature
                    .entity_id()
                    .map_or_else(|| "?".into(), |id| id.to_string());
                write!(f, "feature={id}")?;
                if let Some(kind) = cmd.entity_type {
                    write!(f, " type={kind}")?;
                }
                write!(f, " details={}", cmd.details.is_some())?;
                if let Some(delay) = cmd.delay {
                    write!(f, " delay={}ms", delay.as_millis())?;
                }
                Ok(())
            }
            Self::MapCloseAllPopups | Self::UiFullscreenToggled => Ok(()),
            Self::UiSidebarRequested(req) => write!(f, "sidebar={}", req.sidebar),
            Self::UiViewChanged(view) => write!(f, "is_mobile={}", view.is_mobile),
            Self::StateChanged(change) => write!(f, "action={}", change.action.kind()),
            Self::StateSelectionChanged(change) => match &change.selection {
                Some(sel) => write!(f, "selection={}:{}", sel.entity_type, sel.id),
                None => f.write_str("selection=none"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_names_match_wire_contract() {
        let names: Vec<&str> = Topic::all().map(Topic::as_str).collect();
        assert_eq!(
            names,
            [
                "map:flyTo",
                "map:zoomTo",
                "map:showPopup",
                "map:closeAllPopups",
                "ui:sidebarRequested",
                "ui:fullscreenToggled",
                "ui:viewChanged",
                "state:changed",
                "state:selectionChanged",
            ]
        );
    }

    #[test]
    fn event_reports_its_topic() {
        let event = BusEvent::UiSidebarRequested(SidebarRequest {
            sidebar: Sidebar::Detail,
        });
        assert_eq!(event.topic(), Topic::UiSidebarRequested);
        assert_eq!(event.to_string(), "sidebar=detail");
    }

    #[test]
    fn fly_to_summary_lists_parameters() {
        let event = BusEvent::MapFlyTo(FlyToCommand {
            coordinates: LngLat::new(-118.0, 33.5),
            zoom: Some(14.5),
            speed: None,
        });
        assert_eq!(event.to_string(), "center=[-118, 33.5] zoom=14.5");
    }
}
