// Built-in recipe table. Names are the stable keys UI triggers bind to.

use std::time::Duration;

use super::{Recipe, RecipeTable, Step, StepSpec, ViewCondition};
use crate::store::Sidebar;

const POPUP_DELAY: Duration = Duration::from_millis(100);

pub(super) fn table() -> RecipeTable {
    [
        (
            "selectState",
            Recipe::new(
                "Action when a state is clicked on the map or in the list.",
                vec![fly_to(5.0, 2.0), update(), sidebar(Sidebar::List)],
            ),
        ),
        (
            "selectRegion",
            Recipe::new(
                "Action when a region/city cluster is clicked.",
                vec![fly_to(9.0, 2.0), update(), sidebar(Sidebar::List)],
            ),
        ),
        (
            "selectBeachFromMap",
            from_map("Action when a beach is selected directly from the map.", 14.5),
        ),
        (
            "selectBeachFromList",
            from_list("Action when a beach is selected from a sidebar list.", 14.5),
        ),
        (
            "selectBeachFromPopup",
            from_popup("Action when a beach popup is clicked.", 14.0),
        ),
        (
            "selectPOIFromMap",
            from_map("Action when a POI marker is clicked directly from the map.", 16.0),
        ),
        (
            "selectPOIFromList",
            from_list("Action when a POI is selected from a sidebar list.", 16.0),
        ),
        (
            "selectPOIFromPopup",
            from_popup("Action when a POI popup is clicked.", 16.0),
        ),
        (
            "navigateHome",
            Recipe::new(
                "Action for buttons navigating to the home screen.",
                vec![sidebar(Sidebar::Home)],
            ),
        ),
        (
            "navigateToList",
            Recipe::new(
                "Action for buttons that should open the list view.",
                vec![sidebar(Sidebar::List)],
            ),
        ),
        (
            "closeDetailAndReset",
            Recipe::new(
                "Close the detail view and fly back to the start position.",
                vec![sidebar(Sidebar::List), StepSpec::always(Step::FlyToDefault)],
            ),
        ),
        (
            "backToList",
            Recipe::new(
                "Return from the detail view to the list and close popups.",
                vec![sidebar(Sidebar::List), StepSpec::always(Step::CloseAllPopups)],
            ),
        ),
        (
            "toggleFullscreen",
            Recipe::new(
                "Action for the fullscreen toggle button.",
                vec![StepSpec::always(Step::ToggleFullscreen)],
            ),
        ),
    ]
    .into_iter()
    .map(|(name, recipe)| (name.to_owned(), recipe))
    .collect()
}

// Map click: select, fly in on mobile only, popup, detail panel on mobile.
fn from_map(description: &str, zoom: f64) -> Recipe {
    Recipe::new(
        description,
        vec![
            update(),
            mobile(fly_to(zoom, 2.0)),
            popup(),
            mobile(sidebar(Sidebar::Detail)),
        ],
    )
}

// List click: select, detail panel, fly in, popup on desktop only.
fn from_list(description: &str, zoom: f64) -> Recipe {
    Recipe::new(
        description,
        vec![
            update(),
            sidebar(Sidebar::Detail),
            fly_to(zoom, 2.0),
            StepSpec::when(popup().step, ViewCondition::IsDesktop),
        ],
    )
}

fn from_popup(description: &str, zoom: f64) -> Recipe {
    Recipe::new(
        description,
        vec![update(), sidebar(Sidebar::Detail), mobile(fly_to(zoom, 1.2))],
    )
}

fn fly_to(zoom: f64, speed: f64) -> StepSpec {
    StepSpec::always(Step::FlyTo {
        zoom: Some(zoom),
        speed: Some(speed),
    })
}

fn update() -> StepSpec {
    StepSpec::always(Step::UpdateSelection)
}

fn sidebar(sidebar: Sidebar) -> StepSpec {
    StepSpec::always(Step::ShowSidebar { sidebar })
}

fn popup() -> StepSpec {
    StepSpec::always(Step::ShowPopup {
        delay: Some(POPUP_DELAY),
    })
}

fn mobile(spec: StepSpec) -> StepSpec {
    StepSpec::when(spec.step, ViewCondition::IsMobile)
}
