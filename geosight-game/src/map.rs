//! Plain-data directives for the host map collaborator.
//!
//! The engine never talks to a map SDK. It emits `MapDirective` values and
//! a platform adapter replays them against the real renderer, reporting
//! nothing back except load completion (which the adapter folds into the
//! timer clock it drives).
use serde::{Deserialize, Serialize};

use crate::catalog::GeoPoint;
use crate::settings::MapStyle;

/// Zoom used when the round map first appears, before the animated zoom-in.
pub const INITIAL_ZOOM: u8 = 11;
/// Zoom reached by the delayed zoom-in animation.
pub const TARGET_ZOOM: u8 = 15;
/// Zoom of the reveal mini-map.
pub const MINI_MAP_ZOOM: u8 = 5;
/// Duration of the zoom-in animation.
pub const ZOOM_ANIMATION_MS: u32 = 2_000;
/// Delay between map init and the start of the zoom-in animation.
pub const ZOOM_START_DELAY_MS: u64 = 500;

/// Camera position requested from the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapCamera {
    pub center: GeoPoint,
    pub zoom: u8,
}

/// Marker glyph classes understood by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerIcon {
    Target,
    Hint,
    Reveal,
}

/// A labeled point placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub point: GeoPoint,
    pub label: String,
    pub detail: String,
    pub icon: MarkerIcon,
}

/// Which pan/zoom gestures stay enabled on the round map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapBehaviors {
    pub scroll_zoom: bool,
    pub dbl_click_zoom: bool,
    pub multi_touch: bool,
    pub drag: bool,
}

impl MapBehaviors {
    /// Round map: panning allowed, zooming locked so the player cannot
    /// zoom out to read labels.
    #[must_use]
    pub const fn locked() -> Self {
        Self {
            scroll_zoom: false,
            dbl_click_zoom: false,
            multi_touch: false,
            drag: true,
        }
    }

    /// Reveal mini-map: fully static.
    #[must_use]
    pub const fn frozen() -> Self {
        Self {
            scroll_zoom: false,
            dbl_click_zoom: false,
            multi_touch: false,
            drag: false,
        }
    }
}

impl Default for MapBehaviors {
    fn default() -> Self {
        Self::locked()
    }
}

/// One instruction for the map adapter. Emitted in order; replay is
/// expected to be cheap and non-blocking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MapDirective {
    /// Tear down the previous map and present a fresh one.
    InitCamera {
        camera: MapCamera,
        style: MapStyle,
        behaviors: MapBehaviors,
    },
    /// Smoothly change zoom while keeping the center.
    AnimateZoom { zoom: u8, duration_ms: u32 },
    /// Re-center without changing the zoom step behavior.
    PanTo { camera: MapCamera },
    /// Add a marker to the round map.
    PlaceMarker { marker: Marker },
    /// Remove all round-scoped markers.
    ClearMarkers,
    /// Present the answer mini-map with its marker.
    ShowMiniMap { camera: MapCamera, marker: Marker },
    /// Remove the answer mini-map.
    HideMiniMap,
}
