//! User-selectable heatmap filters.

use heatmap_core::DeviceFilter;
use serde::{Deserialize, Serialize};

/// Viewports narrower than this default to the mobile filter.
pub const MOBILE_BREAKPOINT_PX: u32 = 768;

/// Time window choices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayWindow {
    Week,
    #[default]
    Month,
}

impl DayWindow {
    pub fn days(&self) -> u32 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
        }
    }
}

/// Grid resolution choices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridChoice {
    #[default]
    Coarse,
    Medium,
    Fine,
}

impl GridChoice {
    pub fn size(&self) -> u32 {
        match self {
            Self::Coarse => 100,
            Self::Medium => 200,
            Self::Fine => 300,
        }
    }
}

/// The full filter selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Filters {
    pub days: DayWindow,
    pub device: DeviceFilter,
    pub grid: GridChoice,
}

impl Filters {
    /// Defaults with the device chosen from the viewport width.
    pub fn for_viewport(viewport_width: u32) -> Self {
        Self {
            device: default_device(viewport_width),
            ..Self::default()
        }
    }
}

/// Device filter implied by the viewport width.
pub fn default_device(viewport_width: u32) -> DeviceFilter {
    if viewport_width < MOBILE_BREAKPOINT_PX {
        DeviceFilter::Mobile
    } else {
        DeviceFilter::Desktop
    }
}
