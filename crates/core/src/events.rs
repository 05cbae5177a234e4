//! Stored click events and coordinate resolution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Which space a coordinate pair is normalized against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordMode {
    /// Relative to the full scrollable document.
    Page,
    /// Relative to the visible viewport at click time.
    Viewport,
}

impl CoordMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Viewport => "viewport",
        }
    }
}

impl std::fmt::Display for CoordMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional-field property bag recorded with each click.
///
/// Coordinates are normalized to `[0, 1]` in their own space. Fields that
/// hold something other than a number deserialize to `None` rather than
/// failing the whole event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClickProps {
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub page_x: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub page_y: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub device_bucket: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
}

/// A coordinate pair picked out of a [`ClickProps`] bag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPoint {
    pub x: f64,
    pub y: f64,
    pub mode: CoordMode,
}

impl ResolvedPoint {
    /// Whether both coordinates are finite and inside `[0, 1]`.
    pub fn is_normalized(&self) -> bool {
        in_unit_range(self.x) && in_unit_range(self.y)
    }
}

fn in_unit_range(v: f64) -> bool {
    v.is_finite() && (0.0..=1.0).contains(&v)
}

impl ClickProps {
    /// Viewport-relative click props.
    pub fn viewport(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Document-relative click props.
    pub fn page(page_x: f64, page_y: f64) -> Self {
        Self {
            page_x: Some(page_x),
            page_y: Some(page_y),
            ..Self::default()
        }
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device_bucket = Some(device.into());
        self
    }

    pub fn with_element(mut self, element_id: impl Into<String>) -> Self {
        self.element_id = Some(element_id.into());
        self
    }

    /// Pick the coordinate pair to bin.
    ///
    /// The document-relative pair wins when both of its fields are present;
    /// otherwise the viewport pair is used. A half-present pair is treated
    /// as absent. The returned point is not range-checked.
    pub fn resolve(&self) -> Option<ResolvedPoint> {
        if let (Some(x), Some(y)) = (self.page_x, self.page_y) {
            return Some(ResolvedPoint {
                x,
                y,
                mode: CoordMode::Page,
            });
        }

        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(ResolvedPoint {
                x,
                y,
                mode: CoordMode::Viewport,
            }),
            _ => None,
        }
    }
}

/// A click as read back from the event store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub event_id: String,
    pub page_path: String,
    pub created_at: DateTime<Utc>,
    pub props: ClickProps,
}

impl ClickEvent {
    pub fn new(
        event_id: impl Into<String>,
        page_path: impl Into<String>,
        created_at: DateTime<Utc>,
        props: ClickProps,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            page_path: page_path.into(),
            created_at,
            props,
        }
    }

    /// Device class recorded with the click, if any.
    pub fn device_bucket(&self) -> Option<&str> {
        self.props.device_bucket.as_deref()
    }

    /// Element identifier recorded with the click, if any.
    pub fn element_id(&self) -> Option<&str> {
        self.props.element_id.as_deref()
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
