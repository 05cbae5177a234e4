//! Heatmap query parameters and their validation.

use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;
use std::str::FromStr;
use validator::Validate;

use crate::error::{Error, Result, ValidationErrorCode};
use crate::grid::GridSize;
use crate::limits::{DEFAULT_DAYS, DEFAULT_GRID_SIZE};

/// Device class filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceFilter {
    #[default]
    All,
    Mobile,
    Desktop,
}

impl DeviceFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
        }
    }

    /// Whether an event with the given device bucket passes this filter.
    ///
    /// Events without a bucket only pass `All`.
    pub fn matches(&self, device_bucket: Option<&str>) -> bool {
        match self {
            Self::All => true,
            _ => device_bucket == Some(self.as_str()),
        }
    }
}

impl FromStr for DeviceFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "mobile" => Ok(Self::Mobile),
            "desktop" => Ok(Self::Desktop),
            other => Err(Error::validation_code(
                ValidationErrorCode::InvalidParameter,
                format!("device must be one of all, mobile, desktop (got {:?})", other),
            )),
        }
    }
}

impl std::fmt::Display for DeviceFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw query string parameters as they arrive over HTTP.
///
/// Kept as strings so malformed values produce a coded validation error
/// instead of a framework rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeatmapParams {
    pub days: Option<String>,
    pub grid: Option<String>,
    pub device: Option<String>,
}

/// Fallbacks for parameters the caller omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDefaults {
    pub days: u32,
    pub grid: u32,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            days: DEFAULT_DAYS,
            grid: DEFAULT_GRID_SIZE,
        }
    }
}

/// A validated aggregation request.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct HeatmapRequest {
    #[validate(length(min = 1, max = 2048))]
    pub page_path: String,
    #[validate(range(min = 1))]
    pub days: u32,
    pub grid_size: GridSize,
    pub device: DeviceFilter,
}

impl HeatmapRequest {
    /// Build and validate a request from decoded path and raw params.
    ///
    /// `grid` is clamped into range rather than rejected; every other
    /// out-of-range or malformed value fails.
    pub fn from_params(page_path: impl Into<String>, params: &HeatmapParams) -> Result<Self> {
        Self::with_defaults(page_path, params, RequestDefaults::default())
    }

    /// Like [`HeatmapRequest::from_params`] with configured fallbacks for
    /// absent `days` and `grid`.
    pub fn with_defaults(
        page_path: impl Into<String>,
        params: &HeatmapParams,
        defaults: RequestDefaults,
    ) -> Result<Self> {
        let days = match params.days.as_deref() {
            Some(raw) => parse_days(raw)?,
            None => defaults.days,
        };
        let grid_size = match params.grid.as_deref() {
            Some(raw) => GridSize::clamped_signed(parse_grid(raw)?),
            None => GridSize::clamped(defaults.grid),
        };
        let device = match params.device.as_deref() {
            Some(raw) => raw.parse()?,
            None => DeviceFilter::All,
        };

        let request = Self {
            page_path: page_path.into(),
            days,
            grid_size,
            device,
        };

        request.validate().map_err(|e| {
            Error::validation_code(ValidationErrorCode::InvalidParameter, e.to_string())
        })?;

        Ok(request)
    }
}

fn parse_days(raw: &str) -> Result<u32> {
    raw.trim().parse::<u32>().map_err(|_| {
        Error::validation_code(
            ValidationErrorCode::InvalidParameter,
            format!("days must be a positive integer (got {:?})", raw),
        )
    })
}

/// Any integer is accepted; values past `i64` saturate by sign before
/// clamping.
fn parse_grid(raw: &str) -> Result<i64> {
    match raw.trim().parse::<i64>() {
        Ok(n) => Ok(n),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Ok(i64::MIN),
            _ => Err(Error::validation_code(
                ValidationErrorCode::InvalidParameter,
                format!("grid must be an integer (got {:?})", raw),
            )),
        },
    }
}
