//! Grid geometry and the sparse cell-count map.

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::limits::{MAX_GRID_SIZE, MIN_GRID_SIZE};

/// Effective grid resolution, always within `[MIN_GRID_SIZE, MAX_GRID_SIZE]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridSize(u32);

impl GridSize {
    /// Clamp a requested resolution into the supported range.
    pub fn clamped(requested: u32) -> Self {
        Self(requested.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE))
    }

    /// Clamp a signed request, so negative sizes land on the minimum.
    pub fn clamped_signed(requested: i64) -> Self {
        let bounded = requested.clamp(i64::from(MIN_GRID_SIZE), i64::from(MAX_GRID_SIZE));
        Self(bounded as u32)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Map a normalized coordinate to a cell index on one axis.
    ///
    /// Returns `None` for non-finite input or when the floored index falls
    /// outside `[0, size)`, which is what happens at exactly `1.0`.
    pub fn quantize(&self, v: f64) -> Option<u32> {
        if !v.is_finite() {
            return None;
        }
        let idx = (v * self.0 as f64).floor();
        if idx >= 0.0 && idx < self.0 as f64 {
            Some(idx as u32)
        } else {
            None
        }
    }

    /// Normalized center of a cell index on one axis.
    pub fn center(&self, idx: u32) -> f64 {
        (idx as f64 + 0.5) / self.0 as f64
    }

    /// Whether a cell lies inside this grid.
    pub fn contains(&self, cell: GridCell) -> bool {
        cell.grid_x < self.0 && cell.grid_y < self.0
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::clamped(crate::limits::DEFAULT_GRID_SIZE)
    }
}

/// One bin of the grid, keyed `"gx,gy"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    pub grid_x: u32,
    pub grid_y: u32,
}

impl GridCell {
    pub fn new(grid_x: u32, grid_y: u32) -> Self {
        Self { grid_x, grid_y }
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.grid_x, self.grid_y)
    }
}

/// Failure to parse a `"gx,gy"` cell key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid grid cell key: {0:?}")]
pub struct ParseCellError(pub String);

impl FromStr for GridCell {
    type Err = ParseCellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (gx, gy) = s.split_once(',').ok_or_else(|| ParseCellError(s.to_string()))?;
        let grid_x = gx.trim().parse().map_err(|_| ParseCellError(s.to_string()))?;
        let grid_y = gy.trim().parse().map_err(|_| ParseCellError(s.to_string()))?;
        Ok(Self { grid_x, grid_y })
    }
}

/// Sparse cell → click count map. Absent cells are zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeatmapGrid {
    cells: BTreeMap<GridCell, u64>,
}

impl HeatmapGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one click to a cell.
    pub fn increment(&mut self, cell: GridCell) {
        *self.cells.entry(cell).or_insert(0) += 1;
    }

    pub fn insert(&mut self, cell: GridCell, count: u64) {
        self.cells.insert(cell, count);
    }

    pub fn get(&self, cell: GridCell) -> u64 {
        self.cells.get(&cell).copied().unwrap_or(0)
    }

    /// Number of non-empty cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Sum of all cell counts.
    pub fn total(&self) -> u64 {
        self.cells.values().sum()
    }

    /// Largest single cell count, or 0 for an empty grid.
    pub fn max_count(&self) -> u64 {
        self.cells.values().copied().max().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridCell, u64)> + '_ {
        self.cells.iter().map(|(cell, count)| (*cell, *count))
    }
}

impl FromIterator<(GridCell, u64)> for HeatmapGrid {
    fn from_iter<I: IntoIterator<Item = (GridCell, u64)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

impl Serialize for HeatmapGrid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (cell, count) in &self.cells {
            map.serialize_entry(&cell.to_string(), count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for HeatmapGrid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GridVisitor;

        impl<'de> Visitor<'de> for GridVisitor {
            type Value = HeatmapGrid;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of \"gx,gy\" keys to click counts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut grid = HeatmapGrid::new();
                while let Some((key, count)) = access.next_entry::<String, u64>()? {
                    let cell = key.parse::<GridCell>().map_err(de::Error::custom)?;
                    grid.insert(cell, count);
                }
                Ok(grid)
            }
        }

        deserializer.deserialize_map(GridVisitor)
    }
}
