//! Spatial model - parcel grid addressed by (row, col)

use std::fmt;

use serde::{Deserialize, Serialize};

/// Parcel address on the map grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocationKey {
    pub row: u32,
    pub col: u32,
}

impl LocationKey {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Chebyshev distance: max(|drow|, |dcol|)
    pub fn chebyshev(self, other: LocationKey) -> u32 {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col))
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Bounds of the parcel grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParcelGrid {
    rows: u32,
    cols: u32,
}

impl ParcelGrid {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn parcel_count(&self) -> u64 {
        self.rows as u64 * self.cols as u64
    }

    pub fn contains(&self, key: LocationKey) -> bool {
        key.row < self.rows && key.col < self.cols
    }

    /// Inclusive `(row_lo, row_hi, col_lo, col_hi)` of the clipped ball, or
    /// `None` when `center` is off the grid.
    fn ball_bounds(&self, center: LocationKey, radius: u32) -> Option<(u32, u32, u32, u32)> {
        if !self.contains(center) {
            return None;
        }
        Some((
            center.row.saturating_sub(radius),
            center.row.saturating_add(radius).min(self.rows - 1),
            center.col.saturating_sub(radius),
            center.col.saturating_add(radius).min(self.cols - 1),
        ))
    }

    /// Number of parcels [`ParcelGrid::within`] returns.
    pub fn count_within(&self, center: LocationKey, radius: u32) -> usize {
        match self.ball_bounds(center, radius) {
            Some((row_lo, row_hi, col_lo, col_hi)) => {
                ((row_hi - row_lo) as usize + 1) * ((col_hi - col_lo) as usize + 1)
            }
            None => 0,
        }
    }

    /// Every parcel within `radius` (Chebyshev) of `center`, center included,
    /// clipped to the grid. Row-major order.
    pub fn within(&self, center: LocationKey, radius: u32) -> Vec<LocationKey> {
        let Some((row_lo, row_hi, col_lo, col_hi)) = self.ball_bounds(center, radius) else {
            return Vec::new();
        };
        let mut keys = Vec::with_capacity(self.count_within(center, radius));
        for row in row_lo..=row_hi {
            for col in col_lo..=col_hi {
                keys.push(LocationKey::new(row, col));
            }
        }
        keys
    }
}
