//! Grid cell addressing.

use radius_world::Rect;

/// Integer coordinates of a grid cell on the XZ plane.
///
/// The grid is unbounded; negative coordinates are valid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub x: i32,
    pub z: i32,
}

impl CellCoord {
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Cell containing the world-space point `(x, z)`.
    #[must_use]
    pub fn containing(x: f32, z: f32, cell_size: f32) -> Self {
        Self {
            x: (x / cell_size).floor() as i32,
            z: (z / cell_size).floor() as i32,
        }
    }
}

/// Inclusive rectangle of cells covering a world-space [`Rect`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRange {
    pub min: CellCoord,
    pub max: CellCoord,
}

impl CellRange {
    #[must_use]
    pub fn covering(rect: &Rect, cell_size: f32) -> Self {
        Self {
            min: CellCoord::containing(rect.min_x, rect.min_z, cell_size),
            max: CellCoord::containing(rect.max_x, rect.max_z, cell_size),
        }
    }

    /// Number of cells in the range.
    #[must_use]
    pub fn len(&self) -> usize {
        let w = i64::from(self.max.x) - i64::from(self.min.x) + 1;
        let h = i64::from(self.max.z) - i64::from(self.min.z) + 1;
        (w.max(0) * h.max(0)) as usize
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major iteration over the covered cells.
    pub fn iter(&self) -> impl Iterator<Item = CellCoord> + '_ {
        (self.min.z..=self.max.z)
            .flat_map(move |z| (self.min.x..=self.max.x).map(move |x| CellCoord::new(x, z)))
    }
}
