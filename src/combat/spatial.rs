//! Uniform Grid Spatial Index
//!
//! Broad-phase for targets and obstacles. Cells are keyed by
//! `(floor(x / cell_size), floor(z / cell_size))` on the ground plane.
//! An entry with an extent is stamped into every cell it overlaps; queries
//! return each entry at most once.

use std::collections::BTreeMap;

use crate::core::vec3::Vec3;

/// Default edge length of a grid cell (world units).
pub const DEFAULT_CELL_SIZE: f32 = 15.0;

/// Cell coordinate on the ground plane.
pub type Cell = (i32, i32);

/// Horizontal footprint of an indexed entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Footprint {
    /// Circle (or point when the radius is zero).
    Radius(f32),
    /// Axis-aligned box given by horizontal half-extents.
    Box {
        /// Half-extent along x
        half_x: f32,
        /// Half-extent along z
        half_z: f32,
    },
}

impl Footprint {
    /// Conservative horizontal extent. Boxes use their larger half-extent.
    #[inline]
    pub fn extent(self) -> f32 {
        let extent = match self {
            Footprint::Radius(r) => r,
            Footprint::Box { half_x, half_z } => half_x.max(half_z),
        };
        if extent.is_finite() {
            extent.max(0.0)
        } else {
            0.0
        }
    }
}

/// Anything that can be placed in a [`SpatialIndex`].
pub trait Spatial {
    /// World position of the entry.
    fn position(&self) -> Vec3;
    /// Horizontal footprint of the entry.
    fn footprint(&self) -> Footprint;
}

/// Inclusive rectangular range of cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CellRange {
    min: Cell,
    max: Cell,
}

/// A key stamped into a cell, remembering the first cell of its own range.
#[derive(Clone, Copy, Debug)]
struct Stamp<K> {
    key: K,
    min: Cell,
}

/// Uniform grid over the ground plane.
#[derive(Clone, Debug)]
pub struct SpatialIndex<K> {
    cell_size: f32,
    cells: BTreeMap<Cell, Vec<Stamp<K>>>,
    len: usize,
}

impl<K> Default for SpatialIndex<K> {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl<K> SpatialIndex<K> {
    /// Create an empty index.
    ///
    /// A non-positive or non-finite cell size falls back to
    /// [`DEFAULT_CELL_SIZE`].
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            DEFAULT_CELL_SIZE
        };
        Self {
            cell_size,
            cells: BTreeMap::new(),
            len: 0,
        }
    }

    /// Edge length of a cell.
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of inserted entries (not stamps).
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of cell buckets currently allocated.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Remove every entry.
    ///
    /// Buckets that held entries keep their allocations so a per-frame
    /// rebuild does not churn the heap. Buckets already empty since the
    /// previous clear are dropped, so the map follows roaming entries instead
    /// of growing with every cell they ever visited.
    pub fn clear(&mut self) {
        self.cells.retain(|_, bucket| {
            let used = !bucket.is_empty();
            bucket.clear();
            used
        });
        self.len = 0;
    }

    /// Cell containing a world position.
    #[inline]
    pub fn cell_of(&self, position: Vec3) -> Cell {
        (self.axis_cell(position.x), self.axis_cell(position.z))
    }

    #[inline]
    fn axis_cell(&self, coord: f32) -> i32 {
        // `as` saturates and maps NaN to 0.
        (coord / self.cell_size).floor() as i32
    }

    fn range(&self, center: Vec3, extent: f32) -> CellRange {
        CellRange {
            min: (
                self.axis_cell(center.x - extent),
                self.axis_cell(center.z - extent),
            ),
            max: (
                self.axis_cell(center.x + extent),
                self.axis_cell(center.z + extent),
            ),
        }
    }
}

impl<K: Copy + PartialEq> SpatialIndex<K> {
    /// Insert an entry implementing [`Spatial`].
    pub fn insert<S: Spatial>(&mut self, key: K, entry: &S) {
        self.insert_at(key, entry.position(), entry.footprint());
    }

    /// Insert a key with an explicit position and footprint.
    pub fn insert_at(&mut self, key: K, position: Vec3, footprint: Footprint) {
        let range = self.range(position, footprint.extent());
        for cx in range.min.0..=range.max.0 {
            for cz in range.min.1..=range.max.1 {
                self.cells
                    .entry((cx, cz))
                    .or_default()
                    .push(Stamp { key, min: range.min });
            }
        }
        self.len += 1;
    }

    /// Remove a key from every cell it was stamped into.
    ///
    /// `position` and `footprint` must match the values used at insertion.
    /// Returns false if the key was not found.
    pub fn remove_at(&mut self, key: K, position: Vec3, footprint: Footprint) -> bool {
        let range = self.range(position, footprint.extent());
        let mut found = false;
        for cx in range.min.0..=range.max.0 {
            for cz in range.min.1..=range.max.1 {
                if let Some(bucket) = self.cells.get_mut(&(cx, cz)) {
                    let before = bucket.len();
                    bucket.retain(|stamp| stamp.key != key);
                    found |= bucket.len() != before;
                    if bucket.is_empty() {
                        self.cells.remove(&(cx, cz));
                    }
                }
            }
        }
        if found {
            self.len = self.len.saturating_sub(1);
        }
        found
    }

    /// Remove an entry implementing [`Spatial`].
    pub fn remove<S: Spatial>(&mut self, key: K, entry: &S) -> bool {
        self.remove_at(key, entry.position(), entry.footprint())
    }

    /// Collect every key whose cells overlap the bounding box of the query
    /// circle. Each key appears once.
    pub fn query_radius(&self, center: Vec3, radius: f32) -> Vec<K> {
        let mut out = Vec::new();
        self.query_radius_into(center, radius, &mut out);
        out
    }

    /// Same as [`query_radius`](Self::query_radius) but reuses `out`.
    ///
    /// `out` is cleared first.
    pub fn query_radius_into(&self, center: Vec3, radius: f32, out: &mut Vec<K>) {
        out.clear();
        if self.len == 0 {
            return;
        }

        let radius = if radius.is_finite() { radius.max(0.0) } else { 0.0 };
        let query = self.range(center, radius);

        // Only columns that hold buckets are walked, and each column is a
        // single ordered range, so cost follows occupancy rather than area.
        let (Some((&(lo, _), _)), Some((&(hi, _), _))) =
            (self.cells.first_key_value(), self.cells.last_key_value())
        else {
            return;
        };
        let (min_x, max_x) = (query.min.0.max(lo), query.max.0.min(hi));
        if min_x > max_x {
            return;
        }

        for cx in min_x..=max_x {
            for (&cell, bucket) in self.cells.range((cx, query.min.1)..=(cx, query.max.1)) {
                for stamp in bucket {
                    // Emit only from the first cell shared by the entry's
                    // range and the query range.
                    let first = (stamp.min.0.max(query.min.0), stamp.min.1.max(query.min.1));
                    if first == cell {
                        out.push(stamp.key);
                    }
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
