//! Page Table
//!
//! Maps per-level cell coordinates to the physical slot backing them. The
//! table holds no policy: it neither validates mappings against each other
//! nor tracks recency. Keeping at most one cell per slot is the job of
//! [`PagingEngine`](crate::engine::PagingEngine).

use crate::pyramid::MipPyramid;

/// Cell value meaning "no physical backing".
///
/// Lies outside every valid slot range so slot 0 stays a normal slot.
pub const INVALID_SLOT: u32 = u32::MAX;

/// Sparse page table over a mip pyramid
#[derive(Debug, Clone)]
pub struct PageTable {
    page_count_x: u32,
    page_count_y: u32,
    cells: MipPyramid<u32>,
}

impl PageTable {
    /// Create an empty table with `mipmap_count` levels
    pub fn new(page_count_x: u32, page_count_y: u32, mipmap_count: u32) -> Self {
        debug_assert!(page_count_x.is_power_of_two());
        debug_assert!(page_count_y.is_power_of_two());

        Self {
            page_count_x,
            page_count_y,
            cells: MipPyramid::new(page_count_x, page_count_y, mipmap_count, INVALID_SLOT),
        }
    }

    /// Pages along X at mip 0
    pub fn page_count_x(&self) -> u32 {
        self.page_count_x
    }

    /// Pages along Y at mip 0
    pub fn page_count_y(&self) -> u32 {
        self.page_count_y
    }

    /// Number of represented mip levels
    pub fn mipmap_count(&self) -> u32 {
        self.cells.level_count()
    }

    /// Whether `(x, y)` is a cell of level `mip`
    #[inline]
    pub fn contains(&self, x: u32, y: u32, mip: u32) -> bool {
        self.cells.contains(x, y, mip)
    }

    /// Slot mapped at a cell, or [`INVALID_SLOT`]
    #[inline]
    pub fn get(&self, x: u32, y: u32, mip: u32) -> u32 {
        self.cells.get(x, y, mip)
    }

    /// Map a cell to `slot`, replacing whatever was there
    #[inline]
    pub fn active(&mut self, x: u32, y: u32, mip: u32, slot: u32) {
        self.cells.set(x, y, mip, slot);
    }

    /// Unmap a cell
    #[inline]
    pub fn deactive(&mut self, x: u32, y: u32, mip: u32) {
        self.cells.set(x, y, mip, INVALID_SLOT);
    }

    /// Row-major cells of one level
    pub fn level_cells(&self, mip: u32) -> &[u32] {
        self.cells.level_cells(mip)
    }

    /// Number of mapped cells across all levels. O(cells).
    pub fn mapped_count(&self) -> usize {
        (0..self.mipmap_count())
            .map(|mip| {
                self.level_cells(mip)
                    .iter()
                    .filter(|&&slot| slot != INVALID_SLOT)
                    .count()
            })
            .sum()
    }

    /// Unmap every cell
    pub fn clear(&mut self) {
        self.cells.fill(INVALID_SLOT);
    }
}
