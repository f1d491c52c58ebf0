//! Mip Pyramid
//!
//! Flat storage for a stack of 2-D grids, one per mip level, each half the
//! size of the one below. Levels are laid out back to back in a single buffer
//! and addressed through per-level offsets, so the whole pyramid is one
//! allocation made at construction.

use smallvec::SmallVec;

/// Placement of one level inside the flat buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MipLevel {
    /// Index of the level's first cell
    pub offset: usize,
    /// Cells along X
    pub width: u32,
    /// Cells along Y
    pub height: u32,
}

impl MipLevel {
    /// Number of cells in this level
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether the level has no cells
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Grid-per-mip storage keyed by `(mip, y, x)`
#[derive(Debug, Clone)]
pub struct MipPyramid<T> {
    cells: Vec<T>,
    levels: SmallVec<[MipLevel; 16]>,
}

impl<T: Copy> MipPyramid<T> {
    /// Create a pyramid whose level 0 is `width` x `height` cells.
    ///
    /// Level `m` is `(width >> m) x (height >> m)`, never smaller than 1x1.
    pub fn new(width: u32, height: u32, level_count: u32, fill: T) -> Self {
        let mut levels = SmallVec::new();
        let mut offset = 0;
        for mip in 0..level_count {
            let level = MipLevel {
                offset,
                width: (width >> mip).max(1),
                height: (height >> mip).max(1),
            };
            offset += level.len();
            levels.push(level);
        }

        Self {
            cells: vec![fill; offset],
            levels,
        }
    }

    /// Number of levels
    pub fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    /// Total number of cells across all levels
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Layout of a level, if present
    pub fn level(&self, mip: u32) -> Option<MipLevel> {
        self.levels.get(mip as usize).copied()
    }

    /// Whether `(x, y)` addresses a cell of level `mip`
    #[inline]
    pub fn contains(&self, x: u32, y: u32, mip: u32) -> bool {
        self.levels
            .get(mip as usize)
            .is_some_and(|level| x < level.width && y < level.height)
    }

    #[inline]
    fn index(&self, x: u32, y: u32, mip: u32) -> usize {
        let level = &self.levels[mip as usize];
        debug_assert!(
            x < level.width && y < level.height,
            "cell ({}, {}) outside mip {} ({}x{})",
            x,
            y,
            mip,
            level.width,
            level.height
        );
        level.offset + y as usize * level.width as usize + x as usize
    }

    /// Read one cell
    #[inline]
    pub fn get(&self, x: u32, y: u32, mip: u32) -> T {
        self.cells[self.index(x, y, mip)]
    }

    /// Overwrite one cell
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, mip: u32, value: T) {
        let index = self.index(x, y, mip);
        self.cells[index] = value;
    }

    /// Overwrite every cell of every level
    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }

    /// Row-major cells of one level
    pub fn level_cells(&self, mip: u32) -> &[T] {
        let level = self.levels[mip as usize];
        &self.cells[level.offset..level.offset + level.len()]
    }

    /// Mutable cells of level `mip` together with the cells of `mip + 1`.
    ///
    /// Panics if `mip + 1` is not a level of this pyramid.
    pub fn level_and_parent_mut(&mut self, mip: u32) -> (&mut [T], &[T]) {
        let level = self.levels[mip as usize];
        let parent = self.levels[mip as usize + 1];
        let (lower, upper) = self.cells.split_at_mut(parent.offset);
        (
            &mut lower[level.offset..level.offset + level.len()],
            &upper[..parent.len()],
        )
    }
}
