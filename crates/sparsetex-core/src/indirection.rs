//! Indirection Table
//!
//! CPU-side builder for the page indirection texture a virtual texture
//! sampler reads. One RGBA8 texel per page cell and mip level:
//!
//! | channel | meaning                         |
//! |---------|---------------------------------|
//! | R       | physical slot, low byte         |
//! | G       | physical slot, high byte        |
//! | B       | mip level of the resident tile  |
//! | A       | 255 when mapped, 0 otherwise    |
//!
//! A cell whose own tile is not resident points at the nearest resident
//! ancestor, so sampling falls back to coarser detail instead of garbage.
//! The table is rebuilt from [`PagingEngine::snapshot_into`] only when the
//! engine reports a change.

use crate::engine::PagingEngine;
use crate::error::{PagingError, PagingResult};
use crate::pyramid::MipPyramid;
use crate::residency::ActiveTile;

/// Texel of a cell with no resident tile at or above it
pub const UNMAPPED_TEXEL: [u8; 4] = [0, 0, 0, 0];

/// Largest slot count the two slot channels can address
pub const MAX_INDIRECTION_SLOTS: u32 = 1 << 16;

/// Encode a resident tile
#[inline]
pub fn encode_texel(slot: u32, mip: u32) -> [u8; 4] {
    [slot as u8, (slot >> 8) as u8, mip as u8, 255]
}

/// Decode a texel into `(slot, mip)`, or `None` if unmapped
#[inline]
pub fn decode_texel(texel: [u8; 4]) -> Option<(u32, u32)> {
    if texel[3] == 0 {
        return None;
    }
    Some((texel[0] as u32 | (texel[1] as u32) << 8, texel[2] as u32))
}

/// Per-mip RGBA8 indirection data derived from an engine's resident set
#[derive(Debug, Clone)]
pub struct IndirectionTable {
    texels: MipPyramid<[u8; 4]>,
    tiles: Vec<ActiveTile>,
    needs_rebuild: bool,
    rebuilds: u64,
}

impl IndirectionTable {
    /// Size a table for `engine`. Storage is allocated once here.
    pub fn new(engine: &PagingEngine) -> PagingResult<Self> {
        let capacity = engine.tile_capacity();
        if capacity > MAX_INDIRECTION_SLOTS {
            return Err(PagingError::CapacityExceeded {
                capacity,
                max: MAX_INDIRECTION_SLOTS,
            });
        }

        let pages = engine.page_count();
        Ok(Self {
            texels: MipPyramid::new(pages.x, pages.y, engine.mipmap_count(), UNMAPPED_TEXEL),
            tiles: Vec::with_capacity(capacity as usize),
            needs_rebuild: true,
            rebuilds: 0,
        })
    }

    /// Rebuild from `engine` if anything changed since the last snapshot.
    ///
    /// Returns whether a rebuild happened.
    pub fn update(&mut self, engine: &mut PagingEngine) -> bool {
        if !self.needs_rebuild && !engine.is_dirty_since_last_snapshot() {
            return false;
        }

        engine.snapshot_into(&mut self.tiles);
        self.rebuild();
        true
    }

    /// Force the next [`update`](Self::update) to rebuild
    pub fn invalidate(&mut self) {
        self.needs_rebuild = true;
    }

    fn rebuild(&mut self) {
        self.texels.fill(UNMAPPED_TEXEL);
        for tile in &self.tiles {
            self.texels.set(tile.x, tile.y, tile.mip, encode_texel(tile.slot, tile.mip));
        }

        // Fill holes top-down from the parent level
        for mip in (0..self.texels.level_count().saturating_sub(1)).rev() {
            let Some(level) = self.texels.level(mip) else { continue };
            let parent_width = (level.width >> 1).max(1) as usize;
            let (cells, parent) = self.texels.level_and_parent_mut(mip);

            for (index, cell) in cells.iter_mut().enumerate() {
                if cell[3] != 0 {
                    continue;
                }
                let x = index % level.width as usize;
                let y = index / level.width as usize;
                *cell = parent[(y >> 1) * parent_width + (x >> 1)];
            }
        }

        self.needs_rebuild = false;
        self.rebuilds += 1;
        log::trace!("Rebuilt indirection table from {} resident tiles", self.tiles.len());
    }

    /// Texel of cell `(x, y)` at `mip`
    pub fn texel(&self, x: u32, y: u32, mip: u32) -> [u8; 4] {
        self.texels.get(x, y, mip)
    }

    /// Row-major texels of one level, ready for upload
    pub fn level(&self, mip: u32) -> &[[u8; 4]] {
        self.texels.level_cells(mip)
    }

    /// Level width and height in texels
    pub fn level_size(&self, mip: u32) -> Option<(u32, u32)> {
        self.texels.level(mip).map(|level| (level.width, level.height))
    }

    pub fn level_count(&self) -> u32 {
        self.texels.level_count()
    }

    /// Resident tiles the table was last built from
    pub fn tiles(&self) -> &[ActiveTile] {
        &self.tiles
    }

    /// Number of rebuilds performed
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }
}
