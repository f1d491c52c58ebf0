//! Paging Engine
//!
//! Ties the page table, slot allocator and residency set together into the
//! activation protocol driven once per frame:
//!
//! - [`PagingEngine::activate`] makes a virtual tile resident, evicting the
//!   tile held by the least recently used slot when it is not already mapped
//! - [`PagingEngine::deactivate`] and [`PagingEngine::deactivate_all`] drop
//!   residency
//! - [`PagingEngine::snapshot_into`] reports the resident set, grouped by
//!   mip, to whoever builds the indirection structure
//!
//! Requests use mip-0 page coordinates and are shifted down to the requested
//! level. Anything outside the page grid or the mip range is ignored.

use glam::UVec2;
use serde::{Deserialize, Serialize};

use crate::allocator::SlotAllocator;
use crate::config::{PagingConfig, VirtualTextureConfig};
use crate::error::PagingResult;
use crate::page_table::{INVALID_SLOT, PageTable};
use crate::residency::{ActiveTile, ResidencySet, TileCoord};

/// A residency request in mip-0 page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRequest {
    pub x: i32,
    pub y: i32,
    pub mip: i32,
}

impl TileRequest {
    pub fn new(x: i32, y: i32, mip: i32) -> Self {
        Self { x, y, mip }
    }
}

/// Counters accumulated since creation or the last [`PagingEngine::reset_stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PagingStats {
    /// In-range activation requests
    pub activations: u64,
    /// Activations that found the tile resident
    pub hits: u64,
    /// Activations that bound a slot
    pub misses: u64,
    /// Misses that displaced another resident tile
    pub evictions: u64,
    /// Deactivations that removed a mapping
    pub deactivations: u64,
    /// Requests dropped for being out of range
    pub ignored: u64,
}

impl PagingStats {
    /// Fraction of activations that were hits
    pub fn hit_rate(&self) -> f64 {
        if self.activations == 0 {
            0.0
        } else {
            self.hits as f64 / self.activations as f64
        }
    }
}

/// Residency manager for one virtual texture
#[derive(Debug, Clone)]
pub struct PagingEngine {
    page_table: PageTable,
    allocator: SlotAllocator,
    residency: ResidencySet,
    stats: PagingStats,
}

impl PagingEngine {
    /// Create an engine. All storage is allocated here and reused afterwards.
    pub fn new(config: &PagingConfig) -> PagingResult<Self> {
        config.validate()?;

        let mipmap_count = config.mipmap_count();
        if mipmap_count != config.mip_count {
            log::debug!(
                "Clamped mip count {} to {} for a {}x{} page grid",
                config.mip_count,
                mipmap_count,
                config.page_count_x,
                config.page_count_y
            );
        }

        log::info!(
            "Created paging engine: {}x{} pages, {} mips, {} slots",
            config.page_count_x,
            config.page_count_y,
            mipmap_count,
            config.tile_capacity
        );

        Ok(Self {
            page_table: PageTable::new(config.page_count_x, config.page_count_y, mipmap_count),
            allocator: SlotAllocator::new(config.tile_capacity),
            residency: ResidencySet::new(config.tile_capacity),
            stats: PagingStats::default(),
        })
    }

    /// Create an engine from a full texture description
    pub fn from_texture_config(config: &VirtualTextureConfig) -> PagingResult<Self> {
        config.validate()?;
        Self::new(&config.paging_config())
    }

    /// Map a mip-0 request onto a cell of its level
    #[inline]
    fn resolve(&self, x: i32, y: i32, mip: i32) -> Option<TileCoord> {
        if x < 0 || y < 0 || mip < 0 {
            return None;
        }
        let (x, y, mip) = (x as u32, y as u32, mip as u32);
        if x >= self.page_table.page_count_x()
            || y >= self.page_table.page_count_y()
            || mip >= self.page_table.mipmap_count()
        {
            return None;
        }
        Some(TileCoord::new(x >> mip, y >> mip, mip))
    }

    /// Make the tile covering mip-0 page `(x, y)` at `mip` resident.
    ///
    /// A resident tile only has its slot refreshed. Otherwise the least
    /// recently used slot is taken over, unmapping whatever it held.
    pub fn activate(&mut self, x: i32, y: i32, mip: i32) {
        let Some(coord) = self.resolve(x, y, mip) else {
            self.stats.ignored += 1;
            return;
        };
        self.stats.activations += 1;

        let slot = self.page_table.get(coord.x, coord.y, coord.mip);
        if slot != INVALID_SLOT {
            debug_assert_eq!(self.residency.get(slot), Some(coord));
            self.stats.hits += 1;
            self.allocator.touch(slot);
            return;
        }

        self.stats.misses += 1;
        let victim = self.allocator.require();
        if let Some(previous) = self.residency.insert(victim, coord) {
            debug_assert_eq!(
                self.page_table.get(previous.x, previous.y, previous.mip),
                victim,
                "slot {} was not mapped by its recorded tile",
                victim
            );
            self.page_table.deactive(previous.x, previous.y, previous.mip);
            self.stats.evictions += 1;
            log::trace!(
                "Evicted tile ({}, {}, mip {}) from slot {} for ({}, {}, mip {})",
                previous.x,
                previous.y,
                previous.mip,
                victim,
                coord.x,
                coord.y,
                coord.mip
            );
        }
        self.page_table.active(coord.x, coord.y, coord.mip, victim);
    }

    /// Apply a request
    #[inline]
    pub fn activate_request(&mut self, request: TileRequest) {
        self.activate(request.x, request.y, request.mip);
    }

    /// Drop residency of the tile covering mip-0 page `(x, y)` at `mip`.
    ///
    /// The freed slot keeps its place in the recency order.
    pub fn deactivate(&mut self, x: i32, y: i32, mip: i32) {
        let Some(coord) = self.resolve(x, y, mip) else {
            self.stats.ignored += 1;
            return;
        };

        let slot = self.page_table.get(coord.x, coord.y, coord.mip);
        if slot != INVALID_SLOT {
            self.page_table.deactive(coord.x, coord.y, coord.mip);
            let removed = self.residency.remove(slot);
            debug_assert_eq!(removed, Some(coord));
            self.stats.deactivations += 1;
        }
    }

    /// Drop every resident tile and restore the initial slot order
    pub fn deactivate_all(&mut self) {
        let resident = self.residency.len();
        let page_table = &mut self.page_table;
        self.residency.clear_with(|_, coord| page_table.deactive(coord.x, coord.y, coord.mip));
        self.allocator.reset();
        self.stats.deactivations += resident as u64;

        log::debug!("Deactivated all {} resident tiles", resident);
    }

    /// Write the resident set into `out`, ordered by ascending mip and then
    /// slot, and clear the dirty flag. `out` keeps its allocation.
    pub fn snapshot_into(&mut self, out: &mut Vec<ActiveTile>) {
        self.residency.emit_sorted(out);
    }

    /// Allocating form of [`snapshot_into`](Self::snapshot_into)
    pub fn snapshot_active_tiles(&mut self) -> Vec<ActiveTile> {
        let mut tiles = Vec::with_capacity(self.residency.len());
        self.snapshot_into(&mut tiles);
        tiles
    }

    /// Whether any mapping changed since the last snapshot
    pub fn is_dirty_since_last_snapshot(&self) -> bool {
        self.residency.is_dirty()
    }

    /// Slot backing mip-0 page `(x, y)` at `mip`, without touching recency
    pub fn lookup(&self, x: i32, y: i32, mip: i32) -> Option<u32> {
        let coord = self.resolve(x, y, mip)?;
        match self.page_table.get(coord.x, coord.y, coord.mip) {
            INVALID_SLOT => None,
            slot => Some(slot),
        }
    }

    /// Tile currently held by `slot`
    pub fn slot_occupant(&self, slot: u32) -> Option<TileCoord> {
        self.residency.get(slot)
    }

    /// Pages per axis at `mip`; levels past the last one report 1x1
    pub fn page_count_at_mip(&self, mip: u32) -> UVec2 {
        if mip >= self.mipmap_count() {
            return UVec2::ONE;
        }
        UVec2::new(
            self.page_table.page_count_x() >> mip,
            self.page_table.page_count_y() >> mip,
        )
        .max(UVec2::ONE)
    }

    /// Pages per axis at mip 0
    pub fn page_count(&self) -> UVec2 {
        UVec2::new(self.page_table.page_count_x(), self.page_table.page_count_y())
    }

    /// Number of addressable mip levels
    pub fn mipmap_count(&self) -> u32 {
        self.page_table.mipmap_count()
    }

    /// Number of physical slots
    pub fn tile_capacity(&self) -> u32 {
        self.allocator.capacity()
    }

    /// Number of resident tiles
    pub fn resident_count(&self) -> usize {
        self.residency.len()
    }

    pub fn stats(&self) -> &PagingStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = PagingStats::default();
    }

    /// Full audit of the page table against the residency records. O(cells).
    ///
    /// Holds when every record is mapped by its cell and no other cell maps
    /// any slot.
    pub fn verify_consistency(&self) -> bool {
        let records_mapped = self
            .residency
            .iter()
            .all(|(slot, coord)| self.page_table.get(coord.x, coord.y, coord.mip) == slot);

        records_mapped
            && self.page_table.mapped_count() == self.residency.len()
            && self.residency.len() <= self.tile_capacity() as usize
    }
}
