//! Residency Set
//!
//! Reverse mapping from physical slot to the virtual tile it currently
//! backs, plus the dirty flag the downstream indirection builder uses to
//! decide whether it has to rebuild.

use serde::{Deserialize, Serialize};

/// Per-level tile coordinate: `(x, y)` is a cell of mip level `mip`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub mip: u32,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, mip: u32) -> Self {
        Self { x, y, mip }
    }
}

/// A resident tile as reported to consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActiveTile {
    /// Cell X at `mip`
    pub x: u32,
    /// Cell Y at `mip`
    pub y: u32,
    /// Mip level
    pub mip: u32,
    /// Physical slot holding the tile
    pub slot: u32,
}

impl ActiveTile {
    /// Coordinate part of the record
    pub fn coord(&self) -> TileCoord {
        TileCoord::new(self.x, self.y, self.mip)
    }
}

/// Slot id -> virtual coordinate records
#[derive(Debug, Clone)]
pub struct ResidencySet {
    records: Vec<Option<TileCoord>>,
    count: usize,
    dirty: bool,
}

impl ResidencySet {
    /// Create an empty set for slots `0..capacity`
    pub fn new(capacity: u32) -> Self {
        Self {
            records: vec![None; capacity as usize],
            count: 0,
            dirty: false,
        }
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether no slot is occupied
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Coordinate currently backed by `slot`
    #[inline]
    pub fn get(&self, slot: u32) -> Option<TileCoord> {
        self.records.get(slot as usize).copied().flatten()
    }

    /// Record that `slot` now backs `coord`, returning the previous occupant
    pub fn insert(&mut self, slot: u32, coord: TileCoord) -> Option<TileCoord> {
        let previous = self.records[slot as usize].replace(coord);
        if previous.is_none() {
            self.count += 1;
        }
        self.dirty = true;
        previous
    }

    /// Clear the record of `slot`, returning what it backed
    pub fn remove(&mut self, slot: u32) -> Option<TileCoord> {
        let previous = self.records.get_mut(slot as usize)?.take();
        if previous.is_some() {
            self.count -= 1;
            self.dirty = true;
        }
        previous
    }

    /// Occupied slots in ascending slot order
    pub fn iter(&self) -> impl Iterator<Item = (u32, TileCoord)> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(slot, record)| record.map(|coord| (slot as u32, coord)))
    }

    /// Empty every record, handing each removed one to `evict`.
    ///
    /// Marks the set dirty if anything was removed.
    pub fn clear_with(&mut self, mut evict: impl FnMut(u32, TileCoord)) {
        for (slot, record) in self.records.iter_mut().enumerate() {
            if let Some(coord) = record.take() {
                evict(slot as u32, coord);
            }
        }
        if self.count > 0 {
            self.dirty = true;
        }
        self.count = 0;
    }

    /// Whether any record changed since the last [`emit_sorted`](Self::emit_sorted)
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write every occupied record into `out`, ordered by ascending mip and
    /// then ascending slot, and clear the dirty flag.
    ///
    /// `out` is cleared first; its allocation is reused.
    pub fn emit_sorted(&mut self, out: &mut Vec<ActiveTile>) {
        out.clear();
        out.extend(self.iter().map(|(slot, coord)| ActiveTile {
            x: coord.x,
            y: coord.y,
            mip: coord.mip,
            slot,
        }));
        out.sort_unstable_by_key(|tile| (tile.mip, tile.slot));
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_remove() {
        let mut set = ResidencySet::new(4);
        assert!(set.is_empty());
        assert!(!set.is_dirty());

        assert_eq!(set.insert(2, TileCoord::new(1, 1, 0)), None);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(2), Some(TileCoord::new(1, 1, 0)));
        assert!(set.is_dirty());

        assert_eq!(set.remove(2), Some(TileCoord::new(1, 1, 0)));
        assert!(set.is_empty());
        assert_eq!(set.get(2), None);
    }

    #[test]
    fn test_insert_replaces_occupant() {
        let mut set = ResidencySet::new(2);
        set.insert(0, TileCoord::new(0, 0, 0));
        let previous = set.insert(0, TileCoord::new(1, 0, 0));

        assert_eq!(previous, Some(TileCoord::new(0, 0, 0)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_remove_unoccupied_keeps_clean() {
        let mut set = ResidencySet::new(2);
        let mut out = Vec::new();
        set.emit_sorted(&mut out);

        assert_eq!(set.remove(1), None);
        assert_eq!(set.remove(7), None);
        assert!(!set.is_dirty());
    }

    #[test]
    fn test_emit_sorted_orders_by_mip_then_slot() {
        let mut set = ResidencySet::new(4);
        set.insert(0, TileCoord::new(0, 0, 2));
        set.insert(1, TileCoord::new(3, 1, 0));
        set.insert(2, TileCoord::new(1, 0, 1));
        set.insert(3, TileCoord::new(0, 2, 0));

        let mut out = Vec::new();
        set.emit_sorted(&mut out);

        let order: Vec<_> = out.iter().map(|tile| (tile.mip, tile.slot)).collect();
        assert_eq!(order, vec![(0, 1), (0, 3), (1, 2), (2, 0)]);
        assert!(!set.is_dirty());
    }

    #[test]
    fn test_clear_with_reports_records() {
        let mut set = ResidencySet::new(3);
        set.insert(0, TileCoord::new(0, 0, 0));
        set.insert(2, TileCoord::new(1, 1, 1));
        let mut out = Vec::new();
        set.emit_sorted(&mut out);

        let mut evicted = Vec::new();
        set.clear_with(|slot, coord| evicted.push((slot, coord)));

        assert_eq!(
            evicted,
            vec![(0, TileCoord::new(0, 0, 0)), (2, TileCoord::new(1, 1, 1))]
        );
        assert!(set.is_empty());
        assert!(set.is_dirty());
    }
}
