//! Slot Allocator
//!
//! Fixed-capacity LRU ring over physical slot ids.
//!
//! Every slot is always part of the recency order; there is no notion of a
//! "free" slot, only of the least recently touched one. The order is an
//! intrusive doubly linked list stored in a flat array of `{prev, next}`
//! index pairs, with one extra sentinel node closing the ring:
//!
//! ```text
//! sentinel -> least recent -> ... -> most recent -> sentinel
//! ```
//!
//! Both [`SlotAllocator::require`] and [`SlotAllocator::touch`] are O(1) and
//! never allocate.

/// Links of one node in the recency ring
#[derive(Debug, Clone, Copy, Default)]
struct Link {
    prev: u32,
    next: u32,
}

/// LRU allocator over `capacity` physical slot ids
#[derive(Debug, Clone)]
pub struct SlotAllocator {
    /// `capacity` slot nodes followed by the sentinel node
    links: Vec<Link>,
    capacity: u32,
}

impl SlotAllocator {
    /// Create an allocator over slots `0..capacity`.
    ///
    /// The initial order is ascending: slot 0 is the least recently used.
    pub fn new(capacity: u32) -> Self {
        debug_assert!(capacity >= 1, "slot allocator needs at least one slot");

        let mut allocator = Self {
            links: vec![Link::default(); capacity as usize + 1],
            capacity,
        };
        allocator.reset();
        allocator
    }

    /// Number of slots managed
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    #[inline]
    fn sentinel(&self) -> u32 {
        self.capacity
    }

    /// Restore the initial ascending recency order
    pub fn reset(&mut self) {
        let nodes = self.capacity + 1;
        for (index, link) in self.links.iter_mut().enumerate() {
            let index = index as u32;
            link.next = (index + 1) % nodes;
            link.prev = (index + nodes - 1) % nodes;
        }
    }

    /// Take the least recently used slot and make it the most recently used.
    ///
    /// The caller is expected to rebind the returned slot immediately.
    #[inline]
    pub fn require(&mut self) -> u32 {
        let slot = self.least_recent();
        self.touch(slot);
        slot
    }

    /// Mark `slot` as the most recently used
    #[inline]
    pub fn touch(&mut self, slot: u32) {
        debug_assert!(slot < self.capacity, "slot {} out of range", slot);

        let sentinel = self.sentinel();
        let tail = self.links[sentinel as usize].prev;
        if tail == slot {
            return;
        }

        // Unlink
        let Link { prev, next } = self.links[slot as usize];
        self.links[prev as usize].next = next;
        self.links[next as usize].prev = prev;

        // Relink between the current tail and the sentinel
        self.links[slot as usize] = Link { prev: tail, next: sentinel };
        self.links[tail as usize].next = slot;
        self.links[sentinel as usize].prev = slot;
    }

    /// Slot that the next [`require`](Self::require) will return
    #[inline]
    pub fn least_recent(&self) -> u32 {
        self.links[self.sentinel() as usize].next
    }

    /// Most recently used slot
    #[inline]
    pub fn most_recent(&self) -> u32 {
        self.links[self.sentinel() as usize].prev
    }

    /// Iterate slots from least to most recently used
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        let sentinel = self.sentinel();
        std::iter::successors(Some(self.least_recent()), move |&slot| {
            Some(self.links[slot as usize].next)
        })
        .take_while(move |&slot| slot != sentinel)
    }
}
