//! # Sparsetex Core
//!
//! Residency management for sparse virtual textures.
//!
//! A virtual texture addresses a huge mip-mapped page grid while only a
//! fixed number of physical tile slots exist. This crate decides which
//! virtual tiles occupy those slots:
//! - **Slot Allocator**: O(1) LRU ring over physical slot ids
//! - **Page Table**: per-mip grids mapping virtual cells to slots
//! - **Residency Set**: reverse slot -> tile mapping with change tracking
//! - **Paging Engine**: the activate / evict / snapshot protocol
//! - **Indirection Table**: CPU-side indirection texels built from snapshots
//! - **Driver & Queue**: per-frame request generation and batching
//!
//! The crate never touches pixels, files or GPU handles.

pub mod allocator;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod indirection;
pub mod page_table;
pub mod pyramid;
pub mod queue;
pub mod residency;

pub use allocator::SlotAllocator;
pub use config::{PagingConfig, TextureLayout, VirtualTextureConfig};
pub use driver::WorldPositionDriver;
pub use engine::{PagingEngine, PagingStats, TileRequest};
pub use error::{PagingError, PagingResult};
pub use indirection::IndirectionTable;
pub use page_table::{INVALID_SLOT, PageTable};
pub use queue::ActivationQueue;
pub use residency::{ActiveTile, ResidencySet, TileCoord};
