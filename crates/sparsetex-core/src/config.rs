//! Virtual texture configuration
//!
//! [`PagingConfig`] carries the parameters the paging engine is built from.
//! [`VirtualTextureConfig`] is the full, file-backed description of a virtual
//! texture (tile size, name, platform limits) from which both the paging
//! parameters and the derived [`TextureLayout`] are produced.

use std::path::Path;

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::error::{PagingError, PagingResult};

/// Typical texture array slice limit, used when the caller supplies none
pub const DEFAULT_MAX_TILE_CAPACITY: u32 = 2048;

/// Number of mip levels for which the shorter axis still has at least one page.
///
/// Both counts must be powers of two.
pub fn max_mipmap_count(page_count_x: u32, page_count_y: u32) -> u32 {
    page_count_x.min(page_count_y).max(1).ilog2() + 1
}

/// Paging engine construction parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingConfig {
    /// Pages along X at mip 0 (power of two)
    pub page_count_x: u32,
    /// Pages along Y at mip 0 (power of two)
    pub page_count_y: u32,
    /// Number of physical tile slots
    pub tile_capacity: u32,
    /// Requested mip count, clamped to `[1, max_mipmap_count]`
    pub mip_count: u32,
    /// Largest capacity the platform can back
    pub max_tile_capacity: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_count_x: 256,
            page_count_y: 256,
            tile_capacity: 256,
            mip_count: 5,
            max_tile_capacity: DEFAULT_MAX_TILE_CAPACITY,
        }
    }
}

impl PagingConfig {
    /// Check the hard constraints. The mip count is never rejected.
    pub fn validate(&self) -> PagingResult<()> {
        check_power_of_two("page_count_x", self.page_count_x)?;
        check_power_of_two("page_count_y", self.page_count_y)?;

        if self.tile_capacity == 0 {
            return Err(PagingError::ZeroCapacity);
        }
        if self.tile_capacity > self.max_tile_capacity {
            return Err(PagingError::CapacityExceeded {
                capacity: self.tile_capacity,
                max: self.max_tile_capacity,
            });
        }
        Ok(())
    }

    /// Mip count after clamping to what the page grid supports
    pub fn mipmap_count(&self) -> u32 {
        let max = max_mipmap_count(self.page_count_x, self.page_count_y);
        self.mip_count.clamp(1, max)
    }
}

fn check_power_of_two(axis: &'static str, value: u32) -> PagingResult<()> {
    if value.is_power_of_two() {
        Ok(())
    } else {
        Err(PagingError::NotPowerOfTwo { axis, value })
    }
}

/// Full virtual texture description, loadable from JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualTextureConfig {
    /// Letters-only name used in logs
    pub name: String,
    /// Tile width in pixels (power of two)
    pub tile_width: u32,
    /// Tile height in pixels (power of two)
    pub tile_height: u32,
    /// Pages along X at mip 0
    pub page_count_x: u32,
    /// Pages along Y at mip 0
    pub page_count_y: u32,
    /// Number of physical tile slots
    pub tile_capacity: u32,
    /// Requested mip count
    pub mip_count: u32,
    /// Largest capacity the platform can back
    pub max_tile_capacity: u32,
}

impl Default for VirtualTextureConfig {
    fn default() -> Self {
        let paging = PagingConfig::default();
        Self {
            name: "VirtualTexture".to_string(),
            tile_width: 256,
            tile_height: 256,
            page_count_x: paging.page_count_x,
            page_count_y: paging.page_count_y,
            tile_capacity: paging.tile_capacity,
            mip_count: paging.mip_count,
            max_tile_capacity: paging.max_tile_capacity,
        }
    }
}

impl VirtualTextureConfig {
    /// Square tiles over a square page grid
    pub fn square(tile_size: u32, page_count: u32, tile_capacity: u32, mip_count: u32) -> Self {
        Self {
            tile_width: tile_size,
            tile_height: tile_size,
            page_count_x: page_count,
            page_count_y: page_count,
            tile_capacity,
            mip_count,
            ..Self::default()
        }
    }

    /// Parse from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> PagingResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> PagingResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&contents)?;
        config.validate()?;
        log::debug!("Loaded virtual texture config '{}' from {}", config.name, path.as_ref().display());
        Ok(config)
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json_pretty(&self) -> PagingResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every constraint, including the paging ones
    pub fn validate(&self) -> PagingResult<()> {
        if self.name.is_empty() || !self.name.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PagingError::InvalidName(self.name.clone()));
        }
        if !self.tile_width.is_power_of_two() || !self.tile_height.is_power_of_two() {
            return Err(PagingError::InvalidTileSize {
                width: self.tile_width,
                height: self.tile_height,
            });
        }
        self.paging_config().validate()
    }

    /// Parameters for [`PagingEngine::new`](crate::engine::PagingEngine::new)
    pub fn paging_config(&self) -> PagingConfig {
        PagingConfig {
            page_count_x: self.page_count_x,
            page_count_y: self.page_count_y,
            tile_capacity: self.tile_capacity,
            mip_count: self.mip_count,
            max_tile_capacity: self.max_tile_capacity,
        }
    }

    /// Derived sizes for a consumer allocating indirection and physical storage
    pub fn layout(&self) -> PagingResult<TextureLayout> {
        self.validate()?;

        let mipmap_count = self.paging_config().mipmap_count();
        let use_mip_map = mipmap_count > 1;

        Ok(TextureLayout {
            virtual_width: self.tile_width as u64 * self.page_count_x as u64,
            virtual_height: self.tile_height as u64 * self.page_count_y as u64,
            tile_width: self.tile_width,
            tile_height: self.tile_height,
            mipmap_count,
            use_mip_map,
            physical_mip_count: if use_mip_map { 2 } else { 1 },
            page_info: Vec4::new(
                self.page_count_x as f32,
                self.page_count_y as f32,
                mipmap_count as f32,
                0.0,
            ),
            physical_info: Vec4::new(
                self.tile_width as f32,
                self.tile_height as f32,
                self.tile_capacity as f32,
                0.0,
            ),
        })
    }
}

/// Sizes derived from a validated [`VirtualTextureConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextureLayout {
    /// Width of the whole virtual texture in pixels
    pub virtual_width: u64,
    /// Height of the whole virtual texture in pixels
    pub virtual_height: u64,
    pub tile_width: u32,
    pub tile_height: u32,
    /// Mip levels after clamping
    pub mipmap_count: u32,
    /// Whether more than one mip level is addressable
    pub use_mip_map: bool,
    /// Mip levels of each physical tile (a second level is kept for filtering)
    pub physical_mip_count: u32,
    /// `(page_count_x, page_count_y, mipmap_count, 0)`
    pub page_info: Vec4,
    /// `(tile_width, tile_height, tile_capacity, 0)`
    pub physical_info: Vec4,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_mipmap_count() {
        assert_eq!(max_mipmap_count(1, 1), 1);
        assert_eq!(max_mipmap_count(4, 4), 3);
        assert_eq!(max_mipmap_count(256, 64), 7);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = VirtualTextureConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.paging_config().mipmap_count(), 5);
    }

    #[test]
    fn test_mip_count_is_clamped() {
        let mut config = PagingConfig { page_count_x: 4, page_count_y: 4, mip_count: 12, ..Default::default() };
        assert_eq!(config.mipmap_count(), 3);

        config.mip_count = 0;
        assert_eq!(config.mipmap_count(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        let config = PagingConfig { page_count_x: 6, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(PagingError::NotPowerOfTwo { axis: "page_count_x", value: 6 })
        ));

        let config = PagingConfig { page_count_y: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(PagingError::NotPowerOfTwo { .. })));
    }

    #[test]
    fn test_rejects_bad_capacity() {
        let config = PagingConfig { tile_capacity: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(PagingError::ZeroCapacity)));

        let config = PagingConfig { tile_capacity: 4096, max_tile_capacity: 2048, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(PagingError::CapacityExceeded { capacity: 4096, max: 2048 })
        ));

        let config = PagingConfig { tile_capacity: 2048, max_tile_capacity: 2048, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_name_and_tile_size() {
        let config = VirtualTextureConfig { name: "Terrain01".to_string(), ..Default::default() };
        assert!(matches!(config.validate(), Err(PagingError::InvalidName(_))));

        let config = VirtualTextureConfig { tile_width: 100, ..Default::default() };
        assert!(matches!(config.validate(), Err(PagingError::InvalidTileSize { .. })));
    }

    #[test]
    fn test_json_defaults_and_round_trip() {
        let config = VirtualTextureConfig::from_json(r#"{ "name": "Terrain", "tile_capacity": 64 }"#).unwrap();
        assert_eq!(config.name, "Terrain");
        assert_eq!(config.tile_capacity, 64);
        assert_eq!(config.page_count_x, 256);

        let json = config.to_json_pretty().unwrap();
        assert_eq!(VirtualTextureConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            VirtualTextureConfig::from_json("{ tile_capacity: }"),
            Err(PagingError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = VirtualTextureConfig::load("/nonexistent/sparsetex.json");
        assert!(matches!(result, Err(PagingError::Io(_))));
    }

    #[test]
    fn test_layout() {
        let config = VirtualTextureConfig::square(128, 64, 32, 4);
        let layout = config.layout().unwrap();

        assert_eq!(layout.virtual_width, 128 * 64);
        assert_eq!(layout.virtual_height, 128 * 64);
        assert_eq!(layout.mipmap_count, 4);
        assert!(layout.use_mip_map);
        assert_eq!(layout.physical_mip_count, 2);
        assert_eq!(layout.page_info, Vec4::new(64.0, 64.0, 4.0, 0.0));
        assert_eq!(layout.physical_info, Vec4::new(128.0, 128.0, 32.0, 0.0));

        let single = VirtualTextureConfig::square(128, 64, 32, 1).layout().unwrap();
        assert!(!single.use_mip_map);
        assert_eq!(single.physical_mip_count, 1);
    }
}
