//! World-position driver
//!
//! Per-frame request generator for a viewer moving over a textured plane.
//! The viewer's position is mapped into mip-0 page space and the four pages
//! around that point are requested at every mip level, so the neighbourhood
//! under the viewer is always resident at all detail levels.

use glam::{IVec2, Vec2};
use smallvec::SmallVec;

use crate::engine::{PagingEngine, TileRequest};

/// Maps world positions to tile requests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldPositionDriver {
    /// World position of the texture centre
    pub center: Vec2,
    /// World extent covered by the whole texture
    pub scale: Vec2,
    /// Pages per axis at mip 0
    pub page_size: u32,
    /// Mip levels to request, starting at 0
    pub mip_levels: u32,
}

impl Default for WorldPositionDriver {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            scale: Vec2::ONE,
            page_size: 256,
            mip_levels: 9,
        }
    }
}

impl WorldPositionDriver {
    /// Position in mip-0 page units, with the texture centre at `page_size / 2`
    pub fn page_position(&self, position: Vec2) -> Vec2 {
        let pages = self.page_size as f32;
        (position - self.center) / self.scale * pages + Vec2::splat(pages / 2.0)
    }

    /// The four pages around `position`, in the order
    /// `(+x +y), (-x -y), (-x +y), (+x -y)`.
    ///
    /// Halfway cases round to even.
    pub fn neighbourhood(&self, position: Vec2) -> [IVec2; 4] {
        let page = self.page_position(position);
        let high = round_ties_even(page + Vec2::splat(0.5));
        let low = round_ties_even(page - Vec2::splat(0.5));

        [
            high,
            low,
            IVec2::new(low.x, high.y),
            IVec2::new(high.x, low.y),
        ]
    }

    /// Every request for one frame, level by level
    pub fn requests(&self, position: Vec2) -> SmallVec<[TileRequest; 32]> {
        let corners = self.neighbourhood(position);
        (0..self.mip_levels as i32)
            .flat_map(|mip| corners.map(|page| TileRequest::new(page.x, page.y, mip)))
            .collect()
    }

    /// Issue this frame's requests against `engine`, returning how many were
    /// issued. Requests outside the engine's range are dropped by the engine.
    pub fn update(&self, position: Vec2, engine: &mut PagingEngine) -> usize {
        let corners = self.neighbourhood(position);
        for mip in 0..self.mip_levels as i32 {
            for page in corners {
                engine.activate(page.x, page.y, mip);
            }
        }
        corners.len() * self.mip_levels as usize
    }
}

fn round_ties_even(v: Vec2) -> IVec2 {
    IVec2::new(v.x.round_ties_even() as i32, v.y.round_ties_even() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PagingConfig;

    fn driver() -> WorldPositionDriver {
        WorldPositionDriver {
            center: Vec2::ZERO,
            scale: Vec2::splat(16.0),
            page_size: 16,
            mip_levels: 3,
        }
    }

    #[test]
    fn test_page_position() {
        let driver = driver();
        assert_eq!(driver.page_position(Vec2::ZERO), Vec2::splat(8.0));
        assert_eq!(driver.page_position(Vec2::new(-8.0, 4.0)), Vec2::new(0.0, 12.0));
    }

    #[test]
    fn test_neighbourhood_off_grid() {
        let driver = driver();
        let corners = driver.neighbourhood(Vec2::new(0.3, -0.3));
        // Page position (8.3, 7.7)
        assert_eq!(
            corners,
            [
                IVec2::new(9, 8),
                IVec2::new(8, 7),
                IVec2::new(8, 8),
                IVec2::new(9, 7),
            ]
        );
    }

    #[test]
    fn test_neighbourhood_rounds_ties_to_even() {
        let driver = driver();
        // Page position (8.0, 9.0): 8.5 -> 8, 7.5 -> 8, 9.5 -> 10, 8.5 -> 8
        let corners = driver.neighbourhood(Vec2::new(0.0, 1.0));
        assert_eq!(corners[0], IVec2::new(8, 10));
        assert_eq!(corners[1], IVec2::new(8, 8));
    }

    #[test]
    fn test_requests_cover_every_mip() {
        let driver = driver();
        let requests = driver.requests(Vec2::new(0.3, 0.3));
        assert_eq!(requests.len(), 12);
        assert!(requests[..4].iter().all(|request| request.mip == 0));
        assert!(requests[8..].iter().all(|request| request.mip == 2));
        assert_eq!(requests[4], TileRequest::new(9, 9, 1));
    }

    #[test]
    fn test_update_makes_neighbourhood_resident() {
        let config = PagingConfig {
            page_count_x: 16,
            page_count_y: 16,
            tile_capacity: 32,
            mip_count: 3,
            max_tile_capacity: 64,
        };
        let mut engine = PagingEngine::new(&config).unwrap();
        let driver = driver();

        let issued = driver.update(Vec2::new(0.3, -0.3), &mut engine);
        assert_eq!(issued, 12);

        // Mip 0: four distinct pages. Mip 1: (8..9, 7..8) -> cells (4, 3), (4, 4).
        // Mip 2: cells (2, 1), (2, 2).
        assert_eq!(engine.resident_count(), 8);
        assert!(engine.lookup(9, 8, 0).is_some());
        assert!(engine.lookup(8, 7, 0).is_some());
        assert!(engine.lookup(8, 8, 2).is_some());
        assert!(engine.verify_consistency());
    }

    #[test]
    fn test_update_near_edge_drops_out_of_range() {
        let config = PagingConfig {
            page_count_x: 16,
            page_count_y: 16,
            tile_capacity: 32,
            mip_count: 1,
            max_tile_capacity: 64,
        };
        let mut engine = PagingEngine::new(&config).unwrap();
        let driver = WorldPositionDriver { mip_levels: 1, ..driver() };

        // Page position (0.2, 0.2): low corner rounds to (0, 0), high to (1, 1)
        driver.update(Vec2::new(-7.8, -7.8), &mut engine);
        assert_eq!(engine.resident_count(), 4);

        // Page position (-1.2, -1.2): only negative pages
        driver.update(Vec2::new(-9.2, -9.2), &mut engine);
        assert_eq!(engine.stats().ignored, 4);
    }
}
