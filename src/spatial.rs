//! Spatial indexing for fast position-to-polygon lookups
//!
//! This module is only available with the `spatial-index` feature.

#[cfg(feature = "spatial-index")]
use glam::DVec2;
#[cfg(feature = "spatial-index")]
use kiddo::immutable::float::kdtree::ImmutableKdTree;
#[cfg(feature = "spatial-index")]
use kiddo::SquaredEuclidean;

/// Wrapper around a KD-tree for spatial queries
///
/// Provides O(log n) nearest-neighbor lookups to convert 2D positions into
/// polygon indices: the polygon containing a point is the one whose site is
/// nearest to it, by the defining property of a Voronoi tessellation.
#[cfg(feature = "spatial-index")]
#[derive(Clone)]
pub struct SpatialIndex {
    tree: ImmutableKdTree<f64, usize, 2, 32>,
}

#[cfg(feature = "spatial-index")]
impl SpatialIndex {
    /// Build the index from polygon center positions
    ///
    /// Called once at the end of map generation.
    pub fn new(centers: &[DVec2]) -> Self {
        let points: Vec<[f64; 2]> = centers.iter().map(|c| [c.x, c.y]).collect();
        Self {
            tree: ImmutableKdTree::new_from_slice(&points),
        }
    }

    /// Find the polygon nearest to a position
    ///
    /// # Arguments
    ///
    /// * `position` - 2D position to query
    ///
    /// # Returns
    ///
    /// Index of the polygon whose site is nearest
    pub fn find_nearest(&self, position: DVec2) -> usize {
        let query = [position.x, position.y];
        let result = self.tree.nearest_one::<SquaredEuclidean>(&query);
        result.item as usize
    }
}

#[cfg(test)]
#[cfg(feature = "spatial-index")]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_index_basic() {
        let centers = vec![
            DVec2::new(-0.5, -0.5),
            DVec2::new(0.5, -0.5),
            DVec2::new(-0.5, 0.5),
            DVec2::new(0.5, 0.5),
        ];

        let index = SpatialIndex::new(&centers);

        assert_eq!(index.find_nearest(DVec2::new(-0.6, -0.4)), 0);
        assert_eq!(index.find_nearest(DVec2::new(0.9, -0.9)), 1);
        assert_eq!(index.find_nearest(DVec2::new(-0.4, 0.6)), 2);
        assert_eq!(index.find_nearest(DVec2::new(0.5, 0.5)), 3);
    }

    #[test]
    fn test_spatial_index_exact_match() {
        let centers = vec![DVec2::new(0.0, 0.9), DVec2::new(0.1, -0.8)];
        let index = SpatialIndex::new(&centers);

        assert_eq!(index.find_nearest(centers[0]), 0);
        assert_eq!(index.find_nearest(centers[1]), 1);
    }
}
