// Copyright @yucwang 2026

use crate::core::rasterizer::Rasterizer;
use crate::core::vessel_tree::Sample;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::volumes::VolumeFractionGrid;

pub const PARTIAL_VOLUME_MARGIN: Float = 0.5;
pub const HARD_EDGE_MARGIN: Float = 0.7071;

/// Edge treatment of a rasterized vessel sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgePolicy {
    pub partial_volume: bool,
    pub margin: Float,
}

impl EdgePolicy {
    pub fn new(partial_volume: bool) -> Self {
        let margin = if partial_volume { PARTIAL_VOLUME_MARGIN } else { HARD_EDGE_MARGIN };
        Self { partial_volume, margin }
    }

    /// Coverage of a voxel at `distance` from a sample of radius `radius`,
    /// `None` when the voxel is left untouched.
    #[inline]
    pub fn coverage(&self, distance: Float, radius: Float) -> Option<Float> {
        let m = self.margin;
        if distance <= radius - 1.0 + m {
            Some(1.0)
        } else if self.partial_volume && distance < radius + 2.0 * m {
            Some(1.0 - (distance - (radius - m)))
        } else {
            None
        }
    }

    /// Half-width of the box outside of which a sample cannot touch a voxel.
    pub fn reach(&self, radius: Float) -> Float {
        radius + 2.0 * self.margin
    }
}

/// Raise every voxel the sample covers. Only the sample's bounding box is visited.
pub fn splat_sample(grid: &mut VolumeFractionGrid, sample: &Sample, policy: &EdgePolicy) {
    let bbox = AABB::around(sample.position, policy.reach(sample.radius));
    let range = match bbox.index_range(grid.extent()) {
        Some(range) => range,
        None => return,
    };

    for z in range[2].0..=range[2].1 {
        for y in range[1].0..=range[1].1 {
            for x in range[0].0..=range[0].1 {
                let voxel = Vector3f::new(x as Float, y as Float, z as Float);
                let distance = (voxel - sample.position).norm();
                if let Some(value) = policy.coverage(distance, sample.radius) {
                    grid.raise(x, y, z, value.min(1.0));
                }
            }
        }
    }
}

pub struct GridRasterizer {
    policy: EdgePolicy,
}

impl GridRasterizer {
    pub fn new(partial_volume: bool) -> Self {
        Self { policy: EdgePolicy::new(partial_volume) }
    }
}

impl Rasterizer for GridRasterizer {
    fn rasterize(&self, samples: &[Sample], extent: [usize; 3]) -> VolumeFractionGrid {
        let mut grid = VolumeFractionGrid::new(extent);
        for sample in samples {
            splat_sample(&mut grid, sample, &self.policy);
        }
        log::debug!("Rasterized {} samples into {:?} voxels.", samples.len(), extent);
        grid
    }
}
