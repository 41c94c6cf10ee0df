// Copyright @yucwang 2026

use crate::core::vessel_tree::Sample;
use crate::volumes::VolumeFractionGrid;

pub trait Rasterizer {
    fn rasterize(&self, samples: &[Sample], extent: [usize; 3]) -> VolumeFractionGrid;
}
