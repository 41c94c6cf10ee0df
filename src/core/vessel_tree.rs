// Copyright @yucwang 2026

use std::ops::Range;

use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};

/// One point of a vessel centerline, in voxel-index space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub position: Vector3f,
    pub radius: Float,
}

impl Sample {
    pub fn new(position: Vector3f, radius: Float) -> Self {
        Self { position, radius }
    }

    pub fn is_inside(&self, extent: [usize; 3]) -> bool {
        inside_extent(&self.position, extent)
    }
}

pub fn inside_extent(p: &Vector3f, extent: [usize; 3]) -> bool {
    (0..3).all(|idx| p[idx] >= 0.0 && p[idx] < extent[idx] as Float)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchRecord {
    pub generation: u32,
    pub parent: Option<usize>,
    /// Nominal radius the branch was grown with, before per-sample jitter.
    pub radius: Float,
    pub samples: Range<usize>,
}

/// All samples of one root vessel and its descendants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VesselTree {
    samples: Vec<Sample>,
    branches: Vec<BranchRecord>,
}

impl VesselTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_samples(samples: Vec<Sample>) -> Self {
        Self { samples, branches: Vec::new() }
    }

    /// Append the samples of a branch and return its index.
    pub fn push_branch(&mut self, generation: u32, parent: Option<usize>, radius: Float, samples: Vec<Sample>) -> usize {
        let begin = self.samples.len();
        self.samples.extend(samples);
        self.branches.push(BranchRecord {
            generation,
            parent,
            radius,
            samples: begin..self.samples.len(),
        });
        self.branches.len() - 1
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn branches(&self) -> &[BranchRecord] {
        &self.branches
    }

    pub fn branch_samples(&self, branch: usize) -> &[Sample] {
        &self.samples[self.branches[branch].samples.clone()]
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn max_generation(&self) -> u32 {
        self.branches.iter().map(|b| b.generation).max().unwrap_or(0)
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }

    /// Bounding box of the sample centers, `None` for an empty tree.
    pub fn bounds(&self) -> Option<AABB> {
        if self.samples.is_empty() {
            return None;
        }
        let mut bbox = AABB::default();
        for s in &self.samples {
            bbox.expand_by_point(&s.position);
        }
        Some(bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branches_track_their_sample_ranges() {
        let mut tree = VesselTree::new();
        let root = tree.push_branch(0, None, 4.0, vec![
            Sample::new(Vector3f::new(0.0, 0.0, 0.0), 4.0),
            Sample::new(Vector3f::new(0.0, 1.0, 0.0), 4.0),
        ]);
        let child = tree.push_branch(1, Some(root), 2.0, vec![
            Sample::new(Vector3f::new(0.0, 1.0, 0.0), 2.0),
        ]);

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.branch_samples(root).len(), 2);
        assert_eq!(tree.branch_samples(child)[0].radius, 2.0);
        assert_eq!(tree.branches()[child].parent, Some(root));
        assert_eq!(tree.max_generation(), 1);
    }

    #[test]
    fn bounds_cover_all_samples() {
        assert!(VesselTree::new().bounds().is_none());
        let tree = VesselTree::from_samples(vec![
            Sample::new(Vector3f::new(1.0, 5.0, 2.0), 1.0),
            Sample::new(Vector3f::new(3.0, -1.0, 2.5), 1.0),
        ]);
        let bbox = tree.bounds().unwrap();
        assert_eq!(bbox.p_min, Vector3f::new(1.0, -1.0, 2.0));
        assert_eq!(bbox.p_max, Vector3f::new(3.0, 5.0, 2.5));
    }

    #[test]
    fn inside_extent_is_half_open() {
        assert!(inside_extent(&Vector3f::new(0.0, 0.0, 0.0), [4, 4, 4]));
        assert!(inside_extent(&Vector3f::new(3.9, 0.0, 3.99), [4, 4, 4]));
        assert!(!inside_extent(&Vector3f::new(4.0, 0.0, 0.0), [4, 4, 4]));
        assert!(!inside_extent(&Vector3f::new(1.0, -0.01, 0.0), [4, 4, 4]));
    }
}
