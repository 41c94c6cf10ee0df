// Copyright 2020 @TwoCookingMice

use super::constants::{ Float, Vector3f, FLOAT_MIN, FLOAT_MAX };

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AABB {
    pub p_min: Vector3f,
    pub p_max: Vector3f
}

impl Default for AABB {
    fn default() -> Self {
        Self { p_min: Vector3f::new(FLOAT_MAX, FLOAT_MAX, FLOAT_MAX),
               p_max: Vector3f::new(FLOAT_MIN, FLOAT_MIN, FLOAT_MIN) }
    }
}

impl AABB {
    pub fn new(p_min: Vector3f, p_max: Vector3f) -> Self {
        let mut min = Vector3f::new(0.0, 0.0, 0.0);
        let mut max = Vector3f::new(0.0, 0.0, 0.0);
        for idx in 0..3 {
            min[idx] = p_min[idx].min(p_max[idx]);
            max[idx] = p_max[idx].max(p_min[idx]);
        }
        Self { p_min: min, p_max: max }
    }

    /// Cube of half-width `half_extent` centered at `center`.
    pub fn around(center: Vector3f, half_extent: Float) -> Self {
        let h = Vector3f::new(half_extent, half_extent, half_extent);
        Self::new(center - h, center + h)
    }

    pub fn expand_by_point(&mut self, p: &Vector3f) {
        for idx in 0..3 {
            self.p_min[idx] = self.p_min[idx].min(p[idx]);
            self.p_max[idx] = self.p_max[idx].max(p[idx]);
        }
    }

    pub fn is_valid(&self) -> bool {
        let mut result = true;
        for idx in 0..3 {
            if self.p_min[idx] > self.p_max[idx] {
                result = false;
                break;
            }
        }

        result
    }

    /// Inclusive index ranges of the lattice points `0..dims` that fall inside the box.
    /// Returns `None` when the box misses the lattice entirely.
    pub fn index_range(&self, dims: [usize; 3]) -> Option<[(usize, usize); 3]> {
        if !self.is_valid() {
            return None;
        }

        let mut out = [(0usize, 0usize); 3];
        for idx in 0..3 {
            if dims[idx] == 0 {
                return None;
            }
            let lo = self.p_min[idx].ceil().max(0.0);
            let hi = self.p_max[idx].floor().min((dims[idx] - 1) as Float);
            if !lo.is_finite() || !hi.is_finite() || lo > hi {
                return None;
            }
            out[idx] = (lo as usize, hi as usize);
        }

        Some(out)
    }
}

/* Test for AABB */
#[cfg(test)]
mod tests {
    use super::AABB;
    use super::Vector3f;

    #[test]
    fn test_aabb_geometry() {
        let min = Vector3f::new(1.0, 7.0, 3.0);
        let max = Vector3f::new(4.0, 4.0, 4.0);
        let mut bbox: AABB = AABB::new(min, max);

        assert_eq!(bbox.p_min, Vector3f::new(1.0, 4.0, 3.0));
        assert_eq!(bbox.p_max, Vector3f::new(4.0, 7.0, 4.0));

        bbox.expand_by_point(&Vector3f::new(-1.0, 5.0, 6.0));
        assert_eq!(bbox.p_min[0], -1.0);
        assert_eq!(bbox.p_max[2], 6.0);
        assert_eq!(bbox.p_max - bbox.p_min, Vector3f::new(5.0, 3.0, 3.0));

        let mut empty = AABB::default();
        assert!(!empty.is_valid());
        empty.expand_by_point(&Vector3f::new(1.0, 2.0, 3.0));
        assert!(empty.is_valid());
    }

    #[test]
    fn test_index_range_clips_to_lattice() {
        let bbox = AABB::around(Vector3f::new(0.0, 5.2, 9.5), 2.0);
        let range = bbox.index_range([10, 10, 10]).unwrap();
        assert_eq!(range[0], (0, 2));
        assert_eq!(range[1], (4, 7));
        assert_eq!(range[2], (8, 9));
    }

    #[test]
    fn test_index_range_outside_lattice() {
        let bbox = AABB::around(Vector3f::new(-5.0, 1.0, 1.0), 1.0);
        assert!(bbox.index_range([4, 4, 4]).is_none());

        let between = AABB::around(Vector3f::new(1.5, 1.5, 1.5), 0.2);
        assert!(between.index_range([4, 4, 4]).is_none());
    }
}
