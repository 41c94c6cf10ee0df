// Copyright @yucwang 2026

use std::ops;

use crate::math::constants::Float;

/// Dense voxel grid of volume fractions in `[0, 1]`. x varies fastest, then y, then z.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeFractionGrid {
    data: Vec<Float>,
    xres: usize,
    yres: usize,
    zres: usize,
}

impl ops::Index<(usize, usize, usize)> for VolumeFractionGrid {
    type Output = Float;

    fn index(&self, index: (usize, usize, usize)) -> &Float {
        &self.data[self.linear_index(index.0, index.1, index.2)]
    }
}

impl ops::IndexMut<(usize, usize, usize)> for VolumeFractionGrid {
    fn index_mut(&mut self, index: (usize, usize, usize)) -> &mut Float {
        let idx = self.linear_index(index.0, index.1, index.2);
        &mut self.data[idx]
    }
}

impl VolumeFractionGrid {
    pub fn new(extent: [usize; 3]) -> Self {
        Self {
            data: vec![0.0; extent[0] * extent[1] * extent[2]],
            xres: extent[0],
            yres: extent[1],
            zres: extent[2],
        }
    }

    pub fn from_raw(extent: [usize; 3], data: Vec<Float>) -> Result<Self, String> {
        let expected = extent[0]
            .checked_mul(extent[1])
            .and_then(|v| v.checked_mul(extent[2]))
            .ok_or_else(|| "grid dimensions overflow".to_string())?;
        if data.len() != expected {
            return Err(format!("expected {} voxels, got {}", expected, data.len()));
        }
        Ok(Self { data, xres: extent[0], yres: extent[1], zres: extent[2] })
    }

    pub fn extent(&self) -> [usize; 3] {
        [self.xres, self.yres, self.zres]
    }

    pub fn data(&self) -> &[Float] {
        &self.data
    }

    #[inline]
    pub fn linear_index(&self, x: usize, y: usize, z: usize) -> usize {
        debug_assert!(x < self.xres && y < self.yres && z < self.zres);
        (z * self.yres + y) * self.xres + x
    }

    /// Raise a voxel to `value` if it is larger than the current entry.
    #[inline]
    pub fn raise(&mut self, x: usize, y: usize, z: usize, value: Float) {
        let idx = self.linear_index(x, y, z);
        if value > self.data[idx] {
            self.data[idx] = value;
        }
    }

    /// Element-wise maximum with a grid of the same extent.
    pub fn max_merge(&mut self, other: &VolumeFractionGrid) {
        assert_eq!(self.extent(), other.extent(), "cannot merge grids of different extent");
        for (dst, src) in self.data.iter_mut().zip(other.data.iter()) {
            if *src > *dst {
                *dst = *src;
            }
        }
    }

    /// Sum of all fractions, i.e. the filled volume in voxels.
    pub fn filled_volume(&self) -> f64 {
        self.data.iter().map(|&v| v as f64).sum()
    }

    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v > 0.0).count()
    }

    /// One z-plane as a row-major `xres * yres` slice.
    pub fn z_slice(&self, z: usize) -> &[Float] {
        let plane = self.xres * self.yres;
        &self.data[z * plane..(z + 1) * plane]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexing_is_x_fastest() {
        let mut grid = VolumeFractionGrid::new([3, 4, 5]);
        grid[(2, 1, 0)] = 0.25;
        grid[(0, 0, 1)] = 0.5;
        assert_eq!(grid.data()[2 + 3], 0.25);
        assert_eq!(grid.data()[12], 0.5);
        assert_eq!(grid.z_slice(1)[0], 0.5);
        assert_eq!(grid.count_nonzero(), 2);
        assert!((grid.filled_volume() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn raise_keeps_maximum() {
        let mut grid = VolumeFractionGrid::new([2, 2, 2]);
        grid.raise(1, 1, 1, 0.6);
        grid.raise(1, 1, 1, 0.3);
        assert_eq!(grid[(1, 1, 1)], 0.6);
        grid.raise(1, 1, 1, 1.0);
        assert_eq!(grid[(1, 1, 1)], 1.0);
        grid.raise(0, 0, 0, -0.5);
        assert_eq!(grid[(0, 0, 0)], 0.0);
    }

    #[test]
    fn max_merge_is_elementwise() {
        let mut a = VolumeFractionGrid::from_raw([2, 1, 1], vec![0.2, 0.9]).unwrap();
        let b = VolumeFractionGrid::from_raw([2, 1, 1], vec![0.7, 0.1]).unwrap();
        a.max_merge(&b);
        assert_eq!(a.data(), &[0.7, 0.9]);
    }

    #[test]
    fn from_raw_checks_length() {
        assert!(VolumeFractionGrid::from_raw([2, 2, 2], vec![0.0; 7]).is_err());
    }
}
