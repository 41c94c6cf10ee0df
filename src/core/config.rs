// Copyright @yucwang 2026

use std::fmt;

use crate::math::constants::{Float, Vector3f};

pub const DEFAULT_RADIUS_MM: Float = 2.0;
pub const DEFAULT_CURVATURE_FACTOR: Float = 0.05;
pub const DEFAULT_RADIUS_VARIATION_FACTOR: Float = 1.0;
pub const DEFAULT_BIFURCATION_LENGTH_MM: Float = 7.0;
pub const DEFAULT_MAX_GENERATIONS: u32 = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NonPositiveSpacing(Float),
    EmptyExtent([usize; 3]),
    ExtentTooLarge([usize; 3]),
    InvalidRadius(Float),
    NegativeFactor(&'static str, Float),
    DegenerateDirection(Vector3f),
    NonFiniteStart(Vector3f),
    NonFiniteBifurcationLength(Float),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NonPositiveSpacing(s) => write!(f, "voxel spacing must be positive, got {}", s),
            ConfigError::EmptyExtent(e) => write!(f, "volume extent must be positive on every axis, got {:?}", e),
            ConfigError::ExtentTooLarge(e) => write!(f, "volume extent {:?} is too large to allocate or export", e),
            ConfigError::InvalidRadius(r) => write!(f, "radius must be positive and finite, got {}", r),
            ConfigError::NegativeFactor(name, v) => write!(f, "{} must be non-negative and finite, got {}", name, v),
            ConfigError::DegenerateDirection(d) => write!(f, "direction ({}, {}, {}) cannot be normalized", d.x, d.y, d.z),
            ConfigError::NonFiniteStart(p) => write!(f, "start ({}, {}, {}) is not finite", p.x, p.y, p.z),
            ConfigError::NonFiniteBifurcationLength(l) => write!(f, "bifurcation length must be finite, got {}", l),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Simulation lattice the vessel lives in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeConfig {
    pub spacing_mm: Float,
    pub extent: [usize; 3],
}

impl VolumeConfig {
    pub fn new(spacing_mm: Float, extent: [usize; 3]) -> Self {
        Self { spacing_mm, extent }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.spacing_mm > 0.0) || !self.spacing_mm.is_finite() {
            return Err(ConfigError::NonPositiveSpacing(self.spacing_mm));
        }
        if self.extent.iter().any(|&n| n == 0) {
            return Err(ConfigError::EmptyExtent(self.extent));
        }
        // VOL headers store each axis as an i32.
        if self.extent.iter().any(|&n| n > i32::MAX as usize) || self.voxel_count().is_none() {
            return Err(ConfigError::ExtentTooLarge(self.extent));
        }
        Ok(())
    }

    /// Number of voxels, or `None` if the product overflows.
    pub fn voxel_count(&self) -> Option<usize> {
        self.extent[0]
            .checked_mul(self.extent[1])
            .and_then(|n| n.checked_mul(self.extent[2]))
    }

    /// Physical size of the volume in millimetres.
    pub fn size_mm(&self) -> Vector3f {
        Vector3f::new(
            self.extent[0] as Float * self.spacing_mm,
            self.extent[1] as Float * self.spacing_mm,
            self.extent[2] as Float * self.spacing_mm,
        )
    }
}

/// Vessel structure parameters, in physical units where noted.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthConfig {
    pub start_mm: Vector3f,
    pub direction: Vector3f,
    pub radius_mm: Float,
    pub curvature_factor: Float,
    /// Half-width of the per-sample radius jitter, in voxels.
    pub radius_variation_factor: Float,
    pub bifurcation_length_mm: Float,
    pub partial_volume: bool,
    pub volume: VolumeConfig,
    pub seed: u64,
    pub max_generations: u32,
}

impl GrowthConfig {
    pub fn new(start_mm: Vector3f, direction: Vector3f, volume: VolumeConfig) -> Self {
        Self {
            start_mm,
            direction,
            radius_mm: DEFAULT_RADIUS_MM,
            curvature_factor: DEFAULT_CURVATURE_FACTOR,
            radius_variation_factor: DEFAULT_RADIUS_VARIATION_FACTOR,
            bifurcation_length_mm: DEFAULT_BIFURCATION_LENGTH_MM,
            partial_volume: false,
            volume,
            seed: 0,
            max_generations: DEFAULT_MAX_GENERATIONS,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.volume.validate()?;
        if !self.start_mm.iter().all(|v| v.is_finite()) {
            return Err(ConfigError::NonFiniteStart(self.start_mm));
        }
        if !(self.radius_mm > 0.0) || !self.radius_mm.is_finite() {
            return Err(ConfigError::InvalidRadius(self.radius_mm));
        }
        check_factor("curvature factor", self.curvature_factor)?;
        check_factor("radius variation factor", self.radius_variation_factor)?;
        if !self.bifurcation_length_mm.is_finite() {
            return Err(ConfigError::NonFiniteBifurcationLength(self.bifurcation_length_mm));
        }
        let norm = self.direction.norm();
        if !(norm > 0.0) || !norm.is_finite() {
            return Err(ConfigError::DegenerateDirection(self.direction));
        }
        Ok(())
    }

    /// Convert the physical parameters into voxel-index space.
    pub fn to_voxel_space(&self) -> Result<VoxelGrowthParams, ConfigError> {
        self.validate()?;
        let spacing = self.volume.spacing_mm;
        let direction = self.direction / spacing;

        Ok(VoxelGrowthParams {
            start: self.start_mm / spacing,
            direction: direction.normalize(),
            radius: self.radius_mm / spacing,
            radius_variation: self.radius_variation_factor,
            bifurcation_length: self.bifurcation_length_mm / spacing,
            curvature_factor: self.curvature_factor,
            extent: self.volume.extent,
            max_generations: self.max_generations,
        })
    }
}

fn check_factor(name: &'static str, value: Float) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NegativeFactor(name, value))
    }
}

/// Root branch parameters expressed in voxel units.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrowthParams {
    pub start: Vector3f,
    pub direction: Vector3f,
    pub radius: Float,
    pub radius_variation: Float,
    /// Number of growth steps before a branch forks.
    pub bifurcation_length: Float,
    pub curvature_factor: Float,
    pub extent: [usize; 3],
    pub max_generations: u32,
}
