// Copyright @yucwang 2026

use std::fmt;

use crate::core::config::{ConfigError, GrowthConfig};
use crate::core::rasterizer::Rasterizer;
use crate::core::rng::VesselRng;
use crate::core::vessel_tree::VesselTree;
use crate::generators::path::{GrowthError, PathGenerator};
use crate::math::aabb::AABB;
use crate::math::constants::Vector3f;
use crate::rasterizers::grid::GridRasterizer;
use crate::rasterizers::parallel::ParallelGridRasterizer;
use crate::volumes::VolumeFractionGrid;

#[derive(Debug, Clone, PartialEq)]
pub enum VesselError {
    Config(ConfigError),
    Growth(GrowthError),
}

impl From<ConfigError> for VesselError {
    fn from(err: ConfigError) -> Self {
        VesselError::Config(err)
    }
}

impl From<GrowthError> for VesselError {
    fn from(err: GrowthError) -> Self {
        VesselError::Growth(err)
    }
}

impl fmt::Display for VesselError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VesselError::Config(e) => write!(f, "invalid vessel configuration: {}", e),
            VesselError::Growth(e) => write!(f, "vessel growth failed: {}", e),
        }
    }
}

impl std::error::Error for VesselError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VesselError::Config(e) => Some(e),
            VesselError::Growth(e) => Some(e),
        }
    }
}

/// Result of one structure: the grown tree and its rasterized fractions.
pub struct VesselVolume {
    pub tree: VesselTree,
    pub grid: VolumeFractionGrid,
    /// Physical extent of the grid in millimetres.
    pub bounds_mm: AABB,
}

pub struct VesselPipeline {
    thread_count: usize,
    show_progress: bool,
}

impl Default for VesselPipeline {
    fn default() -> Self {
        Self { thread_count: 1, show_progress: false }
    }
}

impl VesselPipeline {
    pub fn new(thread_count: usize) -> Self {
        Self { thread_count: thread_count.max(1), show_progress: false }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Validate, grow with the configured seed, and rasterize.
    pub fn run(&self, config: &GrowthConfig) -> Result<VesselVolume, VesselError> {
        let mut rng = VesselRng::new(config.seed);
        self.run_with_rng(config, &mut rng)
    }

    pub fn run_with_rng(&self, config: &GrowthConfig, rng: &mut VesselRng) -> Result<VesselVolume, VesselError> {
        let generator = PathGenerator::from_config(config)?;
        let extent = config.volume.extent;
        log::info!(
            "Growing vessel: radius {:.3} voxels, bifurcation every {:.1} steps, volume {:?}.",
            generator.params().radius,
            generator.params().bifurcation_length,
            extent
        );

        let tree = if self.thread_count > 1 {
            generator.grow_parallel(rng, self.thread_count)?
        } else {
            generator.grow(rng)?
        };

        let grid = if self.thread_count > 1 {
            ParallelGridRasterizer::new(config.partial_volume, self.thread_count)
                .with_progress(self.show_progress)
                .rasterize(tree.samples(), extent)
        } else {
            GridRasterizer::new(config.partial_volume).rasterize(tree.samples(), extent)
        };
        log::info!(
            "Rasterized {} samples: {} voxels touched, {:.1} voxels filled.",
            tree.len(),
            grid.count_nonzero(),
            grid.filled_volume()
        );

        Ok(VesselVolume {
            tree,
            grid,
            bounds_mm: AABB::new(Vector3f::zeros(), config.volume.size_mm()),
        })
    }
}

/// Single-threaded convenience wrapper returning only the fraction grid.
pub fn generate_volume_fractions(config: &GrowthConfig) -> Result<VolumeFractionGrid, VesselError> {
    Ok(VesselPipeline::default().run(config)?.grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::VolumeConfig;

    fn config() -> GrowthConfig {
        let mut cfg = GrowthConfig::new(
            Vector3f::new(5.0, 0.0, 5.0),
            Vector3f::new(0.0, 1.0, 0.0),
            VolumeConfig::new(0.25, [40, 48, 40]),
        );
        cfg.radius_mm = 1.0;
        cfg.bifurcation_length_mm = 2.0;
        cfg.radius_variation_factor = 0.3;
        cfg.partial_volume = true;
        cfg.seed = 4711;
        cfg
    }

    #[test]
    fn end_to_end_grid_has_volume_extent() {
        let volume = VesselPipeline::default().run(&config()).unwrap();
        assert_eq!(volume.grid.extent(), [40, 48, 40]);
        assert!(volume.grid.count_nonzero() > 0);
        assert!(volume.grid.data().iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert_eq!(volume.bounds_mm.p_max, Vector3f::new(10.0, 12.0, 10.0));
        assert!(volume.tree.branches().len() > 1);
    }

    #[test]
    fn seed_makes_runs_reproducible() {
        let a = generate_volume_fractions(&config()).unwrap();
        let b = generate_volume_fractions(&config()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn threaded_pipeline_matches_single_thread() {
        let single = VesselPipeline::default().run(&config()).unwrap();
        let threaded = VesselPipeline::new(4).run(&config()).unwrap();
        assert_eq!(single.tree, threaded.tree);
        assert_eq!(single.grid, threaded.grid);
    }

    #[test]
    fn invalid_config_is_reported_before_growth() {
        let mut cfg = config();
        cfg.volume.spacing_mm = -0.25;
        let err = generate_volume_fractions(&cfg).err().unwrap();
        assert_eq!(err, VesselError::Config(ConfigError::NonPositiveSpacing(-0.25)));
        assert!(err.to_string().contains("spacing"));
    }

    #[test]
    fn generation_limit_surfaces_as_error() {
        let mut cfg = config();
        cfg.max_generations = 1;
        let err = VesselPipeline::default().run(&cfg).err().unwrap();
        assert_eq!(err, VesselError::Growth(GrowthError::GenerationLimit { limit: 1 }));
    }
}
