// Copyright @yucwang 2026

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use crate::core::config::{ConfigError, GrowthConfig, VoxelGrowthParams};
use crate::core::rng::VesselRng;
use crate::core::vessel_tree::{inside_extent, Sample, VesselTree};
use crate::math::constants::{Float, Vector3f, INV_SQUARE_2, PI};
use crate::math::rotation::rotation_xyz;

/// Forked children thinner than this are not grown.
pub const MIN_BRANCH_RADIUS: Float = 0.5;
pub const FORK_ANGLE_MEAN: Float = PI / 16.0;
pub const FORK_ANGLE_STD_DEV: Float = PI / 8.0;

#[derive(Debug, Clone, PartialEq)]
pub enum GrowthError {
    GenerationLimit { limit: u32 },
}

impl fmt::Display for GrowthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrowthError::GenerationLimit { limit } => write!(
                f,
                "vessel tree exceeded {} generations, check radius and bifurcation settings",
                limit
            ),
        }
    }
}

impl std::error::Error for GrowthError {}

/// Pending growth of a single branch.
#[derive(Debug, Clone)]
struct BranchTask {
    position: Vector3f,
    direction: Vector3f,
    radius: Float,
    radius_variation: Float,
    generation: u32,
    parent: Option<usize>,
    rng: VesselRng,
}

struct BranchOutcome {
    samples: Vec<Sample>,
    children: Vec<BranchTask>,
}

pub struct PathGenerator {
    params: VoxelGrowthParams,
}

impl PathGenerator {
    pub fn new(params: VoxelGrowthParams) -> Self {
        Self { params }
    }

    pub fn from_config(config: &GrowthConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.to_voxel_space()?))
    }

    pub fn params(&self) -> &VoxelGrowthParams {
        &self.params
    }

    /// Grow the whole tree on the calling thread.
    pub fn grow(&self, rng: &mut VesselRng) -> Result<VesselTree, GrowthError> {
        self.grow_waves(rng, |tasks| tasks.iter().map(|t| self.grow_branch(t)).collect())
    }

    /// Grow the tree with each generation's branches spread over `thread_count` workers.
    /// Produces the same tree as `grow` for the same seed.
    pub fn grow_parallel(&self, rng: &mut VesselRng, thread_count: usize) -> Result<VesselTree, GrowthError> {
        let thread_count = thread_count.max(1);
        self.grow_waves(rng, |tasks| {
            if thread_count == 1 || tasks.len() < 2 {
                return tasks.iter().map(|t| self.grow_branch(t)).collect();
            }

            let next_task = AtomicUsize::new(0);
            let (tx, rx) = mpsc::channel::<(usize, BranchOutcome)>();
            let mut outcomes: Vec<Option<BranchOutcome>> = (0..tasks.len()).map(|_| None).collect();

            thread::scope(|scope| {
                for _ in 0..thread_count.min(tasks.len()) {
                    let tx = tx.clone();
                    let next_task = &next_task;
                    scope.spawn(move || loop {
                        let index = next_task.fetch_add(1, Ordering::Relaxed);
                        if index >= tasks.len() {
                            break;
                        }
                        if tx.send((index, self.grow_branch(&tasks[index]))).is_err() {
                            break;
                        }
                    });
                }

                drop(tx);
                for (index, outcome) in rx {
                    outcomes[index] = Some(outcome);
                }
            });

            outcomes.into_iter().flatten().collect()
        })
    }

    /// Breadth-first over generations. `run_wave` must return one outcome per task, in order.
    fn grow_waves<F>(&self, rng: &mut VesselRng, run_wave: F) -> Result<VesselTree, GrowthError>
    where
        F: Fn(&[BranchTask]) -> Vec<BranchOutcome>,
    {
        let mut tree = VesselTree::new();
        let mut wave = vec![BranchTask {
            position: self.params.start,
            direction: self.params.direction,
            radius: self.params.radius,
            radius_variation: self.params.radius_variation,
            generation: 0,
            parent: None,
            rng: rng.fork(),
        }];

        while !wave.is_empty() {
            let generation = wave[0].generation;
            if generation > self.params.max_generations {
                log::error!("Vessel growth aborted at generation {}.", generation);
                return Err(GrowthError::GenerationLimit { limit: self.params.max_generations });
            }

            let outcomes = run_wave(&wave[..]);
            debug_assert_eq!(outcomes.len(), wave.len());

            let mut next_wave = Vec::new();
            for (task, outcome) in wave.iter().zip(outcomes) {
                let index = tree.push_branch(task.generation, task.parent, task.radius, outcome.samples);
                for mut child in outcome.children {
                    child.parent = Some(index);
                    next_wave.push(child);
                }
            }
            log::debug!("Generation {}: {} branches, {} samples so far.", generation, wave.len(), tree.len());
            wave = next_wave;
        }

        log::info!(
            "Grew vessel tree: {} branches, {} samples, {} generations.",
            tree.branches().len(),
            tree.len(),
            tree.max_generation() + 1
        );
        Ok(tree)
    }

    fn grow_branch(&self, task: &BranchTask) -> BranchOutcome {
        let mut rng = task.rng.clone();
        let mut position = task.position;
        let mut direction = task.direction;
        let mut samples = vec![Sample::new(position, task.radius)];
        let mut children = Vec::new();
        let mut steps: usize = 0;

        while inside_extent(&position, self.params.extent) {
            if steps as Float >= self.params.bifurcation_length {
                let angles = rng.next_normal_vector(FORK_ANGLE_MEAN, FORK_ANGLE_STD_DEV);
                let child_radius = INV_SQUARE_2 * task.radius;
                let child_variation = INV_SQUARE_2 * task.radius_variation;

                for rotated in [rotation_xyz(&angles) * direction, rotation_xyz(&-angles) * direction] {
                    if child_radius >= MIN_BRANCH_RADIUS {
                        children.push(BranchTask {
                            position,
                            direction: rotated.try_normalize(0.0).unwrap_or(direction),
                            radius: child_radius,
                            radius_variation: child_variation,
                            generation: task.generation + 1,
                            parent: None,
                            rng: rng.fork(),
                        });
                    }
                }
                break;
            }

            position += direction;
            let radius = task.radius + rng.next_signed() * task.radius_variation;
            samples.push(Sample::new(position, radius.max(0.0)));

            let step = direction + self.params.curvature_factor * rng.next_signed_vector();
            direction = step.try_normalize(0.0).unwrap_or(direction);
            steps += 1;
        }

        BranchOutcome { samples, children }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(radius: Float, bifurcation_length: Float, extent: usize) -> VoxelGrowthParams {
        VoxelGrowthParams {
            start: Vector3f::new(0.0, 0.0, 0.0),
            direction: Vector3f::new(0.0, 1.0, 0.0),
            radius,
            radius_variation: 0.0,
            bifurcation_length,
            curvature_factor: 0.0,
            extent: [extent, extent, extent],
            max_generations: 64,
        }
    }

    fn forking_params() -> VoxelGrowthParams {
        VoxelGrowthParams {
            start: Vector3f::new(30.0, 2.0, 30.0),
            direction: Vector3f::new(0.0, 1.0, 0.0),
            radius: 4.0,
            radius_variation: 0.5,
            bifurcation_length: 6.0,
            curvature_factor: 0.1,
            extent: [60, 60, 60],
            max_generations: 64,
        }
    }

    #[test]
    fn straight_vessel_without_fork() {
        let generator = PathGenerator::new(params(4.0, 1000.0, 10));
        let tree = generator.grow(&mut VesselRng::new(0)).unwrap();

        assert_eq!(tree.branches().len(), 1);
        assert_eq!(tree.len(), 11);
        for (k, s) in tree.samples().iter().enumerate() {
            assert!((s.position - Vector3f::new(0.0, k as Float, 0.0)).norm() < 1e-5);
            assert_eq!(s.radius, 4.0);
        }
        assert!(!tree.samples()[10].is_inside([10, 10, 10]));
    }

    #[test]
    fn sub_cutoff_root_still_grows() {
        let generator = PathGenerator::new(params(0.3, 1000.0, 10));
        let tree = generator.grow(&mut VesselRng::new(1)).unwrap();
        assert_eq!(tree.branches().len(), 1);
        assert_eq!(tree.len(), 11);
        assert!(tree.samples().iter().all(|s| s.radius == 0.3));
    }

    #[test]
    fn start_outside_volume_yields_single_sample() {
        let mut p = params(2.0, 5.0, 10);
        p.start = Vector3f::new(-1.0, 0.0, 0.0);
        let tree = PathGenerator::new(p).grow(&mut VesselRng::new(0)).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.samples()[0].position, Vector3f::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn non_positive_bifurcation_length_forks_immediately() {
        let mut p = params(2.0, 0.0, 20);
        p.start = Vector3f::new(10.0, 10.0, 10.0);
        let tree = PathGenerator::new(p.clone()).grow(&mut VesselRng::new(5)).unwrap();
        assert_eq!(tree.branch_samples(0).len(), 1);
        assert!(tree.branches().len() > 1);

        p.bifurcation_length = -4.0;
        p.radius = 8.0;
        p.max_generations = 3;
        let result = PathGenerator::new(p).grow(&mut VesselRng::new(5));
        assert_eq!(result, Err(GrowthError::GenerationLimit { limit: 3 }));
    }

    #[test]
    fn children_shrink_by_inverse_sqrt_two() {
        let tree = PathGenerator::new(forking_params()).grow(&mut VesselRng::new(11)).unwrap();
        assert!(tree.branches().len() > 1);

        for (index, branch) in tree.branches().iter().enumerate() {
            match branch.parent {
                None => assert_eq!(index, 0),
                Some(parent) => {
                    let parent_branch = &tree.branches()[parent];
                    assert_eq!(branch.generation, parent_branch.generation + 1);
                    assert!((branch.radius - parent_branch.radius * INV_SQUARE_2).abs() < 1e-5);
                    assert!(branch.radius >= MIN_BRANCH_RADIUS);

                    let fork_point = tree.branch_samples(parent).last().unwrap().position;
                    assert_eq!(tree.branch_samples(index)[0].position, fork_point);
                }
            }
        }
    }

    #[test]
    fn samples_stay_inside_until_exit() {
        let p = forking_params();
        let extent = p.extent;
        let tree = PathGenerator::new(p).grow(&mut VesselRng::new(23)).unwrap();

        for index in 0..tree.branches().len() {
            let samples = tree.branch_samples(index);
            let (last, body) = samples.split_last().unwrap();
            assert!(body.iter().all(|s| s.is_inside(extent)));
            // The final sample is either the exit step or the fork point.
            let forked = tree.branches().iter().any(|b| b.parent == Some(index));
            if forked {
                assert!(last.is_inside(extent));
            }
        }
        assert!(tree.samples().iter().all(|s| s.radius >= 0.0));
    }

    #[test]
    fn radius_jitter_is_bounded() {
        let tree = PathGenerator::new(forking_params()).grow(&mut VesselRng::new(8)).unwrap();
        for index in 0..tree.branches().len() {
            let branch = &tree.branches()[index];
            let variation = 0.5 * INV_SQUARE_2.powi(branch.generation as i32);
            for s in tree.branch_samples(index) {
                assert!(s.radius <= branch.radius + variation + 1e-5);
                assert!(s.radius >= (branch.radius - variation - 1e-5).max(0.0));
            }
        }
    }

    #[test]
    fn negative_radius_draws_clamp_to_zero() {
        let mut p = params(1.0, 1000.0, 40);
        p.radius_variation = 3.0;
        let tree = PathGenerator::new(p).grow(&mut VesselRng::new(12)).unwrap();

        assert_eq!(tree.len(), 41);
        assert!(tree.samples().iter().all(|s| s.radius >= 0.0 && s.radius <= 4.0));
        assert!(tree.samples().iter().any(|s| s.radius == 0.0));
        assert!(tree.samples().iter().any(|s| s.radius > 1.0));
    }

    #[test]
    fn directions_stay_unit_length() {
        let tree = PathGenerator::new(forking_params()).grow(&mut VesselRng::new(2)).unwrap();
        for index in 0..tree.branches().len() {
            for pair in tree.branch_samples(index).windows(2) {
                let step = (pair[1].position - pair[0].position).norm();
                assert!((step - 1.0).abs() < 1e-4, "step = {}", step);
            }
        }
    }

    #[test]
    fn same_seed_same_tree() {
        let generator = PathGenerator::new(forking_params());
        let a = generator.grow(&mut VesselRng::new(99)).unwrap();
        let b = generator.grow(&mut VesselRng::new(99)).unwrap();
        let c = generator.grow(&mut VesselRng::new(100)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn parallel_growth_matches_sequential() {
        let generator = PathGenerator::new(forking_params());
        let sequential = generator.grow(&mut VesselRng::new(42)).unwrap();
        let parallel = generator.grow_parallel(&mut VesselRng::new(42), 4).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn builds_from_physical_config() {
        use crate::core::config::VolumeConfig;
        let mut cfg = GrowthConfig::new(
            Vector3f::new(2.5, 0.0, 2.5),
            Vector3f::new(0.0, 1.0, 0.0),
            VolumeConfig::new(0.5, [10, 20, 10]),
        );
        cfg.radius_mm = 1.0;
        let generator = PathGenerator::from_config(&cfg).unwrap();
        assert_eq!(generator.params().start, Vector3f::new(5.0, 0.0, 5.0));
        assert_eq!(generator.params().radius, 2.0);
        assert_eq!(generator.params().bifurcation_length, 14.0);

        cfg.volume.spacing_mm = 0.0;
        assert!(PathGenerator::from_config(&cfg).is_err());
    }
}
