// Copyright @yucwang 2026

use crate::core::rasterizer::Rasterizer;
use crate::core::vessel_tree::Sample;
use crate::rasterizers::grid::{splat_sample, EdgePolicy};
use crate::volumes::VolumeFractionGrid;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

/// Splats samples on worker threads, each into its own partial grid,
/// then max-reduces the partial grids.
pub struct ParallelGridRasterizer {
    policy: EdgePolicy,
    thread_count: usize,
    chunk_size: usize,
    show_progress: bool,
}

impl ParallelGridRasterizer {
    pub fn new(partial_volume: bool, thread_count: usize) -> Self {
        Self {
            policy: EdgePolicy::new(partial_volume),
            thread_count: thread_count.max(1),
            chunk_size: 64,
            show_progress: false,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }
}

impl Rasterizer for ParallelGridRasterizer {
    fn rasterize(&self, samples: &[Sample], extent: [usize; 3]) -> VolumeFractionGrid {
        let total_chunks = (samples.len() + self.chunk_size - 1) / self.chunk_size;
        // Every worker owns a full grid, so do not start more than there is work for.
        let workers = self.thread_count.min(total_chunks);
        if workers <= 1 {
            let mut grid = VolumeFractionGrid::new(extent);
            for sample in samples {
                splat_sample(&mut grid, sample, &self.policy);
            }
            return grid;
        }

        let progress = if self.show_progress {
            ProgressBar::new(total_chunks as u64)
        } else {
            ProgressBar::hidden()
        };
        progress.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} chunks")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let next_chunk = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<VolumeFractionGrid>();
        let mut output = VolumeFractionGrid::new(extent);

        thread::scope(|scope| {
            for _ in 0..workers {
                let next_chunk = &next_chunk;
                let progress = &progress;
                let tx = tx.clone();
                scope.spawn(move || {
                    let mut partial = VolumeFractionGrid::new(extent);
                    loop {
                        let chunk = next_chunk.fetch_add(1, Ordering::Relaxed);
                        if chunk >= total_chunks {
                            break;
                        }
                        let begin = chunk * self.chunk_size;
                        let end = (begin + self.chunk_size).min(samples.len());
                        for sample in &samples[begin..end] {
                            splat_sample(&mut partial, sample, &self.policy);
                        }
                        progress.inc(1);
                    }
                    let _ = tx.send(partial);
                });
            }

            drop(tx);
            for partial in rx {
                output.max_merge(&partial);
            }
        });
        progress.finish_and_clear();

        log::debug!(
            "Rasterized {} samples on {} threads into {:?} voxels.",
            samples.len(),
            workers,
            extent
        );
        output
    }
}
