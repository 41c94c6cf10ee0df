// Copyright 2020 TwoCookingMice

use vesselgen::core::structure_loader::load_structure;
use vesselgen::io::{exr_utils, vol_utils};
use vesselgen::VesselPipeline;

use std::env;
use std::thread;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <structure.xml> <output.vol> [--seed N] [--threads N] [--slice-exr PATH]", args[0]);
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_path = &args[2];
    let mut seed_override: Option<u64> = None;
    let mut thread_count = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let mut slice_path: Option<String> = None;

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--seed" => {
                i += 1;
                seed_override = args.get(i).and_then(|v| v.parse::<u64>().ok());
            }
            "--threads" => {
                i += 1;
                thread_count = args.get(i).and_then(|v| v.parse::<usize>().ok()).unwrap_or(1);
            }
            "--slice-exr" => {
                i += 1;
                slice_path = args.get(i).cloned();
            }
            other => log::warn!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    let mut config = match load_structure(input_path) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };
    if let Some(seed) = seed_override {
        config.seed = seed;
    }

    let pipeline = VesselPipeline::new(thread_count).with_progress(true);
    let volume = match pipeline.run(&config) {
        Ok(volume) => volume,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Some(bounds) = volume.tree.bounds() {
        log::info!(
            "Tree spans voxels ({:.1}, {:.1}, {:.1}) to ({:.1}, {:.1}, {:.1}).",
            bounds.p_min.x, bounds.p_min.y, bounds.p_min.z,
            bounds.p_max.x, bounds.p_max.y, bounds.p_max.z
        );
    }

    if let Err(e) = vol_utils::write_vol_to_file(&volume.grid, &volume.bounds_mm, output_path) {
        log::error!("Failed to write {}: {}", output_path, e);
        std::process::exit(1);
    }

    if let Some(slice_path) = slice_path {
        let z = volume.grid.extent()[2] / 2;
        match exr_utils::write_slice_exr(&volume.grid, z, &slice_path) {
            Ok(()) => println!("EXR slice written to: {}.", slice_path),
            Err(e) => log::error!("EXR slice error: {}.", e),
        }
    }
}
