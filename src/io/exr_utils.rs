/* Copyright 2020 @TwoCookingMice */

use crate::volumes::VolumeFractionGrid;

use exr::prelude::*;

// Write one z-plane of a fraction grid as a greyscale EXR image.
pub fn write_slice_exr(grid: &VolumeFractionGrid,
                       z: usize,
                       file_path: &str) -> std::result::Result<(), String> {
    let [width, height, depth] = grid.extent();
    if z >= depth {
        return Err(format!("slice {} out of range, volume has {} slices", z, depth));
    }
    log::info!("Starting writing openexr slice z = {}: {}.", z, file_path);

    let plane = grid.z_slice(z);
    write_rgb_file(file_path, width, height, |x, y| {
        let v = plane[y * width + x];
        (v, v, v)
    })
    .map_err(|e| e.to_string())
}
