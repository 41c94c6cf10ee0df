use vesselgen::io::vol_utils::read_vol_from_file;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <volume.vol>", args[0]);
        std::process::exit(1);
    }

    let (grid, bbox) = read_vol_from_file(&args[1])
        .unwrap_or_else(|e| panic!("failed to read {}: {}", args[1], e));

    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut full = 0usize;
    let mut partial = 0usize;
    for &v in grid.data() {
        if v < min { min = v; }
        if v > max { max = v; }
        if v >= 1.0 {
            full += 1;
        } else if v > 0.0 {
            partial += 1;
        }
    }

    let [x, y, z] = grid.extent();
    let n = grid.data().len() as f64;
    println!("Size: {}x{}x{} ({} voxels)", x, y, z, grid.data().len());
    println!("Bounds: ({:.3}, {:.3}, {:.3}) - ({:.3}, {:.3}, {:.3})",
             bbox.p_min.x, bbox.p_min.y, bbox.p_min.z,
             bbox.p_max.x, bbox.p_max.y, bbox.p_max.z);
    println!("Min: {:.6}  Max: {:.6}", min, max);
    println!("Full voxels: {}  Partial voxels: {}", full, partial);
    println!("Filled volume: {:.3} voxels ({:.4}% of grid)", grid.filled_volume(), 100.0 * grid.filled_volume() / n);
}
