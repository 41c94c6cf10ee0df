// Copyright @yucwang 2026

use std::fs;
use std::path::Path;

use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::volumes::VolumeFractionGrid;

const VOL_VERSION: u8 = 3;
const VOL_ENCODING_FLOAT32: i32 = 1;
const VOL_HEADER_BYTES: usize = 48;

/// Encode a grid in the binary `VOL` format (version 3, float32, one channel).
/// `bbox` is the world-space extent of the volume.
pub fn encode_vol(grid: &VolumeFractionGrid, bbox: &AABB) -> Vec<u8> {
    let [xres, yres, zres] = grid.extent();
    let mut bytes = Vec::with_capacity(VOL_HEADER_BYTES + 4 * grid.data().len());
    bytes.extend_from_slice(b"VOL");
    bytes.push(VOL_VERSION);
    bytes.extend_from_slice(&VOL_ENCODING_FLOAT32.to_le_bytes());
    for res in [xres, yres, zres] {
        bytes.extend_from_slice(&(res as i32).to_le_bytes());
    }
    bytes.extend_from_slice(&1i32.to_le_bytes());
    for idx in 0..3 {
        bytes.extend_from_slice(&bbox.p_min[idx].to_le_bytes());
    }
    for idx in 0..3 {
        bytes.extend_from_slice(&bbox.p_max[idx].to_le_bytes());
    }
    for v in grid.data() {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

pub fn decode_vol(bytes: &[u8]) -> Result<(VolumeFractionGrid, AABB), String> {
    if bytes.len() < 4 {
        return Err("vol file too small".to_string());
    }
    if &bytes[0..3] != b"VOL" {
        return Err("invalid vol header".to_string());
    }
    let version = bytes[3];
    if version != VOL_VERSION {
        return Err(format!("unsupported vol version: {}", version));
    }

    let mut cursor = 4usize;
    let encoding = read_i32(bytes, &mut cursor)?;
    let xres = read_i32(bytes, &mut cursor)?;
    let yres = read_i32(bytes, &mut cursor)?;
    let zres = read_i32(bytes, &mut cursor)?;
    let channels = read_i32(bytes, &mut cursor)?;

    if encoding != VOL_ENCODING_FLOAT32 {
        return Err(format!("unsupported vol encoding: {}", encoding));
    }
    if xres <= 0 || yres <= 0 || zres <= 0 {
        return Err("vol dimensions must be positive".to_string());
    }
    if channels != 1 {
        return Err(format!("expected a single channel volume, got {} channels", channels));
    }

    let mut corners = [0.0 as Float; 6];
    for c in corners.iter_mut() {
        *c = read_f32(bytes, &mut cursor)?;
    }
    let bbox = AABB::new(
        Vector3f::new(corners[0], corners[1], corners[2]),
        Vector3f::new(corners[3], corners[4], corners[5]),
    );

    let extent = [xres as usize, yres as usize, zres as usize];
    let expected = extent[0]
        .checked_mul(extent[1])
        .and_then(|v| v.checked_mul(extent[2]))
        .ok_or_else(|| "vol dimensions overflow".to_string())?;
    let mut data = Vec::with_capacity(expected);
    for _ in 0..expected {
        data.push(read_f32(bytes, &mut cursor)?);
    }

    Ok((VolumeFractionGrid::from_raw(extent, data)?, bbox))
}

pub fn write_vol_to_file<P: AsRef<Path>>(grid: &VolumeFractionGrid, bbox: &AABB, path: P) -> std::io::Result<()> {
    let path = path.as_ref();
    log::info!("Writing {:?} volume to: {}.", grid.extent(), path.display());
    fs::write(path, encode_vol(grid, bbox))
}

pub fn read_vol_from_file<P: AsRef<Path>>(path: P) -> Result<(VolumeFractionGrid, AABB), String> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    decode_vol(&bytes)
}

fn read_i32(bytes: &[u8], cursor: &mut usize) -> Result<i32, String> {
    if *cursor + 4 > bytes.len() {
        return Err("unexpected eof while reading i32".to_string());
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[*cursor..*cursor + 4]);
    *cursor += 4;
    Ok(i32::from_le_bytes(buf))
}

fn read_f32(bytes: &[u8], cursor: &mut usize) -> Result<Float, String> {
    if *cursor + 4 > bytes.len() {
        return Err("unexpected eof while reading f32".to_string());
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[*cursor..*cursor + 4]);
    *cursor += 4;
    Ok(Float::from_le_bytes(buf))
}
