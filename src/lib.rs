// Copyright @yucwang 2026

pub extern crate nalgebra as na;

pub mod core;
pub mod generators;
pub mod io;
pub mod math;
pub mod pipeline;
pub mod rasterizers;
pub mod volumes;

pub use crate::core::config::{GrowthConfig, VolumeConfig};
pub use crate::core::vessel_tree::{Sample, VesselTree};
pub use crate::pipeline::{generate_volume_fractions, VesselError, VesselPipeline};
pub use crate::volumes::VolumeFractionGrid;
