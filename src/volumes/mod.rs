// Copyright @yucwang 2026

pub mod fraction_grid;

pub use fraction_grid::VolumeFractionGrid;
