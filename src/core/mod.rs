// Copyright @yucwang 2021

pub mod config;
pub mod rasterizer;
pub mod rng;
pub mod structure_loader;
pub mod vessel_tree;
