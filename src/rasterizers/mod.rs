// Copyright @yucwang 2026

pub mod grid;
pub mod parallel;
