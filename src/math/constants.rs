/* Copyright 2020 @Yuchen Wong */

use nalgebra as na;

pub type Float = f32;

pub type Vector3f = na::Vector3<Float>;
pub type Matrix3f = na::Matrix3<Float>;

pub const FLOAT_MIN: Float = std::f32::MIN;
pub const FLOAT_MAX: Float = std::f32::MAX;

pub const PI: Float = std::f32::consts::PI;
pub const INV_SQUARE_2: Float = std::f32::consts::FRAC_1_SQRT_2;
