mod core;

pub use core::{ParseVec3Error, Tolerance, Vec3};
