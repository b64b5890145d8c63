pub mod consts;
pub mod error;

pub mod tuple;
pub mod matrix;
pub mod ray;

pub mod geometry;
pub mod shape;
pub mod intersect;

pub mod color;
pub mod pattern;
pub mod light;

pub mod world;
pub mod camera;
pub mod canvas;
pub mod parallel;

pub mod model;
pub mod scene;

pub use error::{ RayTracerError, Result };

use consts::FEQ_EPSILON;

/// Approximate floating point equality, used for every geometric comparison.
pub fn feq(left: f64, right: f64) -> bool {
    if left.is_infinite() || right.is_infinite() {
        return left == right;
    }

    (left - right).abs() < FEQ_EPSILON
}

#[test]
fn feq_tolerates_drift() {
    assert!(feq(0.1 + 0.2, 0.3));
    assert!(!feq(1.0, 1.001));
    assert!(feq(f64::INFINITY, f64::INFINITY));
    assert!(!feq(f64::INFINITY, -f64::INFINITY));
}
