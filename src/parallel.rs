//! Multi-threaded rendering.
//!
//! Rows of the canvas are handed out to a fixed-size rayon pool. Each worker
//! owns a disjoint row slice of the pixel buffer, so no locking is needed,
//! and the world and camera are only ever borrowed immutably.

use rayon::prelude::*;

use crate::world::World;
use crate::camera::Camera;
use crate::canvas::Canvas;
use crate::error::{ RayTracerError, Result };

/// Renders a world through a camera using `threads` worker threads.
///
/// The result is identical to `Camera::render`. If any pixel fails, the
/// first error encountered is returned and no canvas is produced.
pub fn render_parallel(camera: &Camera, world: &World, threads: usize)
    -> Result<Canvas> {
    if threads == 0 {
        return Err(RayTracerError::InvalidArgument(
            "at least one render thread is required".to_string()
        ));
    }

    if world.light_source.is_none() {
        log::warn!("Rendering a world without a light; surfaces will be black");
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| RayTracerError::ThreadPool(e.to_string()))?;

    let width = camera.hsize();
    let height = camera.vsize();
    log::info!("Rendering {}x{} pixels using {} threads...",
        width, height, threads);

    let mut canvas = Canvas::new(width, height);
    pool.install(|| {
        canvas.pixels_mut()
            .par_chunks_mut(width)
            .enumerate()
            .try_for_each(|(y, row)| -> Result<()> {
                for (x, pixel) in row.iter_mut().enumerate() {
                    *pixel = camera.color_for_pixel(world, x, y)?;
                }

                Ok(())
            })
    })?;

    log::info!("...done.");
    Ok(canvas)
}

#[cfg(test)]
use crate::matrix::Matrix4D;

#[cfg(test)]
use crate::tuple::Tuple4D;

#[cfg(test)]
fn test_camera(hsize: usize, vsize: usize) -> Camera {
    let from = Tuple4D::point(0.0, 0.0, -5.0);
    let to = Tuple4D::point(0.0, 0.0, 0.0);
    let up = Tuple4D::vector(0.0, 1.0, 0.0);

    Camera::new(hsize, vsize, std::f64::consts::PI / 2.0).unwrap()
        .with_transform(Matrix4D::view_transform(from, to, up)).unwrap()
}

#[test]
fn parallel_render_matches_sequential_render() {
    let w: World = Default::default();
    let c = test_camera(16, 9);

    let sequential = c.render(&w).unwrap();
    let parallel = render_parallel(&c, &w, 4).unwrap();

    assert_eq!(sequential, parallel);
}

#[test]
fn parallel_render_with_more_threads_than_rows() {
    let w: World = Default::default();
    let c = test_camera(5, 2);

    let sequential = c.render(&w).unwrap();
    let parallel = render_parallel(&c, &w, 8).unwrap();

    assert_eq!(sequential, parallel);
}

#[test]
fn parallel_render_requires_a_thread() {
    let w: World = Default::default();
    let c = test_camera(4, 4);

    assert!(render_parallel(&c, &w, 0).is_err());
}
