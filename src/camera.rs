use crate::ray::Ray4D;
use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;
use crate::world::World;
use crate::canvas::Canvas;
use crate::color::Color;
use crate::consts::REFLECTION_RECURSION_DEPTH;
use crate::error::{ RayTracerError, Result };

/// A camera record for generating a canvas.
///
/// This record gives a "frame" of the world. Based on camera parameters,
/// different perspectives can be produced.
///
/// The canvas sits one unit in front of the camera. `half_width` and
/// `half_height` are half of its extent in world units, and `pixel_size` is
/// the world size of one (square) pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    hsize: usize,
    vsize: usize,
    field_of_view: f64,

    half_width: f64,
    half_height: f64,
    pixel_size: f64,

    /// How the world is oriented relative to the camera (typically a view
    /// transformation), and its cached inverse.
    transform: Matrix4D,
    inverse: Matrix4D,
}

impl Camera {
    /// Creates a camera with the identity transform.
    ///
    /// Fails if either canvas dimension is zero, or if `field_of_view` is
    /// not strictly between 0 and pi.
    ///
    /// ```
    /// # use rayshade::camera::Camera;
    /// let c = Camera::new(200, 125, std::f64::consts::PI / 2.0).unwrap();
    /// assert!((c.pixel_size() - 0.01).abs() < 1e-4);
    /// assert!(Camera::new(0, 125, 1.0).is_err());
    /// ```
    pub fn new(hsize: usize, vsize: usize, field_of_view: f64)
        -> Result<Camera> {
        if hsize == 0 || vsize == 0 {
            return Err(RayTracerError::InvalidArgument(format!(
                "camera canvas must be non-empty, got {}x{}", hsize, vsize
            )));
        }

        if !(field_of_view > 0.0 && field_of_view < std::f64::consts::PI) {
            return Err(RayTracerError::InvalidArgument(format!(
                "field of view must lie in (0, pi), got {}", field_of_view
            )));
        }

        let half_view = (field_of_view / 2.0).tan();
        let aspect = (hsize as f64) / (vsize as f64);

        let (half_width, half_height) = if aspect >= 1.0 {
            (half_view, half_view / aspect)
        } else {
            (half_view * aspect, half_view)
        };

        let pixel_size = half_width * 2.0 / (hsize as f64);
        Ok(Camera {
            hsize,
            vsize,
            field_of_view,
            half_width,
            half_height,
            pixel_size,
            transform: Matrix4D::identity(),
            inverse: Matrix4D::identity(),
        })
    }

    pub fn hsize(&self) -> usize {
        self.hsize
    }

    pub fn vsize(&self) -> usize {
        self.vsize
    }

    pub fn field_of_view(&self) -> f64 {
        self.field_of_view
    }

    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }

    pub fn transform(&self) -> &Matrix4D {
        &self.transform
    }

    /// Sets the camera transform; fails if it cannot be inverted.
    pub fn set_transform(&mut self, transform: Matrix4D) -> Result<()> {
        self.inverse = transform.inverse()?;
        self.transform = transform;

        Ok(())
    }

    pub fn with_transform(mut self, transform: Matrix4D) -> Result<Camera> {
        self.set_transform(transform)?;
        Ok(self)
    }

    /// Builds the ray from the camera through the center of pixel
    /// (`px`, `py`).
    pub fn ray_for_pixel(&self, px: usize, py: usize) -> Result<Ray4D> {
        // Offsets from the edge of the canvas to the pixel's center
        let xoffset = (px as f64 + 0.5) * self.pixel_size;
        let yoffset = (py as f64 + 0.5) * self.pixel_size;

        // The untransformed coordinates of the pixel in world space
        let world_x = self.half_width - xoffset;
        let world_y = self.half_height - yoffset;

        // Using the camera matrix, transform the canvas point and origin,
        // computing the ray's direction vector
        let pixel = self.inverse * Tuple4D::point(world_x, world_y, -1.0);
        let origin = self.inverse * Tuple4D::point(0.0, 0.0, 0.0);
        let direction = (pixel - origin).normalize();

        Ray4D::new(origin, direction)
    }

    /// The color seen through pixel (`px`, `py`).
    pub(crate) fn color_for_pixel(&self, w: &World, px: usize, py: usize)
        -> Result<Color> {
        let ray = self.ray_for_pixel(px, py)?;
        w.color_at(&ray, REFLECTION_RECURSION_DEPTH)
    }

    /// Renders a world on the calling thread.
    ///
    /// See `parallel::render_parallel` for the multi-threaded version.
    pub fn render(&self, w: &World) -> Result<Canvas> {
        let mut image = Canvas::new(self.hsize, self.vsize);

        for y in 0..self.vsize {
            for x in 0..self.hsize {
                let color = self.color_for_pixel(w, x, y)?;
                image.write_pixel(x, y, &color);
            }
        }

        Ok(image)
    }
}

#[test]
fn pixel_size_for_horizontal_canvas() {
    let c = Camera::new(200, 125, std::f64::consts::PI / 2.0).unwrap();
    assert!(crate::feq(c.pixel_size(), 0.01));
}

#[test]
fn pixel_size_for_vertical_canvas() {
    let c = Camera::new(125, 200, std::f64::consts::PI / 2.0).unwrap();
    assert!(crate::feq(c.pixel_size(), 0.01));
}

#[test]
fn camera_rejects_bad_parameters() {
    use std::f64::consts::PI;

    assert!(Camera::new(0, 10, PI / 2.0).is_err());
    assert!(Camera::new(10, 0, PI / 2.0).is_err());
    assert!(Camera::new(10, 10, 0.0).is_err());
    assert!(Camera::new(10, 10, PI).is_err());
    assert!(Camera::new(10, 10, f64::NAN).is_err());
}

#[test]
fn camera_rejects_singular_transform() {
    let mut c = Camera::new(10, 10, 1.0).unwrap();

    assert!(c.set_transform(Matrix4D::scaling(0.0, 1.0, 1.0)).is_err());
    assert_eq!(*c.transform(), Matrix4D::identity());
}

#[test]
fn ray_through_center() {
    let c = Camera::new(201, 101, std::f64::consts::PI / 2.0).unwrap();
    let r = c.ray_for_pixel(100, 50).unwrap();

    assert_eq!(r.origin(), Tuple4D::point(0.0, 0.0, 0.0));
    assert_eq!(r.direction(), Tuple4D::vector(0.0, 0.0, -1.0));
}

#[test]
fn ray_through_corner() {
    let c = Camera::new(201, 101, std::f64::consts::PI / 2.0).unwrap();
    let r = c.ray_for_pixel(0, 0).unwrap();

    assert_eq!(r.origin(), Tuple4D::point(0.0, 0.0, 0.0));
    assert_eq!(r.direction(), Tuple4D::vector(0.66519, 0.33259, -0.66851));
}

#[test]
fn ray_when_camera_transformed() {
    let c = Camera::new(201, 101, std::f64::consts::PI / 2.0).unwrap()
        .with_transform(Matrix4D::rotation_y(std::f64::consts::PI / 4.0)
            * Matrix4D::translation(0.0, -2.0, 5.0)).unwrap();
    let r = c.ray_for_pixel(100, 50).unwrap();

    assert_eq!(r.origin(), Tuple4D::point(0.0, 2.0, -5.0));
    assert_eq!(r.direction(),
        Tuple4D::vector(2.0f64.sqrt() / 2.0, 0.0, -(2.0f64.sqrt() / 2.0)));
}

#[test]
fn render_world_with_camera() {
    let w: World = Default::default();

    let from = Tuple4D::point(0.0, 0.0, -5.0);
    let to = Tuple4D::point(0.0, 0.0, 0.0);
    let up = Tuple4D::vector(0.0, 1.0, 0.0);

    let c = Camera::new(11, 11, std::f64::consts::PI / 2.0).unwrap()
        .with_transform(Matrix4D::view_transform(from, to, up)).unwrap();

    let image = c.render(&w).unwrap();
    assert_eq!(image.read_pixel(5, 5).unwrap(),
        Color::rgb(0.38066, 0.47583, 0.2855));
}
