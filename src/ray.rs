use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;
use crate::error::Result;

/// A ray with an origin point and a direction vector.
///
/// Rays are never mutated; transforming a ray produces a new one.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Ray4D {
    pub(crate) origin: Tuple4D,
    pub(crate) direction: Tuple4D,
}

impl Ray4D {
    /// Creates a ray, failing if `origin` is not a point or `direction` is
    /// not a vector.
    ///
    /// # Examples
    ///
    /// ```
    /// # use rayshade::tuple::Tuple4D;
    /// # use rayshade::ray::Ray4D;
    /// let ok = Ray4D::new(Tuple4D::point(0.0, 0.0, 0.0),
    ///                     Tuple4D::vector(0.0, 0.0, 1.0));
    /// assert!(ok.is_ok());
    ///
    /// let bad = Ray4D::new(Tuple4D::vector(0.0, 0.0, 0.0),
    ///                      Tuple4D::vector(0.0, 0.0, 1.0));
    /// assert!(bad.is_err());
    /// ```
    pub fn new(origin: Tuple4D, direction: Tuple4D) -> Result<Ray4D> {
        Ok(Ray4D {
            origin: origin.expect_point("ray origin")?,
            direction: direction.expect_vector("ray direction")?,
        })
    }

    pub fn origin(&self) -> Tuple4D {
        self.origin
    }

    pub fn direction(&self) -> Tuple4D {
        self.direction
    }

    /// The point at distance `t` along the ray.
    pub fn position(&self, t: f64) -> Tuple4D {
        self.origin + (t * self.direction)
    }

    /// Applies a transformation matrix to both the origin and direction.
    pub fn transform(&self, m: &Matrix4D) -> Ray4D {
        Ray4D {
            origin: *m * self.origin,
            direction: *m * self.direction,
        }
    }
}

#[test]
fn ray_rejects_misuse() {
    let p = Tuple4D::point(1.0, 2.0, 3.0);
    let v = Tuple4D::vector(4.0, 5.0, 6.0);

    assert!(Ray4D::new(p, v).is_ok());
    assert!(Ray4D::new(v, v).is_err());
    assert!(Ray4D::new(p, p).is_err());
}

#[test]
fn ray_position() {
    let r = Ray4D::new(
                Tuple4D::point(2.0, 3.0, 4.0),
                Tuple4D::vector(1.0, 0.0, 0.0)
            ).unwrap();

    assert_eq!(r.position(0.0), Tuple4D::point(2.0, 3.0, 4.0));
    assert_eq!(r.position(1.0), Tuple4D::point(3.0, 3.0, 4.0));
    assert_eq!(r.position(-1.0), Tuple4D::point(1.0, 3.0, 4.0));
    assert_eq!(r.position(2.5), Tuple4D::point(4.5, 3.0, 4.0));
}

#[test]
fn ray_translation() {
    let r = Ray4D::new(
                Tuple4D::point(1.0, 2.0, 3.0),
                Tuple4D::vector(0.0, 1.0, 0.0)
            ).unwrap();
    let m = Matrix4D::translation(3.0, 4.0, 5.0);
    let t = r.transform(&m);

    assert_eq!(t.origin(), Tuple4D::point(4.0, 6.0, 8.0));
    assert_eq!(t.direction(), Tuple4D::vector(0.0, 1.0, 0.0));
    assert_eq!(r.origin(), Tuple4D::point(1.0, 2.0, 3.0));
}

#[test]
fn ray_scaling() {
    let r = Ray4D::new(
                Tuple4D::point(1.0, 2.0, 3.0),
                Tuple4D::vector(0.0, 1.0, 0.0)
            ).unwrap();
    let m = Matrix4D::scaling(2.0, 3.0, 4.0);
    let t = r.transform(&m);

    assert_eq!(t.origin(), Tuple4D::point(2.0, 6.0, 12.0));
    assert_eq!(t.direction(), Tuple4D::vector(0.0, 3.0, 0.0));
}
