use crate::consts::FEQ_EPSILON;
use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;
use crate::ray::Ray4D;

/// Precomputed data for a flat triangle.
///
/// Edge vectors `e1` and `e2` are measured from `p1`, and the normal is the
/// same everywhere on the triangle, so all three are calculated once when the
/// triangle is built.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TriangleInfo {
    pub p1: Tuple4D,
    pub p2: Tuple4D,
    pub p3: Tuple4D,

    pub e1: Tuple4D,
    pub e2: Tuple4D,
    pub normal: Tuple4D,
}

impl TriangleInfo {
    pub fn new(p1: Tuple4D, p2: Tuple4D, p3: Tuple4D) -> TriangleInfo {
        let e1 = p2 - p1;
        let e2 = p3 - p1;
        let normal = e2.cross(&e1).normalize();

        TriangleInfo { p1, p2, p3, e1, e2, normal }
    }

    /// The smallest box holding all three vertices.
    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::empty();
        bounds.add_point(&self.p1);
        bounds.add_point(&self.p2);
        bounds.add_point(&self.p3);

        bounds
    }
}

/// A triangle with a normal at each vertex.
///
/// Normals are interpolated across the face using the barycentric `(u, v)`
/// coordinates recorded by the intersection.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SmoothTriangleInfo {
    pub triangle_info: TriangleInfo,

    pub n1: Tuple4D,
    pub n2: Tuple4D,
    pub n3: Tuple4D,
}

impl SmoothTriangleInfo {
    pub fn new(p1: Tuple4D, p2: Tuple4D, p3: Tuple4D,
        n1: Tuple4D, n2: Tuple4D, n3: Tuple4D) -> SmoothTriangleInfo {
        SmoothTriangleInfo {
            triangle_info: TriangleInfo::new(p1, p2, p3),
            n1,
            n2,
            n3,
        }
    }

    /// Interpolates the vertex normals at barycentric coordinates `(u, v)`.
    pub fn interpolate(&self, u: f64, v: f64) -> Tuple4D {
        self.n2 * u + self.n3 * v + self.n1 * (1.0 - u - v)
    }
}

/// An axis-aligned bounding box.
///
/// Extents may be infinite (planes, uncapped cylinders). An empty box has a
/// minimum of `+inf` and a maximum of `-inf` on every axis, so that adding the
/// first point collapses it onto that point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub minimum: Tuple4D,
    pub maximum: Tuple4D,
}

impl Default for Bounds {
    fn default() -> Bounds {
        Bounds::empty()
    }
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, min_z: f64,
        max_x: f64, max_y: f64, max_z: f64) -> Bounds {
        Bounds {
            minimum: Tuple4D::point(min_x, min_y, min_z),
            maximum: Tuple4D::point(max_x, max_y, max_z),
        }
    }

    /// A box which holds nothing.
    pub fn empty() -> Bounds {
        let inf = f64::INFINITY;
        Bounds::new(inf, inf, inf, -inf, -inf, -inf)
    }

    pub fn is_empty(&self) -> bool {
        self.minimum.x > self.maximum.x
            || self.minimum.y > self.maximum.y
            || self.minimum.z > self.maximum.z
    }

    /// Grows the box so that it holds `p`.
    pub fn add_point(&mut self, p: &Tuple4D) {
        self.minimum.x = self.minimum.x.min(p.x);
        self.minimum.y = self.minimum.y.min(p.y);
        self.minimum.z = self.minimum.z.min(p.z);
        self.maximum.x = self.maximum.x.max(p.x);
        self.maximum.y = self.maximum.y.max(p.y);
        self.maximum.z = self.maximum.z.max(p.z);
    }

    /// Grows the box so that it holds `other` too.
    pub fn merge(&mut self, other: &Bounds) {
        if other.is_empty() {
            return;
        }

        self.add_point(&other.minimum);
        self.add_point(&other.maximum);
    }

    /// Transforms the box into another space.
    ///
    /// Every one of the 8 corners is transformed and the result is the
    /// envelope of the transformed corners. Infinite extents stay infinite
    /// instead of becoming NaN.
    ///
    /// ```
    /// # use rayshade::geometry::Bounds;
    /// # use rayshade::matrix::Matrix4D;
    /// let b = Bounds::new(-1.0, -1.0, -1.0, 1.0, 1.0, 1.0);
    /// let moved = b.transform(&Matrix4D::translation(5.0, 5.0, 5.0));
    /// assert_eq!(moved, Bounds::new(4.0, 4.0, 4.0, 6.0, 6.0, 6.0));
    /// ```
    pub fn transform(&self, m: &Matrix4D) -> Bounds {
        if self.is_empty() {
            return *self;
        }

        let (lo, hi) = (self.minimum, self.maximum);
        let corners = [
            Tuple4D::point(lo.x, lo.y, lo.z),
            Tuple4D::point(lo.x, lo.y, hi.z),
            Tuple4D::point(lo.x, hi.y, lo.z),
            Tuple4D::point(lo.x, hi.y, hi.z),
            Tuple4D::point(hi.x, lo.y, lo.z),
            Tuple4D::point(hi.x, lo.y, hi.z),
            Tuple4D::point(hi.x, hi.y, lo.z),
            Tuple4D::point(hi.x, hi.y, hi.z),
        ];

        let mut bounds = Bounds::empty();
        for corner in corners.iter() {
            bounds.add_point(&m.transform_extended_point(corner));
        }

        bounds
    }

    /// Gets the min and max intersection offsets along a single axis.
    ///
    /// The slab between `min` and `max` is tested against one component of a
    /// ray's origin and direction. A direction component of (nearly) zero is
    /// treated as infinitely slow, so the offsets become infinite.
    ///
    /// The smaller `t` is first in the tuple, the larger `t` is second.
    pub fn check_axis(min: f64, max: f64, origin: f64, direction: f64)
        -> (f64, f64) {
        let tmin_numerator = min - origin;
        let tmax_numerator = max - origin;

        let (tmin, tmax) = if direction.abs() >= FEQ_EPSILON {
            (tmin_numerator / direction, tmax_numerator / direction)
        } else {
            (tmin_numerator * f64::INFINITY,
             tmax_numerator * f64::INFINITY)
        };

        if tmin > tmax {
            (tmax, tmin)
        } else {
            (tmin, tmax)
        }
    }

    /// Whether a ray passes through the box (slab test).
    ///
    /// Offsets divide by the raw direction, so only an exactly zero
    /// component makes an axis parallel. A parallel axis is passed when the
    /// origin lies inside its slab, faces included. NaN offsets leave an axis
    /// unconstrained.
    ///
    /// ```
    /// # use rayshade::geometry::Bounds;
    /// # use rayshade::ray::Ray4D;
    /// # use rayshade::tuple::Tuple4D;
    /// let b = Bounds::new(-1.0, -1.0, -1.0, 1.0, 1.0, 1.0);
    /// let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0),
    ///                    Tuple4D::vector(0.0, 0.0, 1.0)).unwrap();
    /// assert!(b.intersects(&r));
    /// ```
    pub fn intersects(&self, ray: &Ray4D) -> bool {
        if self.is_empty() {
            return false;
        }

        let (o, d) = (ray.origin(), ray.direction());
        let axes = [
            (self.minimum.x, self.maximum.x, o.x, d.x),
            (self.minimum.y, self.maximum.y, o.y, d.y),
            (self.minimum.z, self.maximum.z, o.z, d.z),
        ];

        let mut tmin = f64::NEG_INFINITY;
        let mut tmax = f64::INFINITY;
        for (min, max, origin, direction) in axes {
            if direction == 0.0 {
                if origin < min || origin > max {
                    return false;
                }
                continue;
            }

            let t1 = (min - origin) / direction;
            let t2 = (max - origin) / direction;
            if t1.is_nan() || t2.is_nan() {
                continue;
            }

            tmin = tmin.max(t1.min(t2));
            tmax = tmax.min(t1.max(t2));
        }

        tmin <= tmax
    }
}

#[test]
fn constructing_triangle_info() {
    let p1 = Tuple4D::point(0.0, 1.0, 0.0);
    let p2 = Tuple4D::point(-1.0, 0.0, 0.0);
    let p3 = Tuple4D::point(1.0, 0.0, 0.0);
    let ti = TriangleInfo::new(p1, p2, p3);

    assert_eq!(ti.e1, Tuple4D::vector(-1.0, -1.0, 0.0));
    assert_eq!(ti.e2, Tuple4D::vector(1.0, -1.0, 0.0));
    assert_eq!(ti.normal, Tuple4D::vector(0.0, 0.0, -1.0));
    assert_eq!(ti.bounds(), Bounds::new(-1.0, 0.0, 0.0, 1.0, 1.0, 0.0));
}

#[test]
fn empty_bounds_grow_to_hold_points() {
    let mut b = Bounds::empty();
    assert!(b.is_empty());

    b.add_point(&Tuple4D::point(-5.0, 2.0, 0.0));
    b.add_point(&Tuple4D::point(7.0, 0.0, -3.0));

    assert!(!b.is_empty());
    assert_eq!(b, Bounds::new(-5.0, 0.0, -3.0, 7.0, 2.0, 0.0));
}

#[test]
fn merging_bounds() {
    let mut b1 = Bounds::new(-5.0, -2.0, 0.0, 7.0, 4.0, 4.0);
    let b2 = Bounds::new(8.0, -7.0, -2.0, 14.0, 2.0, 8.0);

    b1.merge(&b2);
    b1.merge(&Bounds::empty());

    assert_eq!(b1, Bounds::new(-5.0, -7.0, -2.0, 14.0, 4.0, 8.0));
}

#[test]
fn transforming_bounds_by_rotation() {
    let b = Bounds::new(-1.0, -1.0, -1.0, 1.0, 1.0, 1.0);
    let m = Matrix4D::rotation_x(std::f64::consts::PI / 4.0)
        * Matrix4D::rotation_y(std::f64::consts::PI / 4.0);
    let t = b.transform(&m);

    assert_eq!(t.minimum, Tuple4D::point(-1.4142, -1.7071, -1.7071));
    assert_eq!(t.maximum, Tuple4D::point(1.4142, 1.7071, 1.7071));
}

#[test]
fn transforming_infinite_bounds_has_no_nan() {
    let inf = f64::INFINITY;
    let plane = Bounds::new(-inf, 0.0, -inf, inf, 0.0, inf);
    let t = plane.transform(&Matrix4D::translation(0.0, 2.0, 0.0));

    assert_eq!(t, Bounds::new(-inf, 2.0, -inf, inf, 2.0, inf));

    let r = plane.transform(&Matrix4D::rotation_z(std::f64::consts::PI / 2.0));
    assert!(!r.minimum.x.is_nan() && !r.maximum.y.is_nan());
    assert_eq!(r.minimum.y, -inf);
    assert_eq!(r.maximum.y, inf);
}

#[test]
fn transforming_empty_bounds_stays_empty() {
    let t = Bounds::empty().transform(&Matrix4D::scaling(2.0, 2.0, 2.0));
    assert!(t.is_empty());
}

#[test]
fn ray_against_bounding_box() {
    let b = Bounds::new(5.0, -2.0, 0.0, 11.0, 4.0, 7.0);
    let cases = [
        (Tuple4D::point(15.0, 1.0, 2.0), Tuple4D::vector(-1.0, 0.0, 0.0), true),
        (Tuple4D::point(-5.0, -1.0, 4.0), Tuple4D::vector(1.0, 0.0, 0.0), true),
        (Tuple4D::point(7.0, 6.0, 5.0), Tuple4D::vector(0.0, -1.0, 0.0), true),
        (Tuple4D::point(9.0, -5.0, 6.0), Tuple4D::vector(0.0, 1.0, 0.0), true),
        (Tuple4D::point(8.0, 2.0, 12.0), Tuple4D::vector(0.0, 0.0, -1.0), true),
        (Tuple4D::point(8.0, 1.0, 3.5), Tuple4D::vector(0.0, 0.0, 1.0), true),
        (Tuple4D::point(9.0, -1.0, -8.0), Tuple4D::vector(2.0, 4.0, 6.0), false),
        (Tuple4D::point(12.0, 5.0, 4.0), Tuple4D::vector(-1.0, 0.0, 0.0), false),
        (Tuple4D::point(4.0, 0.0, 9.0), Tuple4D::vector(0.0, 0.0, -1.0), false),
    ];

    for (origin, direction, expected) in cases.iter() {
        let r = Ray4D::new(*origin, direction.normalize()).unwrap();
        assert_eq!(b.intersects(&r), *expected);
    }

    assert!(!Bounds::empty().intersects(
        &Ray4D::new(Tuple4D::point(0.0, 0.0, 0.0),
            Tuple4D::vector(0.0, 0.0, 1.0)).unwrap()
    ));
}

#[test]
fn slow_axis_still_reaches_a_distant_box() {
    let b = Bounds::new(-1.0, -1.0, 7999.0, 1.0, 1.0, 8001.0);
    let r = Ray4D::new(Tuple4D::point(-1.2, 0.0, 0.0),
        Tuple4D::vector(5e-5, 0.0, 1.0).normalize()).unwrap();

    assert!(b.intersects(&r));
}

#[test]
fn parallel_ray_on_a_face_enters_the_box() {
    let b = Bounds::new(-1.0, 0.0, -1.0, 1.0, 0.0, 1.0);
    let on_face = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0)).unwrap();
    let above = Ray4D::new(Tuple4D::point(0.0, 0.5, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0)).unwrap();

    assert!(b.intersects(&on_face));
    assert!(!b.intersects(&above));
}

#[test]
fn infinite_bounds_accept_any_crossing_ray() {
    let b = Bounds::new(f64::NEG_INFINITY, 0.0, f64::NEG_INFINITY,
        f64::INFINITY, 0.0, f64::INFINITY);
    let r = Ray4D::new(Tuple4D::point(3.0, 1.0, 2.0),
        Tuple4D::vector(1.0, -1.0, 0.0).normalize()).unwrap();

    assert!(b.intersects(&r));
}
