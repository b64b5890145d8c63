use crate::consts::{ FEQ_EPSILON, VACUUM_RI };
use crate::tuple::Tuple4D;
use crate::ray::Ray4D;
use crate::shape::{ Shape, normal_at };
use crate::error::Result;

/// An intersection.
///
/// This structure assumes that some ray produced an intersection. Parameter `t`
/// is analogous to `t` for a ray (the offset from the ray origin).
///
/// The `what` parameter borrows the intersected shape, so an intersection can
/// never outlive the scene it was computed against. Triangles also record the
/// barycentric `(u, v)` of the hit.
#[derive(Copy, Clone, Debug)]
pub struct Intersection<'a> {
    pub t: f64,
    pub what: &'a Shape,
    pub uv: Option<(f64, f64)>,
}

/// Implements partial equality on an Intersection.
///
/// Two Intersection structures are equal if the offsets `t` of the
/// intersections are equivalent, and if they refer to the very same shape
/// (pointer equality, not value equality).
impl<'a> PartialEq for Intersection<'a> {
    fn eq(&self, other: &Intersection<'a>) -> bool {
        self.t == other.t && std::ptr::eq(self.what, other.what)
    }
}

impl<'a> Intersection<'a> {
    pub fn new(t: f64, what: &'a Shape) -> Intersection<'a> {
        Intersection { t, what, uv: None }
    }

    /// Creates an intersection carrying barycentric coordinates.
    pub fn new_uv(t: f64, what: &'a Shape, u: f64, v: f64) -> Intersection<'a> {
        Intersection { t, what, uv: Some((u, v)) }
    }
}

/// A collection of intersections.
///
/// Mostly a wrapper for a vector of `Intersection` objects. See the
/// `Intersection` documentation for more information.
#[derive(Clone, Debug, Default)]
pub struct Intersections<'a> {
    pub intersections: Vec<Intersection<'a>>,
}

impl<'a> Intersections<'a> {
    /// Creates a new list of intersections.
    pub fn new() -> Intersections<'a> {
        Intersections { intersections: Vec::new() }
    }

    /// Merges several lists into one list sorted ascending by `t`.
    pub fn aggregate(lists: Vec<Intersections<'a>>) -> Intersections<'a> {
        let mut all = Intersections {
            intersections: lists.into_iter()
                .flat_map(|is| is.intersections)
                .collect()
        };

        all.sort();
        all
    }

    pub fn push(&mut self, i: Intersection<'a>) {
        self.intersections.push(i);
    }

    pub fn len(&self) -> usize {
        self.intersections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intersections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Intersection<'a>> {
        self.intersections.iter()
    }

    /// Finds the hit: the intersection with the smallest strictly positive,
    /// finite `t`.
    ///
    /// Equal `t`s are resolved in favour of the intersection encountered
    /// first. If no hit is registered, this function returns `None`.
    ///
    /// ```
    /// # use rayshade::shape::Shape;
    /// # use rayshade::intersect::{ Intersection, Intersections };
    /// let s = Shape::sphere();
    /// let is = Intersections {
    ///     intersections: vec![
    ///         Intersection::new(5.0, &s),
    ///         Intersection::new(-3.0, &s),
    ///         Intersection::new(2.0, &s),
    ///     ]
    /// };
    /// assert_eq!(is.hit().unwrap().t, 2.0);
    /// ```
    pub fn hit(&self) -> Option<Intersection<'a>> {
        let mut best: Option<Intersection<'a>> = None;

        for i in self.intersections.iter() {
            if !(i.t > 0.0 && i.t.is_finite()) {
                continue;
            }

            match best {
                Some(b) if b.t <= i.t => (),
                _ => best = Some(*i),
            }
        }

        best
    }

    /// Sorts the intersections by `t`.
    ///
    /// The sort is stable, so equal `t`s keep their encounter order.
    pub fn sort(&mut self) {
        self.intersections.sort_by(|a, b|
            a.t.partial_cmp(&b.t).unwrap_or(std::cmp::Ordering::Equal)
        );
    }
}

/// A boolean operation combining two shapes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CsgOperation {
    Union,
    Intersection,
    Difference,
}

impl CsgOperation {
    /// Decides whether an intersection survives the operation.
    ///
    /// `left_hit` is whether the intersection belongs to the left operand,
    /// `in_left` and `in_right` whether the ray is currently inside each
    /// operand.
    ///
    /// ```
    /// # use rayshade::intersect::CsgOperation;
    /// let op = CsgOperation::Union;
    /// assert!(op.intersection_allowed(true, false, false));
    /// assert!(!op.intersection_allowed(true, false, true));
    /// ```
    pub fn intersection_allowed(&self, left_hit: bool, in_left: bool,
        in_right: bool) -> bool {
        match self {
            CsgOperation::Union
                => (left_hit && !in_right) || (!left_hit && !in_left),
            CsgOperation::Intersection
                => (left_hit && in_right) || (!left_hit && in_left),
            CsgOperation::Difference
                => (left_hit && !in_right) || (!left_hit && in_left),
        }
    }
}

/// Filters sorted intersections of a CSG shape's operands.
///
/// Walks the list once, tracking whether the ray is inside the left and right
/// operands. Each intersection is kept or dropped according to `op`, and only
/// then does it toggle the inside flag of the operand it belongs to.
///
/// Membership in the left operand is decided by `Shape::includes`, which
/// recurses through nested groups and CSG shapes.
pub fn filter_intersections<'a>(op: CsgOperation, left: &Shape,
    is: &Intersections<'a>) -> Intersections<'a> {
    let mut in_left = false;
    let mut in_right = false;

    let mut result = Intersections::new();

    for i in is.iter() {
        let left_hit = left.includes(i.what);

        if op.intersection_allowed(left_hit, in_left, in_right) {
            result.push(*i);
        }

        if left_hit {
            in_left = !in_left;
        } else {
            in_right = !in_right;
        }
    }

    result
}

/// The refractive index of the innermost shape a ray is travelling through.
fn medium_index(containers: &[&Shape]) -> f64 {
    containers.last().map_or(VACUUM_RI, |s| s.material.refractive_index)
}

/// A record for computations associated with an `Intersection`.
///
/// Mostly a superset of an `Intersection`.
#[derive(Clone, Debug)]
pub struct IntersectionComputation<'a> {
    /// The "time" of the ray intersection.
    pub t: f64,

    /// The object being intersected.
    pub obj: &'a Shape,

    /// The point where the intersection occurs.
    pub point: Tuple4D,

    /// A point slightly above the intersected surface. Used to prevent an
    /// object from shadowing itself (this causes "acne").
    pub over_point: Tuple4D,

    /// A point slightly below the intersected surface, where refracted rays
    /// start.
    pub under_point: Tuple4D,

    /// The eye vector for the intersection.
    pub eyev: Tuple4D,

    /// The normal vector of the object being intersected.
    pub normalv: Tuple4D,

    /// The intersection ray, reflected across the normal.
    pub reflectv: Tuple4D,

    /// Whether the intersection occurs within the object or not.
    pub inside: bool,

    /// The refractive index of the material being exited.
    pub n1: f64,

    /// The refractive index of the material being entered.
    pub n2: f64,
}

impl<'a> IntersectionComputation<'a> {
    /// Creates a new intersection computation, given a ray and intersection.
    ///
    /// The `is` parameter is the full, sorted list the hit was taken from.
    /// If provided, refraction indices will be calculated; otherwise both are
    /// those of a vacuum.
    pub fn new(r: &Ray4D, hit: &Intersection<'a>,
        is: Option<&Intersections<'a>>) -> Result<IntersectionComputation<'a>> {
        let t = hit.t;
        let obj = hit.what;
        let point = r.position(t);
        let eyev = -r.direction();
        let mut normalv = normal_at(obj, point, hit)?;

        let inside = if normalv.dot(&eyev) < 0.0 {
            normalv = -normalv;
            true
        } else {
            false
        };

        let over_point = point + normalv * FEQ_EPSILON;
        let under_point = point - normalv * FEQ_EPSILON;

        let reflectv = r.direction().reflect(&normalv);
        let (n1, n2) = match is {
            Some(xs) => Self::refraction_indices(hit, xs),
            None => (VACUUM_RI, VACUUM_RI),
        };

        Ok(IntersectionComputation {
            t, obj,
            point, over_point, under_point,
            eyev, normalv, reflectv,
            inside,
            n1, n2,
        })
    }

    /// Finds the indices on either side of the hit surface.
    ///
    /// `containers` holds every shape the ray has entered but not yet left;
    /// the most recent one is the medium the ray is travelling through.
    fn refraction_indices(hit: &Intersection<'a>, is: &Intersections<'a>)
        -> (f64, f64) {
        let mut containers: Vec<&'a Shape> = Vec::new();

        for i in is.iter() {
            let is_hit = i == hit;
            let n1 = medium_index(&containers);

            match containers.iter().position(|&x| std::ptr::eq(x, i.what)) {
                Some(j) => { containers.remove(j); },
                None => containers.push(i.what),
            }

            if is_hit {
                return (n1, medium_index(&containers));
            }
        }

        (VACUUM_RI, VACUUM_RI)
    }

    /// Calculates the reflectance of a hit with Schlick's approximation.
    ///
    /// The reflectance is a number between 0 and 1, representing what fraction
    /// of the light is reflected for the hit. Under total internal reflection
    /// it is exactly 1.
    pub fn schlick(&self) -> f64 {
        let mut cos = self.eyev.dot(&self.normalv);

        // Total internal reflection can only occur if n1 > n2.
        if self.n1 > self.n2 {
            let n = self.n1 / self.n2;
            let sin2_t = n.powi(2) * (1.0 - cos.powi(2));

            if sin2_t > 1.0 {
                return 1.0
            }

            cos = (1.0 - sin2_t).sqrt();
        }

        let r0 = ((self.n1 - self.n2) / (self.n1 + self.n2)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cos).powi(5)
    }
}

#[cfg(test)]
fn ray(origin: Tuple4D, direction: Tuple4D) -> Ray4D {
    Ray4D::new(origin, direction).unwrap()
}

#[cfg(test)]
fn glass_sphere() -> Shape {
    use crate::light::Material;

    Shape::sphere().with_material(Material::glass())
}

#[test]
fn an_intersection_can_encapsulate_u_and_v() {
    let s = Shape::triangle(
        Tuple4D::point(0.0, 1.0, 0.0),
        Tuple4D::point(-1.0, 0.0, 0.0),
        Tuple4D::point(1.0, 0.0, 0.0)
    );

    let i = Intersection::new_uv(3.5, &s, 0.2, 0.4);
    assert_eq!(i.uv, Some((0.2, 0.4)));
    assert_eq!(Intersection::new(3.5, &s).uv, None);
}

#[test]
fn intersections_compare_by_identity() {
    let s1 = Shape::sphere();
    let s2 = Shape::sphere();

    assert_eq!(s1, s2);
    assert_eq!(Intersection::new(1.0, &s1), Intersection::new(1.0, &s1));
    assert_ne!(Intersection::new(1.0, &s1), Intersection::new(1.0, &s2));
}

#[test]
fn hit_with_all_positive() {
    let s  = Shape::sphere();
    let i1 = Intersection::new(1.0, &s);
    let i2 = Intersection::new(2.0, &s);
    let is = Intersections { intersections: vec![i2, i1] };

    assert_eq!(is.hit().unwrap(), i1);
}

#[test]
fn hit_with_some_negative() {
    let s  = Shape::sphere();
    let i1 = Intersection::new(-1.0, &s);
    let i2 = Intersection::new( 1.0, &s);
    let is = Intersections { intersections: vec![i1, i2] };

    assert_eq!(is.hit().unwrap(), i2);
}

#[test]
fn hit_with_all_negative() {
    let s  = Shape::sphere();
    let i1 = Intersection::new(-2.0, &s);
    let i2 = Intersection::new(-1.0, &s);
    let is = Intersections { intersections: vec![i1, i2] };

    assert_eq!(is.hit(), None);
}

#[test]
fn hit_multiple() {
    let s  = Shape::sphere();
    let i1 = Intersection::new(5.0,  &s);
    let i2 = Intersection::new(7.0,  &s);
    let i3 = Intersection::new(-3.0, &s);
    let i4 = Intersection::new(2.0,  &s);
    let is = Intersections { intersections: vec![i1, i2, i3, i4] };

    assert_eq!(is.hit().unwrap(), i4);
}

#[test]
fn hit_ignores_zero_and_infinite_t() {
    let s  = Shape::sphere();
    let is = Intersections {
        intersections: vec![
            Intersection::new(0.0, &s),
            Intersection::new(f64::INFINITY, &s),
            Intersection::new(3.0, &s),
        ]
    };

    assert_eq!(is.hit().unwrap().t, 3.0);
}

#[test]
fn hit_ties_go_to_first_encountered() {
    let s1 = Shape::sphere();
    let s2 = Shape::sphere();
    let is = Intersections {
        intersections: vec![
            Intersection::new(2.0, &s1),
            Intersection::new(2.0, &s2),
        ]
    };

    assert!(std::ptr::eq(is.hit().unwrap().what, &s1));
}

#[test]
fn aggregate_sorts_ascending() {
    let s = Shape::sphere();
    let a = Intersections {
        intersections: vec![Intersection::new(4.0, &s), Intersection::new(1.0, &s)]
    };
    let b = Intersections {
        intersections: vec![Intersection::new(3.0, &s)]
    };

    let all = Intersections::aggregate(vec![a, b]);
    let ts: Vec<f64> = all.iter().map(|i| i.t).collect();
    assert_eq!(ts, vec![1.0, 3.0, 4.0]);
}

#[test]
fn csg_union_truth_table() {
    let op = CsgOperation::Union;
    let table = [
        (true,  true,  true,  false),
        (true,  true,  false, true),
        (true,  false, true,  false),
        (true,  false, false, true),
        (false, true,  true,  false),
        (false, true,  false, false),
        (false, false, true,  true),
        (false, false, false, true),
    ];

    for (lhit, inl, inr, expected) in table.iter() {
        assert_eq!(op.intersection_allowed(*lhit, *inl, *inr), *expected);
    }
}

#[test]
fn csg_intersection_truth_table() {
    let op = CsgOperation::Intersection;
    let table = [
        (true,  true,  true,  true),
        (true,  true,  false, false),
        (true,  false, true,  true),
        (true,  false, false, false),
        (false, true,  true,  true),
        (false, true,  false, true),
        (false, false, true,  false),
        (false, false, false, false),
    ];

    for (lhit, inl, inr, expected) in table.iter() {
        assert_eq!(op.intersection_allowed(*lhit, *inl, *inr), *expected);
    }
}

#[test]
fn csg_difference_truth_table() {
    let op = CsgOperation::Difference;
    let table = [
        (true,  true,  true,  false),
        (true,  true,  false, true),
        (true,  false, true,  false),
        (true,  false, false, true),
        (false, true,  true,  true),
        (false, true,  false, true),
        (false, false, true,  false),
        (false, false, false, false),
    ];

    for (lhit, inl, inr, expected) in table.iter() {
        assert_eq!(op.intersection_allowed(*lhit, *inl, *inr), *expected);
    }
}

#[test]
fn filtering_a_list_of_intersections() {
    let cases = [
        (CsgOperation::Union, 0, 3),
        (CsgOperation::Intersection, 1, 2),
        (CsgOperation::Difference, 0, 1),
    ];

    for (op, x0, x1) in cases.iter() {
        let c = Shape::csg(*op, Shape::sphere(), Shape::cube());
        let s1 = c.csg_left().unwrap();
        let s2 = c.csg_right().unwrap();

        let xs = Intersections {
            intersections: vec![
                Intersection::new(1.0, s1),
                Intersection::new(2.0, s2),
                Intersection::new(3.0, s1),
                Intersection::new(4.0, s2),
            ]
        };

        let result = filter_intersections(*op, s1, &xs);
        assert_eq!(result.len(), 2);
        assert_eq!(result.intersections[0], xs.intersections[*x0]);
        assert_eq!(result.intersections[1], xs.intersections[*x1]);
    }
}

#[test]
fn filtering_recurses_into_nested_groups() {
    let mut g = Shape::group();
    g.add_child(Shape::sphere()).unwrap();
    let c = Shape::csg_difference(g, Shape::cube());

    let inner = &c.csg_left().unwrap().children().unwrap()[0];
    let right = c.csg_right().unwrap();

    let xs = Intersections {
        intersections: vec![
            Intersection::new(1.0, inner),
            Intersection::new(2.0, right),
            Intersection::new(3.0, inner),
            Intersection::new(4.0, right),
        ]
    };

    let result = filter_intersections(CsgOperation::Difference,
        c.csg_left().unwrap(), &xs);
    let ts: Vec<f64> = result.iter().map(|i| i.t).collect();
    assert_eq!(ts, vec![1.0, 2.0]);
}

#[test]
fn precompute_intersection_state() {
    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let shape = Shape::sphere();
    let i = Intersection::new(4.0, &shape);

    let comps = IntersectionComputation::new(&r, &i, None).unwrap();

    assert!(std::ptr::eq(comps.obj, i.what));
    assert_eq!(comps.t, i.t);
    assert_eq!(comps.point, Tuple4D::point(0.0, 0.0, -1.0));
    assert_eq!(comps.eyev, Tuple4D::vector(0.0, 0.0, -1.0));
    assert_eq!(comps.normalv, Tuple4D::vector(0.0, 0.0, -1.0));
    assert!(!comps.inside);
}

#[test]
fn precompute_inside_intersection() {
    let r = ray(Tuple4D::point(0.0, 0.0, 0.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let shape = Shape::sphere();
    let i = Intersection::new(1.0, &shape);

    let comps = IntersectionComputation::new(&r, &i, None).unwrap();

    assert!(comps.inside);
    assert_eq!(comps.point, Tuple4D::point(0.0, 0.0, 1.0));
    assert_eq!(comps.eyev, Tuple4D::vector(0.0, 0.0, -1.0));
    assert_eq!(comps.normalv, Tuple4D::vector(0.0, 0.0, -1.0));
}

#[test]
fn hit_should_offset_point() {
    use crate::matrix::Matrix4D;

    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let shape = Shape::sphere()
        .with_transform(Matrix4D::translation(0.0, 0.0, 1.0)).unwrap();

    let i = Intersection::new(5.0, &shape);
    let comps = IntersectionComputation::new(&r, &i, None).unwrap();

    assert!(comps.over_point.z < -FEQ_EPSILON / 2.0);
    assert!(comps.point.z > comps.over_point.z);
}

#[test]
fn under_point_is_below_the_surface() {
    use crate::matrix::Matrix4D;

    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let shape = glass_sphere()
        .with_transform(Matrix4D::translation(0.0, 0.0, 1.0)).unwrap();

    let i = Intersection::new(5.0, &shape);
    let xs = Intersections { intersections: vec![i] };
    let comps = IntersectionComputation::new(&r, &i, Some(&xs)).unwrap();

    assert!(comps.under_point.z > FEQ_EPSILON / 2.0);
    assert!(comps.point.z < comps.under_point.z);
}

#[test]
fn precompute_reflection_vector() {
    let shape = Shape::plane();
    let h = 2.0f64.sqrt() / 2.0;
    let r = ray(Tuple4D::point(0.0, 1.0, -1.0), Tuple4D::vector(0.0, -h, h));
    let i = Intersection::new(2.0f64.sqrt(), &shape);

    let comps = IntersectionComputation::new(&r, &i, None).unwrap();
    assert_eq!(comps.reflectv, Tuple4D::vector(0.0, h, h));
}

#[test]
fn finding_n1_and_n2_at_various_intersections() {
    use crate::matrix::Matrix4D;

    let mut a = glass_sphere()
        .with_transform(Matrix4D::scaling(2.0, 2.0, 2.0)).unwrap();
    a.material.refractive_index = 1.5;

    let mut b = glass_sphere()
        .with_transform(Matrix4D::translation(0.0, 0.0, -0.25)).unwrap();
    b.material.refractive_index = 2.0;

    let mut c = glass_sphere()
        .with_transform(Matrix4D::translation(0.0, 0.0, 0.25)).unwrap();
    c.material.refractive_index = 2.5;

    let r = ray(Tuple4D::point(0.0, 0.0, -4.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let xs = Intersections {
        intersections: vec![
            Intersection::new(2.0, &a),
            Intersection::new(2.75, &b),
            Intersection::new(3.25, &c),
            Intersection::new(4.75, &b),
            Intersection::new(5.25, &c),
            Intersection::new(6.0, &a),
        ]
    };

    let expected = [
        (1.0, 1.5), (1.5, 2.0), (2.0, 2.5), (2.5, 2.5), (2.5, 1.5), (1.5, 1.0),
    ];

    for (i, (n1, n2)) in xs.iter().zip(expected.iter()) {
        let comps = IntersectionComputation::new(&r, i, Some(&xs)).unwrap();
        assert_eq!(comps.n1, *n1);
        assert_eq!(comps.n2, *n2);
    }
}

#[test]
fn schlick_under_total_internal_reflection() {
    let shape = glass_sphere();
    let h = 2.0f64.sqrt() / 2.0;
    let r = ray(Tuple4D::point(0.0, 0.0, h), Tuple4D::vector(0.0, 1.0, 0.0));
    let xs = Intersections {
        intersections: vec![
            Intersection::new(-h, &shape),
            Intersection::new(h, &shape),
        ]
    };

    let comps = IntersectionComputation::new(&r, &xs.intersections[1], Some(&xs))
        .unwrap();
    assert_eq!(comps.schlick(), 1.0);
}

#[test]
fn schlick_with_perpendicular_viewing_angle() {
    use crate::feq;

    let shape = glass_sphere();
    let r = ray(Tuple4D::point(0.0, 0.0, 0.0), Tuple4D::vector(0.0, 1.0, 0.0));
    let xs = Intersections {
        intersections: vec![
            Intersection::new(-1.0, &shape),
            Intersection::new(1.0, &shape),
        ]
    };

    let comps = IntersectionComputation::new(&r, &xs.intersections[1], Some(&xs))
        .unwrap();
    assert!(feq(comps.schlick(), 0.04));
}

#[test]
fn schlick_with_small_angle_and_n2_greater_than_n1() {
    use crate::feq;

    let shape = glass_sphere();
    let r = ray(Tuple4D::point(0.0, 0.99, -2.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let xs = Intersections {
        intersections: vec![Intersection::new(1.8589, &shape)]
    };

    let comps = IntersectionComputation::new(&r, &xs.intersections[0], Some(&xs))
        .unwrap();
    assert!(feq(comps.schlick(), 0.48873));
}
