use crate::consts::FEQ_EPSILON;
use crate::tuple::Tuple4D;
use crate::ray::Ray4D;
use crate::light::Material;
use crate::matrix::Matrix4D;
use crate::error::{ RayTracerError, Result };
use crate::intersect::{
    CsgOperation, Intersection, Intersections, filter_intersections
};
use crate::geometry::{ TriangleInfo, SmoothTriangleInfo, Bounds };

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeType {
    /// A unit sphere with its center at the object-space origin.
    Sphere,

    /// The plane `y = 0`, stretching indefinitely along X and Z.
    Plane,

    /// A 2-by-2-by-2 cube with its center at the object-space origin.
    Cube,

    /// A unit-radius cylinder along Y. Minimum Y, maximum Y and whether the
    /// cylinder is closed.
    Cylinder(f64, f64, bool),

    /// A double-napped cone along Y. Minimum Y, maximum Y and whether the
    /// cone is closed.
    Cone(f64, f64, bool),

    /// A triangle. See TriangleInfo for further explanation.
    Triangle(TriangleInfo),

    /// A smooth triangle. See SmoothTriangleInfo for further explanation.
    SmoothTriangle(SmoothTriangleInfo),

    /// A group of shapes. Can include other groups of shapes.
    Group(Vec<Shape>),

    /// A boolean combination of a left and a right shape.
    Csg(CsgOperation, Box<Shape>, Box<Shape>),
}

/// A shape in a scene.
///
/// Every shape owns its local `transform` and a `Material`. Composite shapes
/// (groups and CSG operations) own their children outright; a child never
/// points back at its parent. Instead, the product of every enclosing
/// transform is pushed down into each child when it is inserted, so that the
/// cumulative world-to-object inverse is always cached:
///
/// ```text
/// Group(transform: A)
///     > Group(transform: B, parent: A)
///         > Cube(transform: C, parent: AB)
/// ```
///
/// Where `>` can be read as "parent of." Converting a world point into the
/// cube's object space is then a single multiply by `(ABC)^-1`.
///
/// Because children are moved into their parent, a group can never be
/// inserted into its own subtree.
#[derive(Debug, Clone)]
pub struct Shape {
    ty: ShapeType,
    pub material: Material,

    transform: Matrix4D,
    inverse: Matrix4D,

    parent_transform: Matrix4D,
    parent_inverse: Matrix4D,
    world_inverse: Matrix4D,

    bounds: Bounds,
}

/// Checks that two Shapes are equal.
///
/// Enclosing transforms are not compared; two equivalent shapes can live in
/// different groups. Use `std::ptr::eq` to test for the *same* shape.
impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty
            && self.transform == other.transform
            && self.material == other.material
    }
}

impl Shape {
    fn from_type(ty: ShapeType) -> Shape {
        let mut shape = Shape {
            ty,
            material: Default::default(),
            transform: Matrix4D::identity(),
            inverse: Matrix4D::identity(),
            parent_transform: Matrix4D::identity(),
            parent_inverse: Matrix4D::identity(),
            world_inverse: Matrix4D::identity(),
            bounds: Bounds::empty(),
        };

        shape.bounds = shape.compute_bounds();
        shape
    }

    /// Creates a unit sphere with identity transform and default material.
    ///
    /// ```
    /// # use rayshade::shape::{ Shape, intersect };
    /// # use rayshade::tuple::Tuple4D;
    /// # use rayshade::ray::Ray4D;
    /// let s = Shape::sphere();
    /// let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0),
    ///                    Tuple4D::vector(0.0, 0.0, 1.0)).unwrap();
    /// let xs = intersect(&s, &r);
    /// assert_eq!(xs.len(), 2);
    /// assert_eq!(xs.intersections[0].t, 4.0);
    /// assert_eq!(xs.intersections[1].t, 6.0);
    /// ```
    pub fn sphere() -> Shape {
        Shape::from_type(ShapeType::Sphere)
    }

    /// Creates a plane with a normal pointing up along the Y axis.
    pub fn plane() -> Shape {
        Shape::from_type(ShapeType::Plane)
    }

    /// Creates a cube spanning -1 to 1 on every axis.
    pub fn cube() -> Shape {
        Shape::from_type(ShapeType::Cube)
    }

    /// Creates an infinitely long cylinder with no end caps.
    pub fn cylinder() -> Shape {
        Shape::from_type(
            ShapeType::Cylinder(-f64::INFINITY, f64::INFINITY, false)
        )
    }

    /// Creates a bounded cylinder without caps.
    pub fn bounded_cylinder(minimum: f64, maximum: f64) -> Shape {
        Shape::from_type(ShapeType::Cylinder(minimum, maximum, false))
    }

    /// Creates a bounded cylinder with caps.
    pub fn capped_cylinder(minimum: f64, maximum: f64) -> Shape {
        Shape::from_type(ShapeType::Cylinder(minimum, maximum, true))
    }

    /// Creates an infinite double-napped cone.
    pub fn cone() -> Shape {
        Shape::from_type(ShapeType::Cone(-f64::INFINITY, f64::INFINITY, false))
    }

    /// Creates a bounded double-napped cone with no end caps.
    pub fn bounded_cone(minimum: f64, maximum: f64) -> Shape {
        Shape::from_type(ShapeType::Cone(minimum, maximum, false))
    }

    /// Creates a bounded double-napped cone with end caps.
    pub fn capped_cone(minimum: f64, maximum: f64) -> Shape {
        Shape::from_type(ShapeType::Cone(minimum, maximum, true))
    }

    /// Creates a triangle, defined by three points in space.
    pub fn triangle(p1: Tuple4D, p2: Tuple4D, p3: Tuple4D) -> Shape {
        Shape::from_type(ShapeType::Triangle(TriangleInfo::new(p1, p2, p3)))
    }

    /// Creates a "smooth" triangle with normals at each vertex.
    pub fn smooth_triangle(p1: Tuple4D, p2: Tuple4D, p3: Tuple4D,
        n1: Tuple4D, n2: Tuple4D, n3: Tuple4D) -> Shape {
        Shape::from_type(ShapeType::SmoothTriangle(
            SmoothTriangleInfo::new(p1, p2, p3, n1, n2, n3)
        ))
    }

    /// Creates an empty group, which holds a list of other shapes.
    pub fn group() -> Shape {
        Shape::from_type(ShapeType::Group(Vec::new()))
    }

    /// Combines two shapes with a CSG operation.
    pub fn csg(op: CsgOperation, left: Shape, right: Shape) -> Shape {
        let mut csg = Shape::from_type(
            ShapeType::Csg(op, Box::new(left), Box::new(right))
        );

        csg.propagate(Matrix4D::identity(), Matrix4D::identity());
        csg
    }

    pub fn csg_union(left: Shape, right: Shape) -> Shape {
        Shape::csg(CsgOperation::Union, left, right)
    }

    pub fn csg_intersection(left: Shape, right: Shape) -> Shape {
        Shape::csg(CsgOperation::Intersection, left, right)
    }

    pub fn csg_difference(left: Shape, right: Shape) -> Shape {
        Shape::csg(CsgOperation::Difference, left, right)
    }

    pub fn ty(&self) -> &ShapeType {
        &self.ty
    }

    /// Returns a reference to the Shape transform.
    pub fn transform(&self) -> &Matrix4D {
        &self.transform
    }

    /// Sets the transform of a Shape.
    ///
    /// Fails with `SingularMatrix` if the transform cannot be inverted. If
    /// the shape is a group or CSG operation, the new transform is pushed
    /// down to every descendant.
    pub fn set_transform(&mut self, transform: Matrix4D) -> Result<()> {
        let inverse = transform.inverse()?;
        self.apply_transform(transform, inverse);

        Ok(())
    }

    /// Builder form of `set_transform`.
    pub fn with_transform(mut self, transform: Matrix4D) -> Result<Shape> {
        self.set_transform(transform)?;
        Ok(self)
    }

    /// Builder for a transform whose inverse is known up front.
    ///
    /// `inverse` must be the inverse of `transform`.
    pub(crate) fn with_inverted_transform(mut self, transform: Matrix4D,
        inverse: Matrix4D) -> Shape {
        self.apply_transform(transform, inverse);
        self
    }

    fn apply_transform(&mut self, transform: Matrix4D, inverse: Matrix4D) {
        self.inverse = inverse;
        self.transform = transform;

        let (parent_transform, parent_inverse)
            = (self.parent_transform, self.parent_inverse);
        self.propagate(parent_transform, parent_inverse);
    }

    /// Sets the material of a Shape and of every shape it contains.
    pub fn set_material(&mut self, material: Material) {
        self.material = material;

        match self.ty {
            ShapeType::Group(ref mut children) => {
                for child in children.iter_mut() {
                    child.set_material(material);
                }
            },
            ShapeType::Csg(_, ref mut left, ref mut right) => {
                left.set_material(material);
                right.set_material(material);
            },
            _ => (),
        }
    }

    /// Builder form of `set_material`.
    pub fn with_material(mut self, material: Material) -> Shape {
        self.set_material(material);
        self
    }

    /// Pushes the enclosing transforms down through this shape's subtree.
    ///
    /// `parent_transform` is the product of every enclosing transform, and
    /// `parent_inverse` is its inverse.
    fn propagate(&mut self, parent_transform: Matrix4D,
        parent_inverse: Matrix4D) {
        self.parent_transform = parent_transform;
        self.parent_inverse = parent_inverse;
        self.world_inverse = self.inverse * parent_inverse;

        let to_transform = parent_transform * self.transform;
        let to_inverse = self.world_inverse;

        match self.ty {
            ShapeType::Group(ref mut children) => {
                for child in children.iter_mut() {
                    child.propagate(to_transform, to_inverse);
                }
            },
            ShapeType::Csg(_, ref mut left, ref mut right) => {
                left.propagate(to_transform, to_inverse);
                right.propagate(to_transform, to_inverse);
            },
            _ => (),
        }
    }

    /// Adds a child to a group, growing the group's bounds.
    ///
    /// Fails with `NotAGroup` on any other shape.
    pub fn add_child(&mut self, mut child: Shape) -> Result<()> {
        let to_transform = self.parent_transform * self.transform;
        let to_inverse = self.world_inverse;

        match self.ty {
            ShapeType::Group(ref mut children) => {
                child.propagate(to_transform, to_inverse);
                self.bounds.merge(&child.parent_space_bounds());
                children.push(child);

                Ok(())
            },
            _ => Err(RayTracerError::NotAGroup),
        }
    }

    /// Returns the children of a group.
    pub fn children(&self) -> Option<&[Shape]> {
        match self.ty {
            ShapeType::Group(ref children) => Some(children),
            _ => None,
        }
    }

    /// Gets the operation of a CSG shape.
    pub fn csg_operation(&self) -> Option<CsgOperation> {
        match self.ty {
            ShapeType::Csg(op, _, _) => Some(op),
            _ => None,
        }
    }

    /// Gets the left operand of a CSG shape.
    pub fn csg_left(&self) -> Option<&Shape> {
        match self.ty {
            ShapeType::Csg(_, ref left, _) => Some(left),
            _ => None,
        }
    }

    /// Gets the right operand of a CSG shape.
    pub fn csg_right(&self) -> Option<&Shape> {
        match self.ty {
            ShapeType::Csg(_, _, ref right) => Some(right),
            _ => None,
        }
    }

    /// Deduces whether a shape includes another shape.
    ///
    /// Groups include a shape if any child does; CSG shapes include it if
    /// either operand does. Any other shape only includes *itself*; this is
    /// an identity check, not a value comparison.
    pub fn includes(&self, other: &Shape) -> bool {
        match self.ty {
            ShapeType::Group(ref children)
                => children.iter().any(|c| c.includes(other)),
            ShapeType::Csg(_, ref left, ref right)
                => left.includes(other) || right.includes(other),
            _ => std::ptr::eq(self, other),
        }
    }

    /// The bounds of this shape in its own object space.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// The bounds of this shape in its parent's space.
    pub fn parent_space_bounds(&self) -> Bounds {
        self.bounds.transform(&self.transform)
    }

    fn compute_bounds(&self) -> Bounds {
        let inf = f64::INFINITY;

        match self.ty {
            ShapeType::Sphere | ShapeType::Cube
                => Bounds::new(-1.0, -1.0, -1.0, 1.0, 1.0, 1.0),
            ShapeType::Plane => Bounds::new(-inf, 0.0, -inf, inf, 0.0, inf),
            ShapeType::Cylinder(min, max, _)
                => Bounds::new(-1.0, min, -1.0, 1.0, max, 1.0),
            ShapeType::Cone(min, max, _) => {
                let r = min.abs().max(max.abs());
                Bounds::new(-r, min, -r, r, max, r)
            },
            ShapeType::Triangle(ref ti) => ti.bounds(),
            ShapeType::SmoothTriangle(ref sti) => sti.triangle_info.bounds(),
            ShapeType::Group(ref children) => {
                let mut bounds = Bounds::empty();
                for child in children.iter() {
                    bounds.merge(&child.parent_space_bounds());
                }

                bounds
            },
            ShapeType::Csg(_, ref left, ref right) => {
                let mut bounds = left.parent_space_bounds();
                bounds.merge(&right.parent_space_bounds());
                bounds
            },
        }
    }

    /// Converts a point from world to object space.
    ///
    /// The cached cumulative inverse brings the point from world space,
    /// through every enclosing group, to this shape's object space.
    pub fn world_to_object(&self, point: Tuple4D) -> Tuple4D {
        self.world_inverse * point
    }

    /// Converts a normal from object to world space.
    ///
    /// Uses the inverse-transpose of the cumulative transform. The `w`
    /// component is zeroed so that translations don't leak into the normal.
    pub fn normal_to_world(&self, normal: Tuple4D) -> Tuple4D {
        let mut normal = self.world_inverse.transposition() * normal;
        normal.w = 0.0;
        normal.normalize()
    }

    /// Intersect a ray, already in object space, with a Shape.
    pub fn local_intersect<'a>(&'a self, ray: &Ray4D) -> Intersections<'a> {
        match self.ty {
            ShapeType::Sphere => self.intersect_sphere(ray),
            ShapeType::Plane => self.intersect_plane(ray),
            ShapeType::Cube => self.intersect_cube(ray),
            ShapeType::Cylinder(min, max, closed)
                => self.intersect_cylinder(ray, min, max, closed),
            ShapeType::Cone(min, max, closed)
                => self.intersect_cone(ray, min, max, closed),
            ShapeType::Triangle(ref ti)
                => self.intersect_triangle(ray, ti),
            ShapeType::SmoothTriangle(ref sti)
                => self.intersect_triangle(ray, &sti.triangle_info),
            ShapeType::Group(ref children)
                => self.intersect_group(ray, children),
            ShapeType::Csg(op, ref left, ref right)
                => self.intersect_csg(ray, op, left, right),
        }
    }

    /// Obtain the normal vector of a Shape at a point in object space.
    ///
    /// Groups and CSG shapes have no surface of their own and fail with
    /// `NoLocalNormal`; their children are always hit instead.
    pub fn local_normal_at(&self, at: &Tuple4D, hit: &Intersection<'_>)
        -> Result<Tuple4D> {
        let normal = match self.ty {
            ShapeType::Sphere => Tuple4D { w: 0.0, ..*at },
            ShapeType::Plane => Tuple4D::vector(0.0, 1.0, 0.0),
            ShapeType::Cube => Self::normal_at_cube(at),
            ShapeType::Cylinder(min, max, _)
                => Self::normal_at_cylinder(at, min, max),
            ShapeType::Cone(min, max, _)
                => Self::normal_at_cone(at, min, max),
            ShapeType::Triangle(ref ti) => ti.normal,
            ShapeType::SmoothTriangle(ref sti) => match hit.uv {
                Some((u, v)) => sti.interpolate(u, v),
                None => sti.triangle_info.normal,
            },
            ShapeType::Group(_) | ShapeType::Csg(_, _, _)
                => return Err(RayTracerError::NoLocalNormal),
        };

        Ok(normal)
    }

    /// Checks whether a ray intersects a Sphere.
    ///
    /// Returns either nothing or two intersections in ascending order. A
    /// tangent ray yields two equal intersections.
    fn intersect_sphere<'a>(&'a self, ray: &Ray4D) -> Intersections<'a> {
        // Sphere is centered at object-space origin.
        let sphere_to_ray = ray.origin - Tuple4D::point(0.0, 0.0, 0.0);

        let a = ray.direction.dot(&ray.direction);
        let b = 2.0 * ray.direction.dot(&sphere_to_ray);
        let c = sphere_to_ray.dot(&sphere_to_ray) - 1.0;

        let discriminant = b.powi(2) - (4.0 * a * c);

        if discriminant < 0.0 {
            return Intersections::new()
        }

        let t1 = (-b - discriminant.sqrt()) / (2.0 * a);
        let t2 = (-b + discriminant.sqrt()) / (2.0 * a);

        Intersections {
            intersections: vec![
                Intersection::new(t1, self),
                Intersection::new(t2, self),
            ]
        }
    }

    fn intersect_plane<'a>(&'a self, ray: &Ray4D) -> Intersections<'a> {
        // Without a Y component, the ray is parallel and never crosses.
        if ray.direction.y.abs() < FEQ_EPSILON {
            return Intersections::new();
        }

        let t = -ray.origin.y / ray.direction.y;
        Intersections { intersections: vec![Intersection::new(t, self)] }
    }

    fn intersect_cube<'a>(&'a self, ray: &Ray4D) -> Intersections<'a> {
        let (xtmin, xtmax) = Bounds::check_axis(
            -1.0, 1.0, ray.origin.x, ray.direction.x
        );
        let (ytmin, ytmax) = Bounds::check_axis(
            -1.0, 1.0, ray.origin.y, ray.direction.y
        );
        let (ztmin, ztmax) = Bounds::check_axis(
            -1.0, 1.0, ray.origin.z, ray.direction.z
        );

        let tmin = xtmin.max(ytmin).max(ztmin);
        let tmax = xtmax.min(ytmax).min(ztmax);

        if tmin > tmax {
            return Intersections::new()
        }

        Intersections {
            intersections: vec![
                Intersection::new(tmin, self),
                Intersection::new(tmax, self),
            ]
        }
    }

    fn normal_at_cube(p: &Tuple4D) -> Tuple4D {
        let xa = p.x.abs();
        let ya = p.y.abs();
        let za = p.z.abs();

        let max_component = xa.max(ya).max(za);
        if max_component == xa {
            Tuple4D::vector(p.x, 0.0, 0.0)
        } else if max_component == ya {
            Tuple4D::vector(0.0, p.y, 0.0)
        } else {
            Tuple4D::vector(0.0, 0.0, p.z)
        }
    }

    /// Keeps the quadratic roots `t0` and `t1` whose Y lies strictly between
    /// `minimum` and `maximum`.
    fn push_wall_hits<'a>(&'a self, ray: &Ray4D, roots: (f64, f64),
        minimum: f64, maximum: f64, is: &mut Intersections<'a>) {
        let (mut t0, mut t1) = roots;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }

        for t in [t0, t1].iter() {
            let y = ray.origin.y + t * ray.direction.y;
            if minimum < y && y < maximum {
                is.push(Intersection::new(*t, self));
            }
        }
    }

    fn intersect_cylinder<'a>(&'a self, ray: &Ray4D, minimum: f64,
        maximum: f64, closed: bool) -> Intersections<'a> {
        let mut is = Intersections::new();
        let a = ray.direction.x.powi(2) + ray.direction.z.powi(2);

        // A ray parallel to the Y axis can only hit the caps.
        if a >= FEQ_EPSILON {
            let b = 2.0 * ray.origin.x * ray.direction.x
                  + 2.0 * ray.origin.z * ray.direction.z;
            let c = ray.origin.x.powi(2) + ray.origin.z.powi(2) - 1.0;
            let disc = b.powi(2) - 4.0 * a * c;

            if disc < 0.0 {
                return is;
            }

            let roots = (
                (-b - disc.sqrt()) / (2.0 * a),
                (-b + disc.sqrt()) / (2.0 * a),
            );
            self.push_wall_hits(ray, roots, minimum, maximum, &mut is);
        }

        if closed {
            self.intersect_caps(ray, minimum, maximum, 1.0, 1.0, &mut is);
        }

        is.sort();
        is
    }

    fn normal_at_cylinder(at: &Tuple4D, minimum: f64, maximum: f64)
        -> Tuple4D {
        // Square of the distance from the Y axis.
        let dist = at.x.powi(2) + at.z.powi(2);

        if dist < 1.0 && at.y >= maximum - FEQ_EPSILON {
            Tuple4D::vector(0.0, 1.0, 0.0)
        } else if dist < 1.0 && at.y <= minimum + FEQ_EPSILON {
            Tuple4D::vector(0.0, -1.0, 0.0)
        } else {
            Tuple4D::vector(at.x, 0.0, at.z)
        }
    }

    fn intersect_cone<'a>(&'a self, ray: &Ray4D, minimum: f64,
        maximum: f64, closed: bool) -> Intersections<'a> {
        let mut is = Intersections::new();

        let a = ray.direction.x.powi(2)
              - ray.direction.y.powi(2)
              + ray.direction.z.powi(2);

        let b = 2.0 * ray.origin.x * ray.direction.x
              - 2.0 * ray.origin.y * ray.direction.y
              + 2.0 * ray.origin.z * ray.direction.z;

        let c = ray.origin.x.powi(2)
              - ray.origin.y.powi(2)
              + ray.origin.z.powi(2);

        if a.abs() < FEQ_EPSILON {
            // Parallel to one of the cone's halves: a single wall hit, or
            // none at all when b is zero too.
            if b.abs() >= FEQ_EPSILON {
                let t = -c / (2.0 * b);
                let y = ray.origin.y + t * ray.direction.y;
                if minimum < y && y < maximum {
                    is.push(Intersection::new(t, self));
                }
            }
        } else {
            let disc = b.powi(2) - 4.0 * a * c;
            if disc < 0.0 {
                return is;
            }

            let roots = (
                (-b - disc.sqrt()) / (2.0 * a),
                (-b + disc.sqrt()) / (2.0 * a),
            );
            self.push_wall_hits(ray, roots, minimum, maximum, &mut is);
        }

        if closed {
            self.intersect_caps(ray, minimum, maximum,
                minimum.abs(), maximum.abs(), &mut is);
        }

        is.sort();
        is
    }

    fn normal_at_cone(at: &Tuple4D, minimum: f64, maximum: f64) -> Tuple4D {
        let dist = at.x.powi(2) + at.z.powi(2);

        if dist < maximum.powi(2) && at.y >= maximum - FEQ_EPSILON {
            Tuple4D::vector(0.0, 1.0, 0.0)
        } else if dist < minimum.powi(2) && at.y <= minimum + FEQ_EPSILON {
            Tuple4D::vector(0.0, -1.0, 0.0)
        } else {
            let mut y = dist.sqrt();
            if at.y > 0.0 {
                y = -y;
            }

            Tuple4D::vector(at.x, y, at.z)
        }
    }

    /// Intersects the end caps at `y = minimum` and `y = maximum`, which
    /// have radii `min_radius` and `max_radius` respectively.
    fn intersect_caps<'a>(&'a self, ray: &Ray4D, minimum: f64, maximum: f64,
        min_radius: f64, max_radius: f64, is: &mut Intersections<'a>) {
        // A ray with no Y component never reaches a cap.
        if ray.direction.y.abs() < FEQ_EPSILON {
            return;
        }

        let caps = [(minimum, min_radius), (maximum, max_radius)];
        for (y, radius) in caps.iter() {
            let t = (y - ray.origin.y) / ray.direction.y;
            let x = ray.origin.x + t * ray.direction.x;
            let z = ray.origin.z + t * ray.direction.z;

            if x.powi(2) + z.powi(2) <= radius.powi(2) {
                is.push(Intersection::new(t, self));
            }
        }
    }

    /// Moller-Trumbore intersection, shared by flat and smooth triangles.
    ///
    /// Triangles are hit from either side; the barycentric `(u, v)` of the
    /// hit is always recorded.
    fn intersect_triangle<'a>(&'a self, ray: &Ray4D, ti: &TriangleInfo)
        -> Intersections<'a> {
        let dir_cross_e2 = ray.direction.cross(&ti.e2);
        let determinant = ti.e1.dot(&dir_cross_e2);

        // Parallel to the triangle's plane.
        if determinant.abs() < FEQ_EPSILON {
            return Intersections::new();
        }

        let f = 1.0 / determinant;
        let p1_to_origin = ray.origin - ti.p1;
        let u = f * p1_to_origin.dot(&dir_cross_e2);
        if !(0.0..=1.0).contains(&u) {
            return Intersections::new();
        }

        let origin_cross_e1 = p1_to_origin.cross(&ti.e1);
        let v = f * ray.direction.dot(&origin_cross_e1);
        if v < 0.0 || u + v > 1.0 {
            return Intersections::new();
        }

        let t = f * ti.e2.dot(&origin_cross_e1);
        Intersections {
            intersections: vec![Intersection::new_uv(t, self, u, v)],
        }
    }

    fn intersect_group<'a>(&'a self, ray: &Ray4D, children: &'a [Shape])
        -> Intersections<'a> {
        // Nothing inside can be hit if the bounding box is missed.
        if !self.bounds.intersects(ray) {
            return Intersections::new()
        }

        Intersections::aggregate(
            children.iter().map(|child| intersect(child, ray)).collect()
        )
    }

    fn intersect_csg<'a>(&'a self, ray: &Ray4D, op: CsgOperation,
        left: &'a Shape, right: &'a Shape) -> Intersections<'a> {
        if !self.bounds.intersects(ray) {
            return Intersections::new()
        }

        let all = Intersections::aggregate(
            vec![intersect(left, ray), intersect(right, ray)]
        );

        filter_intersections(op, left, &all)
    }
}

/// Intersects a world-space ray with a `Shape`.
///
/// Each shape implements only `local_intersect`, which works in object
/// space. This function converts the ray with the inverse of the shape's own
/// transform first; groups call it for every child, so nested transforms are
/// applied innermost first.
///
/// Results are sorted ascending by `t` for every shape type.
pub fn intersect<'a>(s: &'a Shape, r: &Ray4D) -> Intersections<'a> {
    let transformed_ray = r.transform(&s.inverse);
    s.local_intersect(&transformed_ray)
}

/// Finds the world-space normal of a shape at a world-space point.
///
/// Fails with `NoLocalNormal` if `s` is a group or CSG shape.
pub fn normal_at(s: &Shape, world_point: Tuple4D, hit: &Intersection<'_>)
    -> Result<Tuple4D> {
    let local_point = s.world_to_object(world_point);
    let local_normal = s.local_normal_at(&local_point, hit)?;
    Ok(s.normal_to_world(local_normal))
}

#[cfg(test)]
fn ray(origin: Tuple4D, direction: Tuple4D) -> Ray4D {
    Ray4D::new(origin, direction).unwrap()
}

#[test]
fn sphere_default_transform_and_transform_changes() {
    let mut s = Shape::sphere();
    assert_eq!(*s.transform(), Matrix4D::identity());

    let t = Matrix4D::translation(2.0, 3.0, 4.0);
    s.set_transform(t).unwrap();
    assert_eq!(*s.transform(), t);

    let singular = Matrix4D::scaling(0.0, 1.0, 1.0);
    assert!(matches!(s.set_transform(singular),
        Err(RayTracerError::SingularMatrix)));
    assert_eq!(*s.transform(), t);
}

#[test]
fn ray_pierces_sphere() {
    let s = Shape::sphere();
    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let xs = intersect(&s, &r);

    assert_eq!(xs.len(), 2);
    assert_eq!(xs.intersections[0].t, 4.0);
    assert_eq!(xs.intersections[1].t, 6.0);
    assert!(std::ptr::eq(xs.intersections[0].what, &s));
}

#[test]
fn ray_is_tangent_to_sphere() {
    let s = Shape::sphere();
    let r = ray(Tuple4D::point(0.0, 1.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let xs = intersect(&s, &r);

    assert_eq!(xs.len(), 2);
    assert_eq!(xs.intersections[0].t, 5.0);
    assert_eq!(xs.intersections[1].t, 5.0);
}

#[test]
fn ray_misses_sphere() {
    let s = Shape::sphere();
    let r = ray(Tuple4D::point(0.0, 2.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));

    assert!(intersect(&s, &r).is_empty());
}

#[test]
fn ray_is_inside_sphere() {
    let s = Shape::sphere();
    let r = ray(Tuple4D::point(0.0, 0.0, 0.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let xs = s.local_intersect(&r);

    assert_eq!(xs.len(), 2);
    assert_eq!(xs.intersections[0].t, -1.0);
    assert_eq!(xs.intersections[1].t, 1.0);
}

#[test]
fn sphere_is_behind_ray() {
    let s = Shape::sphere();
    let r = ray(Tuple4D::point(0.0, 0.0, 5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let xs = intersect(&s, &r);

    assert_eq!(xs.len(), 2);
    assert_eq!(xs.intersections[0].t, -6.0);
    assert_eq!(xs.intersections[1].t, -4.0);
}

#[test]
fn ray_hits_scaled_sphere() {
    let s = Shape::sphere()
        .with_transform(Matrix4D::scaling(2.0, 2.0, 2.0)).unwrap();
    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let xs = intersect(&s, &r);

    assert_eq!(xs.len(), 2);
    assert_eq!(xs.intersections[0].t, 3.0);
    assert_eq!(xs.intersections[1].t, 7.0);
}

#[test]
fn ray_misses_translated_sphere() {
    let s = Shape::sphere()
        .with_transform(Matrix4D::translation(5.0, 0.0, 0.0)).unwrap();
    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));

    assert!(intersect(&s, &r).is_empty());
}

#[test]
fn normals_on_sphere() {
    let s = Shape::sphere();
    let i = Intersection::new(0.0, &s);
    let k = 3.0f64.sqrt() / 3.0;

    assert_eq!(normal_at(&s, Tuple4D::point(1.0, 0.0, 0.0), &i).unwrap(),
        Tuple4D::vector(1.0, 0.0, 0.0));
    assert_eq!(normal_at(&s, Tuple4D::point(0.0, 1.0, 0.0), &i).unwrap(),
        Tuple4D::vector(0.0, 1.0, 0.0));
    assert_eq!(normal_at(&s, Tuple4D::point(0.0, 0.0, 1.0), &i).unwrap(),
        Tuple4D::vector(0.0, 0.0, 1.0));

    let n = normal_at(&s, Tuple4D::point(k, k, k), &i).unwrap();
    assert_eq!(n, Tuple4D::vector(k, k, k));
    assert_eq!(n, n.normalize());
}

#[test]
fn compute_normal_on_translated_sphere() {
    let s = Shape::sphere()
        .with_transform(Matrix4D::translation(0.0, 1.0, 0.0)).unwrap();

    let p = Tuple4D::point(0.0, 1.70711, -0.70711);
    let n = normal_at(&s, p, &Intersection::new(0.0, &s)).unwrap();

    assert_eq!(n, Tuple4D::vector(0.0, 0.70711, -0.70711));
}

#[test]
fn compute_normal_on_transformed_sphere() {
    let s = Shape::sphere()
        .with_transform(Matrix4D::scaling(1.0, 0.5, 1.0)
            * Matrix4D::rotation_z(std::f64::consts::PI / 5.0))
        .unwrap();

    let p = Tuple4D::point(0.0, 2.0f64.sqrt() / 2.0, -(2.0f64.sqrt()) / 2.0);
    let n = normal_at(&s, p, &Intersection::new(0.0, &s)).unwrap();

    assert_eq!(n, Tuple4D::vector(0.0, 0.97014, -0.24254));
}

#[test]
fn normal_on_plane() {
    let p = Shape::plane();
    let i = Intersection::new(0.0, &p);

    for at in [
        Tuple4D::point(0.0, 0.0, 0.0),
        Tuple4D::point(10.0, 0.0, -10.0),
        Tuple4D::point(-5.0, 0.0, 150.0),
    ].iter() {
        assert_eq!(p.local_normal_at(at, &i).unwrap(),
            Tuple4D::vector(0.0, 1.0, 0.0));
    }
}

#[test]
fn ray_parallel_or_coplanar_with_plane() {
    let p = Shape::plane();
    let parallel = ray(Tuple4D::point(0.0, 10.0, 0.0),
        Tuple4D::vector(0.0, 0.0, 1.0));
    let coplanar = ray(Tuple4D::point(0.0, 0.0, 0.0),
        Tuple4D::vector(0.0, 0.0, 1.0));

    assert!(p.local_intersect(&parallel).is_empty());
    assert!(p.local_intersect(&coplanar).is_empty());
}

#[test]
fn ray_intersecting_plane_from_above_and_below() {
    let p = Shape::plane();
    let above = ray(Tuple4D::point(0.0, 1.0, 0.0),
        Tuple4D::vector(0.0, -1.0, 0.0));
    let below = ray(Tuple4D::point(0.0, -1.0, 0.0),
        Tuple4D::vector(0.0, 1.0, 0.0));

    for r in [above, below].iter() {
        let is = p.local_intersect(r);
        assert_eq!(is.len(), 1);
        assert_eq!(is.intersections[0].t, 1.0);
        assert!(std::ptr::eq(is.intersections[0].what, &p));
    }
}

#[test]
fn ray_intersects_cube() {
    let c = Shape::cube();
    let cases = [
        (Tuple4D::point( 5.0,  0.5,  0.0), Tuple4D::vector(-1.0, 0.0, 0.0), 4.0, 6.0),
        (Tuple4D::point(-5.0,  0.5,  0.0), Tuple4D::vector( 1.0, 0.0, 0.0), 4.0, 6.0),
        (Tuple4D::point( 0.5,  5.0,  0.0), Tuple4D::vector(0.0, -1.0, 0.0), 4.0, 6.0),
        (Tuple4D::point( 0.5, -5.0,  0.0), Tuple4D::vector(0.0,  1.0, 0.0), 4.0, 6.0),
        (Tuple4D::point( 0.5,  0.0,  5.0), Tuple4D::vector(0.0, 0.0, -1.0), 4.0, 6.0),
        (Tuple4D::point( 0.5,  0.0, -5.0), Tuple4D::vector(0.0, 0.0,  1.0), 4.0, 6.0),
        (Tuple4D::point( 0.0,  0.5,  0.0), Tuple4D::vector(0.0, 0.0,  1.0), -1.0, 1.0),
    ];

    for (origin, direction, t1, t2) in cases.iter() {
        let xs = c.local_intersect(&ray(*origin, *direction));
        assert_eq!(xs.len(), 2);
        assert_eq!(xs.intersections[0].t, *t1);
        assert_eq!(xs.intersections[1].t, *t2);
    }
}

#[test]
fn ray_misses_cube() {
    let c = Shape::cube();
    let cases = [
        (Tuple4D::point(-2.0, 0.0, 0.0), Tuple4D::vector(0.2673, 0.5345, 0.8018)),
        (Tuple4D::point(0.0, -2.0, 0.0), Tuple4D::vector(0.8018, 0.2673, 0.5345)),
        (Tuple4D::point(0.0, 0.0, -2.0), Tuple4D::vector(0.5345, 0.8018, 0.2673)),
        (Tuple4D::point(2.0, 0.0, 2.0), Tuple4D::vector(0.0, 0.0, -1.0)),
        (Tuple4D::point(0.0, 2.0, 2.0), Tuple4D::vector(0.0, -1.0, 0.0)),
        (Tuple4D::point(2.0, 2.0, 0.0), Tuple4D::vector(-1.0, 0.0, 0.0)),
    ];

    for (origin, direction) in cases.iter() {
        assert!(c.local_intersect(&ray(*origin, *direction)).is_empty());
    }
}

#[test]
fn normal_on_surface_of_cube() {
    let c = Shape::cube();
    let i = Intersection::new(0.0, &c);
    let cases = [
        (Tuple4D::point(1.0, 0.5, -0.8), Tuple4D::vector(1.0, 0.0, 0.0)),
        (Tuple4D::point(-1.0, -0.2, 0.9), Tuple4D::vector(-1.0, 0.0, 0.0)),
        (Tuple4D::point(-0.4, 1.0, -0.1), Tuple4D::vector(0.0, 1.0, 0.0)),
        (Tuple4D::point(0.3, -1.0, -0.7), Tuple4D::vector(0.0, -1.0, 0.0)),
        (Tuple4D::point(-0.6, 0.3, 1.0), Tuple4D::vector(0.0, 0.0, 1.0)),
        (Tuple4D::point(0.4, 0.4, -1.0), Tuple4D::vector(0.0, 0.0, -1.0)),
        (Tuple4D::point(1.0, 1.0, 1.0), Tuple4D::vector(1.0, 0.0, 0.0)),
        (Tuple4D::point(-1.0, -1.0, -1.0), Tuple4D::vector(-1.0, 0.0, 0.0)),
    ];

    for (point, normal) in cases.iter() {
        assert_eq!(c.local_normal_at(point, &i).unwrap(), *normal);
    }
}

#[test]
fn ray_misses_cylinder() {
    let cyl = Shape::cylinder();
    let cases = [
        (Tuple4D::point(1.0, 0.0, 0.0), Tuple4D::vector(0.0, 1.0, 0.0)),
        (Tuple4D::point(0.0, 0.0, 0.0), Tuple4D::vector(0.0, 1.0, 0.0)),
        (Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(1.0, 1.0, 1.0)),
    ];

    for (origin, direction) in cases.iter() {
        let r = ray(*origin, direction.normalize());
        assert!(cyl.local_intersect(&r).is_empty());
    }
}

#[test]
fn ray_strikes_cylinder() {
    use crate::feq;

    let cyl = Shape::cylinder();
    let cases = [
        (Tuple4D::point(1.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0), 5.0, 5.0),
        (Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0), 4.0, 6.0),
        (Tuple4D::point(0.5, 0.0, -5.0), Tuple4D::vector(0.1, 1.0, 1.0),
            6.80798, 7.08872),
    ];

    for (origin, direction, t0, t1) in cases.iter() {
        let xs = cyl.local_intersect(&ray(*origin, direction.normalize()));
        assert_eq!(xs.len(), 2);
        assert!(feq(xs.intersections[0].t, *t0));
        assert!(feq(xs.intersections[1].t, *t1));
    }
}

#[test]
fn normal_on_cylinder() {
    let cyl = Shape::cylinder();
    let i = Intersection::new(0.0, &cyl);
    let cases = [
        (Tuple4D::point(1.0, 0.0, 0.0), Tuple4D::vector(1.0, 0.0, 0.0)),
        (Tuple4D::point(0.0, 5.0, -1.0), Tuple4D::vector(0.0, 0.0, -1.0)),
        (Tuple4D::point(0.0, -2.0, 1.0), Tuple4D::vector(0.0, 0.0, 1.0)),
        (Tuple4D::point(-1.0, 1.0, 0.0), Tuple4D::vector(-1.0, 0.0, 0.0)),
    ];

    for (point, normal) in cases.iter() {
        assert_eq!(cyl.local_normal_at(point, &i).unwrap(), *normal);
    }
}

#[test]
fn intersecting_constrained_cylinder() {
    let cyl = Shape::bounded_cylinder(1.0, 2.0);
    let cases = [
        (Tuple4D::point(0.0, 1.5, 0.0), Tuple4D::vector(0.1, 1.0, 0.0), 0),
        (Tuple4D::point(0.0, 3.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0), 0),
        (Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0), 0),
        (Tuple4D::point(0.0, 2.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0), 0),
        (Tuple4D::point(0.0, 1.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0), 0),
        (Tuple4D::point(0.0, 1.5, -2.0), Tuple4D::vector(0.0, 0.0, 1.0), 2),
    ];

    for (origin, direction, count) in cases.iter() {
        let xs = cyl.local_intersect(&ray(*origin, direction.normalize()));
        assert_eq!(xs.len(), *count);
    }
}

#[test]
fn intersecting_caps_of_closed_cylinder() {
    let cyl = Shape::capped_cylinder(1.0, 2.0);
    let cases = [
        (Tuple4D::point(0.0, 3.0, 0.0), Tuple4D::vector(0.0, -1.0, 0.0), 2),
        (Tuple4D::point(0.0, 3.0, -2.0), Tuple4D::vector(0.0, -1.0, 2.0), 2),
        (Tuple4D::point(0.0, 4.0, -2.0), Tuple4D::vector(0.0, -1.0, 1.0), 2),
        (Tuple4D::point(0.0, 0.0, -2.0), Tuple4D::vector(0.0, 1.0, 2.0), 2),
        (Tuple4D::point(0.0, -1.0, -2.0), Tuple4D::vector(0.0, 1.0, 1.0), 2),
    ];

    for (origin, direction, count) in cases.iter() {
        let xs = cyl.local_intersect(&ray(*origin, direction.normalize()));
        assert_eq!(xs.len(), *count);
    }
}

#[test]
fn normal_on_cylinder_caps() {
    let cyl = Shape::capped_cylinder(1.0, 2.0);
    let i = Intersection::new(0.0, &cyl);
    let cases = [
        (Tuple4D::point(0.0, 1.0, 0.0), Tuple4D::vector(0.0, -1.0, 0.0)),
        (Tuple4D::point(0.5, 1.0, 0.0), Tuple4D::vector(0.0, -1.0, 0.0)),
        (Tuple4D::point(0.0, 1.0, 0.5), Tuple4D::vector(0.0, -1.0, 0.0)),
        (Tuple4D::point(0.0, 2.0, 0.0), Tuple4D::vector(0.0, 1.0, 0.0)),
        (Tuple4D::point(0.5, 2.0, 0.0), Tuple4D::vector(0.0, 1.0, 0.0)),
        (Tuple4D::point(0.0, 2.0, 0.5), Tuple4D::vector(0.0, 1.0, 0.0)),
    ];

    for (point, normal) in cases.iter() {
        assert_eq!(cyl.local_normal_at(point, &i).unwrap(), *normal);
    }
}

#[test]
fn intersecting_cone() {
    use crate::feq;

    let cone = Shape::cone();
    let cases = [
        (Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0), 5.0, 5.0),
        (Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(1.0, 1.0, 1.0),
            8.66025, 8.66025),
        (Tuple4D::point(1.0, 1.0, -5.0), Tuple4D::vector(-0.5, -1.0, 1.0),
            4.55006, 49.44994),
    ];

    for (origin, direction, t0, t1) in cases.iter() {
        let xs = cone.local_intersect(&ray(*origin, direction.normalize()));
        assert_eq!(xs.len(), 2);
        assert!(feq(xs.intersections[0].t, *t0));
        assert!(feq(xs.intersections[1].t, *t1));
    }
}

#[test]
fn intersecting_cone_parallel_to_one_half() {
    use crate::feq;

    let cone = Shape::cone();
    let r = ray(Tuple4D::point(0.0, 0.0, -1.0),
        Tuple4D::vector(0.0, 1.0, 1.0).normalize());
    let xs = cone.local_intersect(&r);

    assert_eq!(xs.len(), 1);
    assert!(feq(xs.intersections[0].t, 0.35355));
}

#[test]
fn intersecting_cone_caps() {
    let cone = Shape::capped_cone(-0.5, 0.5);
    let cases = [
        (Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 1.0, 0.0), 0),
        (Tuple4D::point(0.0, 0.0, -0.25), Tuple4D::vector(0.0, 1.0, 1.0), 2),
        (Tuple4D::point(0.0, 0.0, -0.25), Tuple4D::vector(0.0, 1.0, 0.0), 4),
    ];

    for (origin, direction, count) in cases.iter() {
        let xs = cone.local_intersect(&ray(*origin, direction.normalize()));
        assert_eq!(xs.len(), *count);
    }

    // Without caps, the same vertical ray only crosses the walls.
    let open = Shape::bounded_cone(-0.5, 0.5);
    let r = ray(Tuple4D::point(0.0, 0.0, -0.25), Tuple4D::vector(0.0, 1.0, 0.0));
    assert_eq!(open.local_intersect(&r).len(), 2);
}

#[test]
fn normal_on_cone() {
    let cone = Shape::cone();
    let i = Intersection::new(0.0, &cone);
    let cases = [
        (Tuple4D::point(0.0, 0.0, 0.0), Tuple4D::vector(0.0, 0.0, 0.0)),
        (Tuple4D::point(1.0, 1.0, 1.0),
            Tuple4D::vector(1.0, -(2.0f64.sqrt()), 1.0)),
        (Tuple4D::point(-1.0, -1.0, 0.0), Tuple4D::vector(-1.0, 1.0, 0.0)),
    ];

    for (point, normal) in cases.iter() {
        assert_eq!(cone.local_normal_at(point, &i).unwrap(), *normal);
    }
}

#[test]
fn leaf_shape_bounds() {
    let inf = f64::INFINITY;

    assert_eq!(Shape::sphere().bounds(),
        Bounds::new(-1.0, -1.0, -1.0, 1.0, 1.0, 1.0));
    assert_eq!(Shape::plane().bounds(),
        Bounds::new(-inf, 0.0, -inf, inf, 0.0, inf));
    assert_eq!(Shape::cylinder().bounds(),
        Bounds::new(-1.0, -inf, -1.0, 1.0, inf, 1.0));
    assert_eq!(Shape::bounded_cylinder(-5.0, 3.0).bounds(),
        Bounds::new(-1.0, -5.0, -1.0, 1.0, 3.0, 1.0));
    assert_eq!(Shape::bounded_cone(-5.0, 3.0).bounds(),
        Bounds::new(-5.0, -5.0, -5.0, 5.0, 3.0, 5.0));
}

#[test]
fn group_bounds_hold_all_children() {
    let cube = Shape::cube()
        .with_transform(Matrix4D::translation(5.0, 5.0, 5.0)).unwrap();
    let sphere = Shape::sphere()
        .with_transform(Matrix4D::translation(-5.0, -5.0, -5.0)).unwrap();

    let mut g = Shape::group();
    assert!(g.bounds().is_empty());

    g.add_child(cube).unwrap();
    g.add_child(sphere).unwrap();

    assert_eq!(g.bounds(), Bounds::new(-6.0, -6.0, -6.0, 6.0, 6.0, 6.0));
}

#[test]
fn csg_bounds_hold_both_operands() {
    let left = Shape::sphere();
    let right = Shape::sphere()
        .with_transform(Matrix4D::translation(2.0, 3.0, 4.0)).unwrap();
    let c = Shape::csg_difference(left, right);

    assert_eq!(c.bounds(), Bounds::new(-1.0, -1.0, -1.0, 3.0, 4.0, 5.0));
}

#[test]
fn creating_a_shape_group() {
    let g = Shape::group();

    assert_eq!(*g.transform(), Matrix4D::identity());
    assert_eq!(g.children().unwrap().len(), 0);
}

#[test]
fn adding_a_child_to_a_shape_group() {
    let mut g = Shape::group();
    let s = Shape::sphere()
        .with_transform(Matrix4D::translation(1.0, 2.0, 3.0)).unwrap();

    g.add_child(s.clone()).unwrap();

    let children = g.children().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(s, children[0]);
}

#[test]
fn adding_a_child_to_a_non_group_fails() {
    let mut s = Shape::sphere();
    assert!(matches!(s.add_child(Shape::cube()),
        Err(RayTracerError::NotAGroup)));
}

#[test]
fn intersecting_ray_with_empty_group() {
    let g = Shape::group();
    let r = ray(Tuple4D::point(0.0, 0.0, 0.0), Tuple4D::vector(0.0, 0.0, 1.0));

    assert!(g.local_intersect(&r).is_empty());
}

#[test]
fn intersecting_ray_with_nonempty_group() {
    let mut g = Shape::group();
    let s1 = Shape::sphere();
    let s2 = Shape::sphere()
        .with_transform(Matrix4D::translation(0.0, 0.0, -3.0)).unwrap();
    let s3 = Shape::sphere()
        .with_transform(Matrix4D::translation(5.0, 0.0, 0.0)).unwrap();

    g.add_child(s1).unwrap();
    g.add_child(s2).unwrap();
    g.add_child(s3).unwrap();

    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));

    let is = g.local_intersect(&r);
    let children = g.children().unwrap();
    assert_eq!(is.len(), 4);
    assert!(std::ptr::eq(&children[1], is.intersections[0].what));
    assert!(std::ptr::eq(&children[1], is.intersections[1].what));
    assert!(std::ptr::eq(&children[0], is.intersections[2].what));
    assert!(std::ptr::eq(&children[0], is.intersections[3].what));
}

#[test]
fn intersecting_a_transformed_group() {
    let mut g = Shape::group()
        .with_transform(Matrix4D::scaling(2.0, 2.0, 2.0)).unwrap();
    let s = Shape::sphere()
        .with_transform(Matrix4D::translation(5.0, 0.0, 0.0)).unwrap();
    g.add_child(s).unwrap();

    let r = ray(Tuple4D::point(10.0, 0.0, -10.0),
        Tuple4D::vector(0.0, 0.0, 1.0));

    assert_eq!(intersect(&g, &r).len(), 2);
}

#[test]
fn group_skips_children_when_bounds_are_missed() {
    let mut g = Shape::group();
    g.add_child(Shape::sphere()).unwrap();

    let miss = ray(Tuple4D::point(0.0, 5.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0));
    assert!(intersect(&g, &miss).is_empty());
}

#[cfg(test)]
fn nested_sphere(outer: Matrix4D, inner: Matrix4D) -> Shape {
    let s = Shape::sphere()
        .with_transform(Matrix4D::translation(5.0, 0.0, 0.0)).unwrap();

    let mut g2 = Shape::group().with_transform(inner).unwrap();
    g2.add_child(s).unwrap();

    let mut g1 = Shape::group().with_transform(outer).unwrap();
    g1.add_child(g2).unwrap();

    g1
}

#[test]
fn converting_a_point_from_world_to_object_space() {
    let g1 = nested_sphere(
        Matrix4D::rotation_y(std::f64::consts::PI / 2.0),
        Matrix4D::scaling(2.0, 2.0, 2.0),
    );

    let s = &g1.children().unwrap()[0].children().unwrap()[0];
    let p = s.world_to_object(Tuple4D::point(-2.0, 0.0, -10.0));
    assert_eq!(p, Tuple4D::point(0.0, 0.0, -1.0));
}

#[test]
fn converting_a_normal_from_object_to_world_space() {
    let g1 = nested_sphere(
        Matrix4D::rotation_y(std::f64::consts::PI / 2.0),
        Matrix4D::scaling(1.0, 2.0, 3.0),
    );

    let k = 3.0f64.sqrt() / 3.0;
    let s = &g1.children().unwrap()[0].children().unwrap()[0];
    let normal = s.normal_to_world(Tuple4D::vector(k, k, k));

    assert_eq!(normal, Tuple4D::vector(0.2857, 0.4286, -0.8571));
}

#[test]
fn finding_the_normal_on_a_child_object() {
    let g1 = nested_sphere(
        Matrix4D::rotation_y(std::f64::consts::PI / 2.0),
        Matrix4D::scaling(1.0, 2.0, 3.0),
    );

    let s = &g1.children().unwrap()[0].children().unwrap()[0];
    let normal = normal_at(
        s,
        Tuple4D::point(1.7321, 1.1547, -5.5774),
        &Intersection::new(0.0, s)
    ).unwrap();

    assert_eq!(normal, Tuple4D::vector(0.2857, 0.4286, -0.8571));
}

#[test]
fn transform_set_after_insertion_reaches_children() {
    let mut g = Shape::group();
    g.add_child(Shape::sphere()
        .with_transform(Matrix4D::translation(5.0, 0.0, 0.0)).unwrap()
    ).unwrap();
    g.set_transform(Matrix4D::scaling(2.0, 2.0, 2.0)).unwrap();

    let s = &g.children().unwrap()[0];
    assert_eq!(s.world_to_object(Tuple4D::point(10.0, 0.0, 0.0)),
        Tuple4D::point(0.0, 0.0, 0.0));
}

#[test]
fn groups_and_csg_have_no_local_normal() {
    let g = Shape::group();
    let c = Shape::csg_union(Shape::sphere(), Shape::cube());
    let p = Tuple4D::point(0.0, 0.0, 0.0);

    assert!(matches!(g.local_normal_at(&p, &Intersection::new(0.0, &g)),
        Err(RayTracerError::NoLocalNormal)));
    assert!(matches!(normal_at(&c, p, &Intersection::new(0.0, &c)),
        Err(RayTracerError::NoLocalNormal)));
}

#[test]
fn setting_material_on_a_group_paints_children() {
    let mut m = Material::default();
    m.ambient = 0.5;

    let mut g = Shape::group();
    g.add_child(Shape::sphere()).unwrap();
    let g = g.with_material(m);

    assert_eq!(g.children().unwrap()[0].material, m);
}

#[cfg(test)]
fn unit_triangle() -> Shape {
    Shape::triangle(
        Tuple4D::point(0.0, 1.0, 0.0),
        Tuple4D::point(-1.0, 0.0, 0.0),
        Tuple4D::point(1.0, 0.0, 0.0),
    )
}

#[test]
fn finding_the_normal_on_a_triangle() {
    let t = unit_triangle();
    let i = Intersection::new(0.0, &t);
    let expected = Tuple4D::vector(0.0, 0.0, -1.0);

    assert_eq!(normal_at(&t, Tuple4D::point(0.0, 0.5, 0.0), &i).unwrap(),
        expected);
    assert_eq!(normal_at(&t, Tuple4D::point(-0.5, 0.75, 0.0), &i).unwrap(),
        expected);
    assert_eq!(normal_at(&t, Tuple4D::point(0.5, 0.25, 0.0), &i).unwrap(),
        expected);
}

#[test]
fn intersecting_a_ray_parallel_to_a_triangle() {
    let t = unit_triangle();
    let r = ray(Tuple4D::point(0.0, -1.0, -2.0), Tuple4D::vector(0.0, 1.0, 0.0));

    assert!(t.local_intersect(&r).is_empty());
}

#[test]
fn a_ray_misses_each_triangle_edge() {
    let t = unit_triangle();
    let origins = [
        Tuple4D::point(1.0, 1.0, -2.0),
        Tuple4D::point(-1.0, 1.0, -2.0),
        Tuple4D::point(0.0, -1.0, -2.0),
    ];

    for origin in origins.iter() {
        let r = ray(*origin, Tuple4D::vector(0.0, 0.0, 1.0));
        assert!(t.local_intersect(&r).is_empty());
    }
}

#[test]
fn a_ray_strikes_a_triangle() {
    use crate::feq;

    let t = unit_triangle();
    let r = ray(Tuple4D::point(0.0, 0.5, -2.0), Tuple4D::vector(0.0, 0.0, 1.0));

    let is = t.local_intersect(&r);
    assert_eq!(is.len(), 1);
    assert!(feq(is.intersections[0].t, 2.0));
    assert!(is.intersections[0].uv.is_some());
}

#[cfg(test)]
fn unit_smooth_triangle() -> Shape {
    Shape::smooth_triangle(
        Tuple4D::point(0.0, 1.0, 0.0),
        Tuple4D::point(-1.0, 0.0, 0.0),
        Tuple4D::point(1.0, 0.0, 0.0),
        Tuple4D::vector(0.0, 1.0, 0.0),
        Tuple4D::vector(-1.0, 0.0, 0.0),
        Tuple4D::vector(1.0, 0.0, 0.0)
    )
}

#[test]
fn an_intersection_with_a_smooth_triangle_stores_uv() {
    use crate::feq;

    let s = unit_smooth_triangle();
    let r = ray(Tuple4D::point(-0.2, 0.3, -2.0), Tuple4D::vector(0.0, 0.0, 1.0));

    let is = s.local_intersect(&r);
    let (u, v) = is.intersections[0].uv.unwrap();
    assert!(feq(u, 0.45));
    assert!(feq(v, 0.25));
}

#[test]
fn a_smooth_triangle_uses_uv_to_interpolate_the_normal() {
    let s = unit_smooth_triangle();

    let i = Intersection::new_uv(1.0, &s, 0.45, 0.25);
    let n = normal_at(&s, Tuple4D::point(0.0, 0.0, 0.0), &i).unwrap();

    assert_eq!(n, Tuple4D::vector(-0.5547, 0.83205, 0.0));
}

#[test]
fn csg_is_created_with_an_operation_and_two_shapes() {
    let s1 = Shape::sphere();
    let s2 = Shape::cube();

    let c = Shape::csg_union(s1.clone(), s2.clone());
    assert_eq!(c.csg_operation(), Some(CsgOperation::Union));
    assert_eq!(*c.csg_left().unwrap(), s1);
    assert_eq!(*c.csg_right().unwrap(), s2);
    assert!(Shape::sphere().csg_left().is_none());
}

#[test]
fn includes_is_an_identity_check() {
    let c = Shape::csg_union(Shape::sphere(), Shape::sphere());
    let left = c.csg_left().unwrap();
    let twin = Shape::sphere();

    assert!(c.includes(left));
    assert!(c.includes(c.csg_right().unwrap()));
    assert_eq!(*left, twin);
    assert!(!c.includes(&twin));
}

#[test]
fn a_ray_misses_a_csg_object() {
    let c = Shape::csg_union(Shape::sphere(), Shape::cube());
    let r = ray(Tuple4D::point(0.0, 2.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));

    assert!(c.local_intersect(&r).is_empty());
}

#[test]
fn a_ray_hits_a_csg_object() {
    use crate::feq;

    let s1 = Shape::sphere();
    let s2 = Shape::sphere()
        .with_transform(Matrix4D::translation(0.0, 0.0, 0.5)).unwrap();
    let c = Shape::csg_union(s1, s2);

    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let is = c.local_intersect(&r);

    assert_eq!(is.len(), 2);
    assert!(feq(is.intersections[0].t, 4.0));
    assert!(std::ptr::eq(is.intersections[0].what, c.csg_left().unwrap()));
    assert!(feq(is.intersections[1].t, 6.5));
    assert!(std::ptr::eq(is.intersections[1].what, c.csg_right().unwrap()));
}

#[test]
fn shapes_can_be_shared_across_threads() {
    fn assert_sync<T: Sync + Send>() {}
    assert_sync::<Shape>();
}

#[test]
fn inverted_transform_matches_checked_transform() {
    let checked = Shape::sphere()
        .with_transform(Matrix4D::scaling(0.5, 0.5, 0.5)).unwrap();
    let known = Shape::sphere().with_inverted_transform(
        Matrix4D::scaling(0.5, 0.5, 0.5), Matrix4D::scaling(2.0, 2.0, 2.0)
    );

    assert_eq!(known, checked);
    assert_eq!(known.inverse, checked.inverse);
    assert_eq!(known.world_inverse, checked.world_inverse);
}

#[test]
fn capped_cylinder_hits_are_sorted() {
    let cyl = Shape::capped_cylinder(1.0, 2.0);
    let r = ray(Tuple4D::point(0.0, 3.0, 0.0), Tuple4D::vector(0.0, -1.0, 0.0));
    let ts: Vec<f64> = intersect(&cyl, &r).intersections.iter()
        .map(|i| i.t)
        .collect();

    assert_eq!(ts, vec![1.0, 2.0]);
}

#[test]
fn capped_cone_hits_are_sorted() {
    use crate::feq;

    let cone = Shape::capped_cone(-0.5, 0.5);
    let r = ray(Tuple4D::point(0.25, 2.0, 0.0),
        Tuple4D::vector(0.0, -1.0, 0.0));
    let ts: Vec<f64> = intersect(&cone, &r).intersections.iter()
        .map(|i| i.t)
        .collect();

    assert_eq!(ts.len(), 4);
    for (t, expected) in ts.iter().zip([1.5, 1.75, 2.25, 2.5]) {
        assert!(feq(*t, expected));
    }
}

#[test]
fn grouping_a_distant_sphere_keeps_its_hits() {
    let far = Matrix4D::translation(0.0, 0.0, 8000.0);
    let r = ray(Tuple4D::point(-1.2, 0.0, 0.0),
        Tuple4D::vector(5e-5, 0.0, 1.0).normalize());

    let bare = Shape::sphere().with_transform(far).unwrap();
    let mut g = Shape::group();
    g.add_child(Shape::sphere().with_transform(far).unwrap()).unwrap();

    let bare_hits = intersect(&bare, &r).len();
    assert_eq!(bare_hits, 2);
    assert_eq!(intersect(&g, &r).len(), bare_hits);
}

#[test]
fn csg_of_a_distant_sphere_keeps_its_hits() {
    let far = Matrix4D::translation(0.0, 0.0, 8000.0);
    let r = ray(Tuple4D::point(-1.2, 0.0, 0.0),
        Tuple4D::vector(5e-5, 0.0, 1.0).normalize());

    let c = Shape::csg_union(
        Shape::sphere().with_transform(far).unwrap(),
        Shape::sphere().with_transform(far * Matrix4D::translation(0.0, 0.0, 5.0))
            .unwrap(),
    );

    assert_eq!(intersect(&c, &r).len(), 4);
}
