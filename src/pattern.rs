use crate::feq;
use crate::tuple::Tuple4D;
use crate::color::Color;
use crate::matrix::Matrix4D;
use crate::shape::Shape;
use crate::error::Result;

/// The color function of a pattern, evaluated in pattern space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PatternKind {
    /// A single color everywhere.
    Solid(Color),

    /// Alternating stripes along X: `floor(x) mod 2` picks the color.
    Stripe(Color, Color),

    /// A linear blend along X, repeating every unit.
    Gradient(Color, Color),

    /// Concentric rings in the XZ plane.
    Ring(Color, Color),

    /// 3D checkers, alternating on `floor(x) + floor(y) + floor(z)`.
    Checker(Color, Color),
}

/// A procedural pattern with its own transform.
///
/// A pattern is applied to a shape's material. Points are carried from world
/// space into the shape's object space, then into pattern space by the
/// inverse of `transform`, before the color is looked up.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pattern {
    pub kind: PatternKind,
    transform: Matrix4D,
    inverse: Matrix4D,
}

/// Whether `v` falls in an even unit interval (`floor(v) mod 2 == 0`).
fn is_even(v: f64) -> bool {
    feq(v.floor().rem_euclid(2.0), 0.0)
}

impl Pattern {
    pub fn new(kind: PatternKind) -> Pattern {
        Pattern {
            kind,
            transform: Matrix4D::identity(),
            inverse: Matrix4D::identity(),
        }
    }

    pub fn solid(c: Color) -> Pattern {
        Pattern::new(PatternKind::Solid(c))
    }

    /// Creates an alternating stripe pattern applied across the X axis.
    ///
    /// ```
    /// # use rayshade::pattern::Pattern;
    /// # use rayshade::color::Color;
    /// # use rayshade::tuple::Tuple4D;
    /// let p = Pattern::stripe(Color::white(), Color::black());
    /// assert_eq!(p.pattern_at(Tuple4D::point(0.5, 0.0, 0.0)), Color::white());
    /// assert_eq!(p.pattern_at(Tuple4D::point(1.5, 0.0, 0.0)), Color::black());
    /// ```
    pub fn stripe(primary: Color, secondary: Color) -> Pattern {
        Pattern::new(PatternKind::Stripe(primary, secondary))
    }

    pub fn gradient(from: Color, to: Color) -> Pattern {
        Pattern::new(PatternKind::Gradient(from, to))
    }

    pub fn ring(primary: Color, secondary: Color) -> Pattern {
        Pattern::new(PatternKind::Ring(primary, secondary))
    }

    pub fn checker(primary: Color, secondary: Color) -> Pattern {
        Pattern::new(PatternKind::Checker(primary, secondary))
    }

    pub fn transform(&self) -> &Matrix4D {
        &self.transform
    }

    /// Sets the pattern transform; fails if it cannot be inverted.
    pub fn set_transform(&mut self, transform: Matrix4D) -> Result<()> {
        self.inverse = transform.inverse()?;
        self.transform = transform;

        Ok(())
    }

    pub fn with_transform(mut self, transform: Matrix4D) -> Result<Pattern> {
        self.set_transform(transform)?;
        Ok(self)
    }

    /// Looks up the color at a point already in pattern space.
    pub fn pattern_at(&self, p: Tuple4D) -> Color {
        match self.kind {
            PatternKind::Solid(c) => c,
            PatternKind::Stripe(a, b) => {
                if is_even(p.x) { a } else { b }
            },
            PatternKind::Gradient(a, b) => a.lerp(&b, p.x - p.x.floor()),
            PatternKind::Ring(a, b) => {
                if is_even((p.x.powi(2) + p.z.powi(2)).sqrt()) { a } else { b }
            },
            PatternKind::Checker(a, b) => {
                if is_even(p.x.floor() + p.y.floor() + p.z.floor()) {
                    a
                } else {
                    b
                }
            },
        }
    }

    /// Looks up the color at a world-space point on `obj`.
    pub fn pattern_at_object(&self, obj: &Shape, world_point: Tuple4D)
        -> Color {
        let object_point = obj.world_to_object(world_point);
        let pattern_point = self.inverse * object_point;

        self.pattern_at(pattern_point)
    }
}

#[cfg(test)]
fn assert_pattern(pattern: &Pattern, cases: &[([f64; 3], Color)]) {
    for (p, c) in cases.iter() {
        assert_eq!(pattern.pattern_at(Tuple4D::from(*p)), *c);
    }
}

#[test]
fn solid_pattern_ignores_the_point() {
    let pattern = Pattern::solid(Color::red());

    assert_pattern(&pattern, &[
        ([0.0, 0.0, 0.0], Color::red()),
        ([-7.5, 3.2, 100.0], Color::red()),
    ]);
}

#[test]
fn stripe_pattern_is_constant_along_y_and_z() {
    let pattern = Pattern::stripe(Color::white(), Color::black());

    assert_pattern(&pattern, &[
        ([0.0, 0.0, 0.0], Color::white()),
        ([0.0, 1.0, 0.0], Color::white()),
        ([0.0, 2.0, 0.0], Color::white()),
        ([0.0, 0.0, 1.0], Color::white()),
        ([0.0, 0.0, 2.0], Color::white()),
    ]);
}

#[test]
fn stripe_pattern_alternates_along_x() {
    let pattern = Pattern::stripe(Color::white(), Color::black());

    assert_pattern(&pattern, &[
        ([ 0.0, 0.0, 0.0], Color::white()),
        ([ 0.9, 0.0, 0.0], Color::white()),
        ([ 1.0, 0.0, 0.0], Color::black()),
        ([-0.1, 0.0, 0.0], Color::black()),
        ([-1.0, 0.0, 0.0], Color::black()),
        ([-1.1, 0.0, 0.0], Color::white()),
    ]);
}

#[test]
fn gradient_linearly_interpolates_between_colors() {
    let pattern = Pattern::gradient(Color::white(), Color::black());

    assert_pattern(&pattern, &[
        ([0.0, 0.0, 0.0], Color::white()),
        ([0.25, 0.0, 0.0], Color::rgb(0.75, 0.75, 0.75)),
        ([0.5, 0.0, 0.0], Color::rgb(0.5, 0.5, 0.5)),
        ([0.75, 0.0, 0.0], Color::rgb(0.25, 0.25, 0.25)),
    ]);
}

#[test]
fn ring_extends_in_x_and_z() {
    let pattern = Pattern::ring(Color::white(), Color::black());

    assert_pattern(&pattern, &[
        ([0.0, 0.0, 0.0], Color::white()),
        ([1.0, 0.0, 0.0], Color::black()),
        ([0.0, 0.0, 1.0], Color::black()),
        ([0.708, 0.0, 0.708], Color::black()),
    ]);
}

#[test]
fn checkers_repeat_in_each_dimension() {
    let pattern = Pattern::checker(Color::white(), Color::black());

    assert_pattern(&pattern, &[
        ([0.0, 0.0, 0.0], Color::white()),
        ([0.99, 0.0, 0.0], Color::white()),
        ([1.01, 0.0, 0.0], Color::black()),
        ([0.0, 0.99, 0.0], Color::white()),
        ([0.0, 1.01, 0.0], Color::black()),
        ([0.0, 0.0, 0.99], Color::white()),
        ([0.0, 0.0, 1.01], Color::black()),
    ]);
}

#[test]
fn stripes_with_an_object_transformation() {
    let object = Shape::sphere()
        .with_transform(Matrix4D::scaling(2.0, 2.0, 2.0)).unwrap();
    let pattern = Pattern::stripe(Color::white(), Color::black());

    assert_eq!(pattern.pattern_at_object(&object,
        Tuple4D::point(1.5, 0.0, 0.0)), Color::white());
}

#[test]
fn stripes_with_a_pattern_transformation() {
    let object = Shape::sphere();
    let pattern = Pattern::stripe(Color::white(), Color::black())
        .with_transform(Matrix4D::scaling(2.0, 2.0, 2.0)).unwrap();

    assert_eq!(pattern.pattern_at_object(&object,
        Tuple4D::point(1.5, 0.0, 0.0)), Color::white());
}

#[test]
fn stripes_with_both_transformations() {
    let object = Shape::sphere()
        .with_transform(Matrix4D::scaling(2.0, 2.0, 2.0)).unwrap();
    let pattern = Pattern::stripe(Color::white(), Color::black())
        .with_transform(Matrix4D::translation(0.5, 0.0, 0.0)).unwrap();

    assert_eq!(pattern.pattern_at_object(&object,
        Tuple4D::point(2.5, 0.0, 0.0)), Color::white());
}

#[test]
fn pattern_transform_must_be_invertible() {
    let mut pattern = Pattern::checker(Color::white(), Color::black());

    assert!(pattern.set_transform(Matrix4D::new()).is_err());
    assert_eq!(*pattern.transform(), Matrix4D::identity());
}
