//! Triangle models assembled from vertex and face records.
//!
//! A `Model` is what a mesh parser fills in: vertex and normal records,
//! and faces referring to them by one-based index, sorted into named groups.
//! Text syntax is left to the parser; this module only builds the shapes.

use std::collections::BTreeMap;

use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;
use crate::shape::{ Shape, ShapeType };
use crate::light::Material;
use crate::error::{ RayTracerError, Result };

/// The name of the group faces land in before any group is named.
pub const DEFAULT_GROUP: &str = "";

/// One corner of a face: a one-based vertex index and an optional one-based
/// normal index.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FaceVertex {
    pub vertex: usize,
    pub normal: Option<usize>,
}

impl FaceVertex {
    pub fn new(vertex: usize) -> FaceVertex {
        FaceVertex { vertex, normal: None }
    }

    pub fn with_normal(vertex: usize, normal: usize) -> FaceVertex {
        FaceVertex { vertex, normal: Some(normal) }
    }
}

/// A triangle mesh under construction.
#[derive(Clone, Debug)]
pub struct Model {
    vertices: Vec<Tuple4D>,
    normals: Vec<Tuple4D>,
    groups: BTreeMap<String, Shape>,
}

impl Default for Model {
    fn default() -> Model {
        let mut groups = BTreeMap::new();
        groups.insert(DEFAULT_GROUP.to_string(), Shape::group());

        Model {
            vertices: Vec::new(),
            normals: Vec::new(),
            groups,
        }
    }
}

/// Looks up a one-based index, failing if it is zero or past the end.
fn lookup(records: &[Tuple4D], index: usize, what: &str) -> Result<Tuple4D> {
    index.checked_sub(1)
        .and_then(|i| records.get(i))
        .copied()
        .ok_or_else(|| RayTracerError::InvalidArgument(format!(
            "{} index {} out of range (1..={})", what, index, records.len()
        )))
}

impl Model {
    pub fn new() -> Model {
        Default::default()
    }

    pub fn vertices(&self) -> &[Tuple4D] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Tuple4D] {
        &self.normals
    }

    /// Records a vertex, returning its one-based index.
    pub fn add_vertex(&mut self, p: Tuple4D) -> Result<usize> {
        self.vertices.push(p.expect_point("model vertex")?);
        Ok(self.vertices.len())
    }

    /// Records a vertex normal, returning its one-based index.
    pub fn add_normal(&mut self, n: Tuple4D) -> Result<usize> {
        self.normals.push(n.expect_vector("model normal")?);
        Ok(self.normals.len())
    }

    fn group_mut(&mut self, name: &str) -> &mut Shape {
        self.groups.entry(name.to_string()).or_insert_with(Shape::group)
    }

    /// Adds a ready-made triangle to a group, creating the group if needed.
    ///
    /// Only triangles and smooth triangles are accepted.
    pub fn add_triangle(&mut self, group: &str, triangle: Shape)
        -> Result<()> {
        match triangle.ty() {
            ShapeType::Triangle(_) | ShapeType::SmoothTriangle(_) => (),
            other => return Err(RayTracerError::InvalidArgument(format!(
                "models hold triangles only, got {:?}", other
            ))),
        }

        self.group_mut(group).add_child(triangle)
    }

    /// Adds a polygonal face to a group, returning the number of triangles
    /// produced.
    ///
    /// Faces with more than three corners are split by fan triangulation:
    /// corners `A B C D E` become `A-B-C`, `A-C-D` and `A-D-E`. A triangle is
    /// smooth when all three of its corners carry a normal.
    ///
    /// ```
    /// # use rayshade::model::{ Model, FaceVertex };
    /// # use rayshade::tuple::Tuple4D;
    /// let mut m = Model::new();
    /// for p in [[-1.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [1.0, 0.0, 0.0],
    ///           [1.0, 1.0, 0.0], [0.0, 2.0, 0.0]] {
    ///     m.add_vertex(Tuple4D::from(p)).unwrap();
    /// }
    ///
    /// let face: Vec<_> = (1..=5).map(FaceVertex::new).collect();
    /// assert_eq!(m.add_face("", &face).unwrap(), 3);
    /// ```
    pub fn add_face(&mut self, group: &str, face: &[FaceVertex])
        -> Result<usize> {
        if face.len() < 3 {
            return Err(RayTracerError::InvalidArgument(format!(
                "a face needs at least three vertices, got {}", face.len()
            )));
        }

        // Resolve every index up front so a bad face adds nothing.
        let mut corners = Vec::with_capacity(face.len());
        for fv in face.iter() {
            let p = lookup(&self.vertices, fv.vertex, "vertex")?;
            let n = match fv.normal {
                Some(ni) => Some(lookup(&self.normals, ni, "normal")?),
                None => None,
            };

            corners.push((p, n));
        }

        let (p1, n1) = corners[0];
        let mut triangles = Vec::with_capacity(corners.len() - 2);
        for pair in corners[1..].windows(2) {
            let (p2, n2) = pair[0];
            let (p3, n3) = pair[1];

            triangles.push(match (n1, n2, n3) {
                (Some(n1), Some(n2), Some(n3)) =>
                    Shape::smooth_triangle(p1, p2, p3, n1, n2, n3),
                _ => Shape::triangle(p1, p2, p3),
            });
        }

        let count = triangles.len();
        let target = self.group_mut(group);
        for triangle in triangles {
            target.add_child(triangle)?;
        }

        Ok(count)
    }

    /// Looks up a named group.
    pub fn group(&self, name: &str) -> Option<&Shape> {
        self.groups.get(name)
    }

    /// Names of every group, including the default one.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Collects the model into a single group.
    ///
    /// Every non-empty named group becomes a child of one parent group,
    /// which takes `transform` and pushes `material` down to every triangle.
    pub fn to_group(self, transform: Matrix4D, material: Material)
        -> Result<Shape> {
        let mut parent = Shape::group();
        let mut triangles = 0;
        let mut groups = 0;

        for group in self.groups.into_values() {
            let len = group.children().map_or(0, |c| c.len());
            if len == 0 {
                continue;
            }

            triangles += len;
            groups += 1;
            parent.add_child(group)?;
        }

        log::debug!("Model assembled: {} vertices, {} normals, {} triangles \
            in {} groups", self.vertices.len(), self.normals.len(),
            triangles, groups);

        parent.set_material(material);
        parent.set_transform(transform)?;
        Ok(parent)
    }
}

#[cfg(test)]
fn square_model() -> Model {
    let mut m = Model::new();
    m.add_vertex(Tuple4D::point(-1.0, 1.0, 0.0)).unwrap();
    m.add_vertex(Tuple4D::point(-1.0, 0.0, 0.0)).unwrap();
    m.add_vertex(Tuple4D::point( 1.0, 0.0, 0.0)).unwrap();
    m.add_vertex(Tuple4D::point( 1.0, 1.0, 0.0)).unwrap();
    m.add_vertex(Tuple4D::point( 0.0, 2.0, 0.0)).unwrap();
    m
}

#[cfg(test)]
fn corners(s: &Shape) -> (Tuple4D, Tuple4D, Tuple4D) {
    match s.ty() {
        ShapeType::Triangle(t) => (t.p1, t.p2, t.p3),
        ShapeType::SmoothTriangle(t) =>
            (t.triangle_info.p1, t.triangle_info.p2, t.triangle_info.p3),
        other => panic!("expected a triangle, got {:?}", other),
    }
}

#[test]
fn vertex_records_are_one_based() {
    let mut m = Model::new();

    assert_eq!(m.add_vertex(Tuple4D::point(-1.0, 1.0, 0.0)).unwrap(), 1);
    assert_eq!(m.add_vertex(Tuple4D::point(1.0, 0.0, 0.0)).unwrap(), 2);
    assert_eq!(m.vertices()[1], Tuple4D::point(1.0, 0.0, 0.0));
}

#[test]
fn records_must_be_points_and_vectors() {
    let mut m = Model::new();

    assert!(m.add_vertex(Tuple4D::vector(1.0, 0.0, 0.0)).is_err());
    assert!(m.add_normal(Tuple4D::point(1.0, 0.0, 0.0)).is_err());
    assert!(m.vertices().is_empty());
    assert!(m.normals().is_empty());
}

#[test]
fn triangle_faces() {
    let mut m = square_model();
    let face = |a, b, c| [FaceVertex::new(a), FaceVertex::new(b),
        FaceVertex::new(c)];

    m.add_face(DEFAULT_GROUP, &face(1, 2, 3)).unwrap();
    m.add_face(DEFAULT_GROUP, &face(1, 3, 4)).unwrap();

    let children = m.group(DEFAULT_GROUP).unwrap().children().unwrap();
    let v = m.vertices();

    assert_eq!(corners(&children[0]), (v[0], v[1], v[2]));
    assert_eq!(corners(&children[1]), (v[0], v[2], v[3]));
}

#[test]
fn triangulating_polygons() {
    let mut m = square_model();
    let face: Vec<_> = (1..=5).map(FaceVertex::new).collect();

    assert_eq!(m.add_face(DEFAULT_GROUP, &face).unwrap(), 3);

    let children = m.group(DEFAULT_GROUP).unwrap().children().unwrap();
    let v = m.vertices();

    assert_eq!(corners(&children[0]), (v[0], v[1], v[2]));
    assert_eq!(corners(&children[1]), (v[0], v[2], v[3]));
    assert_eq!(corners(&children[2]), (v[0], v[3], v[4]));
}

#[test]
fn faces_with_normals_are_smooth() {
    let mut m = square_model();
    m.add_normal(Tuple4D::vector(0.0, 0.0, 1.0)).unwrap();
    m.add_normal(Tuple4D::vector(0.707, 0.0, -0.707)).unwrap();
    m.add_normal(Tuple4D::vector(1.0, 2.0, 3.0)).unwrap();

    let face = [
        FaceVertex::with_normal(1, 3),
        FaceVertex::with_normal(2, 1),
        FaceVertex::with_normal(3, 2),
    ];
    m.add_face(DEFAULT_GROUP, &face).unwrap();

    let children = m.group(DEFAULT_GROUP).unwrap().children().unwrap();
    match children[0].ty() {
        ShapeType::SmoothTriangle(t) => {
            assert_eq!(t.n1, m.normals()[2]);
            assert_eq!(t.n2, m.normals()[0]);
            assert_eq!(t.n3, m.normals()[1]);
        },
        other => panic!("expected a smooth triangle, got {:?}", other),
    }
}

#[test]
fn partial_normals_give_flat_triangles() {
    let mut m = square_model();
    m.add_normal(Tuple4D::vector(0.0, 0.0, 1.0)).unwrap();

    let face = [
        FaceVertex::with_normal(1, 1),
        FaceVertex::new(2),
        FaceVertex::with_normal(3, 1),
    ];
    m.add_face(DEFAULT_GROUP, &face).unwrap();

    let children = m.group(DEFAULT_GROUP).unwrap().children().unwrap();
    assert!(matches!(children[0].ty(), ShapeType::Triangle(_)));
}

#[test]
fn bad_faces_are_rejected_whole() {
    let mut m = square_model();

    assert!(m.add_face(DEFAULT_GROUP,
        &[FaceVertex::new(1), FaceVertex::new(2)]).is_err());
    assert!(m.add_face(DEFAULT_GROUP,
        &[FaceVertex::new(0), FaceVertex::new(1), FaceVertex::new(2)])
        .is_err());
    assert!(m.add_face(DEFAULT_GROUP,
        &[FaceVertex::new(1), FaceVertex::new(2), FaceVertex::new(9)])
        .is_err());
    assert!(m.add_face(DEFAULT_GROUP,
        &[FaceVertex::new(1), FaceVertex::new(2),
          FaceVertex::with_normal(3, 1)]).is_err());

    let children = m.group(DEFAULT_GROUP).unwrap().children().unwrap();
    assert!(children.is_empty());
}

#[test]
fn triangles_in_groups() {
    let mut m = square_model();
    let face = |a, b, c| [FaceVertex::new(a), FaceVertex::new(b),
        FaceVertex::new(c)];

    m.add_face("FirstGroup", &face(1, 2, 3)).unwrap();
    m.add_face("SecondGroup", &face(1, 3, 4)).unwrap();

    let v = m.vertices();
    let first = m.group("FirstGroup").unwrap().children().unwrap();
    let second = m.group("SecondGroup").unwrap().children().unwrap();

    assert_eq!(corners(&first[0]), (v[0], v[1], v[2]));
    assert_eq!(corners(&second[0]), (v[0], v[2], v[3]));
    assert_eq!(m.group_names().collect::<Vec<_>>(),
        vec!["", "FirstGroup", "SecondGroup"]);
}

#[test]
fn add_triangle_accepts_only_triangles() {
    let mut m = Model::new();

    assert!(m.add_triangle("mesh", Shape::sphere()).is_err());
    m.add_triangle("mesh", Shape::triangle(
        Tuple4D::point(0.0, 1.0, 0.0),
        Tuple4D::point(-1.0, 0.0, 0.0),
        Tuple4D::point(1.0, 0.0, 0.0),
    )).unwrap();

    assert_eq!(m.group("mesh").unwrap().children().unwrap().len(), 1);
}

#[test]
fn model_to_group() {
    let mut m = square_model();
    let face = |a, b, c| [FaceVertex::new(a), FaceVertex::new(b),
        FaceVertex::new(c)];

    m.add_face("FirstGroup", &face(1, 2, 3)).unwrap();
    m.add_face("SecondGroup", &face(1, 3, 4)).unwrap();

    let material = Material {
        color: crate::color::Color::red(),
        ..Default::default()
    };
    let g = m.to_group(Matrix4D::translation(0.0, 0.0, 5.0), material)
        .unwrap();

    // The empty default group is skipped.
    let groups = g.children().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(*g.transform(), Matrix4D::translation(0.0, 0.0, 5.0));

    let triangle = &groups[0].children().unwrap()[0];
    assert_eq!(triangle.material, material);
}

#[test]
fn model_group_is_transformed_for_intersection() {
    use crate::ray::Ray4D;
    use crate::shape::intersect;

    let mut m = square_model();
    m.add_face(DEFAULT_GROUP, &[FaceVertex::new(1), FaceVertex::new(2),
        FaceVertex::new(3)]).unwrap();

    let g = m.to_group(Matrix4D::translation(0.0, 0.0, 5.0),
        Material::default()).unwrap();

    let r = Ray4D::new(Tuple4D::point(-0.5, 0.5, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0)).unwrap();
    let xs = intersect(&g, &r);

    assert_eq!(xs.len(), 1);
    assert!(crate::feq(xs.intersections[0].t, 10.0));
}
