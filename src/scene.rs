//! JSON scene descriptions.
//!
//! A scene file names the canvas, camera, light and shapes:
//!
//! ```json
//! {
//!   "canvas_width": 100, "canvas_height": 50, "field_of_view": 1.0472,
//!   "camera_from": [0, 1.5, -5], "camera_to": [0, 1, 0],
//!   "camera_up": [0, 1, 0],
//!   "light": { "intensity": [1, 1, 1], "position": [-10, 10, -10] },
//!   "shapes": [
//!     { "type": "sphere", "transform": [{ "translate": [0, 1, 0] }],
//!       "material": { "color": [1, 0.2, 1], "specular": 0.3 } }
//!   ]
//! }
//! ```
//!
//! Transform lists are applied in order: the first entry acts on the shape
//! first.

use std::io::Read;

use serde::{ Serialize, Deserialize };

use crate::tuple::Tuple4D;
use crate::color::Color;
use crate::matrix::Matrix4D;
use crate::shape::Shape;
use crate::pattern::Pattern;
use crate::light::{ PointLight, Material };
use crate::world::World;
use crate::camera::Camera;
use crate::error::{ RayTracerError, Result };

/// A world together with the camera that looks at it.
#[derive(Clone, Debug)]
pub struct Scene {
    pub world: World,
    pub camera: Camera,
}

impl Scene {
    /// Parses a scene from a JSON string.
    pub fn from_json(json: &str) -> Result<Scene> {
        let scene_json: SceneJson = serde_json::from_str(json)?;
        Scene::try_from(scene_json)
    }

    /// Parses a scene from any JSON source.
    pub fn from_reader<R: Read>(reader: R) -> Result<Scene> {
        let scene_json: SceneJson = serde_json::from_reader(reader)?;
        Scene::try_from(scene_json)
    }
}

impl TryFrom<SceneJson> for Scene {
    type Error = RayTracerError;

    fn try_from(scene_json: SceneJson) -> Result<Scene> {
        // Create the camera transform from the view parameters.
        let camera_transform = Matrix4D::view_transform(
            Tuple4D::from(scene_json.camera_from),
            Tuple4D::from(scene_json.camera_to),
            vector(scene_json.camera_up),
        );

        let camera = Camera::new(
            scene_json.canvas_width,
            scene_json.canvas_height,
            scene_json.field_of_view,
        )?.with_transform(camera_transform)?;

        let mut world = World::empty();
        if let Some(light) = scene_json.light {
            world.set_light(PointLight::new(
                Color::from(light.intensity),
                Tuple4D::from(light.position),
            )?);
        }

        if let Some(background) = scene_json.background {
            world.background = Color::from(background);
        }

        for shape_json in scene_json.shapes.into_iter() {
            world.add_object(Shape::try_from(shape_json)?);
        }

        log::debug!("Scene loaded: {} top-level shapes, {}x{} canvas",
            world.objects.len(), camera.hsize(), camera.vsize());

        Ok(Scene { world, camera })
    }
}

fn vector(v: [f64; 3]) -> Tuple4D {
    Tuple4D::vector(v[0], v[1], v[2])
}

fn scene_error(msg: String) -> RayTracerError {
    RayTracerError::Scene(msg)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneJson {
    canvas_width: usize,
    canvas_height: usize,
    field_of_view: f64,

    camera_from: [f64; 3],
    camera_to: [f64; 3],
    camera_up: [f64; 3],

    #[serde(default)]
    light: Option<LightJson>,

    #[serde(default)]
    background: Option<[f64; 3]>,

    shapes: Vec<ShapeJson>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct LightJson {
    intensity: [f64; 3],
    position: [f64; 3],
}

/// One step of a transform list.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TransformJson {
    Translate([f64; 3]),
    Scale([f64; 3]),
    RotateX(f64),
    RotateY(f64),
    RotateZ(f64),
    Shear([f64; 6]),

    /// Sixteen values in row-major order.
    Matrix(Vec<f64>),
}

impl TryFrom<&TransformJson> for Matrix4D {
    type Error = RayTracerError;

    fn try_from(t: &TransformJson) -> Result<Matrix4D> {
        Ok(match *t {
            TransformJson::Translate([x, y, z]) =>
                Matrix4D::translation(x, y, z),
            TransformJson::Scale([x, y, z]) => Matrix4D::scaling(x, y, z),
            TransformJson::RotateX(r) => Matrix4D::rotation_x(r),
            TransformJson::RotateY(r) => Matrix4D::rotation_y(r),
            TransformJson::RotateZ(r) => Matrix4D::rotation_z(r),
            TransformJson::Shear([xy, xz, yx, yz, zx, zy]) =>
                Matrix4D::shearing(xy, xz, yx, yz, zx, zy),
            TransformJson::Matrix(ref data) =>
                Matrix4D::try_from(data.as_slice())?,
        })
    }
}

/// Composes a transform list, first entry innermost.
fn compose(transforms: &[TransformJson]) -> Result<Matrix4D> {
    transforms.iter().try_fold(Matrix4D::identity(), |acc, t| {
        Ok(Matrix4D::try_from(t)? * acc)
    })
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct MaterialJson {
    color: Option<[f64; 3]>,
    pattern: Option<PatternJson>,

    ambient: Option<f64>,
    diffuse: Option<f64>,
    specular: Option<f64>,
    shininess: Option<f64>,

    reflective: Option<f64>,
    transparency: Option<f64>,
    refractive_index: Option<f64>,
}

impl TryFrom<MaterialJson> for Material {
    type Error = RayTracerError;

    fn try_from(m: MaterialJson) -> Result<Material> {
        let d = Material::default();

        Ok(Material {
            color: m.color.map_or(d.color, Color::from),
            pattern: m.pattern.map(Pattern::try_from).transpose()?,

            ambient: m.ambient.unwrap_or(d.ambient),
            diffuse: m.diffuse.unwrap_or(d.diffuse),
            specular: m.specular.unwrap_or(d.specular),
            shininess: m.shininess.unwrap_or(d.shininess),

            reflective: m.reflective.unwrap_or(d.reflective),
            transparency: m.transparency.unwrap_or(d.transparency),
            refractive_index: m.refractive_index.unwrap_or(d.refractive_index),
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct PatternJson {
    #[serde(rename = "type")]
    ty: String,

    colors: Vec<[f64; 3]>,

    #[serde(default)]
    transform: Vec<TransformJson>,
}

impl TryFrom<PatternJson> for Pattern {
    type Error = RayTracerError;

    fn try_from(p: PatternJson) -> Result<Pattern> {
        let colors: Vec<Color> = p.colors.into_iter().map(Color::from).collect();

        let pattern = match (p.ty.as_str(), colors.as_slice()) {
            ("solid", &[c]) => Pattern::solid(c),
            ("stripe", &[a, b]) => Pattern::stripe(a, b),
            ("gradient", &[a, b]) => Pattern::gradient(a, b),
            ("ring", &[a, b]) => Pattern::ring(a, b),
            ("checker", &[a, b]) => Pattern::checker(a, b),
            (ty, _) => return Err(scene_error(format!(
                "unknown pattern '{}' with {} colors", ty, colors.len()
            ))),
        };

        pattern.with_transform(compose(&p.transform)?)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ShapeJson {
    #[serde(rename = "type")]
    ty: String,

    #[serde(default)]
    transform: Vec<TransformJson>,

    #[serde(default)]
    material: Option<MaterialJson>,

    /// Members of a group, or the two operands of a CSG shape.
    #[serde(default)]
    children: Vec<ShapeJson>,

    /// Truncation limits for cylinders and cones.
    #[serde(default)]
    minimum: Option<f64>,
    #[serde(default)]
    maximum: Option<f64>,
    #[serde(default)]
    closed: bool,

    /// Triangle corners, and for smooth triangles their normals.
    #[serde(default)]
    points: Vec<[f64; 3]>,
    #[serde(default)]
    normals: Vec<[f64; 3]>,
}

impl TryFrom<ShapeJson> for Shape {
    type Error = RayTracerError;

    fn try_from(shape_json: ShapeJson) -> Result<Shape> {
        let minimum = shape_json.minimum.unwrap_or(f64::NEG_INFINITY);
        let maximum = shape_json.maximum.unwrap_or(f64::INFINITY);
        let closed = shape_json.closed;
        let points: Vec<Tuple4D> = shape_json.points.iter()
            .map(|&p| Tuple4D::from(p)).collect();
        let normals: Vec<Tuple4D> = shape_json.normals.iter()
            .map(|&n| vector(n)).collect();

        let mut children = shape_json.children.into_iter();
        let mut shape = match shape_json.ty.as_str() {
            // Primitives
            "sphere" => Shape::sphere(),
            "plane" => Shape::plane(),
            "cube" => Shape::cube(),
            "cylinder" if closed => Shape::capped_cylinder(minimum, maximum),
            "cylinder" => Shape::bounded_cylinder(minimum, maximum),
            "cone" if closed => Shape::capped_cone(minimum, maximum),
            "cone" => Shape::bounded_cone(minimum, maximum),

            "triangle" => match points.as_slice() {
                &[p1, p2, p3] => Shape::triangle(p1, p2, p3),
                _ => return Err(scene_error(format!(
                    "triangle needs 3 points, got {}", points.len()
                ))),
            },
            "smooth_triangle" => match (points.as_slice(), normals.as_slice()) {
                (&[p1, p2, p3], &[n1, n2, n3]) =>
                    Shape::smooth_triangle(p1, p2, p3, n1, n2, n3),
                _ => return Err(scene_error(format!(
                    "smooth triangle needs 3 points and 3 normals, got {} and {}",
                    points.len(), normals.len()
                ))),
            },

            // Group-likes
            "group" => {
                // It's okay to have an empty group (no children).
                let mut group = Shape::group();
                for child in children.by_ref() {
                    group.add_child(Shape::try_from(child)?)?;
                }

                group
            },
            op @ ("union" | "intersection" | "difference") => {
                let (left, right) = match (children.next(), children.next()) {
                    (Some(l), Some(r)) => (l, r),
                    _ => return Err(scene_error(format!(
                        "CSG {} must have two operands", op
                    ))),
                };

                let left = Shape::try_from(left)?;
                let right = Shape::try_from(right)?;
                match op {
                    "union" => Shape::csg_union(left, right),
                    "intersection" => Shape::csg_intersection(left, right),
                    _ => Shape::csg_difference(left, right),
                }
            },

            other => return Err(scene_error(format!(
                "unrecognized shape type '{}'", other
            ))),
        };

        if children.next().is_some() {
            return Err(scene_error(format!(
                "shape type '{}' has too many children", shape_json.ty
            )));
        }

        if let Some(material) = shape_json.material {
            shape.set_material(Material::try_from(material)?);
        }

        shape.set_transform(compose(&shape_json.transform)?)?;
        Ok(shape)
    }
}

#[cfg(test)]
const DEMO_SCENE: &str = include_str!("../scenes/demo.json");

#[test]
fn load_demo_scene() {
    let scene = Scene::from_json(DEMO_SCENE).unwrap();

    assert_eq!(scene.camera.hsize(), 100);
    assert_eq!(scene.camera.vsize(), 50);
    assert!(scene.world.light_source.is_some());
    assert_eq!(scene.world.objects.len(), 5);
}

#[test]
fn transforms_apply_in_listed_order() {
    let json = r#"{
        "canvas_width": 10, "canvas_height": 10, "field_of_view": 1.0,
        "camera_from": [0, 0, -5], "camera_to": [0, 0, 0],
        "camera_up": [0, 1, 0],
        "shapes": [
            { "type": "sphere",
              "transform": [{ "scale": [2, 2, 2] },
                            { "translate": [1, 0, 0] }] }
        ]
    }"#;

    let scene = Scene::from_json(json).unwrap();
    let expected = Matrix4D::translation(1.0, 0.0, 0.0)
        * Matrix4D::scaling(2.0, 2.0, 2.0);

    assert_eq!(*scene.world.objects[0].transform(), expected);
    assert!(scene.world.light_source.is_none());
}

#[test]
fn material_fields_default_when_missing() {
    let json = r#"{
        "canvas_width": 10, "canvas_height": 10, "field_of_view": 1.0,
        "camera_from": [0, 0, -5], "camera_to": [0, 0, 0],
        "camera_up": [0, 1, 0],
        "shapes": [
            { "type": "plane",
              "material": { "reflective": 0.5,
                            "pattern": { "type": "checker",
                                         "colors": [[1, 1, 1], [0, 0, 0]] } } }
        ]
    }"#;

    let scene = Scene::from_json(json).unwrap();
    let m = scene.world.objects[0].material;

    assert_eq!(m.reflective, 0.5);
    assert_eq!(m.diffuse, 0.9);
    assert_eq!(m.pattern,
        Some(Pattern::checker(Color::white(), Color::black())));
}

#[test]
fn groups_and_csg_take_children() {
    let json = r#"{
        "canvas_width": 10, "canvas_height": 10, "field_of_view": 1.0,
        "camera_from": [0, 0, -5], "camera_to": [0, 0, 0],
        "camera_up": [0, 1, 0],
        "shapes": [
            { "type": "group", "children": [
                { "type": "cylinder", "minimum": 0, "maximum": 1,
                  "closed": true },
                { "type": "difference", "children": [
                    { "type": "cube" }, { "type": "sphere" } ] }
            ] }
        ]
    }"#;

    let scene = Scene::from_json(json).unwrap();
    let group = &scene.world.objects[0];
    let children = group.children().unwrap();

    assert_eq!(children.len(), 2);
    assert_eq!(children[0], Shape::capped_cylinder(0.0, 1.0));
    assert_eq!(children[1].csg_left(), Some(&Shape::cube()));
}

#[test]
fn malformed_scenes_are_errors() {
    let header = r#""canvas_width": 10, "canvas_height": 10,
        "field_of_view": 1.0, "camera_from": [0, 0, -5],
        "camera_to": [0, 0, 0], "camera_up": [0, 1, 0]"#;
    let scene = |shapes: &str| format!("{{ {}, \"shapes\": [{}] }}",
        header, shapes);

    // Unknown shape, lone CSG operand, wrong triangle arity, bad matrix
    for shapes in [
        r#"{ "type": "torus" }"#,
        r#"{ "type": "union", "children": [{ "type": "cube" }] }"#,
        r#"{ "type": "triangle", "points": [[0, 0, 0], [1, 0, 0]] }"#,
        r#"{ "type": "sphere", "transform": [{ "matrix": [1, 0, 0] }] }"#,
        r#"{ "type": "sphere", "transform": [{ "scale": [0, 1, 1] }] }"#,
        r#"{ "type": "sphere", "children": [{ "type": "cube" }] }"#,
    ] {
        assert!(Scene::from_json(&scene(shapes)).is_err(), "{}", shapes);
    }

    assert!(matches!(Scene::from_json("{ not json"),
        Err(RayTracerError::Json(_))));
}

#[test]
fn from_reader_matches_from_json() {
    let a = Scene::from_json(DEMO_SCENE).unwrap();
    let b = Scene::from_reader(DEMO_SCENE.as_bytes()).unwrap();

    assert_eq!(a.camera, b.camera);
    assert_eq!(a.world.objects, b.world.objects);
}
