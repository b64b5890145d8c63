use crate::consts::{ VACUUM_RI, GLASS_RI };
use crate::color::Color;
use crate::pattern::Pattern;
use crate::tuple::Tuple4D;
use crate::shape::Shape;
use crate::error::Result;

/// A point light.
///
/// A very simple light source. Provides a color and a position where light is
/// produced from.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PointLight {
    pub intensity: Color,
    pub position: Tuple4D,
}

impl PointLight {
    /// Creates a point light, failing if `position` isn't a point.
    pub fn new(intensity: Color, position: Tuple4D) -> Result<PointLight> {
        Ok(PointLight {
            intensity,
            position: position.expect_point("light position")?,
        })
    }
}

/// A material record.
///
/// Materials use attributes from the Phong reflection model; ambient, diffuse,
/// specular and shininess. `reflective`, `transparency` and
/// `refractive_index` drive the secondary rays traced by the world.
///
/// Materials are plain values; every shape holds its own copy.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    pub color: Color,
    pub pattern: Option<Pattern>,

    pub ambient: f64,
    pub diffuse: f64,
    pub specular: f64,
    pub shininess: f64,

    pub reflective: f64,
    pub transparency: f64,
    pub refractive_index: f64,
}

impl Default for Material {
    fn default() -> Material {
        Material {
            color: Color::white(),
            pattern: None,

            ambient: 0.1,
            diffuse: 0.9,
            specular: 0.9,
            shininess: 200.0,

            reflective: 0.0,
            transparency: 0.0,
            refractive_index: VACUUM_RI,
        }
    }
}

impl Material {
    /// A fully transparent glass material.
    pub fn glass() -> Material {
        Material {
            transparency: 1.0,
            refractive_index: GLASS_RI,
            ..Default::default()
        }
    }

    /// The surface color at a world-space point on `obj`.
    ///
    /// The pattern, if any, takes precedence over the flat `color`.
    pub fn color_at(&self, obj: &Shape, world_point: Tuple4D) -> Color {
        match self.pattern {
            Some(ref pattern) => pattern.pattern_at_object(obj, world_point),
            None => self.color,
        }
    }
}

/// Calculate the lighting of a point in an environment.
///
/// Effectively, this function takes a material, a single light, a point, the
/// eye vector and the normal vector, and calculates how the light looks from
/// the eye (the Phong reflection model). Position is irrelevant, bar the angle
/// around `point`.
///
/// If this point is in a shadow (parameter `in_shadow`), only ambient light is
/// used.
///
/// Fails if `point` is not a point, or `eyev` / `normalv` are not vectors.
pub fn lighting(m: &Material, obj: &Shape, light: &PointLight,
    point: Tuple4D, eyev: Tuple4D, normalv: Tuple4D, in_shadow: bool)
    -> Result<Color> {
    let point = point.expect_point("lighting position")?;
    let eyev = eyev.expect_vector("eye vector")?;
    let normalv = normalv.expect_vector("normal vector")?;

    // Combine surface color with light's color
    let effective_color = m.color_at(obj, point) * light.intensity;
    let ambient = effective_color * m.ambient;

    if in_shadow {
        return Ok(ambient);
    }

    let lightv = (light.position - point).normalize();

    // A negative dot product means the light is behind the surface.
    let light_dot_normal = lightv.dot(&normalv);
    if light_dot_normal < 0.0 {
        return Ok(ambient);
    }

    let diffuse = effective_color * m.diffuse * light_dot_normal;

    let reflectv = (-lightv).reflect(&normalv);
    let reflect_dot_eye = reflectv.dot(&eyev);

    let specular = if reflect_dot_eye <= 0.0 {
        Color::black()
    } else {
        let factor = reflect_dot_eye.powf(m.shininess);
        light.intensity * m.specular * factor
    };

    Ok(ambient + diffuse + specular)
}

#[cfg(test)]
fn light_at(x: f64, y: f64, z: f64) -> PointLight {
    PointLight::new(Color::white(), Tuple4D::point(x, y, z)).unwrap()
}

#[test]
fn default_material() {
    let m = Material::default();

    assert_eq!(m.color, Color::white());
    assert_eq!(m.ambient, 0.1);
    assert_eq!(m.diffuse, 0.9);
    assert_eq!(m.specular, 0.9);
    assert_eq!(m.shininess, 200.0);
    assert_eq!(m.reflective, 0.0);
    assert_eq!(m.transparency, 0.0);
    assert_eq!(m.refractive_index, 1.0);
}

#[test]
fn point_light_requires_a_point() {
    assert!(PointLight::new(Color::white(), Tuple4D::vector(0.0, 0.0, 0.0))
        .is_err());
}

#[test]
fn eye_between_light_and_surface() {
    let m = Material::default();
    let s = Shape::sphere();

    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);
    let light = light_at(0.0, 0.0, -10.0);

    let res = lighting(&m, &s, &light, Tuple4D::point(0.0, 0.0, 0.0),
        eyev, normalv, false).unwrap();
    assert_eq!(res, Color::rgb(1.9, 1.9, 1.9));
}

#[test]
fn eye_between_light_and_surface_offset_45() {
    let m = Material::default();
    let s = Shape::sphere();

    let eyev = Tuple4D::vector(0.0, 2.0f64.sqrt() / 2.0, 2.0f64.sqrt() / 2.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);
    let light = light_at(0.0, 0.0, -10.0);

    let res = lighting(&m, &s, &light, Tuple4D::point(0.0, 0.0, 0.0),
        eyev, normalv, false).unwrap();
    assert_eq!(res, Color::rgb(1.0, 1.0, 1.0));
}

#[test]
fn eye_opposite_from_surface_offset_45() {
    let m = Material::default();
    let s = Shape::sphere();

    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);
    let light = light_at(0.0, 10.0, -10.0);

    let res = lighting(&m, &s, &light, Tuple4D::point(0.0, 0.0, 0.0),
        eyev, normalv, false).unwrap();
    assert_eq!(res, Color::rgb(0.7364, 0.7364, 0.7364));
}

#[test]
fn eye_opposite_from_surface_in_reflection() {
    let m = Material::default();
    let s = Shape::sphere();

    let eyev = Tuple4D::vector(0., -(2.0f64.sqrt())/2., -(2.0f64.sqrt())/2.);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);
    let light = light_at(0.0, 10.0, -10.0);

    let res = lighting(&m, &s, &light, Tuple4D::point(0.0, 0.0, 0.0),
        eyev, normalv, false).unwrap();
    assert_eq!(res, Color::rgb(1.6364, 1.6364, 1.6364));
}

#[test]
fn eye_across_surface_from_light() {
    let m = Material::default();
    let s = Shape::sphere();

    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);
    let light = light_at(0.0, 0.0, 10.0);

    let res = lighting(&m, &s, &light, Tuple4D::point(0.0, 0.0, 0.0),
        eyev, normalv, false).unwrap();
    assert_eq!(res, Color::rgb(0.1, 0.1, 0.1));
}

#[test]
fn lighting_with_surface_in_shadow() {
    let m = Material::default();
    let s = Shape::sphere();

    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);
    let light = light_at(0.0, 0.0, -10.0);

    let res = lighting(&m, &s, &light, Tuple4D::point(0.0, 0.0, 0.0),
        eyev, normalv, true).unwrap();
    assert_eq!(res, Color::rgb(0.1, 0.1, 0.1));
}

#[test]
fn lighting_rejects_misused_tuples() {
    let m = Material::default();
    let s = Shape::sphere();
    let light = light_at(0.0, 0.0, -10.0);
    let p = Tuple4D::point(0.0, 0.0, 0.0);
    let v = Tuple4D::vector(0.0, 0.0, -1.0);

    assert!(lighting(&m, &s, &light, v, v, v, false).is_err());
    assert!(lighting(&m, &s, &light, p, p, v, false).is_err());
    assert!(lighting(&m, &s, &light, p, v, p, false).is_err());
}

#[test]
fn lighting_with_stripe_pattern() {
    let m = Material {
        color: Color::rgb(0.5, 0.5, 0.5),
        pattern: Some(
            Pattern::stripe(Color::white(), Color::black())
        ),

        // Note that ONLY ambient light is included, as the color of ambient
        // light is mostly predictable
        ambient: 1.0,
        diffuse: 0.0,
        specular: 0.0,

        ..Default::default()
    };

    let s = Shape::sphere().with_material(m);

    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);
    let light = light_at(0.0, 0.0, -10.0);

    assert_eq!(
        Color::white(),
        lighting(&m, &s, &light, Tuple4D::point(0.9, 0.0, 0.0),
            eyev, normalv, false).unwrap()
    );

    assert_eq!(
        Color::black(),
        lighting(&m, &s, &light, Tuple4D::point(1.1, 0.0, 0.0),
            eyev, normalv, false).unwrap()
    );
}
