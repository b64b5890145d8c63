use crate::ray::Ray4D;
use crate::tuple::Tuple4D;
use crate::color::Color;
use crate::matrix::Matrix4D;
use crate::light::{ PointLight, Material, lighting };
use crate::shape::{ Shape, intersect };
use crate::intersect::{ Intersections, IntersectionComputation };
use crate::error::Result;

/// A world with objects and light.
///
/// Worlds collect all objects as well as light for rendering. Most logic is
/// performed within worlds for the ray tracer.
///
/// Rendering borrows the world immutably, so a world cannot change while an
/// image of it is being produced.
#[derive(Clone, Debug)]
pub struct World {
    pub objects: Vec<Shape>,
    pub light_source: Option<PointLight>,

    /// The color returned for rays which hit nothing.
    pub background: Color,
}

impl Default for World {
    /// The standard two-sphere test world, lit from the upper left.
    fn default() -> World {
        let light_source = PointLight {
            intensity: Color::white(),
            position: Tuple4D::point(-10.0, 10.0, -10.0),
        };

        let s1 = Shape::sphere().with_material(Material {
            color: Color::rgb(0.8, 1.0, 0.6),
            diffuse: 0.7,
            specular: 0.2,
            ..Default::default()
        });

        let s2 = Shape::sphere().with_inverted_transform(
            Matrix4D::scaling(0.5, 0.5, 0.5),
            Matrix4D::scaling(2.0, 2.0, 2.0),
        );

        World {
            objects: vec![s1, s2],
            light_source: Some(light_source),
            background: Color::black(),
        }
    }
}

impl World {
    /// Creates a default world with two spheres.
    pub fn new() -> World {
        Default::default()
    }

    /// Creates an empty world with no objects and no light.
    pub fn empty() -> World {
        World {
            objects: Vec::new(),
            light_source: None,
            background: Color::black(),
        }
    }

    /// Adds an object, returning its index.
    pub fn add_object(&mut self, obj: Shape) -> usize {
        self.objects.push(obj);
        self.objects.len() - 1
    }

    /// Removes the object at `index`, if there is one.
    pub fn remove_object(&mut self, index: usize) -> Option<Shape> {
        if index < self.objects.len() {
            Some(self.objects.remove(index))
        } else {
            None
        }
    }

    pub fn set_light(&mut self, light: PointLight) {
        self.light_source = Some(light);
    }

    /// Intersects a ray against all objects in a world.
    ///
    /// The result is sorted ascending by `t`.
    pub fn intersect(&self, r: &Ray4D) -> Intersections<'_> {
        Intersections::aggregate(
            self.objects.iter().map(|obj| intersect(obj, r)).collect()
        )
    }

    /// Determines whether a point is shadowed.
    ///
    /// A point is shadowed when something lies strictly between it and the
    /// light. Without a light nothing casts a shadow.
    pub fn is_shadowed(&self, p: Tuple4D) -> Result<bool> {
        let light = match self.light_source {
            Some(ref light) => light,
            None => return Ok(false),
        };

        let v = light.position - p.expect_point("shadow test point")?;
        let distance = v.magnitude();
        let r = Ray4D::new(p, v.normalize())?;

        Ok(match self.intersect(&r).hit() {
            Some(i) => i.t < distance,
            None => false,
        })
    }

    /// Calculates the color for a hit, based on shadows and light.
    ///
    /// Reflected and refracted light are traced with `remaining` bounces
    /// left. Surfaces that are both reflective and transparent blend the two
    /// with Schlick's approximation.
    pub fn shade_hit(&self, comps: &IntersectionComputation, remaining: usize)
        -> Result<Color> {
        let m = &comps.obj.material;

        let surface = match self.light_source {
            Some(ref light) => lighting(m, comps.obj, light,
                comps.over_point, comps.eyev, comps.normalv,
                self.is_shadowed(comps.over_point)?)?,
            None => Color::black(),
        };

        let reflected = self.reflected_color(comps, remaining)?;
        let refracted = self.refracted_color(comps, remaining)?;

        if m.reflective > 0.0 && m.transparency > 0.0 {
            let reflectance = comps.schlick();
            Ok(surface
                + reflected * reflectance
                + refracted * (1.0 - reflectance))
        } else {
            Ok(surface + reflected + refracted)
        }
    }

    /// The color seen along the reflection of a hit.
    ///
    /// Black for non-reflective surfaces and when no bounces remain.
    pub fn reflected_color(&self, comps: &IntersectionComputation,
        remaining: usize) -> Result<Color> {
        let reflective = comps.obj.material.reflective;
        if remaining == 0 || reflective == 0.0 {
            return Ok(Color::black());
        }

        let r = Ray4D::new(comps.over_point, comps.reflectv)?;
        Ok(self.color_at(&r, remaining - 1)? * reflective)
    }

    /// The color seen through a transparent hit.
    ///
    /// Black for opaque surfaces, when no bounces remain, and under total
    /// internal reflection.
    pub fn refracted_color(&self, comps: &IntersectionComputation,
        remaining: usize) -> Result<Color> {
        let transparency = comps.obj.material.transparency;
        if remaining == 0 || transparency == 0.0 {
            return Ok(Color::black());
        }

        // Snell's law
        let n_ratio = comps.n1 / comps.n2;
        let cos_i = comps.eyev.dot(&comps.normalv);
        let sin2_t = n_ratio.powi(2) * (1.0 - cos_i.powi(2));
        if sin2_t > 1.0 {
            return Ok(Color::black());
        }

        let cos_t = (1.0 - sin2_t).sqrt();
        let direction = comps.normalv * (n_ratio * cos_i - cos_t)
            - comps.eyev * n_ratio;

        let r = Ray4D::new(comps.under_point, direction)?;
        Ok(self.color_at(&r, remaining - 1)? * transparency)
    }

    /// Determines a color based on the intersection of a ray and the objects.
    ///
    /// Rays which hit nothing take the world's background color.
    pub fn color_at(&self, r: &Ray4D, remaining: usize) -> Result<Color> {
        let is = self.intersect(r);

        match is.hit() {
            None => Ok(self.background),
            Some(i) => {
                let comps = IntersectionComputation::new(r, &i, Some(&is))?;
                self.shade_hit(&comps, remaining)
            },
        }
    }
}

#[cfg(test)]
use crate::consts::REFLECTION_RECURSION_DEPTH;

#[cfg(test)]
use crate::intersect::Intersection;

#[cfg(test)]
fn ray(origin: Tuple4D, direction: Tuple4D) -> Ray4D {
    Ray4D::new(origin, direction).unwrap()
}

#[cfg(test)]
fn light_at(x: f64, y: f64, z: f64) -> PointLight {
    PointLight::new(Color::white(), Tuple4D::point(x, y, z)).unwrap()
}

#[cfg(test)]
fn single(i: Intersection<'_>) -> Intersections<'_> {
    Intersections { intersections: vec![i] }
}

#[test]
fn intersect_default_world_with_ray() {
    let w: World = Default::default();
    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));

    let is = w.intersect(&r);

    assert_eq!(is.len(), 4);
    assert_eq!(is.intersections[0].t, 4.0);
    assert_eq!(is.intersections[1].t, 4.5);
    assert_eq!(is.intersections[2].t, 5.5);
    assert_eq!(is.intersections[3].t, 6.0);
}

#[test]
fn add_and_remove_objects() {
    let mut w = World::empty();
    assert_eq!(w.add_object(Shape::sphere()), 0);
    assert_eq!(w.add_object(Shape::plane()), 1);

    assert_eq!(w.remove_object(0), Some(Shape::sphere()));
    assert_eq!(w.objects.len(), 1);
    assert!(w.remove_object(3).is_none());
}

#[test]
fn shade_intersection_from_outside() {
    let w: World = Default::default();
    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));

    let i = Intersection::new(4.0, &w.objects[0]);
    let comps = IntersectionComputation::new(&r, &i, None).unwrap();
    let c = w.shade_hit(&comps, REFLECTION_RECURSION_DEPTH).unwrap();

    assert_eq!(c, Color::rgb(0.38066, 0.47583, 0.2855));
}

#[test]
fn shade_intersection_from_inside() {
    let mut w: World = Default::default();
    w.set_light(light_at(0.0, 0.25, 0.0));

    let r = ray(Tuple4D::point(0.0, 0.0, 0.0), Tuple4D::vector(0.0, 0.0, 1.0));

    let i = Intersection::new(0.5, &w.objects[1]);
    let comps = IntersectionComputation::new(&r, &i, None).unwrap();
    let c = w.shade_hit(&comps, REFLECTION_RECURSION_DEPTH).unwrap();

    assert_eq!(c, Color::rgb(0.90498, 0.90498, 0.90498));
}

#[test]
fn shade_intersection_in_shadow() {
    let mut w = World::empty();
    w.set_light(light_at(0.0, 0.0, -10.0));

    w.add_object(Shape::sphere());
    w.add_object(Shape::sphere()
        .with_transform(Matrix4D::translation(0.0, 0.0, 10.0)).unwrap());

    let r = ray(Tuple4D::point(0.0, 0.0, 5.0), Tuple4D::vector(0.0, 0.0, 1.0));

    let i = Intersection::new(4.0, &w.objects[1]);
    let comps = IntersectionComputation::new(&r, &i, None).unwrap();
    let c = w.shade_hit(&comps, REFLECTION_RECURSION_DEPTH).unwrap();

    assert_eq!(c, Color::rgb(0.1, 0.1, 0.1));
}

#[test]
fn shade_without_light_is_black() {
    let mut w: World = Default::default();
    w.light_source = None;

    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    assert_eq!(w.color_at(&r, REFLECTION_RECURSION_DEPTH).unwrap(),
        Color::black());
}

#[test]
fn color_ray_miss() {
    let w: World = Default::default();
    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 1.0, 0.0));

    assert_eq!(w.color_at(&r, REFLECTION_RECURSION_DEPTH).unwrap(),
        Color::black());
}

#[test]
fn color_ray_miss_uses_background() {
    let mut w: World = Default::default();
    w.background = Color::rgb(0.2, 0.3, 0.4);
    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 1.0, 0.0));

    assert_eq!(w.color_at(&r, REFLECTION_RECURSION_DEPTH).unwrap(),
        Color::rgb(0.2, 0.3, 0.4));
}

#[test]
fn color_ray_hit() {
    let w: World = Default::default();
    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));

    assert_eq!(w.color_at(&r, REFLECTION_RECURSION_DEPTH).unwrap(),
        Color::rgb(0.38066, 0.47583, 0.2855));
}

#[test]
fn color_behind_ray() {
    let mut w: World = Default::default();
    for obj in w.objects.iter_mut() {
        let mut m = obj.material;
        m.ambient = 1.0;
        obj.set_material(m);
    }

    let r = ray(Tuple4D::point(0.0, 0.0, 0.75),
        Tuple4D::vector(0.0, 0.0, -1.0));

    let inner_color = w.objects[1].material.color;
    assert_eq!(w.color_at(&r, REFLECTION_RECURSION_DEPTH).unwrap(),
        inner_color);
}

#[test]
fn shadow_collinear_point_and_light() {
    let w: World = Default::default();
    assert!(!w.is_shadowed(Tuple4D::point(0.0, 10.0, 0.0)).unwrap());
}

#[test]
fn shadow_light_between_point_and_spheres() {
    let w: World = Default::default();
    assert!(w.is_shadowed(Tuple4D::point(10.0, -10.0, 10.0)).unwrap());
}

#[test]
fn shadow_object_behind_light() {
    let w: World = Default::default();
    assert!(!w.is_shadowed(Tuple4D::point(-20.0, 20.0, -20.0)).unwrap());
}

#[test]
fn shadow_object_behind_point() {
    let w: World = Default::default();
    assert!(!w.is_shadowed(Tuple4D::point(-2.0, 2.0, -2.0)).unwrap());
}

#[test]
fn nothing_is_shadowed_without_light() {
    let mut w: World = Default::default();
    w.light_source = None;

    assert!(!w.is_shadowed(Tuple4D::point(10.0, -10.0, 10.0)).unwrap());
}

#[test]
fn reflected_color_of_nonreflective_material() {
    let mut w: World = Default::default();
    let mut m = w.objects[1].material;
    m.ambient = 1.0;
    w.objects[1].set_material(m);

    let r = ray(Tuple4D::point(0.0, 0.0, 0.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let i = Intersection::new(1.0, &w.objects[1]);
    let comps = IntersectionComputation::new(&r, &i, None).unwrap();

    assert_eq!(w.reflected_color(&comps, REFLECTION_RECURSION_DEPTH).unwrap(),
        Color::black());
}

#[cfg(test)]
fn world_with_reflective_floor() -> World {
    let mut w: World = Default::default();
    w.add_object(Shape::plane()
        .with_material(Material { reflective: 0.5, ..Default::default() })
        .with_transform(Matrix4D::translation(0.0, -1.0, 0.0)).unwrap());
    w
}

#[cfg(test)]
fn ray_toward_floor() -> Ray4D {
    let half = 2.0f64.sqrt() / 2.0;
    ray(Tuple4D::point(0.0, 0.0, -3.0), Tuple4D::vector(0.0, -half, half))
}

#[test]
fn reflected_color_of_reflective_material() {
    let w = world_with_reflective_floor();
    let r = ray_toward_floor();

    let i = Intersection::new(2.0f64.sqrt(), &w.objects[2]);
    let comps = IntersectionComputation::new(&r, &i, None).unwrap();

    assert_eq!(w.reflected_color(&comps, REFLECTION_RECURSION_DEPTH).unwrap(),
        Color::rgb(0.19033, 0.23791, 0.14274));
}

#[test]
fn shade_hit_with_reflective_material() {
    let w = world_with_reflective_floor();
    let r = ray_toward_floor();

    let i = Intersection::new(2.0f64.sqrt(), &w.objects[2]);
    let comps = IntersectionComputation::new(&r, &i, None).unwrap();

    assert_eq!(w.shade_hit(&comps, REFLECTION_RECURSION_DEPTH).unwrap(),
        Color::rgb(0.87677, 0.92436, 0.82918));
}

#[test]
fn reflected_color_at_maximum_depth() {
    let w = world_with_reflective_floor();
    let r = ray_toward_floor();

    let i = Intersection::new(2.0f64.sqrt(), &w.objects[2]);
    let comps = IntersectionComputation::new(&r, &i, None).unwrap();

    assert_eq!(w.reflected_color(&comps, 0).unwrap(), Color::black());
}

#[test]
fn mutually_reflective_surfaces_terminate() {
    let mut w = World::empty();
    w.set_light(light_at(0.0, 0.0, 0.0));

    let mirror = Material { reflective: 1.0, ..Default::default() };
    w.add_object(Shape::plane().with_material(mirror)
        .with_transform(Matrix4D::translation(0.0, -1.0, 0.0)).unwrap());
    w.add_object(Shape::plane().with_material(mirror)
        .with_transform(Matrix4D::translation(0.0, 1.0, 0.0)).unwrap());

    let r = ray(Tuple4D::point(0.0, 0.0, 0.0), Tuple4D::vector(0.0, 1.0, 0.0));
    assert!(w.color_at(&r, REFLECTION_RECURSION_DEPTH).is_ok());
}

#[test]
fn refracted_color_of_opaque_surface() {
    let w: World = Default::default();
    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));

    let shape = &w.objects[0];
    let is = Intersections {
        intersections: vec![
            Intersection::new(4.0, shape),
            Intersection::new(6.0, shape),
        ]
    };

    let comps = IntersectionComputation::new(&r, &is.intersections[0],
        Some(&is)).unwrap();
    assert_eq!(w.refracted_color(&comps, 5).unwrap(), Color::black());
}

#[test]
fn refracted_color_at_maximum_depth() {
    let mut w: World = Default::default();
    w.objects[0].set_material(Material::glass());

    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));

    let shape = &w.objects[0];
    let is = Intersections {
        intersections: vec![
            Intersection::new(4.0, shape),
            Intersection::new(6.0, shape),
        ]
    };

    let comps = IntersectionComputation::new(&r, &is.intersections[0],
        Some(&is)).unwrap();
    assert_eq!(w.refracted_color(&comps, 0).unwrap(), Color::black());
}

#[test]
fn refracted_color_under_total_internal_reflection() {
    let mut w: World = Default::default();
    w.objects[0].set_material(Material::glass());

    let half = 2.0f64.sqrt() / 2.0;
    let r = ray(Tuple4D::point(0.0, 0.0, half), Tuple4D::vector(0.0, 1.0, 0.0));

    let shape = &w.objects[0];
    let is = Intersections {
        intersections: vec![
            Intersection::new(-half, shape),
            Intersection::new(half, shape),
        ]
    };

    // Inside the sphere, so look at the second intersection.
    let comps = IntersectionComputation::new(&r, &is.intersections[1],
        Some(&is)).unwrap();
    assert_eq!(w.refracted_color(&comps, 5).unwrap(), Color::black());
}

#[test]
fn shade_hit_with_transparent_material() {
    let mut w: World = Default::default();

    let floor = w.add_object(Shape::plane()
        .with_material(Material {
            transparency: 0.5,
            refractive_index: 1.5,
            ..Default::default()
        })
        .with_transform(Matrix4D::translation(0.0, -1.0, 0.0)).unwrap());

    w.add_object(Shape::sphere()
        .with_material(Material {
            color: Color::red(),
            ambient: 0.5,
            ..Default::default()
        })
        .with_transform(Matrix4D::translation(0.0, -3.5, -0.5)).unwrap());

    let r = ray_toward_floor();
    let is = single(Intersection::new(2.0f64.sqrt(), &w.objects[floor]));

    let comps = IntersectionComputation::new(&r, &is.intersections[0],
        Some(&is)).unwrap();
    assert_eq!(w.shade_hit(&comps, 5).unwrap(),
        Color::rgb(0.93642, 0.68642, 0.68642));
}

#[test]
fn shade_hit_with_reflective_transparent_material() {
    let mut w: World = Default::default();

    let floor = w.add_object(Shape::plane()
        .with_material(Material {
            reflective: 0.5,
            transparency: 0.5,
            refractive_index: 1.5,
            ..Default::default()
        })
        .with_transform(Matrix4D::translation(0.0, -1.0, 0.0)).unwrap());

    w.add_object(Shape::sphere()
        .with_material(Material {
            color: Color::red(),
            ambient: 0.5,
            ..Default::default()
        })
        .with_transform(Matrix4D::translation(0.0, -3.5, -0.5)).unwrap());

    let r = ray_toward_floor();
    let is = single(Intersection::new(2.0f64.sqrt(), &w.objects[floor]));

    let comps = IntersectionComputation::new(&r, &is.intersections[0],
        Some(&is)).unwrap();
    assert_eq!(w.shade_hit(&comps, 5).unwrap(),
        Color::rgb(0.93391, 0.69643, 0.69243));
}

#[test]
fn default_world_inner_sphere_is_half_size() {
    let w = World::default();
    let inner = &w.objects[1];

    assert_eq!(*inner.transform(), Matrix4D::scaling(0.5, 0.5, 0.5));

    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let ts: Vec<f64> = intersect(inner, &r).intersections.iter()
        .map(|i| i.t)
        .collect();
    assert_eq!(ts, vec![4.5, 5.5]);
}
