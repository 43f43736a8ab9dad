use glam::Vec3;

use crate::scene::Scene;
use crate::state::ObjectKind;

/// Half line starting at `origin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }
}

/// Axis aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(
            Self {
                min: Vec3::splat(f32::INFINITY),
                max: Vec3::splat(f32::NEG_INFINITY),
            },
            |bounds, point| Self {
                min: bounds.min.min(point),
                max: bounds.max.max(point),
            },
        )
    }

    /// Distance along the ray to the first face it enters.
    ///
    /// A ray starting inside the box only meets back faces and reports no hit.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let inverse = ray.direction.recip();
        let t1 = (self.min - ray.origin) * inverse;
        let t2 = (self.max - ray.origin) * inverse;
        let near = t1.min(t2).max_element();
        let far = t1.max(t2).min_element();
        if near > far || near < 0.0 || near.is_nan() {
            return None;
        }
        Some(near)
    }
}

/// Nearest interactive object under the crosshair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Index into [`Scene::objects`].
    pub object: usize,
    pub kind: ObjectKind,
    pub distance: f32,
}

#[derive(Debug, Clone)]
struct Target {
    object: usize,
    kind: ObjectKind,
    bounds: Aabb,
}

/// Casts the sight line against the fixed set of interactive objects.
///
/// Hover feedback and click resolution both go through [`HitTester::pick`].
#[derive(Debug, Clone)]
pub struct HitTester {
    targets: Vec<Target>,
    range: f32,
}

impl HitTester {
    pub fn from_scene(scene: &Scene, range: f32) -> Self {
        let targets = scene
            .interactive_objects()
            .map(|(object, scene_object, interactive)| Target {
                object,
                kind: interactive.kind,
                bounds: scene_object.world_bounds(),
            })
            .collect();
        Self { targets, range }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Closest intersection regardless of distance.
    pub fn nearest(&self, ray: &Ray) -> Option<Hit> {
        self.targets
            .iter()
            .filter_map(|target| {
                target.bounds.intersect(ray).map(|distance| Hit {
                    object: target.object,
                    kind: target.kind,
                    distance,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Closest intersection if it lies within interaction range.
    pub fn pick(&self, ray: &Ray) -> Option<Hit> {
        self.nearest(ray).filter(|hit| hit.distance < self.range)
    }
}

/// Crosshair tint drawn over the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Crosshair {
    #[default]
    Idle,
    Targeting,
}

impl Crosshair {
    pub fn css_color(self) -> &'static str {
        match self {
            Self::Idle => "#ffffff",
            Self::Targeting => "#ffcc00",
        }
    }
}

/// What the overlay shows about the object under the crosshair.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HoverFeedback {
    pub tooltip: Option<String>,
    pub crosshair: Crosshair,
}

impl HoverFeedback {
    pub fn from_hit(scene: &Scene, hit: Option<&Hit>) -> Self {
        let label = hit
            .and_then(|hit| scene.objects.get(hit.object))
            .and_then(|object| object.interactive.as_ref())
            .map(|interactive| interactive.label.clone());
        match label {
            Some(label) => Self {
                tooltip: Some(label),
                crosshair: Crosshair::Targeting,
            },
            None => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box_at(center: Vec3) -> Aabb {
        Aabb {
            min: center - Vec3::splat(0.5),
            max: center + Vec3::splat(0.5),
        }
    }

    #[test]
    fn ray_hits_box_in_front() {
        let bounds = unit_box_at(Vec3::new(0.0, 0.0, -3.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let distance = bounds.intersect(&ray).unwrap();
        assert!((distance - 2.5).abs() < 1e-5);
    }

    #[test]
    fn ray_misses_box_behind_or_beside() {
        let bounds = unit_box_at(Vec3::new(0.0, 0.0, 3.0));
        assert!(bounds.intersect(&Ray::new(Vec3::ZERO, Vec3::NEG_Z)).is_none());
        let beside = unit_box_at(Vec3::new(2.0, 0.0, -3.0));
        assert!(beside.intersect(&Ray::new(Vec3::ZERO, Vec3::NEG_Z)).is_none());
    }

    #[test]
    fn ray_from_inside_reports_nothing() {
        let bounds = unit_box_at(Vec3::ZERO);
        assert!(bounds.intersect(&Ray::new(Vec3::ZERO, Vec3::X)).is_none());
    }

    #[test]
    fn pick_prefers_the_closest_target() {
        let scene = Scene::cozy_room().unwrap();
        let tester = HitTester::from_scene(&scene, 4.0);
        assert_eq!(tester.len(), 5);

        // Straight at the cat from behind the sofa.
        let ray = Ray::new(Vec3::new(-2.0, 0.25, 3.0), Vec3::NEG_Z);
        let hit = tester.pick(&ray).unwrap();
        assert_eq!(hit.kind, ObjectKind::Cat);
        assert!((hit.distance - 1.7).abs() < 1e-4);
    }

    #[test]
    fn targets_beyond_range_are_ignored() {
        let scene = Scene::cozy_room().unwrap();
        let tester = HitTester::from_scene(&scene, 4.0);
        let ray = Ray::new(Vec3::new(0.0, 1.3, 0.0), Vec3::NEG_Z);

        let nearest = tester.nearest(&ray).unwrap();
        assert_eq!(nearest.kind, ObjectKind::Tv);
        assert!(nearest.distance > 4.0);
        assert!(tester.pick(&ray).is_none());

        let closer = Ray::new(Vec3::new(0.0, 1.3, -2.0), Vec3::NEG_Z);
        assert_eq!(tester.pick(&closer).map(|hit| hit.kind), Some(ObjectKind::Tv));
    }

    #[test]
    fn hover_feedback_follows_the_hit() {
        let scene = Scene::cozy_room().unwrap();
        let tester = HitTester::from_scene(&scene, 4.0);
        let ray = Ray::new(Vec3::new(-3.0, 1.7, 0.5), Vec3::NEG_Z);
        let hit = tester.pick(&ray);
        let feedback = HoverFeedback::from_hit(&scene, hit.as_ref());
        assert_eq!(feedback.tooltip.as_deref(), Some("Lamp"));
        assert_eq!(feedback.crosshair.css_color(), "#ffcc00");

        let idle = HoverFeedback::from_hit(&scene, None);
        assert_eq!(idle.tooltip, None);
        assert_eq!(idle.crosshair, Crosshair::Idle);
    }
}
