//! Text reports shared by the native binary and the browser console.

use crate::geometry::Geometry;
use crate::room::Room;
use crate::scene::Scene;

pub fn scene_summary(scene: &Scene) -> Vec<String> {
    let mut lines = vec![format!(
        "Loaded room with {} objects ({} lights)",
        scene.objects.len(),
        scene.lights.points.len() + 2
    )];
    for object in &scene.objects {
        let mut line = format!(" - {} ({})", object.name, shape_name(&object.geometry));
        if let Some(interactive) = &object.interactive {
            line.push_str(&format!(" [{}]", interactive.label));
        }
        lines.push(line);
    }
    lines
}

pub fn state_summary(room: &Room) -> Vec<String> {
    let state = room.state();
    let camera = room.camera();
    vec![
        "Final room state:".to_string(),
        format!(
            " - lamp={} tv={} channel={} computer={} seated={} pets={}",
            on_off(state.lamp_on),
            on_off(state.tv_on),
            state.tv_channel,
            on_off(state.computer_on),
            state.is_sitting,
            state.cat_pet_count
        ),
        format!(
            " - camera pos=({:.2}, {:.2}, {:.2}) yaw={:.2} pitch={:.2}",
            camera.position.x, camera.position.y, camera.position.z, camera.yaw, camera.pitch
        ),
    ]
}

/// Prints transcript lines that have not been shown yet.
///
/// A shrinking transcript means it was cleared, so printing restarts.
#[derive(Debug, Default)]
pub struct TranscriptEcho {
    printed: usize,
}

impl TranscriptEcho {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines appended since the previous call.
    pub fn pending<'a>(&mut self, transcript: &'a [String]) -> &'a [String] {
        if transcript.len() < self.printed {
            self.printed = 0;
        }
        let fresh = &transcript[self.printed..];
        self.printed = transcript.len();
        fresh
    }
}

fn shape_name(geometry: &Geometry) -> &'static str {
    match geometry {
        Geometry::Box { .. } => "box",
        Geometry::Cylinder { radius_top, .. } if *radius_top == 0.0 => "cone",
        Geometry::Cylinder { .. } => "cylinder",
        Geometry::Sphere { .. } => "sphere",
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}
