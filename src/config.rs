use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Tunables of the room session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Distance walked per frame while a movement key is held.
    pub move_speed: f32,
    /// Radians of look rotation per pixel of mouse motion.
    pub look_speed: f32,
    pub interaction_range: f32,
    /// The camera is kept within `-room_half_extent..=room_half_extent` on X and Z.
    pub room_half_extent: f32,
    pub seated_position: Vec3,
    /// Delay before pointer lock is requested again after leaving the computer.
    pub relock_delay_ms: u32,
    pub speech_hold_secs: f32,
    pub speech_fade_secs: f32,
    /// Opened in a new tab when the computer is used.
    pub computer_link: Option<String>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            move_speed: 0.08,
            look_speed: 0.002,
            interaction_range: 4.0,
            room_half_extent: 5.0,
            seated_position: Vec3::new(0.0, 1.1, 1.2),
            relock_delay_ms: 100,
            speech_hold_secs: 1.5,
            speech_fade_secs: 0.3,
            computer_link: Some("https://9up.us/cli".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::Room;
    use crate::scene::Scene;
    use crate::state::ObjectKind;

    #[test]
    fn interaction_range_bounds_targeting() {
        let scene = Scene::cozy_room().unwrap();
        let mut near = Room::new(scene.clone(), RoomConfig::default()).with_seed(3);
        near.set_pose(Vec3::new(0.0, 1.3, 0.0), 0.0, 0.0);
        assert!(near.target().is_none());

        let config = RoomConfig {
            interaction_range: 6.0,
            ..RoomConfig::default()
        };
        let mut far = Room::new(scene, config).with_seed(3);
        far.set_pose(Vec3::new(0.0, 1.3, 0.0), 0.0, 0.0);
        assert_eq!(far.target().map(|hit| hit.kind), Some(ObjectKind::Tv));
    }
}
