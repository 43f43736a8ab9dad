//! Idle motion of the cat and the light effects of the lamp and TV.

/// Cat pose for a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatPose {
    /// Height of the body relative to the cat group.
    pub body_y: f32,
    /// Tail rotation around Z in radians.
    pub tail_sway: f32,
    /// Head rotation around Y in radians.
    pub head_yaw: f32,
    pub blinking: bool,
}

impl CatPose {
    /// Y scale applied to the eye whites.
    pub fn eye_scale_y(&self) -> f32 {
        if self.blinking {
            0.1
        } else {
            1.0
        }
    }

    pub fn pupils_visible(&self) -> bool {
        !self.blinking
    }
}

const BLINK_PERIOD: f32 = 4.0;
const BLINK_START: f32 = 3.9;

pub fn cat_pose(t: f32) -> CatPose {
    CatPose {
        body_y: 0.2 + (t * 2.0).sin() * 0.01,
        tail_sway: (t * 3.0).sin() * 0.2,
        head_yaw: (t * 0.5).sin() * 0.05,
        blinking: t.rem_euclid(BLINK_PERIOD) > BLINK_START,
    }
}

pub const TV_LIGHT_INTENSITY: f32 = 0.8;
pub const LAMP_LIGHT_INTENSITY: f32 = 1.5;

/// TV glow for a uniform sample `r` in `0..1`.
pub fn tv_flicker(r: f32) -> f32 {
    TV_LIGHT_INTENSITY * (0.95 + r * 0.1)
}

pub fn lamp_ripple(t: f32) -> f32 {
    LAMP_LIGHT_INTENSITY + (t * 20.0).sin() * 0.02
}

/// Short lived text shown above the cat.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechBubble {
    text: Option<String>,
    age: f32,
    hold: f32,
    fade: f32,
}

impl SpeechBubble {
    pub fn new(hold: f32, fade: f32) -> Self {
        Self {
            text: None,
            age: 0.0,
            hold,
            fade,
        }
    }

    /// Replaces any current text and restarts the timers.
    pub fn show(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
        self.age = 0.0;
    }

    pub fn advance(&mut self, dt: f32) {
        if self.text.is_none() {
            return;
        }
        self.age += dt;
        if self.age >= self.hold + self.fade {
            self.text = None;
            self.age = 0.0;
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn is_visible(&self) -> bool {
        self.text.is_some()
    }

    /// One while held, then a linear fade to zero.
    pub fn opacity(&self) -> f32 {
        if self.text.is_none() {
            return 0.0;
        }
        if self.age <= self.hold {
            1.0
        } else if self.fade <= 0.0 {
            0.0
        } else {
            (1.0 - (self.age - self.hold) / self.fade).clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cat_blinks_at_the_end_of_each_period() {
        assert!(!cat_pose(0.0).blinking);
        assert!(!cat_pose(3.85).blinking);
        assert!(cat_pose(3.95).blinking);
        assert!(cat_pose(7.95).blinking);
        let pose = cat_pose(3.95);
        assert_eq!(pose.eye_scale_y(), 0.1);
        assert!(!pose.pupils_visible());
    }

    #[test]
    fn cat_motion_stays_small() {
        for step in 0..400 {
            let pose = cat_pose(step as f32 * 0.016);
            assert!((pose.body_y - 0.2).abs() <= 0.01 + 1e-6);
            assert!(pose.tail_sway.abs() <= 0.2 + 1e-6);
            assert!(pose.head_yaw.abs() <= 0.05 + 1e-6);
        }
    }

    #[test]
    fn light_effects_stay_near_their_base() {
        assert!((tv_flicker(0.0) - 0.76).abs() < 1e-6);
        assert!((tv_flicker(0.999) - 0.84).abs() < 1e-3);
        for step in 0..100 {
            assert!((lamp_ripple(step as f32 * 0.01) - 1.5).abs() <= 0.02 + 1e-6);
        }
    }

    #[test]
    fn bubble_holds_then_fades_then_hides() {
        let mut bubble = SpeechBubble::new(1.5, 0.3);
        bubble.show("Meow!?");
        bubble.advance(1.0);
        assert_eq!(bubble.opacity(), 1.0);
        bubble.advance(0.65);
        assert!((bubble.opacity() - 0.5).abs() < 1e-4);
        assert_eq!(bubble.text(), Some("Meow!?"));
        bubble.advance(0.2);
        assert!(!bubble.is_visible());
        assert_eq!(bubble.opacity(), 0.0);
    }

    #[test]
    fn new_text_restarts_the_bubble() {
        let mut bubble = SpeechBubble::new(1.5, 0.3);
        bubble.show("zZzZ...");
        bubble.advance(1.7);
        bubble.show("Meow!?");
        assert_eq!(bubble.opacity(), 1.0);
        bubble.advance(1.7);
        assert!(bubble.is_visible());
    }
}
