//! The interactive room session shared by the native and browser shells.

use glam::Vec3;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::animation::{cat_pose, lamp_ripple, tv_flicker, SpeechBubble};
use crate::audio::{AudioSink, Cue, LogSink};
use crate::camera::FirstPersonCamera;
use crate::config::RoomConfig;
use crate::input::{InputState, KeyCode, NamedKey};
use crate::interaction::{self, DispatchContext, Effect, Fixtures, ScreenTint};
use crate::raycast::{Crosshair, Hit, HitTester, HoverFeedback};
use crate::render::Frame;
use crate::scene::{Material, Scene};
use crate::state::SceneState;
use crate::terminal::{Clock, Terminal, TerminalOutcome};

/// Scene objects and lights the session animates, resolved once by name.
#[derive(Debug, Default)]
struct Handles {
    lamp_light: Option<usize>,
    tv_light: Option<usize>,
    lamp_bulb: Option<usize>,
    tv_screen: Option<(usize, Material)>,
    monitor_screen: Option<(usize, Material)>,
    cat_body: Option<usize>,
    cat_head: Option<usize>,
    cat_tail: Option<usize>,
    eye_whites: Vec<usize>,
    pupils: Vec<usize>,
}

impl Handles {
    fn resolve(scene: &Scene) -> Self {
        let screen = |name: &str| {
            scene
                .find(name)
                .map(|index| (index, scene.objects[index].material))
        };
        let handles = Self {
            lamp_light: scene.lights.point_index("lamp"),
            tv_light: scene.lights.point_index("tv"),
            lamp_bulb: scene.find("lamp-bulb"),
            tv_screen: screen("tv-screen"),
            monitor_screen: screen("monitor-screen"),
            cat_body: scene.find("cat-body"),
            cat_head: scene.find("cat-head"),
            cat_tail: scene.find("cat-tail"),
            eye_whites: ["cat-eye-white-left", "cat-eye-white-right"]
                .iter()
                .filter_map(|name| scene.find(name))
                .collect(),
            pupils: ["cat-pupil-left", "cat-pupil-right"]
                .iter()
                .filter_map(|name| scene.find(name))
                .collect(),
        };
        if handles.lamp_light.is_none() || handles.tv_light.is_none() {
            warn!("scene is missing the lamp or tv point light");
        }
        handles
    }
}

/// What the HTML overlay (or a native HUD) should show this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay<'a> {
    /// Shown while the pointer is free and the computer is not in use.
    pub start_prompt: bool,
    pub crosshair: Crosshair,
    pub tooltip: Option<&'a str>,
    /// Speech bubble text and opacity.
    pub speech: Option<(&'a str, f32)>,
    pub terminal_open: bool,
}

pub struct Room {
    config: RoomConfig,
    scene: Scene,
    handles: Handles,
    state: SceneState,
    fixtures: Fixtures,
    input: InputState,
    camera: FirstPersonCamera,
    hit_tester: HitTester,
    hover: HoverFeedback,
    terminal: Terminal,
    speech: SpeechBubble,
    elapsed: f32,
    /// Set while our own pointer lock release is in flight.
    pending_unlock: bool,
    rng: Box<dyn RngCore>,
    clock: Box<dyn Clock>,
    audio: Box<dyn AudioSink>,
}

impl Room {
    pub fn new(scene: Scene, config: RoomConfig) -> Self {
        let mut room = Self {
            handles: Handles::resolve(&scene),
            hit_tester: HitTester::from_scene(&scene, config.interaction_range),
            camera: FirstPersonCamera::from_spec(&scene.camera),
            input: InputState::new(config.look_speed),
            speech: SpeechBubble::new(config.speech_hold_secs, config.speech_fade_secs),
            state: SceneState::new(),
            fixtures: Fixtures::default(),
            hover: HoverFeedback::default(),
            terminal: Terminal::new(),
            elapsed: 0.0,
            pending_unlock: false,
            rng: Box::new(StdRng::from_entropy()),
            clock: default_clock(),
            audio: Box::new(LogSink::new()),
            scene,
            config,
        };
        room.sync_scene();
        room
    }

    pub fn with_rng(mut self, rng: impl RngCore + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_audio(mut self, audio: impl AudioSink + 'static) -> Self {
        self.audio = Box::new(audio);
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    pub fn camera(&self) -> &FirstPersonCamera {
        &self.camera
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Teleports the camera and resets the look accumulator to match.
    pub fn set_pose(&mut self, position: Vec3, yaw: f32, pitch: f32) {
        self.input.set_look(yaw, pitch);
        self.camera.position = position;
        self.camera
            .set_orientation(self.input.yaw(), self.input.pitch());
    }

    /// Must be called from a user gesture before any sound can play.
    pub fn resume_audio(&mut self) {
        self.audio.resume();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(width, height);
    }

    pub fn on_key_down(&mut self, key: KeyCode) -> Vec<Effect> {
        self.input.set_key_down(key);
        if self.state.is_using_computer && key == KeyCode::Named(NamedKey::Escape) {
            return self.exit_computer();
        }
        Vec::new()
    }

    pub fn on_key_up(&mut self, key: KeyCode) {
        self.input.set_key_up(key);
    }

    /// Relative mouse motion in pixels.
    pub fn on_mouse_move(&mut self, dx: f32, dy: f32) {
        if !self.state.accepts_look() {
            return;
        }
        self.input.apply_look(dx, dy);
        self.camera
            .set_orientation(self.input.yaw(), self.input.pitch());
    }

    /// Confirmed pointer lock state as reported by the host.
    ///
    /// The unlock that follows our own release on entering the computer does
    /// not close the terminal; any other unlock while using it does.
    pub fn on_pointer_lock_change(&mut self, locked: bool) -> Vec<Effect> {
        self.state.is_pointer_locked = locked;
        if locked {
            self.pending_unlock = false;
            return Vec::new();
        }
        self.hover = HoverFeedback::default();
        if self.pending_unlock {
            self.pending_unlock = false;
            return Vec::new();
        }
        if self.state.is_using_computer {
            debug!("pointer lock lost while using the computer");
            return self.exit_computer();
        }
        Vec::new()
    }

    /// Interacts with whatever is under the crosshair.
    pub fn on_click(&mut self) -> Vec<Effect> {
        if !self.state.accepts_look() {
            return Vec::new();
        }
        let Some(hit) = self.target() else {
            return Vec::new();
        };
        let mut ctx = DispatchContext {
            state: &mut self.state,
            fixtures: &mut self.fixtures,
            camera: &mut self.camera,
            input: &mut self.input,
            terminal: &mut self.terminal,
            speech: &mut self.speech,
            config: &self.config,
            rng: self.rng.as_mut(),
        };
        let effects = interaction::dispatch(hit.kind, &mut ctx);
        self.sync_scene();
        self.apply(effects)
    }

    /// Runs one line through the desktop terminal.
    pub fn submit_command(&mut self, line: &str) -> Vec<Effect> {
        let outcome = self
            .terminal
            .submit(line, self.clock.as_ref(), self.rng.as_mut());
        match outcome {
            TerminalOutcome::Exit => self.exit_computer(),
            TerminalOutcome::Continue => Vec::new(),
        }
    }

    /// Any key typed into the terminal widget.
    pub fn on_terminal_key(&mut self) {
        self.play(Cue::Keypress);
    }

    /// Nearest interactive object within range of the crosshair.
    pub fn target(&self) -> Option<Hit> {
        self.hit_tester.pick(&self.camera.ray())
    }

    /// Advances the session by one frame.
    pub fn tick(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
        let t = self.elapsed;

        if self.state.accepts_movement() {
            self.step_movement();
        }

        self.animate_cat(t);

        if self.state.tv_on {
            self.fixtures.tv_light = tv_flicker(self.rng.gen::<f32>());
        }
        if self.state.lamp_on {
            self.fixtures.lamp_light = lamp_ripple(t);
        }

        self.hover = if self.state.accepts_look() {
            HoverFeedback::from_hit(&self.scene, self.target().as_ref())
        } else {
            HoverFeedback::default()
        };

        self.speech.advance(dt);
        self.sync_scene();
    }

    /// Snapshot handed to the renderer.
    pub fn frame(&self) -> Frame<'_> {
        Frame {
            camera: self.camera.params(),
            background: self.scene.background,
            lights: &self.scene.lights,
            objects: &self.scene.objects,
        }
    }

    pub fn overlay(&self) -> Overlay<'_> {
        Overlay {
            start_prompt: !self.state.is_pointer_locked && !self.state.is_using_computer,
            crosshair: self.hover.crosshair,
            tooltip: self.hover.tooltip.as_deref(),
            speech: self
                .speech
                .text()
                .map(|text| (text, self.speech.opacity())),
            terminal_open: self.terminal.is_open(),
        }
    }

    fn exit_computer(&mut self) -> Vec<Effect> {
        self.pending_unlock = false;
        let effects = interaction::exit_computer(
            &mut self.state,
            &mut self.fixtures,
            &mut self.terminal,
            &self.config,
        );
        self.sync_scene();
        self.apply(effects)
    }

    /// Plays audio cues and hands the remaining effects to the platform.
    fn apply(&mut self, effects: Vec<Effect>) -> Vec<Effect> {
        let mut remaining = Vec::with_capacity(effects.len());
        for effect in effects {
            match effect {
                Effect::Play(cue) => self.play(cue),
                Effect::ReleasePointerLock => {
                    if self.state.is_pointer_locked {
                        self.pending_unlock = true;
                    }
                    remaining.push(effect);
                }
                other => remaining.push(other),
            }
        }
        remaining
    }

    fn play(&mut self, cue: Cue) {
        let sounds = cue.sounds(self.rng.as_mut());
        self.audio.play(cue, &sounds);
    }

    fn step_movement(&mut self) {
        let axes = self.input.movement().axes();
        if axes == glam::Vec2::ZERO {
            return;
        }
        let speed = self.config.move_speed;
        let delta = self.camera.flat_forward() * axes.y * speed
            + self.camera.flat_right() * axes.x * speed;
        let bound = self.config.room_half_extent;
        let position = &mut self.camera.position;
        *position += delta;
        position.x = position.x.clamp(-bound, bound);
        position.z = position.z.clamp(-bound, bound);
    }

    fn animate_cat(&mut self, t: f32) {
        let pose = cat_pose(t);
        let objects = &mut self.scene.objects;
        if let Some(body) = self.handles.cat_body {
            objects[body].position.y = pose.body_y;
        }
        if let Some(tail) = self.handles.cat_tail {
            objects[tail].rotation.z = pose.tail_sway;
        }
        if let Some(head) = self.handles.cat_head {
            objects[head].rotation.y = pose.head_yaw;
        }
        for &eye in &self.handles.eye_whites {
            objects[eye].scale.y = pose.eye_scale_y();
        }
        for &pupil in &self.handles.pupils {
            objects[pupil].material.visible = pose.pupils_visible();
        }
    }

    /// Pushes fixture values into the scene the renderer draws.
    fn sync_scene(&mut self) {
        let fixtures = &self.fixtures;
        let lights = &mut self.scene.lights;
        lights.ambient.intensity = fixtures.ambient_light;
        if let Some(lamp) = self.handles.lamp_light {
            lights.points[lamp].intensity = fixtures.lamp_light;
        }
        if let Some(tv) = self.handles.tv_light {
            lights.points[tv].intensity = fixtures.tv_light;
        }

        let objects = &mut self.scene.objects;
        if let Some(bulb) = self.handles.lamp_bulb {
            objects[bulb].material.color = fixtures.lamp_bulb;
        }
        for (handle, tint) in [
            (self.handles.tv_screen, fixtures.tv_screen),
            (self.handles.monitor_screen, fixtures.monitor_screen),
        ] {
            if let Some((index, off)) = handle {
                objects[index].material = match tint {
                    ScreenTint::Off => off,
                    ScreenTint::Lit(color) => Material::unlit(color),
                };
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn default_clock() -> Box<dyn Clock> {
    Box::new(crate::terminal::SystemClock)
}

#[cfg(target_arch = "wasm32")]
fn default_clock() -> Box<dyn Clock> {
    Box::new(crate::terminal::BrowserClock)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::audio::Sound;
    use crate::scene::hex_to_linear;
    use crate::state::ObjectKind;
    use crate::terminal::FixedClock;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<Cue>>>);

    impl AudioSink for Recorder {
        fn play(&mut self, cue: Cue, _sounds: &[Sound]) {
            self.0.borrow_mut().push(cue);
        }
    }

    const FRAME: f32 = 0.016;
    const W: KeyCode = KeyCode::Character('W');

    fn room() -> (Room, Recorder) {
        let recorder = Recorder::default();
        let room = Room::new(Scene::cozy_room().unwrap(), RoomConfig::default())
            .with_seed(5)
            .with_clock(FixedClock("09:00:00".into()))
            .with_audio(recorder.clone());
        (room, recorder)
    }

    fn locked_room() -> (Room, Recorder) {
        let (mut room, recorder) = room();
        room.on_pointer_lock_change(true);
        (room, recorder)
    }

    fn enter_computer(room: &mut Room) -> Vec<Effect> {
        room.set_pose(Vec3::new(3.5, 1.05, -1.0), 0.0, 0.0);
        assert_eq!(room.target().map(|hit| hit.kind), Some(ObjectKind::Computer));
        room.on_click()
    }

    #[test]
    fn clicking_the_lamp_lights_the_room() {
        let (mut room, recorder) = locked_room();
        room.set_pose(Vec3::new(-3.0, 1.7, 0.5), 0.0, 0.0);
        let effects = room.on_click();
        assert!(effects.is_empty());
        assert!(room.state().lamp_on);
        assert_eq!(recorder.0.borrow().as_slice(), &[Cue::Click]);

        let lamp = room.scene().lights.point_index("lamp").unwrap();
        assert_eq!(room.scene().lights.points[lamp].intensity, 1.5);
        assert_eq!(room.scene().lights.ambient.intensity, 0.4);
        let bulb = room.scene().find("lamp-bulb").unwrap();
        assert_eq!(
            room.scene().objects[bulb].material.color,
            hex_to_linear(0xffdd88)
        );

        room.tick(FRAME);
        let intensity = room.scene().lights.points[lamp].intensity;
        assert!((intensity - 1.5).abs() <= 0.02);
    }

    #[test]
    fn clicks_need_the_pointer_lock() {
        let (mut room, recorder) = room();
        room.set_pose(Vec3::new(-3.0, 1.7, 0.5), 0.0, 0.0);
        assert!(room.on_click().is_empty());
        assert!(!room.state().lamp_on);
        assert!(recorder.0.borrow().is_empty());
    }

    #[test]
    fn out_of_range_objects_are_never_targeted() {
        let (mut room, _) = locked_room();
        room.set_pose(Vec3::new(0.0, 1.3, 0.0), 0.0, 0.0);
        room.tick(FRAME);
        assert!(room.overlay().tooltip.is_none());
        assert_eq!(room.overlay().crosshair, Crosshair::Idle);
        room.on_click();
        assert!(!room.state().tv_on);

        room.set_pose(Vec3::new(0.0, 1.3, -2.0), 0.0, 0.0);
        room.tick(FRAME);
        assert_eq!(room.overlay().tooltip, Some("Television"));
        assert_eq!(room.overlay().crosshair, Crosshair::Targeting);
        room.on_click();
        assert!(room.state().tv_on);
        let screen = room.scene().find("tv-screen").unwrap();
        assert!(room.scene().objects[screen].material.unlit);
    }

    #[test]
    fn tv_flickers_around_its_base_intensity() {
        let (mut room, _) = locked_room();
        room.set_pose(Vec3::new(0.0, 1.3, -2.0), 0.0, 0.0);
        room.on_click();
        let tv = room.scene().lights.point_index("tv").unwrap();
        for _ in 0..50 {
            room.tick(FRAME);
            let intensity = room.scene().lights.points[tv].intensity;
            assert!((0.76..=0.84).contains(&intensity));
        }
    }

    #[test]
    fn held_keys_walk_and_stop_at_the_walls() {
        let (mut room, _) = locked_room();
        room.on_key_down(W);
        room.tick(FRAME);
        assert!((room.camera().position.z - (3.0 - 0.08)).abs() < 1e-5);
        for _ in 0..200 {
            room.tick(FRAME);
        }
        assert_eq!(room.camera().position.z, -5.0);
        assert_eq!(room.camera().position.y, 1.6);
        room.on_key_up(W);
        room.tick(FRAME);
        assert_eq!(room.camera().position.z, -5.0);
    }

    #[test]
    fn computer_mode_freezes_movement_and_look() {
        let (mut room, _) = locked_room();
        let effects = enter_computer(&mut room);
        assert!(effects.contains(&Effect::ReleasePointerLock));
        assert!(effects.contains(&Effect::OpenLink("https://9up.us/cli".into())));
        assert!(room.state().is_using_computer);

        let before = room.camera().clone();
        room.on_key_down(W);
        room.on_mouse_move(300.0, 40.0);
        for _ in 0..10 {
            room.tick(FRAME);
        }
        assert_eq!(room.camera(), &before);
    }

    #[test]
    fn our_own_unlock_keeps_the_computer_open() {
        let (mut room, _) = locked_room();
        enter_computer(&mut room);
        assert!(room.on_pointer_lock_change(false).is_empty());
        assert!(room.state().is_using_computer);
        assert!(room.terminal().is_open());
        assert!(!room.overlay().start_prompt);

        let effects = room.on_key_down(KeyCode::Named(NamedKey::Escape));
        assert_eq!(effects, vec![Effect::RequestPointerLock { delay_ms: 100 }]);
        assert!(!room.state().is_using_computer);
        assert!(!room.terminal().is_open());
        assert!(room.overlay().start_prompt);
    }

    #[test]
    fn unrequested_lock_loss_leaves_the_computer() {
        let (mut room, _) = locked_room();
        enter_computer(&mut room);
        room.on_pointer_lock_change(false);
        room.on_pointer_lock_change(true);
        let effects = room.on_pointer_lock_change(false);
        assert_eq!(effects, vec![Effect::RequestPointerLock { delay_ms: 100 }]);
        assert!(!room.state().is_using_computer);
        let monitor = room.scene().find("monitor-screen").unwrap();
        assert!(!room.scene().objects[monitor].material.unlit);
    }

    #[test]
    fn terminal_exit_command_leaves_the_computer() {
        let (mut room, recorder) = locked_room();
        enter_computer(&mut room);
        room.on_pointer_lock_change(false);
        room.on_terminal_key();
        assert!(room.submit_command("time").is_empty());
        assert!(room
            .terminal()
            .transcript()
            .contains(&"Current time: 09:00:00".to_string()));
        let effects = room.submit_command("  EXIT ");
        assert_eq!(effects, vec![Effect::RequestPointerLock { delay_ms: 100 }]);
        assert!(!room.state().computer_on);
        assert_eq!(
            recorder.0.borrow().as_slice(),
            &[Cue::Click, Cue::Keypress]
        );
    }

    #[test]
    fn petting_the_cat_purrs_on_every_third_pet() {
        let (mut room, recorder) = locked_room();
        room.set_pose(Vec3::new(-2.0, 0.25, 3.0), 0.0, 0.0);
        for _ in 0..6 {
            room.on_click();
        }
        assert_eq!(room.state().cat_pet_count, 6);
        assert_eq!(
            recorder.0.borrow().as_slice(),
            &[Cue::Meow, Cue::Meow, Cue::Purr, Cue::Meow, Cue::Meow, Cue::Purr]
        );
        let (text, opacity) = room.overlay().speech.unwrap();
        assert!(interaction::CAT_PHRASES.contains(&text));
        assert_eq!(opacity, 1.0);

        for _ in 0..120 {
            room.tick(FRAME);
        }
        assert!(room.overlay().speech.is_none());
    }

    #[test]
    fn sofa_seats_the_player_until_clicked_again() {
        let (mut room, _) = locked_room();
        room.set_pose(Vec3::new(0.0, 1.6, 3.0), 0.0, -0.505);
        assert_eq!(room.target().map(|hit| hit.kind), Some(ObjectKind::Sofa));
        room.on_click();
        assert!(room.state().is_sitting);
        assert_eq!(room.camera().position, Vec3::new(0.0, 1.1, 1.2));
        assert_eq!((room.camera().yaw, room.camera().pitch), (0.0, 0.0));

        room.on_key_down(W);
        for _ in 0..10 {
            room.tick(FRAME);
        }
        assert_eq!(room.camera().position, Vec3::new(0.0, 1.1, 1.2));
        room.on_key_up(W);

        // Look straight down at the seat and stand up.
        room.on_mouse_move(0.0, 10_000.0);
        assert_eq!(room.target().map(|hit| hit.kind), Some(ObjectKind::Sofa));
        room.on_click();
        assert!(!room.state().is_sitting);
        assert_eq!(room.camera().position, Vec3::new(0.0, 1.1, 1.2));
        room.on_key_down(W);
        room.tick(FRAME);
        assert_ne!(room.camera().position, Vec3::new(0.0, 1.1, 1.2));
    }

    #[test]
    fn seated_player_stays_put_through_computer_mode() {
        let (mut room, _) = locked_room();
        room.set_pose(Vec3::new(0.0, 1.6, 3.0), 0.0, -0.505);
        room.on_click();
        assert!(room.state().is_sitting);

        let effects = enter_computer(&mut room);
        assert!(effects.contains(&Effect::ReleasePointerLock));
        room.on_pointer_lock_change(false);
        let seat = room.camera().clone();
        room.on_key_down(W);
        room.on_mouse_move(120.0, 0.0);
        for _ in 0..10 {
            room.tick(FRAME);
        }
        assert_eq!(room.camera(), &seat);

        room.on_key_down(KeyCode::Named(NamedKey::Escape));
        room.on_pointer_lock_change(true);
        assert!(room.state().is_sitting);
        for _ in 0..10 {
            room.tick(FRAME);
        }
        assert_eq!(room.camera().position, seat.position);
    }

    #[test]
    fn denied_lock_outside_the_computer_only_shows_the_prompt() {
        let (mut room, recorder) = room();
        assert!(room.on_pointer_lock_change(false).is_empty());
        assert!(room.overlay().start_prompt);
        assert_eq!(room.state(), &SceneState::new());

        room.on_pointer_lock_change(true);
        assert!(room.on_pointer_lock_change(false).is_empty());
        assert!(!room.state().is_pointer_locked);
        room.set_pose(Vec3::new(-3.0, 1.7, 0.5), 0.0, 0.0);
        assert!(room.on_click().is_empty());
        assert!(!room.state().lamp_on);
        assert!(recorder.0.borrow().is_empty());
    }

    #[test]
    fn cat_blinks_in_the_scene() {
        let (mut room, _) = room();
        let pupil = room.scene().find("cat-pupil-left").unwrap();
        let eye = room.scene().find("cat-eye-white-right").unwrap();
        room.tick(3.95);
        assert!(!room.scene().objects[pupil].material.visible);
        assert_eq!(room.scene().objects[eye].scale.y, 0.1);
        room.tick(0.2);
        assert!(room.scene().objects[pupil].material.visible);
        assert_eq!(room.scene().objects[eye].scale.y, 1.0);
    }

    #[test]
    fn losing_the_lock_hides_the_tooltip() {
        let (mut room, _) = locked_room();
        room.set_pose(Vec3::new(-3.0, 1.7, 0.5), 0.0, 0.0);
        room.tick(FRAME);
        assert_eq!(room.overlay().tooltip, Some("Lamp"));
        room.on_pointer_lock_change(false);
        assert_eq!(room.overlay().tooltip, None);
        assert!(room.overlay().start_prompt);
    }
}
