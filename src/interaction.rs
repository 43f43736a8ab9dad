//! Reactions of the interactive objects to a click.

use glam::Vec3;
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::RngCore;

use crate::animation::{SpeechBubble, LAMP_LIGHT_INTENSITY, TV_LIGHT_INTENSITY};
use crate::audio::Cue;
use crate::camera::FirstPersonCamera;
use crate::config::RoomConfig;
use crate::input::InputState;
use crate::scene::hex_to_linear;
use crate::state::{ObjectKind, SceneState, TV_CHANNELS};
use crate::terminal::Terminal;

pub const AMBIENT_INTENSITY: f32 = 0.3;
pub const AMBIENT_INTENSITY_LAMP_ON: f32 = 0.4;
pub const BULB_ON: u32 = 0xffdd88;
pub const BULB_OFF: u32 = 0x333333;
pub const MONITOR_ON: u32 = 0x001100;
pub const TV_CHANNEL_COLORS: [u32; TV_CHANNELS as usize] =
    [0xff4444, 0x44ff44, 0x4444ff, 0xffff44, 0xff44ff];
pub const CAT_PHRASES: [&str; 4] = [
    "Meow!?",
    "check the computer out",
    "enter the desktop terminal",
    "zZzZ...",
];

/// Side effects the platform shell carries out after a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Play(Cue),
    OpenLink(String),
    RequestPointerLock { delay_ms: u32 },
    ReleasePointerLock,
    FocusTerminal,
}

/// Appearance of a screen surface.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ScreenTint {
    /// The scene's dark screen material.
    #[default]
    Off,
    /// Unlit colour in linear RGB.
    Lit(Vec3),
}

/// Scene values driven by object state rather than by the layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixtures {
    pub lamp_light: f32,
    pub ambient_light: f32,
    pub tv_light: f32,
    /// Linear RGB.
    pub lamp_bulb: Vec3,
    pub tv_screen: ScreenTint,
    pub monitor_screen: ScreenTint,
}

impl Default for Fixtures {
    fn default() -> Self {
        Self {
            lamp_light: 0.0,
            ambient_light: AMBIENT_INTENSITY,
            tv_light: 0.0,
            lamp_bulb: hex_to_linear(BULB_OFF),
            tv_screen: ScreenTint::Off,
            monitor_screen: ScreenTint::Off,
        }
    }
}

/// Everything a reaction may touch.
pub struct DispatchContext<'a> {
    pub state: &'a mut SceneState,
    pub fixtures: &'a mut Fixtures,
    pub camera: &'a mut FirstPersonCamera,
    pub input: &'a mut InputState,
    pub terminal: &'a mut Terminal,
    pub speech: &'a mut SpeechBubble,
    pub config: &'a RoomConfig,
    pub rng: &'a mut dyn RngCore,
}

pub fn dispatch(kind: ObjectKind, ctx: &mut DispatchContext<'_>) -> Vec<Effect> {
    debug!("interacting with {kind:?}");
    match kind {
        ObjectKind::Lamp => toggle_lamp(ctx),
        ObjectKind::Tv => toggle_tv(ctx),
        ObjectKind::Computer => enter_computer(ctx),
        ObjectKind::Cat => pet_cat(ctx),
        ObjectKind::Sofa => toggle_sofa(ctx),
    }
}

pub fn toggle_lamp(ctx: &mut DispatchContext<'_>) -> Vec<Effect> {
    let on = !ctx.state.lamp_on;
    ctx.state.lamp_on = on;
    let fixtures = &mut *ctx.fixtures;
    if on {
        fixtures.lamp_light = LAMP_LIGHT_INTENSITY;
        fixtures.lamp_bulb = hex_to_linear(BULB_ON);
        fixtures.ambient_light = AMBIENT_INTENSITY_LAMP_ON;
    } else {
        fixtures.lamp_light = 0.0;
        fixtures.lamp_bulb = hex_to_linear(BULB_OFF);
        fixtures.ambient_light = AMBIENT_INTENSITY;
    }
    vec![Effect::Play(Cue::Click)]
}

pub fn toggle_tv(ctx: &mut DispatchContext<'_>) -> Vec<Effect> {
    let cue = if ctx.state.tv_on {
        ctx.state.tv_channel = ctx.state.next_tv_channel();
        Cue::Static
    } else {
        ctx.state.tv_on = true;
        Cue::Click
    };
    sync_tv(ctx.state, ctx.fixtures);
    vec![Effect::Play(cue)]
}

/// Brings the screen and glow in line with the TV state.
pub fn sync_tv(state: &SceneState, fixtures: &mut Fixtures) {
    if state.tv_on {
        let index = usize::from(state.tv_channel.clamp(1, TV_CHANNELS) - 1);
        fixtures.tv_screen = ScreenTint::Lit(hex_to_linear(TV_CHANNEL_COLORS[index]));
        fixtures.tv_light = TV_LIGHT_INTENSITY;
    } else {
        fixtures.tv_screen = ScreenTint::Off;
        fixtures.tv_light = 0.0;
    }
}

pub fn pet_cat(ctx: &mut DispatchContext<'_>) -> Vec<Effect> {
    ctx.state.cat_pet_count += 1;
    let cue = if ctx.state.cat_pet_count % 3 == 0 {
        Cue::Purr
    } else {
        Cue::Meow
    };
    let phrase = CAT_PHRASES
        .choose(&mut *ctx.rng)
        .copied()
        .unwrap_or(CAT_PHRASES[0]);
    ctx.speech.show(phrase);
    vec![Effect::Play(cue)]
}

pub fn toggle_sofa(ctx: &mut DispatchContext<'_>) -> Vec<Effect> {
    ctx.state.is_sitting = !ctx.state.is_sitting;
    if ctx.state.is_sitting {
        ctx.camera.position = ctx.config.seated_position;
        ctx.input.reset_look();
        ctx.camera.set_orientation(0.0, 0.0);
    }
    info!("sitting: {}", ctx.state.is_sitting);
    Vec::new()
}

pub fn enter_computer(ctx: &mut DispatchContext<'_>) -> Vec<Effect> {
    ctx.state.is_using_computer = true;
    ctx.state.computer_on = true;
    ctx.fixtures.monitor_screen = ScreenTint::Lit(hex_to_linear(MONITOR_ON));
    ctx.terminal.open();
    ctx.input.release_all();
    info!("entering computer mode");

    let mut effects = vec![Effect::Play(Cue::Click)];
    if let Some(link) = ctx.config.computer_link.clone() {
        effects.push(Effect::OpenLink(link));
    }
    effects.push(Effect::FocusTerminal);
    effects.push(Effect::ReleasePointerLock);
    effects
}

/// Leaves computer mode. Does nothing when the computer is not in use.
pub fn exit_computer(
    state: &mut SceneState,
    fixtures: &mut Fixtures,
    terminal: &mut Terminal,
    config: &RoomConfig,
) -> Vec<Effect> {
    if !state.is_using_computer {
        return Vec::new();
    }
    state.is_using_computer = false;
    state.computer_on = false;
    fixtures.monitor_screen = ScreenTint::Off;
    terminal.close();
    info!("leaving computer mode");
    vec![Effect::RequestPointerLock {
        delay_ms: config.relock_delay_ms,
    }]
}
