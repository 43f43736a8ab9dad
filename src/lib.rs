//! A first-person cozy room: a lamp, a TV, a computer with a toy terminal,
//! a cat and a sofa.
//!
//! The session logic in [`room`] is plain Rust and runs headless; the
//! renderer and the browser shell sit on top of it.

pub mod animation;
pub mod app;
pub mod audio;
pub mod camera;
pub mod config;
pub mod geometry;
pub mod input;
pub mod interaction;
pub mod raycast;
pub mod render;
pub mod room;
pub mod scene;
pub mod state;
pub mod terminal;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use audio::{AudioSink, Cue, LogSink, Sound};
pub use camera::FirstPersonCamera;
pub use config::RoomConfig;
pub use input::{InputState, KeyCode, NamedKey};
pub use interaction::Effect;
pub use raycast::{Hit, HitTester};
pub use render::{CameraParams, Frame, Renderer};
pub use room::{Overlay, Room};
pub use scene::{Scene, SceneError, SceneObject};
pub use state::{ObjectKind, SceneState};
pub use terminal::{Clock, Terminal, TerminalOutcome};
