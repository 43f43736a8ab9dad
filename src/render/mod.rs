mod common;
mod renderer;
pub(crate) mod shared;

pub use common::{draw_order, CameraParams, Frame, MAX_POINT_LIGHTS};
pub use renderer::Renderer;
