use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use log::{info, warn};
use pollster::block_on;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode as WinitKey, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

use cozy_room::app::TranscriptEcho;
use cozy_room::{Effect, KeyCode, NamedKey, Renderer, Room};

const TITLE: &str = "Cozy Room";

/// Opens the window and runs the room until it is closed.
pub fn run(room: Room) -> Result<Room> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop = event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::from_error("event loop", err))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DesktopApp::new(room);
    event_loop
        .run_app(&mut app)
        .map_err(|err| anyhow!("event loop failed: {err}"))?;

    if let Some(err) = app.last_error.take() {
        return Err(err);
    }
    Ok(app.room)
}

#[derive(Debug)]
pub struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

struct Surface {
    window: Arc<Window>,
    renderer: Renderer,
}

struct DesktopApp {
    room: Room,
    surface: Option<Surface>,
    last_frame: Option<Instant>,
    relock_at: Option<Instant>,
    /// Characters typed into the terminal since the last Enter.
    line: String,
    echo: TranscriptEcho,
    title: String,
    last_error: Option<anyhow::Error>,
}

impl DesktopApp {
    fn new(room: Room) -> Self {
        Self {
            room,
            surface: None,
            last_frame: None,
            relock_at: None,
            line: String::new(),
            echo: TranscriptEcho::new(),
            title: TITLE.to_string(),
            last_error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.last_error = Some(err);
        event_loop.exit();
    }

    fn create_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(LogicalSize::new(1280.0, 720.0));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|err| WindowInitError::from_error("window", err))?,
        );
        let size = window.inner_size();
        let renderer = block_on(Renderer::new(
            Arc::clone(&window),
            size.width.max(1),
            size.height.max(1),
        ))?;
        self.room.resize(size.width, size.height);
        info!("click the window to look around, Esc releases the mouse");
        self.surface = Some(Surface { window, renderer });
        Ok(())
    }

    fn lock_pointer(&mut self) {
        let Some(surface) = &self.surface else {
            return;
        };
        let window = &surface.window;
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        match grabbed {
            Ok(()) => {
                window.set_cursor_visible(false);
                let effects = self.room.on_pointer_lock_change(true);
                self.perform(effects);
            }
            Err(err) => warn!("pointer lock unavailable: {err}"),
        }
    }

    fn unlock_pointer(&mut self) {
        if let Some(surface) = &self.surface {
            if let Err(err) = surface.window.set_cursor_grab(CursorGrabMode::None) {
                warn!("failed to release the cursor: {err}");
            }
            surface.window.set_cursor_visible(true);
        }
        let effects = self.room.on_pointer_lock_change(false);
        self.perform(effects);
    }

    fn perform(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::OpenLink(url) => info!("the computer would open {url}"),
                Effect::RequestPointerLock { delay_ms } => {
                    self.relock_at =
                        Some(Instant::now() + Duration::from_millis(u64::from(delay_ms)));
                }
                Effect::ReleasePointerLock => self.unlock_pointer(),
                Effect::FocusTerminal => {
                    self.line.clear();
                    self.echo = TranscriptEcho::new();
                    self.print_transcript();
                    info!("type commands into the window, Enter runs them");
                }
                // Played by the room.
                Effect::Play(_) => {}
            }
        }
    }

    fn print_transcript(&mut self) {
        for line in self.echo.pending(self.room.terminal().transcript()) {
            println!("{line}");
        }
    }

    fn handle_keyboard(&mut self, event: &KeyEvent) {
        let key = match event.physical_key {
            PhysicalKey::Code(code) => map_keycode(code),
            PhysicalKey::Unidentified(_) => None,
        };

        if event.state == ElementState::Released {
            if let Some(key) = key {
                self.room.on_key_up(key);
            }
            return;
        }

        if self.room.terminal().is_open() && key != Some(KeyCode::Named(NamedKey::Escape)) {
            self.type_into_terminal(event, key);
            return;
        }

        let Some(key) = key else {
            return;
        };
        if event.repeat {
            return;
        }
        let locked = self.room.state().is_pointer_locked;
        let effects = self.room.on_key_down(key);
        self.perform(effects);
        // Browsers drop pointer lock on Escape; mirror that.
        let escape = key == KeyCode::Named(NamedKey::Escape);
        if escape && locked && self.room.state().is_pointer_locked {
            self.unlock_pointer();
        }
    }

    fn type_into_terminal(&mut self, event: &KeyEvent, key: Option<KeyCode>) {
        self.room.on_terminal_key();
        match key {
            Some(KeyCode::Named(NamedKey::Enter)) => {
                let line = std::mem::take(&mut self.line);
                let effects = self.room.submit_command(&line);
                self.print_transcript();
                self.perform(effects);
            }
            Some(KeyCode::Named(NamedKey::Backspace)) => {
                self.line.pop();
            }
            _ => {
                if let Some(text) = &event.text {
                    self.line.extend(text.chars().filter(|ch| !ch.is_control()));
                }
            }
        }
    }

    fn update_title(&mut self) {
        let Some(surface) = &self.surface else {
            return;
        };
        let overlay = self.room.overlay();
        let title = if overlay.terminal_open {
            format!("{TITLE} - $ {}", self.line)
        } else if overlay.start_prompt {
            format!("{TITLE} - click to start")
        } else if let Some((text, _)) = overlay.speech {
            format!("{TITLE} - {text}")
        } else if let Some(tooltip) = overlay.tooltip {
            format!("{TITLE} - {tooltip}")
        } else {
            TITLE.to_string()
        };
        if title != self.title {
            surface.window.set_title(&title);
            self.title = title;
        }
    }

    fn redraw(&mut self) -> Result<()> {
        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|last| now.duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_frame = Some(now);

        self.room.tick(dt);
        self.update_title();

        let Some(surface) = self.surface.as_mut() else {
            return Ok(());
        };
        match surface.renderer.render(&self.room.frame()) {
            Ok(()) => Ok(()),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = surface.window.inner_size();
                surface.renderer.resize(size.width, size.height);
                Ok(())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(anyhow!("GPU is out of memory")),
            Err(wgpu::SurfaceError::Timeout) => {
                info!("surface timeout; retrying next frame");
                Ok(())
            }
            Err(wgpu::SurfaceError::Other) => {
                warn!("surface reported an unknown error; retrying next frame");
                Ok(())
            }
        }
    }
}

impl ApplicationHandler for DesktopApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.surface.is_some() {
            return;
        }
        if let Err(err) = self.create_surface(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(surface) = self.surface.as_mut() {
                    surface.renderer.resize(size.width, size.height);
                }
                self.room.resize(size.width, size.height);
            }
            WindowEvent::Focused(false) => {
                if self.room.state().is_pointer_locked {
                    self.unlock_pointer();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_keyboard(&event),
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if self.room.state().is_pointer_locked {
                    let effects = self.room.on_click();
                    self.perform(effects);
                } else if !self.room.state().is_using_computer {
                    self.room.resume_audio();
                    self.lock_pointer();
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.redraw() {
                    self.fail(event_loop, err);
                }
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.room.on_mouse_move(dx as f32, dy as f32);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(at) = self.relock_at {
            if Instant::now() >= at {
                self.relock_at = None;
                self.lock_pointer();
            }
        }
        if let Some(surface) = &self.surface {
            surface.window.request_redraw();
        }
    }
}

fn map_keycode(code: WinitKey) -> Option<KeyCode> {
    Some(match code {
        WinitKey::Space => KeyCode::Named(NamedKey::Space),
        WinitKey::Enter | WinitKey::NumpadEnter => KeyCode::Named(NamedKey::Enter),
        WinitKey::Tab => KeyCode::Named(NamedKey::Tab),
        WinitKey::ArrowLeft => KeyCode::Named(NamedKey::Left),
        WinitKey::ArrowRight => KeyCode::Named(NamedKey::Right),
        WinitKey::ArrowUp => KeyCode::Named(NamedKey::Up),
        WinitKey::ArrowDown => KeyCode::Named(NamedKey::Down),
        WinitKey::Escape => KeyCode::Named(NamedKey::Escape),
        WinitKey::Backspace => KeyCode::Named(NamedKey::Backspace),
        WinitKey::ShiftLeft => KeyCode::Named(NamedKey::LeftShift),
        WinitKey::ShiftRight => KeyCode::Named(NamedKey::RightShift),
        WinitKey::ControlLeft => KeyCode::Named(NamedKey::LeftCtrl),
        WinitKey::ControlRight => KeyCode::Named(NamedKey::RightCtrl),
        WinitKey::AltLeft => KeyCode::Named(NamedKey::LeftAlt),
        WinitKey::AltRight => KeyCode::Named(NamedKey::RightAlt),
        WinitKey::Digit0 => KeyCode::Digit(0),
        WinitKey::Digit1 => KeyCode::Digit(1),
        WinitKey::Digit2 => KeyCode::Digit(2),
        WinitKey::Digit3 => KeyCode::Digit(3),
        WinitKey::Digit4 => KeyCode::Digit(4),
        WinitKey::Digit5 => KeyCode::Digit(5),
        WinitKey::Digit6 => KeyCode::Digit(6),
        WinitKey::Digit7 => KeyCode::Digit(7),
        WinitKey::Digit8 => KeyCode::Digit(8),
        WinitKey::Digit9 => KeyCode::Digit(9),
        WinitKey::KeyA => KeyCode::Character('A'),
        WinitKey::KeyB => KeyCode::Character('B'),
        WinitKey::KeyC => KeyCode::Character('C'),
        WinitKey::KeyD => KeyCode::Character('D'),
        WinitKey::KeyE => KeyCode::Character('E'),
        WinitKey::KeyF => KeyCode::Character('F'),
        WinitKey::KeyG => KeyCode::Character('G'),
        WinitKey::KeyH => KeyCode::Character('H'),
        WinitKey::KeyI => KeyCode::Character('I'),
        WinitKey::KeyJ => KeyCode::Character('J'),
        WinitKey::KeyK => KeyCode::Character('K'),
        WinitKey::KeyL => KeyCode::Character('L'),
        WinitKey::KeyM => KeyCode::Character('M'),
        WinitKey::KeyN => KeyCode::Character('N'),
        WinitKey::KeyO => KeyCode::Character('O'),
        WinitKey::KeyP => KeyCode::Character('P'),
        WinitKey::KeyQ => KeyCode::Character('Q'),
        WinitKey::KeyR => KeyCode::Character('R'),
        WinitKey::KeyS => KeyCode::Character('S'),
        WinitKey::KeyT => KeyCode::Character('T'),
        WinitKey::KeyU => KeyCode::Character('U'),
        WinitKey::KeyV => KeyCode::Character('V'),
        WinitKey::KeyW => KeyCode::Character('W'),
        WinitKey::KeyX => KeyCode::Character('X'),
        WinitKey::KeyY => KeyCode::Character('Y'),
        WinitKey::KeyZ => KeyCode::Character('Z'),
        WinitKey::F1 => KeyCode::Function(1),
        WinitKey::F2 => KeyCode::Function(2),
        WinitKey::F3 => KeyCode::Function(3),
        WinitKey::F4 => KeyCode::Function(4),
        WinitKey::F5 => KeyCode::Function(5),
        WinitKey::F6 => KeyCode::Function(6),
        WinitKey::F7 => KeyCode::Function(7),
        WinitKey::F8 => KeyCode::Function(8),
        WinitKey::F9 => KeyCode::Function(9),
        WinitKey::F10 => KeyCode::Function(10),
        WinitKey::F11 => KeyCode::Function(11),
        WinitKey::F12 => KeyCode::Function(12),
        _ => return None,
    })
}
