#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use gloo_events::EventListener;
use log::{info, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, Document, HtmlCanvasElement, HtmlElement, HtmlInputElement, KeyboardEvent};

use crate::app::scene_summary;
use crate::audio::wasm::WebAudioSink;
use crate::config::RoomConfig;
use crate::input::wasm::{fit_canvas, InputSink, WasmInputHandler};
use crate::input::KeyCode;
use crate::interaction::Effect;
use crate::render::Renderer;
use crate::room::Room;
use crate::scene::Scene;
use crate::terminal::BrowserClock;

#[wasm_bindgen(start)]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
}

/// Browser entry point: owns the room, the renderer and the frame loop.
#[wasm_bindgen]
pub struct WebRoom {
    inner: Rc<RefCell<AppState>>,
    _input_handler: WasmInputHandler,
    _widget_listeners: Vec<EventListener>,
}

#[wasm_bindgen]
impl WebRoom {
    /// Builds the room on the canvas with the given element id.
    pub async fn create(canvas_id: String) -> Result<WebRoom, JsValue> {
        let window = window().ok_or_else(|| JsValue::from_str("window not available"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("document not available"))?;
        let canvas = document
            .get_element_by_id(&canvas_id)
            .ok_or_else(|| JsValue::from_str("canvas element not found"))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| JsValue::from_str("element is not a canvas"))?;

        let scene = Scene::cozy_room()
            .map_err(|err| JsValue::from_str(&format!("failed to parse scene XML: {err}")))?;
        for line in scene_summary(&scene) {
            info!("{line}");
        }

        let (width, height) = fit_canvas(&window, &canvas);
        let renderer = Renderer::new(wgpu::SurfaceTarget::Canvas(canvas.clone()), width, height)
            .await
            .map_err(|err| JsValue::from_str(&format!("renderer error: {err:#}")))?;

        let mut room = Room::new(scene, RoomConfig::default())
            .with_clock(BrowserClock)
            .with_audio(WebAudioSink::new());
        room.resize(width, height);

        let state = AppState {
            room,
            renderer,
            dom: Dom::lookup(&document, canvas.clone()),
            last_timestamp: None,
            shown_revision: None,
        };
        let inner = Rc::new(RefCell::new(state));

        let input_handler = WasmInputHandler::attach(&canvas, Rc::clone(&inner))
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        let widget_listeners = attach_widgets(&document, &inner);

        Ok(Self {
            inner,
            _input_handler: input_handler,
            _widget_listeners: widget_listeners,
        })
    }

    pub fn start(&self) -> Result<(), JsValue> {
        schedule_animation_loop(Rc::clone(&self.inner))
            .map_err(|err| JsValue::from_str(&err.to_string()))
    }
}

/// Start button and terminal input wiring.
fn attach_widgets(document: &Document, app: &Rc<RefCell<AppState>>) -> Vec<EventListener> {
    let mut listeners = Vec::new();

    if let Some(button) = document.get_element_by_id("start-btn") {
        let app = Rc::clone(app);
        listeners.push(EventListener::new(&button, "click", move |_| {
            let mut state = app.borrow_mut();
            state.room.resume_audio();
            state.dom.request_pointer_lock();
        }));
    }

    if let Some(input) = document.get_element_by_id("cli-input") {
        let app = Rc::clone(app);
        listeners.push(EventListener::new(&input, "keydown", move |event| {
            let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let mut state = app.borrow_mut();
            state.room.on_terminal_key();
            if event.key() != "Enter" {
                return;
            }
            let Some(field) = state.dom.cli_input.clone() else {
                return;
            };
            let line = field.value();
            field.set_value("");
            let effects = state.room.submit_command(&line);
            state.perform(effects);
        }));
    }

    listeners
}

struct AppState {
    room: Room,
    renderer: Renderer,
    dom: Dom,
    last_timestamp: Option<f64>,
    shown_revision: Option<u64>,
}

impl AppState {
    fn render_frame(&mut self, timestamp: f64) -> Result<()> {
        let dt = self
            .last_timestamp
            .map(|last| ((timestamp - last) / 1000.0) as f32)
            .unwrap_or(0.0);
        self.last_timestamp = Some(timestamp);

        self.room.tick(dt);
        self.update_overlay();

        match self.renderer.render(&self.room.frame()) {
            Ok(()) => Ok(()),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (width, height) = self.renderer.size();
                self.renderer.resize(width, height);
                Ok(())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(anyhow!("GPU is out of memory")),
            Err(wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other) => {
                warn!("surface unavailable, retrying next frame");
                Ok(())
            }
        }
    }

    fn update_overlay(&mut self) {
        let overlay = self.room.overlay();
        let dom = &self.dom;
        dom.set_display(&dom.start_overlay, overlay.start_prompt, "flex");
        dom.set_display(&dom.crosshair, !overlay.terminal_open, "block");
        if let Some(crosshair) = &dom.crosshair {
            set_style(crosshair, "color", overlay.crosshair.css_color());
        }
        dom.set_display(&dom.tooltip, overlay.tooltip.is_some(), "block");
        if let (Some(tooltip), Some(text)) = (&dom.tooltip, overlay.tooltip) {
            tooltip.set_text_content(Some(text));
        }
        dom.set_display(&dom.bubble, overlay.speech.is_some(), "block");
        if let (Some(bubble), Some((text, opacity))) = (&dom.bubble, overlay.speech) {
            bubble.set_text_content(Some(text));
            set_style(bubble, "opacity", &format!("{opacity:.2}"));
        }
        dom.set_display(&dom.cli_container, overlay.terminal_open, "flex");

        let terminal = self.room.terminal();
        if self.shown_revision != Some(terminal.revision()) {
            self.shown_revision = Some(terminal.revision());
            if let Some(output) = &self.dom.cli_output {
                output.set_text_content(Some(&terminal.transcript().join("\n")));
                output.set_scroll_top(output.scroll_height());
            }
        }
    }

    fn perform(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::OpenLink(url) => self.dom.open_link(&url),
                Effect::RequestPointerLock { delay_ms } => {
                    self.dom.request_pointer_lock_after(delay_ms)
                }
                Effect::ReleasePointerLock => self.dom.document.exit_pointer_lock(),
                Effect::FocusTerminal => {
                    if let Some(input) = &self.dom.cli_input {
                        if let Err(err) = input.focus() {
                            warn!("could not focus the terminal: {err:?}");
                        }
                    }
                }
                // Played by the room.
                Effect::Play(_) => {}
            }
        }
    }
}

impl InputSink for AppState {
    fn key_down(&mut self, key: KeyCode) {
        let effects = self.room.on_key_down(key);
        self.perform(effects);
    }

    fn key_up(&mut self, key: KeyCode) {
        self.room.on_key_up(key);
    }

    fn mouse_move(&mut self, dx: f32, dy: f32) {
        self.room.on_mouse_move(dx, dy);
    }

    fn click(&mut self) {
        let effects = self.room.on_click();
        self.perform(effects);
    }

    fn pointer_lock_changed(&mut self, locked: bool) {
        let effects = self.room.on_pointer_lock_change(locked);
        self.perform(effects);
    }

    fn resized(&mut self, width: u32, height: u32) {
        self.renderer.resize(width, height);
        self.room.resize(width, height);
    }
}

/// Overlay elements of the page. Missing ones are skipped.
struct Dom {
    document: Document,
    canvas: HtmlCanvasElement,
    start_overlay: Option<HtmlElement>,
    crosshair: Option<HtmlElement>,
    tooltip: Option<HtmlElement>,
    bubble: Option<HtmlElement>,
    cli_container: Option<HtmlElement>,
    cli_output: Option<HtmlElement>,
    cli_input: Option<HtmlInputElement>,
}

impl Dom {
    fn lookup(document: &Document, canvas: HtmlCanvasElement) -> Self {
        let element = |id: &str| {
            let found = document
                .get_element_by_id(id)
                .and_then(|element| element.dyn_into::<HtmlElement>().ok());
            if found.is_none() {
                warn!("page has no #{id} element");
            }
            found
        };
        Self {
            start_overlay: element("start-overlay"),
            crosshair: element("crosshair"),
            tooltip: element("tooltip"),
            bubble: element("cat-bubble"),
            cli_container: element("cli-container"),
            cli_output: element("cli-output"),
            cli_input: element("cli-input").and_then(|element| element.dyn_into().ok()),
            document: document.clone(),
            canvas,
        }
    }

    fn set_display(&self, element: &Option<HtmlElement>, shown: bool, display: &str) {
        if let Some(element) = element {
            set_style(element, "display", if shown { display } else { "none" });
        }
    }

    fn request_pointer_lock(&self) {
        self.canvas.request_pointer_lock();
    }

    fn request_pointer_lock_after(&self, delay_ms: u32) {
        let Some(window) = window() else {
            return;
        };
        let canvas = self.canvas.clone();
        let callback = Closure::once_into_js(move || canvas.request_pointer_lock());
        if let Err(err) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            delay_ms as i32,
        ) {
            warn!("could not schedule pointer lock: {err:?}");
        }
    }

    fn open_link(&self, url: &str) {
        let opened = window().map(|window| window.open_with_url_and_target(url, "_blank"));
        if !matches!(opened, Some(Ok(Some(_)))) {
            warn!("could not open {url}");
        }
    }
}

fn set_style(element: &HtmlElement, property: &str, value: &str) {
    if let Err(err) = element.style().set_property(property, value) {
        warn!("could not set {property}: {err:?}");
    }
}

fn schedule_animation_loop(app: Rc<RefCell<AppState>>) -> Result<()> {
    let window = window().ok_or_else(|| anyhow!("window not available"))?;
    let handle: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let next = Rc::clone(&handle);
    let frame_window = window.clone();

    *handle.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp: f64| {
        if let Err(err) = app.borrow_mut().render_frame(timestamp) {
            web_sys::console::error_1(&JsValue::from_str(&err.to_string()));
        }
        if let Some(closure) = next.borrow().as_ref() {
            let next_frame = frame_window.request_animation_frame(closure.as_ref().unchecked_ref());
            if let Err(err) = next_frame {
                web_sys::console::error_1(&err);
            }
        }
    }) as Box<dyn FnMut(f64)>));

    let first = handle.borrow();
    let closure = first
        .as_ref()
        .ok_or_else(|| anyhow!("animation closure missing"))?;
    window
        .request_animation_frame(closure.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("requestAnimationFrame failed: {err:?}"))?;
    Ok(())
}
