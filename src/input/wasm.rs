use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use gloo_events::EventListener;
use wasm_bindgen::JsCast;
use web_sys::{window, HtmlCanvasElement, KeyboardEvent, MouseEvent};

use super::KeyCode;

/// Receiver of the DOM events the room reacts to.
pub trait InputSink {
    fn key_down(&mut self, key: KeyCode);
    fn key_up(&mut self, key: KeyCode);
    fn mouse_move(&mut self, dx: f32, dy: f32);
    fn click(&mut self);
    fn pointer_lock_changed(&mut self, locked: bool);
    fn resized(&mut self, width: u32, height: u32);
}

/// Keeps the DOM listeners alive for as long as the handler exists.
pub struct WasmInputHandler {
    _listeners: Vec<EventListener>,
}

impl WasmInputHandler {
    pub fn attach<S>(canvas: &HtmlCanvasElement, sink: Rc<RefCell<S>>) -> Result<Self>
    where
        S: InputSink + 'static,
    {
        let window = window().ok_or_else(|| anyhow!("window not available"))?;
        let document = window
            .document()
            .ok_or_else(|| anyhow!("document not available"))?;

        let mut listeners = Vec::new();

        {
            let sink = Rc::clone(&sink);
            listeners.push(EventListener::new(&document, "keydown", move |event| {
                if let Some(key) = event.dyn_ref::<KeyboardEvent>().and_then(map_key) {
                    sink.borrow_mut().key_down(key);
                }
            }));
        }

        {
            let sink = Rc::clone(&sink);
            listeners.push(EventListener::new(&document, "keyup", move |event| {
                if let Some(key) = event.dyn_ref::<KeyboardEvent>().and_then(map_key) {
                    sink.borrow_mut().key_up(key);
                }
            }));
        }

        {
            let sink = Rc::clone(&sink);
            listeners.push(EventListener::new(&document, "mousemove", move |event| {
                if let Some(event) = event.dyn_ref::<MouseEvent>() {
                    sink.borrow_mut()
                        .mouse_move(event.movement_x() as f32, event.movement_y() as f32);
                }
            }));
        }

        {
            let sink = Rc::clone(&sink);
            listeners.push(EventListener::new(canvas, "click", move |_| {
                sink.borrow_mut().click();
            }));
        }

        {
            let sink = Rc::clone(&sink);
            let lock_document = document.clone();
            listeners.push(EventListener::new(
                &document,
                "pointerlockchange",
                move |_| {
                    let locked = lock_document.pointer_lock_element().is_some();
                    sink.borrow_mut().pointer_lock_changed(locked);
                },
            ));
        }

        {
            let sink = Rc::clone(&sink);
            listeners.push(EventListener::new(&document, "pointerlockerror", move |_| {
                log::warn!("pointer lock request was denied");
                sink.borrow_mut().pointer_lock_changed(false);
            }));
        }

        {
            let sink = Rc::clone(&sink);
            let resize_window = window.clone();
            let canvas = canvas.clone();
            listeners.push(EventListener::new(&window, "resize", move |_| {
                let (width, height) = fit_canvas(&resize_window, &canvas);
                sink.borrow_mut().resized(width, height);
            }));
        }

        Ok(Self {
            _listeners: listeners,
        })
    }
}

/// Sizes the canvas backing store to the window and returns the new size.
pub fn fit_canvas(window: &web_sys::Window, canvas: &HtmlCanvasElement) -> (u32, u32) {
    let dimension = |value: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
        value
            .ok()
            .and_then(|value| value.as_f64())
            .map(|value| value.max(1.0) as u32)
            .unwrap_or(1)
    };
    let ratio = window.device_pixel_ratio().max(1.0);
    let width = (f64::from(dimension(window.inner_width())) * ratio) as u32;
    let height = (f64::from(dimension(window.inner_height())) * ratio) as u32;
    canvas.set_width(width);
    canvas.set_height(height);
    (width, height)
}

fn map_key(event: &KeyboardEvent) -> Option<KeyCode> {
    KeyCode::from_code(&event.code())
}
