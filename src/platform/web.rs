//! Browser bindings
//!
//! `requestAnimationFrame` scheduling, `localStorage` persistence, a canvas 2D
//! render surface and the DOM listeners feeding the [`InputAggregator`].

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Event, EventTarget, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent,
};

use super::input::{InputAggregator, Source};
use super::listeners::{Subscription, Subscriptions};
use super::scheduler::{Scheduler, TickCallback, TickHandle};
use crate::driver::{FrameDriver, FrameLoop};
use crate::persistence::{Storage, StorageError};
use crate::renderer::{Color, Surface, TextAlign};
use crate::settings::Settings;
use crate::sim::{GameId, GameState};

/// Ticks on `requestAnimationFrame`
pub struct WebScheduler {
    window: web_sys::Window,
}

impl WebScheduler {
    pub fn new() -> Option<Self> {
        web_sys::window().map(|window| Self { window })
    }
}

impl Scheduler for WebScheduler {
    fn request_tick(&self, callback: TickCallback) -> TickHandle {
        let closure = Closure::once_into_js(move |time: f64| callback(time));
        match self.window.request_animation_frame(closure.unchecked_ref()) {
            Ok(id) => TickHandle(id as u64),
            Err(e) => {
                log::error!("requestAnimationFrame failed: {:?}", e);
                TickHandle(0)
            }
        }
    }

    fn cancel_tick(&self, handle: TickHandle) {
        if let Err(e) = self.window.cancel_animation_frame(handle.0 as i32) {
            log::warn!("cancelAnimationFrame failed: {:?}", e);
        }
    }
}

/// Browser `localStorage`
pub struct LocalStorage {
    inner: web_sys::Storage,
}

impl LocalStorage {
    pub fn open() -> Result<Self, StorageError> {
        let window = web_sys::window().ok_or_else(|| StorageError::Unavailable("no window".into()))?;
        let inner = window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".into()))?;
        Ok(Self { inner })
    }
}

impl Storage for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner
            .set_item(key, value)
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.inner
            .remove_item(key)
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
    }
}

/// Canvas 2D context as a render surface
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx })
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> (f32, f32) {
        (self.canvas.width() as f32, self.canvas.height() as f32)
    }

    fn clear(&mut self, color: Color) {
        let (w, h) = self.size();
        self.fill_rect(0.0, 0.0, w, h, color);
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill_rect(x as f64, y as f64, w as f64, h as f64);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.begin_path();
        let _ = self.ctx.arc(
            center.x as f64,
            center.y as f64,
            radius.max(0.0) as f64,
            0.0,
            std::f64::consts::TAU,
        );
        self.ctx.fill();
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Color) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.begin_path();
        self.ctx.move_to(first.x as f64, first.y as f64);
        for p in rest {
            self.ctx.line_to(p.x as f64, p.y as f64);
        }
        self.ctx.close_path();
        self.ctx.fill();
    }

    fn fill_text(&mut self, text: &str, pos: Vec2, size: f32, align: TextAlign, color: Color) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.set_font(&format!("{}px monospace", size.round()));
        self.ctx.set_text_align(match align {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        });
        let _ = self.ctx.fill_text(text, pos.x as f64, pos.y as f64);
    }
}

/// Client coordinates to canvas pixels, accounting for CSS scaling
fn canvas_point(canvas: &HtmlCanvasElement, client_x: i32, client_y: i32) -> Vec2 {
    let rect = canvas.get_bounding_client_rect();
    let sx = if rect.width() > 0.0 { canvas.width() as f64 / rect.width() } else { 1.0 };
    let sy = if rect.height() > 0.0 { canvas.height() as f64 / rect.height() } else { 1.0 };
    Vec2::new(
        ((client_x as f64 - rect.left()) * sx) as f32,
        ((client_y as f64 - rect.top()) * sy) as f32,
    )
}

fn touch_point(canvas: &HtmlCanvasElement, event: &TouchEvent) -> Option<Vec2> {
    let touch = event.changed_touches().get(0)?;
    Some(canvas_point(canvas, touch.client_x(), touch.client_y()))
}

/// A DOM listener that stays registered until unsubscribed
struct DomListener {
    target: EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Subscription for DomListener {
    fn unsubscribe(&mut self) {
        if let Err(e) = self
            .target
            .remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref())
        {
            log::warn!("Failed to remove {} listener: {:?}", self.event, e);
        }
    }
}

fn listen(
    listeners: &mut Subscriptions,
    target: &EventTarget,
    event: &'static str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    listeners.push(Box::new(DomListener {
        target: target.clone(),
        event,
        closure,
    }));
    Ok(())
}

/// Attach keyboard, mouse and touch listeners. Dropping the returned
/// [`Subscriptions`] removes them again.
pub fn attach_input(canvas: &HtmlCanvasElement, input: Rc<RefCell<InputAggregator>>) -> Result<Subscriptions, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let mut listeners = Subscriptions::new();

    let keys = input.clone();
    listen(&mut listeners, &window, "keydown", move |event| {
        if let Some(key) = event.dyn_ref::<KeyboardEvent>() {
            if keys.borrow_mut().key_down(&key.key()) {
                event.prevent_default();
            }
        }
    })?;
    let keys = input.clone();
    listen(&mut listeners, &window, "keyup", move |event| {
        if let Some(key) = event.dyn_ref::<KeyboardEvent>() {
            keys.borrow_mut().key_up(&key.key());
        }
    })?;
    // Keys released while unfocused never report keyup
    let keys = input.clone();
    listen(&mut listeners, &window, "blur", move |_| {
        keys.borrow_mut().release_source(Source::Keyboard);
    })?;

    let (mouse, target) = (input.clone(), canvas.clone());
    listen(&mut listeners, canvas, "mousemove", move |event| {
        if let Some(m) = event.dyn_ref::<MouseEvent>() {
            mouse.borrow_mut().pointer_move(canvas_point(&target, m.client_x(), m.client_y()));
        }
    })?;
    let (mouse, target) = (input.clone(), canvas.clone());
    listen(&mut listeners, canvas, "mousedown", move |event| {
        if let Some(m) = event.dyn_ref::<MouseEvent>() {
            mouse.borrow_mut().pointer_down(canvas_point(&target, m.client_x(), m.client_y()));
        }
    })?;

    let touch_handlers: [(&'static str, fn(&mut InputAggregator, Vec2)); 3] = [
        ("touchstart", InputAggregator::touch_start),
        ("touchmove", InputAggregator::touch_move),
        ("touchend", InputAggregator::touch_end),
    ];
    for (name, apply) in touch_handlers {
        let (touch, target) = (input.clone(), canvas.clone());
        listen(&mut listeners, canvas, name, move |event| {
            event.prevent_default();
            if let Some(pos) = event.dyn_ref::<TouchEvent>().and_then(|t| touch_point(&target, t)) {
                apply(&mut touch.borrow_mut(), pos);
            }
        })?;
    }
    Ok(listeners)
}

/// A game running on a page canvas
///
/// Dropping it stops the frame loop and detaches the input listeners.
pub struct MountedGame {
    frame_loop: FrameLoop,
    listeners: Subscriptions,
}

impl MountedGame {
    pub fn frame_loop(&self) -> &FrameLoop {
        &self.frame_loop
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

/// Start `game` on the canvas with id `canvas_id`
pub fn mount(canvas_id: &str, game: GameId) -> Result<MountedGame, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| JsValue::from_str("canvas not found"))?
        .dyn_into::<HtmlCanvasElement>()?;

    let (w, h) = game.canvas_size();
    canvas.set_width(w as u32);
    canvas.set_height(h as u32);

    let storage: Rc<RefCell<dyn Storage>> = match LocalStorage::open() {
        Ok(s) => Rc::new(RefCell::new(s)),
        Err(e) => {
            log::warn!("{e}; scores will not persist");
            Rc::new(RefCell::new(crate::persistence::MemoryStorage::new()))
        }
    };
    let difficulty = Settings::load(&*storage.borrow()).difficulty(game);
    let seed = js_sys::Date::now() as u64;

    let input = Rc::new(RefCell::new(InputAggregator::new()));
    let listeners = attach_input(&canvas, input.clone())?;

    let mut driver = FrameDriver::new(GameState::new(game, difficulty, seed), input, storage);
    driver.set_surface(Box::new(CanvasSurface::new(canvas)?));

    let scheduler = WebScheduler::new().ok_or_else(|| JsValue::from_str("no window"))?;
    log::info!("{} mounted on #{}", game.title(), canvas_id);
    Ok(MountedGame {
        frame_loop: FrameLoop::start(Rc::new(RefCell::new(driver)), Rc::new(scheduler)),
        listeners,
    })
}
