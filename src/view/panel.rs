use std::cell::RefCell;
use std::rc::Rc;

use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo::render::{request_animation_frame, AnimationFrame};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Event, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent, Window};

use crate::controller::settings_bridge::{QueryStore, SettingsBridge};
use crate::error::{Result, SandpitError};
use crate::model::query;
use crate::model::SettingValue;
use crate::ui::{self, PanelOutput};
use crate::view::surface::window;
use crate::view::{GpuContext, PanelRenderer};

/// `location.search` plus `history.replaceState`
pub struct BrowserLocation;

impl QueryStore for BrowserLocation {
    fn search(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().search().ok())
            .unwrap_or_default()
    }

    fn replace(&mut self, query: &str) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let path = window.location().pathname().unwrap_or_default();
        let url = query::with_query(&path, query);
        let replaced = window
            .history()
            .and_then(|history| history.replace_state_with_url(&JsValue::NULL, "", Some(&url)));
        if let Err(err) = replaced {
            tracing::warn!("could not update the url: {}", SandpitError::from(err));
        }
    }

    fn reload(&mut self) {
        if let Some(window) = web_sys::window() {
            if let Err(err) = window.location().reload() {
                tracing::warn!("could not reload: {}", SandpitError::from(err));
            }
        }
    }
}

/// What the panel reports back to its owner
pub struct PanelHooks {
    /// A debounced change landed
    pub change: Box<dyn Fn(&str, &SettingValue)>,
    /// The reset button was pressed. Returns false to fall back to the default reset.
    pub reset: Box<dyn Fn() -> bool>,
}

type EventQueue = Rc<RefCell<Vec<egui::Event>>>;

/// The settings window, drawn with egui onto its own overlay canvas and
/// driven by its own animation frames
pub struct SettingsPanel {
    inner: Rc<PanelInner>,
}

struct PanelInner {
    canvas: HtmlCanvasElement,
    css_size: (f32, f32),
    ctx: egui::Context,
    bridge: RefCell<SettingsBridge>,
    hooks: PanelHooks,
    events: EventQueue,
    gpu: RefCell<Option<(GpuContext, PanelRenderer)>>,
    listeners: RefCell<Vec<EventListener>>,
    frame: RefCell<Option<AnimationFrame>>,
}

impl SettingsPanel {
    pub fn new(bridge: SettingsBridge, hooks: PanelHooks) -> Result<Self> {
        let window = window()?;
        let document = window
            .document()
            .ok_or_else(|| SandpitError::Js("no document on window".into()))?;
        let body = document
            .body()
            .ok_or_else(|| SandpitError::Js("no body on document".into()))?;

        let (css_width, css_height) = ui::panel_size(bridge.descriptors().len(), bridge.is_queryable());
        let dpr = window.device_pixel_ratio();
        let canvas = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| SandpitError::Js("failed to create canvas".into()))?;
        canvas.set_width((css_width as f64 * dpr) as u32);
        canvas.set_height((css_height as f64 * dpr) as u32);
        canvas.set_attribute(
            "style",
            &format!("position:fixed;top:0;right:0;z-index:10;width:{css_width}px;height:{css_height}px"),
        )?;
        body.append_child(&canvas)?;

        let events: EventQueue = Rc::new(RefCell::new(Vec::new()));
        let ctx = egui::Context::default();
        let mut listeners = pointer_listeners(&canvas, &events);
        listeners.extend(keyboard_listeners(&window, &ctx, &events));

        let inner = Rc::new(PanelInner {
            canvas,
            css_size: (css_width, css_height),
            ctx,
            bridge: RefCell::new(bridge),
            hooks,
            events,
            gpu: RefCell::new(None),
            listeners: RefCell::new(listeners),
            frame: RefCell::new(None),
        });

        PanelInner::init_gpu(&inner);
        PanelInner::schedule(&inner);
        Ok(Self { inner })
    }
}

impl PanelInner {
    fn init_gpu(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        let canvas = self.canvas.clone();
        spawn_local(async move {
            match GpuContext::new(&canvas, canvas.width(), canvas.height()).await {
                Ok(gpu) => {
                    if let Some(inner) = weak.upgrade() {
                        let renderer = PanelRenderer::new(&gpu);
                        *inner.gpu.borrow_mut() = Some((gpu, renderer));
                    }
                }
                Err(err) => tracing::warn!("settings panel disabled: {err}"),
            }
        });
    }

    fn schedule(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        let handle = request_animation_frame(move |timestamp| {
            if let Some(inner) = weak.upgrade() {
                inner.tick(timestamp);
            }
        });
        *self.frame.borrow_mut() = Some(handle);
    }

    fn tick(self: &Rc<Self>, timestamp: f64) {
        self.frame.borrow_mut().take();

        let fired = self.bridge.borrow_mut().flush(timestamp);
        for (name, value) in &fired {
            (self.hooks.change)(name.as_str(), value);
        }

        let output = self.draw(timestamp);
        if !output.changed.is_empty() {
            let mut bridge = self.bridge.borrow_mut();
            for name in &output.changed {
                bridge.changed(name, timestamp);
            }
        }
        if output.reset && !(self.hooks.reset)() {
            self.bridge.borrow_mut().reset();
        }

        Self::schedule(self);
    }

    /// Runs and paints one egui frame. Nothing is built until the GPU is ready
    /// so the first texture upload is never lost.
    fn draw(&self, timestamp: f64) -> PanelOutput {
        let mut slot = self.gpu.borrow_mut();
        let Some((gpu, renderer)) = slot.as_mut() else {
            self.events.borrow_mut().clear();
            return PanelOutput::default();
        };

        let dpr = web_sys::window().map(|w| w.device_pixel_ratio() as f32).unwrap_or(1.0);
        let (css_width, css_height) = self.css_size;
        let mut raw_input = egui::RawInput::default();
        raw_input.time = Some(timestamp / 1000.0);
        raw_input.screen_rect = Some(egui::Rect::from_min_size(
            egui::Pos2::ZERO,
            egui::vec2(css_width, css_height),
        ));
        raw_input.events.extend(self.events.borrow_mut().drain(..));
        self.ctx.set_pixels_per_point(dpr);

        let bridge = self.bridge.borrow();
        let state = bridge.state();
        let mut output = PanelOutput::default();
        let full_output = self.ctx.run(raw_input, |ctx| {
            output = ui::build_settings_panel(ctx, bridge.descriptors(), &mut state.borrow_mut(), bridge.is_queryable());
        });

        let primitives = self.ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        if let Err(err) = renderer.draw(gpu, &primitives, &full_output.textures_delta, full_output.pixels_per_point) {
            tracing::warn!("settings panel frame dropped: {err}");
        }
        output
    }
}

impl Drop for PanelInner {
    fn drop(&mut self) {
        self.listeners.get_mut().clear();
        self.canvas.remove();
    }
}

fn modifiers(alt: bool, ctrl: bool, shift: bool, meta: bool) -> egui::Modifiers {
    let mut modifiers = egui::Modifiers::default();
    modifiers.alt = alt;
    modifiers.ctrl = ctrl;
    modifiers.shift = shift;
    modifiers.mac_cmd = meta;
    modifiers.command = ctrl || meta;
    modifiers
}

fn mouse_button(button: i16) -> Option<egui::PointerButton> {
    match button {
        0 => Some(egui::PointerButton::Primary),
        1 => Some(egui::PointerButton::Middle),
        2 => Some(egui::PointerButton::Secondary),
        _ => None,
    }
}

/// First changed touch, relative to the overlay
fn touch_pos(canvas: &HtmlCanvasElement, event: &TouchEvent) -> Option<egui::Pos2> {
    let touch = event.changed_touches().get(0)?;
    let rect = canvas.get_bounding_client_rect();
    Some(egui::pos2(
        (touch.client_x() as f64 - rect.left()) as f32,
        (touch.client_y() as f64 - rect.top()) as f32,
    ))
}

fn pointer_listeners(canvas: &HtmlCanvasElement, events: &EventQueue) -> Vec<EventListener> {
    let active = EventListenerOptions {
        phase: EventListenerPhase::Bubble,
        passive: false,
    };
    let mut listeners = Vec::new();

    let queue = events.clone();
    listeners.push(EventListener::new(canvas, "mousemove", move |event: &Event| {
        if let Some(e) = event.dyn_ref::<MouseEvent>() {
            let pos = egui::pos2(e.offset_x() as f32, e.offset_y() as f32);
            queue.borrow_mut().push(egui::Event::PointerMoved(pos));
        }
    }));

    for (name, pressed) in [("mousedown", true), ("mouseup", false)] {
        let queue = events.clone();
        listeners.push(EventListener::new(canvas, name, move |event: &Event| {
            let Some(e) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let Some(button) = mouse_button(e.button()) else {
                return;
            };
            queue.borrow_mut().push(egui::Event::PointerButton {
                pos: egui::pos2(e.offset_x() as f32, e.offset_y() as f32),
                button,
                pressed,
                modifiers: modifiers(e.alt_key(), e.ctrl_key(), e.shift_key(), e.meta_key()),
            });
        }));
    }

    let queue = events.clone();
    listeners.push(EventListener::new(canvas, "mouseleave", move |_event: &Event| {
        queue.borrow_mut().push(egui::Event::PointerGone);
    }));

    // touches on the overlay never reach the sketch underneath
    for name in ["touchstart", "touchmove", "touchend"] {
        let queue = events.clone();
        let target = canvas.clone();
        listeners.push(EventListener::new_with_options(canvas, name, active, move |event: &Event| {
            let Some(e) = event.dyn_ref::<TouchEvent>() else {
                return;
            };
            let Some(pos) = touch_pos(&target, e) else {
                return;
            };
            event.prevent_default();
            let mut queue = queue.borrow_mut();
            queue.push(egui::Event::PointerMoved(pos));
            match name {
                "touchstart" | "touchend" => queue.push(egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed: name == "touchstart",
                    modifiers: egui::Modifiers::default(),
                }),
                _ => {}
            }
            if name == "touchend" {
                queue.push(egui::Event::PointerGone);
            }
        }));
    }

    listeners
}

/// Keys only reach egui while one of its text fields has focus
fn keyboard_listeners(window: &Window, ctx: &egui::Context, events: &EventQueue) -> Vec<EventListener> {
    let mut listeners = Vec::new();
    for (name, pressed) in [("keydown", true), ("keyup", false)] {
        let queue = events.clone();
        let ctx = ctx.clone();
        listeners.push(EventListener::new(window, name, move |event: &Event| {
            if !ctx.wants_keyboard_input() {
                return;
            }
            let Some(e) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let name = e.key();
            let mods = modifiers(e.alt_key(), e.ctrl_key(), e.shift_key(), e.meta_key());
            let mut queue = queue.borrow_mut();
            if let Some(key) = egui::Key::from_name(&name) {
                queue.push(egui::Event::Key {
                    key,
                    physical_key: None,
                    pressed,
                    repeat: e.repeat(),
                    modifiers: mods,
                });
            }
            if pressed && name.chars().count() == 1 && !mods.ctrl && !mods.mac_cmd {
                queue.push(egui::Event::Text(name));
            }
        }));
    }
    listeners
}
