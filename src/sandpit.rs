use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo::render::{request_animation_frame, AnimationFrame};
use wasm_bindgen::JsValue;
use web_sys::{Event, HtmlCanvasElement};

use crate::controller::input::{dispatch, wasm, InputEvent, ORIENTATION_EVENT, POINTER_EVENTS};
use crate::controller::{invoke, FrameLoop, Hooks, InputState, Lifecycle, SettingsBridge};
use crate::error::{Result, SandpitError};
use crate::logging::Logger;
use crate::model::{SettingDescriptors, SettingValue, SettingsState};
use crate::utils::Random;
use crate::view::surface::{document, window};
use crate::view::{BrowserLocation, Container, DrawingContext, PanelHooks, RenderSurface, SettingsPanel, SurfaceKind};

/// A sketch: one surface, its hooks, the frame loop and optional settings.
///
/// While running, the animation frame and the listeners keep the sketch alive;
/// `stop()` releases them.
pub struct Sandpit {
    inner: Rc<Inner>,
}

/// Handle for hooks that need to reach their own sketch
#[derive(Clone)]
pub struct WeakSandpit(Weak<Inner>);

impl WeakSandpit {
    pub fn upgrade(&self) -> Option<Sandpit> {
        self.0.upgrade().map(|inner| Sandpit { inner })
    }
}

struct Inner {
    surface: RenderSurface,
    frame_loop: FrameLoop,
    lifecycle: Cell<Lifecycle>,
    input: RefCell<InputState>,
    hooks: RefCell<Hooks<Event>>,
    listeners: RefCell<Vec<EventListener>>,
    frame: RefCell<Option<AnimationFrame>>,
    panel: RefCell<Option<SettingsPanel>>,
    settings: RefCell<Rc<RefCell<SettingsState>>>,
    logger: Logger,
}

impl Sandpit {
    /// `kind` is `"2d"`, or `"3d"`/`"webgl"`. The container is checked first.
    pub fn new(container: impl Into<Container>, kind: &str) -> Result<Self> {
        let parent = container.into().resolve(&document()?)?;
        let kind = kind.parse::<SurfaceKind>()?;
        Self::with_kind(parent, kind)
    }

    pub fn with_kind(container: impl Into<Container>, kind: SurfaceKind) -> Result<Self> {
        let surface = RenderSurface::create(container.into(), kind)?;
        Ok(Self {
            inner: Rc::new(Inner {
                surface,
                frame_loop: FrameLoop::new(),
                lifecycle: Cell::new(Lifecycle::Ready),
                input: RefCell::new(InputState::new()),
                hooks: RefCell::new(Hooks::default()),
                listeners: RefCell::new(Vec::new()),
                frame: RefCell::new(None),
                panel: RefCell::new(None),
                settings: RefCell::new(Rc::new(RefCell::new(SettingsState::default()))),
                logger: Logger::default(),
            }),
        })
    }

    pub fn downgrade(&self) -> WeakSandpit {
        WeakSandpit(Rc::downgrade(&self.inner))
    }

    pub fn on_setup(&self, hook: impl FnMut() + 'static) {
        self.inner.hooks.borrow_mut().setup = Some(Box::new(hook));
    }

    /// Called once per frame
    pub fn on_loop(&self, hook: impl FnMut() + 'static) {
        self.inner.hooks.borrow_mut().frame = Some(Box::new(hook));
    }

    pub fn on_move(&self, hook: impl FnMut(&Event) + 'static) {
        self.inner.hooks.borrow_mut().on_move = Some(Box::new(hook));
    }

    pub fn on_touch(&self, hook: impl FnMut(&Event) + 'static) {
        self.inner.hooks.borrow_mut().touch = Some(Box::new(hook));
    }

    /// Fires on pointer up, touch end, and the mouse entering or leaving the canvas
    pub fn on_release(&self, hook: impl FnMut(&Event) + 'static) {
        self.inner.hooks.borrow_mut().release = Some(Box::new(hook));
    }

    /// Replaces the default viewport resize
    pub fn on_resize(&self, hook: impl FnMut() + 'static) {
        self.inner.hooks.borrow_mut().resize = Some(Box::new(hook));
    }

    /// Only wired up on devices exposing `DeviceOrientationEvent`
    pub fn on_accelerometer(&self, hook: impl FnMut(&Event) + 'static) {
        self.inner.hooks.borrow_mut().accelerometer = Some(Box::new(hook));
    }

    pub fn on_change(&self, hook: impl FnMut(&str, &SettingValue) + 'static) {
        self.inner.hooks.borrow_mut().change = Some(Box::new(hook));
    }

    /// Replaces the default reset, which keeps only sticky settings in the URL
    pub fn on_reset(&self, hook: impl FnMut() + 'static) {
        self.inner.hooks.borrow_mut().reset = Some(Box::new(hook));
    }

    /// Declares the settings and shows the panel. With `queryable` the URL
    /// query string overrides initial values and follows every change.
    pub fn settings(&self, descriptors: SettingDescriptors, queryable: bool) -> Result<()> {
        let bridge = SettingsBridge::initialize(descriptors, queryable, Box::new(BrowserLocation))?;
        let state = bridge.state();

        let change = Rc::downgrade(&self.inner);
        let reset = Rc::downgrade(&self.inner);
        let hooks = PanelHooks {
            change: Box::new(move |name: &str, value: &SettingValue| {
                if let Some(inner) = change.upgrade() {
                    inner.logger.info(format_args!("Update fired on {name}: {value}"));
                    invoke(&inner.hooks, |h| &mut h.change, |f| f(name, value));
                }
            }),
            reset: Box::new(move || {
                reset
                    .upgrade()
                    .map(|inner| invoke(&inner.hooks, |h| &mut h.reset, |f| f()))
                    .unwrap_or(false)
            }),
        };

        let panel = SettingsPanel::new(bridge, hooks)?;
        *self.inner.settings.borrow_mut() = state;
        *self.inner.panel.borrow_mut() = Some(panel);
        Ok(())
    }

    /// Same as [`Sandpit::settings`] with descriptors given as JSON
    pub fn settings_json(&self, json: &str, queryable: bool) -> Result<()> {
        self.settings(SettingDescriptors::from_json(json)?, queryable)
    }

    /// Current value of a declared setting
    pub fn setting(&self, name: &str) -> Option<SettingValue> {
        self.inner.settings.borrow().borrow().get(name).cloned()
    }

    pub fn settings_state(&self) -> SettingsState {
        self.inner.settings.borrow().borrow().clone()
    }

    /// Toggles this sketch's informational logging
    pub fn debug(&self, verbose: bool) {
        self.inner.logger.set_verbose(verbose);
    }

    /// Clear the surface before every frame
    pub fn auto_clear(&self, enabled: bool) {
        self.inner.frame_loop.set_auto_clear(enabled);
    }

    pub fn clear(&self) {
        self.inner.surface.clear();
    }

    pub fn fill(&self, color: &str) {
        self.inner.surface.fill(color);
    }

    pub fn kind(&self) -> SurfaceKind {
        self.inner.surface.kind()
    }

    pub fn context(&self) -> &DrawingContext {
        self.inner.surface.context()
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        self.inner.surface.canvas()
    }

    /// Frames drawn since the last `start()`
    pub fn time(&self) -> u64 {
        self.inner.frame_loop.time()
    }

    pub fn width(&self) -> u32 {
        self.inner.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.surface.height()
    }

    pub fn input(&self) -> InputState {
        self.inner.input.borrow().clone()
    }

    /// An independent generator; equal seeds replay equal sequences
    pub fn random(&self, seed: Option<&str>) -> Random {
        Random::new(seed)
    }

    pub fn is_running(&self) -> bool {
        self.inner.lifecycle.get().is_running()
    }

    /// Runs `setup`, attaches the listeners and starts the frame loop.
    /// Does nothing while already running.
    pub fn start(&self) {
        let inner = &self.inner;
        let Some(next) = inner.lifecycle.get().start() else {
            inner.logger.info(format_args!("start() ignored, already running"));
            return;
        };
        inner.lifecycle.set(next);

        invoke(&inner.hooks, |h| &mut h.setup, |f| f());
        // setup is allowed to stop the sketch again
        if !inner.lifecycle.get().is_running() {
            return;
        }
        if inner.hooks.borrow().frame.is_none() {
            inner.logger.warn(format_args!("no loop hook installed, nothing will be drawn"));
        }

        if let Err(err) = Inner::attach_listeners(inner) {
            inner.logger.warn(format_args!("input disabled: {err}"));
        }
        inner.frame_loop.start();
        inner.logger.info(format_args!("started {} sketch", self.kind()));
        Inner::schedule(inner);
    }

    /// Cancels the next frame and detaches every listener
    pub fn stop(&self) {
        let inner = &self.inner;
        let Some(next) = inner.lifecycle.get().stop() else {
            return;
        };
        inner.lifecycle.set(next);
        inner.frame_loop.stop();
        inner.frame.borrow_mut().take();
        inner.listeners.borrow_mut().clear();
        inner.logger.info(format_args!("stopped after {} frames", inner.frame_loop.time()));
    }

    /// Runs the resize hook, or matches the surface to the viewport
    pub fn resize(&self) {
        self.inner.resize();
    }
}

impl Inner {
    fn resize(&self) {
        if invoke(&self.hooks, |h| &mut h.resize, |f| f()) {
            return;
        }
        if let Err(err) = self.surface.resize_to_viewport() {
            self.logger.warn(format_args!("resize failed: {err}"));
        }
    }

    fn attach_listeners(self: &Rc<Self>) -> Result<()> {
        let window = window()?;
        let canvas = self.surface.canvas();
        let mut listeners = Vec::with_capacity(POINTER_EVENTS.len() + 2);

        for (name, kind) in POINTER_EVENTS {
            let inner = Rc::clone(self);
            let handler = move |event: &Event| {
                let input = wasm::event_to_input(kind, event);
                dispatch(&inner.input, &inner.hooks, &input, event);
            };
            let listener = if name.starts_with("touch") {
                // keep the page from scrolling and from synthesizing mouse events
                let options = EventListenerOptions {
                    phase: EventListenerPhase::Bubble,
                    passive: false,
                };
                EventListener::new_with_options(canvas, name, options, move |event: &Event| {
                    event.prevent_default();
                    handler(event);
                })
            } else {
                EventListener::new(canvas, name, handler)
            };
            listeners.push(listener);
        }

        let inner = Rc::clone(self);
        listeners.push(EventListener::new(&window, "resize", move |_event: &Event| {
            inner.resize();
        }));

        if self.hooks.borrow().accelerometer.is_some() {
            if supports_orientation(&window) {
                let inner = Rc::clone(self);
                listeners.push(EventListener::new(&window, ORIENTATION_EVENT, move |event: &Event| {
                    dispatch(&inner.input, &inner.hooks, &InputEvent::orientation(), event);
                }));
            } else {
                let err = SandpitError::UnsupportedCapability("device orientation".into());
                self.logger.warn(format_args!("{err}"));
            }
        }

        *self.listeners.borrow_mut() = listeners;
        Ok(())
    }

    fn schedule(self: &Rc<Self>) {
        let inner = Rc::clone(self);
        let handle = request_animation_frame(move |_timestamp| inner.tick());
        *self.frame.borrow_mut() = Some(handle);
    }

    fn tick(self: &Rc<Self>) {
        self.frame.borrow_mut().take();
        let again = self.frame_loop.tick(
            || self.surface.clear(),
            || {
                invoke(&self.hooks, |h| &mut h.frame, |f| f());
            },
        );
        // a stop() and start() from inside the hook has already scheduled a frame
        if again && self.frame.borrow().is_none() {
            Self::schedule(self);
        }
    }
}

fn supports_orientation(window: &web_sys::Window) -> bool {
    js_sys::Reflect::has(window, &JsValue::from_str("DeviceOrientationEvent")).unwrap_or(false)
}
