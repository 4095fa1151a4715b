/// Platform-agnostic pointer and touch tracking
use std::cell::RefCell;

use super::hooks::{invoke, Hooks};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Semantic input kinds, decoupled from DOM event names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Move,
    Down,
    Up,
    Enter,
    Leave,
    Orientation,
}

/// The user hook an input kind is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookTarget {
    Move,
    Touch,
    Release,
    Accelerometer,
}

impl InputKind {
    pub fn hook(self) -> HookTarget {
        match self {
            InputKind::Move => HookTarget::Move,
            InputKind::Down => HookTarget::Touch,
            // entering reports through `release` as well, the demos rely on it
            InputKind::Up | InputKind::Leave | InputKind::Enter => HookTarget::Release,
            InputKind::Orientation => HookTarget::Accelerometer,
        }
    }
}

/// DOM pointer events and their meaning. Listeners are attached and detached
/// by walking this table.
pub const POINTER_EVENTS: [(&str, InputKind); 8] = [
    ("mousemove", InputKind::Move),
    ("mousedown", InputKind::Down),
    ("mouseup", InputKind::Up),
    ("mouseenter", InputKind::Enter),
    ("mouseleave", InputKind::Leave),
    ("touchmove", InputKind::Move),
    ("touchstart", InputKind::Down),
    ("touchend", InputKind::Up),
];

pub const ORIENTATION_EVENT: &str = "deviceorientation";

/// Platform-independent input event
#[derive(Debug, Clone, PartialEq)]
pub struct InputEvent {
    pub kind: InputKind,
    pub point: Option<Point>,
    pub touches: Vec<Point>,
}

impl InputEvent {
    pub fn pointer(kind: InputKind, x: f64, y: f64) -> Self {
        let point = Point::new(x, y);
        Self {
            kind,
            point: Some(point),
            touches: vec![point],
        }
    }

    pub fn orientation() -> Self {
        Self {
            kind: InputKind::Orientation,
            point: None,
            touches: Vec::new(),
        }
    }
}

/// Where the pointer is while it is active. The coordinates only exist between a
/// move/down/enter and the next up/leave.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    point: Option<Point>,
    touches: Vec<Point>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update state from an event and report which hook should hear about it
    pub fn process_event(&mut self, event: &InputEvent) -> HookTarget {
        match event.kind {
            InputKind::Move | InputKind::Down | InputKind::Enter => {
                if let Some(point) = event.point {
                    self.point = Some(point);
                    self.touches = if event.touches.is_empty() {
                        vec![point]
                    } else {
                        event.touches.clone()
                    };
                }
            }
            InputKind::Up | InputKind::Leave => {
                self.point = None;
                self.touches.clear();
            }
            InputKind::Orientation => {}
        }
        event.kind.hook()
    }

    pub fn point(&self) -> Option<Point> {
        self.point
    }

    pub fn x(&self) -> Option<f64> {
        self.point.map(|p| p.x)
    }

    pub fn y(&self) -> Option<f64> {
        self.point.map(|p| p.y)
    }

    /// Every active touch, or the mouse position as a single entry
    pub fn touches(&self) -> &[Point] {
        &self.touches
    }

    pub fn is_active(&self) -> bool {
        self.point.is_some()
    }
}

/// Applies `event` to the shared state, then runs the matching hook with `raw`.
/// The state borrow is released before the hook runs.
pub fn dispatch<E>(
    input: &RefCell<InputState>,
    hooks: &RefCell<Hooks<E>>,
    event: &InputEvent,
    raw: &E,
) -> bool {
    let target = input.borrow_mut().process_event(event);
    match target {
        HookTarget::Move => invoke(hooks, |h| &mut h.on_move, |f| f(raw)),
        HookTarget::Touch => invoke(hooks, |h| &mut h.touch, |f| f(raw)),
        HookTarget::Release => invoke(hooks, |h| &mut h.release, |f| f(raw)),
        HookTarget::Accelerometer => invoke(hooks, |h| &mut h.accelerometer, |f| f(raw)),
    }
}

pub mod wasm {
    use super::*;
    use wasm_bindgen::JsCast;
    use web_sys::{Event, MouseEvent, TouchEvent, TouchList};

    pub fn mouse_event_to_input(kind: InputKind, e: &MouseEvent) -> InputEvent {
        InputEvent::pointer(kind, e.page_x() as f64, e.page_y() as f64)
    }

    fn touch_points(list: &TouchList) -> Vec<Point> {
        (0..list.length())
            .filter_map(|i| list.get(i))
            .map(|t| Point::new(t.page_x() as f64, t.page_y() as f64))
            .collect()
    }

    pub fn touch_event_to_input(kind: InputKind, e: &TouchEvent) -> InputEvent {
        let touches = touch_points(&e.touches());
        let point = touch_points(&e.changed_touches())
            .first()
            .copied()
            .or_else(|| touches.first().copied());
        InputEvent { kind, point, touches }
    }

    pub fn event_to_input(kind: InputKind, e: &Event) -> InputEvent {
        if let Some(touch) = e.dyn_ref::<TouchEvent>() {
            touch_event_to_input(kind, touch)
        } else if let Some(mouse) = e.dyn_ref::<MouseEvent>() {
            mouse_event_to_input(kind, mouse)
        } else {
            InputEvent { kind, point: None, touches: Vec::new() }
        }
    }
}
