// CONTROLLER: input routing, hooks, the frame loop and settings plumbing
pub mod hooks;
pub mod input;
pub mod frame_loop;
pub mod lifecycle;
pub mod settings_bridge;

pub use hooks::{invoke, Hooks};
pub use input::{InputEvent, InputKind, InputState, Point};
pub use frame_loop::FrameLoop;
pub use lifecycle::Lifecycle;
pub use settings_bridge::{QueryStore, SettingsBridge};
