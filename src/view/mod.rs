// VIEW: drawing surface and the settings overlay
pub mod surface;
pub mod gpu_init;
pub mod render;
#[cfg(target_arch = "wasm32")]
pub mod panel;

pub use surface::SurfaceKind;
#[cfg(target_arch = "wasm32")]
pub use surface::{Container, DrawingContext, RenderSurface};
pub use gpu_init::GpuContext;
pub use render::PanelRenderer;
#[cfg(target_arch = "wasm32")]
pub use panel::{BrowserLocation, PanelHooks, SettingsPanel};
