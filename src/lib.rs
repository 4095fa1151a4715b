pub mod error;
pub mod logging;
pub mod utils;
pub mod ui;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

pub mod demos;
#[cfg(target_arch = "wasm32")]
pub mod sandpit;

pub use error::{Result, SandpitError};
pub use model::{DescriptorValue, Options, SettingDescriptor, SettingDescriptors, SettingValue, SettingsState};
pub use controller::{InputState, Point};
pub use utils::{Random, TWO_PI};
pub use view::SurfaceKind;
#[cfg(target_arch = "wasm32")]
pub use sandpit::{Sandpit, WeakSandpit};
#[cfg(target_arch = "wasm32")]
pub use view::{Container, DrawingContext};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{prelude::wasm_bindgen, JsValue};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    logging::init();
}

/// Runs a bundled demo inside `container` (a selector or an element)
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn run_demo(name: &str, container: JsValue) -> std::result::Result<(), JsValue> {
    logging::init();
    let sandpit = demos::run(name, Container::from(container))?;
    tracing::info!("running demo `{name}` on a {}x{} surface", sandpit.width(), sandpit.height());
    Ok(())
}
