// Ready-made sketches, selectable by name
pub mod multitouch;

/// Starts the demo called `name`
#[cfg(target_arch = "wasm32")]
pub fn run(name: &str, container: crate::view::Container) -> crate::error::Result<crate::sandpit::Sandpit> {
    match name {
        "multitouch" => multitouch::run(container),
        other => Err(crate::error::SandpitError::UnknownDemo(other.to_string())),
    }
}
