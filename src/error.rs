use thiserror::Error;
use wasm_bindgen::JsValue;

pub type Result<T> = std::result::Result<T, SandpitError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SandpitError {
    /// The container was neither a selector nor an element, or the selector matched nothing
    #[error("invalid container: {0}")]
    InvalidContainer(String),

    #[error("invalid surface kind `{0}`, expected `2d` or `3d`")]
    InvalidSurfaceKind(String),

    #[error("the browser refused a `{0}` drawing context")]
    ContextUnavailable(String),

    /// Only ever logged, the feature is disabled instead
    #[error("{0} is not supported by this device")]
    UnsupportedCapability(String),

    #[error("invalid setting `{name}`: {reason}")]
    InvalidSettingDescriptor { name: String, reason: String },

    #[error("invalid settings json: {0}")]
    InvalidSettingsJson(String),

    #[error("gpu: {0}")]
    Gpu(String),

    #[error("no demo named `{0}`")]
    UnknownDemo(String),

    #[error("js: {0}")]
    Js(String),
}

impl SandpitError {
    pub fn descriptor(name: impl Into<String>, reason: impl Into<String>) -> Self {
        SandpitError::InvalidSettingDescriptor {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl From<JsValue> for SandpitError {
    fn from(value: JsValue) -> Self {
        SandpitError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<serde_json::Error> for SandpitError {
    fn from(err: serde_json::Error) -> Self {
        SandpitError::InvalidSettingsJson(err.to_string())
    }
}

impl From<SandpitError> for JsValue {
    fn from(err: SandpitError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
