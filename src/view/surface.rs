use std::fmt;
use std::str::FromStr;

use crate::error::SandpitError;

/// Drawing context flavour requested for the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Canvas,
    WebGl,
}

impl SurfaceKind {
    /// Context id passed to `canvas.getContext`
    pub fn context_id(self) -> &'static str {
        match self {
            SurfaceKind::Canvas => "2d",
            SurfaceKind::WebGl => "webgl2",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SurfaceKind::Canvas => "2d",
            SurfaceKind::WebGl => "3d",
        }
    }
}

impl FromStr for SurfaceKind {
    type Err = SandpitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2d" => Ok(SurfaceKind::Canvas),
            "3d" | "webgl" => Ok(SurfaceKind::WebGl),
            other => Err(SandpitError::InvalidSurfaceKind(other.to_string())),
        }
    }
}

impl TryFrom<&str> for SurfaceKind {
    type Error = SandpitError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::*;

#[cfg(target_arch = "wasm32")]
mod browser {
    use wasm_bindgen::{JsCast, JsValue};
    use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, WebGl2RenderingContext, Window};

    use super::SurfaceKind;
    use crate::error::{Result, SandpitError};

    /// Where the surface canvas gets appended
    #[derive(Debug, Clone)]
    pub enum Container {
        Selector(String),
        Element(Element),
        /// Whatever JavaScript handed over
        Value(JsValue),
    }

    impl From<&str> for Container {
        fn from(selector: &str) -> Self {
            Container::Selector(selector.to_string())
        }
    }

    impl From<String> for Container {
        fn from(selector: String) -> Self {
            Container::Selector(selector)
        }
    }

    impl From<Element> for Container {
        fn from(element: Element) -> Self {
            Container::Element(element)
        }
    }

    impl From<JsValue> for Container {
        fn from(value: JsValue) -> Self {
            Container::Value(value)
        }
    }

    impl Container {
        pub fn resolve(self, document: &Document) -> Result<Element> {
            match self {
                Container::Selector(selector) => query(document, &selector),
                Container::Element(element) => Ok(element),
                Container::Value(value) => {
                    if let Some(selector) = value.as_string() {
                        query(document, &selector)
                    } else {
                        value
                            .dyn_into::<Element>()
                            .map_err(|_| SandpitError::InvalidContainer("expected a selector or an element".into()))
                    }
                }
            }
        }
    }

    fn query(document: &Document, selector: &str) -> Result<Element> {
        document
            .query_selector(selector)
            .ok()
            .flatten()
            .ok_or_else(|| SandpitError::InvalidContainer(format!("`{selector}` matches no element")))
    }

    #[derive(Debug, Clone)]
    pub enum DrawingContext {
        Canvas2d(CanvasRenderingContext2d),
        WebGl(WebGl2RenderingContext),
    }

    impl DrawingContext {
        pub fn as_2d(&self) -> Option<&CanvasRenderingContext2d> {
            match self {
                DrawingContext::Canvas2d(ctx) => Some(ctx),
                DrawingContext::WebGl(_) => None,
            }
        }

        pub fn as_webgl(&self) -> Option<&WebGl2RenderingContext> {
            match self {
                DrawingContext::WebGl(ctx) => Some(ctx),
                DrawingContext::Canvas2d(_) => None,
            }
        }
    }

    pub(crate) fn window() -> Result<Window> {
        web_sys::window().ok_or_else(|| SandpitError::Js("no global `window`".into()))
    }

    pub(crate) fn document() -> Result<Document> {
        window()?
            .document()
            .ok_or_else(|| SandpitError::Js("no document on window".into()))
    }

    /// Viewport size in CSS pixels
    pub fn viewport_size(window: &Window) -> (u32, u32) {
        let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        (width as u32, height as u32)
    }

    /// Full-viewport canvas plus its drawing context
    pub struct RenderSurface {
        kind: SurfaceKind,
        canvas: HtmlCanvasElement,
        context: DrawingContext,
    }

    impl RenderSurface {
        pub fn create(container: Container, kind: SurfaceKind) -> Result<Self> {
            let window = window()?;
            let document = document()?;
            let parent = container.resolve(&document)?;

            let canvas = document
                .create_element("canvas")?
                .dyn_into::<HtmlCanvasElement>()
                .map_err(|_| SandpitError::Js("failed to create canvas".into()))?;
            let (width, height) = viewport_size(&window);
            canvas.set_width(width);
            canvas.set_height(height);
            parent.append_child(&canvas)?;

            let context = match acquire_context(&canvas, kind) {
                Ok(context) => context,
                Err(err) => {
                    canvas.remove();
                    return Err(err);
                }
            };

            tracing::debug!("created {kind} surface {width}x{height}");
            Ok(Self { kind, canvas, context })
        }

        pub fn kind(&self) -> SurfaceKind {
            self.kind
        }

        pub fn canvas(&self) -> &HtmlCanvasElement {
            &self.canvas
        }

        pub fn context(&self) -> &DrawingContext {
            &self.context
        }

        pub fn width(&self) -> u32 {
            self.canvas.width()
        }

        pub fn height(&self) -> u32 {
            self.canvas.height()
        }

        /// Matches the canvas to the current viewport
        pub fn resize_to_viewport(&self) -> Result<()> {
            let (width, height) = viewport_size(&window()?);
            self.canvas.set_width(width);
            self.canvas.set_height(height);
            Ok(())
        }

        /// Erases the 2D surface. WebGL callers clear through their own context.
        pub fn clear(&self) {
            if let DrawingContext::Canvas2d(ctx) = &self.context {
                ctx.clear_rect(0.0, 0.0, self.width() as f64, self.height() as f64);
            }
        }

        /// Paints the whole 2D surface with a CSS color
        pub fn fill(&self, color: &str) {
            if let DrawingContext::Canvas2d(ctx) = &self.context {
                ctx.set_fill_style_str(color);
                ctx.fill_rect(0.0, 0.0, self.width() as f64, self.height() as f64);
            }
        }
    }

    fn acquire_context(canvas: &HtmlCanvasElement, kind: SurfaceKind) -> Result<DrawingContext> {
        let unavailable = || SandpitError::ContextUnavailable(kind.context_id().to_string());
        let object = canvas
            .get_context(kind.context_id())
            .map_err(|_| unavailable())?
            .ok_or_else(unavailable)?;

        match kind {
            SurfaceKind::Canvas => object
                .dyn_into::<CanvasRenderingContext2d>()
                .map(DrawingContext::Canvas2d)
                .map_err(|_| unavailable()),
            SurfaceKind::WebGl => object
                .dyn_into::<WebGl2RenderingContext>()
                .map(DrawingContext::WebGl)
                .map_err(|_| unavailable()),
        }
    }
}
