use js_sys::{Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlCanvasElement, WebGl2RenderingContext, WebglDebugRendererInfo, Window};

use crate::config::ContextAttributes;
use crate::error::{BridgeError, Result};
use crate::surface::{DisplaySurface, PixelSize};

/// The page canvas seen as a [`DisplaySurface`].
pub struct CanvasSurface {
    window: Window,
    canvas: HtmlCanvasElement,
}

impl CanvasSurface {
    pub fn new(window: Window, canvas: HtmlCanvasElement) -> Self {
        Self { window, canvas }
    }
}

impl DisplaySurface for CanvasSurface {
    fn css_size(&self) -> (f64, f64) {
        (
            f64::from(self.canvas.client_width()),
            f64::from(self.canvas.client_height()),
        )
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.window.device_pixel_ratio()
    }

    fn backing_size(&self) -> PixelSize {
        PixelSize::new(self.canvas.width(), self.canvas.height())
    }

    fn set_backing_size(&mut self, size: PixelSize) {
        self.canvas.set_width(size.width);
        self.canvas.set_height(size.height);
    }
}

pub fn find_canvas(document: &Document, selector: &str) -> Result<HtmlCanvasElement> {
    document
        .query_selector(selector)
        .map_err(|err| BridgeError::Js(format!("invalid selector {selector}: {err:?}")))?
        .ok_or_else(|| BridgeError::CanvasNotFound(selector.to_string()))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| BridgeError::NotACanvas(selector.to_string()))
}

/// Creates the WebGL2 context the rendering module draws into.
pub fn create_webgl2_context(
    canvas: &HtmlCanvasElement,
    attributes: &ContextAttributes,
) -> Result<WebGl2RenderingContext> {
    let options = Object::new();
    for (key, value) in [
        ("antialias", attributes.antialias),
        ("depth", attributes.depth),
        ("stencil", attributes.stencil),
        ("alpha", attributes.alpha),
    ] {
        Reflect::set(&options, &JsValue::from_str(key), &JsValue::from_bool(value))
            .map_err(|err| BridgeError::Js(format!("failed to build context options: {err:?}")))?;
    }

    canvas
        .get_context_with_context_options("webgl2", &options)
        .map_err(|err| BridgeError::Js(format!("failed to query canvas context: {err:?}")))?
        .ok_or_else(|| BridgeError::ContextUnsupported("webgl2".to_string()))?
        .dyn_into::<WebGl2RenderingContext>()
        .map_err(|_| BridgeError::ContextUnsupported("webgl2".to_string()))
}

/// Logs the unmasked GPU vendor and renderer. Browsers that hide them
/// only get a warning.
pub fn log_renderer_info(context: &WebGl2RenderingContext) {
    match context.get_extension("WEBGL_debug_renderer_info") {
        Ok(Some(_)) => {
            let vendor = parameter_string(context, WebglDebugRendererInfo::UNMASKED_VENDOR_WEBGL);
            let renderer =
                parameter_string(context, WebglDebugRendererInfo::UNMASKED_RENDERER_WEBGL);
            log::info!("GPU vendor: {vendor}, renderer: {renderer}");
        }
        Ok(None) => log::warn!("WEBGL_debug_renderer_info is not available"),
        Err(err) => log::warn!("failed to query WEBGL_debug_renderer_info: {err:?}"),
    }
}

fn parameter_string(context: &WebGl2RenderingContext, parameter: u32) -> String {
    context
        .get_parameter(parameter)
        .ok()
        .and_then(|value| value.as_string())
        .unwrap_or_else(|| "unknown".to_string())
}
