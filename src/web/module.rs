use js_sys::{Function, Object, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::WebGl2RenderingContext;

use crate::error::{BridgeError, Result};
use crate::module::{RenderHandle, RenderModule};

/// Emscripten build of the rendering module, called through its
/// underscore-prefixed exports.
pub struct EmscriptenModule {
    module: JsValue,
    init: Function,
    translate: Function,
    resize_surface: Function,
    on_animation_frame: Function,
}

impl EmscriptenModule {
    /// Calls the global module factory and awaits the module it resolves to.
    pub async fn load(factory_name: &str) -> Result<Self> {
        let factory = Reflect::get(&js_sys::global(), &JsValue::from_str(factory_name))
            .map_err(|err| BridgeError::ModuleLoad(describe(&err)))?
            .dyn_into::<Function>()
            .map_err(|_| BridgeError::ModuleLoad(format!("`{factory_name}` is not a function")))?;
        let pending = factory
            .call0(&JsValue::NULL)
            .map_err(|err| BridgeError::ModuleLoad(describe(&err)))?;
        let module = JsFuture::from(Promise::resolve(&pending))
            .await
            .map_err(|err| BridgeError::ModuleLoad(describe(&err)))?;
        log::debug!("rendering module loaded from `{factory_name}`");
        Self::from_module(module)
    }

    pub fn from_module(module: JsValue) -> Result<Self> {
        Ok(Self {
            init: export(&module, "_init")?,
            translate: export(&module, "_on_translate")?,
            resize_surface: export(&module, "_resize_surface")?,
            on_animation_frame: export(&module, "_on_animation_frame")?,
            module,
        })
    }

    /// Registers `context` with the module's GL layer as a WebGL2 context
    /// and makes it current.
    pub fn register_context(&self, context: &WebGl2RenderingContext) -> Result<()> {
        self.register_context_value(context.as_ref())
    }

    fn register_context_value(&self, context: &JsValue) -> Result<()> {
        let gl = Reflect::get(&self.module, &JsValue::from_str("GL"))
            .map_err(|err| BridgeError::ModuleLoad(describe(&err)))?;
        let register = export(&gl, "registerContext")?;
        let make_current = export(&gl, "makeContextCurrent")?;

        let attributes = Object::new();
        Reflect::set(
            &attributes,
            &JsValue::from_str("majorVersion"),
            &JsValue::from_f64(2.0),
        )
        .map_err(|err| BridgeError::Js(describe(&err)))?;

        let handle = register
            .call2(&gl, context, attributes.as_ref())
            .map_err(|err| BridgeError::Js(describe(&err)))?;
        make_current
            .call1(&gl, &handle)
            .map_err(|err| BridgeError::Js(describe(&err)))?;
        Ok(())
    }

    fn call(&self, name: &str, function: &Function, args: &[JsValue]) -> Option<JsValue> {
        let args: js_sys::Array = args.iter().collect();
        match function.apply(&self.module, &args) {
            Ok(value) => Some(value),
            Err(err) => {
                log::error!("{name} failed: {}", describe(&err));
                None
            }
        }
    }
}

impl RenderModule for EmscriptenModule {
    fn init(&mut self, width: u32, height: u32) -> Result<RenderHandle> {
        let value = self
            .init
            .call2(&self.module, &width.into(), &height.into())
            .map_err(|err| BridgeError::ModuleLoad(format!("_init failed: {}", describe(&err))))?;
        state_pointer(&value).map(RenderHandle::from_raw).ok_or_else(|| {
            BridgeError::ModuleLoad(format!(
                "_init did not return a state pointer: {}",
                describe(&value)
            ))
        })
    }

    fn translate(&mut self, handle: RenderHandle, scroll_y: f64) {
        self.call(
            "_on_translate",
            &self.translate,
            &[handle.into_raw().into(), scroll_y.into()],
        );
    }

    fn resize_surface(&mut self, handle: RenderHandle, width: u32, height: u32) {
        self.call(
            "_resize_surface",
            &self.resize_surface,
            &[handle.into_raw().into(), width.into(), height.into()],
        );
    }

    fn on_animation_frame(&mut self, handle: RenderHandle) {
        self.call(
            "_on_animation_frame",
            &self.on_animation_frame,
            &[handle.into_raw().into()],
        );
    }
}

/// A module state pointer is a non-zero address inside the wasm32 heap.
fn state_pointer(value: &JsValue) -> Option<u32> {
    let raw = value.as_f64()?;
    let valid = raw.fract() == 0.0 && raw > 0.0 && raw <= f64::from(u32::MAX);
    valid.then_some(raw as u32)
}

fn export(target: &JsValue, name: &str) -> Result<Function> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok())
        .ok_or_else(|| BridgeError::MissingExport(name.to_string()))
}

pub(crate) fn describe(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}
