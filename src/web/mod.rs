#![cfg(target_arch = "wasm32")]

//! Browser entry point: loads the rendering module, wires the WebGL2
//! context into it and forwards `wheel` and `resize` events to the bridge.

mod canvas;
mod listener;
mod module;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Event, HtmlCanvasElement, WheelEvent, Window};

use crate::bridge::{DeltaMode, FrameBridge, WheelDecision, WheelDelta};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};

pub use canvas::{create_webgl2_context, find_canvas, log_renderer_info, CanvasSurface};
pub use listener::Listener;
pub use module::EmscriptenModule;

type PageBridge = FrameBridge<EmscriptenModule, CanvasSurface>;

static LOGGER: Once = Once::new();

#[wasm_bindgen(start)]
pub fn bootstrap() {
    console_error_panic_hook::set_once();
}

/// Starts the bridge for this page. `config_json` is an optional JSON
/// [`BridgeConfig`]; omitted fields take their defaults.
#[wasm_bindgen(js_name = startBridge)]
pub async fn start_bridge(config_json: Option<String>) -> std::result::Result<WebBridge, JsValue> {
    let config = match config_json {
        Some(source) => BridgeConfig::from_json(&source),
        None => Ok(BridgeConfig::default()),
    }
    .map_err(|err| JsValue::from_str(&err.to_string()))?;
    init_logging(&config);

    match launch(&config).await {
        Ok(bridge) => Ok(bridge),
        Err(err) => {
            log::error!("{err}");
            report_fatal(&config, &err);
            Err(JsValue::from_str(&err.to_string()))
        }
    }
}

fn init_logging(config: &BridgeConfig) {
    let level = config.level().unwrap_or(log::Level::Info);
    LOGGER.call_once(|| wasm_logger::init(wasm_logger::Config::new(level)));
}

/// Handle kept by the page for as long as events should reach the module.
#[wasm_bindgen]
pub struct WebBridge {
    bridge: Rc<RefCell<PageBridge>>,
    listeners: Vec<Listener>,
}

#[wasm_bindgen]
impl WebBridge {
    #[wasm_bindgen(getter, js_name = scrollY)]
    pub fn scroll_y(&self) -> f64 {
        self.bridge.borrow().scroll_y()
    }

    #[wasm_bindgen(js_name = renderFrame)]
    pub fn render_frame(&self) {
        self.bridge.borrow_mut().render_frame();
    }

    /// Stops forwarding events. The rendering module keeps its last state.
    pub fn detach(&mut self) {
        self.listeners.clear();
    }
}

async fn launch(config: &BridgeConfig) -> Result<WebBridge> {
    let window = web_sys::window().ok_or(BridgeError::WindowUnavailable)?;
    let document = window.document().ok_or(BridgeError::DocumentUnavailable)?;
    let canvas = find_canvas(&document, &config.canvas_selector)?;

    let module = EmscriptenModule::load(&config.module_factory).await?;
    let context = create_webgl2_context(&canvas, &config.context)?;
    if config.log_renderer_info {
        log_renderer_info(&context);
    }
    module.register_context(&context)?;

    let surface = CanvasSurface::new(window.clone(), canvas);
    let bridge = Rc::new(RefCell::new(FrameBridge::start(
        module,
        surface,
        config.line_height_px,
    )?));
    let listeners = attach_listeners(&window, &bridge)?;

    Ok(WebBridge { bridge, listeners })
}

fn attach_listeners(window: &Window, bridge: &Rc<RefCell<PageBridge>>) -> Result<Vec<Listener>> {
    // Browsers with `onwheel` also fire the legacy event; listen to one only.
    let wheel_kind = if Reflect::has(window, &JsValue::from_str("onwheel")).unwrap_or(false) {
        "wheel"
    } else {
        "mousewheel"
    };

    let wheel = {
        let bridge = Rc::clone(bridge);
        let scheduler = window.clone();
        Listener::new(window.as_ref(), wheel_kind, false, move |event: Event| {
            event.prevent_default();
            let Some(delta) = wheel_delta(&event) else {
                return;
            };
            let decision = bridge.borrow_mut().on_wheel_event(delta);
            if decision == WheelDecision::Schedule {
                schedule_flush(&scheduler, Rc::clone(&bridge));
            }
        })?
    };

    let resize = {
        let bridge = Rc::clone(bridge);
        Listener::new(window.as_ref(), "resize", true, move |_event: Event| {
            bridge.borrow_mut().on_resize();
        })?
    };

    Ok(vec![wheel, resize])
}

/// Vertical delta of a `wheel` event, or of a legacy `mousewheel` event,
/// whose `wheelDelta` points the other way and has no `deltaY`.
fn wheel_delta(event: &Event) -> Option<WheelDelta> {
    if let Some(wheel) = event.dyn_ref::<WheelEvent>() {
        let value = wheel.delta_y();
        if value.is_finite() {
            return Some(WheelDelta {
                value,
                mode: DeltaMode::from_dom(wheel.delta_mode()),
            });
        }
    }
    let legacy = Reflect::get(event, &JsValue::from_str("wheelDelta"))
        .ok()?
        .as_f64()?;
    Some(WheelDelta::pixels(-legacy))
}

/// Runs the pending scroll flush on the next display refresh.
fn schedule_flush(window: &Window, bridge: Rc<RefCell<PageBridge>>) {
    let pending = Rc::clone(&bridge);
    let callback = Closure::once_into_js(move || {
        pending.borrow_mut().flush_scroll();
    });
    if let Err(err) = window.request_animation_frame(callback.unchecked_ref()) {
        log::error!("requestAnimationFrame failed: {err:?}");
        // Without a frame the in-flight flag would never clear.
        bridge.borrow_mut().flush_scroll();
    }
}

/// Shows `err` next to the canvas, or at the end of the body when the
/// canvas itself could not be found.
fn report_fatal(config: &BridgeConfig, err: &BridgeError) {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };
    if let Err(js_err) = insert_error_message(&document, config, err) {
        log::error!("failed to display error: {js_err:?}");
    }
}

fn insert_error_message(
    document: &Document,
    config: &BridgeConfig,
    err: &BridgeError,
) -> std::result::Result<(), JsValue> {
    let message = document.create_element("p")?;
    message.set_class_name("canvas-bridge-error");
    message.set_text_content(Some(&format!("Unable to start the renderer: {err}")));

    let canvas = document
        .query_selector(&config.canvas_selector)
        .ok()
        .flatten()
        .and_then(|element| element.dyn_into::<HtmlCanvasElement>().ok());
    let parent = canvas.as_ref().and_then(|canvas| canvas.parent_node());
    match (canvas, parent) {
        (Some(canvas), Some(parent)) => {
            parent.insert_before(&message, canvas.next_sibling().as_ref())?;
        }
        _ => {
            let body = document
                .body()
                .ok_or_else(|| JsValue::from_str("document has no body element"))?;
            body.append_child(&message)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use js_sys::{Function, Promise};
    use wasm_bindgen_futures::JsFuture;
    use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
    use web_sys::{Element, HtmlElement, WheelEventInit};

    use super::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn document() -> Document {
        web_sys::window().unwrap().document().unwrap()
    }

    fn mount_canvas(id: &str, parent: &Element) -> HtmlCanvasElement {
        let canvas = document().create_element("canvas").unwrap();
        canvas.set_id(id);
        let style = canvas.unchecked_ref::<HtmlElement>().style();
        style.set_property("width", "120px").unwrap();
        style.set_property("height", "80px").unwrap();
        style.set_property("display", "block").unwrap();
        parent.append_child(&canvas).unwrap();
        canvas.dyn_into().unwrap()
    }

    fn wheel(delta_y: f64) -> Event {
        let init = WheelEventInit::new();
        init.set_delta_y(delta_y);
        init.set_cancelable(true);
        WheelEvent::new_with_event_init_dict("wheel", &init)
            .unwrap()
            .into()
    }

    /// Resolves after the callbacks already queued for the next frame ran.
    async fn next_frame() {
        let window = web_sys::window().unwrap();
        let frame = Promise::new(&mut |resolve, _reject| {
            window.request_animation_frame(&resolve).unwrap();
        });
        JsFuture::from(frame).await.unwrap();
    }

    /// Module whose `_on_translate` records every scroll offset it receives.
    fn recording_js_module() -> (EmscriptenModule, js_sys::Array) {
        let module = Function::new_no_args(
            "return { translates: [], \
                      _init: function() { return 8; }, \
                      _on_translate: function(handle, y) { this.translates.push(y); }, \
                      _resize_surface: function() {}, \
                      _on_animation_frame: function() {} };",
        )
        .call0(&JsValue::NULL)
        .unwrap();
        let translates = Reflect::get(&module, &JsValue::from_str("translates"))
            .unwrap()
            .unchecked_into();
        (EmscriptenModule::from_module(module).unwrap(), translates)
    }

    #[wasm_bindgen_test]
    fn error_message_follows_the_canvas() {
        let document = document();
        let container = document.create_element("div").unwrap();
        document.body().unwrap().append_child(&container).unwrap();
        let canvas = mount_canvas("fatal-canvas", &container);
        let trailer = document.create_element("span").unwrap();
        container.append_child(&trailer).unwrap();

        let config = BridgeConfig {
            canvas_selector: "#fatal-canvas".into(),
            ..BridgeConfig::default()
        };
        insert_error_message(&document, &config, &BridgeError::MissingExport("_init".into()))
            .unwrap();

        let message = canvas.next_element_sibling().unwrap();
        assert_eq!(message.class_name(), "canvas-bridge-error");
        assert_eq!(
            message.text_content().unwrap(),
            "Unable to start the renderer: rendering module does not export `_init`"
        );
        assert_eq!(message.next_element_sibling(), Some(trailer));
    }

    #[wasm_bindgen_test]
    fn error_message_without_canvas_goes_to_the_body() {
        let document = document();
        let config = BridgeConfig {
            canvas_selector: "#no-such-canvas".into(),
            ..BridgeConfig::default()
        };
        let err = BridgeError::CanvasNotFound(config.canvas_selector.clone());
        insert_error_message(&document, &config, &err).unwrap();

        let last = document.body().unwrap().last_element_child().unwrap();
        assert_eq!(last.class_name(), "canvas-bridge-error");
        assert!(last.text_content().unwrap().contains("#no-such-canvas"));
    }

    #[wasm_bindgen_test]
    fn dropped_listener_stops_receiving_events() {
        let target = document().create_element("div").unwrap();
        let seen = Rc::new(Cell::new(0));
        let listener = {
            let seen = Rc::clone(&seen);
            Listener::new(target.as_ref(), "wheel", false, move |_event: Event| {
                seen.set(seen.get() + 1);
            })
            .unwrap()
        };

        target.dispatch_event(&wheel(1.0)).unwrap();
        assert_eq!(seen.get(), 1);
        drop(listener);
        target.dispatch_event(&wheel(1.0)).unwrap();
        assert_eq!(seen.get(), 1);
    }

    #[wasm_bindgen_test]
    fn legacy_wheel_delta_is_inverted() {
        let event = Event::new("mousewheel").unwrap();
        assert_eq!(wheel_delta(&event), None);

        Reflect::set(&event, &JsValue::from_str("wheelDelta"), &JsValue::from_f64(120.0)).unwrap();
        assert_eq!(wheel_delta(&event), Some(WheelDelta::pixels(-120.0)));
        assert_eq!(wheel_delta(&wheel(-3.0)), Some(WheelDelta::pixels(-3.0)));
    }

    #[wasm_bindgen_test]
    async fn wheel_burst_flushes_once_per_frame_until_detached() {
        let window = web_sys::window().unwrap();
        let canvas = mount_canvas("wired-canvas", &document().body().unwrap());
        let (module, translates) = recording_js_module();
        let surface = CanvasSurface::new(window.clone(), canvas);
        let bridge = Rc::new(RefCell::new(FrameBridge::start(module, surface, 16.0).unwrap()));
        let listeners = attach_listeners(&window, &bridge).unwrap();

        window.dispatch_event(&wheel(10.0)).unwrap();
        window.dispatch_event(&wheel(15.0)).unwrap();
        assert!(bridge.borrow().is_flush_pending());
        assert_eq!(translates.length(), 0);

        next_frame().await;
        assert!(!bridge.borrow().is_flush_pending());
        assert_eq!(translates.to_vec(), vec![JsValue::from_f64(25.0)]);

        let mut page = WebBridge {
            bridge: Rc::clone(&bridge),
            listeners,
        };
        page.detach();
        window.dispatch_event(&wheel(40.0)).unwrap();
        assert_eq!(page.scroll_y(), 25.0);
        assert!(!bridge.borrow().is_flush_pending());
    }
}
