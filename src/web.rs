// logdyn-viewer - web.rs
//
// Browser host (wasm32 only). Wires the transport and renderer to the page:
//   - `WebSocketChannel` pushes outbound text through a `web_sys::WebSocket`
//     whose callbacks feed `ChannelEvent`s back into the transport.
//   - `BrowserConsole` mirrors records to the page console.
//   - `ElementMount` keeps a DOM element in step with its display surface.
//   - A window `error` listener reports uncaught errors through the
//     transport, including panics surfaced by `console_error_panic_hook`.
//
// Page glue constructs a `Viewer` once the DOM is ready and calls its
// methods from inputs, checkboxes and buttons.
//
// Callbacks run on the single JS thread. They take the transport with
// `try_borrow_mut` and drop re-entrant events with a warning.

use crate::app::channel::Channel;
use crate::app::console::ConsoleSink;
use crate::app::renderer::{Renderer, SurfaceMount};
use crate::app::transport::Transport;
use crate::core::model::{ChannelEvent, ConsoleMethod};
use crate::core::surface::DisplaySurface;
use crate::core::wire::{self, RawRecord};
use crate::platform::config;
use crate::ui::html;
use crate::util::error::{ChannelError, RenderError};
use crate::util::logging;
use std::cell::RefCell;
use std::fmt::Display;
use std::path::Path;
use std::rc::Rc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_web::MakeWebConsoleWriter;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, Element, ErrorEvent, MessageEvent, WebSocket};

type WebTransport = Transport<WebSocketChannel, BrowserConsole>;

// =============================================================================
// Channel
// =============================================================================

/// Outbound half of the page websocket.
pub struct WebSocketChannel {
    ws: WebSocket,
}

impl Channel for WebSocketChannel {
    fn send_text(&mut self, text: &str) -> Result<(), ChannelError> {
        if self.ws.ready_state() != WebSocket::OPEN {
            return Err(ChannelError::Closed);
        }
        self.ws
            .send_with_str(text)
            .map_err(|e| ChannelError::Send { reason: js_text(&e) })
    }

    fn close(&mut self) -> Result<(), ChannelError> {
        self.ws
            .close()
            .map_err(|e| ChannelError::Send { reason: js_text(&e) })
    }
}

// =============================================================================
// Console
// =============================================================================

/// Page console sink.
pub struct BrowserConsole;

impl ConsoleSink for BrowserConsole {
    fn write(&mut self, method: ConsoleMethod, line: &str) {
        let line = JsValue::from_str(line);
        match method {
            ConsoleMethod::Info => web_sys::console::info_1(&line),
            ConsoleMethod::Warn => web_sys::console::warn_1(&line),
            ConsoleMethod::Error => web_sys::console::error_1(&line),
            ConsoleMethod::Log => web_sys::console::log_1(&line),
        }
    }
}

// =============================================================================
// Surface mount
// =============================================================================

/// DOM element showing one display surface.
///
/// Only the classes the viewer owns are touched; classes the page put on
/// the element stay in place.
pub struct ElementMount {
    element: Element,
    applied: Vec<String>,
}

impl ElementMount {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            applied: Vec::new(),
        }
    }

    fn ensure_connected(&self, surface: &DisplaySurface) -> Result<(), RenderError> {
        if self.element.is_connected() {
            Ok(())
        } else {
            Err(RenderError::SurfaceDetached {
                name: surface.name().to_string(),
            })
        }
    }

    fn sync_classes(&mut self, surface: &DisplaySurface) -> Result<(), RenderError> {
        let wanted = html::surface_class_names(surface);
        let list = self.element.class_list();
        for stale in self.applied.iter().filter(|c| !wanted.contains(c)) {
            list.remove_1(stale).map_err(|e| mount_error(surface, &e))?;
        }
        for class in &wanted {
            list.add_1(class).map_err(|e| mount_error(surface, &e))?;
        }
        self.applied = wanted;
        Ok(())
    }
}

impl SurfaceMount for ElementMount {
    fn sync(&mut self, surface: &DisplaySurface) -> Result<(), RenderError> {
        self.ensure_connected(surface)?;
        self.sync_classes(surface)?;
        self.element.set_inner_html(&format!(
            "<style>{}</style>{}",
            html::stylesheet(surface),
            html::render_fragments(surface)
        ));
        Ok(())
    }

    fn appended(&mut self, surface: &DisplaySurface, index: usize) -> Result<(), RenderError> {
        self.ensure_connected(surface)?;
        let Some(fragment) = surface.fragments().get(index) else {
            return self.sync(surface);
        };
        self.element
            .insert_adjacent_html("beforeend", &html::render_fragment(fragment))
            .map_err(|e| mount_error(surface, &e))
    }

    fn scroll_to_latest(&mut self, _surface: &DisplaySurface) -> Result<(), RenderError> {
        self.element.set_scroll_top(self.element.scroll_height());
        Ok(())
    }
}

// =============================================================================
// Viewer
// =============================================================================

/// Page-facing handle owning the transport and the renderer.
#[wasm_bindgen]
pub struct Viewer {
    transport: Rc<RefCell<WebTransport>>,
    renderer: Rc<RefCell<Renderer>>,
}

#[wasm_bindgen]
impl Viewer {
    /// Connect to the logging endpoint of the page origin and attach one
    /// surface per configured element id. `config_toml` uses the same
    /// format as the native `config.toml` and may be empty.
    #[wasm_bindgen(constructor)]
    pub fn new(config_toml: &str) -> Result<Viewer, JsValue> {
        console_error_panic_hook::set_once();

        let (app_config, warnings) = config::parse_config(config_toml, Path::new("<page>"));
        init_logging(app_config.log_level.as_deref());
        for warning in &warnings {
            tracing::warn!(warning = %warning, "Config warning");
        }

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let mut renderer = Renderer::new();
        for name in &app_config.surfaces {
            let Some(element) = document.get_element_by_id(name) else {
                tracing::warn!(surface = %name, "No element with this id; surface skipped");
                continue;
            };
            renderer
                .add_mounted_surface(name.clone(), Box::new(ElementMount::new(element)))
                .map_err(to_js)?;
            for level in &app_config.hidden_levels {
                renderer
                    .toggle_level_visible(name, level, true)
                    .map_err(to_js)?;
            }
            if let Some(pattern) = &app_config.filter {
                renderer.filter(name, pattern).map_err(to_js)?;
            }
        }
        let renderer = Rc::new(RefCell::new(renderer));

        let origin = window.location().origin()?;
        let url = wire::endpoint_url(&origin, &app_config.endpoint_path);
        tracing::info!(url = %url, "Connecting log channel");
        let ws = WebSocket::new(&url)?;

        let transport = Transport::new(
            WebSocketChannel { ws: ws.clone() },
            BrowserConsole,
            app_config.transport_config(),
        )
        .with_renderer(Box::new(Rc::clone(&renderer)));
        let transport = Rc::new(RefCell::new(transport));

        install_socket_handlers(&ws, &transport);
        install_error_listener(&window, &transport)?;

        Ok(Viewer {
            transport,
            renderer,
        })
    }

    /// Show a record locally and send it upstream.
    pub fn log(&self, level: &str, message: &str) -> Result<(), JsValue> {
        let mut transport = self.transport.try_borrow_mut().map_err(to_js)?;
        transport
            .send(&RawRecord::new(level, message))
            .map(|_| ())
            .map_err(to_js)
    }

    /// Re-filter a surface; an empty pattern removes the filter.
    pub fn filter(&self, surface: &str, pattern: &str) -> Result<(), JsValue> {
        self.with_renderer(|r| r.filter(surface, pattern))
    }

    #[wasm_bindgen(js_name = toggleLevelVisible)]
    pub fn toggle_level_visible(
        &self,
        surface: &str,
        level: &str,
        hidden: bool,
    ) -> Result<(), JsValue> {
        self.with_renderer(|r| r.toggle_level_visible(surface, level, hidden))
    }

    pub fn clear(&self, surface: &str) -> Result<(), JsValue> {
        self.with_renderer(|r| r.clear(surface))
    }

    /// Pointer entered (`true`) or left (`false`) a surface.
    #[wasm_bindgen(js_name = setHover)]
    pub fn set_hover(&self, surface: &str, hovered: bool) -> Result<(), JsValue> {
        self.with_renderer(|r| r.set_hover(surface, hovered))
    }

    pub fn close(&self) -> Result<(), JsValue> {
        let mut transport = self.transport.try_borrow_mut().map_err(to_js)?;
        transport.close().map_err(to_js)
    }
}

impl Viewer {
    fn with_renderer<F>(&self, change: F) -> Result<(), JsValue>
    where
        F: FnOnce(&mut Renderer) -> Result<(), RenderError>,
    {
        let mut renderer = self
            .renderer
            .try_borrow_mut()
            .map_err(|_| to_js(RenderError::Busy))?;
        change(&mut renderer).map_err(to_js)
    }
}

// =============================================================================
// Event wiring
// =============================================================================

/// Feed one channel event to the transport, dropping it if the transport is
/// already in use further up the stack.
fn deliver(transport: &Rc<RefCell<WebTransport>>, event: ChannelEvent) {
    match transport.try_borrow_mut() {
        Ok(mut t) => {
            if let Err(e) = t.handle_event(event) {
                tracing::warn!(error = %e, "Channel event not dispatched");
            }
        }
        Err(_) => tracing::warn!("Transport busy; channel event dropped"),
    }
}

fn install_socket_handlers(ws: &WebSocket, transport: &Rc<RefCell<WebTransport>>) {
    let t = Rc::clone(transport);
    let onopen = Closure::wrap(Box::new(move |_: JsValue| {
        deliver(&t, ChannelEvent::Opened);
    }) as Box<dyn FnMut(JsValue)>);
    ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
    onopen.forget();

    let t = Rc::clone(transport);
    let onmessage = Closure::wrap(Box::new(move |ev: MessageEvent| {
        match ev.data().as_string() {
            Some(text) => deliver(&t, ChannelEvent::Message(text)),
            None => tracing::warn!("Non-text channel message ignored"),
        }
    }) as Box<dyn FnMut(MessageEvent)>);
    ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    onmessage.forget();

    let t = Rc::clone(transport);
    let onerror = Closure::wrap(Box::new(move |_: JsValue| {
        deliver(&t, ChannelEvent::Failed("websocket error".to_string()));
    }) as Box<dyn FnMut(JsValue)>);
    ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onerror.forget();

    let t = Rc::clone(transport);
    let onclose = Closure::wrap(Box::new(move |ev: CloseEvent| {
        deliver(
            &t,
            ChannelEvent::Closed {
                code: ev.code(),
                reason: ev.reason(),
            },
        );
    }) as Box<dyn FnMut(CloseEvent)>);
    ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));
    onclose.forget();
}

fn install_error_listener(
    window: &web_sys::Window,
    transport: &Rc<RefCell<WebTransport>>,
) -> Result<(), JsValue> {
    let t = Rc::clone(transport);
    let onerror = Closure::wrap(Box::new(move |ev: ErrorEvent| {
        let message = match ev.message() {
            m if m.is_empty() => "Uncaught error".to_string(),
            m => m,
        };
        match t.try_borrow_mut() {
            Ok(mut t) => {
                if let Err(e) = t.report_error(&message) {
                    tracing::debug!(error = %e, "Runtime error reported locally only");
                }
            }
            Err(_) => web_sys::console::error_1(&JsValue::from_str(&message)),
        }
    }) as Box<dyn FnMut(ErrorEvent)>);
    window.add_event_listener_with_callback("error", onerror.as_ref().unchecked_ref())?;
    onerror.forget();
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

fn js_text(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn to_js(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn mount_error(surface: &DisplaySurface, e: &JsValue) -> RenderError {
    RenderError::Mount {
        surface: surface.name().to_string(),
        reason: js_text(e),
    }
}

/// Install a `tracing` subscriber writing to the page console, one console
/// method per event level. There is no clock or environment in the browser,
/// so timestamps and RUST_LOG are off.
fn init_logging(config_level: Option<&str>) {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time()
        .with_target(true)
        .with_writer(MakeWebConsoleWriter::new());
    let result = tracing_subscriber::registry()
        .with(logging::build_filter(false, false, config_level))
        .with(console_layer)
        .try_init();
    if result.is_err() {
        web_sys::console::debug_1(&JsValue::from_str("tracing subscriber already installed"));
    }
}
