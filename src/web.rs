//! Web-specific functionality for running the stage in a browser.
//!
//! Canvas placement, browser sizing and console helpers used by the wasm entry point.

use wasm_bindgen::prelude::*;
use winit::platform::web::WindowExtWebSys;

/// Browser window dimensions in CSS pixels, never below 100x100
pub fn get_window_size() -> (u32, u32) {
    let size = web_sys::window().and_then(|window| {
        let width = window.inner_width().ok()?.as_f64()?;
        let height = window.inner_height().ok()?.as_f64()?;
        Some((width as u32, height as u32))
    });
    let (width, height) = size.unwrap_or((1280, 720));
    (width.max(100), height.max(100))
}

/// Attach the window's canvas to `container_id` (or the body) and size it for the device
pub fn setup_canvas(
    window: &winit::window::Window,
    container_id: &str,
) -> Result<web_sys::HtmlCanvasElement, String> {
    let canvas = window.canvas().ok_or("window has no canvas")?;
    let web_window = web_sys::window().ok_or("no global window exists")?;
    let document = web_window.document().ok_or("no document exists")?;

    let container: web_sys::Element = match document.get_element_by_id(container_id) {
        Some(container) => container,
        None => document.body().ok_or("document has no body")?.into(),
    };
    container
        .append_child(&canvas)
        .map_err(|e| format!("couldn't append canvas: {:?}", e))?;

    let dpr = web_window.device_pixel_ratio();
    let (css_width, css_height) = get_window_size();
    canvas.set_width((css_width as f64 * dpr) as u32);
    canvas.set_height((css_height as f64 * dpr) as u32);

    let style = canvas.style();
    for (property, value) in [
        ("width", format!("{}px", css_width)),
        ("height", format!("{}px", css_height)),
        ("display", "block".to_string()),
    ] {
        style
            .set_property(property, &value)
            .map_err(|e| format!("couldn't style canvas: {:?}", e))?;
    }

    log::info!(
        "Canvas setup: {}x{} (CSS: {}x{}, DPR: {})",
        canvas.width(),
        canvas.height(),
        css_width,
        css_height,
        dpr
    );
    Ok(canvas)
}

/// Seconds since page load, from the Performance API
pub fn now() -> std::time::Duration {
    let millis = web_sys::window()
        .and_then(|w| w.performance())
        .map_or(0.0, |p| p.now());
    std::time::Duration::from_secs_f64(millis.max(0.0) / 1000.0)
}

/// Spawn a future on the browser's event loop
pub fn spawn_local<F>(future: F)
where
    F: std::future::Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

/// Log a message to the browser console
#[wasm_bindgen]
pub fn console_log(msg: &str) {
    web_sys::console::log_1(&msg.into());
}

/// Log an error to the browser console
#[wasm_bindgen]
pub fn console_error(msg: &str) {
    web_sys::console::error_1(&msg.into());
}
