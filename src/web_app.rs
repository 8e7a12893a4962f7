//! Browser entry point
//!
//! Mounts the stage on a canvas, drives it from winit's web event loop and exposes the host UI
//! hooks to JavaScript: the VR capability and request, the assistant toggle and user notices.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use wasm_bindgen::prelude::*;
use winit::{
    dpi::PhysicalSize,
    event::Event,
    event_loop::{ControlFlow, EventLoop},
    platform::web::EventLoopExtWebSys,
    window::WindowBuilder,
};

use crate::platform::WebXrPlatform;
use crate::session::RequestOutcome;
use crate::web::{console_error, get_window_size, now, setup_canvas, spawn_local};
use crate::window::{HostCommand, InputTranslator, Window};
use crate::{
    init_web_logging, Backend, Collaborators, EguiCompositor, FrameDriver, StageConfig,
};

thread_local! {
    static DRIVER: RefCell<Option<Rc<RefCell<FrameDriver>>>> = const { RefCell::new(None) };
}

fn with_driver<R>(f: impl FnOnce(&mut FrameDriver) -> R) -> Option<R> {
    DRIVER.with(|slot| {
        let driver = slot.borrow().clone()?;
        let mut driver = driver.try_borrow_mut().ok()?;
        Some(f(&mut driver))
    })
}

#[wasm_bindgen(start)]
pub fn main() {
    init_web_logging();
    spawn_local(async {
        if let Err(err) = mount("canvas-container").await {
            console_error(&format!("Failed to start the stage: {}", err));
        }
    });
}

/// `"unknown"`, `"supported"` or `"unsupported"`; offer "Enter VR" only while `"supported"`
#[wasm_bindgen]
pub fn immersive_capability() -> String {
    with_driver(|driver| driver.session().capability())
        .unwrap_or_default()
        .as_str()
        .to_string()
}

/// Ask for an immersive session (the "Enter VR" button); returns whether a request went out
#[wasm_bindgen]
pub fn enter_vr() -> bool {
    with_driver(|driver| {
        driver.session().capability().offers_immersive()
            && driver.request_immersive() == RequestOutcome::Requested
    })
    .unwrap_or(false)
}

/// Messages for the user since the last call, oldest first
#[wasm_bindgen]
pub fn take_notices() -> js_sys::Array {
    with_driver(|driver| driver.take_notices())
        .unwrap_or_default()
        .into_iter()
        .map(JsValue::from)
        .collect()
}

/// Open or close the voice assistant; returns whether it is now open
#[wasm_bindgen]
pub fn toggle_assistant() -> bool {
    with_driver(|driver| driver.toggle_assistant()).unwrap_or(false)
}

/// Stop rendering and release everything; safe to call repeatedly
#[wasm_bindgen]
pub fn unmount() {
    with_driver(|driver| driver.teardown());
    DRIVER.with(|slot| slot.borrow_mut().take());
}

async fn mount(container_id: &str) -> Result<(), String> {
    let config = StageConfig::default();
    let event_loop = EventLoop::new().map_err(|e| e.to_string())?;
    let (width, height) = get_window_size();
    let winit_window = Arc::new(
        WindowBuilder::new()
            .with_title(&config.window.title)
            .with_inner_size(PhysicalSize::new(width, height))
            .build(&event_loop)
            .map_err(|e| e.to_string())?,
    );
    let canvas = setup_canvas(&winit_window, container_id)?;

    let mut engine_config = config.engine_config();
    engine_config.width = canvas.width();
    engine_config.height = canvas.height();
    let backend = Backend::new_async(Arc::clone(&winit_window), &engine_config)
        .await
        .map_err(|e| e.to_string())?;

    let driver = FrameDriver::mount(
        &config,
        backend,
        Box::new(EguiCompositor::new()),
        Box::new(WebXrPlatform::new()),
        Collaborators::from_config(&config),
    )
    .map_err(|e| e.to_string())?;
    let mut input = InputTranslator::new(driver.queue());
    let driver = Rc::new(RefCell::new(driver));
    DRIVER.with(|slot| *slot.borrow_mut() = Some(driver.clone()));

    let mut window = Window::from_winit(winit_window);
    event_loop.spawn(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);
        let Ok(mut driver) = driver.try_borrow_mut() else {
            return;
        };
        match event {
            Event::WindowEvent { event, .. } => match input.handle(&mut window, &event) {
                Some(HostCommand::Exit) => {
                    driver.teardown();
                    elwt.exit();
                }
                Some(HostCommand::RequestImmersive) => {
                    driver.request_immersive();
                }
                Some(HostCommand::ToggleAssistant) => {
                    driver.toggle_assistant();
                }
                None => {}
            },
            Event::AboutToWait => {
                if !driver.is_scheduled() {
                    elwt.exit();
                    return;
                }
                if let Err(err) = driver.tick(now(), input.camera_input()) {
                    log::error!("Frame failed: {}", err);
                }
                input.end_frame();
                window.request_redraw();
            }
            _ => {}
        }
    });
    Ok(())
}
