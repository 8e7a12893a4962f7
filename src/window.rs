//! Window management and host input using winit

use std::sync::Arc;

use glam::Vec2;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
    window::Window as WinitWindow,
};

use crate::platform::{post, EventQueue, PlatformEvent};
use crate::scene::CameraInput;

/// Cursor travel (pixels) beyond which a press is a drag rather than a click
const CLICK_SLOP: f32 = 4.0;

/// Wrapper around a winit window with resize tracking
pub struct Window {
    window: Arc<WinitWindow>,
    width: u32,
    height: u32,
}

impl Window {
    pub fn from_winit(window: Arc<WinitWindow>) -> Self {
        let PhysicalSize { width, height } = window.inner_size();
        Self {
            window,
            width,
            height,
        }
    }

    /// Get the raw window for backend initialization
    pub fn window(&self) -> &WinitWindow {
        &self.window
    }

    /// Get arc reference to window
    pub fn window_arc(&self) -> Arc<WinitWindow> {
        Arc::clone(&self.window)
    }

    /// Get current window dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Request a redraw
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

/// Actions the host UI triggers directly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    RequestImmersive,
    ToggleAssistant,
    Exit,
}

/// Turns winit window events into camera input, queued platform events and host commands
///
/// Left drag orbits the camera; a left click without drag is a pointer click on the stage.
pub struct InputTranslator {
    queue: EventQueue,
    camera_input: CameraInput,
    cursor: Option<Vec2>,
    press: Option<Vec2>,
}

impl InputTranslator {
    pub fn new(queue: EventQueue) -> Self {
        Self {
            queue,
            camera_input: CameraInput::new(),
            cursor: None,
            press: None,
        }
    }

    /// Camera input gathered since the last call to [`InputTranslator::end_frame`]
    pub fn camera_input(&self) -> &CameraInput {
        &self.camera_input
    }

    pub fn end_frame(&mut self) {
        self.camera_input.reset_deltas();
    }

    pub fn handle(&mut self, window: &mut Window, event: &WindowEvent) -> Option<HostCommand> {
        match event {
            WindowEvent::CloseRequested => return Some(HostCommand::Exit),
            WindowEvent::Resized(size) => {
                window.width = size.width;
                window.height = size.height;
                post(
                    &self.queue,
                    PlatformEvent::Resize {
                        width: size.width,
                        height: size.height,
                    },
                );
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                if let (Some(last), true) = (self.cursor, self.camera_input.mouse_look_active) {
                    self.camera_input.mouse_delta += position - last;
                }
                self.cursor = Some(position);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    self.camera_input.mouse_look_active = true;
                    self.press = self.cursor;
                }
                ElementState::Released => {
                    self.camera_input.mouse_look_active = false;
                    if let (Some(press), Some(cursor)) = (self.press.take(), self.cursor) {
                        if press.distance(cursor) <= CLICK_SLOP {
                            post(
                                &self.queue,
                                PlatformEvent::PointerClick {
                                    x: cursor.x,
                                    y: cursor.y,
                                },
                            );
                        }
                    }
                }
            },
            WindowEvent::MouseWheel { delta, .. } => {
                self.camera_input.scroll_delta += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let pressed = event.state == ElementState::Pressed;
                if let PhysicalKey::Code(key) = event.physical_key {
                    match key {
                        KeyCode::KeyV if pressed && !event.repeat => {
                            return Some(HostCommand::RequestImmersive)
                        }
                        KeyCode::KeyM if pressed && !event.repeat => {
                            return Some(HostCommand::ToggleAssistant)
                        }
                        KeyCode::Escape if pressed => return Some(HostCommand::Exit),
                        KeyCode::KeyW => self.camera_input.forward = pressed,
                        KeyCode::KeyS => self.camera_input.backward = pressed,
                        KeyCode::KeyA => self.camera_input.left = pressed,
                        KeyCode::KeyD => self.camera_input.right = pressed,
                        KeyCode::KeyE => self.camera_input.up = pressed,
                        KeyCode::KeyQ => self.camera_input.down = pressed,
                        KeyCode::ShiftLeft | KeyCode::ShiftRight => {
                            self.camera_input.sprint = pressed
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
        None
    }
}

/// Open a window and run the stage until it is closed
#[cfg(not(target_arch = "wasm32"))]
pub fn run(config: crate::StageConfig) -> crate::EngineResult<()> {
    use std::time::Instant;

    use winit::event::Event;
    use winit::event_loop::{ControlFlow, EventLoop};
    use winit::window::WindowBuilder;

    use crate::platform::DesktopPlatform;
    use crate::{Backend, Collaborators, EguiCompositor, EngineError, FrameDriver};

    let engine_config = config.engine_config();
    let event_loop = EventLoop::new().map_err(|e| EngineError::Initialization(e.to_string()))?;
    let winit_window = WindowBuilder::new()
        .with_title(&engine_config.title)
        .with_inner_size(PhysicalSize::new(engine_config.width, engine_config.height))
        .build(&event_loop)
        .map_err(|e| EngineError::Initialization(e.to_string()))?;
    let mut window = Window::from_winit(Arc::new(winit_window));

    let backend = Backend::new(window.window_arc(), &engine_config)
        .map_err(|e| EngineError::Initialization(e.to_string()))?;
    let mut driver = FrameDriver::mount(
        &config,
        backend,
        Box::new(EguiCompositor::new()),
        Box::new(DesktopPlatform::new()),
        Collaborators::from_config(&config),
    )?;
    let mut input = InputTranslator::new(driver.queue());
    let started = Instant::now();

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Poll);
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
                        return;
                    }
                    let now = started.elapsed();
                    if let Err(err) = driver.tick(now, input.camera_input()) {
                        log::error!("Frame failed: {}", err);
                    }
                    for notice in driver.take_notices() {
                        log::info!("Notice: {}", notice);
                    }
                    input.end_frame();
                    window.request_redraw();
                }
                _ => {}
            }
        })
        .map_err(|e| EngineError::Initialization(e.to_string()))
}
