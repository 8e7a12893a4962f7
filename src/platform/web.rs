//! WebXR through `navigator.xr`
//!
//! web-sys gates the WebXR bindings behind unstable APIs, so the runtime is reached by reflection.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use super::{
    post, EventQueue, ImmersivePlatform, ListenerHandle, PendingSession, PlatformError, PlatformEvent,
};
use crate::scene::Pose;
use crate::session::SessionEvent;

const SESSION_MODE: &str = "immersive-vr";

fn describe(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

/// `navigator.xr`, if the browser exposes it
fn xr_system() -> Option<JsValue> {
    let navigator = web_sys::window()?.navigator();
    let xr = Reflect::get(&navigator, &JsValue::from_str("xr")).ok()?;
    (!xr.is_undefined() && !xr.is_null()).then_some(xr)
}

/// Call `target[method](arg)` and expect a promise back
fn call_promise(target: &JsValue, method: &str, arg: &JsValue) -> Result<Promise, String> {
    let function: Function = Reflect::get(target, &JsValue::from_str(method))
        .map_err(|e| describe(&e))?
        .dyn_into()
        .map_err(|_| format!("{} is not a function", method))?;
    function
        .call1(target, arg)
        .map_err(|e| describe(&e))?
        .dyn_into()
        .map_err(|_| format!("{} did not return a promise", method))
}

/// Call `session.end()`, logging rather than failing
fn end_xr_session(session: &JsValue) {
    let end = Reflect::get(session, &JsValue::from_str("end"));
    if let Some(end) = end.ok().as_ref().and_then(|f| f.dyn_ref::<Function>()) {
        if let Err(err) = end.call0(session) {
            log::warn!("Failed to end the XR session: {}", describe(&err));
        }
    }
}

#[derive(Default)]
struct XrState {
    session: PendingSession<JsValue>,
    on_end: Option<Closure<dyn FnMut()>>,
}

/// The browser's WebXR runtime
///
/// Head poses are only available inside `XRSession.requestAnimationFrame` callbacks, which this
/// platform does not drive, so [`ImmersivePlatform::head_pose`] always answers `None` and the
/// immersive camera keeps its last desktop pose.
#[derive(Default)]
pub struct WebXrPlatform {
    state: Rc<RefCell<XrState>>,
    next_listener: u64,
}

impl WebXrPlatform {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImmersivePlatform for WebXrPlatform {
    fn query_capability(&mut self, queue: &EventQueue) {
        let queue = queue.clone();
        let answer = |result| PlatformEvent::Session(SessionEvent::CapabilityResolved(result));
        let Some(xr) = xr_system() else {
            post(&queue, answer(Ok(false)));
            return;
        };
        let promise = match call_promise(&xr, "isSessionSupported", &JsValue::from_str(SESSION_MODE)) {
            Ok(promise) => promise,
            Err(err) => {
                post(&queue, answer(Err(err)));
                return;
            }
        };
        wasm_bindgen_futures::spawn_local(async move {
            let result = JsFuture::from(promise)
                .await
                .map(|supported| supported.as_bool().unwrap_or(false))
                .map_err(|e| describe(&e));
            post(&queue, answer(result));
        });
    }

    fn request_session(&mut self, queue: &EventQueue) -> Result<(), PlatformError> {
        let xr = xr_system().ok_or(PlatformError::Unavailable)?;
        let promise = call_promise(&xr, "requestSession", &JsValue::from_str(SESSION_MODE))
            .map_err(PlatformError::Request)?;
        self.state.borrow_mut().session.begin();
        let queue = queue.clone();
        let state = self.state.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let session = match JsFuture::from(promise).await {
                Ok(session) => session,
                Err(err) => {
                    if state.borrow_mut().session.fail() {
                        post(&queue, PlatformEvent::Session(SessionEvent::SessionError(describe(&err))));
                    }
                    return;
                }
            };
            if let Err(session) = state.borrow_mut().session.resolve(session) {
                log::info!("XR session granted after the stage was unmounted, ending it");
                end_xr_session(&session);
                return;
            }

            let end_queue = queue.clone();
            let end_state = state.clone();
            let on_end = Closure::<dyn FnMut()>::new(move || {
                end_state.borrow_mut().session.ended();
                post(&end_queue, PlatformEvent::Session(SessionEvent::SessionEnded));
            });
            let mut xr_state = state.borrow_mut();
            if let Some(session) = xr_state.session.session() {
                let add = Reflect::get(session, &JsValue::from_str("addEventListener"));
                if let Some(add) = add.ok().as_ref().and_then(|f| f.dyn_ref::<Function>()) {
                    if let Err(err) = add.call2(session, &JsValue::from_str("end"), on_end.as_ref()) {
                        log::warn!("Could not listen for session end: {}", describe(&err));
                    }
                }
            }
            xr_state.on_end = Some(on_end);
            drop(xr_state);
            post(&queue, PlatformEvent::Session(SessionEvent::SessionStarted));
        });
        Ok(())
    }

    fn end_session(&mut self) {
        let session = self.state.borrow_mut().session.cancel();
        if let Some(session) = session {
            end_xr_session(&session);
        }
    }

    fn is_presenting(&self) -> bool {
        self.state.borrow().session.is_presenting()
    }

    fn head_pose(&self) -> Option<Pose> {
        None
    }

    fn attach(&mut self, _queue: &EventQueue) -> Vec<ListenerHandle> {
        self.next_listener += 1;
        vec![ListenerHandle {
            id: self.next_listener,
            name: "xr-session-end",
        }]
    }

    fn detach(&mut self, _handle: &ListenerHandle) {
        let mut state = self.state.borrow_mut();
        let Some(on_end) = state.on_end.take() else {
            return;
        };
        if let Some(session) = state.session.session() {
            let remove = Reflect::get(session, &JsValue::from_str("removeEventListener"));
            if let Some(remove) = remove.ok().as_ref().and_then(|f| f.dyn_ref::<Function>()) {
                if let Err(err) = remove.call2(session, &JsValue::from_str("end"), on_end.as_ref()) {
                    log::warn!("Could not detach the session listener: {}", describe(&err));
                }
            }
        }
    }
}
