use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

/// Drives eased view transitions via `requestAnimationFrame`.
///
/// `start()` requests a frame; the step function receives the rAF timestamp
/// (same clock as `performance.now()`) and returns `true` while it needs
/// another one. Repeated `start()` calls within a frame coalesce.
pub struct FrameLoop {
    inner: Rc<Inner>,
}

struct Inner {
    window: Option<web_sys::Window>,
    scheduled: Cell<bool>,
    raf_id: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl Inner {
    fn request(&self) {
        if self.scheduled.get() {
            return;
        }
        let cb_ref = self.callback.borrow();
        let (Some(cb), Some(window)) = (cb_ref.as_ref(), self.window.as_ref()) else {
            return;
        };
        self.scheduled.set(true);
        match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            Ok(id) => self.raf_id.set(Some(id)),
            Err(_) => self.scheduled.set(false),
        }
    }
}

impl FrameLoop {
    pub fn new(step: impl Fn(f64) -> bool + 'static) -> Self {
        let inner = Rc::new(Inner {
            window: web_sys::window(),
            scheduled: Cell::new(false),
            raf_id: Cell::new(None),
            callback: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let cb = Closure::<dyn FnMut(f64)>::new(move |now: f64| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.scheduled.set(false);
            inner.raf_id.set(None);
            if step(now) {
                inner.request();
            }
        });
        *inner.callback.borrow_mut() = Some(cb);

        Self { inner }
    }

    pub fn start(&self) {
        self.inner.request();
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        if let Some(raf_id) = self.inner.raf_id.replace(None)
            && let Some(window) = self.inner.window.as_ref()
        {
            let _ = window.cancel_animation_frame(raf_id);
        }
        self.inner.scheduled.set(false);
        self.inner.callback.borrow_mut().take();
    }
}

/// Milliseconds on the `requestAnimationFrame` clock.
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}
