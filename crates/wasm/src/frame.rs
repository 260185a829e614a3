//! `requestAnimationFrame` wiring shared by the stage and the hotspot layer.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use scrolly_core::Revertible;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{AddEventListenerOptions, EventTarget};

use crate::dom;

/// Schedules at most one pending animation frame at a time.
pub struct FrameLoop {
    callback: Closure<dyn FnMut(f64)>,
    handle: Rc<Cell<Option<i32>>>,
}

impl FrameLoop {
    pub fn new(mut on_frame: impl FnMut(f64) + 'static) -> Self {
        let handle = Rc::new(Cell::new(None));
        let fired = Rc::clone(&handle);
        let callback = Closure::<dyn FnMut(f64)>::new(move |timestamp: f64| {
            fired.set(None);
            on_frame(timestamp);
        });
        Self { callback, handle }
    }

    /// Ask for a frame unless one is already pending.
    pub fn request(&self) -> Result<(), JsValue> {
        if self.handle.get().is_none() {
            let id = dom::window()?.request_animation_frame(self.callback.as_ref().unchecked_ref())?;
            self.handle.set(Some(id));
        }
        Ok(())
    }

    pub fn cancel(&self) {
        if let Some(id) = self.handle.take()
            && let Ok(window) = dom::window()
            && let Err(err) = window.cancel_animation_frame(id)
        {
            tracing::warn!(?err, "cancelAnimationFrame failed");
        }
    }
}

/// A frame loop stored behind a shared slot so its callback can be built
/// after the state it reaches back into.
pub type FrameSlot = Rc<RefCell<Option<FrameLoop>>>;

pub fn request(slot: &FrameSlot) {
    if let Ok(slot) = slot.try_borrow()
        && let Some(frames) = slot.as_ref()
        && let Err(err) = frames.request()
    {
        tracing::warn!(?err, "requestAnimationFrame failed");
    }
}

pub fn cancel(slot: &FrameSlot) {
    if let Ok(slot) = slot.try_borrow()
        && let Some(frames) = slot.as_ref()
    {
        frames.cancel();
    }
}

/// A passive DOM listener, removed again on revert.
pub struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut()>,
    attached: bool,
}

impl Listener {
    pub fn passive(
        target: EventTarget,
        event: &'static str,
        handler: impl FnMut() + 'static,
    ) -> Result<Self, JsValue> {
        let callback = Closure::<dyn FnMut()>::new(handler);
        let options = AddEventListenerOptions::new();
        options.set_passive(true);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            event,
            callback.as_ref().unchecked_ref(),
            &options,
        )?;
        tracing::debug!(event, "listener attached");
        Ok(Self {
            target,
            event,
            callback,
            attached: true,
        })
    }
}

impl Revertible for Listener {
    fn revert(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        if let Err(err) = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref())
        {
            tracing::warn!(event = self.event, ?err, "listener removal failed");
        }
    }
}
