use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use scrolly_core::projection::FrameClock;
use scrolly_core::{
    RegistrationGroup, ScrollyConfig, SectionLayout, SectionSpec, Stage, TargetedCommand,
};
use scrolly_protocol::SectionId;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use crate::dom::{self, DomSection};
use crate::frame::{self, FrameLoop, FrameSlot, Listener};

/// A focus change waiting to be delivered to JS once the stage is no
/// longer borrowed.
struct Notice {
    callback: js_sys::Function,
    previous: Option<usize>,
    current: usize,
}

struct State {
    stage: Stage,
    sections: BTreeMap<SectionId, DomSection>,
    clock: FrameClock,
}

impl State {
    fn apply(&mut self, commands: Vec<TargetedCommand>) {
        for targeted in commands {
            let Some(section) = self.sections.get_mut(&targeted.section) else {
                continue;
            };
            if let Err(err) = section.apply(&targeted.command) {
                tracing::warn!(section = targeted.section.0, ?err, "command not applied");
            }
        }
    }

    fn layouts(&self, scroll_y: f64) -> Vec<(SectionId, SectionLayout)> {
        self.sections
            .iter()
            .map(|(id, section)| (*id, section.layout(scroll_y)))
            .collect()
    }
}

struct Runtime {
    state: RefCell<State>,
    notices: Rc<RefCell<Vec<Notice>>>,
    frames: FrameSlot,
    refresh_pending: Cell<bool>,
}

impl Runtime {
    fn on_scroll(&self) {
        let Ok(window) = dom::window() else { return };
        let offset = dom::scroll_offset(&window);
        let animating = {
            let Ok(mut state) = self.state.try_borrow_mut() else {
                return;
            };
            let commands = state.stage.on_scroll(offset);
            state.apply(commands);
            state.stage.needs_frame()
        };
        if animating {
            frame::request(&self.frames);
        }
        self.deliver();
    }

    fn on_resize(&self) {
        self.refresh_pending.set(true);
        frame::request(&self.frames);
    }

    fn on_frame(&self, timestamp_ms: f64) {
        if self.refresh_pending.replace(false) {
            self.refresh();
        }
        let animating = {
            let Ok(mut state) = self.state.try_borrow_mut() else {
                return;
            };
            let dt = state.clock.tick(timestamp_ms);
            let commands = state.stage.on_frame(dt);
            state.apply(commands);
            let animating = state.stage.needs_frame();
            if !animating {
                state.clock.reset();
            }
            animating
        };
        if animating {
            frame::request(&self.frames);
        }
    }

    /// Release pins, remeasure the natural layout, then let the stage
    /// reconcile against the new viewport.
    fn refresh(&self) {
        let Ok(window) = dom::window() else { return };
        let viewport = match dom::viewport(&window) {
            Ok(viewport) => viewport,
            Err(err) => {
                tracing::warn!(?err, "viewport size unavailable");
                return;
            }
        };
        let animating = {
            let Ok(mut state) = self.state.try_borrow_mut() else {
                return;
            };
            let released = state.stage.invalidate();
            state.apply(released);
            let layouts = state.layouts(dom::scroll_offset(&window));
            let commands = state.stage.refresh(viewport, &layouts);
            state.apply(commands);
            state.stage.needs_frame()
        };
        if animating {
            frame::request(&self.frames);
        }
        self.deliver();
    }

    fn deliver(&self) {
        let pending = match self.notices.try_borrow_mut() {
            Ok(mut notices) => std::mem::take(&mut *notices),
            Err(_) => return,
        };
        for notice in pending {
            let previous = notice
                .previous
                .map_or(JsValue::NULL, |p| JsValue::from_f64(p as f64));
            let current = JsValue::from_f64(notice.current as f64);
            if let Err(err) = notice.callback.call2(&JsValue::NULL, &current, &previous) {
                tracing::warn!(?err, "active-index callback threw");
            }
        }
    }
}

/// Scroll-synchronized sections on the current page.
#[wasm_bindgen]
pub struct ScrollStage {
    runtime: Rc<Runtime>,
    scope: RegistrationGroup,
}

#[wasm_bindgen]
impl ScrollStage {
    /// Create a stage. `config` is a JSON string; `{}` or nothing uses the
    /// defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> Result<ScrollStage, JsValue> {
        let config = crate::load_config(config.as_deref()).map_err(crate::js_error)?;
        let window = dom::window()?;
        let mut stage = Stage::new(config, dom::viewport(&window)?);
        stage.on_scroll(dom::scroll_offset(&window));

        let runtime = Rc::new(Runtime {
            state: RefCell::new(State {
                stage,
                sections: BTreeMap::new(),
                clock: FrameClock::default(),
            }),
            notices: Rc::new(RefCell::new(Vec::new())),
            frames: Rc::new(RefCell::new(None)),
            refresh_pending: Cell::new(false),
        });

        let weak = Rc::downgrade(&runtime);
        *runtime.frames.borrow_mut() = Some(FrameLoop::new(move |timestamp| {
            if let Some(runtime) = weak.upgrade() {
                runtime.on_frame(timestamp);
            }
        }));

        let mut scope = RegistrationGroup::new("scroll-stage");
        scope.add(Listener::passive(
            window.clone().into(),
            "scroll",
            on(&runtime, Runtime::on_scroll),
        )?);
        scope.add(Listener::passive(
            window.into(),
            "resize",
            on(&runtime, Runtime::on_resize),
        )?);
        let frames = Rc::clone(&runtime.frames);
        scope.on_revert(move || frame::cancel(&frames));

        Ok(ScrollStage { runtime, scope })
    }

    /// Take over `root` and the items matching `item_selector` inside it.
    /// Returns the section id used by the other methods.
    pub fn mount(
        &mut self,
        root: HtmlElement,
        item_selector: &str,
        pin: Option<bool>,
    ) -> Result<u32, JsValue> {
        let window = dom::window()?;
        let name = root.id();
        let section = DomSection::query(root, item_selector)?;
        if section.item_count() == 0 {
            tracing::warn!(section = %name, item_selector, "no items matched");
        }
        let layout = section.layout(dom::scroll_offset(&window));
        let spec = SectionSpec::new(name, layout).pinned(pin.unwrap_or(true));

        let (id, animating) = {
            let mut state = self
                .runtime
                .state
                .try_borrow_mut()
                .map_err(crate::js_error)?;
            let (id, commands) = state.stage.mount(spec);
            // Insert first so the install commands find their elements.
            state.sections.insert(id, section);
            state.apply(commands);
            (id, state.stage.needs_frame())
        };
        if animating {
            frame::request(&self.runtime.frames);
        }
        Ok(id.0)
    }

    /// Revert a section to its untouched markup.
    pub fn unmount(&mut self, id: u32) -> Result<(), JsValue> {
        let id = SectionId(id);
        let mut state = self
            .runtime
            .state
            .try_borrow_mut()
            .map_err(crate::js_error)?;
        let commands = state.stage.unmount(id);
        state.apply(commands);
        state.sections.remove(&id);
        Ok(())
    }

    /// Remeasure now instead of on the next resize.
    pub fn refresh(&self) {
        self.runtime.refresh();
    }

    /// Call `callback(current, previous)` whenever the section's focused
    /// item changes. The callback is dropped when the section unmounts.
    #[wasm_bindgen(js_name = onActiveChange)]
    pub fn on_active_change(&mut self, id: u32, callback: js_sys::Function) -> Result<(), JsValue> {
        let id = SectionId(id);
        let notices = Rc::clone(&self.runtime.notices);
        let mut state = self
            .runtime
            .state
            .try_borrow_mut()
            .map_err(crate::js_error)?;
        let subscription = state
            .stage
            .subscribe_active(id, move |change| {
                if let Ok(mut notices) = notices.try_borrow_mut() {
                    notices.push(Notice {
                        callback: callback.clone(),
                        previous: change.previous,
                        current: change.current,
                    });
                }
            })
            .ok_or_else(|| JsValue::from_str("unknown section"))?;
        if let Some(scope) = state.stage.scope(id) {
            scope.add(subscription);
        }
        Ok(())
    }

    #[wasm_bindgen(js_name = activeIndex)]
    pub fn active_index(&self, id: u32) -> Option<u32> {
        let state = self.runtime.state.try_borrow().ok()?;
        state
            .stage
            .active_index(SectionId(id))
            .and_then(|i| u32::try_from(i).ok())
    }

    /// Current presentation: `"pinned"` or `"stacked"`.
    pub fn mode(&self) -> Result<String, JsValue> {
        let state = self.runtime.state.try_borrow().map_err(crate::js_error)?;
        serde_json::to_value(state.stage.mode())
            .ok()
            .and_then(|v| v.as_str().map(str::to_owned))
            .ok_or_else(|| JsValue::from_str("mode not serializable"))
    }

    /// Unmount every section and detach all listeners.
    pub fn destroy(&mut self) -> Result<(), JsValue> {
        use scrolly_core::Revertible;

        {
            let mut state = self
                .runtime
                .state
                .try_borrow_mut()
                .map_err(crate::js_error)?;
            let commands = state.stage.revert_all();
            state.apply(commands);
            state.sections.clear();
        }
        self.scope.revert();
        Ok(())
    }
}

fn on(runtime: &Rc<Runtime>, handler: fn(&Runtime)) -> impl FnMut() + 'static {
    let weak: Weak<Runtime> = Rc::downgrade(runtime);
    move || {
        if let Some(runtime) = weak.upgrade() {
            handler(&runtime);
        }
    }
}
