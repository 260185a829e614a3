use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use scrolly_core::projection::HotspotDriver;
use scrolly_core::{ModelBounds, SiteContent};
use scrolly_protocol::{ScreenMarker, ViewportSize};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use crate::dom;
use crate::frame::{self, FrameLoop, FrameSlot};
use crate::style;

const MARKER_CLASS: &str = "scrolly-hotspot";

struct Layer {
    driver: HotspotDriver,
    overlay: HtmlElement,
    /// Marker elements by hotspot id; attached only while visible.
    markers: BTreeMap<u32, HtmlElement>,
}

impl Layer {
    fn on_frame(&mut self, timestamp_ms: f64) -> bool {
        let canvas = ViewportSize::new(
            f64::from(self.overlay.client_width()),
            f64::from(self.overlay.client_height()),
        );
        let Some(visible) = self.driver.tick(timestamp_ms, canvas) else {
            return false;
        };
        if let Err(err) = self.render(&visible) {
            tracing::warn!(?err, "hotspot render failed");
        }
        true
    }

    /// Show exactly the visible markers; hidden ones leave the DOM.
    fn render(&mut self, visible: &[ScreenMarker]) -> Result<(), JsValue> {
        for (id, element) in &self.markers {
            if element.is_connected() && !visible.iter().any(|m| m.id == *id) {
                element.remove();
            }
        }
        for marker in visible {
            let element = match self.markers.get(&marker.id) {
                Some(element) => element.clone(),
                None => {
                    let element = create_marker(marker)?;
                    self.markers.insert(marker.id, element.clone());
                    element
                }
            };
            element.style().set_property(
                "transform",
                &style::marker_position(marker.position.x, marker.position.y),
            )?;
            if !element.is_connected() {
                self.overlay.append_child(&element)?;
            }
        }
        Ok(())
    }

    fn clear(&mut self) {
        for element in self.markers.values() {
            element.remove();
        }
        self.markers.clear();
    }
}

fn create_marker(marker: &ScreenMarker) -> Result<HtmlElement, JsValue> {
    let element: HtmlElement = dom::document()?.create_element("div")?.dyn_into()?;
    element.set_class_name(MARKER_CLASS);
    element.set_attribute("data-hotspot", &marker.id.to_string())?;
    element.set_text_content(Some(marker.label.as_str()));
    Ok(element)
}

/// Flat labels pinned to anchors of a rotating model.
#[wasm_bindgen]
pub struct HotspotLayer {
    layer: Rc<RefCell<Layer>>,
    frames: FrameSlot,
}

#[wasm_bindgen]
impl HotspotLayer {
    /// `content` lists the hotspots (see `SiteContent`); `config` is the
    /// optional stage config whose `projection` block is used.
    #[wasm_bindgen(constructor)]
    pub fn new(
        overlay: HtmlElement,
        content: &str,
        config: Option<String>,
    ) -> Result<HotspotLayer, JsValue> {
        let content = SiteContent::from_json(content).map_err(crate::js_error)?;
        let config = crate::load_config(config.as_deref()).map_err(crate::js_error)?;
        let driver = HotspotDriver::new(&config.projection, content.anchors());

        let layer = Rc::new(RefCell::new(Layer {
            driver,
            overlay,
            markers: BTreeMap::new(),
        }));
        let frames: FrameSlot = Rc::new(RefCell::new(None));

        let weak_layer = Rc::downgrade(&layer);
        let weak_frames = Rc::downgrade(&frames);
        *frames.borrow_mut() = Some(FrameLoop::new(move |timestamp| {
            let Some(layer) = weak_layer.upgrade() else { return };
            let running = layer
                .try_borrow_mut()
                .is_ok_and(|mut layer| layer.on_frame(timestamp));
            if running && let Some(frames) = weak_frames.upgrade() {
                frame::request(&frames);
            }
        }));
        Ok(HotspotLayer { layer, frames })
    }

    /// The model finished loading; `size` is its edge length in scene units.
    #[wasm_bindgen(js_name = modelReady)]
    pub fn model_ready(&self, size: f32) -> Result<(), JsValue> {
        let mut layer = self.layer.try_borrow_mut().map_err(crate::js_error)?;
        layer.driver.model_ready(ModelBounds::cube(size));
        Ok(())
    }

    pub fn start(&self) -> Result<(), JsValue> {
        {
            let mut layer = self.layer.try_borrow_mut().map_err(crate::js_error)?;
            // The token is observed through `HotspotDriver::tick`.
            let _token = layer.driver.start();
        }
        frame::request(&self.frames);
        Ok(())
    }

    pub fn stop(&self) {
        frame::cancel(&self.frames);
        if let Ok(mut layer) = self.layer.try_borrow_mut() {
            layer.driver.stop();
        }
    }

    /// Stop and remove every marker element.
    pub fn destroy(&self) {
        self.stop();
        if let Ok(mut layer) = self.layer.try_borrow_mut() {
            layer.clear();
        }
    }
}

impl Drop for HotspotLayer {
    fn drop(&mut self) {
        frame::cancel(&self.frames);
    }
}
