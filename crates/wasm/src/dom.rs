//! The DOM side of a mounted section: measuring boxes and applying the
//! commands the stage emits.

use scrolly_core::SectionLayout;
use scrolly_protocol::{Rect, SectionCommand};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, Window};

use crate::style;

const SPACER_CLASS: &str = "scrolly-pin-spacer";
const ACTIVE_ATTR: &str = "data-scrolly-active";

pub fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))
}

pub fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("window has no document"))
}

pub fn scroll_offset(window: &Window) -> f64 {
    window.scroll_y().unwrap_or(0.0)
}

pub fn viewport(window: &Window) -> Result<scrolly_protocol::ViewportSize, JsValue> {
    let width = window.inner_width()?.as_f64().unwrap_or(0.0);
    let height = window.inner_height()?.as_f64().unwrap_or(0.0);
    Ok(scrolly_protocol::ViewportSize::new(width, height))
}

/// Document-space box of `element`.
fn measure(element: &Element, scroll_y: f64) -> Rect {
    let r = element.get_bounding_client_rect();
    Rect::new(r.left(), r.top() + scroll_y, r.width(), r.height())
}

pub struct DomSection {
    root: HtmlElement,
    items: Vec<Option<HtmlElement>>,
    spacer: Option<HtmlElement>,
}

impl DomSection {
    /// Resolve `item_selector` inside `root`. Matches that are not
    /// `HtmlElement`s count as missing.
    pub fn query(root: HtmlElement, item_selector: &str) -> Result<Self, JsValue> {
        let nodes = root.query_selector_all(item_selector)?;
        let items = (0..nodes.length())
            .map(|i| nodes.item(i).and_then(|n| n.dyn_into::<HtmlElement>().ok()))
            .collect();
        Ok(Self {
            root,
            items,
            spacer: None,
        })
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Natural layout. Call only while the section is released.
    pub fn layout(&self, scroll_y: f64) -> SectionLayout {
        SectionLayout {
            section: measure(&self.root, scroll_y),
            items: self
                .items
                .iter()
                .map(|item| {
                    item.as_ref()
                        .filter(|el| el.is_connected())
                        .map(|el| measure(el, scroll_y))
                })
                .collect(),
        }
    }

    pub fn apply(&mut self, command: &SectionCommand) -> Result<(), JsValue> {
        match command {
            SectionCommand::Style { index, state } => {
                if let Some(Some(item)) = self.items.get(*index) {
                    let css = item.style();
                    css.set_property("opacity", &style::opacity(state))?;
                    css.set_property("transform", &style::transform(state))?;
                    css.set_property("will-change", "opacity, transform")?;
                }
            }
            SectionCommand::ClearStyle { index } => {
                if let Some(Some(item)) = self.items.get(*index) {
                    let css = item.style();
                    for property in ["opacity", "transform", "will-change"] {
                        css.remove_property(property)?;
                    }
                }
            }
            SectionCommand::ReserveSpace { height } => {
                let spacer = self.spacer()?;
                spacer
                    .style()
                    .set_property("height", &format!("{height}px"))?;
            }
            SectionCommand::RestoreSpace => self.remove_spacer()?,
            SectionCommand::Fix { rect } => {
                let css = self.root.style();
                for (property, value) in style::fixed(rect) {
                    css.set_property(property, &value)?;
                }
                css.remove_property("transform")?;
            }
            SectionCommand::Release { offset } => {
                let css = self.root.style();
                for property in style::FIXED_PROPERTIES {
                    css.remove_property(property)?;
                }
                if *offset > 0.0 {
                    css.set_property("transform", &format!("translate3d(0, {offset}px, 0)"))?;
                } else {
                    css.remove_property("transform")?;
                }
            }
            SectionCommand::SetActive { index } => match index {
                Some(index) => self.root.set_attribute(ACTIVE_ATTR, &index.to_string())?,
                None => self.root.remove_attribute(ACTIVE_ATTR)?,
            },
        }
        Ok(())
    }

    /// Wrap the root in a spacer that keeps its place in flow while pinned.
    fn spacer(&mut self) -> Result<&HtmlElement, JsValue> {
        if self.spacer.is_none() {
            let spacer: HtmlElement = document()?.create_element("div")?.dyn_into()?;
            spacer.set_class_name(SPACER_CLASS);
            if let Some(parent) = self.root.parent_node() {
                parent.insert_before(&spacer, Some(&self.root))?;
            }
            spacer.append_child(&self.root)?;
            self.spacer = Some(spacer);
        }
        self.spacer
            .as_ref()
            .ok_or_else(|| JsValue::from_str("pin spacer missing"))
    }

    fn remove_spacer(&mut self) -> Result<(), JsValue> {
        if let Some(spacer) = self.spacer.take() {
            if let Some(parent) = spacer.parent_node() {
                parent.insert_before(&self.root, Some(&spacer))?;
            }
            spacer.remove();
        }
        Ok(())
    }
}
