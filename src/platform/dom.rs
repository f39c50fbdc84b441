//! DOM overlays
//!
//! Each balloon gets an absolutely positioned, round `div` appended to the
//! document body. After every step the element is moved onto its body.

use anyhow::{Context, Result};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, MouseEvent};

use super::js_err;
use crate::sim::{BodyPose, Overlay, PageOffset, Placement};

pub fn document() -> Result<Document> {
    web_sys::window()
        .context("no window")?
        .document()
        .context("no document")
}

/// Look up an element by CSS selector, failing with the selector in the error
pub fn require(document: &Document, selector: &str) -> Result<Element> {
    document
        .query_selector(selector)
        .map_err(js_err)?
        .with_context(|| format!("element {selector:?} not found"))
}

/// Page offset of `container`, including the window scroll
pub fn page_offset(container: &Element) -> PageOffset {
    let rect = container.get_bounding_client_rect();
    let (scroll_x, scroll_y) = web_sys::window()
        .map(|w| {
            (
                w.scroll_x().unwrap_or_default(),
                w.scroll_y().unwrap_or_default(),
            )
        })
        .unwrap_or_default();
    PageOffset {
        left: rect.left() as f32,
        top: rect.top() as f32,
        scroll_x: scroll_x as f32,
        scroll_y: scroll_y as f32,
    }
}

/// Call `handler` on every click of `target`
pub fn on_click(target: &Element, handler: impl FnMut(MouseEvent) + 'static) -> Result<()> {
    let closure = Closure::<dyn FnMut(_)>::new(handler);
    target
        .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
        .map_err(js_err)?;
    closure.forget();
    Ok(())
}

/// A balloon's page element
pub struct DomOverlay {
    element: HtmlElement,
    container: Element,
}

impl DomOverlay {
    /// Create the element and append it to the document body
    pub fn create(document: &Document, container: &Element, color: &str) -> Result<Self> {
        let element: HtmlElement = document
            .create_element("div")
            .map_err(js_err)?
            .dyn_into()
            .map_err(|_| anyhow::anyhow!("div is not an HtmlElement"))?;
        element.set_class_name("balloon");

        let style = element.style();
        style.set_property("position", "absolute").map_err(js_err)?;
        style.set_property("border-radius", "50%").map_err(js_err)?;
        style.set_property("background-color", color).map_err(js_err)?;
        style.set_property("cursor", "pointer").map_err(js_err)?;

        document
            .body()
            .context("document has no body")?
            .append_child(&element)
            .map_err(js_err)?;

        Ok(Self {
            element,
            container: container.clone(),
        })
    }

    pub fn element(&self) -> &HtmlElement {
        &self.element
    }
}

impl Overlay for DomOverlay {
    fn place(&mut self, pose: &BodyPose) {
        let p = Placement::from_pose(pose, &page_offset(&self.container));
        let style = self.element.style();
        let _ = style.set_property("left", &format!("{}px", p.left));
        let _ = style.set_property("top", &format!("{}px", p.top));
        let _ = style.set_property("width", &format!("{}px", p.size));
        let _ = style.set_property("height", &format!("{}px", p.size));
        let _ = style.set_property("transform", &format!("rotate({}rad)", p.rotation));
    }

    fn remove(&mut self) {
        self.element.remove();
    }
}
