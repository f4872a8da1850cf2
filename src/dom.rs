use crate::constants::{
    AMBIENT_BACKGROUND, AMBIENT_ID, AMBIENT_Z_INDEX, CANDIDATE_SELECTOR, LAYER_STYLE, OVERLAY_ID,
    OVERLAY_TRANSITION, OVERLAY_Z_INDEX, STYLE_ID,
};
use flicker_core::{Rect, Surface, Tag, Viewport};
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

#[inline]
pub fn window_document() -> Option<(web::Window, web::Document)> {
    let window = web::window()?;
    let document = window.document()?;
    Some((window, document))
}

/// The live page as a render surface.
pub struct DomSurface {
    window: web::Window,
    document: web::Document,
    overlay: Option<web::HtmlElement>,
    ambient: Option<web::HtmlElement>,
    style: Option<web::Element>,
}

impl DomSurface {
    pub fn new(window: web::Window, document: web::Document) -> Self {
        Self {
            window,
            document,
            overlay: None,
            ambient: None,
            style: None,
        }
    }

    fn create_layer(
        &self,
        id: &str,
        extra: &[(&'static str, &'static str)],
    ) -> Result<web::HtmlElement, JsValue> {
        let el: web::HtmlElement = self.document.create_element("div")?.dyn_into()?;
        el.set_id(id);
        let style = el.style();
        for (name, value) in LAYER_STYLE.iter().chain(extra) {
            style.set_property(name, value)?;
        }
        Ok(el)
    }

    fn try_mount(&mut self) -> Result<(), JsValue> {
        let root = self
            .document
            .document_element()
            .ok_or_else(|| JsValue::from_str("no root element"))?;

        if self.overlay.is_none() {
            let overlay = self.create_layer(
                OVERLAY_ID,
                &[("z-index", OVERLAY_Z_INDEX), ("transition", OVERLAY_TRANSITION)],
            )?;
            root.append_child(&overlay)?;
            self.overlay = Some(overlay);
        }
        if self.ambient.is_none() {
            let ambient = self.create_layer(
                AMBIENT_ID,
                &[("z-index", AMBIENT_Z_INDEX), ("background", AMBIENT_BACKGROUND)],
            )?;
            root.append_child(&ambient)?;
            self.ambient = Some(ambient);
        }
        if self.style.is_none() {
            let style = self.document.create_element("style")?;
            style.set_id(STYLE_ID);
            match self.document.head() {
                Some(head) => head.append_child(&style)?,
                None => root.append_child(&style)?,
            };
            self.style = Some(style);
        }
        Ok(())
    }
}

fn set_style(el: Option<&web::HtmlElement>, property: &str, value: &str) {
    if let Some(el) = el {
        _ = el.style().set_property(property, value);
    }
}

impl Surface for DomSurface {
    type Element = web::Element;

    fn mount(&mut self) {
        if let Err(e) = self.try_mount() {
            log::warn!("[dom] mount failed: {:?}", e);
        }
    }

    fn unmount(&mut self) {
        if let Some(el) = self.overlay.take() {
            el.remove();
        }
        if let Some(el) = self.ambient.take() {
            el.remove();
        }
        if let Some(el) = self.style.take() {
            el.remove();
        }
    }

    fn measure_viewport(&self) -> Viewport {
        let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Viewport::new(dim(self.window.inner_width()), dim(self.window.inner_height()))
    }

    fn query_candidate_elements(&self) -> Vec<web::Element> {
        let Ok(list) = self.document.query_selector_all(CANDIDATE_SELECTOR) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<web::Element>().ok())
            .collect()
    }

    fn element_rect(&self, element: &web::Element) -> Rect {
        let r = element.get_bounding_client_rect();
        Rect {
            top: r.top(),
            left: r.left(),
            bottom: r.bottom(),
            right: r.right(),
        }
    }

    fn element_color(&self, element: &web::Element) -> Option<String> {
        let style = self.window.get_computed_style(element).ok().flatten()?;
        style.get_property_value("color").ok()
    }

    fn element_tag(&self, element: &web::Element, tag: Tag) -> Option<String> {
        element.get_attribute(tag.attribute())
    }

    fn tag_element(&mut self, element: &web::Element, tag: Tag, value: &str) {
        _ = element.set_attribute(tag.attribute(), value);
    }

    fn untag_element(&mut self, element: &web::Element, tag: Tag) {
        _ = element.remove_attribute(tag.attribute());
    }

    fn set_overlay_background(&mut self, css: &str) {
        set_style(self.overlay.as_ref(), "background", css);
    }

    fn set_overlay_opacity(&mut self, opacity: &str) {
        set_style(self.overlay.as_ref(), "opacity", opacity);
    }

    fn set_ambient_opacity(&mut self, opacity: &str) {
        set_style(self.ambient.as_ref(), "opacity", opacity);
    }

    fn set_stylesheet_text(&mut self, css: &str) {
        if let Some(style) = &self.style {
            style.set_text_content(Some(css));
        }
    }
}
