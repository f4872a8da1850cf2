//! The rendering capability the engine drives.
//!
//! The engine never touches a document directly. A `Surface` owns the two
//! visual layers and the stylesheet, reads layout, and writes element tags.
//! `MemorySurface` is an in-memory implementation that records every call.

use std::cell::Cell;

/// Per-element classification attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    Band,
    Direction,
    LightText,
    Variation,
}

impl Tag {
    pub const ALL: [Tag; 4] = [Tag::Band, Tag::Direction, Tag::LightText, Tag::Variation];

    pub fn attribute(self) -> &'static str {
        match self {
            Tag::Band => "data-flk",
            Tag::Direction => "data-flk-d",
            Tag::LightText => "data-flk-l",
            Tag::Variation => "data-flk-v",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Viewport-relative bounding box in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            bottom: top + height,
            right: left + width,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

pub trait Surface {
    /// Handle to a host text element.
    type Element: Clone + PartialEq;

    /// Create the overlay layer, ambient layer and stylesheet, all blank.
    fn mount(&mut self);
    /// Remove everything `mount` created.
    fn unmount(&mut self);

    fn measure_viewport(&self) -> Viewport;
    /// Text-bearing elements in document order.
    fn query_candidate_elements(&self) -> Vec<Self::Element>;
    fn element_rect(&self, element: &Self::Element) -> Rect;
    /// Computed text color as the host reports it, if it can be read.
    fn element_color(&self, element: &Self::Element) -> Option<String>;

    fn element_tag(&self, element: &Self::Element, tag: Tag) -> Option<String>;
    fn tag_element(&mut self, element: &Self::Element, tag: Tag, value: &str);
    fn untag_element(&mut self, element: &Self::Element, tag: Tag);

    fn set_overlay_background(&mut self, css: &str);
    fn set_overlay_opacity(&mut self, opacity: &str);
    fn set_ambient_opacity(&mut self, opacity: &str);
    fn set_stylesheet_text(&mut self, css: &str);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

#[derive(Clone, Debug, Default)]
pub struct MemoryNode {
    pub rect: Rect,
    pub color: Option<String>,
    tags: [Option<String>; 4],
}

#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceCall {
    Mount,
    Unmount,
    OverlayBackground(String),
    OverlayOpacity(String),
    AmbientOpacity(String),
    Stylesheet(String),
    Tag(NodeId, Tag, String),
    Untag(NodeId, Tag),
}

/// Headless surface: a flat list of nodes plus a call log.
#[derive(Debug, Default)]
pub struct MemorySurface {
    pub viewport: Viewport,
    pub mounted: bool,
    pub overlay_background: String,
    pub overlay_opacity: String,
    pub ambient_opacity: String,
    pub stylesheet: String,
    nodes: Vec<MemoryNode>,
    calls: Vec<SurfaceCall>,
    // Reads are not in the call log; layout reads are the expensive part.
    color_reads: Cell<usize>,
    tag_reads: Cell<usize>,
}

impl MemorySurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    pub fn add_node(&mut self, rect: Rect, color: Option<&str>) -> NodeId {
        self.nodes.push(MemoryNode {
            rect,
            color: color.map(str::to_string),
            tags: Default::default(),
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut MemoryNode {
        &mut self.nodes[id.0]
    }

    pub fn tag(&self, id: NodeId, tag: Tag) -> Option<&str> {
        self.nodes[id.0].tags[tag.index()].as_deref()
    }

    pub fn has_any_tag(&self, id: NodeId) -> bool {
        self.nodes[id.0].tags.iter().any(Option::is_some)
    }

    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<SurfaceCall> {
        std::mem::take(&mut self.calls)
    }

    /// Number of tag writes and removals in the log.
    pub fn tag_mutations(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, SurfaceCall::Tag(..) | SurfaceCall::Untag(..)))
            .count()
    }

    /// Number of `element_color` calls so far.
    pub fn color_reads(&self) -> usize {
        self.color_reads.get()
    }

    pub fn tag_reads(&self) -> usize {
        self.tag_reads.get()
    }

    pub fn stylesheet_writes(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, SurfaceCall::Stylesheet(_)))
            .count()
    }
}

impl Surface for MemorySurface {
    type Element = NodeId;

    fn mount(&mut self) {
        self.mounted = true;
        self.overlay_opacity = "0".into();
        self.ambient_opacity = "0".into();
        self.calls.push(SurfaceCall::Mount);
    }

    fn unmount(&mut self) {
        self.mounted = false;
        self.overlay_background.clear();
        self.overlay_opacity.clear();
        self.ambient_opacity.clear();
        self.stylesheet.clear();
        self.calls.push(SurfaceCall::Unmount);
    }

    fn measure_viewport(&self) -> Viewport {
        self.viewport
    }

    fn query_candidate_elements(&self) -> Vec<NodeId> {
        (0..self.nodes.len()).map(NodeId).collect()
    }

    fn element_rect(&self, element: &NodeId) -> Rect {
        self.nodes[element.0].rect
    }

    fn element_color(&self, element: &NodeId) -> Option<String> {
        self.color_reads.set(self.color_reads.get() + 1);
        self.nodes[element.0].color.clone()
    }

    fn element_tag(&self, element: &NodeId, tag: Tag) -> Option<String> {
        self.tag_reads.set(self.tag_reads.get() + 1);
        self.tag(*element, tag).map(str::to_string)
    }

    fn tag_element(&mut self, element: &NodeId, tag: Tag, value: &str) {
        self.nodes[element.0].tags[tag.index()] = Some(value.to_string());
        self.calls
            .push(SurfaceCall::Tag(*element, tag, value.to_string()));
    }

    fn untag_element(&mut self, element: &NodeId, tag: Tag) {
        self.nodes[element.0].tags[tag.index()] = None;
        self.calls.push(SurfaceCall::Untag(*element, tag));
    }

    fn set_overlay_background(&mut self, css: &str) {
        self.overlay_background = css.to_string();
        self.calls.push(SurfaceCall::OverlayBackground(css.to_string()));
    }

    fn set_overlay_opacity(&mut self, opacity: &str) {
        self.overlay_opacity = opacity.to_string();
        self.calls.push(SurfaceCall::OverlayOpacity(opacity.to_string()));
    }

    fn set_ambient_opacity(&mut self, opacity: &str) {
        self.ambient_opacity = opacity.to_string();
        self.calls.push(SurfaceCall::AmbientOpacity(opacity.to_string()));
    }

    fn set_stylesheet_text(&mut self, css: &str) {
        self.stylesheet = css.to_string();
        self.calls.push(SurfaceCall::Stylesheet(css.to_string()));
    }
}
