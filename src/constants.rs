// DOM ids, layer styling and event names of the page overlay.

// Element ids of the three owned nodes
pub const OVERLAY_ID: &str = "flicker-overlay";
pub const AMBIENT_ID: &str = "flicker-overlay-ambient";
pub const STYLE_ID: &str = "flicker-overlay-shadows";

// Stacking: the light sits above the ambient dimmer, both above the page
pub const OVERLAY_Z_INDEX: &str = "2147483647";
pub const AMBIENT_Z_INDEX: &str = "2147483646";

pub const OVERLAY_TRANSITION: &str = "opacity 0.3s ease";
pub const AMBIENT_BACKGROUND: &str = "rgb(0,0,0)";

// Shared geometry of both layers: fixed, full viewport, click-through
pub const LAYER_STYLE: [(&str, &str); 8] = [
    ("position", "fixed"),
    ("top", "0"),
    ("left", "0"),
    ("width", "100vw"),
    ("height", "100vh"),
    ("pointer-events", "none"),
    ("opacity", "0"),
    ("will-change", "opacity"),
];

/// Text-bearing elements considered for shadows, in document order.
pub const CANDIDATE_SELECTOR: &str = "p,h1,h2,h3,h4,h5,h6,li,td,th,dt,dd,span,a,\
blockquote,figcaption,pre,label,summary,article";

// Layout events that mark classification dirty (registered passive)
pub const LAYOUT_EVENTS: [&str; 2] = ["scroll", "resize"];
pub const VISIBILITY_EVENT: &str = "visibilitychange";

// Extension namespaces, Firefox first
pub const EXTENSION_GLOBALS: [&str; 2] = ["browser", "chrome"];
pub const STORAGE_AREA: &str = "local";
