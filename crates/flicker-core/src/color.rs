use std::fmt;

/// Text whose luma is above this (0..255 scale) is treated as light text.
pub const LIGHT_TEXT_LUMA: f64 = 140.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Rec. 601 luma on the 0..255 scale.
    #[inline]
    pub fn luma(self) -> f64 {
        0.299 * self.r as f64 + 0.587 * self.g as f64 + 0.114 * self.b as f64
    }
}

// Comma-joined channels, ready for `rgba(<rgb>,<alpha>)`.
impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.r, self.g, self.b)
    }
}

/// Candle color for a warmth in 0..=100. Higher warmth is a deeper orange-red.
pub fn warm_rgb(warmth: u8) -> Rgb {
    let w = warmth.min(100) as f64;
    Rgb::new(255, (180.0 - w * 1.2).round() as u8, (50.0 - w * 0.4).round() as u8)
}

/// Warm color plus its string form, recomputed only when warmth changes.
#[derive(Clone, Debug)]
pub struct WarmColor {
    warmth: u8,
    rgb: Rgb,
    css: String,
}

impl WarmColor {
    pub fn new(warmth: u8) -> Self {
        let rgb = warm_rgb(warmth);
        Self {
            warmth,
            rgb,
            css: rgb.to_string(),
        }
    }

    /// Returns `true` when the cached color was recomputed.
    pub fn update(&mut self, warmth: u8) -> bool {
        if warmth == self.warmth {
            return false;
        }
        *self = Self::new(warmth);
        true
    }

    pub fn rgb(&self) -> Rgb {
        self.rgb
    }

    /// `"R,G,B"`.
    pub fn css(&self) -> &str {
        &self.css
    }
}

/// Parses the first three channels out of a computed `rgb()`/`rgba()` value.
///
/// Accepts both the comma and the space separated syntax. Channels are
/// clamped to 0..=255.
pub fn parse_css_rgb(value: &str) -> Option<Rgb> {
    let open = value.find('(')?;
    let body = &value[open + 1..];
    let body = &body[..body.find(')').unwrap_or(body.len())];
    let mut channels = body
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().ok().filter(|v| v.is_finite()));
    let mut next = || -> Option<u8> { Some(channels.next()??.round().clamp(0.0, 255.0) as u8) };
    let (r, g, b) = (next()?, next()?, next()?);
    Some(Rgb::new(r, g, b))
}

/// Light-text test on a computed color; unparseable colors count as dark.
pub fn is_light_text(computed: Option<&str>) -> bool {
    computed
        .and_then(parse_css_rgb)
        .is_some_and(|rgb| rgb.luma() > LIGHT_TEXT_LUMA)
}
