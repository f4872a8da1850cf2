//! Gradient overlay and ambient flicker for one frame.
//!
//! Every active edge contributes one radial gradient per light source. Each
//! source flickers in brightness and sways, breathes and morphs on its own
//! noise channels. Numbers are rounded before they reach the CSS text so
//! the output stays compact and stable.

use std::fmt::Write as _;

use smallvec::SmallVec;

use crate::color::WarmColor;
use crate::config::{Config, Direction};
use crate::css::Num;
use crate::noise::{candle, noise};
use crate::sources::{sources, LightSource};

/// Gradient alpha per intensity point (intensity 100 peaks at 0.38).
pub const ALPHA_PER_INTENSITY: f64 = 0.0038;
/// Ambient layer opacity per ambient-intensity point.
pub const AMBIENT_PER_INTENSITY: f64 = 0.007;
/// Speed setting that plays the animation in real time.
pub const REAL_TIME_SPEED: f64 = 30.0;

// Extra spread so a distance of 0 still shows a sliver of light.
const SPREAD_PADDING: f64 = 15.0;
const SWAY_PERCENT: f64 = 10.0;

// (weight, frequency, seed) of the ambient octaves.
const AMBIENT_OCTAVES: [(f64, f64, i32); 3] =
    [(0.45, 0.6, 8000), (0.30, 1.7, 8137), (0.25, 4.3, 8293)];

/// Effect time in seconds for a wall-clock offset in milliseconds.
#[inline]
pub fn effect_time(elapsed_ms: f64, speed: u8) -> f64 {
    elapsed_ms * 0.001 * (speed as f64 / REAL_TIME_SPEED)
}

/// Mean candle flicker of each active edge, in direction order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DirectionFlicker(SmallVec<[(Direction, f64); 4]>);

impl DirectionFlicker {
    pub fn get(&self, dir: Direction) -> Option<f64> {
        self.0.iter().find(|(d, _)| *d == dir).map(|&(_, f)| f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Direction, f64)> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One light source's ellipse for this frame, already rounded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipse {
    pub width: Num,
    pub height: Num,
    pub x: Num,
    pub y: Num,
    pub alpha: Num,
    /// Unrounded candle sample that drove `alpha`.
    pub flicker: f64,
}

pub fn source_ellipse(
    t: f64,
    src: &LightSource,
    dir: Direction,
    distance: u8,
    base_alpha: f64,
) -> Ellipse {
    let horizontal = dir.is_horizontal();
    let flicker = candle(t, src.seed);
    let sway = (noise(t * 0.7, src.seed + 51) - 0.5) * SWAY_PERCENT;
    let breathe = 0.55 + 0.9 * noise(t * 1.2, src.seed + 73);
    let spread = (distance as f64 + SPREAD_PADDING) * src.size * breathe;
    let (x, y) = if horizontal {
        (src.x + sway, src.y)
    } else {
        (src.x, src.y + sway)
    };

    let aspect = noise(t * 0.35, src.seed + 97);
    let long = spread * (0.40 + aspect * 0.90);
    let short = spread * (0.18 + (1.0 - aspect) * 0.60);
    let (width, height) = if horizontal { (long, short) } else { (short, long) };

    Ellipse {
        width: Num::rounded(width, 0),
        height: Num::rounded(height, 0),
        x: Num::rounded(x, 0),
        y: Num::rounded(y, 0),
        alpha: Num::rounded(base_alpha * flicker, 3),
        flicker,
    }
}

/// Overlay background plus the per-edge flicker the shadow pass consumes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Composite {
    pub background: String,
    pub gradients: usize,
    pub flicker: DirectionFlicker,
}

pub fn compose(t: f64, config: &Config, color: &WarmColor) -> Composite {
    let base_alpha = config.intensity as f64 * ALPHA_PER_INTENSITY;
    let mut out = Composite::default();

    for dir in config.directions.iter() {
        let table = sources(dir);
        let mut sum = 0.0;
        for src in table {
            let e = source_ellipse(t, src, dir, config.distance, base_alpha);
            sum += e.flicker;
            if out.gradients > 0 {
                out.background.push(',');
            }
            _ = write!(
                out.background,
                "radial-gradient(ellipse {}% {}% at {}% {}%,rgba({},{}) 0%,transparent 100%)",
                e.width,
                e.height,
                e.x,
                e.y,
                color.css(),
                e.alpha
            );
            out.gradients += 1;
        }
        out.flicker.0.push((dir, sum / table.len() as f64));
    }
    out
}

/// Raw ambient level in `[0, 1]`, independent of any light edge.
pub fn ambient_level(t: f64) -> f64 {
    AMBIENT_OCTAVES
        .iter()
        .map(|&(weight, freq, seed)| weight * noise(t * freq, seed))
        .sum()
}

/// Ambient layer opacity, fixed to three decimals; `"0"` when disabled.
pub fn ambient_opacity(t: f64, config: &Config) -> String {
    if !config.ambient_flicker {
        return "0".to_string();
    }
    let opacity = ambient_level(t) * config.ambient_intensity as f64 * AMBIENT_PER_INTENSITY;
    format!("{opacity:.3}")
}
