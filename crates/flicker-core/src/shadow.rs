//! Text-shadow stylesheet keyed by (direction, band, variation).
//!
//! The stylesheet is generic: it holds one dark drop-shadow rule and one
//! warm-glow rule for light text per tag combination, and the classifier's
//! tags pick which rule applies to an element. Offsets and blur follow the
//! edge's mean flicker; each variation group drifts on its own noise channel
//! and a shared low tremor moves everything slightly.

use std::fmt::Write as _;

use glam::DVec2;

use crate::classify::{MAX_BAND, VARIATIONS};
use crate::color::WarmColor;
use crate::compositor::DirectionFlicker;
use crate::config::{Config, Direction};
use crate::css::Num;
use crate::noise::noise;
use crate::sources::shadow_direction;
use crate::surface::Tag;

const NVARS: usize = VARIATIONS as usize;
const NBANDS: usize = MAX_BAND as usize;

/// Upper bound on emitted rules: 4 directions x 5 bands x 4 variations x 2.
pub const MAX_RULES: usize = 4 * NBANDS * NVARS * 2;

const JITTER_SEED_X: i32 = 5000;
const JITTER_SEED_Y: i32 = 5100;
const JITTER_SEED_BLUR: i32 = 5200;
const JITTER_SEED_STEP: i32 = 137;
const JITTER_DRIFT_PX: f64 = 2.4;
const TREMOR_SEEDS: (i32, i32) = (9997, 9998);
const TREMOR_PX: f64 = 0.7;

/// Selector matching one exact (direction, band, variation) tag set.
pub fn selector(dir: Direction, band: u8, variation: u8) -> String {
    format!(
        "[{}=\"{}\"][{}=\"{}\"][{}=\"{}\"]",
        Tag::Direction.attribute(),
        dir.code(),
        Tag::Band.attribute(),
        band,
        Tag::Variation.attribute(),
        variation
    )
}

/// Per-variation drift and blur factors plus the shared tremor at time `t`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Jitter {
    pub offset: [DVec2; NVARS],
    pub blur: [f64; NVARS],
    pub tremor: DVec2,
}

impl Jitter {
    pub fn at(t: f64) -> Self {
        let drift = |seed: i32| (noise(t * 1.8, seed) - 0.5) * JITTER_DRIFT_PX;
        let step = |v: usize| JITTER_SEED_STEP * v as i32;
        Self {
            offset: std::array::from_fn(|v| {
                DVec2::new(drift(JITTER_SEED_X + step(v)), drift(JITTER_SEED_Y + step(v)))
            }),
            blur: std::array::from_fn(|v| 0.8 + 0.4 * noise(t * 1.4, JITTER_SEED_BLUR + step(v))),
            tremor: DVec2::new(
                (noise(t * 3.3, TREMOR_SEEDS.0) - 0.5) * TREMOR_PX,
                (noise(t * 3.3, TREMOR_SEEDS.1) - 0.5) * TREMOR_PX,
            ),
        }
    }
}

/// Builds the shadow stylesheet from prebuilt selectors.
#[derive(Clone, Debug)]
pub struct ShadowBuilder {
    // [direction][band - 1][variation]
    selectors: [[[String; NVARS]; NBANDS]; 4],
}

impl Default for ShadowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ShadowBuilder {
    pub fn new() -> Self {
        Self {
            selectors: std::array::from_fn(|d| {
                std::array::from_fn(|b| {
                    std::array::from_fn(|v| selector(Direction::ALL[d], b as u8 + 1, v as u8))
                })
            }),
        }
    }

    pub fn build(
        &self,
        t: f64,
        config: &Config,
        color: &WarmColor,
        flicker: &DirectionFlicker,
    ) -> String {
        let jitter = Jitter::at(t);
        let light_scale = config.intensity as f64 * 0.01;
        let shadow_scale = config.shadow_intensity as f64 * 0.01;
        let glow_rgb = color.css();
        let mut css = String::new();

        for dir in config.directions.iter() {
            let Some(df) = flicker.get(dir) else {
                continue;
            };
            let magnitude = (2.5 + 3.0 * df) * (0.6 + light_scale * 4.0);
            let base = shadow_direction(dir) * magnitude + jitter.tremor;
            let blur = 3.0 + 4.5 * df;
            let alpha = (0.15 + light_scale * 0.35) * (0.4 + 0.6 * df) * shadow_scale;
            let glow = (0.30 + light_scale * 0.55) * (0.4 + 0.6 * df) * shadow_scale;

            for (b, by_var) in self.selectors[dir.index()].iter().enumerate() {
                let frac = (b + 1) as f64 / NBANDS as f64;
                for (v, sel) in by_var.iter().enumerate() {
                    let offset = base + jitter.offset[v];
                    let x = Num::rounded(offset.x * frac, 1);
                    let y = Num::rounded(offset.y * frac, 1);
                    let spread = blur * jitter.blur[v] * frac;

                    _ = write!(
                        css,
                        "{sel}{{text-shadow:{x}px {y}px {}px rgba(0,0,0,{}) !important}}",
                        Num::rounded(spread, 1),
                        Num::rounded(alpha * frac, 3),
                    );
                    _ = write!(
                        css,
                        "[{}]{sel}{{text-shadow:{x}px {y}px {}px rgba({glow_rgb},{}),\
                         {x}px {y}px {}px rgba({glow_rgb},{}) !important}}",
                        Tag::LightText.attribute(),
                        Num::rounded(spread * 0.8, 1),
                        Num::rounded(glow * frac, 3),
                        Num::rounded(spread * 2.5, 1),
                        Num::rounded(glow * frac * 0.5, 3),
                    );
                }
            }
        }
        css
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::compose;

    fn build_for(dirs: &[Direction], t: f64) -> String {
        let cfg = Config {
            directions: dirs.iter().copied().collect(),
            ..Config::default()
        };
        let color = WarmColor::new(cfg.warmth);
        let flicker = compose(t, &cfg, &color).flicker;
        ShadowBuilder::new().build(t, &cfg, &color, &flicker)
    }

    #[test]
    fn selector_is_mechanical() {
        assert_eq!(
            selector(Direction::Bottom, 3, 2),
            "[data-flk-d=\"b\"][data-flk=\"3\"][data-flk-v=\"2\"]"
        );
    }

    #[test]
    fn rule_count_is_bounded_by_the_tag_product() {
        let one = build_for(&[Direction::Top], 2.0);
        assert_eq!(one.matches("text-shadow:").count(), 40);
        assert_eq!(one.matches("[data-flk-l]").count(), 20);

        let all = build_for(&Direction::ALL, 2.0);
        assert_eq!(all.matches("text-shadow:").count(), MAX_RULES);
    }

    #[test]
    fn every_rule_uses_a_known_selector() {
        let css = build_for(&[Direction::Left, Direction::Right], 7.5);
        let builder = ShadowBuilder::new();
        for rule in css.split('}').filter(|r| !r.is_empty()) {
            let head = rule.split('{').next().unwrap();
            let head = head.strip_prefix("[data-flk-l]").unwrap_or(head);
            let known = Direction::ALL.iter().any(|d| {
                builder.selectors[d.index()]
                    .iter()
                    .flatten()
                    .any(|s| s == head)
            });
            assert!(known, "unexpected selector {head}");
        }
    }

    #[test]
    fn light_text_glows_in_the_warm_color() {
        let css = build_for(&[Direction::Top], 1.0);
        assert!(css.contains("rgba(255,120,30,"));
        assert!(css.contains("rgba(0,0,0,"));
    }

    #[test]
    fn identical_inputs_give_identical_text() {
        assert_eq!(build_for(&[Direction::Top], 3.3), build_for(&[Direction::Top], 3.3));
    }

    #[test]
    fn zero_shadow_intensity_zeroes_alpha() {
        let cfg = Config {
            shadow_intensity: 0,
            ..Config::default()
        };
        let color = WarmColor::new(cfg.warmth);
        let flicker = compose(1.0, &cfg, &color).flicker;
        let css = ShadowBuilder::new().build(1.0, &cfg, &color, &flicker);
        assert_eq!(css.matches("rgba(0,0,0,0)").count(), 20);
    }

    #[test]
    fn jitter_stays_small() {
        for i in 0..40 {
            let j = Jitter::at(i as f64 * 0.4);
            for v in 0..NVARS {
                assert!(j.offset[v].x.abs() <= 1.2 && j.offset[v].y.abs() <= 1.2);
                assert!((0.8..=1.2).contains(&j.blur[v]));
            }
            assert!(j.tremor.x.abs() <= 0.35 && j.tremor.y.abs() <= 0.35);
        }
    }
}
