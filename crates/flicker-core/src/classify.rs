//! Spatial classification of text elements into light-exposure bands.
//!
//! Each tracked element is tagged with a band (0 = unlit .. 5 = full), the
//! winning light direction, a variation group that desynchronizes jitter
//! between neighbours, and whether its text is light. The pass reads layout
//! and is kept off the per-frame path: it runs only when `ReclassifySchedule`
//! says a scroll, resize or config change is due.

use glam::DVec2;

use crate::color::is_light_text;
use crate::config::{Config, Direction, Directions};
use crate::surface::{Rect, Surface, Tag, Viewport};

/// Band 0 is unlit, `BANDS - 1` is full exposure.
pub const BANDS: u8 = 6;
pub const MAX_BAND: u8 = BANDS - 1;
pub const VARIATIONS: u8 = 4;
pub const MAX_TRACKED: usize = 5000;
/// Elements this far outside the viewport are still considered on screen.
pub const OFFSCREEN_MARGIN: f64 = 50.0;
pub const CLASSIFY_COOLDOWN_MS: f64 = 200.0;

// Spatial frequencies of the variation bucket.
const VARIATION_FREQ_Y: f64 = 0.07;
const VARIATION_FREQ_X: f64 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exposure {
    Unlit,
    Lit {
        band: u8,
        direction: Direction,
        variation: u8,
    },
}

impl Exposure {
    pub fn band(self) -> u8 {
        match self {
            Exposure::Unlit => 0,
            Exposure::Lit { band, .. } => band,
        }
    }
}

#[inline]
pub fn is_offscreen(rect: Rect, viewport: Viewport) -> bool {
    rect.bottom < -OFFSCREEN_MARGIN
        || rect.top > viewport.height + OFFSCREEN_MARGIN
        || rect.right < -OFFSCREEN_MARGIN
        || rect.left > viewport.width + OFFSCREEN_MARGIN
}

/// How close `center` is to the light edge, 1.0 on the edge itself.
#[inline]
pub fn proximity(dir: Direction, center: DVec2, viewport: Viewport) -> f64 {
    match dir {
        Direction::Bottom => center.y / viewport.height,
        Direction::Top => 1.0 - center.y / viewport.height,
        Direction::Right => center.x / viewport.width,
        Direction::Left => 1.0 - center.x / viewport.width,
    }
}

/// Linear ramp from 0 at `1 - reach` up to 1 at the edge.
#[inline]
pub fn strength(proximity: f64, reach: f64) -> f64 {
    if reach <= 0.0 {
        return 0.0;
    }
    ((proximity - (1.0 - reach)) / reach).max(0.0)
}

#[inline]
pub fn band_for(strength: f64) -> u8 {
    ((strength * BANDS as f64).floor().max(0.0) as u8).min(MAX_BAND)
}

/// Jitter bucket; nearby elements tend to land in different groups.
#[inline]
pub fn variation_group(center: DVec2) -> u8 {
    let bucket = (center.y * VARIATION_FREQ_Y).floor() as i64
        + (center.x * VARIATION_FREQ_X).floor() as i64;
    bucket.rem_euclid(VARIATIONS as i64) as u8
}

/// Exposure of one element box. The first direction wins ties.
pub fn expose(rect: Rect, viewport: Viewport, directions: &Directions, reach: f64) -> Exposure {
    if is_offscreen(rect, viewport) {
        return Exposure::Unlit;
    }
    expose_onscreen(rect, viewport, directions, reach)
}

// Caller has already ruled out off-screen boxes.
fn expose_onscreen(
    rect: Rect,
    viewport: Viewport,
    directions: &Directions,
    reach: f64,
) -> Exposure {
    if viewport.width <= 0.0 || viewport.height <= 0.0 {
        return Exposure::Unlit;
    }
    let center = DVec2::new(
        (rect.left + rect.right) * 0.5,
        (rect.top + rect.bottom) * 0.5,
    );
    let mut best: Option<(Direction, f64)> = None;
    for dir in directions.iter() {
        let s = strength(proximity(dir, center, viewport), reach);
        if best.map_or(true, |(_, top)| s > top) {
            best = Some((dir, s));
        }
    }
    match best {
        Some((direction, s)) if band_for(s) > 0 => Exposure::Lit {
            band: band_for(s),
            direction,
            variation: variation_group(center),
        },
        _ => Exposure::Unlit,
    }
}

/// Counters for one classification pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassifyStats {
    pub scanned: usize,
    pub offscreen: usize,
    pub lit: usize,
    pub evicted: usize,
    pub writes: usize,
}

/// Owns the set of tagged elements and keeps their tags current.
#[derive(Debug)]
pub struct Classifier<E> {
    tracked: Vec<E>,
    cap: usize,
}

impl<E: Clone + PartialEq> Default for Classifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + PartialEq> Classifier<E> {
    pub fn new() -> Self {
        Self::with_cap(MAX_TRACKED)
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            tracked: Vec::new(),
            cap,
        }
    }

    pub fn tracked(&self) -> &[E] {
        &self.tracked
    }

    /// Classify every candidate up to the cap. Elements past the cap lose
    /// their tags. Unchanged tags are never rewritten.
    pub fn classify<S>(&mut self, surface: &mut S, config: &Config) -> ClassifyStats
    where
        S: Surface<Element = E>,
    {
        let viewport = surface.measure_viewport();
        let reach = config.reach();
        let mut candidates = surface.query_candidate_elements();
        let len = candidates.len().min(self.cap);
        let mut stats = ClassifyStats::default();

        for el in &candidates[len..] {
            let writes = clear_tags(surface, el);
            if writes > 0 {
                stats.evicted += 1;
                stats.writes += writes;
            }
        }
        candidates.truncate(len);

        for el in &candidates {
            stats.scanned += 1;
            let rect = surface.element_rect(el);
            let exposure = if is_offscreen(rect, viewport) {
                stats.offscreen += 1;
                Exposure::Unlit
            } else {
                expose_onscreen(rect, viewport, &config.directions, reach)
            };
            match exposure {
                Exposure::Unlit => {
                    stats.writes += write_tag(surface, el, Tag::Band, Some("0"));
                    stats.writes += write_tag(surface, el, Tag::Direction, None);
                    stats.writes += write_tag(surface, el, Tag::Variation, None);
                    stats.writes += write_tag(surface, el, Tag::LightText, None);
                }
                Exposure::Lit {
                    band,
                    direction,
                    variation,
                } => {
                    stats.lit += 1;
                    let light = is_light_text(surface.element_color(el).as_deref());
                    stats.writes += write_tag(surface, el, Tag::Band, Some(digit(band)));
                    stats.writes +=
                        write_tag(surface, el, Tag::Direction, Some(direction.code_str()));
                    stats.writes +=
                        write_tag(surface, el, Tag::Variation, Some(digit(variation)));
                    stats.writes +=
                        write_tag(surface, el, Tag::LightText, light.then_some(""));
                }
            }
        }

        self.tracked = candidates;
        stats
    }

    /// Remove every tag this classifier wrote; used on unmount.
    pub fn clear<S>(&mut self, surface: &mut S) -> usize
    where
        S: Surface<Element = E>,
    {
        let tracked = std::mem::take(&mut self.tracked);
        tracked.iter().map(|el| clear_tags(surface, el)).sum()
    }
}

fn digit(n: u8) -> &'static str {
    const DIGITS: [&str; 6] = ["0", "1", "2", "3", "4", "5"];
    DIGITS[(n as usize).min(DIGITS.len() - 1)]
}

// Equality-guarded write; returns 1 when the surface was touched.
fn write_tag<S: Surface>(surface: &mut S, el: &S::Element, tag: Tag, value: Option<&str>) -> usize {
    let current = surface.element_tag(el, tag);
    match (current.as_deref(), value) {
        (Some(have), Some(want)) if have == want => 0,
        (None, None) => 0,
        (_, Some(want)) => {
            surface.tag_element(el, tag, want);
            1
        }
        (Some(_), None) => {
            surface.untag_element(el, tag);
            1
        }
    }
}

// Every tagged element carries a band, so one read settles untagged ones.
fn clear_tags<S: Surface>(surface: &mut S, el: &S::Element) -> usize {
    if surface.element_tag(el, Tag::Band).is_none() {
        return 0;
    }
    Tag::ALL
        .into_iter()
        .map(|tag| write_tag(surface, el, tag, None))
        .sum()
}

/// Dirty flag plus cooldown: bursts of layout events collapse into one pass.
///
/// A request marks the pass dirty. It becomes due once at least
/// `CLASSIFY_COOLDOWN_MS` has passed since the previous pass, so the
/// trailing edge of a scroll burst is always classified.
#[derive(Clone, Debug)]
pub struct ReclassifySchedule {
    dirty: bool,
    last_pass: Option<f64>,
    cooldown_ms: f64,
}

impl Default for ReclassifySchedule {
    fn default() -> Self {
        Self::new(CLASSIFY_COOLDOWN_MS)
    }
}

impl ReclassifySchedule {
    pub fn new(cooldown_ms: f64) -> Self {
        Self {
            dirty: true,
            last_pass: None,
            cooldown_ms,
        }
    }

    /// Scroll or resize happened.
    pub fn request(&mut self) {
        self.dirty = true;
    }

    /// Config change or page shown again: due on the next tick.
    pub fn force(&mut self) {
        self.dirty = true;
        self.last_pass = None;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_due(&self, now: f64) -> bool {
        self.dirty
            && self
                .last_pass
                .map_or(true, |last| now - last >= self.cooldown_ms)
    }

    pub fn mark_done(&mut self, now: f64) {
        self.dirty = false;
        self.last_pass = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{MemorySurface, NodeId, SurfaceCall};

    fn top_only() -> Directions {
        Directions::from([Direction::Top])
    }

    fn vp() -> Viewport {
        Viewport::new(1000.0, 800.0)
    }

    #[test]
    fn strength_ramps_from_reach_edge() {
        assert_eq!(strength(0.3, 0.6), 0.0);
        assert_eq!(strength(0.35, 0.6), 0.0);
        assert!((strength(0.7, 0.6) - 0.5).abs() < 1e-12);
        assert!((strength(1.0, 0.6) - 1.0).abs() < 1e-12);
        assert_eq!(strength(1.0, 0.0), 0.0);
    }

    #[test]
    fn band_quantizes_and_clamps() {
        assert_eq!(band_for(0.0), 0);
        assert_eq!(band_for(0.17), 1);
        assert_eq!(band_for(0.99), 5);
        assert_eq!(band_for(1.4), 5);
    }

    #[test]
    fn band_never_drops_closer_to_the_edge() {
        let mut prev = 0;
        for step in (0..=80).rev() {
            let top = step as f64 * 10.0;
            let band = expose(Rect::new(100.0, top, 200.0, 20.0), vp(), &top_only(), 0.6).band();
            assert!(band >= prev, "band fell to {band} at top={top}");
            prev = band;
        }
        assert_eq!(prev, 5);
    }

    #[test]
    fn first_direction_wins_ties() {
        // centre of a square viewport: every edge is equally close
        let viewport = Viewport::new(800.0, 800.0);
        let rect = Rect::new(0.0, 0.0, 800.0, 800.0);
        let dirs = Directions::from([Direction::Left, Direction::Top]);
        match expose(rect, viewport, &dirs, 1.0) {
            Exposure::Lit { direction, .. } => assert_eq!(direction, Direction::Left),
            other => panic!("expected lit, got {other:?}"),
        }
    }

    #[test]
    fn offscreen_and_empty_directions_are_unlit() {
        let far_below = Rect::new(0.0, 900.0, 100.0, 20.0);
        assert_eq!(expose(far_below, vp(), &top_only(), 1.0), Exposure::Unlit);
        let near_top = Rect::new(0.0, 0.0, 100.0, 20.0);
        assert_eq!(expose(near_top, vp(), &Directions::new(), 1.0), Exposure::Unlit);
        assert_eq!(expose(near_top, Viewport::default(), &top_only(), 1.0), Exposure::Unlit);
    }

    #[test]
    fn offscreen_margin_is_fifty_pixels_on_every_edge() {
        let mut surface = MemorySurface::new(vp());
        // (just inside, just outside) for bottom, top, right and left edges
        let edges = [
            (Rect::new(100.0, -69.0, 200.0, 20.0), Rect::new(100.0, -71.0, 200.0, 20.0)),
            (Rect::new(100.0, 849.0, 200.0, 20.0), Rect::new(100.0, 851.0, 200.0, 20.0)),
            (Rect::new(-249.0, 400.0, 200.0, 20.0), Rect::new(-251.0, 400.0, 200.0, 20.0)),
            (Rect::new(1049.0, 400.0, 200.0, 20.0), Rect::new(1051.0, 400.0, 200.0, 20.0)),
        ];
        let mut outside = Vec::new();
        for (inner, outer) in edges {
            assert!(!is_offscreen(inner, vp()), "{inner:?}");
            assert!(is_offscreen(outer, vp()), "{outer:?}");
            surface.add_node(inner, Some("rgb(250,250,250)"));
            outside.push(surface.add_node(outer, Some("rgb(250,250,250)")));
        }
        assert!(!is_offscreen(Rect::new(100.0, -70.0, 200.0, 20.0), vp()));

        let stats = Classifier::new().classify(&mut surface, &Config::default());
        assert_eq!((stats.scanned, stats.offscreen, stats.lit), (8, 4, 1));
        for id in outside {
            assert_eq!(surface.tag(id, Tag::Band), Some("0"));
        }
        // only the box above the top edge is lit; band 0 never reads color
        assert_eq!(surface.tag(NodeId(0), Tag::Band), Some("5"));
        assert_eq!(surface.color_reads(), 1);
    }

    #[test]
    fn untagged_elements_past_the_cap_cost_one_read() {
        let mut surface = MemorySurface::new(vp());
        for i in 0..3 {
            surface.add_node(Rect::new(10.0 * i as f64, 0.0, 50.0, 20.0), None);
        }
        let stats = Classifier::with_cap(0).classify(&mut surface, &Config::default());
        assert_eq!((stats.scanned, stats.evicted, stats.writes), (0, 0, 0));
        assert_eq!(surface.tag_reads(), 3);
        assert_eq!(surface.color_reads(), 0);
        assert!(surface.calls().is_empty());
    }

    #[test]
    fn variation_handles_negative_coordinates() {
        for x in [-300.0, -1.0, 0.0, 17.0, 999.0] {
            for y in [-120.0, 0.0, 45.0, 700.0] {
                assert!(variation_group(DVec2::new(x, y)) < VARIATIONS);
            }
        }
        assert_eq!(variation_group(DVec2::new(0.0, 0.0)), 0);
        assert_eq!(variation_group(DVec2::new(-1.0, 0.0)), 3);
    }

    #[test]
    fn classify_tags_lit_elements_and_is_idempotent() {
        let mut surface = MemorySurface::new(vp());
        let lit = surface.add_node(Rect::new(100.0, 0.0, 200.0, 20.0), Some("rgb(250, 250, 250)"));
        let dark = surface.add_node(Rect::new(100.0, 700.0, 200.0, 20.0), Some("rgb(0, 0, 0)"));
        let gone = surface.add_node(Rect::new(100.0, 5000.0, 200.0, 20.0), None);
        let cfg = Config::default();
        let mut classifier = Classifier::new();

        let stats = classifier.classify(&mut surface, &cfg);
        assert_eq!((stats.scanned, stats.lit, stats.offscreen), (3, 1, 1));
        assert_eq!(surface.tag(lit, Tag::Band), Some("5"));
        assert_eq!(surface.tag(lit, Tag::Direction), Some("t"));
        assert_eq!(surface.tag(lit, Tag::LightText), Some(""));
        assert!(surface.tag(lit, Tag::Variation).is_some());
        assert_eq!(surface.tag(dark, Tag::Band), Some("0"));
        assert_eq!(surface.tag(dark, Tag::Direction), None);
        assert_eq!(surface.tag(gone, Tag::Band), Some("0"));

        surface.take_calls();
        let again = classifier.classify(&mut surface, &cfg);
        assert_eq!(again.writes, 0);
        assert_eq!(surface.tag_mutations(), 0);
    }

    #[test]
    fn dropping_to_unlit_clears_secondary_tags() {
        let mut surface = MemorySurface::new(vp());
        let id = surface.add_node(Rect::new(100.0, 0.0, 200.0, 20.0), Some("rgb(255,255,255)"));
        let mut classifier = Classifier::new();
        classifier.classify(&mut surface, &Config::default());
        surface.node_mut(id).rect = Rect::new(100.0, 700.0, 200.0, 20.0);
        classifier.classify(&mut surface, &Config::default());
        assert_eq!(surface.tag(id, Tag::Band), Some("0"));
        for tag in [Tag::Direction, Tag::Variation, Tag::LightText] {
            assert_eq!(surface.tag(id, tag), None);
        }
    }

    #[test]
    fn elements_past_the_cap_lose_their_tags() {
        let mut surface = MemorySurface::new(vp());
        let ids: Vec<_> = (0..4)
            .map(|i| surface.add_node(Rect::new(10.0 * i as f64, 0.0, 50.0, 20.0), None))
            .collect();
        let cfg = Config::default();
        Classifier::with_cap(4).classify(&mut surface, &cfg);
        assert!(ids.iter().all(|&id| surface.has_any_tag(id)));

        let mut capped = Classifier::with_cap(2);
        let stats = capped.classify(&mut surface, &cfg);
        assert_eq!(stats.evicted, 2);
        assert!(surface.has_any_tag(ids[1]));
        assert!(!surface.has_any_tag(ids[2]) && !surface.has_any_tag(ids[3]));
        assert_eq!(capped.tracked().len(), 2);

        capped.clear(&mut surface);
        assert!(ids.iter().all(|&id| !surface.has_any_tag(id)));
        assert!(capped.tracked().is_empty());
        assert!(matches!(surface.calls().last(), Some(SurfaceCall::Untag(..))));
    }

    #[test]
    fn schedule_coalesces_bursts() {
        let mut s = ReclassifySchedule::default();
        assert!(s.is_due(0.0));
        s.mark_done(0.0);
        assert!(!s.is_due(10.0));
        s.request();
        s.request();
        assert!(!s.is_due(150.0));
        assert!(s.is_due(200.0));
        s.mark_done(200.0);
        assert!(!s.is_dirty());
        s.force();
        assert!(s.is_due(201.0));
    }
}
