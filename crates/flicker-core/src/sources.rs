use glam::DVec2;

use crate::config::Direction;

// Hand-placed light sources along each edge. Positions are viewport percents;
// seeds keep every source's flicker independent.

pub const SOURCES_PER_DIRECTION: usize = 7;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightSource {
    pub x: f64,    // percent from left
    pub y: f64,    // percent from top
    pub seed: i32, // noise seed
    pub size: f64, // ellipse size multiplier
}

const fn src(x: f64, y: f64, seed: i32, size: f64) -> LightSource {
    LightSource { x, y, seed, size }
}

pub const TOP: [LightSource; SOURCES_PER_DIRECTION] = [
    src(4.0, 0.0, 100, 0.70),
    src(18.0, 0.0, 200, 1.00),
    src(33.0, 0.0, 300, 0.80),
    src(48.0, 0.0, 400, 1.10),
    src(62.0, 0.0, 500, 0.75),
    src(79.0, 0.0, 550, 1.05),
    src(95.0, 0.0, 580, 0.85),
];

pub const BOTTOM: [LightSource; SOURCES_PER_DIRECTION] = [
    src(6.0, 100.0, 600, 0.80),
    src(22.0, 100.0, 700, 1.05),
    src(36.0, 100.0, 750, 0.70),
    src(52.0, 100.0, 800, 1.10),
    src(66.0, 100.0, 850, 0.85),
    src(81.0, 100.0, 900, 1.00),
    src(94.0, 100.0, 950, 0.75),
];

pub const LEFT: [LightSource; SOURCES_PER_DIRECTION] = [
    src(0.0, 5.0, 1100, 0.75),
    src(0.0, 19.0, 1200, 1.00),
    src(0.0, 34.0, 1250, 0.80),
    src(0.0, 49.0, 1300, 1.10),
    src(0.0, 63.0, 1350, 0.70),
    src(0.0, 78.0, 1400, 1.05),
    src(0.0, 94.0, 1450, 0.85),
];

pub const RIGHT: [LightSource; SOURCES_PER_DIRECTION] = [
    src(100.0, 6.0, 1600, 0.85),
    src(100.0, 21.0, 1650, 1.00),
    src(100.0, 35.0, 1700, 0.75),
    src(100.0, 50.0, 1750, 1.10),
    src(100.0, 64.0, 1800, 0.80),
    src(100.0, 79.0, 1850, 1.05),
    src(100.0, 93.0, 1900, 0.70),
];

#[inline]
pub fn sources(dir: Direction) -> &'static [LightSource; SOURCES_PER_DIRECTION] {
    match dir {
        Direction::Top => &TOP,
        Direction::Bottom => &BOTTOM,
        Direction::Left => &LEFT,
        Direction::Right => &RIGHT,
    }
}

/// Unit vector a shadow is cast along, pointing away from the light edge.
#[inline]
pub fn shadow_direction(dir: Direction) -> DVec2 {
    match dir {
        Direction::Top => DVec2::new(0.0, 1.0),
        Direction::Bottom => DVec2::new(0.0, -1.0),
        Direction::Left => DVec2::new(1.0, 0.0),
        Direction::Right => DVec2::new(-1.0, 0.0),
    }
}
