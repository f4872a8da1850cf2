//! Deterministic 1D value noise and the layered "candle" flicker built on it.
//!
//! Everything here is a pure function of its inputs. The same `(t, seed)`
//! pair yields the same value on every call and every run, which keeps the
//! animation reproducible and testable.

/// Largest `f64` strictly below 1.0.
const BELOW_ONE: f64 = 1.0 - f64::EPSILON / 2.0;

// Octave weights and seed offsets of the candle flicker.
const CANDLE_OCTAVES: [(f64, f64, i32); 3] = [(0.45, 1.8, 0), (0.35, 4.6, 137), (0.20, 11.5, 293)];

/// Lowest value `candle` can return.
pub const CANDLE_FLOOR: f64 = 0.35;

/// Integer avalanche hash mapped to `[0, 1)`.
///
/// Input is treated as 32-bit; every step wraps modulo 2^32.
#[inline]
pub fn hash(n: i32) -> f64 {
    let mut n = n as u32;
    n = (n ^ 61) ^ (n >> 16);
    n = n.wrapping_add(n << 3);
    n ^= n >> 4;
    n = n.wrapping_mul(0x27D4_EB2D);
    n ^= n >> 15;
    (n as f64 / u32::MAX as f64).min(BELOW_ONE)
}

/// Smoothstep-interpolated value noise between integer lattice points.
#[inline]
pub fn noise(t: f64, seed: i32) -> f64 {
    let floor = t.floor();
    let f = t - floor;
    let u = f * f * (3.0 - 2.0 * f);
    let i = lattice(floor);
    hash(i.wrapping_add(seed)) * (1.0 - u) + hash(i.wrapping_add(1).wrapping_add(seed)) * u
}

/// Three-octave flicker in `[0.35, 1.0]`; the light never goes fully dark.
pub fn candle(t: f64, seed: i32) -> f64 {
    let raw: f64 = CANDLE_OCTAVES
        .iter()
        .map(|&(weight, freq, offset)| weight * noise(t * freq, seed.wrapping_add(offset)))
        .sum();
    CANDLE_FLOOR + (1.0 - CANDLE_FLOOR) * raw.sqrt()
}

// Wraps a floored time onto the 32-bit lattice.
#[inline]
fn lattice(floor: f64) -> i32 {
    (floor as i64) as i32
}
