//! Compact number formatting for generated CSS.
//!
//! Values are rounded half-up (towards +inf) to a fixed number of decimals
//! and printed in their shortest form, so `2.0` prints as `2` and `-0.0`
//! prints as `0`. Stable output is what lets unchanged frames diff equal.

use std::fmt;

/// Round half towards +inf.
#[inline]
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Round to `decimals` places (0..=3 in practice).
#[inline]
pub fn round_to(x: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    round_half_up(x * scale) / scale
}

/// Display wrapper printing an already rounded number in shortest form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Num(pub f64);

impl Num {
    pub fn rounded(x: f64, decimals: u32) -> Self {
        Self(round_to(x, decimals))
    }
}

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0.0 || !self.0.is_finite() {
            return f.write_str("0");
        }
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_up() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_to(0.12345, 3), 0.123);
        assert_eq!(round_to(1.25, 1), 1.3);
    }

    #[test]
    fn prints_shortest_form() {
        assert_eq!(Num(2.0).to_string(), "2");
        assert_eq!(Num(-0.0).to_string(), "0");
        assert_eq!(Num::rounded(0.0949, 3).to_string(), "0.095");
        assert_eq!(Num::rounded(-1.04, 1).to_string(), "-1");
        assert_eq!(Num(f64::NAN).to_string(), "0");
    }
}
