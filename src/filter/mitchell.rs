//! Mitchell-Netravali (B=C=1/3) separable cubic reconstruction filter.

use super::{green_line_integral, Filter};
use crate::face::ClippableFace;

// Standard 2-piece cubic with B = C = 1/3, see Mitchell & Netravali 1988.
const K0_A3: f64 = 7.0 / 6.0;
const K0_A2: f64 = -2.0;
const K0_A0: f64 = 8.0 / 9.0;

const K1_A3: f64 = -7.0 / 18.0;
const K1_A2: f64 = 2.0;
const K1_A1: f64 = -10.0 / 3.0;
const K1_A0: f64 = 16.0 / 9.0;

/// Separable Mitchell-Netravali cubic, `B = C = 1/3`.
#[derive(Debug, Clone, Copy)]
pub struct Mitchell {
    pub scale: f64,
}

impl Mitchell {
    pub fn new(scale: f64) -> Self {
        Mitchell { scale }
    }

    fn kernel_0to2(u: f64) -> f64 {
        if u < 1.0 {
            ((K0_A3 * u + K0_A2) * u) * u + K0_A0
        } else if u < 2.0 {
            (((K1_A3 * u + K1_A2) * u) + K1_A1) * u + K1_A0
        } else {
            0.0
        }
    }

    /// Cumulative integral `R(u) = ∫_0^u k(s) ds` for `u >= 0`.
    fn cumulative_0to2(u: f64) -> f64 {
        if u <= 0.0 {
            0.0
        } else if u < 1.0 {
            (7.0 / 24.0) * u.powi(4) - (2.0 / 3.0) * u.powi(3) + (8.0 / 9.0) * u
        } else if u < 2.0 {
            let g1 = (-7.0 / 72.0) * u.powi(4) + (2.0 / 3.0) * u.powi(3) - (5.0 / 3.0) * u.powi(2) + (16.0 / 9.0) * u;
            g1 - 1.0 / 6.0
        } else {
            0.5
        }
    }

    #[inline]
    fn kernel_1d(&self, t: f64) -> f64 {
        Self::kernel_0to2((t / self.scale).abs()) / self.scale
    }

    /// Antiderivative from `-infinity` to `t` of the scaled kernel.
    #[inline]
    fn antideriv_1d(&self, t: f64) -> f64 {
        let u = t / self.scale;
        0.5 + u.signum() * Self::cumulative_0to2(u.abs())
    }
}

impl Filter for Mitchell {
    fn min_expand(&self) -> f64 {
        2.0 * self.scale
    }
    fn max_expand(&self) -> f64 {
        2.0 * self.scale
    }
    fn bounds_shift(&self) -> f64 {
        0.0
    }

    fn evaluate_full(&self, x: f64, y: f64, px: f64, py: f64) -> f64 {
        let fx = self.antideriv_1d(px + 1.0 - x) - self.antideriv_1d(px - x);
        let fy = self.antideriv_1d(py + 1.0 - y) - self.antideriv_1d(py - y);
        fx * fy
    }

    fn evaluate_clipped(&self, face: &dyn ClippableFace, x: f64, y: f64, px: f64, py: f64, _area: f64) -> f64 {
        green_line_integral(face, x, y, px, py, |t| self.antideriv_1d(t), |t| self.kernel_1d(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_matches_known_mitchell_value() {
        let f = Mitchell::new(1.0);
        assert!((f.kernel_1d(0.0) - 8.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn support_vanishes_at_two() {
        let f = Mitchell::new(1.0);
        assert!(f.kernel_1d(2.0).abs() < 1e-9);
        assert!(f.kernel_1d(2.5).abs() < 1e-12);
    }

    #[test]
    fn cumulative_integral_reaches_half_mass_at_support_edge() {
        assert!((Mitchell::cumulative_0to2(2.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn antiderivative_saturates_to_zero_and_one() {
        let f = Mitchell::new(1.0);
        assert!((f.antideriv_1d(10.0) - 1.0).abs() < 1e-9);
        assert!((f.antideriv_1d(-10.0) - 0.0).abs() < 1e-9);
    }
}
