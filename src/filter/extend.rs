//! Image extend (wrap) modes.

/// Behavior of image sampling outside the `[0, size)` domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtendMode {
    /// Clamp to the edge sample.
    Pad,
    /// Repeat the pattern with period `size`.
    Repeat,
    /// Mirror-repeat with period `2 * size`.
    Reflect,
}

/// Extends a real-valued coordinate `t` (normally in `[0, 1]`) according to `mode`.
///
/// Agrees with [`extend_integer`] at integer boundaries: `extend(i as f64, mode)`
/// for `size = 1` matches `extend_integer(i, 1, mode) as f64`.
pub fn extend(t: f64, mode: ExtendMode) -> f64 {
    match mode {
        ExtendMode::Pad => t.clamp(0.0, 1.0),
        ExtendMode::Repeat => t.rem_euclid(1.0),
        ExtendMode::Reflect => {
            let m = t.rem_euclid(2.0);
            if m <= 1.0 {
                m
            } else {
                2.0 - m
            }
        }
    }
}

/// Extends an integer pixel index `i` into `[0, size)` according to `mode`.
///
/// For `size=4`:
/// - `Pad`:    `… 0,0,0,0 | 0,1,2,3 | 3,3,3,3 …`
/// - `Repeat`: `… 2,3 | 0,1,2,3 | 0,1,2,3 | 0 …`
/// - `Reflect`: `… 2,3,3,2,1,0 | 0,1,2,3,3,2,1,0 | 0,1 …`
pub fn extend_integer(i: i64, size: u32, mode: ExtendMode) -> u32 {
    let size = size as i64;
    debug_assert!(size > 0);
    match mode {
        ExtendMode::Pad => i.clamp(0, size - 1) as u32,
        ExtendMode::Repeat => i.rem_euclid(size) as u32,
        ExtendMode::Reflect => {
            let period = 2 * size;
            let m = i.rem_euclid(period);
            if m < size {
                m as u32
            } else {
                (period - 1 - m) as u32
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_matches_literal_pattern() {
        // k*size + r -> r, for all k in Z, r in [0, size)
        for k in -3..3i64 {
            for r in 0..4u32 {
                let i = k * 4 + r as i64;
                assert_eq!(extend_integer(i, 4, ExtendMode::Repeat), r);
            }
        }
    }

    #[test]
    fn pad_matches_literal_pattern() {
        let expected: Vec<u32> = vec![0, 0, 0, 0, 0, 1, 2, 3, 3, 3, 3];
        let got: Vec<u32> = (-5..6).map(|i| extend_integer(i, 4, ExtendMode::Pad)).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn reflect_matches_literal_pattern() {
        // one full period (8 long) of: 0,1,2,3,3,2,1,0
        let got: Vec<u32> = (0..8).map(|i| extend_integer(i, 4, ExtendMode::Reflect)).collect();
        assert_eq!(got, vec![0, 1, 2, 3, 3, 2, 1, 0]);

        // negative indices mirror the same way
        let got_neg: Vec<u32> = (-8..0).map(|i| extend_integer(i, 4, ExtendMode::Reflect)).collect();
        assert_eq!(got_neg, vec![0, 1, 2, 3, 3, 2, 1, 0]);
    }
}
