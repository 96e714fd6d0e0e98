//! `RenderPath`: fill rule plus polygon loops.

use crate::geometry::{winding_number_polygons, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RenderPath {
    pub fill_rule: FillRule,
    pub loops: Vec<Vec<Vec2>>,
}

impl RenderPath {
    pub fn new(fill_rule: FillRule, loops: Vec<Vec<Vec2>>) -> Self {
        RenderPath { fill_rule, loops }
    }

    /// Whether `point` lies inside this path under its fill rule.
    pub fn contains_point(&self, point: Vec2) -> bool {
        let winding = winding_number(&self.loops, point);
        match self.fill_rule {
            FillRule::NonZero => winding != 0,
            FillRule::EvenOdd => winding % 2 != 0,
        }
    }

    /// Whether this path's loop list is empty (the `PathBoolean` simplification
    /// target for "trivially empty path").
    pub fn is_trivially_empty(&self) -> bool {
        self.loops.is_empty() || self.loops.iter().all(|l| l.len() < 3)
    }
}

fn winding_number(loops: &[Vec<Vec2>], point: Vec2) -> i32 {
    winding_number_polygons(loops, point)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Vec2> {
        vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)]
    }

    #[test]
    fn nonzero_contains_interior_point() {
        let path = RenderPath::new(FillRule::NonZero, vec![square()]);
        assert!(path.contains_point(Vec2::new(0.5, 0.5)));
        assert!(!path.contains_point(Vec2::new(2.0, 2.0)));
    }

    #[test]
    fn empty_path_is_trivially_empty() {
        assert!(RenderPath::new(FillRule::NonZero, vec![]).is_trivially_empty());
    }
}
