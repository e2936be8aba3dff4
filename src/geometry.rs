use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Outline of a detected text region. Always holds at least three finite points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polygon(Vec<Point>);

impl Polygon {
    pub fn new(points: Vec<Point>) -> Result<Self, GeometryError> {
        if points.len() < 3 {
            return Err(GeometryError::DegeneratePolygon(points.len()));
        }
        if let Some(index) = points
            .iter()
            .position(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(GeometryError::NonFinite { index });
        }
        Ok(Self(points))
    }

    pub fn from_pairs(pairs: &[[f32; 2]]) -> Result<Self, GeometryError> {
        Self::new(pairs.iter().map(|[x, y]| Point::new(*x, *y)).collect())
    }

    pub fn points(&self) -> &[Point] {
        &self.0
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::from_polygon(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BoundingBox {
    /// Callers must pass `x_min <= x_max` and `y_min <= y_max`.
    pub fn new(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        debug_assert!(x_min <= x_max && y_min <= y_max);
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn from_polygon(polygon: &Polygon) -> Self {
        let mut points = polygon.points().iter();
        // Polygon::new guarantees at least three points.
        let first = points.next().copied().unwrap_or(Point::new(0.0, 0.0));
        let mut bbox = Self::new(first.x, first.y, first.x, first.y);
        for p in points {
            bbox.x_min = bbox.x_min.min(p.x);
            bbox.y_min = bbox.y_min.min(p.y);
            bbox.x_max = bbox.x_max.max(p.x);
            bbox.y_max = bbox.y_max.max(p.y);
        }
        bbox
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// Both axis projections overlap once each box is dilated by `threshold`.
    ///
    /// This is an AABB test, not a point distance: diagonally offset boxes
    /// whose corners are further apart than `threshold` can still count as
    /// close.
    pub fn is_close(&self, other: &Self, threshold: f32) -> bool {
        let horizontal =
            self.x_max + threshold >= other.x_min && other.x_max + threshold >= self.x_min;
        let vertical =
            self.y_max + threshold >= other.y_min && other.y_max + threshold >= self.y_min;
        horizontal && vertical
    }

    pub fn to_pixels(&self) -> PixelRect {
        PixelRect {
            x_min: self.x_min as i32,
            y_min: self.y_min as i32,
            x_max: self.x_max as i32,
            y_max: self.y_max as i32,
        }
    }
}

/// Integer pixel rectangle, truncated from a [`BoundingBox`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl PixelRect {
    /// Saturates at `i32::MAX` for boxes that span the whole `i32` range.
    pub fn width(&self) -> i32 {
        self.x_max.saturating_sub(self.x_min)
    }

    pub fn height(&self) -> i32 {
        self.y_max.saturating_sub(self.y_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> BoundingBox {
        BoundingBox::new(x0, y0, x1, y1)
    }

    #[test]
    fn polygon_rejects_fewer_than_three_points() {
        let err = Polygon::from_pairs(&[[0.0, 0.0], [1.0, 1.0]]).unwrap_err();
        assert_eq!(err, GeometryError::DegeneratePolygon(2));
    }

    #[test]
    fn polygon_rejects_nan() {
        let err = Polygon::from_pairs(&[[0.0, 0.0], [f32::NAN, 1.0], [2.0, 2.0]]).unwrap_err();
        assert_eq!(err, GeometryError::NonFinite { index: 1 });
    }

    #[test]
    fn bbox_of_rotated_quad() {
        let polygon =
            Polygon::from_pairs(&[[10.0, 0.0], [20.0, 10.0], [10.0, 20.0], [0.0, 10.0]]).unwrap();
        assert_eq!(polygon.bbox(), rect(0.0, 0.0, 20.0, 20.0));
    }

    #[test]
    fn union_is_order_independent() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(5.0, -3.0, 12.0, 4.0);
        let c = rect(-8.0, 6.0, 1.0, 30.0);
        assert_eq!(a.union(&b), b.union(&a));
        assert_eq!(a.union(&b).union(&c), a.union(&b.union(&c)));
        assert_eq!(a.union(&c).union(&b), c.union(&b).union(&a));
    }

    #[test]
    fn closeness_uses_dilated_projections() {
        let a = rect(0.0, 0.0, 50.0, 20.0);
        let b = rect(55.0, 0.0, 100.0, 20.0);
        assert!(a.is_close(&b, 5.0));
        assert!(!a.is_close(&b, 4.9));
        assert!(b.is_close(&a, 5.0));
    }

    #[test]
    fn closeness_accepts_diagonal_near_miss() {
        // corners are ~14.1px apart, still close under a 10px dilation
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(20.0, 20.0, 30.0, 30.0);
        assert!(a.is_close(&b, 10.0));
    }

    #[test]
    fn to_pixels_truncates() {
        let px = rect(1.9, 2.2, 10.7, 20.99).to_pixels();
        assert_eq!(
            px,
            PixelRect {
                x_min: 1,
                y_min: 2,
                x_max: 10,
                y_max: 20
            }
        );
        assert_eq!(px.width(), 9);
        assert_eq!(px.height(), 18);
    }

    #[test]
    fn out_of_range_coordinates_saturate() {
        let px = rect(-3e9, -1.0, 3e9, 5e9).to_pixels();
        assert_eq!((px.x_min, px.x_max), (i32::MIN, i32::MAX));
        assert_eq!(px.width(), i32::MAX);
        assert_eq!(px.height(), i32::MAX);
    }
}
