//! Shapes and coordinates used by `inside` and area mappings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::Point;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Shape {
    Default,
    Rect,
    Circle,
    Poly,
    Ellipse,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordsError {
    #[error("A {shape} needs {expected} coordinates, found {found}")]
    WrongCount {
        shape: Shape,
        expected: &'static str,
        found: usize,
    },
    #[error("A poly must have at least 3 points and an even number of coordinates, found {0}")]
    Polygon(usize),
}

/// A shape together with the coordinate list that locates it.
///
/// Coordinates follow the QTI/HTML image-map conventions:
/// - rect: left-x, top-y, right-x, bottom-y
/// - circle: center-x, center-y, radius
/// - poly: x1, y1, x2, y2, ..., xN, yN (the polygon is closed implicitly)
/// - ellipse: center-x, center-y, h-radius, v-radius
/// - default: no coordinates, covers everything
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoords", into = "RawCoords")]
pub struct Coords {
    shape: Shape,
    values: Vec<i64>,
}

#[derive(Serialize, Deserialize)]
struct RawCoords {
    shape: Shape,
    #[serde(default)]
    coords: Vec<i64>,
}

impl TryFrom<RawCoords> for Coords {
    type Error = CoordsError;

    fn try_from(raw: RawCoords) -> Result<Self, Self::Error> {
        Coords::new(raw.shape, raw.coords)
    }
}

impl From<Coords> for RawCoords {
    fn from(coords: Coords) -> Self {
        RawCoords {
            shape: coords.shape,
            coords: coords.values,
        }
    }
}

impl Coords {
    pub fn new(shape: Shape, values: Vec<i64>) -> Result<Self, CoordsError> {
        let found = values.len();
        let wrong = |expected| CoordsError::WrongCount {
            shape,
            expected,
            found,
        };
        match shape {
            Shape::Default if found != 0 => return Err(wrong("0")),
            Shape::Rect | Shape::Ellipse if found != 4 => return Err(wrong("4")),
            Shape::Circle if found != 3 => return Err(wrong("3")),
            Shape::Poly if found < 6 || found % 2 != 0 => return Err(CoordsError::Polygon(found)),
            _ => {}
        }
        Ok(Self { shape, values })
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// Points on the boundary are inside.
    pub fn contains(&self, point: Point) -> bool {
        let (x, y) = (point.x as f64, point.y as f64);
        let c: Vec<f64> = self.values.iter().map(|v| *v as f64).collect();
        match self.shape {
            Shape::Default => true,
            Shape::Rect => {
                let (left, right) = (c[0].min(c[2]), c[0].max(c[2]));
                let (top, bottom) = (c[1].min(c[3]), c[1].max(c[3]));
                x >= left && x <= right && y >= top && y <= bottom
            }
            Shape::Circle => {
                let (dx, dy) = (x - c[0], y - c[1]);
                dx * dx + dy * dy <= c[2] * c[2]
            }
            Shape::Ellipse => {
                let (hr, vr) = (c[2], c[3]);
                if hr == 0.0 || vr == 0.0 {
                    return false;
                }
                let (dx, dy) = ((x - c[0]) / hr, (y - c[1]) / vr);
                dx * dx + dy * dy <= 1.0
            }
            Shape::Poly => polygon_contains(&c, x, y),
        }
    }
}

fn polygon_contains(c: &[f64], x: f64, y: f64) -> bool {
    let vertices: Vec<(f64, f64)> = c.chunks_exact(2).map(|p| (p[0], p[1])).collect();
    let n = vertices.len();

    for i in 0..n {
        let (x1, y1) = vertices[i];
        let (x2, y2) = vertices[(i + 1) % n];
        let cross = (x2 - x1) * (y - y1) - (y2 - y1) * (x - x1);
        let within = x >= x1.min(x2) && x <= x1.max(x2) && y >= y1.min(y2) && y <= y1.max(y2);
        if cross == 0.0 && within {
            return true;
        }
    }

    // even-odd ray casting
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = vertices[i];
        let (xj, yj) = vertices[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect() {
        let rect = Coords::new(Shape::Rect, vec![0, 0, 10, 20]).unwrap();
        assert!(rect.contains(Point::new(5, 5)));
        assert!(rect.contains(Point::new(10, 20)));
        assert!(!rect.contains(Point::new(11, 5)));
    }

    #[test]
    fn test_circle_and_ellipse() {
        let circle = Coords::new(Shape::Circle, vec![5, 5, 5]).unwrap();
        assert!(circle.contains(Point::new(5, 10)));
        assert!(!circle.contains(Point::new(9, 9)));

        let ellipse = Coords::new(Shape::Ellipse, vec![0, 0, 10, 2]).unwrap();
        assert!(ellipse.contains(Point::new(9, 0)));
        assert!(!ellipse.contains(Point::new(0, 3)));
    }

    #[test]
    fn test_poly() {
        let triangle = Coords::new(Shape::Poly, vec![0, 0, 10, 0, 0, 10]).unwrap();
        assert!(triangle.contains(Point::new(2, 2)));
        assert!(triangle.contains(Point::new(5, 5)));
        assert!(!triangle.contains(Point::new(8, 8)));
    }

    #[test]
    fn test_default_covers_everything() {
        let default = Coords::new(Shape::Default, vec![]).unwrap();
        assert!(default.contains(Point::new(-1000, 42)));
    }

    #[test]
    fn test_malformed_coords() {
        assert!(Coords::new(Shape::Circle, vec![1, 2]).is_err());
        assert!(Coords::new(Shape::Poly, vec![0, 0, 1, 1]).is_err());
        assert!(Coords::new(Shape::Poly, vec![0, 0, 1, 1, 2]).is_err());
    }
}
