//! Page geometry primitives.
//!
//! Coordinates are in points with the origin at the top-left corner of the
//! page; `y` grows downward.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle `(x0, y0, x1, y1)`.
///
/// Serialized as a four-element array, e.g. `[100, 130, 300, 145]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
    /// Left edge
    pub x0: f32,
    /// Top edge
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge
    pub y1: f32,
}

impl BBox {
    /// Create a rectangle from its edges.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Rectangle covering a whole page.
    pub fn page(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Center point `(x, y)`.
    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Closed-interval intersection test; touching edges count as overlap.
    pub fn intersects(&self, other: &BBox) -> bool {
        !(self.x1 < other.x0 || self.x0 > other.x1 || self.y1 < other.y0 || self.y0 > other.y1)
    }

    /// Whether a point lies inside the rectangle grown by `tolerance` on
    /// every side.
    pub fn contains_point(&self, x: f32, y: f32, tolerance: f32) -> bool {
        x >= self.x0 - tolerance
            && x <= self.x1 + tolerance
            && y >= self.y0 - tolerance
            && y <= self.y1 + tolerance
    }

    /// Copy moved by `(dx, dy)`.
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x0 + dx, self.y0 + dy, self.x1 + dx, self.y1 + dy)
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &BBox) -> Self {
        Self::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }
}

impl From<[f32; 4]> for BBox {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f32; 4] {
    fn from(b: BBox) -> Self {
        [b.x0, b.y0, b.x1, b.y1]
    }
}

/// RGB color with components in `0.0..=1.0`.
///
/// Serialized as a three-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }

    pub fn gray(level: f32) -> Self {
        Self::new(level, level, level)
    }

    /// Naive CMYK conversion, good enough for text colors.
    pub fn from_cmyk(c: f32, m: f32, y: f32, k: f32) -> Self {
        Self::new(
            (1.0 - c) * (1.0 - k),
            (1.0 - m) * (1.0 - k),
            (1.0 - y) * (1.0 - k),
        )
    }

    /// Components as 8-bit values.
    pub fn to_rgb8(&self) -> (u8, u8, u8) {
        let to_u8 = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        (to_u8(self.r), to_u8(self.g), to_u8(self.b))
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::BLACK
    }
}

impl From<[f32; 3]> for Rgb {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Rgb> for [f32; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersects_overlapping() {
        let a = BBox::new(0.0, 0.0, 100.0, 20.0);
        let b = BBox::new(10.0, 10.0, 110.0, 30.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_intersects_touching_edges() {
        let a = BBox::new(0.0, 0.0, 100.0, 20.0);
        let b = BBox::new(0.0, 20.0, 100.0, 40.0);
        assert!(a.intersects(&b));

        let c = BBox::new(0.0, 20.5, 100.0, 40.0);
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_translate_and_union() {
        let a = BBox::new(10.0, 10.0, 20.0, 20.0).translate(5.0, -5.0);
        assert_eq!(a, BBox::new(15.0, 5.0, 25.0, 15.0));

        let u = a.union(&BBox::new(0.0, 12.0, 16.0, 30.0));
        assert_eq!(u, BBox::new(0.0, 5.0, 25.0, 30.0));
    }

    #[test]
    fn test_bbox_serializes_as_array() {
        let json = serde_json::to_string(&BBox::new(100.0, 130.0, 300.0, 145.0)).unwrap();
        assert_eq!(json, "[100.0,130.0,300.0,145.0]");
        let back: BBox = serde_json::from_str("[100,130,300,145]").unwrap();
        assert_eq!(back.width(), 200.0);
    }

    #[test]
    fn test_rgb_conversions() {
        assert_eq!(Rgb::gray(1.0).to_rgb8(), (255, 255, 255));
        assert_eq!(Rgb::from_cmyk(0.0, 0.0, 0.0, 1.0), Rgb::BLACK);
        assert_eq!(Rgb::new(2.0, -1.0, 0.5).to_rgb8(), (255, 0, 128));
    }
}
