//! Plain geometry value types shared by every other domain module.
//!
//! All coordinates are in the global display space: the origin is the
//! top-left corner of the root window and monitors are laid out around it.
//! Rectangles are half-open: `right()` and `bottom()` are exclusive.

/// A point in global display coordinates (may be negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component-wise sum.
    pub fn offset_by(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    /// Component-wise difference (`self - other`).
    pub fn minus(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

/// Width and height of a rectangle or surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    /// Creates a size, clamping negative components to zero.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width: width.max(0),
            height: height.max(0),
        }
    }
}

/// An axis-aligned rectangle.
///
/// Invariant: `width >= 0 && height >= 0`.  [`Rect::new`] enforces it by
/// clamping; code that builds a `Rect` literal is expected to do the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Creates a rectangle, clamping a negative width or height to zero.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: width.max(0),
            height: height.max(0),
        }
    }

    /// Builds a rectangle from its top-left corner and a size.
    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Returns the rightmost X coordinate (exclusive).
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Returns the bottommost Y coordinate (exclusive).
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Area in square pixels.  Widened to `i64` so that large virtual
    /// desktops cannot overflow.
    pub fn area(&self) -> i64 {
        i64::from(self.width) * i64::from(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` if `p` lies inside the rectangle.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Returns the overlapping part of `self` and `other`, or `None` when the
    /// two rectangles do not share any pixel.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right > x && bottom > y {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Returns `true` if this rectangle overlaps with `other`.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersection(other).is_some()
    }

    /// Area of the overlap with `other`, zero when disjoint.
    pub fn intersection_area(&self, other: &Rect) -> i64 {
        self.intersection(other).map_or(0, |r| r.area())
    }

    /// Translates a global point into coordinates relative to this rectangle.
    pub fn to_local(&self, p: Point) -> Point {
        p.minus(self.origin())
    }
}

/// Where the pointer is relative to the source region.
///
/// `Outside` is the sentinel used whenever the pointer is not over the
/// region; `Inside` carries region-relative coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CursorPosition {
    #[default]
    Outside,
    Inside(Point),
}

impl CursorPosition {
    /// Classifies a global pointer position against `region`.
    pub fn locate(region: &Rect, global: Point) -> Self {
        if region.contains(global) {
            CursorPosition::Inside(region.to_local(global))
        } else {
            CursorPosition::Outside
        }
    }

    pub fn is_inside(&self) -> bool {
        matches!(self, CursorPosition::Inside(_))
    }

    pub fn point(&self) -> Option<Point> {
        match self {
            CursorPosition::Inside(p) => Some(*p),
            CursorPosition::Outside => None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_new_clamps_negative_dimensions_to_zero() {
        let r = Rect::new(10, 10, -5, -1);
        assert_eq!(r.width, 0);
        assert_eq!(r.height, 0);
        assert!(r.is_empty());
    }

    #[test]
    fn test_rect_right_and_bottom_are_exclusive() {
        let r = Rect::new(1920, 0, 800, 600);
        assert_eq!(r.right(), 2720);
        assert_eq!(r.bottom(), 600);
        assert!(r.contains(Point::new(2719, 599)));
        assert!(!r.contains(Point::new(2720, 0)));
        assert!(!r.contains(Point::new(1920, 600)));
    }

    #[test]
    fn test_intersection_of_overlapping_rects_is_shared_area() {
        // Arrange
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(50, 25, 100, 100);

        // Act
        let i = a.intersection(&b);

        // Assert
        assert_eq!(i, Some(Rect::new(50, 25, 50, 75)));
        assert_eq!(a.intersection_area(&b), 50 * 75);
    }

    #[test]
    fn test_intersection_of_adjacent_rects_is_none() {
        let left = Rect::new(0, 0, 1920, 1080);
        let right = Rect::new(1920, 0, 800, 600);
        assert_eq!(left.intersection(&right), None);
        assert!(!left.intersects(&right));
        assert_eq!(left.intersection_area(&right), 0);
    }

    #[test]
    fn test_area_does_not_overflow_for_large_rects() {
        let r = Rect::new(0, 0, i32::MAX, 4);
        assert_eq!(r.area(), i64::from(i32::MAX) * 4);
    }

    #[test]
    fn test_cursor_position_locate_returns_region_relative_point() {
        let region = Rect::new(100, 200, 50, 50);
        assert_eq!(
            CursorPosition::locate(&region, Point::new(110, 230)),
            CursorPosition::Inside(Point::new(10, 30))
        );
        assert_eq!(
            CursorPosition::locate(&region, Point::new(99, 230)),
            CursorPosition::Outside
        );
    }
}
