//! Fallback crosshair cursor, drawn into the captured image when the real
//! cursor bitmap cannot be duplicated.
//!
//! Two passes: a wide light outline so the marker stays visible on dark
//! content, then a thin black core on top.

use super::geometry::Point;

/// Half-length of a crosshair arm.
pub const ARM_LEN: i32 = 3;

/// Outline colour (RGB).
pub const OUTLINE_RGB: u32 = 0x00e0_e0e0;

/// Outline line width in pixels.
pub const OUTLINE_WIDTH: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pen {
    Outline,
    Core,
}

/// One straight line segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stroke {
    pub pen: Pen,
    pub from: Point,
    pub to: Point,
}

/// The four strokes of a crosshair centred on `at`, outline first.
pub fn crosshair(at: Point) -> [Stroke; 4] {
    let Point { x, y } = at;
    [
        Stroke {
            pen: Pen::Outline,
            from: Point::new(x - (ARM_LEN + 1), y),
            to: Point::new(x + (ARM_LEN + 2), y),
        },
        Stroke {
            pen: Pen::Outline,
            from: Point::new(x, y - (ARM_LEN + 1)),
            to: Point::new(x, y + (ARM_LEN + 2)),
        },
        Stroke {
            pen: Pen::Core,
            from: Point::new(x - ARM_LEN, y),
            to: Point::new(x + ARM_LEN, y),
        },
        Stroke {
            pen: Pen::Core,
            from: Point::new(x, y - ARM_LEN),
            to: Point::new(x, y + ARM_LEN),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crosshair_draws_outline_before_core() {
        let strokes = crosshair(Point::new(10, 20));
        assert_eq!(strokes[0].pen, Pen::Outline);
        assert_eq!(strokes[1].pen, Pen::Outline);
        assert_eq!(strokes[2].pen, Pen::Core);
        assert_eq!(strokes[3].pen, Pen::Core);
    }

    #[test]
    fn test_crosshair_outline_extends_past_core() {
        let strokes = crosshair(Point::new(10, 20));
        assert_eq!(strokes[0].from, Point::new(6, 20));
        assert_eq!(strokes[0].to, Point::new(15, 20));
        assert_eq!(strokes[2].from, Point::new(7, 20));
        assert_eq!(strokes[2].to, Point::new(13, 20));
        assert_eq!(strokes[3].from, Point::new(10, 17));
        assert_eq!(strokes[3].to, Point::new(10, 23));
    }
}
