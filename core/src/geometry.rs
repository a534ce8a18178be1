//! Planar geometry shared by every world entity.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Cardinal facing directions available to world entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing x coordinates.
    Left,
    /// Movement toward increasing x coordinates.
    Right,
    /// Movement toward decreasing y coordinates.
    Up,
    /// Movement toward increasing y coordinates.
    Down,
}

impl Direction {
    /// Unit vector pointing along the direction in world space.
    #[must_use]
    pub const fn unit_vector(self) -> Vec2 {
        match self {
            Self::Left => Vec2::new(-1.0, 0.0),
            Self::Right => Vec2::new(1.0, 0.0),
            Self::Up => Vec2::new(0.0, -1.0),
            Self::Down => Vec2::new(0.0, 1.0),
        }
    }

    /// Direction obtained after a quarter turn clockwise.
    #[must_use]
    pub const fn rotated_right(self) -> Self {
        match self {
            Self::Down => Self::Left,
            Self::Left => Self::Up,
            Self::Up => Self::Right,
            Self::Right => Self::Down,
        }
    }

    /// Direction obtained after a quarter turn counter-clockwise.
    #[must_use]
    pub const fn rotated_left(self) -> Self {
        match self {
            Self::Down => Self::Right,
            Self::Right => Self::Up,
            Self::Up => Self::Left,
            Self::Left => Self::Down,
        }
    }
}

/// Axis-aligned rectangle expressed in world units.
///
/// The origin is the upper-left corner; `y` grows downward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl Rect {
    /// Creates a rectangle from its upper-left corner and dimensions.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle anchored at `position` with the provided `size`.
    #[must_use]
    pub const fn from_position_and_size(position: Vec2, size: Vec2) -> Self {
        Self::new(position.x, position.y, size.x, size.y)
    }

    /// Left edge.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Top edge.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Horizontal extent.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Vertical extent.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Upper-left corner.
    #[must_use]
    pub const fn top_left(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Lower-right corner.
    #[must_use]
    pub fn bottom_right(&self) -> Vec2 {
        Vec2::new(self.right(), self.bottom())
    }

    /// Dimensions as a vector.
    #[must_use]
    pub const fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Geometric center.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Returns a copy of the rectangle moved so its upper-left corner sits at `position`.
    #[must_use]
    pub const fn moved_to(self, position: Vec2) -> Self {
        Self::new(position.x, position.y, self.width, self.height)
    }

    /// Returns a copy of the rectangle grown by `margin` on every side.
    #[must_use]
    pub fn expanded(self, margin: f32) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    /// Reports whether the two rectangles overlap.
    ///
    /// Rectangles that merely share an edge do not intersect.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Reports whether `point` lies within the rectangle, far edges included.
    #[must_use]
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Clamps an upper-left `position` for something of `size` so that it stays inside the rectangle.
    ///
    /// When the object is larger than the rectangle the left and top edges win.
    #[must_use]
    pub fn clamp_position(&self, position: Vec2, size: Vec2) -> Vec2 {
        let x = position.x.min(self.right() - size.x).max(self.x);
        let y = position.y.min(self.bottom() - size.y).max(self.y);
        Vec2::new(x, y)
    }
}

/// Upper-left corner of a box of `size` whose center is `center`.
#[must_use]
pub fn position_from_center(center: Vec2, size: Vec2) -> Vec2 {
    center - size / 2.0
}

/// Reports whether `a` and `b` are within `distance` of each other on both axes.
#[must_use]
pub fn within_axis_distance(a: Vec2, b: Vec2, distance: f32) -> bool {
    (a.x - b.x).abs() <= distance && (a.y - b.y).abs() <= distance
}
