//! Integer geometry shared by the layer model and the compositor.
//!
//! Rectangles use inclusive right/bottom edges: a rect at `(x, y)` with
//! size `(w, h)` covers columns `x..=x + w - 1`.

use egui::{Pos2, Vec2};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct IPoint {
    pub x: i32,
    pub y: i32,
}

impl IPoint {
    pub const ZERO: IPoint = IPoint { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_pos2(self) -> Pos2 {
        Pos2::new(self.x as f32, self.y as f32)
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }
}

impl std::ops::Add for IPoint {
    type Output = IPoint;
    fn add(self, rhs: IPoint) -> IPoint {
        IPoint::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for IPoint {
    type Output = IPoint;
    fn sub(self, rhs: IPoint) -> IPoint {
        IPoint::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct ISize {
    pub width: i32,
    pub height: i32,
}

impl ISize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct IRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl IRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn from_point_size(top_left: IPoint, size: ISize) -> Self {
        Self::new(top_left.x, top_left.y, size.width, size.height)
    }

    /// Rect spanning both corners, both included.
    pub fn from_corners(a: IPoint, b: IPoint) -> Self {
        let (l, r) = (a.x.min(b.x), a.x.max(b.x));
        let (t, bm) = (a.y.min(b.y), a.y.max(b.y));
        Self::new(l, t, r - l + 1, bm - t + 1)
    }

    pub const fn left(&self) -> i32 {
        self.x
    }

    pub const fn top(&self) -> i32 {
        self.y
    }

    pub const fn right(&self) -> i32 {
        self.x + self.width - 1
    }

    pub const fn bottom(&self) -> i32 {
        self.y + self.height - 1
    }

    pub const fn top_left(&self) -> IPoint {
        IPoint::new(self.left(), self.top())
    }

    pub const fn top_right(&self) -> IPoint {
        IPoint::new(self.right(), self.top())
    }

    pub const fn bottom_left(&self) -> IPoint {
        IPoint::new(self.left(), self.bottom())
    }

    pub const fn bottom_right(&self) -> IPoint {
        IPoint::new(self.right(), self.bottom())
    }

    pub const fn size(&self) -> ISize {
        ISize::new(self.width, self.height)
    }

    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Integer centre, truncating toward zero.
    pub fn center(&self) -> IPoint {
        let cx = (self.left() as i64 + self.right() as i64) / 2;
        let cy = (self.top() as i64 + self.bottom() as i64) / 2;
        IPoint::new(cx as i32, cy as i32)
    }

    pub fn contains(&self, p: IPoint) -> bool {
        !self.is_empty()
            && p.x >= self.left()
            && p.x <= self.right()
            && p.y >= self.top()
            && p.y <= self.bottom()
    }

    /// Overlap of two rects; the zero rect when they do not overlap.
    pub fn intersected(&self, other: &IRect) -> IRect {
        if self.is_empty() || other.is_empty() {
            return IRect::default();
        }
        let l = self.left().max(other.left());
        let r = self.right().min(other.right());
        let t = self.top().max(other.top());
        let b = self.bottom().min(other.bottom());
        if l > r || t > b {
            return IRect::default();
        }
        IRect::new(l, t, r - l + 1, b - t + 1)
    }
}

pub fn floor_i32(v: f32) -> i32 {
    v.floor() as i32
}

pub fn ceil_i32(v: f32) -> i32 {
    v.ceil() as i32
}

/// Rounds half away from zero.
pub fn round_i32(v: f32) -> i32 {
    v.round() as i32
}

pub fn round_point(p: Pos2) -> IPoint {
    IPoint::new(round_i32(p.x), round_i32(p.y))
}

/// Counter-clockwise rotation around the z axis in a y-up frame.
///
/// Quarter turns use exact sine/cosine values so that 90 and 180 degree
/// merges map pixel centres onto pixel centres.
pub fn rotate_degrees(v: Vec2, degrees: f32) -> Vec2 {
    let (s, c) = if degrees == 90.0 || degrees == -270.0 {
        (1.0, 0.0)
    } else if degrees == -90.0 || degrees == 270.0 {
        (-1.0, 0.0)
    } else if degrees == 180.0 || degrees == -180.0 {
        (0.0, -1.0)
    } else {
        degrees.to_radians().sin_cos()
    };
    Vec2::new(c * v.x - s * v.y, s * v.x + c * v.y)
}

/// Odd-even fill rule containment test.
pub fn point_in_polygon(points: &[Pos2], p: Pos2) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        if ((points[i].y > p.y) != (points[j].y > p.y))
            && (p.x
                < (points[j].x - points[i].x) * (p.y - points[i].y) / (points[j].y - points[i].y)
                    + points[i].x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
