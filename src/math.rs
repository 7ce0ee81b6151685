use serde::Deserialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Point2 {
    pub x: i32,
    pub y: i32,
}

impl Point2 {
    pub const ORIGIN: Point2 = Point2 { x: 0, y: 0 };
    pub const fn new(x: i32, y: i32) -> Self {
        Point2 { x, y }
    }
}

impl From<(i32, i32)> for Point2 {
    fn from(value: (i32, i32)) -> Self {
        Point2::new(value.0, value.1)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Extent2 {
    pub width: usize,
    pub height: usize,
}

impl Extent2 {
    pub const fn new(width: usize, height: usize) -> Self {
        Extent2 { width, height }
    }
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

impl From<(usize, usize)> for Extent2 {
    fn from(value: (usize, usize)) -> Self {
        Extent2::new(value.0, value.1)
    }
}

/// Half-open integer rectangle on the image plane, `[min, max)` on both axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Bounds2 {
    pub min: Point2,
    pub max: Point2,
}

impl Bounds2 {
    pub const fn new(min: Point2, max: Point2) -> Self {
        Bounds2 { min, max }
    }

    pub fn from_origin_extent(origin: Point2, extent: Extent2) -> Self {
        Bounds2::new(
            origin,
            Point2::new(
                origin.x + extent.width as i32,
                origin.y + extent.height as i32,
            ),
        )
    }

    pub fn extent(&self) -> Extent2 {
        Extent2::new(
            (self.max.x - self.min.x).max(0) as usize,
            (self.max.y - self.min.y).max(0) as usize,
        )
    }

    pub fn contains(&self, p: Point2) -> bool {
        self.min.x <= p.x && p.x < self.max.x && self.min.y <= p.y && p.y < self.max.y
    }

    /// Whether `other` lies entirely inside `self`.
    pub fn encloses(&self, other: &Bounds2) -> bool {
        self.min.x <= other.min.x
            && other.max.x <= self.max.x
            && self.min.y <= other.min.y
            && other.max.y <= self.max.y
    }

    pub fn intersection(&self, other: &Bounds2) -> Self {
        Bounds2::new(
            Point2::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y)),
            Point2::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y)),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y
    }
}
