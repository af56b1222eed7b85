use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Sub};

use crate::utilities::utilities::sqr_distance;

/// A coordinate in 3D space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    #[inline]
    pub fn sqr_distance(&self, other: &Point) -> f64 {
        sqr_distance(self, other)
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Div<f64> for Point {
    type Output = Point;

    fn div(self, rhs: f64) -> Point {
        Point::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl From<[f64; 3]> for Point {
    fn from(v: [f64; 3]) -> Self {
        Point::new(v[0], v[1], v[2])
    }
}

impl From<(f64, f64, f64)> for Point {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Point::new(x, y, z)
    }
}

/// Read-only view of one cluster, copied out of the engine.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    id: usize,
    centroid: Point,
}

impl Cluster {
    pub fn new(id: usize, centroid: Point) -> Self {
        Self { id, centroid }
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    #[inline]
    pub fn centroid(&self) -> Point {
        self.centroid
    }
}

/// A point together with the cluster it belonged to when the snapshot was taken.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    point: Point,
    cluster: Cluster,
}

impl Node {
    pub fn new(point: Point, cluster: Cluster) -> Self {
        Self { point, cluster }
    }

    #[inline]
    pub fn point(&self) -> Point {
        self.point
    }

    #[inline]
    pub fn cluster(&self) -> Cluster {
        self.cluster
    }
}

/// Axis-aligned box used to draw seed centroids.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub center: Point,
    pub size: Point,
}

impl Region {
    pub fn new(center: Point, size: Point) -> Self {
        Self { center, size }
    }

    /// Corners of the box seeds are drawn from. x and z reach the full
    /// half-extent from the center, y only half of it.
    pub fn sample_bounds(&self) -> (Point, Point) {
        let c = self.center;
        let half = self.size / 2.0;
        let reach = Point::new(half.x, half.y / 2.0, half.z);
        (c - reach, c + reach)
    }

    pub fn is_valid(&self) -> bool {
        if !(self.center.is_finite()
            && self.size.is_finite()
            && self.size.x >= 0.0
            && self.size.y >= 0.0
            && self.size.z >= 0.0)
        {
            return false;
        }
        let (lo, hi) = self.sample_bounds();
        lo.is_finite() && hi.is_finite()
    }
}
