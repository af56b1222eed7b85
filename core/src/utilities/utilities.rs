use crate::utilities::structs::Point;

#[inline]
pub fn is_finite_positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

#[inline]
pub fn sqr_distance(a: &Point, b: &Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    dx * dx + dy * dy + dz * dz
}

/// Arithmetic mean of `points`, `None` when there is nothing to average.
pub fn mean_point<'a, I>(points: I) -> Option<Point>
where
    I: IntoIterator<Item = &'a Point>,
{
    let mut sum = Point::zero();
    let mut n = 0usize;
    for p in points {
        sum = sum + *p;
        n += 1;
    }
    if n == 0 { None } else { Some(sum / n as f64) }
}

/// Sum of squared distances between each point and the centroid it is paired with.
pub fn sum_squared_error<'a, I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (&'a Point, &'a Point)>,
{
    let mut s = 0.0;
    for (p, c) in pairs {
        s += sqr_distance(p, c);
    }
    s
}
