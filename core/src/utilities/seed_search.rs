use rand::Rng;
use rand::seq::index;
use serde::Serialize;

use crate::utilities::structs::{Point, Region};

/// Where the K starting centroids of one search iteration come from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SeedSource {
    /// K distinct input points.
    Points,
    /// K independent draws inside a box.
    Region(Region),
}

impl SeedSource {
    pub fn draw<R: Rng>(&self, rng: &mut R, points: &[Point], clusters: usize) -> Vec<Point> {
        match self {
            SeedSource::Points => sample_points(rng, points.len(), clusters)
                .into_iter()
                .map(|i| points[i])
                .collect(),
            SeedSource::Region(region) => {
                (0..clusters).map(|_| sample_region(rng, region)).collect()
            }
        }
    }
}

/// `k` distinct indices in `0..n`, in draw order. Requires `k <= n`.
pub fn sample_points<R: Rng>(rng: &mut R, n: usize, k: usize) -> Vec<usize> {
    index::sample(rng, n, k).into_vec()
}

/// One uniform draw from `region`.
///
/// The box is not the region itself: x and z span the full half-extent on
/// both sides of the center, y only half of it.
/// Callers must pass a region for which [`Region::is_valid`] holds.
pub fn sample_region<R: Rng>(rng: &mut R, region: &Region) -> Point {
    let (lo, hi) = region.sample_bounds();
    Point::new(
        rng.gen_range(lo.x..=hi.x),
        rng.gen_range(lo.y..=hi.y),
        rng.gen_range(lo.z..=hi.z),
    )
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Candidate {
    pub sse: f64,
    pub centroids: Vec<Point>,
}

/// Every configuration a seed search tried, in draw order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SeedSearch {
    candidates: Vec<Candidate>,
}

impl SeedSearch {
    pub fn with_capacity(iterations: usize) -> Self {
        Self {
            candidates: Vec::with_capacity(iterations),
        }
    }

    pub fn push(&mut self, sse: f64, centroids: Vec<Point>) {
        self.candidates.push(Candidate { sse, centroids });
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Index of the adopted candidate: the lowest SSE, earliest on ties.
    pub fn chosen(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, c) in self.candidates.iter().enumerate() {
            match best {
                None => best = Some(i),
                Some(b) => {
                    if c.sse < self.candidates[b].sse {
                        best = Some(i);
                    }
                }
            }
        }
        best
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.chosen().map(|i| &self.candidates[i])
    }
}
