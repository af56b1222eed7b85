//! Errors raised while building a clustering engine.

use thiserror::Error;

use crate::utilities::structs::Point;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum KmeansError {
    /// K must satisfy `1 <= K <= number of points`.
    #[error("invalid cluster count: {clusters} clusters for {points} points")]
    InvalidClusterCount { clusters: usize, points: usize },

    #[error("threshold must be finite and positive, got {0}")]
    InvalidThreshold(f64),

    #[error("seed search needs at least one iteration, got {0}")]
    InvalidIterations(usize),

    /// Region center must be finite and every size component finite and non-negative.
    #[error("invalid seed region: center {center:?}, size {size:?}")]
    InvalidRegion { center: Point, size: Point },

    #[error("point {index} has a non-finite coordinate")]
    InvalidPoint { index: usize },
}

pub type Result<T> = std::result::Result<T, KmeansError>;
