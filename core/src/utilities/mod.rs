pub mod error;
pub use error::{KmeansError, Result};

pub mod kmeans;
pub use kmeans::{InitStrategy, Kmeans, KmeansOptions, Phase};

pub mod seed_search;
pub use seed_search::{Candidate, SeedSearch, SeedSource};

pub mod structs;
pub use structs::{Cluster, Node, Point, Region};

pub mod utilities;
pub use utilities::{is_finite_positive, mean_point, sqr_distance, sum_squared_error};
