use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use crate::utilities::error::{KmeansError, Result};
use crate::utilities::seed_search::{SeedSearch, SeedSource};
use crate::utilities::structs::{Cluster, Node, Point, Region};
use crate::utilities::utilities::{is_finite_positive, mean_point, sqr_distance, sum_squared_error};

/// Half-steps in a row that must report no change before the engine stops.
const GRACE_STEPS: i32 = 2;

/// How the starting centroids are chosen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InitStrategy {
    /// Spread the points over the clusters at random and start from the means.
    RandomPartition,
    /// Try `iterations` sets of K distinct input points, keep the lowest SSE.
    RandomSeedSearch { iterations: usize },
    /// Try `iterations` sets of K points drawn inside `region`, keep the lowest SSE.
    RandomRegionSearch { iterations: usize, region: Region },
}

#[derive(Clone, Copy, Debug)]
pub struct KmeansOptions {
    /// A centroid moving less than this counts as settled.
    pub threshold: f64,
    pub strategy: InitStrategy,
    /// Fixed seed for the initialization draws. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for KmeansOptions {
    fn default() -> Self {
        Self {
            threshold: 1e-3,
            strategy: InitStrategy::RandomPartition,
            seed: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Reassignment,
    CentroidUpdate,
}

impl Phase {
    #[inline]
    fn flip(self) -> Self {
        match self {
            Phase::Reassignment => Phase::CentroidUpdate,
            Phase::CentroidUpdate => Phase::Reassignment,
        }
    }
}

#[derive(Clone, Debug)]
struct InternalNode {
    point: Point,
    cluster_id: usize,
}

#[derive(Clone, Debug)]
struct InternalCluster {
    id: usize,
    centroid: Point,
}

impl InternalCluster {
    #[inline]
    fn snapshot(&self) -> Cluster {
        Cluster::new(self.id, self.centroid)
    }
}

/// Lloyd's K-means over 3D points, advanced one half-step at a time.
///
/// Each call to [`Kmeans::step_calculate`] runs either a reassignment pass
/// or a centroid update pass, alternating. The engine reports finished once
/// one pass of each kind in a row has changed nothing.
#[derive(Clone, Debug)]
pub struct Kmeans {
    nodes: Vec<InternalNode>,
    clusters: Vec<InternalCluster>,
    threshold: f64,
    next_phase: Phase,
    remaining: i32,
    steps: usize,
    seed_search: Option<SeedSearch>,
}

impl Kmeans {
    /// Builds the engine and runs the chosen initialization.
    ///
    /// Fails when `clusters` is zero or exceeds the number of points, when
    /// the threshold or iteration count is not positive, when the region is
    /// malformed, or when a point has a non-finite coordinate.
    pub fn new(points: &[Point], clusters: usize, options: Option<KmeansOptions>) -> Result<Self> {
        let opts = options.unwrap_or_default();
        let mut rng = match opts.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(points, clusters, opts, &mut rng)
    }

    /// Same as [`Kmeans::new`] but draws from `rng`; `options.seed` is ignored.
    pub fn with_rng<R: Rng>(
        points: &[Point],
        clusters: usize,
        options: KmeansOptions,
        rng: &mut R,
    ) -> Result<Self> {
        validate(points, clusters, &options)?;

        let mut km = Kmeans {
            nodes: points
                .iter()
                .map(|&point| InternalNode {
                    point,
                    cluster_id: 0,
                })
                .collect(),
            clusters: (0..clusters)
                .map(|id| InternalCluster {
                    id,
                    centroid: Point::zero(),
                })
                .collect(),
            threshold: options.threshold,
            next_phase: Phase::CentroidUpdate,
            remaining: GRACE_STEPS,
            steps: 0,
            seed_search: None,
        };

        debug!(
            points = points.len(),
            clusters,
            threshold = options.threshold,
            strategy = ?options.strategy,
            "initializing kmeans"
        );

        match options.strategy {
            InitStrategy::RandomPartition => km.init_random_partition(rng),
            InitStrategy::RandomSeedSearch { iterations } => {
                km.init_seed_search(rng, iterations, SeedSource::Points)
            }
            InitStrategy::RandomRegionSearch { iterations, region } => {
                km.init_seed_search(rng, iterations, SeedSource::Region(region))
            }
        }
        Ok(km)
    }

    /// Runs steps until the engine reports finished.
    pub fn calculate(&mut self) {
        while !self.step_calculate() {}
    }

    /// Runs one half-step and returns whether the engine is now finished.
    /// A no-op once finished.
    pub fn step_calculate(&mut self) -> bool {
        if self.finished() {
            return true;
        }

        self.remaining -= 1;
        let phase = self.next_phase;
        self.next_phase = phase.flip();
        self.steps += 1;

        let changed = match phase {
            Phase::Reassignment => self.calculate_clustering(),
            Phase::CentroidUpdate => self.calculate_centroid(),
        };
        if changed {
            self.remaining += 1;
        }

        trace!(
            step = self.steps,
            ?phase,
            changed,
            remaining = self.remaining,
            "kmeans half-step"
        );

        let done = self.finished();
        if done {
            debug!(steps = self.steps, sse = self.sse(), "kmeans finished");
        }
        done
    }

    /// Every point with the cluster it currently belongs to.
    pub fn nodes(&self) -> Vec<Node> {
        self.nodes
            .iter()
            .map(|n| Node::new(n.point, self.clusters[n.cluster_id].snapshot()))
            .collect()
    }

    pub fn clusters(&self) -> Vec<Cluster> {
        self.clusters.iter().map(InternalCluster::snapshot).collect()
    }

    /// Cluster id of every point, in input order.
    pub fn assignments(&self) -> Vec<usize> {
        self.nodes.iter().map(|n| n.cluster_id).collect()
    }

    #[inline]
    pub fn number_of_clusters(&self) -> usize {
        self.clusters.len()
    }

    #[inline]
    pub fn finished(&self) -> bool {
        self.remaining <= 0
    }

    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Half-steps performed since initialization.
    #[inline]
    pub fn steps(&self) -> usize {
        self.steps
    }

    #[inline]
    pub fn next_phase(&self) -> Phase {
        self.next_phase
    }

    /// Sum of squared distances from each point to its cluster's centroid.
    pub fn sse(&self) -> f64 {
        sum_squared_error(
            self.nodes
                .iter()
                .map(|n| (&n.point, &self.clusters[n.cluster_id].centroid)),
        )
    }

    /// Candidates tried during a seed search; `None` for random partition.
    pub fn seed_search(&self) -> Option<&SeedSearch> {
        self.seed_search.as_ref()
    }

    fn init_random_partition<R: Rng>(&mut self, rng: &mut R) {
        // the first K points seed one cluster each so none starts empty
        let k = self.clusters.len();
        for (i, node) in self.nodes.iter_mut().enumerate() {
            node.cluster_id = if i < k { i } else { rng.gen_range(0..k) };
        }
        self.calculate_centroid();
    }

    fn init_seed_search<R: Rng>(&mut self, rng: &mut R, iterations: usize, source: SeedSource) {
        let k = self.clusters.len();
        let points: Vec<Point> = self.nodes.iter().map(|n| n.point).collect();
        let mut search = SeedSearch::with_capacity(iterations);

        for _ in 0..iterations {
            let seeds = source.draw(rng, &points, k);
            self.set_centroids(&seeds);
            self.calculate_clustering();
            search.push(self.sse(), seeds);
        }

        if let Some(i) = search.chosen() {
            debug!(
                candidate = i,
                sse = search.candidates()[i].sse,
                tried = search.len(),
                "adopting seed configuration"
            );
            self.set_centroids(&search.candidates()[i].centroids);
        }
        self.calculate_clustering();
        self.seed_search = Some(search);
    }

    fn set_centroids(&mut self, centroids: &[Point]) {
        for (cluster, &c) in self.clusters.iter_mut().zip(centroids) {
            cluster.centroid = c;
        }
    }

    /// Reassignment pass. Returns true if any point changed cluster.
    fn calculate_clustering(&mut self) -> bool {
        let mut changed = false;
        for node in self.nodes.iter_mut() {
            if let Some(id) = best_improvement(&node.point, node.cluster_id, &self.clusters) {
                node.cluster_id = id;
                changed = true;
            }
        }
        changed
    }

    /// Centroid update pass. Returns true if any centroid moved past the threshold.
    ///
    /// A cluster with no points keeps its centroid and counts as not moved.
    fn calculate_centroid(&mut self) -> bool {
        let limit = self.threshold * self.threshold;
        let mut moved = false;
        for cluster in self.clusters.iter_mut() {
            let members = self
                .nodes
                .iter()
                .filter(|n| n.cluster_id == cluster.id)
                .map(|n| &n.point);
            let Some(next) = mean_point(members) else {
                trace!(cluster = cluster.id, "empty cluster keeps its centroid");
                continue;
            };
            let previous = cluster.centroid;
            cluster.centroid = next;
            if sqr_distance(&previous, &next) > limit {
                moved = true;
            }
        }
        moved
    }
}

/// Cluster the point should move to, if any.
///
/// Only clusters strictly closer than the current one qualify; among them
/// the largest drop in squared distance wins, the later cluster on ties.
fn best_improvement(point: &Point, current: usize, clusters: &[InternalCluster]) -> Option<usize> {
    let here = sqr_distance(point, &clusters[current].centroid);
    let mut best: Option<(usize, f64)> = None;
    for (j, c) in clusters.iter().enumerate() {
        if j == current {
            continue;
        }
        let there = sqr_distance(point, &c.centroid);
        if here > there {
            let gain = here - there;
            match best {
                Some((_, g)) if gain < g => {}
                _ => best = Some((j, gain)),
            }
        }
    }
    best.map(|(j, _)| j)
}

fn validate(points: &[Point], clusters: usize, options: &KmeansOptions) -> Result<()> {
    if clusters == 0 || clusters > points.len() {
        return Err(KmeansError::InvalidClusterCount {
            clusters,
            points: points.len(),
        });
    }
    if !is_finite_positive(options.threshold) {
        return Err(KmeansError::InvalidThreshold(options.threshold));
    }
    if let Some(index) = points.iter().position(|p| !p.is_finite()) {
        return Err(KmeansError::InvalidPoint { index });
    }
    match options.strategy {
        InitStrategy::RandomPartition => {}
        InitStrategy::RandomSeedSearch { iterations } => {
            if iterations == 0 {
                return Err(KmeansError::InvalidIterations(iterations));
            }
        }
        InitStrategy::RandomRegionSearch { iterations, region } => {
            if iterations == 0 {
                return Err(KmeansError::InvalidIterations(iterations));
            }
            if !region.is_valid() {
                return Err(KmeansError::InvalidRegion {
                    center: region.center,
                    size: region.size,
                });
            }
        }
    }
    Ok(())
}
