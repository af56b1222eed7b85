// tests/helpers/mod.rs
use kmeans3d::utilities::{InitStrategy, KmeansOptions, Point, Region};

/// The two tight groups used throughout: three points near the origin and
/// three near (10, 10, 10).
#[allow(dead_code)]
pub fn two_groups() -> Vec<Point> {
    vec![
        Point::new(0.0, 0.0, 0.0),
        Point::new(0.0, 0.0, 1.0),
        Point::new(0.0, 1.0, 0.0),
        Point::new(10.0, 10.0, 10.0),
        Point::new(10.0, 10.0, 11.0),
        Point::new(10.0, 11.0, 10.0),
    ]
}

/// Options with a fixed seed so every random draw repeats.
#[allow(dead_code)]
pub fn seeded(threshold: f64, strategy: InitStrategy, seed: u64) -> Option<KmeansOptions> {
    Some(KmeansOptions {
        threshold,
        strategy,
        seed: Some(seed),
    })
}

#[allow(dead_code)]
pub fn region(center: (f64, f64, f64), size: (f64, f64, f64)) -> Region {
    Region::new(Point::from(center), Point::from(size))
}

/// Check two numbers are close within a simple absolute tolerance.
#[allow(dead_code)]
pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

#[allow(dead_code)]
pub fn approx_point(a: Point, b: Point, tol: f64) -> bool {
    approx_eq(a.x, b.x, tol) && approx_eq(a.y, b.y, tol) && approx_eq(a.z, b.z, tol)
}

// Deterministic uniform points inside [lo, hi]^3
#[allow(dead_code)]
pub fn uniform_points(n: usize, lo: f64, hi: f64, seed: u64) -> Vec<Point> {
    assert!(hi > lo);
    let mut s = seed | 1; // odd
    let mut next = move || {
        s = s
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let u = ((s >> 11) as f64) * (1.0 / (1u64 << 53) as f64);
        lo + (hi - lo) * u
    };
    (0..n).map(|_| Point::new(next(), next(), next())).collect()
}

/// Gaussian-ish blobs: `per_blob` points jittered around each center.
#[allow(dead_code)]
pub fn blobs(centers: &[Point], per_blob: usize, spread: f64, seed: u64) -> Vec<Point> {
    let mut out = Vec::with_capacity(centers.len() * per_blob);
    for (b, c) in centers.iter().enumerate() {
        let offsets = uniform_points(
            per_blob,
            -spread,
            spread,
            seed.wrapping_add(b as u64 * 7919),
        );
        for o in offsets {
            out.push(*c + o);
        }
    }
    out
}

/// Installs a test-writer subscriber once so engine traces show up with `--nocapture`.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}
