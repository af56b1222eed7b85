use core::ffi::c_int;
use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    ptr, slice,
};
use tracing::warn;

pub mod utilities;
use utilities::{InitStrategy, Kmeans, KmeansError, KmeansOptions, Point, Region};

pub const OK: c_int = 0;
pub const ERR_INVALID_ARGS: c_int = 1;
pub const ERR_PANIC: c_int = 2;
pub const ERR_INVALID_OPTIONS: c_int = 3;
pub const ERR_SERIALIZE: c_int = 4;

#[repr(C)]
pub struct Buf {
    pub ptr: *mut u8,
    pub len: usize,
}

/// Engine settings as a host passes them.
///
/// `iterations == 0` selects random partition. With `iterations > 0` the
/// seeds come from the input points, or from the `center`/`size` box when
/// `use_region != 0`. `seed` is only read when `has_seed != 0`.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct CKmeansOptions {
    pub clusters: c_int,
    pub threshold: f64,
    pub iterations: c_int,
    pub use_region: c_int,
    pub center: [f64; 3],
    pub size: [f64; 3],
    pub has_seed: c_int,
    pub seed: u64,
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn alloc(size: usize) -> *mut u8 {
    if size == 0 {
        return core::ptr::null_mut();
    }
    let mut v = Vec::<u8>::with_capacity(size);
    let p = v.as_mut_ptr();
    core::mem::forget(v);
    p
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn free_(ptr_raw: *mut u8, size: usize) {
    if !ptr_raw.is_null() {
        let _ = unsafe { Vec::<u8>::from_raw_parts(ptr_raw, size, size) };
    }
}

/// Builds an engine over `n_points` packed `x, y, z` triples.
/// On success `*out_handle` owns the engine until `kmeans_free`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kmeans_create(
    points_ptr: *const f64,
    n_points: usize,
    options: *const CKmeansOptions,
    out_handle: *mut *mut Kmeans,
) -> c_int {
    if points_ptr.is_null() || options.is_null() || out_handle.is_null() {
        return ERR_INVALID_ARGS;
    }
    let Some(n_coords) = n_points.checked_mul(3) else {
        return ERR_INVALID_ARGS;
    };
    let res = catch_unwind(AssertUnwindSafe(|| -> Result<(), c_int> {
        let coords = unsafe { slice::from_raw_parts(points_ptr, n_coords) };
        let points: Vec<Point> = coords
            .chunks_exact(3)
            .map(|c| Point::new(c[0], c[1], c[2]))
            .collect();

        let o = unsafe { *options };
        let (clusters, opts) = build_kmeans_options(&o)?;
        let km = Kmeans::new(&points, clusters, Some(opts)).map_err(error_code)?;

        unsafe { ptr::write_unaligned(out_handle, Box::into_raw(Box::new(km))) };
        Ok(())
    }));
    match res {
        Ok(Ok(())) => OK,
        Ok(Err(code)) => code,
        Err(_) => ERR_PANIC,
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kmeans_free(handle: *mut Kmeans) {
    if !handle.is_null() {
        let _ = unsafe { Box::from_raw(handle) };
    }
}

/// Advances one half-step. `*out_finished` is set to 1 once converged.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kmeans_step(handle: *mut Kmeans, out_finished: *mut c_int) -> c_int {
    if handle.is_null() || out_finished.is_null() {
        return ERR_INVALID_ARGS;
    }
    let res = catch_unwind(AssertUnwindSafe(|| {
        let km = unsafe { &mut *handle };
        km.step_calculate()
    }));
    match res {
        Ok(finished) => {
            unsafe { ptr::write_unaligned(out_finished, finished as c_int) };
            OK
        }
        Err(_) => ERR_PANIC,
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kmeans_calculate(handle: *mut Kmeans) -> c_int {
    if handle.is_null() {
        return ERR_INVALID_ARGS;
    }
    let res = catch_unwind(AssertUnwindSafe(|| {
        let km = unsafe { &mut *handle };
        km.calculate();
    }));
    match res {
        Ok(()) => OK,
        Err(_) => ERR_PANIC,
    }
}

/// 1 when finished, 0 otherwise (including a null handle).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kmeans_finished(handle: *const Kmeans) -> c_int {
    if handle.is_null() {
        return 0;
    }
    let km = unsafe { &*handle };
    km.finished() as c_int
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kmeans_nodes(handle: *const Kmeans, out_json: *mut Buf) -> c_int {
    if handle.is_null() || out_json.is_null() {
        return ERR_INVALID_ARGS;
    }
    let res = catch_unwind(AssertUnwindSafe(|| -> Result<(), c_int> {
        let km = unsafe { &*handle };
        let s = serde_json::to_string(&km.nodes()).map_err(|_| ERR_SERIALIZE)?;
        write_buf(out_json, s.into_bytes().into_boxed_slice());
        Ok(())
    }));
    match res {
        Ok(Ok(())) => OK,
        Ok(Err(code)) => code,
        Err(_) => ERR_PANIC,
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kmeans_clusters(handle: *const Kmeans, out_json: *mut Buf) -> c_int {
    if handle.is_null() || out_json.is_null() {
        return ERR_INVALID_ARGS;
    }
    let res = catch_unwind(AssertUnwindSafe(|| -> Result<(), c_int> {
        let km = unsafe { &*handle };
        let s = serde_json::to_string(&km.clusters()).map_err(|_| ERR_SERIALIZE)?;
        write_buf(out_json, s.into_bytes().into_boxed_slice());
        Ok(())
    }));
    match res {
        Ok(Ok(())) => OK,
        Ok(Err(code)) => code,
        Err(_) => ERR_PANIC,
    }
}

/// Cluster id per point as native-endian `u32`s.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kmeans_assignments(handle: *const Kmeans, out: *mut Buf) -> c_int {
    if handle.is_null() || out.is_null() {
        return ERR_INVALID_ARGS;
    }
    let res = catch_unwind(AssertUnwindSafe(|| {
        let km = unsafe { &*handle };
        let ids: Vec<u32> = km.assignments().into_iter().map(|id| id as u32).collect();
        write_buf(out, u32_slice_to_u8_box(&ids));
    }));
    match res {
        Ok(()) => OK,
        Err(_) => ERR_PANIC,
    }
}

fn u32_slice_to_u8_box(v: &[u32]) -> Box<[u8]> {
    let n = v.len() * 4;
    let mut out = Vec::<u8>::with_capacity(n);
    unsafe {
        out.set_len(n);
        ptr::copy_nonoverlapping(v.as_ptr() as *const u8, out.as_mut_ptr(), n);
    }
    out.into_boxed_slice()
}

fn write_buf(out: *mut Buf, bytes: Box<[u8]>) {
    let len = bytes.len();
    let ptr_bytes = Box::into_raw(bytes) as *mut u8;
    unsafe {
        ptr::write_unaligned(
            out,
            Buf {
                ptr: ptr_bytes,
                len,
            },
        )
    };
}

fn error_code(err: KmeansError) -> c_int {
    warn!(%err, "rejected kmeans options");
    ERR_INVALID_OPTIONS
}

fn build_kmeans_options(o: &CKmeansOptions) -> Result<(usize, KmeansOptions), c_int> {
    if o.clusters <= 0 || o.iterations < 0 {
        return Err(ERR_INVALID_OPTIONS);
    }
    let iterations = o.iterations as usize;
    let strategy = match (iterations, o.use_region != 0) {
        (0, false) => InitStrategy::RandomPartition,
        (0, true) => return Err(ERR_INVALID_OPTIONS),
        (_, false) => InitStrategy::RandomSeedSearch { iterations },
        (_, true) => InitStrategy::RandomRegionSearch {
            iterations,
            region: Region::new(Point::from(o.center), Point::from(o.size)),
        },
    };
    let seed = (o.has_seed != 0).then_some(o.seed);
    Ok((
        o.clusters as usize,
        KmeansOptions {
            threshold: o.threshold,
            strategy,
            seed,
        },
    ))
}
