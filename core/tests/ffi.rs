use core::ffi::c_int;
use std::{ptr, slice};

use kmeans3d::utilities::Kmeans;
use kmeans3d::{
    Buf, CKmeansOptions, ERR_INVALID_ARGS, ERR_INVALID_OPTIONS, OK, alloc, free_,
    kmeans_assignments, kmeans_calculate, kmeans_clusters, kmeans_create, kmeans_finished,
    kmeans_free, kmeans_nodes, kmeans_step,
};
use serde_json::Value;

mod helpers;
use helpers::{approx_eq, two_groups};

fn packed_points() -> Vec<f64> {
    two_groups().iter().flat_map(|p| [p.x, p.y, p.z]).collect()
}

fn options(clusters: c_int, iterations: c_int, use_region: c_int) -> CKmeansOptions {
    CKmeansOptions {
        clusters,
        threshold: 1e-4,
        iterations,
        use_region,
        center: [5.0, 5.0, 5.0],
        size: [12.0, 12.0, 12.0],
        has_seed: 1,
        seed: 7,
    }
}

fn empty_buf() -> Buf {
    Buf {
        ptr: ptr::null_mut(),
        len: 0,
    }
}

fn take_json(buf: Buf) -> Value {
    let bytes = unsafe { slice::from_raw_parts(buf.ptr, buf.len) }.to_vec();
    unsafe { free_(buf.ptr, buf.len) };
    serde_json::from_slice(&bytes).unwrap()
}

fn create(opts: &CKmeansOptions) -> (c_int, *mut Kmeans) {
    let points = packed_points();
    let mut handle: *mut Kmeans = ptr::null_mut();
    let code = unsafe { kmeans_create(points.as_ptr(), 6, opts, &mut handle) };
    (code, handle)
}

// Test: A host can drive the engine step by step and read snapshots back.
#[test]
fn host_loop_steps_to_completion() {
    for (iterations, use_region) in [(0, 0), (5, 0), (5, 1)] {
        let (code, handle) = create(&options(2, iterations, use_region));
        assert_eq!(code, OK);
        assert!(!handle.is_null());
        assert_eq!(unsafe { kmeans_finished(handle) }, 0);

        let mut finished: c_int = 0;
        let mut steps = 0;
        while finished == 0 {
            assert_eq!(unsafe { kmeans_step(handle, &mut finished) }, OK);
            steps += 1;
            assert!(steps < 100);
        }
        assert_eq!(unsafe { kmeans_finished(handle) }, 1);

        let mut out = empty_buf();
        assert_eq!(unsafe { kmeans_clusters(handle, &mut out) }, OK);
        let clusters = take_json(out);
        assert_eq!(clusters.as_array().unwrap().len(), 2);
        assert_eq!(clusters[1]["id"], 1);

        let mut out = empty_buf();
        assert_eq!(unsafe { kmeans_nodes(handle, &mut out) }, OK);
        let nodes = take_json(out);
        let nodes = nodes.as_array().unwrap();
        assert_eq!(nodes.len(), 6);
        assert_eq!(nodes[3]["point"]["z"], 10.0);
        let id = nodes[0]["cluster"]["id"].as_u64().unwrap() as usize;
        assert_eq!(nodes[0]["cluster"]["centroid"], clusters[id]["centroid"]);

        let mut out = empty_buf();
        assert_eq!(unsafe { kmeans_assignments(handle, &mut out) }, OK);
        assert_eq!(out.len, 6 * 4);
        let ids: Vec<u32> = unsafe { slice::from_raw_parts(out.ptr, out.len) }
            .chunks_exact(4)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        unsafe { free_(out.ptr, out.len) };
        assert!(ids.iter().all(|&i| i < 2));
        assert_eq!(ids[0] as usize, id);

        unsafe { kmeans_free(handle) };
    }
}

#[test]
fn calculate_runs_to_completion() {
    let (code, handle) = create(&options(2, 0, 0));
    assert_eq!(code, OK);
    assert_eq!(unsafe { kmeans_calculate(handle) }, OK);
    assert_eq!(unsafe { kmeans_finished(handle) }, 1);

    let mut out = empty_buf();
    assert_eq!(unsafe { kmeans_clusters(handle, &mut out) }, OK);
    let clusters = take_json(out);
    let xs: Vec<f64> = clusters
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["centroid"]["x"].as_f64().unwrap())
        .collect();
    assert!(xs.iter().any(|&x| approx_eq(x, 0.0, 1e-9)));
    assert!(xs.iter().any(|&x| approx_eq(x, 10.0, 1e-9)));
    unsafe { kmeans_free(handle) };
}

#[test]
fn rejects_invalid_options() {
    for opts in [
        options(0, 0, 0),
        options(7, 0, 0),
        options(2, -1, 0),
        options(2, 0, 1),
        CKmeansOptions {
            threshold: 0.0,
            ..options(2, 0, 0)
        },
        CKmeansOptions {
            size: [1.0, -1.0, 1.0],
            ..options(2, 3, 1)
        },
        CKmeansOptions {
            center: [1e308, 0.0, 0.0],
            size: [1.6e308, 1.0, 1.0],
            ..options(2, 3, 1)
        },
    ] {
        let (code, handle) = create(&opts);
        assert_eq!(code, ERR_INVALID_OPTIONS, "{:?}", opts);
        assert!(handle.is_null());
    }
}

#[test]
fn rejects_null_pointers() {
    let opts = options(2, 0, 0);
    let points = packed_points();
    let mut handle: *mut Kmeans = ptr::null_mut();
    unsafe {
        assert_eq!(
            kmeans_create(ptr::null(), 6, &opts, &mut handle),
            ERR_INVALID_ARGS
        );
        assert_eq!(
            kmeans_create(points.as_ptr(), 6, ptr::null(), &mut handle),
            ERR_INVALID_ARGS
        );
        assert_eq!(
            kmeans_create(points.as_ptr(), 6, &opts, ptr::null_mut()),
            ERR_INVALID_ARGS
        );

        let mut finished: c_int = 0;
        assert_eq!(kmeans_step(ptr::null_mut(), &mut finished), ERR_INVALID_ARGS);
        assert_eq!(kmeans_calculate(ptr::null_mut()), ERR_INVALID_ARGS);
        assert_eq!(kmeans_finished(ptr::null()), 0);

        let mut out = empty_buf();
        assert_eq!(kmeans_nodes(ptr::null(), &mut out), ERR_INVALID_ARGS);
        assert_eq!(kmeans_clusters(ptr::null(), &mut out), ERR_INVALID_ARGS);
        assert_eq!(kmeans_assignments(ptr::null(), &mut out), ERR_INVALID_ARGS);
        kmeans_free(ptr::null_mut());
    }
}

#[test]
fn host_buffers_round_trip_through_alloc() {
    unsafe {
        assert!(alloc(0).is_null());
        let p = alloc(24);
        assert!(!p.is_null());
        ptr::write_bytes(p, 0xAB, 24);
        assert_eq!(*p.add(23), 0xAB);
        free_(p, 24);
    }
}
