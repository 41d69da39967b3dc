//! Integration tests for merging cubes and reducing cube geometry.

use dxseis::merge::{join_cubes, reduce_cube_geometry, NoProgress, ProgressSink};
use dxseis::prelude::*;

use tempfile::TempDir;

/// Log output for failing tests, controlled by `RUST_LOG`.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Write a cube file where every trace holds a constant value.
fn write_constant_cube(
    dir: &TempDir,
    name: &str,
    origin: DVec3,
    n_i: u32,
    n_x: u32,
    axis: TimeAxis,
    value: f32,
) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let geometry = GridGeometry::new(origin, DVec2::new(1.0, 0.0), DVec2::new(0.0, 1.0), n_i, n_x);
    let mut w = CubeWriter::create(&path, geometry, axis).expect("Failed to create cube");
    let trace = vec![value; axis.n_samples as usize];
    for inl in 0..n_i {
        for xln in 0..n_x {
            w.write_trace_at(inl, xln, &trace).expect("Failed to write trace");
        }
    }
    path
}

#[test]
fn test_self_merge_reproduces_cube() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let axis = TimeAxis::new(100.0, 2.0, 3);
    let a = write_constant_cube(&dir, "a.dx", DVec3::new(0.0, 0.0, 100.0), 2, 2, axis, 5.0);
    let out = dir.path().join("out.dx");

    let report = join_cubes(&[&a, &a], &out, &mut NoProgress).expect("Merge failed");
    assert_eq!(report.n_total, 4);
    assert_eq!(report.n_from_cubes, 4);

    let mut merged = CubeReader::open(&out).unwrap();
    let mut original = CubeReader::open(&a).unwrap();
    assert_eq!(merged.geometry(), original.geometry());
    assert_eq!(merged.time_axis(), original.time_axis());
    for inl in 0..2 {
        for xln in 0..2 {
            assert_eq!(
                merged.trace_at(inl, xln).unwrap(),
                original.trace_at(inl, xln).unwrap(),
                "trace ({inl}, {xln})"
            );
        }
    }
}

#[test]
fn test_disjoint_cubes_leave_undefined_gap() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let axis = TimeAxis::new(100.0, 2.0, 3);
    let a = write_constant_cube(&dir, "a.dx", DVec3::new(0.0, 0.0, 100.0), 1, 1, axis, 1.0);
    let b = write_constant_cube(&dir, "b.dx", DVec3::new(10.0, 0.0, 100.0), 1, 1, axis, 2.0);
    let out = dir.path().join("out.dx");

    let report = join_cubes(&[&a, &b], &out, &mut NoProgress).unwrap();
    // output grid spans both cubes: 11 x 1 cells
    assert_eq!(report.n_total, 11);
    assert_eq!(report.n_from_cubes, 2);

    let mut merged = CubeReader::open(&out).unwrap();
    assert_eq!(merged.geometry().n_i(), 11);
    assert_eq!(merged.geometry().n_x(), 1);
    assert_eq!(merged.trace_at(0, 0).unwrap(), vec![1.0; 3]);
    assert_eq!(merged.trace_at(10, 0).unwrap(), vec![2.0; 3]);
    // at least one fully-undefined cell between the two footprints
    assert!(merged.trace_at(5, 0).unwrap().iter().all(|&v| is_undefined(v)));
}

#[test]
fn test_earlier_cube_wins_on_overlap() {
    let dir = TempDir::new().unwrap();
    let axis = TimeAxis::new(100.0, 2.0, 3);
    let a = write_constant_cube(&dir, "a.dx", DVec3::new(0.0, 0.0, 100.0), 2, 2, axis, 5.0);
    let b = write_constant_cube(&dir, "b.dx", DVec3::new(0.0, 0.0, 100.0), 2, 2, axis, 7.0);
    let out = dir.path().join("out.dx");

    join_cubes(&[&a, &b], &out, &mut NoProgress).unwrap();
    let mut merged = CubeReader::open(&out).unwrap();
    for inl in 0..2 {
        for xln in 0..2 {
            assert_eq!(merged.trace_at(inl, xln).unwrap(), vec![5.0; 3]);
        }
    }
}

#[test]
fn test_undefined_first_sample_falls_through_to_next_cube() {
    let dir = TempDir::new().unwrap();
    let axis = TimeAxis::new(100.0, 2.0, 3);
    let origin = DVec3::new(0.0, 0.0, 100.0);

    // cube a covers the cell but its trace reads as undefined
    let a = dir.path().join("a.dx");
    {
        let geometry = GridGeometry::new(origin, DVec2::new(1.0, 0.0), DVec2::new(0.0, 1.0), 1, 1);
        let mut w = CubeWriter::create(&a, geometry, axis).unwrap();
        w.write_trace_at(0, 0, &[UNDEF, 1.0, 1.0]).unwrap();
    }
    let b = write_constant_cube(&dir, "b.dx", origin, 1, 1, axis, 7.0);
    let out = dir.path().join("out.dx");

    let report = join_cubes(&[&a, &b], &out, &mut NoProgress).unwrap();
    assert_eq!(report.n_from_cubes, 1);

    let mut merged = CubeReader::open(&out).unwrap();
    assert_eq!(merged.trace_at(0, 0).unwrap(), vec![7.0; 3]);
}

#[test]
fn test_merge_resamples_coarser_axis() {
    let dir = TempDir::new().unwrap();
    let coarse = TimeAxis::new(100.0, 4.0, 2);
    let fine = TimeAxis::new(100.0, 2.0, 3);

    // cube a: two samples 1.0 and 3.0, four time units apart
    let a = dir.path().join("a.dx");
    {
        let geometry = GridGeometry::new(
            DVec3::new(0.0, 0.0, 100.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
            1,
            1,
        );
        let mut w = CubeWriter::create(&a, geometry, coarse).unwrap();
        w.write_trace_at(0, 0, &[1.0, 3.0]).unwrap();
    }
    let b = write_constant_cube(&dir, "b.dx", DVec3::new(5.0, 0.0, 100.0), 1, 1, fine, 7.0);
    let out = dir.path().join("out.dx");

    let report = join_cubes(&[&a, &b], &out, &mut NoProgress).unwrap();
    assert_eq!(report.n_from_cubes, 2);

    let mut merged = CubeReader::open(&out).unwrap();
    // joint axis takes the finer step; the coarse trace is interpolated
    assert_eq!(merged.time_axis(), TimeAxis::new(100.0, 2.0, 3));
    assert_eq!(merged.trace_at(0, 0).unwrap(), vec![1.0, 2.0, 3.0]);
    assert_eq!(merged.trace_at(5, 0).unwrap(), vec![7.0; 3]);
}

#[test]
fn test_reduce_cube_geometry_keeps_target_grid() {
    let dir = TempDir::new().unwrap();
    let axis = TimeAxis::new(100.0, 2.0, 3);
    let target = write_constant_cube(&dir, "target.dx", DVec3::new(0.0, 0.0, 100.0), 2, 2, axis, 9.0);
    let source = write_constant_cube(&dir, "source.dx", DVec3::new(0.0, 0.0, 100.0), 1, 1, axis, 3.0);
    let out = dir.path().join("out.dx");

    let report = reduce_cube_geometry(&target, &source, &out, &mut NoProgress).unwrap();
    assert_eq!(report.n_total, 4);
    assert_eq!(report.n_from_cubes, 1);

    let mut merged = CubeReader::open(&out).unwrap();
    let target = CubeReader::open(&target).unwrap();
    assert_eq!(merged.geometry(), target.geometry());
    assert_eq!(merged.time_axis(), target.time_axis());
    // only the source-covered cell carries data
    assert_eq!(merged.trace_at(0, 0).unwrap(), vec![3.0; 3]);
    assert!(merged.trace_at(1, 1).unwrap().iter().all(|&v| is_undefined(v)));
}

#[test]
fn test_progress_is_reported_per_cell() {
    struct Counting(Vec<(u64, u64)>);
    impl ProgressSink for Counting {
        fn report(&mut self, current: u64, total: u64) {
            self.0.push((current, total));
        }
    }

    let dir = TempDir::new().unwrap();
    let axis = TimeAxis::new(100.0, 2.0, 2);
    let a = write_constant_cube(&dir, "a.dx", DVec3::new(0.0, 0.0, 100.0), 2, 3, axis, 1.0);
    let out = dir.path().join("out.dx");

    let mut progress = Counting(Vec::new());
    join_cubes(&[&a], &out, &mut progress).unwrap();
    assert_eq!(progress.0.len(), 6);
    assert_eq!(progress.0.first(), Some(&(1, 6)));
    assert_eq!(progress.0.last(), Some(&(6, 6)));
}
