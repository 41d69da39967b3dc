//! Merging cubes by spatial reprojection and time-axis resampling.
//!
//! [`join_cubes`] builds one output cube covering the footprint of all
//! inputs; [`reduce_cube_geometry`] resamples one cube onto another cube's
//! grid. Both fill every output cell exactly once, in row-major order, and
//! fall back to the undefined trace where no input has data.

use std::path::Path;

use tracing::info;

use crate::core::{join_time_axes, resample_trace, TraceStore};
use crate::cube::{CubeReader, CubeWriter};
use crate::util::{is_undefined, Result};

/// Per-cell progress callback, invoked once per output trace.
pub trait ProgressSink {
    fn report(&mut self, current: u64, total: u64);
}

/// Progress sink that does nothing.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _current: u64, _total: u64) {}
}

/// Final counters of a merge pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergeReport {
    /// Output traces written (the full output grid)
    pub n_total: u64,
    /// Output traces sourced from an input cube; the remainder were written
    /// fully undefined
    pub n_from_cubes: u64,
}

/// Fill every cell of `writer` from the first cube in `cubes` that covers
/// it with a usable trace.
///
/// A candidate trace is rejected when its first sample is undefined; the
/// first sample serves as the whole-trace validity flag in this format, so
/// a partially-undefined trace with a defined first sample is still used.
fn fill_output_cells(
    cubes: &mut [CubeReader],
    writer: &mut CubeWriter,
    progress: &mut dyn ProgressSink,
) -> Result<MergeReport> {
    let out_geometry = writer.geometry();
    let out_axis = writer.time_axis();
    let n_final = out_geometry.num_traces();

    let mut n_total = 0u64;
    let mut n_from_cubes = 0u64;
    for (inl, xln) in out_geometry.cells() {
        let p = out_geometry.cell_coordinates(i64::from(inl), i64::from(xln));
        let mut written = false;
        for cube in cubes.iter_mut() {
            if !cube.geometry().contains_point(p) {
                continue;
            }
            let trace = cube.nearest_trace(p)?;
            if is_undefined(trace[0]) {
                // undefined trace, try the next cube
                continue;
            }
            let resampled = resample_trace(&trace, cube.time_axis(), out_axis);
            writer.write_trace_at_xy(p, &resampled)?;
            written = true;
            n_from_cubes += 1;
            break;
        }
        if !written {
            writer.write_undef_trace_at_xy(p)?;
        }
        n_total += 1;
        progress.report(n_total, n_final);
    }
    Ok(MergeReport {
        n_total,
        n_from_cubes,
    })
}

/// Merge cubes into one output file.
///
/// The first input is the reference: the output grid reuses its step
/// vectors, widened to cover every input's footprint; the output time axis
/// joins all input axes at the finest step. Inputs are tried in the order
/// supplied, so earlier cubes take priority where footprints overlap.
pub fn join_cubes(
    inputs: &[impl AsRef<Path>],
    output: impl AsRef<Path>,
    progress: &mut dyn ProgressSink,
) -> Result<MergeReport> {
    assert!(!inputs.is_empty(), "join_cubes needs at least one input");
    let mut cubes = inputs
        .iter()
        .map(CubeReader::open)
        .collect::<Result<Vec<_>>>()?;

    let other_geoms: Vec<_> = cubes[1..].iter().map(|c| c.geometry()).collect();
    let wrap = cubes[0].geometry().wraparound(&other_geoms);
    let joint_axis = cubes[1..]
        .iter()
        .fold(cubes[0].time_axis(), |acc, c| {
            join_time_axes(acc, c.time_axis())
        });
    info!(
        n_inputs = cubes.len(),
        n_i = wrap.n_i(),
        n_x = wrap.n_x(),
        n_samples = joint_axis.n_samples,
        "joining cubes"
    );

    let mut writer = CubeWriter::create(output, wrap, joint_axis)?;
    let report = fill_output_cells(&mut cubes, &mut writer, progress)?;
    println!("Total number of traces written: {}", report.n_total);
    println!("Number of points taken from cubes: {}", report.n_from_cubes);
    Ok(report)
}

/// Resample `source` onto `target`'s own grid and time axis.
///
/// The output copies the target cube's geometry unchanged; data comes only
/// from the source cube. Cells the source does not cover come out fully
/// undefined.
pub fn reduce_cube_geometry(
    target: impl AsRef<Path>,
    source: impl AsRef<Path>,
    output: impl AsRef<Path>,
    progress: &mut dyn ProgressSink,
) -> Result<MergeReport> {
    let target = CubeReader::open(target)?;
    let mut cubes = vec![CubeReader::open(source)?];
    info!(
        n_i = target.geometry().n_i(),
        n_x = target.geometry().n_x(),
        "reducing cube to target geometry"
    );

    let mut writer = CubeWriter::create(output, target.geometry(), target.time_axis())?;
    let report = fill_output_cells(&mut cubes, &mut writer, progress)?;
    println!("Total number of traces written: {}", report.n_total);
    println!("Number of points taken from cubes: {}", report.n_from_cubes);
    Ok(report)
}
