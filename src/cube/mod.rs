//! 3D cube stores: trace-level random access over a regular survey grid.
//!
//! A cube file is a DX header describing a `gridpositions` grid followed by
//! the binary trace block: `n_i * n_x * n_samples` little-endian f32 in
//! row-major `(inline, crossline, sample)` order. The on-disk vertical axis
//! runs downward; the in-memory time axis is its negation.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use glam::{DVec2, DVec3};
use tracing::debug;

use crate::core::{GridGeometry, TimeAxis, TraceStore};
use crate::dx::{DataAddress, DataRepr, FileObjectTable, ObjectClass};
use crate::util::{Error, Result, SAMPLE_BYTE_LEN, UNDEF};

/// Derive grid geometry and time axis from a parsed cube file.
///
/// The time axis is the negation of the third origin/delta components, and
/// the in-memory origin z is replaced by the time-axis origin.
fn extract_cube_layout(table: &FileObjectTable) -> Result<(GridGeometry, TimeAxis)> {
    let grid = table
        .find_by_class(&ObjectClass::GridPositions)
        .ok_or_else(|| Error::MissingObject("no gridpositions object in file".to_string()))?;
    let params = grid.regarray_params()?;
    if params.counts.len() < 3 || params.origin.len() < 3 || params.deltas.len() < 3 {
        return Err(Error::header(format!(
            "object {}: cube grid needs 3 counts, a 3D origin and 3 deltas",
            grid.id
        )));
    }
    let axis = TimeAxis::new(
        -params.origin[2],
        -params.deltas[2][2],
        params.counts[2] as u32,
    );
    let geometry = GridGeometry::new(
        DVec3::new(params.origin[0], params.origin[1], axis.origin),
        DVec2::new(params.deltas[0][0], params.deltas[0][1]),
        DVec2::new(params.deltas[1][0], params.deltas[1][1]),
        params.counts[0] as u32,
        params.counts[1] as u32,
    );
    Ok((geometry, axis))
}

/// Byte offset of a trace inside the data block.
#[inline]
fn trace_offset(geometry: &GridGeometry, inl: u32, xln: u32, n_samples: u32) -> u64 {
    (u64::from(inl) * u64::from(geometry.n_x()) + u64::from(xln))
        * u64::from(n_samples)
        * SAMPLE_BYTE_LEN
}

fn read_trace(file: &mut File, offset: u64, n_samples: u32) -> Result<Vec<f32>> {
    let mut buf = vec![0u8; n_samples as usize * SAMPLE_BYTE_LEN as usize];
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut buf)?;
    let mut trace = vec![0f32; n_samples as usize];
    LittleEndian::read_f32_into(&buf, &mut trace);
    Ok(trace)
}

fn write_trace(file: &mut File, offset: u64, trace: &[f32]) -> Result<()> {
    let mut buf = vec![0u8; trace.len() * SAMPLE_BYTE_LEN as usize];
    LittleEndian::write_f32_into(trace, &mut buf);
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(&buf)?;
    Ok(())
}

/// Read access to a cube file.
pub struct CubeReader {
    geometry: GridGeometry,
    axis: TimeAxis,
    file: File,
    data_start: u64,
    path: PathBuf,
    undef_trace: Vec<f32>,
}

impl CubeReader {
    /// Attach to an existing cube file.
    ///
    /// The only supported layout has the first data object at relative
    /// offset 0 with `lsb` representation; anything else is a hard failure.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let table = FileObjectTable::parse(path)?;
        let (geometry, axis) = extract_cube_layout(&table)?;

        let first = table.data_entries.first().ok_or_else(|| {
            Error::MissingObject("no data object in cube file".to_string())
        })?;
        if first.address != DataAddress::Internal(0) {
            return Err(Error::UnsupportedLayout(
                "first data object must start at relative offset 0".to_string(),
            ));
        }
        if table.objects[first.object].data_repr != Some(DataRepr::Lsb) {
            return Err(Error::UnsupportedLayout(
                "cube trace data must be lsb".to_string(),
            ));
        }

        let file = File::open(path)?;
        debug!(
            path = %path.display(),
            n_i = geometry.n_i(),
            n_x = geometry.n_x(),
            n_samples = axis.n_samples,
            data_start = table.data_start,
            "attached to cube file"
        );
        Ok(Self {
            geometry,
            axis,
            file,
            data_start: table.data_start,
            path: path.to_path_buf(),
            undef_trace: vec![UNDEF; axis.n_samples as usize],
        })
    }

    #[inline]
    pub fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Trace at grid cell `(inl, xln)`. Bounds are a caller contract.
    pub fn trace_at(&mut self, inl: u32, xln: u32) -> Result<Vec<f32>> {
        assert!(inl < self.geometry.n_i() && xln < self.geometry.n_x());
        let offset =
            self.data_start + trace_offset(&self.geometry, inl, xln, self.axis.n_samples);
        read_trace(&mut self.file, offset, self.axis.n_samples)
    }

    /// Trace of the grid cell nearest to a world coordinate, or the
    /// undefined trace when the coordinate falls outside the grid.
    pub fn nearest_trace(&mut self, p: DVec2) -> Result<Vec<f32>> {
        let (inl, xln) = self.geometry.grid_indices(p);
        if inl < 0
            || inl >= i64::from(self.geometry.n_i())
            || xln < 0
            || xln >= i64::from(self.geometry.n_x())
        {
            return Ok(self.undef_trace.clone());
        }
        self.trace_at(inl as u32, xln as u32)
    }
}

impl TraceStore for CubeReader {
    fn time_axis(&self) -> TimeAxis {
        self.axis
    }

    fn num_traces(&self) -> u64 {
        self.geometry.num_traces()
    }

    fn undef_trace(&self) -> &[f32] {
        &self.undef_trace
    }
}

/// Write access to a new cube file.
///
/// Creating the writer lays down the full textual header and one undefined
/// trace at the last grid cell, pre-extending the file to its final size so
/// later out-of-order writes never read past end-of-file.
pub struct CubeWriter {
    geometry: GridGeometry,
    axis: TimeAxis,
    file: File,
    data_start: u64,
    undef_trace: Vec<f32>,
}

impl CubeWriter {
    /// Create a cube file with the given geometry and time axis.
    pub fn create(
        path: impl AsRef<Path>,
        geometry: GridGeometry,
        axis: TimeAxis,
    ) -> Result<Self> {
        let path = path.as_ref();
        // keep the geometry's vertical origin in sync with the time axis
        let geometry = geometry.with_origin_z(axis.origin);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        let header = Self::format_header(&geometry, &axis);
        let data_start = header.len() as u64;
        file.write_all(header.as_bytes())?;
        debug!(path = %path.display(), data_start, "wrote cube header");

        let mut writer = Self {
            geometry,
            axis,
            file,
            data_start,
            undef_trace: vec![UNDEF; axis.n_samples as usize],
        };
        writer.write_undef_trace_at(geometry.n_i() - 1, geometry.n_x() - 1)?;
        Ok(writer)
    }

    /// Create a cube file copying another store's geometry and axis.
    pub fn create_like(path: impl AsRef<Path>, source: &CubeReader) -> Result<Self> {
        Self::create(path, source.geometry(), source.time_axis())
    }

    /// Textual header; the vertical origin and step are negated back to the
    /// on-disk downward convention.
    fn format_header(geometry: &GridGeometry, axis: &TimeAxis) -> String {
        let origin = geometry.origin();
        let v_i = geometry.v_i();
        let v_x = geometry.v_x();
        let items = geometry.num_traces() * u64::from(axis.n_samples);
        format!(
            "object 1 class gridpositions counts {n_i} {n_x} {n_samples}\n\
             origin {ox:.10} {oy:.10} {oz:.3}\n\
             delta {vix:.10} {viy:.10} 0\n\
             delta {vxx:.10} {vxy:.10} 0\n\
             delta 0 0 {step:.3}\n\
             attribute \"dep\" string \"positions\"\n\
             #\n\
             object 2 class gridconnections counts {n_i} {n_x} {n_samples}\n\
             attribute \"element type\" string \"cubes\"\n\
             attribute \"dep\" string \"connections\"\n\
             attribute \"ref\" string \"positions\"\n\
             #\n\
             object 3 class array type float rank 0 items {items} lsb  ieee data 0\n\
             attribute \"dep\" string \"positions\"\n\
             #\n\
             object \"default\" class field\n\
             component \"positions\" value 1\n\
             component \"connections\" value 2\n\
             component \"data\" value 3\n\
             attribute \"name\" string \"3D\"\n\
             #\n\
             end\n",
            n_i = geometry.n_i(),
            n_x = geometry.n_x(),
            n_samples = axis.n_samples,
            ox = origin.x,
            oy = origin.y,
            oz = -origin.z,
            vix = v_i.x,
            viy = v_i.y,
            vxx = v_x.x,
            vxy = v_x.y,
            step = -axis.step,
            items = items,
        )
    }

    #[inline]
    pub fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    /// Write a trace at grid cell `(inl, xln)`.
    pub fn write_trace_at(&mut self, inl: u32, xln: u32, trace: &[f32]) -> Result<()> {
        assert_eq!(trace.len(), self.axis.n_samples as usize);
        assert!(inl < self.geometry.n_i() && xln < self.geometry.n_x());
        let offset =
            self.data_start + trace_offset(&self.geometry, inl, xln, self.axis.n_samples);
        write_trace(&mut self.file, offset, trace)
    }

    /// Write a trace at the grid cell nearest to a world coordinate.
    pub fn write_trace_at_xy(&mut self, p: DVec2, trace: &[f32]) -> Result<()> {
        let (inl, xln) = self.geometry.grid_indices(p);
        assert!(inl >= 0 && xln >= 0, "coordinate outside the grid");
        self.write_trace_at(inl as u32, xln as u32, trace)
    }

    /// Write the fully-undefined trace at `(inl, xln)`.
    pub fn write_undef_trace_at(&mut self, inl: u32, xln: u32) -> Result<()> {
        assert!(inl < self.geometry.n_i() && xln < self.geometry.n_x());
        let offset =
            self.data_start + trace_offset(&self.geometry, inl, xln, self.axis.n_samples);
        write_trace(&mut self.file, offset, &self.undef_trace)
    }

    /// Write the fully-undefined trace at the cell nearest to `p`.
    pub fn write_undef_trace_at_xy(&mut self, p: DVec2) -> Result<()> {
        let (inl, xln) = self.geometry.grid_indices(p);
        assert!(inl >= 0 && xln >= 0, "coordinate outside the grid");
        self.write_undef_trace_at(inl as u32, xln as u32)
    }

    /// Read back a trace from the file under construction.
    pub fn trace_at(&mut self, inl: u32, xln: u32) -> Result<Vec<f32>> {
        assert!(inl < self.geometry.n_i() && xln < self.geometry.n_x());
        let offset =
            self.data_start + trace_offset(&self.geometry, inl, xln, self.axis.n_samples);
        read_trace(&mut self.file, offset, self.axis.n_samples)
    }
}

impl TraceStore for CubeWriter {
    fn time_axis(&self) -> TimeAxis {
        self.axis
    }

    fn num_traces(&self) -> u64 {
        self.geometry.num_traces()
    }

    fn undef_trace(&self) -> &[f32] {
        &self.undef_trace
    }
}
