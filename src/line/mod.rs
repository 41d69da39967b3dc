//! 2D line stores: trace access along an explicit list of survey points.
//!
//! A line file embeds its point list as a packed `(x, y, 0.0)` float triple
//! array between the textual header and the sample block; trace `i` of the
//! sample block belongs to point `i`.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use tracing::debug;

use crate::core::{TimeAxis, TraceStore};
use crate::dx::{DataAddress, DataRepr, FileObjectTable, ObjectClass, ObjectRecord};
use crate::util::{Error, Result, SAMPLE_BYTE_LEN, UNDEF};

/// One survey point of a 2D line. `cdp` is the 1-based sequence number;
/// insertion order is trace order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinePoint {
    pub x: f64,
    pub y: f64,
    pub cdp: u32,
}

impl LinePoint {
    pub fn new(x: f64, y: f64, cdp: u32) -> Self {
        Self { x, y, cdp }
    }
}

fn read_trace(file: &mut File, offset: u64, n_samples: u32) -> Result<Vec<f32>> {
    let mut buf = vec![0u8; n_samples as usize * SAMPLE_BYTE_LEN as usize];
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut buf)?;
    let mut trace = vec![0f32; n_samples as usize];
    LittleEndian::read_f32_into(&buf, &mut trace);
    Ok(trace)
}

/// Read the point-list floats of the rank-1/shape-3 positions array.
///
/// Inline `data follows` text and both binary byte orders are accepted;
/// only the write side is restricted to lsb.
fn read_point_floats(
    path: &Path,
    table: &FileObjectTable,
    obj: &ObjectRecord,
) -> Result<Vec<f64>> {
    let addr = obj.data_addr.clone().ok_or_else(|| {
        Error::header(format!("object {}: positions array without data", obj.id))
    })?;
    match addr {
        DataAddress::Follows => obj.inline_data(),
        DataAddress::Internal(offset) => {
            let length = obj.data_length()? as usize;
            let mut file = File::open(path)?;
            file.seek(SeekFrom::Start(table.data_start + offset))?;
            let mut buf = vec![0u8; length];
            file.read_exact(&mut buf)?;
            let mut floats = vec![0f32; length / SAMPLE_BYTE_LEN as usize];
            match obj.data_repr {
                Some(DataRepr::Msb) => BigEndian::read_f32_into(&buf, &mut floats),
                _ => LittleEndian::read_f32_into(&buf, &mut floats),
            }
            Ok(floats.into_iter().map(f64::from).collect())
        }
        DataAddress::External { file, .. } => Err(Error::UnsupportedLayout(format!(
            "object {}: external positions file {file} is not supported",
            obj.id
        ))),
    }
}

/// Read access to a line file.
pub struct LineReader {
    points: Vec<LinePoint>,
    axis: TimeAxis,
    file: File,
    /// Absolute byte offset of the sample block
    samples_start: u64,
    name: Option<String>,
    path: PathBuf,
    undef_trace: Vec<f32>,
}

impl LineReader {
    /// Attach to an existing line file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let table = FileObjectTable::parse(path)?;

        let mut points_obj: Option<&ObjectRecord> = None;
        let mut samples_start: Option<u64> = None;
        let mut z_axis: Option<(f64, f64, u32)> = None;
        let mut name: Option<String> = None;
        for obj in &table.objects {
            match obj.class {
                ObjectClass::Array => {
                    if obj.rank == Some(1) && obj.shape == 3 {
                        points_obj = Some(obj);
                    } else if obj.rank.unwrap_or(0) == 0 {
                        match obj.data_addr {
                            Some(DataAddress::Internal(offset)) => {
                                samples_start = Some(table.data_start + offset);
                            }
                            _ => {
                                return Err(Error::UnsupportedLayout(format!(
                                    "object {}: line samples must be internal binary data",
                                    obj.id
                                )))
                            }
                        }
                    }
                }
                ObjectClass::RegularArray => {
                    let params = obj.regarray_params()?;
                    if params.origin.len() < 3 || params.deltas[0].len() < 3 {
                        return Err(Error::header(format!(
                            "object {}: regulararray needs 3D origin and delta",
                            obj.id
                        )));
                    }
                    z_axis = Some((
                        params.origin[2],
                        params.deltas[0][2],
                        params.counts[0] as u32,
                    ));
                }
                ObjectClass::Field => {
                    if name.is_none() {
                        name = obj.str_attribute("name");
                    }
                }
                _ => {}
            }
        }

        let points_obj = points_obj.ok_or_else(|| {
            Error::MissingObject("no rank-1 shape-3 positions array in line file".to_string())
        })?;
        let samples_start = samples_start.ok_or_else(|| {
            Error::MissingObject("no sample array in line file".to_string())
        })?;
        let (z0, z_step, n_samples) = z_axis.ok_or_else(|| {
            Error::MissingObject("no regulararray time axis in line file".to_string())
        })?;
        // on-disk vertical axis is stored downward
        let axis = TimeAxis::new(-z0, -z_step, n_samples);

        let floats = read_point_floats(path, &table, points_obj)?;
        let n_points = points_obj.items as usize;
        if floats.len() < n_points * 3 {
            return Err(Error::header(format!(
                "object {}: positions array shorter than its item count",
                points_obj.id
            )));
        }
        let points = (0..n_points)
            .map(|i| LinePoint::new(floats[3 * i], floats[3 * i + 1], i as u32 + 1))
            .collect();

        let file = File::open(path)?;
        debug!(
            path = %path.display(),
            n_points,
            n_samples,
            samples_start,
            "attached to line file"
        );
        Ok(Self {
            points,
            axis,
            file,
            samples_start,
            name,
            path: path.to_path_buf(),
            undef_trace: vec![UNDEF; n_samples as usize],
        })
    }

    /// Ordered survey points; insertion order is trace order.
    #[inline]
    pub fn points(&self) -> &[LinePoint] {
        &self.points
    }

    /// Name of the line from the field's `name` attribute.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Trace of point `i`. Bounds are a caller contract.
    pub fn trace_at(&mut self, i: u32) -> Result<Vec<f32>> {
        assert!((i as usize) < self.points.len());
        let offset = self.samples_start
            + u64::from(i) * u64::from(self.axis.n_samples) * SAMPLE_BYTE_LEN;
        read_trace(&mut self.file, offset, self.axis.n_samples)
    }
}

impl TraceStore for LineReader {
    fn time_axis(&self) -> TimeAxis {
        self.axis
    }

    fn num_traces(&self) -> u64 {
        self.points.len() as u64
    }

    fn undef_trace(&self) -> &[f32] {
        &self.undef_trace
    }
}

/// Write access to a new line file.
///
/// The header is followed by the packed `(x, y, 0.0)` point list and then
/// the sample block; like the cube writer, creation pre-writes an undefined
/// trace at the last index to size the file.
pub struct LineWriter {
    points: Vec<LinePoint>,
    axis: TimeAxis,
    file: File,
    samples_start: u64,
    undef_trace: Vec<f32>,
}

impl LineWriter {
    /// Create a line file for the given points and axis.
    pub fn create(
        path: impl AsRef<Path>,
        points: &[LinePoint],
        axis: TimeAxis,
        name: &str,
    ) -> Result<Self> {
        assert!(!points.is_empty(), "a line needs at least one point");
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        let n_traces = points.len() as u64;
        let point_bytes = n_traces * 3 * SAMPLE_BYTE_LEN;
        let header = Self::format_header(n_traces, point_bytes, &axis, name);
        let samples_start = header.len() as u64 + point_bytes;
        file.write_all(header.as_bytes())?;

        let mut buf = vec![0u8; point_bytes as usize];
        for (i, p) in points.iter().enumerate() {
            let triple = [p.x as f32, p.y as f32, 0.0f32];
            LittleEndian::write_f32_into(&triple, &mut buf[12 * i..12 * i + 12]);
        }
        file.write_all(&buf)?;
        debug!(n_traces, samples_start, "wrote line header and point list");

        let mut writer = Self {
            points: points.to_vec(),
            axis,
            file,
            samples_start,
            undef_trace: vec![UNDEF; axis.n_samples as usize],
        };
        writer.write_undef_trace_at(points.len() as u32 - 1)?;
        Ok(writer)
    }

    /// Create a line file copying another line's points and axis.
    pub fn create_like(path: impl AsRef<Path>, source: &LineReader, name: &str) -> Result<Self> {
        Self::create(path, source.points(), source.time_axis(), name)
    }

    /// Textual header; vertical origin and step negated to the on-disk
    /// downward convention, sample data addressed past the point list.
    fn format_header(n_traces: u64, point_bytes: u64, axis: &TimeAxis, name: &str) -> String {
        format!(
            "object 2 class array type float rank 1 shape 3 items  {n_traces} lsb  ieee data 0\n\
             #\n\
             object 3 class regulararray count  {n_samples}\n\
             origin 0  0 {z0:.3}\n\
             delta  0  0 {z_step:.3}\n\
             #\n\
             object 4 class productarray\n  \
             term 2\n  \
             term 3\n\
             attribute \"dep\" string \"positions\"\n\
             #\n\
             object 1 class array type float rank 0 items  {items} lsb  ieee data {point_bytes}\n\
             attribute \"dep\" string \"positions\"\n\
             #\n\
             object 5 class gridconnections counts {n_traces} {n_samples}\n\
             attribute \"element type\" string \"quads\"\n\
             attribute \"dep\" string \"connections\"\n\
             attribute \"ref\" string \"positions\"\n\
             object \"default\" class field\n\
             component \"positions\" value 4\n\
             component \"connections\" value 5\n\
             component \"data\" value 1\n\
             attribute \"name\" string \"{name}\"\n\
             #\n\
             end\n",
            n_samples = axis.n_samples,
            z0 = -axis.origin,
            z_step = -axis.step,
            items = n_traces * u64::from(axis.n_samples),
        )
    }

    #[inline]
    pub fn points(&self) -> &[LinePoint] {
        &self.points
    }

    /// Write the trace of point `i`.
    pub fn write_trace_at(&mut self, i: u32, trace: &[f32]) -> Result<()> {
        assert_eq!(trace.len(), self.axis.n_samples as usize);
        assert!((i as usize) < self.points.len());
        let offset = self.samples_start
            + u64::from(i) * u64::from(self.axis.n_samples) * SAMPLE_BYTE_LEN;
        let mut buf = vec![0u8; trace.len() * SAMPLE_BYTE_LEN as usize];
        LittleEndian::write_f32_into(trace, &mut buf);
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&buf)?;
        Ok(())
    }

    /// Write the fully-undefined trace at index `i`.
    pub fn write_undef_trace_at(&mut self, i: u32) -> Result<()> {
        assert!((i as usize) < self.points.len());
        let offset = self.samples_start
            + u64::from(i) * u64::from(self.axis.n_samples) * SAMPLE_BYTE_LEN;
        let mut buf = vec![0u8; self.undef_trace.len() * SAMPLE_BYTE_LEN as usize];
        LittleEndian::write_f32_into(&self.undef_trace, &mut buf);
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&buf)?;
        Ok(())
    }

    /// Read back a trace from the file under construction.
    pub fn trace_at(&mut self, i: u32) -> Result<Vec<f32>> {
        assert!((i as usize) < self.points.len());
        let offset = self.samples_start
            + u64::from(i) * u64::from(self.axis.n_samples) * SAMPLE_BYTE_LEN;
        read_trace(&mut self.file, offset, self.axis.n_samples)
    }
}

impl TraceStore for LineWriter {
    fn time_axis(&self) -> TimeAxis {
        self.axis
    }

    fn num_traces(&self) -> u64 {
        self.points.len() as u64
    }

    fn undef_trace(&self) -> &[f32] {
        &self.undef_trace
    }
}
