//! A single object description from a DX file header.
//!
//! Objects are declared by `object` lines in the textual part of the file.
//! The record keeps the verbatim description text together with the fields
//! extracted from its header line. Everything is parsed once, at scan time;
//! a record never mutates after the scan completes.

use std::sync::LazyLock;

use regex::Regex;
use smallvec::SmallVec;

use crate::util::{Error, Result};

static RE_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^object\s+").unwrap());
static RE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^object\s+\S+\s+class\s+(\S+)").unwrap());
// fallback for object names containing spaces, enclosed in quotes
static RE_CLASS_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^object\s+"[^"]+"\s+class\s+(\S+)"#).unwrap());
static RE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^object\s+(\S+)\s").unwrap());
static RE_ID_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^object\s+"([^"]+)"\s"#).unwrap());
static RE_DATA_EXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^object\s+.*data\s+file\s+(\S+)\s*,\s*(\w+)").unwrap());
static RE_DATA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^object\s+.*data\s+(\w+)").unwrap());
static RE_DATA_CLAUSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^object\s+.*data\s+").unwrap());
static RE_TYPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^object\s+.*type\s+(\w+)").unwrap());
static RE_ITEMS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^object\s+.*items\s+(\d+)").unwrap());
static RE_RANK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^object\s+.*rank\s+(\d+)").unwrap());
static RE_SHAPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^object\s+.*shape\s+(\d+)").unwrap());
static RE_IEEE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^object\s+.*\bieee\b").unwrap());
static RE_MSB: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^object\s+.*\bmsb\b").unwrap());
static RE_LSB: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^object\s+.*\blsb\b").unwrap());
// both `counts` (grids) and `count` (regulararray) occur in the wild
static RE_COUNTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^object\s+.*count[s]?\s+(\d+.*)").unwrap());
static RE_ORIGIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^origin\s+([ eE\d.\-+]+)").unwrap());
static RE_DELTA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^delta\s+([ eE\d.\-+]+)").unwrap());
static RE_STR_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^attribute\s+"(\w+)"\s+string\s+"([^"]+)""#).unwrap());

/// DX object classes emitted/consumed by this implementation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectClass {
    GridPositions,
    GridConnections,
    Array,
    ConstantArray,
    RegularArray,
    Field,
    Path,
    ProductArray,
    /// Any class keyword outside the supported subset (kept verbatim).
    Other(String),
}

impl ObjectClass {
    /// Map a class keyword from a header line.
    pub fn from_keyword(kw: &str) -> Self {
        match kw {
            "gridpositions" => Self::GridPositions,
            "gridconnections" => Self::GridConnections,
            "array" => Self::Array,
            "constantarray" => Self::ConstantArray,
            "regulararray" => Self::RegularArray,
            "field" => Self::Field,
            "path" => Self::Path,
            "productarray" => Self::ProductArray,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Where an object's data lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataAddress {
    /// `data follows` - ASCII data inline in the description text
    Follows,
    /// `data <offset>` - binary data, offset relative to the file's data start
    Internal(u64),
    /// `data file <name>, <offset>` - data in an external file
    External { file: String, offset: u64 },
}

/// Representation of an object's data block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataRepr {
    Ascii,
    Lsb,
    Msb,
    /// `ieee` without an explicit byte order
    Ieee,
}

/// Element type of an array's data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    Float,
    Int,
}

/// Counts/origin/deltas of a `gridpositions` or `regulararray` object.
#[derive(Clone, Debug, PartialEq)]
pub struct RegArrayParams {
    pub counts: SmallVec<[u64; 3]>,
    pub origin: SmallVec<[f64; 3]>,
    pub deltas: Vec<SmallVec<[f64; 3]>>,
}

/// One object's header text plus the fields extracted from its header line.
#[derive(Clone, Debug)]
pub struct ObjectRecord {
    /// Object id (number or name) from the header line
    pub id: String,
    /// Object class
    pub class: ObjectClass,
    /// Starting byte of the description in the source file
    pub start: u64,
    /// Byte next to the last byte of the description
    pub end: u64,
    /// Verbatim description text (header line plus attribute/geometry lines)
    pub description: String,
    /// DX rank, when declared
    pub rank: Option<u32>,
    /// DX shape; 0 when rank is absent or 0
    pub shape: u32,
    /// Number of data items; 0 when there is no data
    pub items: u64,
    /// Element type of the data part, when declared
    pub data_type: Option<DataType>,
    /// Data representation; only meaningful for array/constantarray objects
    pub data_repr: Option<DataRepr>,
    /// Data clause, when the header carries one
    pub data_addr: Option<DataAddress>,
    header_line: Option<usize>,
}

impl ObjectRecord {
    /// Build a record from a description block scanned out of a file.
    ///
    /// All header-line fields are extracted here; the record is immutable
    /// afterwards.
    pub fn parse(start: u64, end: u64, description: String) -> Result<Self> {
        let lines: Vec<&str> = description.lines().map(str::trim).collect();
        let header_line = lines.iter().position(|l| RE_OBJECT.is_match(l));

        let mut id = String::new();
        let mut class = ObjectClass::Other(String::new());
        let mut rank: Option<u32> = None;
        let mut shape = 0u32;
        let mut items = 0u64;
        let mut data_type: Option<DataType> = None;
        let mut data_repr: Option<DataRepr> = None;
        let mut data_addr: Option<DataAddress> = None;

        // Preamble before the first object line parses to an empty record.
        if let Some(hdr_idx) = header_line {
            let h = lines[hdr_idx];

            if let Some(c) = RE_CLASS
                .captures(h)
                .or_else(|| RE_CLASS_QUOTED.captures(h))
            {
                class = ObjectClass::from_keyword(&c[1]);
            }
            if let Some(c) = RE_ID_QUOTED.captures(h).or_else(|| RE_ID.captures(h)) {
                id = c[1].to_string();
            }

            if let Some(c) = RE_RANK.captures(h) {
                rank = Some(parse_int(&c[1], h)? as u32);
            }
            if rank.unwrap_or(0) > 0 {
                if let Some(c) = RE_SHAPE.captures(h) {
                    shape = parse_int(&c[1], h)? as u32;
                }
            }
            if let Some(c) = RE_ITEMS.captures(h) {
                items = parse_int(&c[1], h)?;
            }
            if let Some(c) = RE_TYPE.captures(h) {
                data_type = match &c[1] {
                    "float" => Some(DataType::Float),
                    "int" => Some(DataType::Int),
                    // tolerated until the length of the data block is needed
                    _ => None,
                };
            }

            if matches!(class, ObjectClass::Array | ObjectClass::ConstantArray) {
                data_repr = Some(if RE_IEEE.is_match(h) {
                    if RE_MSB.is_match(h) {
                        DataRepr::Msb
                    } else if RE_LSB.is_match(h) {
                        DataRepr::Lsb
                    } else {
                        DataRepr::Ieee
                    }
                } else {
                    DataRepr::Ascii
                });
            }

            if let Some(c) = RE_DATA_EXT.captures(h) {
                data_addr = Some(DataAddress::External {
                    file: c[1].to_string(),
                    offset: parse_int(&c[2], h)?,
                });
            } else if let Some(c) = RE_DATA.captures(h) {
                let addr = &c[1];
                if addr == "follows" {
                    data_addr = Some(DataAddress::Follows);
                } else {
                    data_addr = Some(DataAddress::Internal(parse_int(addr, h)?));
                }
            } else if RE_DATA_CLAUSE.is_match(h) {
                return Err(Error::header(format!("unparseable data clause: {h}")));
            }
        }

        Ok(Self {
            id,
            class,
            start,
            end,
            description,
            rank,
            shape,
            items,
            data_type,
            data_repr,
            data_addr,
            header_line,
        })
    }

    /// True if the header line carries a data clause.
    #[inline]
    pub fn has_data(&self) -> bool {
        self.data_addr.is_some()
    }

    /// Trimmed description lines.
    pub fn description_lines(&self) -> impl Iterator<Item = &str> {
        self.description.lines().map(str::trim)
    }

    /// Length of the data part backing this object.
    ///
    /// ASCII data is measured in lines, binary data in bytes. Only `array`
    /// objects carry measurable data; everything else has length 0.
    pub fn data_length(&self) -> Result<u64> {
        if self.class != ObjectClass::Array {
            return Ok(0);
        }
        if self.data_repr == Some(DataRepr::Ascii) {
            return Ok(self.items);
        }
        let unit = match self.data_type {
            Some(DataType::Float) | Some(DataType::Int) => 4u64,
            _ => {
                return Err(Error::UnsupportedDataType(format!(
                    "object {}: only float and int arrays are supported",
                    self.id
                )))
            }
        };
        let rank = u64::from(self.rank.unwrap_or(0));
        let factor = if rank > 0 {
            (rank * u64::from(self.shape)).max(1)
        } else {
            1
        };
        Ok(unit * factor * self.items)
    }

    /// Counts, origin and deltas of a regular grid object.
    ///
    /// Hard failure when the header has no counts or the description lacks
    /// an `origin` or `delta` line; callers that need geometry cannot fall
    /// back to defaults.
    pub fn regarray_params(&self) -> Result<RegArrayParams> {
        let hdr_idx = self
            .header_line
            .ok_or_else(|| Error::header("object without a header line".to_string()))?;
        let lines: Vec<&str> = self.description_lines().collect();
        let h = lines[hdr_idx];

        let counts_cap = RE_COUNTS
            .captures(h)
            .ok_or_else(|| Error::header(format!("object {}: no counts in: {h}", self.id)))?;
        let counts = counts_cap[1]
            .split_whitespace()
            .map(|t| parse_int(t, h))
            .collect::<Result<SmallVec<[u64; 3]>>>()?;

        let mut origin: Option<SmallVec<[f64; 3]>> = None;
        let mut deltas: Vec<SmallVec<[f64; 3]>> = Vec::new();
        for line in &lines {
            if let Some(c) = RE_ORIGIN.captures(line) {
                origin = Some(parse_floats(&c[1], line)?);
            }
            if let Some(c) = RE_DELTA.captures(line) {
                deltas.push(parse_floats(&c[1], line)?);
            }
        }
        let origin = origin.ok_or_else(|| {
            Error::header(format!("object {}: regular grid without origin", self.id))
        })?;
        if deltas.is_empty() {
            return Err(Error::header(format!(
                "object {}: regular grid without deltas",
                self.id
            )));
        }
        Ok(RegArrayParams {
            counts,
            origin,
            deltas,
        })
    }

    /// Value of a string attribute, e.g. `attribute "name" string "3D"`.
    pub fn str_attribute(&self, name: &str) -> Option<String> {
        for line in self.description_lines() {
            if let Some(c) = RE_STR_ATTR.captures(line) {
                if &c[1] == name {
                    return Some(c[2].to_string());
                }
            }
        }
        None
    }

    /// Id of a named field component, e.g. `component "data" value 3`.
    ///
    /// Both the `value` syntax and the bare form without the keyword occur.
    pub fn component_id(&self, name: &str) -> Option<String> {
        let quoted = regex::escape(name);
        let with_value =
            Regex::new(&format!(r#"^component\s+"{quoted}"\s+value\s+(\w+)"#)).ok()?;
        let bare = Regex::new(&format!(r#"^component\s+"{quoted}"\s+(\w+)"#)).ok()?;
        for line in self.description_lines() {
            if let Some(c) = with_value.captures(line).or_else(|| bare.captures(line)) {
                return Some(c[1].to_string());
            }
        }
        None
    }

    /// Inline ASCII data of a `data follows` object: one line per item,
    /// whitespace-separated floats, directly after the header line.
    pub fn inline_data(&self) -> Result<Vec<f64>> {
        if self.data_addr != Some(DataAddress::Follows) {
            return Err(Error::header(format!(
                "object {}: data is not inlined",
                self.id
            )));
        }
        let hdr_idx = self.header_line.unwrap_or(0);
        let lines: Vec<&str> = self.description_lines().collect();
        let n_lines = self.data_length()? as usize;
        let mut data = Vec::new();
        for i in 0..n_lines {
            let line = lines.get(hdr_idx + 1 + i).ok_or_else(|| {
                Error::header(format!(
                    "object {}: inline data truncated at line {i}",
                    self.id
                ))
            })?;
            for tok in line.split_whitespace() {
                data.push(parse_float(tok, line)?);
            }
        }
        Ok(data)
    }
}

fn parse_int(tok: &str, line: &str) -> Result<u64> {
    tok.parse()
        .map_err(|_| Error::header(format!("bad integer {tok:?} in: {line}")))
}

fn parse_float(tok: &str, line: &str) -> Result<f64> {
    tok.parse()
        .map_err(|_| Error::header(format!("bad float {tok:?} in: {line}")))
}

fn parse_floats(s: &str, line: &str) -> Result<SmallVec<[f64; 3]>> {
    s.split_whitespace().map(|t| parse_float(t, line)).collect()
}
