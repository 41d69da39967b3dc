//! Whole-file object table for DX files.
//!
//! A DX file is newline-delimited text up to the line holding the `end`
//! keyword; everything after that line is binary data. The table splits the
//! textual part into [`ObjectRecord`]s, keeping exact byte offsets, and
//! records the data clause of every object that has one.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::record::{DataAddress, ObjectClass, ObjectRecord};
use crate::util::{Error, Result};

/// Data clause of one object, in file order.
#[derive(Clone, Debug)]
pub struct DataEntry {
    /// Index of the owning object in [`FileObjectTable::objects`]
    pub object: usize,
    /// Parsed data address from the header line
    pub address: DataAddress,
    /// Data length in bytes (lines for ASCII data)
    pub length: u64,
}

/// All objects of one DX file, in file order.
#[derive(Debug)]
pub struct FileObjectTable {
    /// Source file path
    pub path: PathBuf,
    /// Objects in file order
    pub objects: Vec<ObjectRecord>,
    /// Data clauses in file order; addresses are relative to [`Self::data_start`]
    pub data_entries: Vec<DataEntry>,
    /// Byte offset immediately after the `end` line
    pub data_start: u64,
}

impl FileObjectTable {
    /// Scan a file and split its textual part into object records.
    pub fn parse(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;
        let mut reader = BufReader::new(file);

        let mut objects: Vec<ObjectRecord> = Vec::new();
        let mut data_entries: Vec<DataEntry> = Vec::new();

        // Description text of the object being accumulated, with its start
        // offset. The preamble before the first `object` line belongs to the
        // first record.
        let mut cur_start: u64 = 0;
        let mut cur_text = String::new();
        let mut first_obj = true;

        let mut pos: u64 = 0;
        let mut raw = Vec::new();
        let data_start;
        loop {
            raw.clear();
            let n = reader.read_until(b'\n', &mut raw)?;
            if n == 0 {
                // no `end` keyword: data region is empty, starts at EOF
                data_start = pos;
                break;
            }
            let line = String::from_utf8(raw.clone())?;
            if line == "end\n" || line == "end" {
                data_start = pos + n as u64;
                break;
            }
            if line.starts_with("object") {
                if !first_obj {
                    objects.push(ObjectRecord::parse(
                        cur_start,
                        pos,
                        std::mem::take(&mut cur_text),
                    )?);
                    cur_start = pos;
                }
                first_obj = false;
            }
            cur_text.push_str(&line);
            pos += n as u64;
        }
        objects.push(ObjectRecord::parse(cur_start, pos, cur_text)?);

        for (i, obj) in objects.iter().enumerate() {
            if let Some(addr) = &obj.data_addr {
                data_entries.push(DataEntry {
                    object: i,
                    address: addr.clone(),
                    length: obj.data_length()?,
                });
            }
        }

        debug!(
            path = %path.display(),
            objects = objects.len(),
            data_entries = data_entries.len(),
            data_start,
            "parsed DX object table"
        );
        Ok(Self {
            path: path.to_path_buf(),
            objects,
            data_entries,
            data_start,
        })
    }

    /// Find an object by its id.
    pub fn find_by_id(&self, id: &str) -> Option<&ObjectRecord> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// All `field` objects in the file.
    pub fn fields(&self) -> impl Iterator<Item = &ObjectRecord> {
        self.objects
            .iter()
            .filter(|o| o.class == ObjectClass::Field)
    }

    /// First object of a given class, if any.
    pub fn find_by_class(&self, class: &ObjectClass) -> Option<&ObjectRecord> {
        self.objects.iter().find(|o| &o.class == class)
    }
}
