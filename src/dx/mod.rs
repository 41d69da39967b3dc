//! Low-level DX format parsing.
//!
//! [`FileObjectTable::parse`] splits a file into [`ObjectRecord`]s; the
//! records expose the typed header fields the higher-level cube and line
//! stores are built on.

mod record;
mod table;

pub use record::{
    DataAddress, DataRepr, DataType, ObjectClass, ObjectRecord, RegArrayParams,
};
pub use table::{DataEntry, FileObjectTable};
