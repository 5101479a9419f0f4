//! Minimal PE parsing: just enough to reach the resource tree.
//!
//! - [`reader`]: bounds-checked little-endian reads and a record [`Cursor`](reader::Cursor)
//! - [`parse_pe`]: DOS/PE header validation and section table
//! - [`read_dir`] / [`read_data_entry`]: the 3-level resource directory (type → name/ID → language)
//!
//! Nothing here panics or errors on malformed input; every step returns `None`.

pub mod reader;

mod headers;
mod resource;

pub use headers::{PeImage, Section, parse_pe, rva_to_offset};
pub use resource::{
    DataEntry, RT_GROUP_ICON, RT_ICON, ResourceDirEntry, find_dir, first_id_or_first,
    read_data_entry, read_dir,
};
