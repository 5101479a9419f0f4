//! Icon frame selection and decoding.
//!
//! - [`parse_group_icons`] / [`pick_best`]: read an `RT_GROUP_ICON` directory and choose a frame
//! - [`resolve_icon_bytes`]: find the raw `RT_ICON` bytes for that frame inside a PE image
//! - [`decode`]: pass embedded PNG frames through, decode legacy DIB frames to RGBA

mod decode;
mod group;
mod resolve;

pub use decode::{DecodedBitmap, IconImage, PNG_SIGNATURE, decode, decode_dib, is_png};
pub use group::{GroupIconEntry, parse_group_icons, pick_best};
pub use resolve::{IconResource, resolve_icon_bytes};
