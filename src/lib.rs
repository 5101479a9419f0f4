//! # exe-icon
//!
//! Extract the display icon of a Windows PE executable on any platform, without
//! Windows APIs or a PE library, and pick which executable in a game folder to
//! take it from.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use exe_icon::icon::IconImage;
//! use exe_icon::pipeline::{extract_exe_icon, resolve_exe};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     // A game folder: choose the most likely game executable
//!     let exe = resolve_exe(Path::new("./games/CoolGame"), Some("Cool Game"))
//!         .ok_or_else(|| anyhow::anyhow!("no executable"))?;
//!
//!     match extract_exe_icon(&exe) {
//!         // Embedded PNGs are written verbatim, DIB frames are encoded
//!         Some(image) => std::fs::write("icon.png", image.to_png()?)?,
//!         None => println!("no icon, using the default"),
//!     }
//!
//!     if let Some(IconImage::Bitmap(bitmap)) = extract_exe_icon(&exe) {
//!         println!("raw RGBA: {}x{}, {} bytes", bitmap.width, bitmap.height, bitmap.rgba.len());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Lower-Level Usage
//!
//! ```rust,no_run
//! use exe_icon::icon::{decode, resolve_icon_bytes};
//!
//! let bytes = std::fs::read("Game.exe").unwrap();
//! if let Some(resource) = resolve_icon_bytes(&bytes) {
//!     println!("frame {}: {}x{} @ {}bpp", resource.entry.id,
//!         resource.entry.width, resource.entry.height, resource.entry.bit_count);
//!     let image = decode(resource.bytes, Some(&resource.entry));
//!     println!("decoded: {:?}", image.map(|i| i.kind()));
//! }
//! ```
//!
//! ## Supported Frames
//!
//! | Frame | Handling |
//! |-------|----------|
//! | Embedded PNG | Returned verbatim |
//! | DIB 1/4/8 bpp | Palette lookup, AND mask transparency |
//! | DIB 24 bpp | Opaque RGB, AND mask transparency |
//! | DIB 32 bpp | BGRA; all-zero alpha falls back to the AND mask |
//! | RLE / JPEG / PNG-in-DIB | Not supported (`None`) |
//!
//! ## Modules
//!
//! - [`pe`]: bounds-checked reads, PE headers and the resource directory
//! - [`icon`]: icon group selection, frame lookup and decoding
//! - [`candidates`]: choosing the game executable among several `.exe` files
//! - [`pipeline`]: file-level entry points and PNG output
//! - [`config`]: output configuration loading/saving

pub mod candidates;
pub mod config;
pub mod icon;
pub mod pe;
pub mod pipeline;

#[cfg(test)]
mod fixtures;
