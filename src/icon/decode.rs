use std::io::Cursor as IoCursor;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, ImageReader, RgbaImage};

use crate::pe::reader::{read_bytes, read_i32_le, read_u16_le, read_u32_le};

use super::group::GroupIconEntry;

/// The 8-byte PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

const MIN_DIB_HEADER_LEN: u32 = 40;

/// An RGBA8 image with rows in top-down order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBitmap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl DecodedBitmap {
    /// The RGBA value at `(x, y)`, with `y = 0` the top row.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = ((y as usize * self.width as usize) + x as usize) * 4;
        let px = self.rgba.get(at..at + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// A decoded icon frame.
///
/// Embedded PNG frames are passed through untouched; legacy DIB frames are
/// decoded into an RGBA bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconImage {
    /// A ready-to-use PNG file.
    Png(Vec<u8>),
    Bitmap(DecodedBitmap),
}

impl IconImage {
    /// `"png"` for passthrough frames, `"bitmap"` for decoded DIBs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Png(_) => "png",
            Self::Bitmap(_) => "bitmap",
        }
    }

    /// Width and height. For PNG frames this reads the image header only.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Self::Png(bytes) => ImageReader::with_format(IoCursor::new(bytes), ImageFormat::Png)
                .into_dimensions()
                .ok(),
            Self::Bitmap(bitmap) => Some((bitmap.width, bitmap.height)),
        }
    }

    /// PNG file bytes: passthrough frames verbatim, bitmaps encoded.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        match self {
            Self::Png(bytes) => Ok(bytes.clone()),
            Self::Bitmap(bitmap) => {
                let image = RgbaImage::from_raw(bitmap.width, bitmap.height, bitmap.rgba.clone())
                    .context("Bitmap buffer does not match its dimensions")?;
                let mut out = IoCursor::new(Vec::new());
                image
                    .write_to(&mut out, ImageFormat::Png)
                    .context("Failed to encode bitmap as PNG")?;
                Ok(out.into_inner())
            }
        }
    }

    /// A `data:image/png;base64,...` URL of [`to_png`](Self::to_png).
    pub fn to_data_url(&self) -> Result<String> {
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(self.to_png()?)))
    }
}

/// Whether `bytes` start with the PNG signature.
pub fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(&PNG_SIGNATURE)
}

/// Classify and decode a raw `RT_ICON` frame.
///
/// PNG frames are returned as-is without touching the DIB decoder. Anything
/// else is decoded as an uncompressed DIB; `entry` supplies the expected frame
/// height for the doubled-height reconciliation.
pub fn decode(raw: &[u8], entry: Option<&GroupIconEntry>) -> Option<IconImage> {
    if is_png(raw) {
        return Some(IconImage::Png(raw.to_vec()));
    }
    decode_dib(raw, entry.map(|entry| u32::from(entry.height))).map(IconImage::Bitmap)
}

struct DibLayout {
    width: usize,
    height: usize,
    /// Rows are stored bottom-to-top and must be reversed.
    flip: bool,
    bit_count: u16,
    palette: Vec<[u8; 3]>,
    pixel_offset: usize,
    row_stride: usize,
    /// Offset of the AND mask, if the whole mask fits in the buffer.
    mask_offset: Option<usize>,
    mask_stride: usize,
}

/// Decode an icon DIB (BITMAPINFOHEADER + palette + XOR pixels + AND mask).
///
/// Supports uncompressed 1, 4, 8, 24 and 32 bits per pixel.
pub fn decode_dib(buf: &[u8], entry_height: Option<u32>) -> Option<DecodedBitmap> {
    let layout = read_layout(buf, entry_height)?;
    let mut rgba = vec![0u8; layout.width.checked_mul(layout.height)?.checked_mul(4)?];
    let mut alpha_has_value = false;

    for y in 0..layout.height {
        let src_row = if layout.flip { layout.height - 1 - y } else { y };
        let row = &buf[layout.pixel_offset + src_row * layout.row_stride..][..layout.row_stride];
        let out_row = &mut rgba[y * layout.width * 4..(y + 1) * layout.width * 4];

        for (x, dest) in out_row.chunks_exact_mut(4).enumerate() {
            let pixel = match layout.bit_count {
                32 => {
                    let src = &row[x * 4..x * 4 + 4];
                    alpha_has_value |= src[3] != 0;
                    [src[2], src[1], src[0], src[3]]
                }
                24 => {
                    let src = &row[x * 3..x * 3 + 3];
                    [src[2], src[1], src[0], 255]
                }
                8 => layout.indexed(row[x]),
                4 => {
                    let byte = row[x / 2];
                    layout.indexed(if x % 2 == 0 { byte >> 4 } else { byte & 0x0F })
                }
                1 => layout.indexed((row[x / 8] >> (7 - (x % 8))) & 1),
                _ => return None,
            };
            dest.copy_from_slice(&pixel);
        }
    }

    if let Some(mask_offset) = layout.mask_offset {
        let force_opaque = layout.bit_count == 32 && !alpha_has_value;
        apply_mask(&mut rgba, &buf[mask_offset..], &layout, force_opaque);
    }

    Some(DecodedBitmap {
        width: layout.width as u32,
        height: layout.height as u32,
        rgba,
    })
}

impl DibLayout {
    fn indexed(&self, index: u8) -> [u8; 4] {
        let [r, g, b] = self
            .palette
            .get(usize::from(index))
            .copied()
            .unwrap_or([0, 0, 0]);
        [r, g, b, 255]
    }
}

fn read_layout(buf: &[u8], entry_height: Option<u32>) -> Option<DibLayout> {
    let header_size = read_u32_le(buf, 0)?;
    if header_size < MIN_DIB_HEADER_LEN || header_size as usize > buf.len() {
        log::debug!("DIB header size {header_size} out of range");
        return None;
    }

    let width = read_i32_le(buf, 4)?.unsigned_abs();
    let height_raw = read_i32_le(buf, 8)?;
    let height = reconcile_height(height_raw.unsigned_abs(), entry_height)?;
    if width == 0 {
        return None;
    }

    let planes = read_u16_le(buf, 12)?;
    let bit_count = read_u16_le(buf, 14)?;
    let compression = read_u32_le(buf, 16)?;
    if planes == 0 || !matches!(bit_count, 1 | 4 | 8 | 24 | 32) {
        log::debug!("unsupported DIB: planes {planes}, bit count {bit_count}");
        return None;
    }
    if compression != 0 {
        log::debug!("unsupported DIB compression {compression}");
        return None;
    }

    let palette_offset = header_size as usize;
    let palette = if bit_count <= 8 {
        let colors_used = read_u32_le(buf, 32)?;
        let count = if colors_used != 0 { colors_used as usize } else { 1 << bit_count };
        read_palette(buf, palette_offset, count)?
    } else {
        Vec::new()
    };

    let width = width as usize;
    let height = height as usize;
    let pixel_offset = palette_offset + palette.len() * 4;
    let row_stride = (usize::from(bit_count).checked_mul(width)?.checked_add(31)? / 32) * 4;
    let pixel_size = row_stride.checked_mul(height)?;
    read_bytes(buf, pixel_offset, pixel_size)?;

    let mask_offset = pixel_offset + pixel_size;
    let mask_stride = (width.checked_add(31)? / 32) * 4;
    let mask_fits = mask_stride
        .checked_mul(height)
        .and_then(|mask_size| read_bytes(buf, mask_offset, mask_size))
        .is_some();

    Some(DibLayout {
        width,
        height,
        flip: height_raw > 0,
        bit_count,
        palette,
        pixel_offset,
        row_stride,
        mask_offset: mask_fits.then_some(mask_offset),
        mask_stride,
    })
}

/// Icon DIBs store XOR + AND bitmaps stacked, so the header height is doubled.
fn reconcile_height(height_abs: u32, entry_height: Option<u32>) -> Option<u32> {
    if let Some(expected) = entry_height.filter(|h| *h > 0) {
        if height_abs >= expected && height_abs % expected == 0 {
            return Some(expected);
        }
    }
    if height_abs > 0 && height_abs % 2 == 0 {
        return Some(height_abs / 2);
    }
    log::debug!("cannot reconcile DIB height {height_abs}");
    None
}

fn read_palette(buf: &[u8], offset: usize, count: usize) -> Option<Vec<[u8; 3]>> {
    let Some(bytes) = read_bytes(buf, offset, count.checked_mul(4)?) else {
        log::debug!("DIB palette of {count} entries is truncated");
        return None;
    };
    Some(
        bytes
            .chunks_exact(4)
            .map(|bgra| [bgra[2], bgra[1], bgra[0]])
            .collect(),
    )
}

/// Apply the 1bpp AND mask: set bits punch transparency; with `force_opaque`
/// every unset bit becomes fully opaque.
fn apply_mask(rgba: &mut [u8], mask: &[u8], layout: &DibLayout, force_opaque: bool) {
    for y in 0..layout.height {
        let src_row = if layout.flip { layout.height - 1 - y } else { y };
        let row = &mask[src_row * layout.mask_stride..][..layout.mask_stride];
        for x in 0..layout.width {
            let masked = (row[x / 8] >> (7 - (x % 8))) & 1 == 1;
            let alpha = &mut rgba[(y * layout.width + x) * 4 + 3];
            if masked {
                *alpha = 0;
            } else if force_opaque {
                *alpha = 255;
            }
        }
    }
}
