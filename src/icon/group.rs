use crate::pe::reader::{Cursor, read_u16_le};

const GROUP_HEADER_LEN: usize = 6;
const GROUP_ENTRY_LEN: usize = 14;

/// One frame listed in an `RT_GROUP_ICON` resource (a `GRPICONDIRENTRY`).
///
/// `width` and `height` are already normalized: a stored 0 means 256.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupIconEntry {
    pub width: u16,
    pub height: u16,
    pub color_count: u8,
    pub planes: u16,
    pub bit_count: u16,
    pub bytes_in_res: u32,
    /// Resource ID of the matching `RT_ICON` entry.
    pub id: u16,
}

impl GroupIconEntry {
    /// Ranking score: `width * height * 10 + bit_count`.
    ///
    /// Area dominates, so a large low-depth frame beats a small high-depth one.
    pub fn score(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * 10 + u64::from(self.bit_count)
    }
}

fn normalize_dimension(raw: u8) -> u16 {
    if raw == 0 { 256 } else { u16::from(raw) }
}

/// Parse a `GRPICONDIR` buffer into its frame entries.
///
/// Trailing records that don't fit are dropped.
pub fn parse_group_icons(buf: &[u8]) -> Vec<GroupIconEntry> {
    if buf.len() < GROUP_HEADER_LEN {
        return Vec::new();
    }
    let Some(count) = read_u16_le(buf, 4) else {
        return Vec::new();
    };

    let mut entries = Vec::with_capacity(usize::from(count));
    let mut cursor = Cursor::new(buf, GROUP_HEADER_LEN);
    for _ in 0..count {
        if !cursor.has(GROUP_ENTRY_LEN) {
            break;
        }
        match read_entry(&mut cursor) {
            Some(entry) => entries.push(entry),
            None => break,
        }
    }

    entries
}

fn read_entry(cursor: &mut Cursor<'_>) -> Option<GroupIconEntry> {
    let width = normalize_dimension(cursor.read_u8()?);
    let height = normalize_dimension(cursor.read_u8()?);
    let color_count = cursor.read_u8()?;
    cursor.skip(1)?; // reserved
    Some(GroupIconEntry {
        width,
        height,
        color_count,
        planes: cursor.read_u16()?,
        bit_count: cursor.read_u16()?,
        bytes_in_res: cursor.read_u32()?,
        id: cursor.read_u16()?,
    })
}

/// Pick the highest-scoring frame; on ties the earliest entry wins.
pub fn pick_best(entries: &[GroupIconEntry]) -> Option<&GroupIconEntry> {
    let mut best: Option<&GroupIconEntry> = None;
    for entry in entries {
        if best.is_none_or(|current| entry.score() > current.score()) {
            best = Some(entry);
        }
    }
    best
}
