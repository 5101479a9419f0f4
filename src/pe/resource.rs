use super::headers::{Section, rva_to_offset};
use super::reader::{Cursor, read_bytes, read_u16_le};

/// Resource type ID of individual icon images.
pub const RT_ICON: u16 = 3;
/// Resource type ID of icon group directories.
pub const RT_GROUP_ICON: u16 = 14;

const DIR_HEADER_LEN: usize = 16;
const DIR_ENTRY_LEN: usize = 8;
const DATA_ENTRY_LEN: usize = 16;
const HIGH_BIT: u32 = 0x8000_0000;

/// One entry of a resource directory table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDirEntry {
    /// Numeric ID, or `None` for string-named entries (not resolved here).
    pub id: Option<u16>,
    /// Whether `offset` points at a nested directory rather than a data entry.
    pub is_dir: bool,
    /// Offset relative to the start of the resource section.
    pub offset: u32,
}

/// Read the directory table at `base + rel_offset`.
///
/// Entries are returned in file order (named entries first, then ID entries).
/// Entries that run past the end of the buffer are dropped.
pub fn read_dir(buf: &[u8], base: usize, rel_offset: u32) -> Option<Vec<ResourceDirEntry>> {
    let offset = base.checked_add(rel_offset as usize)?;
    read_bytes(buf, offset, DIR_HEADER_LEN)?;

    let num_named = read_u16_le(buf, offset + 12)?;
    let num_id = read_u16_le(buf, offset + 14)?;
    let total = usize::from(num_named) + usize::from(num_id);

    let mut entries = Vec::with_capacity(total);
    let mut cursor = Cursor::new(buf, offset + DIR_HEADER_LEN);
    for _ in 0..total {
        let (Some(name), Some(data)) = (cursor.read_u32(), cursor.read_u32()) else {
            break;
        };
        entries.push(ResourceDirEntry {
            id: (name & HIGH_BIT == 0).then_some((name & 0xFFFF) as u16),
            is_dir: data & HIGH_BIT != 0,
            offset: data & !HIGH_BIT,
        });
    }

    Some(entries)
}

/// Pick an entry using the "first ID-bearing entry, else the first entry" rule.
///
/// `want_dir` selects whether an ID-bearing entry must be a subdirectory
/// (name/ID level) or a data leaf (language level). Locale is ignored.
pub fn first_id_or_first(
    entries: &[ResourceDirEntry],
    want_dir: bool,
) -> Option<&ResourceDirEntry> {
    entries
        .iter()
        .find(|entry| entry.id.is_some() && entry.is_dir == want_dir)
        .or_else(|| entries.first())
}

/// Find the subdirectory entry with exactly the given numeric ID.
pub fn find_dir(entries: &[ResourceDirEntry], id: u16) -> Option<&ResourceDirEntry> {
    entries.iter().find(|entry| entry.id == Some(id) && entry.is_dir)
}

/// A leaf data entry resolved to a file location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataEntry {
    pub file_offset: usize,
    pub size: u32,
}

impl DataEntry {
    /// The bytes this entry points at, clamped to the end of `buf`.
    pub fn slice<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        let start = self.file_offset.min(buf.len());
        let end = self
            .file_offset
            .saturating_add(self.size as usize)
            .min(buf.len());
        &buf[start..end]
    }
}

/// Read the `IMAGE_RESOURCE_DATA_ENTRY` at `base + offset` and resolve its RVA.
pub fn read_data_entry(
    buf: &[u8],
    base: usize,
    offset: u32,
    sections: &[Section],
) -> Option<DataEntry> {
    let offset = base.checked_add(offset as usize)?;
    read_bytes(buf, offset, DATA_ENTRY_LEN)?;

    let mut cursor = Cursor::new(buf, offset);
    let rva = cursor.read_u32()?;
    let size = cursor.read_u32()?;
    let Some(file_offset) = rva_to_offset(rva, sections) else {
        log::debug!("resource data RVA {rva:#x} is not covered by any section");
        return None;
    };

    Some(DataEntry { file_offset, size })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir_table(entries: &[(u32, u32)], num_named: u16) -> Vec<u8> {
        let mut buf = vec![0u8; DIR_HEADER_LEN];
        buf[12..14].copy_from_slice(&num_named.to_le_bytes());
        let num_id = entries.len() as u16 - num_named;
        buf[14..16].copy_from_slice(&num_id.to_le_bytes());
        for (name, data) in entries {
            buf.extend_from_slice(&name.to_le_bytes());
            buf.extend_from_slice(&data.to_le_bytes());
        }
        buf
    }

    // ── read_dir ─────────────────────────────────────────────────────

    #[test]
    fn reads_id_and_named_entries() {
        let buf = dir_table(
            &[(HIGH_BIT | 0x40, 0x10), (14, HIGH_BIT | 0x20), (3, 0x30)],
            1,
        );
        let entries = read_dir(&buf, 0, 0).unwrap();
        assert_eq!(
            entries,
            vec![
                ResourceDirEntry {
                    id: None,
                    is_dir: false,
                    offset: 0x10,
                },
                ResourceDirEntry {
                    id: Some(14),
                    is_dir: true,
                    offset: 0x20,
                },
                ResourceDirEntry {
                    id: Some(3),
                    is_dir: false,
                    offset: 0x30,
                },
            ]
        );
    }

    #[test]
    fn id_uses_low_sixteen_bits() {
        let buf = dir_table(&[(0x0012_0007, HIGH_BIT | 0x7FFF_FFFF)], 0);
        let entries = read_dir(&buf, 0, 0).unwrap();
        assert_eq!(entries[0].id, Some(7));
        assert_eq!(entries[0].offset, 0x7FFF_FFFF);
        assert!(entries[0].is_dir);
    }

    #[test]
    fn reads_relative_to_base() {
        let mut buf = vec![0xAAu8; 8];
        buf.extend(dir_table(&[(1, 2)], 0));
        let entries = read_dir(&buf, 4, 4).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, Some(1));
    }

    #[test]
    fn truncated_header_is_none() {
        let buf = [0u8; 15];
        assert_eq!(read_dir(&buf, 0, 0), None);
    }

    #[test]
    fn truncated_entries_are_dropped() {
        let mut buf = dir_table(&[(1, 2), (3, 4)], 0);
        buf.truncate(buf.len() - 1);
        let entries = read_dir(&buf, 0, 0).unwrap();
        assert_eq!(entries.len(), 1);
    }

    // ── selection helpers ────────────────────────────────────────────

    #[test]
    fn first_id_or_first_prefers_id_entries() {
        let entries = [
            ResourceDirEntry {
                id: None,
                is_dir: true,
                offset: 1,
            },
            ResourceDirEntry {
                id: Some(5),
                is_dir: true,
                offset: 2,
            },
        ];
        assert_eq!(first_id_or_first(&entries, true).unwrap().offset, 2);
        assert_eq!(first_id_or_first(&entries, false).unwrap().offset, 1);
        assert_eq!(first_id_or_first(&[], true), None);
    }

    #[test]
    fn find_dir_requires_exact_id() {
        let entries = [
            ResourceDirEntry {
                id: Some(1),
                is_dir: true,
                offset: 1,
            },
            ResourceDirEntry {
                id: Some(2),
                is_dir: false,
                offset: 2,
            },
        ];
        assert_eq!(find_dir(&entries, 1).unwrap().offset, 1);
        assert_eq!(find_dir(&entries, 2), None);
        assert_eq!(find_dir(&entries, 3), None);
    }

    // ── read_data_entry ──────────────────────────────────────────────

    #[test]
    fn data_entry_resolves_rva() {
        let sections = [Section {
            virtual_address: 0x1000,
            raw_size: 0x100,
            raw_pointer: 0x20,
        }];
        let mut buf = vec![0u8; 0x40];
        buf[0..4].copy_from_slice(&0x1010u32.to_le_bytes());
        buf[4..8].copy_from_slice(&8u32.to_le_bytes());

        let entry = read_data_entry(&buf, 0, 0, &sections).unwrap();
        assert_eq!(
            entry,
            DataEntry {
                file_offset: 0x30,
                size: 8,
            }
        );
        assert_eq!(entry.slice(&buf).len(), 8);
    }

    #[test]
    fn data_entry_outside_sections_is_none() {
        let mut buf = vec![0u8; 16];
        buf[0..4].copy_from_slice(&0x5000u32.to_le_bytes());
        assert_eq!(read_data_entry(&buf, 0, 0, &[]), None);
    }

    #[test]
    fn data_entry_needs_full_record() {
        let sections = [Section {
            virtual_address: 0,
            raw_size: 0x100,
            raw_pointer: 0,
        }];
        let buf = vec![0u8; 12];
        assert_eq!(read_data_entry(&buf, 0, 0, &sections), None);
    }

    #[test]
    fn slice_clamps_to_buffer() {
        let buf = [1u8, 2, 3, 4];
        let entry = DataEntry {
            file_offset: 2,
            size: 100,
        };
        assert_eq!(entry.slice(&buf), &[3, 4]);
        let entry = DataEntry {
            file_offset: 10,
            size: 1,
        };
        assert!(entry.slice(&buf).is_empty());
    }
}
