//! In-memory builders for synthetic PE images, icon groups and DIBs used by tests.

pub const RSRC_FILE_OFFSET: usize = 0x200;
pub const RSRC_RVA: u32 = 0x1000;

const PE_OFFSET: usize = 0x40;
const LANG_EN_US: u32 = 1033;

fn put_u16(buf: &mut [u8], at: usize, value: u16) {
    buf[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

/// One `GRPICONDIRENTRY` to write with [`group_icon_dir`].
#[derive(Debug, Clone, Copy)]
pub struct GroupFrame {
    pub width: u8,
    pub height: u8,
    pub color_count: u8,
    pub bit_count: u16,
    pub bytes_in_res: u32,
    pub id: u16,
}

impl GroupFrame {
    pub fn new(width: u8, height: u8, bit_count: u16, id: u16) -> Self {
        Self {
            width,
            height,
            color_count: 0,
            bit_count,
            bytes_in_res: 0,
            id,
        }
    }
}

/// Serialize a `GRPICONDIR` with the given frames.
pub fn group_icon_dir(frames: &[GroupFrame]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes());
    buf.extend_from_slice(&(frames.len() as u16).to_le_bytes());
    for frame in frames {
        buf.extend_from_slice(&[frame.width, frame.height, frame.color_count, 0]);
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&frame.bit_count.to_le_bytes());
        buf.extend_from_slice(&frame.bytes_in_res.to_le_bytes());
        buf.extend_from_slice(&frame.id.to_le_bytes());
    }
    buf
}

/// A 40-byte `BITMAPINFOHEADER`.
pub fn dib_header(width: i32, height_raw: i32, bit_count: u16, colors_used: u32) -> Vec<u8> {
    let mut buf = vec![0u8; 40];
    put_u32(&mut buf, 0, 40);
    buf[4..8].copy_from_slice(&width.to_le_bytes());
    buf[8..12].copy_from_slice(&height_raw.to_le_bytes());
    put_u16(&mut buf, 12, 1);
    put_u16(&mut buf, 14, bit_count);
    put_u32(&mut buf, 32, colors_used);
    buf
}

/// Builds a PE image with a single `.rsrc` section holding icon resources.
#[derive(Debug, Default)]
pub struct PeBuilder {
    pe32_plus: bool,
    group: Option<(u16, Vec<u8>)>,
    icons: Vec<(u16, Vec<u8>)>,
}

impl PeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pe32_plus(mut self) -> Self {
        self.pe32_plus = true;
        self
    }

    pub fn group_icon(mut self, name_id: u16, data: Vec<u8>) -> Self {
        self.group = Some((name_id, data));
        self
    }

    pub fn icon(mut self, id: u16, data: Vec<u8>) -> Self {
        self.icons.push((id, data));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let rsrc = self.build_rsrc();

        let (magic, opt_size, data_dirs) = if self.pe32_plus {
            (0x20bu16, 240usize, 112usize)
        } else {
            (0x10bu16, 224usize, 96usize)
        };

        let mut buf = vec![0u8; RSRC_FILE_OFFSET];
        buf[0..2].copy_from_slice(b"MZ");
        put_u32(&mut buf, 0x3C, PE_OFFSET as u32);

        buf[PE_OFFSET..PE_OFFSET + 4].copy_from_slice(b"PE\0\0");
        put_u16(&mut buf, PE_OFFSET + 4, if self.pe32_plus { 0x8664 } else { 0x14c });
        put_u16(&mut buf, PE_OFFSET + 6, 1);
        put_u16(&mut buf, PE_OFFSET + 20, opt_size as u16);

        let optional = PE_OFFSET + 24;
        put_u16(&mut buf, optional, magic);
        let resource_dir = optional + data_dirs + 2 * 8;
        put_u32(&mut buf, resource_dir, RSRC_RVA);
        put_u32(&mut buf, resource_dir + 4, rsrc.len() as u32);

        let section = optional + opt_size;
        buf[section..section + 5].copy_from_slice(b".rsrc");
        put_u32(&mut buf, section + 8, rsrc.len() as u32);
        put_u32(&mut buf, section + 12, RSRC_RVA);
        put_u32(&mut buf, section + 16, rsrc.len() as u32);
        put_u32(&mut buf, section + 20, RSRC_FILE_OFFSET as u32);

        buf.extend_from_slice(&rsrc);
        buf
    }

    /// Lay out root → type → name/ID → language → data entry → blob.
    fn build_rsrc(&self) -> Vec<u8> {
        // (type id, [(name id, blob)])
        let mut types: Vec<(u16, Vec<(u16, &[u8])>)> = Vec::new();
        if !self.icons.is_empty() {
            let icons = self.icons.iter().map(|(id, data)| (*id, data.as_slice())).collect();
            types.push((3, icons));
        }
        if let Some((id, data)) = &self.group {
            types.push((14, vec![(*id, data.as_slice())]));
        }

        let dir_len = |entries: usize| 16 + entries * 8;
        let leaves: usize = types.iter().map(|(_, names)| names.len()).sum();

        let mut cursor = dir_len(types.len());
        let mut type_dirs = Vec::new();
        for (_, names) in &types {
            type_dirs.push(cursor);
            cursor += dir_len(names.len());
        }
        let mut lang_dirs = Vec::new();
        for _ in 0..leaves {
            lang_dirs.push(cursor);
            cursor += dir_len(1);
        }
        let data_entries = cursor;
        cursor += leaves * 16;
        let mut blobs = Vec::new();
        for (_, names) in &types {
            for (_, blob) in names {
                blobs.push(cursor);
                cursor += blob.len();
            }
        }

        let mut rsrc = vec![0u8; cursor];
        write_dir(
            &mut rsrc,
            0,
            &types
                .iter()
                .zip(&type_dirs)
                .map(|((type_id, _), at)| (u32::from(*type_id), 0x8000_0000 | *at as u32))
                .collect::<Vec<_>>(),
        );

        let mut leaf = 0;
        for ((_, names), at) in types.iter().zip(&type_dirs) {
            let mut entries = Vec::new();
            for (name_id, blob) in names {
                entries.push((u32::from(*name_id), 0x8000_0000 | lang_dirs[leaf] as u32));
                let entry = data_entries + leaf * 16;
                write_dir(&mut rsrc, lang_dirs[leaf], &[(LANG_EN_US, entry as u32)]);

                put_u32(&mut rsrc, entry, RSRC_RVA + blobs[leaf] as u32);
                put_u32(&mut rsrc, entry + 4, blob.len() as u32);
                rsrc[blobs[leaf]..blobs[leaf] + blob.len()].copy_from_slice(blob);
                leaf += 1;
            }
            write_dir(&mut rsrc, *at, &entries);
        }

        rsrc
    }
}

fn write_dir(buf: &mut [u8], at: usize, entries: &[(u32, u32)]) {
    put_u16(buf, at + 14, entries.len() as u16);
    for (i, (name, data)) in entries.iter().enumerate() {
        put_u32(buf, at + 16 + i * 8, *name);
        put_u32(buf, at + 16 + i * 8 + 4, *data);
    }
}
