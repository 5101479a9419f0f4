use super::reader::{Cursor, read_bytes, read_u16_le, read_u32_le};

const MZ_MAGIC: &[u8; 2] = b"MZ";
const PE_SIGNATURE: &[u8; 4] = b"PE\0\0";
const PE_OFFSET_FIELD: usize = 0x3C;
const MIN_DOS_HEADER_LEN: usize = 64;

const OPTIONAL_MAGIC_PE32: u16 = 0x10b;
const OPTIONAL_MAGIC_PE32_PLUS: u16 = 0x20b;

// Offsets of the data directory array inside the optional header
const DATA_DIRS_PE32: usize = 96;
const DATA_DIRS_PE32_PLUS: usize = 112;
const RESOURCE_DATA_DIR_INDEX: usize = 2;

const SECTION_HEADER_LEN: usize = 40;

/// One section table entry, reduced to what RVA translation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub virtual_address: u32,
    pub raw_size: u32,
    pub raw_pointer: u32,
}

impl Section {
    /// Translate `rva` to a file offset if it falls in
    /// `[virtual_address, virtual_address + raw_size)`.
    pub fn translate(&self, rva: u32) -> Option<usize> {
        let start = u64::from(self.virtual_address);
        let end = start + u64::from(self.raw_size);
        let rva = u64::from(rva);
        if rva < start || rva >= end {
            return None;
        }
        usize::try_from(u64::from(self.raw_pointer) + (rva - start)).ok()
    }
}

/// Resolve an RVA through the section table (first matching section wins).
pub fn rva_to_offset(rva: u32, sections: &[Section]) -> Option<usize> {
    sections.iter().find_map(|section| section.translate(rva))
}

/// The parts of a PE image needed to walk its resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeImage {
    /// File offset of the root resource directory.
    pub resource_base: usize,
    pub sections: Vec<Section>,
}

/// Validate the DOS/PE headers and locate the resource directory.
///
/// Returns `None` for anything that isn't a PE image with a resource table
/// reachable through the section table. Full PE validation is not attempted.
pub fn parse_pe(buf: &[u8]) -> Option<PeImage> {
    if buf.len() < MIN_DOS_HEADER_LEN || !buf.starts_with(MZ_MAGIC) {
        log::debug!("not a PE image: missing MZ header");
        return None;
    }

    let pe_offset = read_u32_le(buf, PE_OFFSET_FIELD)? as usize;
    if read_bytes(buf, pe_offset, 4)? != PE_SIGNATURE {
        log::debug!("not a PE image: bad PE signature at {pe_offset:#x}");
        return None;
    }

    let num_sections = read_u16_le(buf, pe_offset.checked_add(6)?)?;
    let opt_header_size = read_u16_le(buf, pe_offset.checked_add(20)?)?;
    if num_sections == 0 || opt_header_size == 0 {
        log::debug!("PE image has no sections or no optional header");
        return None;
    }

    let optional_offset = pe_offset.checked_add(24)?;
    let section_table = optional_offset.checked_add(usize::from(opt_header_size))?;
    if section_table > buf.len() {
        log::debug!("optional header runs past end of file");
        return None;
    }

    let data_dirs = match read_u16_le(buf, optional_offset)? {
        OPTIONAL_MAGIC_PE32_PLUS => optional_offset + DATA_DIRS_PE32_PLUS,
        OPTIONAL_MAGIC_PE32 => optional_offset + DATA_DIRS_PE32,
        magic => {
            log::debug!("unsupported optional header magic {magic:#x}");
            return None;
        }
    };

    let resource_dir = data_dirs.checked_add(RESOURCE_DATA_DIR_INDEX * 8)?;
    let resource_rva = read_u32_le(buf, resource_dir)?;
    let resource_size = read_u32_le(buf, resource_dir + 4)?;
    if resource_rva == 0 || resource_size == 0 {
        log::debug!("PE image has no resource table");
        return None;
    }

    let sections = read_section_table(buf, section_table, num_sections);
    let Some(resource_base) = rva_to_offset(resource_rva, &sections) else {
        log::debug!("resource RVA {resource_rva:#x} is not covered by any section");
        return None;
    };

    Some(PeImage {
        resource_base,
        sections,
    })
}

/// Read up to `count` section headers; a truncated header ends the table.
fn read_section_table(buf: &[u8], offset: usize, count: u16) -> Vec<Section> {
    let mut sections = Vec::with_capacity(usize::from(count));
    let mut cursor = Cursor::new(buf, offset);

    for _ in 0..count {
        let Some(section) = read_section(buf, cursor.position()) else {
            break;
        };
        sections.push(section);
        if cursor.skip(SECTION_HEADER_LEN).is_none() {
            break;
        }
    }

    sections
}

fn read_section(buf: &[u8], offset: usize) -> Option<Section> {
    read_bytes(buf, offset, SECTION_HEADER_LEN)?;
    let mut fields = Cursor::new(buf, offset + 12);
    Some(Section {
        virtual_address: fields.read_u32()?,
        raw_size: fields.read_u32()?,
        raw_pointer: fields.read_u32()?,
    })
}
