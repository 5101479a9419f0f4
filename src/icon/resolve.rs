use crate::pe::{self, PeImage, RT_GROUP_ICON, RT_ICON, ResourceDirEntry};

use super::group::{GroupIconEntry, parse_group_icons, pick_best};

/// Raw bytes of the chosen icon frame plus the group entry that selected it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconResource<'a> {
    pub bytes: &'a [u8],
    pub entry: GroupIconEntry,
}

/// Locate the best icon frame in a PE image.
///
/// Walks `RT_GROUP_ICON` to pick a frame, then fetches the `RT_ICON` resource
/// whose ID matches it. Any missing or malformed step yields `None`, never a
/// partial result.
pub fn resolve_icon_bytes(buf: &[u8]) -> Option<IconResource<'_>> {
    let pe = pe::parse_pe(buf)?;
    let Some(root) = pe::read_dir(buf, pe.resource_base, 0) else {
        log::debug!("resource root directory is truncated");
        return None;
    };

    let Some(group_type) = find_type(&root, RT_GROUP_ICON) else {
        log::debug!("no RT_GROUP_ICON resources");
        return None;
    };
    let group_leaf = descend_first(buf, &pe, group_type)?;
    let group_data = pe::read_data_entry(buf, pe.resource_base, group_leaf.offset, &pe.sections)?;
    let groups = parse_group_icons(group_data.slice(buf));
    let Some(entry) = pick_best(&groups).copied() else {
        log::debug!("icon group lists no frames");
        return None;
    };

    let Some(icon_type) = find_type(&root, RT_ICON) else {
        log::debug!("no RT_ICON resources");
        return None;
    };
    let names = pe::read_dir(buf, pe.resource_base, icon_type.offset)?;
    let Some(icon_name) = pe::find_dir(&names, entry.id) else {
        log::debug!("no RT_ICON resource with id {}", entry.id);
        return None;
    };
    let languages = pe::read_dir(buf, pe.resource_base, icon_name.offset)?;
    let icon_leaf = pe::first_id_or_first(&languages, false)?;
    let icon_data = pe::read_data_entry(buf, pe.resource_base, icon_leaf.offset, &pe.sections)?;

    let bytes = icon_data.slice(buf);
    if bytes.is_empty() {
        log::debug!("RT_ICON resource {} is empty", entry.id);
        return None;
    }

    Some(IconResource { bytes, entry })
}

fn find_type(root: &[ResourceDirEntry], type_id: u16) -> Option<&ResourceDirEntry> {
    root.iter().find(|entry| entry.id == Some(type_id) && entry.is_dir)
}

/// Descend name/ID then language level, taking the first ID-bearing entry at each.
fn descend_first(
    buf: &[u8],
    pe: &PeImage,
    type_entry: &ResourceDirEntry,
) -> Option<ResourceDirEntry> {
    let names = pe::read_dir(buf, pe.resource_base, type_entry.offset)?;
    let name = pe::first_id_or_first(&names, true)?;
    let languages = pe::read_dir(buf, pe.resource_base, name.offset)?;
    pe::first_id_or_first(&languages, false).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{GroupFrame, PeBuilder, group_icon_dir};

    #[test]
    fn resolves_matching_icon_frame() {
        let group = group_icon_dir(&[
            GroupFrame::new(16, 16, 32, 1),
            GroupFrame::new(32, 32, 32, 2),
        ]);
        let buf = PeBuilder::new()
            .group_icon(101, group)
            .icon(1, b"small".to_vec())
            .icon(2, b"large".to_vec())
            .build();

        let resource = resolve_icon_bytes(&buf).unwrap();
        assert_eq!(resource.bytes, b"large");
        assert_eq!(resource.entry.id, 2);
        assert_eq!(resource.entry.width, 32);
    }

    #[test]
    fn missing_icon_id_is_none() {
        let group = group_icon_dir(&[GroupFrame::new(32, 32, 32, 5)]);
        let buf = PeBuilder::new()
            .group_icon(1, group)
            .icon(4, b"other".to_vec())
            .build();
        assert_eq!(resolve_icon_bytes(&buf), None);
    }

    #[test]
    fn missing_group_is_none() {
        let buf = PeBuilder::new().icon(1, b"orphan".to_vec()).build();
        assert_eq!(resolve_icon_bytes(&buf), None);
    }

    #[test]
    fn empty_group_is_none() {
        let buf = PeBuilder::new()
            .group_icon(1, group_icon_dir(&[]))
            .icon(1, b"unused".to_vec())
            .build();
        assert_eq!(resolve_icon_bytes(&buf), None);
    }

    #[test]
    fn empty_icon_data_is_none() {
        let group = group_icon_dir(&[GroupFrame::new(16, 16, 32, 1)]);
        let buf = PeBuilder::new().group_icon(1, group).icon(1, Vec::new()).build();
        assert_eq!(resolve_icon_bytes(&buf), None);
    }

    #[test]
    fn truncated_file_is_none() {
        let group = group_icon_dir(&[GroupFrame::new(16, 16, 32, 1)]);
        let mut buf = PeBuilder::new()
            .group_icon(1, group)
            .icon(1, vec![0xAB; 64])
            .build();
        buf.truncate(crate::fixtures::RSRC_FILE_OFFSET + 20);
        assert_eq!(resolve_icon_bytes(&buf), None);
    }
}
