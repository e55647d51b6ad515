//! Minimal TIFF structure reader for EXIF blocks.
//! Operates on slices; every read is bounds-checked and returns `None` on underrun.

/// TIFF magic number.
pub const TIFF_MAGIC: u16 = 0x002A;
/// Little-endian byte order marker ("II").
pub const TIFF_LITTLE: [u8; 2] = *b"II";
/// Big-endian byte order marker ("MM").
pub const TIFF_BIG: [u8; 2] = *b"MM";

/// Prefix of an EXIF APP1 payload / WebP EXIF chunk before the TIFF header.
pub const EXIF_PREFIX: &[u8] = b"Exif\0\0";

/// TIFF field types.
pub const TYPE_BYTE: u16 = 1;
pub const TYPE_ASCII: u16 = 2;
pub const TYPE_SHORT: u16 = 3;
pub const TYPE_LONG: u16 = 4;
pub const TYPE_RATIONAL: u16 = 5;
pub const TYPE_SBYTE: u16 = 6;
pub const TYPE_UNDEFINED: u16 = 7;
pub const TYPE_SSHORT: u16 = 8;
pub const TYPE_SLONG: u16 = 9;
pub const TYPE_SRATIONAL: u16 = 10;
pub const TYPE_FLOAT: u16 = 11;
pub const TYPE_DOUBLE: u16 = 12;

/// Size of TIFF header in bytes.
pub const TIFF_HEADER_LEN: usize = 8;
/// Size of one IFD entry in bytes.
pub const IFD_ENTRY_LEN: usize = 12;
/// Upper bound on entries per IFD; larger counts are treated as corrupt.
pub const MAX_IFD_ENTRIES: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Size in bytes of one value of a TIFF field type.
#[inline]
pub fn type_unit_size(field_type: u16) -> Option<usize> {
    match field_type {
        TYPE_BYTE | TYPE_ASCII | TYPE_SBYTE | TYPE_UNDEFINED => Some(1),
        TYPE_SHORT | TYPE_SSHORT => Some(2),
        TYPE_LONG | TYPE_SLONG | TYPE_FLOAT => Some(4),
        TYPE_RATIONAL | TYPE_SRATIONAL | TYPE_DOUBLE => Some(8),
        _ => None,
    }
}

impl Endian {
    #[inline]
    pub fn read_u16(self, data: &[u8], offset: usize) -> Option<u16> {
        let bytes: [u8; 2] = data.get(offset..offset.checked_add(2)?)?.try_into().ok()?;
        Some(match self {
            Endian::Little => u16::from_le_bytes(bytes),
            Endian::Big => u16::from_be_bytes(bytes),
        })
    }

    #[inline]
    pub fn read_u32(self, data: &[u8], offset: usize) -> Option<u32> {
        let bytes: [u8; 4] = data.get(offset..offset.checked_add(4)?)?.try_into().ok()?;
        Some(match self {
            Endian::Little => u32::from_le_bytes(bytes),
            Endian::Big => u32::from_be_bytes(bytes),
        })
    }

    #[inline]
    pub fn read_u64(self, data: &[u8], offset: usize) -> Option<u64> {
        let bytes: [u8; 8] = data.get(offset..offset.checked_add(8)?)?.try_into().ok()?;
        Some(match self {
            Endian::Little => u64::from_le_bytes(bytes),
            Endian::Big => u64::from_be_bytes(bytes),
        })
    }
}

/// Check the TIFF header and return (byte order, IFD0 offset).
pub fn read_tiff_header(data: &[u8]) -> Option<(Endian, u32)> {
    if data.len() < TIFF_HEADER_LEN {
        return None;
    }
    let bo = match [data[0], data[1]] {
        TIFF_LITTLE => Endian::Little,
        TIFF_BIG => Endian::Big,
        _ => return None,
    };
    if bo.read_u16(data, 2)? != TIFF_MAGIC {
        return None;
    }
    let ifd0 = bo.read_u32(data, 4)?;
    Some((bo, ifd0))
}

/// Strip the `Exif\0\0` prefix when present, leaving the TIFF block.
pub fn strip_exif_prefix(data: &[u8]) -> &[u8] {
    data.strip_prefix(EXIF_PREFIX).unwrap_or(data)
}

/// Single IFD entry (tag, type, count, value/offset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfdEntry {
    pub tag: u16,
    pub field_type: u16,
    pub count: u32,
    pub value_offset: u32,
    /// Position of this entry inside the TIFF block (inline values live at `position + 8`).
    pub position: usize,
}

/// Read one IFD entry at `offset` (needs 12 bytes).
pub fn read_ifd_entry(bo: Endian, data: &[u8], offset: usize) -> Option<IfdEntry> {
    if data.len().saturating_sub(offset) < IFD_ENTRY_LEN {
        return None;
    }
    Some(IfdEntry {
        tag: bo.read_u16(data, offset)?,
        field_type: bo.read_u16(data, offset + 2)?,
        count: bo.read_u32(data, offset + 4)?,
        value_offset: bo.read_u32(data, offset + 8)?,
        position: offset,
    })
}

/// Raw value bytes of an entry: inline when the total fits in 4 bytes, otherwise at
/// `value_offset`. `None` for unknown types and out-of-bounds references.
pub fn entry_value_bytes<'a>(data: &'a [u8], entry: &IfdEntry) -> Option<&'a [u8]> {
    let unit = type_unit_size(entry.field_type)?;
    let total = unit.checked_mul(entry.count as usize)?;
    let start = if total <= 4 {
        entry.position + 8
    } else {
        entry.value_offset as usize
    };
    data.get(start..start.checked_add(total)?)
}

/// Entries of the IFD at `ifd_offset` plus the offset of the next IFD (0 when none).
pub fn walk_ifd(bo: Endian, data: &[u8], ifd_offset: u32) -> Option<(Vec<IfdEntry>, u32)> {
    let offset = ifd_offset as usize;
    let num_entries = bo.read_u16(data, offset)? as usize;
    if num_entries > MAX_IFD_ENTRIES {
        return None;
    }
    let entries_start = offset + 2;
    let entries_end = entries_start + num_entries * IFD_ENTRY_LEN;
    if entries_end > data.len() {
        return None;
    }
    let next = bo.read_u32(data, entries_end).unwrap_or(0);
    let entries = (0..num_entries)
        .filter_map(|i| read_ifd_entry(bo, data, entries_start + i * IFD_ENTRY_LEN))
        .collect();
    Some((entries, next))
}

/// Offset stored in a pointer tag (Exif IFD, GPS IFD, Interop IFD).
pub fn read_pointer(bo: Endian, data: &[u8], entry: &IfdEntry) -> Option<u32> {
    match entry.field_type {
        TYPE_LONG | TYPE_UNDEFINED if entry.count >= 1 => {
            let bytes = entry_value_bytes(data, entry)?;
            bo.read_u32(bytes, 0)
        }
        _ => None,
    }
}
