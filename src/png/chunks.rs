//! Chunk walking. A chunk is recorded once its length and type have been read, even when
//! its data runs past the end of the file.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

const CRC_LEN: u64 = 4;

/// One chunk header as found in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PngChunk {
    /// Four ASCII letters, e.g. `IHDR`.
    #[serde(rename = "Type")]
    pub chunk_type: String,
    /// Declared data length (excludes the type and CRC).
    #[serde(rename = "Length")]
    pub length: u32,
}

#[inline]
pub fn is_png(data: &[u8]) -> bool {
    data.starts_with(&PNG_SIGNATURE)
}

/// Walk the chunks of the PNG at `path`. Only failing to open the file is an error;
/// malformed structure ends the walk.
pub fn walk<P: AsRef<Path>>(path: P) -> Result<Vec<PngChunk>> {
    let file = File::open(path)?;
    Ok(walk_reader(BufReader::new(file)))
}

/// Walk chunks from any seekable reader positioned at the start of the file.
pub fn walk_reader<R: Read + Seek>(mut reader: R) -> Vec<PngChunk> {
    let mut chunks = Vec::new();
    let mut signature = [0u8; 8];
    if reader.read_exact(&mut signature).is_err() {
        return chunks;
    }
    loop {
        let mut header = [0u8; 8];
        if reader.read_exact(&mut header).is_err() {
            break;
        }
        let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let Some(chunk_type) = chunk_type_name(&header[4..8]) else {
            tracing::debug!("non-ASCII chunk type, stopping walk");
            break;
        };
        let is_end = chunk_type == "IEND";
        chunks.push(PngChunk { chunk_type, length });
        if is_end {
            break;
        }
        if reader
            .seek(SeekFrom::Current(i64::from(length) + CRC_LEN as i64))
            .is_err()
        {
            break;
        }
    }
    chunks
}

/// Walk chunks of an in-memory file.
pub fn walk_bytes(data: &[u8]) -> Vec<PngChunk> {
    walk_reader(std::io::Cursor::new(data))
}

fn chunk_type_name(raw: &[u8]) -> Option<String> {
    if raw.is_ascii() {
        std::str::from_utf8(raw).ok().map(str::to_string)
    } else {
        None
    }
}

/// Iterator over `(type, data)` of complete chunks in an in-memory PNG. Stops at `IEND`
/// or at the first chunk whose data is truncated.
pub struct Chunks<'a> {
    data: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> Chunks<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: PNG_SIGNATURE.len(),
            done: !is_png(data),
        }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let header = self.data.get(self.pos..self.pos + 8);
        let Some(header) = header else {
            self.done = true;
            return None;
        };
        let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let kind = &header[4..8];
        let start = self.pos + 8;
        let Some(body) = start
            .checked_add(length)
            .and_then(|end| self.data.get(start..end))
        else {
            self.done = true;
            return None;
        };
        self.pos = start + length + CRC_LEN as usize;
        if kind == b"IEND" {
            self.done = true;
        }
        Some((kind, body))
    }
}
