//! FIFF tag I/O.
//!
//! A tag is the smallest structural unit of a FIF file.
//! On-disk layout (always big-endian):
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  kind : i32  │  type : u32  │  size : i32  │ next : i32 │  ← 16 bytes
//! ├──────────────────────────────────────────────────────┤
//! │  <size bytes of payload data>                        │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! `next == 0` means the next tag follows immediately (pos + 16 + size).
//! `next  > 0` means seek to byte offset `next`.
//! `next == -1` means there is no next tag (end of sequence).
use std::io::{Read, Seek, SeekFrom};

use anyhow::{bail, ensure, Context, Result};

use super::constants::*;

/// Tag header; the payload is read on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub kind: i32,
    pub ftype: u32,
    pub size: i32,
    pub next: i32,
    /// Byte offset of the header in the file.
    pub pos: u64,
}

impl TagHeader {
    #[inline]
    pub fn data_pos(&self) -> u64 {
        self.pos + 16
    }

    /// Position of the next tag header, `None` at the end of the chain.
    pub fn next_pos(&self) -> Option<u64> {
        match self.next {
            FIFFV_NEXT_SEQ => Some(self.data_pos() + self.size.max(0) as u64),
            n if n > 0 => Some(n as u64),
            _ => None,
        }
    }

    fn from_be(buf: &[u8; 16], pos: u64) -> Self {
        let word = |i: usize| [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]];
        Self {
            kind: i32::from_be_bytes(word(0)),
            ftype: u32::from_be_bytes(word(4)),
            size: i32::from_be_bytes(word(8)),
            next: i32::from_be_bytes(word(12)),
            pos,
        }
    }
}

/// Random-access reader over a FIF byte stream.
pub struct FifReader<R> {
    inner: R,
}

impl<R: Read + Seek> FifReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Read the 16-byte tag header at `pos`.
    pub fn header_at(&mut self, pos: u64) -> Result<TagHeader> {
        self.inner
            .seek(SeekFrom::Start(pos))
            .with_context(|| format!("seek to tag header @ {pos:#x}"))?;
        let mut buf = [0u8; 16];
        self.inner
            .read_exact(&mut buf)
            .with_context(|| format!("read tag header @ {pos:#x}"))?;
        Ok(TagHeader::from_be(&buf, pos))
    }

    /// Whole payload of `tag` as raw bytes.
    pub fn payload(&mut self, tag: &TagHeader) -> Result<Vec<u8>> {
        ensure!(tag.size >= 0, "negative tag size {} @ {:#x}", tag.size, tag.pos);
        self.inner
            .seek(SeekFrom::Start(tag.data_pos()))
            .with_context(|| format!("seek to tag data @ {:#x}", tag.data_pos()))?;
        let mut buf = vec![0u8; tag.size as usize];
        self.inner
            .read_exact(&mut buf)
            .with_context(|| format!("read {} payload bytes @ {:#x}", tag.size, tag.data_pos()))?;
        Ok(buf)
    }

    pub fn read_i32(&mut self, tag: &TagHeader) -> Result<i32> {
        let b = self.payload(tag)?;
        ensure!(b.len() >= 4, "int tag too short ({} bytes)", b.len());
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_f32(&mut self, tag: &TagHeader) -> Result<f32> {
        let b = self.payload(tag)?;
        ensure!(b.len() >= 4, "float tag too short ({} bytes)", b.len());
        Ok(f32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Latin-1 string payload.
    pub fn read_string(&mut self, tag: &TagHeader) -> Result<String> {
        Ok(self.payload(tag)?.iter().map(|&b| b as char).collect())
    }

    /// Walk the `next` chain from offset 0, collecting every header.
    pub fn scan_directory(&mut self) -> Result<Vec<TagHeader>> {
        let mut directory = Vec::new();
        let mut pos = Some(0);
        while let Some(p) = pos {
            let tag = self.header_at(p)?;
            pos = tag.next_pos();
            directory.push(tag);
        }
        Ok(directory)
    }

    /// The pre-built directory pointed to by `FIFF_DIR_POINTER`, if any.
    pub fn embedded_directory(&mut self) -> Result<Option<Vec<TagHeader>>> {
        let id = self.header_at(0)?;
        if id.kind != FIFF_FILE_ID {
            bail!("not a FIF file: first tag kind {} is not FIFF_FILE_ID", id.kind);
        }
        let Some(next) = id.next_pos() else { return Ok(None) };
        let ptr = self.header_at(next)?;
        if ptr.kind != FIFF_DIR_POINTER {
            return Ok(None);
        }
        let dirpos = self.read_i32(&ptr)?;
        if dirpos <= 0 {
            return Ok(None);
        }
        let dir = self.header_at(dirpos as u64)?;
        if dir.ftype != FIFFT_DIR_ENTRY_STRUCT {
            return Ok(None);
        }
        // Entries mirror tag headers, but `next` carries the tag position.
        let raw = self.payload(&dir)?;
        let entries = raw
            .chunks_exact(16)
            .map(|c| {
                let mut buf = [0u8; 16];
                buf.copy_from_slice(c);
                let mut tag = TagHeader::from_be(&buf, 0);
                tag.pos = tag.next as u32 as u64;
                tag.next = FIFFV_NEXT_NONE;
                tag
            })
            .collect();
        Ok(Some(entries))
    }

    /// Embedded directory when present, otherwise a sequential scan.
    pub fn directory(&mut self) -> Result<Vec<TagHeader>> {
        match self.embedded_directory()? {
            Some(d) => Ok(d),
            None => self.scan_directory(),
        }
    }
}
