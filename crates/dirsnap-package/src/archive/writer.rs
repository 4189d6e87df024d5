//! In-memory ZIP builder: local headers and data first, then the central
//! directory and the end record.

use std::io::Write;

use flate2::Compression;
use flate2::write::DeflateEncoder;

use super::crc32::crc32;
use super::dos_time::DosDateTime;
use crate::error::{PackageError, Result};

const LOCAL_HEADER_SIG: u32 = 0x0403_4B50;
const CENTRAL_HEADER_SIG: u32 = 0x0201_4B50;
const END_OF_CENTRAL_DIR_SIG: u32 = 0x0605_4B50;

const VERSION: u16 = 20;
const FLAG_UTF8: u16 = 1 << 11;

const MAX_ENTRIES: usize = u16::MAX as usize;

/// Storage method of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Method {
    Store = 0,
    Deflate = 8,
}

/// One archive member, ready to be written.
#[derive(Debug)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub crc32: u32,
    pub method: Method,
    pub uncompressed_size: u32,
    pub compressed_size: u32,
    pub modified: DosDateTime,
}

impl ArchiveEntry {
    /// A directory entry. `name` gets a trailing `/` if it lacks one.
    pub fn directory(name: &str, modified: DosDateTime) -> Self {
        let mut name = name.to_string();
        if !name.ends_with('/') {
            name.push('/');
        }
        Self {
            name,
            data: Vec::new(),
            crc32: 0,
            method: Method::Store,
            uncompressed_size: 0,
            compressed_size: 0,
            modified,
        }
    }

    /// A file entry. Deflate is kept only if it actually saves space.
    pub fn file(name: &str, contents: Vec<u8>, modified: DosDateTime) -> Result<Self> {
        let uncompressed_size = u32::try_from(contents.len())
            .map_err(|_| PackageError::ArchiveTooLarge(format!("{name} exceeds 4 GiB")))?;
        let crc32 = crc32(&contents);

        let deflated = deflate(&contents)?;
        let (method, data) = if deflated.len() < contents.len() {
            (Method::Deflate, deflated)
        } else {
            (Method::Store, contents)
        };

        Ok(Self {
            name: name.to_string(),
            compressed_size: data.len() as u32,
            data,
            crc32,
            method,
            uncompressed_size,
            modified,
        })
    }

    fn flags(&self) -> u16 {
        if self.name.is_ascii() { 0 } else { FLAG_UTF8 }
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data).map_err(PackageError::Compression)?;
    encoder.finish().map_err(PackageError::Compression)
}

/// Accumulates entries into a single archive buffer.
#[derive(Debug, Default)]
pub struct ZipBuilder {
    out: Vec<u8>,
    central: Vec<u8>,
    entries: usize,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry: local header and data now, central record buffered.
    pub fn add(&mut self, entry: &ArchiveEntry) -> Result<()> {
        if self.entries >= MAX_ENTRIES {
            return Err(PackageError::ArchiveTooLarge(format!(
                "more than {MAX_ENTRIES} entries"
            )));
        }

        let name = entry.name.as_bytes();
        let name_len = u16::try_from(name.len())
            .map_err(|_| PackageError::ArchiveTooLarge(format!("entry name too long: {}", entry.name)))?;
        let offset = u32::try_from(self.out.len())
            .map_err(|_| PackageError::ArchiveTooLarge("archive exceeds 4 GiB".to_string()))?;

        let out = &mut self.out;
        put_u32(out, LOCAL_HEADER_SIG);
        put_u16(out, VERSION);
        put_u16(out, entry.flags());
        put_u16(out, entry.method as u16);
        put_u16(out, entry.modified.time);
        put_u16(out, entry.modified.date);
        put_u32(out, entry.crc32);
        put_u32(out, entry.compressed_size);
        put_u32(out, entry.uncompressed_size);
        put_u16(out, name_len);
        put_u16(out, 0); // extra field length
        out.extend_from_slice(name);
        out.extend_from_slice(&entry.data);

        let cd = &mut self.central;
        put_u32(cd, CENTRAL_HEADER_SIG);
        put_u16(cd, VERSION); // made by
        put_u16(cd, VERSION); // needed
        put_u16(cd, entry.flags());
        put_u16(cd, entry.method as u16);
        put_u16(cd, entry.modified.time);
        put_u16(cd, entry.modified.date);
        put_u32(cd, entry.crc32);
        put_u32(cd, entry.compressed_size);
        put_u32(cd, entry.uncompressed_size);
        put_u16(cd, name_len);
        put_u16(cd, 0); // extra field length
        put_u16(cd, 0); // comment length
        put_u16(cd, 0); // disk number start
        put_u16(cd, 0); // internal attributes
        put_u32(cd, 0); // external attributes
        put_u32(cd, offset);
        cd.extend_from_slice(name);

        self.entries += 1;
        Ok(())
    }

    /// Number of entries added so far.
    pub fn len(&self) -> usize {
        self.entries
    }

    /// Append the central directory and end record.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let too_large = || PackageError::ArchiveTooLarge("archive exceeds 4 GiB".to_string());
        let cd_offset = u32::try_from(self.out.len()).map_err(|_| too_large())?;
        let cd_size = u32::try_from(self.central.len()).map_err(|_| too_large())?;
        cd_offset.checked_add(cd_size).ok_or_else(too_large)?;
        let count = self.entries as u16;

        self.out.append(&mut self.central);

        let out = &mut self.out;
        put_u32(out, END_OF_CENTRAL_DIR_SIG);
        put_u16(out, 0); // this disk
        put_u16(out, 0); // disk with central directory
        put_u16(out, count);
        put_u16(out, count);
        put_u32(out, cd_size);
        put_u32(out, cd_offset);
        put_u16(out, 0); // comment length

        Ok(self.out)
    }
}

fn put_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}
