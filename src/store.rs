//! Low-level record-file access.
//!
//! This module deals with the binary layout only: header parsing, slot to
//! file-offset translation and fixed-width field encoding. Higher-level
//! concerns like key uniqueness, locking and searching live in
//! [`crate::db`], which also owns all synchronization; [`RecordFile`] is
//! not thread-safe and assumes callers serialize access.
//!
//! ## File layout
//!
//! ```text
//! [4 bytes]  magic number (513)
//! [4 bytes]  record-data length in bytes (excludes the flag byte)
//! [2 bytes]  field count N
//! N times:
//!   [2 bytes]  field-name length L
//!   [L bytes]  field name (US-ASCII)
//!   [2 bytes]  field max length
//! -- record slots, each:
//!   [1 byte]   deletion flag (0 = active)
//!   [fixed-width field values, space-padded]
//! ```
//!
//! All multi-byte integers are big-endian.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{DbError, Result};
use crate::schema::{FieldDescriptor, FieldType};

/// Magic number identifying a record file.
pub const MAGIC: u32 = 513;

/// Bytes in a slot header (the deletion flag).
const SLOT_HEADER_SIZE: u64 = 1;

const FLAG_ACTIVE: u8 = 0;
const FLAG_DELETED: u8 = 1;

/// Byte-level access to a single record file.
pub struct RecordFile {
    file: File,
    /// Total bytes per slot, flag byte included.
    slot_len: u64,
    /// Offset of the first slot, right after the header.
    slot_start: u64,
    fields: Vec<FieldDescriptor>,
    /// Cached number of non-deleted slots, maintained incrementally.
    active: u32,
}

impl RecordFile {
    /// Opens an existing record file. The file must exist and be writable;
    /// its header is validated and the schema parsed before any record
    /// access happens.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;

        if read_u32(&mut file)? != MAGIC {
            return Err(DbError::InvalidMagic);
        }

        let data_len = u64::from(read_u32(&mut file)?);
        let fields = read_schema(&mut file)?;
        let slot_start = file.stream_position()?;

        let descriptor_len: u64 = fields.iter().map(|f| u64::from(f.max_length)).sum();
        if data_len != descriptor_len {
            return Err(DbError::CorruptHeader(format!(
                "record-data length {data_len} doesn't match the field widths ({descriptor_len})"
            )));
        }

        let mut store = RecordFile {
            file,
            slot_len: SLOT_HEADER_SIZE + data_len,
            slot_start,
            fields,
            active: 0,
        };
        store.active = store.scan_active_count()?;

        tracing::info!(
            path = %path.as_ref().display(),
            slot_len = store.slot_len,
            fields = store.fields.len(),
            active = store.active,
            "record file loaded"
        );

        Ok(store)
    }

    /// The parsed schema. Immutable once the file is open.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Cached count of non-deleted slots.
    pub fn active_count(&self) -> u32 {
        self.active
    }

    /// Total number of slots in the file, deleted ones included.
    pub fn slot_count(&self) -> Result<u32> {
        let len = self.file.metadata()?.len();
        Ok(((len - self.slot_start) / self.slot_len) as u32)
    }

    /// Reads a slot's deletion flag.
    pub fn is_deleted(&mut self, slot: u32) -> Result<bool> {
        self.seek(slot)?;
        let mut flag = [0u8; 1];
        self.file.read_exact(&mut flag)?;
        Ok(flag[0] != FLAG_ACTIVE)
    }

    /// Flips a slot's deletion flag. The slot's bytes stay in place until
    /// the slot is reused by [`RecordFile::create`].
    pub fn delete(&mut self, slot: u32) -> Result<()> {
        self.seek(slot)?;
        self.file.write_all(&[FLAG_DELETED])?;
        self.active -= 1;
        Ok(())
    }

    /// Makes room for a new record, reusing the lowest-indexed deleted
    /// slot if one exists and appending at end-of-file otherwise. The
    /// slot's fields are cleared to empty values.
    pub fn create(&mut self) -> Result<u32> {
        let slot = self.available_slot()?;

        self.file.seek(SeekFrom::Start(self.offset_of(slot)))?;
        let mut bytes = vec![b' '; self.slot_len as usize];
        bytes[0] = FLAG_ACTIVE;
        self.file.write_all(&bytes)?;

        self.active += 1;
        Ok(slot)
    }

    /// Reads a slot's field values in schema order. Values come back
    /// trimmed of their trailing padding.
    pub fn read(&mut self, slot: u32) -> Result<Vec<String>> {
        self.seek_to_content(slot)?;

        let mut values = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let mut buf = vec![0u8; usize::from(field.max_length)];
            self.file.read_exact(&mut buf)?;
            values.push(decode_field(&buf));
        }
        Ok(values)
    }

    /// Writes a slot's field values in schema order, truncating or padding
    /// each to its descriptor's width. Key uniqueness is the caller's
    /// responsibility. A missing value is unrepresentable here; only the
    /// value count can be wrong.
    pub fn write(&mut self, slot: u32, values: &[String]) -> Result<()> {
        self.verify_field_shape(values)?;
        self.seek_to_content(slot)?;

        for (field, value) in self.fields.iter().zip(values) {
            let encoded = encode_field(value, usize::from(field.max_length));
            self.file.write_all(&encoded)?;
        }
        Ok(())
    }

    /// Checks that a value sequence matches the schema's field count.
    pub fn verify_field_shape(&self, values: &[String]) -> Result<()> {
        if values.len() != self.fields.len() {
            return Err(DbError::InvalidArgument(format!(
                "invalid number of fields: {} (schema has {})",
                values.len(),
                self.fields.len()
            )));
        }
        Ok(())
    }

    /// Flushes and releases the file handle. Taking `self` by value makes
    /// use-after-close unrepresentable; reopening requires a new
    /// [`RecordFile::open`].
    pub fn close(self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    fn scan_active_count(&mut self) -> Result<u32> {
        let count = self.slot_count()?;
        let mut active = 0;
        for slot in 0..count {
            if !self.is_deleted(slot)? {
                active += 1;
            }
        }
        Ok(active)
    }

    fn available_slot(&mut self) -> Result<u32> {
        let count = self.slot_count()?;
        for slot in 0..count {
            if self.is_deleted(slot)? {
                tracing::debug!(slot, "reusing deleted slot");
                return Ok(slot);
            }
        }
        Ok(count)
    }

    fn offset_of(&self, slot: u32) -> u64 {
        self.slot_start + self.slot_len * u64::from(slot)
    }

    fn seek(&mut self, slot: u32) -> Result<()> {
        let count = self.slot_count()?;
        if slot >= count {
            return Err(DbError::OutOfBounds { slot, count });
        }
        self.file.seek(SeekFrom::Start(self.offset_of(slot)))?;
        Ok(())
    }

    fn seek_to_content(&mut self, slot: u32) -> Result<()> {
        self.seek(slot)?;
        self.file.seek(SeekFrom::Current(SLOT_HEADER_SIZE as i64))?;
        Ok(())
    }
}

fn read_u16(file: &mut File) -> Result<u16> {
    let mut buf = [0u8; 2];
    file.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

fn read_u32(file: &mut File) -> Result<u32> {
    let mut buf = [0u8; 4];
    file.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn read_schema(file: &mut File) -> Result<Vec<FieldDescriptor>> {
    let count = usize::from(read_u16(file)?);

    let mut fields = Vec::with_capacity(count);
    for index in 0..count {
        let name_len = usize::from(read_u16(file)?);
        let mut name = vec![0u8; name_len];
        file.read_exact(&mut name)?;

        fields.push(FieldDescriptor {
            index,
            name: String::from_utf8_lossy(&name).into_owned(),
            max_length: read_u16(file)?,
            field_type: FieldType::for_ordinal(index),
        });
    }
    Ok(fields)
}

/// Strips trailing padding. Both space and NUL padding are accepted so
/// files written by zero-padding producers read cleanly.
fn decode_field(raw: &[u8]) -> String {
    let end = raw
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |i| i + 1);
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Encodes a value to exactly `width` bytes: truncated if too long,
/// space-padded if too short. Non-ASCII characters degrade to `?`.
fn encode_field(value: &str, width: usize) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(width);
    for ch in value.chars() {
        if bytes.len() == width {
            break;
        }
        bytes.push(if ch.is_ascii() { ch as u8 } else { b'?' });
    }
    bytes.resize(width, b' ');
    bytes
}
