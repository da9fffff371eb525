use std::fs;
use std::io::{Cursor, Error as IoError};
use std::path::Path;
use byteorder::{LittleEndian, ReadBytesExt};
use thiserror::Error;
use crate::image::{BytecodeImage, Number, PoolString, TableKind};

/// Magic number at the start of every image, "RUSK" in little-endian byte order
pub const MAGIC: u32 = u32::from_le_bytes(*b"RUSK");

/// The only serialization format version this loader understands
pub const FORMAT_VERSION: u8 = 1;

/// Fixed header size in bytes: magic, version, reserved, two table counts, code offset
pub const HEADER_LEN: usize = 14;

/// Ids are 8-bit, so a table can never hold more entries than this
pub const MAX_TABLE_LEN: usize = 256;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    IoError(#[from] IoError),

    #[error("Invalid magic number")]
    BadMagic,

    #[error("Unsupported image version: {0}")]
    UnsupportedVersion(u8),

    #[error("Truncated image: ran out of bytes at offset {0}")]
    Truncated(usize),

    #[error("{table} table declares {count} entries, beyond the reach of an 8-bit id")]
    TableTooLarge { table: TableKind, count: u16 },

    #[error("Code offset {offset} out of bounds for a {len}-byte image")]
    CodeOffsetOutOfBounds { offset: u32, len: usize },

    #[error("Declared code offset {declared} does not match table region end {actual}")]
    TableRegionMismatch { declared: u32, actual: usize },

    #[error("String {0} is missing its NUL terminator")]
    MissingNulTerminator(u16),

    #[error("String {0} contains an interior NUL byte")]
    InteriorNul(u16),

    #[error("String {0} is not valid UTF-8")]
    InvalidUtf8(u16),

    #[error("Unknown number tag: {0}")]
    UnknownNumberTag(u8),
}

/// Cursor wrapper that reports truncation with the offset where input ran out
struct ImageReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> ImageReader<'a> {
    fn new(buffer: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(buffer),
        }
    }

    fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    fn read_u8(&mut self) -> Result<u8, LoadError> {
        let offset = self.position();
        self.cursor.read_u8().map_err(|_| LoadError::Truncated(offset))
    }

    fn read_u16(&mut self) -> Result<u16, LoadError> {
        let offset = self.position();
        self.cursor
            .read_u16::<LittleEndian>()
            .map_err(|_| LoadError::Truncated(offset))
    }

    fn read_u32(&mut self) -> Result<u32, LoadError> {
        let offset = self.position();
        self.cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| LoadError::Truncated(offset))
    }

    fn read_i64(&mut self) -> Result<i64, LoadError> {
        let offset = self.position();
        self.cursor
            .read_i64::<LittleEndian>()
            .map_err(|_| LoadError::Truncated(offset))
    }

    fn read_f64(&mut self) -> Result<f64, LoadError> {
        let offset = self.position();
        self.cursor
            .read_f64::<LittleEndian>()
            .map_err(|_| LoadError::Truncated(offset))
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], LoadError> {
        let start = self.position();
        let buffer = *self.cursor.get_ref();
        let end = start.checked_add(len).ok_or(LoadError::Truncated(start))?;
        if end > buffer.len() {
            return Err(LoadError::Truncated(start));
        }
        self.cursor.set_position(end as u64);
        Ok(&buffer[start..end])
    }
}

pub struct Loader;

impl Loader {
    /// Load an image from a raw byte buffer (file, memory, network, etc.)
    ///
    /// The whole table region is parsed and validated here, once; lookups on
    /// the returned image are plain array indexing. Everything the image needs
    /// is copied out, so the caller may drop the buffer as soon as this
    /// returns.
    pub fn load(buffer: &[u8]) -> Result<BytecodeImage, LoadError> {
        let mut reader = ImageReader::new(buffer);

        let magic = reader.read_u32()?;
        if magic != MAGIC {
            return Err(LoadError::BadMagic);
        }

        let version = reader.read_u8()?;
        if version != FORMAT_VERSION {
            return Err(LoadError::UnsupportedVersion(version));
        }
        let _reserved = reader.read_u8()?;

        let string_count = reader.read_u16()?;
        let number_count = reader.read_u16()?;
        let code_offset = reader.read_u32()?;

        if string_count as usize > MAX_TABLE_LEN {
            return Err(LoadError::TableTooLarge {
                table: TableKind::String,
                count: string_count,
            });
        }
        if number_count as usize > MAX_TABLE_LEN {
            return Err(LoadError::TableTooLarge {
                table: TableKind::Number,
                count: number_count,
            });
        }
        if (code_offset as usize) < HEADER_LEN || code_offset as usize > buffer.len() {
            return Err(LoadError::CodeOffsetOutOfBounds {
                offset: code_offset,
                len: buffer.len(),
            });
        }

        let mut strings = Vec::with_capacity(string_count as usize);
        for index in 0..string_count {
            let len = reader.read_u16()? as usize;
            let bytes = reader.read_bytes(len)?;
            let terminator = reader.read_u8()?;
            if terminator != 0 {
                return Err(LoadError::MissingNulTerminator(index));
            }
            let text = std::str::from_utf8(bytes).map_err(|_| LoadError::InvalidUtf8(index))?;
            let entry =
                PoolString::new(text.to_string()).ok_or(LoadError::InteriorNul(index))?;
            strings.push(entry);
        }

        let mut numbers = Vec::with_capacity(number_count as usize);
        for _ in 0..number_count {
            let tag = reader.read_u8()?;
            let number = match tag {
                0 => Number::Integer(reader.read_i64()?),
                1 => Number::Float(reader.read_f64()?),
                _ => return Err(LoadError::UnknownNumberTag(tag)),
            };
            numbers.push(number);
        }

        // The tables must account for every byte up to the declared code start
        let table_end = reader.position();
        if table_end != code_offset as usize {
            return Err(LoadError::TableRegionMismatch {
                declared: code_offset,
                actual: table_end,
            });
        }

        let code = buffer[table_end..].to_vec().into_boxed_slice();
        Ok(BytecodeImage::new(version, strings, numbers, code))
    }

    /// Load an image from a file on disk
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<BytecodeImage, LoadError> {
        let buffer = fs::read(path)?;
        Self::load(&buffer)
    }
}
