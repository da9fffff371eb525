use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use byteorder::{LittleEndian, WriteBytesExt};
use rustc_hash::FxHashMap;
use thiserror::Error;
use crate::image::{Number, FORMAT_VERSION, HEADER_LEN, MAGIC, MAX_TABLE_LEN};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("String table is full: {MAX_TABLE_LEN} entries")]
    StringTableFull,

    #[error("Number table is full: {MAX_TABLE_LEN} entries")]
    NumberTableFull,

    #[error("String constant contains an interior NUL byte")]
    InteriorNul,

    #[error("String constant of {0} bytes exceeds the 16-bit length field")]
    StringTooLong(usize),
}

/// Builds a serialized bytecode image: the producer-side counterpart of
/// [`crate::image::Loader`]
///
/// Constants are added first and referenced from instruction bytes by the
/// 8-bit ids the add methods return. Identical strings are interned, so
/// adding the same text twice yields the same id.
#[derive(Debug, Clone, Default)]
pub struct ImageBuilder {
    strings: Vec<String>,
    string_ids: FxHashMap<String, u8>,
    numbers: Vec<Number>,
    code: Vec<u8>,
}

impl ImageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string constant, returning its id. Repeated strings share one entry.
    pub fn add_string(&mut self, text: &str) -> Result<u8, BuildError> {
        if text.contains('\0') {
            return Err(BuildError::InteriorNul);
        }
        if text.len() > u16::MAX as usize {
            return Err(BuildError::StringTooLong(text.len()));
        }
        if let Some(id) = self.string_ids.get(text) {
            return Ok(*id);
        }
        if self.strings.len() >= MAX_TABLE_LEN {
            return Err(BuildError::StringTableFull);
        }
        let id = self.strings.len() as u8;
        self.strings.push(text.to_string());
        self.string_ids.insert(text.to_string(), id);
        Ok(id)
    }

    /// Add an integer constant, returning its id
    pub fn add_integer(&mut self, value: i64) -> Result<u8, BuildError> {
        self.add_number(Number::Integer(value))
    }

    /// Add a floating-point constant, returning its id
    pub fn add_float(&mut self, value: f64) -> Result<u8, BuildError> {
        self.add_number(Number::Float(value))
    }

    fn add_number(&mut self, number: Number) -> Result<u8, BuildError> {
        if self.numbers.len() >= MAX_TABLE_LEN {
            return Err(BuildError::NumberTableFull);
        }
        let id = self.numbers.len() as u8;
        self.numbers.push(number);
        Ok(id)
    }

    /// Append bytes to the instruction stream
    pub fn append_code(&mut self, bytes: &[u8]) {
        self.code.extend_from_slice(bytes);
    }

    /// Byte offset where the instruction stream will start in the encoded image
    fn code_offset(&self) -> usize {
        let string_region: usize = self.strings.iter().map(|s| 2 + s.len() + 1).sum();
        let number_region = self.numbers.len() * 9;
        HEADER_LEN + string_region + number_region
    }

    /// Serialize the image to a writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(MAGIC)?;
        writer.write_u8(FORMAT_VERSION)?;
        writer.write_u8(0)?; // Reserved
        writer.write_u16::<LittleEndian>(self.strings.len() as u16)?;
        writer.write_u16::<LittleEndian>(self.numbers.len() as u16)?;
        writer.write_u32::<LittleEndian>(self.code_offset() as u32)?;

        for text in &self.strings {
            writer.write_u16::<LittleEndian>(text.len() as u16)?;
            writer.write_all(text.as_bytes())?;
            writer.write_u8(0)?;
        }

        for number in &self.numbers {
            match number {
                Number::Integer(i) => {
                    writer.write_u8(0)?;
                    writer.write_i64::<LittleEndian>(*i)?;
                }
                Number::Float(f) => {
                    writer.write_u8(1)?;
                    writer.write_f64::<LittleEndian>(*f)?;
                }
            }
        }

        writer.write_all(&self.code)?;
        Ok(())
    }

    /// Serialize the image to a file
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()
    }
}
