//! `tEXt` and `zTXt` chunk wrappers.
//!
//! Both carry a keyword (1..=79 bytes, no NUL), a NUL separator, and a
//! text body; `zTXt` adds a compression method byte (only 0 is defined)
//! and deflates the body. The text is nominally Latin-1 but is not
//! validated; the payload helpers only ever store base64, which is plain
//! ASCII either way.

use super::chunk::{Chunk, ChunkTag};
use crate::error::{Error, Result};
use crate::util;

fn null_terminator(data: &[u8]) -> Option<usize> {
  data.iter().position(|&byte| byte == 0)
}

fn validate_keyword(keyword: &str) -> Result<()> {
  if keyword.is_empty() || keyword.contains('\0') {
    return Err(Error::NoKeyword);
  }
  if keyword.len() > 79 {
    return Err(Error::KeywordTooLong);
  }
  Ok(())
}

/// An uncompressed textual data chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
  chunk: Chunk,
}

impl Text {
  pub fn new(keyword: &str, text: &str) -> Result<Self> {
    let mut this = Self { chunk: Chunk::new(ChunkTag::tEXt, Vec::new()) };
    this.set_keyword(keyword, true)?;
    this.set_text(text);
    Ok(this)
  }

  /// Wrap an existing chunk without validating its layout.
  #[inline]
  #[must_use]
  pub fn from_chunk(chunk: Chunk) -> Self {
    Self { chunk }
  }

  #[inline]
  #[must_use]
  pub fn chunk(&self) -> &Chunk {
    &self.chunk
  }

  #[inline]
  #[must_use]
  pub fn into_chunk(self) -> Chunk {
    self.chunk
  }

  fn null_terminator(&self) -> Option<usize> {
    null_terminator(self.chunk.data())
  }

  fn text_offset(&self) -> usize {
    match self.null_terminator() {
      Some(zero) => zero + 1,
      None => 0,
    }
  }

  #[inline]
  #[must_use]
  pub fn has_keyword(&self) -> bool {
    self.null_terminator().is_some()
  }

  pub fn keyword(&self) -> Result<String> {
    let zero = self.null_terminator().ok_or(Error::NoKeyword)?;
    Ok(String::from_utf8_lossy(&self.chunk.data()[..zero]).into_owned())
  }

  /// Replace the keyword, keeping the text. `validate` enforces the
  /// 1..=79-byte, NUL-free rule.
  pub fn set_keyword(&mut self, keyword: &str, validate: bool) -> Result<()> {
    if validate {
      validate_keyword(keyword)?;
    }
    if let Some(zero) = self.null_terminator() {
      self.chunk.data_mut().drain(..=zero);
    }
    let mut data = keyword.as_bytes().to_vec();
    data.push(0);
    data.extend_from_slice(self.chunk.data());
    self.chunk.set_data(data);
    Ok(())
  }

  #[must_use]
  pub fn has_text(&self) -> bool {
    self.chunk.data().len() > self.text_offset()
  }

  #[must_use]
  pub fn text(&self) -> String {
    String::from_utf8_lossy(&self.chunk.data()[self.text_offset()..]).into_owned()
  }

  pub fn set_text(&mut self, text: &str) {
    let offset = self.text_offset();
    self.chunk.data_mut().truncate(offset);
    self.chunk.data_mut().extend_from_slice(text.as_bytes());
  }
}

/// A compressed textual data chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZText {
  chunk: Chunk,
}

impl ZText {
  pub fn new(keyword: &str, text: &str) -> Result<Self> {
    let mut this = Self { chunk: Chunk::new(ChunkTag::zTXt, Vec::new()) };
    this.set_keyword(keyword, true)?;
    this.set_compression_method(0)?;
    this.set_text(text);
    Ok(this)
  }

  /// Wrap an existing chunk without validating its layout.
  #[inline]
  #[must_use]
  pub fn from_chunk(chunk: Chunk) -> Self {
    Self { chunk }
  }

  #[inline]
  #[must_use]
  pub fn chunk(&self) -> &Chunk {
    &self.chunk
  }

  #[inline]
  #[must_use]
  pub fn into_chunk(self) -> Chunk {
    self.chunk
  }

  fn null_terminator(&self) -> Option<usize> {
    // an empty keyword is no keyword at all
    match null_terminator(self.chunk.data()) {
      Some(0) => None,
      other => other,
    }
  }

  fn text_offset(&self) -> usize {
    match self.null_terminator() {
      Some(zero) => zero + 2,
      None => 1,
    }
  }

  #[inline]
  #[must_use]
  pub fn has_keyword(&self) -> bool {
    self.null_terminator().is_some()
  }

  pub fn keyword(&self) -> Result<String> {
    let zero = self.null_terminator().ok_or(Error::NoKeyword)?;
    Ok(String::from_utf8_lossy(&self.chunk.data()[..zero]).into_owned())
  }

  pub fn set_keyword(&mut self, keyword: &str, validate: bool) -> Result<()> {
    if validate {
      validate_keyword(keyword)?;
    }
    if let Some(zero) = self.null_terminator() {
      self.chunk.data_mut().drain(..=zero);
    }
    let mut data = keyword.as_bytes().to_vec();
    data.push(0);
    data.extend_from_slice(self.chunk.data());
    self.chunk.set_data(data);
    Ok(())
  }

  pub fn compression_method(&self) -> Result<u8> {
    let zero = self.null_terminator().ok_or(Error::NoKeyword)?;
    let data = self.chunk.data();
    if zero + 1 == data.len() {
      return Err(Error::OutOfBounds { given: zero + 1, limit: data.len() });
    }
    Ok(data[zero + 1])
  }

  pub fn set_compression_method(&mut self, method: u8) -> Result<()> {
    let zero = self.null_terminator().ok_or(Error::NoKeyword)?;
    let data = self.chunk.data_mut();
    if zero + 1 == data.len() {
      data.push(method);
    } else {
      data[zero + 1] = method;
    }
    Ok(())
  }

  #[must_use]
  pub fn has_text(&self) -> bool {
    self.chunk.data().len() > self.text_offset()
  }

  /// Inflate and return the text body. Only compression method 0 decodes.
  pub fn text(&self) -> Result<String> {
    match self.compression_method()? {
      0 => (),
      other => return Err(Error::InvalidCompressionMethod(other)),
    }
    let body = util::decompress(&self.chunk.data()[self.text_offset()..])?;
    Ok(String::from_utf8_lossy(&body).into_owned())
  }

  /// Replace the text body, deflating it at maximum compression. A
  /// missing method byte is filled in as 0.
  pub fn set_text(&mut self, text: &str) {
    let offset = self.text_offset();
    let data = self.chunk.data_mut();
    data.truncate(offset);
    if data.len() < offset {
      data.push(0);
    }
    let body = util::compress(text.as_bytes(), util::MAX_COMPRESSION_LEVEL);
    data.extend_from_slice(&body);
  }
}
