use core::fmt::{Debug, Display, Write};

use crate::error::{Error, Result};
use crate::util;

/// Byte length of a chunk frame with an empty payload: length field, tag,
/// and CRC.
pub const CHUNK_OVERHEAD: usize = 12;

/// A four-byte PNG chunk type.
///
/// Equality and hashing are byte-wise; the `Debug` and `Display` impls
/// render the bytes as ASCII since every standard tag is printable.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChunkTag(pub [u8; 4]);

#[allow(nonstandard_style)]
impl ChunkTag {
  pub const IHDR: Self = Self(*b"IHDR");
  pub const PLTE: Self = Self(*b"PLTE");
  pub const IDAT: Self = Self(*b"IDAT");
  pub const IEND: Self = Self(*b"IEND");
  pub const tEXt: Self = Self(*b"tEXt");
  pub const zTXt: Self = Self(*b"zTXt");
  pub const gAMA: Self = Self(*b"gAMA");
}

impl ChunkTag {
  #[inline]
  #[must_use]
  pub const fn as_bytes(&self) -> &[u8; 4] {
    &self.0
  }
}

impl Debug for ChunkTag {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_char('"')?;
    for ch in self.0.iter().copied().map(|u| u as char) {
      f.write_char(ch)?;
    }
    f.write_char('"')?;
    Ok(())
  }
}

impl Display for ChunkTag {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    for ch in self.0.iter().copied().map(|u| u as char) {
      f.write_char(ch)?;
    }
    Ok(())
  }
}

impl From<[u8; 4]> for ChunkTag {
  #[inline]
  fn from(bytes: [u8; 4]) -> Self {
    Self(bytes)
  }
}

impl TryFrom<&[u8]> for ChunkTag {
  type Error = Error;
  #[inline]
  fn try_from(bytes: &[u8]) -> Result<Self> {
    let array: [u8; 4] = bytes.try_into().map_err(|_| Error::InvalidChunkTag)?;
    Ok(Self(array))
  }
}

impl TryFrom<&str> for ChunkTag {
  type Error = Error;
  #[inline]
  fn try_from(text: &str) -> Result<Self> {
    Self::try_from(text.as_bytes())
  }
}

/// An owning chunk: a tag plus its payload bytes.
///
/// The CRC is never stored; [`Chunk::crc`] computes it over `tag || data`
/// and [`Chunk::to_bytes`] emits the full frame with big-endian length and
/// CRC fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
  tag: ChunkTag,
  data: Vec<u8>,
}

impl Chunk {
  #[inline]
  #[must_use]
  pub fn new(tag: ChunkTag, data: Vec<u8>) -> Self {
    Self { tag, data }
  }

  #[inline]
  #[must_use]
  pub const fn tag(&self) -> ChunkTag {
    self.tag
  }

  /// Payload length in bytes.
  #[inline]
  #[must_use]
  pub fn length(&self) -> usize {
    self.data.len()
  }

  #[inline]
  #[must_use]
  pub fn data(&self) -> &[u8] {
    &self.data
  }

  #[inline]
  #[must_use]
  pub fn data_mut(&mut self) -> &mut Vec<u8> {
    &mut self.data
  }

  #[inline]
  pub fn set_data(&mut self, data: Vec<u8>) {
    self.data = data;
  }

  /// CRC-32 over the tag followed by the payload.
  #[inline]
  #[must_use]
  pub fn crc(&self) -> u32 {
    util::crc32(&self.data, util::crc32(self.tag.as_bytes(), 0))
  }

  /// Emit the full wire frame: `length | tag | data | crc`.
  #[must_use]
  pub fn to_bytes(&self) -> Vec<u8> {
    let mut out = Vec::with_capacity(CHUNK_OVERHEAD + self.data.len());
    out.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
    out.extend_from_slice(self.tag.as_bytes());
    out.extend_from_slice(&self.data);
    out.extend_from_slice(&self.crc().to_be_bytes());
    out
  }
}

/// A chunk frame borrowed out of a larger buffer, with its stored CRC.
#[derive(Clone, Copy)]
pub struct RawChunk<'b> {
  tag: ChunkTag,
  data: &'b [u8],
  stored_crc: u32,
}

impl Debug for RawChunk<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("RawChunk")
      .field("tag", &self.tag)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("stored_crc", &self.stored_crc)
      .finish()
  }
}

impl<'b> RawChunk<'b> {
  /// Parse the chunk frame starting at `offset` within `bytes`.
  ///
  /// On success, returns the parsed view and the offset just past the
  /// frame. Fails with [`Error::Truncated`] if the frame runs past the end
  /// of the buffer or declares a length above 2^31-1.
  pub fn parse(bytes: &'b [u8], offset: usize) -> Result<(Self, usize)> {
    let remaining = bytes.len().saturating_sub(offset);
    if remaining < CHUNK_OVERHEAD {
      return Err(Error::Truncated);
    }
    let length = util::u32_be(&bytes[offset..offset + 4]);
    if length > i32::MAX as u32 {
      return Err(Error::Truncated);
    }
    let length = length as usize;
    if remaining < CHUNK_OVERHEAD + length {
      return Err(Error::Truncated);
    }
    let tag = ChunkTag::try_from(&bytes[offset + 4..offset + 8])?;
    let data = &bytes[offset + 8..offset + 8 + length];
    let stored_crc = util::u32_be(&bytes[offset + 8 + length..offset + CHUNK_OVERHEAD + length]);
    Ok((Self { tag, data, stored_crc }, offset + CHUNK_OVERHEAD + length))
  }

  #[inline]
  #[must_use]
  pub const fn tag(&self) -> ChunkTag {
    self.tag
  }

  #[inline]
  #[must_use]
  pub const fn data(&self) -> &'b [u8] {
    self.data
  }

  #[inline]
  #[must_use]
  pub const fn stored_crc(&self) -> u32 {
    self.stored_crc
  }

  /// Does the stored CRC match the CRC computed over `tag || data`?
  #[inline]
  #[must_use]
  pub fn validate(&self) -> bool {
    self.computed_crc() == self.stored_crc
  }

  #[inline]
  #[must_use]
  pub fn computed_crc(&self) -> u32 {
    util::crc32(self.data, util::crc32(self.tag.as_bytes(), 0))
  }

  /// Copy the view into an owning [`Chunk`].
  #[inline]
  #[must_use]
  pub fn to_chunk(&self) -> Chunk {
    Chunk::new(self.tag, self.data.to_vec())
  }
}
