//! The Windows icon envelope.
//!
//! An icon file is a little-endian directory of bitmap entries, each of
//! which is either a BMP (opaque here) or a whole PNG stream.
//! [`IcoPayload`] binds the first PNG entry to a [`PngPayload`] so every
//! carrier technique works on icons too.

use std::ops::{Deref, DerefMut};
use std::path::Path;

use crate::error::{Error, Result};
use crate::payload::PngPayload;
use crate::png::SIGNATURE;
use crate::util;

/// Byte length of the directory header.
pub const ICONDIR_SIZE: usize = 6;

/// Byte length of one directory entry.
pub const ICONDIRENTRY_SIZE: usize = 16;

/// One entry of the icon directory.
///
/// `bytes` and `offset` are recomputed on emit; the remaining fields pass
/// through untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IconDirEntry {
  pub width: u8,
  pub height: u8,
  pub color_count: u8,
  pub reserved: u8,
  pub planes: u16,
  pub bit_count: u16,
  pub bytes: u32,
  pub offset: u32,
}

impl IconDirEntry {
  fn parse(bytes: &[u8]) -> Self {
    Self {
      width: bytes[0],
      height: bytes[1],
      color_count: bytes[2],
      reserved: bytes[3],
      planes: util::u16_le(&bytes[4..6]),
      bit_count: util::u16_le(&bytes[6..8]),
      bytes: util::u32_le(&bytes[8..12]),
      offset: util::u32_le(&bytes[12..16]),
    }
  }

  fn to_bytes(self) -> [u8; ICONDIRENTRY_SIZE] {
    let mut out = [0; ICONDIRENTRY_SIZE];
    out[0] = self.width;
    out[1] = self.height;
    out[2] = self.color_count;
    out[3] = self.reserved;
    out[4..6].copy_from_slice(&self.planes.to_le_bytes());
    out[6..8].copy_from_slice(&self.bit_count.to_le_bytes());
    out[8..12].copy_from_slice(&self.bytes.to_le_bytes());
    out[12..16].copy_from_slice(&self.offset.to_le_bytes());
    out
  }
}

/// What an entry's payload holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
  Bmp,
  Png,
}

/// A directory entry together with its payload bytes.
pub type Entry = (IconDirEntry, Vec<u8>);

/// A parsed Windows icon file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Icon {
  entries: Vec<Entry>,
}

impl Icon {
  #[inline]
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Parse an icon directory and copy out every entry's payload.
  pub fn parse(bytes: &[u8]) -> Result<Self> {
    if bytes.len() < ICONDIR_SIZE {
      return Err(Error::InsufficientSize { given: bytes.len(), need: ICONDIR_SIZE });
    }
    let reserved = util::u16_le(&bytes[0..2]);
    let image_type = util::u16_le(&bytes[2..4]);
    if reserved != 0 || image_type != 1 {
      return Err(Error::InvalidIconHeader);
    }
    let count = util::u16_le(&bytes[4..6]) as usize;
    let directory_size = ICONDIR_SIZE + ICONDIRENTRY_SIZE * count;
    if directory_size > bytes.len() {
      return Err(Error::OutOfBounds { given: directory_size, limit: bytes.len() });
    }

    let mut entries = Vec::with_capacity(count);
    for index in 0..count {
      let at = ICONDIR_SIZE + ICONDIRENTRY_SIZE * index;
      let entry = IconDirEntry::parse(&bytes[at..at + ICONDIRENTRY_SIZE]);
      let start = entry.offset as usize;
      let end = start + entry.bytes as usize;
      if end > bytes.len() {
        return Err(Error::OutOfBounds { given: end, limit: bytes.len() });
      }
      entries.push((entry, bytes[start..end].to_vec()));
    }
    Ok(Self { entries })
  }

  /// Read and parse an icon file.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::parse(&util::read_file(path)?)
  }

  /// Number of entries in the directory.
  #[inline]
  #[must_use]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn get_entry(&self, index: usize) -> Result<&Entry> {
    self.entries.get(index).ok_or(Error::OutOfBounds { given: index, limit: self.entries.len() })
  }

  pub fn get_entry_mut(&mut self, index: usize) -> Result<&mut Entry> {
    let limit = self.entries.len();
    self.entries.get_mut(index).ok_or(Error::OutOfBounds { given: index, limit })
  }

  pub fn set_entry(&mut self, index: usize, entry: Entry) -> Result<()> {
    *self.get_entry_mut(index)? = entry;
    Ok(())
  }

  /// Whether the entry's payload is a PNG stream or an opaque BMP.
  pub fn entry_type(&self, index: usize) -> Result<EntryType> {
    let (_, payload) = self.get_entry(index)?;
    if payload.len() >= SIGNATURE.len() && payload[..SIGNATURE.len()] == SIGNATURE {
      Ok(EntryType::Png)
    } else {
      Ok(EntryType::Bmp)
    }
  }

  /// The index of the first entry holding a PNG stream.
  pub fn first_png_entry(&self) -> Result<usize> {
    (0..self.len())
      .find(|&index| matches!(self.entry_type(index), Ok(EntryType::Png)))
      .ok_or(Error::NoPngEntry)
  }

  /// Re-emit the directory, relocating every entry's offset and byte
  /// count to match the payloads as they stand.
  pub fn to_bytes(&self) -> Result<Vec<u8>> {
    if self.entries.is_empty() {
      return Err(Error::NoIconData);
    }
    let directory_size = ICONDIR_SIZE + ICONDIRENTRY_SIZE * self.entries.len();
    let payload_size: usize = self.entries.iter().map(|(_, payload)| payload.len()).sum();
    let mut out = Vec::with_capacity(directory_size + payload_size);
    out.extend_from_slice(&0_u16.to_le_bytes());
    out.extend_from_slice(&1_u16.to_le_bytes());
    out.extend_from_slice(&(self.entries.len() as u16).to_le_bytes());

    let mut offset = directory_size;
    for (entry, payload) in &self.entries {
      let mut entry = *entry;
      entry.bytes = payload.len() as u32;
      entry.offset = offset as u32;
      out.extend_from_slice(&entry.to_bytes());
      offset += payload.len();
    }
    for (_, payload) in &self.entries {
      out.extend_from_slice(payload);
    }
    Ok(out)
  }

  /// Serialise and write to a file.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    util::write_file(path, &self.to_bytes()?)
  }

  /// Grow or shrink the directory; new entries are zeroed with empty
  /// payloads.
  pub fn resize(&mut self, size: usize) {
    self.entries.resize_with(size, || (IconDirEntry::default(), Vec::new()));
  }

  pub fn insert_entry(&mut self, index: usize, entry: Entry) -> Result<()> {
    if index > self.entries.len() {
      return Err(Error::OutOfBounds { given: index, limit: self.entries.len() });
    }
    self.entries.insert(index, entry);
    Ok(())
  }

  pub fn append_entry(&mut self, entry: Entry) {
    self.entries.push(entry);
  }

  pub fn remove_entry(&mut self, index: usize) -> Result<()> {
    if index >= self.entries.len() {
      return Err(Error::OutOfBounds { given: index, limit: self.entries.len() });
    }
    self.entries.remove(index);
    Ok(())
  }
}

/// An icon whose first PNG entry is held decoded as a [`PngPayload`].
///
/// Derefs to the payload, so every PNG carrier operation applies
/// directly; [`IcoPayload::to_bytes`] folds the (possibly modified) PNG
/// back into its entry and re-emits the directory.
#[derive(Debug, Clone, PartialEq)]
pub struct IcoPayload {
  icon: Icon,
  png_index: usize,
  png: PngPayload,
}

impl Deref for IcoPayload {
  type Target = PngPayload;
  #[inline]
  fn deref(&self) -> &PngPayload {
    &self.png
  }
}

impl DerefMut for IcoPayload {
  #[inline]
  fn deref_mut(&mut self) -> &mut PngPayload {
    &mut self.png
  }
}

impl IcoPayload {
  /// Parse an icon and decode its first PNG entry.
  pub fn parse(bytes: &[u8], validate: bool) -> Result<Self> {
    let icon = Icon::parse(bytes)?;
    let png_index = icon.first_png_entry()?;
    let png = PngPayload::parse(&icon.get_entry(png_index)?.1, validate)?;
    Ok(Self { icon, png_index, png })
  }

  /// Read and parse an icon file.
  pub fn open(path: impl AsRef<Path>, validate: bool) -> Result<Self> {
    Self::parse(&util::read_file(path)?, validate)
  }

  #[inline]
  #[must_use]
  pub fn icon(&self) -> &Icon {
    &self.icon
  }

  /// Directory index of the bound PNG entry.
  #[inline]
  #[must_use]
  pub fn png_index(&self) -> usize {
    self.png_index
  }

  #[inline]
  #[must_use]
  pub fn png(&self) -> &PngPayload {
    &self.png
  }

  #[inline]
  #[must_use]
  pub fn png_mut(&mut self) -> &mut PngPayload {
    &mut self.png
  }

  /// Swap in a replacement PNG, e.g. the output of
  /// [`PngPayload::create_stego_payload`].
  pub fn set_png(&mut self, png: PngPayload) {
    self.png = png;
  }

  /// Serialise the bound PNG back into its directory entry.
  pub fn set(&mut self) -> Result<()> {
    let data = self.png.to_bytes();
    self.icon.get_entry_mut(self.png_index)?.1 = data;
    Ok(())
  }

  /// Emit the whole icon with the current PNG folded into its entry.
  pub fn to_bytes(&self) -> Result<Vec<u8>> {
    let mut icon = self.icon.clone();
    icon.get_entry_mut(self.png_index)?.1 = self.png.to_bytes();
    icon.to_bytes()
  }

  /// Serialise and write to a file.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    util::write_file(path, &self.to_bytes()?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(width: u8, payload: Vec<u8>) -> Entry {
    (IconDirEntry { width, height: width, ..IconDirEntry::default() }, payload)
  }

  #[test]
  fn test_icon_round_trip() {
    let mut icon = Icon::new();
    icon.append_entry(entry(16, b"BM fake bitmap bytes".to_vec()));
    icon.append_entry(entry(32, b"BM other bitmap".to_vec()));
    let bytes = icon.to_bytes().unwrap();
    let parsed = Icon::parse(&bytes).unwrap();
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed.get_entry(0).unwrap().1, b"BM fake bitmap bytes");
    assert_eq!(parsed.get_entry(1).unwrap().1, b"BM other bitmap");
    assert_eq!(parsed.get_entry(0).unwrap().0.width, 16);
    assert_eq!(parsed.entry_type(0).unwrap(), EntryType::Bmp);
  }

  #[test]
  fn test_icon_offsets_relocate() {
    let mut icon = Icon::new();
    icon.append_entry(entry(16, vec![0xAA; 10]));
    icon.append_entry(entry(32, vec![0xBB; 5]));
    let bytes = icon.to_bytes().unwrap();
    let parsed = Icon::parse(&bytes).unwrap();
    let first = parsed.get_entry(0).unwrap().0;
    let second = parsed.get_entry(1).unwrap().0;
    assert_eq!(first.offset as usize, ICONDIR_SIZE + 2 * ICONDIRENTRY_SIZE);
    assert_eq!(second.offset, first.offset + first.bytes);
    assert_eq!(second.bytes, 5);
  }

  #[test]
  fn test_icon_parse_errors() {
    assert_eq!(
      Icon::parse(&[0; 4]).unwrap_err(),
      Error::InsufficientSize { given: 4, need: ICONDIR_SIZE }
    );
    // type 2 is a cursor, not an icon
    let mut cursor = Icon::new();
    cursor.append_entry(entry(1, vec![0]));
    let mut bytes = cursor.to_bytes().unwrap();
    bytes[2] = 2;
    assert_eq!(Icon::parse(&bytes).unwrap_err(), Error::InvalidIconHeader);
    // an entry claiming 900 payload bytes in a 23-byte file
    let mut bytes = cursor.to_bytes().unwrap();
    bytes[ICONDIR_SIZE + 8..ICONDIR_SIZE + 12].copy_from_slice(&900_u32.to_le_bytes());
    assert_eq!(
      Icon::parse(&bytes).unwrap_err(),
      Error::OutOfBounds { given: 922, limit: 23 }
    );
  }

  #[test]
  fn test_empty_icon_does_not_serialise() {
    assert_eq!(Icon::new().to_bytes().unwrap_err(), Error::NoIconData);
  }

  #[test]
  fn test_entry_management() {
    let mut icon = Icon::new();
    icon.append_entry(entry(16, vec![1]));
    icon.insert_entry(0, entry(8, vec![2])).unwrap();
    assert_eq!(icon.get_entry(0).unwrap().0.width, 8);
    icon.remove_entry(1).unwrap();
    assert_eq!(icon.len(), 1);
    assert!(icon.remove_entry(4).is_err());
    icon.resize(3);
    assert_eq!(icon.len(), 3);
    assert_eq!(icon.first_png_entry().unwrap_err(), Error::NoPngEntry);
  }
}
