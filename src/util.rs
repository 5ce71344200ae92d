//! Byte-level helpers shared by the PNG engine and the payload carriers:
//! endian reads and writes, the PNG CRC-32, the zlib codec wrappers, base64
//! and file I/O.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, DecodeError, Engine as _};

use crate::error::{Error, Result};

/// Default deflate level for image data. Level 9 is reserved for payload
/// bodies, where size matters more than speed.
pub const DEFAULT_COMPRESSION_LEVEL: u8 = 6;

/// Deflate level used for stego frame bodies and zTXt text.
pub const MAX_COMPRESSION_LEVEL: u8 = 9;

/// Read a big-endian `u16`. Panics if `bytes` is not exactly two bytes.
#[inline]
#[must_use]
pub fn u16_be(bytes: &[u8]) -> u16 {
  u16::from_be_bytes(bytes.try_into().unwrap())
}

/// Read a big-endian `u32`. Panics if `bytes` is not exactly four bytes.
#[inline]
#[must_use]
pub fn u32_be(bytes: &[u8]) -> u32 {
  u32::from_be_bytes(bytes.try_into().unwrap())
}

/// Read a little-endian `u16`. Panics if `bytes` is not exactly two bytes.
#[inline]
#[must_use]
pub fn u16_le(bytes: &[u8]) -> u16 {
  u16::from_le_bytes(bytes.try_into().unwrap())
}

/// Read a little-endian `u32`. Panics if `bytes` is not exactly four bytes.
#[inline]
#[must_use]
pub fn u32_le(bytes: &[u8]) -> u32 {
  u32::from_le_bytes(bytes.try_into().unwrap())
}

const CRC_TABLE: [u32; 256] = make_crc_table();

const fn make_crc_table() -> [u32; 256] {
  let mut out = [0; 256];
  let mut n = 0;
  while n < 256 {
    let mut c = n as u32;
    let mut k = 0;
    while k < 8 {
      if (c & 1) != 0 {
        c = 0xEDB8_8320_u32 ^ (c >> 1);
      } else {
        c = c >> 1;
      }
      //
      k += 1;
    }
    out[n] = c;
    //
    n += 1;
  }
  out
}

/// CRC-32 over `bytes`, chained from `init`.
///
/// Pass 0 to start a fresh computation; pass a previous result to continue
/// it across discontiguous buffers, as the chunk CRC does over
/// `tag || data`.
#[must_use]
pub fn crc32(bytes: &[u8], init: u32) -> u32 {
  let mut crc = init ^ u32::MAX;
  for &byte in bytes {
    let i = (crc ^ u32::from(byte)) as u8 as usize;
    crc = CRC_TABLE[i] ^ (crc >> 8);
  }
  crc ^ u32::MAX
}

/// Deflate `data` into a zlib stream at the given level (0..=10).
#[must_use]
pub fn compress(data: &[u8], level: u8) -> Vec<u8> {
  miniz_oxide::deflate::compress_to_vec_zlib(data, level)
}

/// Inflate a zlib stream.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
  miniz_oxide::inflate::decompress_to_vec_zlib(data)
    .map_err(|e| Error::ZlibError(e.status as i32))
}

/// Base64-encode `data` with the standard alphabet and `=` padding.
#[must_use]
pub fn base64_encode(data: &[u8]) -> String {
  STANDARD.encode(data)
}

/// Decode a standard-alphabet base64 string.
pub fn base64_decode(text: &str) -> Result<Vec<u8>> {
  STANDARD.decode(text).map_err(|e| match e {
    DecodeError::InvalidByte(_, byte) => Error::InvalidBase64Character(byte as char),
    _ => Error::InvalidBase64String,
  })
}

/// Does `text` decode as base64?
#[must_use]
pub fn is_base64_string(text: &str) -> bool {
  STANDARD.decode(text).is_ok()
}

/// Read a whole file, mapping any I/O failure to [`Error::OpenFileFailure`].
pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
  let path = path.as_ref();
  std::fs::read(path).map_err(|_| Error::OpenFileFailure(path.to_path_buf()))
}

/// Write a whole file, mapping any I/O failure to [`Error::OpenFileFailure`].
pub fn write_file(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
  let path = path.as_ref();
  std::fs::write(path, data).map_err(|_| Error::OpenFileFailure(path.to_path_buf()))
}
