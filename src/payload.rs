//! The payload layer over a parsed PNG.
//!
//! [`PngPayload`] adds two families of carriers to [`Image`]: base64 text
//! payloads riding in `tEXt`/`zTXt` chunks, and the steganographic
//! carrier that hides a framed, deflated payload in the low nibbles of
//! the image's red, green, and blue channels.
//!
//! ## Stego carrier layout
//!
//! The write index is a bit offset over the virtual stream of low
//! nibbles: each pixel contributes one nibble per colour channel in R, G,
//! B order, and alpha is skipped. The frame written at bit offset 0 is
//!
//! ```text
//! "FCD" | length:u32le | deflate(payload) | "DCF"
//! ```
//!
//! so the magic occupies bits 0..24, the length bits 24..56, the body
//! bits 56..56+8*length, and the trailer the 24 bits after the body. Only
//! 8-bit truecolour kinds (RGB8, RGBA8) can carry the frame.

use std::ops::{Deref, DerefMut};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::png::{Image, Pixel, PixelKind, Text, ZText, DEFAULT_IDAT_CHUNK_SIZE};
use crate::util;

/// Frame magic preceding the stego body.
pub const STEGO_HEADER: [u8; 3] = *b"FCD";

/// Frame magic following the stego body.
pub const STEGO_TRAILER: [u8; 3] = *b"DCF";

/// Bits consumed by the frame around the body: header, length, trailer.
const STEGO_FRAME_BITS: usize = (STEGO_HEADER.len() + 4 + STEGO_TRAILER.len()) * 8;

/// A PNG image with payload-carrier operations layered on top.
///
/// Derefs to [`Image`], so the whole container API is available on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PngPayload {
  image: Image,
}

impl Deref for PngPayload {
  type Target = Image;
  #[inline]
  fn deref(&self) -> &Image {
    &self.image
  }
}

impl DerefMut for PngPayload {
  #[inline]
  fn deref_mut(&mut self) -> &mut Image {
    &mut self.image
  }
}

impl From<Image> for PngPayload {
  #[inline]
  fn from(image: Image) -> Self {
    Self { image }
  }
}

impl PngPayload {
  #[inline]
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Parse a PNG byte stream. See [`Image::parse`].
  pub fn parse(bytes: &[u8], validate: bool) -> Result<Self> {
    Ok(Self { image: Image::parse(bytes, validate)? })
  }

  /// Read and parse a PNG file.
  pub fn open(path: impl AsRef<Path>, validate: bool) -> Result<Self> {
    Ok(Self { image: Image::open(path, validate)? })
  }

  #[inline]
  #[must_use]
  pub fn image(&self) -> &Image {
    &self.image
  }

  #[inline]
  #[must_use]
  pub fn into_image(self) -> Image {
    self.image
  }

  /// Append the payload as a base64 `tEXt` chunk under `keyword`.
  pub fn add_text_payload(&mut self, keyword: &str, data: &[u8]) -> Result<()> {
    self.add_text(keyword, &util::base64_encode(data))
  }

  /// The `tEXt` chunks under `keyword`, verified to hold base64 text.
  pub fn get_text_payloads(&self, keyword: &str) -> Result<Vec<Text>> {
    let mut payloads = Vec::new();
    for text in self.get_text(keyword) {
      if !util::is_base64_string(&text.text()) {
        return Err(Error::InvalidBase64String);
      }
      payloads.push(text);
    }
    Ok(payloads)
  }

  /// Decode every `tEXt` payload under `keyword`, in insertion order.
  pub fn extract_text_payloads(&self, keyword: &str) -> Result<Vec<Vec<u8>>> {
    self.get_text_payloads(keyword)?.iter().map(|text| util::base64_decode(&text.text())).collect()
  }

  pub fn remove_text_payload(&mut self, text: &Text) -> Result<()> {
    self.remove_text(text)
  }

  /// Append the payload as a base64 `zTXt` chunk under `keyword`.
  pub fn add_ztext_payload(&mut self, keyword: &str, data: &[u8]) -> Result<()> {
    self.add_ztext(keyword, &util::base64_encode(data))
  }

  /// The `zTXt` chunks under `keyword`, verified to hold base64 text.
  pub fn get_ztext_payloads(&self, keyword: &str) -> Result<Vec<ZText>> {
    let mut payloads = Vec::new();
    for ztext in self.get_ztext(keyword) {
      if !util::is_base64_string(&ztext.text()?) {
        return Err(Error::InvalidBase64String);
      }
      payloads.push(ztext);
    }
    Ok(payloads)
  }

  /// Inflate and decode every `zTXt` payload under `keyword`.
  pub fn extract_ztext_payloads(&self, keyword: &str) -> Result<Vec<Vec<u8>>> {
    self
      .get_ztext_payloads(keyword)?
      .iter()
      .map(|ztext| util::base64_decode(&ztext.text()?))
      .collect()
  }

  pub fn remove_ztext_payload(&mut self, ztext: &ZText) -> Result<()> {
    self.remove_ztext(ztext)
  }

  /// The pixel kind, if it can carry the stego frame.
  fn stego_kind(&self) -> Result<PixelKind> {
    match self.header()?.pixel_kind()? {
      kind @ (PixelKind::RGB8 | PixelKind::RGBA8) => Ok(kind),
      _ => Err(Error::UnsupportedPixelKind),
    }
  }

  /// Total nibble-stream capacity in bits: one nibble per colour channel,
  /// three channels per pixel.
  pub fn stego_capacity_bits(&self) -> Result<usize> {
    self.stego_kind()?;
    let header = self.header()?;
    Ok(header.width as usize * header.height as usize * 3 * 4)
  }

  fn check_stego_range(&self, bit_offset: usize, bit_length: usize) -> Result<()> {
    if bit_offset % 4 != 0 {
      return Err(Error::InvalidBitOffset(bit_offset));
    }
    let capacity = self.stego_capacity_bits()?;
    if bit_offset + bit_length > capacity {
      return Err(Error::OutOfBounds { given: bit_offset + bit_length, limit: capacity });
    }
    Ok(())
  }

  fn read_nibble(&self, width: usize, bit_offset: usize) -> Result<u8> {
    let channel_index = bit_offset / 4;
    let pixel_index = channel_index / 3;
    let channel = channel_index % 3;
    let pixel = self.scanline(pixel_index / width)?.get_pixel(pixel_index % width)?;
    match pixel {
      Pixel::RGB8(p) => Ok([p.r, p.g, p.b][channel] & 0x0F),
      Pixel::RGBA8(p) => Ok([p.r, p.g, p.b][channel] & 0x0F),
      _ => Err(Error::UnsupportedPixelKind),
    }
  }

  fn write_nibble(&mut self, width: usize, bit_offset: usize, nibble: u8) -> Result<()> {
    let channel_index = bit_offset / 4;
    let pixel_index = channel_index / 3;
    let channel = channel_index % 3;
    let row = pixel_index / width;
    let column = pixel_index % width;
    let mut pixel = self.scanline(row)?.get_pixel(column)?;
    match &mut pixel {
      Pixel::RGB8(p) => {
        let sample = match channel {
          0 => &mut p.r,
          1 => &mut p.g,
          _ => &mut p.b,
        };
        *sample = (*sample & 0xF0) | (nibble & 0x0F);
      }
      Pixel::RGBA8(p) => {
        let sample = match channel {
          0 => &mut p.r,
          1 => &mut p.g,
          _ => &mut p.b,
        };
        *sample = (*sample & 0xF0) | (nibble & 0x0F);
      }
      _ => return Err(Error::UnsupportedPixelKind),
    }
    self.scanline_mut(row)?.set_pixel(pixel, column)
  }

  /// Read `size` bytes from the nibble stream starting at `bit_offset`.
  ///
  /// Byte `k` gets its low nibble from bit offset `bit_offset + 8k` and
  /// its high nibble from `bit_offset + 8k + 4`. The image must be
  /// loaded, the offset a multiple of four, and the range in capacity.
  pub fn read_stego_data(&self, bit_offset: usize, size: usize) -> Result<Vec<u8>> {
    self.check_stego_range(bit_offset, size * 8)?;
    let width = self.header()?.width as usize;
    let mut out = Vec::with_capacity(size);
    for k in 0..size {
      let low = self.read_nibble(width, bit_offset + 8 * k)?;
      let high = self.read_nibble(width, bit_offset + 8 * k + 4)?;
      out.push(low | (high << 4));
    }
    Ok(out)
  }

  /// Write `data` into the nibble stream starting at `bit_offset`,
  /// symmetric to [`PngPayload::read_stego_data`]. Each nibble lands in
  /// exactly one colour channel.
  pub fn write_stego_data(&mut self, data: &[u8], bit_offset: usize) -> Result<()> {
    self.check_stego_range(bit_offset, data.len() * 8)?;
    let width = self.header()?.width as usize;
    for (k, &byte) in data.iter().enumerate() {
      self.write_nibble(width, bit_offset + 8 * k, byte & 0x0F)?;
      self.write_nibble(width, bit_offset + 8 * k + 4, byte >> 4)?;
    }
    Ok(())
  }

  /// Is a well-formed stego frame present at bit offset 0?
  ///
  /// Requires a loaded image. Unsupported pixel kinds simply carry no
  /// frame.
  pub fn has_stego_payload(&self) -> Result<bool> {
    if self.stego_kind().is_err() {
      return Ok(false);
    }
    let capacity = self.stego_capacity_bits()?;
    if capacity < STEGO_FRAME_BITS {
      return Ok(false);
    }
    if self.read_stego_data(0, STEGO_HEADER.len())? != STEGO_HEADER {
      return Ok(false);
    }
    let length = u32_from_bytes(&self.read_stego_data(24, 4)?) as usize;
    let frame_end = STEGO_FRAME_BITS + length * 8;
    if frame_end > capacity {
      return Ok(false);
    }
    Ok(self.read_stego_data(56 + length * 8, STEGO_TRAILER.len())? == STEGO_TRAILER)
  }

  /// Hide `data` in a copy of this image.
  ///
  /// The payload is deflated at maximum compression, framed, written at
  /// bit offset 0, and the copy is re-filtered and re-compressed so the
  /// modified pixels land in fresh `IDAT` chunks. The returned image is
  /// ready to serialise.
  pub fn create_stego_payload(&self, data: &[u8]) -> Result<Self> {
    let mut output = self.clone();
    output.stego_kind()?;

    let body = util::compress(data, util::MAX_COMPRESSION_LEVEL);
    let mut framed = Vec::with_capacity(STEGO_FRAME_BITS / 8 + body.len());
    framed.extend_from_slice(&STEGO_HEADER);
    framed.extend_from_slice(&(body.len() as u32).to_le_bytes());
    framed.extend_from_slice(&body);
    framed.extend_from_slice(&STEGO_TRAILER);

    let capacity = output.stego_capacity_bits()? / 8;
    if framed.len() > capacity {
      return Err(Error::ImageTooSmall { have: capacity, need: framed.len() });
    }
    debug!(payload = data.len(), framed = framed.len(), capacity, "embedding stego payload");

    output.load()?;
    output.write_stego_data(&framed, 0)?;
    output.filter()?;
    output.compress(Some(DEFAULT_IDAT_CHUNK_SIZE), util::DEFAULT_COMPRESSION_LEVEL)?;
    Ok(output)
  }

  /// Recover the payload hidden by [`PngPayload::create_stego_payload`].
  ///
  /// The image must be loaded. Fails with [`Error::NoStegoData`] when the
  /// frame is absent or malformed.
  pub fn extract_stego_payload(&self) -> Result<Vec<u8>> {
    if !self.has_stego_payload()? {
      return Err(Error::NoStegoData);
    }
    let length = u32_from_bytes(&self.read_stego_data(24, 4)?) as usize;
    let body = self.read_stego_data(56, length)?;
    util::decompress(&body)
  }
}

fn u32_from_bytes(bytes: &[u8]) -> u32 {
  u32::from_le_bytes(bytes.try_into().expect("stego length reads are four bytes"))
}
