use super::chunk::{Chunk, ChunkTag};
use super::pixel::PixelKind;
use crate::error::{Error, Result};
use crate::util;

/// The five colour types of baseline PNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ColorType {
  Grayscale = 0,
  TrueColor = 2,
  Palette = 3,
  AlphaGrayscale = 4,
  AlphaTrueColor = 6,
}

impl TryFrom<u8> for ColorType {
  type Error = Error;
  #[inline]
  fn try_from(value: u8) -> Result<Self> {
    Ok(match value {
      0 => Self::Grayscale,
      2 => Self::TrueColor,
      3 => Self::Palette,
      4 => Self::AlphaGrayscale,
      6 => Self::AlphaTrueColor,
      other => return Err(Error::InvalidColorType(other)),
    })
  }
}

/// The parsed 13-byte IHDR payload.
///
/// Width, height, and the format fields are plain values here; conversion
/// to and from the chunk's big-endian wire form happens in
/// [`Header::from_chunk`] and [`Header::to_chunk`]. Only `compression`,
/// `filter_method`, and `interlace` of 0 are accepted for pixel
/// processing; parsing tolerates other values so that such files can still
/// be re-serialised untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Header {
  pub width: u32,
  pub height: u32,
  pub bit_depth: u8,
  pub color_type: u8,
  pub compression_method: u8,
  pub filter_method: u8,
  pub interlace_method: u8,
}

impl Header {
  /// Wire length of an IHDR payload.
  pub const DATA_LENGTH: usize = 13;

  #[inline]
  #[must_use]
  pub const fn new(width: u32, height: u32, bit_depth: u8, color_type: ColorType) -> Self {
    Self {
      width,
      height,
      bit_depth,
      color_type: color_type as u8,
      compression_method: 0,
      filter_method: 0,
      interlace_method: 0,
    }
  }

  /// Decode an IHDR chunk's payload.
  pub fn from_chunk(chunk: &Chunk) -> Result<Self> {
    let data = chunk.data();
    if data.len() != Self::DATA_LENGTH {
      return Err(Error::InsufficientSize { given: data.len(), need: Self::DATA_LENGTH });
    }
    Ok(Self {
      width: util::u32_be(&data[0..4]),
      height: util::u32_be(&data[4..8]),
      bit_depth: data[8],
      color_type: data[9],
      compression_method: data[10],
      filter_method: data[11],
      interlace_method: data[12],
    })
  }

  /// Encode back into an owning `IHDR` chunk.
  #[must_use]
  pub fn to_chunk(&self) -> Chunk {
    let mut data = Vec::with_capacity(Self::DATA_LENGTH);
    data.extend_from_slice(&self.width.to_be_bytes());
    data.extend_from_slice(&self.height.to_be_bytes());
    data.extend_from_slice(&[
      self.bit_depth,
      self.color_type,
      self.compression_method,
      self.filter_method,
      self.interlace_method,
    ]);
    Chunk::new(ChunkTag::IHDR, data)
  }

  /// The pixel kind implied by the colour type and bit depth.
  #[inline]
  pub fn pixel_kind(&self) -> Result<PixelKind> {
    PixelKind::new(self.color_type, self.bit_depth)
  }

  /// Bits per pixel.
  #[inline]
  pub fn pixel_bits(&self) -> Result<usize> {
    Ok(self.pixel_kind()?.bits())
  }

  /// Bytes per raw scanline, excluding the filter byte.
  #[inline]
  pub fn stride(&self) -> Result<usize> {
    let bits = self.pixel_bits()? * self.width as usize;
    Ok(bits / 8 + usize::from(bits % 8 != 0))
  }

  /// Total byte length of the inflated image data: `height` scanlines of
  /// one filter byte plus `stride` raw bytes.
  #[inline]
  pub fn buffer_size(&self) -> Result<usize> {
    Ok((self.stride()? + 1) * self.height as usize)
  }
}
