#![allow(nonstandard_style)]

//! The typed pixel model: the 15 colour-type × bit-depth combinations of
//! baseline PNG, their byte-aligned span storage, and the sample-level
//! read/write interface over packed spans.
//!
//! A *span* is the smallest byte-aligned storage unit for a pixel kind:
//! one packed byte holding 8/4/2 sub-byte samples, or one whole pixel for
//! kinds of 8 bits per pixel and up. Within a packed byte, sample index 0
//! occupies the highest-order bits. 16-bit samples are kept in their wire
//! (big-endian) byte order so that span memory is always exactly wire
//! memory.
//!
//! Because 1/2/4-bit samples are not addressable, no interior references
//! to samples exist anywhere; all access goes through [`SpanKind::get`]
//! and [`SpanKind::set`].

use bytemuck::{Pod, Zeroable};

use super::ihdr::ColorType;
use crate::error::{Error, Result};

/// The pixel kind of an image: colour type plus bit depth.
///
/// * The greyscale (`Y`) and indexed (`I`) kinds allow 1, 2, and 4-bit
///   samples, tightly packed with the leftmost pixel in the highest bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelKind {
  Y1,
  Y2,
  Y4,
  Y8,
  Y16,
  RGB8,
  RGB16,
  I1,
  I2,
  I4,
  I8,
  YA8,
  YA16,
  RGBA8,
  RGBA16,
}

impl PixelKind {
  /// The kind for a `(color_type, bit_depth)` pair out of an IHDR.
  pub fn new(color_type: u8, bit_depth: u8) -> Result<Self> {
    Ok(match (ColorType::try_from(color_type)?, bit_depth) {
      (ColorType::Grayscale, 1) => Self::Y1,
      (ColorType::Grayscale, 2) => Self::Y2,
      (ColorType::Grayscale, 4) => Self::Y4,
      (ColorType::Grayscale, 8) => Self::Y8,
      (ColorType::Grayscale, 16) => Self::Y16,
      (ColorType::TrueColor, 8) => Self::RGB8,
      (ColorType::TrueColor, 16) => Self::RGB16,
      (ColorType::Palette, 1) => Self::I1,
      (ColorType::Palette, 2) => Self::I2,
      (ColorType::Palette, 4) => Self::I4,
      (ColorType::Palette, 8) => Self::I8,
      (ColorType::AlphaGrayscale, 8) => Self::YA8,
      (ColorType::AlphaGrayscale, 16) => Self::YA16,
      (ColorType::AlphaTrueColor, 8) => Self::RGBA8,
      (ColorType::AlphaTrueColor, 16) => Self::RGBA16,
      _ => return Err(Error::InvalidBitDepth(bit_depth)),
    })
  }

  /// Bits per pixel.
  #[inline]
  #[must_use]
  pub const fn bits(self) -> usize {
    match self {
      Self::Y1 | Self::I1 => 1,
      Self::Y2 | Self::I2 => 2,
      Self::Y4 | Self::I4 => 4,
      Self::Y8 | Self::I8 => 8,
      Self::Y16 | Self::YA8 => 16,
      Self::RGB8 => 24,
      Self::YA16 | Self::RGBA8 => 32,
      Self::RGB16 => 48,
      Self::RGBA16 => 64,
    }
  }

  /// Pixels stored per span: `8 / bits` for sub-byte kinds, 1 otherwise.
  #[inline]
  #[must_use]
  pub const fn samples_per_span(self) -> usize {
    match self {
      Self::Y1 | Self::I1 => 8,
      Self::Y2 | Self::I2 => 4,
      Self::Y4 | Self::I4 => 2,
      _ => 1,
    }
  }

  /// Bytes per span.
  #[inline]
  #[must_use]
  pub const fn span_bytes(self) -> usize {
    let bits = self.bits();
    if bits < 8 {
      1
    } else {
      bits / 8
    }
  }

  #[inline]
  #[must_use]
  pub const fn color_type(self) -> ColorType {
    match self {
      Self::Y1 | Self::Y2 | Self::Y4 | Self::Y8 | Self::Y16 => ColorType::Grayscale,
      Self::RGB8 | Self::RGB16 => ColorType::TrueColor,
      Self::I1 | Self::I2 | Self::I4 | Self::I8 => ColorType::Palette,
      Self::YA8 | Self::YA16 => ColorType::AlphaGrayscale,
      Self::RGBA8 | Self::RGBA16 => ColorType::AlphaTrueColor,
    }
  }

  /// Bits per sample, the IHDR `bit_depth` field.
  #[inline]
  #[must_use]
  pub const fn bit_depth(self) -> u8 {
    match self {
      Self::Y1 | Self::I1 => 1,
      Self::Y2 | Self::I2 => 2,
      Self::Y4 | Self::I4 => 4,
      Self::Y8 | Self::RGB8 | Self::I8 | Self::YA8 | Self::RGBA8 => 8,
      Self::Y16 | Self::RGB16 | Self::YA16 | Self::RGBA16 => 16,
    }
  }
}

/// Eight 1-bit greyscale samples, tightly packed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Y1x8 {
  pub y: u8,
}

/// Four 2-bit greyscale samples, tightly packed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Y2x4 {
  pub y: u8,
}

/// Two 4-bit greyscale samples, tightly packed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Y4x2 {
  pub y: u8,
}

/// An 8-bit greyscale pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Y8 {
  pub y: u8,
}

/// A 16-bit greyscale pixel, stored big-endian.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Y16_BE {
  pub y: [u8; 2],
}

/// An RGB pixel, 8 bits per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct RGB8 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}

/// An RGB pixel, 16 bits per channel, stored big-endian.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct RGB16_BE {
  pub r: [u8; 2],
  pub g: [u8; 2],
  pub b: [u8; 2],
}

/// Eight 1-bit palette indices, tightly packed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Index1x8 {
  pub i: u8,
}

/// Four 2-bit palette indices, tightly packed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Index2x4 {
  pub i: u8,
}

/// Two 4-bit palette indices, tightly packed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Index4x2 {
  pub i: u8,
}

/// An 8-bit palette index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Index8 {
  pub i: u8,
}

/// A greyscale + alpha pixel, 8 bits per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct YA8 {
  pub y: u8,
  pub a: u8,
}

/// A greyscale + alpha pixel, 16 bits per channel, stored big-endian.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct YA16_BE {
  pub y: [u8; 2],
  pub a: [u8; 2],
}

/// An RGBA pixel, 8 bits per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct RGBA8 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}

/// An RGBA pixel, 16 bits per channel, stored big-endian.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct RGBA16_BE {
  pub r: [u8; 2],
  pub g: [u8; 2],
  pub b: [u8; 2],
  pub a: [u8; 2],
}

impl Y16_BE {
  #[inline]
  #[must_use]
  pub const fn new(y: u16) -> Self {
    Self { y: y.to_be_bytes() }
  }
  #[inline]
  #[must_use]
  pub const fn y(&self) -> u16 {
    u16::from_be_bytes(self.y)
  }
}

impl RGB16_BE {
  #[inline]
  #[must_use]
  pub const fn new(r: u16, g: u16, b: u16) -> Self {
    Self { r: r.to_be_bytes(), g: g.to_be_bytes(), b: b.to_be_bytes() }
  }
  #[inline]
  #[must_use]
  pub const fn r(&self) -> u16 {
    u16::from_be_bytes(self.r)
  }
  #[inline]
  #[must_use]
  pub const fn g(&self) -> u16 {
    u16::from_be_bytes(self.g)
  }
  #[inline]
  #[must_use]
  pub const fn b(&self) -> u16 {
    u16::from_be_bytes(self.b)
  }
}

impl YA16_BE {
  #[inline]
  #[must_use]
  pub const fn new(y: u16, a: u16) -> Self {
    Self { y: y.to_be_bytes(), a: a.to_be_bytes() }
  }
  #[inline]
  #[must_use]
  pub const fn y(&self) -> u16 {
    u16::from_be_bytes(self.y)
  }
  #[inline]
  #[must_use]
  pub const fn a(&self) -> u16 {
    u16::from_be_bytes(self.a)
  }
}

impl RGBA16_BE {
  #[inline]
  #[must_use]
  pub const fn new(r: u16, g: u16, b: u16, a: u16) -> Self {
    Self { r: r.to_be_bytes(), g: g.to_be_bytes(), b: b.to_be_bytes(), a: a.to_be_bytes() }
  }
  #[inline]
  #[must_use]
  pub const fn r(&self) -> u16 {
    u16::from_be_bytes(self.r)
  }
  #[inline]
  #[must_use]
  pub const fn g(&self) -> u16 {
    u16::from_be_bytes(self.g)
  }
  #[inline]
  #[must_use]
  pub const fn b(&self) -> u16 {
    u16::from_be_bytes(self.b)
  }
  #[inline]
  #[must_use]
  pub const fn a(&self) -> u16 {
    u16::from_be_bytes(self.a)
  }
}

/// A single pixel value of any kind.
///
/// Sub-byte kinds carry their sample in the low bits of a `u8`; writes
/// reject values that do not fit the bit width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pixel {
  Y1(u8),
  Y2(u8),
  Y4(u8),
  Y8(Y8),
  Y16(Y16_BE),
  RGB8(RGB8),
  RGB16(RGB16_BE),
  I1(u8),
  I2(u8),
  I4(u8),
  I8(Index8),
  YA8(YA8),
  YA16(YA16_BE),
  RGBA8(RGBA8),
  RGBA16(RGBA16_BE),
}

impl Pixel {
  #[inline]
  #[must_use]
  pub const fn kind(&self) -> PixelKind {
    match self {
      Self::Y1(_) => PixelKind::Y1,
      Self::Y2(_) => PixelKind::Y2,
      Self::Y4(_) => PixelKind::Y4,
      Self::Y8(_) => PixelKind::Y8,
      Self::Y16(_) => PixelKind::Y16,
      Self::RGB8(_) => PixelKind::RGB8,
      Self::RGB16(_) => PixelKind::RGB16,
      Self::I1(_) => PixelKind::I1,
      Self::I2(_) => PixelKind::I2,
      Self::I4(_) => PixelKind::I4,
      Self::I8(_) => PixelKind::I8,
      Self::YA8(_) => PixelKind::YA8,
      Self::YA16(_) => PixelKind::YA16,
      Self::RGBA8(_) => PixelKind::RGBA8,
      Self::RGBA16(_) => PixelKind::RGBA16,
    }
  }
}

/// Sample access over one span of a given pixel kind.
///
/// Implemented by every span storage type; the scanline layer is generic
/// over this.
pub trait SpanKind: Copy + Default + PartialEq + core::fmt::Debug + Pod {
  /// Bits per pixel of this kind.
  const BITS: usize;
  /// Samples stored in one span.
  const SAMPLES: usize;
  /// The kind tag this span stores.
  const KIND: PixelKind;

  /// Read the sample at `index` within this span.
  fn get(&self, index: usize) -> Result<Pixel>;

  /// Write the sample at `index` within this span.
  fn set(&mut self, index: usize, pixel: Pixel) -> Result<()>;
}

macro_rules! impl_packed_span {
  ($span:ty, $field:ident, $bits:expr, $kind:ident) => {
    impl SpanKind for $span {
      const BITS: usize = $bits;
      const SAMPLES: usize = 8 / $bits;
      const KIND: PixelKind = PixelKind::$kind;

      #[inline]
      fn get(&self, index: usize) -> Result<Pixel> {
        if index >= Self::SAMPLES {
          return Err(Error::OutOfBounds { given: index, limit: Self::SAMPLES });
        }
        let max = (1_u8 << Self::BITS) - 1;
        let shift = (Self::SAMPLES - 1 - index) * Self::BITS;
        Ok(Pixel::$kind((self.$field >> shift) & max))
      }

      #[inline]
      fn set(&mut self, index: usize, pixel: Pixel) -> Result<()> {
        let Pixel::$kind(value) = pixel else {
          return Err(Error::PixelKindMismatch);
        };
        if index >= Self::SAMPLES {
          return Err(Error::OutOfBounds { given: index, limit: Self::SAMPLES });
        }
        let max = (1_u8 << Self::BITS) - 1;
        if value > max {
          return Err(Error::IntegerOverflow { given: value as usize, max: max as usize });
        }
        let shift = (Self::SAMPLES - 1 - index) * Self::BITS;
        self.$field = (self.$field & !(max << shift)) | (value << shift);
        Ok(())
      }
    }
  };
}

macro_rules! impl_whole_span {
  ($span:ty, $bits:expr, $kind:ident) => {
    impl SpanKind for $span {
      const BITS: usize = $bits;
      const SAMPLES: usize = 1;
      const KIND: PixelKind = PixelKind::$kind;

      #[inline]
      fn get(&self, index: usize) -> Result<Pixel> {
        if index >= Self::SAMPLES {
          return Err(Error::OutOfBounds { given: index, limit: Self::SAMPLES });
        }
        Ok(Pixel::$kind(*self))
      }

      #[inline]
      fn set(&mut self, index: usize, pixel: Pixel) -> Result<()> {
        let Pixel::$kind(value) = pixel else {
          return Err(Error::PixelKindMismatch);
        };
        if index >= Self::SAMPLES {
          return Err(Error::OutOfBounds { given: index, limit: Self::SAMPLES });
        }
        *self = value;
        Ok(())
      }
    }
  };
}

impl_packed_span!(Y1x8, y, 1, Y1);
impl_packed_span!(Y2x4, y, 2, Y2);
impl_packed_span!(Y4x2, y, 4, Y4);
impl_packed_span!(Index1x8, i, 1, I1);
impl_packed_span!(Index2x4, i, 2, I2);
impl_packed_span!(Index4x2, i, 4, I4);

impl_whole_span!(Y8, 8, Y8);
impl_whole_span!(Y16_BE, 16, Y16);
impl_whole_span!(RGB8, 24, RGB8);
impl_whole_span!(RGB16_BE, 48, RGB16);
impl_whole_span!(Index8, 8, I8);
impl_whole_span!(YA8, 16, YA8);
impl_whole_span!(YA16_BE, 32, YA16);
impl_whole_span!(RGBA8, 32, RGBA8);
impl_whole_span!(RGBA16_BE, 64, RGBA16);

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_packed_span_read_back() {
    // every legal write sequence reads back the latest values
    let mut span = Y2x4::default();
    for (index, value) in [(0, 3), (1, 0), (2, 2), (3, 1)] {
      span.set(index, Pixel::Y2(value)).unwrap();
    }
    for (index, value) in [(0, 3), (1, 0), (2, 2), (3, 1)] {
      assert_eq!(span.get(index).unwrap(), Pixel::Y2(value));
    }
    // sample 0 lands in the highest-order bits
    assert_eq!(span.y, 0b11_00_10_01);
    // overwriting one sample leaves the others alone
    span.set(2, Pixel::Y2(0)).unwrap();
    assert_eq!(span.y, 0b11_00_00_01);
  }

  #[test]
  fn test_packed_span_one_bit() {
    let mut span = Index1x8::default();
    span.set(0, Pixel::I1(1)).unwrap();
    span.set(7, Pixel::I1(1)).unwrap();
    assert_eq!(span.i, 0b1000_0001);
    assert_eq!(span.get(0).unwrap(), Pixel::I1(1));
    assert_eq!(span.get(1).unwrap(), Pixel::I1(0));
  }

  #[test]
  fn test_span_rejects_out_of_range_sample() {
    let mut span = Y4x2::default();
    assert_eq!(
      span.set(0, Pixel::Y4(16)),
      Err(Error::IntegerOverflow { given: 16, max: 15 })
    );
    assert_eq!(span.set(0, Pixel::Y4(15)), Ok(()));
  }

  #[test]
  fn test_span_rejects_bad_index_and_kind() {
    let mut span = Y1x8::default();
    assert_eq!(
      span.get(8).unwrap_err(),
      Error::OutOfBounds { given: 8, limit: 8 }
    );
    assert_eq!(
      span.set(0, Pixel::I1(0)).unwrap_err(),
      Error::PixelKindMismatch
    );

    let mut rgba = RGBA8::default();
    assert_eq!(
      rgba.get(1).unwrap_err(),
      Error::OutOfBounds { given: 1, limit: 1 }
    );
    assert_eq!(
      rgba.set(0, Pixel::RGB8(RGB8::default())).unwrap_err(),
      Error::PixelKindMismatch
    );
  }

  #[test]
  fn test_sixteen_bit_spans_are_wire_order() {
    let span = RGB16_BE::new(0x0102, 0x0304, 0x0506);
    assert_eq!(bytemuck::bytes_of(&span), &[1, 2, 3, 4, 5, 6]);
    assert_eq!(span.g(), 0x0304);
    let span = Y16_BE::new(0xBEEF);
    assert_eq!(bytemuck::bytes_of(&span), &[0xBE, 0xEF]);
  }

  #[test]
  fn test_kind_tables_agree() {
    for kind in [
      PixelKind::Y1,
      PixelKind::Y2,
      PixelKind::Y4,
      PixelKind::Y8,
      PixelKind::Y16,
      PixelKind::RGB8,
      PixelKind::RGB16,
      PixelKind::I1,
      PixelKind::I2,
      PixelKind::I4,
      PixelKind::I8,
      PixelKind::YA8,
      PixelKind::YA16,
      PixelKind::RGBA8,
      PixelKind::RGBA16,
    ] {
      assert_eq!(
        PixelKind::new(kind.color_type() as u8, kind.bit_depth()).unwrap(),
        kind
      );
      assert_eq!(kind.samples_per_span() * kind.bits(), 8.max(kind.bits()));
      assert_eq!(kind.span_bytes() * 8, 8.max(kind.bits()));
    }
  }

  #[test]
  fn test_kind_rejects_illegal_pairs() {
    assert_eq!(PixelKind::new(2, 4), Err(Error::InvalidBitDepth(4)));
    assert_eq!(PixelKind::new(3, 16), Err(Error::InvalidBitDepth(16)));
    assert_eq!(PixelKind::new(1, 8), Err(Error::InvalidColorType(1)));
  }
}
