//! Scanlines and the filter stage.
//!
//! A scanline is a filter tag plus an ordered run of spans. The filter and
//! reconstruction passes work span-byte-wise: the "left" neighbour of a
//! byte is the byte at the same position in the previous *span*. A span is
//! one whole pixel for kinds of 8 bits per pixel and up, and one packed
//! byte for the sub-byte kinds, so the distance back to "left" is the span
//! byte width rather than a per-pixel channel offset.

use bytemuck::{cast_slice, cast_slice_mut};

use super::ihdr::Header;
use super::pixel::{
  Index1x8, Index2x4, Index4x2, Index8, Pixel, PixelKind, SpanKind, RGB16_BE, RGB8, RGBA16_BE,
  RGBA8, Y16_BE, Y1x8, Y2x4, Y4x2, Y8, YA16_BE, YA8,
};
use crate::error::{Error, Result};

/// The five per-scanline filters of baseline PNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FilterType {
  None = 0,
  Sub = 1,
  Up = 2,
  Average = 3,
  Paeth = 4,
}

impl TryFrom<u8> for FilterType {
  type Error = Error;
  #[inline]
  fn try_from(value: u8) -> Result<Self> {
    Ok(match value {
      0 => Self::None,
      1 => Self::Sub,
      2 => Self::Up,
      3 => Self::Average,
      4 => Self::Paeth,
      other => return Err(Error::InvalidFilterType(other)),
    })
  }
}

/// Paeth predictor. Ties break in the order left, up, up-left; the PNG
/// spec is emphatic that this evaluation order must not change.
const fn paeth_predict(a: i32, b: i32, c: i32) -> i32 {
  let p = a + b - c;
  let pa = (p - a).abs();
  let pb = (p - b).abs();
  let pc = (p - c).abs();
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// One row of image data for a single pixel kind: a filter tag and the
/// row's spans.
///
/// The logical pixel count is `span count × samples per span`, which may
/// exceed the image width for sub-byte kinds; the trailing samples of the
/// last span are unused padding and stay zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanlineBase<P: SpanKind> {
  filter_type: u8,
  spans: Vec<P>,
}

impl<P: SpanKind> ScanlineBase<P> {
  /// Spans needed to hold `width` pixels.
  #[inline]
  #[must_use]
  fn span_count_for_width(width: usize) -> usize {
    width / P::SAMPLES + usize::from(width % P::SAMPLES != 0)
  }

  /// A zeroed scanline wide enough for `width` pixels.
  #[must_use]
  pub fn new(filter_type: u8, width: usize) -> Self {
    Self { filter_type, spans: vec![P::default(); Self::span_count_for_width(width)] }
  }

  #[inline]
  #[must_use]
  pub fn from_spans(filter_type: u8, spans: Vec<P>) -> Self {
    Self { filter_type, spans }
  }

  /// Parse one `filter byte + raw bytes` line starting at `offset`.
  pub fn read_line(raw: &[u8], offset: usize, width: usize) -> Result<Self> {
    if offset >= raw.len() {
      return Err(Error::OutOfBounds { given: offset, limit: raw.len() });
    }
    let filter_type = raw[offset];
    let bit_width = P::BITS * width;
    let byte_width = bit_width / 8 + usize::from(bit_width % 8 != 0);
    if offset + 1 + byte_width > raw.len() {
      return Err(Error::OutOfBounds { given: offset + 1 + byte_width, limit: raw.len() });
    }
    let spans = cast_slice::<u8, P>(&raw[offset + 1..offset + 1 + byte_width]).to_vec();
    Ok(Self { filter_type, spans })
  }

  /// Split a whole inflated image buffer into typed rows.
  ///
  /// The buffer must be exactly `height × (1 + stride)` bytes.
  pub fn rows_from_raw(header: &Header, raw: &[u8]) -> Result<Vec<Self>> {
    let width = header.width as usize;
    let buffer_size = header.buffer_size()?;
    if raw.len() != buffer_size {
      return Err(Error::PixelMismatch);
    }
    let bit_width = P::BITS * width;
    let byte_width = bit_width / 8 + usize::from(bit_width % 8 != 0);
    let mut rows = Vec::with_capacity(header.height as usize);
    let mut offset = 0;
    while offset < buffer_size {
      rows.push(Self::read_line(raw, offset, width)?);
      offset += byte_width + 1;
    }
    Ok(rows)
  }

  #[inline]
  #[must_use]
  pub fn filter_type(&self) -> u8 {
    self.filter_type
  }

  #[inline]
  pub fn set_filter_type(&mut self, filter_type: u8) {
    self.filter_type = filter_type;
  }

  #[inline]
  #[must_use]
  pub fn spans(&self) -> &[P] {
    &self.spans
  }

  /// Number of spans in the row.
  #[inline]
  #[must_use]
  pub fn pixel_span(&self) -> usize {
    self.spans.len()
  }

  /// Logical pixel count, including any trailing padding samples.
  #[inline]
  #[must_use]
  pub fn pixel_width(&self) -> usize {
    self.spans.len() * P::SAMPLES
  }

  pub fn get_span(&self, index: usize) -> Result<&P> {
    self.spans.get(index).ok_or(Error::OutOfBounds { given: index, limit: self.spans.len() })
  }

  pub fn set_span(&mut self, span: P, index: usize) -> Result<()> {
    let limit = self.spans.len();
    *self.spans.get_mut(index).ok_or(Error::OutOfBounds { given: index, limit })? = span;
    Ok(())
  }

  pub fn get_pixel(&self, index: usize) -> Result<Pixel> {
    if index >= self.pixel_width() {
      return Err(Error::OutOfBounds { given: index, limit: self.pixel_width() });
    }
    self.spans[index / P::SAMPLES].get(index % P::SAMPLES)
  }

  pub fn set_pixel(&mut self, pixel: Pixel, index: usize) -> Result<()> {
    if index >= self.pixel_width() {
      return Err(Error::OutOfBounds { given: index, limit: self.pixel_width() });
    }
    self.spans[index / P::SAMPLES].set(index % P::SAMPLES, pixel)
  }

  /// Emit the wire form: filter byte followed by the span bytes.
  #[must_use]
  pub fn to_raw(&self) -> Vec<u8> {
    let span_bytes: &[u8] = cast_slice(self.spans.as_slice());
    let mut out = Vec::with_capacity(1 + span_bytes.len());
    out.push(self.filter_type);
    out.extend_from_slice(span_bytes);
    out
  }

  /// Undo this row's filter, producing the reconstructed row with a filter
  /// tag of 0.
  ///
  /// `previous` is the already-reconstructed row above, absent on the
  /// first row. Bytes outside the image act as zero.
  pub fn reconstruct(&self, previous: Option<&Self>) -> Result<Self> {
    if self.filter_type == FilterType::None as u8 {
      return Ok(self.clone());
    }
    if let Some(previous) = previous {
      if previous.spans.len() != self.spans.len() {
        return Err(Error::ScanlineMismatch);
      }
    }
    if self.spans.is_empty() {
      return Err(Error::NoPixels);
    }
    let filter = FilterType::try_from(self.filter_type)?;
    let size = core::mem::size_of::<P>();
    let mut result = self.clone();
    let bytes: &mut [u8] = cast_slice_mut(result.spans.as_mut_slice());
    let prev_bytes: Option<&[u8]> = previous.map(|p| cast_slice(p.spans.as_slice()));
    for k in 0..bytes.len() {
      // the span to the left is already reconstructed at this point
      let curr = bytes[k] as i32;
      let left = if k < size { 0 } else { bytes[k - size] as i32 };
      let up = prev_bytes.map_or(0, |p| p[k] as i32);
      let up_left = if k < size { 0 } else { prev_bytes.map_or(0, |p| p[k - size] as i32) };
      bytes[k] = match filter {
        FilterType::None => curr,
        FilterType::Sub => curr + left,
        FilterType::Up => curr + up,
        FilterType::Average => curr + (left + up) / 2,
        FilterType::Paeth => curr + paeth_predict(left, up, up_left),
      } as u8;
    }
    result.filter_type = FilterType::None as u8;
    Ok(result)
  }

  /// Apply one filter to an unfiltered row.
  ///
  /// `previous` is the *unfiltered* row above. Fails with
  /// [`Error::AlreadyFiltered`] if this row already carries a filter tag.
  pub fn filter(&self, filter: FilterType, previous: Option<&Self>) -> Result<Self> {
    if self.filter_type != FilterType::None as u8 {
      return Err(Error::AlreadyFiltered);
    }
    if let Some(previous) = previous {
      if previous.spans.len() != self.spans.len() {
        return Err(Error::ScanlineMismatch);
      }
    }
    if self.spans.is_empty() {
      return Err(Error::NoPixels);
    }
    if filter == FilterType::None {
      return Ok(self.clone());
    }
    let size = core::mem::size_of::<P>();
    let mut result = self.clone();
    let src: &[u8] = cast_slice(self.spans.as_slice());
    let dst: &mut [u8] = cast_slice_mut(result.spans.as_mut_slice());
    let prev_bytes: Option<&[u8]> = previous.map(|p| cast_slice(p.spans.as_slice()));
    for k in 0..dst.len() {
      let curr = src[k] as i32;
      let left = if k < size { 0 } else { src[k - size] as i32 };
      let up = prev_bytes.map_or(0, |p| p[k] as i32);
      let up_left = if k < size { 0 } else { prev_bytes.map_or(0, |p| p[k - size] as i32) };
      dst[k] = match filter {
        FilterType::None => curr,
        FilterType::Sub => curr - left,
        FilterType::Up => curr - up,
        FilterType::Average => curr - (left + up) / 2,
        FilterType::Paeth => curr - paeth_predict(left, up, up_left),
      } as u8;
    }
    result.filter_type = filter as u8;
    Ok(result)
  }

  /// Try all five filters and keep the one whose output bytes have the
  /// smallest absolute signed sum, ties going to the lower tag.
  pub fn filter_best(&self, previous: Option<&Self>) -> Result<Self> {
    let mut best: Option<(u64, Self)> = None;
    for filter in
      [FilterType::None, FilterType::Sub, FilterType::Up, FilterType::Average, FilterType::Paeth]
    {
      let candidate = self.filter(filter, previous)?;
      let sum: i64 =
        cast_slice::<P, u8>(candidate.spans.as_slice()).iter().map(|&byte| i64::from(byte as i8)).sum();
      let score = sum.unsigned_abs();
      if best.as_ref().map_or(true, |(best_score, _)| score < *best_score) {
        best = Some((score, candidate));
      }
    }
    Ok(best.expect("five candidates were scored").1)
  }
}

macro_rules! define_scanline {
  ($(($variant:ident, $span:ty)),+ $(,)?) => {
    /// One row of image data in any of the 15 pixel kinds.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Scanline {
      $($variant(ScanlineBase<$span>),)+
    }

    impl Scanline {
      /// A zeroed scanline of the given kind and width.
      #[must_use]
      pub fn new(kind: PixelKind, filter_type: u8, width: usize) -> Self {
        match kind {
          $(PixelKind::$variant => Self::$variant(ScanlineBase::new(filter_type, width)),)+
        }
      }

      /// Split a whole inflated image buffer into rows of the header's
      /// pixel kind.
      pub fn rows_from_raw(header: &Header, raw: &[u8]) -> Result<Vec<Self>> {
        Ok(match header.pixel_kind()? {
          $(PixelKind::$variant => ScanlineBase::<$span>::rows_from_raw(header, raw)?
            .into_iter()
            .map(Self::$variant)
            .collect(),)+
        })
      }

      #[inline]
      #[must_use]
      pub fn kind(&self) -> PixelKind {
        match self {
          $(Self::$variant(_) => PixelKind::$variant,)+
        }
      }

      #[inline]
      #[must_use]
      pub fn filter_type(&self) -> u8 {
        match self {
          $(Self::$variant(line) => line.filter_type(),)+
        }
      }

      #[inline]
      pub fn set_filter_type(&mut self, filter_type: u8) {
        match self {
          $(Self::$variant(line) => line.set_filter_type(filter_type),)+
        }
      }

      /// Number of spans in the row.
      #[inline]
      #[must_use]
      pub fn pixel_span(&self) -> usize {
        match self {
          $(Self::$variant(line) => line.pixel_span(),)+
        }
      }

      /// Logical pixel count, including trailing padding samples.
      #[inline]
      #[must_use]
      pub fn pixel_width(&self) -> usize {
        match self {
          $(Self::$variant(line) => line.pixel_width(),)+
        }
      }

      pub fn get_pixel(&self, index: usize) -> Result<Pixel> {
        match self {
          $(Self::$variant(line) => line.get_pixel(index),)+
        }
      }

      pub fn set_pixel(&mut self, pixel: Pixel, index: usize) -> Result<()> {
        match self {
          $(Self::$variant(line) => line.set_pixel(pixel, index),)+
        }
      }

      /// Emit the wire form: filter byte followed by the span bytes.
      #[must_use]
      pub fn to_raw(&self) -> Vec<u8> {
        match self {
          $(Self::$variant(line) => line.to_raw(),)+
        }
      }

      /// Undo this row's filter. `previous` must be the reconstructed row
      /// above, of the same kind and span count.
      pub fn reconstruct(&self, previous: Option<&Self>) -> Result<Self> {
        match (self, previous) {
          $(
            (Self::$variant(line), None) => Ok(Self::$variant(line.reconstruct(None)?)),
            (Self::$variant(line), Some(Self::$variant(prev))) => {
              Ok(Self::$variant(line.reconstruct(Some(prev))?))
            }
          )+
          _ => Err(Error::ScanlineMismatch),
        }
      }

      /// Apply one filter. `previous` must be the unfiltered row above.
      pub fn filter(&self, filter: FilterType, previous: Option<&Self>) -> Result<Self> {
        match (self, previous) {
          $(
            (Self::$variant(line), None) => Ok(Self::$variant(line.filter(filter, None)?)),
            (Self::$variant(line), Some(Self::$variant(prev))) => {
              Ok(Self::$variant(line.filter(filter, Some(prev))?))
            }
          )+
          _ => Err(Error::ScanlineMismatch),
        }
      }

      /// Apply the best-scoring filter per the minimum absolute signed sum
      /// heuristic.
      pub fn filter_best(&self, previous: Option<&Self>) -> Result<Self> {
        match (self, previous) {
          $(
            (Self::$variant(line), None) => Ok(Self::$variant(line.filter_best(None)?)),
            (Self::$variant(line), Some(Self::$variant(prev))) => {
              Ok(Self::$variant(line.filter_best(Some(prev))?))
            }
          )+
          _ => Err(Error::ScanlineMismatch),
        }
      }
    }
  };
}

define_scanline! {
  (Y1, Y1x8),
  (Y2, Y2x4),
  (Y4, Y4x2),
  (Y8, Y8),
  (Y16, Y16_BE),
  (RGB8, RGB8),
  (RGB16, RGB16_BE),
  (I1, Index1x8),
  (I2, Index2x4),
  (I4, Index4x2),
  (I8, Index8),
  (YA8, YA8),
  (YA16, YA16_BE),
  (RGBA8, RGBA8),
  (RGBA16, RGBA16_BE),
}
