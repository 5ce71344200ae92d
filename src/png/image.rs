//! The parsed PNG container.
//!
//! An [`Image`] holds an insertion-ordered chunk table, any bytes that
//! trailed the `IEND` chunk, and (once loaded) the decoded scanline
//! vector. Parsing never inflates image data; [`Image::load`] runs the
//! decompress + reconstruct pipeline, and [`Image::compress`] writes the
//! scanlines back into fresh `IDAT` chunks.

use std::path::Path;

use tracing::{debug, trace};

use super::chunk::{Chunk, ChunkTag, RawChunk};
use super::ihdr::Header;
use super::scanline::Scanline;
use super::text::{Text, ZText};
use super::SIGNATURE;
use crate::error::{Error, Result};
use crate::util;

/// Byte budget for each emitted `IDAT` chunk.
pub const DEFAULT_IDAT_CHUNK_SIZE: usize = 8192;

/// Serialisation order for recognised tags; everything else follows in
/// insertion order, then `IEND` closes the file.
const CHUNK_PRIORITY: [ChunkTag; 22] = [
  ChunkTag::IHDR,
  ChunkTag::gAMA,
  ChunkTag::PLTE,
  ChunkTag::IDAT,
  ChunkTag(*b"tRNS"),
  ChunkTag(*b"cHRM"),
  ChunkTag(*b"iCCP"),
  ChunkTag(*b"sBIT"),
  ChunkTag(*b"sRGB"),
  ChunkTag(*b"cICP"),
  ChunkTag::tEXt,
  ChunkTag::zTXt,
  ChunkTag(*b"iTXt"),
  ChunkTag(*b"bKGD"),
  ChunkTag(*b"hIST"),
  ChunkTag(*b"pHYs"),
  ChunkTag(*b"sPLT"),
  ChunkTag(*b"eXIf"),
  ChunkTag(*b"tIME"),
  ChunkTag(*b"acTL"),
  ChunkTag(*b"fcTL"),
  ChunkTag(*b"fdAT"),
];

/// A PNG image: chunk table, optional trailing data, optional decoded
/// scanlines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Image {
  chunks: Vec<(ChunkTag, Vec<Chunk>)>,
  trailing_data: Option<Vec<u8>>,
  image_data: Option<Vec<Scanline>>,
}

impl Image {
  /// An empty image with no chunks at all.
  #[inline]
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Parse a PNG byte stream.
  ///
  /// Chunks are consumed until the first `IEND`; anything after it is
  /// kept verbatim as trailing data. When `validate` is set, every
  /// chunk's CRC is checked and a mismatch fails the parse with
  /// [`Error::BadCrc`]. The scanline buffer is left empty.
  pub fn parse(bytes: &[u8], validate: bool) -> Result<Self> {
    if bytes.len() < SIGNATURE.len() {
      return Err(Error::InsufficientSize { given: bytes.len(), need: SIGNATURE.len() });
    }
    if bytes[..SIGNATURE.len()] != SIGNATURE {
      return Err(Error::BadSignature);
    }

    let mut image = Self::new();
    let mut offset = SIGNATURE.len();
    loop {
      let (raw, next) = RawChunk::parse(bytes, offset)?;
      offset = next;
      if validate && !raw.validate() {
        return Err(Error::BadCrc { given: raw.stored_crc(), expected: raw.computed_crc() });
      }
      trace!(tag = %raw.tag(), length = raw.data().len(), "parsed chunk");
      let tag = raw.tag();
      image.add_chunk(raw.to_chunk());
      if tag == ChunkTag::IEND {
        break;
      }
    }

    if offset < bytes.len() {
      image.trailing_data = Some(bytes[offset..].to_vec());
    }
    debug!(
      tags = image.chunks.len(),
      trailing = image.trailing_data.as_ref().map_or(0, Vec::len),
      "parsed image"
    );
    Ok(image)
  }

  /// Read and parse a PNG file.
  pub fn open(path: impl AsRef<Path>, validate: bool) -> Result<Self> {
    Self::parse(&util::read_file(path)?, validate)
  }

  fn find(&self, tag: ChunkTag) -> Option<&Vec<Chunk>> {
    self.chunks.iter().find(|(entry, _)| *entry == tag).map(|(_, list)| list)
  }

  fn entry_mut(&mut self, tag: ChunkTag) -> &mut Vec<Chunk> {
    if let Some(position) = self.chunks.iter().position(|(entry, _)| *entry == tag) {
      &mut self.chunks[position].1
    } else {
      self.chunks.push((tag, Vec::new()));
      &mut self.chunks.last_mut().unwrap().1
    }
  }

  #[inline]
  #[must_use]
  pub fn has_chunk(&self, tag: ChunkTag) -> bool {
    self.find(tag).is_some_and(|list| !list.is_empty())
  }

  /// All chunks under one tag, in insertion order.
  #[must_use]
  pub fn get_chunks(&self, tag: ChunkTag) -> &[Chunk] {
    self.find(tag).map_or(&[], Vec::as_slice)
  }

  /// Append a chunk to its tag's list.
  pub fn add_chunk(&mut self, chunk: Chunk) {
    self.entry_mut(chunk.tag()).push(chunk);
  }

  #[inline]
  #[must_use]
  pub fn has_header(&self) -> bool {
    self.has_chunk(ChunkTag::IHDR)
  }

  /// The parsed IHDR.
  pub fn header(&self) -> Result<Header> {
    let chunk = self.get_chunks(ChunkTag::IHDR).first().ok_or(Error::NoHeaderChunk)?;
    Header::from_chunk(chunk)
  }

  /// Replace the IHDR chunk (installing one if absent).
  pub fn set_header(&mut self, header: Header) {
    let list = self.entry_mut(ChunkTag::IHDR);
    list.clear();
    list.push(header.to_chunk());
  }

  /// Install a fresh zeroed header, replacing any existing one.
  pub fn new_header(&mut self) -> Header {
    let header = Header::default();
    self.set_header(header);
    header
  }

  pub fn width(&self) -> Result<u32> {
    Ok(self.header()?.width)
  }

  pub fn height(&self) -> Result<u32> {
    Ok(self.header()?.height)
  }

  /// Are any `IDAT` chunks present?
  #[inline]
  #[must_use]
  pub fn has_image_data(&self) -> bool {
    self.has_chunk(ChunkTag::IDAT)
  }

  /// Has the scanline buffer been populated?
  #[inline]
  #[must_use]
  pub fn is_loaded(&self) -> bool {
    self.image_data.is_some()
  }

  /// The decoded scanlines.
  pub fn scanlines(&self) -> Result<&[Scanline]> {
    self.image_data.as_deref().ok_or(Error::NoImageData)
  }

  pub fn scanlines_mut(&mut self) -> Result<&mut [Scanline]> {
    self.image_data.as_deref_mut().ok_or(Error::NoImageData)
  }

  pub fn scanline(&self, index: usize) -> Result<&Scanline> {
    let rows = self.scanlines()?;
    let limit = rows.len();
    rows.get(index).ok_or(Error::OutOfBounds { given: index, limit })
  }

  pub fn scanline_mut(&mut self, index: usize) -> Result<&mut Scanline> {
    let rows = self.scanlines_mut()?;
    let limit = rows.len();
    rows.get_mut(index).ok_or(Error::OutOfBounds { given: index, limit })
  }

  /// Replace the scanline buffer wholesale.
  pub fn set_scanlines(&mut self, rows: Vec<Scanline>) {
    self.image_data = Some(rows);
  }

  /// Decompress and reconstruct in one step.
  pub fn load(&mut self) -> Result<()> {
    self.decompress()?;
    self.reconstruct()
  }

  /// Concatenate the `IDAT` payloads, inflate them as one zlib stream,
  /// and split the result into typed scanlines. The scanlines keep their
  /// filter tags; call [`Image::reconstruct`] to undo the filters.
  pub fn decompress(&mut self) -> Result<()> {
    if !self.has_image_data() {
      return Err(Error::NoImageDataChunks);
    }
    let mut combined = Vec::new();
    for chunk in self.get_chunks(ChunkTag::IDAT) {
      combined.extend_from_slice(chunk.data());
    }
    let raw = util::decompress(&combined)?;
    debug!(compressed = combined.len(), raw = raw.len(), "inflated image data");
    let header = self.header()?;
    self.image_data = Some(Scanline::rows_from_raw(&header, &raw)?);
    Ok(())
  }

  /// Deflate the scanline buffer back into `IDAT` chunks no larger than
  /// `chunk_size` (`None` keeps a single chunk), replacing any existing
  /// ones.
  pub fn compress(&mut self, chunk_size: Option<usize>, level: u8) -> Result<()> {
    let rows = self.image_data.as_ref().ok_or(Error::NoImageData)?;
    let mut combined = Vec::new();
    for row in rows {
      combined.extend_from_slice(&row.to_raw());
    }
    let compressed = util::compress(&combined, level);
    debug!(raw = combined.len(), compressed = compressed.len(), "deflated image data");

    let mut idat_chunks = Vec::new();
    match chunk_size {
      None => idat_chunks.push(Chunk::new(ChunkTag::IDAT, compressed)),
      Some(chunk_size) => {
        for piece in compressed.chunks(chunk_size.max(1)) {
          idat_chunks.push(Chunk::new(ChunkTag::IDAT, piece.to_vec()));
        }
      }
    }
    *self.entry_mut(ChunkTag::IDAT) = idat_chunks;
    Ok(())
  }

  /// Undo every scanline's filter in place, top to bottom. Each row's
  /// predictor bytes come from the already-reconstructed row above it.
  pub fn reconstruct(&mut self) -> Result<()> {
    let rows = self.image_data.as_mut().ok_or(Error::NoImageData)?;
    for index in 0..rows.len() {
      let (above, rest) = rows.split_at_mut(index);
      let reconstructed = rest[0].reconstruct(above.last())?;
      rest[0] = reconstructed;
    }
    Ok(())
  }

  /// Filter every scanline, choosing each row's filter by the minimum
  /// absolute signed sum heuristic. Predictors use the unfiltered rows.
  pub fn filter(&mut self) -> Result<()> {
    let rows = self.image_data.as_ref().ok_or(Error::NoImageData)?;
    let mut filtered = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
      let previous = if index == 0 { None } else { Some(&rows[index - 1]) };
      filtered.push(row.filter_best(previous)?);
    }
    self.image_data = Some(filtered);
    Ok(())
  }

  /// Serialise to the wire form: signature, chunks in priority order,
  /// `IEND`, then any trailing data.
  #[must_use]
  pub fn to_bytes(&self) -> Vec<u8> {
    let mut order: Vec<ChunkTag> = CHUNK_PRIORITY.to_vec();
    for (tag, _) in &self.chunks {
      if *tag != ChunkTag::IEND && !order.contains(tag) {
        order.push(*tag);
      }
    }

    let mut out = SIGNATURE.to_vec();
    for tag in order {
      for chunk in self.get_chunks(tag) {
        out.extend_from_slice(&chunk.to_bytes());
      }
    }
    if self.has_chunk(ChunkTag::IEND) {
      for chunk in self.get_chunks(ChunkTag::IEND) {
        out.extend_from_slice(&chunk.to_bytes());
      }
    } else {
      out.extend_from_slice(&Chunk::new(ChunkTag::IEND, Vec::new()).to_bytes());
    }
    if let Some(trailing) = &self.trailing_data {
      out.extend_from_slice(trailing);
    }
    out
  }

  /// Serialise and write to a file.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    util::write_file(path, &self.to_bytes())
  }

  #[inline]
  #[must_use]
  pub fn has_trailing_data(&self) -> bool {
    self.trailing_data.is_some()
  }

  /// The bytes that followed the `IEND` chunk.
  pub fn trailing_data(&self) -> Result<&[u8]> {
    self.trailing_data.as_deref().ok_or(Error::NoTrailingData)
  }

  pub fn set_trailing_data(&mut self, data: Vec<u8>) {
    self.trailing_data = Some(data);
  }

  pub fn clear_trailing_data(&mut self) {
    self.trailing_data = None;
  }

  #[inline]
  #[must_use]
  pub fn has_text(&self) -> bool {
    self.has_chunk(ChunkTag::tEXt)
  }

  /// Append a new `tEXt` chunk.
  pub fn add_text(&mut self, keyword: &str, text: &str) -> Result<()> {
    let chunk = Text::new(keyword, text)?.into_chunk();
    self.add_chunk(chunk);
    Ok(())
  }

  /// Every `tEXt` chunk whose keyword matches, in insertion order.
  #[must_use]
  pub fn get_text(&self, keyword: &str) -> Vec<Text> {
    self
      .get_chunks(ChunkTag::tEXt)
      .iter()
      .map(|chunk| Text::from_chunk(chunk.clone()))
      .filter(|text| text.keyword().is_ok_and(|k| k == keyword))
      .collect()
  }

  /// Remove one `tEXt` chunk equal to `text`.
  pub fn remove_text(&mut self, text: &Text) -> Result<()> {
    let list = self.entry_mut(ChunkTag::tEXt);
    let position = list.iter().position(|chunk| chunk == text.chunk()).ok_or(Error::TextNotFound)?;
    list.remove(position);
    Ok(())
  }

  /// Remove the `tEXt` chunk with exactly this keyword and text.
  pub fn remove_text_with(&mut self, keyword: &str, text: &str) -> Result<()> {
    self.remove_text(&Text::new(keyword, text)?)
  }

  #[inline]
  #[must_use]
  pub fn has_ztext(&self) -> bool {
    self.has_chunk(ChunkTag::zTXt)
  }

  /// Append a new `zTXt` chunk.
  pub fn add_ztext(&mut self, keyword: &str, text: &str) -> Result<()> {
    let chunk = ZText::new(keyword, text)?.into_chunk();
    self.add_chunk(chunk);
    Ok(())
  }

  /// Every `zTXt` chunk whose keyword matches, in insertion order.
  #[must_use]
  pub fn get_ztext(&self, keyword: &str) -> Vec<ZText> {
    self
      .get_chunks(ChunkTag::zTXt)
      .iter()
      .map(|chunk| ZText::from_chunk(chunk.clone()))
      .filter(|ztext| ztext.keyword().is_ok_and(|k| k == keyword))
      .collect()
  }

  /// Remove one `zTXt` chunk equal to `ztext`.
  pub fn remove_ztext(&mut self, ztext: &ZText) -> Result<()> {
    let list = self.entry_mut(ChunkTag::zTXt);
    let position =
      list.iter().position(|chunk| chunk == ztext.chunk()).ok_or(Error::TextNotFound)?;
    list.remove(position);
    Ok(())
  }
}
