use veneer::png::{
  ChunkTag, ColorType, Header, Image, Index8, Pixel, PixelKind, RawChunk, Scanline, RGB16_BE,
  RGB8, RGBA16_BE, RGBA8, SIGNATURE, Y16_BE, Y8, YA16_BE, YA8,
};
use veneer::util::DEFAULT_COMPRESSION_LEVEL;
use veneer::Error;

const ALL_KINDS: [PixelKind; 15] = [
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
];

/// A small deterministic pixel value legal for the given kind.
fn sample_pixel(kind: PixelKind, x: usize, y: usize) -> Pixel {
  let v = x + 3 * y;
  match kind {
    PixelKind::Y1 => Pixel::Y1((v % 2) as u8),
    PixelKind::Y2 => Pixel::Y2((v % 4) as u8),
    PixelKind::Y4 => Pixel::Y4((v % 16) as u8),
    PixelKind::Y8 => Pixel::Y8(Y8 { y: v as u8 }),
    PixelKind::Y16 => Pixel::Y16(Y16_BE::new((v * 257) as u16)),
    PixelKind::RGB8 => Pixel::RGB8(RGB8 { r: v as u8, g: (v * 2) as u8, b: (v * 3) as u8 }),
    PixelKind::RGB16 => {
      Pixel::RGB16(RGB16_BE::new((v * 100) as u16, (v * 200) as u16, (v * 300) as u16))
    }
    PixelKind::I1 => Pixel::I1((v % 2) as u8),
    PixelKind::I2 => Pixel::I2((v % 4) as u8),
    PixelKind::I4 => Pixel::I4((v % 16) as u8),
    PixelKind::I8 => Pixel::I8(Index8 { i: v as u8 }),
    PixelKind::YA8 => Pixel::YA8(YA8 { y: v as u8, a: (200 - v) as u8 }),
    PixelKind::YA16 => Pixel::YA16(YA16_BE::new((v * 31) as u16, (v * 63) as u16)),
    PixelKind::RGBA8 => {
      Pixel::RGBA8(RGBA8 { r: v as u8, g: (v * 5) as u8, b: (v * 9) as u8, a: 255 })
    }
    PixelKind::RGBA16 => Pixel::RGBA16(RGBA16_BE::new(
      (v * 11) as u16,
      (v * 22) as u16,
      (v * 33) as u16,
      u16::MAX,
    )),
  }
}

/// An image of the given kind filled with [`sample_pixel`] values, still
/// unfiltered and uncompressed.
fn loaded_image(kind: PixelKind, width: u32, height: u32) -> Image {
  let mut image = Image::new();
  image.set_header(Header::new(width, height, kind.bit_depth(), kind.color_type()));
  let mut rows = Vec::new();
  for y in 0..height as usize {
    let mut row = Scanline::new(kind, 0, width as usize);
    for x in 0..width as usize {
      row.set_pixel(sample_pixel(kind, x, y), x).unwrap();
    }
    rows.push(row);
  }
  image.set_scanlines(rows);
  image
}

#[test]
fn test_parse_load_round_trip() {
  // a 256x256 8-bit RGBA image, from file bytes all the way down to raw
  // pixels and back
  let (bytes, expected_raw) = super::rgba_test_png(256, 256);

  let mut image = Image::parse(&bytes, true).unwrap();
  let header = image.header().unwrap();
  assert_eq!(header.width, 256);
  assert_eq!(header.height, 256);
  assert_eq!(header.bit_depth, 8);
  assert_eq!(header.color_type, 6);
  assert_eq!(header.compression_method, 0);
  assert_eq!(header.filter_method, 0);
  assert_eq!(header.interlace_method, 0);

  assert!(!image.is_loaded());
  assert_eq!(image.scanlines().unwrap_err(), Error::NoImageData);
  image.decompress().unwrap();
  assert!(image.is_loaded());
  image.reconstruct().unwrap();
  assert_eq!(super::loaded_raw_bytes(&image), expected_raw);

  // filter, compress, serialise, and do it all again
  image.filter().unwrap();
  image.compress(Some(8192), DEFAULT_COMPRESSION_LEVEL).unwrap();
  let saved = image.to_bytes();
  let mut reloaded = Image::parse(&saved, true).unwrap();
  reloaded.load().unwrap();
  assert_eq!(super::loaded_raw_bytes(&reloaded), expected_raw);
}

#[test]
fn test_pixel_round_trip_every_kind() {
  // 9x5 exercises sub-byte span padding for the 1/2/4-bit kinds
  for kind in ALL_KINDS {
    let image = loaded_image(kind, 9, 5);
    let expected = super::loaded_raw_bytes(&image);

    let mut packed = image.clone();
    packed.filter().unwrap();
    packed.compress(Some(512), DEFAULT_COMPRESSION_LEVEL).unwrap();
    let bytes = packed.to_bytes();

    let mut reloaded = Image::parse(&bytes, true).unwrap();
    reloaded.load().unwrap();
    assert_eq!(reloaded.header().unwrap().pixel_kind().unwrap(), kind);
    assert_eq!(super::loaded_raw_bytes(&reloaded), expected, "kind {kind:?} did not survive");
  }
}

#[test]
fn test_get_and_set_pixels_after_load() {
  let (bytes, _) = super::rgba_test_png(16, 16);
  let mut image = Image::parse(&bytes, true).unwrap();
  image.load().unwrap();

  let expected = super::pattern_pixel(3, 7);
  assert_eq!(image.scanline(7).unwrap().get_pixel(3).unwrap(), Pixel::RGBA8(expected));

  let replacement = RGBA8 { r: 1, g: 2, b: 3, a: 4 };
  image.scanline_mut(7).unwrap().set_pixel(Pixel::RGBA8(replacement), 3).unwrap();
  assert_eq!(image.scanline(7).unwrap().get_pixel(3).unwrap(), Pixel::RGBA8(replacement));
}

#[test]
fn test_serialised_chunk_order() {
  let (bytes, _) = super::rgba_test_png(8, 8);
  let mut image = Image::parse(&bytes, true).unwrap();
  image.add_text("zzz", "later").unwrap();
  image.add_chunk(veneer::png::Chunk::new(ChunkTag(*b"prVt"), b"custom".to_vec()));
  let bytes = image.to_bytes();

  assert_eq!(&bytes[..8], &SIGNATURE);
  let mut tags = Vec::new();
  let mut offset = 8;
  while offset < bytes.len() {
    let (raw, next) = RawChunk::parse(&bytes, offset).unwrap();
    assert!(raw.validate());
    tags.push(raw.tag());
    offset = next;
    if raw.tag() == ChunkTag::IEND {
      break;
    }
  }
  assert_eq!(tags.first(), Some(&ChunkTag::IHDR));
  assert_eq!(tags.last(), Some(&ChunkTag::IEND));
  let idat = tags.iter().position(|&t| t == ChunkTag::IDAT).unwrap();
  let text = tags.iter().position(|&t| t == ChunkTag::tEXt).unwrap();
  let private = tags.iter().position(|&t| t == ChunkTag(*b"prVt")).unwrap();
  assert!(idat < text, "IDAT comes before ancillary text");
  assert!(text < private, "unrecognised tags come after the priority list");

  // chunk-wise byte equivalence on a second parse
  let reparsed = Image::parse(&bytes, true).unwrap();
  assert_eq!(reparsed.to_bytes(), bytes);
}

#[test]
fn test_multiple_idat_chunks_decode_as_one_stream() {
  let (bytes, expected_raw) = super::rgba_test_png(32, 32);
  let mut image = Image::parse(&bytes, true).unwrap();
  image.load().unwrap();
  // squeeze the same pixels into many tiny IDAT chunks
  image.filter().unwrap();
  image.compress(Some(16), DEFAULT_COMPRESSION_LEVEL).unwrap();
  assert!(image.get_chunks(ChunkTag::IDAT).len() > 1);

  let mut reloaded = Image::parse(&image.to_bytes(), true).unwrap();
  reloaded.load().unwrap();
  assert_eq!(super::loaded_raw_bytes(&reloaded), expected_raw);
}

#[test]
fn test_trailing_data_round_trip() {
  let (bytes, _) = super::rgba_test_png(8, 8);
  let mut image = Image::parse(&bytes, true).unwrap();
  assert!(!image.has_trailing_data());
  image.set_trailing_data(super::rand_bytes(300));
  let expected = image.trailing_data().unwrap().to_vec();

  let reparsed = Image::parse(&image.to_bytes(), true).unwrap();
  assert_eq!(reparsed.trailing_data().unwrap(), expected);

  let mut cleared = reparsed.clone();
  cleared.clear_trailing_data();
  let reparsed = Image::parse(&cleared.to_bytes(), true).unwrap();
  assert!(!reparsed.has_trailing_data());
}

#[test]
fn test_text_keyword_filter() {
  let (bytes, _) = super::rgba_test_png(8, 8);
  let mut image = Image::parse(&bytes, true).unwrap();
  let keywords = ["alpha", "beta", "gamma", "delta"];
  for (index, keyword) in keywords.iter().enumerate() {
    image.add_text(keyword, &format!("text number {index}")).unwrap();
  }
  let reparsed = Image::parse(&image.to_bytes(), true).unwrap();
  for (index, keyword) in keywords.iter().enumerate() {
    let matches = reparsed.get_text(keyword);
    assert_eq!(matches.len(), 1, "keyword {keyword} should match exactly once");
    assert_eq!(matches[0].text(), format!("text number {index}"));
  }
  assert!(reparsed.get_text("missing").is_empty());
}

#[test]
fn test_text_removal() {
  let (bytes, _) = super::rgba_test_png(8, 8);
  let mut image = Image::parse(&bytes, true).unwrap();
  image.add_text("note", "first").unwrap();
  image.add_text("note", "second").unwrap();

  image.remove_text_with("note", "first").unwrap();
  let remaining = image.get_text("note");
  assert_eq!(remaining.len(), 1);
  assert_eq!(remaining[0].text(), "second");
  assert_eq!(
    image.remove_text_with("note", "first").unwrap_err(),
    Error::TextNotFound
  );
}

#[test]
fn test_ztext_round_trip_through_file() {
  let (bytes, _) = super::rgba_test_png(8, 8);
  let mut image = Image::parse(&bytes, true).unwrap();
  let long_text = "a phrase that deflate can shrink ".repeat(40);
  image.add_ztext("packed", &long_text).unwrap();

  let reparsed = Image::parse(&image.to_bytes(), true).unwrap();
  assert!(reparsed.has_ztext());
  let found = reparsed.get_ztext("packed");
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].text().unwrap(), long_text);
  // the chunk on the wire really is smaller than the text it carries
  assert!(found[0].chunk().length() < long_text.len());
}

#[test]
fn test_load_fails_cleanly_on_truncated_stream() {
  let (bytes, _) = super::rgba_test_png(16, 16);
  let image = Image::parse(&bytes, true).unwrap();
  // lop the tail off the final IDAT chunk's payload
  let idat = image.get_chunks(ChunkTag::IDAT).last().unwrap();
  let mut shortened = idat.data().to_vec();
  shortened.truncate(shortened.len() / 2);
  let mut broken = Image::new();
  broken.set_header(image.header().unwrap());
  broken.add_chunk(veneer::png::Chunk::new(ChunkTag::IDAT, shortened));
  assert!(matches!(broken.load(), Err(Error::ZlibError(_)) | Err(Error::PixelMismatch)));
}

#[test]
fn test_interlaced_header_round_trips() {
  let mut header = Header::new(4, 4, 8, ColorType::TrueColor);
  header.interlace_method = 1;
  let mut image = Image::new();
  image.set_header(header);
  // the header itself survives a round trip untouched
  let reparsed = Image::parse(&image.to_bytes(), true).unwrap();
  assert_eq!(reparsed.header().unwrap().interlace_method, 1);
}
