use std::path::PathBuf;

/// Any failure the crate can produce.
///
/// Every fallible operation returns exactly one of these; nothing is
/// recovered internally. The CLI maps each variant to a status line and a
/// subcommand-specific exit code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
  /// The first eight bytes were not the PNG signature.
  #[error("bad PNG signature")]
  BadSignature,

  /// A chunk frame ran past the end of the input, or its declared length
  /// exceeded 2^31-1.
  #[error("truncated chunk data")]
  Truncated,

  /// The stored chunk CRC did not match the CRC computed over the tag and
  /// payload. Only raised when validation was requested.
  #[error("bad CRC: stored {given:#010X}, computed {expected:#010X}")]
  BadCrc {
    given: u32,
    expected: u32,
  },

  /// A chunk tag was not exactly four bytes.
  #[error("invalid chunk tag: tags are exactly four bytes")]
  InvalidChunkTag,

  /// The IHDR colour type was not one of 0, 2, 3, 4, 6.
  #[error("invalid color type {0}")]
  InvalidColorType(u8),

  /// The IHDR bit depth was not legal for its colour type.
  #[error("invalid bit depth {0}")]
  InvalidBitDepth(u8),

  /// A scanline filter tag was outside 0..=4.
  #[error("invalid filter type {0}")]
  InvalidFilterType(u8),

  /// No IHDR chunk is present.
  #[error("no header chunk in the image")]
  NoHeaderChunk,

  /// The scanline buffer has not been populated (call `load` first).
  #[error("no image data: scanlines are not loaded")]
  NoImageData,

  /// There are no IDAT chunks to decompress.
  #[error("no image data chunks")]
  NoImageDataChunks,

  /// A filter pass was requested on a scanline that already carries a
  /// non-zero filter tag.
  #[error("scanline is already filtered")]
  AlreadyFiltered,

  /// An index was past its container's limit.
  #[error("out of bounds: index {given}, limit {limit}")]
  OutOfBounds {
    given: usize,
    limit: usize,
  },

  /// A buffer was smaller than an operation required.
  #[error("insufficient size: got {given} bytes, need {need}")]
  InsufficientSize {
    given: usize,
    need: usize,
  },

  /// A sample value did not fit its bit width.
  #[error("integer overflow: {given} exceeds the maximum of {max}")]
  IntegerOverflow {
    given: usize,
    max: usize,
  },

  /// Two scanlines that must agree (current and previous) differ in span
  /// count or pixel kind.
  #[error("scanline mismatch between current and previous rows")]
  ScanlineMismatch,

  /// The inflated image data does not match the dimensions the header
  /// declares.
  #[error("pixel data does not match the header's dimensions")]
  PixelMismatch,

  /// A pixel value's kind does not match the span it was written to.
  #[error("pixel kind mismatch")]
  PixelKindMismatch,

  /// A scanline operation was attempted on an empty row.
  #[error("scanline has no pixels")]
  NoPixels,

  /// A text chunk has no keyword (no NUL separator, or an empty keyword).
  #[error("text chunk has no keyword")]
  NoKeyword,

  /// A text keyword was longer than 79 bytes.
  #[error("keyword is longer than 79 bytes")]
  KeywordTooLong,

  /// A text chunk slated for removal is not present in the image.
  #[error("text chunk not found")]
  TextNotFound,

  /// Base64 decoding hit a byte outside the alphabet.
  #[error("invalid base64 character {0:?}")]
  InvalidBase64Character(char),

  /// A text payload was not valid base64.
  #[error("invalid base64 string")]
  InvalidBase64String,

  /// A zTXt chunk declared a compression method other than 0.
  #[error("invalid compression method {0}")]
  InvalidCompressionMethod(u8),

  /// The stego carrier only operates on 8-bit truecolour pixels.
  #[error("unsupported pixel kind for the stego carrier")]
  UnsupportedPixelKind,

  /// The framed stego payload does not fit the image's nibble capacity.
  #[error("image too small: capacity is {have} bytes, payload needs {need}")]
  ImageTooSmall {
    have: usize,
    need: usize,
  },

  /// A stego bit offset was not a multiple of four.
  #[error("bit offset {0} is not nibble-aligned")]
  InvalidBitOffset(usize),

  /// No stego frame is present in the pixel data.
  #[error("no stego payload present")]
  NoStegoData,

  /// The image carries no bytes after its IEND chunk.
  #[error("no trailing data present")]
  NoTrailingData,

  /// The icon directory header was malformed (reserved != 0 or type != 1).
  #[error("invalid icon header")]
  InvalidIconHeader,

  /// An icon save was attempted with no entries.
  #[error("icon has no entries")]
  NoIconData,

  /// No entry in the icon directory starts with the PNG signature.
  #[error("icon has no PNG entry")]
  NoPngEntry,

  /// The inflate side of the codec reported a failure.
  #[error("zlib error {0}")]
  ZlibError(i32),

  /// A file could not be opened, read, or written.
  #[error("failed to open {}", .0.display())]
  OpenFileFailure(PathBuf),
}

pub type Result<T> = core::result::Result<T, Error>;
