#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]

//! A library for embedding and recovering arbitrary byte payloads inside
//! PNG images, and inside Windows icon files whose first entry is a PNG.
//!
//! Four carrier techniques are supported:
//!
//! * trailing bytes appended after the `IEND` chunk;
//! * base64 payloads in uncompressed `tEXt` chunks;
//! * base64 payloads in deflate-compressed `zTXt` chunks;
//! * a nibble-granular steganographic carrier written into the low bits
//!   of the red, green, and blue channels of the pixels themselves.
//!
//! The [`png`] module is a self-contained PNG engine (chunk framing,
//! typed pixels, the filter stage, zlib pack/unpack) that the carriers
//! ride on. Start with [`PngPayload`] for PNG files and [`IcoPayload`]
//! for icons:
//!
//! ```no_run
//! use veneer::PngPayload;
//!
//! # fn main() -> veneer::Result<()> {
//! let mut payload = PngPayload::open("innocent.png", true)?;
//! payload.add_text_payload("COMMENT", b"not actually a comment")?;
//! payload.save("suspicious.png")?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod ico;
pub mod payload;
pub mod png;
pub mod util;

pub use error::{Error, Result};
pub use ico::{Icon, IcoPayload};
pub use payload::PngPayload;
