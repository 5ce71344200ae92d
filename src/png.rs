//! The PNG engine: chunk framing with CRC validation, the typed pixel and
//! scanline model, the filter stage, and the parsed image container.

/// The eight magic bytes that open every PNG stream.
pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

mod chunk;
mod ihdr;
mod image;
mod pixel;
mod scanline;
mod text;

pub use self::{chunk::*, ihdr::*, image::*, pixel::*, scanline::*, text::*};
