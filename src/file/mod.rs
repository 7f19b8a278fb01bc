//! Byte-level reading primitives shared by all blob decoders.
//!
//! [`parser::Parser`] is the cursor every decoder walks a blob with; [`io`] holds the
//! little-endian primitive conversions it and the encoders build on.

pub mod io;
pub mod parser;
