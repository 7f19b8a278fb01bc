//! Shared encoding helpers.

pub mod compressed;
