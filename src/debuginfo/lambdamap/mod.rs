//! Closure and lambda maps.
//!
//! When lowering turns lambdas and local functions into methods, captured variables move
//! into synthesized closure classes. The lambda map records, per routine, which closures
//! were created and which lambdas were generated, both keyed by the syntax offset they
//! originate from. Edit-and-Continue uses this map to match lambdas of a new compilation
//! with the ones already running.
//!
//! # Key Components
//!
//! - [`types::LambdaMap`] - Ordered closure and lambda records of one routine
//! - [`types::LambdaClosure`] - Static, this-only, or captured through a closure index
//! - [`builder::LambdaMapBuilder`] - Registration in discovery order with late resolution
//! - [`encoder::encode_lambda_map`] / [`parser::parse_lambda_map`] - Blob codec
//!
//! # Blob Format
//!
//! ```text
//! MethodOrdinal + 1 (uint)
//! -Baseline (uint)        baseline = min(-1, every syntax offset in the map)
//! ClosureCount (uint)
//! per closure:  SyntaxOffset - Baseline (uint), Parent + 1 (uint, 0 = none)
//! per lambda:   SyntaxOffset - Baseline (uint), ClosureOrdinal + 2 (uint)
//! ```
//!
//! Closure ordinals are -2 for a this-only lambda, -1 for a static one, and the closure
//! index otherwise. Lambda records continue to the end of the blob.

pub mod builder;
pub mod encoder;
pub mod parser;
pub mod types;

pub use builder::LambdaMapBuilder;
pub use encoder::encode_lambda_map;
pub use parser::parse_lambda_map;
pub use types::{ClosureInfo, LambdaClosure, LambdaInfo, LambdaMap};
