use thiserror::Error;

use crate::debuginfo::token::Token;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Errors fall into two groups. Decoding errors ([`Error::Malformed`], [`Error::OutOfBounds`])
/// are raised when a blob handed to one of the parsers does not follow its wire format.
/// Emission errors are raised while debug information is being produced from a routine body;
/// the routine-level ones ([`Error::MalformedSequence`], [`Error::OverlappingScope`],
/// [`Error::UnresolvedCapture`]) point at a bug in the lowering that fed the emitter, while
/// [`Error::EmitFailure`] aborts the whole debug stream.
///
/// Over-long names are never reported through this type. They are dropped from the output
/// and recorded as warnings in [`crate::Diagnostics`].
///
/// # Examples
///
/// ```rust
/// use symscope::{Error, debuginfo::sequencepoints::parse_sequence_points};
///
/// match parse_sequence_points(&[0x80]) {
///     Ok(points) => println!("{} points", points.len()),
///     Err(Error::OutOfBounds) => println!("truncated blob"),
///     Err(Error::Malformed { message, .. }) => println!("malformed: {message}"),
///     Err(e) => println!("other: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    // Decoding errors
    /// The blob is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while reading a blob.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// A value does not fit into the encoding it was meant for.
    ///
    /// Compressed unsigned integers hold at most `0x1FFF_FFFF`, compressed signed integers
    /// the range `-0x1000_0000..=0x0FFF_FFFF`.
    #[error("Value {0} can not be represented in a compressed integer")]
    ValueOutOfRange(i64),

    // Emission errors
    /// Sequence marks arrived out of IL order, or a visible span ends before it starts.
    ///
    /// Fatal for the routine being emitted.
    #[error("Malformed sequence in {token}: {message}")]
    MalformedSequence {
        /// Routine whose sequence points were rejected
        token: Token,
        /// What exactly was wrong
        message: String,
    },

    /// Scope intervals overlap without nesting, a child escapes its parent, or block
    /// events are unbalanced.
    ///
    /// Fatal for the routine being emitted.
    #[error("Overlapping scope in {token}: {message}")]
    OverlappingScope {
        /// Routine whose scope tree was rejected
        token: Token,
        /// What exactly was wrong
        message: String,
    },

    /// A lambda or closure refers to a closure index that was never registered.
    ///
    /// Fatal for the routine being emitted.
    #[error("Unresolved capture in {token}: closure #{closure} is not defined")]
    UnresolvedCapture {
        /// Routine whose lambda map was rejected
        token: Token,
        /// The dangling closure index
        closure: u32,
    },

    /// A routine was registered with a method ordinal its declaring type already handed out.
    #[error("Method ordinal {ordinal} of {declaring_type} is already in use")]
    DuplicateOrdinal {
        /// Type whose ordinals collided
        declaring_type: String,
        /// The ordinal requested twice
        ordinal: u32,
    },

    /// The debug stream as a whole could not be produced.
    ///
    /// Raised when a content provider for source link or embedded sources fails. Nothing
    /// is published when this error is returned.
    #[error("Debug information could not be emitted: {0}")]
    EmitFailure(String),

    /// Failed to lock target
    #[error("Failed to lock target")]
    LockError,

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
