//! Error types for the Generals replay parser.
//!
//! This module defines the closed error taxonomy for all failure cases
//! during replay decoding: I/O errors, truncated fields, oversized read
//! requests, malformed argument descriptors, and data-store lookups that
//! fall outside their tables.
//!
//! Most errors here are *recoverable at the field level*: the header
//! decoder substitutes a typed zero and keeps going, and the body decoder
//! either emits a best-effort event or ends the stream cleanly. Only
//! store-construction failures ([`ParserError::MissingDataFile`],
//! [`ParserError::MalformedDataFile`]) are fatal to a decode call.

use std::path::PathBuf;

use thiserror::Error;

/// Maximum size in bytes for a single string or raw-byte read (1 MiB).
///
/// Replay files never carry fields anywhere near this large; the limit
/// exists so a corrupted length can't drive unbounded allocation.
pub const MAX_READ_LEN: usize = 1024 * 1024;

/// The main error type for replay parsing operations.
///
/// # Example
///
/// ```
/// use genrep_parser::error::{ParserError, Result};
///
/// fn example_operation() -> Result<()> {
///     Err(ParserError::short_read(4, 1))
/// }
/// ```
#[derive(Error, Debug)]
pub enum ParserError {
    /// An I/O error occurred while reading from the source.
    ///
    /// This wraps standard library I/O errors for seamless propagation
    /// with the `?` operator. For per-field reads it is treated like a
    /// short read: the field takes its typed zero.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source ended before the requested bytes could be read.
    ///
    /// Typically a truncated replay, or in streaming mode a record whose
    /// tail has not been flushed to disk yet.
    #[error("short read: wanted {wanted} bytes, got {got}")]
    ShortRead {
        /// Number of bytes requested.
        wanted: usize,
        /// Number of bytes actually available.
        got: usize,
    },

    /// The source ended inside a null-terminated string.
    ///
    /// Carries the prefix accumulated before the source ran dry so the
    /// caller can keep it. The header decoder does exactly that.
    #[error("source ended inside a null-terminated string after {} bytes", partial.len())]
    TruncatedString {
        /// The characters read before the source was exhausted.
        partial: String,
    },

    /// A read was requested with a size outside the allowed bounds.
    ///
    /// Raised when a caller asks for more than [`MAX_READ_LEN`] bytes in
    /// one primitive read.
    #[error("invalid read size: {size} (max: {max})")]
    InvalidSize {
        /// The requested size.
        size: usize,
        /// The maximum permitted size.
        max: usize,
    },

    /// A null-terminated string exceeded the safety limit before any
    /// terminator was found.
    #[error("string too long: {len} bytes read without terminator (max: {max})")]
    StringTooLong {
        /// Bytes consumed before giving up.
        len: usize,
        /// The maximum permitted length.
        max: usize,
    },

    /// A string encoding name was neither `utf8` nor `utf16le`.
    #[error("unsupported encoding: {name} (supported: utf8, utf16le)")]
    UnsupportedEncoding {
        /// The encoding name that failed to parse.
        name: String,
    },

    /// An event's argument descriptor declared a type outside `0..=10`.
    ///
    /// Treated as stream corruption: the decode loop ends.
    #[error("argument type {value} out of range (expected 0..=10)")]
    ArgTypeOutOfRange {
        /// The offending type tag.
        value: u8,
    },

    /// An event declared an argument count outside `0..=50`.
    ///
    /// Treated as stream corruption: the decode loop ends.
    #[error("argument count {value} out of range (expected 0..=50)")]
    ArgCountOutOfRange {
        /// The offending count.
        value: u8,
    },

    /// A data-store lookup id was below the store's wire offset.
    #[error("lookup id {id} below minimum {offset}")]
    LookupBelowMinimum {
        /// The on-wire id.
        id: u32,
        /// The store's fixed wire offset.
        offset: u32,
    },

    /// A data-store lookup id mapped past the end of the table.
    #[error("lookup id {id} out of range (offset {offset}, table length {len})")]
    LookupOutOfRange {
        /// The on-wire id.
        id: u32,
        /// The store's fixed wire offset.
        offset: u32,
        /// Number of entries in the table.
        len: usize,
    },

    /// A data-store constructor could not read its source file.
    ///
    /// Fatal: without the table, decoded events cannot be enriched.
    #[error("missing data file {}: {source}", path.display())]
    MissingDataFile {
        /// Path of the file or directory that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A data-store source file was readable but unparseable.
    #[error("malformed data file: {reason}")]
    MalformedDataFile {
        /// A description of what made the file unparseable.
        reason: String,
    },
}

impl ParserError {
    /// Creates a `ShortRead` error with the given sizes.
    #[must_use]
    pub fn short_read(wanted: usize, got: usize) -> Self {
        ParserError::ShortRead { wanted, got }
    }

    /// Creates an `InvalidSize` error against [`MAX_READ_LEN`].
    #[must_use]
    pub fn invalid_size(size: usize) -> Self {
        ParserError::InvalidSize {
            size,
            max: MAX_READ_LEN,
        }
    }

    /// Returns `true` if this error means the source simply ran out of
    /// bytes (as opposed to structural corruption).
    ///
    /// Field-level decoders use this to decide between substituting a
    /// typed zero and aborting.
    #[must_use]
    pub fn is_exhaustion(&self) -> bool {
        matches!(
            self,
            ParserError::ShortRead { .. } | ParserError::TruncatedString { .. } | ParserError::Io(_)
        )
    }
}

/// A specialized Result type for replay parsing operations.
pub type Result<T> = std::result::Result<T, ParserError>;
