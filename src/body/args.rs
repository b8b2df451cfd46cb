//! Argument tags and values for replay events.
//!
//! Every event carries a vector of `(type, count)` descriptors followed
//! by a flat argument payload. The type tag alone determines how many
//! bytes each argument occupies, so the payload can only be parsed
//! descriptor-driven — there is no other framing.
//!
//! Arguments decode into [`ArgValue`], a closed tagged variant whose
//! discriminant matches the on-wire type tag. This keeps every event
//! self-describing: consumers match on the variant instead of guessing
//! at erased types.

use serde::Serialize;

use crate::binary::BitReader;
use crate::error::{ParserError, Result};

/// Highest valid argument type tag.
pub const MAX_ARG_TYPE: u8 = 10;

/// Highest valid per-descriptor argument count.
pub const MAX_ARG_COUNT: u8 = 50;

/// On-wire argument type tags.
///
/// Tags 4, 5, 9, and 10 have unknown semantics; their payloads are
/// preserved verbatim. Several sizes are empirical (see the
/// variant docs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum ArgKind {
    /// u32 integer (4 bytes).
    Int = 0,
    /// IEEE-754 f32 (4 bytes).
    Float = 1,
    /// Single byte, nonzero = true.
    Bool = 2,
    /// u32 in-game object id (4 bytes).
    ObjectId = 3,
    /// Unknown, u32-sized (4 bytes).
    Unknown4 = 4,
    /// Unknown, zero-sized. Consumes nothing.
    Unknown5 = 5,
    /// World position, 3 × f32 (12 bytes). The 12-byte width is what
    /// keeps the parser aligned in observed replays, whatever the
    /// field actually means.
    Position = 6,
    /// Screen position, 2 × u32 (8 bytes).
    ScreenPosition = 7,
    /// Screen rectangle, 4 × u32 (16 bytes).
    ScreenRectangle = 8,
    /// Unknown, 16 raw bytes.
    Unknown9 = 9,
    /// Unknown, u16-sized (2 bytes). An older decoder read 4 bytes
    /// here; the 2-byte width follows the newer one.
    Unknown10 = 10,
}

impl ArgKind {
    /// Number of bytes one argument of this type occupies on the wire.
    #[must_use]
    pub fn wire_size(self) -> usize {
        match self {
            ArgKind::Bool => 1,
            ArgKind::Unknown10 => 2,
            ArgKind::Int | ArgKind::Float | ArgKind::ObjectId | ArgKind::Unknown4 => 4,
            ArgKind::Unknown5 => 0,
            ArgKind::ScreenPosition => 8,
            ArgKind::Position => 12,
            ArgKind::ScreenRectangle | ArgKind::Unknown9 => 16,
        }
    }
}

impl TryFrom<u8> for ArgKind {
    type Error = ParserError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(ArgKind::Int),
            1 => Ok(ArgKind::Float),
            2 => Ok(ArgKind::Bool),
            3 => Ok(ArgKind::ObjectId),
            4 => Ok(ArgKind::Unknown4),
            5 => Ok(ArgKind::Unknown5),
            6 => Ok(ArgKind::Position),
            7 => Ok(ArgKind::ScreenPosition),
            8 => Ok(ArgKind::ScreenRectangle),
            9 => Ok(ArgKind::Unknown9),
            10 => Ok(ArgKind::Unknown10),
            value => Err(ParserError::ArgTypeOutOfRange { value }),
        }
    }
}

/// A 2D screen coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScreenPos {
    /// Horizontal pixel coordinate.
    pub x: u32,
    /// Vertical pixel coordinate.
    pub y: u32,
}

/// One descriptor from an event's argument-metadata vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArgMetadata {
    /// Argument type for this run.
    pub kind: ArgKind,
    /// How many arguments of that type follow.
    pub count: u8,
}

/// A decoded event argument.
///
/// The variant always matches the descriptor's [`ArgKind`]; decode
/// failures produce the variant's zero value rather than changing the
/// shape of the event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ArgValue {
    /// Plain integer.
    Int(u32),
    /// Float.
    Float(f32),
    /// Boolean byte.
    Bool(bool),
    /// In-game object id.
    ObjectId(u32),
    /// Unknown u32-sized payload.
    Unknown4(u32),
    /// Unknown empty payload.
    Unknown5,
    /// World position.
    Position {
        /// East-west coordinate.
        x: f32,
        /// North-south coordinate.
        y: f32,
        /// Height.
        z: f32,
    },
    /// Screen position.
    ScreenPosition(ScreenPos),
    /// Screen rectangle as two corners.
    ScreenRectangle(ScreenPos, ScreenPos),
    /// Unknown 16-byte payload.
    Unknown9([u8; 16]),
    /// Unknown u16-sized payload, stored widened.
    Unknown10(u16),
}

impl ArgValue {
    /// The integer payload, for the `Int`/`ObjectId`/`Unknown4`
    /// variants that carry one.
    ///
    /// Detail attachment uses this: order codes reference store ids
    /// through their first (or second) integer argument.
    #[must_use]
    pub fn as_int(&self) -> Option<u32> {
        match self {
            ArgValue::Int(v) | ArgValue::ObjectId(v) | ArgValue::Unknown4(v) => Some(*v),
            _ => None,
        }
    }

    /// The [`ArgKind`] this value decodes from.
    #[must_use]
    pub fn kind(&self) -> ArgKind {
        match self {
            ArgValue::Int(_) => ArgKind::Int,
            ArgValue::Float(_) => ArgKind::Float,
            ArgValue::Bool(_) => ArgKind::Bool,
            ArgValue::ObjectId(_) => ArgKind::ObjectId,
            ArgValue::Unknown4(_) => ArgKind::Unknown4,
            ArgValue::Unknown5 => ArgKind::Unknown5,
            ArgValue::Position { .. } => ArgKind::Position,
            ArgValue::ScreenPosition(_) => ArgKind::ScreenPosition,
            ArgValue::ScreenRectangle(..) => ArgKind::ScreenRectangle,
            ArgValue::Unknown9(_) => ArgKind::Unknown9,
            ArgValue::Unknown10(_) => ArgKind::Unknown10,
        }
    }

    /// The zero value of a kind, used when an argument's bytes can't be
    /// read.
    #[must_use]
    pub fn zero_of(kind: ArgKind) -> Self {
        match kind {
            ArgKind::Int => ArgValue::Int(0),
            ArgKind::Float => ArgValue::Float(0.0),
            ArgKind::Bool => ArgValue::Bool(false),
            ArgKind::ObjectId => ArgValue::ObjectId(0),
            ArgKind::Unknown4 => ArgValue::Unknown4(0),
            ArgKind::Unknown5 => ArgValue::Unknown5,
            ArgKind::Position => ArgValue::Position {
                x: 0.0,
                y: 0.0,
                z: 0.0,
            },
            ArgKind::ScreenPosition => ArgValue::ScreenPosition(ScreenPos::default()),
            ArgKind::ScreenRectangle => {
                ArgValue::ScreenRectangle(ScreenPos::default(), ScreenPos::default())
            }
            ArgKind::Unknown9 => ArgValue::Unknown9([0u8; 16]),
            ArgKind::Unknown10 => ArgValue::Unknown10(0),
        }
    }
}

/// Reads one argument of the given kind, failing on exhaustion.
///
/// Streaming mode uses this directly: a record whose arguments run past
/// the flushed tail of the file must be discarded whole, not emitted
/// with blank slots.
///
/// # Errors
///
/// [`ParserError::ShortRead`] / [`ParserError::Io`] when the source
/// cannot supply the argument's full wire size.
pub fn read_arg<R: std::io::Read>(reader: &mut BitReader<R>, kind: ArgKind) -> Result<ArgValue> {
    match kind {
        ArgKind::Int => reader.read_u32().map(ArgValue::Int),
        ArgKind::Float => reader.read_f32().map(ArgValue::Float),
        ArgKind::Bool => reader.read_bool().map(ArgValue::Bool),
        ArgKind::ObjectId => reader.read_u32().map(ArgValue::ObjectId),
        ArgKind::Unknown4 => reader.read_u32().map(ArgValue::Unknown4),
        ArgKind::Unknown5 => Ok(ArgValue::Unknown5),
        ArgKind::Position => read_position(reader),
        ArgKind::ScreenPosition => read_screen_pos(reader).map(ArgValue::ScreenPosition),
        ArgKind::ScreenRectangle => read_screen_pos(reader)
            .and_then(|a| read_screen_pos(reader).map(|b| ArgValue::ScreenRectangle(a, b))),
        ArgKind::Unknown9 => reader.read_bytes(16).map(|bytes| {
            let mut raw = [0u8; 16];
            raw.copy_from_slice(&bytes);
            ArgValue::Unknown9(raw)
        }),
        ArgKind::Unknown10 => reader.read_u16().map(ArgValue::Unknown10),
    }
}

/// Decodes one argument of the given kind, blanking the slot on failure.
///
/// Read failures yield the kind's zero value — a short argument never
/// changes the shape of its event. This also means the reader may be
/// left mid-field on a short read; the batch loop doesn't care (the
/// stream is ending anyway), and streaming uses [`read_arg`] instead.
pub fn decode_arg<R: std::io::Read>(reader: &mut BitReader<R>, kind: ArgKind) -> ArgValue {
    read_arg(reader, kind).unwrap_or_else(|_| ArgValue::zero_of(kind))
}

fn read_position<R: std::io::Read>(reader: &mut BitReader<R>) -> Result<ArgValue> {
    let x = reader.read_f32()?;
    let y = reader.read_f32()?;
    let z = reader.read_f32()?;
    Ok(ArgValue::Position { x, y, z })
}

fn read_screen_pos<R: std::io::Read>(reader: &mut BitReader<R>) -> Result<ScreenPos> {
    let x = reader.read_u32()?;
    let y = reader.read_u32()?;
    Ok(ScreenPos { x, y })
}
