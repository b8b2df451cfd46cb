//! Header parsing for Generals replay files.
//!
//! The header is a fixed sequence of little-endian primitives and
//! null-terminated strings, read strictly in order — there are no
//! offsets or framing, so each field begins where the previous one
//! ended.
//!
//! # Header Layout
//!
//! | Size | Type | Field |
//! |------|------|-------|
//! | 6 | ASCII | `game_type` ("GENREP") |
//! | 4 | u32 LE | `timestamp_begin` (epoch seconds) |
//! | 4 | u32 LE | `timestamp_end` (epoch seconds) |
//! | 2 | u16 LE | `num_timestamps` |
//! | 12 | bytes | `filler` |
//! | var | UTF-16LE cstr | `file_name` |
//! | 16 | 8 × u16 LE | wall clock (year..millisecond) |
//! | var | UTF-16LE cstr | `version` |
//! | var | UTF-16LE cstr | `build_date` |
//! | 2 | u16 LE | `version_minor` |
//! | 2 | u16 LE | `version_major` |
//! | 8 | bytes | `hash` |
//! | var | UTF-8 cstr | metadata KV string |
//! | 2 | bytes | `replay_owner_slot` |
//! | 4 | bytes | `unknown1` |
//! | 4 | bytes | `unknown2` |
//! | 4 | bytes | `unknown3` |
//! | 4 | u32 LE | `game_speed` |
//!
//! # Error recovery
//!
//! Every field read is fallible-with-fallback: a failed read logs the
//! field name and substitutes the typed zero, and decoding continues at
//! the current source position. A truncated replay therefore yields a
//! header that is correct up to the truncation point and zeroed after
//! it, never an error.

pub mod metadata;

use std::fmt;

use log::warn;
use serde::Serialize;

use crate::binary::{BitReader, Encoding};
use crate::error::ParserError;

pub use metadata::{Metadata, RosterPlayer, OBSERVER_FACTION};

/// Sanity range for the wall-clock year; values outside are logged but
/// accepted.
const PLAUSIBLE_YEARS: std::ops::RangeInclusive<u16> = 1990..=2030;

/// The wall-clock timestamp embedded in the header, field for field as
/// the game writes it (a Windows `SYSTEMTIME`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WallClock {
    /// Calendar year, e.g. 2022.
    pub year: u16,
    /// Month, 1-12.
    pub month: u16,
    /// Day of week, 0 = Sunday.
    pub day_of_week: u16,
    /// Day of month, 1-31.
    pub day: u16,
    /// Hour, 0-23.
    pub hour: u16,
    /// Minute, 0-59.
    pub minute: u16,
    /// Second, 0-59.
    pub second: u16,
    /// Millisecond, 0-999.
    pub millisecond: u16,
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Parsed replay header.
///
/// # Example
///
/// ```no_run
/// use std::fs::File;
/// use std::io::BufReader;
/// use genrep_parser::binary::BitReader;
/// use genrep_parser::header::ReplayHeader;
///
/// let file = File::open("match.rep").unwrap();
/// let mut reader = BitReader::new(BufReader::new(file));
/// let header = ReplayHeader::parse(&mut reader);
/// println!("Map: {}", header.metadata.map_file);
/// println!("Players: {}", header.metadata.players.len());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplayHeader {
    /// Six-byte format tag, "GENREP" for valid replays.
    pub game_type: String,

    /// Match start, seconds since the Unix epoch.
    pub timestamp_begin: u32,

    /// Match end, seconds since the Unix epoch. Zero while the game is
    /// still writing the file.
    pub timestamp_end: u32,

    /// Number of timestamp records the engine claims to have written.
    pub num_timestamps: u16,

    /// Twelve opaque bytes between the timestamps and the file name.
    #[serde(serialize_with = "serialize_hex")]
    pub filler: [u8; 12],

    /// Replay file name as saved by the game (UTF-16LE on the wire).
    pub file_name: String,

    /// Wall-clock time the replay was saved.
    pub wall_clock: WallClock,

    /// Game version string, e.g. "Version 1.04".
    pub version: String,

    /// Engine build date string.
    pub build_date: String,

    /// Minor version number.
    pub version_minor: u16,

    /// Major version number.
    pub version_major: u16,

    /// Eight-byte content hash. Algorithm unknown; not validated.
    #[serde(serialize_with = "serialize_hex")]
    pub hash: [u8; 8],

    /// Parsed match settings and player roster from the embedded
    /// KV string.
    pub metadata: Metadata,

    /// Slot of the player who saved the replay: `30 00` = slot 0,
    /// `31 00` = slot 1, and so on.
    #[serde(serialize_with = "serialize_hex")]
    pub replay_owner_slot: [u8; 2],

    /// Opaque field after the owner slot.
    #[serde(serialize_with = "serialize_hex")]
    pub unknown1: [u8; 4],

    /// Opaque field; observed to change in solo or vs-computer games.
    #[serde(serialize_with = "serialize_hex")]
    pub unknown2: [u8; 4],

    /// Opaque field before the game speed.
    #[serde(serialize_with = "serialize_hex")]
    pub unknown3: [u8; 4],

    /// Configured game speed (frames per second target).
    pub game_speed: u32,
}

impl ReplayHeader {
    /// Reads a header from the current position of `reader`.
    ///
    /// Never fails: each unreadable field is logged and zeroed, and the
    /// caller gets whatever prefix of the header was decodable. Callers
    /// that need to distinguish a real header from a zeroed one can
    /// check [`ReplayHeader::is_valid`].
    pub fn parse<R: std::io::Read>(reader: &mut BitReader<R>) -> Self {
        let game_type = fallback(reader.read_string(6), "game_type");
        let timestamp_begin = fallback(reader.read_u32(), "timestamp_begin");
        let timestamp_end = fallback(reader.read_u32(), "timestamp_end");
        let num_timestamps = fallback(reader.read_u16(), "num_timestamps");
        let filler = read_array::<_, 12>(reader, "filler");
        let file_name = read_text(reader, Encoding::Utf16Le, "file_name");

        let wall_clock = WallClock {
            year: fallback(reader.read_u16(), "year"),
            month: fallback(reader.read_u16(), "month"),
            day_of_week: fallback(reader.read_u16(), "day_of_week"),
            day: fallback(reader.read_u16(), "day"),
            hour: fallback(reader.read_u16(), "hour"),
            minute: fallback(reader.read_u16(), "minute"),
            second: fallback(reader.read_u16(), "second"),
            millisecond: fallback(reader.read_u16(), "millisecond"),
        };
        if !PLAUSIBLE_YEARS.contains(&wall_clock.year) {
            warn!("implausible replay year {}", wall_clock.year);
        }

        let version = read_text(reader, Encoding::Utf16Le, "version");
        let build_date = read_text(reader, Encoding::Utf16Le, "build_date");
        let version_minor = fallback(reader.read_u16(), "version_minor");
        let version_major = fallback(reader.read_u16(), "version_major");
        let hash = read_array::<_, 8>(reader, "hash");

        let metadata_raw = read_text(reader, Encoding::Utf8, "metadata");
        let metadata = metadata::parse_metadata(&metadata_raw);

        let replay_owner_slot = read_array::<_, 2>(reader, "replay_owner_slot");
        let unknown1 = read_array::<_, 4>(reader, "unknown1");
        let unknown2 = read_array::<_, 4>(reader, "unknown2");
        let unknown3 = read_array::<_, 4>(reader, "unknown3");
        let game_speed = fallback(reader.read_u32(), "game_speed");

        ReplayHeader {
            game_type,
            timestamp_begin,
            timestamp_end,
            num_timestamps,
            filler,
            file_name,
            wall_clock,
            version,
            build_date,
            version_minor,
            version_major,
            hash,
            metadata,
            replay_owner_slot,
            unknown1,
            unknown2,
            unknown3,
            game_speed,
        }
    }

    /// Returns `true` if the format tag matches a Generals replay.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.game_type == "GENREP"
    }

    /// Match duration in seconds, when both timestamps are present.
    #[must_use]
    pub fn duration_secs(&self) -> Option<u32> {
        (self.timestamp_end > self.timestamp_begin)
            .then(|| self.timestamp_end - self.timestamp_begin)
    }

    /// The replay owner's slot number, when the on-wire encoding is the
    /// expected ASCII digit pair.
    #[must_use]
    pub fn owner_slot(&self) -> Option<u8> {
        match self.replay_owner_slot {
            [b @ b'0'..=b'9', 0] => Some(b - b'0'),
            _ => None,
        }
    }
}

/// Serializes opaque byte fields as lowercase hex strings, the shape
/// downstream JSON consumers already expect.
fn serialize_hex<S, const N: usize>(
    bytes: &[u8; N],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    serializer.serialize_str(&hex)
}

/// Substitutes the typed zero for an unreadable field, logging which
/// field was lost.
fn fallback<T: Default>(result: crate::error::Result<T>, field: &str) -> T {
    result.unwrap_or_else(|e| {
        warn!("failed to read {field}: {e}");
        T::default()
    })
}

/// Reads a fixed-size byte field, zero-filled on failure.
fn read_array<R: std::io::Read, const N: usize>(reader: &mut BitReader<R>, field: &str) -> [u8; N] {
    match reader.read_bytes(N) {
        Ok(bytes) => {
            let mut out = [0u8; N];
            out.copy_from_slice(&bytes);
            out
        }
        Err(e) => {
            warn!("failed to read {field}: {e}");
            [0u8; N]
        }
    }
}

/// Reads a null-terminated string field, keeping the partial prefix on
/// truncation.
fn read_text<R: std::io::Read>(
    reader: &mut BitReader<R>,
    encoding: Encoding,
    field: &str,
) -> String {
    match reader.read_null_terminated(encoding) {
        Ok(s) => s,
        Err(ParserError::TruncatedString { partial }) => {
            warn!("truncated {field}, keeping {} chars", partial.len());
            partial
        }
        Err(e) => {
            warn!("failed to read {field}: {e}");
            String::new()
        }
    }
}
