//! Event-stream parsing for the replay body.
//!
//! The body is a flat sequence of variable-length event records
//! immediately following the header. Each record is:
//!
//! | Size | Type | Field |
//! |------|------|-------|
//! | 4 | u32 LE | `time_code` (game tick) |
//! | 4 | u32 LE | `order_code` |
//! | 4 | u32 LE | `player_id` |
//! | 1 | u8 | `n_args` |
//! | 2×n_args | (u8, u8) | argument descriptors (type, count) |
//! | var | per type | argument payload, descriptor-driven |
//!
//! A record whose time code, order code, and player id are all zero
//! terminates the stream; bytes after it are ignored.
//!
//! # Corruption handling
//!
//! Descriptor bounds (type `0..=10`, count `0..=50`, at most 50
//! descriptors) are the only structural validation the format allows.
//! A violation means the reader has lost sync, so it ends the decode
//! loop rather than guessing at a resync point. Argument payloads that
//! run short blank the affected slots and keep the event.
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//! use std::path::Path;
//! use genrep_parser::binary::BitReader;
//! use genrep_parser::body::parse_body;
//! use genrep_parser::header::ReplayHeader;
//! use genrep_parser::stores::GameData;
//!
//! let data = GameData::load(Path::new("Data/INI")).unwrap();
//! let file = File::open("match.rep").unwrap();
//! let mut reader = BitReader::new(BufReader::new(file));
//! let _header = ReplayHeader::parse(&mut reader);
//! let events = parse_body(&mut reader, &data);
//! println!("{} events", events.len());
//! ```

pub mod args;
pub mod changes;
pub mod commands;
pub mod details;

pub use args::{ArgKind, ArgMetadata, ArgValue, ScreenPos, MAX_ARG_COUNT, MAX_ARG_TYPE};
pub use changes::StatKind;
pub use commands::{command_name, is_passive};
pub use details::{attach_details, Detail, DUMMY_UPGRADE};

use std::io::Read;

use log::debug;
use serde::Serialize;

use crate::binary::BitReader;
use crate::error::{ParserError, Result};
use crate::stores::GameData;

/// One decoded command event.
///
/// `player_name` is filled by the summary pass once the player-id
/// offset has been calibrated; it is empty straight out of the decoder.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BodyChunk {
    /// Game tick the command was issued on.
    pub time_code: u32,

    /// Command kind tag.
    pub order_code: u32,

    /// Human-readable command name, `""` for unmapped codes.
    pub order_name: &'static str,

    /// Wire player id. Humans typically start at 2; the exact offset is
    /// calibrated per replay.
    pub player_id: u32,

    /// Roster name of the issuing player; attached post-decode.
    pub player_name: String,

    /// Declared descriptor count.
    pub number_of_arguments: u8,

    /// Argument descriptors, one per run of same-typed arguments.
    pub arg_metadata: Vec<ArgMetadata>,

    /// Flat argument payload; length is the sum of descriptor counts.
    pub arguments: Vec<ArgValue>,

    /// Store-resolved detail for the order codes that carry one.
    pub details: Detail,
}

impl BodyChunk {
    /// Builds a synthetic change event (order codes 2000..=2019).
    ///
    /// These are never decoded from the wire: an external collaborator
    /// submits per-tick samples and splices them into the record via
    /// [`merge_change_events`]. The eight values land as `Int`
    /// arguments under a single descriptor, so the chunk is
    /// indistinguishable in shape from a decoded one.
    #[must_use]
    pub fn synthetic_change(order_code: u32, time_code: u32, values: [u32; 8]) -> Self {
        BodyChunk {
            time_code,
            order_code,
            order_name: command_name(order_code),
            player_id: 0,
            player_name: String::new(),
            number_of_arguments: 1,
            arg_metadata: vec![ArgMetadata {
                kind: ArgKind::Int,
                count: 8,
            }],
            arguments: values.into_iter().map(ArgValue::Int).collect(),
            details: Detail::None,
        }
    }

    /// Builds a synthetic money sample ([`commands::ORDER_MONEY_VALUE_CHANGE`]).
    #[must_use]
    pub fn money_change(time_code: u32, money: [u32; 8]) -> Self {
        Self::synthetic_change(commands::ORDER_MONEY_VALUE_CHANGE, time_code, money)
    }

    /// Extracts the 8-entry money vector from a money sample event.
    ///
    /// Returns `None` for other order codes or malformed argument
    /// shapes. Entry `i` is the balance of the player with wire id
    /// `i + 2`.
    #[must_use]
    pub fn money_vector(&self) -> Option<[u32; 8]> {
        if self.order_code != commands::ORDER_MONEY_VALUE_CHANGE {
            return None;
        }
        let mut vector = [0u32; 8];
        for (slot, value) in vector.iter_mut().zip(self.arguments.iter()) {
            *slot = value.as_int()?;
        }
        (self.arguments.len() >= 8).then_some(vector)
    }

    /// Returns `true` for commands that don't evidence player activity.
    #[must_use]
    pub fn is_passive(&self) -> bool {
        is_passive(self.order_code)
    }
}

/// What [`read_frame`] found at the cursor.
enum Frame {
    /// The zero-triple terminator.
    Terminator,
    /// A live event's fixed prefix and descriptors.
    Event {
        time_code: u32,
        order_code: u32,
        player_id: u32,
        number_of_arguments: u8,
        arg_metadata: Vec<ArgMetadata>,
    },
}

/// Reads an event's fixed prefix and argument descriptors.
///
/// Strict in both decode modes: exhaustion or a descriptor-bound
/// violation is an error that ends the enclosing loop.
fn read_frame<R: Read>(reader: &mut BitReader<R>) -> Result<Frame> {
    let time_code = reader.read_u32()?;
    let order_code = reader.read_u32()?;
    let player_id = reader.read_u32()?;
    let number_of_arguments = reader.read_u8()?;

    if time_code == 0 && order_code == 0 && player_id == 0 {
        return Ok(Frame::Terminator);
    }

    if number_of_arguments > MAX_ARG_COUNT {
        return Err(ParserError::ArgCountOutOfRange {
            value: number_of_arguments,
        });
    }

    let mut arg_metadata = Vec::with_capacity(number_of_arguments as usize);
    for _ in 0..number_of_arguments {
        let kind = ArgKind::try_from(reader.read_u8()?)?;
        let count = reader.read_u8()?;
        if count > MAX_ARG_COUNT {
            return Err(ParserError::ArgCountOutOfRange { value: count });
        }
        arg_metadata.push(ArgMetadata { kind, count });
    }

    Ok(Frame::Event {
        time_code,
        order_code,
        player_id,
        number_of_arguments,
        arg_metadata,
    })
}

/// Assembles a chunk from its frame and decoded arguments.
fn build_chunk(
    time_code: u32,
    order_code: u32,
    player_id: u32,
    number_of_arguments: u8,
    arg_metadata: Vec<ArgMetadata>,
    arguments: Vec<ArgValue>,
    data: &GameData,
) -> BodyChunk {
    let details = attach_details(
        order_code,
        &arguments,
        &data.objects,
        &data.powers,
        &data.upgrades,
    );
    BodyChunk {
        time_code,
        order_code,
        order_name: command_name(order_code),
        player_id,
        player_name: String::new(),
        number_of_arguments,
        arg_metadata,
        arguments,
        details,
    }
}

/// Iterator over the event stream in batch mode.
///
/// Yields decoded events until the terminator, exhaustion, or
/// corruption ends the stream. Per batch semantics the iterator never
/// yields errors: short argument payloads blank the affected slots and
/// keep their event, while structural problems simply finish the
/// iteration.
///
/// # Example
///
/// ```ignore
/// use genrep_parser::body::EventIterator;
///
/// let mut iter = EventIterator::new(&mut reader, &data);
/// for event in &mut iter {
///     println!("[{}] {}", event.time_code, event.order_name);
/// }
/// assert!(iter.is_finished());
/// ```
pub struct EventIterator<'a, R> {
    reader: &'a mut BitReader<R>,
    data: &'a GameData,
    finished: bool,
}

impl<'a, R: Read> EventIterator<'a, R> {
    /// Creates an iterator reading events from the current position of
    /// `reader`.
    #[must_use]
    pub fn new(reader: &'a mut BitReader<R>, data: &'a GameData) -> Self {
        Self {
            reader,
            data,
            finished: false,
        }
    }

    /// Returns whether iteration has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl<R: Read> Iterator for EventIterator<'_, R> {
    type Item = BodyChunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let (time_code, order_code, player_id, number_of_arguments, arg_metadata) =
            match read_frame(self.reader) {
                Ok(Frame::Terminator) => {
                    self.finished = true;
                    return None;
                }
                Ok(Frame::Event {
                    time_code,
                    order_code,
                    player_id,
                    number_of_arguments,
                    arg_metadata,
                }) => (time_code, order_code, player_id, number_of_arguments, arg_metadata),
                Err(e) => {
                    if !e.is_exhaustion() {
                        debug!("body decode ended: {e}");
                    }
                    self.finished = true;
                    return None;
                }
            };

        let total: usize = arg_metadata.iter().map(|m| m.count as usize).sum();
        let mut arguments = Vec::with_capacity(total);
        for metadata in &arg_metadata {
            for _ in 0..metadata.count {
                arguments.push(args::decode_arg(self.reader, metadata.kind));
            }
        }

        Some(build_chunk(
            time_code,
            order_code,
            player_id,
            number_of_arguments,
            arg_metadata,
            arguments,
            self.data,
        ))
    }
}

/// Decodes the full event stream in batch mode.
///
/// Never fails: corruption and exhaustion both end the loop, and the
/// caller gets every event decoded up to that point.
pub fn parse_body<R: Read>(reader: &mut BitReader<R>, data: &GameData) -> Vec<BodyChunk> {
    EventIterator::new(reader, data).collect()
}

/// Reads one complete event in strict mode.
///
/// Returns `Ok(None)` at the terminator. Unlike [`parse_body`], any
/// exhaustion — even inside the argument payload — is an error, because
/// a streaming caller must drop partial records and re-read their bytes
/// once the rest has been flushed.
///
/// # Errors
///
/// Exhaustion errors ([`ParserError::is_exhaustion`]) mean "not enough
/// bytes yet"; anything else means the stream is corrupt.
pub fn read_chunk_strict<R: Read>(
    reader: &mut BitReader<R>,
    data: &GameData,
) -> Result<Option<BodyChunk>> {
    let Frame::Event {
        time_code,
        order_code,
        player_id,
        number_of_arguments,
        arg_metadata,
    } = read_frame(reader)?
    else {
        return Ok(None);
    };

    let total: usize = arg_metadata.iter().map(|m| m.count as usize).sum();
    let mut arguments = Vec::with_capacity(total);
    for metadata in &arg_metadata {
        for _ in 0..metadata.count {
            arguments.push(args::read_arg(reader, metadata.kind)?);
        }
    }

    Ok(Some(build_chunk(
        time_code,
        order_code,
        player_id,
        number_of_arguments,
        arg_metadata,
        arguments,
        data,
    )))
}

/// Splices externally-sourced change events into a decoded event list,
/// keeping `time_code` order.
///
/// The sort is stable, so same-tick events keep decoded-before-injected
/// order.
pub fn merge_change_events(events: &mut Vec<BodyChunk>, change_events: Vec<BodyChunk>) {
    events.extend(change_events);
    events.sort_by_key(|chunk| chunk.time_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::{
        ColorStore, ObjectEntry, ObjectStore, PowerEntry, PowerStore, UpgradeEntry, UpgradeStore,
    };
    use std::io::Cursor;

    fn game_data() -> GameData {
        GameData {
            objects: ObjectStore::from_entries(vec![
                ObjectEntry {
                    name: "TestUnit".to_string(),
                    cost: 100,
                },
                ObjectEntry {
                    name: "TestBuilding".to_string(),
                    cost: 500,
                },
            ]),
            powers: PowerStore::from_entries(vec![PowerEntry {
                name: "TestPower".to_string(),
            }]),
            upgrades: UpgradeStore::from_entries(vec![UpgradeEntry {
                name: "TestUpgrade".to_string(),
                cost: 1500,
            }]),
            colors: ColorStore::from_entries(vec![]),
        }
    }

    /// Appends one event record to `buf`.
    fn push_event(
        buf: &mut Vec<u8>,
        time_code: u32,
        order_code: u32,
        player_id: u32,
        descriptors: &[(u8, u8)],
        payload: &[u8],
    ) {
        buf.extend_from_slice(&time_code.to_le_bytes());
        buf.extend_from_slice(&order_code.to_le_bytes());
        buf.extend_from_slice(&player_id.to_le_bytes());
        buf.push(descriptors.len() as u8);
        for &(kind, count) in descriptors {
            buf.push(kind);
            buf.push(count);
        }
        buf.extend_from_slice(payload);
    }

    /// Appends the 13-byte zero-triple terminator.
    fn push_terminator(buf: &mut Vec<u8>) {
        buf.extend_from_slice(&[0u8; 13]);
    }

    fn parse(buf: &[u8]) -> Vec<BodyChunk> {
        let mut reader = BitReader::new(Cursor::new(buf.to_vec()));
        parse_body(&mut reader, &game_data())
    }

    #[test]
    fn test_single_create_unit_event() {
        let mut buf = Vec::new();
        push_event(&mut buf, 1000, 1047, 2, &[(0, 1)], &2u32.to_le_bytes());
        push_terminator(&mut buf);

        let events = parse(&buf);
        assert_eq!(events.len(), 1);

        let event = &events[0];
        assert_eq!(event.time_code, 1000);
        assert_eq!(event.order_code, 1047);
        assert_eq!(event.order_name, "CreateUnit");
        assert_eq!(event.player_id, 2);
        assert_eq!(event.number_of_arguments, 1);
        assert_eq!(event.arguments, vec![ArgValue::Int(2)]);
        assert_eq!(
            event.details,
            Detail::Unit {
                name: "TestUnit".to_string(),
                cost: 100
            }
        );
    }

    #[test]
    fn test_argument_count_matches_descriptor_sum() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&7u32.to_le_bytes());
        payload.extend_from_slice(&8u32.to_le_bytes());
        payload.push(1); // bool

        let mut buf = Vec::new();
        push_event(&mut buf, 50, 1001, 3, &[(0, 2), (2, 1)], &payload);
        push_terminator(&mut buf);

        let events = parse(&buf);
        assert_eq!(events.len(), 1);
        let event = &events[0];
        let declared: usize = event.arg_metadata.iter().map(|m| m.count as usize).sum();
        assert_eq!(event.arguments.len(), declared);
        assert_eq!(
            event.arguments,
            vec![ArgValue::Int(7), ArgValue::Int(8), ArgValue::Bool(true)]
        );
        // Each decoded variant matches its descriptor
        assert_eq!(event.arguments[0].kind(), event.arg_metadata[0].kind);
        assert_eq!(event.arguments[2].kind(), event.arg_metadata[1].kind);
    }

    #[test]
    fn test_terminator_mid_file_ignores_rest() {
        let mut buf = Vec::new();
        push_event(&mut buf, 10, 1068, 2, &[], &[]);
        push_terminator(&mut buf);
        // A perfectly valid event after the terminator must not appear
        push_event(&mut buf, 20, 1068, 2, &[], &[]);

        let events = parse(&buf);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].time_code, 10);
    }

    #[test]
    fn test_empty_source_gives_empty_body() {
        assert!(parse(&[]).is_empty());
    }

    #[test]
    fn test_truncated_prefix_ends_stream() {
        // 6 bytes can't hold the 13-byte record prefix
        let events = parse(&[1, 0, 0, 0, 27, 0]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_bad_descriptor_type_ends_stream() {
        let mut buf = Vec::new();
        push_event(&mut buf, 10, 1068, 2, &[], &[]);
        // Type 11 is out of range
        push_event(&mut buf, 20, 1001, 2, &[(11, 1)], &[0, 0, 0, 0]);
        push_event(&mut buf, 30, 1068, 2, &[], &[]);
        push_terminator(&mut buf);

        let events = parse(&buf);
        // Only the event before the corruption survives
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].time_code, 10);
    }

    #[test]
    fn test_bad_descriptor_count_ends_stream() {
        let mut buf = Vec::new();
        push_event(&mut buf, 10, 1068, 2, &[], &[]);
        push_event(&mut buf, 20, 1001, 2, &[(0, 51)], &[]);
        push_terminator(&mut buf);

        let events = parse(&buf);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_oversized_n_args_ends_stream() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&10u32.to_le_bytes());
        buf.extend_from_slice(&1001u32.to_le_bytes());
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.push(51); // n_args over the limit
        push_terminator(&mut buf);

        assert!(parse(&buf).is_empty());
    }

    #[test]
    fn test_short_argument_payload_blanks_slot() {
        let mut buf = Vec::new();
        // Declares one u32 argument but supplies only two bytes
        push_event(&mut buf, 10, 1001, 2, &[(0, 1)], &[0xAB, 0xCD]);

        let events = parse(&buf);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].arguments, vec![ArgValue::Int(0)]);
    }

    #[test]
    fn test_unit_id_out_of_table_keeps_event() {
        let mut buf = Vec::new();
        push_event(&mut buf, 10, 1047, 2, &[(0, 1)], &999u32.to_le_bytes());
        push_terminator(&mut buf);

        let events = parse(&buf);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].details, Detail::None);
    }

    #[test]
    fn test_upgrade_event_gets_dummy_when_unresolvable() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&7u32.to_le_bytes()); // player/faction context
        payload.extend_from_slice(&10u32.to_le_bytes()); // below upgrade offset

        let mut buf = Vec::new();
        push_event(&mut buf, 10, 1045, 2, &[(0, 2)], &payload);
        push_terminator(&mut buf);

        let events = parse(&buf);
        assert_eq!(events[0].details.name(), Some(DUMMY_UPGRADE));
    }

    #[test]
    fn test_read_chunk_strict_rejects_partial_payload() {
        let mut buf = Vec::new();
        push_event(&mut buf, 10, 1001, 2, &[(0, 1)], &[0xAB, 0xCD]);

        let mut reader = BitReader::new(Cursor::new(buf));
        let result = read_chunk_strict(&mut reader, &game_data());
        assert!(matches!(result, Err(e) if e.is_exhaustion()));
    }

    #[test]
    fn test_read_chunk_strict_terminator() {
        let mut buf = Vec::new();
        push_terminator(&mut buf);
        let mut reader = BitReader::new(Cursor::new(buf));
        let result = read_chunk_strict(&mut reader, &game_data()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_synthetic_money_change_shape() {
        let chunk = BodyChunk::money_change(500, [5000, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(chunk.order_code, 2000);
        assert_eq!(chunk.order_name, "MoneyValueChange");
        assert_eq!(chunk.player_id, 0);
        assert_eq!(chunk.arguments.len(), 8);
        assert_eq!(chunk.money_vector(), Some([5000, 0, 0, 0, 0, 0, 0, 0]));
        assert!(chunk.is_passive());
    }

    #[test]
    fn test_money_vector_rejects_other_codes() {
        let chunk = BodyChunk::synthetic_change(2001, 500, [1; 8]);
        assert_eq!(chunk.money_vector(), None);
    }

    #[test]
    fn test_merge_change_events_keeps_time_order() {
        let mut events = vec![
            BodyChunk {
                time_code: 10,
                order_code: 1068,
                ..BodyChunk::default()
            },
            BodyChunk {
                time_code: 30,
                order_code: 1069,
                ..BodyChunk::default()
            },
        ];
        let injected = vec![
            BodyChunk::money_change(20, [1; 8]),
            BodyChunk::money_change(5, [2; 8]),
        ];
        merge_change_events(&mut events, injected);

        let times: Vec<u32> = events.iter().map(|e| e.time_code).collect();
        assert_eq!(times, vec![5, 10, 20, 30]);
    }

    #[test]
    fn test_event_iterator_matches_parse_body() {
        let mut buf = Vec::new();
        push_event(&mut buf, 10, 1068, 2, &[], &[]);
        push_event(&mut buf, 20, 1047, 2, &[(0, 1)], &2u32.to_le_bytes());
        push_terminator(&mut buf);

        let data = game_data();
        let collected = parse(&buf);

        let mut reader = BitReader::new(Cursor::new(buf));
        let mut iter = EventIterator::new(&mut reader, &data);
        let first = iter.next().unwrap();
        assert_eq!(first.time_code, 10);
        let second = iter.next().unwrap();
        assert_eq!(second.time_code, 20);
        assert!(iter.next().is_none());
        assert!(iter.is_finished());
        // Fused after the terminator
        assert!(iter.next().is_none());

        assert_eq!(collected, vec![first, second]);
    }

    #[test]
    fn test_merge_is_stable_for_equal_ticks() {
        let mut events = vec![BodyChunk {
            time_code: 10,
            order_code: 1068,
            ..BodyChunk::default()
        }];
        merge_change_events(&mut events, vec![BodyChunk::money_change(10, [1; 8])]);
        assert_eq!(events[0].order_code, 1068);
        assert_eq!(events[1].order_code, 2000);
    }
}
