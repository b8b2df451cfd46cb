//! Batch decoding: the complete match record and its semantic pass.
//!
//! [`Replay::parse`] drives the whole pipeline: header, roster-seeded
//! summaries, body, player-id offset calibration, name attachment,
//! aggregation, and winner determination. The result is immutable from
//! the caller's point of view; nothing mutates it after return.
//!
//! # Failure semantics
//!
//! No decode failure aborts a replay. A corrupted or truncated file
//! yields a record that is a prefix of the valid one, with the semantic
//! pass applied to whatever events were recovered. Only constructor
//! failures — an unopenable file, unloadable INI stores — are fatal.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use genrep_parser::replay::Replay;
//! use genrep_parser::stores::GameData;
//!
//! let data = GameData::load(Path::new("Data/INI")).unwrap();
//! let replay = Replay::from_file(Path::new("match.rep"), &data).unwrap();
//! for player in &replay.summary {
//!     println!("{} ({}): {}", player.name, player.side,
//!              if player.win { "won" } else { "lost" });
//! }
//! ```

pub mod summary;

pub use summary::{constructor_side, ObjectSummary, PlayerSummary, OBSERVER_SIDE, OBSERVER_TEAM};

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Serialize;

use crate::binary::BitReader;
use crate::body::{self, BodyChunk};
use crate::error::{ParserError, Result};
use crate::header::ReplayHeader;
use crate::stores::GameData;

/// Offset sentinel used before any event has been observed.
///
/// Real wire ids are tiny (humans start around 2), so the minimum scan
/// starting here converges on the first event.
pub const OFFSET_SENTINEL: u32 = 1000;

/// A fully decoded and summarized match record.
#[derive(Debug, Clone, Serialize)]
pub struct Replay {
    /// Decoded header, including metadata and roster.
    pub header: ReplayHeader,

    /// Time-ordered command events.
    pub body: Vec<BodyChunk>,

    /// Per-player summaries, in roster order.
    pub summary: Vec<PlayerSummary>,

    /// Calibrated wire-id offset: `player_id - offset` indexes the
    /// summary list.
    pub offset: u32,
}

impl Replay {
    /// Decodes a complete replay from a sequential byte source.
    ///
    /// Infallible by design: see the module docs on failure semantics.
    pub fn parse<R: Read>(reader: &mut BitReader<R>, data: &GameData) -> Self {
        let header = ReplayHeader::parse(reader);
        let body = body::parse_body(reader, data);

        let mut replay = Replay {
            header,
            body,
            summary: Vec::new(),
            offset: OFFSET_SENTINEL,
        };
        // Offset calibration and name attachment run exactly once, on
        // the decoded wire events. Synthetic change events injected
        // later carry player id 0 and must never shift the offset.
        replay.adjust_offset();
        replay.attach_player_names();
        replay.generate_summary();
        replay
    }

    /// Opens and decodes a replay file.
    ///
    /// # Errors
    ///
    /// [`ParserError::Io`] when the file cannot be opened — the only
    /// fatal failure at this level.
    pub fn from_file(path: &Path, data: &GameData) -> Result<Self> {
        let file = File::open(path).map_err(ParserError::Io)?;
        let mut reader = BitReader::new(BufReader::new(file));
        Ok(Self::parse(&mut reader, data))
    }

    /// Splices externally-sourced synthetic change events (order codes
    /// 2000..=2019) into the record and regenerates the summary, so the
    /// money-based winner policy can see them.
    ///
    /// The calibrated offset and the attached player names are left
    /// untouched: synthetic events carry player id 0 and no name, and
    /// recalibrating against them would re-index every real event.
    pub fn merge_change_events(&mut self, change_events: Vec<BodyChunk>) {
        body::merge_change_events(&mut self.body, change_events);
        self.generate_summary();
    }

    /// Rebuilds the per-player summaries from scratch.
    ///
    /// Re-running at any time produces the same result: summaries are
    /// reseeded from the roster before aggregation and winner
    /// determination.
    fn generate_summary(&mut self) {
        self.summary = summary::seed_summaries(&self.header.metadata.players);
        summary::aggregate(&mut self.summary, &self.body);
        summary::determine_winners(&mut self.summary, &self.body);
    }

    /// Calibrates the offset to the lowest wire id in the event stream.
    ///
    /// Humans typically appear at id 2, but observers and special slots
    /// shift the base, so it must never be assumed.
    fn adjust_offset(&mut self) {
        self.offset = self
            .body
            .iter()
            .map(|chunk| chunk.player_id)
            .min()
            .unwrap_or(OFFSET_SENTINEL)
            .min(OFFSET_SENTINEL);
    }

    /// Attaches roster names to events whose calibrated id falls inside
    /// the roster range. Out-of-range ids keep an empty name.
    fn attach_player_names(&mut self) {
        let roster = &self.header.metadata.players;
        for chunk in &mut self.body {
            if chunk.player_id < self.offset {
                continue;
            }
            let index = (chunk.player_id - self.offset) as usize;
            if let Some(player) = roster.get(index) {
                chunk.player_name = player.name.clone();
            }
        }
    }

    /// The roster-indexed summary entry for a wire player id, if the id
    /// is in range.
    #[must_use]
    pub fn player_by_wire_id(&self, player_id: u32) -> Option<&PlayerSummary> {
        let index = player_id.checked_sub(self.offset)? as usize;
        self.summary.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Detail;
    use crate::stores::{
        ColorStore, ObjectEntry, ObjectStore, PowerEntry, PowerStore, UpgradeEntry, UpgradeStore,
    };
    use std::io::Cursor;

    fn game_data() -> GameData {
        GameData {
            objects: ObjectStore::from_entries(vec![ObjectEntry {
                name: "AmericaVehicleDozer".to_string(),
                cost: 1000,
            }]),
            powers: PowerStore::from_entries(vec![]),
            upgrades: UpgradeStore::from_entries(vec![]),
            colors: ColorStore::from_entries(vec![]),
        }
    }

    /// Header bytes carrying only the roster metadata; every other field
    /// is exercised by the header module's own tests.
    fn header_with_roster(roster: &str) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"GENREP");
        data.extend_from_slice(&100u32.to_le_bytes());
        data.extend_from_slice(&200u32.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&[0u8; 12]); // filler
        data.extend_from_slice(&[0, 0]); // empty file name
        for _ in 0..8 {
            data.extend_from_slice(&0u16.to_le_bytes()); // wall clock
        }
        data.extend_from_slice(&[0, 0]); // empty version
        data.extend_from_slice(&[0, 0]); // empty build date
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&[0u8; 8]); // hash
        data.extend_from_slice(format!("S={roster};\0").as_bytes());
        data.extend_from_slice(&[0u8; 2]); // owner slot
        data.extend_from_slice(&[0u8; 12]); // unknown1..3
        data.extend_from_slice(&1u32.to_le_bytes()); // game speed
        data
    }

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

    fn parse(bytes: Vec<u8>) -> Replay {
        let mut reader = BitReader::new(Cursor::new(bytes));
        Replay::parse(&mut reader, &game_data())
    }

    fn two_player_replay() -> Vec<u8> {
        let mut bytes = header_with_roster("HAlice,0,0,FT,0,-1,-1,0,1:HBob,0,0,FT,1,-1,-1,1,1:X:X");
        push_event(&mut bytes, 10, 1047, 2, &[(0, 1)], &2u32.to_le_bytes());
        push_event(&mut bytes, 20, 1047, 3, &[(0, 1)], &2u32.to_le_bytes());
        push_event(&mut bytes, 500, 1093, 3, &[], &[]);
        bytes.extend_from_slice(&[0u8; 13]); // terminator
        bytes
    }

    #[test]
    fn test_parse_end_to_end() {
        let replay = parse(two_player_replay());

        assert!(replay.header.is_valid());
        assert_eq!(replay.offset, 2);
        assert_eq!(replay.body.len(), 3);
        assert_eq!(replay.body[0].player_name, "Alice");
        assert_eq!(replay.body[1].player_name, "Bob");
        assert_eq!(replay.summary.len(), 2);

        // Both built a dozer; both sides inferred
        assert_eq!(replay.summary[0].side, "USA");
        assert_eq!(replay.summary[0].money_spent, 1000);
        assert_eq!(replay.summary[1].side, "USA");

        // Bob surrendered
        assert!(replay.summary[0].win);
        assert!(!replay.summary[1].win);
    }

    #[test]
    fn test_offset_calibration_from_minimum_id() {
        // Wire ids start at 3 in this record; Alice must still resolve
        let mut bytes =
            header_with_roster("HAlice,0,0,FT,0,-1,-1,0,1:HBob,0,0,FT,1,-1,-1,1,1");
        push_event(&mut bytes, 10, 1068, 3, &[], &[]);
        push_event(&mut bytes, 20, 1068, 4, &[], &[]);
        bytes.extend_from_slice(&[0u8; 13]);

        let replay = parse(bytes);
        assert_eq!(replay.offset, 3);
        assert_eq!(replay.body[0].player_name, "Alice");
        assert_eq!(replay.body[1].player_name, "Bob");
        assert_eq!(replay.player_by_wire_id(4).unwrap().name, "Bob");
        assert!(replay.player_by_wire_id(2).is_none());
    }

    #[test]
    fn test_out_of_range_ids_get_no_name() {
        let mut bytes = header_with_roster("HAlice,0,0,FT,0,-1,-1,0,1");
        push_event(&mut bytes, 10, 1068, 2, &[], &[]);
        push_event(&mut bytes, 20, 1068, 9, &[], &[]); // past the roster
        bytes.extend_from_slice(&[0u8; 13]);

        let replay = parse(bytes);
        assert_eq!(replay.body[0].player_name, "Alice");
        assert_eq!(replay.body[1].player_name, "");
    }

    #[test]
    fn test_empty_source() {
        let replay = parse(Vec::new());
        assert!(!replay.header.is_valid());
        assert!(replay.body.is_empty());
        assert!(replay.summary.is_empty());
        assert_eq!(replay.offset, OFFSET_SENTINEL);
    }

    #[test]
    fn test_semantic_pass_idempotent() {
        let mut replay = parse(two_player_replay());
        let snapshot = (replay.summary.clone(), replay.offset);
        replay.generate_summary();
        assert_eq!(replay.summary, snapshot.0);
        assert_eq!(replay.offset, snapshot.1);
    }

    #[test]
    fn test_merge_change_events_enables_money_policy() {
        let mut replay = parse({
            // No surrender this time: without money data the tiebreak
            // would go to the last active player
            let mut bytes =
                header_with_roster("HAlice,0,0,FT,0,-1,-1,0,1:HBob,0,0,FT,1,-1,-1,1,1");
            push_event(&mut bytes, 10, 1047, 2, &[(0, 1)], &2u32.to_le_bytes());
            push_event(&mut bytes, 20, 1047, 3, &[(0, 1)], &2u32.to_le_bytes());
            bytes.extend_from_slice(&[0u8; 13]);
            bytes
        });
        assert!(!replay.summary[0].win); // Bob was last active

        replay.merge_change_events(vec![BodyChunk::money_change(
            900,
            [5000, 0, 0, 0, 0, 0, 0, 0],
        )]);
        assert!(replay.summary[0].win);
        assert!(!replay.summary[1].win);
        // Merged event is in time order at the end
        assert_eq!(replay.body.last().unwrap().order_code, 2000);
        // The injected id-0 event must not recalibrate the offset
        assert_eq!(replay.offset, 2);
    }

    #[test]
    fn test_details_attached_through_pipeline() {
        let replay = parse(two_player_replay());
        assert_eq!(
            replay.body[0].details,
            Detail::Unit {
                name: "AmericaVehicleDozer".to_string(),
                cost: 1000
            }
        );
    }
}
