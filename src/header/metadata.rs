//! Match metadata embedded in the replay header.
//!
//! The header's trailing UTF-8 string packs the lobby settings and the
//! player roster into a `KEY=VAL;` list:
//!
//! ```text
//! M=07maps/tournament island;MC=12BE477C;MS=130668;SD=6449734;C=100;
//! SR=0;SC=10000;O=N;S=HModus,17F04000,8088,FT,7,-1,-1,0,1:X:X:;
//! ```
//!
//! The `S` key holds the roster: colon-separated slots, each a
//! comma-separated 9-tuple. Empty slots are the single char `X`, which
//! splits into fewer than nine fields and is skipped. The first
//! character of the first field is the slot kind (`H` human, `C`
//! computer), the rest of it the player name.

use log::debug;
use serde::Serialize;

/// Roster faction value identifying an observer slot.
pub const OBSERVER_FACTION: &str = "-2";

/// Number of comma-separated fields in a populated roster slot.
const ROSTER_FIELD_COUNT: usize = 9;

/// Lobby settings and roster parsed from the metadata string.
///
/// Field values are kept as the raw strings the game wrote; nothing
/// downstream needs them as numbers except the team id, which the
/// summary pass converts itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    /// Map file path, key `M`.
    pub map_file: String,
    /// Map CRC, key `MC`.
    pub map_crc: String,
    /// Map file size, key `MS`.
    pub map_size: String,
    /// Match random seed, key `SD`.
    pub seed: String,
    /// Key `C`; meaning unknown.
    pub c: String,
    /// Key `SR`; meaning unknown.
    pub sr: String,
    /// Starting credits, key `SC`.
    pub starting_credits: String,
    /// Key `O`; meaning unknown.
    pub o: String,
    /// Player roster, key `S`.
    pub players: Vec<RosterPlayer>,
}

/// One populated roster slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RosterPlayer {
    /// Slot kind: `H` human, `C` computer.
    pub kind: String,
    /// Player name.
    pub name: String,
    /// Hex-encoded IP address.
    pub ip: String,
    /// UDP port.
    pub port: String,
    /// Field 3; always observed as `FT`.
    pub ft: String,
    /// Color index into the multiplayer color table, `-1` for random.
    pub color: String,
    /// Faction index, `-1` for random, `-2` for observer.
    pub faction: String,
    /// Starting position index, `-1` for random.
    pub starting_position: String,
    /// Team index, zero-based; `-1` for no team.
    pub team: String,
    /// Trailing field; meaning unknown.
    pub unknown: String,
}

impl RosterPlayer {
    /// Returns `true` if this slot is an observer.
    #[must_use]
    pub fn is_observer(&self) -> bool {
        self.faction == OBSERVER_FACTION
    }

    /// The roster team as a number, when parseable.
    #[must_use]
    pub fn team_index(&self) -> Option<i32> {
        self.team.parse().ok()
    }
}

/// Parses the full metadata string.
///
/// Unknown keys are logged and skipped; segments without a `=` are
/// logged and skipped. An empty input yields the default (all fields
/// empty, no players).
#[must_use]
pub fn parse_metadata(raw: &str) -> Metadata {
    let mut metadata = Metadata::default();
    for field in raw.split(';') {
        if field.is_empty() {
            continue;
        }
        let Some((key, value)) = field.split_once('=') else {
            debug!("metadata segment without '=': {field}");
            continue;
        };
        match key {
            "M" => metadata.map_file = value.to_string(),
            "MC" => metadata.map_crc = value.to_string(),
            "MS" => metadata.map_size = value.to_string(),
            "SD" => metadata.seed = value.to_string(),
            "C" => metadata.c = value.to_string(),
            "SR" => metadata.sr = value.to_string(),
            "SC" => metadata.starting_credits = value.to_string(),
            "O" => metadata.o = value.to_string(),
            "S" => metadata.players = parse_players(value),
            other => debug!("unknown metadata key: {other}"),
        }
    }
    metadata
}

/// Parses the `S` roster value.
///
/// Slots with a field count other than nine (the `X` empty-slot
/// sentinel, or trailing empties) are skipped.
#[must_use]
pub fn parse_players(raw: &str) -> Vec<RosterPlayer> {
    let mut players = Vec::new();
    for slot in raw.split(':') {
        let fields: Vec<&str> = slot.split(',').collect();
        if fields.len() != ROSTER_FIELD_COUNT {
            continue;
        }
        let mut chars = fields[0].chars();
        let kind = match chars.next() {
            Some(c) => c.to_string(),
            None => continue,
        };
        players.push(RosterPlayer {
            kind,
            name: chars.as_str().to_string(),
            ip: fields[1].to_string(),
            port: fields[2].to_string(),
            ft: fields[3].to_string(),
            color: fields[4].to_string(),
            faction: fields[5].to_string(),
            starting_position: fields[6].to_string(),
            team: fields[7].to_string(),
            unknown: fields[8].to_string(),
        });
    }
    players
}
