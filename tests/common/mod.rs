//! Shared builders for the integration suites.
//!
//! Real replays are hundreds of kilobytes and carry no license to ship,
//! so these tests synthesize byte-exact miniature replays instead: a
//! header image built field by field, and event records appended with
//! the same wire layout the decoder consumes.

use std::path::{Path, PathBuf};

use genrep_parser::stores::GameData;

/// Path to the on-disk INI fixture tables.
#[must_use]
pub fn fixture_data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/inidata")
}

/// Loads the fixture tables.
///
/// Table layout (ids are wire ids):
/// - objects: 2 `AmericaVehicleDozer` (1000), 3 `AmericaTankCrusader`
///   (900), 4 `AirF_AmericaVehicleDozer` (1000), 5 `GLAInfantryWorker`
///   (200), 6 `GLAInfantryRebel` (150)
/// - powers: 2 `SuperweaponDaisyCutter`, 3 `SuperweaponParadropAmerica`,
///   4 `SuperweaponArtilleryBarrage`
/// - upgrades: 2270 `Upgrade_AmericaTOWMissile` (1200), 2271
///   `Upgrade_Nationalism` (2000), 2272 `Upgrade_GLAAPBullets` (750)
#[must_use]
pub fn fixture_game_data() -> GameData {
    GameData::load(&fixture_data_dir()).expect("fixture tables must load")
}

/// Incremental builder for replay byte images.
#[derive(Default)]
pub struct ReplayBuilder {
    bytes: Vec<u8>,
}

impl ReplayBuilder {
    /// Starts an empty image.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header whose metadata string carries the given roster
    /// (the value of the `S` key, without the trailing `;`).
    #[must_use]
    pub fn header_with_roster(mut self, roster: &str) -> Self {
        let metadata = format!("M=maps/test flats;SD=424242;SC=10000;S={roster};");
        self.bytes.extend_from_slice(b"GENREP");
        self.bytes.extend_from_slice(&1_649_910_603u32.to_le_bytes()); // begin
        self.bytes.extend_from_slice(&1_649_911_003u32.to_le_bytes()); // end
        self.bytes.extend_from_slice(&7u16.to_le_bytes()); // num_timestamps
        self.bytes.extend_from_slice(&[0u8; 12]); // filler
        push_utf16(&mut self.bytes, "Last Replay"); // file_name
        for field in [2022u16, 4, 4, 14, 5, 10, 3, 0] {
            self.bytes.extend_from_slice(&field.to_le_bytes()); // wall clock
        }
        push_utf16(&mut self.bytes, "Version 1.04"); // version
        push_utf16(&mut self.bytes, "Mar  7 2005"); // build_date
        self.bytes.extend_from_slice(&4u16.to_le_bytes()); // version_minor
        self.bytes.extend_from_slice(&1u16.to_le_bytes()); // version_major
        self.bytes.extend_from_slice(&[0xAA; 8]); // hash
        self.bytes.extend_from_slice(metadata.as_bytes());
        self.bytes.push(0); // metadata terminator
        self.bytes.extend_from_slice(&[0x30, 0x00]); // owner slot 0
        self.bytes.extend_from_slice(&[0u8; 4]); // unknown1
        self.bytes.extend_from_slice(&[0u8; 4]); // unknown2
        self.bytes.extend_from_slice(&[0u8; 4]); // unknown3
        self.bytes.extend_from_slice(&1u32.to_le_bytes()); // game_speed
        self
    }

    /// Appends an event with no arguments.
    #[must_use]
    pub fn event(self, time_code: u32, order_code: u32, player_id: u32) -> Self {
        self.event_with_args(time_code, order_code, player_id, &[], &[])
    }

    /// Appends an event with a single-u32 argument payload — the shape
    /// of CreateUnit / BuildObject / SpecialPower commands.
    #[must_use]
    pub fn event_with_id_arg(
        self,
        time_code: u32,
        order_code: u32,
        player_id: u32,
        id: u32,
    ) -> Self {
        self.event_with_args(time_code, order_code, player_id, &[(0, 1)], &id.to_le_bytes())
    }

    /// Appends an upgrade event: context id then upgrade id.
    #[must_use]
    pub fn upgrade_event(
        self,
        time_code: u32,
        player_id: u32,
        context: u32,
        upgrade_id: u32,
    ) -> Self {
        let mut payload = Vec::new();
        payload.extend_from_slice(&context.to_le_bytes());
        payload.extend_from_slice(&upgrade_id.to_le_bytes());
        self.event_with_args(time_code, 1045, player_id, &[(0, 2)], &payload)
    }

    /// Appends an event record with explicit descriptors and payload.
    #[must_use]
    pub fn event_with_args(
        mut self,
        time_code: u32,
        order_code: u32,
        player_id: u32,
        descriptors: &[(u8, u8)],
        payload: &[u8],
    ) -> Self {
        self.bytes.extend_from_slice(&time_code.to_le_bytes());
        self.bytes.extend_from_slice(&order_code.to_le_bytes());
        self.bytes.extend_from_slice(&player_id.to_le_bytes());
        self.bytes.push(u8::try_from(descriptors.len()).unwrap());
        for &(kind, count) in descriptors {
            self.bytes.push(kind);
            self.bytes.push(count);
        }
        self.bytes.extend_from_slice(payload);
        self
    }

    /// Appends the 13-byte zero-triple terminator.
    #[must_use]
    pub fn terminator(mut self) -> Self {
        self.bytes.extend_from_slice(&[0u8; 13]);
        self
    }

    /// Appends raw bytes verbatim.
    #[must_use]
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Finishes the image.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Appends a null-terminated UTF-16LE string.
fn push_utf16(bytes: &mut Vec<u8>, s: &str) {
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes.extend_from_slice(&[0, 0]);
}

/// A two-human roster on opposing teams, `Alice` (team 0 wire) and
/// `Bob` (team 1 wire). Wire ids in events start at 2.
pub const TWO_PLAYER_ROSTER: &str =
    "HAlice,17F04000,8088,FT,0,-1,-1,0,1:HBob,48595000,8088,FT,1,-1,-1,1,1:X:X:X:X:X:X";
