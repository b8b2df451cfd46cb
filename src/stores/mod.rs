//! Static game-data lookup tables.
//!
//! Decoded events reference units, buildings, upgrades, and special
//! powers by numeric id. Those ids index into tables extracted from the
//! game's INI data files, shifted by a fixed per-table wire offset:
//!
//! | Store | Wire offset | Source |
//! |-------|-------------|--------|
//! | [`ObjectStore`] | 2 | every `*.ini` under `<data>/Object/` |
//! | [`PowerStore`] | 2 | `<data>/SpecialPower.ini` |
//! | [`UpgradeStore`] | 2270 | `<data>/Upgrade.ini` |
//! | [`ColorStore`] | 0 | `<data>/multiplayer.ini` |
//!
//! The upgrade offset is empirical: upgrades appear to share the object
//! id space and usually start at 2270. Ids below it are rejected rather
//! than re-tuned.
//!
//! All stores are immutable after construction and can be shared freely
//! across threads. Construction failures are fatal
//! ([`crate::error::ParserError::MissingDataFile`] /
//! [`crate::error::ParserError::MalformedDataFile`]); lookup failures
//! during decoding are recoverable and leave the event without enriched
//! details.

pub mod ini;

use std::path::Path;

use serde::Serialize;

use crate::error::{ParserError, Result};

/// Wire offset for unit/building object ids.
pub const OBJECT_ID_OFFSET: u32 = 2;

/// Wire offset for special-power ids.
pub const POWER_ID_OFFSET: u32 = 2;

/// Wire offset for upgrade ids.
///
/// Upgrades seem to be appended to the object listing; this is where
/// they usually start.
pub const UPGRADE_ID_OFFSET: u32 = 2270;

/// Wire offset for multiplayer color ids.
pub const COLOR_ID_OFFSET: u32 = 0;

/// A unit or building entry: name and build cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectEntry {
    /// INI object name, e.g. `AmericaVehicleDozer`.
    pub name: String,
    /// Build cost in credits; 0 when the INI block has none.
    pub cost: u32,
}

/// A special-power entry. Powers have no cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PowerEntry {
    /// INI power name, e.g. `SuperweaponDaisyCutter`.
    pub name: String,
}

/// An upgrade entry: name and research cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeEntry {
    /// INI upgrade name, e.g. `Upgrade_AmericaTOWMissile`.
    pub name: String,
    /// Research cost in credits; 0 when the INI block has none.
    pub cost: u32,
}

/// An RGB triple from `multiplayer.ini`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    /// Red channel, 0-255.
    pub r: u8,
    /// Green channel, 0-255.
    pub g: u8,
    /// Blue channel, 0-255.
    pub b: u8,
}

/// A multiplayer color entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorEntry {
    /// INI color name, e.g. `Color0`.
    pub name: String,
    /// Day palette color.
    pub rgb: Rgb,
    /// Night palette color.
    pub night_rgb: Rgb,
    /// Tooltip label key, e.g. `Color:Gold`.
    pub tooltip: String,
}

/// Resolves `id - offset` against a table, with the two failure modes
/// every store shares.
fn lookup<T>(entries: &[T], id: u32, offset: u32) -> Result<&T> {
    if id < offset {
        return Err(ParserError::LookupBelowMinimum { id, offset });
    }
    entries
        .get((id - offset) as usize)
        .ok_or(ParserError::LookupOutOfRange {
            id,
            offset,
            len: entries.len(),
        })
}

/// Lookup table for units and buildings.
///
/// Built from every `*.ini` file under `<data>/Object/`, in directory
/// order. Entry order matters: the on-wire id is the entry's position
/// plus [`OBJECT_ID_OFFSET`].
#[derive(Debug, Clone)]
pub struct ObjectStore {
    entries: Vec<ObjectEntry>,
}

impl ObjectStore {
    /// Loads the object table from `<data>/Object/*.ini`.
    ///
    /// # Errors
    ///
    /// - [`ParserError::MissingDataFile`] if the directory or a file in
    ///   it cannot be read
    /// - [`ParserError::MalformedDataFile`] if an entry is unparseable
    pub fn load(data_dir: &Path) -> Result<Self> {
        Ok(Self {
            entries: ini::load_objects(data_dir)?,
        })
    }

    /// Creates a store from pre-built entries. Useful for tests and for
    /// callers with their own table source.
    #[must_use]
    pub fn from_entries(entries: Vec<ObjectEntry>) -> Self {
        Self { entries }
    }

    /// Looks up an on-wire object id.
    ///
    /// # Errors
    ///
    /// [`ParserError::LookupBelowMinimum`] or
    /// [`ParserError::LookupOutOfRange`] when the id does not map into
    /// the table.
    pub fn get(&self, id: u32) -> Result<&ObjectEntry> {
        lookup(&self.entries, id, OBJECT_ID_OFFSET)
    }

    /// Number of entries in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lookup table for special powers.
#[derive(Debug, Clone)]
pub struct PowerStore {
    entries: Vec<PowerEntry>,
}

impl PowerStore {
    /// Loads the power table from `<data>/SpecialPower.ini`.
    ///
    /// # Errors
    ///
    /// [`ParserError::MissingDataFile`] /
    /// [`ParserError::MalformedDataFile`] on unreadable or unparseable
    /// input.
    pub fn load(data_dir: &Path) -> Result<Self> {
        Ok(Self {
            entries: ini::load_powers(data_dir)?,
        })
    }

    /// Creates a store from pre-built entries.
    #[must_use]
    pub fn from_entries(entries: Vec<PowerEntry>) -> Self {
        Self { entries }
    }

    /// Looks up an on-wire power id.
    ///
    /// # Errors
    ///
    /// [`ParserError::LookupBelowMinimum`] or
    /// [`ParserError::LookupOutOfRange`].
    pub fn get(&self, id: u32) -> Result<&PowerEntry> {
        lookup(&self.entries, id, POWER_ID_OFFSET)
    }

    /// Number of entries in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lookup table for upgrades.
#[derive(Debug, Clone)]
pub struct UpgradeStore {
    entries: Vec<UpgradeEntry>,
}

impl UpgradeStore {
    /// Loads the upgrade table from `<data>/Upgrade.ini`.
    ///
    /// # Errors
    ///
    /// [`ParserError::MissingDataFile`] /
    /// [`ParserError::MalformedDataFile`] on unreadable or unparseable
    /// input.
    pub fn load(data_dir: &Path) -> Result<Self> {
        Ok(Self {
            entries: ini::load_upgrades(data_dir)?,
        })
    }

    /// Creates a store from pre-built entries.
    #[must_use]
    pub fn from_entries(entries: Vec<UpgradeEntry>) -> Self {
        Self { entries }
    }

    /// Looks up an on-wire upgrade id.
    ///
    /// # Errors
    ///
    /// [`ParserError::LookupBelowMinimum`] or
    /// [`ParserError::LookupOutOfRange`]. Callers attaching event
    /// details map either failure to the `"dummy"` placeholder.
    pub fn get(&self, id: u32) -> Result<&UpgradeEntry> {
        lookup(&self.entries, id, UPGRADE_ID_OFFSET)
    }

    /// Number of entries in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lookup table for multiplayer colors.
#[derive(Debug, Clone)]
pub struct ColorStore {
    entries: Vec<ColorEntry>,
}

impl ColorStore {
    /// Loads the color table from `<data>/multiplayer.ini`.
    ///
    /// # Errors
    ///
    /// [`ParserError::MissingDataFile`] /
    /// [`ParserError::MalformedDataFile`] on unreadable or unparseable
    /// input.
    pub fn load(data_dir: &Path) -> Result<Self> {
        Ok(Self {
            entries: ini::load_colors(data_dir)?,
        })
    }

    /// Creates a store from pre-built entries.
    #[must_use]
    pub fn from_entries(entries: Vec<ColorEntry>) -> Self {
        Self { entries }
    }

    /// Looks up a color by roster color index.
    ///
    /// # Errors
    ///
    /// [`ParserError::LookupOutOfRange`] when the index is past the end
    /// of the table.
    pub fn get(&self, id: u32) -> Result<&ColorEntry> {
        lookup(&self.entries, id, COLOR_ID_OFFSET)
    }

    /// Number of entries in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The full set of tables a decode call needs, loaded together.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use genrep_parser::stores::GameData;
///
/// let data = GameData::load(Path::new("Data/INI")).unwrap();
/// println!("{} objects, {} upgrades", data.objects.len(), data.upgrades.len());
/// ```
#[derive(Debug, Clone)]
pub struct GameData {
    /// Units and buildings.
    pub objects: ObjectStore,
    /// Special powers.
    pub powers: PowerStore,
    /// Upgrades.
    pub upgrades: UpgradeStore,
    /// Multiplayer colors.
    pub colors: ColorStore,
}

impl GameData {
    /// Loads all four tables from a `Data/INI` directory.
    ///
    /// # Errors
    ///
    /// The first store-construction failure is returned; there is no
    /// point decoding with a partial table set.
    pub fn load(data_dir: &Path) -> Result<Self> {
        Ok(Self {
            objects: ObjectStore::load(data_dir)?,
            powers: PowerStore::load(data_dir)?,
            upgrades: UpgradeStore::load(data_dir)?,
            colors: ColorStore::load(data_dir)?,
        })
    }
}
