//! Line-based loader for the game's INI data tables.
//!
//! The INI dialect is simple enough that full INI parsing is overkill:
//! entries open with a keyword and a name on one line (`Object
//! AmericaVehicleDozer`), carry indented `Key = Value` lines, and close
//! with `End`. Only the keys the lookup tables need are extracted;
//! everything else is skipped. Values may carry trailing `;` comments.
//!
//! Entry order is preserved exactly as encountered — the on-wire id of
//! an entry is its position in the table plus the store's offset, so a
//! reordered table would mis-resolve every id.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{ParserError, Result};
use crate::stores::{ColorEntry, ObjectEntry, PowerEntry, Rgb, UpgradeEntry};

/// Opens a data file, mapping I/O failure to `MissingDataFile`.
fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| ParserError::MissingDataFile {
            path: path.to_path_buf(),
            source,
        })
}

/// Extracts the entry name from a block-opening line like
/// `Object AmericaVehicleDozer`.
fn block_name(line: &str, keyword: &str) -> Result<String> {
    let mut fields = line.split_whitespace();
    let _ = fields.next();
    fields
        .next()
        .map(str::to_string)
        .ok_or_else(|| ParserError::MalformedDataFile {
            reason: format!("could not get {keyword} name from line: {line}"),
        })
}

/// Parses a `BuildCost = 800 ; comment` value.
fn parse_cost(line: &str) -> Result<u32> {
    let value = line
        .split_once('=')
        .map(|(_, v)| v)
        .ok_or_else(|| ParserError::MalformedDataFile {
            reason: format!("cannot find cost value in line: {line}"),
        })?;
    let value = value.split(';').next().unwrap_or("").trim();
    value
        .parse::<u32>()
        .map_err(|_| ParserError::MalformedDataFile {
            reason: format!("cost is not a number: {line}"),
        })
}

/// Parses an `R:231 G:204 B:24` triple.
fn parse_rgb(line: &str) -> Result<Rgb> {
    let value = line
        .split_once('=')
        .map(|(_, v)| v)
        .ok_or_else(|| ParserError::MalformedDataFile {
            reason: format!("cannot find color value in line: {line}"),
        })?;

    let mut channels = [0u8; 3];
    let mut seen = 0;
    for field in value.split_whitespace() {
        let Some((channel, amount)) = field.split_once(':') else {
            continue;
        };
        let slot = match channel {
            "R" => 0,
            "G" => 1,
            "B" => 2,
            _ => continue,
        };
        channels[slot] = amount
            .parse::<u8>()
            .map_err(|_| ParserError::MalformedDataFile {
                reason: format!("color channel is not a byte: {line}"),
            })?;
        seen += 1;
    }

    if seen != 3 {
        return Err(ParserError::MalformedDataFile {
            reason: format!("expected R/G/B channels in line: {line}"),
        });
    }
    Ok(Rgb {
        r: channels[0],
        g: channels[1],
        b: channels[2],
    })
}

/// Returns the `Key = Value` string value after `=`, trimmed.
fn parse_value(line: &str) -> String {
    line.split_once('=')
        .map(|(_, v)| v.split(';').next().unwrap_or("").trim().to_string())
        .unwrap_or_default()
}

/// Parses one `Object`-keyed file into name/cost entries.
///
/// Exposed at module level so unit tests can feed it an in-memory
/// reader, mirroring the file-based loaders below.
pub(crate) fn parse_objects<R: BufRead>(reader: R) -> Result<Vec<ObjectEntry>> {
    let mut entries = Vec::new();
    let mut current: Option<ObjectEntry> = None;

    for line in reader.lines() {
        let line = line.map_err(ParserError::Io)?;
        if line.starts_with("Object ") {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
            current = Some(ObjectEntry {
                name: block_name(&line, "object")?,
                cost: 0,
            });
        } else if line.trim_start().starts_with("BuildCost") && line.contains('=') {
            let entry = current
                .as_mut()
                .ok_or_else(|| ParserError::MalformedDataFile {
                    reason: format!("BuildCost outside an Object block: {line}"),
                })?;
            entry.cost = parse_cost(&line)?;
        }
    }
    if let Some(entry) = current.take() {
        entries.push(entry);
    }
    Ok(entries)
}

/// Parses `SpecialPower`-keyed blocks into name entries.
pub(crate) fn parse_powers<R: BufRead>(reader: R) -> Result<Vec<PowerEntry>> {
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(ParserError::Io)?;
        if line.starts_with("SpecialPower ") {
            entries.push(PowerEntry {
                name: block_name(&line, "power")?,
            });
        }
    }
    Ok(entries)
}

/// Parses `Upgrade`-keyed blocks into name/cost entries.
pub(crate) fn parse_upgrades<R: BufRead>(reader: R) -> Result<Vec<UpgradeEntry>> {
    let mut entries = Vec::new();
    let mut current: Option<UpgradeEntry> = None;

    for line in reader.lines() {
        let line = line.map_err(ParserError::Io)?;
        if line.starts_with("Upgrade ") {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
            current = Some(UpgradeEntry {
                name: block_name(&line, "upgrade")?,
                cost: 0,
            });
        } else if line.trim_start().starts_with("BuildCost") && line.contains('=') {
            let entry = current
                .as_mut()
                .ok_or_else(|| ParserError::MalformedDataFile {
                    reason: format!("BuildCost outside an Upgrade block: {line}"),
                })?;
            entry.cost = parse_cost(&line)?;
        }
    }
    if let Some(entry) = current.take() {
        entries.push(entry);
    }
    Ok(entries)
}

/// Parses `MultiplayerColor`-keyed blocks.
pub(crate) fn parse_colors<R: BufRead>(reader: R) -> Result<Vec<ColorEntry>> {
    let mut entries = Vec::new();
    let mut current: Option<ColorEntry> = None;

    for line in reader.lines() {
        let line = line.map_err(ParserError::Io)?;
        let trimmed = line.trim_start();
        if line.starts_with("MultiplayerColor ") {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
            current = Some(ColorEntry {
                name: block_name(&line, "color")?,
                rgb: Rgb { r: 0, g: 0, b: 0 },
                night_rgb: Rgb { r: 0, g: 0, b: 0 },
                tooltip: String::new(),
            });
        } else if let Some(entry) = current.as_mut() {
            if trimmed.starts_with("RGBNightColor") {
                entry.night_rgb = parse_rgb(&line)?;
            } else if trimmed.starts_with("RGBColor") {
                entry.rgb = parse_rgb(&line)?;
            } else if trimmed.starts_with("TooltipName") {
                entry.tooltip = parse_value(&line);
            }
        }
    }
    if let Some(entry) = current.take() {
        entries.push(entry);
    }
    Ok(entries)
}

/// Loads every `*.ini` under `<data>/Object/` into one ordered table.
pub(crate) fn load_objects(data_dir: &Path) -> Result<Vec<ObjectEntry>> {
    let dir = data_dir.join("Object");
    let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)
        .map_err(|source| ParserError::MissingDataFile {
            path: dir.clone(),
            source,
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "ini"))
        .collect();
    // read_dir order is platform-dependent; ids must not be.
    files.sort();

    let mut entries = Vec::new();
    for path in files {
        entries.extend(parse_objects(open(&path)?)?);
    }
    Ok(entries)
}

/// Loads `<data>/SpecialPower.ini`.
pub(crate) fn load_powers(data_dir: &Path) -> Result<Vec<PowerEntry>> {
    parse_powers(open(&data_dir.join("SpecialPower.ini"))?)
}

/// Loads `<data>/Upgrade.ini`.
pub(crate) fn load_upgrades(data_dir: &Path) -> Result<Vec<UpgradeEntry>> {
    parse_upgrades(open(&data_dir.join("Upgrade.ini"))?)
}

/// Loads `<data>/multiplayer.ini`.
pub(crate) fn load_colors(data_dir: &Path) -> Result<Vec<ColorEntry>> {
    parse_colors(open(&data_dir.join("multiplayer.ini"))?)
}
