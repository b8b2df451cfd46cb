//! # Generals Replay Parser
//!
//! A parser library for Command & Conquer: Generals / Zero Hour replay
//! files (`.rep`).
//!
//! Given a replay byte stream and the static game-data tables parsed
//! from the game's INI files, the library produces a structured match
//! record: a typed header, the time-ordered command events with
//! store-resolved details (unit names, costs, power names), and a
//! per-player summary with faction, build tallies, money spent, and
//! win/loss.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use genrep_parser::replay::Replay;
//! use genrep_parser::stores::GameData;
//!
//! let data = GameData::load(Path::new("Data/INI")).unwrap();
//! let replay = Replay::from_file(Path::new("match.rep"), &data).unwrap();
//!
//! println!("Map: {}", replay.header.metadata.map_file);
//! for player in &replay.summary {
//!     println!(
//!         "{:<16} {:<16} spent {:>6}  {}",
//!         player.name,
//!         player.side,
//!         player.money_spent,
//!         if player.win { "WIN" } else { "LOSS" },
//!     );
//! }
//! ```
//!
//! ## Streaming
//!
//! A replay being written by a running game can be followed live with
//! [`streaming::stream_replay`]: the header is decoded eagerly and body
//! events arrive on a channel as the engine flushes them, deduplicated
//! by time code. See the [`streaming`] module docs for the termination
//! rules.
//!
//! ## Module Overview
//!
//! - [`error`] - Error types and result alias for parser operations
//! - [`binary`] - Low-level binary reading for little-endian data
//! - [`stores`] - Static game-data lookup tables (units, powers,
//!   upgrades, colors) and their INI loader
//! - [`header`] - Header and embedded-metadata parsing
//! - [`body`] - Event-stream decoding and detail attachment
//! - [`replay`] - The batch match record and its semantic pass
//! - [`streaming`] - Live decoding of a growing replay file
//!
//! ## Format Reference
//!
//! The replay format documentation is maintained in `FORMAT.md`
//! alongside this library. In short: a replay is a fixed header (see
//! [`header`]) followed by a flat sequence of variable-length event
//! records (see [`body`]) terminated by an all-zero record. All
//! multi-byte integers are little-endian; header strings are
//! null-terminated UTF-16LE except the metadata string, which is
//! UTF-8.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod binary;
pub mod body;
pub mod error;
pub mod header;
pub mod replay;
pub mod stores;
pub mod streaming;

// Re-export commonly used types at the crate root
pub use binary::{BitReader, Encoding};
pub use body::{ArgKind, ArgMetadata, ArgValue, BodyChunk, Detail, EventIterator, StatKind};
pub use error::{ParserError, Result};
pub use header::{Metadata, ReplayHeader, RosterPlayer};
pub use replay::{PlayerSummary, Replay};
pub use stores::GameData;
pub use streaming::{stream_replay, CancelToken, StreamOptions, StreamingReplay};
