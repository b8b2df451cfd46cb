//! Incremental decoding of a replay file while the game is writing it.
//!
//! The engine flushes the replay to disk as the match runs, so a live
//! file alternates between growing and holding steady. [`stream_replay`]
//! decodes the header eagerly, then hands the open file to a background
//! thread that polls its length, decodes complete events out of each
//! growth delta, and emits them through a bounded channel.
//!
//! # Deduplication
//!
//! The engine occasionally rewrites earlier regions as it flushes, so a
//! delta can re-present events that were already seen. Emission is
//! gated on a strictly increasing time code: an event is sent only when
//! its `time_code` exceeds that of the last sent event. This also
//! suppresses zero-tick noise at the start of the file.
//!
//! # Partial records
//!
//! A flush can end mid-record. Strict decoding detects the short read,
//! the partial bytes stay un-consumed, and the next delta re-reads them
//! once the rest has arrived.
//!
//! # Termination
//!
//! The channel closes when any of these happens:
//! - an `EndReplay` event (order code 27) is emitted,
//! - no event has been emitted for `inactivity_timeout`,
//! - no event at all arrives within `max_wait` of starting,
//! - the caller cancels via [`CancelToken`],
//! - the receiver is dropped,
//! - the stream is corrupt or the file vanishes.
//!
//! Closing the channel also closes the file; cancellation takes effect
//! within one poll interval.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use genrep_parser::stores::GameData;
//! use genrep_parser::streaming::{stream_replay, CancelToken, StreamOptions};
//!
//! let data = Arc::new(GameData::load(Path::new("Data/INI")).unwrap());
//! let cancel = CancelToken::new();
//! let (live, events) =
//!     stream_replay(Path::new("live.rep"), data, StreamOptions::default(), cancel.clone())
//!         .unwrap();
//!
//! println!("Map: {}", live.header.metadata.map_file);
//! for event in events {
//!     println!("[{}] {} by player {}", event.time_code, event.order_name,
//!              event.player_id.saturating_sub(live.offset()));
//! }
//! ```

use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};
use log::{debug, warn};

use crate::binary::BitReader;
use crate::body::{commands, read_chunk_strict, BodyChunk};
use crate::error::{ParserError, Result};
use crate::header::ReplayHeader;
use crate::stores::GameData;

/// Tuning knobs for [`stream_replay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    /// Delay between file-length checks when no new data is available.
    pub poll_interval: Duration,

    /// Maximum time to wait for the *first* body event. A header with
    /// no body following it within this window closes the channel.
    pub max_wait: Duration,

    /// Capacity of the event channel. The worker blocks once the
    /// receiver falls this far behind.
    pub buffer_size: usize,

    /// Time without an emitted event before the channel closes
    /// normally.
    pub inactivity_timeout: Duration,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            max_wait: Duration::from_secs(30),
            buffer_size: 100,
            inactivity_timeout: Duration::from_secs(120),
        }
    }
}

/// Cooperative cancellation signal for a streaming session.
///
/// Clone it, hand one clone to [`stream_replay`], and call
/// [`CancelToken::cancel`] from any thread. The worker observes the
/// token at every poll, before every send, and while blocked on a full
/// channel.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a fresh, un-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns `true` once [`CancelToken::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Handle to a live streaming session.
///
/// Carries the eagerly-decoded header and the player-id offset, which
/// the worker refines whenever it observes a lower wire id.
#[derive(Debug)]
pub struct StreamingReplay {
    /// Header decoded before streaming began.
    pub header: ReplayHeader,

    offset: Arc<AtomicU32>,
}

impl StreamingReplay {
    /// The current wire-id offset. Starts at the human default of 2,
    /// then tracks the lowest wire id observed so far.
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.offset.load(Ordering::Acquire)
    }
}

/// Starts streaming a replay file that may still be written to.
///
/// Decodes the header synchronously, then spawns the polling worker.
/// Events arrive on the returned channel in time-code order.
///
/// # Errors
///
/// [`ParserError::Io`] when the file cannot be opened or the worker
/// thread cannot be spawned. Header decoding itself never fails; a
/// file too short even for the header yields a zeroed header and,
/// in all likelihood, a channel that closes on `max_wait`.
pub fn stream_replay(
    path: &Path,
    data: Arc<GameData>,
    options: StreamOptions,
    cancel: CancelToken,
) -> Result<(StreamingReplay, Receiver<BodyChunk>)> {
    let mut file = File::open(path).map_err(ParserError::Io)?;

    let mut reader = BitReader::new(&mut file);
    let header = ReplayHeader::parse(&mut reader);
    let body_start = file.stream_position().map_err(ParserError::Io)?;

    let offset = Arc::new(AtomicU32::new(2));
    let streaming = StreamingReplay {
        header,
        offset: Arc::clone(&offset),
    };

    let (sender, receiver) = bounded(options.buffer_size);
    let worker = Worker {
        file,
        data,
        sender,
        cancel,
        offset,
        options,
        read_pos: body_start,
    };
    thread::Builder::new()
        .name("genrep-stream".to_string())
        .spawn(move || worker.run())
        .map_err(ParserError::Io)?;

    Ok((streaming, receiver))
}

/// Why the worker stopped consuming a delta buffer.
enum DeltaEnd {
    /// Buffer exhausted, or a partial record at its tail.
    Drained,
    /// The zero-triple terminator was decoded.
    Terminator,
    /// An `EndReplay` event was emitted.
    EndReplay,
    /// Descriptor bounds were violated: the stream is corrupt.
    Corrupt,
    /// Cancelled, or the receiver went away.
    Stopped,
}

/// Background polling state. Owns the open file for the lifetime of
/// the stream.
struct Worker {
    file: File,
    data: Arc<GameData>,
    sender: Sender<BodyChunk>,
    cancel: CancelToken,
    offset: Arc<AtomicU32>,
    options: StreamOptions,
    read_pos: u64,
}

impl Worker {
    /// Main polling loop. Returning drops the sender (closing the
    /// channel) and the file.
    fn run(mut self) {
        let started = Instant::now();
        let mut last_activity = Instant::now();
        let mut last_time_code = 0u32;
        let mut lowest_player_id = crate::replay::OFFSET_SENTINEL;
        let mut emitted_any = false;

        loop {
            if self.cancel.is_cancelled() {
                return;
            }

            let file_len = match self.file.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    warn!("streaming stat failed: {e}");
                    return;
                }
            };

            if file_len > self.read_pos {
                let delta = match self.read_delta(file_len) {
                    Ok(delta) => delta,
                    Err(e) => {
                        warn!("streaming read failed: {e}");
                        return;
                    }
                };

                let (end, consumed) = self.drain_delta(
                    &delta,
                    &mut last_time_code,
                    &mut lowest_player_id,
                    &mut last_activity,
                    &mut emitted_any,
                );
                self.read_pos += consumed;

                match end {
                    DeltaEnd::Drained | DeltaEnd::Terminator => {}
                    DeltaEnd::EndReplay | DeltaEnd::Stopped => return,
                    DeltaEnd::Corrupt => {
                        warn!("streaming body corrupt, closing");
                        return;
                    }
                }
            } else if last_activity.elapsed() > self.options.inactivity_timeout {
                debug!("streaming inactivity timeout");
                return;
            }

            if !emitted_any && started.elapsed() > self.options.max_wait {
                debug!("no body events within max_wait");
                return;
            }

            thread::sleep(self.options.poll_interval);
        }
    }

    /// Reads the bytes between the cursor and the current file end.
    fn read_delta(&mut self, file_len: u64) -> Result<Vec<u8>> {
        self.file
            .seek(SeekFrom::Start(self.read_pos))
            .map_err(ParserError::Io)?;
        let mut delta = Vec::with_capacity((file_len - self.read_pos) as usize);
        (&mut self.file)
            .take(file_len - self.read_pos)
            .read_to_end(&mut delta)
            .map_err(ParserError::Io)?;
        Ok(delta)
    }

    /// Decodes and emits complete events from one delta buffer.
    ///
    /// Returns how the delta ended and how many of its bytes belong to
    /// fully-decoded records. Bytes past that stay on disk for the next
    /// delta.
    fn drain_delta(
        &self,
        delta: &[u8],
        last_time_code: &mut u32,
        lowest_player_id: &mut u32,
        last_activity: &mut Instant,
        emitted_any: &mut bool,
    ) -> (DeltaEnd, u64) {
        let mut cursor = Cursor::new(delta);
        let mut consumed = 0u64;

        loop {
            let mut reader = BitReader::new(&mut cursor);
            let chunk = match read_chunk_strict(&mut reader, &self.data) {
                Ok(Some(chunk)) => chunk,
                Ok(None) => {
                    // Terminator: its bytes are consumed, the stream
                    // just waits out the timeout (or a 27 already
                    // closed it).
                    consumed = cursor.position();
                    return (DeltaEnd::Terminator, consumed);
                }
                Err(e) if e.is_exhaustion() => {
                    // Partial record at the tail; re-read next delta.
                    return (DeltaEnd::Drained, consumed);
                }
                Err(e) => {
                    debug!("streaming decode error: {e}");
                    return (DeltaEnd::Corrupt, consumed);
                }
            };
            consumed = cursor.position();

            // Monotonic dedupe: rewritten regions re-present old events.
            if chunk.time_code <= *last_time_code {
                continue;
            }
            *last_time_code = chunk.time_code;

            if chunk.player_id < *lowest_player_id {
                *lowest_player_id = chunk.player_id;
                self.offset.store(chunk.player_id, Ordering::Release);
            }

            *last_activity = Instant::now();
            *emitted_any = true;

            let end_replay = chunk.order_code == commands::ORDER_END_REPLAY;
            if !self.send(chunk) {
                return (DeltaEnd::Stopped, consumed);
            }
            if end_replay {
                return (DeltaEnd::EndReplay, consumed);
            }

            if consumed as usize == delta.len() {
                return (DeltaEnd::Drained, consumed);
            }
        }
    }

    /// Sends one event, staying responsive to cancellation while the
    /// channel is full. Returns `false` when the stream should stop.
    fn send(&self, chunk: BodyChunk) -> bool {
        let mut pending = chunk;
        loop {
            if self.cancel.is_cancelled() {
                return false;
            }
            match self
                .sender
                .send_timeout(pending, self.options.poll_interval)
            {
                Ok(()) => return true,
                Err(SendTimeoutError::Timeout(chunk)) => pending = chunk,
                Err(SendTimeoutError::Disconnected(_)) => return false,
            }
        }
    }
}
