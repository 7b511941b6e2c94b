//! Playback queue cursor
//!
//! The queue is the full catalog in catalog order with a cursor over it.
//! The cursor only moves on explicit select/next/previous/reset; refreshing
//! the track list never moves it. Navigation at either end is a no-op,
//! reported as unavailable rather than wrapping.

use crate::error::{Error, Result};
use miliki_common::db::NftRecord;

/// Outcome of a next/previous request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The cursor moved to an adjacent track
    Moved,
    /// Nothing to move to: empty queue, no selection, or at a boundary
    Unavailable,
}

/// Cursor state machine over the catalog track list
#[derive(Debug, Default)]
pub struct PlayerQueue {
    tracks: Vec<NftRecord>,
    cursor: Option<usize>,
}

impl PlayerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the track list without touching the cursor.
    ///
    /// A cursor pointing past the end of a shorter list is kept as-is;
    /// it simply has no current track until the user selects again.
    pub fn set_tracks(&mut self, tracks: Vec<NftRecord>) {
        self.tracks = tracks;
    }

    pub fn tracks(&self) -> &[NftRecord] {
        &self.tracks
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The track under the cursor, or None when there is no selection or
    /// the cursor points past the end of the current list
    pub fn current(&self) -> Option<&NftRecord> {
        self.cursor.and_then(|i| self.tracks.get(i))
    }

    /// Place the cursor on an explicit index
    pub fn select(&mut self, index: usize) -> Result<()> {
        if index >= self.tracks.len() {
            return Err(Error::BadRequest(format!(
                "Track index {} is out of range (queue has {} tracks)",
                index,
                self.tracks.len()
            )));
        }
        self.cursor = Some(index);
        Ok(())
    }

    /// Advance to the following track. At the last track, or with no
    /// selection, the cursor stays put.
    pub fn next(&mut self) -> Navigation {
        match self.cursor {
            Some(i) if i + 1 < self.tracks.len() => {
                self.cursor = Some(i + 1);
                Navigation::Moved
            }
            _ => Navigation::Unavailable,
        }
    }

    /// Step back to the preceding track. At the first track, or with no
    /// selection, the cursor stays put.
    pub fn previous(&mut self) -> Navigation {
        match self.cursor {
            Some(i) if i > 0 && i < self.tracks.len() => {
                self.cursor = Some(i - 1);
                Navigation::Moved
            }
            _ => Navigation::Unavailable,
        }
    }

    /// Clear the selection
    pub fn reset(&mut self) {
        self.cursor = None;
    }
}
