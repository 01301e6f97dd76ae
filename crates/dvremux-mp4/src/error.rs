//! Error types for dvremux-mp4.

use crate::mp4::AtomType;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for dvremux-mp4 operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for dvremux-mp4 operations.
///
/// Every variant is terminal for the operation that produced it; the
/// remuxer never returns a partial result.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred (open, read, write, or a short read).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The box tree is inconsistent with its own declared sizes.
    #[error("Corrupt MP4: {0}")]
    Corrupt(String),

    /// Structure the remuxer refuses to rewrite.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Missing required atom in MP4 file.
    #[error("Missing required atom: {0}")]
    MissingAtom(&'static str),

    /// No track under `moov` carries an avc1/avc3/hvc1/hev1 sample entry.
    #[error("No track with an AVC or HEVC sample entry was found")]
    NoEligibleTrack,

    /// The target sample entry already carries a Dolby Vision configuration box.
    #[error("Track {track_index} already has a {existing} box")]
    DoviConfigPresent { track_index: u32, existing: AtomType },

    /// `rewrite` was called before a successful `locate_insertion_track`.
    #[error("Insertion track has not been located")]
    NotLocated,

    /// The rewrite finished without inserting exactly one configuration box.
    #[error("Expected exactly one configuration box insertion, made {inserted}")]
    InsertionMismatch { inserted: u32 },

    /// A 32-bit chunk offset cannot absorb the inserted bytes.
    #[error("Chunk offset {offset} overflows stco after shifting by {shift}")]
    ChunkOffsetOverflow { offset: u32, shift: u32 },

    /// The movie box is larger than the configured scan buffer.
    #[error("moov content of {size} bytes exceeds maximum {max}")]
    MoovTooLarge { size: u64, max: u64 },

    /// The destination path names the input file.
    #[error("Output {0:?} is the input file")]
    OutputIsInput(PathBuf),

    /// Dolby Vision configuration value out of range.
    #[error("Invalid Dolby Vision configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a corruption error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }

    /// Create an unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether the error came from the byte streams rather than the box tree.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
