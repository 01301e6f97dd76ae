//! ISO base media file format handling.
//!
//! This module provides the box-level pieces of the remuxer: header
//! decoding, the type dispatch table, the track locator and the streaming
//! rewriter.

mod atoms;
mod chunk_offsets;
mod dispatch;
mod header;
mod locate;
mod rewrite;

#[cfg(test)]
pub(crate) mod testutil;

pub use atoms::AtomType;
pub use chunk_offsets::patch_chunk_offsets;
pub use dispatch::{Handler, AUDIO_SAMPLE_ENTRY_PREFIX, VISUAL_SAMPLE_ENTRY_PREFIX};
pub use header::{BoxHeader, SizeField, EXTENDED_HEADER_LEN, HEADER_LEN};
pub use locate::{locate, TrackLocation, DEFAULT_MAX_MOOV_SIZE};
pub use rewrite::{RewritePlan, RewriteSummary, Rewriter, UnknownBoxPolicy};
