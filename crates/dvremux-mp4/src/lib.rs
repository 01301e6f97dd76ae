//! dvremux-mp4: Dolby Vision configuration box insertion for MP4 files
//!
//! This crate rewrites an ISO base media file so that its first AVC or HEVC
//! track carries a Dolby Vision decoder configuration record, without
//! touching any media data.
//!
//! # Modules
//!
//! - `io` - Positioned byte streams with big-endian helpers
//! - `mp4` - Box headers, dispatch table, track locator and rewriter
//! - `dovi` - The 32-byte `dvcC`/`dvvC`/`dvwC` record
//! - `remuxer` - Locate then rewrite, file and stream entry points
//!
//! # Architecture
//!
//! A remux runs in two passes over the input:
//!
//! 1. The locator reads `moov` once and picks the first track whose sample
//!    description holds an `avc1`/`avc3`/`hvc1`/`hev1` entry
//! 2. The rewriter streams every box to the output, growing `moov` and the
//!    target track's ancestors by 32 bytes, shifting `stco`/`co64` entries
//!    when media data follows `moov`, and appending the record after the
//!    target's `avcC`/`hvcC`
//!
//! Media data is copied in fixed-size blocks, so memory use is bounded by the
//! size of `moov`.

pub mod dovi;
pub mod error;
pub mod io;
pub mod mp4;
pub mod remuxer;

pub use dovi::DoviConfig;
pub use error::{Error, Result};
pub use mp4::{AtomType, RewriteSummary, TrackLocation, UnknownBoxPolicy};
pub use remuxer::{remux_file, ByteRange, RemuxOptions, Remuxer};
