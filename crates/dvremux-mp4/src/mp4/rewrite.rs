//! Streaming box rewriter.
//!
//! A single forward pass over the input. Every box header is re-emitted,
//! grown by the configuration box size when the box is `moov` or an ancestor
//! of the target sample entry. Content is copied in [`IO_BLOCK`] chunks
//! except where the dispatch table says otherwise: chunk offset tables are
//! patched and the configuration box is written right after the target
//! track's `avcC` / `hvcC`.
//!
//! [`IO_BLOCK`]: crate::io::IO_BLOCK

use super::chunk_offsets::patch_chunk_offsets;
use super::{AtomType, BoxHeader, Handler, HEADER_LEN};
use crate::dovi::DoviConfig;
use crate::io::{Sink, Source};
use crate::{Error, Result};
use std::io::{Read, Seek, Write};

/// QuickTime sound sample description version 1 carries 16 more bytes.
const AUDIO_V1_EXTENSION: u64 = 16;
/// QuickTime sound sample description version 2 carries 36 more bytes.
const AUDIO_V2_EXTENSION: u64 = 36;

/// What to do with a box type missing from the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "lowercase"))]
pub enum UnknownBoxPolicy {
    /// Copy the box unchanged.
    #[default]
    Copy,
    /// Emit the header and drop the content, as the Android remuxer did. The
    /// output is only well formed when no unknown boxes are present.
    Skip,
}

/// Inputs of a rewrite pass, fixed before the pass starts.
#[derive(Debug, Clone, Copy)]
pub struct RewritePlan {
    /// Zero-based ordinal of the track that receives the box.
    pub target_track: u32,
    /// Skip shifting chunk offsets: media data sits before `moov`.
    pub mdat_first: bool,
    /// Configuration to insert.
    pub config: DoviConfig,
    /// Fallback for unlisted box types.
    pub unknown_boxes: UnknownBoxPolicy,
}

/// Outcome of a completed rewrite pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteSummary {
    /// Configuration boxes written.
    pub inserted: u32,
    /// Number of `trak` boxes seen.
    pub tracks: u32,
    /// Bytes written to the output.
    pub bytes_written: u64,
}

/// Mutable state threaded through the recursive walk.
#[derive(Debug)]
struct RewriteContext {
    plan: RewritePlan,
    dovi_box: [u8; DoviConfig::BOX_SIZE as usize],
    /// Ordinal of the most recent `trak`, `None` before the first one.
    current_track: Option<u32>,
    /// Version of the enclosing `stsd`. QuickTime sound descriptions only
    /// appear under version 0.
    stsd_version: u8,
    inserted: u32,
}

impl RewriteContext {
    fn new(plan: RewritePlan) -> Self {
        Self {
            dovi_box: plan.config.to_box(),
            plan,
            current_track: None,
            stsd_version: 0,
            inserted: 0,
        }
    }

    fn in_target_track(&self) -> bool {
        self.current_track == Some(self.plan.target_track)
    }

    /// Size increase applied to a box of this type.
    fn delta_for(&self, atom_type: AtomType) -> u64 {
        let grows = atom_type == AtomType::MOOV
            || (atom_type.is_track_ancestor() && self.in_target_track());
        if grows {
            DoviConfig::BOX_SIZE as u64
        } else {
            0
        }
    }

    fn chunk_offset_shift(&self) -> u32 {
        if self.plan.mdat_first {
            0
        } else {
            DoviConfig::BOX_SIZE
        }
    }
}

/// Rewrites one container from `src` into `dst`.
pub struct Rewriter<'a, R, W> {
    src: &'a mut Source<R>,
    dst: &'a mut Sink<W>,
    ctx: RewriteContext,
}

impl<'a, R: Read + Seek, W: Write> Rewriter<'a, R, W> {
    pub fn new(src: &'a mut Source<R>, dst: &'a mut Sink<W>, plan: RewritePlan) -> Self {
        Self {
            src,
            dst,
            ctx: RewriteContext::new(plan),
        }
    }

    /// Rewrite `container_len` bytes starting at the current source position.
    ///
    /// Fails with [`Error::InsertionMismatch`] unless exactly one
    /// configuration box was written.
    pub fn run(mut self, container_len: u64) -> Result<RewriteSummary> {
        let start = self.dst.written();
        self.rewrite_children(container_len)?;

        let inserted = self.ctx.inserted;
        if inserted != 1 {
            return Err(Error::InsertionMismatch { inserted });
        }

        Ok(RewriteSummary {
            inserted,
            tracks: self.ctx.current_track.map_or(0, |i| i + 1),
            bytes_written: self.dst.written() - start,
        })
    }

    fn rewrite_children(&mut self, content_len: u64) -> Result<()> {
        let mut remaining = content_len;
        while remaining > 0 {
            if remaining < HEADER_LEN {
                // e.g. the 32-bit zero terminator some writers put in udta
                tracing::trace!(bytes = remaining, "copying trailing container bytes");
                self.src.copy_to(self.dst, remaining)?;
                break;
            }
            let header = BoxHeader::read(self.src, remaining)?;
            remaining -= header.extent();
            self.rewrite_box(&header)?;
        }
        Ok(())
    }

    fn rewrite_box(&mut self, header: &BoxHeader) -> Result<()> {
        let atom_type = header.atom_type;
        if atom_type == AtomType::TRAK {
            self.ctx.current_track = Some(self.ctx.current_track.map_or(0, |i| i + 1));
        }
        let delta = self.ctx.delta_for(atom_type);

        tracing::trace!(
            atom = %atom_type,
            size = header.extent(),
            delta,
            track = ?self.ctx.current_track,
            "rewriting box"
        );

        let handler = match Handler::for_type(atom_type) {
            Some(handler) => handler,
            None => return self.unknown_box(header),
        };

        match handler {
            Handler::SampleDescription => self.rewrite_sample_description(header, delta),
            Handler::Passthrough => {
                header.write_inflated(self.dst, delta)?;
                self.src.copy_to(self.dst, header.content_len)?;
                Ok(())
            }
            Handler::Recurse => {
                header.write_inflated(self.dst, delta)?;
                self.rewrite_children(header.content_len)
            }
            Handler::SampleEntry { prefix, audio } => {
                header.write_inflated(self.dst, delta)?;
                self.rewrite_sample_entry(header, prefix, audio)
            }
            Handler::ChunkOffsets { wide } => {
                header.write_inflated(self.dst, delta)?;
                let shift = self.ctx.chunk_offset_shift();
                let consumed = patch_chunk_offsets(self.src, self.dst, header, wide, shift)?;
                if consumed < header.content_len {
                    let rest = header.content_len - consumed;
                    tracing::trace!(atom = %atom_type, bytes = rest, "copying unparsed box tail");
                    self.src.copy_to(self.dst, rest)?;
                }
                Ok(())
            }
            Handler::InsertDoviConfig => {
                header.write_inflated(self.dst, delta)?;
                self.src.copy_to(self.dst, header.content_len)?;
                if self.ctx.in_target_track() {
                    self.dst.write_all(&self.ctx.dovi_box)?;
                    self.ctx.inserted += 1;
                    tracing::debug!(
                        after = %atom_type,
                        config = %self.ctx.plan.config.box_type(),
                        track = self.ctx.plan.target_track,
                        "inserted Dolby Vision configuration box"
                    );
                }
                Ok(())
            }
        }
    }

    fn unknown_box(&mut self, header: &BoxHeader) -> Result<()> {
        match self.ctx.plan.unknown_boxes {
            UnknownBoxPolicy::Copy => {
                tracing::debug!(atom = %header.atom_type, size = header.extent(), "copying unknown box");
                header.write_inflated(self.dst, 0)?;
                self.src.copy_to(self.dst, header.content_len)?;
            }
            UnknownBoxPolicy::Skip => {
                tracing::warn!(atom = %header.atom_type, size = header.extent(), "dropping unknown box content");
                header.write_inflated(self.dst, 0)?;
                self.src.skip(header.content_len)?;
            }
        }
        Ok(())
    }

    /// `stsd`: the entry count is checked before anything is written.
    fn rewrite_sample_description(&mut self, header: &BoxHeader, delta: u64) -> Result<()> {
        if header.content_len < 8 {
            return Err(Error::corrupt(format!(
                "stsd content of {} bytes is shorter than its header",
                header.content_len
            )));
        }
        let version_flags = self.src.read_u32()?;
        let entry_count = self.src.read_u32()?;
        if entry_count != 1 {
            return Err(Error::unsupported(format!(
                "stsd with {} sample entries",
                entry_count
            )));
        }

        self.ctx.stsd_version = (version_flags >> 24) as u8;

        header.write_inflated(self.dst, delta)?;
        self.dst.write_u32(version_flags)?;
        self.dst.write_u32(entry_count)?;
        self.rewrite_children(header.content_len - 8)
    }

    fn rewrite_sample_entry(&mut self, header: &BoxHeader, prefix: u64, audio: bool) -> Result<()> {
        let too_short = |len: u64| {
            Error::corrupt(format!(
                "{} content of {} bytes is shorter than its {} fixed bytes",
                header.atom_type, header.content_len, len
            ))
        };
        if header.content_len < prefix {
            return Err(too_short(prefix));
        }

        let mut fixed = vec![0u8; prefix as usize];
        self.src.read_exact(&mut fixed)?;
        self.dst.write_all(&fixed)?;

        let mut fixed_len = prefix;
        if audio && self.ctx.stsd_version == 0 {
            // Sound description version sits right after the 8-byte
            // SampleEntry header fields. Under a version 1 stsd the same
            // field marks an ISO AudioSampleEntryV1, which has no extension.
            let version = u16::from_be_bytes([fixed[8], fixed[9]]);
            let extension = match version {
                1 => AUDIO_V1_EXTENSION,
                2 => AUDIO_V2_EXTENSION,
                _ => 0,
            };
            if extension > 0 {
                fixed_len += extension;
                if header.content_len < fixed_len {
                    return Err(too_short(fixed_len));
                }
                self.src.copy_to(self.dst, extension)?;
            }
        }

        self.rewrite_children(header.content_len - fixed_len)
    }
}
