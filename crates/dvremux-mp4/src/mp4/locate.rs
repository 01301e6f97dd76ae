//! Track locator: finds the track that receives the configuration box.
//!
//! The locator runs before any output is written. It loads the content of
//! `moov` into memory once and walks it as a flat sequence of box headers,
//! descending only along `trak → mdia → minf → stbl → stsd`. The first
//! track whose sample description holds an AVC or HEVC sample entry wins.
//! Knowing the target up front lets the rewriter grow every ancestor in a
//! single forward pass.

use super::{AtomType, BoxHeader, VISUAL_SAMPLE_ENTRY_PREFIX};
use crate::dovi::DoviConfig;
use crate::io::Source;
use crate::{Error, Result};
use std::io::{Read, Seek};

/// Default cap on the `moov` content the locator buffers.
pub const DEFAULT_MAX_MOOV_SIZE: u64 = 256 * 1024 * 1024;

/// Ancestor types walked from a track down to its sample entries.
const TRACK_PATH: [AtomType; 5] = [
    AtomType::TRAK,
    AtomType::MDIA,
    AtomType::MINF,
    AtomType::STBL,
    AtomType::STSD,
];

/// version/flags and entry_count of `stsd`.
const STSD_PREFIX: usize = 8;

/// Where the configuration box goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct TrackLocation {
    /// Zero-based ordinal of the target `trak` within `moov`.
    pub track_index: u32,
    /// The matched sample entry type (avc1/avc3/hvc1/hev1).
    pub sample_entry: AtomType,
    /// `mdat` appears before `moov`, so chunk offsets are not shifted.
    pub mdat_first: bool,
    /// `moov` contains `mvex`: the file is fragmented.
    pub fragmented: bool,
    /// Dolby Vision configuration box already inside the sample entry.
    pub existing_dovi: Option<AtomType>,
    /// Decoded contents of `existing_dovi`, when the record is readable.
    pub existing_config: Option<DoviConfig>,
}

/// Locate the insertion track in a container starting at the current
/// position of `src` and spanning `container_len` bytes.
pub fn locate<R: Read + Seek>(
    src: &mut Source<R>,
    container_len: u64,
    max_moov_size: u64,
) -> Result<TrackLocation> {
    let (moov, mdat_first) = load_moov(src, container_len, max_moov_size)?;
    let mut location = scan_moov(&moov)?;
    location.mdat_first = mdat_first;

    tracing::debug!(
        track = location.track_index,
        entry = %location.sample_entry,
        mdat_first = location.mdat_first,
        "located insertion track"
    );
    Ok(location)
}

/// Scan top-level boxes up to `moov` and read its content.
fn load_moov<R: Read + Seek>(
    src: &mut Source<R>,
    container_len: u64,
    max_moov_size: u64,
) -> Result<(Vec<u8>, bool)> {
    let mut remaining = container_len;
    let mut mdat_first = false;

    while remaining >= super::HEADER_LEN {
        let header = BoxHeader::read(src, remaining)?;
        remaining -= header.extent();

        if header.atom_type == AtomType::MDAT {
            mdat_first = true;
        }

        if header.atom_type == AtomType::MOOV {
            if header.content_len > max_moov_size {
                return Err(Error::MoovTooLarge {
                    size: header.content_len,
                    max: max_moov_size,
                });
            }
            let mut moov = vec![0u8; header.content_len as usize];
            src.read_exact(&mut moov)?;
            return Ok((moov, mdat_first));
        }

        tracing::trace!(atom = %header.atom_type, size = header.extent(), "skipping top-level box");
        src.skip(header.content_len)?;
    }

    Err(Error::MissingAtom("moov"))
}

/// Walk the flattened `moov` content.
pub(crate) fn scan_moov(moov: &[u8]) -> Result<TrackLocation> {
    let fragmented = has_child(moov, AtomType::MVEX)?;

    let mut pos = 0usize;
    let mut state = 0usize;
    let mut track: Option<u32> = None;

    while moov.len() - pos >= super::HEADER_LEN as usize {
        let header = BoxHeader::parse(&moov[pos..])?;
        let atom_type = header.atom_type;
        let header_len = header.header_len() as usize;

        if let Some(track_index) = track {
            if atom_type.is_video_sample_entry() {
                let entry = &moov[pos..pos + header.extent() as usize];
                let existing = find_dovi_config(entry, header_len)?;
                return Ok(TrackLocation {
                    track_index,
                    sample_entry: atom_type,
                    mdat_first: false,
                    fragmented,
                    existing_dovi: existing.map(|(atom_type, _)| atom_type),
                    existing_config: existing.and_then(|(_, config)| config),
                });
            }
        }

        if atom_type == AtomType::TRAK {
            // A new track restarts the walk even if the previous one ended
            // before reaching its sample description.
            track = Some(track.map_or(0, |i| i + 1));
            state = 1;
            pos += header_len;
            continue;
        }

        if state > 0 && atom_type == TRACK_PATH[state] {
            pos += header_len;
            if atom_type == AtomType::STSD {
                if header.content_len < STSD_PREFIX as u64 {
                    return Err(Error::corrupt(format!(
                        "stsd content of {} bytes is shorter than its header",
                        header.content_len
                    )));
                }
                pos += STSD_PREFIX;
                state = 0;
            } else {
                state += 1;
            }
            continue;
        }

        pos += header.extent() as usize;
    }

    Err(Error::NoEligibleTrack)
}

/// Whether the direct children of `content` include `target`.
fn has_child(content: &[u8], target: AtomType) -> Result<bool> {
    let mut pos = 0usize;
    while content.len() - pos >= super::HEADER_LEN as usize {
        let header = BoxHeader::parse(&content[pos..])?;
        if header.atom_type == target {
            return Ok(true);
        }
        pos += header.extent() as usize;
    }
    Ok(false)
}

/// Look for an existing Dolby Vision box among a sample entry's children and
/// decode its record if it is well formed.
fn find_dovi_config(
    entry: &[u8],
    header_len: usize,
) -> Result<Option<(AtomType, Option<DoviConfig>)>> {
    let children_start = header_len + VISUAL_SAMPLE_ENTRY_PREFIX as usize;
    if entry.len() < children_start {
        return Err(Error::corrupt(format!(
            "video sample entry of {} bytes is shorter than its fixed fields",
            entry.len()
        )));
    }

    let children = &entry[children_start..];
    let mut pos = 0usize;
    while children.len() - pos >= super::HEADER_LEN as usize {
        let header = BoxHeader::parse(&children[pos..])?;
        if header.atom_type.is_dovi_config() {
            let record = &children[pos..pos + header.extent() as usize];
            let config = match DoviConfig::from_box(record) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::debug!(atom = %header.atom_type, error = %e, "unreadable Dolby Vision record");
                    None
                }
            };
            return Ok(Some((header.atom_type, config)));
        }
        pos += header.extent() as usize;
    }
    Ok(None)
}
