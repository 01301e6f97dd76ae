//! `stco` / `co64` rewriting.

use super::BoxHeader;
use crate::io::{Sink, Source};
use crate::{Error, Result};
use std::io::{Read, Seek, Write};

/// Copy a chunk offset table, adding `shift` to every entry.
///
/// The box header has already been written. Returns the number of content
/// bytes consumed (version/flags, entry count and the table); anything after
/// the table is left for the caller.
pub fn patch_chunk_offsets<R: Read + Seek, W: Write>(
    src: &mut Source<R>,
    dst: &mut Sink<W>,
    header: &BoxHeader,
    wide: bool,
    shift: u32,
) -> Result<u64> {
    if header.content_len < 8 {
        return Err(Error::corrupt(format!(
            "{} content of {} bytes is shorter than its header",
            header.atom_type, header.content_len
        )));
    }

    let version_flags = src.read_u32()?;
    let entry_count = src.read_u32()?;
    let entry_len = if wide { 8 } else { 4 };
    let table_len = entry_count as u64 * entry_len;
    if 8 + table_len > header.content_len {
        return Err(Error::corrupt(format!(
            "{} lists {} entries but holds only {} bytes",
            header.atom_type, entry_count, header.content_len
        )));
    }

    dst.write_u32(version_flags)?;
    dst.write_u32(entry_count)?;

    if wide {
        for _ in 0..entry_count {
            let offset = src.read_u64()?;
            let shifted = offset
                .checked_add(shift as u64)
                .ok_or_else(|| Error::corrupt(format!("co64 offset {} overflows", offset)))?;
            dst.write_u64(shifted)?;
        }
    } else {
        for _ in 0..entry_count {
            let offset = src.read_u32()?;
            let shifted = offset
                .checked_add(shift)
                .ok_or(Error::ChunkOffsetOverflow { offset, shift })?;
            dst.write_u32(shifted)?;
        }
    }

    tracing::trace!(
        atom = %header.atom_type,
        entries = entry_count,
        shift,
        "patched chunk offsets"
    );
    Ok(8 + table_len)
}
