//! Box header encoding and decoding.

use super::AtomType;
use crate::io::{Sink, Source};
use crate::{Error, Result};
use std::io::{Read, Seek, Write};

/// Size of a compact box header.
pub const HEADER_LEN: u64 = 8;
/// Size of a box header using the 64-bit extended size.
pub const EXTENDED_HEADER_LEN: u64 = 16;

/// How a box declared its size on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeField {
    /// 32-bit size in the first header word.
    Compact(u32),
    /// Size word of 1 followed by a 64-bit size after the type.
    Extended(u64),
    /// Size word of 0: the box runs to the end of its container.
    ToEnd,
}

/// A decoded box header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    /// Box type.
    pub atom_type: AtomType,
    /// Size encoding as found in the input.
    pub size: SizeField,
    /// Bytes following the header.
    pub content_len: u64,
}

impl BoxHeader {
    /// Length of the header itself.
    pub fn header_len(&self) -> u64 {
        match self.size {
            SizeField::Extended(_) => EXTENDED_HEADER_LEN,
            _ => HEADER_LEN,
        }
    }

    /// Total bytes the box occupies in its container.
    pub fn extent(&self) -> u64 {
        self.header_len() + self.content_len
    }

    /// Read a header from a stream.
    ///
    /// `remaining` is the number of bytes left in the enclosing container,
    /// counted from the start of this header.
    pub fn read<R: Read + Seek>(src: &mut Source<R>, remaining: u64) -> Result<Self> {
        if remaining < HEADER_LEN {
            return Err(Error::corrupt(format!(
                "{} bytes left in container, too few for a box header",
                remaining
            )));
        }
        let size = src.read_u32()?;
        let atom_type = AtomType::from_bytes(src.read_fourcc()?);
        let extended = if size == 1 {
            if remaining < EXTENDED_HEADER_LEN {
                return Err(Error::corrupt(format!(
                    "box {} uses an extended size but only {} bytes remain",
                    atom_type, remaining
                )));
            }
            Some(src.read_u64()?)
        } else {
            None
        };
        Self::resolve(atom_type, size, extended, remaining)
    }

    /// Decode a header from the front of `buf`; `buf` holds the rest of the
    /// enclosing container.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let remaining = buf.len() as u64;
        if remaining < HEADER_LEN {
            return Err(Error::corrupt(format!(
                "{} bytes left in container, too few for a box header",
                remaining
            )));
        }
        let size = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let atom_type = AtomType::from_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let extended = if size == 1 {
            let ext = buf.get(8..16).ok_or_else(|| {
                Error::corrupt(format!(
                    "box {} uses an extended size but only {} bytes remain",
                    atom_type, remaining
                ))
            })?;
            let mut word = [0u8; 8];
            word.copy_from_slice(ext);
            Some(u64::from_be_bytes(word))
        } else {
            None
        };
        Self::resolve(atom_type, size, extended, remaining)
    }

    fn resolve(
        atom_type: AtomType,
        size: u32,
        extended: Option<u64>,
        remaining: u64,
    ) -> Result<Self> {
        let header = match (size, extended) {
            (0, _) => Self {
                atom_type,
                size: SizeField::ToEnd,
                content_len: remaining - HEADER_LEN,
            },
            (1, Some(ext)) => {
                if ext < EXTENDED_HEADER_LEN {
                    return Err(Error::corrupt(format!(
                        "box {} declares extended size {} smaller than its header",
                        atom_type, ext
                    )));
                }
                Self {
                    atom_type,
                    size: SizeField::Extended(ext),
                    content_len: ext - EXTENDED_HEADER_LEN,
                }
            }
            (n, _) if (n as u64) < HEADER_LEN => {
                return Err(Error::corrupt(format!(
                    "box {} declares size {} smaller than its header",
                    atom_type, n
                )));
            }
            (n, _) => Self {
                atom_type,
                size: SizeField::Compact(n),
                content_len: n as u64 - HEADER_LEN,
            },
        };

        if header.extent() > remaining {
            return Err(Error::corrupt(format!(
                "box {} declares {} bytes but only {} remain in its parent",
                atom_type,
                header.extent(),
                remaining
            )));
        }
        Ok(header)
    }

    /// Write the header back, grown by `delta` bytes.
    ///
    /// The input's size encoding is preserved: a compact size that no
    /// longer fits in 32 bits is an error rather than a silent switch to
    /// the extended form, and a to-end size stays 0.
    pub fn write_inflated<W: Write>(&self, sink: &mut Sink<W>, delta: u64) -> Result<()> {
        match self.size {
            SizeField::Compact(n) => {
                let grown = u32::try_from(n as u64 + delta).map_err(|_| {
                    Error::unsupported(format!(
                        "box {} of {} bytes cannot grow by {} without a 64-bit size",
                        self.atom_type, n, delta
                    ))
                })?;
                sink.write_u32(grown)?;
                sink.write_all(&self.atom_type.0)?;
            }
            SizeField::Extended(n) => {
                let grown = n.checked_add(delta).ok_or_else(|| {
                    Error::corrupt(format!("box {} size overflows", self.atom_type))
                })?;
                sink.write_u32(1)?;
                sink.write_all(&self.atom_type.0)?;
                sink.write_u64(grown)?;
            }
            SizeField::ToEnd => {
                sink.write_u32(0)?;
                sink.write_all(&self.atom_type.0)?;
            }
        }
        Ok(())
    }
}
