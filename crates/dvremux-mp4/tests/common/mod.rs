//! Synthetic MP4 builder shared by the integration tests.

#![allow(dead_code)]

use bytes::{BufMut, BytesMut};

pub fn atom(atom_type: &[u8; 4], content: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(8 + content.len());
    buf.put_u32((8 + content.len()) as u32);
    buf.put_slice(atom_type);
    buf.put_slice(content);
    buf.to_vec()
}

/// Box using the 64-bit size form.
pub fn extended_atom(atom_type: &[u8; 4], content: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(16 + content.len());
    buf.put_u32(1);
    buf.put_slice(atom_type);
    buf.put_u64((16 + content.len()) as u64);
    buf.put_slice(content);
    buf.to_vec()
}

pub fn be32(buf: &[u8], pos: usize) -> u32 {
    u32::from_be_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]])
}

/// Offset of the first box of type `tag` at or after `from`.
pub fn find_box(buf: &[u8], tag: &[u8; 4], from: usize) -> usize {
    buf[from..]
        .windows(4)
        .position(|w| w == &tag[..])
        .map(|p| from + p - 4)
        .unwrap_or_else(|| panic!("no {} box", String::from_utf8_lossy(tag)))
}

/// Video or audio track description.
#[derive(Debug, Clone)]
pub enum Track {
    Video {
        entry: [u8; 4],
        config: [u8; 4],
    },
    Audio,
}

/// Builds ftyp + moov + mdat files with real chunk offsets.
#[derive(Debug, Clone)]
pub struct Mp4Builder {
    tracks: Vec<Track>,
    mdat_first: bool,
    wide_offsets: bool,
    payload: usize,
}

impl Mp4Builder {
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            mdat_first: false,
            wide_offsets: false,
            payload: 64,
        }
    }

    pub fn video(mut self, entry: &[u8; 4], config: &[u8; 4]) -> Self {
        self.tracks.push(Track::Video {
            entry: *entry,
            config: *config,
        });
        self
    }

    pub fn audio(mut self) -> Self {
        self.tracks.push(Track::Audio);
        self
    }

    pub fn mdat_first(mut self) -> Self {
        self.mdat_first = true;
        self
    }

    pub fn wide_offsets(mut self) -> Self {
        self.wide_offsets = true;
        self
    }

    fn ftyp() -> Vec<u8> {
        atom(b"ftyp", b"isom\0\0\x02\0isommp41")
    }

    fn mdat(&self) -> Vec<u8> {
        atom(b"mdat", &vec![0x5a; self.payload])
    }

    /// The complete file.
    pub fn build(&self) -> Vec<u8> {
        let ftyp = Self::ftyp();
        let mdat = self.mdat();
        if self.mdat_first {
            // Chunks start right after the mdat header.
            let offset = (ftyp.len() + 8) as u64;
            [ftyp, mdat, self.moov(offset)].concat()
        } else {
            // moov length does not depend on the offset values.
            let moov_len = self.moov(0).len();
            let offset = (ftyp.len() + moov_len + 8) as u64;
            [ftyp, self.moov(offset), mdat].concat()
        }
    }

    /// Chunk offset every track points at.
    pub fn chunk_offset(&self) -> u64 {
        let ftyp = Self::ftyp().len();
        if self.mdat_first {
            (ftyp + 8) as u64
        } else {
            (ftyp + self.moov(0).len() + 8) as u64
        }
    }

    fn moov(&self, offset: u64) -> Vec<u8> {
        let mut content = atom(b"mvhd", &[0u8; 100]);
        for track in &self.tracks {
            content.extend(self.trak(track, offset));
        }
        atom(b"moov", &content)
    }

    fn trak(&self, track: &Track, offset: u64) -> Vec<u8> {
        let entry = match track {
            Track::Video { entry, config } => {
                let mut body = vec![0u8; 78];
                body.extend(atom(config, &[0x01, 0x64, 0x00, 0x28, 0xff, 0xe1]));
                body.extend(atom(b"pasp", &[0, 0, 0, 1, 0, 0, 0, 1]));
                atom(entry, &body)
            }
            Track::Audio => {
                let mut body = vec![0u8; 28];
                body.extend(atom(b"esds", &[0u8; 20]));
                atom(b"mp4a", &body)
            }
        };

        let mut stsd = BytesMut::new();
        stsd.put_u32(0);
        stsd.put_u32(1);
        stsd.put_slice(&entry);

        let mut offsets = BytesMut::new();
        offsets.put_u32(0);
        offsets.put_u32(2);
        let chunk_table = if self.wide_offsets {
            offsets.put_u64(offset);
            offsets.put_u64(offset + 16);
            atom(b"co64", &offsets)
        } else {
            offsets.put_u32(offset as u32);
            offsets.put_u32(offset as u32 + 16);
            atom(b"stco", &offsets)
        };

        let stbl = atom(
            b"stbl",
            &[
                atom(b"stsd", &stsd),
                atom(b"stts", &[0u8; 16]),
                atom(b"stsz", &[0u8; 12]),
                chunk_table,
            ]
            .concat(),
        );
        let minf = atom(b"minf", &[atom(b"vmhd", &[0u8; 12]), stbl].concat());
        let mdia = atom(
            b"mdia",
            &[atom(b"mdhd", &[0u8; 24]), atom(b"hdlr", &[0u8; 25]), minf].concat(),
        );
        atom(b"trak", &[atom(b"tkhd", &[0u8; 84]), mdia].concat())
    }
}
