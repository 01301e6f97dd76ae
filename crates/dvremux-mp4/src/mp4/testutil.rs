//! Synthetic box builders for unit tests.

use bytes::{BufMut, BytesMut};

pub fn atom(atom_type: &[u8; 4], content: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(8 + content.len());
    buf.put_u32((8 + content.len()) as u32);
    buf.put_slice(atom_type);
    buf.put_slice(content);
    buf.to_vec()
}

pub fn ftyp() -> Vec<u8> {
    atom(b"ftyp", b"isom\0\0\x02\0isommp41")
}

pub fn mdat(len: usize) -> Vec<u8> {
    atom(b"mdat", &vec![0xab; len])
}

pub fn moov(children: &[Vec<u8>]) -> Vec<u8> {
    let mut content = atom(b"mvhd", &[0u8; 100]);
    content.extend(children.concat());
    atom(b"moov", &content)
}

pub fn stsd(entries: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    buf.put_u32(0);
    buf.put_u32(entries.len() as u32);
    buf.put_slice(&entries.concat());
    atom(b"stsd", &buf)
}

pub fn stco(offsets: &[u32]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    buf.put_u32(0);
    buf.put_u32(offsets.len() as u32);
    for offset in offsets {
        buf.put_u32(*offset);
    }
    atom(b"stco", &buf)
}

pub fn video_entry(entry_type: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    let mut content = vec![0u8; 78];
    content.extend(children.concat());
    atom(entry_type, &content)
}

pub fn trak_with_entry(entry: &[u8]) -> Vec<u8> {
    let stbl = atom(
        b"stbl",
        &[stsd(&[entry.to_vec()]), atom(b"stts", &[0u8; 8]), stco(&[1000])].concat(),
    );
    let minf = atom(b"minf", &[atom(b"vmhd", &[0u8; 12]), stbl].concat());
    let mdia = atom(
        b"mdia",
        &[atom(b"mdhd", &[0u8; 24]), atom(b"hdlr", &[0u8; 25]), minf].concat(),
    );
    atom(b"trak", &[atom(b"tkhd", &[0u8; 84]), mdia].concat())
}

pub fn video_trak(entry_type: &[u8; 4], config_type: &[u8; 4]) -> Vec<u8> {
    trak_with_entry(&video_entry(entry_type, &[atom(config_type, &[1u8; 8])]))
}

pub fn audio_trak() -> Vec<u8> {
    let mut content = vec![0u8; 28];
    content.extend(atom(b"esds", &[0u8; 12]));
    trak_with_entry(&atom(b"mp4a", &content))
}
