//! File-level remux tests over synthetic MP4s.

mod common;

use common::*;
use dvremux_mp4::{remux_file, DoviConfig, Error, RemuxOptions, Remuxer};
use std::path::PathBuf;
use tempfile::TempDir;

fn config() -> DoviConfig {
    DoviConfig::new(8, 6, 4).unwrap()
}

fn write_input(dir: &TempDir, bytes: &[u8]) -> (PathBuf, PathBuf) {
    let input = dir.path().join("in.mp4");
    std::fs::write(&input, bytes).unwrap();
    (input, dir.path().join("out.mp4"))
}

fn remux_bytes(bytes: &[u8], config: DoviConfig) -> Vec<u8> {
    let dir = TempDir::new().unwrap();
    let (input, output) = write_input(&dir, bytes);
    remux_file(&input, &output, config).unwrap();
    std::fs::read(&output).unwrap()
}

/// Chunk offset table entries of the box at `pos`.
fn chunk_offsets(buf: &[u8], pos: usize) -> Vec<u64> {
    let wide = &buf[pos + 4..pos + 8] == b"co64";
    let count = be32(buf, pos + 12) as usize;
    let table = pos + 16;
    (0..count)
        .map(|i| {
            if wide {
                let mut word = [0u8; 8];
                word.copy_from_slice(&buf[table + i * 8..table + i * 8 + 8]);
                u64::from_be_bytes(word)
            } else {
                be32(buf, table + i * 4) as u64
            }
        })
        .collect()
}

#[test]
fn test_minimal_file() {
    let input = Mp4Builder::new().video(b"avc1", b"avcC").build();
    let output = remux_bytes(&input, config());

    assert_eq!(output.len(), input.len() + 32);

    let avcc = find_box(&output, b"avcC", 0);
    let record = avcc + be32(&output, avcc) as usize;
    assert_eq!(&output[record..record + 32], &config().to_box());

    // Everything before the record is the input with patched sizes, and the
    // media data is untouched.
    assert_eq!(&output[..4], &input[..4]);
    let mdat_in = find_box(&input, b"mdat", 0);
    let mdat_out = find_box(&output, b"mdat", 0);
    assert_eq!(mdat_out, mdat_in + 32);
    assert_eq!(&output[mdat_out..], &input[mdat_in..]);
}

#[test]
fn test_ancestors_grow_only_on_target_path() {
    let input = Mp4Builder::new()
        .audio()
        .video(b"hvc1", b"hvcC")
        .build();
    let output = remux_bytes(&input, config());

    let moov_in = find_box(&input, b"moov", 0);
    let moov_out = find_box(&output, b"moov", 0);
    assert_eq!(be32(&output, moov_out), be32(&input, moov_in) + 32);

    let audio_in = find_box(&input, b"trak", 0);
    let audio_out = find_box(&output, b"trak", 0);
    let audio_len = be32(&input, audio_in) as usize;
    assert_eq!(
        &output[audio_out..audio_out + audio_len],
        &input[audio_in..audio_in + audio_len]
    );

    let video_in = audio_in + audio_len;
    let video_out = audio_out + audio_len;
    for tag in [b"trak", b"mdia", b"minf", b"stbl", b"stsd", b"hvc1"] {
        let before = be32(&input, find_box(&input, tag, video_in));
        let after = be32(&output, find_box(&output, tag, video_out));
        assert_eq!(after, before + 32, "{}", String::from_utf8_lossy(tag));
    }

    for tag in [b"tkhd", b"mdhd", b"hdlr", b"stts", b"stsz", b"stco", b"hvcC", b"pasp"] {
        let before = be32(&input, find_box(&input, tag, video_in));
        let after = be32(&output, find_box(&output, tag, video_out));
        assert_eq!(after, before, "{}", String::from_utf8_lossy(tag));
    }
}

#[test]
fn test_offsets_shift_when_moov_first() {
    for builder in [
        Mp4Builder::new().audio().video(b"avc1", b"avcC"),
        Mp4Builder::new().audio().video(b"avc1", b"avcC").wide_offsets(),
    ] {
        let input = builder.build();
        let output = remux_bytes(&input, config());
        let base = builder.chunk_offset() + 32;

        let tag = if output.windows(4).any(|w| w == &b"co64"[..]) {
            b"co64"
        } else {
            b"stco"
        };
        let first = find_box(&output, tag, 0);
        let second = find_box(&output, tag, first + 8);
        assert_eq!(chunk_offsets(&output, first), vec![base, base + 16]);
        assert_eq!(chunk_offsets(&output, second), vec![base, base + 16]);

        // The shifted offsets still point just past the mdat header.
        assert_eq!(&output[base as usize - 4..base as usize], b"mdat");
        assert_eq!(&output[base as usize..], &input[builder.chunk_offset() as usize..]);
    }
}

#[test]
fn test_offsets_kept_when_mdat_first() {
    for builder in [
        Mp4Builder::new().video(b"hev1", b"hvcC").mdat_first(),
        Mp4Builder::new().video(b"hev1", b"hvcC").mdat_first().wide_offsets(),
    ] {
        let input = builder.build();
        let output = remux_bytes(&input, config());
        let base = builder.chunk_offset();

        let tag = if input.windows(4).any(|w| w == &b"co64"[..]) {
            b"co64"
        } else {
            b"stco"
        };
        let pos = find_box(&output, tag, 0);
        assert_eq!(chunk_offsets(&output, pos), vec![base, base + 16]);
        assert_eq!(&output[..base as usize], &input[..base as usize]);
    }
}

#[test]
fn test_box_type_follows_profile() {
    let input = Mp4Builder::new().video(b"avc3", b"avcC").build();
    for (profile, expected) in [
        (4, b"dvcC"),
        (5, b"dvcC"),
        (7, b"dvcC"),
        (8, b"dvvC"),
        (9, b"dvvC"),
        (10, b"dvcC"),
        (32, b"dvwC"),
    ] {
        let output = remux_bytes(&input, DoviConfig::new(profile, 6, 0).unwrap());
        let avcc = find_box(&output, b"avcC", 0);
        let record = avcc + be32(&output, avcc) as usize;
        assert_eq!(&output[record + 4..record + 8], &expected[..], "profile {}", profile);
    }
}

#[test]
fn test_only_first_video_track_receives_record() {
    let input = Mp4Builder::new()
        .video(b"avc1", b"avcC")
        .video(b"hvc1", b"hvcC")
        .build();
    let output = remux_bytes(&input, config());
    assert_eq!(output.len(), input.len() + 32);
    assert_eq!(output.windows(4).filter(|w| *w == &b"dvvC"[..]).count(), 1);

    let hvcc = find_box(&output, b"hvcC", 0);
    let after = hvcc + be32(&output, hvcc) as usize;
    assert_eq!(&output[after + 4..after + 8], b"pasp");
}

/// Replace the sample description of the only track with `stsd_content`.
fn with_stsd_content(input: &[u8], stsd_content: &[u8]) -> Vec<u8> {
    let stsd = find_box(input, b"stsd", 0);
    let old_len = be32(input, stsd) as usize;
    let new_stsd = atom(b"stsd", stsd_content);
    let grow = new_stsd.len() as u32 - old_len as u32;

    let mut out = input[..stsd].to_vec();
    for tag in [b"moov", b"trak", b"mdia", b"minf", b"stbl"] {
        let pos = find_box(input, tag, 0);
        let len = be32(input, pos) + grow;
        out[pos..pos + 4].copy_from_slice(&len.to_be_bytes());
    }
    out.extend_from_slice(&new_stsd);
    out.extend_from_slice(&input[stsd + old_len..]);
    out
}

fn two_entries(declared: u32) -> Vec<u8> {
    let mut body = vec![0u8; 78];
    body.extend(atom(b"avcC", &[1, 2, 3, 4]));
    let entry = atom(b"avc1", &body);
    let mut content = vec![0, 0, 0, 0];
    content.extend_from_slice(&declared.to_be_bytes());
    content.extend_from_slice(&entry);
    content.extend_from_slice(&entry);
    content
}

#[test]
fn test_multiple_sample_entries_fail_before_stsd_is_written() {
    let base = Mp4Builder::new().video(b"avc1", b"avcC").mdat_first().build();
    let input = with_stsd_content(&base, &two_entries(2));

    let dir = TempDir::new().unwrap();
    let (in_path, out_path) = write_input(&dir, &input);
    let options = RemuxOptions {
        keep_partial_output: true,
        ..Default::default()
    };
    let err = Remuxer::with_options(config(), options)
        .remux(&in_path, &out_path)
        .unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)));

    let partial = std::fs::read(&out_path).unwrap();
    assert!(partial.ends_with(b"stbl"));
    assert!(!partial.windows(4).any(|w| w == &b"stsd"[..]));
}

#[test]
fn test_malformed_stsd_with_extra_children_fails() {
    let base = Mp4Builder::new().video(b"avc1", b"avcC").mdat_first().build();
    let input = with_stsd_content(&base, &two_entries(1));

    let dir = TempDir::new().unwrap();
    let (in_path, out_path) = write_input(&dir, &input);
    let err = remux_file(&in_path, &out_path, config()).unwrap_err();
    assert!(matches!(err, Error::InsertionMismatch { inserted: 2 }));
    assert!(!out_path.exists());
}

#[test]
fn test_no_video_track() {
    let input = Mp4Builder::new().audio().build();
    let dir = TempDir::new().unwrap();
    let (in_path, out_path) = write_input(&dir, &input);

    let err = remux_file(&in_path, &out_path, config()).unwrap_err();
    assert!(matches!(err, Error::NoEligibleTrack));
    assert!(!out_path.exists());
}

#[test]
fn test_rewrite_requires_locate() {
    let input = Mp4Builder::new().video(b"avc1", b"avcC").build();
    let dir = TempDir::new().unwrap();
    let (in_path, out_path) = write_input(&dir, &input);

    let err = Remuxer::new(config()).rewrite(&in_path, &out_path).unwrap_err();
    assert!(matches!(err, Error::NotLocated));
    assert!(!out_path.exists());
}

#[test]
fn test_extended_size_moov() {
    let input = Mp4Builder::new().video(b"avc1", b"avcC").mdat_first().build();
    let moov = find_box(&input, b"moov", 0);
    let mut extended = input[..moov].to_vec();
    extended.extend(extended_atom(b"moov", &input[moov + 8..]));

    let output = remux_bytes(&extended, config());
    let pos = find_box(&output, b"moov", 0);
    assert_eq!(be32(&output, pos), 1);
    let mut size = [0u8; 8];
    size.copy_from_slice(&output[pos + 8..pos + 16]);
    assert_eq!(
        u64::from_be_bytes(size),
        (extended.len() - moov) as u64 + 32
    );
}

#[test]
fn test_missing_input() {
    let dir = TempDir::new().unwrap();
    let err = remux_file(
        dir.path().join("absent.mp4"),
        dir.path().join("out.mp4"),
        config(),
    )
    .unwrap_err();
    assert!(err.is_io());
}
