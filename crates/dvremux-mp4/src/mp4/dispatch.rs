//! Box type to rewrite behavior table.

use super::AtomType;

/// Length of the fixed VisualSampleEntry fields before nested boxes.
pub const VISUAL_SAMPLE_ENTRY_PREFIX: u64 = 78;
/// Length of the fixed AudioSampleEntry fields before nested boxes.
pub const AUDIO_SAMPLE_ENTRY_PREFIX: u64 = 28;

/// What the rewriter does with a box's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// Copy the content unchanged.
    Passthrough,
    /// Content is a sequence of boxes.
    Recurse,
    /// `stsd`: full-box prefix and entry count, then exactly one entry.
    SampleDescription,
    /// Fixed-length sample entry fields, then nested boxes.
    SampleEntry { prefix: u64, audio: bool },
    /// `stco` / `co64` offset tables.
    ChunkOffsets { wide: bool },
    /// `avcC` / `hvcC`: copy, then append the Dolby Vision configuration.
    InsertDoviConfig,
}

impl Handler {
    /// Look up the handler for a box type. `None` means the type is not in
    /// the table and falls back to the configured unknown-box policy.
    pub fn for_type(atom_type: AtomType) -> Option<Self> {
        const VISUAL: Handler = Handler::SampleEntry {
            prefix: VISUAL_SAMPLE_ENTRY_PREFIX,
            audio: false,
        };
        const AUDIO: Handler = Handler::SampleEntry {
            prefix: AUDIO_SAMPLE_ENTRY_PREFIX,
            audio: true,
        };

        let handler = match &atom_type.0 {
            b"moov" | b"trak" | b"mdia" | b"minf" | b"stbl" | b"sinf" | b"udta" => Self::Recurse,
            // fragments
            b"mvex" | b"moof" | b"traf" => Self::Recurse,

            b"stsd" => Self::SampleDescription,
            b"stco" => Self::ChunkOffsets { wide: false },
            b"co64" => Self::ChunkOffsets { wide: true },
            b"avcC" | b"hvcC" => Self::InsertDoviConfig,

            b"avc1" | b"avc3" | b"hvc1" | b"hev1" | b"dvav" | b"dvhe" | b"dvh1" | b"s263"
            | b"encv" => VISUAL,
            b"mp4a" | b"ac-3" | b"ec-3" | b"ac-4" | b"mlpa" | b"enca" => AUDIO,

            b"ftyp" | b"mdat" | b"free" | b"skip" | b"wide" | b"uuid" | b"pdin" => {
                Self::Passthrough
            }
            b"mvhd" | b"tkhd" | b"edts" | b"tref" | b"mdhd" | b"hdlr" | b"vmhd" | b"smhd"
            | b"nmhd" | b"sthd" | b"dinf" | b"meta" | b"ilst" | b"iods" => Self::Passthrough,
            b"stts" | b"ctts" | b"stss" | b"stsc" | b"stsz" | b"stz2" | b"sdtp" | b"sgpd"
            | b"sbgp" | b"subs" | b"saiz" | b"saio" => Self::Passthrough,
            b"frma" | b"schm" | b"schi" => Self::Passthrough,
            b"tx3g" | b"metx" | b"esds" | b"d263" | b"dac3" | b"dec3" | b"dmlp" | b"dac4"
            | b"btrt" | b"pasp" | b"colr" | b"clli" | b"mdcv" => Self::Passthrough,
            b"dvcC" | b"dvvC" | b"dvwC" => Self::Passthrough,
            b"trex" | b"mehd" | b"mfhd" | b"tfhd" | b"tfdt" | b"trun" | b"mfra" | b"sidx" => {
                Self::Passthrough
            }
            _ => return None,
        };
        Some(handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(tag: &[u8; 4]) -> Option<Handler> {
        Handler::for_type(AtomType(*tag))
    }

    #[test]
    fn test_structural_entries() {
        assert_eq!(handler(b"moov"), Some(Handler::Recurse));
        assert_eq!(handler(b"udta"), Some(Handler::Recurse));
        assert_eq!(handler(b"stsd"), Some(Handler::SampleDescription));
        assert_eq!(handler(b"hvcC"), Some(Handler::InsertDoviConfig));
        assert_eq!(handler(b"co64"), Some(Handler::ChunkOffsets { wide: true }));
    }

    #[test]
    fn test_sample_entry_prefixes() {
        assert_eq!(
            handler(b"hev1"),
            Some(Handler::SampleEntry {
                prefix: 78,
                audio: false
            })
        );
        assert_eq!(
            handler(b"ec-3"),
            Some(Handler::SampleEntry {
                prefix: 28,
                audio: true
            })
        );
    }

    #[test]
    fn test_unknown_type() {
        assert_eq!(handler(b"zzzz"), None);
        assert_eq!(handler(b"dvcC"), Some(Handler::Passthrough));
    }
}
