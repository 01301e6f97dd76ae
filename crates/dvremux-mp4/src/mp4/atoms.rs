//! MP4 atom type codes.

/// Four-character atom type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtomType(pub [u8; 4]);

impl AtomType {
    pub const FTYP: Self = Self(*b"ftyp");
    pub const MOOV: Self = Self(*b"moov");
    pub const MDAT: Self = Self(*b"mdat");
    pub const MVHD: Self = Self(*b"mvhd");
    pub const TRAK: Self = Self(*b"trak");
    pub const TKHD: Self = Self(*b"tkhd");
    pub const MDIA: Self = Self(*b"mdia");
    pub const MDHD: Self = Self(*b"mdhd");
    pub const HDLR: Self = Self(*b"hdlr");
    pub const MINF: Self = Self(*b"minf");
    pub const STBL: Self = Self(*b"stbl");
    pub const STSD: Self = Self(*b"stsd");
    pub const STCO: Self = Self(*b"stco");
    pub const CO64: Self = Self(*b"co64");
    pub const UDTA: Self = Self(*b"udta");
    pub const MVEX: Self = Self(*b"mvex");
    pub const MOOF: Self = Self(*b"moof");

    // Video sample entries that can carry a Dolby Vision configuration.
    pub const AVC1: Self = Self(*b"avc1");
    pub const AVC3: Self = Self(*b"avc3");
    pub const HVC1: Self = Self(*b"hvc1");
    pub const HEV1: Self = Self(*b"hev1");

    pub const AVCC: Self = Self(*b"avcC");
    pub const HVCC: Self = Self(*b"hvcC");

    pub const DVCC: Self = Self(*b"dvcC");
    pub const DVVC: Self = Self(*b"dvvC");
    pub const DVWC: Self = Self(*b"dvwC");

    /// Ancestors of the insertion point that gain the inserted length when
    /// they belong to the target track.
    pub const TRACK_ANCESTORS: [Self; 9] = [
        Self::TRAK,
        Self::MDIA,
        Self::MINF,
        Self::STBL,
        Self::STSD,
        Self::AVC1,
        Self::AVC3,
        Self::HVC1,
        Self::HEV1,
    ];

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Get the 4-char code as a string.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }

    /// Sample entries the track locator accepts as insertion targets.
    pub fn is_video_sample_entry(&self) -> bool {
        matches!(*self, Self::AVC1 | Self::AVC3 | Self::HVC1 | Self::HEV1)
    }

    /// Dolby Vision decoder configuration boxes.
    pub fn is_dovi_config(&self) -> bool {
        matches!(*self, Self::DVCC | Self::DVVC | Self::DVWC)
    }

    /// Whether this type lies on the path from a track to its codec
    /// configuration box.
    pub fn is_track_ancestor(&self) -> bool {
        Self::TRACK_ANCESTORS.contains(self)
    }
}

impl std::fmt::Display for AtomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(feature = "serialize")]
impl serde::Serialize for AtomType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_non_ascii() {
        assert_eq!(AtomType::HVCC.to_string(), "hvcC");
        assert_eq!(AtomType([0xff, 0xfe, 0x00, 0x01]).as_str(), "????");
    }

    #[test]
    fn test_categories() {
        assert!(AtomType::HEV1.is_video_sample_entry());
        assert!(!AtomType(*b"mp4a").is_video_sample_entry());
        assert!(!AtomType(*b"dvh1").is_video_sample_entry());

        assert!(AtomType::STSD.is_track_ancestor());
        assert!(!AtomType::MOOV.is_track_ancestor());
        assert!(!AtomType::AVCC.is_track_ancestor());

        assert!(AtomType::DVWC.is_dovi_config());
        assert!(!AtomType::HVCC.is_dovi_config());
    }
}
