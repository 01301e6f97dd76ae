//! Dolby Vision decoder configuration record.
//!
//! The record is stored in a 32-byte box appended to a video sample entry:
//!
//! - dv_version_major (8 bits), dv_version_minor (8 bits)
//! - dv_profile (7 bits)
//! - dv_level (6 bits)
//! - rpu_present_flag, el_present_flag, bl_present_flag (1 bit each)
//! - dv_bl_signal_compatibility_id (4 bits)
//! - reserved zeros up to the end of the box
//!
//! The box type depends on the profile: `dvvC` for profiles 8 and 9, `dvwC`
//! for profile 32 and `dvcC` for everything else.

use crate::mp4::AtomType;
use crate::{Error, Result};
use bytes::BufMut;

/// Profile, level and base-layer compatibility of the inserted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct DoviConfig {
    profile: u8,
    level: u8,
    bl_compatibility_id: u8,
}

impl DoviConfig {
    /// Size of the configuration box, header included.
    pub const BOX_SIZE: u32 = 32;

    pub const MAX_PROFILE: u8 = 0x7f;
    pub const MAX_LEVEL: u8 = 0x3f;
    pub const MAX_BL_COMPATIBILITY_ID: u8 = 0x0f;

    const VERSION_MAJOR: u8 = 1;
    const VERSION_MINOR: u8 = 0;
    const RESERVED_LEN: usize = 19;

    /// Validate and build a configuration.
    pub fn new(profile: u8, level: u8, bl_compatibility_id: u8) -> Result<Self> {
        if profile > Self::MAX_PROFILE {
            return Err(Error::invalid_config(format!(
                "profile {} does not fit in 7 bits",
                profile
            )));
        }
        if level > Self::MAX_LEVEL {
            return Err(Error::invalid_config(format!(
                "level {} does not fit in 6 bits",
                level
            )));
        }
        if bl_compatibility_id > Self::MAX_BL_COMPATIBILITY_ID {
            return Err(Error::invalid_config(format!(
                "base-layer compatibility id {} does not fit in 4 bits",
                bl_compatibility_id
            )));
        }
        Ok(Self {
            profile,
            level,
            bl_compatibility_id,
        })
    }

    pub fn profile(&self) -> u8 {
        self.profile
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn bl_compatibility_id(&self) -> u8 {
        self.bl_compatibility_id
    }

    /// Box type carrying this record.
    pub fn box_type(&self) -> AtomType {
        match self.profile {
            8 | 9 => AtomType::DVVC,
            32 => AtomType::DVWC,
            _ => AtomType::DVCC,
        }
    }

    /// Serialize the complete 32-byte box.
    pub fn to_box(&self) -> [u8; Self::BOX_SIZE as usize] {
        let mut out = [0u8; Self::BOX_SIZE as usize];
        let mut buf = &mut out[..];

        buf.put_u32(Self::BOX_SIZE);
        buf.put_slice(&self.box_type().0);
        buf.put_u8(Self::VERSION_MAJOR);
        buf.put_u8(Self::VERSION_MINOR);
        buf.put_u8(((self.profile << 1) & 0xfe) | ((self.level >> 5) & 0x01));
        // rpu present, no enhancement layer, base layer present
        buf.put_u8(((self.level << 3) & 0xf8) | 0b101);
        buf.put_u8((self.bl_compatibility_id << 4) & 0xf0);
        buf.put_bytes(0, Self::RESERVED_LEN);

        out
    }

    /// Decode profile, level and compatibility id from a configuration box.
    pub fn from_box(data: &[u8]) -> Result<Self> {
        if data.len() < 13 {
            return Err(Error::corrupt(format!(
                "Dolby Vision configuration box of {} bytes is truncated",
                data.len()
            )));
        }
        let atom_type = AtomType::from_bytes([data[4], data[5], data[6], data[7]]);
        if !atom_type.is_dovi_config() {
            return Err(Error::corrupt(format!(
                "{} is not a Dolby Vision configuration box",
                atom_type
            )));
        }
        let record = &data[8..];
        let profile = (record[2] >> 1) & 0x7f;
        let level = ((record[2] & 0x01) << 5) | ((record[3] >> 3) & 0x1f);
        let bl_compatibility_id = (record[4] >> 4) & 0x0f;
        Self::new(profile, level, bl_compatibility_id)
    }
}
