use dvremux_mp4::{DoviConfig, RemuxOptions, UnknownBoxPolicy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub dovi: DoviSettings,

    #[serde(default)]
    pub remux: RemuxSettings,
}

/// Values written into the inserted configuration record.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DoviSettings {
    /// Dolby Vision profile (0-127). 8 and 9 produce `dvvC`, 32 `dvwC`.
    #[serde(default = "default_profile")]
    pub profile: u8,

    /// Dolby Vision level (0-63)
    #[serde(default = "default_level")]
    pub level: u8,

    /// Base-layer signal compatibility id (0-15)
    #[serde(default = "default_bl_compatibility_id")]
    pub bl_compatibility_id: u8,
}

fn default_profile() -> u8 {
    8
}

fn default_level() -> u8 {
    6
}

fn default_bl_compatibility_id() -> u8 {
    4
}

impl Default for DoviSettings {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            level: default_level(),
            bl_compatibility_id: default_bl_compatibility_id(),
        }
    }
}

impl DoviSettings {
    pub fn to_dovi_config(&self) -> dvremux_mp4::Result<DoviConfig> {
        DoviConfig::new(self.profile, self.level, self.bl_compatibility_id)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemuxSettings {
    /// What to do with box types the rewriter does not know
    #[serde(default)]
    pub unknown_boxes: UnknownBoxPolicy,

    /// Accept fragmented inputs (moov containing mvex)
    #[serde(default)]
    pub allow_fragmented: bool,

    /// Largest moov, in bytes, loaded while locating the target track
    #[serde(default = "default_max_moov_size")]
    pub max_moov_size: u64,

    /// Leave the partially written output behind on failure
    #[serde(default)]
    pub keep_partial_output: bool,
}

fn default_max_moov_size() -> u64 {
    dvremux_mp4::mp4::DEFAULT_MAX_MOOV_SIZE
}

impl Default for RemuxSettings {
    fn default() -> Self {
        Self {
            unknown_boxes: UnknownBoxPolicy::default(),
            allow_fragmented: false,
            max_moov_size: default_max_moov_size(),
            keep_partial_output: false,
        }
    }
}

impl RemuxSettings {
    pub fn to_options(&self) -> RemuxOptions {
        RemuxOptions {
            range: None,
            unknown_boxes: self.unknown_boxes,
            allow_fragmented: self.allow_fragmented,
            max_moov_size: self.max_moov_size,
            keep_partial_output: self.keep_partial_output,
        }
    }
}
