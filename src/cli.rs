use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dvremux")]
#[command(author, version, about = "Insert Dolby Vision configuration boxes into MP4 files")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a copy of INPUT with a Dolby Vision configuration box
    Remux {
        /// Source MP4 file
        #[arg(required = true)]
        input: PathBuf,

        /// Destination file (overwritten)
        #[arg(required = true)]
        output: PathBuf,

        /// Dolby Vision profile (overrides config)
        #[arg(long)]
        profile: Option<u8>,

        /// Dolby Vision level (overrides config)
        #[arg(long)]
        level: Option<u8>,

        /// Base-layer compatibility id (overrides config)
        #[arg(long)]
        compat: Option<u8>,

        /// Start of an embedded MP4 inside INPUT
        #[arg(long, requires = "length")]
        offset: Option<u64>,

        /// Length of the embedded MP4 starting at --offset
        #[arg(long, requires = "offset")]
        length: Option<u64>,

        /// Keep the partial output if the remux fails
        #[arg(long)]
        keep_partial: bool,

        /// Handling of unrecognized box types (overrides config)
        #[arg(long, value_enum)]
        unknown_boxes: Option<UnknownBoxes>,
    },

    /// Show which track would receive the configuration box
    Locate {
        /// MP4 file to inspect
        #[arg(required = true)]
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum UnknownBoxes {
    Copy,
    Skip,
}

impl From<UnknownBoxes> for dvremux_mp4::UnknownBoxPolicy {
    fn from(value: UnknownBoxes) -> Self {
        match value {
            UnknownBoxes::Copy => Self::Copy,
            UnknownBoxes::Skip => Self::Skip,
        }
    }
}
