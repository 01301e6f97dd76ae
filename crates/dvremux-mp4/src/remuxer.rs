//! Remuxer controller: sequences locate and rewrite.

use crate::dovi::DoviConfig;
use crate::io::{Sink, Source};
use crate::mp4::{
    locate, RewritePlan, RewriteSummary, Rewriter, TrackLocation, UnknownBoxPolicy,
    DEFAULT_MAX_MOOV_SIZE,
};
use crate::{Error, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

/// A region of the input treated as the top-level container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ByteRange {
    /// Absolute offset of the first byte.
    pub start: u64,
    /// Number of bytes.
    pub length: u64,
}

/// Knobs that do not affect the inserted box itself.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct RemuxOptions {
    /// Rewrite only this part of the input. The output holds just the
    /// rewritten range.
    pub range: Option<ByteRange>,
    pub unknown_boxes: UnknownBoxPolicy,
    /// Accept inputs whose `moov` carries `mvex`.
    pub allow_fragmented: bool,
    /// Largest `moov` content the locator will buffer.
    pub max_moov_size: u64,
    /// Leave a partially written output in place when [`Remuxer::remux`] fails.
    pub keep_partial_output: bool,
}

impl Default for RemuxOptions {
    fn default() -> Self {
        Self {
            range: None,
            unknown_boxes: UnknownBoxPolicy::default(),
            allow_fragmented: false,
            max_moov_size: DEFAULT_MAX_MOOV_SIZE,
            keep_partial_output: false,
        }
    }
}

/// Inserts a Dolby Vision configuration box into the first AVC/HEVC track.
///
/// Use [`Remuxer::locate_insertion_track`] once, then [`Remuxer::rewrite`]
/// against the same input. [`Remuxer::remux`] does both.
#[derive(Debug, Clone)]
pub struct Remuxer {
    config: DoviConfig,
    options: RemuxOptions,
    location: Option<TrackLocation>,
}

impl Remuxer {
    /// Create a remuxer with default options.
    pub fn new(config: DoviConfig) -> Self {
        Self::with_options(config, RemuxOptions::default())
    }

    pub fn with_options(config: DoviConfig, options: RemuxOptions) -> Self {
        Self {
            config,
            options,
            location: None,
        }
    }

    pub fn config(&self) -> DoviConfig {
        self.config
    }

    /// Replace profile, level and compatibility id. The located track is kept.
    pub fn set_config(&mut self, config: DoviConfig) {
        self.config = config;
    }

    pub fn options(&self) -> &RemuxOptions {
        &self.options
    }

    /// Result of the last successful locate, if any.
    pub fn location(&self) -> Option<TrackLocation> {
        self.location
    }

    /// Find the insertion track in the file at `path`.
    pub fn locate_insertion_track<P: AsRef<Path>>(&mut self, path: P) -> Result<TrackLocation> {
        let file = File::open(path)?;
        self.locate_from_reader(BufReader::new(file))
    }

    /// Run the locator without the eligibility checks and without
    /// remembering the result. An existing Dolby Vision box or a fragmented
    /// layout is reported in the returned location instead of failing.
    pub fn inspect<P: AsRef<Path>>(&self, path: P) -> Result<TrackLocation> {
        let file = File::open(path)?;
        self.scan(BufReader::new(file))
    }

    /// Find the insertion track in a seekable stream.
    pub fn locate_from_reader<R: Read + Seek>(&mut self, reader: R) -> Result<TrackLocation> {
        self.location = None;

        let location = self.scan(reader)?;

        if let Some(existing) = location.existing_dovi {
            return Err(Error::DoviConfigPresent {
                track_index: location.track_index,
                existing,
            });
        }
        if location.fragmented && !self.options.allow_fragmented {
            return Err(Error::unsupported("fragmented input (moov contains mvex)"));
        }

        self.location = Some(location);
        Ok(location)
    }

    fn scan<R: Read + Seek>(&self, reader: R) -> Result<TrackLocation> {
        let mut src = Source::new(reader);
        let len = self.enter_range(&mut src)?;
        locate(&mut src, len, self.options.max_moov_size)
    }

    /// Rewrite the file at `src` into a new file at `dst`.
    ///
    /// `dst` must not name the same file as `src`.
    pub fn rewrite<P: AsRef<Path>, Q: AsRef<Path>>(&self, src: P, dst: Q) -> Result<RewriteSummary> {
        self.rewrite_file(src.as_ref(), dst.as_ref(), false)
    }

    /// File-to-file rewrite. With `remove_on_error`, a destination this call
    /// created is deleted again if the rewrite fails; failures before the
    /// destination is created leave it alone.
    fn rewrite_file(&self, src: &Path, dst: &Path, remove_on_error: bool) -> Result<RewriteSummary> {
        if self.location.is_none() {
            return Err(Error::NotLocated);
        }
        ensure_distinct(src, dst)?;

        let reader = BufReader::new(File::open(src)?);
        let writer = BufWriter::new(File::create(dst)?);
        let result = self.rewrite_stream(reader, writer);

        if result.is_err() && remove_on_error {
            if let Err(remove_err) = std::fs::remove_file(dst) {
                tracing::warn!(
                    output = %dst.display(),
                    error = %remove_err,
                    "failed to remove partial output"
                );
            }
        }
        result
    }

    /// Rewrite a seekable stream into `writer`.
    pub fn rewrite_stream<R: Read + Seek, W: Write>(
        &self,
        reader: R,
        writer: W,
    ) -> Result<RewriteSummary> {
        let location = self.location.ok_or(Error::NotLocated)?;

        let mut src = Source::new(reader);
        let len = self.enter_range(&mut src)?;
        let mut dst = Sink::new(writer);

        let plan = RewritePlan {
            target_track: location.track_index,
            mdat_first: location.mdat_first,
            config: self.config,
            unknown_boxes: self.options.unknown_boxes,
        };
        let summary = Rewriter::new(&mut src, &mut dst, plan).run(len)?;
        dst.flush()?;
        Ok(summary)
    }

    /// Locate and rewrite in one call.
    ///
    /// When the rewrite fails the partial output is removed, unless
    /// `keep_partial_output` is set.
    pub fn remux<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        input: P,
        output: Q,
    ) -> Result<RewriteSummary> {
        let (input, output) = (input.as_ref(), output.as_ref());
        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            config = %self.config.box_type(),
            profile = self.config.profile(),
            level = self.config.level(),
            "remuxing"
        );

        let location = self.locate_insertion_track(input)?;
        tracing::debug!(
            track = location.track_index,
            entry = %location.sample_entry,
            "insertion target"
        );

        let summary = self.rewrite_file(input, output, !self.options.keep_partial_output)?;
        tracing::info!(
            bytes = summary.bytes_written,
            tracks = summary.tracks,
            "remux complete"
        );
        Ok(summary)
    }

    /// Position `src` at the start of the working range and return its length.
    fn enter_range<R: Read + Seek>(&self, src: &mut Source<R>) -> Result<u64> {
        let total = src.stream_len()?;
        match self.options.range {
            None => {
                src.seek_to(0)?;
                Ok(total)
            }
            Some(range) => {
                let end = range.start.checked_add(range.length);
                if end.map_or(true, |end| end > total) {
                    return Err(Error::invalid_config(format!(
                        "range {}+{} exceeds input of {} bytes",
                        range.start, range.length, total
                    )));
                }
                src.seek_to(range.start)?;
                Ok(range.length)
            }
        }
    }
}

/// Refuse to write over the input. Only existing destinations can alias it.
fn ensure_distinct(src: &Path, dst: &Path) -> Result<()> {
    let dst = match std::fs::canonicalize(dst) {
        Ok(dst) => dst,
        Err(_) => return Ok(()),
    };
    if std::fs::canonicalize(src)? == dst {
        return Err(Error::OutputIsInput(dst));
    }
    Ok(())
}

/// One-shot remux with default options.
pub fn remux_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    config: DoviConfig,
) -> Result<RewriteSummary> {
    Remuxer::new(config).remux(input, output)
}
