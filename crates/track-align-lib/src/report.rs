//! Batch report and progress types
//!
//! Everything a host needs to render the outcome of an alignment run lives
//! here: the per-file reports merged into a [`BatchResult`], and the
//! [`Progress`] notifications delivered while the batch is running.

use crate::Miss;
use std::collections::BTreeMap;
use std::path::PathBuf;
use time::{Duration, OffsetDateTime};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Why a single file could not be aligned
///
/// The `Display` text is meant for end users and always starts with one of
/// "could not parse", "no point within radius" or "could not write output".
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum FileFailure {
    #[error("could not parse: {message}")]
    Parse { message: String },

    #[error("no point within radius ({radius_meters} m) of alignment point{}", miss_detail(.miss))]
    NoCrossing { radius_meters: f64, miss: Miss },

    #[error("could not write output: {message}")]
    OutputWrite { message: String },
}

fn miss_detail(miss: &Miss) -> String {
    match miss {
        Miss::NoTimestampedPoints => " (track has no timestamps)".to_string(),
        Miss::OutsideRadius { closest_meters } => format!(" (closest {closest_meters:.1} m)"),
    }
}

/// Outcome for one input file
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "snake_case"))]
pub enum FileReport {
    Aligned {
        /// Duration subtracted from every timestamp of the file (never negative)
        #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_seconds"))]
        time_offset: Duration,
        /// Crossing timestamp before the shift
        #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
        original_crossing_time: OffsetDateTime,
        /// Distance of the crossing point from the alignment point
        distance_meters: f64,
        /// Number of track points whose timestamp was rewritten
        points_shifted: usize,
        /// Where the aligned copy was written
        output_path: PathBuf,
    },
    Failed {
        #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_display"))]
        reason: FileFailure,
    },
}

impl FileReport {
    pub fn is_aligned(&self) -> bool {
        matches!(self, FileReport::Aligned { .. })
    }

    /// Amount subtracted from the file's timestamps
    pub fn time_offset(&self) -> Option<Duration> {
        match self {
            FileReport::Aligned { time_offset, .. } => Some(*time_offset),
            FileReport::Failed { .. } => None,
        }
    }

    /// Shift applied to the file's clock (the negated offset)
    pub fn shift_applied(&self) -> Option<Duration> {
        self.time_offset().map(|offset| -offset)
    }

    pub fn failure(&self) -> Option<&FileFailure> {
        match self {
            FileReport::Failed { reason } => Some(reason),
            FileReport::Aligned { .. } => None,
        }
    }
}

/// Overall classification of a finished batch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every file was aligned and written
    Complete,
    /// Some files were aligned, others failed
    Partial,
    /// No file crossed the alignment radius; nothing was written
    NoAlignmentAchievable,
    /// A reference time was found but no aligned copy could be written
    Failed,
}

/// Result of a whole alignment run
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BatchResult {
    /// Number of input files considered
    pub processed: usize,
    /// Files aligned and written
    pub succeeded: usize,
    /// Files that failed in either pass
    pub failed: usize,
    /// Earliest crossing time of the batch (None when nothing crossed)
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339::option"))]
    pub reference_time: Option<OffsetDateTime>,
    /// Per-file outcome keyed by file name
    pub files: BTreeMap<String, FileReport>,
}

impl BatchResult {
    /// Merge one file's outcome into the report
    pub(crate) fn record(&mut self, file_name: String, report: FileReport) {
        self.processed += 1;
        if report.is_aligned() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.files.insert(file_name, report);
    }

    pub fn status(&self) -> BatchStatus {
        if self.reference_time.is_none() {
            BatchStatus::NoAlignmentAchievable
        } else if self.succeeded == 0 {
            BatchStatus::Failed
        } else if self.failed == 0 {
            BatchStatus::Complete
        } else {
            BatchStatus::Partial
        }
    }

    /// Aligned files in name order
    pub fn aligned(&self) -> impl Iterator<Item = (&str, &FileReport)> {
        self.files
            .iter()
            .filter(|(_, report)| report.is_aligned())
            .map(|(name, report)| (name.as_str(), report))
    }

    /// Failed files in name order
    pub fn failures(&self) -> impl Iterator<Item = (&str, &FileFailure)> {
        self.files
            .iter()
            .filter_map(|(name, report)| report.failure().map(|f| (name.as_str(), f)))
    }
}

/// Which pass of the batch a notification belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Parsing each file and locating its crossing
    Discovery,
    /// Shifting timestamps and writing the aligned copies
    Emit,
}

/// What happened to a file in the pass being reported
#[derive(Clone, Debug, PartialEq)]
pub enum FileStatus {
    CrossingFound {
        time: OffsetDateTime,
        distance_meters: f64,
    },
    Aligned {
        time_offset: Duration,
    },
    Failed(FileFailure),
}

/// Notification sent after each file completes a pass
#[derive(Clone, Debug, PartialEq)]
pub struct Progress {
    pub phase: Phase,
    /// Zero-based position of the file in the batch
    pub index: usize,
    /// Number of files in the batch
    pub total: usize,
    pub file_name: String,
    pub status: FileStatus,
}

/// Optional observer for progress notifications
///
/// Purely observational: whether a callback is present never changes what
/// the engine computes or writes.
pub struct ProgressSink<'a> {
    callback: Option<&'a mut dyn FnMut(&Progress)>,
}

impl<'a> ProgressSink<'a> {
    pub fn new(callback: Option<&'a mut dyn FnMut(&Progress)>) -> Self {
        Self { callback }
    }

    pub fn none() -> Self {
        Self { callback: None }
    }

    pub(crate) fn notify(&mut self, progress: impl FnOnce() -> Progress) {
        if let Some(callback) = self.callback.as_deref_mut() {
            callback(&progress());
        }
    }
}

#[cfg(feature = "serde")]
fn serialize_seconds<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_seconds_f64())
}

#[cfg(feature = "serde")]
fn serialize_display<T: std::fmt::Display, S: serde::Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
