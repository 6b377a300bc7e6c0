//! Track Align Library - Time alignment of GPX track recordings
//!
//! This library shifts the clocks of several GPX recordings so that every track
//! reaches a shared geographic alignment point at the same instant. Each track's
//! *crossing* is the first timestamped point (in file order) within a radius of
//! the alignment point; the earliest crossing of the batch becomes the reference
//! time and every other track is moved back by its distance to it.
//!
//! # Architecture
//!
//! - **[`utils`]**: Haversine distance evaluator and GPX time helpers
//! - **[`Track`]**: One parsed GPX document with precomputed metadata
//! - **[`locate_crossing`]**: First-pass proximity search over a single track
//! - **[`Aligner`]**: Two-pass batch engine (discover, resolve, emit)
//!
//! # Example
//!
//! ```no_run
//! use track_align_lib::Aligner;
//!
//! # fn main() -> track_align_lib::Result<()> {
//! let aligner = Aligner::new(21.270889, -157.71612, 200.0)?;
//! let result = aligner.compute_batch("in".as_ref(), "out".as_ref(), None)?;
//! println!("{} of {} files aligned", result.succeeded, result.processed);
//! # Ok(())
//! # }
//! ```

mod batch;
mod crossing;
mod report;
mod track;
pub mod utils;

// Public API exports
pub use batch::{Aligner, AlignmentRequest, DiscoveredFile, Discovery, find_track_files};
pub use crossing::{Crossing, CrossingResult, Miss, locate_crossing};
pub use report::{
    BatchResult, BatchStatus, FileFailure, FileReport, FileStatus, Phase, Progress,
    ProgressSink,
};
pub use track::{PointIndex, Track};

use std::path::PathBuf;

/// Error types for the alignment engine
#[derive(Debug, thiserror::Error)]
pub enum AlignError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("No GPX files found in {}", .0.display())]
    NoInputFiles(PathBuf),

    #[error("GPX parsing error: {0}")]
    FileParse(#[from] gpx::errors::GpxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timestamp shift out of range")]
    TimeOverflow,
}

pub type Result<T> = std::result::Result<T, AlignError>;
