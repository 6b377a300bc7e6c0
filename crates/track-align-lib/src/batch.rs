//! Aligner - Two-pass batch engine for GPX time alignment
//!
//! This module provides the high-level API: validate an alignment request,
//! discover the crossing of every input file, resolve the batch reference
//! time and emit time-shifted copies. The phases are exposed separately so a
//! host can inspect the discovery before anything is written.

use crate::{
    AlignError, BatchResult, Crossing, CrossingResult, FileFailure, FileReport, FileStatus,
    Phase, Progress, ProgressSink, Result, Track, locate_crossing, utils,
};

use geo::Point;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// Alignment point and search radius, validated on construction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentRequest {
    /// Alignment point (x = longitude, y = latitude, degrees)
    reference: Point<f64>,
    /// Maximum distance in meters for a point to count as a crossing
    radius_meters: f64,
}

impl AlignmentRequest {
    /// Validate and build a request
    ///
    /// Fails with [`AlignError::InvalidParameter`] when the latitude is outside
    /// [-90, 90], the longitude outside [-180, 180] or the radius is not
    /// strictly positive (NaN is rejected everywhere).
    pub fn new(latitude: f64, longitude: f64, radius_meters: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(AlignError::InvalidParameter(format!(
                "latitude must be between -90 and 90, got {latitude}"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(AlignError::InvalidParameter(format!(
                "longitude must be between -180 and 180, got {longitude}"
            )));
        }
        if !(radius_meters > 0.0) {
            return Err(AlignError::InvalidParameter(format!(
                "radius must be greater than 0, got {radius_meters}"
            )));
        }

        Ok(Self {
            reference: Point::new(longitude, latitude),
            radius_meters,
        })
    }

    #[inline]
    pub fn reference(&self) -> Point<f64> {
        self.reference
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.reference.y()
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.reference.x()
    }

    #[inline]
    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }
}

/// Pass-one outcome for a single file
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredFile {
    /// File name, used as the output name and the report key
    pub name: String,
    /// Full input path
    pub path: PathBuf,
    /// The file's crossing, or why it has none
    pub outcome: std::result::Result<Crossing, FileFailure>,
}

/// Result of the discovery pass, in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discovery {
    pub files: Vec<DiscoveredFile>,
}

impl Discovery {
    /// The earliest crossing time across all files that have one
    pub fn reference_time(&self) -> Option<OffsetDateTime> {
        self.crossings().map(|(_, crossing)| crossing.time).min()
    }

    /// Files with a crossing, in input order
    pub fn crossings(&self) -> impl Iterator<Item = (&DiscoveredFile, &Crossing)> {
        self.files
            .iter()
            .filter_map(|file| file.outcome.as_ref().ok().map(|crossing| (file, crossing)))
    }

    pub fn get(&self, name: &str) -> Option<&DiscoveredFile> {
        self.files.iter().find(|file| file.name == name)
    }
}

/// The alignment engine
///
/// Single-threaded and non-reentrant: files are handled one at a time and
/// the discovery pass completes before anything is written.
#[derive(Debug, Clone)]
pub struct Aligner {
    request: AlignmentRequest,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Aligner {
    /// Create an aligner, validating the parameters
    pub fn new(latitude: f64, longitude: f64, radius_meters: f64) -> Result<Self> {
        Ok(Self::from_request(AlignmentRequest::new(
            latitude,
            longitude,
            radius_meters,
        )?))
    }

    pub fn from_request(request: AlignmentRequest) -> Self {
        Self { request }
    }

    #[inline]
    pub fn request(&self) -> &AlignmentRequest {
        &self.request
    }

    /// Locate the crossing of an already parsed track
    pub fn locate(&self, track: &Track) -> CrossingResult {
        locate_crossing(track, self.request.reference, self.request.radius_meters)
    }

    /// Align every track file of `input_dir`, writing the copies into `output_dir`
    ///
    /// Both directories must exist. Setup problems are returned as errors
    /// before any file is opened; per-file problems are reported inside the
    /// [`BatchResult`].
    pub fn compute_batch(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        on_progress: Option<&mut dyn FnMut(&Progress)>,
    ) -> Result<BatchResult> {
        check_output_dir(output_dir)?;
        let files = find_track_files(input_dir)?;
        self.compute_batch_files(&files, output_dir, on_progress)
    }

    /// Align an explicit list of track files, writing the copies into `output_dir`
    pub fn compute_batch_files(
        &self,
        files: &[PathBuf],
        output_dir: &Path,
        on_progress: Option<&mut dyn FnMut(&Progress)>,
    ) -> Result<BatchResult> {
        check_output_dir(output_dir)?;
        if files.is_empty() {
            return Err(AlignError::InvalidParameter(
                "no track files given".to_string(),
            ));
        }

        let mut names = BTreeSet::new();
        for path in files {
            let name = file_name(path);
            if !names.insert(name.clone()) {
                return Err(AlignError::InvalidParameter(format!(
                    "duplicate file name {name}: outputs would overwrite each other"
                )));
            }
        }

        tracing::info!(
            "Aligning {} GPX files on ({}, {}) within {} m",
            files.len(),
            self.request.latitude(),
            self.request.longitude(),
            self.request.radius_meters
        );

        let mut sink = ProgressSink::new(on_progress);
        let discovery = self.discover_with(files, &mut sink);
        Ok(self.emit_with(&discovery, output_dir, &mut sink))
    }

    /// Pass one: parse every file and locate its crossing
    pub fn discover(
        &self,
        files: &[PathBuf],
        on_progress: Option<&mut dyn FnMut(&Progress)>,
    ) -> Discovery {
        self.discover_with(files, &mut ProgressSink::new(on_progress))
    }

    /// Pass two: shift and write every file that has a crossing
    ///
    /// When no file has a crossing nothing is written and every file is
    /// reported with its discovery failure.
    pub fn emit(
        &self,
        discovery: &Discovery,
        output_dir: &Path,
        on_progress: Option<&mut dyn FnMut(&Progress)>,
    ) -> BatchResult {
        self.emit_with(discovery, output_dir, &mut ProgressSink::new(on_progress))
    }

    fn discover_with(&self, files: &[PathBuf], sink: &mut ProgressSink<'_>) -> Discovery {
        let total = files.len();
        let mut discovery = Discovery {
            files: Vec::with_capacity(total),
        };

        for (index, path) in files.iter().enumerate() {
            let name = file_name(path);
            let outcome = self.discover_file(path);

            match &outcome {
                Ok(crossing) => tracing::debug!(
                    "{name}: crossing at {} ({:.1} m)",
                    crossing.time,
                    crossing.distance_meters
                ),
                Err(reason) => tracing::warn!("{name}: {reason}"),
            }

            sink.notify(|| Progress {
                phase: Phase::Discovery,
                index,
                total,
                file_name: name.clone(),
                status: match &outcome {
                    Ok(crossing) => FileStatus::CrossingFound {
                        time: crossing.time,
                        distance_meters: crossing.distance_meters,
                    },
                    Err(reason) => FileStatus::Failed(reason.clone()),
                },
            });

            discovery.files.push(DiscoveredFile {
                name,
                path: path.clone(),
                outcome,
            });
        }

        discovery
    }

    fn discover_file(&self, path: &Path) -> std::result::Result<Crossing, FileFailure> {
        let track = Track::read(path).map_err(|e| FileFailure::Parse {
            message: e.to_string(),
        })?;

        match self.locate(&track) {
            CrossingResult::Found(crossing) => Ok(crossing),
            CrossingResult::NotFound(miss) => Err(FileFailure::NoCrossing {
                radius_meters: self.request.radius_meters,
                miss,
            }),
        }
    }

    fn emit_with(
        &self,
        discovery: &Discovery,
        output_dir: &Path,
        sink: &mut ProgressSink<'_>,
    ) -> BatchResult {
        let total = discovery.files.len();
        let mut result = BatchResult::default();

        let Some(reference_time) = discovery.reference_time() else {
            tracing::warn!(
                "No file passes within {} m of the alignment point, nothing written",
                self.request.radius_meters
            );
            for file in &discovery.files {
                if let Err(reason) = &file.outcome {
                    result.record(
                        file.name.clone(),
                        FileReport::Failed {
                            reason: reason.clone(),
                        },
                    );
                }
            }
            return result;
        };

        tracing::info!("Using reference time: {reference_time}");
        result.reference_time = Some(reference_time);

        let canonical_output = std::fs::canonicalize(output_dir).ok();

        for (index, file) in discovery.files.iter().enumerate() {
            let crossing = match &file.outcome {
                Ok(crossing) => crossing,
                Err(reason) => {
                    result.record(
                        file.name.clone(),
                        FileReport::Failed {
                            reason: reason.clone(),
                        },
                    );
                    continue;
                }
            };

            let report = self
                .emit_file(
                    file,
                    crossing,
                    reference_time,
                    output_dir,
                    canonical_output.as_deref(),
                )
                .unwrap_or_else(|reason| FileReport::Failed { reason });

            let status = match &report {
                FileReport::Aligned { time_offset, .. } => {
                    tracing::info!(
                        "Aligned {} (offset: {})",
                        file.name,
                        utils::format_offset(*time_offset)
                    );
                    FileStatus::Aligned {
                        time_offset: *time_offset,
                    }
                }
                FileReport::Failed { reason } => {
                    tracing::warn!("Failed to align {}: {reason}", file.name);
                    FileStatus::Failed(reason.clone())
                }
            };

            sink.notify(|| Progress {
                phase: Phase::Emit,
                index,
                total,
                file_name: file.name.clone(),
                status,
            });

            result.record(file.name.clone(), report);
        }

        result
    }

    fn emit_file(
        &self,
        file: &DiscoveredFile,
        crossing: &Crossing,
        reference_time: OffsetDateTime,
        output_dir: &Path,
        canonical_output: Option<&Path>,
    ) -> std::result::Result<FileReport, FileFailure> {
        let output_path = output_dir.join(&file.name);

        // Never overwrite the source, even when both directories are the same
        let input_dir = file.path.parent().and_then(|dir| {
            let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
            std::fs::canonicalize(dir).ok()
        });
        if input_dir.is_some() && input_dir.as_deref() == canonical_output {
            return Err(FileFailure::OutputWrite {
                message: format!("{} would overwrite the input file", output_path.display()),
            });
        }

        let time_offset = crossing.time - reference_time;

        let mut track = Track::read(&file.path).map_err(|e| FileFailure::Parse {
            message: e.to_string(),
        })?;
        let write_failure = |e: AlignError| FileFailure::OutputWrite {
            message: e.to_string(),
        };
        let points_shifted = track.shift_timestamps(time_offset).map_err(write_failure)?;
        track.write(&output_path).map_err(write_failure)?;

        Ok(FileReport::Aligned {
            time_offset,
            original_crossing_time: crossing.time,
            distance_meters: crossing.distance_meters,
            points_shifted,
            output_path,
        })
    }
}

/// List the track files (`*.gpx`, any case) directly inside `dir`, sorted by name
///
/// Fails with [`AlignError::InvalidParameter`] if `dir` is not a directory and
/// with [`AlignError::NoInputFiles`] if it holds no track file.
pub fn find_track_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(AlignError::InvalidParameter(format!(
            "input directory {} does not exist",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && utils::is_track_file(&path) {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(AlignError::NoInputFiles(dir.to_path_buf()));
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    tracing::debug!("Found {} GPX files in {}", files.len(), dir.display());
    Ok(files)
}

fn check_output_dir(output_dir: &Path) -> Result<()> {
    if output_dir.is_dir() {
        Ok(())
    } else {
        Err(AlignError::InvalidParameter(format!(
            "output directory {} does not exist",
            output_dir.display()
        )))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
