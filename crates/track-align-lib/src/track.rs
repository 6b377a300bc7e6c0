//! Track storage and parsing module
//!
//! This module provides the `Track` struct wrapping one parsed GPX document,
//! with metadata precomputed in a single pass and in-place timestamp shifting.

use crate::{AlignError, Result, utils};
use std::io::{BufReader, Read};
use std::path::Path;
use time::{Duration, OffsetDateTime};

/// Position of a point inside the GPX document
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PointIndex {
    /// Index of the track in the document
    pub track: usize,
    /// Index of the segment in the track
    pub segment: usize,
    /// Index of the point in the segment
    pub point: usize,
}

/// A single GPX recording: the raw document plus cached metadata
#[derive(Clone, Debug)]
pub struct Track {
    /// The original GPX data (tracks, waypoints, routes and metadata)
    gpx_data: gpx::Gpx,
    /// Cached number of track points across all tracks and segments
    cached_total_points: usize,
    /// Cached number of track points carrying a timestamp
    cached_timed_points: usize,
    /// Earliest and latest track point timestamps
    cached_time_span: Option<(OffsetDateTime, OffsetDateTime)>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Track {
    /// Wrap already parsed GPX data
    ///
    /// Empty documents are accepted: they simply never produce a crossing.
    pub fn new(gpx_data: gpx::Gpx) -> Self {
        let mut track = Track {
            gpx_data,
            cached_total_points: 0,
            cached_timed_points: 0,
            cached_time_span: None,
        };
        track.refresh_metadata();
        track
    }

    /// Parse a GPX document from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let gpx_data = gpx::read(reader)?;
        Ok(Self::new(gpx_data))
    }

    /// Open and parse a GPX file
    pub fn read(path: &Path) -> Result<Self> {
        #[cfg(feature = "profiling")]
        profiling::scope!("track::read");

        let file = std::fs::File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Compute all metadata in a single pass over the points
    fn refresh_metadata(&mut self) {
        let mut total_points = 0;
        let mut timed_points = 0;
        let mut span: Option<(OffsetDateTime, OffsetDateTime)> = None;

        for (_, waypoint) in self.points() {
            total_points += 1;
            if let Some(time) = utils::waypoint_time(waypoint) {
                timed_points += 1;
                span = Some(match span {
                    Some((first, last)) => (first.min(time), last.max(time)),
                    None => (time, time),
                });
            }
        }

        self.cached_total_points = total_points;
        self.cached_timed_points = timed_points;
        self.cached_time_span = span;
    }

    /// Access the raw GPX data
    #[inline]
    pub fn gpx_data(&self) -> &gpx::Gpx {
        &self.gpx_data
    }

    /// Consume the track, returning the GPX data
    pub fn into_gpx(self) -> gpx::Gpx {
        self.gpx_data
    }

    /// Iterate every track point in file order, flattening tracks and segments
    pub fn points(&self) -> impl Iterator<Item = (PointIndex, &gpx::Waypoint)> + '_ {
        self.gpx_data
            .tracks
            .iter()
            .enumerate()
            .flat_map(|(track, trk)| {
                trk.segments
                    .iter()
                    .enumerate()
                    .flat_map(move |(segment, seg)| {
                        seg.points.iter().enumerate().map(move |(point, waypoint)| {
                            (
                                PointIndex {
                                    track,
                                    segment,
                                    point,
                                },
                                waypoint,
                            )
                        })
                    })
            })
    }

    /// Get a specific track point
    #[inline]
    pub fn get_point(&self, index: PointIndex) -> Option<&gpx::Waypoint> {
        self.gpx_data
            .tracks
            .get(index.track)?
            .segments
            .get(index.segment)?
            .points
            .get(index.point)
    }

    /// Total number of track points. O(1), cached.
    #[inline]
    pub fn total_points(&self) -> usize {
        self.cached_total_points
    }

    /// Number of track points carrying a timestamp. O(1), cached.
    #[inline]
    pub fn timed_points(&self) -> usize {
        self.cached_timed_points
    }

    /// Earliest and latest recorded timestamps, if any point has one
    #[inline]
    pub fn time_span(&self) -> Option<(OffsetDateTime, OffsetDateTime)> {
        self.cached_time_span
    }

    /// Subtract `offset` from every timestamped track point
    ///
    /// Points without a timestamp, waypoints, routes and metadata are left
    /// as they are. Returns the number of rewritten points. On overflow the
    /// track is left unmodified.
    pub fn shift_timestamps(&mut self, offset: Duration) -> Result<usize> {
        #[cfg(feature = "profiling")]
        profiling::scope!("track::shift_timestamps");

        if offset.is_zero() {
            return Ok(self.cached_timed_points);
        }

        // Validate the whole span first so a failure never leaves a half-shifted track
        if let Some((first, last)) = self.cached_time_span {
            if first.checked_sub(offset).is_none() || last.checked_sub(offset).is_none() {
                return Err(AlignError::TimeOverflow);
            }
        }

        let mut shifted = 0;
        for trk in &mut self.gpx_data.tracks {
            for seg in &mut trk.segments {
                for waypoint in &mut seg.points {
                    let Some(time) = utils::waypoint_time(waypoint) else {
                        continue;
                    };
                    let new_time = time.checked_sub(offset).ok_or(AlignError::TimeOverflow)?;
                    utils::set_waypoint_time(waypoint, new_time);
                    shifted += 1;
                }
            }
        }

        self.cached_time_span = self
            .cached_time_span
            .map(|(first, last)| (first - offset, last - offset));

        Ok(shifted)
    }

    /// Serialise the document into memory
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        gpx::write(&self.gpx_data, &mut buffer)?;
        Ok(buffer)
    }

    /// Serialise the document and write it to `path`
    ///
    /// The whole document is serialised before the file is created, so a
    /// serialisation failure never leaves a truncated file behind.
    pub fn write(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
