//! Crossing detection: where a track first enters the alignment radius

use crate::{PointIndex, Track, utils};
use geo::Point;
use time::OffsetDateTime;

/// The first timestamped point of a track within the alignment radius
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Crossing {
    /// Original timestamp of the crossing point
    pub time: OffsetDateTime,
    /// Distance from the alignment point in meters
    pub distance_meters: f64,
    /// Where the point sits in the GPX document
    pub index: PointIndex,
}

/// Why a track has no crossing
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Miss {
    /// No track point carries a timestamp
    NoTimestampedPoints,
    /// Timestamped points exist but none is within the radius
    OutsideRadius {
        /// Closest timestamped point seen, for diagnostics only
        closest_meters: f64,
    },
}

/// Outcome of [`locate_crossing`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CrossingResult {
    Found(Crossing),
    NotFound(Miss),
}

impl CrossingResult {
    pub fn is_found(&self) -> bool {
        matches!(self, CrossingResult::Found(_))
    }

    pub fn crossing(&self) -> Option<&Crossing> {
        match self {
            CrossingResult::Found(crossing) => Some(crossing),
            CrossingResult::NotFound(_) => None,
        }
    }
}

/// Find the first point, in file order, that is timestamped and within
/// `radius_meters` of `reference` (x = longitude, y = latitude)
///
/// The search stops at the first qualifying point: a track passing the
/// alignment point several times (out-and-back, laps) is aligned on its
/// first pass, even if a later pass comes closer.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn locate_crossing(track: &Track, reference: Point<f64>, radius_meters: f64) -> CrossingResult {
    let mut closest: Option<f64> = None;

    for (index, waypoint) in track.points() {
        let Some(time) = utils::waypoint_time(waypoint) else {
            continue;
        };

        let distance = utils::waypoint_distance(waypoint, reference);
        if distance <= radius_meters {
            return CrossingResult::Found(Crossing {
                time,
                distance_meters: distance,
                index,
            });
        }

        if closest.is_none_or(|c| distance < c) {
            closest = Some(distance);
        }
    }

    CrossingResult::NotFound(match closest {
        Some(closest_meters) => Miss::OutsideRadius { closest_meters },
        None => Miss::NoTimestampedPoints,
    })
}
