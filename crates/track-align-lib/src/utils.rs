//! Utility functions for distances, GPX timestamps and file filtering

use geo::Point;
use std::path::Path;
use time::{Duration, OffsetDateTime};

/// Mean Earth radius in meters used by the spherical distance model
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// File extension (compared case-insensitively) of the track files handled
pub const TRACK_FILE_EXTENSION: &str = "gpx";

/// Great-circle distance in meters between two WGS84 positions given in degrees
///
/// Uses the Haversine formula on a sphere of radius [`EARTH_RADIUS_M`]. No
/// range validation is done here; NaN inputs yield NaN.
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Distance in meters from a GPX waypoint to a reference point (x = lon, y = lat)
#[inline]
pub fn waypoint_distance(waypoint: &gpx::Waypoint, reference: Point<f64>) -> f64 {
    let point = waypoint.point();
    haversine_distance(reference.y(), reference.x(), point.y(), point.x())
}

/// Timestamp of a waypoint, if the device recorded one
#[inline]
pub fn waypoint_time(waypoint: &gpx::Waypoint) -> Option<OffsetDateTime> {
    waypoint.time.map(OffsetDateTime::from)
}

/// Replace the timestamp of a waypoint
#[inline]
pub fn set_waypoint_time(waypoint: &mut gpx::Waypoint, time: OffsetDateTime) {
    waypoint.time = Some(time.into());
}

/// Format a signed duration as `+H:MM:SS`, with any fractional second appended
pub fn format_offset(offset: Duration) -> String {
    let sign = if offset.is_negative() { '-' } else { '+' };
    let abs = offset.abs();
    let total = abs.whole_seconds();
    let (hours, minutes, seconds) = (total / 3600, (total / 60) % 60, total % 60);
    let nanos = abs.subsec_nanoseconds();

    // Shortest of milli, micro or nanosecond precision that loses nothing
    let fraction = if nanos == 0 {
        String::new()
    } else if nanos % 1_000_000 == 0 {
        format!(".{:03}", nanos / 1_000_000)
    } else if nanos % 1_000 == 0 {
        format!(".{:06}", nanos / 1_000)
    } else {
        format!(".{nanos:09}")
    };

    format!("{sign}{hours}:{minutes:02}:{seconds:02}{fraction}")
}

/// Whether a path names a track file (`*.gpx`, any case)
pub fn is_track_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TRACK_FILE_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_self_is_zero() {
        for &(lat, lon) in &[(0.0, 0.0), (51.5074, -0.1278), (-33.86, 151.2), (89.9, 179.9)] {
            assert_eq!(haversine_distance(lat, lon, lat, lon), 0.0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = (21.270889, -157.71612);
        let b = (21.2712, -157.7158);
        let ab = haversine_distance(a.0, a.1, b.0, b.1);
        let ba = haversine_distance(b.0, b.1, a.0, a.1);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let dist = haversine_distance(0.0, 0.0, 0.0, 1.0);
        // 2 * PI * R / 360
        assert!((dist - 111_194.93).abs() < 1.0);
    }

    #[test]
    fn test_distance_increases_along_bearing() {
        let (lat, lon) = (51.5074, -0.1278);
        let mut previous = 0.0;
        for step in 1..50 {
            let d = haversine_distance(lat, lon, lat + step as f64 * 0.001, lon);
            assert!(d > previous);
            previous = d;
        }
    }

    #[test]
    fn test_nan_propagates() {
        assert!(haversine_distance(f64::NAN, 0.0, 0.0, 0.0).is_nan());
    }

    #[test]
    fn test_waypoint_distance_uses_lat_lon_order() {
        let waypoint = gpx::Waypoint::new(Point::new(-157.71612, 21.270889));
        let reference = Point::new(-157.71612, 21.270889);
        assert!(waypoint_distance(&waypoint, reference) < 1e-6);
    }

    #[test]
    fn test_waypoint_time_roundtrip() {
        let mut waypoint = gpx::Waypoint::new(Point::new(0.0, 0.0));
        assert!(waypoint_time(&waypoint).is_none());

        let t = OffsetDateTime::from_unix_timestamp(1_714_557_608).unwrap();
        set_waypoint_time(&mut waypoint, t);
        assert_eq!(waypoint_time(&waypoint), Some(t));
    }

    #[test]
    fn test_format_offset() {
        assert_eq!(format_offset(Duration::seconds(7)), "+0:00:07");
        assert_eq!(format_offset(Duration::seconds(-3723)), "-1:02:03");
        assert_eq!(format_offset(Duration::milliseconds(1_250)), "+0:00:01.250");
        assert_eq!(format_offset(Duration::ZERO), "+0:00:00");
    }

    #[test]
    fn test_format_offset_keeps_sub_millisecond_precision() {
        assert_eq!(format_offset(Duration::microseconds(400)), "+0:00:00.000400");
        assert_eq!(format_offset(Duration::microseconds(-2_000_050)), "-0:00:02.000050");
        assert_eq!(format_offset(Duration::nanoseconds(1_500_000_001)), "+0:00:01.500000001");
    }

    #[test]
    fn test_is_track_file() {
        assert!(is_track_file(Path::new("ride.gpx")));
        assert!(is_track_file(Path::new("/data/RIDE.GPX")));
        assert!(is_track_file(Path::new("mixed.GpX")));
        assert!(!is_track_file(Path::new("notes.txt")));
        assert!(!is_track_file(Path::new("gpx")));
        assert!(!is_track_file(Path::new("archive.gpx.zip")));
    }
}
