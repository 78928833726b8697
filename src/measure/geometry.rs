//! Line geometry used to measure along the trail
//!
//! Coordinates are treated as planar lng/lat when projecting a point onto a
//! segment, and distances are great-circle (haversine) on the mean-radius
//! sphere.

use crate::{
    core::{constants::MEAN_EARTH_RADIUS_M, geo::LatLng},
    MapError, Result,
};
use geo::{Closest, ClosestPoint, HaversineDistance, HaversineLength};
use geo_types::{Line, LineString};
use serde::{Deserialize, Serialize};

/// Distance units a measurement can be reported in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Miles,
    Kilometers,
    Meters,
    Feet,
}

impl Units {
    /// Converts a length in meters into this unit
    pub fn from_meters(&self, meters: f64) -> f64 {
        match self {
            Units::Miles => meters / 1609.344,
            Units::Kilometers => meters / 1000.0,
            Units::Meters => meters,
            Units::Feet => meters * 3.28084,
        }
    }

    /// Converts a length in this unit into meters
    pub fn to_meters(&self, value: f64) -> f64 {
        match self {
            Units::Miles => value * 1609.344,
            Units::Kilometers => value * 1000.0,
            Units::Meters => value,
            Units::Feet => value / 3.28084,
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Units::Miles => "mi",
            Units::Kilometers => "km",
            Units::Meters => "m",
            Units::Feet => "ft",
        }
    }

    /// Radius of the earth expressed in this unit
    pub fn earth_radius(&self) -> f64 {
        self.from_meters(MEAN_EARTH_RADIUS_M)
    }
}

impl Default for Units {
    fn default() -> Self {
        Units::Miles
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// Where a point lands when snapped onto a polyline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestPoint {
    /// The snapped coordinate
    pub point: LatLng,
    /// Index of the vertex starting the segment the point landed on
    pub index: usize,
    /// Position within that segment, 0.0 at `index`, 1.0 at `index + 1`
    pub fraction: f64,
    /// Great-circle distance from the query point to `point`, in meters
    pub distance_m: f64,
}

impl NearestPoint {
    /// Ordering key along the line
    fn location(&self) -> (usize, f64) {
        (self.index, self.fraction)
    }
}

/// Snaps `point` onto the closest position along `line`.
///
/// Returns `None` for an empty line.
pub fn nearest_point_on_line(line: &[LatLng], point: LatLng) -> Option<NearestPoint> {
    let target = geo_types::Point::from(point);

    if line.len() == 1 {
        return Some(NearestPoint {
            point: line[0],
            index: 0,
            fraction: 0.0,
            distance_m: target.haversine_distance(&geo_types::Point::from(line[0])),
        });
    }

    let mut best: Option<NearestPoint> = None;
    for (index, pair) in line.windows(2).enumerate() {
        let segment = Line::new(pair[0], pair[1]);
        let snapped = match segment.closest_point(&target) {
            Closest::Intersection(p) | Closest::SinglePoint(p) => p,
            Closest::Indeterminate => geo_types::Point::from(pair[0]),
        };

        let distance_m = target.haversine_distance(&snapped);
        if best.map_or(true, |b| distance_m < b.distance_m) {
            best = Some(NearestPoint {
                point: snapped.into(),
                index,
                fraction: segment_fraction(pair[0], pair[1], snapped.into()),
                distance_m,
            });
        }
    }
    best
}

fn segment_fraction(a: LatLng, b: LatLng, p: LatLng) -> f64 {
    let dx = b.lng - a.lng;
    let dy = b.lat - a.lat;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return 0.0;
    }
    (((p.lng - a.lng) * dx + (p.lat - a.lat) * dy) / len_sq).clamp(0.0, 1.0)
}

/// Slices `line` between the points on it nearest to `start` and `stop`.
///
/// The result always runs in the line's own direction, whichever order the
/// two points are given in.
pub fn line_slice(start: LatLng, stop: LatLng, line: &[LatLng]) -> Result<Vec<LatLng>> {
    if line.len() < 2 {
        return Err(MapError::Geometry(format!(
            "cannot slice a line with {} coordinate(s)",
            line.len()
        )));
    }

    let (Some(a), Some(b)) = (nearest_point_on_line(line, start), nearest_point_on_line(line, stop))
    else {
        return Err(MapError::Geometry("cannot snap to an empty line".to_string()));
    };

    let (first, last) = if a.location() <= b.location() { (a, b) } else { (b, a) };

    let mut sliced = Vec::with_capacity(last.index - first.index + 2);
    sliced.push(first.point);
    for vertex in &line[first.index + 1..=last.index] {
        if sliced.last() != Some(vertex) {
            sliced.push(*vertex);
        }
    }
    if sliced.last() != Some(&last.point) || sliced.len() == 1 {
        sliced.push(last.point);
    }

    Ok(sliced)
}

/// Great-circle length of a polyline in the requested units
pub fn length(line: &[LatLng], units: Units) -> f64 {
    if line.len() < 2 {
        return 0.0;
    }
    let line_string: LineString<f64> = line.iter().map(|p| geo_types::Coord::from(*p)).collect();
    units.from_meters(line_string.haversine_length())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_trail() -> Vec<LatLng> {
        vec![LatLng::new(40.20, -76.20), LatLng::new(40.30, -76.10)]
    }

    fn bent_trail() -> Vec<LatLng> {
        vec![
            LatLng::new(40.0, -76.0),
            LatLng::new(40.0, -75.9),
            LatLng::new(40.1, -75.9),
            LatLng::new(40.1, -75.8),
        ]
    }

    #[test]
    fn test_unit_conversion() {
        assert!((Units::Miles.from_meters(1609.344) - 1.0).abs() < 1e-12);
        assert!((Units::Kilometers.from_meters(2500.0) - 2.5).abs() < 1e-12);
        assert!((Units::Feet.to_meters(Units::Feet.from_meters(42.0)) - 42.0).abs() < 1e-9);
        assert_eq!(Units::Miles.to_string(), "mi");
    }

    #[test]
    fn test_nearest_point_snaps_perpendicular() {
        let line = bent_trail();
        let nearest = nearest_point_on_line(&line, LatLng::new(40.05, -75.85)).unwrap();

        assert_eq!(nearest.index, 1);
        assert!((nearest.point.lng + 75.9).abs() < 1e-12);
        assert!((nearest.point.lat - 40.05).abs() < 1e-12);
        assert!((nearest.fraction - 0.5).abs() < 1e-9);
        assert!(nearest.distance_m > 0.0);
    }

    #[test]
    fn test_nearest_point_on_vertex_has_zero_distance() {
        let line = bent_trail();
        let nearest = nearest_point_on_line(&line, line[2]).unwrap();
        assert_eq!(nearest.point, line[2]);
        assert!(nearest.distance_m < 1e-6);
    }

    #[test]
    fn test_slice_includes_interior_vertices() {
        let line = bent_trail();
        let sliced = line_slice(LatLng::new(40.0, -75.95), LatLng::new(40.1, -75.85), &line).unwrap();

        assert_eq!(
            sliced,
            vec![
                LatLng::new(40.0, -75.95),
                LatLng::new(40.0, -75.9),
                LatLng::new(40.1, -75.9),
                LatLng::new(40.1, -75.85),
            ]
        );
    }

    #[test]
    fn test_slice_is_order_independent() {
        let line = bent_trail();
        let a = LatLng::new(40.0, -75.95);
        let b = LatLng::new(40.1, -75.85);

        assert_eq!(line_slice(a, b, &line).unwrap(), line_slice(b, a, &line).unwrap());
    }

    #[test]
    fn test_slice_within_one_segment() {
        let line = straight_trail();
        let sliced = line_slice(LatLng::new(40.28, -76.12), LatLng::new(40.22, -76.18), &line).unwrap();

        assert_eq!(sliced.len(), 2);
        assert!(sliced[0].lat < sliced[1].lat);
    }

    #[test]
    fn test_slice_of_same_point_has_zero_length() {
        let line = straight_trail();
        let p = LatLng::new(40.25, -76.15);
        let sliced = line_slice(p, p, &line).unwrap();

        assert_eq!(sliced.len(), 2);
        assert!(length(&sliced, Units::Miles) < 1e-9);
    }

    #[test]
    fn test_slice_rejects_short_line() {
        let result = line_slice(
            LatLng::new(40.0, -76.0),
            LatLng::new(40.1, -76.0),
            &[LatLng::new(40.0, -76.0)],
        );
        assert!(matches!(result, Err(MapError::Geometry(_))));
    }

    #[test]
    fn test_length_of_one_degree_of_latitude() {
        let line = vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 0.0)];
        let km = length(&line, Units::Kilometers);
        // pi * R / 180 on the mean-radius sphere
        assert!((km - 111.195).abs() < 0.01);
        assert_eq!(length(&line[..1], Units::Kilometers), 0.0);
    }

    #[test]
    fn test_half_trail_measurement() {
        let line = straight_trail();
        let total = length(&line, Units::Miles);
        let sliced = line_slice(LatLng::new(40.20, -76.20), LatLng::new(40.25, -76.15), &line).unwrap();
        let half = length(&sliced, Units::Miles);

        assert!((half / total - 0.5).abs() < 0.01);
    }
}
