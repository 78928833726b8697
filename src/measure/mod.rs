//! Measuring distances along the trail

pub mod geometry;
pub mod selection;

pub use geometry::{length, line_slice, nearest_point_on_line, NearestPoint, Units};
pub use selection::{PointSelection, SelectionStep};

use crate::{core::geo::LatLng, Result};
use serde::{Deserialize, Serialize};

/// A slice of the trail between two picked points and its length
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasuredSegment {
    /// Point picked first
    pub start: LatLng,
    /// Point picked second
    pub end: LatLng,
    /// Trail geometry between the two snapped points
    pub line: Vec<LatLng>,
    pub length: f64,
    pub units: Units,
}

impl MeasuredSegment {
    /// Slices `trail` between `start` and `end` and measures the result
    pub fn measure(trail: &[LatLng], start: LatLng, end: LatLng, units: Units) -> Result<Self> {
        let line = line_slice(start, end, trail)?;
        let length = length(&line, units);
        Ok(Self {
            start,
            end,
            line,
            length,
            units,
        })
    }

    /// Same measurement expressed in other units
    pub fn length_in(&self, units: Units) -> f64 {
        units.from_meters(self.units.to_meters(self.length))
    }

    pub fn display_text(&self) -> String {
        format!("{:.2} {}", self.length, self.units)
    }
}
