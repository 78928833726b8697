use crate::core::geo::LatLng;
use serde::{Deserialize, Serialize};

/// Which point a double-click supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStep {
    Start,
    End,
}

/// Up to two picked points plus the "awaiting the second point" flag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointSelection {
    pt1: Option<LatLng>,
    pt2: Option<LatLng>,
    awaiting_second: bool,
}

impl PointSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a picked point as the start or the end, depending on the flag
    pub fn record(&mut self, point: LatLng) -> SelectionStep {
        if self.awaiting_second {
            self.pt2 = Some(point);
            self.awaiting_second = false;
            SelectionStep::End
        } else {
            self.pt1 = Some(point);
            self.pt2 = None;
            self.awaiting_second = true;
            SelectionStep::Start
        }
    }

    /// Hands out both points once they are present and resets the selection
    pub fn take_pair(&mut self) -> Option<(LatLng, LatLng)> {
        match (self.pt1, self.pt2) {
            (Some(a), Some(b)) => {
                self.reset();
                Some((a, b))
            }
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn start(&self) -> Option<LatLng> {
        self.pt1
    }

    pub fn end(&self) -> Option<LatLng> {
        self.pt2
    }

    pub fn is_awaiting_second(&self) -> bool {
        self.awaiting_second
    }

    pub fn is_empty(&self) -> bool {
        self.pt1.is_none() && self.pt2.is_none() && !self.awaiting_second
    }

    /// Instruction for whichever point comes next
    pub fn hint(&self) -> &'static str {
        if self.awaiting_second {
            "double click to add ending point"
        } else {
            "double click to add starting point"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_points_complete_a_pair() {
        let mut selection = PointSelection::new();
        assert!(selection.is_empty());
        assert_eq!(selection.hint(), "double click to add starting point");

        assert_eq!(selection.record(LatLng::new(40.2, -76.2)), SelectionStep::Start);
        assert!(selection.is_awaiting_second());
        assert!(selection.take_pair().is_none());
        assert_eq!(selection.hint(), "double click to add ending point");

        assert_eq!(selection.record(LatLng::new(40.25, -76.15)), SelectionStep::End);
        assert!(!selection.is_awaiting_second());

        let (a, b) = selection.take_pair().unwrap();
        assert_eq!(a, LatLng::new(40.2, -76.2));
        assert_eq!(b, LatLng::new(40.25, -76.15));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_new_cycle_does_not_reuse_stale_end() {
        let mut selection = PointSelection::new();
        selection.record(LatLng::new(40.2, -76.2));
        selection.record(LatLng::new(40.25, -76.15));
        selection.take_pair();

        selection.record(LatLng::new(40.21, -76.19));
        assert_eq!(selection.start(), Some(LatLng::new(40.21, -76.19)));
        assert_eq!(selection.end(), None);
        assert!(selection.take_pair().is_none());
    }
}
