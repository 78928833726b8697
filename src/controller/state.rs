use crate::{
    core::geo::LatLng,
    measure::{MeasuredSegment, PointSelection},
};

pub type SubscriptionId = usize;

type Subscriber<T> = Box<dyn Fn(&T) + Send + Sync>;

/// A value whose subscribers are notified after every update
pub struct Observable<T> {
    value: T,
    subscribers: Vec<(SubscriptionId, Subscriber<T>)>,
    next_id: SubscriptionId,
}

impl<T> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        before != self.subscribers.len()
    }

    /// Mutates the value and notifies every subscriber
    pub fn update<F>(&mut self, f: F)
    where
        F: FnOnce(&mut T),
    {
        f(&mut self.value);
        for (_, subscriber) in &self.subscribers {
            subscriber(&self.value);
        }
    }
}

/// Everything the view presents: camera, pending points and the last measurement
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub center: LatLng,
    pub zoom: f64,
    pub selection: PointSelection,
    pub segment: Option<MeasuredSegment>,
    /// Pointer is over the trail line
    pub hovering_trail: bool,
}

impl ViewState {
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            selection: PointSelection::new(),
            segment: None,
            hovering_trail: false,
        }
    }

    /// Center to 4 decimals and zoom to 2
    pub fn position_text(&self) -> String {
        format!(
            "Longitude: {:.4} | Latitude: {:.4} | Zoom: {:.2}",
            self.center.lng, self.center.lat, self.zoom
        )
    }

    pub fn distance_text(&self) -> Option<String> {
        self.segment.as_ref().map(|s| s.display_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[test]
    fn test_subscribers_see_every_update() {
        let mut state = Observable::new(ViewState::new(LatLng::new(40.25, -76.13), 9.9));
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let id = state.subscribe(move |s: &ViewState| {
            assert!(s.zoom > 9.9);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        state.update(|s| s.zoom = 10.5);
        state.update(|s| s.zoom = 11.0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(state.unsubscribe(id));
        state.update(|s| s.zoom = 12.0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!state.unsubscribe(id));
    }

    #[test]
    fn test_position_text() {
        let state = ViewState::new(LatLng::new(40.25, -76.13), 9.9);
        assert_eq!(
            state.position_text(),
            "Longitude: -76.1300 | Latitude: 40.2500 | Zoom: 9.90"
        );
        assert_eq!(state.distance_text(), None);
    }
}
