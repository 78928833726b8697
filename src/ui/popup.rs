use crate::{
    core::{
        geo::{LatLng, Point},
        viewport::Viewport,
    },
    prelude::HashMap,
};
use std::time::{Duration, Instant};

/// Text bubble anchored to a geographic position
#[derive(Debug, Clone)]
pub struct Popup {
    pub id: String,
    pub position: LatLng,
    pub content: String,
    /// Screen offset from the anchor, in pixels
    pub offset: Point,
    pub visible: bool,
    pub created_at: Instant,
    pub auto_close_duration: Option<Duration>,
}

impl Popup {
    pub fn new(id: impl Into<String>, position: LatLng, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position,
            content: content.into(),
            offset: Point::new(0.0, 0.0),
            visible: true,
            created_at: Instant::now(),
            auto_close_duration: None,
        }
    }

    pub fn with_offset(mut self, offset: Point) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_auto_close(mut self, duration: Duration) -> Self {
        self.auto_close_duration = Some(duration);
        self
    }

    pub fn show(&mut self) {
        self.visible = true;
        self.created_at = Instant::now();
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn should_auto_close(&self) -> bool {
        self.auto_close_duration
            .is_some_and(|duration| self.created_at.elapsed() >= duration)
    }

    /// Container pixel where the popup's top-left corner goes
    pub fn screen_position(&self, viewport: &Viewport) -> Point {
        viewport.lat_lng_to_pixel(&self.position).add(&self.offset)
    }
}

/// Popups by ID; adding an existing ID replaces that popup
#[derive(Debug, Default)]
pub struct PopupManager {
    popups: HashMap<String, Popup>,
}

impl PopupManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_popup(&mut self, popup: Popup) {
        self.popups.insert(popup.id.clone(), popup);
    }

    pub fn remove_popup(&mut self, id: &str) -> Option<Popup> {
        self.popups.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Popup> {
        self.popups.get(id)
    }

    pub fn show_popup(&mut self, id: &str) {
        if let Some(popup) = self.popups.get_mut(id) {
            popup.show();
        }
    }

    pub fn hide_popup(&mut self, id: &str) {
        if let Some(popup) = self.popups.get_mut(id) {
            popup.hide();
        }
    }

    /// Drops popups whose auto-close time has passed; returns whether any went
    pub fn update(&mut self) -> bool {
        let before = self.popups.len();
        self.popups.retain(|id, popup| {
            let expired = popup.should_auto_close();
            if expired {
                log::debug!("popup '{}' closed", id);
            }
            !expired
        });
        before != self.popups.len()
    }

    pub fn visible_popups(&self) -> impl Iterator<Item = &Popup> {
        self.popups.values().filter(|p| p.visible)
    }

    pub fn clear(&mut self) {
        self.popups.clear();
    }

    pub fn len(&self) -> usize {
        self.popups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.popups.is_empty()
    }

    pub fn visible_count(&self) -> usize {
        self.visible_popups().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_id_replaces_popup() {
        let mut manager = PopupManager::new();
        let at = LatLng::new(40.25, -76.15);

        manager.add_popup(Popup::new("tooltip", at, "double click to add starting point"));
        manager.add_popup(Popup::new("tooltip", at, "double click to add ending point"));

        assert_eq!(manager.len(), 1);
        assert_eq!(
            manager.get("tooltip").map(|p| p.content.as_str()),
            Some("double click to add ending point")
        );
    }

    #[test]
    fn test_auto_close() {
        let mut manager = PopupManager::new();
        let at = LatLng::new(40.25, -76.15);
        manager.add_popup(Popup::new("hint", at, "now").with_auto_close(Duration::ZERO));
        manager.add_popup(Popup::new("sticky", at, "stays"));

        assert!(manager.update());
        assert!(manager.get("hint").is_none());
        assert_eq!(manager.visible_count(), 1);
        assert!(!manager.update());
    }

    #[test]
    fn test_screen_position_applies_offset() {
        let viewport = Viewport::new(LatLng::new(40.25, -76.15), 12.0, Point::new(800.0, 600.0));
        let popup = Popup::new("tooltip", LatLng::new(40.25, -76.15), "hi")
            .with_offset(Point::new(12.0, -12.0));

        let pos = popup.screen_position(&viewport);
        assert!((pos.x - 412.0).abs() < 1e-6);
        assert!((pos.y - 288.0).abs() < 1e-6);
    }
}
