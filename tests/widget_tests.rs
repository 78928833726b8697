#![cfg(feature = "egui")]

use egui::{Context, Event, Pos2, RawInput, Rect, Vec2};
use trailmeter::{
    controller::TRAIL_ID, ui::TrailMapView, LatLng, MapViewController, Point, Trail, ViewerConfig,
};

/// Frames rendered through a headless egui context
#[cfg(test)]
mod widget_tests {
    use super::*;

    fn view() -> TrailMapView {
        let trail = Trail::new(vec![
            LatLng::new(40.175, -76.225),
            LatLng::new(40.275, -76.125),
        ])
        .unwrap();
        let config = ViewerConfig {
            center: LatLng::new(40.225, -76.175),
            zoom: 12.0,
            load_tiles: false,
            ..ViewerConfig::default()
        };
        let controller =
            MapViewController::mount(config, trail, Point::new(800.0, 600.0)).unwrap();
        TrailMapView::new(controller)
    }

    fn raw_input(events: Vec<Event>) -> RawInput {
        RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, Vec2::new(1024.0, 768.0))),
            events,
            ..RawInput::default()
        }
    }

    fn frame(ctx: &Context, view: &mut TrailMapView, events: Vec<Event>) -> Rect {
        let mut rect = Rect::NOTHING;
        let _ = ctx.run(raw_input(events), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                rect = view.show(ui).rect;
            });
        });
        rect
    }

    #[test]
    fn test_viewport_follows_widget_size() {
        let ctx = Context::default();
        let mut view = view();

        let rect = frame(&ctx, &mut view, vec![]);

        let size = view.controller().map().viewport().size;
        assert!(rect.width() > 0.0);
        assert!((size.x - rect.width() as f64).abs() < 1e-3);
        assert!((size.y - rect.height() as f64).abs() < 1e-3);
        assert_eq!(view.controller().map().layer_ids(), vec![TRAIL_ID.to_string()]);
    }

    #[test]
    fn test_hover_over_trail_sets_tooltip() {
        let ctx = Context::default();
        let mut view = view();
        let rect = frame(&ctx, &mut view, vec![]);

        let mid = LatLng::new(40.225, -76.175);
        let local = view.controller().map().viewport().lat_lng_to_pixel(&mid);
        let pos = rect.min + Vec2::new(local.x as f32, local.y as f32);

        frame(&ctx, &mut view, vec![Event::PointerMoved(pos)]);
        frame(&ctx, &mut view, vec![]);

        assert!(view.controller().state().hovering_trail);
        assert_eq!(view.controller().map().popups().len(), 1);
    }
}
