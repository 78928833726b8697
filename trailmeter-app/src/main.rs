use anyhow::Context as _;
use trailmeter::{ui::TrailMapView, MapViewController, Point, Trail, ViewerConfig};

const WINDOW_SIZE: [f32; 2] = [1200.0, 800.0];

/// Standalone trail viewer; an optional first argument names a GeoJSON file
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match ViewerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("{}; showing the trail without a basemap", e);
            ViewerConfig {
                load_tiles: false,
                ..ViewerConfig::default()
            }
        }
    };

    let trail = match std::env::args().nth(1) {
        Some(path) => {
            Trail::from_path(&path).with_context(|| format!("failed to load trail from {}", path))?
        }
        None => Trail::bundled().context("bundled trail is invalid")?,
    };

    let size = Point::new(WINDOW_SIZE[0] as f64, WINDOW_SIZE[1] as f64);
    let controller =
        MapViewController::mount(config, trail, size).context("failed to create the map")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(WINDOW_SIZE)
            .with_title("Trailmeter"),
        ..Default::default()
    };

    eframe::run_native(
        "trailmeter-app",
        options,
        Box::new(move |_cc| Box::new(TrailmeterApp::new(controller))),
    )
    .map_err(|e| anyhow::anyhow!("{}", e))
}

struct TrailmeterApp {
    view: TrailMapView,
}

impl TrailmeterApp {
    fn new(controller: MapViewController) -> Self {
        Self {
            view: TrailMapView::new(controller),
        }
    }

    fn info_panel(&mut self, ui: &mut egui::Ui) {
        let state = self.view.controller().state();
        let position = state.position_text();
        let distance = state.distance_text();
        let hint = state.selection.hint();

        ui.horizontal(|ui| {
            ui.monospace(position);
            ui.separator();
            match distance {
                Some(distance) => {
                    ui.strong(format!("Distance: {}", distance));
                    if ui.button("Clear").clicked() {
                        self.view.controller_mut().clear_measurement();
                    }
                }
                None => {
                    ui.weak(hint);
                }
            }
        });
    }
}

impl eframe::App for TrailmeterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("info").show(ctx, |ui| {
            self.info_panel(ui);
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                self.view.show(ui);
            });
    }
}
