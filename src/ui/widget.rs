//! egui front end for [`MapViewController`].
//!
//! The widget only translates: egui pointer input becomes [`InputEvent`]s and
//! the controller's draw commands become egui shapes. Tile textures are kept
//! in a small LRU so panning back over decoded tiles costs nothing.

use crate::{
    controller::MapViewController,
    core::{constants::DEFAULT_TILE_CACHE_CAPACITY, geo::Point, geo::TileCoord, map::MapCursor},
    input::{InputEvent, MouseButton},
    prelude::HashSet,
    rendering::context::{DrawCommand, LineRenderStyle, PointRenderStyle, RenderContext},
    ui::controls::NavigationControl,
};
use egui::{
    Align2, Color32, ColorImage, CursorIcon, FontId, Painter, Pos2, Rect, Response, Sense, Shape,
    Stroke, TextureHandle, TextureOptions, Ui, Vec2,
};
use lru::LruCache;
use std::{num::NonZeroUsize, time::Duration};

/// Repaint interval while tiles are downloading or a hint is counting down
const POLL_INTERVAL: Duration = Duration::from_millis(100);

impl From<MapCursor> for CursorIcon {
    fn from(cursor: MapCursor) -> Self {
        match cursor {
            MapCursor::Default => CursorIcon::Default,
            MapCursor::Pointer => CursorIcon::PointingHand,
            MapCursor::Grab => CursorIcon::Grab,
            MapCursor::Grabbing => CursorIcon::Grabbing,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MapViewStyle {
    pub background_color: Color32,
    pub popup_fill: Color32,
    pub popup_text: Color32,
    pub popup_font_size: f32,
    pub label_font_size: f32,
    pub show_attribution: bool,
}

impl Default for MapViewStyle {
    fn default() -> Self {
        Self {
            background_color: Color32::from_rgb(200, 200, 200),
            popup_fill: Color32::from_rgba_unmultiplied(255, 255, 255, 235),
            popup_text: Color32::from_gray(30),
            popup_font_size: 12.0,
            label_font_size: 11.0,
            show_attribution: true,
        }
    }
}

/// Interactive trail map drawn into an egui `Ui`
pub struct TrailMapView {
    controller: MapViewController,
    style: MapViewStyle,
    context: Option<RenderContext>,
    textures: LruCache<TileCoord, TextureHandle>,
    undecodable: HashSet<TileCoord>,
    last_hover: Option<Pos2>,
}

impl TrailMapView {
    pub fn new(controller: MapViewController) -> Self {
        let capacity =
            NonZeroUsize::new(DEFAULT_TILE_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            controller,
            style: MapViewStyle::default(),
            context: None,
            textures: LruCache::new(capacity),
            undecodable: HashSet::default(),
            last_hover: None,
        }
    }

    pub fn with_style(mut self, style: MapViewStyle) -> Self {
        self.style = style;
        self
    }

    pub fn controller(&self) -> &MapViewController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut MapViewController {
        &mut self.controller
    }

    /// Lays out, handles input for and paints the map, filling the available space
    pub fn show(&mut self, ui: &mut Ui) -> Response {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());

        self.sync_size(rect);
        self.handle_input(ui, rect, &response);

        let mut needs_repaint = self.controller.tick();

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, self.style.background_color);
        self.paint_map(ui, &painter, rect);
        self.paint_popups(&painter, rect);
        if let Some(control) = self.controller.map().navigation_control() {
            paint_navigation(&painter, rect, control);
        }
        self.paint_attribution(&painter, rect);

        if response.hovered() {
            let icon = if self.controller.map().is_dragging() {
                CursorIcon::Grabbing
            } else {
                CursorIcon::from(self.controller.map().cursor())
            };
            ui.ctx().set_cursor_icon(icon);
        }

        let map = self.controller.map();
        let tiles_pending = map.tile_layer().is_some_and(|t| t.pending_count() > 0);
        let hint_pending = map
            .popups()
            .visible_popups()
            .any(|p| p.auto_close_duration.is_some());
        if tiles_pending || hint_pending {
            ui.ctx().request_repaint_after(POLL_INTERVAL);
        }
        if response.changed() {
            needs_repaint = true;
        }
        if needs_repaint {
            ui.ctx().request_repaint();
        }

        response
    }

    fn sync_size(&mut self, rect: Rect) {
        let size = Point::new(rect.width() as f64, rect.height() as f64);
        if size != self.controller.map().viewport().size {
            self.send(InputEvent::Resize { size });
        }

        let (width, height) = (rect.width().round() as u32, rect.height().round() as u32);
        let stale = self
            .context
            .as_ref()
            .map_or(true, |c| c.width != width || c.height != height);
        if stale {
            self.context = match RenderContext::new(width, height) {
                Ok(context) => Some(context),
                Err(e) => {
                    log::debug!("map has no drawable area: {}", e);
                    None
                }
            };
        }
    }

    fn handle_input(&mut self, ui: &Ui, rect: Rect, response: &Response) {
        let local = |pos: Pos2| Point::new((pos.x - rect.min.x) as f64, (pos.y - rect.min.y) as f64);

        if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.send(InputEvent::DragStart { position: local(pos) });
            }
        }
        if response.dragged() {
            let delta = response.drag_delta();
            if delta != Vec2::ZERO {
                self.send(InputEvent::Drag {
                    delta: Point::new(delta.x as f64, delta.y as f64),
                });
            }
        }
        if response.drag_released() {
            self.send(InputEvent::DragEnd);
        }

        if let Some(pos) = response.interact_pointer_pos() {
            if response.clicked() {
                self.send(InputEvent::Click {
                    position: local(pos),
                    button: MouseButton::Left,
                });
            } else if response.secondary_clicked() {
                self.send(InputEvent::Click {
                    position: local(pos),
                    button: MouseButton::Right,
                });
            }
            if response.double_clicked() {
                self.send(InputEvent::DoubleClick { position: local(pos) });
            }
        }

        match response.hover_pos() {
            Some(pos) => {
                if self.last_hover != Some(pos) {
                    self.send(InputEvent::MouseMove { position: local(pos) });
                }
                let scroll = ui.input(|i| i.raw_scroll_delta.y);
                if scroll.abs() > 0.1 {
                    self.send(InputEvent::Scroll {
                        delta: scroll as f64,
                        position: local(pos),
                    });
                }
                self.last_hover = Some(pos);
            }
            None => {
                if self.last_hover.take().is_some() {
                    self.send(InputEvent::PointerLeave);
                }
            }
        }
    }

    fn send(&mut self, event: InputEvent) {
        if let Err(e) = self.controller.handle_input(event) {
            log::error!("map input failed: {}", e);
        }
    }

    fn paint_map(&mut self, ui: &Ui, painter: &Painter, rect: Rect) {
        let Some(mut context) = self.context.take() else {
            return;
        };
        if let Err(e) = self.controller.render(&mut context) {
            log::error!("map render failed: {}", e);
        }

        for command in context.get_drawing_queue() {
            match command {
                DrawCommand::Tile {
                    coord,
                    data,
                    bounds,
                    opacity,
                } => {
                    if let Some(texture) = self.texture(ui, *coord, data) {
                        let tile_rect = Rect::from_two_pos(
                            to_screen(rect, &bounds.0),
                            to_screen(rect, &bounds.1),
                        );
                        painter.image(
                            texture.id(),
                            tile_rect,
                            Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                            Color32::WHITE.gamma_multiply(*opacity),
                        );
                    }
                }
                DrawCommand::Line { points, style, .. } => paint_line(painter, rect, points, style),
                DrawCommand::Point { position, style } => {
                    paint_point(painter, rect, position, style)
                }
                DrawCommand::Text {
                    position,
                    text,
                    color,
                } => {
                    painter.text(
                        to_screen(rect, position),
                        Align2::CENTER_CENTER,
                        text,
                        FontId::proportional(self.style.label_font_size),
                        Color32::from(*color),
                    );
                }
            }
        }

        self.context = Some(context);
    }

    fn texture(&mut self, ui: &Ui, coord: TileCoord, data: &[u8]) -> Option<TextureHandle> {
        if let Some(texture) = self.textures.get(&coord) {
            return Some(texture.clone());
        }
        if self.undecodable.contains(&coord) {
            return None;
        }

        match decode_tile(data) {
            Some(image) => {
                let texture = ui.ctx().load_texture(
                    format!("tile_{}_{}_{}", coord.z, coord.x, coord.y),
                    image,
                    TextureOptions::LINEAR,
                );
                self.textures.put(coord, texture.clone());
                Some(texture)
            }
            None => {
                log::warn!("tile {:?} is not a decodable image", coord);
                self.undecodable.insert(coord);
                None
            }
        }
    }

    fn paint_popups(&self, painter: &Painter, rect: Rect) {
        let viewport = self.controller.map().viewport();
        let font = FontId::proportional(self.style.popup_font_size);
        let padding = Vec2::new(6.0, 4.0);

        for popup in self.controller.map().popups().visible_popups() {
            let anchor = to_screen(rect, &popup.screen_position(viewport));
            let galley =
                painter.layout_no_wrap(popup.content.clone(), font.clone(), self.style.popup_text);
            let bubble = Rect::from_min_size(anchor, galley.size() + padding * 2.0);

            painter.rect_filled(bubble, 3.0, self.style.popup_fill);
            painter.rect_stroke(bubble, 3.0, Stroke::new(1.0, Color32::from_gray(150)));
            painter.text(
                bubble.min + padding,
                Align2::LEFT_TOP,
                &popup.content,
                font.clone(),
                self.style.popup_text,
            );
        }
    }

    fn paint_attribution(&self, painter: &Painter, rect: Rect) {
        if !self.style.show_attribution {
            return;
        }
        let Some(tiles) = self.controller.map().tile_layer() else {
            return;
        };
        let attribution = tiles.source().attribution();
        if attribution.is_empty() {
            return;
        }
        painter.text(
            rect.left_bottom() + Vec2::new(5.0, -5.0),
            Align2::LEFT_BOTTOM,
            attribution,
            FontId::proportional(10.0),
            Color32::from_gray(90),
        );
    }
}

fn to_screen(rect: Rect, point: &Point) -> Pos2 {
    Pos2::new(rect.min.x + point.x as f32, rect.min.y + point.y as f32)
}

fn paint_line(painter: &Painter, rect: Rect, points: &[Point], style: &LineRenderStyle) {
    let points: Vec<Pos2> = points.iter().map(|p| to_screen(rect, p)).collect();
    let color = Color32::from(style.color).gamma_multiply(style.opacity);
    let stroke = Stroke::new(style.width, color);

    if style.is_dashed() {
        let dash = style.dash_pattern[0] * style.width;
        let gap = style.dash_pattern[1] * style.width;
        painter.extend(Shape::dashed_line(&points, stroke, dash, gap));
    } else {
        painter.add(Shape::line(points, stroke));
    }
}

fn paint_point(painter: &Painter, rect: Rect, position: &Point, style: &PointRenderStyle) {
    painter.circle(
        to_screen(rect, position),
        style.radius,
        Color32::from(style.fill_color).gamma_multiply(style.opacity),
        Stroke::new(style.stroke_width, Color32::from(style.stroke_color)),
    );
}

fn paint_navigation(painter: &Painter, rect: Rect, control: &NavigationControl) {
    let size = Point::new(rect.width() as f64, rect.height() as f64);
    for (button, min, max) in control.buttons(size) {
        let button_rect = Rect::from_min_max(to_screen(rect, &min), to_screen(rect, &max));
        painter.rect_filled(
            button_rect,
            3.0,
            Color32::from_rgba_unmultiplied(255, 255, 255, 220),
        );
        painter.rect_stroke(button_rect, 3.0, Stroke::new(1.0, Color32::from_gray(100)));
        painter.text(
            button_rect.center(),
            Align2::CENTER_CENTER,
            button.label(),
            FontId::proportional(16.0),
            Color32::BLACK,
        );
    }
}

/// Decodes PNG/JPEG tile bytes into an egui image
fn decode_tile(bytes: &[u8]) -> Option<ColorImage> {
    let img = image::load_from_memory(bytes).ok()?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Some(ColorImage::from_rgba_unmultiplied(
        [width as usize, height as usize],
        rgba.as_raw(),
    ))
}
