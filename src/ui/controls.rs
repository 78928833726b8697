use crate::core::geo::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavButton {
    ZoomIn,
    ZoomOut,
}

impl NavButton {
    pub fn label(&self) -> &'static str {
        match self {
            NavButton::ZoomIn => "+",
            NavButton::ZoomOut => "−",
        }
    }
}

/// Zoom in/out buttons stacked in the top-right corner
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationControl {
    pub visible: bool,
    /// Distance from the container edge
    pub margin: f64,
    pub button_size: f64,
}

impl Default for NavigationControl {
    fn default() -> Self {
        Self {
            visible: true,
            margin: 10.0,
            button_size: 29.0,
        }
    }
}

impl NavigationControl {
    /// Screen rectangles (min, max) of each button for a container of `size`
    pub fn buttons(&self, size: Point) -> [(NavButton, Point, Point); 2] {
        let left = size.x - self.margin - self.button_size;
        let right = size.x - self.margin;
        let top = self.margin;
        let mid = top + self.button_size;
        [
            (NavButton::ZoomIn, Point::new(left, top), Point::new(right, mid)),
            (
                NavButton::ZoomOut,
                Point::new(left, mid),
                Point::new(right, mid + self.button_size),
            ),
        ]
    }

    /// Button under `pixel`, if any
    pub fn hit(&self, pixel: Point, size: Point) -> Option<NavButton> {
        if !self.visible {
            return None;
        }
        self.buttons(size)
            .into_iter()
            .find(|(_, min, max)| {
                pixel.x >= min.x && pixel.x <= max.x && pixel.y >= min.y && pixel.y <= max.y
            })
            .map(|(button, _, _)| button)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buttons_hit() {
        let control = NavigationControl::default();
        let size = Point::new(800.0, 600.0);

        assert_eq!(control.hit(Point::new(775.0, 20.0), size), Some(NavButton::ZoomIn));
        assert_eq!(control.hit(Point::new(775.0, 50.0), size), Some(NavButton::ZoomOut));
        assert_eq!(control.hit(Point::new(400.0, 300.0), size), None);

        let hidden = NavigationControl {
            visible: false,
            ..NavigationControl::default()
        };
        assert_eq!(hidden.hit(Point::new(775.0, 20.0), size), None);
    }
}
