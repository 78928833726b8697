pub mod controls;
pub mod popup;

#[cfg(feature = "egui")]
pub mod widget;

pub use controls::{NavButton, NavigationControl};
pub use popup::{Popup, PopupManager};

#[cfg(feature = "egui")]
pub use widget::{MapViewStyle, TrailMapView};
