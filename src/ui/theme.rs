// ZSleuth - ui/theme.rs
//
// Colour mapping for chart roles and layout constants.
// No dependencies on app state or business logic.

use crate::core::chart::{Hue, PointStyle, Shade};
use egui::Color32;

/// Opaque colour for a hue and shade.
pub fn style_colour(style: PointStyle) -> Color32 {
    match (style.hue, style.shade) {
        (Hue::Neutral, Shade::Light) => Color32::from_rgb(128, 128, 128), // gray
        (Hue::Neutral, _) => Color32::BLACK,
        (Hue::Green, Shade::Light) => Color32::from_rgb(144, 238, 144), // lightgreen
        (Hue::Green, Shade::Base) => Color32::from_rgb(0, 128, 0),      // green
        (Hue::Green, Shade::Dark) => Color32::from_rgb(0, 100, 0),      // darkgreen
        (Hue::Blue, Shade::Light) => Color32::from_rgb(173, 216, 230),  // lightblue
        (Hue::Blue, Shade::Base) => Color32::from_rgb(0, 0, 255),       // blue
        (Hue::Blue, Shade::Dark) => Color32::from_rgb(0, 0, 139),       // darkblue
    }
}

/// Scatter marker colour: the style colour at half opacity.
pub fn point_colour(style: PointStyle) -> Color32 {
    let c = style_colour(style);
    Color32::from_rgba_unmultiplied(c.r(), c.g(), c.b(), POINT_ALPHA)
}

/// Outline colour of a category box.
pub fn box_colour(hue: Hue) -> Color32 {
    style_colour(PointStyle {
        hue,
        shade: Shade::Base,
    })
}

pub const POINT_ALPHA: u8 = 128;
pub const POINT_RADIUS: f32 = 3.0;
pub const REFERENCE_COLOUR: Color32 = Color32::from_rgb(214, 39, 40); // tab:red
pub const TREND_COLOUR: Color32 = Color32::from_rgb(31, 119, 180);
pub const TREND_WIDTH: f32 = 2.0;
pub const REFERENCE_DASH: f32 = 8.0;

pub const WARNING_TEXT: Color32 = Color32::from_rgb(253, 186, 116);
