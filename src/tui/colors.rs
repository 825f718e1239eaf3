//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::Priority;

/// Used for High priority
pub const DARK_RED: Color = Color::Rgb(170, 30, 30);
/// Used for Medium priority
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Used for Low priority
pub const STEEL_BLUE: Color = Color::Rgb(70, 130, 180);
/// Used for anything else
pub const DARK_PURPLE: Color = Color::Rgb(86, 60, 92);
/// Stalled marker
pub const STALL_ORANGE: Color = Color::Rgb(255, 140, 0);

pub fn priority_color(priority: &Priority) -> Color {
    match priority {
        Priority::High => DARK_RED,
        Priority::Medium => GOLD,
        Priority::Low | Priority::Unset => STEEL_BLUE,
        Priority::Other(_) | Priority::Invalid(_) => DARK_PURPLE,
    }
}
