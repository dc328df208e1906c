//! Filament colour choices.
//!
//! Names on the left are shown to the user, values on the right are passed
//! to the geometry template as preview colours.

/// A selectable colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub name: &'static str,
    pub value: &'static str,
}

const fn color(name: &'static str, value: &'static str) -> Color {
    Color { name, value }
}

/// Foreground choices: base, frame and text.
pub const DARK: &[Color] = &[
    color("Black", "Black"),
    color("Dark Gray", "DimGray"),
    color("Gray", "Gray"),
    color("Navy Blue", "Navy"),
    color("Dark Red", "DarkRed"),
    color("Dark Green", "DarkGreen"),
    color("Brown", "SaddleBrown"),
    color("Purple", "Purple"),
];

/// Background choices: the inlay.
pub const LIGHT: &[Color] = &[
    color("White", "White"),
    color("Yellow", "Yellow"),
    color("Light Gray", "LightGray"),
    color("Cyan", "Cyan"),
    color("Lime Green", "Lime"),
    color("Orange", "Orange"),
    color("Pink", "Pink"),
    color("Light Blue", "LightBlue"),
];
