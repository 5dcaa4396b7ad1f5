use colored::Color;

pub const PRIMARY: Color = Color::TrueColor {
    r: 94,
    g: 204,
    b: 255,
};
pub const ACCENT: Color = Color::TrueColor {
    r: 255,
    g: 191,
    b: 71,
};
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;
pub const IPV4_ADDR: Color = Color::TrueColor {
    r: 120,
    g: 220,
    b: 140,
};
pub const FAST: Color = Color::Green;
pub const SLOW: Color = Color::Yellow;
pub const MISSING: Color = Color::BrightBlack;
