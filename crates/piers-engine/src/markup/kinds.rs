//! Delimiters of the markup grammar.
//!
//! The parser reads these constants; it never hardcodes `**` or `[`.

/// `**strong**` or `__strong__`.
pub struct Strong;

impl Strong {
    pub const STARS: &'static str = "**";
    pub const UNDERSCORES: &'static str = "__";
}

/// `*emphasis*` or `_emphasis_`.
pub struct Emphasis;

impl Emphasis {
    pub const STAR: u8 = b'*';
    pub const UNDERSCORE: u8 = b'_';
}

/// `~~strike~~`.
pub struct Strike;

impl Strike {
    pub const TILDES: &'static str = "~~";
}

/// `[label](url)`.
pub struct Link;

impl Link {
    pub const OPEN: u8 = b'[';
    pub const LABEL_CLOSE: &'static str = "](";
    pub const CLOSE: u8 = b')';
}

/// Line prefixes written back out by the renderer.
pub struct Prefix;

impl Prefix {
    pub const HEADING: char = '#';
    pub const BULLET: &'static str = "- ";
    pub const NUMBERED: &'static str = "1. ";
}
