//! Terminal colors for fuse output

/// ANSI SGR sequences, or nothing in plain mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    color: bool,
}

impl Palette {
    /// Palette emitting ANSI escape sequences
    pub const COLOR: Palette = Palette { color: true };
    /// Palette emitting nothing
    pub const PLAIN: Palette = Palette { color: false };

    /// Choose a palette
    pub const fn new(color: bool) -> Self {
        Self { color }
    }

    /// Marks a deviation from the factory default
    pub const fn deviation(self) -> &'static str {
        if self.color {
            "\x1b[31m"
        } else {
            ""
        }
    }

    /// Marks a named bit that is programmed (0) as by default
    pub const fn programmed(self) -> &'static str {
        if self.color {
            "\x1b[32m"
        } else {
            ""
        }
    }

    /// Back to the terminal's default attributes
    pub const fn reset(self) -> &'static str {
        if self.color {
            "\x1b[0m"
        } else {
            ""
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::COLOR
    }
}
