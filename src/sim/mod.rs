pub mod bubble;
pub mod drift;
pub mod field;

pub use bubble::{Bubble, Motion, Sprite};
pub use drift::BackgroundDrift;
pub use field::BubbleField;

/// Opaque 24 bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Drops the alpha byte.
    pub const fn from_argb(c: u32) -> Self {
        let [_, r, g, b] = c.to_be_bytes();
        Self { r, g, b }
    }

    pub const fn to_argb(self) -> u32 {
        u32::from_be_bytes([0xFF, self.r, self.g, self.b])
    }

    pub const fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub const fn from_channels([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::Rgb;

    #[test]
    fn argb_conversion() {
        let c = Rgb::new(0x11, 0x22, 0x55);
        assert_eq!(c.to_argb(), 0xFF_11_22_55);
        assert_eq!(Rgb::from_argb(0x80_11_22_55), c);
        assert_eq!(c.to_string(), "#112255");
    }
}
