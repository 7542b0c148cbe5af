//! Function bitmask carried in the last byte of every control frame

use serde::{Deserialize, Serialize};

/// Bit positions inside [`FunctionBits`].
pub mod function_bit {
    /// Headlights and tail lights.
    pub const LIGHTS: u8 = 0;
    /// Horn.
    pub const HORN: u8 = 1;
}

/// Auxiliary function switches sent with each control frame.
///
/// Bit 0 is lights, bit 1 is horn; bits 2-7 are reserved and travel unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct FunctionBits(pub u8);

impl FunctionBits {
    /// All functions off.
    pub const NONE: FunctionBits = FunctionBits(0);

    /// Create from a raw byte.
    pub fn new(value: u8) -> Self {
        Self(value)
    }

    /// Check if a specific bit is set. Bits above 7 are never set.
    pub fn is_set(&self, bit: u8) -> bool {
        bit < 8 && (self.0 & (1 << bit)) != 0
    }

    /// Return a copy with `bit` set to `on`.
    pub fn with(self, bit: u8, on: bool) -> Self {
        if bit >= 8 {
            return self;
        }
        if on { Self(self.0 | (1 << bit)) } else { Self(self.0 & !(1 << bit)) }
    }

    pub fn lights(&self) -> bool {
        self.is_set(function_bit::LIGHTS)
    }

    pub fn horn(&self) -> bool {
        self.is_set(function_bit::HORN)
    }

    pub fn with_lights(self, on: bool) -> Self {
        self.with(function_bit::LIGHTS, on)
    }

    pub fn with_horn(self, on: bool) -> Self {
        self.with(function_bit::HORN, on)
    }

    /// Get the raw byte.
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl From<u8> for FunctionBits {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_bits_map_to_positions() {
        let bits = FunctionBits::NONE.with_lights(true);
        assert_eq!(bits.value(), 0b0000_0001);
        assert!(bits.lights());
        assert!(!bits.horn());

        let bits = bits.with_horn(true).with_lights(false);
        assert_eq!(bits.value(), 0b0000_0010);
    }

    #[test]
    fn reserved_bits_are_preserved() {
        let bits = FunctionBits::new(0b1010_0000).with_lights(true);
        assert_eq!(bits.value(), 0b1010_0001);
        assert!(bits.is_set(7));
        assert!(!bits.is_set(8));
        assert_eq!(bits.with(9, true), bits);
    }
}
