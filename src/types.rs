//! Common types and traits for the 2D truck bed geometry.
//!
//! Footprints and colors decide which boxes may share a stack, so both are
//! small `Copy` value types that can be compared and hashed directly.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maximum number of boxes in one stack.
pub const MAX_STACK_HEIGHT: usize = 5;

/// Default cross-wise dimension of the truck bed in centimeters.
pub const DEFAULT_BED_WIDTH_CM: u32 = 200;

/// Default length of the truck bed in centimeters.
pub const DEFAULT_BED_LENGTH_CM: u32 = 500;

/// Footprint of a box on the truck bed in centimeters.
///
/// `width` runs across the bed, `length` along it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Footprint {
    pub width: u32,
    pub length: u32,
}

impl Footprint {
    #[inline]
    pub const fn new(width: u32, length: u32) -> Self {
        Self { width, length }
    }
}

/// Display color of a box type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BoxColor {
    Red,
    Blue,
    Gray,
}

impl BoxColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoxColor::Red => "red",
            BoxColor::Blue => "blue",
            BoxColor::Gray => "gray",
        }
    }
}

impl std::fmt::Display for BoxColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key that decides whether two boxes may share a stack.
pub type SlotKey = (Footprint, BoxColor);

/// Trait for anything that occupies a footprint with a color.
///
/// Implemented by box types, stacks and placements so that matching is
/// expressed once.
pub trait Footprinted {
    /// Returns the footprint on the bed.
    fn footprint(&self) -> Footprint;

    /// Returns the display color.
    fn color(&self) -> BoxColor;

    /// Footprint and color combined.
    fn slot_key(&self) -> SlotKey {
        (self.footprint(), self.color())
    }

    /// Checks whether `other` has the same footprint and color.
    fn same_slot_as(&self, other: &impl Footprinted) -> bool {
        self.slot_key() == other.slot_key()
    }
}

/// Trait for objects with a position on the truck bed.
pub trait Positioned {
    /// Returns `(x, y)`: offset along the bed length and across the bed width.
    fn origin(&self) -> (u32, u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_serializes_lowercase() {
        let json = serde_json::to_string(&BoxColor::Red).unwrap();
        assert_eq!(json, "\"red\"");
        let parsed: BoxColor = serde_json::from_str("\"gray\"").unwrap();
        assert_eq!(parsed, BoxColor::Gray);
    }

    #[test]
    fn slot_key_matches_footprint_and_color() {
        struct Probe(Footprint, BoxColor);
        impl Footprinted for Probe {
            fn footprint(&self) -> Footprint {
                self.0
            }
            fn color(&self) -> BoxColor {
                self.1
            }
        }

        let a = Probe(Footprint::new(39, 59), BoxColor::Red);
        let b = Probe(Footprint::new(39, 59), BoxColor::Red);
        let c = Probe(Footprint::new(39, 59), BoxColor::Blue);
        let d = Probe(Footprint::new(59, 39), BoxColor::Red);

        assert!(a.same_slot_as(&b));
        assert!(!a.same_slot_as(&c));
        assert!(!a.same_slot_as(&d));
    }
}
