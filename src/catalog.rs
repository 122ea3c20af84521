//! Static catalog of the box types the packing service produces.
//!
//! The table is configuration, not derived data. Unknown type ids are not an
//! error: they resolve to a neutral gray 40×40 footprint so a layout can still
//! be produced.

use serde::Serialize;
use utoipa::ToSchema;

use crate::types::{BoxColor, Footprint, Footprinted};

/// Physical footprint and display color of one box type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct BoxType {
    pub id: u32,
    pub width: u32,
    pub length: u32,
    pub color: BoxColor,
}

impl BoxType {
    pub const FALLBACK_WIDTH: u32 = 40;
    pub const FALLBACK_LENGTH: u32 = 40;
    pub const FALLBACK_COLOR: BoxColor = BoxColor::Gray;

    const fn fallback(id: u32) -> Self {
        Self {
            id,
            width: Self::FALLBACK_WIDTH,
            length: Self::FALLBACK_LENGTH,
            color: Self::FALLBACK_COLOR,
        }
    }
}

impl Footprinted for BoxType {
    fn footprint(&self) -> Footprint {
        Footprint::new(self.width, self.length)
    }

    fn color(&self) -> BoxColor {
        self.color
    }
}

const BOX_TYPES: [BoxType; 2] = [
    BoxType {
        id: 1,
        width: 39,
        length: 59,
        color: BoxColor::Red,
    },
    BoxType {
        id: 2,
        width: 29,
        length: 39,
        color: BoxColor::Blue,
    },
];

/// Resolves a box type id to its footprint and color.
///
/// Total function: unmapped ids keep their id but get the fallback footprint.
pub fn lookup(box_type_id: u32) -> BoxType {
    BOX_TYPES
        .iter()
        .find(|t| t.id == box_type_id)
        .copied()
        .unwrap_or(BoxType::fallback(box_type_id))
}

/// Returns whether the id is part of the configured table.
pub fn is_known(box_type_id: u32) -> bool {
    BOX_TYPES.iter().any(|t| t.id == box_type_id)
}

/// All configured box types in id order.
pub fn all() -> &'static [BoxType] {
    &BOX_TYPES
}
