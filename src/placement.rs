//! Assigns every stack a coordinate on the truck bed.
//!
//! Stacks are laid out across the bed width first. When the next stack no longer
//! fits into the current column, the cursor wraps back to `y = 0` and moves one
//! column further along the bed. Stacks are never rotated or split; a stack that
//! cannot fit is still placed and reported as a [`LayoutWarning`].

use serde::Serialize;
use utoipa::ToSchema;

use crate::geometry::{exceeds_bed_length, exceeds_bed_width, intersects};
use crate::model::{Placement, Stack, TruckBed};
use crate::types::{Footprint, Footprinted};

/// Non-fatal layout problem attached to a placement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutWarning {
    /// The stack footprint is wider than the bed.
    WiderThanBed {
        stack_index: usize,
        width: u32,
        bed_width: u32,
    },
    /// The stack ends behind the end of the bed.
    BeyondBedLength {
        stack_index: usize,
        x_end: u32,
        bed_length: u32,
    },
}

impl LayoutWarning {
    pub fn code(&self) -> &'static str {
        match self {
            LayoutWarning::WiderThanBed { .. } => "wider_than_bed",
            LayoutWarning::BeyondBedLength { .. } => "beyond_bed_length",
        }
    }

    pub fn stack_index(&self) -> usize {
        match self {
            LayoutWarning::WiderThanBed { stack_index, .. }
            | LayoutWarning::BeyondBedLength { stack_index, .. } => *stack_index,
        }
    }
}

impl std::fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutWarning::WiderThanBed {
                stack_index,
                width,
                bed_width,
            } => write!(
                f,
                "Stack {} is {} cm wide but the bed is only {} cm wide",
                stack_index + 1,
                width,
                bed_width
            ),
            LayoutWarning::BeyondBedLength {
                stack_index,
                x_end,
                bed_length,
            } => write!(
                f,
                "Stack {} ends at {} cm, behind the bed length of {} cm",
                stack_index + 1,
                x_end,
                bed_length
            ),
        }
    }
}

/// Placements for all stacks plus any warnings raised on the way.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BedLayout {
    pub placements: Vec<Placement>,
    pub warnings: Vec<LayoutWarning>,
}

/// Position where the next stack goes.
#[derive(Debug, Default)]
struct Cursor {
    column_x: u32,
    row_y: u32,
    /// Longest stack placed in the current column so far.
    column_length: u32,
}

impl Cursor {
    fn next_origin(&mut self, footprint: Footprint, bed_width: u32) -> (u32, u32) {
        let column_occupied = self.row_y > 0;
        if column_occupied && self.row_y + footprint.width > bed_width {
            self.column_x += self.column_length;
            self.row_y = 0;
            self.column_length = 0;
        }

        let origin = (self.column_x, self.row_y);
        self.row_y += footprint.width;
        self.column_length = self.column_length.max(footprint.length);
        origin
    }
}

/// Places stacks on the bed in the given order.
///
/// # Parameter
/// * `stacks` - Stacks in load order; the footprint of each stack's base is used
/// * `bed` - Truck bed bounding the layout
pub fn place_stacks(stacks: Vec<Stack>, bed: &TruckBed) -> BedLayout {
    let mut cursor = Cursor::default();
    let mut layout = BedLayout {
        placements: Vec::with_capacity(stacks.len()),
        warnings: Vec::new(),
    };

    for (stack_index, stack) in stacks.into_iter().enumerate() {
        let (x, y) = cursor.next_origin(stack.footprint(), bed.width);
        let placement = Placement::new(x, y, stack);

        if exceeds_bed_width(&placement, bed) {
            let warning = LayoutWarning::WiderThanBed {
                stack_index,
                width: placement.width,
                bed_width: bed.width,
            };
            log::warn!("⚠️ {}", warning);
            layout.warnings.push(warning);
        }
        if exceeds_bed_length(&placement, bed) {
            let warning = LayoutWarning::BeyondBedLength {
                stack_index,
                x_end: placement.x_end(),
                bed_length: bed.length,
            };
            log::warn!("⚠️ {}", warning);
            layout.warnings.push(warning);
        }

        debug_assert!(layout.placements.iter().all(|p| !intersects(p, &placement)));
        layout.placements.push(placement);
    }

    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PackedBox;
    use crate::stacking::build_stacks;

    fn packed(box_id: u32, box_type_id: u32) -> PackedBox {
        PackedBox {
            box_id,
            customer_id: 1,
            box_type_id,
            items: Vec::new(),
            total_weight: 2.0,
            customer_order: 1,
        }
    }

    fn single_stacks(type_ids: &[u32]) -> Vec<Stack> {
        type_ids
            .iter()
            .enumerate()
            .map(|(idx, &type_id)| {
                let b = packed(idx as u32 + 1, type_id);
                let box_type = b.box_type();
                Stack::open(b, &box_type)
            })
            .collect()
    }

    fn bed(width: u32) -> TruckBed {
        TruckBed::new(width, 500).unwrap()
    }

    #[test]
    fn sixth_stack_wraps_into_next_column() {
        let layout = place_stacks(single_stacks(&[1; 6]), &bed(200));

        let coords: Vec<(u32, u32)> = layout.placements.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(
            coords,
            vec![(0, 0), (0, 39), (0, 78), (0, 117), (0, 156), (59, 0)]
        );
        assert!(layout.warnings.is_empty());
        assert_eq!(layout.placements[5].x_end(), 118);
    }

    #[test]
    fn column_advances_by_longest_occupant() {
        // Blue (29x39) then red (39x59) share the first column; the wrap has to
        // clear the longer red stack.
        let layout = place_stacks(single_stacks(&[2, 1, 1, 1, 1, 1]), &bed(200));

        let last = layout.placements.last().unwrap();
        assert_eq!((last.x, last.y), (59, 0));
        for (i, a) in layout.placements.iter().enumerate() {
            for b in layout.placements.iter().skip(i + 1) {
                assert!(!intersects(a, b));
            }
        }
    }

    #[test]
    fn placements_respect_bed_width() {
        let stacks = build_stacks((1..=40).map(|id| packed(id, 1 + id % 2)).collect());
        let bed = bed(200);
        let layout = place_stacks(stacks, &bed);

        for p in &layout.placements {
            assert!(p.y + p.width <= bed.width);
        }
    }

    #[test]
    fn empty_input_yields_empty_layout() {
        let layout = place_stacks(Vec::new(), &bed(200));
        assert!(layout.placements.is_empty());
        assert!(layout.warnings.is_empty());
    }

    #[test]
    fn oversized_stack_is_placed_and_flagged() {
        let layout = place_stacks(single_stacks(&[1, 1]), &bed(30));

        assert_eq!(layout.placements.len(), 2);
        assert_eq!((layout.placements[0].x, layout.placements[0].y), (0, 0));
        assert_eq!((layout.placements[1].x, layout.placements[1].y), (59, 0));
        assert_eq!(layout.warnings.len(), 2);
        assert_eq!(
            layout.warnings[0],
            LayoutWarning::WiderThanBed {
                stack_index: 0,
                width: 39,
                bed_width: 30
            }
        );
        assert_eq!(layout.warnings[1].stack_index(), 1);
        assert_eq!(layout.warnings[1].code(), "wider_than_bed");
    }

    #[test]
    fn stacks_behind_the_bed_end_are_flagged() {
        let short_bed = TruckBed::new(40, 100).unwrap();
        let layout = place_stacks(single_stacks(&[1, 1]), &short_bed);

        assert_eq!(layout.placements[1].x_end(), 118);
        assert_eq!(
            layout.warnings,
            vec![LayoutWarning::BeyondBedLength {
                stack_index: 1,
                x_end: 118,
                bed_length: 100
            }]
        );
    }

    #[test]
    fn warning_serializes_with_kind_tag() {
        let warning = LayoutWarning::WiderThanBed {
            stack_index: 0,
            width: 39,
            bed_width: 30,
        };
        let value = serde_json::to_value(&warning).unwrap();
        assert_eq!(value["kind"], "wider_than_bed");
        assert_eq!(value["width"], 39);
    }
}
