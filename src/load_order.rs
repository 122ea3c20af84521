//! Display ordering of the loaded stacks.
//!
//! Groups the boxes of a finished layout by the physical slot they occupy, caps
//! every group at [`MAX_STACK_HEIGHT`] boxes and orders the groups rear to front:
//! customers that appear later in the order file are loaded first and therefore
//! shown first. Coordinates are taken as they are; this view only reorders.

use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{Placement, StackedBox};
use crate::types::{BoxColor, MAX_STACK_HEIGHT};

/// Exact slot of a box: coordinate, footprint and color.
type SlotPosition = (u32, u32, u32, u32, BoxColor);

/// A run of at most [`MAX_STACK_HEIGHT`] boxes sharing one physical slot.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct DisplayGroup {
    /// `customer_order` of the first (lowest) box.
    pub customer_order: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub length: u32,
    pub color: BoxColor,
    pub boxes: Vec<StackedBox>,
}

impl DisplayGroup {
    fn from_slot(slot: SlotPosition, boxes: Vec<StackedBox>) -> Self {
        let (x, y, width, length, color) = slot;
        let customer_order = boxes.first().map_or(0, |b| b.packed.customer_order);
        Self {
            customer_order,
            x,
            y,
            width,
            length,
            color,
            boxes,
        }
    }

    fn slot(&self) -> SlotPosition {
        (self.x, self.y, self.width, self.length, self.color)
    }

    pub fn height(&self) -> usize {
        self.boxes.len()
    }

    #[cfg(test)]
    pub(crate) fn box_ids(&self) -> Vec<u32> {
        self.boxes.iter().map(|b| b.packed.box_id).collect()
    }
}

/// Builds the rear-to-front display groups for a layout.
pub fn order_for_display(placements: &[Placement]) -> Vec<DisplayGroup> {
    let mut slot_index: HashMap<SlotPosition, usize> = HashMap::new();
    let mut by_slot: Vec<(SlotPosition, Vec<StackedBox>)> = Vec::new();

    for placement in placements {
        let slot = (
            placement.x,
            placement.y,
            placement.width,
            placement.length,
            placement.color,
        );
        let idx = *slot_index.entry(slot).or_insert_with(|| {
            by_slot.push((slot, Vec::new()));
            by_slot.len() - 1
        });
        by_slot[idx].1.extend(placement.stack.boxes().iter().cloned());
    }

    let groups = by_slot
        .into_iter()
        .map(|(slot, mut boxes)| {
            boxes.sort_by_key(|b| b.stack_level);
            DisplayGroup::from_slot(slot, boxes)
        })
        .collect();

    let mut groups = recap(groups);
    // Stable: equal customer_order keeps placement order.
    groups.sort_by(|a, b| b.customer_order.cmp(&a.customer_order));
    groups
}

/// Splits every group taller than [`MAX_STACK_HEIGHT`] into consecutive
/// sub-groups. Groups within the cap pass through unchanged.
pub fn recap(groups: Vec<DisplayGroup>) -> Vec<DisplayGroup> {
    let mut capped = Vec::with_capacity(groups.len());
    for group in groups {
        if group.height() <= MAX_STACK_HEIGHT {
            capped.push(group);
            continue;
        }
        let slot = group.slot();
        let mut rest = group.boxes;
        while !rest.is_empty() {
            let tail = rest.split_off(rest.len().min(MAX_STACK_HEIGHT));
            capped.push(DisplayGroup::from_slot(slot, rest));
            rest = tail;
        }
    }
    capped
}
