//! Groups packed boxes into vertical stacks.
//!
//! Boxes are scanned in arrival order. A box goes onto the first open stack with
//! the same footprint and color that still has room; otherwise it opens a new
//! stack. Where a box came from in the input never matters, only its type.

use crate::catalog;
use crate::model::{PackedBox, Stack};
use crate::types::MAX_STACK_HEIGHT;

/// Step reported while stacks are being built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackingStep {
    /// A box opened stack `stack_index`.
    Opened { stack_index: usize, box_id: u32 },
    /// A box was put on top of stack `stack_index`.
    Stacked {
        stack_index: usize,
        box_id: u32,
        stack_level: usize,
    },
}

/// Builds stacks from boxes in arrival order.
///
/// Output order is the arrival order of each stack's bottom box.
pub fn build_stacks(boxes: Vec<PackedBox>) -> Vec<Stack> {
    build_stacks_with_progress(boxes, |_| {})
}

/// Like [`build_stacks`], reporting every decision to `on_step`.
pub fn build_stacks_with_progress(
    boxes: Vec<PackedBox>,
    mut on_step: impl FnMut(StackingStep),
) -> Vec<Stack> {
    let mut stacks: Vec<Stack> = Vec::new();

    for packed in boxes {
        let box_type = packed.box_type();
        let box_id = packed.box_id;
        if !catalog::is_known(packed.box_type_id) {
            log::debug!(
                "Box {} has unknown type {}, using fallback footprint",
                box_id,
                packed.box_type_id
            );
        }

        // Full stacks stay in the list but never accept again.
        match stacks.iter().position(|s| s.accepts(&box_type)) {
            Some(stack_index) => {
                let stack_level = stacks[stack_index].push(packed);
                on_step(StackingStep::Stacked {
                    stack_index,
                    box_id,
                    stack_level,
                });
            }
            None => {
                stacks.push(Stack::open(packed, &box_type));
                on_step(StackingStep::Opened {
                    stack_index: stacks.len() - 1,
                    box_id,
                });
            }
        }
    }

    debug_assert!(stacks.iter().all(|s| s.height() <= MAX_STACK_HEIGHT));
    stacks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoxColor, Footprint, Footprinted};

    fn packed(box_id: u32, box_type_id: u32) -> PackedBox {
        PackedBox {
            box_id,
            customer_id: 1,
            box_type_id,
            items: Vec::new(),
            total_weight: 5.0,
            customer_order: 1,
        }
    }

    fn assert_stack_invariants(stacks: &[Stack]) {
        for stack in stacks {
            assert!(stack.height() >= 1);
            assert!(stack.height() <= MAX_STACK_HEIGHT);
            let base_key = stack.boxes()[0].packed.box_type().slot_key();
            for (idx, member) in stack.boxes().iter().enumerate() {
                assert_eq!(member.packed.box_type().slot_key(), base_key);
                assert_eq!(member.stack_level, idx + 1);
            }
        }
    }

    #[test]
    fn six_boxes_of_one_type_make_five_plus_one() {
        let boxes = (1..=6).map(|id| packed(id, 1)).collect();
        let stacks = build_stacks(boxes);

        assert_eq!(stacks.len(), 2);
        assert_eq!(stacks[0].height(), 5);
        assert_eq!(stacks[1].height(), 1);
        for stack in &stacks {
            assert_eq!(stack.footprint(), Footprint::new(39, 59));
            assert_eq!(stack.color(), BoxColor::Red);
        }
        assert_eq!(stacks[1].boxes()[0].packed.box_id, 6);
        assert_stack_invariants(&stacks);
    }

    #[test]
    fn same_type_rejoins_across_other_types() {
        let boxes = vec![packed(1, 1), packed(2, 2), packed(3, 1)];
        let stacks = build_stacks(boxes);

        // Box 3 joins box 1: matching does not depend on position.
        assert_eq!(stacks.len(), 2);
        assert_eq!(stacks[0].height(), 2);
        assert_eq!(stacks[1].height(), 1);
        assert_stack_invariants(&stacks);
    }

    #[test]
    fn distinct_types_form_singletons() {
        let boxes = vec![packed(1, 1), packed(2, 2), packed(3, 7)];
        let stacks = build_stacks(boxes);

        assert_eq!(stacks.len(), 3);
        assert!(stacks.iter().all(|s| s.height() == 1));
        let colors: Vec<BoxColor> = stacks.iter().map(|s| s.color()).collect();
        assert_eq!(colors, vec![BoxColor::Red, BoxColor::Blue, BoxColor::Gray]);
    }

    #[test]
    fn order_of_types_does_not_change_stack_count() {
        let forward = build_stacks(vec![packed(1, 1), packed(2, 2), packed(3, 3)]);
        let reversed = build_stacks(vec![packed(3, 3), packed(2, 2), packed(1, 1)]);
        assert_eq!(forward.len(), 3);
        assert_eq!(reversed.len(), 3);
    }

    #[test]
    fn full_stack_is_never_reopened() {
        let mut boxes: Vec<PackedBox> = (1..=5).map(|id| packed(id, 2)).collect();
        boxes.push(packed(6, 1));
        boxes.extend((7..=9).map(|id| packed(id, 2)));
        let stacks = build_stacks(boxes);

        assert_eq!(stacks.len(), 3);
        assert_eq!(stacks[0].height(), 5);
        assert_eq!(stacks[1].boxes()[0].packed.box_id, 6);
        let third: Vec<u32> = stacks[2].boxes().iter().map(|b| b.packed.box_id).collect();
        assert_eq!(third, vec![7, 8, 9]);
        assert_stack_invariants(&stacks);
    }

    #[test]
    fn unknown_types_share_the_fallback_footprint() {
        // Different unknown ids resolve to the same gray 40x40 slot.
        let stacks = build_stacks(vec![packed(1, 50), packed(2, 51)]);
        assert_eq!(stacks.len(), 1);
        assert_eq!(stacks[0].height(), 2);
    }

    #[test]
    fn empty_input_builds_no_stacks() {
        assert!(build_stacks(Vec::new()).is_empty());
    }

    #[test]
    fn progress_reports_every_box() {
        let boxes = (1..=7).map(|id| packed(id, 1)).collect();
        let mut steps = Vec::new();
        let stacks = build_stacks_with_progress(boxes, |step| steps.push(step));

        assert_eq!(stacks.len(), 2);
        assert_eq!(steps.len(), 7);
        assert_eq!(
            steps[0],
            StackingStep::Opened {
                stack_index: 0,
                box_id: 1
            }
        );
        assert_eq!(
            steps[4],
            StackingStep::Stacked {
                stack_index: 0,
                box_id: 5,
                stack_level: 5
            }
        );
        assert_eq!(
            steps[5],
            StackingStep::Opened {
                stack_index: 1,
                box_id: 6
            }
        );
    }
}
