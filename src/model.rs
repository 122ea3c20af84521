//! Data models for the truck loading plan.
//!
//! This module defines the records that flow through the layout pipeline:
//! - `PackedBox`: A box produced by the packing service, with owner and contents
//! - `Stack`: A vertical pile of boxes sharing footprint and color
//! - `Placement`: A stack with its coordinate on the truck bed
//! - `TruckBed`: The loading surface bounding the layout
//!
//! Stacks and placements are derived values; they are rebuilt on every call and
//! never mutated once handed out.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::catalog::{self, BoxType};
use crate::types::{
    BoxColor, DEFAULT_BED_LENGTH_CM, DEFAULT_BED_WIDTH_CM, Footprint, Footprinted,
    MAX_STACK_HEIGHT, Positioned,
};

/// Validation error for box and bed data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Invalid item: {0}")]
    InvalidItem(String),
}

fn validate_dimension(value: u32, name: &str) -> Result<(), ValidationError> {
    if value == 0 {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_weight_value(value: f64) -> Result<(), ValidationError> {
    if value < 0.0 || value.is_nan() || value.is_infinite() {
        return Err(ValidationError::InvalidWeight(format!(
            "Weight must be a finite, non-negative number, got: {}",
            value
        )));
    }
    Ok(())
}

/// One product line inside a packed box.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BoxItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<u32>,
    pub product_name: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_each: Option<f64>,
}

/// A shipping box as delivered by the packing service.
///
/// # Fields
/// * `box_id` - Identifier assigned by the packing service
/// * `customer_id` - Owner of the contents
/// * `box_type_id` - Key into the box type catalog
/// * `items` - Product lines inside the box
/// * `total_weight` - Weight of the contents in kg
/// * `customer_order` - Position of the customer in the order file; drives load sequencing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "box_id": 1,
    "customer_id": 1001,
    "box_type_id": 1,
    "items": [{ "product_name": "Rice 5kg", "quantity": 2 }],
    "total_weight": 10.0,
    "customer_order": 1
}))]
pub struct PackedBox {
    pub box_id: u32,
    pub customer_id: u32,
    pub box_type_id: u32,
    #[serde(default)]
    pub items: Vec<BoxItem>,
    pub total_weight: f64,
    pub customer_order: u32,
}

impl PackedBox {
    /// Resolves the physical box type via the catalog.
    pub fn box_type(&self) -> BoxType {
        catalog::lookup(self.box_type_id)
    }

    /// Checks the values a typed record cannot rule out on its own.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_weight_value(self.total_weight)?;
        for item in &self.items {
            if item.product_name.trim().is_empty() {
                return Err(ValidationError::InvalidItem(format!(
                    "Box {} contains an item without product name",
                    self.box_id
                )));
            }
            if let Some(weight) = item.weight_each {
                validate_weight_value(weight)?;
            }
        }
        Ok(())
    }
}

/// A box together with its level inside a stack (1 = bottom).
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct StackedBox {
    #[serde(flatten)]
    pub packed: PackedBox,
    pub stack_level: usize,
}

/// A vertical pile of boxes that share footprint and color.
///
/// Membership can only grow through [`Stack::push`], which keeps the levels
/// contiguous and the height within [`MAX_STACK_HEIGHT`].
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct Stack {
    #[serde(flatten)]
    footprint: Footprint,
    color: BoxColor,
    boxes: Vec<StackedBox>,
}

impl Stack {
    /// Opens a new stack with `first` at level 1.
    pub fn open(first: PackedBox, box_type: &BoxType) -> Self {
        Self {
            footprint: box_type.footprint(),
            color: box_type.color,
            boxes: vec![StackedBox {
                packed: first,
                stack_level: 1,
            }],
        }
    }

    /// Checks whether a box of the given type may go on top.
    pub fn accepts(&self, box_type: &impl Footprinted) -> bool {
        !self.is_full() && self.same_slot_as(box_type)
    }

    /// Puts a box on top and returns its level.
    ///
    /// Callers must check [`Stack::accepts`] first.
    pub(crate) fn push(&mut self, packed: PackedBox) -> usize {
        debug_assert!(!self.is_full(), "stack already at maximum height");
        let stack_level = self.boxes.len() + 1;
        self.boxes.push(StackedBox {
            packed,
            stack_level,
        });
        stack_level
    }

    pub fn height(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_full(&self) -> bool {
        self.boxes.len() >= MAX_STACK_HEIGHT
    }

    pub fn boxes(&self) -> &[StackedBox] {
        &self.boxes
    }
}

impl Footprinted for Stack {
    fn footprint(&self) -> Footprint {
        self.footprint
    }

    fn color(&self) -> BoxColor {
        self.color
    }
}

/// A stack with its coordinate on the truck bed (centimeters).
///
/// # Fields
/// * `x` - Column offset along the bed length, measured from the front
/// * `y` - Offset across the bed width within the column
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub length: u32,
    pub color: BoxColor,
    pub stack: Stack,
}

impl Placement {
    pub fn new(x: u32, y: u32, stack: Stack) -> Self {
        let footprint = stack.footprint();
        Self {
            x,
            y,
            width: footprint.width,
            length: footprint.length,
            color: stack.color(),
            stack,
        }
    }

    /// Far edge across the bed width.
    pub fn y_end(&self) -> u32 {
        self.y + self.width
    }

    /// Far edge along the bed length.
    pub fn x_end(&self) -> u32 {
        self.x + self.length
    }
}

impl Footprinted for Placement {
    fn footprint(&self) -> Footprint {
        Footprint::new(self.width, self.length)
    }

    fn color(&self) -> BoxColor {
        self.color
    }
}

impl Positioned for Placement {
    fn origin(&self) -> (u32, u32) {
        (self.x, self.y)
    }
}

/// The loading surface of the truck in centimeters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TruckBed {
    pub width: u32,
    pub length: u32,
}

impl TruckBed {
    /// Creates a bed after validating both dimensions.
    pub fn new(width: u32, length: u32) -> Result<Self, ValidationError> {
        validate_dimension(width, "Bed width")?;
        validate_dimension(length, "Bed length")?;
        Ok(Self { width, length })
    }
}

impl Default for TruckBed {
    fn default() -> Self {
        Self {
            width: DEFAULT_BED_WIDTH_CM,
            length: DEFAULT_BED_LENGTH_CM,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(box_id: u32, box_type_id: u32) -> PackedBox {
        PackedBox {
            box_id,
            customer_id: 7,
            box_type_id,
            items: vec![BoxItem {
                product_id: Some(3),
                product_name: "Soy sauce".to_string(),
                quantity: 4,
                weight_each: Some(1.5),
            }],
            total_weight: 6.0,
            customer_order: 1,
        }
    }

    #[test]
    fn stack_levels_follow_push_order() {
        let first = packed(1, 1);
        let mut stack = Stack::open(first.clone(), &first.box_type());
        assert_eq!(stack.push(packed(2, 1)), 2);
        assert_eq!(stack.push(packed(3, 1)), 3);

        let levels: Vec<usize> = stack.boxes().iter().map(|b| b.stack_level).collect();
        assert_eq!(levels, vec![1, 2, 3]);
        assert_eq!(stack.boxes()[0].packed.box_id, 1);
    }

    #[test]
    fn full_stack_rejects_more_boxes() {
        let first = packed(1, 1);
        let box_type = first.box_type();
        let mut stack = Stack::open(first, &box_type);
        for id in 2..=MAX_STACK_HEIGHT as u32 {
            assert!(stack.accepts(&box_type));
            stack.push(packed(id, 1));
        }
        assert!(stack.is_full());
        assert!(!stack.accepts(&box_type));
    }

    #[test]
    fn stack_rejects_other_types() {
        let first = packed(1, 1);
        let stack = Stack::open(first.clone(), &first.box_type());
        assert!(!stack.accepts(&catalog::lookup(2)));
        assert!(!stack.accepts(&catalog::lookup(42)));
    }

    #[test]
    fn placement_copies_stack_footprint() {
        let first = packed(1, 2);
        let placement = Placement::new(59, 29, Stack::open(first.clone(), &first.box_type()));
        assert_eq!((placement.width, placement.length), (29, 39));
        assert_eq!(placement.color, BoxColor::Blue);
        assert_eq!(placement.y_end(), 58);
        assert_eq!(placement.x_end(), 98);
        assert_eq!(placement.origin(), (59, 29));
    }

    #[test]
    fn validate_rejects_negative_weight() {
        let mut b = packed(1, 1);
        assert!(b.validate().is_ok());
        b.total_weight = -1.0;
        assert!(matches!(b.validate(), Err(ValidationError::InvalidWeight(_))));
        b.total_weight = f64::NAN;
        assert!(b.validate().is_err());
    }

    #[test]
    fn validate_rejects_unnamed_item() {
        let mut b = packed(1, 1);
        b.items[0].product_name = "  ".to_string();
        assert!(matches!(b.validate(), Err(ValidationError::InvalidItem(_))));
    }

    #[test]
    fn packed_box_items_default_to_empty() {
        let json = r#"{
            "box_id": 4,
            "customer_id": 2,
            "box_type_id": 1,
            "total_weight": 3.5,
            "customer_order": 2
        }"#;
        let b: PackedBox = serde_json::from_str(json).expect("Should parse valid JSON");
        assert!(b.items.is_empty());
    }

    #[test]
    fn stacked_box_serializes_flat() {
        let b = StackedBox {
            packed: packed(9, 1),
            stack_level: 3,
        };
        let value = serde_json::to_value(&b).unwrap();
        assert_eq!(value["box_id"], 9);
        assert_eq!(value["stack_level"], 3);
    }

    #[test]
    fn truck_bed_requires_positive_dimensions() {
        assert!(TruckBed::new(200, 500).is_ok());
        assert!(TruckBed::new(0, 500).is_err());
        assert!(TruckBed::new(200, 0).is_err());
        assert_eq!(TruckBed::default(), TruckBed::new(200, 500).unwrap());
    }
}
