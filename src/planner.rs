//! Layout pipeline: stacking, bed placement and display ordering.
//!
//! Every call builds its own stacks and cursor and discards them afterwards, so
//! the same input always yields the same plan.

use serde::Serialize;
use thiserror::Error;

use crate::load_order::{DisplayGroup, order_for_display};
use crate::model::{PackedBox, Placement, Stack, TruckBed, ValidationError};
use crate::placement::{LayoutWarning, place_stacks};
use crate::stacking::{StackingStep, build_stacks, build_stacks_with_progress};
use crate::types::{BoxColor, DEFAULT_BED_LENGTH_CM, DEFAULT_BED_WIDTH_CM};

/// Configuration for the layout pipeline.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LayoutConfig {
    pub bed: TruckBed,
}

impl LayoutConfig {
    pub const DEFAULT_BED_WIDTH: u32 = DEFAULT_BED_WIDTH_CM;
    pub const DEFAULT_BED_LENGTH: u32 = DEFAULT_BED_LENGTH_CM;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> LayoutConfigBuilder {
        LayoutConfigBuilder::default()
    }

    /// Applies per-request bed overrides, validating the resulting bed.
    pub fn with_overrides(
        self,
        bed_width: Option<u32>,
        bed_length: Option<u32>,
    ) -> Result<Self, LayoutError> {
        let bed = TruckBed::new(
            bed_width.unwrap_or(self.bed.width),
            bed_length.unwrap_or(self.bed.length),
        )
        .map_err(LayoutError::InvalidBed)?;
        Ok(Self { bed })
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            bed: TruckBed {
                width: Self::DEFAULT_BED_WIDTH,
                length: Self::DEFAULT_BED_LENGTH,
            },
        }
    }
}

/// Builder for [`LayoutConfig`].
#[derive(Clone, Debug, Default)]
pub struct LayoutConfigBuilder {
    config: LayoutConfig,
}

impl LayoutConfigBuilder {
    /// Sets the bed width in centimeters.
    pub fn bed_width(mut self, width: u32) -> Self {
        self.config.bed.width = width;
        self
    }

    /// Sets the bed length in centimeters.
    pub fn bed_length(mut self, length: u32) -> Self {
        self.config.bed.length = length;
        self
    }

    /// Validates the bed and returns the configuration.
    pub fn build(self) -> Result<LayoutConfig, LayoutError> {
        let bed = &self.config.bed;
        TruckBed::new(bed.width, bed.length).map_err(LayoutError::InvalidBed)?;
        Ok(self.config)
    }
}

/// Errors surfaced to the caller of the pipeline.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Invalid input: expected a sequence of boxes, got {0}")]
    InvalidInput(&'static str),
    #[error("Box at index {index} could not be read: {source}")]
    UnreadableBox {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Box at index {index} is invalid: {source}")]
    InvalidBox {
        index: usize,
        #[source]
        source: ValidationError,
    },
    #[error("Invalid truck bed: {0}")]
    InvalidBed(#[source] ValidationError),
}

/// Decodes the box list, rejecting anything that is not a sequence.
///
/// Empty sequences are valid and produce an empty plan.
pub fn boxes_from_json(value: serde_json::Value) -> Result<Vec<PackedBox>, LayoutError> {
    let records = match value {
        serde_json::Value::Array(records) => records,
        serde_json::Value::Null => return Err(LayoutError::InvalidInput("null")),
        serde_json::Value::Bool(_) => return Err(LayoutError::InvalidInput("a boolean")),
        serde_json::Value::Number(_) => return Err(LayoutError::InvalidInput("a number")),
        serde_json::Value::String(_) => return Err(LayoutError::InvalidInput("a string")),
        serde_json::Value::Object(_) => return Err(LayoutError::InvalidInput("an object")),
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let packed: PackedBox = serde_json::from_value(record)
                .map_err(|source| LayoutError::UnreadableBox { index, source })?;
            packed
                .validate()
                .map_err(|source| LayoutError::InvalidBox { index, source })?;
            Ok(packed)
        })
        .collect()
}

/// Result of the layout pipeline.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutPlan {
    pub placements: Vec<Placement>,
    pub display_groups: Vec<DisplayGroup>,
    pub warnings: Vec<LayoutWarning>,
}

impl LayoutPlan {
    pub fn stack_count(&self) -> usize {
        self.placements.len()
    }

    pub fn box_count(&self) -> usize {
        self.placements.iter().map(|p| p.stack.height()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// True when no placement exceeds the bed.
    pub fn is_within_bed(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Bed length the layout occupies.
    pub fn used_length(&self) -> u32 {
        self.placements.iter().map(|p| p.x_end()).max().unwrap_or(0)
    }
}

/// Events emitted while a plan is computed, for live visualization.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum PlanEvent {
    /// A box opened a new stack.
    StackOpened { stack_index: usize, box_id: u32 },
    /// A box was put on an open stack.
    BoxStacked {
        stack_index: usize,
        box_id: u32,
        stack_level: usize,
    },
    /// A stack received its bed coordinate.
    StackPlaced {
        stack_index: usize,
        x: u32,
        y: u32,
        width: u32,
        length: u32,
        color: BoxColor,
        height: usize,
    },
    /// A placement exceeds the bed.
    Warning {
        stack_index: usize,
        code: String,
        message: String,
    },
    /// Planning finished.
    Finished {
        boxes: usize,
        stacks: usize,
        warnings: usize,
    },
}

/// Computes the full loading plan.
pub fn plan_layout(boxes: Vec<PackedBox>, config: &LayoutConfig) -> LayoutPlan {
    plan_stacks(build_stacks(boxes), config, |_| {})
}

/// Like [`plan_layout`], calling `on_event` for every step.
pub fn plan_layout_with_progress(
    boxes: Vec<PackedBox>,
    config: &LayoutConfig,
    mut on_event: impl FnMut(&PlanEvent),
) -> LayoutPlan {
    let stacks = build_stacks_with_progress(boxes, |step| {
        let event = match step {
            StackingStep::Opened {
                stack_index,
                box_id,
            } => PlanEvent::StackOpened {
                stack_index,
                box_id,
            },
            StackingStep::Stacked {
                stack_index,
                box_id,
                stack_level,
            } => PlanEvent::BoxStacked {
                stack_index,
                box_id,
                stack_level,
            },
        };
        on_event(&event);
    });

    plan_stacks(stacks, config, on_event)
}

fn plan_stacks(
    stacks: Vec<Stack>,
    config: &LayoutConfig,
    mut on_event: impl FnMut(&PlanEvent),
) -> LayoutPlan {
    let layout = place_stacks(stacks, &config.bed);

    for (stack_index, placement) in layout.placements.iter().enumerate() {
        on_event(&PlanEvent::StackPlaced {
            stack_index,
            x: placement.x,
            y: placement.y,
            width: placement.width,
            length: placement.length,
            color: placement.color,
            height: placement.stack.height(),
        });
    }
    for warning in &layout.warnings {
        on_event(&PlanEvent::Warning {
            stack_index: warning.stack_index(),
            code: warning.code().to_string(),
            message: warning.to_string(),
        });
    }

    let display_groups = order_for_display(&layout.placements);
    let plan = LayoutPlan {
        placements: layout.placements,
        display_groups,
        warnings: layout.warnings,
    };

    on_event(&PlanEvent::Finished {
        boxes: plan.box_count(),
        stacks: plan.stack_count(),
        warnings: plan.warnings.len(),
    });
    plan
}
