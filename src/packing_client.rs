//! Client for the external packing service.
//!
//! The service turns order items into packed boxes (`POST /process-orders`).
//! Its boxes do not always carry `customer_order`; missing values are filled
//! from the order items that were submitted.

use std::collections::HashMap;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::config::PackingServiceConfig;
use crate::model::{BoxItem, PackedBox, ValidationError};
use crate::orders::{OrderItem, customer_orders};

fn user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    format!("truck-load-planner/{version} ({os}; {arch})")
}

#[derive(Debug, Error)]
pub enum PackingClientError {
    #[error("Packing service request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Packing service answered with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Packing service returned invalid box {box_id}: {source}")]
    InvalidBox {
        box_id: u32,
        #[source]
        source: ValidationError,
    },
}

#[derive(Debug, Deserialize)]
struct PackingResponse {
    #[serde(default)]
    packed_boxes: Vec<ServiceBox>,
}

/// A box as the packing service reports it. Extra fields such as `color` or
/// `stack_level` are ignored; both are derived here.
#[derive(Debug, Deserialize)]
struct ServiceBox {
    box_id: u32,
    customer_id: u32,
    box_type_id: u32,
    #[serde(default)]
    items: Vec<BoxItem>,
    #[serde(default)]
    total_weight: f64,
    #[serde(default)]
    customer_order: Option<u32>,
}

impl ServiceBox {
    fn into_packed(self, orders: &HashMap<u32, u32>) -> PackedBox {
        let customer_order = self
            .customer_order
            .or_else(|| orders.get(&self.customer_id).copied())
            .unwrap_or(0);
        PackedBox {
            box_id: self.box_id,
            customer_id: self.customer_id,
            box_type_id: self.box_type_id,
            items: self.items,
            total_weight: self.total_weight,
            customer_order,
        }
    }
}

/// Converts the service boxes and checks them the same way `/layout` input is
/// checked.
fn resolve_boxes(
    response: PackingResponse,
    submitted: &[OrderItem],
) -> Result<Vec<PackedBox>, PackingClientError> {
    let orders = customer_orders(submitted);
    response
        .packed_boxes
        .into_iter()
        .map(|b| {
            let packed = b.into_packed(&orders);
            packed
                .validate()
                .map_err(|source| PackingClientError::InvalidBox {
                    box_id: packed.box_id,
                    source,
                })?;
            Ok(packed)
        })
        .collect()
}

/// HTTP client for the packing service.
#[derive(Clone, Debug)]
pub struct PackingClient {
    http: reqwest::Client,
    endpoint: String,
}

impl PackingClient {
    pub fn new(config: &PackingServiceConfig) -> Result<Self, PackingClientError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent())
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            http,
            endpoint: config.process_orders_endpoint(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends the order items to the packing service and returns its boxes in
    /// the order the service produced them.
    pub async fn pack(&self, items: &[OrderItem]) -> Result<Vec<PackedBox>, PackingClientError> {
        log::info!(
            "📤 Sending {} order items to {}",
            items.len(),
            self.endpoint
        );
        let response = self.http.post(&self.endpoint).json(items).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PackingClientError::Status { status, body });
        }

        let payload: PackingResponse = response.json().await?;
        let boxes = resolve_boxes(payload, items)?;
        log::info!("📦 Packing service returned {} boxes", boxes.len());
        Ok(boxes)
    }
}
