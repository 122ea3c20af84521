//! Loader for the customer order matrix (CSV).
//!
//! The file is wide: the header row lists customer ids from the second column
//! on, every following row starts with a product id followed by one quantity
//! per customer. The loader turns it into one [`OrderItem`] per non-empty cell
//! and records each customer's column position as its `customer_order`.

use std::collections::HashMap;
use std::io::Read;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum OrderCsvError {
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Order file is empty")]
    MissingHeader,

    #[error("Invalid customer id in column {column}: {value}")]
    InvalidCustomerId { column: usize, value: String },

    #[error("Invalid product id in row {row}: {value}")]
    InvalidProductId { row: usize, value: String },

    #[error("Quantity in row {row}, column {column} has no customer in the header")]
    UnknownCustomerColumn { row: usize, column: usize },
}

/// One product quantity ordered by one customer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub product_id: u32,
    pub customer_id: u32,
    pub quantity: u32,
    /// 1-based column of the customer in the order file.
    pub customer_order: u32,
}

/// Parses the order matrix from any reader.
pub fn parse_order_matrix<R: Read>(input: R) -> Result<Vec<OrderItem>, OrderCsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record?,
        None => return Err(OrderCsvError::MissingHeader),
    };
    let customer_ids = parse_customer_ids(&header)?;

    let mut items = Vec::new();
    for (row_idx, result) in records.enumerate() {
        let record = result?;
        let row = row_idx + 2; // header is row 1

        let Some(product_cell) = record.get(0) else {
            continue;
        };
        if product_cell.is_empty() && record.iter().all(str::is_empty) {
            continue;
        }
        let product_id = product_cell
            .parse::<u32>()
            .map_err(|_| OrderCsvError::InvalidProductId {
                row,
                value: product_cell.to_string(),
            })?;

        for (column, cell) in record.iter().enumerate().skip(1) {
            // Blank or non-numeric cells mean "nothing ordered".
            let Ok(quantity) = cell.parse::<u32>() else {
                continue;
            };
            let customer_id = *customer_ids
                .get(column - 1)
                .ok_or(OrderCsvError::UnknownCustomerColumn { row, column })?;
            items.push(OrderItem {
                product_id,
                customer_id,
                quantity,
                customer_order: column as u32,
            });
        }
    }

    Ok(items)
}

fn parse_customer_ids(header: &csv::StringRecord) -> Result<Vec<u32>, OrderCsvError> {
    header
        .iter()
        .enumerate()
        .skip(1)
        .map(|(column, value)| {
            value
                .parse::<u32>()
                .map_err(|_| OrderCsvError::InvalidCustomerId {
                    column,
                    value: value.to_string(),
                })
        })
        .collect()
}

/// Maps every customer to its position in the order file.
///
/// A customer listed twice keeps its last position.
pub fn customer_orders(items: &[OrderItem]) -> HashMap<u32, u32> {
    items
        .iter()
        .map(|item| (item.customer_id, item.customer_order))
        .collect()
}

/// Number of distinct customers in the order.
pub fn customer_count(items: &[OrderItem]) -> usize {
    customer_orders(items).len()
}
