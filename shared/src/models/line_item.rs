use serde::{Deserialize, Serialize};

/// A single cart line as captured at checkout time
///
/// `unit_price` is the catalog price snapshot taken when the order is
/// created; totals are always recomputed server-side from these lines,
/// never trusted from the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    /// Catalog item ID
    pub catalog_id: String,
    /// Product name snapshot
    pub name: String,
    /// Unit price at checkout time
    pub unit_price: f64,
    /// Quantity ordered
    pub quantity: u32,
}

impl LineItem {
    pub fn new(
        catalog_id: impl Into<String>,
        name: impl Into<String>,
        unit_price: f64,
        quantity: u32,
    ) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            name: name.into(),
            unit_price,
            quantity,
        }
    }

    /// Line total (unit price × quantity)
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}
