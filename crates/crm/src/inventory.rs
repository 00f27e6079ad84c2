//! Stock items used on projects and tickets.
//!
//! Inventory carries no owner fields: access is gated by the unscoped
//! `inventory.view` / `inventory.manage` capabilities alone, never by
//! ownership tracing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fieldops_core::InventoryItemId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: InventoryItemId,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn new(sku: impl Into<String>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: InventoryItemId::new(),
            sku: sku.into(),
            name: name.into(),
            quantity: 0,
            location: None,
            created_at: now,
        }
    }
}
